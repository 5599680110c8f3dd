use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    #[serde(rename = "")]
    Pending,
    Downloading,
    Downloaded,
    Error,
}

/// 计算下载进度百分比，总大小未知时为 0，结果限制在 [0, 100]
pub fn progress_percent(total: u64, done: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// 单个待下载文件的描述与传输状态
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    tag: String,
    remote_suffix: String,
    local_path: Option<PathBuf>,
    size_bytes: u64,
    progress_percent: f64,
    status: FileStatus,
}

impl FileDescriptor {
    pub fn new(tag: impl Into<String>, remote_suffix: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            remote_suffix: remote_suffix.into(),
            local_path: None,
            size_bytes: 0,
            progress_percent: 0.0,
            status: FileStatus::Pending,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn remote_suffix(&self) -> &str {
        &self.remote_suffix
    }

    /// 本地文件名，取远程路径的最后一段
    pub fn name(&self) -> &str {
        self.remote_suffix
            .rsplit('/')
            .find(|part| !part.is_empty())
            .unwrap_or(&self.remote_suffix)
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub(crate) fn set_local(&mut self, path: PathBuf) {
        self.local_path = Some(path);
    }

    pub(crate) fn set_progress(&mut self, total: u64, done: u64) {
        self.size_bytes = total;
        self.progress_percent = progress_percent(total, done);
        self.status = FileStatus::Downloading;
    }

    /// 新一轮传输开始前清零进度
    pub(crate) fn reset_progress(&mut self) {
        self.progress_percent = 0.0;
    }

    pub(crate) fn mark_downloaded(&mut self) {
        self.progress_percent = 100.0;
        self.status = FileStatus::Downloaded;
    }

    pub(crate) fn mark_error(&mut self) {
        self.status = FileStatus::Error;
    }

    pub fn serialize(&self) -> FileSnapshot {
        FileSnapshot {
            tag: self.tag.clone(),
            remote_suffix: self.remote_suffix.clone(),
            local_path: self
                .local_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes: self.size_bytes,
            progress_percent: self.progress_percent,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSnapshot {
    pub tag: String,
    pub remote_suffix: String,
    pub local_path: String,
    pub size_bytes: u64,
    pub progress_percent: f64,
    pub status: FileStatus,
}
