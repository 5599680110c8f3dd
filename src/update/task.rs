use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, error, info, warn};

use crate::common::client::join_url;
use crate::update::coordinator::UpdateCoordinator;
use crate::update::error::{Result, UpdateError};
use crate::update::file::{FileDescriptor, FileSnapshot};
use crate::update::transfer::{ProgressSink, TransferClient};

/// 暂存目录下的应用子目录
pub const STAGING_NAMESPACE: &str = "fabui";

/// 快照中保留给主文件的键名
pub const MAIN_FILE_KEY: &str = "main_file";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Bundle,
    Boot,
    Image,
    Firmware,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateType::Bundle => "bundle",
            UpdateType::Boot => "boot",
            UpdateType::Image => "image",
            UpdateType::Firmware => "firmware",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "")]
    Pending,
    Downloading,
    Downloaded,
    Installing,
    Installed,
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Downloaded => "downloaded",
            TaskStatus::Installing => "installing",
            TaskStatus::Installed => "installed",
            TaskStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// 下载完成后的安装步骤，由具体的更新类型提供
#[async_trait]
pub trait TaskInstaller: Send + Sync {
    async fn install(&self, task: &UpdateTask) -> Result<()>;
}

/// 一个可安装组件的更新任务，持有其全部待下载文件
pub struct UpdateTask {
    name: String,
    task_type: UpdateType,
    version: String,
    status: TaskStatus,
    message: String,
    files: BTreeMap<String, FileDescriptor>,
    main_file: Option<String>,
    current: Option<String>,
    downloaded: bool,
    factory: Arc<dyn UpdateCoordinator>,
    installer: Option<Arc<dyn TaskInstaller>>,
    transfer: TransferClient,
}

impl UpdateTask {
    pub fn new(
        name: impl Into<String>,
        task_type: UpdateType,
        factory: Arc<dyn UpdateCoordinator>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            task_type,
            version: String::new(),
            status: TaskStatus::Pending,
            message: String::new(),
            files: BTreeMap::new(),
            main_file: None,
            current: None,
            downloaded: false,
            factory,
            installer: None,
            transfer: TransferClient::new()?,
        })
    }

    pub fn with_transfer_client(mut self, transfer: TransferClient) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn TaskInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_type(&self) -> UpdateType {
        self.task_type
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 正在传输的文件标签，空闲时为 `None`
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    pub fn main_file(&self) -> Option<&str> {
        self.main_file.as_deref()
    }

    pub fn factory(&self) -> &Arc<dyn UpdateCoordinator> {
        &self.factory
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.notify();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.notify();
    }

    /// 标签在任务内唯一，重复添加会覆盖原有文件
    pub fn add_file(&mut self, tag: impl Into<String>, remote_suffix: impl Into<String>) -> Result<()> {
        let tag = tag.into();
        if tag.is_empty() || tag == MAIN_FILE_KEY {
            return Err(UpdateError::InvalidFileTag(tag));
        }
        let file = FileDescriptor::new(tag.clone(), remote_suffix);
        if self.files.insert(tag.clone(), file).is_some() {
            warn!("任务 {} 中的文件 {} 已被替换", self.name, tag);
        }
        Ok(())
    }

    pub fn file(&self, tag: &str) -> Result<&FileDescriptor> {
        self.files
            .get(tag)
            .ok_or_else(|| UpdateError::MissingFileTag(tag.to_string()))
    }

    fn file_mut(&mut self, tag: &str) -> Result<&mut FileDescriptor> {
        self.files
            .get_mut(tag)
            .ok_or_else(|| UpdateError::MissingFileTag(tag.to_string()))
    }

    /// 按标签顺序遍历
    pub fn files(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.values()
    }

    pub fn set_main_file(&mut self, tag: impl Into<String>) -> Result<()> {
        let tag = tag.into();
        if !self.files.contains_key(&tag) {
            return Err(UpdateError::MissingFileTag(tag));
        }
        self.main_file = Some(tag);
        Ok(())
    }

    fn set_current(&mut self, tag: Option<&str>) {
        self.current = tag.map(str::to_string);
    }

    fn notify(&self) {
        self.factory.update(&self.serialize());
    }

    /// 依次下载全部文件，任一文件失败即中止并返回错误
    pub async fn download(&mut self) -> Result<()> {
        info!("开始下载任务: {} ({})", self.name, self.task_type);
        self.downloaded = false;
        if !self.message.is_empty() {
            self.set_message(String::new());
        }
        self.set_status(TaskStatus::Downloading);

        let tags: Vec<String> = self.files.keys().cloned().collect();
        for tag in tags {
            if let Err(e) = self.download_file(&tag).await {
                error!("任务 {} 的文件 {} 下载失败: {}", self.name, tag, e);
                if let Ok(file) = self.file_mut(&tag) {
                    file.mark_error();
                }
                self.set_current(None);
                self.set_message(e.to_string());
                self.set_status(TaskStatus::Error);
                return Err(e);
            }
        }

        self.downloaded = true;
        self.set_status(TaskStatus::Downloaded);
        info!("✅ 任务下载完成: {}", self.name);
        Ok(())
    }

    async fn download_file(&mut self, tag: &str) -> Result<()> {
        self.set_current(Some(tag));
        self.notify();

        let (remote_suffix, file_name) = {
            let file = self.file(tag)?;
            (file.remote_suffix().to_string(), file.name().to_string())
        };

        let url = join_url(&self.factory.endpoint(self.task_type), &remote_suffix);
        let local_path = self
            .factory
            .temp_folder()
            .join(STAGING_NAMESPACE)
            .join(file_name);

        {
            let file = self.file_mut(tag)?;
            file.set_local(local_path.clone());
            file.reset_progress();
        }

        info!("下载文件 [{}]: {} -> {}", tag, url, local_path.display());

        let transfer = self.transfer.clone();
        let mut progress = FileProgress {
            task: &mut *self,
            tag,
        };
        transfer.download(&url, &local_path, &mut progress).await?;

        self.file_mut(tag)?.mark_downloaded();
        self.set_current(None);
        self.notify();
        Ok(())
    }

    fn record_progress(&mut self, tag: &str, total: u64, done: u64) -> Result<()> {
        self.file_mut(tag)?.set_progress(total, done);
        self.notify();
        Ok(())
    }

    /// 执行安装步骤，需先下载完成且提供了安装器
    pub async fn install(&mut self) -> Result<()> {
        let Some(installer) = self.installer.clone() else {
            return Err(UpdateError::Unimplemented {
                task_type: self.task_type.to_string(),
                operation: "install",
            });
        };
        if !self.downloaded {
            return Err(UpdateError::NotDownloaded(self.name.clone()));
        }

        info!("开始安装: {}", self.name);
        self.set_status(TaskStatus::Installing);

        match installer.install(self).await {
            Ok(()) => {
                self.set_status(TaskStatus::Installed);
                Ok(())
            }
            Err(e) => {
                error!("安装失败: {}: {}", self.name, e);
                self.set_message(e.to_string());
                self.set_status(TaskStatus::Error);
                Err(e)
            }
        }
    }

    pub fn serialize(&self) -> TaskSnapshot {
        let entries: BTreeMap<String, FileSnapshot> = self
            .files
            .iter()
            .map(|(tag, file)| (tag.clone(), file.serialize()))
            .collect();

        let main_file = self
            .main_file
            .as_deref()
            .and_then(|tag| entries.get(tag))
            .cloned()
            .map_or(MainFile::None, MainFile::File);

        TaskSnapshot {
            name: self.name.clone(),
            task_type: self.task_type,
            status: self.status,
            message: self.message.clone(),
            version: self.version.clone(),
            files: FilesSnapshot { main_file, entries },
        }
    }
}

/// 把传输进度写回任务中对应的文件
struct FileProgress<'a> {
    task: &'a mut UpdateTask,
    tag: &'a str,
}

impl ProgressSink for FileProgress<'_> {
    fn report(&mut self, total: u64, done: u64) {
        match self.task.record_progress(self.tag, total, done) {
            Ok(()) => debug!("[{}] {}/{}", self.tag, done, total),
            Err(e) => warn!("更新下载进度失败 [{}]: {}", self.tag, e),
        }
    }
}

/// 任务快照，供外部状态展示使用
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: UpdateType,
    pub status: TaskStatus,
    pub message: String,
    pub version: String,
    pub files: FilesSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilesSnapshot {
    pub main_file: MainFile,
    #[serde(flatten)]
    pub entries: BTreeMap<String, FileSnapshot>,
}

/// 主文件快照，未指定时序列化为字符串 `"none"`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MainFile {
    #[default]
    None,
    File(FileSnapshot),
}

impl Serialize for MainFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MainFile::None => serializer.serialize_str("none"),
            MainFile::File(file) => file.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MainFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            File(FileSnapshot),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::File(file) => Ok(MainFile::File(file)),
            Repr::Text(text) if text == "none" => Ok(MainFile::None),
            Repr::Text(text) => Err(serde::de::Error::custom(format!(
                "main_file 只能是文件快照或 \"none\"，实际为 {:?}",
                text
            ))),
        }
    }
}
