use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("文件操作失败: {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("版本清单解析失败: {url}: {reason}")]
    ManifestParse { url: String, reason: String },

    #[error("任务中不存在文件标签: {0}")]
    MissingFileTag(String),

    #[error("无效的文件标签: {0:?}")]
    InvalidFileTag(String),

    #[error("任务类型 {task_type} 未实现 {operation} 操作")]
    Unimplemented {
        task_type: String,
        operation: &'static str,
    },

    #[error("任务尚未下载完成: {0}")]
    NotDownloaded(String),

    #[error("配置错误: {0}")]
    Config(String),
}

impl UpdateError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// 连接、超时、重定向次数超限以及非成功状态码都算网络错误
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
