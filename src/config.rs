use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::common::client::DEFAULT_MAX_REDIRECTS;
use crate::update::error::{Result, UpdateError};

pub const DEFAULT_COLIBRI_ENDPOINT: &str = "http://update.fabtotum.com/colibri";
pub const DEFAULT_FIRMWARE_ENDPOINT: &str = "http://update.fabtotum.com/firmware";

/// 更新相关配置，对应配置文件中的 `updates` 段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdateConfig {
    /// 系统/软件包版本清单根地址
    pub colibri_endpoint: String,
    /// 固件版本清单根地址
    pub firmware_endpoint: String,
    /// 下载暂存目录，文件写入 `{temp_folder}/fabui/`
    pub temp_folder: PathBuf,
    pub arch: String,
    pub mcu: String,
    pub manifest_timeout_secs: u64,
    pub max_redirects: usize,
    /// 单个文件下载的超时，默认不限制
    pub download_timeout_secs: Option<u64>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            colibri_endpoint: DEFAULT_COLIBRI_ENDPOINT.to_string(),
            firmware_endpoint: DEFAULT_FIRMWARE_ENDPOINT.to_string(),
            temp_folder: PathBuf::from("/tmp"),
            arch: "armhf".to_string(),
            mcu: "atmega1280".to_string(),
            manifest_timeout_secs: 10,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            download_timeout_secs: None,
        }
    }
}

impl UpdateConfig {
    /// 未指定路径时使用默认配置
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        debug!("加载配置文件: {}", path.display());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| UpdateError::Config(format!("无法读取 {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| UpdateError::Config(format!("无法解析 {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("colibri_endpoint", &self.colibri_endpoint),
            ("firmware_endpoint", &self.firmware_endpoint),
        ] {
            Url::parse(endpoint)
                .map_err(|e| UpdateError::Config(format!("{} 无效 ({}): {}", name, endpoint, e)))?;
        }
        if self.arch.is_empty() || self.mcu.is_empty() {
            return Err(UpdateError::Config("arch 与 mcu 不能为空".to_string()));
        }
        Ok(())
    }

    pub fn manifest_timeout(&self) -> Duration {
        Duration::from_secs(self.manifest_timeout_secs)
    }

    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs.map(Duration::from_secs)
    }
}
