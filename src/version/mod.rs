use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::common::client::{UpdateClient, join_url};
use crate::config::UpdateConfig;
use crate::update::error::{Result, UpdateError};

pub mod models;

pub use models::{ColibriCatalog, FirmwareCatalog};

/// 固件清单所在的产品目录
pub const FIRMWARE_NAMESPACE: &str = "fablin";

const MANIFEST_FILE: &str = "version.json";

/// 远程版本信息，创建时一次性拉取系统清单和固件清单
#[derive(Debug, Clone)]
pub struct RemoteVersion {
    colibri_root: String,
    firmware_root: String,
    arch: String,
    mcu: String,
    colibri_raw: Value,
    colibri: ColibriCatalog,
    firmware: FirmwareCatalog,
}

impl RemoteVersion {
    /// 任一清单获取或解析失败都会导致整体失败
    pub async fn fetch(config: &UpdateConfig) -> Result<Self> {
        let client = UpdateClient::new(Some(config.manifest_timeout()), config.max_redirects)?;
        Self::fetch_with(&client, config).await
    }

    pub async fn fetch_with(client: &UpdateClient, config: &UpdateConfig) -> Result<Self> {
        let colibri_root = config.colibri_endpoint.clone();
        let firmware_root = config.firmware_endpoint.clone();
        let arch = config.arch.clone();
        let mcu = config.mcu.clone();

        let colibri_url = join_url(&join_url(&colibri_root, &arch), MANIFEST_FILE);
        let firmware_url = join_url(
            &join_url(&join_url(&firmware_root, FIRMWARE_NAMESPACE), &mcu),
            MANIFEST_FILE,
        );

        info!("获取版本清单: arch={}, mcu={}", arch, mcu);
        let colibri_raw = client.get_json(&colibri_url).await?;
        let colibri: ColibriCatalog = parse_catalog(&colibri_url, &colibri_raw)?;
        debug!(
            "系统清单: {} 个软件包, {} 个镜像",
            colibri.bundles.len(),
            colibri.images.len()
        );

        let firmware_raw = client.get_json(&firmware_url).await?;
        let firmware: FirmwareCatalog = parse_catalog(&firmware_url, &firmware_raw)?;
        debug!("固件清单: {} 个字段", firmware.firmware.len());

        Ok(Self {
            colibri_root,
            firmware_root,
            arch,
            mcu,
            colibri_raw,
            colibri,
            firmware,
        })
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn mcu(&self) -> &str {
        &self.mcu
    }

    /// 原始系统清单
    pub fn colibri(&self) -> &Value {
        &self.colibri_raw
    }

    pub fn bundles(&self) -> &[Value] {
        &self.colibri.bundles
    }

    pub fn boot(&self) -> &Map<String, Value> {
        &self.colibri.boot
    }

    pub fn images(&self) -> &[Value] {
        &self.colibri.images
    }

    /// 清单中没有 `firmware` 段时返回空对象
    pub fn firmware(&self) -> &Map<String, Value> {
        &self.firmware.firmware
    }

    pub fn colibri_endpoint(&self) -> String {
        join_url(&self.colibri_root, &self.arch)
    }

    pub fn firmware_endpoint(&self) -> String {
        join_url(&join_url(&self.firmware_root, FIRMWARE_NAMESPACE), &self.mcu)
    }
}

fn parse_catalog<T: DeserializeOwned>(url: &str, raw: &Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| UpdateError::ManifestParse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
