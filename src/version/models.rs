use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `{colibri_endpoint}/{arch}/version.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColibriCatalog {
    pub bundles: Vec<Value>,
    pub boot: Map<String, Value>,
    pub images: Vec<Value>,
}

/// `{firmware_endpoint}/fablin/{mcu}/version.json`，`firmware` 段缺失或为 null 时视为空
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FirmwareCatalog {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub firmware: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
