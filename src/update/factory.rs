use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error};

use crate::update::coordinator::UpdateCoordinator;
use crate::update::task::{TaskSnapshot, UpdateType};
use crate::version::RemoteVersion;

/// 所有任务的汇总快照
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FactorySnapshot {
    pub tasks: BTreeMap<String, TaskSnapshot>,
    pub updated_at: String,
}

/// 默认的任务协调方：按更新类型选择端点，并汇总发布各任务的快照
pub struct UpdateFactory {
    colibri_endpoint: String,
    firmware_endpoint: String,
    temp_folder: PathBuf,
    tasks: Mutex<BTreeMap<String, TaskSnapshot>>,
    publisher: watch::Sender<FactorySnapshot>,
}

impl UpdateFactory {
    pub fn new(
        colibri_endpoint: impl Into<String>,
        firmware_endpoint: impl Into<String>,
        temp_folder: impl Into<PathBuf>,
    ) -> Self {
        let (publisher, _) = watch::channel(FactorySnapshot::default());
        Self {
            colibri_endpoint: colibri_endpoint.into(),
            firmware_endpoint: firmware_endpoint.into(),
            temp_folder: temp_folder.into(),
            tasks: Mutex::new(BTreeMap::new()),
            publisher,
        }
    }

    pub fn from_version(version: &RemoteVersion, temp_folder: impl Into<PathBuf>) -> Self {
        Self::new(
            version.colibri_endpoint(),
            version.firmware_endpoint(),
            temp_folder,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<FactorySnapshot> {
        self.publisher.subscribe()
    }

    /// 最近一次发布的汇总快照
    pub fn snapshot(&self) -> FactorySnapshot {
        self.publisher.borrow().clone()
    }
}

impl UpdateCoordinator for UpdateFactory {
    fn endpoint(&self, task_type: UpdateType) -> String {
        match task_type {
            UpdateType::Bundle | UpdateType::Boot | UpdateType::Image => {
                self.colibri_endpoint.clone()
            }
            UpdateType::Firmware => self.firmware_endpoint.clone(),
        }
    }

    fn temp_folder(&self) -> PathBuf {
        self.temp_folder.clone()
    }

    fn update(&self, snapshot: &TaskSnapshot) {
        // 汇总和发布在同一把锁内完成，多个任务并发通知时不会互相覆盖
        let mut tasks = match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("任务快照锁已中毒，继续使用现有数据");
                poisoned.into_inner()
            }
        };
        tasks.insert(snapshot.name.clone(), snapshot.clone());

        let aggregate = FactorySnapshot {
            tasks: tasks.clone(),
            updated_at: Local::now().to_rfc3339(),
        };
        self.publisher.send_replace(aggregate);
        debug!("发布任务状态: {} -> {}", snapshot.name, snapshot.status);
    }
}
