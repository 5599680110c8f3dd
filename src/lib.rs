//! FABUI 更新下载核心
//!
//! - [`version::RemoteVersion`] 拉取远程系统清单与固件清单
//! - [`update::UpdateTask`] 按顺序下载一个更新单元的全部文件，并把每次状态变化通知给协调方
//! - [`update::UpdateFactory`] 默认的协调方实现，汇总发布所有任务的快照

pub mod common;
pub mod config;
pub mod update;
pub mod version;

pub use config::UpdateConfig;
pub use update::error::{Result, UpdateError};
