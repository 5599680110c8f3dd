use std::path::PathBuf;

use super::task::{TaskSnapshot, UpdateType};

/// 任务的协调方：提供下载端点与暂存目录，并接收任务状态变化通知
///
/// `update` 可能被多个并发任务同时调用，实现方需要自行保证
/// 汇总与发布过程的线程安全。调用方不会等待发布结果。
pub trait UpdateCoordinator: Send + Sync {
    /// 某类更新的远程根地址
    fn endpoint(&self, task_type: UpdateType) -> String;

    /// 下载暂存根目录
    fn temp_folder(&self) -> PathBuf;

    /// 任务或文件状态发生变化后调用，参数为该任务的最新快照
    fn update(&self, snapshot: &TaskSnapshot);
}
