pub mod coordinator;
pub mod error;
pub mod factory;
pub mod file;
pub mod task;
pub mod transfer;

pub use coordinator::UpdateCoordinator;
pub use error::{Result, UpdateError};
pub use factory::{FactorySnapshot, UpdateFactory};
pub use file::{FileDescriptor, FileSnapshot, FileStatus};
pub use task::{MainFile, TaskInstaller, TaskSnapshot, TaskStatus, UpdateTask, UpdateType};
pub use transfer::{ProgressSink, TransferClient};
