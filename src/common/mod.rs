pub mod client;
pub mod logger;
