pub mod global;
pub mod history;
pub mod loader;

pub use global::{GlobalConfig, LoggingConfig, SystemConfig};
pub use history::{HistoryGlobalConfig, NodeHistoryConfig, NodeHistorySettings};
pub use loader::{validate_global, ConfigLoader};
