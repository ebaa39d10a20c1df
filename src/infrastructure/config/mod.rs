//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{
    AppConfig, CdnConfig, ImagesConfig, LazyLoadConfig, LogLevel, PerformanceConfig,
};
pub use args::{CliArgs, Command, EnvironmentArgs, FetchArgs, PlanArgs, PrefsCommand};
pub use storage::{ConfigError, StorageManager};
