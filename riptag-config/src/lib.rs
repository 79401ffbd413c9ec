//! Shared configuration library for riptag.
//!
//! Centralizes config loading (TOML file, environment, built-in defaults),
//! the on-disk directory layout and the duration/number parsing helpers used
//! by both. The `riptag` binary loads a [`Config`] once at startup and hands
//! the pieces it needs to the core crate.

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::layout::AppLayout;
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    Config, ConfigMetadata, ConfigWarning, ConfigWarnings, HttpSettings,
    LoggingSettings, SearchLimits, Timeouts, ToolOverrides,
};
