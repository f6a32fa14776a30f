//! # Ctl Core Storage
//!
//! File access and configuration sources. [`ConfigLoader`] locates a
//! configuration file per logical name (`config/app.toml`, ...) through a
//! [`StorageProvider`], and [`ConfigRepository`] holds the merged values the
//! application resolves under the `config` key.
pub mod config;
pub mod error;
pub mod local;
pub mod provider;

/// Re-export key types
pub use config::{ConfigFormat, ConfigLoader, ConfigRepository, builtin_defaults};
pub use error::StorageSystemError;
pub use local::LocalStorageProvider;
pub use provider::StorageProvider;
