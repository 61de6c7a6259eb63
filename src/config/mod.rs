//! Configuration management.
//!
//! Layered loading with support for TOML files and environment variable
//! overrides across development, test, staging, and production.
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local development overrides (not committed)
//! 4. `DIALCAST_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    CallControlConfig, DatabaseConfig, DialerConfig, JwtConfig, LoggerConfig, ServerConfig,
    Settings,
};
