//! Configuration settings structures loaded from TOML files and
//! environment variables.

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "dialcast".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keep_alive_timeout() -> u64 {
    75
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

fn default_access_token_expiration() -> i64 {
    8 // hours; one shift
}

fn default_tick_interval_secs() -> u64 {
    2
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_stale_in_progress_secs() -> i64 {
    7200
}

fn default_lock_ttl_secs() -> u64 {
    300
}

fn default_pacing_min_samples() -> u64 {
    20
}

fn default_pacing_tolerance() -> f64 {
    0.01
}

fn default_pacing_step() -> f64 {
    0.10
}

fn default_call_control_timeout() -> u64 {
    10
}

fn default_call_control_provider() -> String {
    "http".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keep_alive_timeout")]
    pub keep_alive_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            keep_alive_timeout: default_keep_alive_timeout(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Whether to automatically run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// Logger Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "pretty", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to use ANSI colors
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            colored: default_true(),
        }
    }
}

// ============================================================================
// JWT Configuration
// ============================================================================

/// JWT authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens. Must come from the environment
    /// in production.
    #[serde(default)]
    pub secret: String,

    /// Access token expiration time in hours
    #[serde(default = "default_access_token_expiration")]
    pub access_token_expiration: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_expiration: default_access_token_expiration(),
        }
    }
}

impl JwtConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::validation("jwt.secret", "JWT secret cannot be empty"));
        }
        if self.secret.len() < 32 {
            return Err(ConfigError::validation(
                "jwt.secret",
                "JWT secret should be at least 32 characters",
            ));
        }
        if self.access_token_expiration <= 0 {
            return Err(ConfigError::validation(
                "jwt.access_token_expiration",
                "Access token expiration must be positive",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Call Control Configuration
// ============================================================================

/// Telephony provider client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallControlConfig {
    /// Provider kind: "http" or "null" (accept every dial locally)
    #[serde(default = "default_call_control_provider")]
    pub provider: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_call_control_timeout")]
    pub timeout: u64,
}

impl Default for CallControlConfig {
    fn default() -> Self {
        Self {
            provider: default_call_control_provider(),
            base_url: String::new(),
            api_key: String::new(),
            timeout: default_call_control_timeout(),
        }
    }
}

impl CallControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider.as_str() {
            "null" => Ok(()),
            "http" => {
                if self.base_url.is_empty() {
                    return Err(ConfigError::validation(
                        "call_control.base_url",
                        "base_url is required for the http provider",
                    ));
                }
                Ok(())
            }
            other => Err(ConfigError::ValidationError {
                field: "call_control.provider".to_string(),
                message: format!("unknown provider '{other}', expected 'http' or 'null'"),
            }),
        }
    }
}

// ============================================================================
// Dialer Engine Configuration
// ============================================================================

/// Tuning for the scheduling loop, sweeper, and pacing controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialerConfig {
    /// Scheduler tick interval in seconds
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval: u64,

    /// Lock sweeper interval in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval: u64,

    /// Age in seconds after which an in-progress power item is considered
    /// stranded and reverted to queued
    #[serde(default = "default_stale_in_progress_secs")]
    pub stale_in_progress: i64,

    /// Seconds a manual-dial lock is held before the sweeper reclaims it
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl: u64,

    /// Calls observed before the predictive ratio starts adapting
    #[serde(default = "default_pacing_min_samples")]
    pub pacing_min_samples: u64,

    /// Abandon-rate deviation tolerated before the ratio moves
    #[serde(default = "default_pacing_tolerance")]
    pub pacing_tolerance: f64,

    /// Fractional ratio adjustment per correction
    #[serde(default = "default_pacing_step")]
    pub pacing_step: f64,

    /// Deduct agents in after-call work from the idle count when sizing a
    /// dial batch. Off by default to match the historical behavior.
    #[serde(default)]
    pub reserve_wrapup_headroom: bool,

    /// Start the scheduler and sweeper on boot
    #[serde(default = "default_true")]
    pub autostart: bool,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval_secs(),
            sweep_interval: default_sweep_interval_secs(),
            stale_in_progress: default_stale_in_progress_secs(),
            lock_ttl: default_lock_ttl_secs(),
            pacing_min_samples: default_pacing_min_samples(),
            pacing_tolerance: default_pacing_tolerance(),
            pacing_step: default_pacing_step(),
            reserve_wrapup_headroom: false,
            autostart: default_true(),
        }
    }
}

impl DialerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval == 0 {
            return Err(ConfigError::validation(
                "dialer.tick_interval",
                "tick interval must be at least 1 second",
            ));
        }
        if self.sweep_interval == 0 {
            return Err(ConfigError::validation(
                "dialer.sweep_interval",
                "sweep interval must be at least 1 second",
            ));
        }
        if self.stale_in_progress <= 0 {
            return Err(ConfigError::validation(
                "dialer.stale_in_progress",
                "stale cutoff must be positive",
            ));
        }
        if self.lock_ttl == 0 {
            return Err(ConfigError::validation(
                "dialer.lock_ttl",
                "lock TTL must be at least 1 second",
            ));
        }
        if !(0.0..1.0).contains(&self.pacing_tolerance) {
            return Err(ConfigError::validation(
                "dialer.pacing_tolerance",
                "tolerance must be in [0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&self.pacing_step) {
            return Err(ConfigError::validation(
                "dialer.pacing_step",
                "step must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Root Settings
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub call_control: CallControlConfig,

    #[serde(default)]
    pub dialer: DialerConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "database URL cannot be empty",
            ));
        }
        self.jwt.validate()?;
        self.call_control.validate()?;
        self.dialer.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/dialcast".to_string(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
                ..Default::default()
            },
            call_control: CallControlConfig {
                provider: "null".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn empty_database_url_rejected() {
        let mut settings = valid_settings();
        settings.database.url.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut settings = valid_settings();
        settings.jwt.secret = "short".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn http_provider_requires_base_url() {
        let mut settings = valid_settings();
        settings.call_control.provider = "http".to_string();
        settings.call_control.base_url.clear();
        assert!(settings.validate().is_err());

        settings.call_control.base_url = "https://telephony.example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let mut settings = valid_settings();
        settings.dialer.tick_interval = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn server_address_joins_host_and_port() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(server.address(), "0.0.0.0:8080");
    }

    #[test]
    fn dialer_section_parses_with_partial_toml() {
        let parsed: DialerConfig =
            toml::from_str("tick_interval = 5\nreserve_wrapup_headroom = true\n").unwrap();

        assert_eq!(parsed.tick_interval, 5);
        assert!(parsed.reserve_wrapup_headroom);
        assert_eq!(parsed.sweep_interval, default_sweep_interval_secs());
        assert_eq!(parsed.lock_ttl, default_lock_ttl_secs());
    }

    #[test]
    fn zero_lock_ttl_rejected() {
        let mut settings = valid_settings();
        settings.dialer.lock_ttl = 0;
        assert!(settings.validate().is_err());
    }
}
