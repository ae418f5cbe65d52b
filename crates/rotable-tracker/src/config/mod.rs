use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::lifecycle::RejectionPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: StoreConfig,
    pub lifecycle: LifecycleConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let backend = env::var("ROTABLE_STORE").unwrap_or_else(|_| "memory".to_string());
        let backend = StoreBackend::parse(&backend)
            .ok_or(ConfigError::InvalidStoreBackend { value: backend })?;
        let sqlite_path = env::var("ROTABLE_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("rotable-tracker.db"));
        let timeout_ms = env::var("ROTABLE_STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string());
        let timeout = timeout_ms
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
            .ok_or(ConfigError::InvalidTimeout { value: timeout_ms })?;

        let policy = env::var("ROTABLE_REJECTION_POLICY")
            .unwrap_or_else(|_| "return-to-qa".to_string());
        let rejection_policy = RejectionPolicy::parse(&policy)
            .ok_or(ConfigError::InvalidRejectionPolicy { value: policy })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig {
                backend,
                sqlite_path,
                timeout,
            },
            lifecycle: LifecycleConfig { rejection_policy },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Persistence port selection. The timeout bounds every persistence call.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub sqlite_path: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    pub rejection_policy: RejectionPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidStoreBackend { value: String },
    InvalidTimeout { value: String },
    InvalidRejectionPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStoreBackend { value } => {
                write!(f, "ROTABLE_STORE must be 'memory' or 'sqlite', got '{value}'")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "ROTABLE_STORE_TIMEOUT_MS must be a positive number of milliseconds, got '{value}'"
            ),
            ConfigError::InvalidRejectionPolicy { value } => write!(
                f,
                "ROTABLE_REJECTION_POLICY must be 'return-to-qa' or 'hold-for-repair', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidStoreBackend { .. }
            | ConfigError::InvalidTimeout { .. }
            | ConfigError::InvalidRejectionPolicy { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ROTABLE_STORE");
        env::remove_var("ROTABLE_SQLITE_PATH");
        env::remove_var("ROTABLE_STORE_TIMEOUT_MS");
        env::remove_var("ROTABLE_REJECTION_POLICY");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.sqlite_path, PathBuf::from("rotable-tracker.db"));
        assert_eq!(config.store.timeout, Duration::from_millis(2_000));
        assert_eq!(
            config.lifecycle.rejection_policy,
            RejectionPolicy::ReturnToQa
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_store_and_policy_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROTABLE_STORE", "SQLite");
        env::set_var("ROTABLE_SQLITE_PATH", "/var/lib/rotables/workshop.db");
        env::set_var("ROTABLE_STORE_TIMEOUT_MS", "750");
        env::set_var("ROTABLE_REJECTION_POLICY", "hold-for-repair");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(
            config.store.sqlite_path,
            PathBuf::from("/var/lib/rotables/workshop.db")
        );
        assert_eq!(config.store.timeout, Duration::from_millis(750));
        assert_eq!(
            config.lifecycle.rejection_policy,
            RejectionPolicy::HoldForRepair
        );
    }

    #[test]
    fn rejects_invalid_store_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("ROTABLE_STORE", "spreadsheet");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidStoreBackend { .. })
        ));
        reset_env();

        env::set_var("ROTABLE_STORE_TIMEOUT_MS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        reset_env();

        env::set_var("ROTABLE_REJECTION_POLICY", "shrug");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidRejectionPolicy { .. })
        ));
        reset_env();
    }
}
