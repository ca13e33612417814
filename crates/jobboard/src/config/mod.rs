use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Shortest idle period accepted before a moderation search term is applied.
pub const MIN_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

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
    pub moderation: ModerationConfig,
    pub catalog: CatalogConfig,
    pub resume: ResumeConfig,
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

        let debounce_ms = env::var("APP_SEARCH_DEBOUNCE_MS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidDebounce)?;
        let search_debounce = Duration::from_millis(debounce_ms);
        if search_debounce < MIN_SEARCH_DEBOUNCE {
            return Err(ConfigError::DebounceTooShort { millis: debounce_ms });
        }

        let seed_csv = env::var("APP_SEED_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let wrap_columns = env::var("APP_RESUME_WRAP_COLUMNS")
            .unwrap_or_else(|_| "90".to_string())
            .parse::<usize>()
            .ok()
            .filter(|columns| *columns > 0)
            .ok_or(ConfigError::InvalidWrapColumns)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            moderation: ModerationConfig { search_debounce },
            catalog: CatalogConfig { seed_csv },
            resume: ResumeConfig { wrap_columns },
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Timing policy for the moderation desk.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub search_debounce: Duration,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            search_debounce: MIN_SEARCH_DEBOUNCE,
        }
    }
}

/// Optional catalog seeding at startup.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub seed_csv: Option<PathBuf>,
}

/// Layout controls for the résumé builder.
#[derive(Debug, Clone)]
pub struct ResumeConfig {
    pub wrap_columns: usize,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self { wrap_columns: 90 }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDebounce,
    DebounceTooShort { millis: u64 },
    InvalidWrapColumns,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDebounce => {
                write!(f, "APP_SEARCH_DEBOUNCE_MS must be a whole number of milliseconds")
            }
            ConfigError::DebounceTooShort { millis } => write!(
                f,
                "APP_SEARCH_DEBOUNCE_MS must be at least {} (got {millis})",
                MIN_SEARCH_DEBOUNCE.as_millis()
            ),
            ConfigError::InvalidWrapColumns => {
                write!(f, "APP_RESUME_WRAP_COLUMNS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDebounce
            | ConfigError::DebounceTooShort { .. }
            | ConfigError::InvalidWrapColumns => None,
        }
    }
}
