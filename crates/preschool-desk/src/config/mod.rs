use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::school::{FeeSchedule, Money};

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
    pub school: SchoolConfig,
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

        let default_fee = match env::var("SCHOOL_DEFAULT_FEE") {
            Ok(raw) => Money::from_major(i64::from(parse_number::<u32>(
                "SCHOOL_DEFAULT_FEE",
                &raw,
            )?)),
            Err(_) => FeeSchedule::DEFAULT_FALLBACK,
        };

        let public_base_url = env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/storage".to_string());
        let signed_url_ttl_secs = match env::var("STORAGE_SIGNED_URL_TTL_SECS") {
            Ok(raw) => parse_number("STORAGE_SIGNED_URL_TTL_SECS", &raw)?,
            Err(_) => 3600,
        };

        let signing_key = match env::var("STORAGE_SIGNING_KEY") {
            Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            Ok(_) => return Err(ConfigError::MissingSigningKey),
            Err(_) if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSigningKey)
            }
            Err(_) => DEV_SIGNING_KEY.to_string(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            school: SchoolConfig {
                default_fee,
                storage: StorageConfig {
                    public_base_url: public_base_url.trim_end_matches('/').to_string(),
                    signed_url_ttl_secs,
                    signing_key,
                },
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
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

/// School specific dials: the fee used when a class is not in the schedule and
/// where stored files are served from.
#[derive(Debug, Clone)]
pub struct SchoolConfig {
    pub default_fee: Money,
    pub storage: StorageConfig,
}

impl SchoolConfig {
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::standard().with_fallback(self.default_fee)
    }
}

/// Key used outside production when `STORAGE_SIGNING_KEY` is unset.
pub const DEV_SIGNING_KEY: &str = "preschool-desk-development-signing-key";

#[derive(Clone)]
pub struct StorageConfig {
    pub public_base_url: String,
    pub signed_url_ttl_secs: u64,
    /// HMAC key for signed links to private buckets.
    pub signing_key: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("public_base_url", &self.public_base_url)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    MissingSigningKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer (found '{value}')")
            }
            ConfigError::MissingSigningKey => {
                write!(f, "STORAGE_SIGNING_KEY must be set to a non-empty secret")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingSigningKey => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
