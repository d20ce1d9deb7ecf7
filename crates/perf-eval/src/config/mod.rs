use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;

use crate::evaluations::scoring::{ScoringConfig, WeightPolicy};

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
    pub scoring: ScoringConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            scoring: load_scoring()?,
        })
    }
}

fn load_scoring() -> Result<ScoringConfig, ConfigError> {
    let defaults = ScoringConfig::default();

    let min_score = read_score("APP_SCORE_MIN", defaults.min_score)?;
    let max_score = read_score("APP_SCORE_MAX", defaults.max_score)?;
    if min_score >= max_score {
        return Err(ConfigError::InvalidScoreRange {
            min: min_score,
            max: max_score,
        });
    }

    let scale_factor = read_decimal("APP_SCORE_SCALE_FACTOR", defaults.scale_factor)?;
    if Decimal::from(max_score) * scale_factor > Decimal::ONE_HUNDRED {
        return Err(ConfigError::ScaleExceedsFull {
            max: max_score,
            scale_factor,
        });
    }
    let weight_tolerance = read_decimal("APP_WEIGHT_TOLERANCE", defaults.weight_tolerance)?;

    let weight_policy = match env::var("APP_WEIGHT_POLICY") {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "enforce" | "block" => WeightPolicy::Enforce,
            "warn" | "warning" => WeightPolicy::Warn,
            _ => return Err(ConfigError::InvalidWeightPolicy { value: raw }),
        },
        Err(_) => defaults.weight_policy,
    };

    Ok(ScoringConfig {
        min_score,
        max_score,
        scale_factor,
        weight_tolerance,
        weight_policy,
    })
}

fn read_score(key: &'static str, default: u8) -> Result<u8, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn read_decimal(key: &'static str, default: Decimal) -> Result<Decimal, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<Decimal>() {
            Ok(value) if value > Decimal::ZERO => Ok(value),
            _ => Err(ConfigError::InvalidNumber { key, value: raw }),
        },
        Err(_) => Ok(default),
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
    /// Colored output; only enabled for local development.
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidScoreRange { min: u8, max: u8 },
    ScaleExceedsFull { max: u8, scale_factor: Decimal },
    InvalidWeightPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number (got '{value}')")
            }
            ConfigError::InvalidScoreRange { min, max } => write!(
                f,
                "APP_SCORE_MIN ({min}) must be lower than APP_SCORE_MAX ({max})"
            ),
            ConfigError::ScaleExceedsFull { max, scale_factor } => write!(
                f,
                "APP_SCORE_MAX ({max}) times APP_SCORE_SCALE_FACTOR ({scale_factor}) must not exceed 100"
            ),
            ConfigError::InvalidWeightPolicy { value } => write!(
                f,
                "APP_WEIGHT_POLICY must be 'enforce' or 'warn' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
