use crate::recommend::PriceTier;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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

pub const DEFAULT_INFLUENCE_CSV: &str = "data/influence_normalized.csv";
pub const DEFAULT_MAX_TOP_K: usize = 10;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub recommendation: RecommendationConfig,
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

        let influence_csv = env::var("APP_INFLUENCE_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_INFLUENCE_CSV));

        let raw_tier = env::var("APP_DEFAULT_TIER").unwrap_or_else(|_| "mid".to_string());
        let default_tier = raw_tier
            .parse::<PriceTier>()
            .map_err(|_| ConfigError::InvalidTier { value: raw_tier })?;

        let max_top_k = match env::var("APP_MAX_TOP_K") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value >= 1)
                .ok_or(ConfigError::InvalidTopK)?,
            Err(_) => DEFAULT_MAX_TOP_K,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            recommendation: RecommendationConfig {
                influence_csv,
                default_tier,
                max_top_k,
            },
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

/// Where the influence table lives and the defaults applied to survey requests.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub influence_csv: PathBuf,
    pub default_tier: PriceTier,
    pub max_top_k: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTier { value: String },
    InvalidTopK,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTier { value } => {
                write!(f, "APP_DEFAULT_TIER '{value}' must be one of high, mid, low")
            }
            ConfigError::InvalidTopK => write!(f, "APP_MAX_TOP_K must be a positive integer"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidTier { .. } | ConfigError::InvalidTopK => {
                None
            }
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
        env::remove_var("APP_INFLUENCE_CSV");
        env::remove_var("APP_DEFAULT_TIER");
        env::remove_var("APP_MAX_TOP_K");
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
        assert_eq!(
            config.recommendation.influence_csv,
            PathBuf::from(DEFAULT_INFLUENCE_CSV)
        );
        assert_eq!(config.recommendation.default_tier, PriceTier::Mid);
        assert_eq!(config.recommendation.max_top_k, DEFAULT_MAX_TOP_K);
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
    fn reads_recommendation_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_INFLUENCE_CSV", "/srv/influence.csv");
        env::set_var("APP_DEFAULT_TIER", "상");
        env::set_var("APP_MAX_TOP_K", "7");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.recommendation.influence_csv,
            PathBuf::from("/srv/influence.csv")
        );
        assert_eq!(config.recommendation.default_tier, PriceTier::High);
        assert_eq!(config.recommendation.max_top_k, 7);
        reset_env();
    }

    #[test]
    fn rejects_invalid_tier_and_top_k() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_TIER", "premium");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTier { value }) if value == "premium"
        ));

        reset_env();
        env::set_var("APP_MAX_TOP_K", "0");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidTopK)));
        reset_env();
    }
}
