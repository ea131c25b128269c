use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::survey::{
    CatalogError, ProjectCatalog, ScoringVariant, VariantError, DEFAULT_VARIANT,
};

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
    pub survey: SurveyConfig,
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

        let variant = env::var("SURVEY_VARIANT").unwrap_or_else(|_| DEFAULT_VARIANT.to_string());
        let variant_path = env::var("SURVEY_VARIANT_PATH").ok().map(PathBuf::from);
        if variant_path.is_none() && ScoringVariant::named(&variant).is_none() {
            return Err(ConfigError::UnknownVariant(variant));
        }

        let catalog_path = env::var("SURVEY_CATALOG_PATH").ok().map(PathBuf::from);
        let draft_dir = env::var("SURVEY_DRAFT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".lpc-drafts"));

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            survey: SurveyConfig {
                variant,
                variant_path,
                catalog_path,
                draft_dir,
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

/// Survey deployment settings: which rules table, which project slate, where drafts live.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub variant: String,
    pub variant_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub draft_dir: PathBuf,
}

impl SurveyConfig {
    /// Resolve the scoring rules, preferring an explicit rules file over the named variant.
    pub fn scoring_variant(&self) -> Result<ScoringVariant, VariantError> {
        match &self.variant_path {
            Some(path) => ScoringVariant::from_path(path),
            None => ScoringVariant::named(&self.variant)
                .ok_or_else(|| VariantError::Unknown(self.variant.clone())),
        }
    }

    pub fn catalog(&self) -> Result<ProjectCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => ProjectCatalog::from_path(path),
            None => Ok(ProjectCatalog::brockport()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownVariant(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownVariant(name) => write!(
                f,
                "SURVEY_VARIANT '{}' is not a known variant (expected one of: {})",
                name,
                ScoringVariant::NAMES.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::UnknownVariant(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
