use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub authentication: AuthenticationSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    // env vars are always strings; serde-aux lets `PORT=8000` deserialize into a u16
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub environment: Environment,
    pub public_dir: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub acquire_timeout_secs: u64,
    /// Seconds between liveness pings. Zero disables the watchdog.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub liveness_interval_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub liveness_max_failures: u32,
}

impl DatabaseSettings {
    /// Parses the connection string without connecting.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        PgConnectOptions::from_str(self.url.expose_secret())
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new().acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }

    /// Opens the pool and establishes a first connection, failing if the database is unreachable.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        self.pool_options().connect_with(self.connect_options()?).await
    }

    /// Builds a pool that only connects when a query first needs a connection.
    pub fn connect_lazy(&self) -> Result<PgPool, sqlx::Error> {
        Ok(self.pool_options().connect_lazy_with(self.connect_options()?))
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SecuritySettings {
    pub allowed_origins: Vec<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub body_limit_bytes: usize,
    /// Query keys that may legitimately repeat.
    pub parameter_allow_list: Vec<String>,
    /// `None` leaves the Cross-Origin-Resource-Policy header off so assets can be shared.
    pub cross_origin_resource_policy: Option<String>,
}

impl SecuritySettings {
    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthenticationSettings {
    pub jwt_secret: Secret<String>,
    pub access_token_cookie: String,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("{0}")]
    Environment(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Reads settings from `configuration/`, then `APP_*` variables, then the bare `DATABASE` and `PORT`.
pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigurationError::Invalid(format!("Cannot read current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    // default to local if APP_ENVIRONMENT is unset
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigurationError::Environment)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .set_default("application.host", "0.0.0.0")?
        .set_default("application.port", 8000)?
        .set_default("application.environment", environment.as_str())?
        .set_default("application.public_dir", "public")?
        .set_default("database.url", "")?
        .set_default("database.acquire_timeout_secs", 2)?
        .set_default("database.liveness_interval_secs", 30)?
        .set_default("database.liveness_max_failures", 3)?
        .set_default("security.allowed_origins", Vec::<String>::new())?
        .set_default("security.body_limit_bytes", 10 * 1024)?
        .set_default("security.parameter_allow_list", Vec::<String>::new())?
        .set_default("authentication.jwt_secret", "")?
        .set_default("authentication.access_token_cookie", "jwt")?
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        // e.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("security.allowed_origins")
                .with_list_parse_key("security.parameter_allow_list")
                .try_parsing(true),
        )
        .set_override_option("database.url", std::env::var("DATABASE").ok())?
        .set_override_option("application.port", std::env::var("PORT").ok())?
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Rejects settings the server cannot start with. Runs before any connection or bind.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.database.url.expose_secret().trim().is_empty() {
            return Err(ConfigurationError::Invalid(
                "DATABASE is not set; a database connection string is required".into(),
            ));
        }
        if self.authentication.jwt_secret.expose_secret().is_empty() {
            return Err(ConfigurationError::Invalid(
                "authentication.jwt_secret must not be empty".into(),
            ));
        }
        if self.security.body_limit_bytes == 0 {
            return Err(ConfigurationError::Invalid(
                "security.body_limit_bytes must be greater than zero".into(),
            ));
        }
        if self.database.liveness_interval_secs > 0 && self.database.liveness_max_failures == 0 {
            return Err(ConfigurationError::Invalid(
                "database.liveness_max_failures must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
