use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing env {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the HTTP API.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = require(&var, "DATABASE_URL")?;
        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match var("APP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "APP_PORT",
                value: raw,
            })?,
            None => 8080,
        };
        Ok(Self {
            database_url,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for the nightly purge. Validated once, before any store call.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    pub supabase_url: String,
    pub service_role_key: String,
    pub dry_run: bool,
}

impl PurgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            supabase_url: require(&var, "SUPABASE_URL")?,
            service_role_key: require(&var, "SUPABASE_SERVICE_ROLE_KEY")?,
            dry_run: var("DRY_RUN").map(|v| is_truthy(&v)).unwrap_or(false),
        })
    }
}

fn require(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, ConfigError> {
    var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
