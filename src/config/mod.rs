use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    /// Pick the backend from the scheme of a connection string.
    pub fn from_url(url: &str) -> Self {
        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Provider base URL; the looked-up address is appended as the last path segment
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeolocationConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://ip-api.com/json";

    /// Bounds how long a slow provider can hold a request
    pub const TIMEOUT_SECS: u64 = 10;
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout_secs: Self::TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub const BIND_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: &'static str = "3000";
    pub const DEFAULT_DATABASE_URL: &'static str = "sqlite://./iptrail.db";
    pub const MAX_CONNECTIONS: u32 = 5;

    /// Only `DATABASE_URL` and `PORT` are read; everything else is fixed
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_DATABASE_URL.to_string());
        let backend = DatabaseBackend::from_url(&database_url);

        let port = var("PORT")
            .unwrap_or_else(|| Self::DEFAULT_PORT.to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        if matches!(backend, DatabaseBackend::Sqlite) && !database_url.starts_with("sqlite:") {
            tracing::warn!(
                "DATABASE_URL has an unrecognized scheme, treating it as SQLite. Supported schemes: sqlite, postgres"
            );
        }

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections: Self::MAX_CONNECTIONS,
            },
            server: ServerConfig {
                host: Self::BIND_HOST.to_string(),
                port,
            },
            geolocation: GeolocationConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_sqlite_url() {
        assert_eq!(
            DatabaseBackend::from_url("sqlite://./iptrail.db"),
            DatabaseBackend::Sqlite
        );
        assert_eq!(
            DatabaseBackend::from_url("sqlite::memory:"),
            DatabaseBackend::Sqlite
        );
    }

    #[test]
    fn test_backend_from_postgres_url() {
        assert_eq!(
            DatabaseBackend::from_url("postgres://user@localhost/iptrail"),
            DatabaseBackend::Postgres
        );
        assert_eq!(
            DatabaseBackend::from_url("PostgreSQL://user@localhost/iptrail"),
            DatabaseBackend::Postgres
        );
    }

    #[test]
    fn test_geolocation_defaults() {
        let config = GeolocationConfig::default();
        assert_eq!(config.base_url, "http://ip-api.com/json");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.timeout_secs > 0);
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_from_vars_reads_database_url_and_port() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://user@localhost/iptrail"),
            ("PORT", "8081"),
        ]))
        .unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.url, "postgres://user@localhost/iptrail");
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
        assert_eq!(config.database.url, "sqlite://./iptrail.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_from_vars_ignores_other_variables() {
        let config = Config::from_vars(vars(&[
            ("HOST", "127.0.0.1"),
            ("DATABASE_MAX_CONNECTIONS", "50"),
            ("GEOLOCATION_URL", "http://example.invalid/json"),
            ("GEOLOCATION_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.geolocation.base_url, "http://ip-api.com/json");
        assert_eq!(config.geolocation.timeout_secs, 10);
    }

    #[test]
    fn test_from_vars_rejects_bad_port() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }
}
