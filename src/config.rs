use clap::{Args, Parser};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on every outbound gateway call.
pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Process configuration, read once at startup from flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Record store location: `memory:` or `rocksdb:<path>`.
    #[arg(long, env = "DATABASE_URL", default_value = "memory:")]
    pub database_url: StorageUrl,

    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub chapa: ChapaConfig,
}

/// Credentials and redirect targets for the Chapa hosted checkout.
#[derive(Args, Clone)]
pub struct ChapaConfig {
    #[arg(long = "chapa-public-key", env = "CHAPA_PUBLIC_KEY", default_value = "")]
    pub public_key: String,

    /// Bearer credential for the Chapa API.
    #[arg(
        long = "chapa-secret-key",
        env = "CHAPA_SECRET_KEY",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub secret_key: String,

    #[arg(
        long = "chapa-base-url",
        env = "CHAPA_BASE_URL",
        default_value = "https://api.chapa.co"
    )]
    pub base_url: String,

    /// Where the payer's browser lands after checkout.
    #[arg(
        long,
        env = "RETURN_URL",
        default_value = "http://localhost:3000/payments/return"
    )]
    pub return_url: String,

    /// Server-to-server notification target handed to the gateway.
    #[arg(
        long,
        env = "CALLBACK_URL",
        default_value = "http://localhost:8080/payments/confirm"
    )]
    pub callback_url: String,

    #[arg(skip = GATEWAY_TIMEOUT)]
    pub timeout: Duration,
}

impl fmt::Debug for ChapaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChapaConfig")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("return_url", &self.return_url)
            .field("callback_url", &self.callback_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("unsupported DATABASE_URL '{0}', expected 'memory:' or 'rocksdb:<path>'")]
    UnsupportedDatabaseUrl(String),
    #[error("DATABASE_URL '{0}' is missing a path")]
    MissingPath(String),
}

/// Which record store backs the service.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageUrl {
    Memory,
    RocksDb(PathBuf),
}

impl FromStr for StorageUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if matches!(s, "memory" | "memory:" | "memory://") {
            return Ok(Self::Memory);
        }
        let path = s
            .strip_prefix("rocksdb://")
            .or_else(|| s.strip_prefix("rocksdb:"))
            .ok_or_else(|| ConfigError::UnsupportedDatabaseUrl(s.to_string()))?;
        if path.is_empty() {
            return Err(ConfigError::MissingPath(s.to_string()));
        }
        Ok(Self::RocksDb(PathBuf::from(path)))
    }
}

impl fmt::Display for StorageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory:"),
            Self::RocksDb(path) => write!(f, "rocksdb:{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url_parsing() {
        assert_eq!("memory:".parse::<StorageUrl>().unwrap(), StorageUrl::Memory);
        assert_eq!(
            "rocksdb:./data/payments".parse::<StorageUrl>().unwrap(),
            StorageUrl::RocksDb(PathBuf::from("./data/payments"))
        );
        assert_eq!(
            "rocksdb:///var/lib/hirehub".parse::<StorageUrl>().unwrap(),
            StorageUrl::RocksDb(PathBuf::from("/var/lib/hirehub"))
        );
        assert!(matches!(
            "postgres://localhost/db".parse::<StorageUrl>(),
            Err(ConfigError::UnsupportedDatabaseUrl(_))
        ));
        assert!(matches!(
            "rocksdb:".parse::<StorageUrl>(),
            Err(ConfigError::MissingPath(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["hirehub"]).unwrap();
        assert_eq!(config.chapa.timeout, GATEWAY_TIMEOUT);
        assert!(!config.chapa.base_url.is_empty());
    }

    #[test]
    fn test_flags_override() {
        let config = Config::try_parse_from([
            "hirehub",
            "--port",
            "9000",
            "--chapa-secret-key",
            "CHASECK-xyz",
            "--database-url",
            "rocksdb:/tmp/db",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.chapa.secret_key, "CHASECK-xyz");
        assert_eq!(config.database_url, StorageUrl::RocksDb("/tmp/db".into()));
        assert!(!format!("{:?}", config.chapa).contains("CHASECK-xyz"));
    }
}
