use std::env;
use std::path::PathBuf;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Database file path (default: ./journal.db)
    pub database_path: PathBuf,
    /// Session token expiration in days (default: 30)
    pub session_expiry_days: i64,
    /// CORS allowed origins (comma-separated, `*` for any)
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: PathBuf::from("./journal.db"),
            session_expiry_days: 30,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = match env::var("PORT") {
            Ok(port) => port.parse().map_err(|_| ConfigError::InvalidPort(port))?,
            Err(_) => defaults.port,
        };

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let session_expiry_days = match env::var("SESSION_EXPIRY_DAYS") {
            Ok(days) => match days.parse::<i64>() {
                Ok(d) if d > 0 => d,
                _ => return Err(ConfigError::InvalidExpiry(days)),
            },
            Err(_) => defaults.session_expiry_days,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|origins| parse_origins(&origins))
            .unwrap_or(defaults.cors_origins);

        Ok(Config {
            host,
            port,
            database_path,
            session_expiry_days,
            cors_origins,
        })
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidExpiry(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort(v) => write!(f, "Invalid PORT environment variable: '{v}'"),
            ConfigError::InvalidExpiry(v) => {
                write!(f, "Invalid SESSION_EXPIRY_DAYS environment variable: '{v}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "0.0.0.0:3000");
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test,,"),
            vec!["http://a.test", "http://b.test"]
        );
        let config = Config {
            cors_origins: parse_origins("http://a.test"),
            ..Config::default()
        };
        assert!(!config.allows_any_origin());
    }
}
