use std::fmt;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

const DEFAULT_CHAT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Server configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub chat: ChatConfig,
}

/// External generative-text provider settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    /// Server-held provider credential. When unset the relay always
    /// answers with its fallback reply.
    pub api_key: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "{} must be set", name),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from the environment. The database URL and the
    /// token-signing secret are mandatory; startup aborts without them.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require("DATABASE_URL")?;
        let jwt_secret = require("JWT_SECRET")?;
        let listen_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let api_url =
            std::env::var("CHAT_API_URL").unwrap_or_else(|_| DEFAULT_CHAT_API_URL.to_string());
        let api_key = std::env::var("CHAT_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            listen_addr,
            database_url,
            jwt_secret,
            chat: ChatConfig { api_url, api_key },
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serialize access to env vars to avoid races between parallel tests
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const ALL_VARS: [&str; 5] = [
        "DATABASE_URL",
        "JWT_SECRET",
        "LISTEN_ADDR",
        "CHAT_API_URL",
        "CHAT_API_KEY",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_missing_database_url_fails() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("JWT_SECRET", "secret");

        let result = Config::from_env();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "DATABASE_URL must be set");
    }

    #[test]
    fn test_missing_jwt_secret_fails() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("DATABASE_URL", "sqlite://finwise.db");

        assert!(Config::from_env().is_err());
    }

    #[test]
    fn test_empty_jwt_secret_fails() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("DATABASE_URL", "sqlite://finwise.db");
        std::env::set_var("JWT_SECRET", "");

        assert!(Config::from_env().is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("DATABASE_URL", "sqlite://finwise.db");
        std::env::set_var("JWT_SECRET", "secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.chat.api_url, DEFAULT_CHAT_API_URL);
        assert!(config.chat.api_key.is_none());
    }

    #[test]
    fn test_explicit_values_win() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        std::env::set_var("DATABASE_URL", "sqlite://other.db");
        std::env::set_var("JWT_SECRET", "secret");
        std::env::set_var("LISTEN_ADDR", "127.0.0.1:8080");
        std::env::set_var("CHAT_API_URL", "http://localhost:9000/generate");
        std::env::set_var("CHAT_API_KEY", "k-123");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "sqlite://other.db");
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.chat.api_url, "http://localhost:9000/generate");
        assert_eq!(config.chat.api_key.as_deref(), Some("k-123"));
        clear_env();
    }
}
