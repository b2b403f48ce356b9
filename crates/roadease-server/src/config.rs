use config::{Config, ConfigError, Environment};
use roadease_db::DbConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Fallback filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// SurrealDB endpoint (`ws://host:port` or `mem://`)
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,

    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,

    #[serde(default = "default_db_database")]
    pub db_database: String,

    #[serde(default = "default_db_username")]
    pub db_username: String,

    #[serde(default = "default_db_password")]
    #[serde(skip_serializing)]
    pub db_password: String,

    /// Upper bound for connecting, migrating and seeding, in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_endpoint() -> String {
    DbConfig::default().endpoint
}

fn default_db_namespace() -> String {
    DbConfig::default().namespace
}

fn default_db_database() -> String {
    DbConfig::default().database
}

fn default_db_username() -> String {
    DbConfig::default().username
}

fn default_db_password() -> String {
    DbConfig::default().password
}

fn default_startup_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("ROADEASE"))
            .build()?
            .try_deserialize()
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            endpoint: self.db_endpoint.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        unsafe {
            std::env::remove_var("ROADEASE_LOG_LEVEL");
            std::env::remove_var("ROADEASE_DB_ENDPOINT");
            std::env::remove_var("ROADEASE_STARTUP_TIMEOUT_SECS");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.db_endpoint, "ws://127.0.0.1:8000");
        assert_eq!(config.db_namespace, "roadease");
        assert_eq!(config.startup_timeout_secs, 30);
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        unsafe {
            std::env::set_var("ROADEASE_LOG_LEVEL", "debug");
            std::env::set_var("ROADEASE_DB_ENDPOINT", "mem://");
            std::env::set_var("ROADEASE_STARTUP_TIMEOUT_SECS", "5");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.db_config().endpoint, "mem://");
        assert_eq!(config.startup_timeout_secs, 5);

        unsafe {
            std::env::remove_var("ROADEASE_LOG_LEVEL");
            std::env::remove_var("ROADEASE_DB_ENDPOINT");
            std::env::remove_var("ROADEASE_STARTUP_TIMEOUT_SECS");
        }
    }

    #[test]
    fn password_is_not_serialized() {
        let _lock = TEST_LOCK.lock().unwrap();
        let config = ServerConfig::from_env().unwrap();
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("db_password"));
    }
}
