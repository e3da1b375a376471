use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{IdHistoryError, Result};
use crate::validation::SUPPORTED_LANGS;

fn invalid_config(message: impl Into<String>) -> IdHistoryError {
    IdHistoryError::Validation(message.into())
}

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub search: SearchConfig,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub export: ExportConfig,
    /// Fallback language when a user has no stored preference
    pub default_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results per page
    pub page_size: u64,
    /// Minimum seconds between two searches by the same user
    pub min_interval_secs: i64,
    /// Rows returned by the "my recent searches" listing
    pub history_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide superadmin identity (0 disables superadmin shortcuts)
    pub superadmin_id: i64,
    /// Timeout for the chat membership query during a claim
    pub membership_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub dir: String,
    pub ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "data/id_history.db".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            search: SearchConfig {
                page_size: 5,
                min_interval_secs: 2,
                history_limit: 10,
            },
            auth: AuthConfig {
                superadmin_id: 0,
                membership_timeout_secs: 10,
            },
            session: SessionConfig {
                dir: ".session_store".to_string(),
                ttl_secs: 600,
            },
            export: ExportConfig {
                default_format: "csv".to_string(),
                output_directory: "./output".to_string(),
            },
            default_lang: "ru".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        // Start with default values
        let mut builder = Config::builder();
        for (key, value) in AppConfig::default() {
            builder = builder
                .set_default(key, value)
                .map_err(|e| invalid_config(format!("Failed to seed configuration defaults: {e}")))?;
        }

        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("ID_HISTORY").separator("_"))
            .build()
            .map_err(|e| invalid_config(format!("Failed to load configuration: {e}")))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| invalid_config(format!("Failed to deserialize configuration: {e}")))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.max_connections == 0 {
            return Err(invalid_config("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(invalid_config(
                "connection_timeout_secs must be greater than 0",
            ));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid_config(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                self.logging.level
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid_config(format!(
                "Invalid log format: {}. Must be one of: {valid_formats:?}",
                self.logging.format
            )));
        }

        // Validate search config
        if self.search.page_size == 0 {
            return Err(invalid_config("page_size must be greater than 0"));
        }
        if self.search.min_interval_secs < 0 {
            return Err(invalid_config("min_interval_secs cannot be negative"));
        }
        if self.search.history_limit == 0 {
            return Err(invalid_config("history_limit must be greater than 0"));
        }

        // Validate auth config
        if self.auth.membership_timeout_secs == 0 {
            return Err(invalid_config(
                "membership_timeout_secs must be greater than 0",
            ));
        }

        // Validate session config
        if self.session.ttl_secs <= 0 {
            return Err(invalid_config("session ttl_secs must be greater than 0"));
        }

        // Validate export config
        let valid_formats = ["csv", "json"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(invalid_config(format!(
                "Invalid export format: {}. Must be one of: {valid_formats:?}",
                self.export.default_format
            )));
        }

        if !SUPPORTED_LANGS.contains(&self.default_lang.as_str()) {
            return Err(invalid_config(format!(
                "Invalid default language: {}. Must be one of: {SUPPORTED_LANGS:?}",
                self.default_lang
            )));
        }

        Ok(())
    }

    /// Get database URL from environment or config
    #[must_use]
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert(
            "database.url".to_string(),
            config::Value::from(self.database.url),
        );
        map.insert(
            "database.max_connections".to_string(),
            config::Value::from(self.database.max_connections),
        );
        map.insert(
            "database.connection_timeout_secs".to_string(),
            config::Value::from(self.database.connection_timeout_secs),
        );

        map.insert(
            "logging.level".to_string(),
            config::Value::from(self.logging.level),
        );
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }
        map.insert(
            "logging.format".to_string(),
            config::Value::from(self.logging.format),
        );

        map.insert(
            "search.page_size".to_string(),
            config::Value::from(self.search.page_size),
        );
        map.insert(
            "search.min_interval_secs".to_string(),
            config::Value::from(self.search.min_interval_secs),
        );
        map.insert(
            "search.history_limit".to_string(),
            config::Value::from(self.search.history_limit),
        );

        map.insert(
            "auth.superadmin_id".to_string(),
            config::Value::from(self.auth.superadmin_id),
        );
        map.insert(
            "auth.membership_timeout_secs".to_string(),
            config::Value::from(self.auth.membership_timeout_secs),
        );

        map.insert(
            "session.dir".to_string(),
            config::Value::from(self.session.dir),
        );
        map.insert(
            "session.ttl_secs".to_string(),
            config::Value::from(self.session.ttl_secs),
        );

        map.insert(
            "export.default_format".to_string(),
            config::Value::from(self.export.default_format),
        );
        map.insert(
            "export.output_directory".to_string(),
            config::Value::from(self.export.output_directory),
        );

        map.insert(
            "default_lang".to_string(),
            config::Value::from(self.default_lang),
        );

        map.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "data/id_history.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.search.page_size, 5);
        assert_eq!(config.search.min_interval_secs, 2);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_page_size() {
        let mut config = AppConfig::default();
        config.search.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_default_lang() {
        let mut config = AppConfig::default();
        config.default_lang = "fr".to_string();
        assert!(config.validate().is_err());
    }
}
