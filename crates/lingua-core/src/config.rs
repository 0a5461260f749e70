//! Configuration module
//!
//! Database, logging and role-model settings, read from the environment (a `.env`
//! file is loaded first when present).

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ROLE_TIERS: &str = "VIEWER,TRANSLATOR,REVIEWER,LEAD,ADMIN";
const DEFAULT_ROLE_TRANSLATE: &str = "TRANSLATOR";
const DEFAULT_ROLE_REVIEW: &str = "REVIEWER";
const DEFAULT_ROLE_ADMINISTER: &str = "LEAD";

/// Output format for the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub log_format: LogFormat,
    /// Role tiers, lowest privilege first
    pub role_tiers: Vec<String>,
    pub role_translate: String,
    pub role_review: String,
    pub role_administer: String,
    /// Whether a content update returns a reviewed message to PENDING
    pub update_resets_status: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "text".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(anyhow::anyhow!(
                    "LOG_FORMAT must be 'text' or 'json', got '{}'",
                    other
                ))
            }
        };

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            log_format,
            role_tiers: parse_list(
                &env::var("ROLE_TIERS").unwrap_or_else(|_| DEFAULT_ROLE_TIERS.to_string()),
            ),
            role_translate: env::var("ROLE_TRANSLATE")
                .unwrap_or_else(|_| DEFAULT_ROLE_TRANSLATE.to_string()),
            role_review: env::var("ROLE_REVIEW").unwrap_or_else(|_| DEFAULT_ROLE_REVIEW.to_string()),
            role_administer: env::var("ROLE_ADMINISTER")
                .unwrap_or_else(|_| DEFAULT_ROLE_ADMINISTER.to_string()),
            update_resets_status: env::var("UPDATE_RESETS_STATUS")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for a given database with every other setting at its default
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            environment: "development".to_string(),
            log_format: LogFormat::Text,
            role_tiers: parse_list(DEFAULT_ROLE_TIERS),
            role_translate: DEFAULT_ROLE_TRANSLATE.to_string(),
            role_review: DEFAULT_ROLE_REVIEW.to_string(),
            role_administer: DEFAULT_ROLE_ADMINISTER.to_string(),
            update_resets_status: false,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL cannot be empty"));
        }
        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }
        // Building the policy checks tiers and thresholds
        crate::roles::AccessPolicy::from_config(self)?;
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    pub fn role_tiers(&self) -> &[String] {
        &self.role_tiers
    }

    pub fn role_translate(&self) -> &str {
        &self.role_translate
    }

    pub fn role_review(&self) -> &str {
        &self.role_review
    }

    pub fn role_administer(&self) -> &str {
        &self.role_administer
    }

    pub fn update_resets_status(&self) -> bool {
        self.update_resets_status
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::with_database_url("postgres://localhost/lingua");
        assert!(config.validate().is_ok());
        assert_eq!(config.role_tiers().len(), 5);
        assert!(!config.update_resets_status());
        assert!(!config.is_production());
    }

    #[test]
    fn test_validate_rejects_threshold_outside_tiers() {
        let mut config = Config::with_database_url("postgres://localhost/lingua");
        config.role_administer = "OWNER".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let config = Config::with_database_url("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_list_trims_and_skips_blanks() {
        assert_eq!(
            parse_list(" viewer, ,lead ,"),
            vec!["viewer".to_string(), "lead".to_string()]
        );
    }
}
