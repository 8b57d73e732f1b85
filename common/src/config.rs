use crate::error::{Result, SciSciError};
use crate::llm::model::ModelConfig;
use std::env;
use std::str::FromStr;

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// runtime settings resolved from the environment (and `.env`, when present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub database_url: Option<String>,
    pub model: ModelConfig,
    pub query_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            database_url: None,
            model: ModelConfig::default(),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// build from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            database_url: get("DATABASE_URL"),
            model: ModelConfig {
                model: get("SCISCI_MODEL").unwrap_or(defaults.model.model),
                base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.model.base_url),
                timeout_secs: parse_or(
                    "SCISCI_COMPLETION_TIMEOUT_SECS",
                    get("SCISCI_COMPLETION_TIMEOUT_SECS"),
                    defaults.model.timeout_secs,
                )?,
                max_attempts: parse_or(
                    "SCISCI_COMPLETION_ATTEMPTS",
                    get("SCISCI_COMPLETION_ATTEMPTS"),
                    defaults.model.max_attempts,
                )?,
            },
            query_timeout_secs: parse_or(
                "SCISCI_QUERY_TIMEOUT_SECS",
                get("SCISCI_QUERY_TIMEOUT_SECS"),
                defaults.query_timeout_secs,
            )?,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| SciSciError::Config("OPENAI_API_KEY is not set".to_string()))
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| SciSciError::Config("DATABASE_URL is not set".to_string()))
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            SciSciError::Config(format!("{} must be a number, got {:?}", key, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert!(config.openai_api_key.is_none());
        assert_eq!(config.model.model, "gpt-3.5-turbo");
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.model.max_attempts, 2);
        assert_eq!(config.query_timeout_secs, 30);
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DATABASE_URL", "postgres://localhost/scisci"),
            ("SCISCI_MODEL", "gpt-4o-mini"),
            ("SCISCI_COMPLETION_TIMEOUT_SECS", "10"),
            ("SCISCI_COMPLETION_ATTEMPTS", "3"),
            ("SCISCI_QUERY_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/scisci");
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.timeout_secs, 10);
        assert_eq!(config.model.max_attempts, 3);
        assert_eq!(config.query_timeout_secs, 5);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let result = AppConfig::from_lookup(lookup(&[("SCISCI_QUERY_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(SciSciError::Config(_))));
    }
}
