use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::ClientConfiguration;
use crate::services::fallback::DEFAULT_FALLBACK_DELAY;
use crate::services::meal_analysis::DEFAULT_REQUEST_TIMEOUT;
use crate::services::{JsonEnvelope, StrategyPlan};

const DEFAULT_ENDPOINTS: &str =
    "http://localhost:5678/webhook/meal%20analysis,http://localhost:5678/webhook/meal-analysis";
const DEFAULT_FIELD_NAMES: &str = "image,file,data,body";
const DEFAULT_COMPANION_FIELDS: &str = "data,body";
const DEFAULT_ENVELOPES: &str = "flat,nested,body";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings, loaded from the environment (and `.env`).
///
/// The webhook's request schema is not pinned down, so endpoints, field
/// names and envelopes are all configurable.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoints: Vec<String>,
    pub field_names: Vec<String>,
    pub companion_fields: Vec<String>,
    pub envelopes: Vec<JsonEnvelope>,
    pub offline: bool,
    pub request_timeout: Duration,
    pub fallback_delay: Duration,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| {
                log::debug!("{} not set, using default: {}", key, default);
                default.to_string()
            })
        };

        let endpoints = split_list(&get("FOODSENSE_ENDPOINTS", DEFAULT_ENDPOINTS));
        for endpoint in &endpoints {
            reqwest::Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL '{}'", endpoint))?;
        }

        let envelopes = split_list(&get("FOODSENSE_ENVELOPES", DEFAULT_ENVELOPES))
            .iter()
            .map(|s| s.parse::<JsonEnvelope>())
            .collect::<Result<Vec<_>>>()?;

        let offline = parse_bool(&get("FOODSENSE_OFFLINE", "false"))
            .context("FOODSENSE_OFFLINE must be true or false")?;

        let timeout_secs: u64 = get("FOODSENSE_TIMEOUT_SECS", &DEFAULT_REQUEST_TIMEOUT.as_secs().to_string())
            .trim()
            .parse()
            .context("FOODSENSE_TIMEOUT_SECS must be a whole number of seconds")?;

        let fallback_delay_ms: u64 = get(
            "FOODSENSE_FALLBACK_DELAY_MS",
            &DEFAULT_FALLBACK_DELAY.as_millis().to_string(),
        )
        .trim()
        .parse()
        .context("FOODSENSE_FALLBACK_DELAY_MS must be a whole number of milliseconds")?;

        Ok(Self {
            endpoints,
            field_names: split_list(&get("FOODSENSE_FIELD_NAMES", DEFAULT_FIELD_NAMES)),
            companion_fields: split_list(&get("FOODSENSE_COMPANION_FIELDS", DEFAULT_COMPANION_FIELDS)),
            envelopes,
            offline,
            request_timeout: Duration::from_secs(timeout_secs),
            fallback_delay: Duration::from_millis(fallback_delay_ms),
            bind_addr: get("FOODSENSE_BIND_ADDR", DEFAULT_BIND_ADDR),
        })
    }

    pub fn strategy_plan(&self) -> StrategyPlan {
        StrategyPlan::from_parts(&self.endpoints, &self.field_names, &self.companion_fields, &self.envelopes)
    }

    /// Initial value of the offline toggle.
    pub fn client_configuration(&self) -> ClientConfiguration {
        ClientConfiguration {
            use_offline_fallback: self.offline,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("not a boolean: '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();

        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.field_names, vec!["image", "file", "data", "body"]);
        assert_eq!(config.companion_fields, vec!["data", "body"]);
        assert_eq!(config.envelopes, JsonEnvelope::ALL.to_vec());
        assert!(!config.offline);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.fallback_delay, Duration::from_millis(2000));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        // 2 endpoints x (4 fields + 3 envelopes)
        assert_eq!(config.strategy_plan().len(), 14);
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("FOODSENSE_ENDPOINTS", " https://hooks.example.com/meal , "),
            ("FOODSENSE_FIELD_NAMES", "photo"),
            ("FOODSENSE_COMPANION_FIELDS", ""),
            ("FOODSENSE_ENVELOPES", "body"),
            ("FOODSENSE_OFFLINE", "yes"),
            ("FOODSENSE_TIMEOUT_SECS", "5"),
            ("FOODSENSE_FALLBACK_DELAY_MS", "0"),
        ])
        .unwrap();

        assert_eq!(config.endpoints, vec!["https://hooks.example.com/meal"]);
        assert!(config.companion_fields.is_empty());
        assert_eq!(config.envelopes, vec![JsonEnvelope::Body]);
        assert!(config.client_configuration().use_offline_fallback);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_delay, Duration::ZERO);
        assert_eq!(config.strategy_plan().len(), 2);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_with(&[("FOODSENSE_ENDPOINTS", "not a url")]).is_err());
        assert!(config_with(&[("FOODSENSE_ENVELOPES", "xml")]).is_err());
        assert!(config_with(&[("FOODSENSE_OFFLINE", "maybe")]).is_err());
        assert!(config_with(&[("FOODSENSE_TIMEOUT_SECS", "-1")]).is_err());
    }
}
