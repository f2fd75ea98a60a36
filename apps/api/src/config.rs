use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::orchestrator::PipelineSettings;
use crate::llm_client::{GatewaySettings, DEFAULT_TOKEN_URL};

/// Application configuration loaded from environment variables.
/// Malformed values fail startup; missing LLM credentials only disable the gateway.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `None` runs the pipeline in template-only mode.
    pub gateway: Option<GatewaySettings>,
    pub pipeline: PipelineSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token_expiry_skew = Duration::from_secs(parse_or(&lookup, "TOKEN_EXPIRY_SKEW_SECS", 60)?);
        let gateway = match (non_blank("LLM_API_URL"), non_blank("LLM_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(GatewaySettings {
                api_url,
                token_url: non_blank("LLM_TOKEN_URL")
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                api_key,
                token_expiry_skew,
            }),
            _ => None,
        };

        let pipeline = PipelineSettings {
            branch_timeout: Duration::from_millis(parse_or(&lookup, "BRANCH_TIMEOUT_MS", 3000)?),
            request_timeout: Duration::from_millis(parse_or(&lookup, "REQUEST_TIMEOUT_MS", 10_000)?),
            llm_timeout: Duration::from_millis(parse_or(&lookup, "LLM_CALL_TIMEOUT_MS", 2500)?),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            gateway,
            pipeline,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_llm_credentials() {
        let config = load(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert!(config.gateway.is_none());
        assert_eq!(config.pipeline.branch_timeout, Duration::from_millis(3000));
        assert_eq!(config.pipeline.request_timeout, Duration::from_millis(10_000));
        assert_eq!(config.pipeline.llm_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_gateway_enabled_when_url_and_key_present() {
        let config = load(&[
            ("LLM_API_URL", "http://llm.local/generate"),
            ("LLM_API_KEY", "secret"),
            ("TOKEN_EXPIRY_SKEW_SECS", "30"),
        ])
        .unwrap();

        let gateway = config.gateway.unwrap();
        assert_eq!(gateway.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(gateway.api_key, "secret");
        assert_eq!(gateway.token_expiry_skew, Duration::from_secs(30));
    }

    #[test]
    fn test_blank_key_means_template_only() {
        let config = load(&[("LLM_API_URL", "http://llm.local"), ("LLM_API_KEY", "  ")]).unwrap();
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = load(&[("BRANCH_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("BRANCH_TIMEOUT_MS"));
    }
}
