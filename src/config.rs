use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityBackend {
    Llm,
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub compatibility_backend: CompatibilityBackend,
    pub generator_timeout_secs: u64,
    pub recommendation_cache_ttl_secs: u64,
    pub cache_sweep_interval_secs: u64,
    pub log_format_json: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let llm_api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let compatibility_backend = resolve_backend(
            env::var("COMPATIBILITY_BACKEND").ok().as_deref(),
            llm_api_key.is_some(),
        )?;

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            llm_api_key,
            llm_api_url: get_env_or("LLM_API_URL", DEFAULT_LLM_API_URL),
            llm_model: get_env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            compatibility_backend,
            generator_timeout_secs: get_env_parse_or("GENERATOR_TIMEOUT_SECS", 60)?,
            recommendation_cache_ttl_secs: get_env_parse_or("RECOMMENDATION_CACHE_TTL_SECS", 3600)?,
            cache_sweep_interval_secs: get_env_parse_or("CACHE_SWEEP_INTERVAL_SECS", 300)?,
            log_format_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

/// `llm` needs an API key; with no explicit choice the key decides.
fn resolve_backend(raw: Option<&str>, has_key: bool) -> Result<CompatibilityBackend> {
    match raw.map(str::trim) {
        Some("heuristic") => Ok(CompatibilityBackend::Heuristic),
        Some("llm") if has_key => Ok(CompatibilityBackend::Llm),
        Some("llm") => Err(Error::Config(
            "COMPATIBILITY_BACKEND=llm requires LLM_API_KEY".to_string(),
        )),
        None | Some("") if has_key => Ok(CompatibilityBackend::Llm),
        None | Some("") => Ok(CompatibilityBackend::Heuristic),
        Some(other) => Err(Error::Config(format!(
            "Invalid value for COMPATIBILITY_BACKEND: {}",
            other
        ))),
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_follows_key_unless_forced() {
        assert_eq!(resolve_backend(None, true).unwrap(), CompatibilityBackend::Llm);
        assert_eq!(resolve_backend(None, false).unwrap(), CompatibilityBackend::Heuristic);
        assert_eq!(
            resolve_backend(Some("heuristic"), true).unwrap(),
            CompatibilityBackend::Heuristic
        );
        assert!(resolve_backend(Some("llm"), false).is_err());
        assert!(resolve_backend(Some("oracle"), true).is_err());
    }
}
