//! Runtime configuration
//!
//! Everything is optional and comes from the environment; CLI flags
//! override on top (see `cli.rs`). There is no config file: the session
//! carries no persisted state.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Hard ceiling on any command deadline
const MAX_TIMEOUT_SECS: u64 = 15;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MUTATE_TIMEOUT_SECS: u64 = 15;

/// AI provider settings; analysis stays disabled without them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub endpoint: String,
    pub key: String,
    pub model: String,
}

/// Assembled runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Subscription override (skip the CLI default)
    pub subscription: Option<String>,
    /// Tenant override
    pub tenant: Option<String>,
    /// Deadline for read-only commands
    pub timeout: Duration,
    /// Deadline for mutating commands
    pub mutate_timeout: Duration,
    /// Serve the demo dataset instead of shelling out
    pub demo: bool,
    pub ai: Option<AiConfig>,
    /// Run analysis automatically when details load (default: manual-only)
    pub ai_auto: bool,
    pub devops_org: Option<String>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subscription: None,
            tenant: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            mutate_timeout: Duration::from_secs(DEFAULT_MUTATE_TIMEOUT_SECS),
            demo: false,
            ai: None,
            ai_auto: false,
            devops_org: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Build from the `AZSCOPE_*` environment surface
    pub fn from_env() -> Self {
        let mut config = Self {
            subscription: non_empty(env::var("AZSCOPE_SUBSCRIPTION").ok()),
            tenant: non_empty(env::var("AZSCOPE_TENANT").ok()),
            demo: flag("AZSCOPE_DEMO"),
            ai_auto: flag("AZSCOPE_AI_AUTO"),
            devops_org: non_empty(env::var("AZSCOPE_DEVOPS_ORG").ok()),
            log_level: non_empty(env::var("AZSCOPE_LOG").ok()),
            ..Self::default()
        };

        if let Some(secs) = parse_secs("AZSCOPE_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs.min(MAX_TIMEOUT_SECS));
        }
        if let Some(secs) = parse_secs("AZSCOPE_MUTATE_TIMEOUT_SECS") {
            config.mutate_timeout = Duration::from_secs(secs.min(MAX_TIMEOUT_SECS));
        }

        if flag("AZSCOPE_AI_ENABLED") {
            match (
                non_empty(env::var("AZSCOPE_AI_ENDPOINT").ok()),
                non_empty(env::var("AZSCOPE_AI_KEY").ok()),
            ) {
                (Some(endpoint), Some(key)) => {
                    config.ai = Some(AiConfig {
                        endpoint,
                        key,
                        model: non_empty(env::var("AZSCOPE_AI_MODEL").ok())
                            .unwrap_or_else(|| "gpt-4o-mini".to_string()),
                    });
                }
                _ => warn!("AZSCOPE_AI_ENABLED set but endpoint/key missing; analysis stays off"),
            }
        }

        config
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn parse_secs(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(secs),
        _ => {
            warn!(%name, %raw, "ignoring unparseable timeout override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "AZSCOPE_SUBSCRIPTION",
            "AZSCOPE_TENANT",
            "AZSCOPE_TIMEOUT_SECS",
            "AZSCOPE_MUTATE_TIMEOUT_SECS",
            "AZSCOPE_DEMO",
            "AZSCOPE_AI_ENABLED",
            "AZSCOPE_AI_ENDPOINT",
            "AZSCOPE_AI_KEY",
            "AZSCOPE_AI_MODEL",
            "AZSCOPE_AI_AUTO",
            "AZSCOPE_DEVOPS_ORG",
            "AZSCOPE_LOG",
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.mutate_timeout, Duration::from_secs(15));
        assert!(!config.demo);
        assert!(config.ai.is_none());
        assert!(!config.ai_auto);
    }

    #[test]
    #[serial]
    fn test_timeout_override_is_capped() {
        clear_env();
        unsafe { std::env::set_var("AZSCOPE_TIMEOUT_SECS", "60") };
        let config = Config::from_env();
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    #[serial]
    fn test_garbage_timeout_ignored() {
        clear_env();
        unsafe { std::env::set_var("AZSCOPE_TIMEOUT_SECS", "soon") };
        let config = Config::from_env();
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    #[serial]
    fn test_ai_requires_endpoint_and_key() {
        clear_env();
        unsafe { std::env::set_var("AZSCOPE_AI_ENABLED", "true") };
        assert!(Config::from_env().ai.is_none());

        unsafe {
            std::env::set_var("AZSCOPE_AI_ENDPOINT", "https://llm.example.com/v1");
            std::env::set_var("AZSCOPE_AI_KEY", "sk-test");
        }
        let config = Config::from_env();
        let ai = config.ai.expect("ai configured");
        assert_eq!(ai.endpoint, "https://llm.example.com/v1");
        assert_eq!(ai.model, "gpt-4o-mini");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_demo_flag_spellings() {
        clear_env();
        for spelling in ["1", "true", "YES", "on"] {
            unsafe { std::env::set_var("AZSCOPE_DEMO", spelling) };
            assert!(Config::from_env().demo, "spelling {:?}", spelling);
        }
        unsafe { std::env::set_var("AZSCOPE_DEMO", "0") };
        assert!(!Config::from_env().demo);
        clear_env();
    }
}
