use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::engine::EngineOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub const CONFIG_FILE: &str = ".pr-review.toml";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_SAMPLE_PATH: &str = "demos/sample-pr-1.md";

/// Top-level configuration loaded from .pr-review.toml and the environment.
///
/// All fields are optional, the service runs in demo mode with zero config.
/// Built once at startup and handed to the reviewer; nothing reads the
/// environment after that.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    /// Workflow engine (Kestra) connection
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub demo: DemoConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. Overridden by GITHUB_TOKEN.
    pub token: Option<String>,
    /// REST base URL, defaults to https://api.github.com
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub api_url: Option<String>,
    pub tenant_id: Option<String>,
    /// Defaults to the tenant id when unset
    pub namespace: Option<String>,
    pub flow_id: Option<String>,
    pub api_key: Option<String>,
    /// Overall wait for one execution, in milliseconds
    pub timeout_ms: Option<u64>,
    /// Reserved. Fallback to the local summarizer is unconditional.
    #[serde(default = "default_true")]
    pub fallback_on_error: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            tenant_id: None,
            namespace: None,
            flow_id: None,
            api_key: None,
            timeout_ms: None,
            fallback_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoConfig {
    /// Process-wide demo switch
    #[serde(default)]
    pub enabled: bool,
    /// Sample document summarized in demo mode
    pub sample_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// The engine is only attempted when URL, tenant and flow are all present.
    pub fn is_configured(&self) -> bool {
        [&self.api_url, &self.tenant_id, &self.flow_id]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// Connection options for the engine client, or None when not configured.
    pub fn options(&self) -> Option<EngineOptions> {
        if !self.is_configured() {
            return None;
        }
        let tenant_id = self.tenant_id.clone().unwrap_or_default();
        let namespace = self
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(tenant_id);
        let mut options = EngineOptions::new(
            self.api_url.as_deref().unwrap_or_default(),
            &namespace,
            self.flow_id.as_deref().unwrap_or_default(),
        );
        options.api_key = self.api_key.clone().filter(|k| !k.is_empty());
        if let Some(ms) = self.timeout_ms.filter(|ms| *ms > 0) {
            options.timeout = Duration::from_millis(ms);
        }
        Some(options)
    }
}

impl Config {
    /// Load configuration from .pr-review.toml in the current directory,
    /// then overlay environment variables.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Overlay environment-style settings resolved through `lookup`.
    /// A bad or zero `KESTRA_TIMEOUT` is logged and leaves the timeout as is.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |slot: &mut Option<String>, name: &str| {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        };

        set(&mut self.github.token, "GITHUB_TOKEN");
        set(&mut self.github.api_url, "GITHUB_API_URL");
        set(&mut self.engine.api_url, "KESTRA_API_URL");
        set(&mut self.engine.tenant_id, "KESTRA_TENANT_ID");
        set(&mut self.engine.namespace, "KESTRA_NAMESPACE");
        set(&mut self.engine.flow_id, "KESTRA_FLOW_ID");
        set(&mut self.engine.api_key, "KESTRA_API_KEY");
        set(&mut self.server.bind, "PR_REVIEW_BIND");

        if let Some(raw) = lookup("KESTRA_TIMEOUT").filter(|v| !v.is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.engine.timeout_ms = Some(ms),
                _ => warn!(value = %raw, "ignoring KESTRA_TIMEOUT, expected a positive number of milliseconds"),
            }
        }

        if let Some(raw) = lookup("KESTRA_FALLBACK_ON_ERROR") {
            self.engine.fallback_on_error = raw != "false";
        }

        if lookup("DEMO_MODE").as_deref() == Some("true")
            || lookup("VITE_DEMO_MODE").as_deref() == Some("true")
        {
            self.demo.enabled = true;
        }
    }

    /// GitHub token, if one is configured and non-empty.
    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn github_api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    pub fn sample_path(&self) -> &Path {
        self.demo
            .sample_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SAMPLE_PATH))
    }

    pub fn bind_addr(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::DEFAULT_TIMEOUT;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github_token().is_none());
        assert!(!config.engine.is_configured());
        assert!(config.engine.options().is_none());
        assert!(config.engine.fallback_on_error);
        assert!(!config.demo.enabled);
        assert_eq!(config.github_api_url(), DEFAULT_GITHUB_API_URL);
        assert_eq!(config.bind_addr(), DEFAULT_BIND);
        assert_eq!(config.sample_path(), Path::new(DEFAULT_SAMPLE_PATH));
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "ghp_file"

[engine]
api_url = "https://kestra.local"
tenant_id = "agentflow"
flow_id = "pr-review-agent"
timeout_ms = 10000

[demo]
enabled = true
sample_path = "fixtures/sample.md"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token(), Some("ghp_file"));
        assert!(config.engine.is_configured());
        assert!(config.engine.fallback_on_error);
        assert!(config.demo.enabled);
        assert_eq!(config.sample_path(), Path::new("fixtures/sample.md"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: Config = toml::from_str("[github]\ntoken = \"from-file\"").unwrap();
        config.apply_env(env(&[
            ("GITHUB_TOKEN", "from-env"),
            ("KESTRA_API_URL", "https://kestra.local"),
            ("KESTRA_TENANT_ID", "tenant"),
            ("KESTRA_FLOW_ID", "pr-review-agent"),
            ("KESTRA_API_KEY", "key"),
            ("KESTRA_TIMEOUT", "5000"),
        ]));

        assert_eq!(config.github_token(), Some("from-env"));
        let options = config.engine.options().unwrap();
        assert_eq!(options.namespace, "tenant");
        assert_eq!(options.flow_id, "pr-review-agent");
        assert_eq!(options.api_key.as_deref(), Some("key"));
        assert_eq!(options.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_engine_requires_all_three_settings() {
        let mut config = Config::default();
        config.apply_env(env(&[("KESTRA_API_URL", "https://kestra.local"), ("KESTRA_FLOW_ID", "f")]));
        assert!(!config.engine.is_configured());
    }

    #[test]
    fn test_explicit_namespace_wins_over_tenant() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("KESTRA_API_URL", "https://kestra.local"),
            ("KESTRA_TENANT_ID", "tenant"),
            ("KESTRA_NAMESPACE", "company.team"),
            ("KESTRA_FLOW_ID", "f"),
        ]));
        assert_eq!(config.engine.options().unwrap().namespace, "company.team");
    }

    #[test]
    fn test_demo_mode_env_aliases() {
        let mut config = Config::default();
        config.apply_env(env(&[("DEMO_MODE", "false")]));
        assert!(!config.demo.enabled);

        config.apply_env(env(&[("VITE_DEMO_MODE", "true")]));
        assert!(config.demo.enabled);
    }

    #[test]
    fn test_fallback_on_error_only_disabled_by_false() {
        let mut config = Config::default();
        config.apply_env(env(&[("KESTRA_FALLBACK_ON_ERROR", "no")]));
        assert!(config.engine.fallback_on_error);
        config.apply_env(env(&[("KESTRA_FALLBACK_ON_ERROR", "false")]));
        assert!(!config.engine.fallback_on_error);
    }

    #[test]
    fn test_unusable_timeout_keeps_default() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("KESTRA_API_URL", "https://kestra.local"),
            ("KESTRA_TENANT_ID", "tenant"),
            ("KESTRA_FLOW_ID", "f"),
            ("KESTRA_TIMEOUT", "soon"),
        ]));
        assert_eq!(config.engine.timeout_ms, None);
        assert_eq!(config.engine.options().unwrap().timeout, DEFAULT_TIMEOUT);

        config.apply_env(env(&[("KESTRA_TIMEOUT", "0")]));
        assert_eq!(config.engine.timeout_ms, None);

        config.apply_env(env(&[("KESTRA_TIMEOUT", "2500")]));
        config.apply_env(env(&[("KESTRA_TIMEOUT", "later")]));
        assert_eq!(config.engine.timeout_ms, Some(2500));
    }

    #[test]
    fn test_zero_timeout_in_file_uses_default() {
        let mut config = Config::default();
        config.engine.api_url = Some("https://kestra.local".into());
        config.engine.tenant_id = Some("tenant".into());
        config.engine.flow_id = Some("f".into());
        config.engine.timeout_ms = Some(0);
        assert_eq!(config.engine.options().unwrap().timeout, DEFAULT_TIMEOUT);
    }
}
