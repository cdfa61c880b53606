use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SidelineError};
use crate::tools::nationality::DEFAULT_NATIONALIZE_ENDPOINT;
use crate::tools::sports::DEFAULT_SPORTSDB_ENDPOINT;
use crate::tools::stocks::DEFAULT_QUOTES_ENDPOINT;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            api_key: None,
            timeout_secs: default_engine_timeout(),
        }
    }
}

fn default_engine_endpoint() -> String {
    "http://127.0.0.1:8700".into()
}

fn default_engine_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TraceConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub workspace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_sportsdb_endpoint")]
    pub sportsdb_endpoint: String,
    #[serde(default = "default_quotes_endpoint")]
    pub quotes_endpoint: String,
    #[serde(default = "default_nationalize_endpoint")]
    pub nationalize_endpoint: String,
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sportsdb_endpoint: default_sportsdb_endpoint(),
            quotes_endpoint: default_quotes_endpoint(),
            nationalize_endpoint: default_nationalize_endpoint(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

fn default_sportsdb_endpoint() -> String {
    DEFAULT_SPORTSDB_ENDPOINT.into()
}

fn default_quotes_endpoint() -> String {
    DEFAULT_QUOTES_ENDPOINT.into()
}

fn default_nationalize_endpoint() -> String {
    DEFAULT_NATIONALIZE_ENDPOINT.into()
}

fn default_tool_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_agent")]
    pub agent: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: default_agent(),
            engine: EngineConfig::default(),
            trace: TraceConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

fn default_agent() -> String {
    "sports_events_agent".into()
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw).map_err(|err| {
            SidelineError::Protocol(format!("Failed to parse configuration: {err}"))
        })?;
        Ok(cfg)
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Configuration from the environment alone, on top of the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    // Single place where process environment is read. Secrets are only ever
    // sourced from here or from the config file, never from literals.
    fn apply_env(&mut self) {
        if let Ok(agent) = env::var("SIDELINE_AGENT") {
            self.agent = agent;
        }
        if let Ok(endpoint) = env::var("SIDELINE_ENGINE_ENDPOINT") {
            self.engine.endpoint = endpoint;
        }
        if let Ok(key) = env::var("SIDELINE_ENGINE_API_KEY") {
            self.engine.api_key = Some(key);
        } else if let Ok(key) = env::var("GOOGLE_API_KEY") {
            self.engine.api_key = Some(key);
        }
        if let Ok(timeout) = env::var("SIDELINE_ENGINE_TIMEOUT") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.engine.timeout_secs = parsed;
            }
        }
        if let Ok(key) = env::var("SIDELINE_TRACE_API_KEY") {
            self.trace.api_key = Some(key);
        }
        if let Ok(workspace) = env::var("SIDELINE_TRACE_WORKSPACE") {
            self.trace.workspace = Some(workspace);
        }
        if let Ok(endpoint) = env::var("SIDELINE_SPORTSDB_ENDPOINT") {
            self.tools.sportsdb_endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("SIDELINE_QUOTES_ENDPOINT") {
            self.tools.quotes_endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("SIDELINE_NATIONALIZE_ENDPOINT") {
            self.tools.nationalize_endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("SIDELINE_TOOL_TIMEOUT") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.tools.timeout_secs = parsed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_self_contained() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.agent, "sports_events_agent");
        assert_eq!(cfg.engine.endpoint, "http://127.0.0.1:8700");
        assert_eq!(cfg.engine.api_key, None);
        assert_eq!(cfg.tools.timeout_secs, 10);
        assert!(cfg.tools.sportsdb_endpoint.starts_with("https://"));
    }

    #[test]
    fn loads_and_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "agent='stock_agent'\n[engine]\nendpoint='http://engine.internal:9000'"
        )
        .unwrap();

        env::set_var("SIDELINE_AGENT", "nationality_agent");
        let cfg = AppConfig::from_env_or_file(file.path()).unwrap();

        assert_eq!(cfg.agent, "nationality_agent");
        assert_eq!(cfg.engine.endpoint, "http://engine.internal:9000");
        env::remove_var("SIDELINE_AGENT");
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[trace]\nworkspace='team-sideline'").unwrap();

        let cfg = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(cfg.agent, "sports_events_agent");
        assert_eq!(cfg.trace.workspace, Some("team-sideline".to_string()));
        assert_eq!(cfg.engine.timeout_secs, 120);
    }

    #[test]
    fn engine_key_falls_back_to_the_google_variable() {
        env::set_var("GOOGLE_API_KEY", "from-google");
        let cfg = AppConfig::from_env();

        assert_eq!(cfg.engine.api_key, Some("from-google".to_string()));
        env::remove_var("GOOGLE_API_KEY");
    }

    #[test]
    fn tool_settings_override_from_env() {
        env::set_var("SIDELINE_SPORTSDB_ENDPOINT", "http://localhost:1234");
        env::set_var("SIDELINE_TOOL_TIMEOUT", "3");
        let cfg = AppConfig::from_env();

        assert_eq!(cfg.tools.sportsdb_endpoint, "http://localhost:1234");
        assert_eq!(cfg.tools.timeout_secs, 3);

        env::set_var("SIDELINE_TOOL_TIMEOUT", "not-a-number");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.tools.timeout_secs, 10);

        env::remove_var("SIDELINE_SPORTSDB_ENDPOINT");
        env::remove_var("SIDELINE_TOOL_TIMEOUT");
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "agent = [unterminated").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();

        assert!(err.to_string().contains("Failed to parse configuration"));
    }
}
