//! Runtime configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level agent runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier passed through to the provider adapter
    pub model: String,

    /// Maximum agent-loop iterations per user message
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,

    /// Tool-call rate limits
    pub limits: RateLimitConfig,

    /// Per-tool default parameters
    pub tools: ToolDefaults,

    /// Path sandbox configuration
    pub sandbox: SandboxConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4".to_string(),
            max_iterations: 10,
            limits: RateLimitConfig::default(),
            tools: ToolDefaults::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Validate configuration before use
    ///
    /// Call this early so a misconfigured host fails fast with a clear
    /// message instead of a dead agent loop.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(eyre::eyre!("max-iterations must be at least 1"));
        }
        if self.limits.max_calls_per_session == 0 {
            return Err(eyre::eyre!("max-calls-per-session must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `.agent.yml` in the workspace, then the user
    /// config dir, then defaults.
    pub fn load(config_path: Option<&PathBuf>, workspace: &Path) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = workspace.join(".agent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("agent-runtime").join("agent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Rate limits applied to tool execution, per conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Total tool calls allowed in one conversation session
    #[serde(rename = "max-calls-per-session")]
    pub max_calls_per_session: usize,

    /// Tool calls allowed within any sliding 60-second window
    #[serde(rename = "max-calls-per-minute")]
    pub max_calls_per_minute: usize,

    /// Minimum gap between consecutive tool calls
    #[serde(rename = "cooldown-ms")]
    pub cooldown_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls_per_session: 100,
            max_calls_per_minute: 30,
            cooldown_ms: 2000,
        }
    }
}

/// Default parameters for the builtin tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    /// Global match cap for grep
    #[serde(rename = "grep-max-results")]
    pub grep_max_results: usize,

    /// Result cap for find_by_name
    #[serde(rename = "find-max-results")]
    pub find_max_results: usize,

    /// Walk depth cap for find_by_name
    #[serde(rename = "find-max-depth")]
    pub find_max_depth: usize,

    /// Descent depth cap for recursive list_dir
    #[serde(rename = "list-max-depth")]
    pub list_max_depth: usize,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            grep_max_results: 50,
            find_max_results: 100,
            find_max_depth: 10,
            list_max_depth: 3,
        }
    }
}

/// Path sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Absolute prefixes tools may touch outside the workspace root
    #[serde(rename = "allowed-roots")]
    pub allowed_roots: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            allowed_roots: crate::tools::sandbox::DEFAULT_ALLOWED_ROOTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();

        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.limits.max_calls_per_session, 100);
        assert_eq!(config.limits.max_calls_per_minute, 30);
        assert_eq!(config.limits.cooldown_ms, 2000);
        assert_eq!(config.tools.grep_max_results, 50);
        assert!(config.sandbox.allowed_roots.contains(&"/home".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let config = AgentConfig {
            max_iterations: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("agent.yml");
        fs::write(
            &path,
            "max-iterations: 4\nlimits:\n  cooldown-ms: 0\n  max-calls-per-minute: 5\n",
        )
        .unwrap();

        let config = AgentConfig::load(Some(&path), temp.path()).unwrap();

        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.limits.cooldown_ms, 0);
        assert_eq!(config.limits.max_calls_per_minute, 5);
        // Unspecified fields fall back to defaults
        assert_eq!(config.limits.max_calls_per_session, 100);
    }

    #[test]
    fn test_load_workspace_local_config() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".agent.yml"), "max-iterations: 2\n").unwrap();

        let config = AgentConfig::load(None, temp.path()).unwrap();

        assert_eq!(config.max_iterations, 2);
    }

    #[test]
    fn test_load_missing_falls_back_to_defaults() {
        let temp = tempdir().unwrap();

        let config = AgentConfig::load(None, temp.path()).unwrap();

        assert_eq!(config.max_iterations, 10);
    }
}
