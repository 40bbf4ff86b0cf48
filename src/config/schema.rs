/// Configuration schema and defaults for the daec client.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[api]`, `[session]`, `[expressions]` and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level daec configuration.
///
/// Maps directly to the `~/.daec/config.toml` and `.daec.toml` file schemas.
/// All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaecConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub expressions: ExpressionsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Where the expression service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service origin including the version prefix.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` waits indefinitely.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/v1".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Which session file to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session name; each name is an independent "browsing session".
    pub name: String,
    /// Directory holding session files. Defaults to `~/.daec/sessions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [expressions]
// ---------------------------------------------------------------------------

/// When the expression input is cleared after a submission settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClearInput {
    /// Clear after success and after failure.
    #[default]
    Always,
    /// Keep rejected input so it can be corrected.
    OnSuccess,
}

impl fmt::Display for ClearInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::OnSuccess => write!(f, "on-success"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionsConfig {
    pub clear_input: ClearInput,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DaecConfig {
    /// Commented default config written by `daec config init`.
    pub fn default_toml() -> String {
        r#"# daec configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (DAEC_*)
#   2. Project config (.daec.toml in current directory)
#   3. User global config (~/.daec/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://localhost:3000/v1"
timeout_ms = 10000                    # 0 = wait indefinitely

[session]
name = "default"                      # or DAEC_SESSION; one file per session
# dir = "/path/to/sessions"           # defaults to ~/.daec/sessions

[expressions]
clear_input = "always"                # always | on-success

[logging]
level = "warn"                        # RUST_LOG overrides
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = DaecConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:3000/v1");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.session.name, "default");
        assert!(config.session.dir.is_none());
        assert_eq!(config.expressions.clear_input, ClearInput::Always);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[api]
base_url = "http://calc.internal/v1"
"#;
        let config: DaecConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://calc.internal/v1");
        // Unset fields fall back to defaults
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.session.name, "default");
    }

    #[test]
    fn clear_input_parses_kebab_case() {
        let config: DaecConfig = toml::from_str("[expressions]\nclear_input = \"on-success\"\n").unwrap();
        assert_eq!(config.expressions.clear_input, ClearInput::OnSuccess);
        assert_eq!(ClearInput::OnSuccess.to_string(), "on-success");
    }

    #[test]
    fn default_toml_parses_back() {
        let config: DaecConfig = toml::from_str(&DaecConfig::default_toml()).unwrap();
        assert_eq!(config, DaecConfig::default());
    }

    #[test]
    fn serialized_defaults_round_trip() {
        let toml_str = toml::to_string_pretty(&DaecConfig::default()).unwrap();
        let config: DaecConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, DaecConfig::default());
    }
}
