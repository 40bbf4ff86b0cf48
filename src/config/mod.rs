/// Configuration system for daec.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DaecConfig::default()`]
/// 2. **User global config**: `~/.daec/config.toml`
/// 3. **Project local config**: `.daec.toml` in the current working directory
/// 4. **Environment variables**: `DAEC_*` overrides (highest precedence)
///
/// Later layers override earlier ones. Missing sections in a TOML file fall
/// back to defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use daec::config;
///
/// let (cfg, _warnings) = config::load();
/// let client = daec::api::GatewayClient::from_config(&cfg.api);
/// ```
pub mod schema;

use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DaecConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// A problem found while loading config files.
///
/// Loading runs before the log subscriber exists, so problems are collected
/// and handed back for the caller to log once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub path: Option<PathBuf>,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Malformed layers are skipped and reported in the returned warnings.
pub fn load() -> (DaecConfig, Vec<ConfigWarning>) {
    let mut warnings = Vec::new();
    let mut merged = toml::Value::Table(toml::Table::new());

    // Layer 2: user global config (~/.daec/config.toml)
    if let Some(global) = load_toml_file(global_config_path(), &mut warnings) {
        merge_values(&mut merged, global);
    }

    // Layer 3: project local config (.daec.toml)
    if let Some(project) = load_toml_file(project_config_path(), &mut warnings) {
        merge_values(&mut merged, project);
    }

    let mut config = match merged.try_into::<DaecConfig>() {
        Ok(config) => config,
        Err(e) => {
            warnings.push(ConfigWarning {
                path: None,
                message: format!("config files disagree with the schema, using defaults: {e}"),
            });
            DaecConfig::default()
        }
    };

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    (config, warnings)
}

/// Load a TOML config file from the given path (if it exists).
fn load_toml_file(
    path: Option<PathBuf>,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warnings.push(ConfigWarning {
                message: format!("ignoring malformed config file: {e}"),
                path: Some(path),
            });
            None
        }
    }
}

/// Merge a config layer into the accumulated one, key by key.
///
/// Tables merge recursively; any other overlay value replaces the base.
/// Keys no layer sets fall back to the schema defaults on deserialize.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.daec/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".daec").join("config.toml"))
}

/// Path to the project local config: `.daec.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".daec.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `DAEC_API_URL`: service base URL
/// - `DAEC_API_TIMEOUT_MS`: request timeout (`0` = none)
/// - `DAEC_SESSION`: session name
/// - `DAEC_SESSION_DIR`: session directory
/// - `DAEC_CLEAR_INPUT`: `always` | `on-success`
/// - `DAEC_LOG_LEVEL`: log filter when `RUST_LOG` is unset
fn apply_env_overrides(config: &mut DaecConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("DAEC_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Some(val) = var("DAEC_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = var("DAEC_SESSION")
        && !val.is_empty()
    {
        config.session.name = val;
    }
    if let Some(val) = var("DAEC_SESSION_DIR")
        && !val.is_empty()
    {
        config.session.dir = Some(PathBuf::from(val));
    }
    if let Some(val) = var("DAEC_CLEAR_INPUT")
        && let Some(policy) = parse_clear_input(&val)
    {
        config.expressions.clear_input = policy;
    }
    if let Some(val) = var("DAEC_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Parse a clear-input policy string.
fn parse_clear_input(val: &str) -> Option<schema::ClearInput> {
    match val.to_ascii_lowercase().as_str() {
        "always" => Some(schema::ClearInput::Always),
        "on-success" | "on_success" | "onsuccess" => Some(schema::ClearInput::OnSuccess),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.daec/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.daec/ directory")?;
    }

    fs::write(&path, DaecConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `api.base_url`. The existing value's type
/// decides how `value` is parsed.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DaecConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    // Reject edits that would no longer load as a config.
    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    toml::from_str::<DaecConfig>(&output)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config(config: &DaecConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
