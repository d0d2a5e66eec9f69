//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bintree/bintree.toml`
//! 3. Local config: `<dir>/.bintree.toml` (usually the working directory)
//! 4. Environment variables: `BINTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
#[error("config error: {message}")]
pub struct SettingsError {
    pub message: String,
}

/// Raw settings for intermediate parsing (every field optional so that
/// "not specified" can be told apart from an explicit value).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub dump_dir: Option<PathBuf>,
    pub dump_name: Option<String>,
    pub renderer: Option<String>,
    pub image_format: Option<String>,
    pub render: Option<bool>,
    pub dump_on_error: Option<bool>,
    pub max_nodes: Option<usize>,
}

/// Unified configuration for bintree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory receiving graph dumps (default: ./graphviz)
    pub dump_dir: PathBuf,
    /// Base name of the dump files (default: tree_dump)
    pub dump_name: String,
    /// Graphviz executable used to rasterize dumps (default: dot)
    pub renderer: String,
    /// Output format passed to the renderer (default: png)
    pub image_format: String,
    /// Run the renderer after writing the .dot file
    pub render: bool,
    /// Write a graph dump when a script fails on a tree error
    pub dump_on_error: bool,
    /// Upper bound on live nodes per tree, unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::from("./graphviz"),
            dump_name: "tree_dump".into(),
            renderer: "dot".into(),
            image_format: "png".into(),
            render: true,
            dump_on_error: false,
            max_nodes: None,
        }
    }
}

/// Get the XDG config directory for bintree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bintree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bintree.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".bintree.toml")
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| SettingsError {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            dump_dir: overlay
                .dump_dir
                .clone()
                .unwrap_or_else(|| self.dump_dir.clone()),
            dump_name: overlay
                .dump_name
                .clone()
                .unwrap_or_else(|| self.dump_name.clone()),
            renderer: overlay
                .renderer
                .clone()
                .unwrap_or_else(|| self.renderer.clone()),
            image_format: overlay
                .image_format
                .clone()
                .unwrap_or_else(|| self.image_format.clone()),
            render: overlay.render.unwrap_or(self.render),
            dump_on_error: overlay.dump_on_error.unwrap_or(self.dump_on_error),
            max_nodes: overlay.max_nodes.or(self.max_nodes),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.bintree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, SettingsError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current, env_source())
    }

    /// Apply BINTREE_* environment variables as explicit overrides.
    ///
    /// A variable that is set but cannot be read as its setting's type is an
    /// error rather than being skipped.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, SettingsError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(config.get_string("dump_dir"))? {
            settings.dump_dir = PathBuf::from(val);
        }
        if let Some(val) = env_value(config.get_string("dump_name"))? {
            settings.dump_name = val;
        }
        if let Some(val) = env_value(config.get_string("renderer"))? {
            settings.renderer = val;
        }
        if let Some(val) = env_value(config.get_string("image_format"))? {
            settings.image_format = val;
        }
        if let Some(val) = env_value(config.get_bool("render"))? {
            settings.render = val;
        }
        if let Some(val) = env_value(config.get_bool("dump_on_error"))? {
            settings.dump_on_error = val;
        }
        if let Some(val) = env_value(config.get_int("max_nodes"))? {
            let limit = usize::try_from(val).map_err(|_| SettingsError {
                message: format!("max_nodes must not be negative, got {}", val),
            })?;
            settings.max_nodes = Some(limit);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bintree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bintree/bintree.toml
#   Local:  ./.bintree.toml
#   Env:    BINTREE_* environment variables

# Directory and base name of graph dumps (<dump_dir>/<dump_name>.dot)
# dump_dir = "./graphviz"
# dump_name = "tree_dump"

# Graphviz renderer and output format (<dump_name><n>.<image_format>)
# renderer = "dot"
# image_format = "png"
# render = true

# Dump the tree when a script stops on a tree error
# dump_on_error = false

# Maximum number of live nodes per tree
# max_nodes = 1024
"#
        .to_string()
    }
}

/// `BINTREE_MAX_NODES` style variables; `__` separates nested keys.
fn env_source() -> Environment {
    Environment::with_prefix("BINTREE")
        .prefix_separator("_")
        .separator("__")
}

/// Absent keys are `None`; present but unreadable ones are errors.
fn env_value<T>(value: Result<T, ConfigError>) -> Result<Option<T>, SettingsError> {
    match value {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_default_settings_when_created_then_dumps_to_graphviz_dir() {
        let settings = Settings::default();
        assert_eq!(settings.dump_dir, PathBuf::from("./graphviz"));
        assert_eq!(settings.dump_name, "tree_dump");
        assert_eq!(settings.renderer, "dot");
        assert!(settings.render);
        assert!(settings.max_nodes.is_none());
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_fields() {
        let base = Settings::default();
        let overlay = RawSettings {
            renderer: Some("neato".into()),
            max_nodes: Some(8),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.renderer, "neato");
        assert_eq!(merged.max_nodes, Some(8));
        assert_eq!(merged.dump_name, base.dump_name);
        assert_eq!(merged.render, base.render);
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_raw() {
        let settings = Settings {
            max_nodes: Some(16),
            ..Default::default()
        };
        let toml_str = settings.to_toml().unwrap();
        let raw: RawSettings = toml::from_str(&toml_str).unwrap();

        assert_eq!(Settings::default().merge_with(&raw), settings);
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(source))
    }

    #[test]
    fn given_env_vars_when_applied_then_override_file_values() {
        // Arrange
        let from_file = Settings {
            max_nodes: Some(8),
            ..Default::default()
        };

        // Act
        let settings = Settings::apply_env_overrides(
            from_file,
            env(&[
                ("BINTREE_MAX_NODES", "32"),
                ("BINTREE_RENDER", "false"),
                ("BINTREE_DUMP_NAME", "failure"),
            ]),
        )
        .unwrap();

        // Assert
        assert_eq!(settings.max_nodes, Some(32));
        assert!(!settings.render);
        assert_eq!(settings.dump_name, "failure");
        assert_eq!(settings.renderer, "dot");
    }

    #[test]
    fn given_no_env_vars_when_applied_then_keeps_settings() {
        let from_file = Settings {
            max_nodes: Some(8),
            ..Default::default()
        };

        let settings = Settings::apply_env_overrides(from_file.clone(), env(&[])).unwrap();

        assert_eq!(settings, from_file);
    }

    #[rstest]
    #[case("BINTREE_MAX_NODES", "-1")]
    #[case("BINTREE_MAX_NODES", "plenty")]
    #[case("BINTREE_RENDER", "sometimes")]
    fn given_invalid_env_value_when_applied_then_errors(#[case] key: &str, #[case] value: &str) {
        let from_file = Settings {
            max_nodes: Some(8),
            ..Default::default()
        };

        let result = Settings::apply_env_overrides(from_file, env(&[(key, value)]));

        assert!(result.is_err(), "{}={} must be rejected", key, value);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.renderer.is_none());
    }
}
