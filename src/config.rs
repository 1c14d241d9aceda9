use crate::error::{PatchCheckError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Represents the complete configuration for patch-check.
///
/// Contains the conventional locations for the upstream checkout and patch
/// storage, the channel heuristic policy, and an optional explicit patch
/// ordering.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub patches: PatchListConfig,
}

fn default_repo_path() -> String {
    ".".to_string()
}

fn default_patches_path() -> String {
    "patches".to_string()
}

/// Conventional locations the no-argument invocation operates against.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_repo_path")]
    pub repo: String,

    #[serde(default = "default_patches_path")]
    pub patches: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            repo: default_repo_path(),
            patches: default_patches_path(),
        }
    }
}

fn default_stable_patch_threshold() -> u32 {
    100
}

/// Channel heuristic thresholds (see the classifier for semantics).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    #[serde(default = "default_stable_patch_threshold")]
    pub stable_patch_threshold: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            stable_patch_threshold: default_stable_patch_threshold(),
        }
    }
}

/// Optional explicit patch ordering.
///
/// When empty, the patch directory is scanned for `*.patch`/`*.diff` files
/// sorted by name.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PatchListConfig {
    #[serde(default)]
    pub order: Vec<String>,
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `patchcheck.toml` in current directory
/// 3. `.patchcheck.toml` in user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./patchcheck.toml").exists() {
        fs::read_to_string("./patchcheck.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".patchcheck.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| PatchCheckError::config(e.to_string()))?;
    Ok(config)
}
