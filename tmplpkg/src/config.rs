//! Builder configuration.
//!
//! Defaults reproduce the standard project layout. An optional
//! `tmplpkg.json` in the project root can override any of them:
//!
//! ```json
//! {
//!   "template_dir": "builder/template",
//!   "elements_repo_url": "https://github.com/example/govuk_elements.git",
//!   "python": "python3"
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::folders::Repository;

/// Settings read from `tmplpkg.json`. Relative directories resolve against the root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Where the source repositories are cloned.
    pub src_dir: PathBuf,
    /// Where the package is assembled.
    pub build_dir: PathBuf,
    /// Django app skeleton copied into the package root.
    pub template_dir: PathBuf,
    pub template_repo_url: String,
    pub elements_repo_url: String,
    /// Interpreter used to run `setup.py` when publishing.
    pub python: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            build_dir: PathBuf::from("build"),
            template_dir: PathBuf::from("builder/template"),
            template_repo_url: Repository::TEMPLATE_URL.to_string(),
            elements_repo_url: Repository::ELEMENTS_URL.to_string(),
            python: "python".to_string(),
        }
    }
}

impl BuilderConfig {
    pub const FILE_NAME: &'static str = "tmplpkg.json";

    /// Load `<root>/tmplpkg.json`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(Self::FILE_NAME);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load the configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: BuilderConfig =
            serde_json::from_str(&content).map_err(|e| BuildError::Config {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(config)
    }
}

/// Command-line switches that shape a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub verbose: bool,
    pub optimise_images: bool,
}
