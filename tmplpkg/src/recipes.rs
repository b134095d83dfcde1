//! File fix-ups applied inside the source repositories before their builds.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::output::Output;
use crate::tools::{parse_components, satisfies};

/// Lowest Ruby accepted in `.ruby-version`.
pub const MIN_RUBY: [u64; 3] = [2, 2, 0];
/// Version written when the pin is older than [`MIN_RUBY`] or unreadable.
pub const FALLBACK_RUBY: &str = "2.2.3";

/// Grunt tasks run for GOV.UK Elements, a subset of its `default` task.
pub const ELEMENTS_GRUNT_TASKS: &[&str] = &[
    "copy:govuk_template",
    "copy:govuk_assets",
    "copy:govuk_frontend_toolkit_scss",
    "copy:govuk_frontend_toolkit_js",
    "copy:govuk_frontend_toolkit_img",
    "replace",
    "sass",
];

/// Numeric components of a `.ruby-version` pin; at least `X.Y.Z`.
fn parse_ruby_version(pin: &str) -> Option<Vec<u64>> {
    parse_components(pin).filter(|parts| parts.len() >= 3)
}

/// Make sure `<repo>/.ruby-version` pins at least Ruby 2.2.
///
/// Returns `true` when the file was rewritten.
pub fn fix_ruby_version(repo_path: &Path) -> Result<bool> {
    let path = repo_path.join(".ruby-version");
    if !path.exists() {
        return Err(BuildError::ArtifactNotFound("No ruby version specified".to_string()).into());
    }
    let pin = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let pin = pin.trim();

    if parse_ruby_version(pin).is_some_and(|v| satisfies(&v, &MIN_RUBY)) {
        return Ok(false);
    }

    Output::announce(
        format!(
            "Fixing ruby version to {FALLBACK_RUBY} (was {})",
            if pin.is_empty() { "?" } else { pin }
        ),
        true,
    );
    std::fs::write(&path, FALLBACK_RUBY)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Location of the elements helper stylesheet inside the asset sources.
pub fn sass_helpers_path(assets_src_path: &Path) -> PathBuf {
    assets_src_path.join("elements").join("_helpers.scss")
}

/// Point image URLs in the elements helpers at the compiled stylesheet dir.
///
/// GOV.UK Elements serves images from `/public/`; in the package they sit
/// one level up from `stylesheets/`.
pub fn fix_sass_images_path(assets_src_path: &Path) -> Result<()> {
    let path = sass_helpers_path(assets_src_path);
    let helpers = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    std::fs::write(&path, helpers.replace("/public/", "../"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
