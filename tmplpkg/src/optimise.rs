//! Optional image optimisation with ImageOptim (macOS only).
//!
//! <https://imageoptim.com/>

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::command_runner::{CommandOptions, CommandRunner};
use crate::output::Output;

const MDFIND_QUERY: &str = "kMDItemCFBundleIdentifier == \"net.pornel.ImageOptim\"";

/// Find the ImageOptim binary via Spotlight metadata.
///
/// Every failure along the way (not macOS, `mdfind` failing or returning
/// nothing, binary missing from the bundle) yields `None`.
pub fn locate_image_optim(runner: &dyn CommandRunner, os: &str) -> Option<PathBuf> {
    if os != "macos" {
        return None;
    }
    let output = runner
        .run_output("mdfind", &[MDFIND_QUERY], &CommandOptions::default())
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let app_path = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let bin_path = Path::new(app_path).join("Contents/MacOS/ImageOptim");
    bin_path.exists().then_some(bin_path)
}

/// Optimise images and stylesheets in place.
///
/// Returns `Ok(false)` when ImageOptim could not be found. A failing
/// ImageOptim run is an error.
pub fn optimise_images(
    runner: &dyn CommandRunner,
    os: &str,
    images_path: &Path,
    stylesheets_path: &Path,
    options: &CommandOptions,
) -> Result<bool> {
    let Some(bin_path) = locate_image_optim(runner, os) else {
        tracing::info!(os, "ImageOptim not available, skipping image optimisation");
        return Ok(false);
    };

    Output::announce("Optimising images… this may take a while!", true);
    let bin = bin_path.display().to_string();
    let images = images_path.display().to_string();
    let stylesheets = stylesheets_path.display().to_string();
    runner.run_checked(&bin, &[&images, &stylesheets], options)?;
    Ok(true)
}
