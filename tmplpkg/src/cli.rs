//! CLI argument definitions for tmplpkg.
//!
//! Kept out of `main.rs` so tests can parse arguments through the library.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::builder::Builder;
use crate::config::BuildOptions;

#[derive(Debug, Parser)]
#[command(name = "tmplpkg")]
#[command(about = Builder::DESCRIPTION)]
#[command(version)]
pub struct Cli {
    /// Command to run: help, build, publish or clean
    pub command: String,

    /// Run ImageOptim over the built images and stylesheets (macOS only)
    #[arg(long = "optimise-images")]
    pub optimise_images: bool,

    /// Echo external commands and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Project root containing src/, build/ and the app template
    #[arg(long, env = "TMPLPKG_ROOT")]
    pub root: Option<PathBuf>,
}

impl Cli {
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            verbose: self.verbose,
            optimise_images: self.optimise_images,
        }
    }

    /// `--root`, else the current directory.
    pub fn resolve_root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("Failed to get current directory"),
        }
    }
}
