//! tmplpkg - build the `django_moj_template` package
//!
//! Clones GOV.UK Template and GOV.UK Elements, runs their native builds
//! (bundler/rake and npm/grunt/sass), copies the results into a Django app
//! layout and optionally uploads the package to PyPI.
//!
//! ## Commands
//!
//! - `help`: list commands
//! - `build`: check tools, sync repositories, run recipes, assemble the package
//! - `publish`: upload a completed build
//! - `clean`: remove the source checkouts and the build directory

pub mod builder;
pub mod cli;
pub mod command_runner;
pub mod config;
pub mod error;
pub mod folders;
pub mod optimise;
pub mod output;
pub mod pipeline;
pub mod recipes;
pub mod registry;
pub mod sync;
pub mod tools;

pub use builder::Builder;
pub use cli::Cli;
pub use error::BuildError;
