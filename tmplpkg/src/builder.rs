//! The build orchestrator.
//!
//! [`Builder`] owns the resolved layout and dispatches the registered
//! commands. `build` runs its prerequisites (tool checks, directories,
//! repository sync) through a [`Requisites`] chain, then each repository's
//! recipe, optional image optimisation and the final assembly.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command_runner::{CommandOptions, CommandRunner, RealCommandRunner};
use crate::config::{BuildOptions, BuilderConfig};
use crate::error::BuildError;
use crate::folders::{DjangoAppPackage, Repository, RepositoryKind};
use crate::optimise;
use crate::output::Output;
use crate::pipeline::{Announce, Flow, Requisites};
use crate::recipes;
use crate::registry::CommandRegistry;
use crate::sync;
use crate::tools;

pub struct Builder {
    pub root_path: PathBuf,
    pub template_path: PathBuf,
    pub src_path: PathBuf,
    pub repositories: Vec<Repository>,
    pub package: DjangoAppPackage,
    pub python: String,
    pub options: BuildOptions,
    os: String,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("root_path", &self.root_path)
            .field("src_path", &self.src_path)
            .field("package", &self.package.path())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Builder {
    pub const DESCRIPTION: &'static str =
        "Builds a python package containing a Django app with the latest gov.uk template and elements";

    /// Layout rooted at `root`, shelling out through `runner`.
    pub fn new(
        root: &Path,
        config: &BuilderConfig,
        options: BuildOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let src_path = root.join(&config.src_dir);
        Self {
            root_path: root.to_path_buf(),
            template_path: root.join(&config.template_dir),
            repositories: vec![
                Repository::govuk_template(&src_path, &config.template_repo_url),
                Repository::govuk_elements(&src_path, &config.elements_repo_url),
            ],
            package: DjangoAppPackage::new(root.join(&config.build_dir)),
            src_path,
            python: config.python.clone(),
            options,
            os: std::env::consts::OS.to_string(),
            runner,
        }
    }

    /// Production builder: reads `tmplpkg.json` under `root` and runs real commands.
    pub fn from_root(root: &Path, options: BuildOptions) -> Result<Self> {
        let config = BuilderConfig::load(root)?;
        tracing::debug!(root = %root.display(), ?config, "Resolved configuration");
        Ok(Self::new(root, &config, options, Arc::new(RealCommandRunner)))
    }

    /// Pretend to run on `os` (as reported by `std::env::consts::OS`).
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    /// The commands this tool understands, in help order.
    pub fn registry() -> Result<CommandRegistry<Self>, BuildError> {
        let mut registry = CommandRegistry::new();
        registry
            .register("help", "Prints this help message", Self::help)?
            .register("build", "Builds the complete python package", Self::build)?
            .register("publish", "Publishes the python package to PyPi", Self::publish)?
            .register("clean", "Clean up sources and builds", Self::clean)?;
        Ok(registry)
    }

    /// Dispatch `command` through the registry.
    pub fn run(&mut self, command: &str) -> Result<()> {
        let registry = Self::registry()?;
        let entry = registry.get(command)?;
        tracing::debug!(command = entry.name, "Dispatching");
        (entry.handler)(self)
    }

    fn command_options(&self, cwd: &Path) -> CommandOptions {
        CommandOptions::with_cwd(cwd).echo(self.options.verbose)
    }

    fn default_options(&self) -> CommandOptions {
        CommandOptions::default().echo(self.options.verbose)
    }

    fn runner(&self) -> &dyn CommandRunner {
        &*self.runner
    }

    // HELP

    /// Description, then one aligned line per command.
    pub fn help_text() -> Result<String> {
        let registry = Self::registry()?;
        let mut text = format!("{}\nCommands:\n", Self::DESCRIPTION);
        for line in registry.help_lines() {
            text.push_str(&line);
            text.push('\n');
        }
        Ok(text)
    }

    pub fn help(&mut self) -> Result<()> {
        print!("{}", Self::help_text()?);
        Ok(())
    }

    // BUILDING

    fn build_requisites() -> Requisites<Self> {
        Requisites::new()
            .announced(
                "check_build_tools",
                "Checking build tools are available",
                Self::check_build_tools,
            )
            .step("make_paths", Self::make_paths)
            .announced(
                "update_source_repositories",
                "Updating source repositories",
                Self::update_source_repositories,
            )
    }

    pub fn build(&mut self) -> Result<()> {
        Self::build_requisites().run(self, |builder| {
            Announce::new("Done")
                .after()
                .run_with(|m| Output::success(m), || builder.build_package())
        })?;
        Ok(())
    }

    pub fn check_build_tools(&mut self) -> Result<Flow> {
        tools::check_all(self.runner(), tools::REQUIRED_TOOLS)?;
        Ok(Flow::Continue)
    }

    pub fn make_paths(&mut self) -> Result<Flow> {
        sync::make_paths(&[
            &self.src_path,
            &self.package.static_path,
            &self.package.templates_path,
        ])?;
        Ok(Flow::Continue)
    }

    pub fn update_source_repositories(&mut self) -> Result<Flow> {
        for repo in &self.repositories {
            if repo.path().is_dir() {
                tracing::info!(repo = repo.name(), "Pulling existing clone");
                self.runner()
                    .run_checked("git", &["pull"], &self.command_options(repo.path()))?;
            } else {
                tracing::info!(repo = repo.name(), url = %repo.git_url, "Cloning");
                self.runner().run_checked(
                    "git",
                    &["clone", "--recursive", &repo.git_url, repo.name()],
                    &self.command_options(&self.src_path),
                )?;
            }
        }
        Ok(Flow::Continue)
    }

    fn build_package(&mut self) -> Result<()> {
        let mut repositories = std::mem::take(&mut self.repositories);
        let built = repositories
            .iter_mut()
            .try_for_each(|repo| self.build_repository(repo));
        self.repositories = repositories;
        built?;

        if self.options.optimise_images {
            self.optimise_images()?;
        }
        self.create_django_app()
    }

    fn build_repository(&self, repo: &mut Repository) -> Result<()> {
        match &repo.kind {
            RepositoryKind::Template { .. } => self.build_govuk_template(repo),
            RepositoryKind::Elements {
                content_path,
                elements_sass_path,
            } => self.build_govuk_elements(repo.path(), content_path, elements_sass_path),
        }
    }

    fn build_govuk_template(&self, repo: &mut Repository) -> Result<()> {
        Announce::new("Building gov.uk template").run(|| {
            recipes::fix_ruby_version(repo.path())?;
            let options = self.command_options(repo.path());
            self.runner().run_checked("bundle", &["install"], &options)?;
            self.runner()
                .run_checked("bundle", &["exec", "rake", "build:django"], &options)?;

            if repo.find_pkg_path().is_none() {
                return Err(
                    BuildError::ArtifactNotFound("Could not find built package".to_string()).into(),
                );
            }
            let Some(app_path) = repo.find_app_path() else {
                return Err(BuildError::ArtifactNotFound(
                    "Cannot find built package app content".to_string(),
                )
                .into());
            };
            if let Some(version) = &repo.version {
                Output::info(format!("Using GOV.UK Template {version}"));
            }

            sync::rsync_folders(
                self.runner(),
                &app_path,
                &self.package.app_path,
                &self.default_options(),
            )
        })
    }

    fn build_govuk_elements(
        &self,
        repo_path: &Path,
        content_path: &Path,
        elements_sass_path: &Path,
    ) -> Result<()> {
        Announce::new("Building gov.uk elements").run(|| {
            let options = self.command_options(repo_path);
            self.runner().run_checked("npm", &["install"], &options)?;
            self.runner()
                .run_checked("grunt", recipes::ELEMENTS_GRUNT_TASKS, &options)?;

            sync::rsync_folders_and_warn(
                self.runner(),
                content_path,
                &self.package.static_path,
                "GOV.UK Elements overwrites {count} asset(s) from GOV.UK Template",
                &self.default_options(),
            )?;

            // sass sources arrive in static/ via govuk_frontend_toolkit; keep them out of it
            let assets_src = &self.package.assets_src_path;
            let static_sass = self.package.static_path.join("sass");
            sync::rm_paths(&[assets_src])?;
            if !static_sass.is_dir() {
                return Err(BuildError::ArtifactNotFound(format!(
                    "GOV.UK Elements did not produce {}",
                    static_sass.display()
                ))
                .into());
            }
            std::fs::rename(&static_sass, assets_src).with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    static_sass.display(),
                    assets_src.display()
                )
            })?;

            sync::rsync_folders_and_warn(
                self.runner(),
                elements_sass_path,
                assets_src,
                "GOV.UK Elements build overwrites {count} asset(s)",
                &self.default_options(),
            )?;

            recipes::fix_sass_images_path(assets_src)?;
            let update = format!(".:{}", self.package.stylesheets_path.display());
            self.runner().run_checked(
                "sass",
                &["--no-cache", "--sourcemap=none", "--update", &update],
                &self.command_options(assets_src),
            )
        })
    }

    /// Run ImageOptim over the package images and stylesheets when available.
    pub fn optimise_images(&self) -> Result<bool> {
        optimise::optimise_images(
            self.runner(),
            &self.os,
            &self.package.images_path,
            &self.package.stylesheets_path,
            &self.default_options(),
        )
    }

    fn create_django_app(&self) -> Result<()> {
        Announce::new("Creating Django app").run(|| {
            if !self.template_path.is_dir() {
                return Err(BuildError::ArtifactNotFound(format!(
                    "Template directory not found: {}",
                    self.template_path.display()
                ))
                .into());
            }
            sync::rsync_folders(
                self.runner(),
                &self.template_path,
                self.package.path(),
                &self.default_options(),
            )?;

            sync::tidy(self.package.path())?;
            self.mark_built()
        })
    }

    fn mark_built(&self) -> Result<()> {
        let stamp = chrono::Local::now().to_string();
        std::fs::write(&self.package.build_flag_path, &stamp).with_context(|| {
            format!(
                "Failed to write {}",
                self.package.build_flag_path.display()
            )
        })?;
        tracing::debug!(%stamp, "Marked build complete");
        Ok(())
    }

    // PUBLISHING

    pub fn publish(&mut self) -> Result<()> {
        Announce::new("Done").after().run_with(|m| Output::success(m), || {
            if !self.package.is_built() {
                return Err(BuildError::NotBuilt.into());
            }
            self.runner().run_checked(
                &self.python,
                &["setup.py", "sdist", "upload"],
                &self.command_options(self.package.path()),
            )
        })
    }

    // CLEANING

    pub fn clean(&mut self) -> Result<()> {
        sync::rm_paths(&[self.src_path.as_path(), self.package.path()])
    }
}
