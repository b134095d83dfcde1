//! On-disk layout of the source repositories and the output package.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static TEMPLATE_PKG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^django_govuk_template-(?P<version>.*)$").expect("valid regex")
});

/// A named folder below a base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStructure {
    pub name: String,
    pub path: PathBuf,
}

impl FolderStructure {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Join `segments` onto this folder's path.
    pub fn join<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.path.clone();
        for segment in segments {
            path.push(segment);
        }
        path
    }
}

/// Layout of the built `django_moj_template` package.
#[derive(Debug, Clone)]
pub struct DjangoAppPackage {
    pub folder: FolderStructure,
    pub build_flag_path: PathBuf,
    pub app_path: PathBuf,
    pub static_path: PathBuf,
    pub images_path: PathBuf,
    pub javascripts_path: PathBuf,
    pub stylesheets_path: PathBuf,
    pub templates_path: PathBuf,
    pub assets_src_path: PathBuf,
}

impl DjangoAppPackage {
    pub const NAME: &'static str = "django_moj_template";

    /// Package rooted at `path` (the build directory).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let folder = FolderStructure::new(path, Self::NAME);
        let name = Self::NAME;
        Self {
            build_flag_path: folder.join([".build-date"]),
            app_path: folder.join([name]),
            static_path: folder.join([name, "static"]),
            images_path: folder.join([name, "static", "images"]),
            javascripts_path: folder.join([name, "static", "javascripts"]),
            stylesheets_path: folder.join([name, "static", "stylesheets"]),
            templates_path: folder.join([name, "templates"]),
            assets_src_path: folder.join([name, "assets-src"]),
            folder,
        }
    }

    pub fn path(&self) -> &Path {
        &self.folder.path
    }

    /// Whether a previous build ran to completion.
    pub fn is_built(&self) -> bool {
        self.build_flag_path.exists()
    }
}

/// Recipe-specific state of a source repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryKind {
    /// GOV.UK Template: builds a versioned Django package under `pkg/`.
    Template {
        pkg_root_path: PathBuf,
        pkg_path: Option<PathBuf>,
        app_path: Option<PathBuf>,
    },
    /// GOV.UK Elements: both paths appear only after grunt has run.
    Elements {
        content_path: PathBuf,
        elements_sass_path: PathBuf,
    },
}

/// A git repository cloned into the source directory.
#[derive(Debug, Clone)]
pub struct Repository {
    pub folder: FolderStructure,
    pub git_url: String,
    pub version: Option<String>,
    pub kind: RepositoryKind,
}

impl Repository {
    pub const TEMPLATE_NAME: &'static str = "govuk_template";
    pub const TEMPLATE_URL: &'static str = "https://github.com/alphagov/govuk_template.git";
    pub const ELEMENTS_NAME: &'static str = "govuk_elements";
    pub const ELEMENTS_URL: &'static str = "https://github.com/alphagov/govuk_elements.git";

    /// GOV.UK Template checked out below `src_path`.
    pub fn govuk_template(src_path: &Path, git_url: impl Into<String>) -> Self {
        let folder = FolderStructure::new(src_path.join(Self::TEMPLATE_NAME), Self::TEMPLATE_NAME);
        Self {
            kind: RepositoryKind::Template {
                pkg_root_path: folder.join(["pkg"]),
                pkg_path: None,
                app_path: None,
            },
            folder,
            git_url: git_url.into(),
            version: None,
        }
    }

    /// GOV.UK Elements checked out below `src_path`.
    pub fn govuk_elements(src_path: &Path, git_url: impl Into<String>) -> Self {
        let folder = FolderStructure::new(src_path.join(Self::ELEMENTS_NAME), Self::ELEMENTS_NAME);
        Self {
            kind: RepositoryKind::Elements {
                content_path: folder.join(["govuk_modules", "public"]),
                elements_sass_path: folder.join(["public", "sass"]),
            },
            folder,
            git_url: git_url.into(),
            version: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.folder.name
    }

    pub fn path(&self) -> &Path {
        &self.folder.path
    }

    /// Locate the built `django_govuk_template-<version>` directory.
    ///
    /// Exactly one matching directory must exist under `pkg/`. The result is
    /// cached; later calls return it without touching the filesystem.
    /// Returns `None` for the elements repository.
    pub fn find_pkg_path(&mut self) -> Option<PathBuf> {
        let RepositoryKind::Template {
            pkg_root_path,
            pkg_path,
            ..
        } = &mut self.kind
        else {
            return None;
        };
        if let Some(found) = pkg_path {
            return Some(found.clone());
        }

        let entries = std::fs::read_dir(&*pkg_root_path).ok()?;
        let mut matches: Vec<(PathBuf, String)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(caps) = TEMPLATE_PKG_RE.captures(name) {
                matches.push((path, caps["version"].to_string()));
            }
        }

        if matches.len() != 1 {
            tracing::debug!(
                root = %pkg_root_path.display(),
                candidates = matches.len(),
                "Built package discovery needs exactly one match"
            );
            return None;
        }
        let (path, version) = matches.remove(0);
        *pkg_path = Some(path.clone());
        self.version = Some(version);
        Some(path)
    }

    /// Locate the Django app (`govuk_template/`) inside the built package.
    ///
    /// Requires a successful [`find_pkg_path`](Self::find_pkg_path) first.
    pub fn find_app_path(&mut self) -> Option<PathBuf> {
        let RepositoryKind::Template {
            pkg_path, app_path, ..
        } = &mut self.kind
        else {
            return None;
        };
        if let Some(found) = app_path {
            return Some(found.clone());
        }
        let candidate = pkg_path.as_ref()?.join(Self::TEMPLATE_NAME);
        if !candidate.is_dir() {
            return None;
        }
        *app_path = Some(candidate.clone());
        Some(candidate)
    }
}
