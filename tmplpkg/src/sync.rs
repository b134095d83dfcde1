//! Directory housekeeping and rsync-based folder synchronisation.

use anyhow::{Context, Result};
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::command_runner::{CommandOptions, CommandRunner};
use crate::output::Output;

/// How a file in the source tree relates to the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    New,
    Modified,
}

/// A file that a sync would add or overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    /// Path relative to the source root.
    pub path: PathBuf,
    pub kind: DifferenceKind,
}

/// Create each missing directory (and parents) with mode 0755.
pub fn make_paths<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true).mode(0o755);
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            continue;
        }
        builder
            .create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Created directory");
    }
    Ok(())
}

/// Recursively delete each path that exists.
pub fn rm_paths<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        let Ok(meta) = std::fs::symlink_metadata(path) else {
            continue;
        };
        let removed = if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
        tracing::info!(path = %path.display(), "Removed");
    }
    Ok(())
}

fn slash_terminated(path: &Path) -> String {
    format!("{}/", path.display().to_string().trim_end_matches('/'))
}

/// Copy the contents of `src` into `target` with `rsync -r`. Nothing is deleted.
pub fn rsync_folders(
    runner: &dyn CommandRunner,
    src: &Path,
    target: &Path,
    options: &CommandOptions,
) -> Result<()> {
    let src = slash_terminated(src);
    let target = target.display().to_string();
    let target = target.trim_end_matches('/');
    runner.run_checked("rsync", &["-r", &src, target], options)
}

fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    let (meta_a, meta_b) = (std::fs::metadata(a)?, std::fs::metadata(b)?);
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(std::fs::read(a)? == std::fs::read(b)?)
}

/// Files under `src_root` that differ from their counterpart under `target_root`.
///
/// Files missing from the target are reported as [`DifferenceKind::New`]
/// only when `track_new` is set. Results are sorted by path.
pub fn diff_folders(src_root: &Path, target_root: &Path, track_new: bool) -> Result<Vec<Difference>> {
    let mut differences = Vec::new();
    for entry in WalkDir::new(src_root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", src_root.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src_root)
            .with_context(|| format!("{} escapes {}", entry.path().display(), src_root.display()))?
            .to_path_buf();
        let target = target_root.join(&relative);
        if !target.exists() {
            if track_new {
                differences.push(Difference {
                    path: relative,
                    kind: DifferenceKind::New,
                });
            }
        } else if !same_contents(entry.path(), &target)
            .with_context(|| format!("Failed to compare {}", relative.display()))?
        {
            differences.push(Difference {
                path: relative,
                kind: DifferenceKind::Modified,
            });
        }
    }
    Ok(differences)
}

/// Render a conflict headline, substituting `{count}`.
pub fn conflict_message(template: &str, count: usize) -> String {
    template.replace("{count}", &count.to_string())
}

/// [`rsync_folders`], preceded by a warning listing every file that will be overwritten.
///
/// The warning is informational only; the copy always happens.
pub fn rsync_folders_and_warn(
    runner: &dyn CommandRunner,
    src: &Path,
    target: &Path,
    message: &str,
    options: &CommandOptions,
) -> Result<Vec<Difference>> {
    let differences = if target.is_dir() {
        diff_folders(src, target, false)?
    } else {
        Vec::new()
    };
    if !differences.is_empty() {
        Output::warning(conflict_message(message, differences.len()));
        for difference in &differences {
            Output::list_item(difference.path.display().to_string());
        }
    }
    rsync_folders(runner, src, target, options)?;
    Ok(differences)
}

/// Whether `path` (relative to the package root) is build debris.
fn is_transient(relative: &Path) -> bool {
    if relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with(".sass-cache"))
    {
        return true;
    }
    let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name == ".DS_Store" || name.ends_with(".mo") {
        return true;
    }
    // *.py? : compiled bytecode such as .pyc / .pyo
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.len() == 3 && ext.starts_with("py"))
}

/// Delete OS litter, compiled locales, bytecode and sass caches under `root`.
///
/// Returns the removed paths relative to `root`.
pub fn tidy(root: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !is_transient(relative) {
            continue;
        }
        let result = if entry.file_type().is_dir() {
            walker.skip_current_dir();
            std::fs::remove_dir_all(entry.path())
        } else {
            std::fs::remove_file(entry.path())
        };
        result.with_context(|| format!("Failed to remove {}", entry.path().display()))?;
        removed.push(relative.to_path_buf());
    }
    tracing::debug!(count = removed.len(), "Removed transient files");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::MockCommandRunner;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn conflict_trees() -> TempDir {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        write(&src.join("a.txt"), "source a");
        write(&dst.join("a.txt"), "destination a");
        write(&src.join("b.txt"), "only in source");
        write(&src.join("nested/same.txt"), "same");
        write(&dst.join("nested/same.txt"), "same");
        temp
    }

    #[test]
    fn test_diff_without_track_new_reports_modified_only() {
        let temp = conflict_trees();
        let diffs = diff_folders(&temp.path().join("src"), &temp.path().join("dst"), false).unwrap();
        assert_eq!(
            diffs,
            vec![Difference {
                path: PathBuf::from("a.txt"),
                kind: DifferenceKind::Modified
            }]
        );
    }

    #[test]
    fn test_diff_with_track_new_reports_both() {
        let temp = conflict_trees();
        let diffs = diff_folders(&temp.path().join("src"), &temp.path().join("dst"), true).unwrap();
        assert_eq!(
            diffs,
            vec![
                Difference {
                    path: PathBuf::from("a.txt"),
                    kind: DifferenceKind::Modified
                },
                Difference {
                    path: PathBuf::from("b.txt"),
                    kind: DifferenceKind::New
                },
            ]
        );
    }

    #[test]
    fn test_diff_same_size_different_bytes() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("src/x.css"), "abc");
        write(&temp.path().join("dst/x.css"), "abd");
        let diffs = diff_folders(&temp.path().join("src"), &temp.path().join("dst"), false).unwrap();
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn test_rsync_arguments() {
        let runner = MockCommandRunner::new();
        rsync_folders(
            &runner,
            Path::new("/src/app/"),
            Path::new("/build/pkg/"),
            &CommandOptions::default(),
        )
        .unwrap();
        assert_eq!(runner.command_lines(), vec!["rsync -r /src/app/ /build/pkg"]);
    }

    #[test]
    fn test_rsync_and_warn_copies_despite_conflicts() {
        let temp = conflict_trees();
        let runner = MockCommandRunner::new();
        let diffs = rsync_folders_and_warn(
            &runner,
            &temp.path().join("src"),
            &temp.path().join("dst"),
            "Overwrites {count} asset(s)",
            &CommandOptions::default(),
        )
        .unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls()[0].program, "rsync");
    }

    #[test]
    fn test_rsync_failure_is_fatal() {
        let temp = conflict_trees();
        let runner = MockCommandRunner::new().fail("rsync", 23);
        assert!(
            rsync_folders_and_warn(
                &runner,
                &temp.path().join("src"),
                &temp.path().join("missing"),
                "{count}",
                &CommandOptions::default(),
            )
            .is_err()
        );
    }

    #[test]
    fn test_conflict_message() {
        assert_eq!(
            conflict_message("GOV.UK Elements build overwrites {count} asset(s)", 3),
            "GOV.UK Elements build overwrites 3 asset(s)"
        );
    }

    #[test]
    fn test_make_paths_creates_with_mode_and_skips_existing() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("build/pkg/static");
        make_paths(&[&nested, &nested]).unwrap();
        assert!(nested.is_dir());
        let mode = std::fs::metadata(&nested).unwrap().permissions().mode() & 0o777;
        // umask can only remove bits
        assert_eq!(mode & !0o755, 0);
    }

    #[test]
    fn test_rm_paths_ignores_missing() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("src");
        write(&present.join("repo/file"), "x");
        rm_paths(&[present.clone(), temp.path().join("absent")]).unwrap();
        assert!(!present.exists());
    }

    #[test]
    fn test_is_transient() {
        for path in [
            ".DS_Store",
            "app/locale/cy/LC_MESSAGES/django.mo",
            "app/__init__.pyc",
            "app/views.pyo",
            "app/assets-src/.sass-cache",
            "app/assets-src/.sass-cache/abc/x.scssc",
            "app/assets-src/.sass-cache-old/abc/x.scssc",
        ] {
            assert!(is_transient(Path::new(path)), "{path}");
        }
        for path in [
            "app/__init__.py",
            "app/locale/cy/LC_MESSAGES/django.po",
            "app/static/x.css",
            "app/sass-cache/x.css",
        ] {
            assert!(!is_transient(Path::new(path)), "{path}");
        }
    }

    #[test]
    fn test_tidy_removes_transient_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join(".DS_Store"), "");
        write(&root.join("app/__init__.py"), "");
        write(&root.join("app/__init__.pyc"), "");
        write(&root.join("app/locale/en/django.mo"), "");
        write(&root.join("app/assets-src/.sass-cache/1/a.scssc"), "");
        write(&root.join("app/assets-src/.sass-cache-old/1/a.scssc"), "");
        write(&root.join("app/static/main.css"), "");

        let mut removed = tidy(root).unwrap();
        removed.sort();
        assert_eq!(
            removed,
            vec![
                PathBuf::from(".DS_Store"),
                PathBuf::from("app/__init__.pyc"),
                PathBuf::from("app/assets-src/.sass-cache"),
                PathBuf::from("app/assets-src/.sass-cache-old"),
                PathBuf::from("app/locale/en/django.mo"),
            ]
        );
        assert!(root.join("app/__init__.py").exists());
        assert!(root.join("app/static/main.css").exists());
        assert!(!root.join("app/assets-src/.sass-cache").exists());
        assert!(!root.join("app/assets-src/.sass-cache-old").exists());
    }
}
