//! Build tool availability and version checks.

use anyhow::Result;
use regex::{Regex, RegexBuilder};

use crate::command_runner::{CommandOptions, CommandRunner};
use crate::error::BuildError;

/// A tool that must be on `PATH` with at least `minimum` version.
#[derive(Debug, Clone)]
pub struct ToolRequirement {
    pub name: &'static str,
    pub minimum: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
    /// Case-insensitive; every capture group is one numeric version component.
    pub pattern: &'static str,
}

/// Tools the build recipes shell out to.
pub const REQUIRED_TOOLS: &[ToolRequirement] = &[
    ToolRequirement {
        name: "bundler",
        minimum: "1.10",
        program: "bundler",
        args: &["--version"],
        pattern: r"Bundler version (\d+)\.(\d+)\.",
    },
    ToolRequirement {
        name: "npm",
        minimum: "3.7",
        program: "npm",
        args: &["--version"],
        pattern: r"(\d+)\.(\d+)\.",
    },
    ToolRequirement {
        name: "sass",
        minimum: "3.4",
        program: "sass",
        args: &["--version"],
        pattern: r"Sass (\d+)\.(\d+)\.",
    },
];

/// Split a dotted version into numeric components.
pub fn parse_components(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

/// Numeric lexicographic comparison: `[2, 0] >= [1, 10]`.
pub fn satisfies(found: &[u64], minimum: &[u64]) -> bool {
    found >= minimum
}

impl ToolRequirement {
    fn regex(&self) -> Option<Regex> {
        RegexBuilder::new(self.pattern)
            .case_insensitive(true)
            .build()
            .ok()
    }

    /// Extract the version components from a version query's stdout.
    ///
    /// The pattern is anchored at the start of the output, so banners that
    /// precede the version line do not match.
    pub fn parse_version(&self, output: &str) -> Option<Vec<u64>> {
        let caps = self.regex()?.captures(output)?;
        if caps.get(0)?.start() != 0 {
            return None;
        }
        caps.iter()
            .skip(1)
            .map(|group| group.and_then(|m| m.as_str().parse::<u64>().ok()))
            .collect()
    }

    /// Run the version query and compare against the minimum.
    pub fn check(&self, runner: &dyn CommandRunner) -> Result<Vec<u64>> {
        let output = match runner.run_output(self.program, self.args, &CommandOptions::default()) {
            Ok(output) if output.status.success() => output,
            _ => {
                return Err(BuildError::ToolMissing {
                    name: self.name.to_string(),
                }
                .into());
            }
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        let too_old = |found: String| BuildError::ToolTooOld {
            name: self.name.to_string(),
            minimum: self.minimum.to_string(),
            found,
        };

        let Some(found) = self.parse_version(&stdout) else {
            let first_line = stdout.lines().next().unwrap_or("").trim().to_string();
            return Err(too_old(if first_line.is_empty() {
                "unknown".to_string()
            } else {
                first_line
            })
            .into());
        };
        let minimum = parse_components(self.minimum).unwrap_or_default();
        if !satisfies(&found, &minimum) {
            let found = found
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(".");
            return Err(too_old(found).into());
        }
        tracing::debug!(tool = self.name, version = ?found, "Tool version ok");
        Ok(found)
    }
}

/// Check every tool in `tools`, stopping at the first failure.
pub fn check_all(runner: &dyn CommandRunner, tools: &[ToolRequirement]) -> Result<()> {
    for tool in tools {
        tool.check(runner)?;
    }
    Ok(())
}
