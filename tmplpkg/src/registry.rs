//! Command registry.
//!
//! An explicit, ordered table from command name to handler. The table is
//! built once at startup (see [`Builder::registry`](crate::builder::Builder::registry))
//! and only read afterwards.

use std::fmt;

use crate::error::BuildError;

/// Command body, invoked with the orchestration context.
pub type Handler<C> = fn(&mut C) -> anyhow::Result<()>;

/// One registered command.
pub struct CommandEntry<C> {
    pub name: &'static str,
    pub doc: &'static str,
    pub handler: Handler<C>,
}

impl<C> CommandEntry<C> {
    /// First non-empty line of the documentation.
    pub fn summary(&self) -> &'static str {
        first_doc_line(self.doc)
    }
}

impl<C> fmt::Debug for CommandEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("doc", &self.summary())
            .finish_non_exhaustive()
    }
}

/// First non-empty, trimmed line of `doc`, or `""`.
pub fn first_doc_line(doc: &str) -> &str {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Ordered command table.
pub struct CommandRegistry<C> {
    entries: Vec<CommandEntry<C>>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C> fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. Names must be unique.
    pub fn register(
        &mut self,
        name: &'static str,
        doc: &'static str,
        handler: Handler<C>,
    ) -> Result<&mut Self, BuildError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(BuildError::DuplicateCommand(name.to_string()));
        }
        self.entries.push(CommandEntry { name, doc, handler });
        Ok(self)
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Result<&CommandEntry<C>, BuildError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| BuildError::UnknownCommand {
                name: name.to_string(),
                available: self.names().iter().map(|n| (*n).to_string()).collect(),
            })
    }

    /// Command names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Help lines: `  <name><padding><summary>`, aligned on the longest name + 2.
    pub fn help_lines(&self) -> Vec<String> {
        let width = self.entries.iter().map(|e| e.name.len()).max().unwrap_or(0) + 2;
        self.entries
            .iter()
            .map(|e| format!("  {:<width$}{}", e.name, e.summary()))
            .collect()
    }
}
