//! Explicit composition of command bodies.
//!
//! [`Requisites`] runs an ordered list of setup steps before a target and
//! stops the chain when a step answers [`Flow::Halt`]. [`Announce`] prints a
//! message before or after a call without touching its result.

use anyhow::Result;

use crate::output::Output;
use crate::registry::first_doc_line;

/// What a setup step tells the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Nothing to report, keep going.
    Continue,
    /// Stop here; the target must not run.
    Halt,
}

/// A setup step run before a command body.
pub type Step<C> = fn(&mut C) -> Result<Flow>;

struct RequisiteStep<C> {
    name: &'static str,
    announce: Option<Announce>,
    step: Step<C>,
}

/// Ordered prerequisites for a command.
pub struct Requisites<C> {
    steps: Vec<RequisiteStep<C>>,
}

impl<C> Default for Requisites<C> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<C> std::fmt::Debug for Requisites<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|s| s.name))
            .finish()
    }
}

impl<C> Requisites<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a silent step.
    pub fn step(mut self, name: &'static str, step: Step<C>) -> Self {
        self.steps.push(RequisiteStep {
            name,
            announce: None,
            step,
        });
        self
    }

    /// Add a step announced by the first line of `doc` (or `name` when `doc` is empty).
    pub fn announced(mut self, name: &'static str, doc: &str, step: Step<C>) -> Self {
        self.steps.push(RequisiteStep {
            name,
            announce: Some(Announce::resolve(None, doc, name)),
            step,
        });
        self
    }

    /// Run every step in order, then `target`.
    ///
    /// Returns `Ok(None)` without invoking `target` as soon as a step halts.
    /// Errors from steps or the target propagate unchanged.
    pub fn run<T>(&self, ctx: &mut C, target: impl FnOnce(&mut C) -> Result<T>) -> Result<Option<T>> {
        self.run_steps(ctx, |announce, f| announce.run(f), target)
    }

    /// [`run`](Self::run), handing step announcements to `emit`.
    pub fn run_with<T>(
        &self,
        ctx: &mut C,
        mut emit: impl FnMut(&str),
        target: impl FnOnce(&mut C) -> Result<T>,
    ) -> Result<Option<T>> {
        self.run_steps(ctx, |announce, f| announce.run_with(&mut emit, f), target)
    }

    fn run_steps<T>(
        &self,
        ctx: &mut C,
        mut announced: impl FnMut(&Announce, &mut dyn FnMut() -> Result<Flow>) -> Result<Flow>,
        target: impl FnOnce(&mut C) -> Result<T>,
    ) -> Result<Option<T>> {
        for requisite in &self.steps {
            let flow = match &requisite.announce {
                Some(announce) => announced(announce, &mut || (requisite.step)(ctx))?,
                None => (requisite.step)(ctx)?,
            };
            if flow == Flow::Halt {
                tracing::debug!(step = requisite.name, "Prerequisite halted the chain");
                return Ok(None);
            }
        }
        target(ctx).map(Some)
    }
}

/// When an announcement is printed relative to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Before,
    After,
}

/// Prints a message around a call.
#[derive(Debug, Clone)]
pub struct Announce {
    message: String,
    timing: Timing,
    bold: bool,
}

impl Announce {
    /// Announce `message` before the call, in bold.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timing: Timing::Before,
            bold: true,
        }
    }

    /// Pick the message: explicit text, else the first doc line, else the name.
    pub fn resolve(message: Option<&str>, doc: &str, name: &str) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .or_else(|| Some(first_doc_line(doc)).filter(|d| !d.is_empty()))
            .unwrap_or(name);
        Self::new(message)
    }

    pub fn after(mut self) -> Self {
        self.timing = Timing::After;
        self
    }

    /// Print in bold (when stdout is a terminal). On by default.
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run `f`, printing the announcement to stdout.
    pub fn run<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let bold = self.bold;
        self.run_with(|message| Output::announce(message, bold), f)
    }

    /// Run `f`, handing the announcement to `emit` at the configured time.
    ///
    /// An "after" announcement is skipped when `f` fails.
    pub fn run_with<T>(&self, mut emit: impl FnMut(&str), f: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.timing == Timing::Before && !self.message.is_empty() {
            emit(&self.message);
        }
        let result = f()?;
        if self.timing == Timing::After && !self.message.is_empty() {
            emit(&self.message);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Ctx {
        log: Vec<&'static str>,
        target_calls: usize,
    }

    fn setup_none(ctx: &mut Ctx) -> Result<Flow> {
        ctx.log.push("none");
        Ok(Flow::Continue)
    }

    fn setup_halt(ctx: &mut Ctx) -> Result<Flow> {
        ctx.log.push("halt");
        Ok(Flow::Halt)
    }

    fn setup_error(_: &mut Ctx) -> Result<Flow> {
        anyhow::bail!("boom")
    }

    fn target(ctx: &mut Ctx) -> Result<u32> {
        ctx.target_calls += 1;
        Ok(42)
    }

    #[test]
    fn test_all_steps_continue_runs_target_once() {
        let requisites = Requisites::new()
            .step("a", setup_none)
            .step("b", setup_none);
        let mut ctx = Ctx::default();
        let result = requisites.run(&mut ctx, target).unwrap();
        assert_eq!(result, Some(42));
        assert_eq!(ctx.target_calls, 1);
        assert_eq!(ctx.log, vec!["none", "none"]);
    }

    #[test]
    fn test_halt_skips_target_and_remaining_steps() {
        let requisites = Requisites::new()
            .step("a", setup_none)
            .step("b", setup_halt)
            .step("c", setup_none);
        let mut ctx = Ctx::default();
        let result = requisites.run(&mut ctx, target).unwrap();
        assert_eq!(result, None);
        assert_eq!(ctx.target_calls, 0);
        assert_eq!(ctx.log, vec!["none", "halt"]);
    }

    #[test]
    fn test_empty_requisites_run_target() {
        let mut ctx = Ctx::default();
        assert_eq!(Requisites::new().run(&mut ctx, target).unwrap(), Some(42));
    }

    #[test]
    fn test_step_error_propagates() {
        let requisites = Requisites::new().step("err", setup_error);
        let mut ctx = Ctx::default();
        assert!(requisites.run(&mut ctx, target).is_err());
        assert_eq!(ctx.target_calls, 0);
    }

    #[test]
    fn test_announce_before_and_after() {
        let events = RefCell::new(Vec::new());

        let value = Announce::new("Checking")
            .run_with(
                |m| events.borrow_mut().push(format!("msg:{m}")),
                || {
                    events.borrow_mut().push("call".to_string());
                    Ok(7)
                },
            )
            .unwrap();
        assert_eq!(value, 7);

        Announce::new("Done")
            .after()
            .run_with(
                |m| events.borrow_mut().push(format!("msg:{m}")),
                || {
                    events.borrow_mut().push("call".to_string());
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(
            events.into_inner(),
            vec!["msg:Checking", "call", "call", "msg:Done"]
        );
    }

    #[test]
    fn test_announce_after_skipped_on_error() {
        let mut emitted = Vec::new();
        let result: Result<()> = Announce::new("Done")
            .after()
            .run_with(|m| emitted.push(m.to_string()), || anyhow::bail!("failed"));
        assert!(result.is_err());
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_announced_steps_use_doc_then_name() {
        let requisites = Requisites::new()
            .announced("check", "Checking things\n\nMore detail.", setup_none)
            .step("quiet", setup_none)
            .announced("sync", "", setup_none);
        let mut ctx = Ctx::default();
        let mut emitted = Vec::new();
        let result = requisites
            .run_with(&mut ctx, |m| emitted.push(m.to_string()), target)
            .unwrap();
        assert_eq!(result, Some(42));
        assert_eq!(emitted, vec!["Checking things", "sync"]);
        assert_eq!(ctx.log, vec!["none", "none", "none"]);
    }

    #[test]
    fn test_announced_step_error_propagates() {
        let requisites = Requisites::new().announced("err", "Failing step", setup_error);
        let mut ctx = Ctx::default();
        let mut emitted = Vec::new();
        assert!(
            requisites
                .run_with(&mut ctx, |m| emitted.push(m.to_string()), target)
                .is_err()
        );
        assert_eq!(emitted, vec!["Failing step"]);
        assert_eq!(ctx.target_calls, 0);
    }

    #[test]
    fn test_bold_flag() {
        assert!(Announce::new("x").bold);
        assert!(!Announce::new("x").bold(false).bold);
        assert_eq!(Announce::new("x").after().timing, Timing::After);
    }

    #[test]
    fn test_resolve_message_fallbacks() {
        assert_eq!(
            Announce::resolve(Some("Explicit"), "Doc line", "name").message(),
            "Explicit"
        );
        assert_eq!(
            Announce::resolve(None, "\n  Doc line\n  more", "name").message(),
            "Doc line"
        );
        assert_eq!(Announce::resolve(None, "", "name").message(), "name");
    }
}
