//! Resolution and evaluation results.
//!
//! A [`MacroResult`] is created per call (or handed in by the caller to carry
//! the pass counter across calls), mutated while the engine works, and then
//! finalized: if an error was recorded the value is cleared, but the error
//! and the full trace stay available for post-mortem debugging.

use crate::arith::Value;
use crate::error::MacroError;

/// Default ceiling on substitution passes.
pub const DEFAULT_PASS_MAX: usize = 50;

/// Outcome of a resolve or eval call.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroResult<T> {
    /// The in-progress (then final) value; `None` once an error is recorded
    /// and the result is finalized.
    pub value: Option<T>,
    /// Human-readable trace, in the order the engine produced it.
    pub steps: Vec<String>,
    pub error: Option<MacroError>,
    /// Substitution passes made so far.
    pub pass_count: usize,
    pub pass_max: usize,
}

/// Text output of [`Resolver::resolve`](crate::resolve::Resolver::resolve).
pub type ResolutionResult = MacroResult<String>;

/// Typed output of [`Evaluator::eval`](crate::eval::Evaluator::eval).
pub type EvaluationResult = MacroResult<Value>;

impl<T> Default for MacroResult<T> {
    fn default() -> Self {
        Self::with_pass_max(DEFAULT_PASS_MAX)
    }
}

impl<T> MacroResult<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass_max(pass_max: usize) -> Self {
        MacroResult {
            value: None,
            steps: Vec::new(),
            error: None,
            pass_count: 0,
            pass_max,
        }
    }

    pub fn add_step(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }

    /// Record an error.  The first error wins; later ones are only traced.
    pub fn fail(&mut self, error: MacroError) {
        self.add_step(format!("error: {error}"));
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Clear the value if an error occurred.
    pub fn finalize(mut self) -> Self {
        if self.error.is_some() {
            self.value = None;
        }
        self
    }

    /// Error message, if any, as the user sees it.
    pub fn err_msg(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Carry the trace, error and counters over to a result of another
    /// value type.  `f` maps the value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MacroResult<U> {
        MacroResult {
            value: self.value.map(f),
            steps: self.steps,
            error: self.error,
            pass_count: self.pass_count,
            pass_max: self.pass_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget() {
        let r: ResolutionResult = MacroResult::new();
        assert_eq!(r.pass_max, DEFAULT_PASS_MAX);
        assert_eq!(r.pass_count, 0);
        assert!(r.is_ok());
    }

    #[test]
    fn finalize_clears_value_on_error() {
        let mut r: ResolutionResult = MacroResult::new();
        r.value = Some("half done".into());
        r.fail(MacroError::EmptyExpression);
        let r = r.finalize();
        assert_eq!(r.value, None);
        assert_eq!(r.err_msg().as_deref(), Some("Empty string?"));
        assert_eq!(r.steps, vec!["error: Empty string?"]);
    }

    #[test]
    fn finalize_keeps_value_without_error() {
        let mut r: ResolutionResult = MacroResult::new();
        r.value = Some("done".into());
        assert_eq!(r.finalize().value.as_deref(), Some("done"));
    }

    #[test]
    fn first_error_wins() {
        let mut r: ResolutionResult = MacroResult::new();
        r.fail(MacroError::UndefinedMacro { name: "a".into() });
        r.fail(MacroError::EmptyExpression);
        assert_eq!(r.error, Some(MacroError::UndefinedMacro { name: "a".into() }));
        assert_eq!(r.steps.len(), 2);
    }

    #[test]
    fn map_carries_trace() {
        let mut r: ResolutionResult = MacroResult::with_pass_max(7);
        r.value = Some("12".into());
        r.add_step("start: 12");
        r.pass_count = 3;
        let m = r.map(|s| s.len());
        assert_eq!(m.value, Some(2));
        assert_eq!(m.steps, vec!["start: 12"]);
        assert_eq!((m.pass_count, m.pass_max), (3, 7));
    }
}
