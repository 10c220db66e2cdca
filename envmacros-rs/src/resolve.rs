//! `${NAME}` macro resolution.
//!
//! Resolution is a fixed-point rewrite.  Each pass finds one well-formed
//! placeholder, replaces it with the looked-up text, and starts over on the
//! new string; it stops when no placeholder is left.  Because the text before
//! the placeholder is captured greedily and a name may not contain braces, the
//! placeholder chosen is the last complete `${NAME}` in the string, which for
//! nested forms like `${parent_${child}}` is always the innermost one.
//!
//! | Input | Outcome |
//! |-------|---------|
//! | no `$` at all | returned unchanged, no trace |
//! | `${NAME}` with NAME defined | substituted, traced as a pass |
//! | `${NAME}` with NAME undefined | `Undefined: NAME`, no value |
//! | `${NAME` (unterminated) | left verbatim, not an error |
//! | circular definitions | `Too many passes` after `pass_max` passes |

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::error::MacroError;
use crate::lookup::Lookup;
use crate::result::{ResolutionResult, DEFAULT_PASS_MAX};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"^(?P<before>.*)\$\{(?P<name>[A-Za-z_][0-9A-Za-z_]*)\}(?P<after>.*)$")
            .dot_matches_new_line(true)
            .multi_line(false)
            .build()
            .expect("placeholder pattern is valid")
    })
}

/// Returns `true` if `name` is a valid macro name (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Tunables for a [`Resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Substitution passes allowed before giving up with `Too many passes`.
    pub pass_max: usize,
    /// Whether undefined names fall back to the process environment.
    pub allow_env: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions { pass_max: DEFAULT_PASS_MAX, allow_env: true }
    }
}

/// Builder for a [`Resolver`].
#[derive(Debug, Default)]
pub struct ResolverBuilder {
    lookup: Option<Lookup>,
    pass_max: Option<usize>,
    allow_env: Option<bool>,
}

impl ResolverBuilder {
    /// Use `lookup` instead of a fresh [`Lookup::new`].
    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn pass_max(mut self, pass_max: usize) -> Self {
        self.pass_max = Some(pass_max);
        self
    }

    /// Override the lookup's environment fallback.
    pub fn allow_env(mut self, allow_env: bool) -> Self {
        self.allow_env = Some(allow_env);
        self
    }

    pub fn options(self, options: ResolverOptions) -> Self {
        self.pass_max(options.pass_max).allow_env(options.allow_env)
    }

    pub fn build(self) -> Resolver {
        let mut lookup = self.lookup.unwrap_or_default();
        if let Some(allow_env) = self.allow_env {
            lookup = lookup.with_env(allow_env);
        }
        Resolver {
            lookup,
            pass_max: self.pass_max.unwrap_or(DEFAULT_PASS_MAX),
        }
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Drives the substitution loop over a [`Lookup`].
#[derive(Debug)]
pub struct Resolver {
    lookup: Lookup,
    pass_max: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Resolver over a default [`Lookup`] with the default pass budget.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_lookup(lookup: Lookup) -> Self {
        Self::builder().lookup(lookup).build()
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    pub fn lookup_mut(&mut self) -> &mut Lookup {
        &mut self.lookup
    }

    pub fn pass_max(&self) -> usize {
        self.pass_max
    }

    pub fn set_pass_max(&mut self, pass_max: usize) {
        self.pass_max = pass_max;
    }

    /// Resolve every macro in `text` into a fresh result.
    pub fn resolve(&self, text: &str) -> ResolutionResult {
        self.resolve_with(text, ResolutionResult::with_pass_max(self.pass_max))
    }

    /// Resolve `text` into a caller-supplied result.
    ///
    /// The result's `pass_count` is not reset and its `pass_max` is the budget,
    /// so a result handed to several calls shares one budget across them.
    /// Steps are appended after any already present.
    pub fn resolve_with(&self, text: &str, mut result: ResolutionResult) -> ResolutionResult {
        if !text.contains('$') {
            result.value = Some(text.to_owned());
            return result.finalize();
        }

        result.add_step(format!("start: {text}"));
        let mut current = text.to_owned();
        while let Some(next) = self.make_pass(&current, &mut result) {
            current = next;
            result.pass_count += 1;
            if result.pass_count > result.pass_max {
                log::debug!("giving up after {} passes", result.pass_count);
                result.add_step("too many passes");
                result.fail(MacroError::TooManyPasses { limit: result.pass_max });
                break;
            }
            log::debug!("pass {}: {current:?}", result.pass_count);
            result.add_step(format!("pass: {} -> {current}", result.pass_count));
        }
        result.value = Some(current);

        let result = result.finalize();
        match &result.error {
            Some(err) => log::debug!("resolve {text:?} failed: {err}"),
            None => log::debug!("resolved {text:?} in {} passes", result.pass_count),
        }
        result
    }

    /// Substitute one placeholder.  `None` when there is nothing left to do or
    /// the lookup failed (the error is then on `result`).
    fn make_pass(&self, text: &str, result: &mut ResolutionResult) -> Option<String> {
        let caps = placeholder_re().captures(text)?;
        let name = &caps["name"];
        let value = self.lookup.resolve_name(result, name)?;
        Some(format!("{}{}{}", &caps["before"], value, &caps["after"]))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
