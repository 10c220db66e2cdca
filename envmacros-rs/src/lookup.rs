//! Macro name → value lookup.
//!
//! A [`Lookup`] answers "what text does `${NAME}` stand for?" by consulting,
//! in order:
//!
//! 1. its own static entries (added with [`Lookup::add`] or by a varfile),
//! 2. the process environment, unless disabled with [`Lookup::with_env`],
//! 3. the dynamic-macro registry: handlers that compute a value on demand.
//!
//! `NOW` and `GETCWD` are registered by default.  Every value that is found is
//! traced on the caller's result together with where it came from.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::MacroError;
use crate::result::MacroResult;

/// Handler behind a dynamic macro.  An `Err` (or a panic) is reported as
/// [`MacroError::DynamicMacroFailure`].
pub type MacroHandler = Box<dyn Fn() -> Result<String, String>>;

/// `NOW` format: the classic `ctime` layout, e.g. `Sun Oct 18 20:01:05 2026`.
pub const NOW_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Origin recorded for values taken from the process environment.
pub const ENV_ORIGIN: &str = "environment";

/// A stored name/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupEntry {
    pub name: String,
    pub value: String,
    /// Where the value came from (`file:line`, a description, …).
    pub origin: Option<String>,
}

struct DynamicMacro {
    origin: String,
    handler: MacroHandler,
}

/// Conversion of a value into macro text.
///
/// Strings are taken verbatim; numbers use their canonical decimal form
/// (whole floats keep `.0`); booleans render as `True` / `False` so they read
/// back through the evaluator.
pub trait IntoMacroText {
    fn into_macro_text(self) -> String;
}

impl IntoMacroText for String {
    fn into_macro_text(self) -> String {
        self
    }
}

impl IntoMacroText for &str {
    fn into_macro_text(self) -> String {
        self.to_owned()
    }
}

impl IntoMacroText for &String {
    fn into_macro_text(self) -> String {
        self.clone()
    }
}

impl IntoMacroText for bool {
    fn into_macro_text(self) -> String {
        crate::arith::Value::Bool(self).to_string()
    }
}

impl IntoMacroText for f64 {
    fn into_macro_text(self) -> String {
        crate::arith::Value::Float(self).to_string()
    }
}

impl IntoMacroText for f32 {
    fn into_macro_text(self) -> String {
        f64::from(self).into_macro_text()
    }
}

impl IntoMacroText for crate::arith::Value {
    fn into_macro_text(self) -> String {
        self.to_string()
    }
}

macro_rules! int_macro_text {
    ($($t:ty),*) => {
        $(impl IntoMacroText for $t {
            fn into_macro_text(self) -> String {
                self.to_string()
            }
        })*
    };
}

int_macro_text!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Macro dictionary with environment and dynamic fallbacks.
pub struct Lookup {
    entries: HashMap<String, LookupEntry>,
    dynamic: HashMap<String, DynamicMacro>,
    allow_env: bool,
}

impl Default for Lookup {
    fn default() -> Self {
        let mut lookup = Lookup::empty();
        lookup.register("NOW", "dynamic NOW", || {
            Ok(chrono::Local::now().format(NOW_FORMAT).to_string())
        });
        lookup.register("GETCWD", "dynamic GETCWD", || {
            std::env::current_dir()
                .map(|p| p.display().to_string())
                .map_err(|e| e.to_string())
        });
        lookup
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dynamic: Vec<&str> = self.dynamic.keys().map(String::as_str).collect();
        dynamic.sort_unstable();
        f.debug_struct("Lookup")
            .field("entries", &self.entries)
            .field("dynamic", &dynamic)
            .field("allow_env", &self.allow_env)
            .finish()
    }
}

impl Lookup {
    /// Lookup with the environment fallback and the `NOW`/`GETCWD` builtins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup with the environment fallback but no dynamic macros.
    pub fn empty() -> Self {
        Lookup {
            entries: HashMap::new(),
            dynamic: HashMap::new(),
            allow_env: true,
        }
    }

    /// Enable or disable the environment fallback.
    pub fn with_env(mut self, allow_env: bool) -> Self {
        self.allow_env = allow_env;
        self
    }

    /// Drop all registered dynamic macros, builtins included.
    pub fn without_builtins(mut self) -> Self {
        self.dynamic.clear();
        self
    }

    pub fn allows_env(&self) -> bool {
        self.allow_env
    }

    /// Add (or silently replace) a static entry with no origin.
    pub fn add(&mut self, name: impl Into<String>, value: impl IntoMacroText) {
        self.insert(name.into(), value.into_macro_text(), None);
    }

    /// Add (or silently replace) a static entry, remembering where it came
    /// from.
    pub fn add_with_origin(
        &mut self,
        name: impl Into<String>,
        value: impl IntoMacroText,
        origin: impl Into<String>,
    ) {
        self.insert(name.into(), value.into_macro_text(), Some(origin.into()));
    }

    fn insert(&mut self, name: String, value: String, origin: Option<String>) {
        let entry = LookupEntry { name: name.clone(), value, origin };
        self.entries.insert(name, entry);
    }

    /// Register a dynamic macro: `${name}` is computed by `handler` whenever
    /// no static entry or environment variable supplies it.
    pub fn register<F>(&mut self, name: impl Into<String>, origin: impl Into<String>, handler: F)
    where
        F: Fn() -> Result<String, String> + 'static,
    {
        self.dynamic.insert(
            name.into(),
            DynamicMacro { origin: origin.into(), handler: Box::new(handler) },
        );
    }

    /// Remove a dynamic macro.  Returns `true` if it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.dynamic.remove(name).is_some()
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        self.dynamic.contains_key(name)
    }

    /// The static entry for `name`, if any.
    pub fn entry(&self, name: &str) -> Option<&LookupEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove a static entry.  Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Iterate over the static entries.
    pub fn iter(&self) -> impl Iterator<Item = &LookupEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `name` to text, tracing on `ctx`.
    ///
    /// Returns `None` after recording [`MacroError::UndefinedMacro`] when no
    /// source knows the name, or [`MacroError::DynamicMacroFailure`] when a
    /// handler fails.  Handler failures never escape this call.
    pub fn resolve_name<T>(&self, ctx: &mut MacroResult<T>, name: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(name) {
            log::trace!("{name}: static entry");
            trace_found(ctx, name, &entry.value, entry.origin.as_deref());
            return Some(entry.value.clone());
        }

        if self.allow_env {
            // Non-UTF-8 values are kept, lossily, rather than treated as unset.
            if let Some(value) = std::env::var_os(name).map(|v| v.to_string_lossy().into_owned()) {
                log::trace!("{name}: environment");
                trace_found(ctx, name, &value, Some(ENV_ORIGIN));
                return Some(value);
            }
        }

        if let Some(dynamic) = self.dynamic.get(name) {
            log::trace!("{name}: dynamic");
            return match run_handler(&dynamic.handler) {
                Ok(value) => {
                    trace_found(ctx, name, &value, Some(&dynamic.origin));
                    Some(value)
                }
                Err(description) => {
                    log::warn!("dynamic macro {name} failed: {description}");
                    ctx.fail(MacroError::DynamicMacroFailure {
                        name: name.to_owned(),
                        description,
                    });
                    None
                }
            };
        }

        ctx.fail(MacroError::UndefinedMacro { name: name.to_owned() });
        None
    }
}

fn trace_found<T>(ctx: &mut MacroResult<T>, name: &str, value: &str, origin: Option<&str>) {
    match origin {
        Some(origin) => ctx.add_step(format!("{name} -> {value} ({origin})")),
        None => ctx.add_step(format!("{name} -> {value}")),
    }
}

/// Run a handler, turning a panic into an error description.
fn run_handler(handler: &MacroHandler) -> Result<String, String> {
    match catch_unwind(AssertUnwindSafe(|| handler())) {
        Ok(result) => result,
        Err(payload) => Err(if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic".to_owned()
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
