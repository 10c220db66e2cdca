//! Error types.
//!
//! Two families live here:
//!
//! - [`MacroError`]: failures of resolution and evaluation.  These are never
//!   returned as `Err`; they are recorded on the
//!   [`MacroResult`](crate::result::MacroResult) together with the trace.
//! - [`VarfileError`]: faults raised by the varfile loader, which runs before
//!   any result object exists.

use std::path::PathBuf;

use thiserror::Error;

/// Why a resolution or evaluation produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MacroError {
    /// No source (static entry, environment, dynamic macro) knows the name.
    #[error("Undefined: {name}")]
    UndefinedMacro { name: String },

    /// A dynamic macro handler failed while computing its value.
    #[error("Exception: {name} -> {description}")]
    DynamicMacroFailure { name: String, description: String },

    /// The pass budget ran out; usually a circular definition.
    #[error("Too many passes")]
    TooManyPasses { limit: usize },

    /// The resolved expression text was blank.
    #[error("Empty string?")]
    EmptyExpression,

    /// The safety filter rejected a token.
    #[error("Illegal: {token}")]
    UnsafeExpression { token: String },

    /// The vetted text did not parse as an expression.
    #[error("Syntax Error: {description}")]
    ExpressionSyntaxError { description: String },

    /// The expression parsed but could not be evaluated (division by zero,
    /// math domain errors, bad operand types).
    #[error("Evaluation Error: {description}")]
    ExpressionFailure { description: String },
}

/// A fault raised while loading a text varfile.
#[derive(Debug, Error)]
pub enum VarfileError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A non-blank, non-comment line that is not `NAME = VALUE`.
    #[error("{origin}: syntax: {line}")]
    Syntax { origin: String, line: String },

    /// The name already has a static entry.
    #[error("{origin}: Duplicate {name}, previous: {previous}")]
    Duplicate {
        origin: String,
        name: String,
        previous: String,
    },
}
