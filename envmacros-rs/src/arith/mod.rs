//! Generic arithmetic / boolean expression evaluator.
//!
//! This is the evaluator the [`Evaluator`](crate::eval::Evaluator) hands
//! vetted text to.  On its own it performs no macro expansion and no safety
//! filtering; it only knows numbers, booleans, operators, and the math
//! library in [`builtins`].
//!
//! ```rust
//! use envmacros::arith::{eval_str, MathContext, Value};
//!
//! assert_eq!(eval_str("1 << (2 * 4)", &MathContext), Ok(Value::Int(0x100)));
//! assert_eq!(eval_str("True and not False", &MathContext), Ok(Value::Bool(true)));
//! ```

pub mod builtins;
pub mod expr;
pub mod value;

// Re-exports for convenience.
pub use expr::{eval_expr, eval_str, parse_expr, EvalContext, MathContext};
pub use value::Value;
