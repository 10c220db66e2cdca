//! Shell-style `${NAME}` macro resolution.
//!
//! Text containing `${NAME}` placeholders is rewritten until none are left.
//! Names come from a [`Lookup`]: static entries first, then the process
//! environment, then dynamic macros such as `NOW` and `GETCWD`.  Values may
//! themselves contain placeholders, and placeholders may nest
//! (`${parent_${child}}`).
//!
//! The [`Evaluator`] goes one step further: it resolves the text, passes it
//! through an allowlist [`SafetyFilter`], and evaluates it as arithmetic.
//!
//! ```rust
//! use envmacros::{Evaluator, Lookup, Resolver, Value};
//!
//! let mut lookup = Lookup::new().with_env(false);
//! lookup.add("child", "Zack");
//! lookup.add("parent_Zack", "duane");
//! lookup.add("width", 40);
//!
//! let resolver = Resolver::with_lookup(lookup);
//! let r = resolver.resolve("Double ${parent_${child}}");
//! assert_eq!(r.value.as_deref(), Some("Double duane"));
//!
//! let r = resolver.resolve("${missing}");
//! assert_eq!(r.value, None);
//! assert_eq!(r.err_msg().as_deref(), Some("Undefined: missing"));
//!
//! let evaluator = Evaluator::new(resolver);
//! assert_eq!(evaluator.eval("${width} // 3").value, Some(Value::Int(13)));
//! ```
//!
//! Failures never surface as `Err`: every call returns a [`MacroResult`]
//! carrying the value (or `None`), the error, and a step-by-step trace.
//! Only the varfile loader, which runs before any result exists, returns
//! [`VarfileError`].

pub mod arith;
pub mod cli;
pub mod error;
pub mod eval;
pub mod lookup;
pub mod resolve;
pub mod result;
pub mod safety;
pub mod varfile;

pub use arith::Value;
pub use error::{MacroError, VarfileError};
pub use eval::Evaluator;
pub use lookup::{IntoMacroText, Lookup, LookupEntry, MacroHandler};
pub use resolve::{is_macro_name, Resolver, ResolverBuilder, ResolverOptions};
pub use result::{EvaluationResult, MacroResult, ResolutionResult, DEFAULT_PASS_MAX};
pub use safety::SafetyFilter;
pub use varfile::{load_str, read_text_varfile};
