//! Macro-expanded arithmetic.
//!
//! [`Evaluator::eval`] resolves macros, vets the result with the
//! [`SafetyFilter`], and only then hands it to the arithmetic evaluator:
//!
//! ```text
//! text ─► Resolver ─► trim ─► SafetyFilter ─► parse ─► evaluate ─► Value
//! ```
//!
//! Every failure along the way lands on the returned
//! [`EvaluationResult`] with the trace intact.

use crate::arith::{eval_expr, parse_expr, EvalContext, MathContext, Value};
use crate::error::MacroError;
use crate::lookup::Lookup;
use crate::resolve::Resolver;
use crate::result::{EvaluationResult, ResolutionResult};
use crate::safety::SafetyFilter;

/// Resolver + safety filter + arithmetic evaluator.
pub struct Evaluator {
    resolver: Resolver,
    filter: SafetyFilter,
    context: Box<dyn EvalContext>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Resolver::new())
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("resolver", &self.resolver)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl Evaluator {
    /// Evaluator over `resolver`, the default filter and the math library.
    pub fn new(resolver: Resolver) -> Self {
        Evaluator {
            resolver,
            filter: SafetyFilter::default(),
            context: Box::new(MathContext),
        }
    }

    pub fn with_lookup(lookup: Lookup) -> Self {
        Self::new(Resolver::with_lookup(lookup))
    }

    /// Replace the safety filter.
    pub fn with_filter(mut self, filter: SafetyFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the constant/function table.  Names it adds must also be
    /// allowed by the filter to be reachable.
    pub fn with_context(mut self, context: impl EvalContext + 'static) -> Self {
        self.context = Box::new(context);
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    pub fn lookup_mut(&mut self) -> &mut Lookup {
        self.resolver.lookup_mut()
    }

    pub fn filter(&self) -> &SafetyFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut SafetyFilter {
        &mut self.filter
    }

    /// Resolve `text` and evaluate it as an expression.
    pub fn eval(&self, text: &str) -> EvaluationResult {
        self.eval_with(text, ResolutionResult::with_pass_max(self.resolver.pass_max()))
    }

    /// Like [`eval`](Self::eval), resolving into a caller-supplied result so
    /// its pass counter and budget carry over.
    pub fn eval_with(&self, text: &str, result: ResolutionResult) -> EvaluationResult {
        let mut resolved = self.resolver.resolve_with(text, result);
        let source = resolved.value.take();
        let mut out = resolved.map(|_| Value::default());

        // Resolution errors pass through untouched.
        let Some(source) = source else {
            return out.finalize();
        };

        let expr_text = source.trim();
        if expr_text.is_empty() {
            out.fail(MacroError::EmptyExpression);
            return out.finalize();
        }
        if let Err(err) = self.filter.check(expr_text) {
            out.fail(err);
            return out.finalize();
        }

        out.add_step(format!("eval: {expr_text}"));
        let expr = match parse_expr(expr_text) {
            Ok(expr) => expr,
            Err(description) => {
                out.fail(MacroError::ExpressionSyntaxError { description });
                return out.finalize();
            }
        };
        match eval_expr(&expr, self.context.as_ref()) {
            Ok(value) => {
                log::debug!("evaluated {text:?} to {value}");
                out.add_step(format!("result: {value}"));
                out.value = Some(value);
            }
            Err(description) => out.fail(MacroError::ExpressionFailure { description }),
        }
        out.finalize()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
