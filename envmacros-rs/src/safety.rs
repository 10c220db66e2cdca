//! Allowlist filter for text headed to the arithmetic evaluator.
//!
//! This is not a grammar.  It strips the characters that are harmless on their
//! own (arithmetic, comparison and logical operators, `.` and `)`), splits what
//! is left on whitespace, and demands that every remaining token be one of:
//!
//! | Token | Example |
//! |-------|---------|
//! | decimal numeral (digits and `.`) | `42`, `3` |
//! | hexadecimal numeral | `0x1F` |
//! | an opening parenthesis | `(` |
//! | boolean literal | `True`, `False` |
//! | logical keyword | `and`, `or`, `not` |
//! | allowed function name followed by `(` | `cos(` |
//! | allowed constant name | `pi` |
//!
//! Anything else (attribute access, subscripts, quotes, braces, assignment,
//! unknown identifiers) is rejected as `Illegal: <token>`.  Real syntax errors
//! are left for the evaluator to find.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::arith::builtins;
use crate::error::MacroError;

/// Characters replaced by a space before tokenizing.  `^` and `,` are
/// deliberately absent: a bitwise xor or a multi-argument call is rejected.
pub const OPERATOR_CHARS: &[char] = &[
    '-', '+', '*', '/', '&', '|', '%', '!', '~', '<', '>', '=', '.', ')',
];

const BOOLEAN_LITERALS: &[&str] = &["True", "False"];
const LOGICAL_KEYWORDS: &[&str] = &["and", "or", "not"];

fn ident_paren_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s+\(").expect("identifier/paren pattern is valid")
    })
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9.]+$").expect("decimal pattern is valid"))
}

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").expect("hex pattern is valid"))
}

/// Allowlist token filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyFilter {
    functions: BTreeSet<String>,
    constants: BTreeSet<String>,
}

impl Default for SafetyFilter {
    /// Allows exactly the built-in math library.
    fn default() -> Self {
        SafetyFilter {
            functions: builtins::FUNCTIONS.iter().map(|s| (*s).to_owned()).collect(),
            constants: builtins::CONSTANTS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl SafetyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter that allows no functions and no constants.
    pub fn empty() -> Self {
        SafetyFilter { functions: BTreeSet::new(), constants: BTreeSet::new() }
    }

    /// Allow `name(` tokens.
    pub fn allow_function(&mut self, name: impl Into<String>) -> &mut Self {
        self.functions.insert(name.into());
        self
    }

    /// Allow a bare `name` token.
    pub fn allow_constant(&mut self, name: impl Into<String>) -> &mut Self {
        self.constants.insert(name.into());
        self
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(String::as_str)
    }

    pub fn constants(&self) -> impl Iterator<Item = &str> {
        self.constants.iter().map(String::as_str)
    }

    /// Reject `text` at its first disallowed token.
    pub fn check(&self, text: &str) -> Result<(), MacroError> {
        for token in tokens(text).split_whitespace() {
            if !self.is_safe_token(token) {
                log::debug!("safety filter rejected {token:?} in {text:?}");
                return Err(MacroError::UnsafeExpression { token: token.to_owned() });
            }
        }
        Ok(())
    }

    pub fn is_safe(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }

    fn is_safe_token(&self, token: &str) -> bool {
        if token == "(" || decimal_re().is_match(token) || hex_re().is_match(token) {
            return true;
        }
        if BOOLEAN_LITERALS.contains(&token) || LOGICAL_KEYWORDS.contains(&token) {
            return true;
        }
        if let Some(name) = token.strip_suffix('(') {
            // `not (x)` collapses to `not(` in the first normalization step.
            return self.functions.contains(name) || LOGICAL_KEYWORDS.contains(&name);
        }
        self.constants.contains(token)
    }
}

/// Normalize `text` so that whitespace splitting yields the tokens to check.
fn tokens(text: &str) -> String {
    let glued = ident_paren_re().replace_all(text, "$1(");
    glued
        .replace('(', "( ")
        .chars()
        .map(|c| if OPERATOR_CHARS.contains(&c) { ' ' } else { c })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(text: &str) -> String {
        match SafetyFilter::default().check(text) {
            Err(MacroError::UnsafeExpression { token }) => token,
            other => panic!("{text:?} should be rejected, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_is_safe() {
        let f = SafetyFilter::default();
        assert!(f.is_safe("2 * 5-4"));
        assert!(f.is_safe("(1+(2*3))/4.5"));
        assert!(f.is_safe("1<<(2*(2*(1+1)))"));
        assert!(f.is_safe("0x0100 >= 256"));
        assert!(f.is_safe("10 % 3 != 1"));
        assert!(f.is_safe("2 ** 8 // 3"));
        assert!(f.is_safe(""));
    }

    #[test]
    fn functions_need_a_paren() {
        let f = SafetyFilter::default();
        assert!(f.is_safe("cos(0)"));
        assert!(f.is_safe("cos (0)"));
        assert!(f.is_safe("sqrt(floor(9.5))"));
        assert_eq!(rejected("cos + 1"), "cos");
    }

    #[test]
    fn booleans_and_keywords() {
        let f = SafetyFilter::default();
        assert!(f.is_safe("True and not False"));
        assert!(f.is_safe("1 < 2 or 3 > 4"));
        assert!(f.is_safe("not (1 == 2)"));
    }

    #[test]
    fn constants_are_bare() {
        let f = SafetyFilter::default();
        assert!(f.is_safe("2 * pi"));
        assert_eq!(rejected("pie"), "pie");
    }

    #[test]
    fn stray_brace_is_rejected() {
        assert_eq!(rejected("2 * 1+{$one}"), "{$one}");
    }

    #[test]
    fn code_injection_is_rejected() {
        assert_eq!(rejected("__import__('os')"), "__import__(");
        assert_eq!(rejected("(1).__class__"), "__class__");
        assert_eq!(rejected("x = 1"), "x");
        assert_eq!(rejected("[1][0]"), "[1][0]");
        assert_eq!(rejected("\"abc\""), "\"abc\"");
        assert_eq!(rejected("exec(1)"), "exec(");
    }

    #[test]
    fn excluded_punctuation_is_rejected() {
        assert_eq!(rejected("1 ^ 2"), "^");
        assert_eq!(rejected("atan2(1, 2)"), "1,");
        assert_eq!(rejected("1; 2"), "1;");
    }

    #[test]
    fn first_offending_token_is_reported() {
        assert_eq!(rejected("1 + foo + bar"), "foo");
    }

    #[test]
    fn custom_allowlist() {
        let mut f = SafetyFilter::empty();
        assert!(!f.is_safe("cos(0)"));
        assert!(!f.is_safe("pi"));
        f.allow_function("cos").allow_constant("pi");
        assert!(f.is_safe("cos(pi)"));
        assert_eq!(f.functions().collect::<Vec<_>>(), vec!["cos"]);
        assert_eq!(f.constants().collect::<Vec<_>>(), vec!["pi"]);
    }

    #[test]
    fn default_allowlist_matches_math_library() {
        let f = SafetyFilter::default();
        assert_eq!(f.functions().count(), builtins::FUNCTIONS.len());
        assert_eq!(f.constants().count(), builtins::CONSTANTS.len());
    }
}
