//! Runtime value type for the arithmetic evaluator.
//!
//! Values are integers, floats, or booleans.  Booleans take part in
//! arithmetic as `0` / `1`; mixing in a float promotes the whole operation to
//! float.  Operations that cannot produce a value return `Err` with a short
//! description.

use std::cmp::Ordering;
use std::fmt;

/// A typed evaluation result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                if x.is_nan() {
                    write!(f, "nan")
                } else if x.is_infinite() {
                    write!(f, "{}", if *x > 0.0 { "inf" } else { "-inf" })
                } else if x.fract() == 0.0 && x.abs() < 1e16 {
                    // Whole floats keep their ".0" so they read back as floats.
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
        }
    }
}

/// Operands after numeric promotion.
enum Pair {
    Ints(i64, i64),
    Floats(f64, f64),
}

impl Value {
    /// Truthiness: zero and `False` are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Bool(b) => *b,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(n) => *n as f64,
            Value::Float(x) => *x,
            Value::Bool(b) => f64::from(u8::from(*b)),
        }
    }

    /// Integer view; floats have none.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
        }
    }

    fn promote(&self, rhs: &Value) -> Pair {
        match (self.as_int(), rhs.as_int()) {
            (Some(a), Some(b)) => Pair::Ints(a, b),
            _ => Pair::Floats(self.as_float(), rhs.as_float()),
        }
    }

    fn int_operands(&self, rhs: &Value, op: &str) -> Result<(i64, i64), String> {
        match (self.as_int(), rhs.as_int()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(format!(
                "unsupported operand type(s) for {op}: '{}' and '{}'",
                self.type_name(),
                rhs.type_name()
            )),
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    pub fn arith_add(&self, rhs: &Value) -> Result<Value, String> {
        match self.promote(rhs) {
            Pair::Ints(a, b) => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            Pair::Floats(a, b) => Ok(Value::Float(a + b)),
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Result<Value, String> {
        match self.promote(rhs) {
            Pair::Ints(a, b) => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            Pair::Floats(a, b) => Ok(Value::Float(a - b)),
        }
    }

    pub fn arith_mul(&self, rhs: &Value) -> Result<Value, String> {
        match self.promote(rhs) {
            Pair::Ints(a, b) => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            Pair::Floats(a, b) => Ok(Value::Float(a * b)),
        }
    }

    /// True division: always a float.
    pub fn arith_div(&self, rhs: &Value) -> Result<Value, String> {
        let b = rhs.as_float();
        if b == 0.0 {
            return Err("division by zero".into());
        }
        Ok(Value::Float(self.as_float() / b))
    }

    /// Floor division.
    pub fn arith_floor_div(&self, rhs: &Value) -> Result<Value, String> {
        match self.promote(rhs) {
            Pair::Ints(_, 0) => Err("integer division or modulo by zero".into()),
            Pair::Ints(a, b) => {
                let q = a.checked_div(b).ok_or_else(overflow)?;
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    Ok(Value::Int(q - 1))
                } else {
                    Ok(Value::Int(q))
                }
            }
            Pair::Floats(_, b) if b == 0.0 => Err("float floor division by zero".into()),
            Pair::Floats(a, b) => Ok(Value::Float((a / b).floor())),
        }
    }

    /// Modulo; the result takes the sign of the divisor.
    pub fn arith_rem(&self, rhs: &Value) -> Result<Value, String> {
        match self.promote(rhs) {
            Pair::Ints(_, 0) => Err("integer division or modulo by zero".into()),
            Pair::Ints(a, b) => {
                let r = a.checked_rem(b).ok_or_else(overflow)?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    Ok(Value::Int(r + b))
                } else {
                    Ok(Value::Int(r))
                }
            }
            Pair::Floats(_, b) if b == 0.0 => Err("float modulo".into()),
            Pair::Floats(a, b) => {
                let r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    Ok(Value::Float(r + b))
                } else {
                    Ok(Value::Float(r))
                }
            }
        }
    }

    /// Exponentiation; a negative integer exponent gives a float.
    pub fn arith_pow(&self, rhs: &Value) -> Result<Value, String> {
        match self.promote(rhs) {
            Pair::Ints(0, b) if b < 0 => {
                Err("0.0 cannot be raised to a negative power".into())
            }
            Pair::Ints(a, b) if b < 0 => Ok(Value::Float((a as f64).powf(b as f64))),
            Pair::Ints(a, b) => {
                let exp = u32::try_from(b).map_err(|_| overflow())?;
                a.checked_pow(exp).map(Value::Int).ok_or_else(overflow)
            }
            Pair::Floats(a, b) => {
                if a == 0.0 && b < 0.0 {
                    return Err("0.0 cannot be raised to a negative power".into());
                }
                let r = a.powf(b);
                if r.is_nan() && !a.is_nan() && !b.is_nan() {
                    // Negative base with a fractional exponent.
                    return Err("math domain error".into());
                }
                Ok(Value::Float(r))
            }
        }
    }

    pub fn arith_neg(&self) -> Result<Value, String> {
        match self {
            Value::Float(x) => Ok(Value::Float(-x)),
            other => other
                .as_int()
                .and_then(i64::checked_neg)
                .map(Value::Int)
                .ok_or_else(overflow),
        }
    }

    /// Unary plus: numeric identity, booleans become integers.
    pub fn arith_pos(&self) -> Value {
        match self {
            Value::Bool(b) => Value::Int(i64::from(*b)),
            other => *other,
        }
    }

    pub fn bit_not(&self) -> Result<Value, String> {
        self.as_int()
            .map(|n| Value::Int(!n))
            .ok_or_else(|| format!("bad operand type for unary ~: '{}'", self.type_name()))
    }

    pub fn bit_and(&self, rhs: &Value) -> Result<Value, String> {
        if let (Value::Bool(a), Value::Bool(b)) = (self, rhs) {
            return Ok(Value::Bool(*a & *b));
        }
        let (a, b) = self.int_operands(rhs, "&")?;
        Ok(Value::Int(a & b))
    }

    pub fn bit_or(&self, rhs: &Value) -> Result<Value, String> {
        if let (Value::Bool(a), Value::Bool(b)) = (self, rhs) {
            return Ok(Value::Bool(*a | *b));
        }
        let (a, b) = self.int_operands(rhs, "|")?;
        Ok(Value::Int(a | b))
    }

    pub fn bit_xor(&self, rhs: &Value) -> Result<Value, String> {
        if let (Value::Bool(a), Value::Bool(b)) = (self, rhs) {
            return Ok(Value::Bool(*a ^ *b));
        }
        let (a, b) = self.int_operands(rhs, "^")?;
        Ok(Value::Int(a ^ b))
    }

    pub fn shl(&self, rhs: &Value) -> Result<Value, String> {
        let (a, b) = self.int_operands(rhs, "<<")?;
        if b < 0 {
            return Err("negative shift count".into());
        }
        if a == 0 {
            return Ok(Value::Int(0));
        }
        if b >= 64 {
            return Err(overflow());
        }
        let wide = i128::from(a) << b;
        i64::try_from(wide).map(Value::Int).map_err(|_| overflow())
    }

    pub fn shr(&self, rhs: &Value) -> Result<Value, String> {
        let (a, b) = self.int_operands(rhs, ">>")?;
        if b < 0 {
            return Err("negative shift count".into());
        }
        Ok(Value::Int(a >> b.min(63)))
    }

    /// Numeric comparison.  `None` when either side is NaN.
    pub fn cmp_value(&self, rhs: &Value) -> Option<Ordering> {
        match self.promote(rhs) {
            Pair::Ints(a, b) => Some(a.cmp(&b)),
            Pair::Floats(a, b) => a.partial_cmp(&b),
        }
    }
}

fn overflow() -> String {
    "integer overflow".into()
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::Float(f64::NAN).to_string(), "nan");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Bool(false).to_string(), "False");
    }

    #[test]
    fn truthiness() {
        assert!(Value::Int(3).as_bool());
        assert!(!Value::Int(0).as_bool());
        assert!(!Value::Float(0.0).as_bool());
        assert!(Value::Bool(true).as_bool());
    }

    #[test]
    fn int_arithmetic() {
        let a = Value::Int(10);
        let b = Value::Int(3);
        assert_eq!(a.arith_add(&b), Ok(Value::Int(13)));
        assert_eq!(a.arith_sub(&b), Ok(Value::Int(7)));
        assert_eq!(a.arith_mul(&b), Ok(Value::Int(30)));
        assert_eq!(a.arith_floor_div(&b), Ok(Value::Int(3)));
        assert_eq!(a.arith_rem(&b), Ok(Value::Int(1)));
    }

    #[test]
    fn true_division_is_float() {
        assert_eq!(Value::Int(6).arith_div(&Value::Int(3)), Ok(Value::Float(2.0)));
    }

    #[test]
    fn floor_semantics_for_negatives() {
        assert_eq!(Value::Int(-7).arith_floor_div(&Value::Int(2)), Ok(Value::Int(-4)));
        assert_eq!(Value::Int(7).arith_floor_div(&Value::Int(-2)), Ok(Value::Int(-4)));
        assert_eq!(Value::Int(-7).arith_rem(&Value::Int(2)), Ok(Value::Int(1)));
        assert_eq!(Value::Int(7).arith_rem(&Value::Int(-2)), Ok(Value::Int(-1)));
    }

    #[test]
    fn div_by_zero() {
        assert!(Value::Int(1).arith_div(&Value::Int(0)).is_err());
        assert!(Value::Int(1).arith_floor_div(&Value::Int(0)).is_err());
        assert!(Value::Int(1).arith_rem(&Value::Int(0)).is_err());
    }

    #[test]
    fn float_promotion() {
        assert_eq!(Value::Int(7).arith_add(&Value::Float(2.0)), Ok(Value::Float(9.0)));
    }

    #[test]
    fn bools_count_as_ints() {
        assert_eq!(Value::Bool(true).arith_add(&Value::Int(1)), Ok(Value::Int(2)));
        assert_eq!(Value::Bool(true).arith_pos(), Value::Int(1));
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(Value::Int(i64::MAX).arith_add(&Value::Int(1)).is_err());
        assert!(Value::Int(1).shl(&Value::Int(64)).is_err());
        assert!(Value::Int(i64::MIN).arith_neg().is_err());
    }

    #[test]
    fn powers() {
        assert_eq!(Value::Int(2).arith_pow(&Value::Int(10)), Ok(Value::Int(1024)));
        assert_eq!(Value::Int(2).arith_pow(&Value::Int(-1)), Ok(Value::Float(0.5)));
        assert!(Value::Float(-8.0).arith_pow(&Value::Float(0.5)).is_err());
    }

    #[test]
    fn shifts() {
        assert_eq!(Value::Int(1).shl(&Value::Int(8)), Ok(Value::Int(0x100)));
        assert_eq!(Value::Int(256).shr(&Value::Int(4)), Ok(Value::Int(16)));
        assert!(Value::Int(1).shl(&Value::Int(-1)).is_err());
        assert!(Value::Float(1.0).shl(&Value::Int(1)).is_err());
    }

    #[test]
    fn bitwise_on_bools_stays_bool() {
        assert_eq!(Value::Bool(true).bit_and(&Value::Bool(false)), Ok(Value::Bool(false)));
        assert_eq!(Value::Int(5).bit_or(&Value::Int(2)), Ok(Value::Int(7)));
    }

    #[test]
    fn comparisons() {
        assert_eq!(Value::Int(2).cmp_value(&Value::Float(2.0)), Some(Ordering::Equal));
        assert_eq!(Value::Int(1).cmp_value(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(Value::Float(f64::NAN).cmp_value(&Value::Int(1)), None);
    }
}
