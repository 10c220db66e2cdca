//! Built-in math library.
//!
//! Each function receives a `Vec<Value>` of already-evaluated arguments and
//! returns `Result<Value, String>`.  [`FUNCTIONS`] and [`CONSTANTS`] list the
//! full surface; the safety filter's default allowlist is built from them.

use super::value::Value;

/// Every function name [`call_builtin`] understands.
pub const FUNCTIONS: &[&str] = &[
    "acos", "acosh", "asin", "asinh", "atan", "atan2", "atanh", "ceil", "copysign", "cos",
    "cosh", "degrees", "exp", "expm1", "fabs", "factorial", "floor", "fmod", "gcd", "hypot",
    "isfinite", "isinf", "isnan", "ldexp", "log", "log10", "log1p", "log2", "pow", "radians",
    "sin", "sinh", "sqrt", "tan", "tanh", "trunc",
];

/// Every named constant [`constant`] understands.
pub const CONSTANTS: &[&str] = &["e", "inf", "nan", "pi", "tau"];

/// Look up a named constant.
pub fn constant(name: &str) -> Option<Value> {
    Some(Value::Float(match name {
        "e" => std::f64::consts::E,
        "inf" => f64::INFINITY,
        "nan" => f64::NAN,
        "pi" => std::f64::consts::PI,
        "tau" => std::f64::consts::TAU,
        _ => return None,
    }))
}

/// Dispatch a built-in function call.
///
/// Returns `None` if the function name is not a built-in.
pub fn call_builtin(name: &str, args: Vec<Value>) -> Option<Result<Value, String>> {
    // Ok(None) → not a builtin; `.transpose()` turns it into the outer None.
    fn inner(name: &str, args: Vec<Value>) -> Result<Option<Value>, String> {
        Ok(Some(match name {
            // ── Trigonometric ────────────────────────────────────────────────
            "sin" => unary(&args, name, f64::sin)?,
            "cos" => unary(&args, name, f64::cos)?,
            "tan" => unary(&args, name, f64::tan)?,
            "asin" => unary(&args, name, f64::asin)?,
            "acos" => unary(&args, name, f64::acos)?,
            "atan" => unary(&args, name, f64::atan)?,
            "atan2" => {
                let [y, x] = floats::<2>(&args, name)?;
                Value::Float(y.atan2(x))
            }
            "sinh" => unary(&args, name, f64::sinh)?,
            "cosh" => unary(&args, name, f64::cosh)?,
            "tanh" => unary(&args, name, f64::tanh)?,
            "asinh" => unary(&args, name, f64::asinh)?,
            "acosh" => unary(&args, name, f64::acosh)?,
            "atanh" => {
                let [x] = floats::<1>(&args, name)?;
                if x.abs() >= 1.0 {
                    return Err(domain());
                }
                Value::Float(x.atanh())
            }
            "degrees" => unary(&args, name, f64::to_degrees)?,
            "radians" => unary(&args, name, f64::to_radians)?,
            "hypot" => {
                let mut acc = 0.0f64;
                for a in &args {
                    acc = acc.hypot(a.as_float());
                }
                Value::Float(acc)
            }

            // ── Exponential / logarithmic ────────────────────────────────────
            "exp" => unary(&args, name, f64::exp)?,
            "expm1" => unary(&args, name, f64::exp_m1)?,
            "sqrt" => unary(&args, name, f64::sqrt)?,
            "log" => match args.len() {
                1 => Value::Float(positive(args[0].as_float())?.ln()),
                2 => {
                    let x = positive(args[0].as_float())?;
                    let base = positive(args[1].as_float())?;
                    if base == 1.0 {
                        return Err("float division by zero".into());
                    }
                    Value::Float(x.ln() / base.ln())
                }
                n => return Err(format!("log expected 1 or 2 arguments, got {n}")),
            },
            "log10" => {
                let [x] = floats::<1>(&args, name)?;
                Value::Float(positive(x)?.log10())
            }
            "log2" => {
                let [x] = floats::<1>(&args, name)?;
                Value::Float(positive(x)?.log2())
            }
            "log1p" => {
                let [x] = floats::<1>(&args, name)?;
                if x <= -1.0 {
                    return Err(domain());
                }
                Value::Float(x.ln_1p())
            }
            "pow" => {
                let [base, exp] = floats::<2>(&args, name)?;
                Value::Float(base).arith_pow(&Value::Float(exp))?
            }
            "ldexp" => {
                let [x] = floats::<1>(&args[..args.len().min(1)], name)?;
                let i = args
                    .get(1)
                    .and_then(Value::as_int)
                    .ok_or_else(|| format!("{name}: second argument must be an integer"))?;
                let scale = 2f64.powi(i32::try_from(i).map_err(|_| range())?);
                checked(x * scale, x)?
            }

            // ── Rounding / integer ───────────────────────────────────────────
            "ceil" => to_int(floats::<1>(&args, name)?[0].ceil())?,
            "floor" => to_int(floats::<1>(&args, name)?[0].floor())?,
            "trunc" => to_int(floats::<1>(&args, name)?[0].trunc())?,
            "fabs" => unary(&args, name, f64::abs)?,
            "copysign" => {
                let [x, y] = floats::<2>(&args, name)?;
                Value::Float(x.copysign(y))
            }
            "fmod" => {
                let [x, y] = floats::<2>(&args, name)?;
                if y == 0.0 || x.is_infinite() {
                    return Err(domain());
                }
                Value::Float(x % y)
            }
            "factorial" => {
                let n = int_arg(&args, 0, name)?;
                if n < 0 {
                    return Err("factorial() not defined for negative values".into());
                }
                let mut acc: i64 = 1;
                for k in 2..=n {
                    acc = acc.checked_mul(k).ok_or("integer overflow")?;
                }
                Value::Int(acc)
            }
            "gcd" => {
                let mut acc: i64 = 0;
                for idx in 0..args.len() {
                    let mut a = acc.unsigned_abs();
                    let mut b = int_arg(&args, idx, name)?.unsigned_abs();
                    while b != 0 {
                        (a, b) = (b, a % b);
                    }
                    acc = i64::try_from(a).map_err(|_| "integer overflow".to_owned())?;
                }
                Value::Int(acc)
            }

            // ── Classification ───────────────────────────────────────────────
            "isfinite" => Value::Bool(floats::<1>(&args, name)?[0].is_finite()),
            "isinf" => Value::Bool(floats::<1>(&args, name)?[0].is_infinite()),
            "isnan" => Value::Bool(floats::<1>(&args, name)?[0].is_nan()),

            _ => return Ok(None),
        }))
    }

    inner(name, args).transpose()
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn floats<const N: usize>(args: &[Value], name: &str) -> Result<[f64; N], String> {
    if args.len() != N {
        return Err(format!(
            "{name}() takes exactly {N} argument{} ({} given)",
            if N == 1 { "" } else { "s" },
            args.len()
        ));
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_float();
    }
    Ok(out)
}

fn int_arg(args: &[Value], idx: usize, name: &str) -> Result<i64, String> {
    let arg = args
        .get(idx)
        .ok_or_else(|| format!("{name}: argument {idx} missing"))?;
    arg.as_int()
        .ok_or_else(|| format!("{name}() only accepts integral values"))
}

/// One float in, one float out, with domain and range checks.
fn unary(args: &[Value], name: &str, f: fn(f64) -> f64) -> Result<Value, String> {
    let [x] = floats::<1>(args, name)?;
    checked(f(x), x)
}

fn checked(result: f64, input: f64) -> Result<Value, String> {
    if result.is_nan() && !input.is_nan() {
        Err(domain())
    } else if result.is_infinite() && input.is_finite() {
        Err(range())
    } else {
        Ok(Value::Float(result))
    }
}

fn positive(x: f64) -> Result<f64, String> {
    if x > 0.0 {
        Ok(x)
    } else {
        Err(domain())
    }
}

fn to_int(x: f64) -> Result<Value, String> {
    if !x.is_finite() {
        return Err("cannot convert float infinity or NaN to integer".into());
    }
    if x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err("integer overflow".into());
    }
    Ok(Value::Int(x as i64))
}

fn domain() -> String {
    "math domain error".into()
}

fn range() -> String {
    "math range error".into()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
