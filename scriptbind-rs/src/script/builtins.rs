//! Built-in script functions that need nothing but their arguments.
//!
//! Functions that touch the binding or run nested scripts (`defined`, `get`,
//! `set`, `run`, `eval`, …) live on the interpreter instead; the dispatcher
//! here is consulted after those.

use regex::Regex;

use super::value::Value;
use crate::error::RuntimeError;

/// Dispatch a built-in function call.
///
/// Returns `None` if the function name is not a built-in.
pub fn call_builtin(name: &str, args: Vec<Value>) -> Option<Result<Value, RuntimeError>> {
    // Inner function returns Result<Option<Value>, _>:
    //   Ok(None)    → not a builtin
    //   Ok(Some(v)) → success
    //   Err(e)      → builtin call failed
    fn inner(name: &str, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
        Ok(Some(match name {
            // ── Conversion / inspection ───────────────────────────────────────
            "len" => {
                arity(name, &args, 1)?;
                let n = match &args[0] {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) => items.len(),
                    Value::Map(entries) => entries.len(),
                    other => return Err(wrong_type(name, "a string, list or map", other)),
                };
                Value::Int(n as i64)
            }
            "str" => {
                arity(name, &args, 1)?;
                Value::Str(args[0].to_string())
            }
            "int" => {
                arity(name, &args, 1)?;
                match &args[0] {
                    Value::Int(n) => Value::Int(*n),
                    Value::Float(x) => Value::Int(float_to_int(*x)?),
                    Value::Bool(b) => Value::Int(i64::from(*b)),
                    Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
                        RuntimeError::Type(format!("int(): cannot convert \"{s}\""))
                    })?,
                    other => return Err(wrong_type(name, "a number or string", other)),
                }
            }
            "float" => {
                arity(name, &args, 1)?;
                match &args[0] {
                    Value::Int(n) => Value::Float(*n as f64),
                    Value::Float(x) => Value::Float(*x),
                    Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
                        RuntimeError::Type(format!("float(): cannot convert \"{s}\""))
                    })?,
                    other => return Err(wrong_type(name, "a number or string", other)),
                }
            }
            "type" => {
                arity(name, &args, 1)?;
                Value::from(args[0].type_name())
            }

            // ── Strings ──────────────────────────────────────────────────────
            "upper" => {
                arity(name, &args, 1)?;
                Value::Str(get_str(name, &args, 0)?.to_uppercase())
            }
            "lower" => {
                arity(name, &args, 1)?;
                Value::Str(get_str(name, &args, 0)?.to_lowercase())
            }
            "trim" => {
                arity(name, &args, 1)?;
                Value::from(get_str(name, &args, 0)?.trim())
            }
            "split" => {
                arity(name, &args, 2)?;
                let s = get_str(name, &args, 0)?;
                let sep = get_str(name, &args, 1)?;
                if sep.is_empty() {
                    Value::List(s.chars().map(|c| Value::Str(c.to_string())).collect())
                } else {
                    Value::List(s.split(sep).map(Value::from).collect())
                }
            }
            "join" => {
                arity(name, &args, 2)?;
                let items = match &args[0] {
                    Value::List(items) => items,
                    other => return Err(wrong_type(name, "a list", other)),
                };
                let sep = get_str(name, &args, 1)?;
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                Value::Str(parts.join(sep))
            }
            "matches" => {
                arity(name, &args, 2)?;
                let text = get_str(name, &args, 0)?;
                let pattern = get_str(name, &args, 1)?;
                let re = Regex::new(pattern).map_err(|e| RuntimeError::BadPattern {
                    pattern: pattern.to_owned(),
                    details: e.to_string(),
                })?;
                Value::Bool(re.is_match(text))
            }

            // ── Collections ──────────────────────────────────────────────────
            "contains" => {
                arity(name, &args, 2)?;
                match (&args[0], &args[1]) {
                    (Value::List(items), needle) => {
                        Value::Bool(items.iter().any(|v| v.loose_eq(needle)))
                    }
                    (Value::Str(s), Value::Str(needle)) => Value::Bool(s.contains(needle.as_str())),
                    (Value::Map(entries), Value::Str(key)) => Value::Bool(entries.contains_key(key)),
                    (other, _) => return Err(wrong_type(name, "a list, string or map", other)),
                }
            }
            "keys" => {
                arity(name, &args, 1)?;
                match &args[0] {
                    Value::Map(entries) => {
                        Value::List(entries.keys().map(|k| Value::from(k.as_str())).collect())
                    }
                    other => return Err(wrong_type(name, "a map", other)),
                }
            }

            _ => return Ok(None),
        }))
    }
    inner(name, args).transpose()
}

/// Truncate toward zero; NaN and values outside `i64` are errors.
fn float_to_int(x: f64) -> Result<i64, RuntimeError> {
    if x.is_nan() {
        return Err(RuntimeError::Type("int(): cannot convert NaN".into()));
    }
    let t = x.trunc();
    // i64::MIN is exactly -2^63; i64::MAX rounds up to 2^63 as a float.
    if t < -9_223_372_036_854_775_808.0 || t >= 9_223_372_036_854_775_808.0 {
        return Err(RuntimeError::Overflow);
    }
    Ok(t as i64)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

pub(super) fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::Arity {
            name: name.to_owned(),
            expected: expected.to_string(),
            got: args.len(),
        });
    }
    Ok(())
}

pub(super) fn get_str<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a str, RuntimeError> {
    match args.get(idx) {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(wrong_type(name, "a string", other)),
        None => Err(RuntimeError::Arity {
            name: name.to_owned(),
            expected: format!("at least {}", idx + 1),
            got: args.len(),
        }),
    }
}

fn wrong_type(name: &str, expected: &str, got: &Value) -> RuntimeError {
    RuntimeError::Type(format!("{name}() expects {expected}, got {}", got.type_name()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
