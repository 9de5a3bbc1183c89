//! Runtime value type shared by scripts and the host.
//!
//! Scripts are dynamically typed; a single [`Binding`](crate::Binding) holds
//! strings, lists, numbers and opaque host objects side by side.  Type checks
//! happen at the points that interpret a value (arithmetic, indexing,
//! builtins), never when a value is stored.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RuntimeError;

/// Largest string, in bytes, that `*` may build by repetition.
const MAX_REPEAT_LEN: usize = 1 << 30;

/// A script runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Arbitrary host data passed through a binding untouched.
    Object(HostObject),
}

// ── HostObject ────────────────────────────────────────────────────────────────

/// An opaque host value.  Equality is identity: two handles are equal only
/// when they point at the same allocation.
#[derive(Clone)]
pub struct HostObject {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        HostObject {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject<{}>", self.type_name)
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Keep a trailing `.0` so floats stay recognisable as floats.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                if entries.is_empty() {
                    return write!(f, "[:]");
                }
                write!(f, "[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

impl Value {
    /// Script truthiness: null, false, zero, and empty strings/collections
    /// are false.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the list payload, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Name of the type, as returned by the `type()` builtin.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    fn numeric_pair(&self, rhs: &Value) -> Option<(f64, f64, bool)> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Some((*a as f64, *b as f64, false)),
            (Value::Int(a), Value::Float(b)) => Some((*a as f64, *b, true)),
            (Value::Float(a), Value::Int(b)) => Some((*a, *b as f64, true)),
            (Value::Float(a), Value::Float(b)) => Some((*a, *b, true)),
            _ => None,
        }
    }

    fn type_mismatch(op: &str, l: &Value, r: &Value) -> RuntimeError {
        RuntimeError::Type(format!(
            "cannot apply '{op}' to {} and {}",
            l.type_name(),
            r.type_name()
        ))
    }

    pub fn arith_add(&self, rhs: &Value) -> Result<Value, RuntimeError> {
        match (self, rhs) {
            (Value::Str(a), b) => Ok(Value::Str(format!("{a}{b}"))),
            (a, Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
            }
            (Value::List(a), b) => {
                let mut items = a.clone();
                items.push(b.clone());
                Ok(Value::List(items))
            }
            (Value::Int(a), Value::Int(b)) => {
                a.checked_add(*b).map(Value::Int).ok_or(RuntimeError::Overflow)
            }
            _ => match self.numeric_pair(rhs) {
                Some((a, b, _)) => Ok(Value::Float(a + b)),
                None => Err(Self::type_mismatch("+", self, rhs)),
            },
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Result<Value, RuntimeError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_sub(*b).map(Value::Int).ok_or(RuntimeError::Overflow)
            }
            _ => match self.numeric_pair(rhs) {
                Some((a, b, _)) => Ok(Value::Float(a - b)),
                None => Err(Self::type_mismatch("-", self, rhs)),
            },
        }
    }

    pub fn arith_mul(&self, rhs: &Value) -> Result<Value, RuntimeError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_mul(*b).map(Value::Int).ok_or(RuntimeError::Overflow)
            }
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                if *n < 0 {
                    return Err(RuntimeError::Type(format!(
                        "cannot repeat a string {n} times"
                    )));
                }
                let count = usize::try_from(*n).map_err(|_| RuntimeError::Overflow)?;
                match s.len().checked_mul(count) {
                    Some(len) if len <= MAX_REPEAT_LEN => {}
                    _ => return Err(RuntimeError::Overflow),
                }
                Ok(Value::Str(s.repeat(count)))
            }
            _ => match self.numeric_pair(rhs) {
                Some((a, b, _)) => Ok(Value::Float(a * b)),
                None => Err(Self::type_mismatch("*", self, rhs)),
            },
        }
    }

    pub fn arith_div(&self, rhs: &Value) -> Result<Value, RuntimeError> {
        let (a, b, is_float) = self
            .numeric_pair(rhs)
            .ok_or_else(|| Self::type_mismatch("/", self, rhs))?;
        if b == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        match (self, rhs) {
            (Value::Int(x), Value::Int(y)) if !is_float => {
                x.checked_div(*y).map(Value::Int).ok_or(RuntimeError::Overflow)
            }
            _ => Ok(Value::Float(a / b)),
        }
    }

    pub fn arith_rem(&self, rhs: &Value) -> Result<Value, RuntimeError> {
        let (a, b, is_float) = self
            .numeric_pair(rhs)
            .ok_or_else(|| Self::type_mismatch("%", self, rhs))?;
        if b == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        match (self, rhs) {
            (Value::Int(x), Value::Int(y)) if !is_float => {
                x.checked_rem(*y).map(Value::Int).ok_or(RuntimeError::Overflow)
            }
            _ => Ok(Value::Float(a % b)),
        }
    }

    pub fn arith_neg(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(RuntimeError::Overflow),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(RuntimeError::Type(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    /// Equality as scripts see it: ints and floats compare numerically,
    /// everything else structurally.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match self.numeric_pair(rhs) {
            Some((a, b, true)) => a == b,
            _ => self == rhs,
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`.  Only numbers and strings are
    /// ordered.
    pub fn cmp_value(&self, rhs: &Value) -> Result<std::cmp::Ordering, RuntimeError> {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => return Ok(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => return Ok(a.cmp(b)),
            _ => {}
        }
        match self.numeric_pair(rhs) {
            Some((a, b, _)) => a
                .partial_cmp(&b)
                .ok_or_else(|| RuntimeError::Type("cannot order NaN".into())),
            None => Err(Self::type_mismatch("<", self, rhs)),
        }
    }

    /// `self[index]` for lists, strings and maps.  Negative list and string
    /// indices count from the end.
    pub fn index(&self, index: &Value) -> Result<Value, RuntimeError> {
        match (self, index) {
            (Value::List(items), Value::Int(i)) => {
                let pos = resolve_index(*i, items.len())?;
                Ok(items[pos].clone())
            }
            (Value::Str(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                let pos = resolve_index(*i, chars.len())?;
                Ok(Value::Str(chars[pos].to_string()))
            }
            (Value::Map(entries), Value::Str(key)) => entries
                .get(key)
                .cloned()
                .ok_or_else(|| RuntimeError::MissingKey(key.clone())),
            (target, idx) => Err(RuntimeError::Type(format!(
                "cannot index {} with {}",
                target.type_name(),
                idx.type_name()
            ))),
        }
    }
}

fn resolve_index(i: i64, len: usize) -> Result<usize, RuntimeError> {
    let pos = if i < 0 { len as i64 + i } else { i };
    if pos < 0 || pos >= len as i64 {
        return Err(RuntimeError::IndexOutOfRange { index: i, len });
    }
    Ok(pos as usize)
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
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

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<HostObject> for Value {
    fn from(obj: HostObject) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
