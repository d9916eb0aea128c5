use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A string-typed value. Numbers are produced and consumed by coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scalar(String);

impl Scalar {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Render an arithmetic result, e.g. `12.0`, `2.5`, `1.0E7`
    pub fn from_number(n: f64) -> Self {
        Self(format_number(n))
    }

    pub fn from_bool(b: bool) -> Self {
        Self(if b { "1" } else { "0" }.to_string())
    }

    pub fn from_count(n: usize) -> Self {
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Best-effort number: the leading numeric prefix, or 0
    pub fn to_number(&self) -> f64 {
        parse_leading_number(&self.0)
    }

    /// Strict number: the whole (trimmed) string must parse
    pub fn as_number(&self) -> Option<f64> {
        parse_numeric_string(&self.0)
    }

    /// Literal `"1"`, the test used by statement guards and `?:`
    pub fn is_one(&self) -> bool {
        self.0 == "1"
    }

    /// Numeric-looking strings are true when nonzero, others when non-empty
    pub fn is_truthy(&self) -> bool {
        match self.as_number() {
            Some(n) => n != 0.0,
            None => !self.0.is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Associative array; keys are unique and iteration order is unspecified
pub type Array = HashMap<String, Scalar>;

/// What a variable binding holds
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(Array),
}

impl Value {
    pub fn empty() -> Self {
        Value::Scalar(Scalar::empty())
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            Value::Scalar(_) => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::empty()
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::from(s))
    }
}

/// Numeric when both sides parse strictly as numbers, lexicographic otherwise
pub fn compare_scalars(left: &Scalar, right: &Scalar) -> Ordering {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.as_str().cmp(right.as_str()),
    }
}

/// Parse the leading numeric portion of a string
/// "42abc" -> 42.0
/// "  3.14  " -> 3.14
/// "abc" -> 0.0
pub fn parse_leading_number(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    let start = i;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let mut has_digits = false;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        has_digits = true;
    }

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            has_digits = true;
        }
    }

    if !has_digits {
        return 0.0;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let exp_start = i;
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        if i < bytes.len() && bytes[i].is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        } else {
            i = exp_start;
        }
    }

    s[start..i].parse().unwrap_or(0.0)
}

/// Whole-string numeric check; `None` for anything that is not a number
fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let body = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);

    // Rust's float parser also accepts "inf" and "NaN"; those are strings here
    let mut has_digit = false;
    for b in body.bytes() {
        match b {
            b'0'..=b'9' => has_digit = true,
            b'.' | b'e' | b'E' | b'+' | b'-' => {}
            _ => return None,
        }
    }
    if !has_digit {
        return None;
    }

    trimmed.parse().ok()
}

/// Render a number the way a JVM `float` prints: `12.0`, `0.5`, `1.0E7`.
///
/// Values are narrowed to single precision first, so `8/3` renders
/// `2.6666667`.
pub fn format_number(n: f64) -> String {
    let n = n as f32;
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = n.abs();
    if n != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        let text = format!("{:e}", n);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
        return if mantissa.contains('.') {
            format!("{}E{}", mantissa, exponent)
        } else {
            format!("{}.0E{}", mantissa, exponent)
        };
    }

    let text = format!("{}", n);
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}
