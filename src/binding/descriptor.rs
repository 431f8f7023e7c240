//! Handler parameter declarations.
//!
//! A descriptor is built once when the route is registered, so binding at
//! request time is a data-driven lookup.

use serde_json::Value;

use crate::binding::container::BindingKey;

/// Declared scalar type of a loosely-bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int,
    Float,
    Bool,
    String,
    /// No declared type: the raw string is bound.
    Untyped,
    Array,
}

/// What a parameter asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// The current request.
    Request,
    /// The shared response builder.
    ResponseFactory,
    /// A type registered in the container.
    Service(BindingKey),
    /// A route parameter, reserved name (`body`, `query`) or default.
    Scalar(ScalarType),
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered parameter list of a handler.
///
/// ```
/// use easyroute::binding::HandlerDescriptor;
///
/// let descriptor = HandlerDescriptor::new()
///     .request("request")
///     .int("id")
///     .int("page")
///     .with_default(1);
/// assert_eq!(descriptor.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerDescriptor {
    params: Vec<ParamSpec>,
}

impl HandlerDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec::new(name, kind));
        self
    }

    pub fn request(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Request)
    }

    pub fn response_factory(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::ResponseFactory)
    }

    pub fn service<T: 'static>(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Service(BindingKey::of::<T>()))
    }

    pub fn int(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Scalar(ScalarType::Int))
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Scalar(ScalarType::Float))
    }

    pub fn bool(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Scalar(ScalarType::Bool))
    }

    pub fn string(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Scalar(ScalarType::String))
    }

    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Scalar(ScalarType::Untyped))
    }

    pub fn array(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Scalar(ScalarType::Array))
    }

    /// Give the most recently declared parameter a default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        if let Some(last) = self.params.last_mut() {
            last.default = Some(value.into());
        }
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Coerce a route parameter string to the declared scalar type.
///
/// `Int`/`Float` read the leading number and ignore the rest, so `"12abc"`
/// is 12 and input without a leading number is zero. `Int` truncates a
/// fractional or exponent prefix (`"2.9"` is 2). `Bool` accepts
/// `true`/`1`/`on`/`yes` (case-insensitive) and is false otherwise.
pub fn coerce(raw: &str, ty: ScalarType) -> Value {
    match ty {
        ScalarType::Int => {
            let prefix = numeric_prefix(raw);
            let n = prefix
                .parse::<i64>()
                .ok()
                .or_else(|| prefix.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0);
            Value::from(n)
        }
        ScalarType::Float => Value::from(numeric_prefix(raw).parse::<f64>().unwrap_or(0.0)),
        ScalarType::Bool => {
            let lowered = raw.trim().to_ascii_lowercase();
            Value::Bool(matches!(lowered.as_str(), "true" | "1" | "on" | "yes"))
        }
        ScalarType::String | ScalarType::Untyped => Value::String(raw.to_string()),
        ScalarType::Array => Value::Array(vec![Value::String(raw.to_string())]),
    }
}

/// Longest prefix of `raw` (after leading whitespace) shaped like a decimal
/// number: sign, digits, fraction, exponent. Empty when there is none.
fn numeric_prefix(raw: &str) -> &str {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}
