use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::bail;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Text that is only produced when something reads it, such as a
/// translated label resolved against the active locale.
///
/// Compares, hashes and orders by the rendered text, so a lazy label is
/// interchangeable with the plain string it renders to.
#[derive(Clone)]
pub struct LazyText {
    render: Arc<dyn Fn() -> String + Send + Sync>,
}

impl LazyText {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }

    pub fn render(&self) -> String {
        (self.render)()
    }
}

impl fmt::Debug for LazyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LazyText").field(&self.render()).finish()
    }
}

/// A single choice value, label or group name.
///
/// `Int` is wide enough for any JSON integer, signed or not. A `Float` with
/// an integral value equals the matching `Int`.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Text(String),
    Lazy(LazyText),
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
enum ScalarKey<'a> {
    Null,
    Bool(bool),
    Int(i128),
    Float(FloatKey),
    Text(Cow<'a, str>),
}

/// Total order over floats, NaN included.
#[derive(Clone, Copy)]
struct FloatKey(f64);

impl PartialEq for FloatKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for FloatKey {}

impl PartialOrd for FloatKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for FloatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

fn float_key(value: f64) -> ScalarKey<'static> {
    if value.fract() == 0.0 && value.abs() < i128::MAX as f64 {
        ScalarKey::Int(value as i128)
    } else {
        ScalarKey::Float(FloatKey(value))
    }
}

impl Scalar {
    pub fn lazy<F>(render: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Scalar::Lazy(LazyText::new(render))
    }

    /// Rendered text for `Text` and `Lazy`, `None` for everything else.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Scalar::Text(text) => Some(Cow::Borrowed(text.as_str())),
            Scalar::Lazy(lazy) => Some(Cow::Owned(lazy.render())),
            _ => None,
        }
    }

    /// Quoted for text, plain for everything else.
    pub fn repr(&self) -> String {
        match self.as_text() {
            Some(text) => format!("{text:?}"),
            None => self.to_string(),
        }
    }

    /// Host-framework truthiness: null, `false`, `0` and empty text are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(value) => *value,
            Scalar::Int(value) => *value != 0,
            Scalar::Float(value) => *value != 0.0,
            Scalar::Text(text) => !text.is_empty(),
            Scalar::Lazy(lazy) => !lazy.render().is_empty(),
        }
    }

    fn key(&self) -> ScalarKey<'_> {
        match self {
            Scalar::Null => ScalarKey::Null,
            Scalar::Bool(value) => ScalarKey::Bool(*value),
            Scalar::Int(value) => ScalarKey::Int(*value),
            Scalar::Float(value) => float_key(*value),
            Scalar::Text(text) => ScalarKey::Text(Cow::Borrowed(text.as_str())),
            Scalar::Lazy(lazy) => ScalarKey::Text(Cow::Owned(lazy.render())),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value:?}"),
            Scalar::Text(text) => f.write_str(text),
            Scalar::Lazy(lazy) => f.write_str(&lazy.render()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Text(value.clone())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(i128::from(value))
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i128::from(value))
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Int(i128::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<LazyText> for Scalar {
    fn from(value: LazyText) -> Self {
        Scalar::Lazy(value)
    }
}

impl TryFrom<&Value> for Scalar {
    type Error = anyhow::Error;

    fn try_from(value: &Value) -> anyhow::Result<Self> {
        Ok(match value {
            Value::Null => Scalar::Null,
            Value::Bool(flag) => Scalar::Bool(*flag),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Scalar::from(int)
                } else if let Some(uint) = number.as_u64() {
                    Scalar::from(uint)
                } else if let Some(float) = number.as_f64() {
                    Scalar::Float(float)
                } else {
                    bail!("unsupported choice number {number}")
                }
            }
            Value::String(text) => Scalar::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => {
                bail!("expected a scalar, got {value}")
            }
        })
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(value) => serializer.serialize_bool(*value),
            Scalar::Int(value) => match (i64::try_from(*value), u64::try_from(*value)) {
                (Ok(int), _) => serializer.serialize_i64(int),
                (_, Ok(uint)) => serializer.serialize_u64(uint),
                _ => serializer.serialize_i128(*value),
            },
            Scalar::Float(value) => serializer.serialize_f64(*value),
            Scalar::Text(text) => serializer.serialize_str(text),
            Scalar::Lazy(lazy) => serializer.serialize_str(&lazy.render()),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Scalar::try_from(&value).map_err(serde::de::Error::custom)
    }
}
