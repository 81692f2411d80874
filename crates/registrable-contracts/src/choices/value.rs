use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::scalar::{LazyText, Scalar};

/// Raw registration input: either a scalar or a sequence of further values.
///
/// The registry classifies these structurally, so a sequence is never
/// mistaken for a scalar and a scalar (text included) is never iterated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChoiceValue {
    Scalar(Scalar),
    Seq(Vec<ChoiceValue>),
}

impl ChoiceValue {
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ChoiceValue>,
    {
        ChoiceValue::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ChoiceValue::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ChoiceValue::Scalar(scalar) => Some(scalar),
            ChoiceValue::Seq(_) => None,
        }
    }

    /// The two halves of a two-element sequence.
    pub fn as_pair(&self) -> Option<(&ChoiceValue, &ChoiceValue)> {
        match self {
            ChoiceValue::Seq(items) => match items.as_slice() {
                [first, second] => Some((first, second)),
                _ => None,
            },
            ChoiceValue::Scalar(_) => None,
        }
    }

    /// Both halves of a two-element sequence, when both are scalars.
    pub fn as_scalar_pair(&self) -> Option<(&Scalar, &Scalar)> {
        let (first, second) = self.as_pair()?;
        Some((first.as_scalar()?, second.as_scalar()?))
    }
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceValue::Scalar(scalar) => f.write_str(&scalar.repr()),
            ChoiceValue::Seq(items) => {
                f.write_str("(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Scalar> for ChoiceValue {
    fn from(value: Scalar) -> Self {
        ChoiceValue::Scalar(value)
    }
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<i32> for ChoiceValue {
    fn from(value: i32) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<u64> for ChoiceValue {
    fn from(value: u64) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<bool> for ChoiceValue {
    fn from(value: bool) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl From<LazyText> for ChoiceValue {
    fn from(value: LazyText) -> Self {
        ChoiceValue::Scalar(value.into())
    }
}

impl<T: Into<ChoiceValue>> From<Vec<T>> for ChoiceValue {
    fn from(items: Vec<T>) -> Self {
        ChoiceValue::seq(items)
    }
}

impl<A, B> From<(A, B)> for ChoiceValue
where
    A: Into<ChoiceValue>,
    B: Into<ChoiceValue>,
{
    fn from((first, second): (A, B)) -> Self {
        ChoiceValue::Seq(vec![first.into(), second.into()])
    }
}

impl TryFrom<&Value> for ChoiceValue {
    type Error = anyhow::Error;

    fn try_from(value: &Value) -> anyhow::Result<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(ChoiceValue::try_from)
                .collect::<anyhow::Result<Vec<_>>>()
                .map(ChoiceValue::Seq),
            other => Scalar::try_from(other).map(ChoiceValue::Scalar),
        }
    }
}

impl Serialize for ChoiceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChoiceValue::Scalar(scalar) => scalar.serialize(serializer),
            ChoiceValue::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ChoiceValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ChoiceValue::try_from(&value).map_err(serde::de::Error::custom)
    }
}
