use std::fmt;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use super::scalar::Scalar;
use super::value::ChoiceValue;

/// One registered choice.
///
/// Serialises to the shape enumerated fields expect: `[value, label]` for a
/// flat choice and `[name, [[value, label], ...]]` for a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    Flat(Scalar, Scalar),
    Group(Scalar, Vec<(Scalar, Scalar)>),
}

impl Choice {
    pub fn flat(value: impl Into<Scalar>, label: impl Into<Scalar>) -> Self {
        Choice::Flat(value.into(), label.into())
    }

    pub fn group<I, V, L>(name: impl Into<Scalar>, members: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<Scalar>,
        L: Into<Scalar>,
    {
        Choice::Group(
            name.into(),
            members
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        )
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Choice::Group(..))
    }

    /// The value of a flat choice or the name of a group.
    pub fn key(&self) -> &Scalar {
        match self {
            Choice::Flat(value, _) => value,
            Choice::Group(name, _) => name,
        }
    }

    pub fn members(&self) -> Option<&[(Scalar, Scalar)]> {
        match self {
            Choice::Flat(..) => None,
            Choice::Group(_, members) => Some(members.as_slice()),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Flat(value, label) => write!(f, "({}, {})", value.repr(), label.repr()),
            Choice::Group(name, members) => {
                write!(f, "({}, (", name.repr())?;
                for (idx, (value, label)) in members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "({}, {})", value.repr(), label.repr())?;
                }
                f.write_str("))")
            }
        }
    }
}

impl From<Choice> for ChoiceValue {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Flat(value, label) => ChoiceValue::from((value, label)),
            Choice::Group(name, members) => ChoiceValue::from((name, members)),
        }
    }
}

impl TryFrom<&ChoiceValue> for Choice {
    type Error = anyhow::Error;

    /// Reads an already well-formed choice back out of raw input. No merge
    /// or registry rules are applied here.
    fn try_from(value: &ChoiceValue) -> anyhow::Result<Self> {
        let (first, second) = value
            .as_pair()
            .ok_or_else(|| anyhow!("choice must be a pair, got {value}"))?;
        let key = first
            .as_scalar()
            .ok_or_else(|| anyhow!("choice key must be a scalar, got {first}"))?;
        match second {
            ChoiceValue::Scalar(label) => Ok(Choice::Flat(key.clone(), label.clone())),
            ChoiceValue::Seq(items) => items
                .iter()
                .map(|item| {
                    item.as_scalar_pair()
                        .map(|(value, label)| (value.clone(), label.clone()))
                        .ok_or_else(|| anyhow!("group member must be a scalar pair, got {item}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()
                .map(|members| Choice::Group(key.clone(), members)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Choice;
    use crate::choices::{ChoiceValue, Scalar};

    #[test]
    fn exports_the_enumerated_field_shape() -> anyhow::Result<()> {
        let flat = Choice::flat("v", "Label");
        let group = Choice::group("G", [("a", "A"), ("b", "B")]);
        assert_eq!(serde_json::to_value(&flat)?, json!(["v", "Label"]));
        assert_eq!(
            serde_json::to_value(&group)?,
            json!(["G", [["a", "A"], ["b", "B"]]])
        );

        let parsed: Vec<Choice> = serde_json::from_value(json!([
            ["v", "Label"],
            ["G", [["a", "A"], ["b", "B"]]],
        ]))?;
        assert_eq!(parsed, vec![flat, group]);
        Ok(())
    }

    #[test]
    fn flat_choices_sort_before_groups() {
        let mut choices = vec![
            Choice::group("A", [("x", "X")]),
            Choice::flat("z", "Z"),
            Choice::flat("a", "A"),
        ];
        choices.sort();
        assert_eq!(
            choices,
            vec![
                Choice::flat("a", "A"),
                Choice::flat("z", "Z"),
                Choice::group("A", [("x", "X")]),
            ]
        );
    }

    #[test]
    fn raw_values_read_back_into_choices() {
        let raw = ChoiceValue::from(("G", vec![("a", "A")]));
        let choice = Choice::try_from(&raw).ok();
        assert_eq!(choice, Some(Choice::group("G", [("a", "A")])));

        let nested = ChoiceValue::from(("G", vec![("a", vec!["A"])]));
        assert!(Choice::try_from(&nested).is_err());
        assert!(Choice::try_from(&ChoiceValue::from(0)).is_err());
    }

    #[test]
    fn group_members_are_exposed_in_order() {
        let group = Choice::group("G", [("a", "A"), ("b", "B")]);
        assert!(group.is_group());
        assert_eq!(group.key(), &Scalar::from("G"));
        assert_eq!(
            group.members().map(|members| members.len()),
            Some(2)
        );
        assert_eq!(Choice::flat("v", "l").members(), None);
    }
}
