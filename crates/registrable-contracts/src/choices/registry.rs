use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::check::{CheckError, CheckSink, LogSink};
use super::entry::Choice;
use super::scalar::Scalar;
use super::value::ChoiceValue;

/// Ordered, append-only collection of flat and grouped choices.
///
/// Groups are unique by name: registering a group that already exists
/// appends the new members to it. Flat choices are kept verbatim,
/// duplicates included.
#[derive(Debug, Clone)]
pub struct ChoiceRegistry {
    entries: Vec<Choice>,
    sink: Arc<dyn CheckSink>,
}

impl Default for ChoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceRegistry {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(LogSink))
    }

    pub fn with_sink(sink: Arc<dyn CheckSink>) -> Self {
        Self {
            entries: Vec::new(),
            sink,
        }
    }

    /// Registers `(value, label)`, `(group, [(value, label), ...])` or the
    /// single-member shorthand `(group, (value, label))`.
    ///
    /// Returns `false` when the choice was refused; the reason goes to the
    /// registry's sink.
    pub fn register(&mut self, first: impl Into<ChoiceValue>, second: impl Into<ChoiceValue>) -> bool {
        self.register_args(vec![first.into(), second.into()])
    }

    pub fn register_args(&mut self, args: Vec<ChoiceValue>) -> bool {
        match self.validate(&args) {
            Ok(choice) => {
                self.commit(choice);
                true
            }
            Err(error) => {
                self.sink.report(&error);
                false
            }
        }
    }

    /// Registers every element of a whole choices list, each element being
    /// the argument list of one registration.
    ///
    /// A list that is itself a bare scalar or a single `(value, label)` pair
    /// is refused as a whole with `fields.E004` and nothing is registered.
    /// Otherwise elements are registered one by one and a refused element
    /// does not stop the rest. Returns `true` when every element was accepted.
    pub fn extend_from(&mut self, choices: &ChoiceValue) -> bool {
        let items = match choices {
            ChoiceValue::Seq(items) if choices.as_scalar_pair().is_none() => items,
            _ => {
                self.sink.report(&CheckError::TopLevelPair);
                return false;
            }
        };

        let mut accepted = true;
        for item in items {
            let registered = match item {
                ChoiceValue::Seq(args) => self.register_args(args.clone()),
                ChoiceValue::Scalar(_) => {
                    self.sink.report(&CheckError::Arity { arity: 1 });
                    false
                }
            };
            accepted &= registered;
        }
        accepted
    }

    /// Classifies raw registration arguments without touching the registry.
    pub fn validate(&self, args: &[ChoiceValue]) -> Result<Choice, CheckError> {
        let [first, second] = args else {
            return Err(CheckError::Arity { arity: args.len() });
        };

        if let Some(members) = group_members(first, second)? {
            let name = first.as_scalar().ok_or_else(|| CheckError::GroupName {
                name: first.to_string(),
            })?;
            return Ok(Choice::Group(name.clone(), members));
        }

        match (first, second) {
            (ChoiceValue::Scalar(value), ChoiceValue::Scalar(label)) => {
                Ok(Choice::Flat(value.clone(), label.clone()))
            }
            _ => Err(CheckError::FlatChoice {
                choice: ChoiceValue::Seq(args.to_vec()).to_string(),
            }),
        }
    }

    /// A pair is group-shaped unless both of its halves are scalars.
    /// `None` when `choice` is not a two-element sequence at all.
    pub fn is_group_choice(choice: &ChoiceValue) -> Option<bool> {
        let (first, second) = choice.as_pair()?;
        Some(!(first.is_scalar() && second.is_scalar()))
    }

    pub fn get_group(&self, name: impl Into<Scalar>) -> Option<Choice> {
        let name = name.into();
        self.entries
            .iter()
            .find(|entry| matches!(entry, Choice::Group(group, _) if *group == name))
            .cloned()
    }

    pub fn iter(&self) -> Choices<'_> {
        Choices {
            inner: self.entries.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Order-insensitive comparison against any sequence of choices.
    pub fn equals<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = Choice>,
    {
        sorted_eq(self.iter().collect(), other.into_iter().collect())
    }

    fn commit(&mut self, choice: Choice) {
        match choice {
            Choice::Group(name, members) => {
                let existing = self.entries.iter_mut().find_map(|entry| match entry {
                    Choice::Group(group, current) if *group == name => Some(current),
                    _ => None,
                });
                match existing {
                    Some(current) => {
                        tracing::debug!(group = %name, added = members.len(), "merged choice group");
                        current.extend(members);
                    }
                    None => {
                        tracing::debug!(group = %name, members = members.len(), "registered choice group");
                        self.entries.push(Choice::Group(name, members));
                    }
                }
            }
            flat @ Choice::Flat(..) => {
                tracing::debug!(choice = %flat, "registered choice");
                self.entries.push(flat);
            }
        }
    }
}

/// Members of a group registration, `None` when `value` cannot be read as a
/// list of pairs and the registration should be treated as flat instead.
fn group_members(
    name: &ChoiceValue,
    value: &ChoiceValue,
) -> Result<Option<Vec<(Scalar, Scalar)>>, CheckError> {
    let ChoiceValue::Seq(items) = value else {
        return Ok(None);
    };
    if let Some((member_value, member_label)) = value.as_scalar_pair() {
        return Ok(Some(vec![(member_value.clone(), member_label.clone())]));
    }

    let mut members = Vec::with_capacity(items.len());
    for item in items {
        let Some((member_value, member_label)) = item.as_pair() else {
            return Ok(None);
        };
        match (member_value, member_label) {
            (ChoiceValue::Scalar(member_value), ChoiceValue::Scalar(member_label)) => {
                members.push((member_value.clone(), member_label.clone()));
            }
            _ => {
                return Err(CheckError::GroupMembers {
                    group: name.to_string(),
                })
            }
        }
    }
    Ok(Some(members))
}

fn sorted_eq(mut left: Vec<Choice>, mut right: Vec<Choice>) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.sort();
    right.sort();
    left == right
}

fn choices_from_value(value: &ChoiceValue) -> Option<Vec<Choice>> {
    match value {
        ChoiceValue::Seq(items) => items
            .iter()
            .map(|item| Choice::try_from(item).ok())
            .collect(),
        ChoiceValue::Scalar(_) => None,
    }
}

/// Materialising iterator over a registry's choices.
#[derive(Debug, Clone)]
pub struct Choices<'a> {
    inner: std::slice::Iter<'a, Choice>,
}

impl Iterator for Choices<'_> {
    type Item = Choice;

    fn next(&mut self) -> Option<Choice> {
        self.inner.next().cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Choices<'_> {}

impl<'a> IntoIterator for &'a ChoiceRegistry {
    type Item = Choice;
    type IntoIter = Choices<'a>;

    fn into_iter(self) -> Choices<'a> {
        self.iter()
    }
}

impl PartialEq for ChoiceRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other.iter())
    }
}

impl PartialEq<[Choice]> for ChoiceRegistry {
    fn eq(&self, other: &[Choice]) -> bool {
        self.equals(other.iter().cloned())
    }
}

impl PartialEq<Vec<Choice>> for ChoiceRegistry {
    fn eq(&self, other: &Vec<Choice>) -> bool {
        self == other.as_slice()
    }
}

impl PartialEq<ChoiceRegistry> for Vec<Choice> {
    fn eq(&self, other: &ChoiceRegistry) -> bool {
        other == self
    }
}

impl PartialEq<ChoiceValue> for ChoiceRegistry {
    fn eq(&self, other: &ChoiceValue) -> bool {
        choices_from_value(other).is_some_and(|choices| self.equals(choices))
    }
}

impl PartialEq<ChoiceRegistry> for ChoiceValue {
    fn eq(&self, other: &ChoiceRegistry) -> bool {
        other == self
    }
}

impl fmt::Display for ChoiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChoiceRegistry[")?;
        for (idx, choice) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{choice}")?;
        }
        f.write_str("]")
    }
}

impl Serialize for ChoiceRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::ChoiceRegistry;
    use crate::choices::{CheckError, Choice, ChoiceValue, DeferredChecks, Scalar};

    fn collecting() -> (ChoiceRegistry, Arc<DeferredChecks>) {
        let sink = Arc::new(DeferredChecks::new());
        (ChoiceRegistry::with_sink(sink.clone()), sink)
    }

    #[test]
    fn register_group_is_materialised_as_nested_tuples() {
        let mut choices = ChoiceRegistry::new();
        assert!(choices.register(
            "A Choice Group Name",
            vec![("a_choice_value", "A Choice Label to Display")],
        ));

        let expected = Choice::group(
            "A Choice Group Name",
            [("a_choice_value", "A Choice Label to Display")],
        );
        assert!(choices.iter().any(|choice| choice == expected));
    }

    #[test]
    fn groups_with_the_same_name_merge_in_registration_order() {
        let mut choices = ChoiceRegistry::new();
        choices.register("G", vec![("v1", "l1")]);
        choices.register("flat", "Flat");
        choices.register("G", vec![("v2", "l2")]);

        assert_eq!(
            choices.get_group("G"),
            Some(Choice::group("G", [("v1", "l1"), ("v2", "l2")]))
        );
        assert_eq!(choices.len(), 2);
    }

    #[test]
    fn get_group_keeps_duplicate_members_and_ignores_flat_choices() {
        let mut choices = ChoiceRegistry::new();
        let member = ("a_choice_value", "A Choice Label to Display");
        choices.register("A Choice Group Name", vec![member]);
        choices.register("A Choice Group Name", vec![member]);
        choices.register(member.0, member.1);

        assert_eq!(
            choices.get_group("A Choice Group Name"),
            Some(Choice::group("A Choice Group Name", [member, member]))
        );
    }

    #[test]
    fn get_group_returns_none_without_a_matching_group() {
        let empty = ChoiceRegistry::new();
        assert_eq!(empty.get_group("whatever"), None);

        let mut flat_only = ChoiceRegistry::new();
        flat_only.register("a_choice_value", "A Choice Label to Display");
        assert_eq!(flat_only.get_group("whatever"), None);
        assert_eq!(flat_only.get_group("a_choice_value"), None);

        let mut other_group = ChoiceRegistry::new();
        other_group.register("A Choice Group Name", vec![("v", "l")]);
        assert_eq!(other_group.get_group("whatever"), None);
    }

    #[test]
    fn single_pair_shorthand_adds_one_member() {
        let mut choices = ChoiceRegistry::new();
        choices.register("G", vec![("v1", "l1")]);
        assert!(choices.register("G", ("v2", "l2")));
        assert_eq!(
            choices.get_group("G"),
            Some(Choice::group("G", [("v1", "l1"), ("v2", "l2")]))
        );
    }

    #[test]
    fn flat_duplicates_are_kept_in_order() {
        let mut choices = ChoiceRegistry::new();
        choices.register("a", "A");
        choices.register("b", "B");
        choices.register("a", "A");
        assert_eq!(
            choices.iter().collect::<Vec<_>>(),
            vec![
                Choice::flat("a", "A"),
                Choice::flat("b", "B"),
                Choice::flat("a", "A"),
            ]
        );
    }

    #[test]
    fn is_group_choice_is_false_only_for_scalar_pairs() {
        let group = ChoiceValue::from(("G", vec![("v", "l")]));
        assert_eq!(ChoiceRegistry::is_group_choice(&group), Some(true));
        assert_eq!(
            ChoiceRegistry::is_group_choice(&ChoiceValue::from(("v", "l"))),
            Some(false)
        );

        let lazy = ChoiceValue::from(("v", Scalar::lazy(|| "Label".to_string())));
        assert_eq!(ChoiceRegistry::is_group_choice(&lazy), Some(false));
        assert_eq!(
            ChoiceRegistry::is_group_choice(&ChoiceValue::from((1.5, "One and a half"))),
            Some(false)
        );
    }

    #[test]
    fn is_group_choice_only_classifies_pairs() {
        assert_eq!(ChoiceRegistry::is_group_choice(&ChoiceValue::from(1)), None);
        assert_eq!(
            ChoiceRegistry::is_group_choice(&ChoiceValue::seq(["a", "b", "c"])),
            None
        );
    }

    #[test]
    fn wrong_arity_is_reported_and_skipped() {
        let (mut choices, sink) = collecting();
        assert!(!choices.register_args(vec![ChoiceValue::from("only")]));
        assert!(!choices.register_args(vec![
            ChoiceValue::from("a"),
            ChoiceValue::from("b"),
            ChoiceValue::from("c"),
        ]));
        assert!(choices.is_empty());
        assert_eq!(
            sink.take(),
            vec![CheckError::Arity { arity: 1 }, CheckError::Arity { arity: 3 }]
        );
    }

    #[test]
    fn nested_group_members_are_reported() {
        let (mut choices, sink) = collecting();
        assert!(!choices.register("G", vec![("v", vec![("x", "y")])]));
        assert!(choices.is_empty());
        let errors = sink.take();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "fields.E005-2");
    }

    #[test]
    fn non_pair_members_fall_back_to_a_flat_choice_and_fail() {
        let (mut choices, sink) = collecting();
        let members = ChoiceValue::seq([ChoiceValue::seq(["a", "b", "c"])]);
        assert!(!choices.register("G", members));
        assert!(!choices.register(vec!["v"], "label"));
        assert!(choices.is_empty());
        let codes: Vec<&str> = sink.take().iter().map(CheckError::code).collect();
        assert_eq!(codes, vec!["fields.E005-3", "fields.E005-3"]);
    }

    #[test]
    fn group_names_must_be_scalars() {
        let (mut choices, sink) = collecting();
        assert!(!choices.register(vec!["G"], vec![("v", "l")]));
        assert_eq!(sink.take()[0].code(), "fields.E005-1");
    }

    #[test]
    fn validate_does_not_mutate() {
        let choices = ChoiceRegistry::new();
        let staged = choices.validate(&[ChoiceValue::from("v"), ChoiceValue::from("l")]);
        assert_eq!(staged, Ok(Choice::flat("v", "l")));
        assert!(choices.is_empty());
    }

    #[test]
    fn whole_list_resembling_a_pair_is_refused() {
        let (mut choices, sink) = collecting();
        choices.register("keep", "Keep");
        assert!(!choices.extend_from(&ChoiceValue::from(("v", "l"))));
        assert!(!choices.extend_from(&ChoiceValue::from("v")));
        assert_eq!(choices.iter().collect::<Vec<_>>(), vec![Choice::flat("keep", "Keep")]);
        assert_eq!(
            sink.take(),
            vec![CheckError::TopLevelPair, CheckError::TopLevelPair]
        );
    }

    #[test]
    fn extend_registers_each_element_and_skips_bad_ones() {
        let (mut choices, sink) = collecting();
        let list = ChoiceValue::seq([
            ChoiceValue::from(("a", "A")),
            ChoiceValue::from("stray"),
            ChoiceValue::from(("G", vec![("g", "Gee")])),
        ]);
        assert!(!choices.extend_from(&list));
        assert_eq!(
            choices,
            vec![Choice::flat("a", "A"), Choice::group("G", [("g", "Gee")])]
        );
        assert_eq!(sink.take(), vec![CheckError::Arity { arity: 1 }]);
    }

    #[test]
    fn equality_ignores_order() {
        let mut left = ChoiceRegistry::new();
        left.register("a", "A");
        left.register("G", vec![("x", "X")]);
        left.register("b", "B");

        let mut right = ChoiceRegistry::new();
        right.register("G", vec![("x", "X")]);
        right.register("b", "B");
        right.register("a", "A");

        assert_eq!(left, right);
        assert!(left.equals(vec![
            Choice::flat("b", "B"),
            Choice::group("G", [("x", "X")]),
            Choice::flat("a", "A"),
        ]));
        assert!(!left.equals(vec![Choice::flat("a", "A")]));
    }

    #[test]
    fn float_values_register_and_compare_like_other_scalars() -> anyhow::Result<()> {
        let (mut choices, sink) = collecting();
        let list: ChoiceValue = serde_json::from_value(json!([
            [1.5, "One and a half"],
            ["Fractions", [[0.25, "Quarter"]]],
            ["a", "A"]
        ]))?;
        assert!(choices.extend_from(&list));
        assert!(sink.is_empty());

        assert!(choices.register("Fractions", (0.5, "Half")));
        assert_eq!(
            choices,
            vec![
                Choice::flat("a", "A"),
                Choice::group("Fractions", [(0.25, "Quarter"), (0.5, "Half")]),
                Choice::flat(1.5, "One and a half"),
            ]
        );
        assert_ne!(choices, vec![Choice::flat(1.25, "One and a half")]);
        Ok(())
    }

    #[test]
    fn equality_against_a_scalar_is_false_both_ways() {
        let choices = ChoiceRegistry::new();
        let scalar = ChoiceValue::from(0);
        assert!(choices != scalar);
        assert!(scalar != choices);
        assert!(choices == ChoiceValue::seq(Vec::<ChoiceValue>::new()));
    }

    #[test]
    fn iteration_restarts_and_sees_later_registrations() {
        let mut choices = ChoiceRegistry::new();
        choices.register("a", "A");
        assert_eq!(choices.iter().count(), 1);
        choices.register("b", "B");
        assert_eq!(choices.iter().count(), 2);
        assert_eq!((&choices).into_iter().count(), 2);
    }

    #[test]
    fn exported_flat_choice_re_registers_with_the_same_shape() {
        let mut choices = ChoiceRegistry::new();
        choices.register(7, Scalar::lazy(|| "Seven".to_string()));
        let exported = choices.iter().next().expect("one choice");
        assert!(choices.register_args(match ChoiceValue::from(exported.clone()) {
            ChoiceValue::Seq(args) => args,
            ChoiceValue::Scalar(_) => panic!("choices export as pairs"),
        }));
        assert_eq!(
            choices.iter().collect::<Vec<_>>(),
            vec![exported.clone(), exported]
        );
    }

    #[test]
    fn serialises_in_registration_order() -> anyhow::Result<()> {
        let mut choices = ChoiceRegistry::new();
        choices.register("b", "B");
        choices.register("G", vec![("x", "X")]);
        assert_eq!(
            serde_json::to_value(&choices)?,
            json!([["b", "B"], ["G", [["x", "X"]]]])
        );
        assert!(choices.to_string().starts_with("ChoiceRegistry["));
        Ok(())
    }
}
