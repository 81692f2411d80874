use serde::{Deserialize, Serialize};

use crate::choices::Scalar;

/// Anything a [`ModelChoiceRegistry`](super::ModelChoiceRegistry) can turn
/// into a choice.
pub trait ChoiceModel {
    /// Name of the model type; the choice value when the model declares none.
    fn type_name(&self) -> &str;

    /// Human-readable model name; the choice label when the model declares
    /// none.
    fn verbose_name(&self) -> Scalar {
        Scalar::from(camel_case_to_spaces(self.type_name()))
    }

    /// Looks up a declared attribute such as `_choice_value`.
    fn attr(&self, name: &str) -> Option<Scalar>;
}

/// Attribute names a model registry reads value, label and group from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttrNames {
    pub value_attr: String,
    pub label_attr: String,
    pub group_attr: String,
}

impl Default for AttrNames {
    fn default() -> Self {
        Self {
            value_attr: "_choice_value".to_string(),
            label_attr: "_choice_label".to_string(),
            group_attr: "_choice_group".to_string(),
        }
    }
}

impl AttrNames {
    pub fn apply(&self, overrides: &AttrOverrides) -> AttrNames {
        AttrNames {
            value_attr: overrides
                .value_attr
                .clone()
                .unwrap_or_else(|| self.value_attr.clone()),
            label_attr: overrides
                .label_attr
                .clone()
                .unwrap_or_else(|| self.label_attr.clone()),
            group_attr: overrides
                .group_attr
                .clone()
                .unwrap_or_else(|| self.group_attr.clone()),
        }
    }
}

/// Per-registration replacements for the configured [`AttrNames`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttrOverrides {
    pub value_attr: Option<String>,
    pub label_attr: Option<String>,
    pub group_attr: Option<String>,
}

impl AttrOverrides {
    pub fn value_attr(mut self, name: impl Into<String>) -> Self {
        self.value_attr = Some(name.into());
        self
    }

    pub fn label_attr(mut self, name: impl Into<String>) -> Self {
        self.label_attr = Some(name.into());
        self
    }

    pub fn group_attr(mut self, name: impl Into<String>) -> Self {
        self.group_attr = Some(name.into());
        self
    }
}

/// `ModelA` -> `model a`, `HTTPServer` -> `http server`.
pub fn camel_case_to_spaces(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let after_lower = idx > 0 && chars[idx - 1].is_ascii_lowercase();
            let starts_word = chars
                .get(idx + 1)
                .is_some_and(|next| !next.is_ascii_uppercase());
            if after_lower || starts_word {
                out.push(' ');
            }
        }
        out.push(ch);
    }
    out.trim().to_lowercase()
}
