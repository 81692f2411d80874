use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::model::ChoiceModel;
use crate::choices::Scalar;

/// A model described purely by data, e.g. read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredModel {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,
    #[serde(default)]
    pub attrs: IndexMap<String, Scalar>,
}

impl DeclaredModel {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            verbose_name: None,
            attrs: IndexMap::new(),
        }
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

impl ChoiceModel for DeclaredModel {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn verbose_name(&self) -> Scalar {
        match &self.verbose_name {
            Some(name) => Scalar::from(name),
            None => Scalar::from(super::model::camel_case_to_spaces(&self.type_name)),
        }
    }

    fn attr(&self, name: &str) -> Option<Scalar> {
        self.attrs.get(name).cloned()
    }
}
