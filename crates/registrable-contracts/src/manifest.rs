use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::choices::{CheckSink, Choice, ChoiceRegistry, ChoiceValue};
use crate::models::{AttrNames, AttrOverrides, DeclaredModel, ModelChoiceRegistry};

/// Declarative description of a registry.
///
/// `choices` holds the raw argument list of each plain registration, in
/// order; `models` are registered after them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceManifest {
    pub attrs: AttrNames,
    pub choices: Vec<ChoiceValue>,
    pub models: Vec<ModelDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDeclaration {
    #[serde(flatten)]
    pub model: DeclaredModel,
    #[serde(default)]
    pub overrides: AttrOverrides,
}

impl ChoiceManifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    pub fn build(&self, sink: Arc<dyn CheckSink>) -> ModelChoiceRegistry<DeclaredModel> {
        let mut registry = ModelChoiceRegistry::from_parts(self.attrs.clone(), sink);
        registry
            .choices_mut()
            .extend_from(&ChoiceValue::Seq(self.choices.clone()));
        for declaration in &self.models {
            registry.register_with(Arc::new(declaration.model.clone()), &declaration.overrides);
        }
        registry
    }
}

pub fn write_choices(path: &Path, registry: &ChoiceRegistry) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(registry)?)
        .with_context(|| format!("failed to write choices {}", path.display()))?;
    Ok(())
}

pub fn read_choices(path: &Path) -> anyhow::Result<Vec<Choice>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read choices {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse choices {}", path.display()))
}

/// Unified diff between two exports, `None` when they hold the same
/// choices in any order.
pub fn choices_diff(expected: &[Choice], actual: &[Choice]) -> anyhow::Result<Option<Vec<String>>> {
    let expected = canonical_lines(expected)?;
    let actual = canonical_lines(actual)?;
    if expected == actual {
        return Ok(None);
    }
    let diff = TextDiff::from_lines(expected.as_str(), actual.as_str());
    let rendered = diff
        .unified_diff()
        .header("expected", "actual")
        .to_string();
    let lines = rendered
        .lines()
        .map(str::to_string)
        .collect::<Vec<String>>();
    Ok(Some(lines))
}

fn canonical_lines(choices: &[Choice]) -> anyhow::Result<String> {
    let mut sorted = choices.to_vec();
    sorted.sort();
    let mut out = String::new();
    for choice in &sorted {
        out.push_str(&serde_json::to_string(choice)?);
        out.push('\n');
    }
    Ok(out)
}
