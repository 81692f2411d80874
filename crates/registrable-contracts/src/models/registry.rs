use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::model::{AttrNames, AttrOverrides, ChoiceModel};
use crate::choices::{CheckSink, Choice, ChoiceRegistry, ChoiceValue, Choices, LogSink, Scalar};

/// Registers models as choices and remembers which model each value came
/// from.
pub struct ModelChoiceRegistry<M: ChoiceModel + ?Sized = dyn ChoiceModel> {
    choices: ChoiceRegistry,
    models: IndexMap<Scalar, Arc<M>>,
    attrs: AttrNames,
}

impl<M: ChoiceModel + ?Sized> ModelChoiceRegistry<M> {
    pub fn new() -> Self {
        Self::from_parts(AttrNames::default(), Arc::new(LogSink))
    }

    pub fn with_attrs(attrs: AttrNames) -> Self {
        Self::from_parts(attrs, Arc::new(LogSink))
    }

    pub fn with_sink(sink: Arc<dyn CheckSink>) -> Self {
        Self::from_parts(AttrNames::default(), sink)
    }

    pub fn from_parts(attrs: AttrNames, sink: Arc<dyn CheckSink>) -> Self {
        Self {
            choices: ChoiceRegistry::with_sink(sink),
            models: IndexMap::new(),
            attrs,
        }
    }

    pub fn attrs(&self) -> &AttrNames {
        &self.attrs
    }

    pub fn register(&mut self, model: Arc<M>) -> Arc<M> {
        self.register_with(model, &AttrOverrides::default())
    }

    /// Derives `(value, label, group)` from the model and registers it,
    /// handing the model back unchanged.
    ///
    /// Missing attributes fall back to the type name for the value and the
    /// verbose name for the label. A missing or falsy group registers a flat
    /// choice; otherwise the choice joins that group.
    pub fn register_with(&mut self, model: Arc<M>, overrides: &AttrOverrides) -> Arc<M> {
        let attrs = self.attrs.apply(overrides);
        let value = model
            .attr(&attrs.value_attr)
            .unwrap_or_else(|| Scalar::from(model.type_name()));
        let label = model
            .attr(&attrs.label_attr)
            .unwrap_or_else(|| model.verbose_name());
        let group = model.attr(&attrs.group_attr).filter(Scalar::is_truthy);

        tracing::debug!(model = model.type_name(), value = %value, "registering model choice");
        self.models.insert(value.clone(), Arc::clone(&model));
        let registered = match group {
            Some(group) => self.choices.register(group, vec![(value, label)]),
            None => self.choices.register(value, label),
        };
        // Every half is already a scalar, so neither shape can be refused.
        debug_assert!(registered, "model choice was refused");
        model
    }

    /// Holds `overrides` for any number of later registrations.
    pub fn registrar(&mut self, overrides: AttrOverrides) -> Registrar<'_, M> {
        Registrar {
            registry: self,
            overrides,
        }
    }

    pub fn get_model(&self, value: impl Into<Scalar>) -> Option<&Arc<M>> {
        let value: Scalar = value.into();
        self.models.get(&value)
    }

    pub fn models(&self) -> impl Iterator<Item = (&Scalar, &Arc<M>)> {
        self.models.iter()
    }

    pub fn choices(&self) -> &ChoiceRegistry {
        &self.choices
    }

    pub fn choices_mut(&mut self) -> &mut ChoiceRegistry {
        &mut self.choices
    }

    pub fn iter(&self) -> Choices<'_> {
        self.choices.iter()
    }

    pub fn get_group(&self, name: impl Into<Scalar>) -> Option<Choice> {
        self.choices.get_group(name)
    }
}

impl<M: ChoiceModel + ?Sized> Default for ModelChoiceRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ChoiceModel + ?Sized> Clone for ModelChoiceRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            choices: self.choices.clone(),
            models: self.models.clone(),
            attrs: self.attrs.clone(),
        }
    }
}

impl<M: ChoiceModel + ?Sized> fmt::Debug for ModelChoiceRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelChoiceRegistry")
            .field("choices", &self.choices)
            .field(
                "models",
                &self
                    .models
                    .iter()
                    .map(|(value, model)| (value, model.type_name()))
                    .collect::<Vec<_>>(),
            )
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl<M: ChoiceModel + ?Sized> PartialEq<Vec<Choice>> for ModelChoiceRegistry<M> {
    fn eq(&self, other: &Vec<Choice>) -> bool {
        self.choices == *other
    }
}

impl<M: ChoiceModel + ?Sized> PartialEq<ChoiceValue> for ModelChoiceRegistry<M> {
    fn eq(&self, other: &ChoiceValue) -> bool {
        self.choices == *other
    }
}

/// A registry paired with fixed attribute overrides.
pub struct Registrar<'a, M: ChoiceModel + ?Sized> {
    registry: &'a mut ModelChoiceRegistry<M>,
    overrides: AttrOverrides,
}

impl<M: ChoiceModel + ?Sized> Registrar<'_, M> {
    pub fn register(&mut self, model: Arc<M>) -> Arc<M> {
        self.registry.register_with(model, &self.overrides)
    }
}
