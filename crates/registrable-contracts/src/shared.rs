use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;

use crate::choices::{Choice, ChoiceRegistry, ChoiceValue, Scalar};
use crate::models::{AttrOverrides, ChoiceModel, ModelChoiceRegistry};

/// A [`ChoiceRegistry`] behind one lock, for registration from several
/// threads at startup. Each call is atomic on its own; nothing spans calls.
#[derive(Debug, Clone, Default)]
pub struct SharedChoiceRegistry {
    inner: Arc<Mutex<ChoiceRegistry>>,
}

impl SharedChoiceRegistry {
    pub fn new(registry: ChoiceRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn register(
        &self,
        first: impl Into<ChoiceValue>,
        second: impl Into<ChoiceValue>,
    ) -> anyhow::Result<bool> {
        Ok(self.lock()?.register(first, second))
    }

    pub fn register_args(&self, args: Vec<ChoiceValue>) -> anyhow::Result<bool> {
        Ok(self.lock()?.register_args(args))
    }

    pub fn get_group(&self, name: impl Into<Scalar>) -> anyhow::Result<Option<Choice>> {
        Ok(self.lock()?.get_group(name))
    }

    pub fn snapshot(&self) -> anyhow::Result<Vec<Choice>> {
        Ok(self.lock()?.iter().collect())
    }

    /// Runs `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut ChoiceRegistry) -> R) -> anyhow::Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, ChoiceRegistry>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("choice registry lock poisoned"))
    }
}

/// A [`ModelChoiceRegistry`] behind one lock; the choices and the reverse
/// index change together under it.
pub struct SharedModelChoiceRegistry<M: ChoiceModel + ?Sized = dyn ChoiceModel> {
    inner: Arc<Mutex<ModelChoiceRegistry<M>>>,
}

impl<M: ChoiceModel + ?Sized> Clone for SharedModelChoiceRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ChoiceModel + ?Sized> SharedModelChoiceRegistry<M> {
    pub fn new(registry: ModelChoiceRegistry<M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn register(&self, model: Arc<M>) -> anyhow::Result<Arc<M>> {
        Ok(self.lock()?.register(model))
    }

    pub fn register_with(&self, model: Arc<M>, overrides: &AttrOverrides) -> anyhow::Result<Arc<M>> {
        Ok(self.lock()?.register_with(model, overrides))
    }

    pub fn get_model(&self, value: impl Into<Scalar>) -> anyhow::Result<Option<Arc<M>>> {
        Ok(self.lock()?.get_model(value).cloned())
    }

    pub fn snapshot(&self) -> anyhow::Result<Vec<Choice>> {
        Ok(self.lock()?.iter().collect())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ModelChoiceRegistry<M>) -> R) -> anyhow::Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, ModelChoiceRegistry<M>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("model choice registry lock poisoned"))
    }
}
