use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Why a registration was refused.
///
/// These are configuration problems, not runtime faults: the registry
/// reports them to its [`CheckSink`] and carries on without the entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("fields.E005-1: a choice must supply exactly a name/value and a choices/label pair, got {arity} argument(s)")]
    Arity { arity: usize },
    #[error("fields.E005-1: a choice group name must be a scalar, got {name}")]
    GroupName { name: String },
    #[error("fields.E005-2: the choices of group {group} must all be scalar value/label pairs")]
    GroupMembers { group: String },
    #[error("fields.E005-3: a flat choice's value and label must both be scalars, got {choice}")]
    FlatChoice { choice: String },
    #[error("fields.E004: the top level of a choices list cannot itself resemble a single flat pair")]
    TopLevelPair,
}

impl CheckError {
    pub fn code(&self) -> &'static str {
        match self {
            CheckError::Arity { .. } | CheckError::GroupName { .. } => "fields.E005-1",
            CheckError::GroupMembers { .. } => "fields.E005-2",
            CheckError::FlatChoice { .. } => "fields.E005-3",
            CheckError::TopLevelPair => "fields.E004",
        }
    }
}

/// Receives refused registrations.
pub trait CheckSink: fmt::Debug + Send + Sync {
    fn report(&self, error: &CheckError);
}

/// Default sink: logs a warning and otherwise ignores the failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl CheckSink for LogSink {
    fn report(&self, error: &CheckError) {
        tracing::warn!(code = error.code(), error = %error, "choice registration skipped");
    }
}

/// Keeps every refused registration so startup code can surface them
/// together once declarations are done.
#[derive(Debug, Default)]
pub struct DeferredChecks {
    errors: Mutex<Vec<CheckError>>,
}

impl DeferredChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<CheckError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<CheckError> {
        std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_empty(&self) -> bool {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl CheckSink for DeferredChecks {
    fn report(&self, error: &CheckError) {
        tracing::debug!(code = error.code(), "deferring choice check error");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.clone());
    }
}
