//! Lazily accumulated choice lists for enumerated fields.
//!
//! [`ChoiceRegistry`](choices::ChoiceRegistry) collects flat and grouped
//! choices as they are declared and exposes them as the value/label shape
//! an enumerated field validates against.
//! [`ModelChoiceRegistry`](models::ModelChoiceRegistry) derives those
//! choices from model attributes and maps values back to their models.

pub mod choices;
pub mod manifest;
pub mod models;
pub mod shared;
