mod check;
mod entry;
mod registry;
mod scalar;
mod value;

pub use check::{CheckError, CheckSink, DeferredChecks, LogSink};
pub use entry::Choice;
pub use registry::{ChoiceRegistry, Choices};
pub use scalar::{LazyText, Scalar};
pub use value::ChoiceValue;
