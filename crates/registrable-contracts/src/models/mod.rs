mod declared;
mod model;
mod registry;

pub use declared::DeclaredModel;
pub use model::{camel_case_to_spaces, AttrNames, AttrOverrides, ChoiceModel};
pub use registry::{ModelChoiceRegistry, Registrar};
