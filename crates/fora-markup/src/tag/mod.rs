//! Tag definitions and the compiled registry.

mod builtin;
mod definition;
mod registry;

pub(crate) use builtin::builtin_definitions;
pub use definition::{RenderFn, TagDefinition, TagInvocation, TagRender};
pub use registry::{RegistryError, TagRegistry};
