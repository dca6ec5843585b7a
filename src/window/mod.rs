//! Window tree, mapping state, stacking, and the property store.

pub mod properties;
pub mod tree;

pub use properties::{Property, PropertyStore};
pub use tree::WindowNode;
