//! Resource model: the id-to-resource registry, the atom table, and the
//! typed records the registry stores.

pub mod atoms;
pub mod cursor;
pub mod font;
pub mod gcontext;
pub mod pixmap;
pub mod registry;

pub use atoms::AtomTable;
pub use registry::{Registry, Resource};
