//! Colormap engine: pixel-value resolution, cell allocation, and the
//! named-colour table.

pub mod colormap;
pub mod named;

pub use colormap::ColormapRecord;
