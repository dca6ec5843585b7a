//! Font records: the id-to-name binding the core keeps while the
//! front-end owns rasterisation and metrics.

use crate::protocol::types::FontId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRecord {
    pub id: FontId,
    /// The pattern the client opened the font by.
    pub name: String,
}
