//! Cursor records. The visual representation is the front-end's; the core
//! tracks existence for grab arguments and window-cursor assignment.

use crate::protocol::types::CursorId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    /// Built from source/mask pixmaps.
    Pixmaps,
    /// Built from a glyph pair in a font.
    Glyph { source_char: u16, mask_char: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorRecord {
    pub id: CursorId,
    pub source: CursorSource,
    pub fore_rgb: (u16, u16, u16),
    pub back_rgb: (u16, u16, u16),
}
