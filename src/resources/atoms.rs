//! The process-wide atom table.
//!
//! Atoms 1..=68 are predefined by the protocol; anything else is allocated
//! monotonically as clients intern names. Lookup is bidirectional and
//! interning never invalidates an existing handle, so concurrent readers
//! of old atoms are always safe.

use std::collections::HashMap;

use tracing::debug;

use crate::protocol::types::Atom;

/// Predefined atom values, usable as constants throughout the server.
pub mod predefined {
    use crate::protocol::types::Atom;

    pub const PRIMARY: Atom = 1;
    pub const SECONDARY: Atom = 2;
    pub const ARC: Atom = 3;
    pub const ATOM: Atom = 4;
    pub const BITMAP: Atom = 5;
    pub const CARDINAL: Atom = 6;
    pub const COLORMAP: Atom = 7;
    pub const CURSOR: Atom = 8;
    pub const CUT_BUFFER0: Atom = 9;
    pub const CUT_BUFFER1: Atom = 10;
    pub const CUT_BUFFER2: Atom = 11;
    pub const CUT_BUFFER3: Atom = 12;
    pub const CUT_BUFFER4: Atom = 13;
    pub const CUT_BUFFER5: Atom = 14;
    pub const CUT_BUFFER6: Atom = 15;
    pub const CUT_BUFFER7: Atom = 16;
    pub const DRAWABLE: Atom = 17;
    pub const FONT: Atom = 18;
    pub const INTEGER: Atom = 19;
    pub const PIXMAP: Atom = 20;
    pub const POINT: Atom = 21;
    pub const RECTANGLE: Atom = 22;
    pub const RESOURCE_MANAGER: Atom = 23;
    pub const RGB_COLOR_MAP: Atom = 24;
    pub const RGB_BEST_MAP: Atom = 25;
    pub const RGB_BLUE_MAP: Atom = 26;
    pub const RGB_DEFAULT_MAP: Atom = 27;
    pub const RGB_GRAY_MAP: Atom = 28;
    pub const RGB_GREEN_MAP: Atom = 29;
    pub const RGB_RED_MAP: Atom = 30;
    pub const STRING: Atom = 31;
    pub const VISUALID: Atom = 32;
    pub const WINDOW: Atom = 33;
    pub const WM_COMMAND: Atom = 34;
    pub const WM_HINTS: Atom = 35;
    pub const WM_CLIENT_MACHINE: Atom = 36;
    pub const WM_ICON_NAME: Atom = 37;
    pub const WM_ICON_SIZE: Atom = 38;
    pub const WM_NAME: Atom = 39;
    pub const WM_NORMAL_HINTS: Atom = 40;
    pub const WM_SIZE_HINTS: Atom = 41;
    pub const WM_ZOOM_HINTS: Atom = 42;
    pub const MIN_SPACE: Atom = 43;
    pub const NORM_SPACE: Atom = 44;
    pub const MAX_SPACE: Atom = 45;
    pub const END_SPACE: Atom = 46;
    pub const SUPERSCRIPT_X: Atom = 47;
    pub const SUPERSCRIPT_Y: Atom = 48;
    pub const SUBSCRIPT_X: Atom = 49;
    pub const SUBSCRIPT_Y: Atom = 50;
    pub const UNDERLINE_POSITION: Atom = 51;
    pub const UNDERLINE_THICKNESS: Atom = 52;
    pub const STRIKEOUT_ASCENT: Atom = 53;
    pub const STRIKEOUT_DESCENT: Atom = 54;
    pub const ITALIC_ANGLE: Atom = 55;
    pub const X_HEIGHT: Atom = 56;
    pub const QUAD_WIDTH: Atom = 57;
    pub const WEIGHT: Atom = 58;
    pub const POINT_SIZE: Atom = 59;
    pub const RESOLUTION: Atom = 60;
    pub const COPYRIGHT: Atom = 61;
    pub const NOTICE: Atom = 62;
    pub const FONT_NAME: Atom = 63;
    pub const FAMILY_NAME: Atom = 64;
    pub const FULL_NAME: Atom = 65;
    pub const CAP_HEIGHT: Atom = 66;
    pub const WM_CLASS: Atom = 67;
    pub const WM_TRANSIENT_FOR: Atom = 68;

    pub const LAST: Atom = WM_TRANSIENT_FOR;
}

const PREDEFINED_NAMES: [&str; 68] = [
    "PRIMARY",
    "SECONDARY",
    "ARC",
    "ATOM",
    "BITMAP",
    "CARDINAL",
    "COLORMAP",
    "CURSOR",
    "CUT_BUFFER0",
    "CUT_BUFFER1",
    "CUT_BUFFER2",
    "CUT_BUFFER3",
    "CUT_BUFFER4",
    "CUT_BUFFER5",
    "CUT_BUFFER6",
    "CUT_BUFFER7",
    "DRAWABLE",
    "FONT",
    "INTEGER",
    "PIXMAP",
    "POINT",
    "RECTANGLE",
    "RESOURCE_MANAGER",
    "RGB_COLOR_MAP",
    "RGB_BEST_MAP",
    "RGB_BLUE_MAP",
    "RGB_DEFAULT_MAP",
    "RGB_GRAY_MAP",
    "RGB_GREEN_MAP",
    "RGB_RED_MAP",
    "STRING",
    "VISUALID",
    "WINDOW",
    "WM_COMMAND",
    "WM_HINTS",
    "WM_CLIENT_MACHINE",
    "WM_ICON_NAME",
    "WM_ICON_SIZE",
    "WM_NAME",
    "WM_NORMAL_HINTS",
    "WM_SIZE_HINTS",
    "WM_ZOOM_HINTS",
    "MIN_SPACE",
    "NORM_SPACE",
    "MAX_SPACE",
    "END_SPACE",
    "SUPERSCRIPT_X",
    "SUPERSCRIPT_Y",
    "SUBSCRIPT_X",
    "SUBSCRIPT_Y",
    "UNDERLINE_POSITION",
    "UNDERLINE_THICKNESS",
    "STRIKEOUT_ASCENT",
    "STRIKEOUT_DESCENT",
    "ITALIC_ANGLE",
    "X_HEIGHT",
    "QUAD_WIDTH",
    "WEIGHT",
    "POINT_SIZE",
    "RESOLUTION",
    "COPYRIGHT",
    "NOTICE",
    "FONT_NAME",
    "FAMILY_NAME",
    "FULL_NAME",
    "CAP_HEIGHT",
    "WM_CLASS",
    "WM_TRANSIENT_FOR",
];

#[derive(Debug)]
pub struct AtomTable {
    by_name: HashMap<String, Atom>,
    by_id: HashMap<Atom, String>,
    next: Atom,
}

impl AtomTable {
    pub fn new() -> Self {
        let mut table = Self {
            by_name: HashMap::with_capacity(128),
            by_id: HashMap::with_capacity(128),
            next: predefined::LAST + 1,
        };
        for (index, name) in PREDEFINED_NAMES.iter().enumerate() {
            let atom = index as Atom + 1;
            table.by_name.insert((*name).to_string(), atom);
            table.by_id.insert(atom, (*name).to_string());
        }
        table
    }

    /// Intern `name`, allocating a fresh atom unless `only_if_exists`.
    pub fn intern(&mut self, name: &str, only_if_exists: bool) -> Option<Atom> {
        if let Some(&atom) = self.by_name.get(name) {
            return Some(atom);
        }
        if only_if_exists {
            return None;
        }
        let atom = self.next;
        self.next += 1;
        self.by_name.insert(name.to_string(), atom);
        self.by_id.insert(atom, name.to_string());
        debug!(name, atom, "interned atom");
        Some(atom)
    }

    pub fn lookup(&self, name: &str) -> Option<Atom> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, atom: Atom) -> Option<&str> {
        self.by_id.get(&atom).map(String::as_str)
    }

    pub fn exists(&self, atom: Atom) -> bool {
        self.by_id.contains_key(&atom)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}
