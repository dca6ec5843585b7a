//! Default US keyboard mapping.
//!
//! Served by GetKeyboardMapping when the front-end opts out of keyboard
//! mapping, so toolkits can translate keycodes before a real map shows
//! up. Two keysyms per keycode: plain and shifted.

use crate::protocol::types::{KeyCode, KeySym};

pub const MIN_KEYCODE: KeyCode = 8;
pub const MAX_KEYCODE: KeyCode = 255;
pub const KEYSYMS_PER_KEYCODE: u8 = 2;

const NO_SYMBOL: KeySym = 0;

/// (keycode, plain, shifted) for the populated part of the map; the
/// keycode layout follows the classic pc105 arrangement.
const KEYS: &[(KeyCode, KeySym, KeySym)] = &[
    (9, 0xff1b, 0xff1b),  // Escape
    (10, '1' as KeySym, '!' as KeySym),
    (11, '2' as KeySym, '@' as KeySym),
    (12, '3' as KeySym, '#' as KeySym),
    (13, '4' as KeySym, '$' as KeySym),
    (14, '5' as KeySym, '%' as KeySym),
    (15, '6' as KeySym, '^' as KeySym),
    (16, '7' as KeySym, '&' as KeySym),
    (17, '8' as KeySym, '*' as KeySym),
    (18, '9' as KeySym, '(' as KeySym),
    (19, '0' as KeySym, ')' as KeySym),
    (20, '-' as KeySym, '_' as KeySym),
    (21, '=' as KeySym, '+' as KeySym),
    (22, 0xff08, 0xff08), // BackSpace
    (23, 0xff09, 0xfe20), // Tab / ISO_Left_Tab
    (24, 'q' as KeySym, 'Q' as KeySym),
    (25, 'w' as KeySym, 'W' as KeySym),
    (26, 'e' as KeySym, 'E' as KeySym),
    (27, 'r' as KeySym, 'R' as KeySym),
    (28, 't' as KeySym, 'T' as KeySym),
    (29, 'y' as KeySym, 'Y' as KeySym),
    (30, 'u' as KeySym, 'U' as KeySym),
    (31, 'i' as KeySym, 'I' as KeySym),
    (32, 'o' as KeySym, 'O' as KeySym),
    (33, 'p' as KeySym, 'P' as KeySym),
    (34, '[' as KeySym, '{' as KeySym),
    (35, ']' as KeySym, '}' as KeySym),
    (36, 0xff0d, 0xff0d), // Return
    (37, 0xffe3, 0xffe3), // Control_L
    (38, 'a' as KeySym, 'A' as KeySym),
    (39, 's' as KeySym, 'S' as KeySym),
    (40, 'd' as KeySym, 'D' as KeySym),
    (41, 'f' as KeySym, 'F' as KeySym),
    (42, 'g' as KeySym, 'G' as KeySym),
    (43, 'h' as KeySym, 'H' as KeySym),
    (44, 'j' as KeySym, 'J' as KeySym),
    (45, 'k' as KeySym, 'K' as KeySym),
    (46, 'l' as KeySym, 'L' as KeySym),
    (47, ';' as KeySym, ':' as KeySym),
    (48, '\'' as KeySym, '"' as KeySym),
    (49, '`' as KeySym, '~' as KeySym),
    (50, 0xffe1, 0xffe1), // Shift_L
    (51, '\\' as KeySym, '|' as KeySym),
    (52, 'z' as KeySym, 'Z' as KeySym),
    (53, 'x' as KeySym, 'X' as KeySym),
    (54, 'c' as KeySym, 'C' as KeySym),
    (55, 'v' as KeySym, 'V' as KeySym),
    (56, 'b' as KeySym, 'B' as KeySym),
    (57, 'n' as KeySym, 'N' as KeySym),
    (58, 'm' as KeySym, 'M' as KeySym),
    (59, ',' as KeySym, '<' as KeySym),
    (60, '.' as KeySym, '>' as KeySym),
    (61, '/' as KeySym, '?' as KeySym),
    (62, 0xffe2, 0xffe2), // Shift_R
    (63, 0xffaa, 0xffaa), // KP_Multiply
    (64, 0xffe9, 0xffe9), // Alt_L
    (65, ' ' as KeySym, ' ' as KeySym),
    (66, 0xffe5, 0xffe5), // Caps_Lock
    (67, 0xffbe, 0xffbe), // F1
    (68, 0xffbf, 0xffbf),
    (69, 0xffc0, 0xffc0),
    (70, 0xffc1, 0xffc1),
    (71, 0xffc2, 0xffc2),
    (72, 0xffc3, 0xffc3),
    (73, 0xffc4, 0xffc4),
    (74, 0xffc5, 0xffc5),
    (75, 0xffc6, 0xffc6),
    (76, 0xffc7, 0xffc7), // F10
    (95, 0xffc8, 0xffc8), // F11
    (96, 0xffc9, 0xffc9), // F12
    (105, 0xffe4, 0xffe4), // Control_R
    (107, 0xff61, 0xff61), // Print
    (108, 0xffea, 0xffea), // Alt_R
    (110, 0xff50, 0xff50), // Home
    (111, 0xff52, 0xff52), // Up
    (112, 0xff55, 0xff55), // Prior
    (113, 0xff51, 0xff51), // Left
    (114, 0xff53, 0xff53), // Right
    (115, 0xff57, 0xff57), // End
    (116, 0xff54, 0xff54), // Down
    (117, 0xff56, 0xff56), // Next
    (118, 0xff63, 0xff63), // Insert
    (119, 0xffff, 0xffff), // Delete
    (133, 0xffeb, 0xffeb), // Super_L
    (134, 0xffec, 0xffec), // Super_R
];

/// The full keysym table for keycodes `first..first+count`, two syms per
/// keycode, unpopulated keycodes as NoSymbol pairs.
pub fn keysyms(first: KeyCode, count: u8) -> Vec<KeySym> {
    let mut out = Vec::with_capacity(count as usize * KEYSYMS_PER_KEYCODE as usize);
    for offset in 0..count {
        let keycode = first.saturating_add(offset);
        match KEYS.binary_search_by_key(&keycode, |entry| entry.0) {
            Ok(index) => {
                out.push(KEYS[index].1);
                out.push(KEYS[index].2);
            }
            Err(_) => {
                out.push(NO_SYMBOL);
                out.push(NO_SYMBOL);
            }
        }
    }
    out
}

/// Default modifier map: 2 keycodes per modifier, the classic pc105
/// assignment (Shift, Lock, Control, Mod1=Alt, Mod4=Super).
pub fn modifier_map() -> (u8, Vec<KeyCode>) {
    let per = 2u8;
    let mut map = vec![0u8; 8 * per as usize];
    map[0] = 50; // Shift_L
    map[1] = 62; // Shift_R
    map[2] = 66; // Caps_Lock
    map[4] = 37; // Control_L
    map[5] = 105; // Control_R
    map[6] = 64; // Alt_L
    map[7] = 108; // Alt_R
    map[12] = 133; // Super_L
    map[13] = 134; // Super_R
    (per, map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_by_keycode() {
        for pair in KEYS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn letter_row_maps_to_ascii() {
        let syms = keysyms(38, 1);
        assert_eq!(syms, vec!['a' as KeySym, 'A' as KeySym]);
    }

    #[test]
    fn unpopulated_keycodes_are_no_symbol() {
        let syms = keysyms(200, 2);
        assert!(syms.iter().all(|sym| *sym == NO_SYMBOL));
    }

    #[test]
    fn full_range_length() {
        let count = MAX_KEYCODE - MIN_KEYCODE + 1;
        let syms = keysyms(MIN_KEYCODE, count);
        assert_eq!(syms.len(), count as usize * 2);
    }
}
