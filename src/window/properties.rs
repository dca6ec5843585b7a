//! Per-window property storage.
//!
//! A property is `(type atom, format ∈ {8,16,32}, bytes)`. Prepend and
//! append require the stored type and format to match the incoming ones;
//! GetProperty slices by 4-byte `long-offset` / `long-length` units and
//! reports the unread tail.

use std::collections::HashMap;

use crate::protocol::errors::XError;
use crate::protocol::types::{Atom, PropertyMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub type_atom: Atom,
    pub format: u8,
    pub data: Vec<u8>,
}

/// Outcome of a GetProperty lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyFetch {
    /// Property missing entirely: type None, format 0, empty value.
    Missing,
    /// Property exists but its type differs from the requested one; the
    /// reply carries the actual type and `bytes-after` only.
    TypeMismatch { actual_type: Atom, format: u8, total_len: u32 },
    Value {
        type_atom: Atom,
        format: u8,
        bytes_after: u32,
        data: Vec<u8>,
        /// Whether a delete was requested and the tail was fully read.
        exhausted: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    entries: HashMap<Atom, Property>,
}

impl PropertyStore {
    /// Apply a ChangeProperty. Returns an error for prepend/append with a
    /// mismatched existing type or format.
    pub fn change(
        &mut self,
        property: Atom,
        type_atom: Atom,
        format: u8,
        mode: PropertyMode,
        data: &[u8],
    ) -> Result<(), XError> {
        match mode {
            PropertyMode::Replace => {
                self.entries
                    .insert(property, Property { type_atom, format, data: data.to_vec() });
            }
            PropertyMode::Prepend | PropertyMode::Append => {
                match self.entries.get_mut(&property) {
                    Some(existing) => {
                        if existing.type_atom != type_atom || existing.format != format {
                            return Err(XError::match_error());
                        }
                        if mode == PropertyMode::Append {
                            existing.data.extend_from_slice(data);
                        } else {
                            let mut merged = data.to_vec();
                            merged.extend_from_slice(&existing.data);
                            existing.data = merged;
                        }
                    }
                    // Prepending to nothing behaves like Replace.
                    None => {
                        self.entries
                            .insert(property, Property { type_atom, format, data: data.to_vec() });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, property: Atom) -> Option<Property> {
        self.entries.remove(&property)
    }

    pub fn get(&self, property: Atom) -> Option<&Property> {
        self.entries.get(&property)
    }

    pub fn atoms(&self) -> Vec<Atom> {
        self.entries.keys().copied().collect()
    }

    /// GetProperty semantics: slice by `long_offset`/`long_length` in
    /// 4-byte units; `Value` overrun of the stored data yields `Value`.
    pub fn fetch(
        &mut self,
        property: Atom,
        requested_type: Atom,
        long_offset: u32,
        long_length: u32,
        delete: bool,
    ) -> Result<PropertyFetch, XError> {
        let Some(entry) = self.entries.get(&property) else {
            return Ok(PropertyFetch::Missing);
        };
        if requested_type != crate::protocol::types::ANY_PROPERTY_TYPE
            && entry.type_atom != requested_type
        {
            return Ok(PropertyFetch::TypeMismatch {
                actual_type: entry.type_atom,
                format: entry.format,
                total_len: entry.data.len() as u32,
            });
        }

        let total = entry.data.len();
        let start = (long_offset as usize).saturating_mul(4);
        if start > total {
            return Err(XError::value(long_offset));
        }
        let want = (long_length as usize).saturating_mul(4);
        let end = total.min(start + want);
        let data = entry.data[start..end].to_vec();
        let bytes_after = (total - end) as u32;
        let type_atom = entry.type_atom;
        let format = entry.format;

        let exhausted = delete && bytes_after == 0;
        if exhausted {
            self.entries.remove(&property);
        }
        Ok(PropertyFetch::Value { type_atom, format, bytes_after, data, exhausted })
    }

    /// RotateProperties: cyclically reassign values among `names` by
    /// `delta` positions. All named properties must exist, and a name may
    /// appear only once. Returns the atoms whose value changed, in order.
    pub fn rotate(&mut self, names: &[Atom], delta: i16) -> Result<Vec<Atom>, XError> {
        let n = names.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        for (index, atom) in names.iter().enumerate() {
            if names[..index].contains(atom) {
                return Err(XError::match_error());
            }
            if !self.entries.contains_key(atom) {
                return Err(XError::match_error());
            }
        }
        let shift = delta.rem_euclid(n as i16) as usize;
        if shift == 0 {
            return Ok(Vec::new());
        }
        // names[i] takes the value previously held by names[(i + n - shift) % n]
        let values: Vec<Property> = names
            .iter()
            .map(|atom| self.entries.get(atom).cloned().expect("checked above"))
            .collect();
        for (index, atom) in names.iter().enumerate() {
            let source = (index + n - shift) % n;
            self.entries.insert(*atom, values[source].clone());
        }
        Ok(names.to_vec())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::errors::ErrorCode;

    const STRING: Atom = 31;
    const WM_NAME: Atom = 39;

    fn store_with(value: &[u8]) -> PropertyStore {
        let mut store = PropertyStore::default();
        store.change(WM_NAME, STRING, 8, PropertyMode::Replace, value).unwrap();
        store
    }

    #[test]
    fn replace_then_fetch_round_trip() {
        let mut store = store_with(b"xterm");
        match store.fetch(WM_NAME, STRING, 0, 100, false).unwrap() {
            PropertyFetch::Value { type_atom, format, bytes_after, data, .. } => {
                assert_eq!(type_atom, STRING);
                assert_eq!(format, 8);
                assert_eq!(bytes_after, 0);
                assert_eq!(data, b"xterm");
            }
            other => panic!("unexpected fetch result: {other:?}"),
        }
    }

    #[test]
    fn append_requires_matching_type_and_format() {
        let mut store = store_with(b"ab");
        store.change(WM_NAME, STRING, 8, PropertyMode::Append, b"cd").unwrap();
        assert_eq!(store.get(WM_NAME).unwrap().data, b"abcd");

        let err = store.change(WM_NAME, STRING, 16, PropertyMode::Append, b"xx").unwrap_err();
        assert_eq!(err.code, ErrorCode::Match);
        let err = store.change(WM_NAME, 6, 8, PropertyMode::Prepend, b"xx").unwrap_err();
        assert_eq!(err.code, ErrorCode::Match);
    }

    #[test]
    fn prepend_puts_new_data_first() {
        let mut store = store_with(b"cd");
        store.change(WM_NAME, STRING, 8, PropertyMode::Prepend, b"ab").unwrap();
        assert_eq!(store.get(WM_NAME).unwrap().data, b"abcd");
    }

    #[test]
    fn fetch_slices_by_long_units() {
        let mut store = store_with(b"0123456789");
        match store.fetch(WM_NAME, STRING, 1, 1, false).unwrap() {
            PropertyFetch::Value { bytes_after, data, .. } => {
                assert_eq!(data, b"4567");
                assert_eq!(bytes_after, 2);
            }
            other => panic!("unexpected fetch result: {other:?}"),
        }
        // offset past the end is a Value error
        let err = store.fetch(WM_NAME, STRING, 3, 1, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::Value);
    }

    #[test]
    fn delete_only_after_tail_read() {
        let mut store = store_with(b"01234567");
        // partial read with delete leaves the property in place
        match store.fetch(WM_NAME, STRING, 0, 1, true).unwrap() {
            PropertyFetch::Value { exhausted, .. } => assert!(!exhausted),
            other => panic!("unexpected fetch result: {other:?}"),
        }
        assert!(store.get(WM_NAME).is_some());
        match store.fetch(WM_NAME, STRING, 0, 100, true).unwrap() {
            PropertyFetch::Value { exhausted, .. } => assert!(exhausted),
            other => panic!("unexpected fetch result: {other:?}"),
        }
        assert!(store.get(WM_NAME).is_none());
    }

    #[test]
    fn type_mismatch_reports_actual_type() {
        let mut store = store_with(b"xterm");
        match store.fetch(WM_NAME, 6, 0, 100, false).unwrap() {
            PropertyFetch::TypeMismatch { actual_type, total_len, .. } => {
                assert_eq!(actual_type, STRING);
                assert_eq!(total_len, 5);
            }
            other => panic!("unexpected fetch result: {other:?}"),
        }
    }

    #[test]
    fn rotation_moves_values_forward() {
        let mut store = PropertyStore::default();
        let (a, b, c) = (100, 101, 102);
        for (atom, value) in [(a, b"va"), (b, b"vb"), (c, b"vc")] {
            store.change(atom, STRING, 8, PropertyMode::Replace, value).unwrap();
        }
        store.rotate(&[a, b, c], 1).unwrap();
        assert_eq!(store.get(a).unwrap().data, b"vc");
        assert_eq!(store.get(b).unwrap().data, b"va");
        assert_eq!(store.get(c).unwrap().data, b"vb");
    }

    #[test]
    fn rotation_negative_and_modular() {
        let mut store = PropertyStore::default();
        let (a, b, c) = (100, 101, 102);
        for (atom, value) in [(a, b"va"), (b, b"vb"), (c, b"vc")] {
            store.change(atom, STRING, 8, PropertyMode::Replace, value).unwrap();
        }
        store.rotate(&[a, b, c], -1).unwrap();
        assert_eq!(store.get(a).unwrap().data, b"vb");
        assert_eq!(store.get(b).unwrap().data, b"vc");
        assert_eq!(store.get(c).unwrap().data, b"va");

        // delta of n is a no-op; delta 0 reports no changes
        let changed = store.rotate(&[a, b, c], 3).unwrap();
        assert!(changed.is_empty());
        assert_eq!(store.get(a).unwrap().data, b"vb");
    }

    #[test]
    fn rotation_missing_property_is_match_error() {
        let mut store = store_with(b"x");
        let err = store.rotate(&[WM_NAME, 200], 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::Match);
    }
}
