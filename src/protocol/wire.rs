//! Byte-order-aware cursor reader and writer for the wire codec.
//!
//! Every request decoder reads through [`WireReader`], which bounds every
//! access to the declared request body: reading past the end surfaces as
//! [`WireError::Exhausted`], which the dispatcher turns into a `Length`
//! error on the wire instead of an out-of-bounds read. [`WireWriter`]
//! produces replies, events, and errors in the connection's negotiated
//! byte order with explicit 4-byte padding.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use bytes::{BufMut, BytesMut};
use thiserror::Error;

use super::types::ByteOrder;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// A decoder ran past the declared request length.
    #[error("request body exhausted at offset {offset}, needed {needed} more bytes")]
    Exhausted { offset: usize, needed: usize },
    /// A length-prefixed field declares more bytes than the body holds.
    #[error("declared field length {declared} exceeds remaining body {remaining}")]
    FieldOverrun { declared: usize, remaining: usize },
    /// Text fields must be Latin-1 / ASCII-compatible byte strings.
    #[error("malformed string field")]
    BadString,
}

/// Number of pad bytes to round `len` up to a 4-byte boundary.
pub fn pad(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// `len` rounded up to a 4-byte boundary.
pub fn padded(len: usize) -> usize {
    len + pad(len)
}

pub struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
    order: ByteOrder,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self { data, offset: 0, order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < count {
            return Err(WireError::Exhausted {
                offset: self.offset,
                needed: count - self.remaining(),
            });
        }
        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(match self.order {
            ByteOrder::LittleEndian => LittleEndian::read_u16(bytes),
            ByteOrder::BigEndian => BigEndian::read_u16(bytes),
        })
    }

    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(match self.order {
            ByteOrder::LittleEndian => LittleEndian::read_u32(bytes),
            ByteOrder::BigEndian => BigEndian::read_u32(bytes),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], WireError> {
        if count > self.remaining() {
            return Err(WireError::FieldOverrun { declared: count, remaining: self.remaining() });
        }
        self.take(count)
    }

    /// Read `len` bytes of Latin-1 text.
    pub fn read_string(&mut self, len: usize) -> Result<String, WireError> {
        let bytes = self.read_bytes(len)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    /// Skip the pad bytes that follow a `len`-byte variable field.
    pub fn skip_pad(&mut self, len: usize) -> Result<(), WireError> {
        let padding = pad(len);
        self.take(padding)?;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), WireError> {
        self.take(count)?;
        Ok(())
    }
}

pub struct WireWriter {
    buffer: BytesMut,
    order: ByteOrder,
}

impl WireWriter {
    pub fn new(order: ByteOrder) -> Self {
        Self { buffer: BytesMut::with_capacity(64), order }
    }

    pub fn with_capacity(order: ByteOrder, capacity: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(capacity), order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.put_i8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.put_u8(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        match self.order {
            ByteOrder::LittleEndian => self.buffer.put_u16_le(value),
            ByteOrder::BigEndian => self.buffer.put_u16(value),
        }
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    pub fn write_u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::LittleEndian => self.buffer.put_u32_le(value),
            ByteOrder::BigEndian => self.buffer.put_u32(value),
        }
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    /// Write `count` zero bytes.
    pub fn write_zeros(&mut self, count: usize) {
        self.buffer.put_bytes(0, count);
    }

    /// Write a Latin-1 string followed by its 4-byte-boundary padding.
    pub fn write_string_padded(&mut self, s: &str) {
        for ch in s.chars() {
            self.buffer.put_u8(if (ch as u32) < 256 { ch as u8 } else { b'?' });
        }
        self.write_zeros(pad(s.chars().count()));
    }

    /// Pad the buffer itself out to a 4-byte boundary.
    pub fn pad_to_boundary(&mut self) {
        self.write_zeros(pad(self.buffer.len()));
    }

    pub fn into_bytes(self) -> bytes::Bytes {
        self.buffer.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_both_orders() {
        for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
            let mut w = WireWriter::new(order);
            w.write_u8(0xab);
            w.write_u16(0x1234);
            w.write_u32(0xdead_beef);
            w.write_i16(-7);
            let bytes = w.into_bytes();

            let mut r = WireReader::new(&bytes, order);
            assert_eq!(r.read_u8().unwrap(), 0xab);
            assert_eq!(r.read_u16().unwrap(), 0x1234);
            assert_eq!(r.read_u32().unwrap(), 0xdead_beef);
            assert_eq!(r.read_i16().unwrap(), -7);
            assert_eq!(r.remaining(), 0);
        }
    }

    #[test]
    fn little_endian_layout() {
        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        w.write_u16(0x1234);
        assert_eq!(&w.into_bytes()[..], &[0x34, 0x12]);
    }

    #[test]
    fn big_endian_layout() {
        let mut w = WireWriter::new(ByteOrder::BigEndian);
        w.write_u32(0x1234_5678);
        assert_eq!(&w.into_bytes()[..], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn exhausted_read_is_an_error() {
        let data = [0x01u8];
        let mut r = WireReader::new(&data, ByteOrder::LittleEndian);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert!(matches!(r.read_u16(), Err(WireError::Exhausted { .. })));
    }

    #[test]
    fn field_overrun_is_distinguished() {
        let data = [0u8; 2];
        let mut r = WireReader::new(&data, ByteOrder::LittleEndian);
        assert!(matches!(
            r.read_bytes(8),
            Err(WireError::FieldOverrun { declared: 8, remaining: 2 })
        ));
    }

    #[test]
    fn string_padding() {
        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        w.write_string_padded("ab");
        assert_eq!(&w.into_bytes()[..], &[b'a', b'b', 0, 0]);

        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        w.write_string_padded("abcd");
        assert_eq!(&w.into_bytes()[..], b"abcd");
    }

    #[test]
    fn pad_arithmetic() {
        assert_eq!(pad(0), 0);
        assert_eq!(pad(1), 3);
        assert_eq!(pad(4), 0);
        assert_eq!(pad(5), 3);
        assert_eq!(padded(5), 8);
    }
}
