//! X11 protocol error packets.
//!
//! Handlers never return Rust errors for protocol violations; they return
//! an [`XError`] value, which the dispatcher stamps with the request's
//! sequence number and encodes as the fixed 32-byte error packet
//! (byte 0 = 0, byte 1 = error code).

use super::types::{ByteOrder, SequenceNumber, XId};
use super::wire::WireWriter;

/// The error kinds the core emits, with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Request = 1,
    Value = 2,
    Window = 3,
    Pixmap = 4,
    Atom = 5,
    Cursor = 6,
    Font = 7,
    Match = 8,
    Drawable = 9,
    Access = 10,
    Alloc = 11,
    Colormap = 12,
    GContext = 13,
    IdChoice = 14,
    Name = 15,
    Length = 16,
    Implementation = 17,
}

/// A protocol error produced by a handler, before the dispatcher stamps
/// the sequence number onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XError {
    pub code: ErrorCode,
    /// The offending 32-bit value (resource id, atom, numeric value).
    pub bad_value: u32,
    pub major_opcode: u8,
    pub minor_opcode: u16,
}

impl XError {
    pub fn new(code: ErrorCode, bad_value: u32) -> Self {
        // Opcodes are stamped by the dispatcher, which knows the request.
        Self { code, bad_value, major_opcode: 0, minor_opcode: 0 }
    }

    pub fn request() -> Self {
        Self::new(ErrorCode::Request, 0)
    }

    pub fn value(bad: u32) -> Self {
        Self::new(ErrorCode::Value, bad)
    }

    pub fn window(id: XId) -> Self {
        Self::new(ErrorCode::Window, id)
    }

    pub fn pixmap(id: XId) -> Self {
        Self::new(ErrorCode::Pixmap, id)
    }

    pub fn atom(id: u32) -> Self {
        Self::new(ErrorCode::Atom, id)
    }

    pub fn cursor(id: XId) -> Self {
        Self::new(ErrorCode::Cursor, id)
    }

    pub fn font(id: XId) -> Self {
        Self::new(ErrorCode::Font, id)
    }

    pub fn match_error() -> Self {
        Self::new(ErrorCode::Match, 0)
    }

    pub fn drawable(id: XId) -> Self {
        Self::new(ErrorCode::Drawable, id)
    }

    pub fn access() -> Self {
        Self::new(ErrorCode::Access, 0)
    }

    pub fn alloc() -> Self {
        Self::new(ErrorCode::Alloc, 0)
    }

    pub fn colormap(id: XId) -> Self {
        Self::new(ErrorCode::Colormap, id)
    }

    pub fn gcontext(id: XId) -> Self {
        Self::new(ErrorCode::GContext, id)
    }

    pub fn id_choice(id: XId) -> Self {
        Self::new(ErrorCode::IdChoice, id)
    }

    pub fn name() -> Self {
        Self::new(ErrorCode::Name, 0)
    }

    pub fn length() -> Self {
        Self::new(ErrorCode::Length, 0)
    }

    pub fn implementation() -> Self {
        Self::new(ErrorCode::Implementation, 0)
    }

    pub fn with_opcodes(mut self, major: u8, minor: u16) -> Self {
        self.major_opcode = major;
        self.minor_opcode = minor;
        self
    }

    /// Encode the fixed 32-byte error packet.
    pub fn encode(&self, sequence: SequenceNumber, order: ByteOrder) -> bytes::Bytes {
        let mut w = WireWriter::with_capacity(order, 32);
        w.write_u8(0);
        w.write_u8(self.code as u8);
        w.write_u16(sequence);
        w.write_u32(self.bad_value);
        w.write_u16(self.minor_opcode);
        w.write_u8(self.major_opcode);
        w.write_zeros(21);
        w.into_bytes()
    }
}

/// Reading past the declared request length is by definition a `Length`
/// protocol error, so decoders can use `?` on wire reads directly.
impl From<super::wire::WireError> for XError {
    fn from(_: super::wire::WireError) -> Self {
        XError::length()
    }
}

/// Result type of request handlers: a reply body, nothing, or an X error.
pub type HandlerResult<T> = std::result::Result<T, XError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_packet_layout() {
        let err = XError::window(0x0030_0001).with_opcodes(8, 0);
        let bytes = err.encode(7, ByteOrder::LittleEndian);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 3); // Window
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 7);
        assert_eq!(
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            0x0030_0001
        );
        assert_eq!(bytes[10], 8); // major opcode
    }

    #[test]
    fn big_endian_sequence() {
        let bytes = XError::length().encode(0x0102, ByteOrder::BigEndian);
        assert_eq!(bytes[1], 16);
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x02);
    }
}
