//! Connection setup: handshake request decode and server-information reply.
//!
//! The first twelve client bytes select the byte order and declare the
//! authorization material, which the server consumes and discards. The
//! success reply advertises exactly one screen with one 24-bit TrueColor
//! visual; the embedding application supplies the screen geometry through
//! [`crate::config::ServerConfig`].

use bytes::Bytes;
use thiserror::Error;

use super::types::{ByteOrder, ColormapId, VisualClass, VisualId, WindowId};
use super::wire::{padded, WireWriter};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("connection setup prefix truncated: got {0} bytes, need 12")]
    Truncated(usize),
    #[error("unrecognized byte-order byte {0:#04x}")]
    BadByteOrder(u8),
    #[error("unsupported protocol version {0}.{1}")]
    BadVersion(u16, u16),
}

/// The fixed 12-byte client prefix of the connection setup.
#[derive(Debug, Clone, Copy)]
pub struct SetupRequest {
    pub byte_order: ByteOrder,
    pub protocol_major: u16,
    pub protocol_minor: u16,
    pub auth_name_len: u16,
    pub auth_data_len: u16,
}

impl SetupRequest {
    /// Decode the setup prefix. The authorization material that follows
    /// ([`Self::auth_material_len`] bytes) is read and discarded by the
    /// connection layer.
    pub fn decode(data: &[u8]) -> Result<Self, SetupError> {
        if data.len() < 12 {
            return Err(SetupError::Truncated(data.len()));
        }
        let byte_order =
            ByteOrder::from_setup_byte(data[0]).ok_or(SetupError::BadByteOrder(data[0]))?;
        let read_u16 = |hi: usize| -> u16 {
            match byte_order {
                ByteOrder::LittleEndian => u16::from_le_bytes([data[hi], data[hi + 1]]),
                ByteOrder::BigEndian => u16::from_be_bytes([data[hi], data[hi + 1]]),
            }
        };
        let request = Self {
            byte_order,
            protocol_major: read_u16(2),
            protocol_minor: read_u16(4),
            auth_name_len: read_u16(6),
            auth_data_len: read_u16(8),
        };
        if request.protocol_major != 11 {
            return Err(SetupError::BadVersion(request.protocol_major, request.protocol_minor));
        }
        Ok(request)
    }

    /// Total padded byte count of the authorization name + data blocks.
    pub fn auth_material_len(&self) -> usize {
        padded(self.auth_name_len as usize) + padded(self.auth_data_len as usize)
    }
}

/// One visual descriptor as advertised in the setup reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visual {
    pub id: VisualId,
    pub class: VisualClass,
    pub bits_per_rgb: u8,
    pub colormap_entries: u16,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
}

impl Visual {
    /// The single advertised visual: 24-bit TrueColor, 8 bits per channel.
    pub fn true_color_24(id: VisualId) -> Self {
        Self {
            id,
            class: VisualClass::TrueColor,
            bits_per_rgb: 8,
            colormap_entries: 256,
            red_mask: 0x00ff_0000,
            green_mask: 0x0000_ff00,
            blue_mask: 0x0000_00ff,
        }
    }
}

/// Everything the success reply advertises.
#[derive(Debug, Clone)]
pub struct SetupInfo {
    pub release_number: u32,
    pub resource_id_base: u32,
    pub resource_id_mask: u32,
    pub motion_buffer_size: u32,
    pub maximum_request_length: u16,
    pub vendor: String,
    pub image_byte_order_lsb: bool,
    pub bitmap_bit_order_lsb: bool,
    pub scanline_unit: u8,
    pub scanline_pad: u8,
    pub min_keycode: u8,
    pub max_keycode: u8,
    pub root: WindowId,
    pub default_colormap: ColormapId,
    pub white_pixel: u32,
    pub black_pixel: u32,
    pub width_px: u16,
    pub height_px: u16,
    pub width_mm: u16,
    pub height_mm: u16,
    pub root_depth: u8,
    pub root_visual: Visual,
}

impl SetupInfo {
    /// Encode the full success reply, header included, in `order`.
    pub fn encode_success(&self, order: ByteOrder) -> Bytes {
        let vendor_len = self.vendor.len();
        // additional data: fixed 32 bytes + vendor + one format + one screen
        // (40 bytes) + one depth (8) + one visual (24)
        let additional = 32 + padded(vendor_len) + 8 + 40 + 8 + 24;
        let mut w = WireWriter::with_capacity(order, 8 + additional);

        w.write_u8(1); // Success
        w.write_u8(0);
        w.write_u16(11);
        w.write_u16(0);
        w.write_u16((additional / 4) as u16);

        w.write_u32(self.release_number);
        w.write_u32(self.resource_id_base);
        w.write_u32(self.resource_id_mask);
        w.write_u32(self.motion_buffer_size);
        w.write_u16(vendor_len as u16);
        w.write_u16(self.maximum_request_length);
        w.write_u8(1); // one screen
        w.write_u8(1); // one pixmap format
        w.write_u8(if self.image_byte_order_lsb { 0 } else { 1 });
        w.write_u8(if self.bitmap_bit_order_lsb { 0 } else { 1 });
        w.write_u8(self.scanline_unit);
        w.write_u8(self.scanline_pad);
        w.write_u8(self.min_keycode);
        w.write_u8(self.max_keycode);
        w.write_zeros(4);
        w.write_string_padded(&self.vendor);

        // Pixmap format: depth 24, 32 bpp, scanline pad 32.
        w.write_u8(24);
        w.write_u8(32);
        w.write_u8(32);
        w.write_zeros(5);

        // Screen.
        w.write_u32(self.root);
        w.write_u32(self.default_colormap);
        w.write_u32(self.white_pixel);
        w.write_u32(self.black_pixel);
        w.write_u32(0); // current input masks
        w.write_u16(self.width_px);
        w.write_u16(self.height_px);
        w.write_u16(self.width_mm);
        w.write_u16(self.height_mm);
        w.write_u16(1); // min installed maps
        w.write_u16(1); // max installed maps
        w.write_u32(self.root_visual.id);
        w.write_u8(0); // backing stores: Never
        w.write_u8(0); // save unders
        w.write_u8(self.root_depth);
        w.write_u8(1); // one depth

        // Depth.
        w.write_u8(self.root_depth);
        w.write_u8(0);
        w.write_u16(1); // one visual
        w.write_zeros(4);

        // Visual.
        w.write_u32(self.root_visual.id);
        w.write_u8(self.root_visual.class as u8);
        w.write_u8(self.root_visual.bits_per_rgb);
        w.write_u16(self.root_visual.colormap_entries);
        w.write_u32(self.root_visual.red_mask);
        w.write_u32(self.root_visual.green_mask);
        w.write_u32(self.root_visual.blue_mask);
        w.write_zeros(4);

        w.into_bytes()
    }

    /// Encode a failure reply carrying `reason`.
    pub fn encode_failed(reason: &str, order: ByteOrder) -> Bytes {
        let mut w = WireWriter::with_capacity(order, 8 + padded(reason.len()));
        w.write_u8(0); // Failed
        w.write_u8(reason.len() as u8);
        w.write_u16(11);
        w.write_u16(0);
        w.write_u16((padded(reason.len()) / 4) as u16);
        w.write_string_padded(reason);
        w.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> SetupInfo {
        SetupInfo {
            release_number: 11_0_0,
            resource_id_base: 0,
            resource_id_mask: 0x001f_ffff,
            motion_buffer_size: 256,
            maximum_request_length: 0xffff,
            vendor: "sshterm".to_string(),
            image_byte_order_lsb: true,
            bitmap_bit_order_lsb: true,
            scanline_unit: 8,
            scanline_pad: 8,
            min_keycode: 8,
            max_keycode: 255,
            root: 0x0020_0001,
            default_colormap: 0x0020_0002,
            white_pixel: 0x00ff_ffff,
            black_pixel: 0,
            width_px: 1280,
            height_px: 800,
            width_mm: 339,
            height_mm: 212,
            root_depth: 24,
            root_visual: Visual::true_color_24(1),
        }
    }

    #[test]
    fn decode_little_endian_prefix() {
        let mut data = [0u8; 12];
        data[0] = b'l';
        data[2..4].copy_from_slice(&11u16.to_le_bytes());
        let req = SetupRequest::decode(&data).unwrap();
        assert_eq!(req.byte_order, ByteOrder::LittleEndian);
        assert_eq!(req.protocol_major, 11);
        assert_eq!(req.auth_material_len(), 0);
    }

    #[test]
    fn decode_big_endian_prefix_with_auth() {
        let mut data = [0u8; 12];
        data[0] = b'B';
        data[2..4].copy_from_slice(&11u16.to_be_bytes());
        data[6..8].copy_from_slice(&18u16.to_be_bytes()); // MIT-MAGIC-COOKIE-1
        data[8..10].copy_from_slice(&16u16.to_be_bytes());
        let req = SetupRequest::decode(&data).unwrap();
        assert_eq!(req.byte_order, ByteOrder::BigEndian);
        assert_eq!(req.auth_material_len(), 20 + 16);
    }

    #[test]
    fn rejects_unknown_byte_order() {
        let data = [0u8; 12];
        assert!(matches!(SetupRequest::decode(&data), Err(SetupError::BadByteOrder(0))));
    }

    #[test]
    fn rejects_wrong_major_version() {
        let mut data = [0u8; 12];
        data[0] = b'l';
        data[2..4].copy_from_slice(&10u16.to_le_bytes());
        assert!(matches!(SetupRequest::decode(&data), Err(SetupError::BadVersion(10, 0))));
    }

    #[test]
    fn success_reply_shape() {
        let bytes = info().encode_success(ByteOrder::LittleEndian);
        assert_eq!(bytes[0], 1);
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 11);
        let additional = u16::from_le_bytes([bytes[6], bytes[7]]) as usize;
        assert_eq!(bytes.len(), 8 + additional * 4);
        // vendor length sits right after the four u32 fields
        assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 7);
    }

    #[test]
    fn advertised_visual_masks() {
        let bytes = info().encode_success(ByteOrder::LittleEndian);
        let n = bytes.len();
        // The visual is the last 24 bytes minus the trailing 4-byte pad.
        let visual = &bytes[n - 24..];
        assert_eq!(visual[4], VisualClass::TrueColor as u8);
        assert_eq!(
            u32::from_le_bytes([visual[8], visual[9], visual[10], visual[11]]),
            0x00ff_0000
        );
        assert_eq!(
            u32::from_le_bytes([visual[16], visual[17], visual[18], visual[19]]),
            0x0000_00ff
        );
    }

    #[test]
    fn failure_reply_shape() {
        let bytes = SetupInfo::encode_failed("nope", ByteOrder::BigEndian);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 4);
        assert_eq!(bytes.len(), 8 + 4);
    }
}
