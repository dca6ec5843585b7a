//! Embedder-facing configuration.
//!
//! The core is library code with no CLI; the embedding application
//! deserializes this from whatever source it likes and hands it to
//! [`crate::server::Server::new`]. Defaults match the advertised setup
//! values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root window width in pixels.
    pub width: u16,
    /// Root window height in pixels.
    pub height: u16,
    pub width_mm: u16,
    pub height_mm: u16,
    /// Vendor string advertised in the setup reply.
    pub vendor: String,
    pub release_number: u32,
    /// Depth of the pointer motion history ring.
    pub motion_buffer_size: u32,
    pub maximum_request_length: u16,
    /// Bytes a client's output queue may hold before the connection is
    /// dropped as unrecoverable.
    pub output_high_water: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            width_mm: 339,
            height_mm: 212,
            vendor: "sshterm".to_string(),
            release_number: 11_00_00_00,
            motion_buffer_size: 256,
            maximum_request_length: 0xffff,
            output_high_water: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_setup_contract() {
        let config = ServerConfig::default();
        assert_eq!(config.vendor, "sshterm");
        assert_eq!(config.motion_buffer_size, 256);
        assert_eq!(config.maximum_request_length, 0xffff);
    }
}
