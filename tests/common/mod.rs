//! Wire-level test client: drives a real connection through an in-memory
//! duplex stream, so every test exercises the handshake, framing,
//! dispatch, and teardown paths end to end.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sshterm_x11::frontend::RecordingFrontend;
use sshterm_x11::{Server, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::timeout;

pub const READ_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestClient {
    stream: DuplexStream,
    sequence: u16,
    pub root: u32,
    pub default_colormap: u32,
    pub setup: Vec<u8>,
}

pub fn server() -> (Server, Arc<RecordingFrontend>) {
    let frontend = Arc::new(RecordingFrontend::new());
    let server = Server::new(ServerConfig::default(), frontend.clone());
    (server, frontend)
}

impl TestClient {
    /// Connect with a little-endian handshake and parse the setup reply.
    pub async fn connect(server: &Server) -> Self {
        Self::connect_with_order(server, b'l').await
    }

    pub async fn connect_with_order(server: &Server, order_byte: u8) -> Self {
        let (client_end, server_end) = tokio::io::duplex(1 << 20);
        let server = server.clone();
        tokio::spawn(async move {
            let _ = server.serve_stream(server_end).await;
        });

        let mut stream = client_end;
        let mut prefix = [0u8; 12];
        prefix[0] = order_byte;
        let major = 11u16;
        if order_byte == b'B' {
            prefix[2..4].copy_from_slice(&major.to_be_bytes());
        } else {
            prefix[2..4].copy_from_slice(&major.to_le_bytes());
        }
        stream.write_all(&prefix).await.unwrap();

        let mut header = [0u8; 8];
        timeout(READ_TIMEOUT, stream.read_exact(&mut header)).await.unwrap().unwrap();
        assert_eq!(header[0], 1, "setup must succeed");
        let additional = if order_byte == b'B' {
            u16::from_be_bytes([header[6], header[7]]) as usize * 4
        } else {
            u16::from_le_bytes([header[6], header[7]]) as usize * 4
        };
        let mut rest = vec![0u8; additional];
        timeout(READ_TIMEOUT, stream.read_exact(&mut rest)).await.unwrap().unwrap();

        let mut setup = header.to_vec();
        setup.extend_from_slice(&rest);

        let read_u16 = |bytes: &[u8], at: usize| -> u16 {
            if order_byte == b'B' {
                u16::from_be_bytes([bytes[at], bytes[at + 1]])
            } else {
                u16::from_le_bytes([bytes[at], bytes[at + 1]])
            }
        };
        let read_u32 = |bytes: &[u8], at: usize| -> u32 {
            if order_byte == b'B' {
                u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
            } else {
                u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
            }
        };

        // Fixed part is 32 bytes from offset 8; the screen block starts
        // after the padded vendor string and one pixmap format.
        let vendor_len = read_u16(&setup, 24) as usize;
        let vendor_padded = (vendor_len + 3) & !3;
        let screen = 40 + vendor_padded + 8;
        let root = read_u32(&setup, screen);
        let default_colormap = read_u32(&setup, screen + 4);

        Self { stream, sequence: 0, root, default_colormap, setup }
    }

    /// Send one request; returns the sequence number it was assigned.
    pub async fn send(&mut self, opcode: u8, detail: u8, body: &[u8]) -> u16 {
        assert_eq!(body.len() % 4, 0, "request body must be padded");
        let mut raw = Vec::with_capacity(4 + body.len());
        raw.push(opcode);
        raw.push(detail);
        raw.extend_from_slice(&(((body.len() + 4) / 4) as u16).to_le_bytes());
        raw.extend_from_slice(body);
        self.stream.write_all(&raw).await.unwrap();
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Read one server message: 32 bytes, plus the declared extra for
    /// replies.
    pub async fn read_message(&mut self) -> Vec<u8> {
        let mut fixed = [0u8; 32];
        timeout(READ_TIMEOUT, self.stream.read_exact(&mut fixed))
            .await
            .expect("timed out waiting for server message")
            .unwrap();
        let mut message = fixed.to_vec();
        if fixed[0] == 1 {
            let extra = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]) as usize * 4;
            let mut rest = vec![0u8; extra];
            timeout(READ_TIMEOUT, self.stream.read_exact(&mut rest)).await.unwrap().unwrap();
            message.extend_from_slice(&rest);
        }
        message
    }

    /// Read a message and assert it is a reply to `sequence`.
    pub async fn expect_reply(&mut self, sequence: u16) -> Vec<u8> {
        let message = self.read_message().await;
        assert_eq!(message[0], 1, "expected a reply, got {}", message[0]);
        assert_eq!(u16::from_le_bytes([message[2], message[3]]), sequence);
        message
    }

    /// Read a message and assert it is an error with the given code.
    pub async fn expect_error(&mut self, code: u8, sequence: u16) -> Vec<u8> {
        let message = self.read_message().await;
        assert_eq!(message[0], 0, "expected an error, got {}", message[0]);
        assert_eq!(message[1], code);
        assert_eq!(u16::from_le_bytes([message[2], message[3]]), sequence);
        message
    }

    /// Read a message and assert it is the given event code (ignoring the
    /// synthetic bit).
    pub async fn expect_event(&mut self, code: u8) -> Vec<u8> {
        let message = self.read_message().await;
        assert_eq!(message[0] & 0x7f, code, "expected event {code}, got {}", message[0]);
        message
    }

    /// True if nothing arrives within a short grace period.
    pub async fn expect_silence(&mut self) {
        let mut byte = [0u8; 1];
        let result = timeout(Duration::from_millis(200), self.stream.read_exact(&mut byte)).await;
        assert!(result.is_err(), "expected no message, got data");
    }

    pub async fn close(self) {
        drop(self.stream);
        // Give the server task a moment to run teardown.
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

// Small body-building helpers.

pub fn u32le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn body(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// CreateWindow body for a depth-24 InputOutput window on `parent`.
pub fn create_window_body(
    wid: u32,
    parent: u32,
    x: i16,
    y: i16,
    width: u16,
    height: u16,
    value_mask: u32,
    values: &[u32],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&wid.to_le_bytes());
    out.extend_from_slice(&parent.to_le_bytes());
    out.extend_from_slice(&x.to_le_bytes());
    out.extend_from_slice(&y.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // border
    out.extend_from_slice(&1u16.to_le_bytes()); // InputOutput
    out.extend_from_slice(&1u32.to_le_bytes()); // visual id
    out.extend_from_slice(&value_mask.to_le_bytes());
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn padded_string(s: &str) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}
