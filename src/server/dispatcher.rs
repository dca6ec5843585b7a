//! Per-request dispatch: sequence discipline, decode, panic guard,
//! reply/error encoding.
//!
//! The sequence number advances exactly once per request, before the
//! handler runs, so replies, errors, and any events the handler emits
//! all carry the right value whether or not the handler succeeds.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, trace, warn};

use crate::protocol::errors::XError;
use crate::protocol::opcodes;
use crate::protocol::requests::{decode_request, RequestHeader};
use crate::protocol::types::*;
use crate::server::handlers;
use crate::server::state::ServerState;

/// Process one framed request for `client`, enqueueing whatever bytes it
/// produces onto that client's output queue.
pub fn process_request(
    state: &mut ServerState,
    client: ClientId,
    header: RequestHeader,
    body: &[u8],
) {
    let Some(client_state) = state.clients.get_mut(client) else {
        return;
    };
    let sequence = client_state.advance_sequence();
    let order = client_state.byte_order;
    trace!(
        client,
        sequence,
        opcode = header.opcode,
        name = opcodes::name(header.opcode),
        len = header.length,
        "request"
    );

    let outcome = match catch_unwind(AssertUnwindSafe(|| {
        let request = decode_request(header, body, order)?;
        handlers::handle_request(state, client, request)
    })) {
        Ok(result) => result,
        Err(_) => {
            // An internal invariant broke; only this client pays for it.
            error!(client, opcode = header.opcode, "handler panicked");
            Err(XError::implementation())
        }
    };

    match outcome {
        Ok(replies) => {
            for reply in replies {
                let bytes = reply.encode(sequence, order);
                if let Some(client_state) = state.clients.get_mut(client) {
                    client_state.enqueue(bytes);
                }
            }
        }
        Err(err) => {
            let minor = if header.opcode == opcodes::XINPUT_MAJOR {
                header.detail as u16
            } else {
                0
            };
            let err = err.with_opcodes(header.opcode, minor);
            warn!(
                client,
                sequence,
                opcode = header.opcode,
                code = ?err.code,
                bad_value = err.bad_value,
                "request failed"
            );
            let bytes = err.encode(sequence, order);
            if let Some(client_state) = state.clients.get_mut(client) {
                client_state.enqueue(bytes);
            }
        }
    }
}

/// Convenience used by tests and the connection loop: decode-and-handle
/// without the framing layer.
pub fn process_raw(state: &mut ServerState, client: ClientId, raw: &[u8]) {
    if raw.len() < 4 {
        return;
    }
    let order = match state.clients.get(client) {
        Some(client_state) => client_state.byte_order,
        None => return,
    };
    let header = RequestHeader::decode([raw[0], raw[1], raw[2], raw[3]], order);
    process_request(state, client, header, &raw[4..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::frontend::RecordingFrontend;
    use crate::protocol::wire::WireWriter;
    use std::sync::Arc;

    fn harness() -> (ServerState, ClientId, tokio::sync::mpsc::UnboundedReceiver<bytes::Bytes>) {
        let mut state =
            ServerState::new(ServerConfig::default(), Arc::new(RecordingFrontend::new()));
        let (client, rx, _credit) = state.clients.register(ByteOrder::LittleEndian).unwrap();
        (state, client, rx)
    }

    fn request(opcode: u8, detail: u8, body: impl FnOnce(&mut WireWriter)) -> Vec<u8> {
        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        body(&mut w);
        let payload = w.into_bytes();
        let mut raw = Vec::with_capacity(4 + payload.len());
        raw.push(opcode);
        raw.push(detail);
        raw.extend_from_slice(&(((payload.len() + 4) / 4) as u16).to_le_bytes());
        raw.extend_from_slice(&payload);
        raw
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<bytes::Bytes>) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Ok(bytes) = rx.try_recv() {
            out.push(bytes.to_vec());
        }
        out
    }

    #[test]
    fn sequence_advances_once_per_request() {
        let (mut state, client, mut rx) = harness();
        // Two InternAtom requests in a row.
        for _ in 0..2 {
            let raw = request(opcodes::INTERN_ATOM, 0, |w| {
                w.write_u16(7);
                w.write_u16(0);
                w.write_string_padded("PRIMARY");
            });
            process_raw(&mut state, client, &raw);
        }
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        assert_eq!(u16::from_le_bytes([messages[0][2], messages[0][3]]), 1);
        assert_eq!(u16::from_le_bytes([messages[1][2], messages[1][3]]), 2);
    }

    #[test]
    fn error_carries_request_sequence_and_opcode() {
        let (mut state, client, mut rx) = harness();
        let raw = request(opcodes::MAP_WINDOW, 0, |w| {
            w.write_u32(0x0001_2345); // no such window
        });
        process_raw(&mut state, client, &raw);
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0][0], 0); // error
        assert_eq!(messages[0][1], 3); // Window
        assert_eq!(u16::from_le_bytes([messages[0][2], messages[0][3]]), 1);
        assert_eq!(messages[0][10], opcodes::MAP_WINDOW);
    }

    #[test]
    fn unknown_opcode_is_request_error_and_still_counts() {
        let (mut state, client, mut rx) = harness();
        let raw = request(125, 0, |_| {});
        process_raw(&mut state, client, &raw);
        let raw = request(opcodes::GET_INPUT_FOCUS, 0, |_| {});
        process_raw(&mut state, client, &raw);
        let messages = drain(&mut rx);
        assert_eq!(messages[0][0], 0);
        assert_eq!(messages[0][1], 1); // Request
        // second message is the reply with sequence 2
        assert_eq!(messages[1][0], 1);
        assert_eq!(u16::from_le_bytes([messages[1][2], messages[1][3]]), 2);
    }

    #[test]
    fn truncated_body_is_length_error() {
        let (mut state, client, mut rx) = harness();
        // GetProperty declares more fields than the body holds.
        let raw = request(opcodes::GET_PROPERTY, 0, |w| {
            w.write_u32(1);
        });
        process_raw(&mut state, client, &raw);
        let messages = drain(&mut rx);
        assert_eq!(messages[0][1], 16); // Length
    }
}
