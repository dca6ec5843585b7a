//! The per-connection serve loop.
//!
//! The transport is an opaque bidirectional byte stream: the handshake
//! runs first, then a framed reader slices requests by the declared
//! length while a writer task drains the client's output queue. Handler
//! invocations lock the shared server state per request; nothing holds
//! the lock across a suspension point.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{debug, info, warn};

use crate::protocol::requests::RequestHeader;
use crate::protocol::setup::{SetupInfo, SetupRequest};
use crate::protocol::types::ByteOrder;
use crate::server::dispatcher;
use crate::server::state::ServerState;
use crate::{Error, Result};

/// Frames the post-handshake request stream: 4-byte header, then
/// `length * 4` bytes total in the connection's byte order.
pub struct RequestFraming {
    order: ByteOrder,
}

impl RequestFraming {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }
}

impl Decoder for RequestFraming {
    type Item = (RequestHeader, Bytes);
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::io::Result<Option<Self::Item>> {
        if src.len() < 4 {
            return Ok(None);
        }
        let header = RequestHeader::decode([src[0], src[1], src[2], src[3]], self.order);
        if header.length == 0 {
            // BigRequests is not negotiated; a zero length can only be a
            // corrupt stream.
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request with zero length field",
            ));
        }
        let total = header.length as usize * 4;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }
        let frame = src.split_to(total).freeze();
        Ok(Some((header, frame.slice(4..))))
    }
}

/// Serve one client connection to completion. Returns once the peer
/// disconnects or the connection becomes unrecoverable; all resources
/// the client owned are reclaimed before returning.
pub async fn serve<S>(state: Arc<Mutex<ServerState>>, stream: S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    // Handshake: 12-byte prefix, then the auth material, discarded.
    let mut prefix = [0u8; 12];
    reader.read_exact(&mut prefix).await?;
    let setup = match SetupRequest::decode(&prefix) {
        Ok(setup) => setup,
        Err(err) => {
            let refusal = SetupInfo::encode_failed(&err.to_string(), ByteOrder::LittleEndian);
            let _ = writer.write_all(&refusal).await;
            return Err(Error::Handshake(err));
        }
    };
    let auth_len = setup.auth_material_len();
    if auth_len > 0 {
        let mut auth = vec![0u8; auth_len];
        reader.read_exact(&mut auth).await?;
    }

    let (client, mut outbox, credit, setup_reply) = {
        let mut state = state.lock();
        match state.clients.register(setup.byte_order) {
            Some((client, outbox, credit)) => {
                let reply = state.setup_info().encode_success(setup.byte_order);
                (client, outbox, credit, reply)
            }
            None => {
                let refusal =
                    SetupInfo::encode_failed("connection table full", setup.byte_order);
                drop(state);
                let _ = writer.write_all(&refusal).await;
                return Err(Error::TooManyClients);
            }
        }
    };
    writer.write_all(&setup_reply).await?;
    info!(client, order = ?setup.byte_order, "client connected");

    // Writer task: drains the output queue and returns byte credit.
    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = outbox.recv().await {
            let len = bytes.len();
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
            credit.consumed(len);
        }
        let _ = writer.shutdown().await;
    });

    // Serve loop: one framed request at a time.
    let mut framed = FramedRead::new(reader, RequestFraming::new(setup.byte_order));
    while let Some(frame) = framed.next().await {
        match frame {
            Ok((header, body)) => {
                let mut state = state.lock();
                dispatcher::process_request(&mut state, client, header, &body);
                let doomed = state.clients.get(client).map(|c| c.doomed).unwrap_or(true);
                if doomed {
                    debug!(client, "connection doomed, closing");
                    break;
                }
            }
            Err(err) => {
                warn!(client, %err, "unrecoverable framing error");
                break;
            }
        }
    }

    // Teardown releases every resource and closes the output channel,
    // which ends the writer task after the queue drains.
    {
        let mut state = state.lock();
        state.disconnect(client);
    }
    let _ = writer_task.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_waits_for_full_request() {
        let mut codec = RequestFraming::new(ByteOrder::LittleEndian);
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&[43, 0, 2, 0]); // GetInputFocus, length 2
        assert!(codec.decode(&mut buffer).unwrap().is_none());
        buffer.extend_from_slice(&[0, 0, 0, 0]);
        let (header, body) = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(header.opcode, 43);
        assert_eq!(body.len(), 4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn framing_slices_back_to_back_requests() {
        let mut codec = RequestFraming::new(ByteOrder::LittleEndian);
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&[43, 0, 1, 0, 44, 0, 1, 0]);
        let (first, body) = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(first.opcode, 43);
        assert!(body.is_empty());
        let (second, _) = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(second.opcode, 44);
    }

    #[test]
    fn framing_rejects_zero_length() {
        let mut codec = RequestFraming::new(ByteOrder::LittleEndian);
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&[1, 0, 0, 0]);
        assert!(codec.decode(&mut buffer).is_err());
    }

    #[test]
    fn framing_honours_big_endian_length() {
        let mut codec = RequestFraming::new(ByteOrder::BigEndian);
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&[43, 0, 0, 2, 0, 0, 0, 0]);
        let (header, body) = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(header.length, 2);
        assert_eq!(body.len(), 4);
    }
}
