//! Per-connection client state and the client table.
//!
//! Every connection gets a prefix index; a client-supplied resource id
//! whose bits all fit under the advertised mask is that client's local
//! index and maps to `prefix << 21 | local`. Ids above the mask name
//! server or foreign resources and pass through untouched; on encode the
//! mapping narrows ids the receiving client owns back to local form.
//!
//! Output is an unbounded channel drained by the connection's writer
//! task; a byte counter enforces the high-water mark without blocking
//! the input router.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::events::Event;
use crate::protocol::types::*;
use crate::protocol::xinput::DeviceEvent;

/// Prefix index reserved for server-owned resources.
pub const SERVER_PREFIX_INDEX: u32 = 1;
/// First prefix index handed to connections.
pub const FIRST_CLIENT_INDEX: u32 = 2;
/// Resource ids are 29 bits, so prefix indexes stop at 255.
pub const LAST_CLIENT_INDEX: u32 = 0xff;

/// Compose a global id from a prefix index and a local index.
pub fn compose_id(prefix_index: u32, local: XId) -> XId {
    (prefix_index << RESOURCE_INDEX_BITS) | (local & RESOURCE_ID_MASK)
}

/// Well-known server resource ids.
pub const ROOT_WINDOW: WindowId = (SERVER_PREFIX_INDEX << RESOURCE_INDEX_BITS) | 1;
pub const DEFAULT_COLORMAP: ColormapId = (SERVER_PREFIX_INDEX << RESOURCE_INDEX_BITS) | 2;
pub const ROOT_VISUAL: VisualId = 1;

#[derive(Debug)]
pub struct ClientState {
    /// Connection id; doubles as the resource prefix index.
    pub id: ClientId,
    pub byte_order: ByteOrder,
    /// Sequence number of the most recently started request; echoed on
    /// every reply, error, and event for this client.
    pub sequence: SequenceNumber,
    sender: mpsc::UnboundedSender<Bytes>,
    queued_bytes: Arc<AtomicUsize>,
    high_water: usize,
    /// Devices opened through XOpenDevice.
    pub open_devices: HashSet<DeviceId>,
    /// Foreign windows to re-root when this client dies.
    pub save_set: HashSet<WindowId>,
    /// Recorded close-down mode; teardown always destroys (documented
    /// divergence).
    pub close_down: CloseDownMode,
    /// Marked by KillClient or queue overflow; the serve loop exits.
    pub doomed: bool,
}

impl ClientState {
    pub fn advance_sequence(&mut self) -> SequenceNumber {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Map a client-supplied id into the global namespace.
    pub fn globalize(&self, id: XId) -> XId {
        if id == NONE || (id & !RESOURCE_ID_MASK) != 0 {
            return id;
        }
        compose_id(self.id, id)
    }

    /// Map a global id into the form this client knows it by.
    pub fn localize(&self, id: XId) -> XId {
        if id >> RESOURCE_INDEX_BITS == self.id {
            id & RESOURCE_ID_MASK
        } else {
            id
        }
    }

    /// Queue encoded bytes for the writer task. Overflowing the
    /// high-water mark dooms the connection instead of blocking.
    pub fn enqueue(&mut self, bytes: Bytes) {
        if self.doomed {
            return;
        }
        let queued = self.queued_bytes.fetch_add(bytes.len(), Ordering::Relaxed) + bytes.len();
        if queued > self.high_water {
            warn!(client = self.id, queued, "output queue over high-water mark, dropping client");
            self.doomed = true;
            return;
        }
        if self.sender.send(bytes).is_err() {
            self.doomed = true;
        }
    }

    pub fn enqueue_event(&mut self, event: &Event, synthetic: bool) {
        let bytes = event.encode(self.sequence, self.byte_order, synthetic);
        self.enqueue(bytes);
    }

    pub fn enqueue_device_event(&mut self, event: &DeviceEvent) {
        let bytes = event.encode(self.sequence, self.byte_order);
        self.enqueue(bytes);
    }
}

/// Handle passed to the writer task to decrement the queue counter as
/// bytes reach the socket.
#[derive(Debug, Clone)]
pub struct OutputCredit(Arc<AtomicUsize>);

impl OutputCredit {
    pub fn consumed(&self, bytes: usize) {
        self.0.fetch_sub(bytes, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct ClientTable {
    clients: HashMap<ClientId, ClientState>,
    free_indexes: Vec<u32>,
    next_index: u32,
    high_water: usize,
}

impl ClientTable {
    pub fn new(high_water: usize) -> Self {
        Self {
            clients: HashMap::new(),
            free_indexes: Vec::new(),
            next_index: FIRST_CLIENT_INDEX,
            high_water,
        }
    }

    /// Register a connection; returns its id, the receiving end of its
    /// output queue, and the writer-side credit handle.
    pub fn register(
        &mut self,
        byte_order: ByteOrder,
    ) -> Option<(ClientId, mpsc::UnboundedReceiver<Bytes>, OutputCredit)> {
        let index = match self.free_indexes.pop() {
            Some(index) => index,
            None if self.next_index <= LAST_CLIENT_INDEX => {
                let index = self.next_index;
                self.next_index += 1;
                index
            }
            None => return None,
        };
        let (sender, receiver) = mpsc::unbounded_channel();
        let queued_bytes = Arc::new(AtomicUsize::new(0));
        let credit = OutputCredit(queued_bytes.clone());
        let state = ClientState {
            id: index,
            byte_order,
            sequence: 0,
            sender,
            queued_bytes,
            high_water: self.high_water,
            open_devices: HashSet::new(),
            save_set: HashSet::new(),
            close_down: CloseDownMode::Destroy,
            doomed: false,
        };
        debug!(client = index, ?byte_order, "client registered");
        self.clients.insert(index, state);
        Some((index, receiver, credit))
    }

    pub fn unregister(&mut self, client: ClientId) -> Option<ClientState> {
        let state = self.clients.remove(&client)?;
        self.free_indexes.push(client);
        debug!(client, "client unregistered");
        Some(state)
    }

    pub fn get(&self, client: ClientId) -> Option<&ClientState> {
        self.clients.get(&client)
    }

    pub fn get_mut(&mut self, client: ClientId) -> Option<&mut ClientState> {
        self.clients.get_mut(&client)
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.clients.contains_key(&client)
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Deliver an event to one client, localizing nothing; the caller
    /// prepares ids through [`ClientState::localize`].
    pub fn deliver(&mut self, client: ClientId, event: &Event, synthetic: bool) {
        if let Some(state) = self.clients.get_mut(&client) {
            state.enqueue_event(event, synthetic);
        }
    }

    pub fn deliver_device(&mut self, client: ClientId, event: &DeviceEvent) {
        if let Some(state) = self.clients.get_mut(&client) {
            state.enqueue_device_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ClientTable {
        ClientTable::new(1024)
    }

    #[test]
    fn well_known_ids_sit_above_the_mask() {
        assert!(ROOT_WINDOW > RESOURCE_ID_MASK);
        assert!(DEFAULT_COLORMAP > RESOURCE_ID_MASK);
        assert_eq!(ROOT_WINDOW, 0x0020_0001);
    }

    #[test]
    fn id_mapping_round_trip() {
        let mut t = table();
        let (id, _rx, _credit) = t.register(ByteOrder::LittleEndian).unwrap();
        let client = t.get(id).unwrap();
        let global = client.globalize(0x0010_0001);
        assert_eq!(global, compose_id(id, 0x0010_0001));
        assert_eq!(client.localize(global), 0x0010_0001);
        // foreign and server ids pass through both ways
        assert_eq!(client.globalize(ROOT_WINDOW), ROOT_WINDOW);
        assert_eq!(client.localize(ROOT_WINDOW), ROOT_WINDOW);
        assert_eq!(client.globalize(NONE), NONE);
    }

    #[test]
    fn indexes_are_reused_after_unregister() {
        let mut t = table();
        let (first, _rx1, _c1) = t.register(ByteOrder::LittleEndian).unwrap();
        assert_eq!(first, FIRST_CLIENT_INDEX);
        t.unregister(first);
        let (again, _rx2, _c2) = t.register(ByteOrder::BigEndian).unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn sequence_wraps_at_16_bits() {
        let mut t = table();
        let (id, _rx, _credit) = t.register(ByteOrder::LittleEndian).unwrap();
        let client = t.get_mut(id).unwrap();
        client.sequence = u16::MAX;
        assert_eq!(client.advance_sequence(), 0);
        assert_eq!(client.advance_sequence(), 1);
    }

    #[test]
    fn high_water_dooms_instead_of_blocking() {
        let mut t = ClientTable::new(16);
        let (id, mut rx, _credit) = t.register(ByteOrder::LittleEndian).unwrap();
        let client = t.get_mut(id).unwrap();
        client.enqueue(Bytes::from(vec![0u8; 12]));
        assert!(!client.doomed);
        client.enqueue(Bytes::from(vec![0u8; 12]));
        assert!(client.doomed);
        // the first message is still in the channel for the writer
        assert_eq!(rx.try_recv().unwrap().len(), 12);
        assert!(rx.try_recv().is_err());
    }
}
