//! XInput dispatcher state: the two virtual devices, per-client event
//! selections, and device grabs.
//!
//! The server advertises one virtual pointer (device 2) and one virtual
//! keyboard (device 3). Selections are stored per (window, client,
//! device) as a class-mask word; XInput 2 masks are stored as raw
//! bitmaps keyed the same way. While a device grab is held, the grabber
//! preempts both core and extension delivery for that device.

use std::collections::HashMap;

use crate::input::grabs::GrabSet;
use crate::protocol::errors::XError;
use crate::protocol::types::*;
use crate::protocol::xinput::{
    ButtonClassInfo, DeviceClasses, DeviceDescriptor, DeviceUse, KeyClassInfo, ValuatorAxis,
    ValuatorClassInfo,
};

pub const POINTER_DEVICE: DeviceId = 2;
pub const KEYBOARD_DEVICE: DeviceId = 3;

/// Event and error bases advertised by QueryExtension.
pub const FIRST_EVENT: u8 = 64;
pub const FIRST_ERROR: u8 = 128;

/// Version the server implements (XInput 2.2).
pub const SERVER_XI_MAJOR: u16 = 2;
pub const SERVER_XI_MINOR: u16 = 2;

#[derive(Debug, Default)]
pub struct XInputState {
    /// XInput 1 class-mask selections.
    selections: HashMap<(WindowId, ClientId, DeviceId), u32>,
    /// XInput 2 raw mask bitmaps.
    xi2_masks: HashMap<(WindowId, ClientId, u16), Vec<u8>>,
    /// Device grab state, keyed by device id.
    pub grabs: HashMap<DeviceId, GrabSet>,
    /// XI2 version negotiated per client.
    negotiated: HashMap<ClientId, (u16, u16)>,
}

impl XInputState {
    pub fn new() -> Self {
        let mut grabs = HashMap::new();
        grabs.insert(POINTER_DEVICE, GrabSet::default());
        grabs.insert(KEYBOARD_DEVICE, GrabSet::default());
        Self { selections: HashMap::new(), xi2_masks: HashMap::new(), grabs, negotiated: HashMap::new() }
    }

    pub fn device_exists(device: DeviceId) -> bool {
        device == POINTER_DEVICE || device == KEYBOARD_DEVICE
    }

    pub fn check_device(device: DeviceId) -> Result<DeviceId, XError> {
        if Self::device_exists(device) {
            Ok(device)
        } else {
            Err(XError::value(device as u32))
        }
    }

    pub fn grab_set(&mut self, device: DeviceId) -> &mut GrabSet {
        self.grabs.entry(device).or_default()
    }

    pub fn active_grab(&self, device: DeviceId) -> Option<&crate::input::grabs::ActiveGrab> {
        self.grabs.get(&device).and_then(|set| set.active.as_ref())
    }

    /// Replace the class-mask selection of (window, client, device).
    pub fn select(&mut self, window: WindowId, client: ClientId, device: DeviceId, mask: u32) {
        if mask == 0 {
            self.selections.remove(&(window, client, device));
        } else {
            self.selections.insert((window, client, device), mask);
        }
    }

    pub fn selection(&self, window: WindowId, client: ClientId, device: DeviceId) -> u32 {
        self.selections.get(&(window, client, device)).copied().unwrap_or(0)
    }

    /// Clients whose selection on `window` for `device` includes `mask`.
    pub fn selectors_of(&self, window: WindowId, device: DeviceId, mask: u32) -> Vec<ClientId> {
        self.selections
            .iter()
            .filter(|((w, _, d), selected)| *w == window && *d == device && (*selected & mask) != 0)
            .map(|((_, client, _), _)| *client)
            .collect()
    }

    /// All selections on `window`, as (client, device, mask).
    pub fn selections_on(&self, window: WindowId) -> Vec<(ClientId, DeviceId, u32)> {
        self.selections
            .iter()
            .filter(|((w, _, _), _)| *w == window)
            .map(|((_, client, device), mask)| (*client, *device, *mask))
            .collect()
    }

    pub fn set_xi2_mask(&mut self, window: WindowId, client: ClientId, device: u16, mask: Vec<u8>) {
        if mask.iter().all(|byte| *byte == 0) {
            self.xi2_masks.remove(&(window, client, device));
        } else {
            self.xi2_masks.insert((window, client, device), mask);
        }
    }

    pub fn negotiate(&mut self, client: ClientId, major: u16, minor: u16) -> (u16, u16) {
        let version = if (major, minor) < (SERVER_XI_MAJOR, SERVER_XI_MINOR) {
            (major, minor)
        } else {
            (SERVER_XI_MAJOR, SERVER_XI_MINOR)
        };
        self.negotiated.insert(client, version);
        version
    }

    pub fn forget_client(&mut self, client: ClientId) {
        self.selections.retain(|(_, c, _), _| *c != client);
        self.xi2_masks.retain(|(_, c, _), _| *c != client);
        self.negotiated.remove(&client);
        for set in self.grabs.values_mut() {
            set.forget_client(client);
        }
    }

    pub fn forget_window(&mut self, window: WindowId) {
        self.selections.retain(|(w, _, _), _| *w != window);
        self.xi2_masks.retain(|(w, _, _), _| *w != window);
        for set in self.grabs.values_mut() {
            set.forget_window(window);
        }
    }
}

/// The advertised device inventory for a screen of the given size.
pub fn device_inventory(width: u16, height: u16, motion_buffer: u32) -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor {
            id: POINTER_DEVICE,
            device_type: 0,
            kind: DeviceUse::Pointer,
            name: "Virtual core pointer".to_string(),
            classes: DeviceClasses {
                keys: None,
                buttons: Some(ButtonClassInfo { num_buttons: 5 }),
                valuators: Some(ValuatorClassInfo {
                    mode: 1, // Absolute
                    motion_buffer_size: motion_buffer,
                    axes: vec![
                        ValuatorAxis { min: 0, max: width.saturating_sub(1) as i32, resolution: 1 },
                        ValuatorAxis { min: 0, max: height.saturating_sub(1) as i32, resolution: 1 },
                    ],
                }),
            },
            enabled: true,
        },
        DeviceDescriptor {
            id: KEYBOARD_DEVICE,
            device_type: 0,
            kind: DeviceUse::Keyboard,
            name: "Virtual core keyboard".to_string(),
            classes: DeviceClasses {
                keys: Some(KeyClassInfo { min_keycode: 8, max_keycode: 255, num_keys: 248 }),
                buttons: None,
                valuators: None,
            },
            enabled: true,
        },
    ]
}

/// (input class, event-type base) pairs reported by OpenDevice.
pub fn open_device_classes(device: DeviceId) -> Vec<(u8, u8)> {
    use crate::protocol::xinput::event_offsets::*;
    match device {
        POINTER_DEVICE => vec![
            (1, FIRST_EVENT + DEVICE_BUTTON_PRESS), // ButtonClass
            (2, FIRST_EVENT + DEVICE_MOTION_NOTIFY), // ValuatorClass
        ],
        KEYBOARD_DEVICE => vec![(0, FIRST_EVENT + DEVICE_KEY_PRESS)], // KeyClass
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::xinput::class_masks;

    #[test]
    fn selection_replaces_previous_mask() {
        let mut state = XInputState::new();
        state.select(10, 2, POINTER_DEVICE, class_masks::DEVICE_BUTTON_PRESS);
        state.select(10, 2, POINTER_DEVICE, class_masks::DEVICE_MOTION_NOTIFY);
        assert_eq!(state.selection(10, 2, POINTER_DEVICE), class_masks::DEVICE_MOTION_NOTIFY);
        assert!(state.selectors_of(10, POINTER_DEVICE, class_masks::DEVICE_BUTTON_PRESS).is_empty());
    }

    #[test]
    fn zero_mask_removes_selection() {
        let mut state = XInputState::new();
        state.select(10, 2, POINTER_DEVICE, class_masks::DEVICE_BUTTON_PRESS);
        state.select(10, 2, POINTER_DEVICE, 0);
        assert!(state.selections_on(10).is_empty());
    }

    #[test]
    fn version_negotiation_takes_lower_pair() {
        let mut state = XInputState::new();
        assert_eq!(state.negotiate(2, 2, 0), (2, 0));
        assert_eq!(state.negotiate(2, 2, 4), (2, 2));
        assert_eq!(state.negotiate(2, 1, 5), (1, 5));
    }

    #[test]
    fn forget_client_clears_grabs_and_selections() {
        let mut state = XInputState::new();
        state.select(10, 2, POINTER_DEVICE, class_masks::DEVICE_BUTTON_PRESS);
        state.grab_set(POINTER_DEVICE).activate(crate::input::grabs::ActiveGrab {
            client: 2,
            window: 10,
            owner_events: false,
            event_mask: EventMask::empty(),
            pointer_mode: GrabMode::Async,
            keyboard_mode: GrabMode::Async,
            confine_to: NONE,
            cursor: NONE,
            since: 0,
            from_passive: false,
            frozen: false,
            queue: Default::default(),
            xi_mask: 0,
        });
        state.forget_client(2);
        assert!(state.active_grab(POINTER_DEVICE).is_none());
        assert!(state.selections_on(10).is_empty());
    }

    #[test]
    fn inventory_advertises_both_devices() {
        let devices = device_inventory(1280, 800, 256);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, POINTER_DEVICE);
        assert_eq!(devices[1].id, KEYBOARD_DEVICE);
        assert_eq!(devices[1].classes.keys.unwrap().num_keys, 248);
    }
}
