//! Grab state machines.
//!
//! Each logical device (core pointer, core keyboard, every XInput device)
//! owns a [`GrabSet`]: at most one active grab plus the passive entries
//! that can activate one. A Sync grab mode freezes the device; physical
//! inputs queue on the active grab until AllowEvents releases them.

use std::collections::VecDeque;

use crate::protocol::types::*;

/// A physical input as it arrived from the front-end, kept for replay
/// while a device is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalInput {
    pub kind: InputKind,
    /// Keycode or button number.
    pub detail: u8,
    pub root_x: i16,
    pub root_y: i16,
    pub state: KeyButMask,
    pub time: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    KeyPress,
    KeyRelease,
    ButtonPress,
    ButtonRelease,
    Motion,
}

impl InputKind {
    pub fn is_press(self) -> bool {
        matches!(self, InputKind::KeyPress | InputKind::ButtonPress)
    }

    pub fn is_pointer(self) -> bool {
        matches!(self, InputKind::ButtonPress | InputKind::ButtonRelease | InputKind::Motion)
    }
}

/// One active grab.
#[derive(Debug, Clone)]
pub struct ActiveGrab {
    pub client: ClientId,
    pub window: WindowId,
    pub owner_events: bool,
    pub event_mask: EventMask,
    pub pointer_mode: GrabMode,
    pub keyboard_mode: GrabMode,
    pub confine_to: WindowId,
    pub cursor: CursorId,
    pub since: Timestamp,
    /// Set when a passive entry activated this grab; such grabs end on
    /// their own when the triggering key/button is released.
    pub from_passive: bool,
    /// Frozen by a Sync mode; inputs queue until AllowEvents.
    pub frozen: bool,
    pub queue: VecDeque<PhysicalInput>,
    /// XInput class mask for device grabs; zero on core grabs.
    pub xi_mask: u32,
}

impl ActiveGrab {
    /// Whether the grab's own mode freezes this device class.
    pub fn freezes(&self, pointer_device: bool) -> bool {
        if pointer_device {
            self.pointer_mode == GrabMode::Sync
        } else {
            self.keyboard_mode == GrabMode::Sync
        }
    }
}

/// One passive grab entry.
#[derive(Debug, Clone)]
pub struct PassiveGrab {
    pub client: ClientId,
    pub window: WindowId,
    /// Key or button; `0` is AnyKey / AnyButton.
    pub detail: u8,
    /// `ANY_MODIFIER` matches any modifier state.
    pub modifiers: u16,
    pub owner_events: bool,
    pub event_mask: EventMask,
    pub pointer_mode: GrabMode,
    pub keyboard_mode: GrabMode,
    pub confine_to: WindowId,
    pub cursor: CursorId,
    /// XInput class mask for passive device grabs; zero on core grabs.
    pub xi_mask: u32,
}

impl PassiveGrab {
    pub fn matches(&self, detail: u8, modifiers: KeyButMask) -> bool {
        let detail_ok = self.detail == 0 || self.detail == detail;
        let mods_ok = self.modifiers == ANY_MODIFIER
            || self.modifiers == (modifiers.bits() & 0x00ff);
        detail_ok && mods_ok
    }
}

/// Grab state of one logical device.
#[derive(Debug, Default)]
pub struct GrabSet {
    pub active: Option<ActiveGrab>,
    pub passive: Vec<PassiveGrab>,
}

impl GrabSet {
    /// `GrabPointer`-style activation: refuse if another client holds the
    /// device.
    pub fn activate(&mut self, grab: ActiveGrab) -> GrabStatus {
        if let Some(existing) = &self.active {
            if existing.client != grab.client {
                return GrabStatus::AlreadyGrabbed;
            }
        }
        self.active = Some(grab);
        GrabStatus::Success
    }

    /// Release if held by `client`.
    pub fn release(&mut self, client: ClientId) -> bool {
        if self.active.as_ref().is_some_and(|grab| grab.client == client) {
            self.active = None;
            return true;
        }
        false
    }

    /// Drop everything belonging to a disconnecting client.
    pub fn forget_client(&mut self, client: ClientId) {
        self.release(client);
        self.passive.retain(|grab| grab.client != client);
    }

    /// Drop state referring to a destroyed or unviewable window.
    pub fn forget_window(&mut self, window: WindowId) {
        if self
            .active
            .as_ref()
            .is_some_and(|grab| grab.window == window || grab.confine_to == window)
        {
            self.active = None;
        }
        self.passive.retain(|grab| grab.window != window);
    }

    /// Install a passive entry, replacing one with the same
    /// (window, detail, modifiers) triple from the same client.
    pub fn add_passive(&mut self, entry: PassiveGrab) {
        self.passive.retain(|grab| {
            !(grab.window == entry.window
                && grab.detail == entry.detail
                && grab.modifiers == entry.modifiers
                && grab.client == entry.client)
        });
        self.passive.push(entry);
    }

    pub fn remove_passive(&mut self, window: WindowId, detail: u8, modifiers: u16) {
        self.passive.retain(|grab| {
            !(grab.window == window
                && (detail == 0 || grab.detail == detail)
                && (modifiers == ANY_MODIFIER || grab.modifiers == modifiers))
        });
    }

    /// Deepest matching passive entry along `chain` (which is ordered
    /// window-first); "deepest" wins, so scan the chain in order.
    pub fn matching_passive(
        &self,
        chain: &[WindowId],
        detail: u8,
        modifiers: KeyButMask,
    ) -> Option<&PassiveGrab> {
        for window in chain {
            if let Some(grab) = self
                .passive
                .iter()
                .find(|grab| grab.window == *window && grab.matches(detail, modifiers))
            {
                return Some(grab);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(client: ClientId) -> ActiveGrab {
        ActiveGrab {
            client,
            window: 10,
            owner_events: false,
            event_mask: EventMask::BUTTON_PRESS,
            pointer_mode: GrabMode::Async,
            keyboard_mode: GrabMode::Async,
            confine_to: NONE,
            cursor: NONE,
            since: 0,
            from_passive: false,
            frozen: false,
            queue: VecDeque::new(),
            xi_mask: 0,
        }
    }

    fn passive(client: ClientId, window: WindowId, detail: u8, modifiers: u16) -> PassiveGrab {
        PassiveGrab {
            client,
            window,
            detail,
            modifiers,
            owner_events: false,
            event_mask: EventMask::KEY_PRESS,
            pointer_mode: GrabMode::Async,
            keyboard_mode: GrabMode::Async,
            confine_to: NONE,
            cursor: NONE,
            xi_mask: 0,
        }
    }

    #[test]
    fn second_client_grab_is_refused() {
        let mut set = GrabSet::default();
        assert_eq!(set.activate(active(2)), GrabStatus::Success);
        assert_eq!(set.activate(active(3)), GrabStatus::AlreadyGrabbed);
        // same client may re-grab (parameter change)
        assert_eq!(set.activate(active(2)), GrabStatus::Success);
    }

    #[test]
    fn release_checks_owner() {
        let mut set = GrabSet::default();
        set.activate(active(2));
        assert!(!set.release(3));
        assert!(set.active.is_some());
        assert!(set.release(2));
        assert!(set.active.is_none());
    }

    #[test]
    fn passive_wildcards() {
        let grab = passive(2, 10, 0, ANY_MODIFIER);
        assert!(grab.matches(38, KeyButMask::SHIFT));
        let exact = passive(2, 10, 38, KeyButMask::CONTROL.bits());
        assert!(exact.matches(38, KeyButMask::CONTROL));
        assert!(!exact.matches(38, KeyButMask::SHIFT));
        assert!(!exact.matches(39, KeyButMask::CONTROL));
    }

    #[test]
    fn modifier_match_ignores_button_state() {
        let exact = passive(2, 10, 38, KeyButMask::CONTROL.bits());
        assert!(exact.matches(38, KeyButMask::CONTROL | KeyButMask::BUTTON1));
    }

    #[test]
    fn deepest_passive_entry_wins() {
        let mut set = GrabSet::default();
        set.add_passive(passive(2, 10, 0, ANY_MODIFIER)); // on the child
        set.add_passive(passive(3, 1, 0, ANY_MODIFIER)); // on the root
        let chain = [10, 1];
        let hit = set.matching_passive(&chain, 38, KeyButMask::empty()).unwrap();
        assert_eq!(hit.client, 2);
    }

    #[test]
    fn add_passive_replaces_same_triple() {
        let mut set = GrabSet::default();
        set.add_passive(passive(2, 10, 38, 0));
        let mut updated = passive(2, 10, 38, 0);
        updated.owner_events = true;
        set.add_passive(updated);
        assert_eq!(set.passive.len(), 1);
        assert!(set.passive[0].owner_events);
    }

    #[test]
    fn forget_window_clears_related_state() {
        let mut set = GrabSet::default();
        set.add_passive(passive(2, 10, 0, ANY_MODIFIER));
        set.activate(active(2));
        set.forget_window(10);
        assert!(set.active.is_none());
        assert!(set.passive.is_empty());
    }
}
