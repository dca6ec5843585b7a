//! Input routing: focus, pointer state, grabs, and event delivery.

pub mod grabs;
pub mod motion;
pub mod router;

use crate::protocol::types::*;
use grabs::GrabSet;
use motion::MotionHistory;

/// Keyboard focus state.
#[derive(Debug, Clone, Copy)]
pub struct FocusState {
    /// Focus window id, `NONE`, or `POINTER_ROOT`.
    pub window: WindowId,
    pub revert_to: RevertTo,
    pub since: Timestamp,
}

impl Default for FocusState {
    fn default() -> Self {
        Self { window: POINTER_ROOT, revert_to: RevertTo::PointerRoot, since: 0 }
    }
}

/// Logical pointer state.
#[derive(Debug, Clone, Copy)]
pub struct PointerState {
    pub root_x: i16,
    pub root_y: i16,
    /// Window currently under the pointer (hit-test result).
    pub window: WindowId,
    /// Button and modifier state as of the last input.
    pub state: KeyButMask,
}

impl PointerState {
    fn new(root: WindowId) -> Self {
        Self { root_x: 0, root_y: 0, window: root, state: KeyButMask::empty() }
    }
}

/// All core input-routing state.
#[derive(Debug)]
pub struct InputState {
    pub focus: FocusState,
    pub pointer: PointerState,
    pub pointer_grab: GrabSet,
    pub keyboard_grab: GrabSet,
    pub motion: MotionHistory,
    /// Bit vector of pressed keycodes for QueryKeymap.
    pub keys_down: [u8; 32],
}

impl InputState {
    pub fn new(root: WindowId, motion_buffer: usize) -> Self {
        Self {
            focus: FocusState::default(),
            pointer: PointerState::new(root),
            pointer_grab: GrabSet::default(),
            keyboard_grab: GrabSet::default(),
            motion: MotionHistory::new(motion_buffer),
            keys_down: [0; 32],
        }
    }

    pub fn note_key(&mut self, keycode: KeyCode, pressed: bool) {
        let byte = (keycode / 8) as usize;
        let bit = keycode % 8;
        if pressed {
            self.keys_down[byte] |= 1 << bit;
        } else {
            self.keys_down[byte] &= !(1 << bit);
        }
    }

    /// Release everything a disconnecting client held.
    pub fn forget_client(&mut self, client: ClientId) {
        self.pointer_grab.forget_client(client);
        self.keyboard_grab.forget_client(client);
    }

    /// Drop grab and focus references to a destroyed window.
    pub fn forget_window(&mut self, window: WindowId, root: WindowId) {
        self.pointer_grab.forget_window(window);
        self.keyboard_grab.forget_window(window);
        if self.focus.window == window {
            self.focus.window = match self.focus.revert_to {
                RevertTo::None => NONE,
                RevertTo::PointerRoot => POINTER_ROOT,
                // the caller rewires Parent reverts before destroying
                RevertTo::Parent => POINTER_ROOT,
            };
        }
        if self.pointer.window == window {
            self.pointer.window = root;
        }
    }
}
