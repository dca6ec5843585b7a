//! The server value: one shared state behind a serialising lock, a
//! serve entry point per client stream, and the input-feedback surface
//! the render front-end calls back into.

pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod handlers;
pub mod keymap;
pub mod state;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::config::ServerConfig;
use crate::frontend::Frontend;
use crate::protocol::events::Event;
use crate::protocol::types::*;
use crate::window::tree;
use state::ServerState;

pub use client::{DEFAULT_COLORMAP, ROOT_WINDOW, ROOT_VISUAL};

/// Mouse transitions the front-end can feed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Down,
    Up,
    Move,
}

/// The in-process display server. Cheap to clone; all clones share one
/// state.
#[derive(Clone)]
pub struct Server {
    state: Arc<Mutex<ServerState>>,
}

impl Server {
    pub fn new(config: ServerConfig, frontend: Arc<dyn Frontend>) -> Self {
        Self { state: Arc::new(Mutex::new(ServerState::new(config, frontend))) }
    }

    /// Serve one client byte stream (as delivered by the embedding
    /// transport) until it disconnects.
    pub async fn serve_stream<S>(&self, stream: S) -> crate::Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        connection::serve(self.state.clone(), stream).await
    }

    /// Run a closure against the locked server state. The embedding
    /// application uses this for setup and tests use it for inspection.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        f(&mut self.state.lock())
    }

    // ---- Input feedback from the front-end (§ front-end contract) ----

    /// A mouse transition on `window`, with window-relative coordinates.
    pub fn send_mouse_event(
        &self,
        window: WindowId,
        kind: MouseEventKind,
        x: i16,
        y: i16,
        button: Button,
    ) {
        let mut state = self.state.lock();
        let (ox, oy) = tree::root_origin(&state.registry, window);
        let root_x = (ox + x as i32) as i16;
        let root_y = (oy + y as i32) as i16;
        match kind {
            MouseEventKind::Move => state.route_motion(root_x, root_y),
            MouseEventKind::Down => {
                state.route_motion(root_x, root_y);
                state.route_button(true, button);
            }
            MouseEventKind::Up => {
                state.route_motion(root_x, root_y);
                state.route_button(false, button);
            }
        }
    }

    /// A key transition, already translated to an X keycode.
    pub fn send_keyboard_event(&self, pressed: bool, keycode: KeyCode, modifiers: KeyButMask) {
        self.state.lock().route_key(pressed, keycode, modifiers);
    }

    /// A host-side crossing of `window`, relayed as-is to its selectors.
    #[allow(clippy::too_many_arguments)]
    pub fn send_pointer_crossing(
        &self,
        enter: bool,
        window: WindowId,
        root_x: i16,
        root_y: i16,
        event_x: i16,
        event_y: i16,
        mode: NotifyMode,
        detail: NotifyDetail,
        same_screen: bool,
    ) {
        let mut state = self.state.lock();
        state.input.pointer.root_x = root_x;
        state.input.pointer.root_y = root_y;
        let time = state.now();
        let root = state.root;
        let pointer_state = state.input.pointer.state;
        let mask = if enter { EventMask::ENTER_WINDOW } else { EventMask::LEAVE_WINDOW };
        state.fan_out(window, mask, |client| {
            let fields =
                (client.localize(root), client.localize(window));
            if enter {
                Event::EnterNotify {
                    detail,
                    time,
                    root: fields.0,
                    event: fields.1,
                    child: NONE,
                    root_x,
                    root_y,
                    event_x,
                    event_y,
                    state: pointer_state,
                    mode,
                    same_screen_focus: if same_screen { 0x02 } else { 0 },
                }
            } else {
                Event::LeaveNotify {
                    detail,
                    time,
                    root: fields.0,
                    event: fields.1,
                    child: NONE,
                    root_x,
                    root_y,
                    event_x,
                    event_y,
                    state: pointer_state,
                    mode,
                    same_screen_focus: if same_screen { 0x02 } else { 0 },
                }
            }
        });
    }

    /// Pointer position sync without a button transition.
    pub fn update_pointer_position(&self, root_x: i16, root_y: i16) {
        self.state.lock().route_motion(root_x, root_y);
    }

    /// The host resized the surface backing the root window.
    pub fn set_root_window_size(&self, width: u16, height: u16) {
        let mut state = self.state.lock();
        state.config.width = width;
        state.config.height = height;
        let root = state.root;
        if let Ok(node) = state.registry.window_mut(root) {
            node.width = width;
            node.height = height;
        }
        debug!(width, height, "root window resized");
        state.structure_notify(root, move |client, event_window| Event::ConfigureNotify {
            event: client.localize(event_window),
            window: client.localize(root),
            above_sibling: NONE,
            x: 0,
            y: 0,
            width,
            height,
            border_width: 0,
            override_redirect: false,
        });
        state.fan_out(root, EventMask::EXPOSURE, |client| Event::Expose {
            window: client.localize(root),
            x: 0,
            y: 0,
            width,
            height,
            count: 0,
        });
    }
}
