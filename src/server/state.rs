//! The single-writer server state.
//!
//! Everything the handlers and the input router touch lives on this one
//! value: the resource registry, the atom table, the client table, the
//! input and XInput state, and the shared bookkeeping (selections,
//! hosts, screen saver, keyboard state). One `parking_lot::Mutex` in
//! [`crate::server::Server`] serialises all access, so no two observers
//! ever see inconsistent intermediate state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::color::colormap::ColormapRecord;
use crate::config::ServerConfig;
use crate::frontend::Frontend;
use crate::input::InputState;
use crate::protocol::events::Event;
use crate::protocol::replies::HostEntry;
use crate::protocol::setup::{SetupInfo, Visual};
use crate::protocol::types::*;
use crate::resources::registry::{Registry, Resource};
use crate::resources::AtomTable;
use crate::server::client::{ClientState, ClientTable, DEFAULT_COLORMAP, ROOT_WINDOW, ROOT_VISUAL};
use crate::server::keymap;
use crate::window::tree::{self, WindowNode};
use crate::xinput::XInputState;

/// Ownership record of one selection atom.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRecord {
    pub owner: WindowId,
    pub client: ClientId,
    pub since: Timestamp,
}

/// Keyboard bookkeeping served by the control requests.
#[derive(Debug, Clone)]
pub struct KeyboardSettings {
    pub key_click_percent: u8,
    pub bell_percent: u8,
    pub bell_pitch: u16,
    pub bell_duration: u16,
    pub led_mask: u32,
    pub global_auto_repeat: bool,
    pub auto_repeats: [u8; 32],
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            key_click_percent: 50,
            bell_percent: 50,
            bell_pitch: 400,
            bell_duration: 100,
            led_mask: 0,
            global_auto_repeat: true,
            auto_repeats: [0xff; 32],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PointerSettings {
    pub acceleration_numerator: u16,
    pub acceleration_denominator: u16,
    pub threshold: u16,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self { acceleration_numerator: 2, acceleration_denominator: 1, threshold: 4 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScreenSaverSettings {
    pub timeout: i16,
    pub interval: i16,
    pub prefer_blanking: u8,
    pub allow_exposures: u8,
}

impl Default for ScreenSaverSettings {
    fn default() -> Self {
        Self { timeout: 600, interval: 600, prefer_blanking: 1, allow_exposures: 1 }
    }
}

/// Server-side keyboard mapping, used while the front-end opts out.
#[derive(Debug, Clone)]
pub struct KeymapState {
    pub keysyms_per_keycode: u8,
    /// Dense table for keycodes `MIN_KEYCODE..=MAX_KEYCODE`.
    pub keysyms: Vec<KeySym>,
    pub keycodes_per_modifier: u8,
    pub modifier_map: Vec<KeyCode>,
    pub pointer_map: Vec<u8>,
}

impl Default for KeymapState {
    fn default() -> Self {
        let count = keymap::MAX_KEYCODE - keymap::MIN_KEYCODE + 1;
        let (keycodes_per_modifier, modifier_map) = keymap::modifier_map();
        Self {
            keysyms_per_keycode: keymap::KEYSYMS_PER_KEYCODE,
            keysyms: keymap::keysyms(keymap::MIN_KEYCODE, count),
            keycodes_per_modifier,
            modifier_map,
            pointer_map: vec![1, 2, 3, 4, 5],
        }
    }
}

pub struct ServerState {
    pub config: ServerConfig,
    pub frontend: Arc<dyn Frontend>,
    pub registry: Registry,
    pub atoms: AtomTable,
    pub clients: ClientTable,
    pub input: InputState,
    pub xinput: XInputState,
    pub selections: HashMap<Atom, SelectionRecord>,
    pub hosts: Vec<HostEntry>,
    pub access_control: bool,
    pub screen_saver: ScreenSaverSettings,
    pub keyboard_settings: KeyboardSettings,
    pub pointer_settings: PointerSettings,
    pub keymap: KeymapState,
    pub font_path: Vec<String>,
    /// Client holding GrabServer, if any.
    pub server_grab: Option<ClientId>,
    pub root: WindowId,
    pub default_colormap: ColormapId,
    pub root_visual: Visual,
    started: Instant,
}

impl ServerState {
    pub fn new(config: ServerConfig, frontend: Arc<dyn Frontend>) -> Self {
        let root_visual = Visual::true_color_24(ROOT_VISUAL);
        let mut registry = Registry::new();

        let mut root = WindowNode::new(
            ROOT_WINDOW,
            NONE,
            24,
            WindowClass::InputOutput,
            root_visual.id,
            Rectangle { x: 0, y: 0, width: config.width, height: config.height },
            0,
            DEFAULT_COLORMAP,
        );
        root.mapped = true;
        registry.insert_server(ROOT_WINDOW, Resource::Window(Box::new(root)));

        let mut default_colormap = ColormapRecord::new(DEFAULT_COLORMAP, root_visual);
        default_colormap.installed = true;
        registry.insert_server(DEFAULT_COLORMAP, Resource::Colormap(Box::new(default_colormap)));

        let clients = ClientTable::new(config.output_high_water);
        let input = InputState::new(ROOT_WINDOW, config.motion_buffer_size as usize);

        info!(width = config.width, height = config.height, "server state initialised");
        Self {
            frontend,
            registry,
            atoms: AtomTable::new(),
            clients,
            input,
            xinput: XInputState::new(),
            selections: HashMap::new(),
            hosts: Vec::new(),
            access_control: false,
            screen_saver: ScreenSaverSettings::default(),
            keyboard_settings: KeyboardSettings::default(),
            pointer_settings: PointerSettings::default(),
            keymap: KeymapState::default(),
            font_path: Vec::new(),
            server_grab: None,
            root: ROOT_WINDOW,
            default_colormap: DEFAULT_COLORMAP,
            root_visual,
            started: Instant::now(),
            config,
        }
    }

    /// Server time: milliseconds since start, wrapping as the protocol's
    /// 32-bit timestamps do.
    pub fn now(&self) -> Timestamp {
        self.started.elapsed().as_millis() as Timestamp
    }

    pub fn setup_info(&self) -> SetupInfo {
        SetupInfo {
            release_number: self.config.release_number,
            resource_id_base: 0,
            resource_id_mask: RESOURCE_ID_MASK,
            motion_buffer_size: self.config.motion_buffer_size,
            maximum_request_length: self.config.maximum_request_length,
            vendor: self.config.vendor.clone(),
            image_byte_order_lsb: true,
            bitmap_bit_order_lsb: true,
            scanline_unit: 8,
            scanline_pad: 8,
            min_keycode: keymap::MIN_KEYCODE,
            max_keycode: keymap::MAX_KEYCODE,
            root: self.root,
            default_colormap: self.default_colormap,
            white_pixel: 0x00ff_ffff,
            black_pixel: 0,
            width_px: self.config.width,
            height_px: self.config.height,
            width_mm: self.config.width_mm,
            height_mm: self.config.height_mm,
            root_depth: 24,
            root_visual: self.root_visual,
        }
    }

    /// Deliver an event built per receiving client to every client whose
    /// selection on `window` intersects `mask`.
    pub fn fan_out(
        &mut self,
        window: WindowId,
        mask: EventMask,
        build: impl Fn(&ClientState) -> Event,
    ) {
        let selectors = match self.registry.window(window) {
            Ok(node) => node.selectors_of(mask),
            Err(_) => return,
        };
        for client in selectors {
            if let Some(state) = self.clients.get_mut(client) {
                let event = build(state);
                state.enqueue_event(&event, false);
            }
        }
    }

    /// Deliver a structure event: `StructureNotify` selectors on the
    /// window itself plus `SubstructureNotify` selectors on its parent.
    /// The builder receives the "event window" the delivery is for.
    pub fn structure_notify(
        &mut self,
        window: WindowId,
        build: impl Fn(&ClientState, WindowId) -> Event,
    ) {
        let parent = self.registry.window(window).map(|node| node.parent).unwrap_or(NONE);
        let self_selectors = self
            .registry
            .window(window)
            .map(|node| node.selectors_of(EventMask::STRUCTURE_NOTIFY))
            .unwrap_or_default();
        for client in self_selectors {
            if let Some(state) = self.clients.get_mut(client) {
                let event = build(state, window);
                state.enqueue_event(&event, false);
            }
        }
        if parent != NONE {
            let parent_selectors = self
                .registry
                .window(parent)
                .map(|node| node.selectors_of(EventMask::SUBSTRUCTURE_NOTIFY))
                .unwrap_or_default();
            for client in parent_selectors {
                if let Some(state) = self.clients.get_mut(client) {
                    let event = build(state, parent);
                    state.enqueue_event(&event, false);
                }
            }
        }
    }

    /// Unmap one window, emitting `UnmapNotify`.
    pub fn unmap_window(&mut self, window: WindowId, from_configure: bool) {
        let was_mapped = match self.registry.window_mut(window) {
            Ok(node) if node.mapped => {
                node.mapped = false;
                true
            }
            _ => false,
        };
        if !was_mapped {
            return;
        }
        self.frontend.unmap_window(window);
        self.structure_notify(window, move |client, event_window| Event::UnmapNotify {
            event: client.localize(event_window),
            window: client.localize(window),
            from_configure,
        });
    }

    /// Destroy `window` and its whole subtree, deepest first, releasing
    /// grabs, selections, and front-end resources along the way.
    pub fn destroy_window_cascade(&mut self, window: WindowId) {
        let mut victims = tree::descendants_post_order(&self.registry, window);
        victims.push(window);
        for victim in victims {
            if !self.registry.contains(victim) {
                continue;
            }
            self.unmap_window(victim, false);
            self.structure_notify(victim, move |client, event_window| Event::DestroyNotify {
                event: client.localize(event_window),
                window: client.localize(victim),
            });

            let parent = self.registry.window(victim).map(|node| node.parent).unwrap_or(NONE);
            if parent != NONE {
                if let Ok(parent_node) = self.registry.window_mut(parent) {
                    parent_node.children.retain(|child| *child != victim);
                }
            }

            self.input.forget_window(victim, self.root);
            self.xinput.forget_window(victim);
            self.selections.retain(|_, record| record.owner != victim);
            for client in self.clients.ids() {
                if let Some(state) = self.clients.get_mut(client) {
                    state.save_set.remove(&victim);
                }
            }
            self.registry.remove(victim);
            self.frontend.destroy_window(victim);
            debug!(window = victim, "window destroyed");
        }
    }

    /// Full client teardown: save-set rescue, cascade destruction of
    /// owned resources, grab and selection release.
    pub fn disconnect(&mut self, client: ClientId) {
        let Some(state) = self.clients.get(client) else {
            return;
        };
        let close_down = state.close_down;
        let save_set: Vec<WindowId> = state.save_set.iter().copied().collect();
        if close_down != CloseDownMode::Destroy {
            // Retain modes are recorded but not honoured; teardown always
            // destroys (documented divergence).
            debug!(client, ?close_down, "close-down mode ignored at teardown");
        }

        // Save-set: foreign windows the client asked to survive are
        // reparented to the root and remapped.
        for window in save_set {
            if !self.registry.contains(window) {
                continue;
            }
            let owner_is_me = self.registry.owner_of(window) == Some(client);
            if owner_is_me {
                continue;
            }
            self.reparent_to_root(window);
        }

        // Windows first, deepest trees included; the cascade handles
        // descendants owned by other clients through save-sets above.
        let owned = self.registry.take_client_ids(client);
        let mut windows: Vec<XId> = Vec::new();
        let mut others: Vec<XId> = Vec::new();
        for id in owned {
            match self.registry.get(id) {
                Some(Resource::Window(_)) => windows.push(id),
                Some(_) => others.push(id),
                None => {}
            }
        }
        for window in windows {
            if self.registry.contains(window) {
                self.destroy_window_cascade(window);
            }
        }
        for id in others {
            match self.registry.remove(id) {
                Some(Resource::Pixmap(_)) => self.frontend.free_pixmap(id),
                Some(Resource::GContext(_)) => self.frontend.free_gc(id),
                Some(Resource::Cursor(_)) => self.frontend.free_cursor(id),
                Some(Resource::Font(_)) => self.frontend.close_font(id),
                Some(Resource::Colormap(_)) | Some(Resource::Window(_)) | None => {}
            }
        }

        // Cell allocations the client made in colormaps it does not own
        // (the shared default map and other clients' maps alike).
        for colormap in self.registry.colormap_ids() {
            if let Ok(record) = self.registry.colormap_mut(colormap) {
                record.free_client(client);
            }
        }

        self.input.forget_client(client);
        self.xinput.forget_client(client);
        self.selections.retain(|_, record| record.client != client);
        if self.server_grab == Some(client) {
            self.server_grab = None;
        }
        self.clients.unregister(client);
        info!(client, "client disconnected, resources reclaimed");
    }

    fn reparent_to_root(&mut self, window: WindowId) {
        let root = self.root;
        let Ok(node) = self.registry.window_mut(window) else {
            return;
        };
        let old_parent = node.parent;
        if old_parent == root || old_parent == NONE {
            return;
        }
        node.parent = root;
        if let Ok(parent_node) = self.registry.window_mut(old_parent) {
            parent_node.children.retain(|child| *child != window);
        }
        if let Ok(root_node) = self.registry.window_mut(root) {
            root_node.children.push(window);
        }
        if let Ok(node) = self.registry.window_mut(window) {
            node.mapped = true;
        }
        self.frontend.map_window(window);
        debug!(window, "save-set window reparented to root");
    }

    /// KillClient: resolve the owning client of a resource id, reclaim
    /// its resources, and close its connection. The teardown runs here
    /// rather than on the victim's next request so an idle victim dies
    /// too. Returns false if the id resolves to nothing.
    pub fn kill_by_resource(&mut self, resource: XId) -> bool {
        let owner = match self.registry.owner_of(resource) {
            Some(owner) => Some(owner),
            // The prefix bits identify the client even for ids that were
            // never bound to a resource.
            None => {
                let prefix = resource >> RESOURCE_INDEX_BITS;
                self.clients.contains(prefix).then_some(prefix)
            }
        };
        match owner {
            Some(owner) => {
                if let Some(state) = self.clients.get_mut(owner) {
                    state.doomed = true;
                }
                self.disconnect(owner);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::RecordingFrontend;

    fn state() -> ServerState {
        ServerState::new(ServerConfig::default(), Arc::new(RecordingFrontend::new()))
    }

    #[test]
    fn root_window_and_colormap_exist() {
        let state = state();
        assert!(state.registry.window(ROOT_WINDOW).is_ok());
        assert!(state.registry.colormap(DEFAULT_COLORMAP).is_ok());
        assert!(state.registry.window(ROOT_WINDOW).unwrap().mapped);
    }

    #[test]
    fn setup_info_matches_contract() {
        let info = state().setup_info();
        assert_eq!(info.resource_id_base, 0);
        assert_eq!(info.resource_id_mask, 0x001f_ffff);
        assert_eq!(info.vendor, "sshterm");
        assert_eq!(info.motion_buffer_size, 256);
        assert_eq!(info.root_visual.red_mask, 0x00ff_0000);
    }

    #[test]
    fn destroy_cascade_removes_subtree() {
        let mut state = state();
        let (client, _rx, _credit) = state.clients.register(ByteOrder::LittleEndian).unwrap();
        let parent = crate::server::client::compose_id(client, 1);
        let child = crate::server::client::compose_id(client, 2);
        let mut parent_node = WindowNode::new(
            parent,
            ROOT_WINDOW,
            24,
            WindowClass::InputOutput,
            1,
            Rectangle { x: 0, y: 0, width: 10, height: 10 },
            0,
            DEFAULT_COLORMAP,
        );
        parent_node.children.push(child);
        state.registry.insert(client, parent, Resource::Window(Box::new(parent_node))).unwrap();
        let child_node = WindowNode::new(
            child,
            parent,
            24,
            WindowClass::InputOutput,
            1,
            Rectangle { x: 0, y: 0, width: 5, height: 5 },
            0,
            DEFAULT_COLORMAP,
        );
        state.registry.insert(client, child, Resource::Window(Box::new(child_node))).unwrap();
        state.registry.window_mut(ROOT_WINDOW).unwrap().children.push(parent);

        state.destroy_window_cascade(parent);
        assert!(!state.registry.contains(parent));
        assert!(!state.registry.contains(child));
        assert!(state.registry.window(ROOT_WINDOW).unwrap().children.is_empty());
    }

    #[test]
    fn disconnect_frees_allocations_in_foreign_colormaps() {
        let mut state = state();
        let (owner, _rx_owner, _c1) = state.clients.register(ByteOrder::LittleEndian).unwrap();
        let (guest, _rx_guest, _c2) = state.clients.register(ByteOrder::LittleEndian).unwrap();

        // A colormap owned by a client that stays connected.
        let cmap = crate::server::client::compose_id(owner, 1);
        let record = crate::color::colormap::ColormapRecord::new(cmap, state.root_visual);
        state.registry.insert(owner, cmap, Resource::Colormap(Box::new(record))).unwrap();

        state
            .registry
            .colormap_mut(cmap)
            .unwrap()
            .alloc_color(guest, 0x1000, 0x2000, 0x3000)
            .unwrap();
        state
            .registry
            .colormap_mut(DEFAULT_COLORMAP)
            .unwrap()
            .alloc_color(guest, 0x4000, 0x5000, 0x6000)
            .unwrap();

        state.disconnect(guest);

        // Both the foreign map and the default map are clean again.
        assert!(state.registry.colormap(cmap).is_ok());
        assert_eq!(state.registry.colormap(cmap).unwrap().allocation_count(), 0);
        assert_eq!(
            state.registry.colormap(DEFAULT_COLORMAP).unwrap().allocation_count(),
            0
        );
    }

    #[test]
    fn disconnect_reclaims_everything() {
        let mut state = state();
        let (client, _rx, _credit) = state.clients.register(ByteOrder::LittleEndian).unwrap();
        let window = crate::server::client::compose_id(client, 1);
        let node = WindowNode::new(
            window,
            ROOT_WINDOW,
            24,
            WindowClass::InputOutput,
            1,
            Rectangle { x: 0, y: 0, width: 10, height: 10 },
            0,
            DEFAULT_COLORMAP,
        );
        state.registry.insert(client, window, Resource::Window(Box::new(node))).unwrap();
        state.registry.window_mut(ROOT_WINDOW).unwrap().children.push(window);
        let pixmap = crate::server::client::compose_id(client, 2);
        state
            .registry
            .insert(
                client,
                pixmap,
                Resource::Pixmap(crate::resources::pixmap::PixmapRecord {
                    id: pixmap,
                    width: 4,
                    height: 4,
                    depth: 24,
                    origin_drawable: window,
                }),
            )
            .unwrap();
        let baseline = state.registry.counts();
        assert_eq!(baseline.windows, 2);
        assert_eq!(baseline.pixmaps, 1);

        state.disconnect(client);
        let counts = state.registry.counts();
        assert_eq!(counts.windows, 1); // the root
        assert_eq!(counts.pixmaps, 0);
        assert!(!state.clients.contains(client));
    }
}
