//! The input routing engine.
//!
//! Physical events from the front-end turn into logical events on zero or
//! more client queues. Routing order for every input: device grab first
//! (the grabber preempts core delivery entirely), then the active core
//! grab, then passive grab activation, then normal propagation up the
//! ancestor chain honouring per-window do-not-propagate masks.

use tracing::{debug, trace};

use crate::input::grabs::{ActiveGrab, InputKind, PassiveGrab, PhysicalInput};
use crate::protocol::events::{Event, InputEventBody};
use crate::protocol::types::*;
use crate::protocol::xinput::{class_masks, event_offsets, DeviceEvent};
use crate::server::state::ServerState;
use crate::window::tree;
use crate::xinput::{KEYBOARD_DEVICE, POINTER_DEVICE};

/// Event-mask bits that select a MotionNotify given the button state.
fn motion_masks(buttons: KeyButMask) -> EventMask {
    let mut masks = EventMask::POINTER_MOTION | EventMask::POINTER_MOTION_HINT;
    if buttons.intersects(
        KeyButMask::BUTTON1
            | KeyButMask::BUTTON2
            | KeyButMask::BUTTON3
            | KeyButMask::BUTTON4
            | KeyButMask::BUTTON5,
    ) {
        masks |= EventMask::BUTTON_MOTION;
    }
    if buttons.contains(KeyButMask::BUTTON1) {
        masks |= EventMask::BUTTON1_MOTION;
    }
    if buttons.contains(KeyButMask::BUTTON2) {
        masks |= EventMask::BUTTON2_MOTION;
    }
    if buttons.contains(KeyButMask::BUTTON3) {
        masks |= EventMask::BUTTON3_MOTION;
    }
    if buttons.contains(KeyButMask::BUTTON4) {
        masks |= EventMask::BUTTON4_MOTION;
    }
    if buttons.contains(KeyButMask::BUTTON5) {
        masks |= EventMask::BUTTON5_MOTION;
    }
    masks
}

fn selecting_mask(kind: InputKind) -> EventMask {
    match kind {
        InputKind::KeyPress => EventMask::KEY_PRESS,
        InputKind::KeyRelease => EventMask::KEY_RELEASE,
        InputKind::ButtonPress => EventMask::BUTTON_PRESS,
        InputKind::ButtonRelease => EventMask::BUTTON_RELEASE,
        InputKind::Motion => EventMask::POINTER_MOTION,
    }
}

fn xi_class_mask(kind: InputKind) -> u32 {
    match kind {
        InputKind::KeyPress => class_masks::DEVICE_KEY_PRESS,
        InputKind::KeyRelease => class_masks::DEVICE_KEY_RELEASE,
        InputKind::ButtonPress => class_masks::DEVICE_BUTTON_PRESS,
        InputKind::ButtonRelease => class_masks::DEVICE_BUTTON_RELEASE,
        InputKind::Motion => class_masks::DEVICE_MOTION_NOTIFY,
    }
}

fn xi_event_code(kind: InputKind) -> u8 {
    let offset = match kind {
        InputKind::KeyPress => event_offsets::DEVICE_KEY_PRESS,
        InputKind::KeyRelease => event_offsets::DEVICE_KEY_RELEASE,
        InputKind::ButtonPress => event_offsets::DEVICE_BUTTON_PRESS,
        InputKind::ButtonRelease => event_offsets::DEVICE_BUTTON_RELEASE,
        InputKind::Motion => event_offsets::DEVICE_MOTION_NOTIFY,
    };
    crate::xinput::FIRST_EVENT + offset
}

fn core_event(kind: InputKind, body: InputEventBody) -> Event {
    match kind {
        InputKind::KeyPress => Event::KeyPress(body),
        InputKind::KeyRelease => Event::KeyRelease(body),
        InputKind::ButtonPress => Event::ButtonPress(body),
        InputKind::ButtonRelease => Event::ButtonRelease(body),
        InputKind::Motion => Event::MotionNotify(body),
    }
}

fn button_bit(button: Button) -> KeyButMask {
    match button {
        1 => KeyButMask::BUTTON1,
        2 => KeyButMask::BUTTON2,
        3 => KeyButMask::BUTTON3,
        4 => KeyButMask::BUTTON4,
        5 => KeyButMask::BUTTON5,
        _ => KeyButMask::empty(),
    }
}

impl ServerState {
    /// A physical key transition from the front-end.
    pub fn route_key(&mut self, pressed: bool, keycode: KeyCode, modifiers: KeyButMask) {
        let kind = if pressed { InputKind::KeyPress } else { InputKind::KeyRelease };
        self.input.note_key(keycode, pressed);
        let buttons = self.input.pointer.state
            & (KeyButMask::BUTTON1
                | KeyButMask::BUTTON2
                | KeyButMask::BUTTON3
                | KeyButMask::BUTTON4
                | KeyButMask::BUTTON5);
        self.input.pointer.state = modifiers | buttons;
        let input = PhysicalInput {
            kind,
            detail: keycode,
            root_x: self.input.pointer.root_x,
            root_y: self.input.pointer.root_y,
            state: self.input.pointer.state,
            time: self.now(),
        };
        trace!(?kind, keycode, "physical key input");

        if self.route_through_device_grab(KEYBOARD_DEVICE, input) {
            return;
        }

        // The natural target chain starts at the focus window, with
        // PointerRoot focus following the pointer.
        let event_window = match self.input.focus.window {
            NONE => NONE,
            POINTER_ROOT => self.input.pointer.window,
            window => window,
        };

        if self.input.keyboard_grab.active.is_some() {
            self.deliver_through_keyboard_grab(input, event_window);
        } else if event_window == NONE {
            return;
        } else {
            // Passive key grabs activate on press only.
            if pressed {
                let chain = tree::ancestor_chain(&self.registry, event_window);
                let matched = self
                    .input
                    .keyboard_grab
                    .matching_passive(&chain, keycode, modifiers)
                    .cloned();
                if let Some(entry) = matched {
                    self.activate_passive_keyboard_grab(&entry, input, event_window);
                    self.deliver_xinput_selections(KEYBOARD_DEVICE, input, event_window);
                    return;
                }
            }
            self.propagate_core_input(input, event_window);
        }
        self.deliver_xinput_selections(KEYBOARD_DEVICE, input, event_window);
    }

    /// A physical button transition from the front-end.
    pub fn route_button(&mut self, pressed: bool, button: Button) {
        let kind = if pressed { InputKind::ButtonPress } else { InputKind::ButtonRelease };
        if pressed {
            self.input.pointer.state |= button_bit(button);
        } else {
            self.input.pointer.state &= !button_bit(button);
        }
        let input = PhysicalInput {
            kind,
            detail: button,
            root_x: self.input.pointer.root_x,
            root_y: self.input.pointer.root_y,
            state: self.input.pointer.state,
            time: self.now(),
        };
        let event_window = self.input.pointer.window;
        trace!(?kind, button, window = event_window, "physical button input");

        if self.route_through_device_grab(POINTER_DEVICE, input) {
            return;
        }

        if self.input.pointer_grab.active.is_some() {
            self.deliver_through_pointer_grab(input);
        } else if pressed {
            let chain = tree::ancestor_chain(&self.registry, event_window);
            let matched = self
                .input
                .pointer_grab
                .matching_passive(&chain, button, self.input.pointer.state)
                .cloned();
            if let Some(entry) = matched {
                self.activate_passive_pointer_grab(&entry, input);
            } else {
                self.propagate_core_input(input, event_window);
            }
        } else {
            self.propagate_core_input(input, event_window);
        }
        self.deliver_xinput_selections(POINTER_DEVICE, input, event_window);
    }

    /// A pointer movement to root coordinates.
    pub fn route_motion(&mut self, root_x: i16, root_y: i16) {
        let time = self.now();
        self.input.pointer.root_x = root_x;
        self.input.pointer.root_y = root_y;
        let new_window = tree::hit_test(&self.registry, self.root, root_x, root_y);
        let old_window = self.input.pointer.window;
        if new_window != old_window {
            self.emit_crossing(old_window, new_window, NotifyMode::Normal);
            self.input.pointer.window = new_window;
        }
        self.input.motion.record(time, root_x, root_y, new_window);

        let input = PhysicalInput {
            kind: InputKind::Motion,
            detail: 0,
            root_x,
            root_y,
            state: self.input.pointer.state,
            time,
        };
        if self.route_through_device_grab(POINTER_DEVICE, input) {
            return;
        }
        if self.input.pointer_grab.active.is_some() {
            self.deliver_through_pointer_grab(input);
        } else {
            self.propagate_core_input(input, new_window);
        }
        self.deliver_xinput_selections(POINTER_DEVICE, input, new_window);
    }

    /// WarpPointer and front-end position sync share this entry point.
    pub fn move_pointer_to(&mut self, root_x: i16, root_y: i16) {
        self.route_motion(root_x, root_y);
    }

    /// Resolve where a keyboard event starts: the active grab window,
    /// else the focus (PointerRoot focus follows the pointer).
    fn keyboard_event_window(&self) -> WindowId {
        if let Some(grab) = &self.input.keyboard_grab.active {
            return grab.window;
        }
        match self.input.focus.window {
            NONE => NONE,
            POINTER_ROOT => self.input.pointer.window,
            window => window,
        }
    }

    /// Deliver through a held device grab. Returns true when the input
    /// was consumed (core routing must stay silent).
    fn route_through_device_grab(&mut self, device: DeviceId, input: PhysicalInput) -> bool {
        let pointer_device = device == POINTER_DEVICE;
        let Some(grab) = self.xinput.grabs.get_mut(&device).and_then(|set| set.active.as_mut())
        else {
            return false;
        };
        if grab.frozen {
            grab.queue.push_back(input);
            return true;
        }
        let client = grab.client;
        let window = grab.window;
        let wants = (grab.xi_mask & xi_class_mask(input.kind)) != 0;
        let freeze_after = grab.freezes(pointer_device);
        if freeze_after {
            grab.frozen = true;
        }
        if wants {
            self.deliver_device_event_to(client, device, input, window);
        }
        true
    }

    fn deliver_device_event_to(
        &mut self,
        client: ClientId,
        device: DeviceId,
        input: PhysicalInput,
        window: WindowId,
    ) {
        let (event_x, event_y) =
            tree::root_to_window(&self.registry, window, input.root_x, input.root_y);
        let child = self.child_toward(window, self.input.pointer.window);
        if let Some(state) = self.clients.get_mut(client) {
            let event = DeviceEvent {
                code: xi_event_code(input.kind),
                detail: input.detail,
                time: input.time,
                root: state.localize(self.root),
                event: state.localize(window),
                child: state.localize(child),
                root_x: input.root_x,
                root_y: input.root_y,
                event_x,
                event_y,
                state: input.state,
                same_screen: true,
                device,
            };
            state.enqueue_device_event(&event);
        }
    }

    /// Extension selections fire independently of core routing whenever
    /// no device grab preempted the input.
    fn deliver_xinput_selections(
        &mut self,
        device: DeviceId,
        input: PhysicalInput,
        window: WindowId,
    ) {
        if window == NONE {
            return;
        }
        let mask = xi_class_mask(input.kind);
        for client in self.xinput.selectors_of(window, device, mask) {
            self.deliver_device_event_to(client, device, input, window);
        }
    }

    /// Normal delivery: walk the ancestor chain from `start`, deliver to
    /// every client selecting the event at the first window that has any
    /// selector, honouring do-not-propagate masks on the way up.
    fn propagate_core_input(&mut self, input: PhysicalInput, start: WindowId) {
        let mask = match input.kind {
            InputKind::Motion => motion_masks(input.state),
            kind => selecting_mask(kind),
        };
        let mut current = start;
        while current != NONE {
            let Ok(node) = self.registry.window(current) else {
                return;
            };
            let selectors = node.selectors_of(mask);
            let parent = node.parent;
            let blocks = node.do_not_propagate.intersects(selecting_mask(input.kind));
            if !selectors.is_empty() {
                self.deliver_core_event(&selectors, input, current);
                return;
            }
            if blocks {
                debug!(window = current, "do-not-propagate stops event");
                return;
            }
            current = parent;
        }
    }

    fn deliver_core_event(&mut self, clients: &[ClientId], input: PhysicalInput, window: WindowId) {
        let (event_x, event_y) =
            tree::root_to_window(&self.registry, window, input.root_x, input.root_y);
        let child = self.child_toward(window, self.input.pointer.window);
        let root = self.root;
        for &client in clients {
            if let Some(state) = self.clients.get_mut(client) {
                let body = InputEventBody {
                    detail: input.detail,
                    time: input.time,
                    root: state.localize(root),
                    event: state.localize(window),
                    child: state.localize(child),
                    root_x: input.root_x,
                    root_y: input.root_y,
                    event_x,
                    event_y,
                    state: input.state,
                    same_screen: true,
                };
                state.enqueue_event(&core_event(input.kind, body), false);
            }
        }
    }

    /// The direct child of `ancestor` that leads toward `descendant`.
    fn child_toward(&self, ancestor: WindowId, descendant: WindowId) -> WindowId {
        if ancestor == descendant {
            return NONE;
        }
        let mut current = descendant;
        while let Ok(node) = self.registry.window(current) {
            if node.parent == ancestor {
                return current;
            }
            if node.parent == NONE {
                return NONE;
            }
            current = node.parent;
        }
        NONE
    }

    fn activate_passive_keyboard_grab(
        &mut self,
        entry: &PassiveGrab,
        input: PhysicalInput,
        event_window: WindowId,
    ) {
        debug!(client = entry.client, window = entry.window, key = input.detail, "passive key grab activates");
        let grab = ActiveGrab {
            client: entry.client,
            window: entry.window,
            owner_events: entry.owner_events,
            event_mask: entry.event_mask,
            pointer_mode: entry.pointer_mode,
            keyboard_mode: entry.keyboard_mode,
            confine_to: entry.confine_to,
            cursor: entry.cursor,
            since: input.time,
            from_passive: true,
            frozen: false,
            queue: Default::default(),
            xi_mask: 0,
        };
        let frozen = grab.keyboard_mode == GrabMode::Sync;
        self.input.keyboard_grab.active = Some(grab);
        self.emit_focus_change(event_window, entry.window, NotifyMode::Grab);
        // Deliver the triggering press to the grabber only.
        self.deliver_through_keyboard_grab(input, event_window);
        if frozen {
            if let Some(active) = self.input.keyboard_grab.active.as_mut() {
                active.frozen = true;
            }
        }
    }

    fn activate_passive_pointer_grab(&mut self, entry: &PassiveGrab, input: PhysicalInput) {
        debug!(client = entry.client, window = entry.window, button = input.detail, "passive button grab activates");
        let grab = ActiveGrab {
            client: entry.client,
            window: entry.window,
            owner_events: entry.owner_events,
            event_mask: entry.event_mask,
            pointer_mode: entry.pointer_mode,
            keyboard_mode: entry.keyboard_mode,
            confine_to: entry.confine_to,
            cursor: entry.cursor,
            since: input.time,
            from_passive: true,
            frozen: false,
            queue: Default::default(),
            xi_mask: 0,
        };
        let frozen = grab.pointer_mode == GrabMode::Sync;
        let grab_window = grab.window;
        let pointer_window = self.input.pointer.window;
        self.input.pointer_grab.active = Some(grab);
        if pointer_window != grab_window {
            self.emit_crossing(pointer_window, grab_window, NotifyMode::Grab);
        }
        self.deliver_through_pointer_grab(input);
        if frozen {
            if let Some(active) = self.input.pointer_grab.active.as_mut() {
                active.frozen = true;
            }
        }
    }

    /// Delivery under an active keyboard grab: owner-events may route to
    /// the natural target when the grabber selected there; otherwise the
    /// grab window receives the event unconditionally (key grabs carry
    /// no event mask).
    fn deliver_through_keyboard_grab(&mut self, input: PhysicalInput, natural_start: WindowId) {
        let Some(grab) = self.input.keyboard_grab.active.clone() else {
            return;
        };
        if grab.frozen {
            if let Some(active) = self.input.keyboard_grab.active.as_mut() {
                active.queue.push_back(input);
            }
            return;
        }
        let target = if grab.owner_events {
            self.natural_target_for(grab.client, input.kind, natural_start)
                .unwrap_or(grab.window)
        } else {
            grab.window
        };
        self.deliver_core_event(&[grab.client], input, target);
    }

    /// Delivery under an active pointer grab, filtered by the grab's
    /// event mask.
    fn deliver_through_pointer_grab(&mut self, input: PhysicalInput) {
        let Some(grab) = self.input.pointer_grab.active.clone() else {
            return;
        };
        if grab.frozen {
            if let Some(active) = self.input.pointer_grab.active.as_mut() {
                active.queue.push_back(input);
            }
            return;
        }
        let wanted = match input.kind {
            InputKind::Motion => grab.event_mask.intersects(motion_masks(input.state)),
            kind => grab.event_mask.intersects(selecting_mask(kind)),
        };
        if wanted {
            let target = if grab.owner_events {
                self.natural_target_for(grab.client, input.kind, self.input.pointer.window)
                    .unwrap_or(grab.window)
            } else {
                grab.window
            };
            self.deliver_core_event(&[grab.client], input, target);
        }

        // A passively activated grab dissolves when the last button goes
        // up.
        if input.kind == InputKind::ButtonRelease && grab.from_passive {
            let buttons_down = input.state.intersects(
                KeyButMask::BUTTON1
                    | KeyButMask::BUTTON2
                    | KeyButMask::BUTTON3
                    | KeyButMask::BUTTON4
                    | KeyButMask::BUTTON5,
            );
            if !buttons_down {
                let grab_window = grab.window;
                self.input.pointer_grab.active = None;
                let pointer_window = self.input.pointer.window;
                if pointer_window != grab_window {
                    self.emit_crossing(grab_window, pointer_window, NotifyMode::Ungrab);
                }
                debug!("passive pointer grab released");
            }
        }
    }

    /// First window in the chain from `start` where `client` selected
    /// this event kind.
    fn natural_target_for(
        &self,
        client: ClientId,
        kind: InputKind,
        start: WindowId,
    ) -> Option<WindowId> {
        let mask = selecting_mask(kind);
        let mut current = start;
        while current != NONE {
            let node = self.registry.window(current).ok()?;
            if node.event_masks.get(&client).is_some_and(|selected| selected.intersects(mask)) {
                return Some(current);
            }
            if node.do_not_propagate.intersects(mask) {
                return None;
            }
            current = node.parent;
        }
        None
    }

    /// AllowEvents from `client`: thaw, replay, or re-arm the frozen
    /// grabs it holds.
    pub fn apply_allow_events(&mut self, client: ClientId, mode: AllowEventsMode) {
        use AllowEventsMode::*;
        match mode {
            AsyncPointer | SyncPointer | ReplayPointer => {
                self.allow_pointer(client, mode);
            }
            AsyncKeyboard | SyncKeyboard | ReplayKeyboard => {
                self.allow_keyboard(client, mode);
            }
            AsyncBoth | SyncBoth => {
                self.allow_pointer(client, mode);
                self.allow_keyboard(client, mode);
            }
        }
    }

    fn allow_pointer(&mut self, client: ClientId, mode: AllowEventsMode) {
        let Some(grab) = self.input.pointer_grab.active.as_mut() else {
            return;
        };
        if grab.client != client {
            return;
        }
        match mode {
            AllowEventsMode::ReplayPointer => {
                // Drop the grab and re-route the queue as if it had never
                // activated.
                let queue = std::mem::take(&mut grab.queue);
                self.input.pointer_grab.active = None;
                for input in queue {
                    let window = tree::hit_test(&self.registry, self.root, input.root_x, input.root_y);
                    self.propagate_core_input(input, window);
                }
            }
            AllowEventsMode::AsyncPointer | AllowEventsMode::AsyncBoth => {
                grab.frozen = false;
                let queue = std::mem::take(&mut grab.queue);
                for input in queue {
                    self.deliver_through_pointer_grab(input);
                }
            }
            AllowEventsMode::SyncPointer | AllowEventsMode::SyncBoth => {
                grab.frozen = false;
                let queue = std::mem::take(&mut grab.queue);
                for input in queue {
                    self.deliver_through_pointer_grab(input);
                }
                if let Some(active) = self.input.pointer_grab.active.as_mut() {
                    active.frozen = true;
                }
            }
            _ => {}
        }
    }

    fn allow_keyboard(&mut self, client: ClientId, mode: AllowEventsMode) {
        let Some(grab) = self.input.keyboard_grab.active.as_mut() else {
            return;
        };
        if grab.client != client {
            return;
        }
        match mode {
            AllowEventsMode::ReplayKeyboard => {
                let queue = std::mem::take(&mut grab.queue);
                self.input.keyboard_grab.active = None;
                for input in queue {
                    let window = self.keyboard_event_window();
                    if window != NONE {
                        self.propagate_core_input(input, window);
                    }
                }
            }
            AllowEventsMode::AsyncKeyboard | AllowEventsMode::AsyncBoth => {
                grab.frozen = false;
                let queue = std::mem::take(&mut grab.queue);
                let window = self.keyboard_event_window();
                for input in queue {
                    self.deliver_through_keyboard_grab(input, window);
                }
            }
            AllowEventsMode::SyncKeyboard | AllowEventsMode::SyncBoth => {
                grab.frozen = false;
                let queue = std::mem::take(&mut grab.queue);
                let window = self.keyboard_event_window();
                for input in queue {
                    self.deliver_through_keyboard_grab(input, window);
                }
                if let Some(active) = self.input.keyboard_grab.active.as_mut() {
                    active.frozen = true;
                }
            }
            _ => {}
        }
    }

    /// Crossing events for a pointer transition `from → to`, with
    /// virtual events on the intermediate windows.
    pub fn emit_crossing(&mut self, from: WindowId, to: WindowId, mode: NotifyMode) {
        if from == to || from == NONE || to == NONE {
            return;
        }
        let from_is_ancestor = tree::is_ancestor(&self.registry, from, to);
        let to_is_ancestor = tree::is_ancestor(&self.registry, to, from);

        let (leave_detail, enter_detail) = if from_is_ancestor {
            (NotifyDetail::Inferior, NotifyDetail::Ancestor)
        } else if to_is_ancestor {
            (NotifyDetail::Ancestor, NotifyDetail::Inferior)
        } else {
            (NotifyDetail::Nonlinear, NotifyDetail::Nonlinear)
        };

        self.send_crossing(false, from, leave_detail, mode);

        // Virtual events on windows strictly between the two endpoints.
        let virtual_detail = if from_is_ancestor || to_is_ancestor {
            NotifyDetail::Virtual
        } else {
            NotifyDetail::NonlinearVirtual
        };
        for window in self.between_windows(from, to) {
            self.send_crossing(false, window, virtual_detail, mode);
            self.send_crossing(true, window, virtual_detail, mode);
        }

        self.send_crossing(true, to, enter_detail, mode);
    }

    /// Windows strictly between `from` and `to` through their closest
    /// common ancestor, excluding the ancestor itself.
    fn between_windows(&self, from: WindowId, to: WindowId) -> Vec<WindowId> {
        let up = tree::ancestor_chain(&self.registry, from);
        let down = tree::ancestor_chain(&self.registry, to);
        let common = up.iter().find(|window| down.contains(window)).copied();
        let Some(common) = common else {
            return Vec::new();
        };
        let mut between: Vec<WindowId> = up
            .iter()
            .skip(1)
            .take_while(|window| **window != common)
            .copied()
            .collect();
        let downward: Vec<WindowId> = down
            .iter()
            .skip(1)
            .take_while(|window| **window != common)
            .copied()
            .collect();
        between.extend(downward.into_iter().rev());
        between
    }

    fn send_crossing(&mut self, enter: bool, window: WindowId, detail: NotifyDetail, mode: NotifyMode) {
        let mask = if enter { EventMask::ENTER_WINDOW } else { EventMask::LEAVE_WINDOW };
        let (root_x, root_y) = (self.input.pointer.root_x, self.input.pointer.root_y);
        let (event_x, event_y) = tree::root_to_window(&self.registry, window, root_x, root_y);
        let child = self.child_toward(window, self.input.pointer.window);
        let state_mask = self.input.pointer.state;
        let time = self.now();
        let root = self.root;
        self.fan_out(window, mask, |client| {
            let fields = (
                client.localize(root),
                client.localize(window),
                client.localize(child),
            );
            if enter {
                Event::EnterNotify {
                    detail,
                    time,
                    root: fields.0,
                    event: fields.1,
                    child: fields.2,
                    root_x,
                    root_y,
                    event_x,
                    event_y,
                    state: state_mask,
                    mode,
                    same_screen_focus: 0x02,
                }
            } else {
                Event::LeaveNotify {
                    detail,
                    time,
                    root: fields.0,
                    event: fields.1,
                    child: fields.2,
                    root_x,
                    root_y,
                    event_x,
                    event_y,
                    state: state_mask,
                    mode,
                    same_screen_focus: 0x02,
                }
            }
        });
    }

    /// Focus transition events plus the KeymapNotify follow-up.
    pub fn emit_focus_change(&mut self, from: WindowId, to: WindowId, mode: NotifyMode) {
        if from == to {
            return;
        }
        let real = |window: WindowId| window != NONE && window != POINTER_ROOT;
        let (out_detail, in_detail) = if real(from) && real(to) {
            if tree::is_ancestor(&self.registry, from, to) {
                (NotifyDetail::Inferior, NotifyDetail::Ancestor)
            } else if tree::is_ancestor(&self.registry, to, from) {
                (NotifyDetail::Ancestor, NotifyDetail::Inferior)
            } else {
                (NotifyDetail::Nonlinear, NotifyDetail::Nonlinear)
            }
        } else {
            (NotifyDetail::Nonlinear, NotifyDetail::Nonlinear)
        };

        if real(from) {
            self.fan_out(from, EventMask::FOCUS_CHANGE, |client| Event::FocusOut {
                detail: out_detail,
                window: client.localize(from),
                mode,
            });
        }
        if real(to) {
            self.fan_out(to, EventMask::FOCUS_CHANGE, |client| Event::FocusIn {
                detail: in_detail,
                window: client.localize(to),
                mode,
            });
            let keys = self.input.keys_down;
            let mut keymap = [0u8; 31];
            keymap.copy_from_slice(&keys[1..32]);
            self.fan_out(to, EventMask::KEYMAP_STATE, move |_client| Event::KeymapNotify {
                keys: keymap,
            });
        }
    }

    /// SetInputFocus entry point shared by the handler and teardown.
    pub fn set_focus(&mut self, window: WindowId, revert_to: RevertTo, time: Timestamp) {
        let old = self.input.focus.window;
        self.input.focus = crate::input::FocusState { window, revert_to, since: time };
        self.emit_focus_change(old, window, NotifyMode::Normal);
        debug!(old, new = window, "focus changed");
    }
}
