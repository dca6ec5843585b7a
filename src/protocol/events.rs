//! Server-to-client events and their fixed 32-byte wire form.
//!
//! Every event the core generates is a variant of [`Event`]; the encoder
//! stamps the destination client's current sequence number and byte order
//! at enqueue time. Events re-emitted by `SendEvent` are carried as the
//! opaque [`Event::Raw`] variant: the stored body bypasses re-encoding,
//! only the synthetic bit and the sequence field are patched.

use bytes::Bytes;

use super::types::*;
use super::wire::WireWriter;

pub mod codes {
    pub const KEY_PRESS: u8 = 2;
    pub const KEY_RELEASE: u8 = 3;
    pub const BUTTON_PRESS: u8 = 4;
    pub const BUTTON_RELEASE: u8 = 5;
    pub const MOTION_NOTIFY: u8 = 6;
    pub const ENTER_NOTIFY: u8 = 7;
    pub const LEAVE_NOTIFY: u8 = 8;
    pub const FOCUS_IN: u8 = 9;
    pub const FOCUS_OUT: u8 = 10;
    pub const KEYMAP_NOTIFY: u8 = 11;
    pub const EXPOSE: u8 = 12;
    pub const GRAPHICS_EXPOSURE: u8 = 13;
    pub const NO_EXPOSURE: u8 = 14;
    pub const VISIBILITY_NOTIFY: u8 = 15;
    pub const CREATE_NOTIFY: u8 = 16;
    pub const DESTROY_NOTIFY: u8 = 17;
    pub const UNMAP_NOTIFY: u8 = 18;
    pub const MAP_NOTIFY: u8 = 19;
    pub const MAP_REQUEST: u8 = 20;
    pub const REPARENT_NOTIFY: u8 = 21;
    pub const CONFIGURE_NOTIFY: u8 = 22;
    pub const CONFIGURE_REQUEST: u8 = 23;
    pub const GRAVITY_NOTIFY: u8 = 24;
    pub const RESIZE_REQUEST: u8 = 25;
    pub const CIRCULATE_NOTIFY: u8 = 26;
    pub const CIRCULATE_REQUEST: u8 = 27;
    pub const PROPERTY_NOTIFY: u8 = 28;
    pub const SELECTION_CLEAR: u8 = 29;
    pub const SELECTION_REQUEST: u8 = 30;
    pub const SELECTION_NOTIFY: u8 = 31;
    pub const COLORMAP_NOTIFY: u8 = 32;
    pub const CLIENT_MESSAGE: u8 = 33;
    pub const MAPPING_NOTIFY: u8 = 34;
}

/// Fields shared by the six core device events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEventBody {
    pub detail: u8,
    pub time: Timestamp,
    pub root: WindowId,
    pub event: WindowId,
    pub child: WindowId,
    pub root_x: i16,
    pub root_y: i16,
    pub event_x: i16,
    pub event_y: i16,
    pub state: KeyButMask,
    pub same_screen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    KeyPress(InputEventBody),
    KeyRelease(InputEventBody),
    ButtonPress(InputEventBody),
    ButtonRelease(InputEventBody),
    MotionNotify(InputEventBody),
    EnterNotify {
        detail: NotifyDetail,
        time: Timestamp,
        root: WindowId,
        event: WindowId,
        child: WindowId,
        root_x: i16,
        root_y: i16,
        event_x: i16,
        event_y: i16,
        state: KeyButMask,
        mode: NotifyMode,
        same_screen_focus: u8,
    },
    LeaveNotify {
        detail: NotifyDetail,
        time: Timestamp,
        root: WindowId,
        event: WindowId,
        child: WindowId,
        root_x: i16,
        root_y: i16,
        event_x: i16,
        event_y: i16,
        state: KeyButMask,
        mode: NotifyMode,
        same_screen_focus: u8,
    },
    FocusIn { detail: NotifyDetail, window: WindowId, mode: NotifyMode },
    FocusOut { detail: NotifyDetail, window: WindowId, mode: NotifyMode },
    KeymapNotify { keys: [u8; 31] },
    Expose { window: WindowId, x: u16, y: u16, width: u16, height: u16, count: u16 },
    GraphicsExposure {
        drawable: DrawableId,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        minor_opcode: u16,
        count: u16,
        major_opcode: u8,
    },
    NoExposure { drawable: DrawableId, minor_opcode: u16, major_opcode: u8 },
    VisibilityNotify { window: WindowId, state: u8 },
    CreateNotify {
        parent: WindowId,
        window: WindowId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        border_width: u16,
        override_redirect: bool,
    },
    DestroyNotify { event: WindowId, window: WindowId },
    UnmapNotify { event: WindowId, window: WindowId, from_configure: bool },
    MapNotify { event: WindowId, window: WindowId, override_redirect: bool },
    MapRequest { parent: WindowId, window: WindowId },
    ReparentNotify {
        event: WindowId,
        window: WindowId,
        parent: WindowId,
        x: i16,
        y: i16,
        override_redirect: bool,
    },
    ConfigureNotify {
        event: WindowId,
        window: WindowId,
        above_sibling: WindowId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        border_width: u16,
        override_redirect: bool,
    },
    ConfigureRequest {
        stack_mode: u8,
        parent: WindowId,
        window: WindowId,
        sibling: WindowId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        border_width: u16,
        value_mask: u16,
    },
    GravityNotify { event: WindowId, window: WindowId, x: i16, y: i16 },
    ResizeRequest { window: WindowId, width: u16, height: u16 },
    CirculateNotify { event: WindowId, window: WindowId, placed_on_top: bool },
    CirculateRequest { parent: WindowId, window: WindowId, placed_on_top: bool },
    PropertyNotify { window: WindowId, atom: Atom, time: Timestamp, deleted: bool },
    SelectionClear { time: Timestamp, owner: WindowId, selection: Atom },
    SelectionRequest {
        time: Timestamp,
        owner: WindowId,
        requestor: WindowId,
        selection: Atom,
        target: Atom,
        property: Atom,
    },
    SelectionNotify {
        time: Timestamp,
        requestor: WindowId,
        selection: Atom,
        target: Atom,
        property: Atom,
    },
    ColormapNotify { window: WindowId, colormap: ColormapId, is_new: bool, installed: bool },
    ClientMessage { format: u8, window: WindowId, message_type: Atom, data: [u8; 20] },
    MappingNotify { request: u8, first_keycode: KeyCode, count: u8 },
    /// A SendEvent body forwarded verbatim (synthetic bit and sequence
    /// patched at encode time).
    Raw([u8; 32]),
}

impl Event {
    pub fn code(&self) -> u8 {
        use codes::*;
        match self {
            Event::KeyPress(_) => KEY_PRESS,
            Event::KeyRelease(_) => KEY_RELEASE,
            Event::ButtonPress(_) => BUTTON_PRESS,
            Event::ButtonRelease(_) => BUTTON_RELEASE,
            Event::MotionNotify(_) => MOTION_NOTIFY,
            Event::EnterNotify { .. } => ENTER_NOTIFY,
            Event::LeaveNotify { .. } => LEAVE_NOTIFY,
            Event::FocusIn { .. } => FOCUS_IN,
            Event::FocusOut { .. } => FOCUS_OUT,
            Event::KeymapNotify { .. } => KEYMAP_NOTIFY,
            Event::Expose { .. } => EXPOSE,
            Event::GraphicsExposure { .. } => GRAPHICS_EXPOSURE,
            Event::NoExposure { .. } => NO_EXPOSURE,
            Event::VisibilityNotify { .. } => VISIBILITY_NOTIFY,
            Event::CreateNotify { .. } => CREATE_NOTIFY,
            Event::DestroyNotify { .. } => DESTROY_NOTIFY,
            Event::UnmapNotify { .. } => UNMAP_NOTIFY,
            Event::MapNotify { .. } => MAP_NOTIFY,
            Event::MapRequest { .. } => MAP_REQUEST,
            Event::ReparentNotify { .. } => REPARENT_NOTIFY,
            Event::ConfigureNotify { .. } => CONFIGURE_NOTIFY,
            Event::ConfigureRequest { .. } => CONFIGURE_REQUEST,
            Event::GravityNotify { .. } => GRAVITY_NOTIFY,
            Event::ResizeRequest { .. } => RESIZE_REQUEST,
            Event::CirculateNotify { .. } => CIRCULATE_NOTIFY,
            Event::CirculateRequest { .. } => CIRCULATE_REQUEST,
            Event::PropertyNotify { .. } => PROPERTY_NOTIFY,
            Event::SelectionClear { .. } => SELECTION_CLEAR,
            Event::SelectionRequest { .. } => SELECTION_REQUEST,
            Event::SelectionNotify { .. } => SELECTION_NOTIFY,
            Event::ColormapNotify { .. } => COLORMAP_NOTIFY,
            Event::ClientMessage { .. } => CLIENT_MESSAGE,
            Event::MappingNotify { .. } => MAPPING_NOTIFY,
            Event::Raw(body) => body[0] & 0x7f,
        }
    }

    /// The event mask bit that selects this event, where one exists.
    pub fn selecting_mask(&self) -> Option<EventMask> {
        match self {
            Event::KeyPress(_) => Some(EventMask::KEY_PRESS),
            Event::KeyRelease(_) => Some(EventMask::KEY_RELEASE),
            Event::ButtonPress(_) => Some(EventMask::BUTTON_PRESS),
            Event::ButtonRelease(_) => Some(EventMask::BUTTON_RELEASE),
            Event::MotionNotify(_) => Some(EventMask::POINTER_MOTION),
            Event::EnterNotify { .. } => Some(EventMask::ENTER_WINDOW),
            Event::LeaveNotify { .. } => Some(EventMask::LEAVE_WINDOW),
            Event::FocusIn { .. } | Event::FocusOut { .. } => Some(EventMask::FOCUS_CHANGE),
            Event::KeymapNotify { .. } => Some(EventMask::KEYMAP_STATE),
            Event::Expose { .. } => Some(EventMask::EXPOSURE),
            Event::VisibilityNotify { .. } => Some(EventMask::VISIBILITY_CHANGE),
            Event::PropertyNotify { .. } => Some(EventMask::PROPERTY_CHANGE),
            Event::ColormapNotify { .. } => Some(EventMask::COLORMAP_CHANGE),
            Event::ResizeRequest { .. } => Some(EventMask::RESIZE_REDIRECT),
            _ => None,
        }
    }

    /// Encode the 32-byte wire form with the destination's sequence.
    /// `synthetic` sets bit 7 of the code byte (SendEvent re-emission).
    pub fn encode(&self, sequence: SequenceNumber, order: ByteOrder, synthetic: bool) -> Bytes {
        if let Event::Raw(body) = self {
            let mut out = *body;
            out[0] |= 0x80;
            let seq = match order {
                ByteOrder::LittleEndian => sequence.to_le_bytes(),
                ByteOrder::BigEndian => sequence.to_be_bytes(),
            };
            out[2] = seq[0];
            out[3] = seq[1];
            return Bytes::copy_from_slice(&out);
        }

        let mut w = WireWriter::with_capacity(order, 32);
        let code = if synthetic { self.code() | 0x80 } else { self.code() };

        if let Event::KeymapNotify { keys } = self {
            // KeymapNotify is the one event without a sequence field.
            w.write_u8(code);
            w.write_bytes(keys);
            return w.into_bytes();
        }

        w.write_u8(code);
        match self {
            Event::KeyPress(body)
            | Event::KeyRelease(body)
            | Event::ButtonPress(body)
            | Event::ButtonRelease(body)
            | Event::MotionNotify(body) => {
                w.write_u8(body.detail);
                w.write_u16(sequence);
                w.write_u32(body.time);
                w.write_u32(body.root);
                w.write_u32(body.event);
                w.write_u32(body.child);
                w.write_i16(body.root_x);
                w.write_i16(body.root_y);
                w.write_i16(body.event_x);
                w.write_i16(body.event_y);
                w.write_u16(body.state.bits());
                w.write_bool(body.same_screen);
                w.write_zeros(1);
            }
            Event::EnterNotify {
                detail,
                time,
                root,
                event,
                child,
                root_x,
                root_y,
                event_x,
                event_y,
                state,
                mode,
                same_screen_focus,
            }
            | Event::LeaveNotify {
                detail,
                time,
                root,
                event,
                child,
                root_x,
                root_y,
                event_x,
                event_y,
                state,
                mode,
                same_screen_focus,
            } => {
                w.write_u8(*detail as u8);
                w.write_u16(sequence);
                w.write_u32(*time);
                w.write_u32(*root);
                w.write_u32(*event);
                w.write_u32(*child);
                w.write_i16(*root_x);
                w.write_i16(*root_y);
                w.write_i16(*event_x);
                w.write_i16(*event_y);
                w.write_u16(state.bits());
                w.write_u8(*mode as u8);
                w.write_u8(*same_screen_focus);
            }
            Event::FocusIn { detail, window, mode } | Event::FocusOut { detail, window, mode } => {
                w.write_u8(*detail as u8);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u8(*mode as u8);
                w.write_zeros(23);
            }
            Event::KeymapNotify { .. } => unreachable!("handled above"),
            Event::Expose { window, x, y, width, height, count } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u16(*x);
                w.write_u16(*y);
                w.write_u16(*width);
                w.write_u16(*height);
                w.write_u16(*count);
                w.write_zeros(14);
            }
            Event::GraphicsExposure {
                drawable,
                x,
                y,
                width,
                height,
                minor_opcode,
                count,
                major_opcode,
            } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*drawable);
                w.write_u16(*x);
                w.write_u16(*y);
                w.write_u16(*width);
                w.write_u16(*height);
                w.write_u16(*minor_opcode);
                w.write_u16(*count);
                w.write_u8(*major_opcode);
                w.write_zeros(11);
            }
            Event::NoExposure { drawable, minor_opcode, major_opcode } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*drawable);
                w.write_u16(*minor_opcode);
                w.write_u8(*major_opcode);
                w.write_zeros(21);
            }
            Event::VisibilityNotify { window, state } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u8(*state);
                w.write_zeros(23);
            }
            Event::CreateNotify {
                parent,
                window,
                x,
                y,
                width,
                height,
                border_width,
                override_redirect,
            } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*parent);
                w.write_u32(*window);
                w.write_i16(*x);
                w.write_i16(*y);
                w.write_u16(*width);
                w.write_u16(*height);
                w.write_u16(*border_width);
                w.write_bool(*override_redirect);
                w.write_zeros(9);
            }
            Event::DestroyNotify { event, window } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_zeros(20);
            }
            Event::UnmapNotify { event, window, from_configure } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_bool(*from_configure);
                w.write_zeros(19);
            }
            Event::MapNotify { event, window, override_redirect } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_bool(*override_redirect);
                w.write_zeros(19);
            }
            Event::MapRequest { parent, window } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*parent);
                w.write_u32(*window);
                w.write_zeros(20);
            }
            Event::ReparentNotify { event, window, parent, x, y, override_redirect } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_u32(*parent);
                w.write_i16(*x);
                w.write_i16(*y);
                w.write_bool(*override_redirect);
                w.write_zeros(11);
            }
            Event::ConfigureNotify {
                event,
                window,
                above_sibling,
                x,
                y,
                width,
                height,
                border_width,
                override_redirect,
            } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_u32(*above_sibling);
                w.write_i16(*x);
                w.write_i16(*y);
                w.write_u16(*width);
                w.write_u16(*height);
                w.write_u16(*border_width);
                w.write_bool(*override_redirect);
                w.write_zeros(5);
            }
            Event::ConfigureRequest {
                stack_mode,
                parent,
                window,
                sibling,
                x,
                y,
                width,
                height,
                border_width,
                value_mask,
            } => {
                w.write_u8(*stack_mode);
                w.write_u16(sequence);
                w.write_u32(*parent);
                w.write_u32(*window);
                w.write_u32(*sibling);
                w.write_i16(*x);
                w.write_i16(*y);
                w.write_u16(*width);
                w.write_u16(*height);
                w.write_u16(*border_width);
                w.write_u16(*value_mask);
                w.write_zeros(4);
            }
            Event::GravityNotify { event, window, x, y } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_i16(*x);
                w.write_i16(*y);
                w.write_zeros(16);
            }
            Event::ResizeRequest { window, width, height } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u16(*width);
                w.write_u16(*height);
                w.write_zeros(20);
            }
            Event::CirculateNotify { event, window, placed_on_top }
            | Event::CirculateRequest { parent: event, window, placed_on_top } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*event);
                w.write_u32(*window);
                w.write_u32(0);
                w.write_u8(if *placed_on_top { 0 } else { 1 });
                w.write_zeros(15);
            }
            Event::PropertyNotify { window, atom, time, deleted } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u32(*atom);
                w.write_u32(*time);
                w.write_u8(if *deleted { 1 } else { 0 });
                w.write_zeros(15);
            }
            Event::SelectionClear { time, owner, selection } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*time);
                w.write_u32(*owner);
                w.write_u32(*selection);
                w.write_zeros(16);
            }
            Event::SelectionRequest { time, owner, requestor, selection, target, property } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*time);
                w.write_u32(*owner);
                w.write_u32(*requestor);
                w.write_u32(*selection);
                w.write_u32(*target);
                w.write_u32(*property);
                w.write_zeros(4);
            }
            Event::SelectionNotify { time, requestor, selection, target, property } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*time);
                w.write_u32(*requestor);
                w.write_u32(*selection);
                w.write_u32(*target);
                w.write_u32(*property);
                w.write_zeros(8);
            }
            Event::ColormapNotify { window, colormap, is_new, installed } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u32(*colormap);
                w.write_bool(*is_new);
                w.write_u8(if *installed { 1 } else { 0 });
                w.write_zeros(18);
            }
            Event::ClientMessage { format, window, message_type, data } => {
                w.write_u8(*format);
                w.write_u16(sequence);
                w.write_u32(*window);
                w.write_u32(*message_type);
                w.write_bytes(data);
            }
            Event::MappingNotify { request, first_keycode, count } => {
                w.write_u8(0);
                w.write_u16(sequence);
                w.write_u8(*request);
                w.write_u8(*first_keycode);
                w.write_u8(*count);
                w.write_zeros(25);
            }
            Event::Raw(_) => unreachable!("handled above"),
        }
        debug_assert_eq!(w.len(), 32, "event {:?} must encode to 32 bytes", self.code());
        w.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_events_are_32_bytes() {
        let body = InputEventBody {
            detail: 38,
            time: 1000,
            root: 1,
            event: 2,
            child: 0,
            root_x: 10,
            root_y: 20,
            event_x: 10,
            event_y: 20,
            state: KeyButMask::SHIFT,
            same_screen: true,
        };
        let samples: Vec<Event> = vec![
            Event::KeyPress(body),
            Event::MotionNotify(body),
            Event::FocusIn { detail: NotifyDetail::Nonlinear, window: 2, mode: NotifyMode::Normal },
            Event::KeymapNotify { keys: [0; 31] },
            Event::Expose { window: 2, x: 0, y: 0, width: 800, height: 600, count: 0 },
            Event::ConfigureNotify {
                event: 2,
                window: 2,
                above_sibling: 0,
                x: 0,
                y: 0,
                width: 10,
                height: 10,
                border_width: 0,
                override_redirect: false,
            },
            Event::ClientMessage { format: 32, window: 2, message_type: 4, data: [0; 20] },
            Event::MappingNotify { request: 2, first_keycode: 8, count: 248 },
        ];
        for event in samples {
            for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
                assert_eq!(event.encode(9, order, false).len(), 32);
            }
        }
    }

    #[test]
    fn expose_layout() {
        let event = Event::Expose { window: 0x0010_0001, x: 0, y: 0, width: 800, height: 600, count: 0 };
        let bytes = event.encode(3, ByteOrder::LittleEndian, false);
        assert_eq!(bytes[0], codes::EXPOSE);
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 3);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 0x0010_0001);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), 800);
        assert_eq!(u16::from_le_bytes([bytes[14], bytes[15]]), 600);
    }

    #[test]
    fn key_press_layout() {
        let event = Event::KeyPress(InputEventBody {
            detail: 38,
            time: 0x1234,
            root: 1,
            event: 0x0040_0001,
            child: 0,
            root_x: 100,
            root_y: 50,
            event_x: 90,
            event_y: 40,
            state: KeyButMask::CONTROL,
            same_screen: true,
        });
        let bytes = event.encode(7, ByteOrder::LittleEndian, false);
        assert_eq!(bytes[0], codes::KEY_PRESS);
        assert_eq!(bytes[1], 38);
        assert_eq!(u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]), 0x0040_0001);
        assert_eq!(u16::from_le_bytes([bytes[28], bytes[29]]), KeyButMask::CONTROL.bits());
        assert_eq!(bytes[30], 1);
    }

    #[test]
    fn synthetic_bit_set_for_send_event() {
        let event = Event::Expose { window: 2, x: 0, y: 0, width: 1, height: 1, count: 0 };
        let bytes = event.encode(1, ByteOrder::LittleEndian, true);
        assert_eq!(bytes[0], codes::EXPOSE | 0x80);
    }

    #[test]
    fn raw_event_patches_sequence_and_bit7() {
        let mut raw = [0u8; 32];
        raw[0] = codes::CLIENT_MESSAGE;
        raw[4] = 0xaa; // untouched payload byte
        let bytes = Event::Raw(raw).encode(0x0102, ByteOrder::BigEndian, true);
        assert_eq!(bytes[0], codes::CLIENT_MESSAGE | 0x80);
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x02);
        assert_eq!(bytes[4], 0xaa);
    }

    #[test]
    fn keymap_notify_has_no_sequence() {
        let mut keys = [0u8; 31];
        keys[0] = 0xff;
        let bytes = Event::KeymapNotify { keys }.encode(0xffff, ByteOrder::LittleEndian, false);
        assert_eq!(bytes[0], codes::KEYMAP_NOTIFY);
        assert_eq!(bytes[1], 0xff);
    }
}
