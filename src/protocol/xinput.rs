//! Wire codec for the XInput 1.x/2.x extension (major opcode 131).
//!
//! Sub-opcode dispatch lives here: the core request decoder hands the body
//! reader over once it has seen the extension major opcode. Device events
//! carry the device id in the trailing byte of the 32-byte form; XInput 1
//! event classes pack `(mask << 8) | device` into one 32-bit word.

use bytes::Bytes;

use super::errors::XError;
use super::types::*;
use super::wire::{WireReader, WireWriter};

/// Event code offsets from the extension's first-event base.
pub mod event_offsets {
    pub const DEVICE_VALUATOR: u8 = 0;
    pub const DEVICE_KEY_PRESS: u8 = 1;
    pub const DEVICE_KEY_RELEASE: u8 = 2;
    pub const DEVICE_BUTTON_PRESS: u8 = 3;
    pub const DEVICE_BUTTON_RELEASE: u8 = 4;
    pub const DEVICE_MOTION_NOTIFY: u8 = 5;
    pub const DEVICE_FOCUS_IN: u8 = 6;
    pub const DEVICE_FOCUS_OUT: u8 = 7;
    pub const DEVICE_STATE_NOTIFY: u8 = 10;
    pub const DEVICE_MAPPING_NOTIFY: u8 = 11;
}

/// Bits of an XInput 1 class mask (the high 24 bits of a class word).
pub mod class_masks {
    pub const DEVICE_KEY_PRESS: u32 = 0x0000_0001;
    pub const DEVICE_KEY_RELEASE: u32 = 0x0000_0002;
    pub const DEVICE_BUTTON_PRESS: u32 = 0x0000_0004;
    pub const DEVICE_BUTTON_RELEASE: u32 = 0x0000_0008;
    pub const DEVICE_MOTION_NOTIFY: u32 = 0x0000_0010;
    pub const DEVICE_FOCUS_CHANGE: u32 = 0x0000_0020;
    pub const DEVICE_STATE_NOTIFY: u32 = 0x0000_0040;
}

/// One event-class word: `(mask << 8) | device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventClass {
    pub device: DeviceId,
    pub mask: u32,
}

impl EventClass {
    pub fn from_word(word: u32) -> Self {
        Self { device: (word & 0xff) as DeviceId, mask: word >> 8 }
    }

    pub fn to_word(self) -> u32 {
        (self.mask << 8) | self.device as u32
    }
}

/// XInput 2 per-device mask selection as sent by XISelectEvents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XiEventMask {
    /// Device id, or one of the XI2 wildcards (0 = all, 1 = all master).
    pub device: u16,
    /// Raw mask bitmap, at least two bytes on the wire.
    pub mask: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum XInputRequest {
    GetExtensionVersion { name: String },
    ListInputDevices,
    OpenDevice { device: DeviceId },
    CloseDevice { device: DeviceId },
    SelectExtensionEvent { window: WindowId, classes: Vec<EventClass> },
    GetSelectedExtensionEvents { window: WindowId },
    GrabDevice {
        window: WindowId,
        time: Timestamp,
        this_device_mode: GrabMode,
        other_device_mode: GrabMode,
        owner_events: bool,
        device: DeviceId,
        classes: Vec<EventClass>,
    },
    UngrabDevice { time: Timestamp, device: DeviceId },
    GrabDeviceKey {
        window: WindowId,
        modifiers: u16,
        modifier_device: DeviceId,
        grabbed_device: DeviceId,
        key: KeyCode,
        this_device_mode: GrabMode,
        other_device_mode: GrabMode,
        owner_events: bool,
        classes: Vec<EventClass>,
    },
    UngrabDeviceKey {
        window: WindowId,
        modifiers: u16,
        modifier_device: DeviceId,
        key: KeyCode,
        grabbed_device: DeviceId,
    },
    GrabDeviceButton {
        window: WindowId,
        grabbed_device: DeviceId,
        modifier_device: DeviceId,
        modifiers: u16,
        this_device_mode: GrabMode,
        other_device_mode: GrabMode,
        button: Button,
        owner_events: bool,
        classes: Vec<EventClass>,
    },
    UngrabDeviceButton {
        window: WindowId,
        modifiers: u16,
        modifier_device: DeviceId,
        button: Button,
        grabbed_device: DeviceId,
    },
    AllowDeviceEvents { time: Timestamp, mode: u8, device: DeviceId },
    SendExtensionEvent {
        destination: WindowId,
        device: DeviceId,
        propagate: bool,
        events: Vec<[u8; 32]>,
        classes: Vec<EventClass>,
    },
    XiSelectEvents { window: WindowId, masks: Vec<XiEventMask> },
    XiQueryVersion { major: u16, minor: u16 },
    XiQueryDevice { device: u16 },
}

impl XInputRequest {
    /// The minor opcode a decoded request arrived under, for error packets.
    pub fn minor_opcode(&self) -> u8 {
        use super::opcodes::xinput::*;
        match self {
            XInputRequest::GetExtensionVersion { .. } => GET_EXTENSION_VERSION,
            XInputRequest::ListInputDevices => LIST_INPUT_DEVICES,
            XInputRequest::OpenDevice { .. } => OPEN_DEVICE,
            XInputRequest::CloseDevice { .. } => CLOSE_DEVICE,
            XInputRequest::SelectExtensionEvent { .. } => SELECT_EXTENSION_EVENT,
            XInputRequest::GetSelectedExtensionEvents { .. } => GET_SELECTED_EXTENSION_EVENTS,
            XInputRequest::GrabDevice { .. } => GRAB_DEVICE,
            XInputRequest::UngrabDevice { .. } => UNGRAB_DEVICE,
            XInputRequest::GrabDeviceKey { .. } => GRAB_DEVICE_KEY,
            XInputRequest::UngrabDeviceKey { .. } => UNGRAB_DEVICE_KEY,
            XInputRequest::GrabDeviceButton { .. } => GRAB_DEVICE_BUTTON,
            XInputRequest::UngrabDeviceButton { .. } => UNGRAB_DEVICE_BUTTON,
            XInputRequest::AllowDeviceEvents { .. } => ALLOW_DEVICE_EVENTS,
            XInputRequest::SendExtensionEvent { .. } => SEND_EXTENSION_EVENT,
            XInputRequest::XiSelectEvents { .. } => XI_SELECT_EVENTS,
            XInputRequest::XiQueryVersion { .. } => XI_QUERY_VERSION,
            XInputRequest::XiQueryDevice { .. } => XI_QUERY_DEVICE,
        }
    }

    pub fn decode(minor: u8, r: &mut WireReader<'_>) -> Result<Self, XError> {
        use super::opcodes::xinput::*;
        let request = match minor {
            GET_EXTENSION_VERSION => {
                let name_len = r.read_u16()? as usize;
                r.skip(2)?;
                let name = r.read_string(name_len)?;
                XInputRequest::GetExtensionVersion { name }
            }
            LIST_INPUT_DEVICES => XInputRequest::ListInputDevices,
            OPEN_DEVICE => XInputRequest::OpenDevice { device: r.read_u8()? },
            CLOSE_DEVICE => XInputRequest::CloseDevice { device: r.read_u8()? },
            SELECT_EXTENSION_EVENT => {
                let window = r.read_u32()?;
                let count = r.read_u16()? as usize;
                r.skip(2)?;
                let classes = read_classes(r, count)?;
                XInputRequest::SelectExtensionEvent { window, classes }
            }
            GET_SELECTED_EXTENSION_EVENTS => {
                XInputRequest::GetSelectedExtensionEvents { window: r.read_u32()? }
            }
            GRAB_DEVICE => {
                let window = r.read_u32()?;
                let time = r.read_u32()?;
                let count = r.read_u16()? as usize;
                let this_device_mode =
                    GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
                let other_device_mode =
                    GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
                let owner_events = r.read_bool()?;
                let device = r.read_u8()?;
                r.skip(2)?;
                let classes = read_classes(r, count)?;
                XInputRequest::GrabDevice {
                    window,
                    time,
                    this_device_mode,
                    other_device_mode,
                    owner_events,
                    device,
                    classes,
                }
            }
            UNGRAB_DEVICE => {
                let time = r.read_u32()?;
                let device = r.read_u8()?;
                XInputRequest::UngrabDevice { time, device }
            }
            GRAB_DEVICE_KEY => {
                let window = r.read_u32()?;
                let count = r.read_u16()? as usize;
                let modifiers = r.read_u16()?;
                let modifier_device = r.read_u8()?;
                let grabbed_device = r.read_u8()?;
                let key = r.read_u8()?;
                let this_device_mode =
                    GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
                let other_device_mode =
                    GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
                let owner_events = r.read_bool()?;
                r.skip(2)?;
                let classes = read_classes(r, count)?;
                XInputRequest::GrabDeviceKey {
                    window,
                    modifiers,
                    modifier_device,
                    grabbed_device,
                    key,
                    this_device_mode,
                    other_device_mode,
                    owner_events,
                    classes,
                }
            }
            UNGRAB_DEVICE_KEY => XInputRequest::UngrabDeviceKey {
                window: r.read_u32()?,
                modifiers: r.read_u16()?,
                modifier_device: r.read_u8()?,
                key: r.read_u8()?,
                grabbed_device: r.read_u8()?,
            },
            GRAB_DEVICE_BUTTON => {
                let window = r.read_u32()?;
                let grabbed_device = r.read_u8()?;
                let modifier_device = r.read_u8()?;
                let count = r.read_u16()? as usize;
                let modifiers = r.read_u16()?;
                let this_device_mode =
                    GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
                let other_device_mode =
                    GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
                let button = r.read_u8()?;
                let owner_events = r.read_bool()?;
                r.skip(2)?;
                let classes = read_classes(r, count)?;
                XInputRequest::GrabDeviceButton {
                    window,
                    grabbed_device,
                    modifier_device,
                    modifiers,
                    this_device_mode,
                    other_device_mode,
                    button,
                    owner_events,
                    classes,
                }
            }
            UNGRAB_DEVICE_BUTTON => XInputRequest::UngrabDeviceButton {
                window: r.read_u32()?,
                modifiers: r.read_u16()?,
                modifier_device: r.read_u8()?,
                button: r.read_u8()?,
                grabbed_device: r.read_u8()?,
            },
            ALLOW_DEVICE_EVENTS => XInputRequest::AllowDeviceEvents {
                time: r.read_u32()?,
                mode: r.read_u8()?,
                device: r.read_u8()?,
            },
            SEND_EXTENSION_EVENT => {
                let destination = r.read_u32()?;
                let device = r.read_u8()?;
                let propagate = r.read_bool()?;
                let class_count = r.read_u16()? as usize;
                let event_count = r.read_u8()? as usize;
                r.skip(3)?;
                let mut events = Vec::with_capacity(event_count);
                for _ in 0..event_count {
                    let raw = r.read_bytes(32)?;
                    let mut event = [0u8; 32];
                    event.copy_from_slice(raw);
                    events.push(event);
                }
                let classes = read_classes(r, class_count)?;
                XInputRequest::SendExtensionEvent {
                    destination,
                    device,
                    propagate,
                    events,
                    classes,
                }
            }
            XI_SELECT_EVENTS => {
                let window = r.read_u32()?;
                let mask_count = r.read_u16()? as usize;
                r.skip(2)?;
                let mut masks = Vec::with_capacity(mask_count);
                for _ in 0..mask_count {
                    let device = r.read_u16()?;
                    let mask_words = r.read_u16()? as usize;
                    let mask = r.read_bytes(mask_words * 4)?.to_vec();
                    masks.push(XiEventMask { device, mask });
                }
                XInputRequest::XiSelectEvents { window, masks }
            }
            XI_QUERY_VERSION => {
                XInputRequest::XiQueryVersion { major: r.read_u16()?, minor: r.read_u16()? }
            }
            XI_QUERY_DEVICE => XInputRequest::XiQueryDevice { device: r.read_u16()? },
            _ => return Err(XError::request()),
        };
        Ok(request)
    }
}

fn read_classes(r: &mut WireReader<'_>, count: usize) -> Result<Vec<EventClass>, XError> {
    let mut classes = Vec::with_capacity(count);
    for _ in 0..count {
        classes.push(EventClass::from_word(r.read_u32()?));
    }
    Ok(classes)
}

/// An XInput device event on its way to a client; encodes to the 32-byte
/// form with the device id in the trailing byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEvent {
    /// Absolute event code (`first_event` base already applied).
    pub code: u8,
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
    pub device: DeviceId,
}

impl DeviceEvent {
    pub fn encode(&self, sequence: SequenceNumber, order: ByteOrder) -> Bytes {
        let mut w = WireWriter::with_capacity(order, 32);
        w.write_u8(self.code);
        w.write_u8(self.detail);
        w.write_u16(sequence);
        w.write_u32(self.time);
        w.write_u32(self.root);
        w.write_u32(self.event);
        w.write_u32(self.child);
        w.write_i16(self.root_x);
        w.write_i16(self.root_y);
        w.write_i16(self.event_x);
        w.write_i16(self.event_y);
        w.write_u16(self.state.bits());
        w.write_bool(self.same_screen);
        w.write_u8(self.device);
        w.into_bytes()
    }
}

/// `use` field of a device descriptor (XInput 1 wire values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceUse {
    Pointer = 1,
    Keyboard = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyClassInfo {
    pub min_keycode: KeyCode,
    pub max_keycode: KeyCode,
    pub num_keys: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonClassInfo {
    pub num_buttons: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuatorAxis {
    pub min: i32,
    pub max: i32,
    pub resolution: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValuatorClassInfo {
    pub mode: u8,
    pub motion_buffer_size: u32,
    pub axes: Vec<ValuatorAxis>,
}

/// Class inventory of one virtual device, shared by the 1.x and XI2
/// enumeration replies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceClasses {
    pub keys: Option<KeyClassInfo>,
    pub buttons: Option<ButtonClassInfo>,
    pub valuators: Option<ValuatorClassInfo>,
}

impl DeviceClasses {
    pub fn count(&self) -> u8 {
        self.keys.is_some() as u8
            + self.buttons.is_some() as u8
            + self.valuators.is_some() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub device_type: Atom,
    pub kind: DeviceUse,
    pub name: String,
    pub classes: DeviceClasses,
    pub enabled: bool,
}

/// Replies produced by the XInput dispatcher.
#[derive(Debug, Clone)]
pub enum XIReply {
    GetExtensionVersion { major: u16, minor: u16, present: bool },
    ListInputDevices { devices: Vec<DeviceDescriptor> },
    /// Pairs of (input class, event-type base) for an opened device.
    OpenDevice { classes: Vec<(u8, u8)> },
    GetSelectedExtensionEvents { this_client: Vec<EventClass>, all_clients: Vec<EventClass> },
    GrabDevice { status: GrabStatus },
    XiQueryVersion { major: u16, minor: u16 },
    XiQueryDevice { devices: Vec<DeviceDescriptor> },
}

impl XIReply {
    pub fn encode(&self, sequence: SequenceNumber, order: ByteOrder) -> Bytes {
        match self {
            XIReply::GetExtensionVersion { major, minor, present } => {
                xi_frame(order, sequence, super::opcodes::xinput::GET_EXTENSION_VERSION, |w| {
                    w.write_u16(*major);
                    w.write_u16(*minor);
                    w.write_bool(*present);
                })
            }
            XIReply::ListInputDevices { devices } => {
                xi_frame(order, sequence, super::opcodes::xinput::LIST_INPUT_DEVICES, |w| {
                    w.write_u8(devices.len() as u8);
                    w.write_zeros(23);
                    for device in devices {
                        w.write_u32(device.device_type);
                        w.write_u8(device.id);
                        w.write_u8(device.classes.count());
                        w.write_u8(device.kind as u8);
                        w.write_u8(0);
                    }
                    for device in devices {
                        write_class_blocks(w, &device.classes);
                    }
                    let mut block = 0usize;
                    for device in devices {
                        w.write_u8(device.name.len() as u8);
                        block += 1 + device.name.len();
                        for ch in device.name.chars() {
                            w.write_u8(ch as u8);
                        }
                    }
                    w.write_zeros(crate::protocol::wire::pad(block));
                })
            }
            XIReply::OpenDevice { classes } => {
                xi_frame(order, sequence, super::opcodes::xinput::OPEN_DEVICE, |w| {
                    w.write_u8(classes.len() as u8);
                    w.write_zeros(23);
                    for (input_class, event_base) in classes {
                        w.write_u8(*input_class);
                        w.write_u8(*event_base);
                        w.write_zeros(2);
                    }
                })
            }
            XIReply::GetSelectedExtensionEvents { this_client, all_clients } => xi_frame(
                order,
                sequence,
                super::opcodes::xinput::GET_SELECTED_EXTENSION_EVENTS,
                |w| {
                    w.write_u16(this_client.len() as u16);
                    w.write_u16(all_clients.len() as u16);
                    w.write_zeros(20);
                    for class in this_client.iter().chain(all_clients) {
                        w.write_u32(class.to_word());
                    }
                },
            ),
            XIReply::GrabDevice { status } => {
                xi_frame(order, sequence, super::opcodes::xinput::GRAB_DEVICE, |w| {
                    w.write_u8(*status as u8);
                })
            }
            XIReply::XiQueryVersion { major, minor } => {
                xi_frame(order, sequence, super::opcodes::xinput::XI_QUERY_VERSION, |w| {
                    w.write_u16(*major);
                    w.write_u16(*minor);
                })
            }
            XIReply::XiQueryDevice { devices } => {
                xi_frame(order, sequence, super::opcodes::xinput::XI_QUERY_DEVICE, |w| {
                    w.write_u16(devices.len() as u16);
                    w.write_zeros(22);
                    for device in devices {
                        write_xi2_device(w, device);
                    }
                })
            }
        }
    }
}

/// XInput replies reuse the core frame but echo the minor opcode in the
/// data byte, the way the reference extension does.
fn xi_frame(
    order: ByteOrder,
    sequence: SequenceNumber,
    minor: u8,
    build: impl FnOnce(&mut WireWriter),
) -> Bytes {
    let mut body = WireWriter::new(order);
    build(&mut body);
    let body = body.into_bytes();
    let extra = crate::protocol::wire::padded(body.len().saturating_sub(24));
    let total = 32 + extra;
    let mut w = WireWriter::with_capacity(order, total);
    w.write_u8(1);
    w.write_u8(minor);
    w.write_u16(sequence);
    w.write_u32((extra / 4) as u32);
    w.write_bytes(&body);
    w.write_zeros(total - 8 - body.len());
    w.into_bytes()
}

fn write_class_blocks(w: &mut WireWriter, classes: &DeviceClasses) {
    if let Some(keys) = &classes.keys {
        w.write_u8(0); // KeyClass
        w.write_u8(8);
        w.write_u8(keys.min_keycode);
        w.write_u8(keys.max_keycode);
        w.write_u16(keys.num_keys);
        w.write_zeros(2);
    }
    if let Some(buttons) = &classes.buttons {
        w.write_u8(1); // ButtonClass
        w.write_u8(4);
        w.write_u16(buttons.num_buttons);
    }
    if let Some(valuators) = &classes.valuators {
        w.write_u8(2); // ValuatorClass
        w.write_u8(8 + 12 * valuators.axes.len() as u8);
        w.write_u8(valuators.axes.len() as u8);
        w.write_u8(valuators.mode);
        w.write_u32(valuators.motion_buffer_size);
        for axis in &valuators.axes {
            w.write_u32(axis.resolution);
            w.write_i32(axis.min);
            w.write_i32(axis.max);
        }
    }
}

fn write_xi2_device(w: &mut WireWriter, device: &DeviceDescriptor) {
    // XIDeviceInfo header; master devices attach to themselves.
    w.write_u16(device.id as u16);
    w.write_u16(device.kind as u16);
    w.write_u16(device.id as u16);
    let mut class_count = 0u16;
    if device.classes.keys.is_some() {
        class_count += 1;
    }
    if device.classes.buttons.is_some() {
        class_count += 1;
    }
    w.write_u16(class_count);
    w.write_u16(device.name.len() as u16);
    w.write_bool(device.enabled);
    w.write_u8(0);
    w.write_string_padded(&device.name);
    if let Some(keys) = &device.classes.keys {
        // XIKeyClass: type, length in words, sourceid, num keycodes, keycodes
        w.write_u16(0);
        w.write_u16(2 + keys.num_keys as u16);
        w.write_u16(device.id as u16);
        w.write_u16(keys.num_keys);
        for keycode in 0..keys.num_keys {
            w.write_u32(keys.min_keycode as u32 + keycode as u32);
        }
    }
    if let Some(buttons) = &device.classes.buttons {
        // XIButtonClass with empty label atoms and an all-clear state mask.
        let mask_words = (buttons.num_buttons as usize + 31) / 32;
        w.write_u16(1);
        w.write_u16(2 + buttons.num_buttons as u16 + mask_words as u16);
        w.write_u16(device.id as u16);
        w.write_u16(buttons.num_buttons);
        for _ in 0..mask_words {
            w.write_u32(0);
        }
        for _ in 0..buttons.num_buttons {
            w.write_u32(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::opcodes::xinput;

    fn reader(bytes: &[u8]) -> WireReader<'_> {
        WireReader::new(bytes, ByteOrder::LittleEndian)
    }

    #[test]
    fn class_word_packing() {
        let class = EventClass { device: 2, mask: class_masks::DEVICE_BUTTON_PRESS };
        assert_eq!(class.to_word(), 0x0000_0402);
        assert_eq!(EventClass::from_word(0x0000_0402), class);
    }

    #[test]
    fn decode_open_device() {
        let body = [3u8, 0, 0, 0];
        match XInputRequest::decode(xinput::OPEN_DEVICE, &mut reader(&body)).unwrap() {
            XInputRequest::OpenDevice { device } => assert_eq!(device, 3),
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn decode_select_extension_event() {
        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        w.write_u32(0x0040_0001);
        w.write_u16(2);
        w.write_u16(0);
        w.write_u32(EventClass { device: 2, mask: class_masks::DEVICE_BUTTON_PRESS }.to_word());
        w.write_u32(EventClass { device: 3, mask: class_masks::DEVICE_KEY_PRESS }.to_word());
        let bytes = w.into_bytes();
        match XInputRequest::decode(xinput::SELECT_EXTENSION_EVENT, &mut reader(&bytes)).unwrap() {
            XInputRequest::SelectExtensionEvent { window, classes } => {
                assert_eq!(window, 0x0040_0001);
                assert_eq!(classes.len(), 2);
                assert_eq!(classes[0].device, 2);
                assert_eq!(classes[1].mask, class_masks::DEVICE_KEY_PRESS);
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn decode_grab_device() {
        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        w.write_u32(0x0040_0001); // window
        w.write_u32(0); // CurrentTime
        w.write_u16(1); // one class
        w.write_u8(1); // this: Async
        w.write_u8(1); // other: Async
        w.write_u8(0); // owner_events
        w.write_u8(2); // device
        w.write_zeros(2);
        w.write_u32(EventClass { device: 2, mask: class_masks::DEVICE_BUTTON_PRESS }.to_word());
        let bytes = w.into_bytes();
        match XInputRequest::decode(xinput::GRAB_DEVICE, &mut reader(&bytes)).unwrap() {
            XInputRequest::GrabDevice { window, device, classes, owner_events, .. } => {
                assert_eq!(window, 0x0040_0001);
                assert_eq!(device, 2);
                assert!(!owner_events);
                assert_eq!(classes[0].mask, class_masks::DEVICE_BUTTON_PRESS);
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn device_event_trailing_byte() {
        let event = DeviceEvent {
            code: 64 + event_offsets::DEVICE_BUTTON_PRESS,
            detail: 1,
            time: 10,
            root: 1,
            event: 2,
            child: 0,
            root_x: 5,
            root_y: 6,
            event_x: 5,
            event_y: 6,
            state: KeyButMask::empty(),
            same_screen: true,
            device: 2,
        };
        let bytes = event.encode(4, ByteOrder::LittleEndian);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[0], 67);
        assert_eq!(bytes[31], 2);
    }

    #[test]
    fn unknown_minor_is_request_error() {
        let err = XInputRequest::decode(99, &mut reader(&[])).unwrap_err();
        assert_eq!(err.code, crate::protocol::errors::ErrorCode::Request);
    }

    #[test]
    fn grab_device_reply_status_in_body() {
        let bytes = XIReply::GrabDevice { status: GrabStatus::AlreadyGrabbed }
            .encode(6, ByteOrder::LittleEndian);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[1], xinput::GRAB_DEVICE);
        assert_eq!(bytes[8], GrabStatus::AlreadyGrabbed as u8);
    }

    #[test]
    fn list_input_devices_reply_layout() {
        let devices = vec![DeviceDescriptor {
            id: 2,
            device_type: 0,
            kind: DeviceUse::Pointer,
            name: "pointer".into(),
            classes: DeviceClasses {
                keys: None,
                buttons: Some(ButtonClassInfo { num_buttons: 5 }),
                valuators: Some(ValuatorClassInfo {
                    mode: 1,
                    motion_buffer_size: 256,
                    axes: vec![
                        ValuatorAxis { min: 0, max: 1279, resolution: 1 },
                        ValuatorAxis { min: 0, max: 799, resolution: 1 },
                    ],
                }),
            },
            enabled: true,
        }];
        let bytes = XIReply::ListInputDevices { devices }.encode(1, ByteOrder::LittleEndian);
        assert_eq!(bytes[8], 1); // one device
        assert_eq!(bytes[36], 2); // device id
        assert_eq!(bytes[37], 2); // two classes
        assert_eq!(bytes[38], DeviceUse::Pointer as u8);
        assert_eq!((bytes.len() - 32) % 4, 0);
    }
}
