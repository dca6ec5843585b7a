//! Core X11 protocol types and constants.
//!
//! Plain `u32` aliases for the resource-id namespace, the enumerations the
//! core requests traffic in, and the bit masks clients select events and
//! values with. Everything here is wire-level vocabulary; the semantic
//! state lives in the `resources`, `window`, and `input` modules.

use bitflags::bitflags;

/// Negotiated byte order of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Decode the first handshake byte: `'B'` selects big-endian, `'l'`
    /// little-endian. Anything else is a protocol violation.
    pub fn from_setup_byte(byte: u8) -> Option<Self> {
        match byte {
            0x42 => Some(ByteOrder::BigEndian),
            0x6c => Some(ByteOrder::LittleEndian),
            _ => None,
        }
    }
}

pub type XId = u32;
pub type WindowId = u32;
pub type PixmapId = u32;
pub type DrawableId = u32;
pub type GContextId = u32;
pub type FontId = u32;
pub type CursorId = u32;
pub type ColormapId = u32;
pub type Atom = u32;
pub type VisualId = u32;
pub type KeyCode = u8;
pub type KeySym = u32;
pub type Button = u8;
pub type Timestamp = u32;
pub type SequenceNumber = u16;
pub type DeviceId = u8;
/// Server-side connection identifier; doubles as the resource-id prefix
/// index of that connection.
pub type ClientId = u32;

/// The null resource id ("None" in protocol terms).
pub const NONE: XId = 0;
/// `ParentRelative` background pixmap sentinel.
pub const PARENT_RELATIVE: XId = 1;
/// `CopyFromParent` sentinel shared by several creation parameters.
pub const COPY_FROM_PARENT: u32 = 0;
/// `CurrentTime` timestamp sentinel.
pub const CURRENT_TIME: Timestamp = 0;
/// `AnyPropertyType` for GetProperty.
pub const ANY_PROPERTY_TYPE: Atom = 0;
/// Wildcard keycode for passive key grabs.
pub const ANY_KEY: KeyCode = 0;
/// Wildcard button for passive button grabs.
pub const ANY_BUTTON: Button = 0;
/// Wildcard modifier mask bit for passive grabs.
pub const ANY_MODIFIER: u16 = 0x8000;
/// `PointerWindow` destination sentinel for SendEvent.
pub const POINTER_WINDOW: WindowId = 0;
/// `InputFocus` destination sentinel for SendEvent.
pub const INPUT_FOCUS: WindowId = 1;
/// `PointerRoot` focus sentinel.
pub const POINTER_ROOT: WindowId = 1;

/// Resource ids are 29 bits; the low 21 bits are the per-client index.
pub const RESOURCE_ID_MASK: XId = 0x001f_ffff;
/// Width in bits of the per-client local index.
pub const RESOURCE_INDEX_BITS: u32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum WindowClass {
    CopyFromParent = 0,
    InputOutput = 1,
    InputOnly = 2,
}

impl WindowClass {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(WindowClass::CopyFromParent),
            1 => Some(WindowClass::InputOutput),
            2 => Some(WindowClass::InputOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MapState {
    #[default]
    Unmapped = 0,
    Unviewable = 1,
    Viewable = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StackMode {
    Above = 0,
    Below = 1,
    TopIf = 2,
    BottomIf = 3,
    Opposite = 4,
}

impl StackMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StackMode::Above),
            1 => Some(StackMode::Below),
            2 => Some(StackMode::TopIf),
            3 => Some(StackMode::BottomIf),
            4 => Some(StackMode::Opposite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CirculateDirection {
    RaiseLowest = 0,
    LowerHighest = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PropertyMode {
    Replace = 0,
    Prepend = 1,
    Append = 2,
}

impl PropertyMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PropertyMode::Replace),
            1 => Some(PropertyMode::Prepend),
            2 => Some(PropertyMode::Append),
            _ => None,
        }
    }
}

/// Status byte of the GrabPointer / GrabKeyboard / GrabDevice replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GrabStatus {
    Success = 0,
    AlreadyGrabbed = 1,
    InvalidTime = 2,
    NotViewable = 3,
    Frozen = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GrabMode {
    Sync = 0,
    Async = 1,
}

impl GrabMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GrabMode::Sync),
            1 => Some(GrabMode::Async),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AllowEventsMode {
    AsyncPointer = 0,
    SyncPointer = 1,
    ReplayPointer = 2,
    AsyncKeyboard = 3,
    SyncKeyboard = 4,
    ReplayKeyboard = 5,
    AsyncBoth = 6,
    SyncBoth = 7,
}

impl AllowEventsMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AllowEventsMode::AsyncPointer),
            1 => Some(AllowEventsMode::SyncPointer),
            2 => Some(AllowEventsMode::ReplayPointer),
            3 => Some(AllowEventsMode::AsyncKeyboard),
            4 => Some(AllowEventsMode::SyncKeyboard),
            5 => Some(AllowEventsMode::ReplayKeyboard),
            6 => Some(AllowEventsMode::AsyncBoth),
            7 => Some(AllowEventsMode::SyncBoth),
            _ => None,
        }
    }
}

/// Where the input focus falls back to when the focus window dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RevertTo {
    #[default]
    None = 0,
    PointerRoot = 1,
    Parent = 2,
}

impl RevertTo {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RevertTo::None),
            1 => Some(RevertTo::PointerRoot),
            2 => Some(RevertTo::Parent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CloseDownMode {
    #[default]
    Destroy = 0,
    RetainPermanent = 1,
    RetainTemporary = 2,
}

impl CloseDownMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CloseDownMode::Destroy),
            1 => Some(CloseDownMode::RetainPermanent),
            2 => Some(CloseDownMode::RetainTemporary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SaveSetMode {
    Insert = 0,
    Delete = 1,
}

/// `mode` field of crossing and focus events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotifyMode {
    Normal = 0,
    Grab = 1,
    Ungrab = 2,
    WhileGrabbed = 3,
}

impl NotifyMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NotifyMode::Normal),
            1 => Some(NotifyMode::Grab),
            2 => Some(NotifyMode::Ungrab),
            3 => Some(NotifyMode::WhileGrabbed),
            _ => None,
        }
    }
}

/// `detail` field of crossing and focus events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotifyDetail {
    Ancestor = 0,
    Virtual = 1,
    Inferior = 2,
    Nonlinear = 3,
    NonlinearVirtual = 4,
    Pointer = 5,
    PointerRoot = 6,
    NotifyNone = 7,
}

impl NotifyDetail {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NotifyDetail::Ancestor),
            1 => Some(NotifyDetail::Virtual),
            2 => Some(NotifyDetail::Inferior),
            3 => Some(NotifyDetail::Nonlinear),
            4 => Some(NotifyDetail::NonlinearVirtual),
            5 => Some(NotifyDetail::Pointer),
            6 => Some(NotifyDetail::PointerRoot),
            7 => Some(NotifyDetail::NotifyNone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VisualClass {
    StaticGray = 0,
    GrayScale = 1,
    StaticColor = 2,
    PseudoColor = 3,
    TrueColor = 4,
    DirectColor = 5,
}

impl VisualClass {
    /// Whether cells of this visual can be written by clients.
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            VisualClass::GrayScale | VisualClass::PseudoColor | VisualClass::DirectColor
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ImageFormat {
    Bitmap = 0,
    XyPixmap = 1,
    ZPixmap = 2,
}

impl ImageFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ImageFormat::Bitmap),
            1 => Some(ImageFormat::XyPixmap),
            2 => Some(ImageFormat::ZPixmap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CoordinateMode {
    Origin = 0,
    Previous = 1,
}

impl CoordinateMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CoordinateMode::Origin),
            1 => Some(CoordinateMode::Previous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PolyShape {
    Complex = 0,
    Nonconvex = 1,
    Convex = 2,
}

impl PolyShape {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PolyShape::Complex),
            1 => Some(PolyShape::Nonconvex),
            2 => Some(PolyShape::Convex),
            _ => None,
        }
    }
}

/// A point in 16-bit protocol coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle {
    pub fn contains(&self, x: i16, y: i16) -> bool {
        x >= self.x
            && y >= self.y
            && (x as i32) < self.x as i32 + self.width as i32
            && (y as i32) < self.y as i32 + self.height as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub angle1: i16,
    pub angle2: i16,
}

bitflags! {
    /// Per-(window, client) event selection mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventMask: u32 {
        const KEY_PRESS = 0x0000_0001;
        const KEY_RELEASE = 0x0000_0002;
        const BUTTON_PRESS = 0x0000_0004;
        const BUTTON_RELEASE = 0x0000_0008;
        const ENTER_WINDOW = 0x0000_0010;
        const LEAVE_WINDOW = 0x0000_0020;
        const POINTER_MOTION = 0x0000_0040;
        const POINTER_MOTION_HINT = 0x0000_0080;
        const BUTTON1_MOTION = 0x0000_0100;
        const BUTTON2_MOTION = 0x0000_0200;
        const BUTTON3_MOTION = 0x0000_0400;
        const BUTTON4_MOTION = 0x0000_0800;
        const BUTTON5_MOTION = 0x0000_1000;
        const BUTTON_MOTION = 0x0000_2000;
        const KEYMAP_STATE = 0x0000_4000;
        const EXPOSURE = 0x0000_8000;
        const VISIBILITY_CHANGE = 0x0001_0000;
        const STRUCTURE_NOTIFY = 0x0002_0000;
        const RESIZE_REDIRECT = 0x0004_0000;
        const SUBSTRUCTURE_NOTIFY = 0x0008_0000;
        const SUBSTRUCTURE_REDIRECT = 0x0010_0000;
        const FOCUS_CHANGE = 0x0020_0000;
        const PROPERTY_CHANGE = 0x0040_0000;
        const COLORMAP_CHANGE = 0x0080_0000;
        const OWNER_GRAB_BUTTON = 0x0100_0000;
    }
}

impl EventMask {
    /// Mask bits a pointer-grab event mask may legally carry.
    pub fn pointer_events() -> Self {
        EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::ENTER_WINDOW
            | EventMask::LEAVE_WINDOW
            | EventMask::POINTER_MOTION
            | EventMask::POINTER_MOTION_HINT
            | EventMask::BUTTON1_MOTION
            | EventMask::BUTTON2_MOTION
            | EventMask::BUTTON3_MOTION
            | EventMask::BUTTON4_MOTION
            | EventMask::BUTTON5_MOTION
            | EventMask::BUTTON_MOTION
            | EventMask::KEYMAP_STATE
    }
}

bitflags! {
    /// Modifier-and-button state carried in input events ("SETofKEYBUTMASK").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyButMask: u16 {
        const SHIFT = 0x0001;
        const LOCK = 0x0002;
        const CONTROL = 0x0004;
        const MOD1 = 0x0008;
        const MOD2 = 0x0010;
        const MOD3 = 0x0020;
        const MOD4 = 0x0040;
        const MOD5 = 0x0080;
        const BUTTON1 = 0x0100;
        const BUTTON2 = 0x0200;
        const BUTTON3 = 0x0400;
        const BUTTON4 = 0x0800;
        const BUTTON5 = 0x1000;
    }
}

bitflags! {
    /// Value mask of CreateWindow / ChangeWindowAttributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AttributeMask: u32 {
        const BACKGROUND_PIXMAP = 0x0000_0001;
        const BACKGROUND_PIXEL = 0x0000_0002;
        const BORDER_PIXMAP = 0x0000_0004;
        const BORDER_PIXEL = 0x0000_0008;
        const BIT_GRAVITY = 0x0000_0010;
        const WIN_GRAVITY = 0x0000_0020;
        const BACKING_STORE = 0x0000_0040;
        const BACKING_PLANES = 0x0000_0080;
        const BACKING_PIXEL = 0x0000_0100;
        const OVERRIDE_REDIRECT = 0x0000_0200;
        const SAVE_UNDER = 0x0000_0400;
        const EVENT_MASK = 0x0000_0800;
        const DO_NOT_PROPAGATE_MASK = 0x0000_1000;
        const COLORMAP = 0x0000_2000;
        const CURSOR = 0x0000_4000;
    }
}

bitflags! {
    /// Value mask of ConfigureWindow.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ConfigureMask: u16 {
        const X = 0x0001;
        const Y = 0x0002;
        const WIDTH = 0x0004;
        const HEIGHT = 0x0008;
        const BORDER_WIDTH = 0x0010;
        const SIBLING = 0x0020;
        const STACK_MODE = 0x0040;
    }
}

bitflags! {
    /// Value mask of CreateGC / ChangeGC / CopyGC.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GcMask: u32 {
        const FUNCTION = 0x0000_0001;
        const PLANE_MASK = 0x0000_0002;
        const FOREGROUND = 0x0000_0004;
        const BACKGROUND = 0x0000_0008;
        const LINE_WIDTH = 0x0000_0010;
        const LINE_STYLE = 0x0000_0020;
        const CAP_STYLE = 0x0000_0040;
        const JOIN_STYLE = 0x0000_0080;
        const FILL_STYLE = 0x0000_0100;
        const FILL_RULE = 0x0000_0200;
        const TILE = 0x0000_0400;
        const STIPPLE = 0x0000_0800;
        const TILE_STIPPLE_X_ORIGIN = 0x0000_1000;
        const TILE_STIPPLE_Y_ORIGIN = 0x0000_2000;
        const FONT = 0x0000_4000;
        const SUBWINDOW_MODE = 0x0000_8000;
        const GRAPHICS_EXPOSURES = 0x0001_0000;
        const CLIP_X_ORIGIN = 0x0002_0000;
        const CLIP_Y_ORIGIN = 0x0004_0000;
        const CLIP_MASK = 0x0008_0000;
        const DASH_OFFSET = 0x0010_0000;
        const DASHES = 0x0020_0000;
        const ARC_MODE = 0x0040_0000;
    }
}

bitflags! {
    /// DoRed / DoGreen / DoBlue flags of StoreColors items.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ColorFlags: u8 {
        const DO_RED = 0x01;
        const DO_GREEN = 0x02;
        const DO_BLUE = 0x04;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_byte_order() {
        assert_eq!(ByteOrder::from_setup_byte(b'B'), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_setup_byte(b'l'), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_setup_byte(0), None);
    }

    #[test]
    fn event_mask_bits_match_protocol() {
        assert_eq!(EventMask::EXPOSURE.bits(), 0x8000);
        assert_eq!(EventMask::STRUCTURE_NOTIFY.bits(), 0x2_0000);
        assert_eq!(EventMask::SUBSTRUCTURE_NOTIFY.bits(), 0x8_0000);
        assert_eq!(EventMask::all().bits(), 0x01ff_ffff);
    }

    #[test]
    fn writable_visual_classes() {
        assert!(VisualClass::PseudoColor.is_writable());
        assert!(!VisualClass::TrueColor.is_writable());
        assert!(!VisualClass::StaticGray.is_writable());
    }

    #[test]
    fn rectangle_hit_test() {
        let r = Rectangle { x: 10, y: 10, width: 20, height: 20 };
        assert!(r.contains(10, 10));
        assert!(r.contains(29, 29));
        assert!(!r.contains(30, 30));
        assert!(!r.contains(9, 15));
    }
}
