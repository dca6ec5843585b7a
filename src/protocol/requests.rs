//! Typed decoding of every core protocol request.
//!
//! The dispatcher hands each decoder exactly the request body (the four
//! header bytes stripped), so a decoder that runs out of bytes has by
//! definition hit a length violation and the `?` on every read surfaces
//! it as a `Length` error. No raw byte slices escape to handlers except
//! the deliberately opaque payloads (`SendEvent` bodies, image data).

use super::errors::XError;
use super::opcodes;
use super::types::*;
use super::wire::WireReader;
use super::xinput::XInputRequest;

/// The four-byte request header shared by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub opcode: u8,
    /// The "data" byte; per-request meaning (depth, mode, flag…).
    pub detail: u8,
    /// Total request length in 4-byte units, header included.
    pub length: u16,
}

impl RequestHeader {
    pub fn decode(bytes: [u8; 4], order: ByteOrder) -> Self {
        let length = match order {
            ByteOrder::LittleEndian => u16::from_le_bytes([bytes[2], bytes[3]]),
            ByteOrder::BigEndian => u16::from_be_bytes([bytes[2], bytes[3]]),
        };
        Self { opcode: bytes[0], detail: bytes[1], length }
    }

    /// Body size in bytes that must follow the header.
    pub fn body_len(&self) -> usize {
        (self.length as usize).saturating_mul(4).saturating_sub(4)
    }
}

/// Window attribute values selected by an [`AttributeMask`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowAttributeValues {
    pub background_pixmap: Option<PixmapId>,
    pub background_pixel: Option<u32>,
    pub border_pixmap: Option<PixmapId>,
    pub border_pixel: Option<u32>,
    pub bit_gravity: Option<u8>,
    pub win_gravity: Option<u8>,
    pub backing_store: Option<u8>,
    pub backing_planes: Option<u32>,
    pub backing_pixel: Option<u32>,
    pub override_redirect: Option<bool>,
    pub save_under: Option<bool>,
    pub event_mask: Option<EventMask>,
    pub do_not_propagate_mask: Option<EventMask>,
    pub colormap: Option<ColormapId>,
    pub cursor: Option<CursorId>,
}

impl WindowAttributeValues {
    fn decode(r: &mut WireReader<'_>, mask: AttributeMask) -> Result<Self, XError> {
        let mut values = Self::default();
        if mask.contains(AttributeMask::BACKGROUND_PIXMAP) {
            values.background_pixmap = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::BACKGROUND_PIXEL) {
            values.background_pixel = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::BORDER_PIXMAP) {
            values.border_pixmap = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::BORDER_PIXEL) {
            values.border_pixel = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::BIT_GRAVITY) {
            values.bit_gravity = Some(r.read_u32()? as u8);
        }
        if mask.contains(AttributeMask::WIN_GRAVITY) {
            values.win_gravity = Some(r.read_u32()? as u8);
        }
        if mask.contains(AttributeMask::BACKING_STORE) {
            values.backing_store = Some(r.read_u32()? as u8);
        }
        if mask.contains(AttributeMask::BACKING_PLANES) {
            values.backing_planes = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::BACKING_PIXEL) {
            values.backing_pixel = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::OVERRIDE_REDIRECT) {
            values.override_redirect = Some(r.read_u32()? != 0);
        }
        if mask.contains(AttributeMask::SAVE_UNDER) {
            values.save_under = Some(r.read_u32()? != 0);
        }
        if mask.contains(AttributeMask::EVENT_MASK) {
            let raw = r.read_u32()?;
            values.event_mask =
                Some(EventMask::from_bits(raw).ok_or_else(|| XError::value(raw))?);
        }
        if mask.contains(AttributeMask::DO_NOT_PROPAGATE_MASK) {
            let raw = r.read_u32()?;
            values.do_not_propagate_mask =
                Some(EventMask::from_bits(raw).ok_or_else(|| XError::value(raw))?);
        }
        if mask.contains(AttributeMask::COLORMAP) {
            values.colormap = Some(r.read_u32()?);
        }
        if mask.contains(AttributeMask::CURSOR) {
            values.cursor = Some(r.read_u32()?);
        }
        Ok(values)
    }
}

/// Geometry/stacking updates selected by a [`ConfigureMask`], decoded in
/// mask-bit order as the protocol transmits them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureValues {
    pub x: Option<i16>,
    pub y: Option<i16>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub border_width: Option<u16>,
    pub sibling: Option<WindowId>,
    pub stack_mode: Option<StackMode>,
}

impl ConfigureValues {
    fn decode(r: &mut WireReader<'_>, mask: ConfigureMask) -> Result<Self, XError> {
        let mut values = Self::default();
        if mask.contains(ConfigureMask::X) {
            values.x = Some(r.read_u32()? as i16);
        }
        if mask.contains(ConfigureMask::Y) {
            values.y = Some(r.read_u32()? as i16);
        }
        if mask.contains(ConfigureMask::WIDTH) {
            values.width = Some(r.read_u32()? as u16);
        }
        if mask.contains(ConfigureMask::HEIGHT) {
            values.height = Some(r.read_u32()? as u16);
        }
        if mask.contains(ConfigureMask::BORDER_WIDTH) {
            values.border_width = Some(r.read_u32()? as u16);
        }
        if mask.contains(ConfigureMask::SIBLING) {
            values.sibling = Some(r.read_u32()?);
        }
        if mask.contains(ConfigureMask::STACK_MODE) {
            let raw = r.read_u32()?;
            values.stack_mode =
                Some(StackMode::from_u8(raw as u8).ok_or_else(|| XError::value(raw))?);
        }
        Ok(values)
    }
}

/// GC parameters selected by a [`GcMask`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcValues {
    pub function: Option<u8>,
    pub plane_mask: Option<u32>,
    pub foreground: Option<u32>,
    pub background: Option<u32>,
    pub line_width: Option<u16>,
    pub line_style: Option<u8>,
    pub cap_style: Option<u8>,
    pub join_style: Option<u8>,
    pub fill_style: Option<u8>,
    pub fill_rule: Option<u8>,
    pub tile: Option<PixmapId>,
    pub stipple: Option<PixmapId>,
    pub tile_stipple_x_origin: Option<i16>,
    pub tile_stipple_y_origin: Option<i16>,
    pub font: Option<FontId>,
    pub subwindow_mode: Option<u8>,
    pub graphics_exposures: Option<bool>,
    pub clip_x_origin: Option<i16>,
    pub clip_y_origin: Option<i16>,
    pub clip_mask: Option<PixmapId>,
    pub dash_offset: Option<u16>,
    pub dashes: Option<u8>,
    pub arc_mode: Option<u8>,
}

impl GcValues {
    fn decode(r: &mut WireReader<'_>, mask: GcMask) -> Result<Self, XError> {
        let mut v = Self::default();
        if mask.contains(GcMask::FUNCTION) {
            v.function = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::PLANE_MASK) {
            v.plane_mask = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::FOREGROUND) {
            v.foreground = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::BACKGROUND) {
            v.background = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::LINE_WIDTH) {
            v.line_width = Some(r.read_u32()? as u16);
        }
        if mask.contains(GcMask::LINE_STYLE) {
            v.line_style = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::CAP_STYLE) {
            v.cap_style = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::JOIN_STYLE) {
            v.join_style = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::FILL_STYLE) {
            v.fill_style = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::FILL_RULE) {
            v.fill_rule = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::TILE) {
            v.tile = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::STIPPLE) {
            v.stipple = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::TILE_STIPPLE_X_ORIGIN) {
            v.tile_stipple_x_origin = Some(r.read_u32()? as i16);
        }
        if mask.contains(GcMask::TILE_STIPPLE_Y_ORIGIN) {
            v.tile_stipple_y_origin = Some(r.read_u32()? as i16);
        }
        if mask.contains(GcMask::FONT) {
            v.font = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::SUBWINDOW_MODE) {
            v.subwindow_mode = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::GRAPHICS_EXPOSURES) {
            v.graphics_exposures = Some(r.read_u32()? != 0);
        }
        if mask.contains(GcMask::CLIP_X_ORIGIN) {
            v.clip_x_origin = Some(r.read_u32()? as i16);
        }
        if mask.contains(GcMask::CLIP_Y_ORIGIN) {
            v.clip_y_origin = Some(r.read_u32()? as i16);
        }
        if mask.contains(GcMask::CLIP_MASK) {
            v.clip_mask = Some(r.read_u32()?);
        }
        if mask.contains(GcMask::DASH_OFFSET) {
            v.dash_offset = Some(r.read_u32()? as u16);
        }
        if mask.contains(GcMask::DASHES) {
            v.dashes = Some(r.read_u32()? as u8);
        }
        if mask.contains(GcMask::ARC_MODE) {
            v.arc_mode = Some(r.read_u32()? as u8);
        }
        Ok(v)
    }
}

/// One item of a PolyText request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextItem {
    /// A glyph run with a leading horizontal delta.
    Run { delta: i8, text: Vec<u16> },
    /// A font change; the four font-id bytes are MSB-first on the wire.
    FontShift(FontId),
}

/// One item of a StoreColors request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorItem {
    pub pixel: u32,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub flags: ColorFlags,
}

/// A fully decoded request.
#[derive(Debug, Clone)]
pub enum Request {
    CreateWindow {
        depth: u8,
        wid: WindowId,
        parent: WindowId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        border_width: u16,
        class: WindowClass,
        visual: VisualId,
        mask: AttributeMask,
        values: WindowAttributeValues,
    },
    ChangeWindowAttributes {
        window: WindowId,
        mask: AttributeMask,
        values: WindowAttributeValues,
    },
    GetWindowAttributes { window: WindowId },
    DestroyWindow { window: WindowId },
    DestroySubwindows { window: WindowId },
    ChangeSaveSet { mode: SaveSetMode, window: WindowId },
    ReparentWindow { window: WindowId, parent: WindowId, x: i16, y: i16 },
    MapWindow { window: WindowId },
    MapSubwindows { window: WindowId },
    UnmapWindow { window: WindowId },
    UnmapSubwindows { window: WindowId },
    ConfigureWindow { window: WindowId, mask: ConfigureMask, values: ConfigureValues },
    CirculateWindow { direction: CirculateDirection, window: WindowId },
    GetGeometry { drawable: DrawableId },
    QueryTree { window: WindowId },
    InternAtom { only_if_exists: bool, name: String },
    GetAtomName { atom: Atom },
    ChangeProperty {
        mode: PropertyMode,
        window: WindowId,
        property: Atom,
        property_type: Atom,
        format: u8,
        data: Vec<u8>,
    },
    DeleteProperty { window: WindowId, property: Atom },
    GetProperty {
        delete: bool,
        window: WindowId,
        property: Atom,
        property_type: Atom,
        long_offset: u32,
        long_length: u32,
    },
    ListProperties { window: WindowId },
    SetSelectionOwner { owner: WindowId, selection: Atom, time: Timestamp },
    GetSelectionOwner { selection: Atom },
    ConvertSelection {
        requestor: WindowId,
        selection: Atom,
        target: Atom,
        property: Atom,
        time: Timestamp,
    },
    SendEvent {
        propagate: bool,
        destination: WindowId,
        event_mask: EventMask,
        event: [u8; 32],
    },
    GrabPointer {
        owner_events: bool,
        grab_window: WindowId,
        event_mask: EventMask,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
        confine_to: WindowId,
        cursor: CursorId,
        time: Timestamp,
    },
    UngrabPointer { time: Timestamp },
    GrabButton {
        owner_events: bool,
        grab_window: WindowId,
        event_mask: EventMask,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
        confine_to: WindowId,
        cursor: CursorId,
        button: Button,
        modifiers: u16,
    },
    UngrabButton { button: Button, grab_window: WindowId, modifiers: u16 },
    ChangeActivePointerGrab { cursor: CursorId, time: Timestamp, event_mask: EventMask },
    GrabKeyboard {
        owner_events: bool,
        grab_window: WindowId,
        time: Timestamp,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
    },
    UngrabKeyboard { time: Timestamp },
    GrabKey {
        owner_events: bool,
        grab_window: WindowId,
        modifiers: u16,
        key: KeyCode,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
    },
    UngrabKey { key: KeyCode, grab_window: WindowId, modifiers: u16 },
    AllowEvents { mode: AllowEventsMode, time: Timestamp },
    GrabServer,
    UngrabServer,
    QueryPointer { window: WindowId },
    GetMotionEvents { window: WindowId, start: Timestamp, stop: Timestamp },
    TranslateCoordinates { src_window: WindowId, dst_window: WindowId, src_x: i16, src_y: i16 },
    WarpPointer {
        src_window: WindowId,
        dst_window: WindowId,
        src_x: i16,
        src_y: i16,
        src_width: u16,
        src_height: u16,
        dst_x: i16,
        dst_y: i16,
    },
    SetInputFocus { revert_to: RevertTo, focus: WindowId, time: Timestamp },
    GetInputFocus,
    QueryKeymap,
    OpenFont { fid: FontId, name: String },
    CloseFont { font: FontId },
    QueryFont { font: FontId },
    QueryTextExtents { font: FontId, text: Vec<u16> },
    ListFonts { max_names: u16, pattern: String },
    ListFontsWithInfo { max_names: u16, pattern: String },
    SetFontPath { paths: Vec<String> },
    GetFontPath,
    CreatePixmap { depth: u8, pid: PixmapId, drawable: DrawableId, width: u16, height: u16 },
    FreePixmap { pixmap: PixmapId },
    CreateGC { cid: GContextId, drawable: DrawableId, mask: GcMask, values: GcValues },
    ChangeGC { gc: GContextId, mask: GcMask, values: GcValues },
    CopyGC { src_gc: GContextId, dst_gc: GContextId, mask: GcMask },
    SetDashes { gc: GContextId, dash_offset: u16, dashes: Vec<u8> },
    SetClipRectangles {
        ordering: u8,
        gc: GContextId,
        clip_x_origin: i16,
        clip_y_origin: i16,
        rectangles: Vec<Rectangle>,
    },
    FreeGC { gc: GContextId },
    ClearArea { exposures: bool, window: WindowId, x: i16, y: i16, width: u16, height: u16 },
    CopyArea {
        src_drawable: DrawableId,
        dst_drawable: DrawableId,
        gc: GContextId,
        src_x: i16,
        src_y: i16,
        dst_x: i16,
        dst_y: i16,
        width: u16,
        height: u16,
    },
    CopyPlane {
        src_drawable: DrawableId,
        dst_drawable: DrawableId,
        gc: GContextId,
        src_x: i16,
        src_y: i16,
        dst_x: i16,
        dst_y: i16,
        width: u16,
        height: u16,
        bit_plane: u32,
    },
    PolyPoint {
        coordinate_mode: CoordinateMode,
        drawable: DrawableId,
        gc: GContextId,
        points: Vec<Point>,
    },
    PolyLine {
        coordinate_mode: CoordinateMode,
        drawable: DrawableId,
        gc: GContextId,
        points: Vec<Point>,
    },
    PolySegment { drawable: DrawableId, gc: GContextId, segments: Vec<Segment> },
    PolyRectangle { drawable: DrawableId, gc: GContextId, rectangles: Vec<Rectangle> },
    PolyArc { drawable: DrawableId, gc: GContextId, arcs: Vec<Arc> },
    FillPoly {
        drawable: DrawableId,
        gc: GContextId,
        shape: PolyShape,
        coordinate_mode: CoordinateMode,
        points: Vec<Point>,
    },
    PolyFillRectangle { drawable: DrawableId, gc: GContextId, rectangles: Vec<Rectangle> },
    PolyFillArc { drawable: DrawableId, gc: GContextId, arcs: Vec<Arc> },
    PutImage {
        format: ImageFormat,
        drawable: DrawableId,
        gc: GContextId,
        width: u16,
        height: u16,
        dst_x: i16,
        dst_y: i16,
        left_pad: u8,
        depth: u8,
        data: Vec<u8>,
    },
    GetImage {
        format: ImageFormat,
        drawable: DrawableId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        plane_mask: u32,
    },
    PolyText8 { drawable: DrawableId, gc: GContextId, x: i16, y: i16, items: Vec<TextItem> },
    PolyText16 { drawable: DrawableId, gc: GContextId, x: i16, y: i16, items: Vec<TextItem> },
    ImageText8 { drawable: DrawableId, gc: GContextId, x: i16, y: i16, text: String },
    ImageText16 { drawable: DrawableId, gc: GContextId, x: i16, y: i16, text: Vec<u16> },
    CreateColormap { alloc_all: bool, mid: ColormapId, window: WindowId, visual: VisualId },
    FreeColormap { colormap: ColormapId },
    CopyColormapAndFree { mid: ColormapId, src_colormap: ColormapId },
    InstallColormap { colormap: ColormapId },
    UninstallColormap { colormap: ColormapId },
    ListInstalledColormaps { window: WindowId },
    AllocColor { colormap: ColormapId, red: u16, green: u16, blue: u16 },
    AllocNamedColor { colormap: ColormapId, name: String },
    AllocColorCells { contiguous: bool, colormap: ColormapId, colors: u16, planes: u16 },
    AllocColorPlanes {
        contiguous: bool,
        colormap: ColormapId,
        colors: u16,
        reds: u16,
        greens: u16,
        blues: u16,
    },
    FreeColors { colormap: ColormapId, plane_mask: u32, pixels: Vec<u32> },
    StoreColors { colormap: ColormapId, items: Vec<ColorItem> },
    StoreNamedColor { flags: ColorFlags, colormap: ColormapId, pixel: u32, name: String },
    QueryColors { colormap: ColormapId, pixels: Vec<u32> },
    LookupColor { colormap: ColormapId, name: String },
    CreateCursor {
        cid: CursorId,
        source: PixmapId,
        mask: PixmapId,
        fore_red: u16,
        fore_green: u16,
        fore_blue: u16,
        back_red: u16,
        back_green: u16,
        back_blue: u16,
        x: u16,
        y: u16,
    },
    CreateGlyphCursor {
        cid: CursorId,
        source_font: FontId,
        mask_font: FontId,
        source_char: u16,
        mask_char: u16,
        fore_red: u16,
        fore_green: u16,
        fore_blue: u16,
        back_red: u16,
        back_green: u16,
        back_blue: u16,
    },
    FreeCursor { cursor: CursorId },
    RecolorCursor {
        cursor: CursorId,
        fore_red: u16,
        fore_green: u16,
        fore_blue: u16,
        back_red: u16,
        back_green: u16,
        back_blue: u16,
    },
    QueryBestSize { class: u8, drawable: DrawableId, width: u16, height: u16 },
    QueryExtension { name: String },
    ListExtensions,
    ChangeKeyboardMapping {
        first_keycode: KeyCode,
        keysyms_per_keycode: u8,
        keysyms: Vec<KeySym>,
    },
    GetKeyboardMapping { first_keycode: KeyCode, count: u8 },
    ChangeKeyboardControl { mask: u32, values: Vec<u32> },
    GetKeyboardControl,
    Bell { percent: i8 },
    ChangePointerControl {
        acceleration_numerator: i16,
        acceleration_denominator: i16,
        threshold: i16,
        do_acceleration: bool,
        do_threshold: bool,
    },
    GetPointerControl,
    SetScreenSaver { timeout: i16, interval: i16, prefer_blanking: u8, allow_exposures: u8 },
    GetScreenSaver,
    ChangeHosts { insert: bool, family: u8, address: Vec<u8> },
    ListHosts,
    SetAccessControl { enabled: bool },
    SetCloseDownMode { mode: CloseDownMode },
    KillClient { resource: XId },
    RotateProperties { window: WindowId, delta: i16, properties: Vec<Atom> },
    ForceScreenSaver { activate: bool },
    SetPointerMapping { map: Vec<u8> },
    GetPointerMapping,
    SetModifierMapping { keycodes_per_modifier: u8, keycodes: Vec<KeyCode> },
    GetModifierMapping,
    NoOperation,
    /// An XInput extension request (major opcode 131).
    XInput(XInputRequest),
}

/// Decode one request body. `header.detail` carries the per-request data
/// byte; `body` is exactly `header.body_len()` bytes.
pub fn decode_request(
    header: RequestHeader,
    body: &[u8],
    order: ByteOrder,
) -> Result<Request, XError> {
    let mut r = WireReader::new(body, order);
    let detail = header.detail;
    let request = match header.opcode {
        opcodes::CREATE_WINDOW => {
            let wid = r.read_u32()?;
            let parent = r.read_u32()?;
            let x = r.read_i16()?;
            let y = r.read_i16()?;
            let width = r.read_u16()?;
            let height = r.read_u16()?;
            let border_width = r.read_u16()?;
            let class_raw = r.read_u16()?;
            let class =
                WindowClass::from_u16(class_raw).ok_or_else(|| XError::value(class_raw as u32))?;
            let visual = r.read_u32()?;
            let mask_raw = r.read_u32()?;
            let mask =
                AttributeMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw))?;
            let values = WindowAttributeValues::decode(&mut r, mask)?;
            Request::CreateWindow {
                depth: detail,
                wid,
                parent,
                x,
                y,
                width,
                height,
                border_width,
                class,
                visual,
                mask,
                values,
            }
        }
        opcodes::CHANGE_WINDOW_ATTRIBUTES => {
            let window = r.read_u32()?;
            let mask_raw = r.read_u32()?;
            let mask =
                AttributeMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw))?;
            let values = WindowAttributeValues::decode(&mut r, mask)?;
            Request::ChangeWindowAttributes { window, mask, values }
        }
        opcodes::GET_WINDOW_ATTRIBUTES => Request::GetWindowAttributes { window: r.read_u32()? },
        opcodes::DESTROY_WINDOW => Request::DestroyWindow { window: r.read_u32()? },
        opcodes::DESTROY_SUBWINDOWS => Request::DestroySubwindows { window: r.read_u32()? },
        opcodes::CHANGE_SAVE_SET => {
            let mode = match detail {
                0 => SaveSetMode::Insert,
                1 => SaveSetMode::Delete,
                other => return Err(XError::value(other as u32)),
            };
            Request::ChangeSaveSet { mode, window: r.read_u32()? }
        }
        opcodes::REPARENT_WINDOW => Request::ReparentWindow {
            window: r.read_u32()?,
            parent: r.read_u32()?,
            x: r.read_i16()?,
            y: r.read_i16()?,
        },
        opcodes::MAP_WINDOW => Request::MapWindow { window: r.read_u32()? },
        opcodes::MAP_SUBWINDOWS => Request::MapSubwindows { window: r.read_u32()? },
        opcodes::UNMAP_WINDOW => Request::UnmapWindow { window: r.read_u32()? },
        opcodes::UNMAP_SUBWINDOWS => Request::UnmapSubwindows { window: r.read_u32()? },
        opcodes::CONFIGURE_WINDOW => {
            let window = r.read_u32()?;
            let mask_raw = r.read_u16()?;
            r.skip(2)?;
            let mask =
                ConfigureMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw as u32))?;
            let values = ConfigureValues::decode(&mut r, mask)?;
            Request::ConfigureWindow { window, mask, values }
        }
        opcodes::CIRCULATE_WINDOW => {
            let direction = match detail {
                0 => CirculateDirection::RaiseLowest,
                1 => CirculateDirection::LowerHighest,
                other => return Err(XError::value(other as u32)),
            };
            Request::CirculateWindow { direction, window: r.read_u32()? }
        }
        opcodes::GET_GEOMETRY => Request::GetGeometry { drawable: r.read_u32()? },
        opcodes::QUERY_TREE => Request::QueryTree { window: r.read_u32()? },
        opcodes::INTERN_ATOM => {
            let name_len = r.read_u16()? as usize;
            r.skip(2)?;
            let name = r.read_string(name_len)?;
            Request::InternAtom { only_if_exists: detail != 0, name }
        }
        opcodes::GET_ATOM_NAME => Request::GetAtomName { atom: r.read_u32()? },
        opcodes::CHANGE_PROPERTY => {
            let mode =
                PropertyMode::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            let window = r.read_u32()?;
            let property = r.read_u32()?;
            let property_type = r.read_u32()?;
            let format = r.read_u8()?;
            if !matches!(format, 8 | 16 | 32) {
                return Err(XError::value(format as u32));
            }
            r.skip(3)?;
            let units = r.read_u32()? as usize;
            let byte_len = units
                .checked_mul(format as usize / 8)
                .ok_or_else(|| XError::length())?;
            let data = r.read_bytes(byte_len)?.to_vec();
            Request::ChangeProperty { mode, window, property, property_type, format, data }
        }
        opcodes::DELETE_PROPERTY => {
            Request::DeleteProperty { window: r.read_u32()?, property: r.read_u32()? }
        }
        opcodes::GET_PROPERTY => Request::GetProperty {
            delete: detail != 0,
            window: r.read_u32()?,
            property: r.read_u32()?,
            property_type: r.read_u32()?,
            long_offset: r.read_u32()?,
            long_length: r.read_u32()?,
        },
        opcodes::LIST_PROPERTIES => Request::ListProperties { window: r.read_u32()? },
        opcodes::SET_SELECTION_OWNER => Request::SetSelectionOwner {
            owner: r.read_u32()?,
            selection: r.read_u32()?,
            time: r.read_u32()?,
        },
        opcodes::GET_SELECTION_OWNER => Request::GetSelectionOwner { selection: r.read_u32()? },
        opcodes::CONVERT_SELECTION => Request::ConvertSelection {
            requestor: r.read_u32()?,
            selection: r.read_u32()?,
            target: r.read_u32()?,
            property: r.read_u32()?,
            time: r.read_u32()?,
        },
        opcodes::SEND_EVENT => {
            let destination = r.read_u32()?;
            let mask_raw = r.read_u32()?;
            let event_mask =
                EventMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw))?;
            let raw = r.read_bytes(32)?;
            let mut event = [0u8; 32];
            event.copy_from_slice(raw);
            Request::SendEvent { propagate: detail != 0, destination, event_mask, event }
        }
        opcodes::GRAB_POINTER => {
            let grab_window = r.read_u32()?;
            let mask_raw = r.read_u16()?;
            let event_mask = EventMask::from_bits(mask_raw as u32)
                .ok_or_else(|| XError::value(mask_raw as u32))?;
            let pointer_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
            let keyboard_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
            Request::GrabPointer {
                owner_events: detail != 0,
                grab_window,
                event_mask,
                pointer_mode,
                keyboard_mode,
                confine_to: r.read_u32()?,
                cursor: r.read_u32()?,
                time: r.read_u32()?,
            }
        }
        opcodes::UNGRAB_POINTER => Request::UngrabPointer { time: r.read_u32()? },
        opcodes::GRAB_BUTTON => {
            let grab_window = r.read_u32()?;
            let mask_raw = r.read_u16()?;
            let event_mask = EventMask::from_bits(mask_raw as u32)
                .ok_or_else(|| XError::value(mask_raw as u32))?;
            let pointer_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
            let keyboard_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
            let confine_to = r.read_u32()?;
            let cursor = r.read_u32()?;
            let button = r.read_u8()?;
            r.skip(1)?;
            let modifiers = r.read_u16()?;
            Request::GrabButton {
                owner_events: detail != 0,
                grab_window,
                event_mask,
                pointer_mode,
                keyboard_mode,
                confine_to,
                cursor,
                button,
                modifiers,
            }
        }
        opcodes::UNGRAB_BUTTON => {
            let grab_window = r.read_u32()?;
            let modifiers = r.read_u16()?;
            Request::UngrabButton { button: detail, grab_window, modifiers }
        }
        opcodes::CHANGE_ACTIVE_POINTER_GRAB => {
            let cursor = r.read_u32()?;
            let time = r.read_u32()?;
            let mask_raw = r.read_u16()?;
            let event_mask = EventMask::from_bits(mask_raw as u32)
                .ok_or_else(|| XError::value(mask_raw as u32))?;
            Request::ChangeActivePointerGrab { cursor, time, event_mask }
        }
        opcodes::GRAB_KEYBOARD => {
            let grab_window = r.read_u32()?;
            let time = r.read_u32()?;
            let pointer_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
            let keyboard_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
            Request::GrabKeyboard {
                owner_events: detail != 0,
                grab_window,
                time,
                pointer_mode,
                keyboard_mode,
            }
        }
        opcodes::UNGRAB_KEYBOARD => Request::UngrabKeyboard { time: r.read_u32()? },
        opcodes::GRAB_KEY => {
            let grab_window = r.read_u32()?;
            let modifiers = r.read_u16()?;
            let key = r.read_u8()?;
            let pointer_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(0))?;
            let keyboard_mode =
                GrabMode::from_u8(r.read_u8()?).ok_or_else(|| XError::value(1))?;
            Request::GrabKey {
                owner_events: detail != 0,
                grab_window,
                modifiers,
                key,
                pointer_mode,
                keyboard_mode,
            }
        }
        opcodes::UNGRAB_KEY => {
            let grab_window = r.read_u32()?;
            let modifiers = r.read_u16()?;
            Request::UngrabKey { key: detail, grab_window, modifiers }
        }
        opcodes::ALLOW_EVENTS => {
            let mode =
                AllowEventsMode::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            Request::AllowEvents { mode, time: r.read_u32()? }
        }
        opcodes::GRAB_SERVER => Request::GrabServer,
        opcodes::UNGRAB_SERVER => Request::UngrabServer,
        opcodes::QUERY_POINTER => Request::QueryPointer { window: r.read_u32()? },
        opcodes::GET_MOTION_EVENTS => Request::GetMotionEvents {
            window: r.read_u32()?,
            start: r.read_u32()?,
            stop: r.read_u32()?,
        },
        opcodes::TRANSLATE_COORDINATES => Request::TranslateCoordinates {
            src_window: r.read_u32()?,
            dst_window: r.read_u32()?,
            src_x: r.read_i16()?,
            src_y: r.read_i16()?,
        },
        opcodes::WARP_POINTER => Request::WarpPointer {
            src_window: r.read_u32()?,
            dst_window: r.read_u32()?,
            src_x: r.read_i16()?,
            src_y: r.read_i16()?,
            src_width: r.read_u16()?,
            src_height: r.read_u16()?,
            dst_x: r.read_i16()?,
            dst_y: r.read_i16()?,
        },
        opcodes::SET_INPUT_FOCUS => {
            let revert_to =
                RevertTo::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            Request::SetInputFocus { revert_to, focus: r.read_u32()?, time: r.read_u32()? }
        }
        opcodes::GET_INPUT_FOCUS => Request::GetInputFocus,
        opcodes::QUERY_KEYMAP => Request::QueryKeymap,
        opcodes::OPEN_FONT => {
            let fid = r.read_u32()?;
            let name_len = r.read_u16()? as usize;
            r.skip(2)?;
            let name = r.read_string(name_len)?;
            Request::OpenFont { fid, name }
        }
        opcodes::CLOSE_FONT => Request::CloseFont { font: r.read_u32()? },
        opcodes::QUERY_FONT => Request::QueryFont { font: r.read_u32()? },
        opcodes::QUERY_TEXT_EXTENTS => {
            let odd_length = detail != 0;
            let font = r.read_u32()?;
            let mut units = r.remaining() / 2;
            if odd_length {
                if units == 0 {
                    return Err(XError::length());
                }
                units -= 1;
            }
            let mut text = Vec::with_capacity(units);
            for _ in 0..units {
                // CHAR2B: byte1 is the most significant byte regardless of
                // the connection byte order.
                let b1 = r.read_u8()?;
                let b2 = r.read_u8()?;
                text.push(((b1 as u16) << 8) | b2 as u16);
            }
            Request::QueryTextExtents { font, text }
        }
        opcodes::LIST_FONTS | opcodes::LIST_FONTS_WITH_INFO => {
            let max_names = r.read_u16()?;
            let pattern_len = r.read_u16()? as usize;
            let pattern = r.read_string(pattern_len)?;
            if header.opcode == opcodes::LIST_FONTS {
                Request::ListFonts { max_names, pattern }
            } else {
                Request::ListFontsWithInfo { max_names, pattern }
            }
        }
        opcodes::SET_FONT_PATH => {
            let count = r.read_u16()? as usize;
            r.skip(2)?;
            let mut paths = Vec::with_capacity(count);
            for _ in 0..count {
                let len = r.read_u8()? as usize;
                paths.push(r.read_string(len)?);
            }
            Request::SetFontPath { paths }
        }
        opcodes::GET_FONT_PATH => Request::GetFontPath,
        opcodes::CREATE_PIXMAP => Request::CreatePixmap {
            depth: detail,
            pid: r.read_u32()?,
            drawable: r.read_u32()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
        },
        opcodes::FREE_PIXMAP => Request::FreePixmap { pixmap: r.read_u32()? },
        opcodes::CREATE_GC => {
            let cid = r.read_u32()?;
            let drawable = r.read_u32()?;
            let mask_raw = r.read_u32()?;
            let mask = GcMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw))?;
            let values = GcValues::decode(&mut r, mask)?;
            Request::CreateGC { cid, drawable, mask, values }
        }
        opcodes::CHANGE_GC => {
            let gc = r.read_u32()?;
            let mask_raw = r.read_u32()?;
            let mask = GcMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw))?;
            let values = GcValues::decode(&mut r, mask)?;
            Request::ChangeGC { gc, mask, values }
        }
        opcodes::COPY_GC => {
            let src_gc = r.read_u32()?;
            let dst_gc = r.read_u32()?;
            let mask_raw = r.read_u32()?;
            let mask = GcMask::from_bits(mask_raw).ok_or_else(|| XError::value(mask_raw))?;
            Request::CopyGC { src_gc, dst_gc, mask }
        }
        opcodes::SET_DASHES => {
            let gc = r.read_u32()?;
            let dash_offset = r.read_u16()?;
            let dash_len = r.read_u16()? as usize;
            let dashes = r.read_bytes(dash_len)?.to_vec();
            Request::SetDashes { gc, dash_offset, dashes }
        }
        opcodes::SET_CLIP_RECTANGLES => {
            let gc = r.read_u32()?;
            let clip_x_origin = r.read_i16()?;
            let clip_y_origin = r.read_i16()?;
            let rectangles = read_rectangles(&mut r)?;
            Request::SetClipRectangles { ordering: detail, gc, clip_x_origin, clip_y_origin, rectangles }
        }
        opcodes::FREE_GC => Request::FreeGC { gc: r.read_u32()? },
        opcodes::CLEAR_AREA => Request::ClearArea {
            exposures: detail != 0,
            window: r.read_u32()?,
            x: r.read_i16()?,
            y: r.read_i16()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
        },
        opcodes::COPY_AREA => Request::CopyArea {
            src_drawable: r.read_u32()?,
            dst_drawable: r.read_u32()?,
            gc: r.read_u32()?,
            src_x: r.read_i16()?,
            src_y: r.read_i16()?,
            dst_x: r.read_i16()?,
            dst_y: r.read_i16()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
        },
        opcodes::COPY_PLANE => Request::CopyPlane {
            src_drawable: r.read_u32()?,
            dst_drawable: r.read_u32()?,
            gc: r.read_u32()?,
            src_x: r.read_i16()?,
            src_y: r.read_i16()?,
            dst_x: r.read_i16()?,
            dst_y: r.read_i16()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
            bit_plane: r.read_u32()?,
        },
        opcodes::POLY_POINT | opcodes::POLY_LINE => {
            let coordinate_mode =
                CoordinateMode::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let points = read_points(&mut r)?;
            if header.opcode == opcodes::POLY_POINT {
                Request::PolyPoint { coordinate_mode, drawable, gc, points }
            } else {
                Request::PolyLine { coordinate_mode, drawable, gc, points }
            }
        }
        opcodes::POLY_SEGMENT => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let mut segments = Vec::with_capacity(r.remaining() / 8);
            while r.remaining() >= 8 {
                segments.push(Segment {
                    x1: r.read_i16()?,
                    y1: r.read_i16()?,
                    x2: r.read_i16()?,
                    y2: r.read_i16()?,
                });
            }
            Request::PolySegment { drawable, gc, segments }
        }
        opcodes::POLY_RECTANGLE | opcodes::POLY_FILL_RECTANGLE => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let rectangles = read_rectangles(&mut r)?;
            if header.opcode == opcodes::POLY_RECTANGLE {
                Request::PolyRectangle { drawable, gc, rectangles }
            } else {
                Request::PolyFillRectangle { drawable, gc, rectangles }
            }
        }
        opcodes::POLY_ARC | opcodes::POLY_FILL_ARC => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let mut arcs = Vec::with_capacity(r.remaining() / 12);
            while r.remaining() >= 12 {
                arcs.push(Arc {
                    x: r.read_i16()?,
                    y: r.read_i16()?,
                    width: r.read_u16()?,
                    height: r.read_u16()?,
                    angle1: r.read_i16()?,
                    angle2: r.read_i16()?,
                });
            }
            if header.opcode == opcodes::POLY_ARC {
                Request::PolyArc { drawable, gc, arcs }
            } else {
                Request::PolyFillArc { drawable, gc, arcs }
            }
        }
        opcodes::FILL_POLY => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let shape_raw = r.read_u8()?;
            let shape =
                PolyShape::from_u8(shape_raw).ok_or_else(|| XError::value(shape_raw as u32))?;
            let mode_raw = r.read_u8()?;
            let coordinate_mode = CoordinateMode::from_u8(mode_raw)
                .ok_or_else(|| XError::value(mode_raw as u32))?;
            r.skip(2)?;
            let points = read_points(&mut r)?;
            Request::FillPoly { drawable, gc, shape, coordinate_mode, points }
        }
        opcodes::PUT_IMAGE => {
            let format =
                ImageFormat::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let width = r.read_u16()?;
            let height = r.read_u16()?;
            let dst_x = r.read_i16()?;
            let dst_y = r.read_i16()?;
            let left_pad = r.read_u8()?;
            let depth = r.read_u8()?;
            r.skip(2)?;
            let data = r.read_bytes(r.remaining())?.to_vec();
            Request::PutImage {
                format,
                drawable,
                gc,
                width,
                height,
                dst_x,
                dst_y,
                left_pad,
                depth,
                data,
            }
        }
        opcodes::GET_IMAGE => {
            let format =
                ImageFormat::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            Request::GetImage {
                format,
                drawable: r.read_u32()?,
                x: r.read_i16()?,
                y: r.read_i16()?,
                width: r.read_u16()?,
                height: r.read_u16()?,
                plane_mask: r.read_u32()?,
            }
        }
        opcodes::POLY_TEXT8 | opcodes::POLY_TEXT16 => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let x = r.read_i16()?;
            let y = r.read_i16()?;
            let wide = header.opcode == opcodes::POLY_TEXT16;
            let items = read_text_items(&mut r, wide)?;
            if wide {
                Request::PolyText16 { drawable, gc, x, y, items }
            } else {
                Request::PolyText8 { drawable, gc, x, y, items }
            }
        }
        opcodes::IMAGE_TEXT8 => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let x = r.read_i16()?;
            let y = r.read_i16()?;
            let text = r.read_string(detail as usize)?;
            Request::ImageText8 { drawable, gc, x, y, text }
        }
        opcodes::IMAGE_TEXT16 => {
            let drawable = r.read_u32()?;
            let gc = r.read_u32()?;
            let x = r.read_i16()?;
            let y = r.read_i16()?;
            let mut text = Vec::with_capacity(detail as usize);
            for _ in 0..detail {
                let b1 = r.read_u8()?;
                let b2 = r.read_u8()?;
                text.push(((b1 as u16) << 8) | b2 as u16);
            }
            Request::ImageText16 { drawable, gc, x, y, text }
        }
        opcodes::CREATE_COLORMAP => Request::CreateColormap {
            alloc_all: detail != 0,
            mid: r.read_u32()?,
            window: r.read_u32()?,
            visual: r.read_u32()?,
        },
        opcodes::FREE_COLORMAP => Request::FreeColormap { colormap: r.read_u32()? },
        opcodes::COPY_COLORMAP_AND_FREE => {
            Request::CopyColormapAndFree { mid: r.read_u32()?, src_colormap: r.read_u32()? }
        }
        opcodes::INSTALL_COLORMAP => Request::InstallColormap { colormap: r.read_u32()? },
        opcodes::UNINSTALL_COLORMAP => Request::UninstallColormap { colormap: r.read_u32()? },
        opcodes::LIST_INSTALLED_COLORMAPS => {
            Request::ListInstalledColormaps { window: r.read_u32()? }
        }
        opcodes::ALLOC_COLOR => Request::AllocColor {
            colormap: r.read_u32()?,
            red: r.read_u16()?,
            green: r.read_u16()?,
            blue: r.read_u16()?,
        },
        opcodes::ALLOC_NAMED_COLOR => {
            let colormap = r.read_u32()?;
            let name_len = r.read_u16()? as usize;
            r.skip(2)?;
            let name = r.read_string(name_len)?;
            Request::AllocNamedColor { colormap, name }
        }
        opcodes::ALLOC_COLOR_CELLS => Request::AllocColorCells {
            contiguous: detail != 0,
            colormap: r.read_u32()?,
            colors: r.read_u16()?,
            planes: r.read_u16()?,
        },
        opcodes::ALLOC_COLOR_PLANES => Request::AllocColorPlanes {
            contiguous: detail != 0,
            colormap: r.read_u32()?,
            colors: r.read_u16()?,
            reds: r.read_u16()?,
            greens: r.read_u16()?,
            blues: r.read_u16()?,
        },
        opcodes::FREE_COLORS => {
            let colormap = r.read_u32()?;
            let plane_mask = r.read_u32()?;
            let mut pixels = Vec::with_capacity(r.remaining() / 4);
            while r.remaining() >= 4 {
                pixels.push(r.read_u32()?);
            }
            Request::FreeColors { colormap, plane_mask, pixels }
        }
        opcodes::STORE_COLORS => {
            let colormap = r.read_u32()?;
            let mut items = Vec::with_capacity(r.remaining() / 12);
            while r.remaining() >= 12 {
                let pixel = r.read_u32()?;
                let red = r.read_u16()?;
                let green = r.read_u16()?;
                let blue = r.read_u16()?;
                let flags_raw = r.read_u8()?;
                r.skip(1)?;
                let flags = ColorFlags::from_bits(flags_raw)
                    .ok_or_else(|| XError::value(flags_raw as u32))?;
                items.push(ColorItem { pixel, red, green, blue, flags });
            }
            Request::StoreColors { colormap, items }
        }
        opcodes::STORE_NAMED_COLOR => {
            let flags =
                ColorFlags::from_bits(detail).ok_or_else(|| XError::value(detail as u32))?;
            let colormap = r.read_u32()?;
            let pixel = r.read_u32()?;
            let name_len = r.read_u16()? as usize;
            r.skip(2)?;
            let name = r.read_string(name_len)?;
            Request::StoreNamedColor { flags, colormap, pixel, name }
        }
        opcodes::QUERY_COLORS => {
            let colormap = r.read_u32()?;
            let mut pixels = Vec::with_capacity(r.remaining() / 4);
            while r.remaining() >= 4 {
                pixels.push(r.read_u32()?);
            }
            Request::QueryColors { colormap, pixels }
        }
        opcodes::LOOKUP_COLOR => {
            let colormap = r.read_u32()?;
            let name_len = r.read_u16()? as usize;
            r.skip(2)?;
            let name = r.read_string(name_len)?;
            Request::LookupColor { colormap, name }
        }
        opcodes::CREATE_CURSOR => Request::CreateCursor {
            cid: r.read_u32()?,
            source: r.read_u32()?,
            mask: r.read_u32()?,
            fore_red: r.read_u16()?,
            fore_green: r.read_u16()?,
            fore_blue: r.read_u16()?,
            back_red: r.read_u16()?,
            back_green: r.read_u16()?,
            back_blue: r.read_u16()?,
            x: r.read_u16()?,
            y: r.read_u16()?,
        },
        opcodes::CREATE_GLYPH_CURSOR => Request::CreateGlyphCursor {
            cid: r.read_u32()?,
            source_font: r.read_u32()?,
            mask_font: r.read_u32()?,
            source_char: r.read_u16()?,
            mask_char: r.read_u16()?,
            fore_red: r.read_u16()?,
            fore_green: r.read_u16()?,
            fore_blue: r.read_u16()?,
            back_red: r.read_u16()?,
            back_green: r.read_u16()?,
            back_blue: r.read_u16()?,
        },
        opcodes::FREE_CURSOR => Request::FreeCursor { cursor: r.read_u32()? },
        opcodes::RECOLOR_CURSOR => Request::RecolorCursor {
            cursor: r.read_u32()?,
            fore_red: r.read_u16()?,
            fore_green: r.read_u16()?,
            fore_blue: r.read_u16()?,
            back_red: r.read_u16()?,
            back_green: r.read_u16()?,
            back_blue: r.read_u16()?,
        },
        opcodes::QUERY_BEST_SIZE => Request::QueryBestSize {
            class: detail,
            drawable: r.read_u32()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
        },
        opcodes::QUERY_EXTENSION => {
            let name_len = r.read_u16()? as usize;
            r.skip(2)?;
            let name = r.read_string(name_len)?;
            Request::QueryExtension { name }
        }
        opcodes::LIST_EXTENSIONS => Request::ListExtensions,
        opcodes::CHANGE_KEYBOARD_MAPPING => {
            let keycode_count = detail as usize;
            let first_keycode = r.read_u8()?;
            let keysyms_per_keycode = r.read_u8()?;
            r.skip(2)?;
            let total = keycode_count
                .checked_mul(keysyms_per_keycode as usize)
                .ok_or_else(|| XError::length())?;
            let mut keysyms = Vec::with_capacity(total);
            for _ in 0..total {
                keysyms.push(r.read_u32()?);
            }
            Request::ChangeKeyboardMapping { first_keycode, keysyms_per_keycode, keysyms }
        }
        opcodes::GET_KEYBOARD_MAPPING => {
            Request::GetKeyboardMapping { first_keycode: r.read_u8()?, count: r.read_u8()? }
        }
        opcodes::CHANGE_KEYBOARD_CONTROL => {
            let mask = r.read_u32()?;
            let mut values = Vec::with_capacity(r.remaining() / 4);
            while r.remaining() >= 4 {
                values.push(r.read_u32()?);
            }
            Request::ChangeKeyboardControl { mask, values }
        }
        opcodes::GET_KEYBOARD_CONTROL => Request::GetKeyboardControl,
        opcodes::BELL => Request::Bell { percent: detail as i8 },
        opcodes::CHANGE_POINTER_CONTROL => Request::ChangePointerControl {
            acceleration_numerator: r.read_i16()?,
            acceleration_denominator: r.read_i16()?,
            threshold: r.read_i16()?,
            do_acceleration: r.read_bool()?,
            do_threshold: r.read_bool()?,
        },
        opcodes::GET_POINTER_CONTROL => Request::GetPointerControl,
        opcodes::SET_SCREEN_SAVER => Request::SetScreenSaver {
            timeout: r.read_i16()?,
            interval: r.read_i16()?,
            prefer_blanking: r.read_u8()?,
            allow_exposures: r.read_u8()?,
        },
        opcodes::GET_SCREEN_SAVER => Request::GetScreenSaver,
        opcodes::CHANGE_HOSTS => {
            let family = r.read_u8()?;
            r.skip(1)?;
            let addr_len = r.read_u16()? as usize;
            let address = r.read_bytes(addr_len)?.to_vec();
            Request::ChangeHosts { insert: detail == 0, family, address }
        }
        opcodes::LIST_HOSTS => Request::ListHosts,
        opcodes::SET_ACCESS_CONTROL => Request::SetAccessControl { enabled: detail != 0 },
        opcodes::SET_CLOSE_DOWN_MODE => {
            let mode =
                CloseDownMode::from_u8(detail).ok_or_else(|| XError::value(detail as u32))?;
            Request::SetCloseDownMode { mode }
        }
        opcodes::KILL_CLIENT => Request::KillClient { resource: r.read_u32()? },
        opcodes::ROTATE_PROPERTIES => {
            let window = r.read_u32()?;
            let count = r.read_u16()? as usize;
            let delta = r.read_i16()?;
            let mut properties = Vec::with_capacity(count);
            for _ in 0..count {
                properties.push(r.read_u32()?);
            }
            Request::RotateProperties { window, delta, properties }
        }
        opcodes::FORCE_SCREEN_SAVER => Request::ForceScreenSaver { activate: detail == 1 },
        opcodes::SET_POINTER_MAPPING => {
            let map = r.read_bytes(detail as usize)?.to_vec();
            Request::SetPointerMapping { map }
        }
        opcodes::GET_POINTER_MAPPING => Request::GetPointerMapping,
        opcodes::SET_MODIFIER_MAPPING => {
            let total = (detail as usize).checked_mul(8).ok_or_else(|| XError::length())?;
            let keycodes = r.read_bytes(total)?.to_vec();
            Request::SetModifierMapping { keycodes_per_modifier: detail, keycodes }
        }
        opcodes::GET_MODIFIER_MAPPING => Request::GetModifierMapping,
        opcodes::NO_OPERATION => Request::NoOperation,
        opcodes::XINPUT_MAJOR => {
            Request::XInput(XInputRequest::decode(detail, &mut r)?)
        }
        _ => return Err(XError::request()),
    };
    Ok(request)
}

fn read_points(r: &mut WireReader<'_>) -> Result<Vec<Point>, XError> {
    let mut points = Vec::with_capacity(r.remaining() / 4);
    while r.remaining() >= 4 {
        points.push(Point { x: r.read_i16()?, y: r.read_i16()? });
    }
    Ok(points)
}

fn read_rectangles(r: &mut WireReader<'_>) -> Result<Vec<Rectangle>, XError> {
    let mut rectangles = Vec::with_capacity(r.remaining() / 8);
    while r.remaining() >= 8 {
        rectangles.push(Rectangle {
            x: r.read_i16()?,
            y: r.read_i16()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
        });
    }
    Ok(rectangles)
}

/// Parse PolyText items. A length byte of 255 introduces a font shift
/// whose four id bytes are MSB-first; anything shorter is a glyph run
/// preceded by a signed delta. Trailing pad bytes (fewer than the two
/// bytes a run header needs) terminate the list.
fn read_text_items(r: &mut WireReader<'_>, wide: bool) -> Result<Vec<TextItem>, XError> {
    let mut items = Vec::new();
    while r.remaining() >= 2 {
        let len = r.read_u8()?;
        if len == 255 {
            let b = r.read_bytes(4)?;
            let font =
                ((b[0] as u32) << 24) | ((b[1] as u32) << 16) | ((b[2] as u32) << 8) | b[3] as u32;
            items.push(TextItem::FontShift(font));
            continue;
        }
        let delta = r.read_i8()?;
        let count = len as usize;
        let mut text = Vec::with_capacity(count);
        if wide {
            for _ in 0..count {
                let b1 = r.read_u8()?;
                let b2 = r.read_u8()?;
                text.push(((b1 as u16) << 8) | b2 as u16);
            }
        } else {
            for byte in r.read_bytes(count)? {
                text.push(*byte as u16);
            }
        }
        items.push(TextItem::Run { delta, text });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire::WireWriter;

    fn body(build: impl FnOnce(&mut WireWriter)) -> Vec<u8> {
        let mut w = WireWriter::new(ByteOrder::LittleEndian);
        build(&mut w);
        w.into_bytes().to_vec()
    }

    fn decode(opcode: u8, detail: u8, body: &[u8]) -> Result<Request, XError> {
        let header =
            RequestHeader { opcode, detail, length: (4 + body.len() as u16) / 4 };
        decode_request(header, body, ByteOrder::LittleEndian)
    }

    #[test]
    fn header_length_arithmetic() {
        let header = RequestHeader::decode([1, 24, 0x0a, 0x00], ByteOrder::LittleEndian);
        assert_eq!(header.opcode, 1);
        assert_eq!(header.detail, 24);
        assert_eq!(header.length, 10);
        assert_eq!(header.body_len(), 36);
    }

    #[test]
    fn decode_create_window_with_values() {
        let data = body(|w| {
            w.write_u32(0x0010_0001); // wid
            w.write_u32(0x0020_0001); // parent
            w.write_i16(5);
            w.write_i16(6);
            w.write_u16(800);
            w.write_u16(600);
            w.write_u16(0); // border
            w.write_u16(1); // InputOutput
            w.write_u32(1); // visual
            w.write_u32((AttributeMask::BACKGROUND_PIXEL | AttributeMask::EVENT_MASK).bits());
            w.write_u32(0x00ff_0000);
            w.write_u32(EventMask::EXPOSURE.bits());
        });
        match decode(opcodes::CREATE_WINDOW, 24, &data).unwrap() {
            Request::CreateWindow { depth, wid, width, values, .. } => {
                assert_eq!(depth, 24);
                assert_eq!(wid, 0x0010_0001);
                assert_eq!(width, 800);
                assert_eq!(values.background_pixel, Some(0x00ff_0000));
                assert_eq!(values.event_mask, Some(EventMask::EXPOSURE));
                assert_eq!(values.cursor, None);
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn truncated_value_list_is_length_error() {
        let data = body(|w| {
            w.write_u32(0x0010_0001);
            w.write_u32((AttributeMask::BACKGROUND_PIXEL | AttributeMask::BORDER_PIXEL).bits());
            w.write_u32(0); // only one of the two declared values
        });
        let err = decode(opcodes::CHANGE_WINDOW_ATTRIBUTES, 0, &data).unwrap_err();
        assert_eq!(err.code, crate::protocol::errors::ErrorCode::Length);
    }

    #[test]
    fn decode_intern_atom() {
        let data = body(|w| {
            w.write_u16(7);
            w.write_u16(0);
            w.write_string_padded("WM_NAME");
        });
        match decode(opcodes::INTERN_ATOM, 0, &data).unwrap() {
            Request::InternAtom { only_if_exists, name } => {
                assert!(!only_if_exists);
                assert_eq!(name, "WM_NAME");
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn change_property_format_units() {
        let data = body(|w| {
            w.write_u32(0x0010_0001);
            w.write_u32(39); // WM_NAME
            w.write_u32(31); // STRING
            w.write_u8(8);
            w.write_zeros(3);
            w.write_u32(5);
            w.write_string_padded("xterm");
        });
        match decode(opcodes::CHANGE_PROPERTY, 0, &data).unwrap() {
            Request::ChangeProperty { format, data, .. } => {
                assert_eq!(format, 8);
                assert_eq!(data, b"xterm");
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn change_property_bad_format() {
        let data = body(|w| {
            w.write_u32(1);
            w.write_u32(39);
            w.write_u32(31);
            w.write_u8(7); // not 8/16/32
            w.write_zeros(3);
            w.write_u32(0);
        });
        let err = decode(opcodes::CHANGE_PROPERTY, 0, &data).unwrap_err();
        assert_eq!(err.code, crate::protocol::errors::ErrorCode::Value);
    }

    #[test]
    fn decode_configure_window_in_mask_order() {
        let data = body(|w| {
            w.write_u32(0x0010_0001);
            w.write_u16((ConfigureMask::X | ConfigureMask::STACK_MODE).bits());
            w.write_u16(0);
            w.write_u32(-3i32 as u32);
            w.write_u32(1); // Below
        });
        match decode(opcodes::CONFIGURE_WINDOW, 0, &data).unwrap() {
            Request::ConfigureWindow { values, .. } => {
                assert_eq!(values.x, Some(-3));
                assert_eq!(values.stack_mode, Some(StackMode::Below));
                assert_eq!(values.width, None);
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn decode_poly_line_points() {
        let data = body(|w| {
            w.write_u32(0x0010_0001);
            w.write_u32(0x0010_0002);
            w.write_i16(0);
            w.write_i16(0);
            w.write_i16(10);
            w.write_i16(20);
        });
        match decode(opcodes::POLY_LINE, 0, &data).unwrap() {
            Request::PolyLine { points, .. } => {
                assert_eq!(points, vec![Point { x: 0, y: 0 }, Point { x: 10, y: 20 }]);
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn decode_poly_text_items() {
        let data = body(|w| {
            w.write_u8(2); // run of 2
            w.write_i8(3); // delta
            w.write_bytes(b"ab");
            w.write_u8(255); // font shift
            w.write_bytes(&[0x00, 0x10, 0x00, 0x07]);
            w.write_u8(0); // empty run consumes the pad
            w.write_i8(0);
        });
        match decode(opcodes::POLY_TEXT8, 0, &data).unwrap() {
            Request::PolyText8 { items, .. } => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0], TextItem::Run { delta: 3, text: vec![b'a' as u16, b'b' as u16] });
                assert_eq!(items[1], TextItem::FontShift(0x0010_0007));
            }
            other => panic!("wrong request: {other:?}"),
        }
    }

    #[test]
    fn unknown_opcode_is_request_error() {
        let err = decode(126, 0, &[]).unwrap_err();
        assert_eq!(err.code, crate::protocol::errors::ErrorCode::Request);
    }

    #[test]
    fn big_endian_request_body() {
        let mut w = WireWriter::new(ByteOrder::BigEndian);
        w.write_u32(0x0010_0004);
        let header = RequestHeader { opcode: opcodes::MAP_WINDOW, detail: 0, length: 2 };
        match decode_request(header, &w.into_bytes(), ByteOrder::BigEndian).unwrap() {
            Request::MapWindow { window } => assert_eq!(window, 0x0010_0004),
            other => panic!("wrong request: {other:?}"),
        }
    }
}
