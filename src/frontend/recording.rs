//! The testing front-end: records every capability call verbatim.

use parking_lot::Mutex;

use super::{Frontend, TextExtents};
use crate::protocol::replies::{CharInfo, FontInfo};
use crate::protocol::requests::{TextItem, WindowAttributeValues};
use crate::protocol::types::*;
use crate::resources::cursor::CursorRecord;
use crate::resources::gcontext::GContext;

/// One recorded front-end invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendCall {
    CreateWindow { window: WindowId, parent: WindowId, geometry: Rectangle, border_width: u16 },
    DestroyWindow { window: WindowId },
    MapWindow { window: WindowId },
    UnmapWindow { window: WindowId },
    ConfigureWindow { window: WindowId, geometry: Rectangle, border_width: u16 },
    ChangeWindowAttributes { window: WindowId, mask: AttributeMask },
    SetWindowCursor { window: WindowId, cursor: CursorId },
    SetWindowTitle { window: WindowId, title: String },
    PolyPoint { drawable: DrawableId, count: usize },
    PolyLine { drawable: DrawableId, points: Vec<Point> },
    PolySegment { drawable: DrawableId, count: usize },
    PolyRectangle { drawable: DrawableId, count: usize },
    PolyFillRectangle { drawable: DrawableId, rectangles: Vec<Rectangle> },
    PolyArc { drawable: DrawableId, count: usize },
    PolyFillArc { drawable: DrawableId, count: usize },
    FillPoly { drawable: DrawableId, count: usize },
    PutImage { drawable: DrawableId, geometry: Rectangle, depth: u8, bytes: usize },
    GetImage { drawable: DrawableId, geometry: Rectangle },
    CopyArea { src: DrawableId, dst: DrawableId, width: u16, height: u16 },
    CopyPlane { src: DrawableId, dst: DrawableId, bit_plane: u32 },
    ClearArea { window: WindowId, area: Rectangle },
    ImageText8 { drawable: DrawableId, x: i16, y: i16, text: String },
    ImageText16 { drawable: DrawableId, x: i16, y: i16, text: Vec<u16> },
    PolyText8 { drawable: DrawableId, items: usize },
    PolyText16 { drawable: DrawableId, items: usize },
    CreatePixmap { pixmap: PixmapId, width: u16, height: u16, depth: u8 },
    FreePixmap { pixmap: PixmapId },
    CreateGc { gc: GContextId },
    ChangeGc { gc: GContextId, mask: GcMask },
    FreeGc { gc: GContextId },
    CreateCursor { cursor: CursorId },
    CreateGlyphCursor { cursor: CursorId, source_font: FontId },
    FreeCursor { cursor: CursorId },
    OpenFont { font: FontId, name: String },
    CloseFont { font: FontId },
    Bell { percent: i8 },
    WarpPointer { root_x: i16, root_y: i16 },
}

/// Front-end that performs nothing and remembers everything.
#[derive(Default)]
pub struct RecordingFrontend {
    calls: Mutex<Vec<FrontendCall>>,
    /// Optional canned font metrics returned by `query_font`.
    pub font_info: Mutex<Option<(FontInfo, Vec<CharInfo>)>>,
    /// Optional canned font list returned by `list_fonts`.
    pub fonts: Mutex<Vec<String>>,
}

impl RecordingFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: FrontendCall) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<FrontendCall> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<FrontendCall> {
        std::mem::take(&mut self.calls.lock())
    }
}

impl Frontend for RecordingFrontend {
    fn create_window(
        &self,
        window: WindowId,
        parent: WindowId,
        geometry: Rectangle,
        border_width: u16,
        _override_redirect: bool,
    ) {
        self.record(FrontendCall::CreateWindow { window, parent, geometry, border_width });
    }

    fn destroy_window(&self, window: WindowId) {
        self.record(FrontendCall::DestroyWindow { window });
    }

    fn map_window(&self, window: WindowId) {
        self.record(FrontendCall::MapWindow { window });
    }

    fn unmap_window(&self, window: WindowId) {
        self.record(FrontendCall::UnmapWindow { window });
    }

    fn configure_window(
        &self,
        window: WindowId,
        geometry: Rectangle,
        border_width: u16,
        _sibling: Option<WindowId>,
        _stack_mode: Option<StackMode>,
    ) {
        self.record(FrontendCall::ConfigureWindow { window, geometry, border_width });
    }

    fn change_window_attributes(
        &self,
        window: WindowId,
        mask: AttributeMask,
        _values: &WindowAttributeValues,
    ) {
        self.record(FrontendCall::ChangeWindowAttributes { window, mask });
    }

    fn set_window_cursor(&self, window: WindowId, cursor: CursorId) {
        self.record(FrontendCall::SetWindowCursor { window, cursor });
    }

    fn set_window_title(&self, window: WindowId, title: &str) {
        self.record(FrontendCall::SetWindowTitle { window, title: title.to_string() });
    }

    fn poly_point(&self, drawable: DrawableId, _gc: &GContext, _mode: CoordinateMode, points: &[Point]) {
        self.record(FrontendCall::PolyPoint { drawable, count: points.len() });
    }

    fn poly_line(&self, drawable: DrawableId, _gc: &GContext, _mode: CoordinateMode, points: &[Point]) {
        self.record(FrontendCall::PolyLine { drawable, points: points.to_vec() });
    }

    fn poly_segment(&self, drawable: DrawableId, _gc: &GContext, segments: &[Segment]) {
        self.record(FrontendCall::PolySegment { drawable, count: segments.len() });
    }

    fn poly_rectangle(&self, drawable: DrawableId, _gc: &GContext, rectangles: &[Rectangle]) {
        self.record(FrontendCall::PolyRectangle { drawable, count: rectangles.len() });
    }

    fn poly_fill_rectangle(&self, drawable: DrawableId, _gc: &GContext, rectangles: &[Rectangle]) {
        self.record(FrontendCall::PolyFillRectangle { drawable, rectangles: rectangles.to_vec() });
    }

    fn poly_arc(&self, drawable: DrawableId, _gc: &GContext, arcs: &[Arc]) {
        self.record(FrontendCall::PolyArc { drawable, count: arcs.len() });
    }

    fn poly_fill_arc(&self, drawable: DrawableId, _gc: &GContext, arcs: &[Arc]) {
        self.record(FrontendCall::PolyFillArc { drawable, count: arcs.len() });
    }

    fn fill_poly(
        &self,
        drawable: DrawableId,
        _gc: &GContext,
        _shape: PolyShape,
        _mode: CoordinateMode,
        points: &[Point],
    ) {
        self.record(FrontendCall::FillPoly { drawable, count: points.len() });
    }

    fn put_image(
        &self,
        drawable: DrawableId,
        _gc: &GContext,
        _format: ImageFormat,
        depth: u8,
        geometry: Rectangle,
        _left_pad: u8,
        data: &[u8],
    ) {
        self.record(FrontendCall::PutImage { drawable, geometry, depth, bytes: data.len() });
    }

    fn get_image(
        &self,
        drawable: DrawableId,
        _format: ImageFormat,
        geometry: Rectangle,
        _plane_mask: u32,
    ) -> Option<Vec<u8>> {
        self.record(FrontendCall::GetImage { drawable, geometry });
        let bytes = geometry.width as usize * geometry.height as usize * 4;
        Some(vec![0; bytes])
    }

    fn copy_area(
        &self,
        src: DrawableId,
        dst: DrawableId,
        _gc: &GContext,
        _src_x: i16,
        _src_y: i16,
        _dst_x: i16,
        _dst_y: i16,
        width: u16,
        height: u16,
    ) {
        self.record(FrontendCall::CopyArea { src, dst, width, height });
    }

    fn copy_plane(
        &self,
        src: DrawableId,
        dst: DrawableId,
        _gc: &GContext,
        _src_x: i16,
        _src_y: i16,
        _dst_x: i16,
        _dst_y: i16,
        _width: u16,
        _height: u16,
        bit_plane: u32,
    ) {
        self.record(FrontendCall::CopyPlane { src, dst, bit_plane });
    }

    fn clear_area(&self, window: WindowId, area: Rectangle) {
        self.record(FrontendCall::ClearArea { window, area });
    }

    fn image_text8(&self, drawable: DrawableId, _gc: &GContext, x: i16, y: i16, text: &str) {
        self.record(FrontendCall::ImageText8 { drawable, x, y, text: text.to_string() });
    }

    fn image_text16(&self, drawable: DrawableId, _gc: &GContext, x: i16, y: i16, text: &[u16]) {
        self.record(FrontendCall::ImageText16 { drawable, x, y, text: text.to_vec() });
    }

    fn poly_text8(&self, drawable: DrawableId, _gc: &GContext, _x: i16, _y: i16, items: &[TextItem]) {
        self.record(FrontendCall::PolyText8 { drawable, items: items.len() });
    }

    fn poly_text16(&self, drawable: DrawableId, _gc: &GContext, _x: i16, _y: i16, items: &[TextItem]) {
        self.record(FrontendCall::PolyText16 { drawable, items: items.len() });
    }

    fn create_pixmap(&self, pixmap: PixmapId, _drawable: DrawableId, width: u16, height: u16, depth: u8) {
        self.record(FrontendCall::CreatePixmap { pixmap, width, height, depth });
    }

    fn free_pixmap(&self, pixmap: PixmapId) {
        self.record(FrontendCall::FreePixmap { pixmap });
    }

    fn create_gc(&self, gc: &GContext) {
        self.record(FrontendCall::CreateGc { gc: gc.id });
    }

    fn change_gc(&self, gc: &GContext, mask: GcMask) {
        self.record(FrontendCall::ChangeGc { gc: gc.id, mask });
    }

    fn free_gc(&self, gc: GContextId) {
        self.record(FrontendCall::FreeGc { gc });
    }

    fn create_cursor(&self, cursor: &CursorRecord, _source: PixmapId, _mask: PixmapId, _x: u16, _y: u16) {
        self.record(FrontendCall::CreateCursor { cursor: cursor.id });
    }

    fn create_glyph_cursor(&self, cursor: &CursorRecord, source_font: FontId, _mask_font: FontId) {
        self.record(FrontendCall::CreateGlyphCursor { cursor: cursor.id, source_font });
    }

    fn free_cursor(&self, cursor: CursorId) {
        self.record(FrontendCall::FreeCursor { cursor });
    }

    fn open_font(&self, font: FontId, name: &str) {
        self.record(FrontendCall::OpenFont { font, name: name.to_string() });
    }

    fn close_font(&self, font: FontId) {
        self.record(FrontendCall::CloseFont { font });
    }

    fn query_font(&self, _font: FontId) -> Option<(FontInfo, Vec<CharInfo>)> {
        self.font_info.lock().clone()
    }

    fn measure_text(&self, _font: FontId, text: &[u16]) -> Option<TextExtents> {
        // Fixed-cell metrics keep extent tests deterministic.
        Some(TextExtents {
            font_ascent: 11,
            font_descent: 2,
            overall_ascent: 11,
            overall_descent: 2,
            overall_width: 6 * text.len() as i32,
            overall_left: 0,
            overall_right: 6 * text.len() as i32,
        })
    }

    fn list_fonts(&self, pattern: &str, max_names: usize) -> Vec<String> {
        let matches_all = pattern == "*" || pattern.is_empty();
        self.fonts
            .lock()
            .iter()
            .filter(|name| matches_all || name.contains(pattern.trim_matches('*')))
            .take(max_names)
            .cloned()
            .collect()
    }

    fn bell(&self, percent: i8) {
        self.record(FrontendCall::Bell { percent });
    }

    fn warp_pointer(&self, root_x: i16, root_y: i16) {
        self.record(FrontendCall::WarpPointer { root_x, root_y });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_call_order() {
        let frontend = RecordingFrontend::new();
        frontend.map_window(5);
        frontend.bell(50);
        assert_eq!(
            frontend.calls(),
            vec![FrontendCall::MapWindow { window: 5 }, FrontendCall::Bell { percent: 50 }]
        );
    }

    #[test]
    fn default_capability_stubs() {
        let frontend = RecordingFrontend::new();
        assert!(!frontend.set_pointer_mapping(&[1, 2, 3]));
        assert_eq!(frontend.get_pointer_mapping(), vec![1, 2, 3, 4, 5]);
        assert!(frontend.get_keyboard_mapping(8, 1).is_none());
    }
}
