//! The render front-end contract.
//!
//! The core never rasterises anything. Every drawing side effect funnels
//! through [`Frontend`], keyed by the core's own resource identifiers, so
//! whether the far side is a real windowing system, a canvas, or a test
//! recorder is invisible here. Implementations must be side-effect-free
//! with respect to core state: they receive commands and feed input back
//! through the [`crate::server::Server`] methods, nothing else.

pub mod recording;

use crate::protocol::replies::{CharInfo, FontInfo};
use crate::protocol::requests::{TextItem, WindowAttributeValues};
use crate::protocol::types::*;
use crate::resources::cursor::CursorRecord;
use crate::resources::gcontext::GContext;

pub use recording::{FrontendCall, RecordingFrontend};

/// Text measurement results for QueryTextExtents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtents {
    pub font_ascent: i16,
    pub font_descent: i16,
    pub overall_ascent: i16,
    pub overall_descent: i16,
    pub overall_width: i32,
    pub overall_left: i32,
    pub overall_right: i32,
}

/// The capability set the core requires of a render front-end.
///
/// Methods with default bodies are the capabilities a front-end can opt
/// out of; the core serves stub replies in that case.
pub trait Frontend: Send + Sync {
    // Window lifecycle.
    fn create_window(
        &self,
        window: WindowId,
        parent: WindowId,
        geometry: Rectangle,
        border_width: u16,
        override_redirect: bool,
    );
    fn destroy_window(&self, window: WindowId);
    fn map_window(&self, window: WindowId);
    fn unmap_window(&self, window: WindowId);
    fn configure_window(
        &self,
        window: WindowId,
        geometry: Rectangle,
        border_width: u16,
        sibling: Option<WindowId>,
        stack_mode: Option<StackMode>,
    );
    fn change_window_attributes(
        &self,
        window: WindowId,
        mask: AttributeMask,
        values: &WindowAttributeValues,
    );
    fn set_window_cursor(&self, window: WindowId, cursor: CursorId);
    /// Relayed when `WM_NAME` / `_NET_WM_NAME` changes.
    fn set_window_title(&self, window: WindowId, title: &str);

    // Drawing.
    fn poly_point(
        &self,
        drawable: DrawableId,
        gc: &GContext,
        mode: CoordinateMode,
        points: &[Point],
    );
    fn poly_line(
        &self,
        drawable: DrawableId,
        gc: &GContext,
        mode: CoordinateMode,
        points: &[Point],
    );
    fn poly_segment(&self, drawable: DrawableId, gc: &GContext, segments: &[Segment]);
    fn poly_rectangle(&self, drawable: DrawableId, gc: &GContext, rectangles: &[Rectangle]);
    fn poly_fill_rectangle(&self, drawable: DrawableId, gc: &GContext, rectangles: &[Rectangle]);
    fn poly_arc(&self, drawable: DrawableId, gc: &GContext, arcs: &[Arc]);
    fn poly_fill_arc(&self, drawable: DrawableId, gc: &GContext, arcs: &[Arc]);
    fn fill_poly(
        &self,
        drawable: DrawableId,
        gc: &GContext,
        shape: PolyShape,
        mode: CoordinateMode,
        points: &[Point],
    );
    fn put_image(
        &self,
        drawable: DrawableId,
        gc: &GContext,
        format: ImageFormat,
        depth: u8,
        geometry: Rectangle,
        left_pad: u8,
        data: &[u8],
    );
    fn get_image(
        &self,
        drawable: DrawableId,
        format: ImageFormat,
        geometry: Rectangle,
        plane_mask: u32,
    ) -> Option<Vec<u8>>;
    fn copy_area(
        &self,
        src: DrawableId,
        dst: DrawableId,
        gc: &GContext,
        src_x: i16,
        src_y: i16,
        dst_x: i16,
        dst_y: i16,
        width: u16,
        height: u16,
    );
    #[allow(clippy::too_many_arguments)]
    fn copy_plane(
        &self,
        src: DrawableId,
        dst: DrawableId,
        gc: &GContext,
        src_x: i16,
        src_y: i16,
        dst_x: i16,
        dst_y: i16,
        width: u16,
        height: u16,
        bit_plane: u32,
    );
    fn clear_area(&self, window: WindowId, area: Rectangle);
    fn image_text8(&self, drawable: DrawableId, gc: &GContext, x: i16, y: i16, text: &str);
    fn image_text16(&self, drawable: DrawableId, gc: &GContext, x: i16, y: i16, text: &[u16]);
    fn poly_text8(&self, drawable: DrawableId, gc: &GContext, x: i16, y: i16, items: &[TextItem]);
    fn poly_text16(&self, drawable: DrawableId, gc: &GContext, x: i16, y: i16, items: &[TextItem]);

    // Resources.
    fn create_pixmap(&self, pixmap: PixmapId, drawable: DrawableId, width: u16, height: u16, depth: u8);
    fn free_pixmap(&self, pixmap: PixmapId);
    fn create_gc(&self, gc: &GContext);
    fn change_gc(&self, gc: &GContext, mask: GcMask);
    fn free_gc(&self, gc: GContextId);
    fn create_cursor(&self, cursor: &CursorRecord, source: PixmapId, mask: PixmapId, x: u16, y: u16);
    fn create_glyph_cursor(&self, cursor: &CursorRecord, source_font: FontId, mask_font: FontId);
    fn free_cursor(&self, cursor: CursorId);
    fn recolor_cursor(&self, cursor: &CursorRecord) {
        let _ = cursor;
    }

    // Fonts: the front-end owns rasterisation, metrics, and enumeration.
    fn open_font(&self, font: FontId, name: &str);
    fn close_font(&self, font: FontId);
    fn query_font(&self, font: FontId) -> Option<(FontInfo, Vec<CharInfo>)> {
        None
    }
    fn measure_text(&self, font: FontId, text: &[u16]) -> Option<TextExtents> {
        None
    }
    fn list_fonts(&self, pattern: &str, max_names: usize) -> Vec<String> {
        let _ = (pattern, max_names);
        Vec::new()
    }

    // Opt-out capabilities; stub defaults reply empty / unsupported.
    fn bell(&self, percent: i8) {
        let _ = percent;
    }
    fn warp_pointer(&self, root_x: i16, root_y: i16) {
        let _ = (root_x, root_y);
    }
    fn set_pointer_mapping(&self, map: &[u8]) -> bool {
        let _ = map;
        false
    }
    fn get_pointer_mapping(&self) -> Vec<u8> {
        vec![1, 2, 3, 4, 5]
    }
    fn change_keyboard_mapping(&self, first_keycode: KeyCode, keysyms_per_keycode: u8, keysyms: &[KeySym]) -> bool {
        let _ = (first_keycode, keysyms_per_keycode, keysyms);
        false
    }
    fn get_keyboard_mapping(&self, first_keycode: KeyCode, count: u8) -> Option<(u8, Vec<KeySym>)> {
        let _ = (first_keycode, count);
        None
    }
    fn read_clipboard(&self) -> Option<Vec<u8>> {
        None
    }
    fn write_clipboard(&self, data: &[u8]) {
        let _ = data;
    }
}
