//! Graphics contexts: the full parameter bag with protocol defaults.

use crate::protocol::requests::GcValues;
use crate::protocol::types::*;

/// A graphics context with every field explicit. `ChangeGC` applies a
/// value-mask-selected subset; `CopyGC` copies one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GContext {
    pub id: GContextId,
    pub drawable: DrawableId,
    pub function: u8,
    pub plane_mask: u32,
    pub foreground: u32,
    pub background: u32,
    pub line_width: u16,
    pub line_style: u8,
    pub cap_style: u8,
    pub join_style: u8,
    pub fill_style: u8,
    pub fill_rule: u8,
    pub tile: PixmapId,
    pub stipple: PixmapId,
    pub tile_stipple_x_origin: i16,
    pub tile_stipple_y_origin: i16,
    pub font: FontId,
    pub subwindow_mode: u8,
    pub graphics_exposures: bool,
    pub clip_x_origin: i16,
    pub clip_y_origin: i16,
    pub clip_mask: PixmapId,
    pub dash_offset: u16,
    pub dashes: Vec<u8>,
    pub arc_mode: u8,
    pub clip_rectangles: Vec<Rectangle>,
}

impl GContext {
    /// Protocol defaults: GXcopy, solid everything, exposures on.
    pub fn new(id: GContextId, drawable: DrawableId) -> Self {
        Self {
            id,
            drawable,
            function: 3, // GXcopy
            plane_mask: !0,
            foreground: 0,
            background: 1,
            line_width: 0,
            line_style: 0,
            cap_style: 1, // Butt
            join_style: 0,
            fill_style: 0,
            fill_rule: 0,
            tile: NONE,
            stipple: NONE,
            tile_stipple_x_origin: 0,
            tile_stipple_y_origin: 0,
            font: NONE,
            subwindow_mode: 0,
            graphics_exposures: true,
            clip_x_origin: 0,
            clip_y_origin: 0,
            clip_mask: NONE,
            dash_offset: 0,
            dashes: vec![4, 4],
            arc_mode: 1, // PieSlice
            clip_rectangles: Vec::new(),
        }
    }

    /// Apply the fields a value mask selected.
    pub fn apply(&mut self, mask: GcMask, values: &GcValues) {
        if mask.contains(GcMask::FUNCTION) {
            if let Some(v) = values.function {
                self.function = v;
            }
        }
        if mask.contains(GcMask::PLANE_MASK) {
            if let Some(v) = values.plane_mask {
                self.plane_mask = v;
            }
        }
        if mask.contains(GcMask::FOREGROUND) {
            if let Some(v) = values.foreground {
                self.foreground = v;
            }
        }
        if mask.contains(GcMask::BACKGROUND) {
            if let Some(v) = values.background {
                self.background = v;
            }
        }
        if mask.contains(GcMask::LINE_WIDTH) {
            if let Some(v) = values.line_width {
                self.line_width = v;
            }
        }
        if mask.contains(GcMask::LINE_STYLE) {
            if let Some(v) = values.line_style {
                self.line_style = v;
            }
        }
        if mask.contains(GcMask::CAP_STYLE) {
            if let Some(v) = values.cap_style {
                self.cap_style = v;
            }
        }
        if mask.contains(GcMask::JOIN_STYLE) {
            if let Some(v) = values.join_style {
                self.join_style = v;
            }
        }
        if mask.contains(GcMask::FILL_STYLE) {
            if let Some(v) = values.fill_style {
                self.fill_style = v;
            }
        }
        if mask.contains(GcMask::FILL_RULE) {
            if let Some(v) = values.fill_rule {
                self.fill_rule = v;
            }
        }
        if mask.contains(GcMask::TILE) {
            if let Some(v) = values.tile {
                self.tile = v;
            }
        }
        if mask.contains(GcMask::STIPPLE) {
            if let Some(v) = values.stipple {
                self.stipple = v;
            }
        }
        if mask.contains(GcMask::TILE_STIPPLE_X_ORIGIN) {
            if let Some(v) = values.tile_stipple_x_origin {
                self.tile_stipple_x_origin = v;
            }
        }
        if mask.contains(GcMask::TILE_STIPPLE_Y_ORIGIN) {
            if let Some(v) = values.tile_stipple_y_origin {
                self.tile_stipple_y_origin = v;
            }
        }
        if mask.contains(GcMask::FONT) {
            if let Some(v) = values.font {
                self.font = v;
            }
        }
        if mask.contains(GcMask::SUBWINDOW_MODE) {
            if let Some(v) = values.subwindow_mode {
                self.subwindow_mode = v;
            }
        }
        if mask.contains(GcMask::GRAPHICS_EXPOSURES) {
            if let Some(v) = values.graphics_exposures {
                self.graphics_exposures = v;
            }
        }
        if mask.contains(GcMask::CLIP_X_ORIGIN) {
            if let Some(v) = values.clip_x_origin {
                self.clip_x_origin = v;
            }
        }
        if mask.contains(GcMask::CLIP_Y_ORIGIN) {
            if let Some(v) = values.clip_y_origin {
                self.clip_y_origin = v;
            }
        }
        if mask.contains(GcMask::CLIP_MASK) {
            if let Some(v) = values.clip_mask {
                self.clip_mask = v;
                self.clip_rectangles.clear();
            }
        }
        if mask.contains(GcMask::DASH_OFFSET) {
            if let Some(v) = values.dash_offset {
                self.dash_offset = v;
            }
        }
        if mask.contains(GcMask::DASHES) {
            if let Some(v) = values.dashes {
                self.dashes = vec![v, v];
            }
        }
        if mask.contains(GcMask::ARC_MODE) {
            if let Some(v) = values.arc_mode {
                self.arc_mode = v;
            }
        }
    }

    /// CopyGC: replicate the masked fields of `source` into `self`.
    pub fn copy_from(&mut self, source: &GContext, mask: GcMask) {
        if mask.contains(GcMask::FUNCTION) {
            self.function = source.function;
        }
        if mask.contains(GcMask::PLANE_MASK) {
            self.plane_mask = source.plane_mask;
        }
        if mask.contains(GcMask::FOREGROUND) {
            self.foreground = source.foreground;
        }
        if mask.contains(GcMask::BACKGROUND) {
            self.background = source.background;
        }
        if mask.contains(GcMask::LINE_WIDTH) {
            self.line_width = source.line_width;
        }
        if mask.contains(GcMask::LINE_STYLE) {
            self.line_style = source.line_style;
        }
        if mask.contains(GcMask::CAP_STYLE) {
            self.cap_style = source.cap_style;
        }
        if mask.contains(GcMask::JOIN_STYLE) {
            self.join_style = source.join_style;
        }
        if mask.contains(GcMask::FILL_STYLE) {
            self.fill_style = source.fill_style;
        }
        if mask.contains(GcMask::FILL_RULE) {
            self.fill_rule = source.fill_rule;
        }
        if mask.contains(GcMask::TILE) {
            self.tile = source.tile;
        }
        if mask.contains(GcMask::STIPPLE) {
            self.stipple = source.stipple;
        }
        if mask.contains(GcMask::TILE_STIPPLE_X_ORIGIN) {
            self.tile_stipple_x_origin = source.tile_stipple_x_origin;
        }
        if mask.contains(GcMask::TILE_STIPPLE_Y_ORIGIN) {
            self.tile_stipple_y_origin = source.tile_stipple_y_origin;
        }
        if mask.contains(GcMask::FONT) {
            self.font = source.font;
        }
        if mask.contains(GcMask::SUBWINDOW_MODE) {
            self.subwindow_mode = source.subwindow_mode;
        }
        if mask.contains(GcMask::GRAPHICS_EXPOSURES) {
            self.graphics_exposures = source.graphics_exposures;
        }
        if mask.contains(GcMask::CLIP_X_ORIGIN) {
            self.clip_x_origin = source.clip_x_origin;
        }
        if mask.contains(GcMask::CLIP_Y_ORIGIN) {
            self.clip_y_origin = source.clip_y_origin;
        }
        if mask.contains(GcMask::CLIP_MASK) {
            self.clip_mask = source.clip_mask;
            self.clip_rectangles = source.clip_rectangles.clone();
        }
        if mask.contains(GcMask::DASH_OFFSET) {
            self.dash_offset = source.dash_offset;
        }
        if mask.contains(GcMask::DASHES) {
            self.dashes = source.dashes.clone();
        }
        if mask.contains(GcMask::ARC_MODE) {
            self.arc_mode = source.arc_mode;
        }
    }
}
