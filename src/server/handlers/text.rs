//! Fonts and text: the core wraps front-end metrics into replies and
//! forwards drawing.

use super::{done, globalize, reply, HandlerResult};
use crate::protocol::errors::XError;
use crate::protocol::replies::{CharInfo, FontInfo, Reply};
use crate::protocol::requests::{Request, TextItem};
use crate::protocol::types::*;
use crate::resources::font::FontRecord;
use crate::resources::registry::Resource;
use crate::server::state::ServerState;

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::OpenFont { fid, name } => {
            if fid == NONE || fid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(fid));
            }
            let fid = globalize(state, client, fid);
            state
                .registry
                .insert(client, fid, Resource::Font(FontRecord { id: fid, name: name.clone() }))?;
            state.frontend.open_font(fid, &name);
            done()
        }
        Request::CloseFont { font } => {
            let font = globalize(state, client, font);
            state.registry.font(font)?;
            state.registry.remove(font);
            state.frontend.close_font(font);
            done()
        }
        Request::QueryFont { font } => {
            let font = resolve_fontable(state, client, font)?;
            let (info, char_infos) = state
                .frontend
                .query_font(font)
                .unwrap_or_else(|| (fallback_font_info(), Vec::new()));
            reply(Reply::QueryFont { info, char_infos })
        }
        Request::QueryTextExtents { font, text } => {
            let font = resolve_fontable(state, client, font)?;
            let extents = state.frontend.measure_text(font, &text).unwrap_or_default();
            reply(Reply::QueryTextExtents {
                draw_direction: 0,
                font_ascent: extents.font_ascent,
                font_descent: extents.font_descent,
                overall_ascent: extents.overall_ascent,
                overall_descent: extents.overall_descent,
                overall_width: extents.overall_width,
                overall_left: extents.overall_left,
                overall_right: extents.overall_right,
            })
        }
        Request::ListFonts { max_names, pattern } => {
            let names = state.frontend.list_fonts(&pattern, max_names as usize);
            reply(Reply::ListFonts { names })
        }
        Request::ListFontsWithInfo { max_names, pattern } => {
            // One reply per font, closed by the zero-length terminator.
            let names = state.frontend.list_fonts(&pattern, max_names as usize);
            let mut replies = Vec::with_capacity(names.len() + 1);
            let total = names.len() as u32;
            for (index, name) in names.iter().enumerate() {
                replies.push(Reply::ListFontsWithInfo {
                    name: name.clone(),
                    info: fallback_font_info(),
                    replies_hint: total - index as u32,
                });
            }
            replies.push(Reply::ListFontsWithInfo {
                name: String::new(),
                info: FontInfo::default(),
                replies_hint: 0,
            });
            Ok(replies)
        }
        Request::SetFontPath { paths } => {
            state.font_path = paths;
            done()
        }
        Request::GetFontPath => reply(Reply::GetFontPath { paths: state.font_path.clone() }),
        Request::PolyText8 { drawable, gc, x, y, items } => {
            let (drawable, record) = narrow(state, client, drawable, gc, &items)?;
            state.frontend.poly_text8(drawable, &record, x, y, &items);
            done()
        }
        Request::PolyText16 { drawable, gc, x, y, items } => {
            let (drawable, record) = narrow(state, client, drawable, gc, &items)?;
            state.frontend.poly_text16(drawable, &record, x, y, &items);
            done()
        }
        Request::ImageText8 { drawable, gc, x, y, text } => {
            let (drawable, record) = narrow(state, client, drawable, gc, &[])?;
            state.frontend.image_text8(drawable, &record, x, y, &text);
            done()
        }
        Request::ImageText16 { drawable, gc, x, y, text } => {
            let (drawable, record) = narrow(state, client, drawable, gc, &[])?;
            state.frontend.image_text16(drawable, &record, x, y, &text);
            done()
        }
        other => unreachable!("non-text request routed here: {other:?}"),
    }
}

/// QueryFont and QueryTextExtents accept a font or a GC with a font.
fn resolve_fontable(state: &ServerState, client: ClientId, id: XId) -> Result<FontId, XError> {
    let id = globalize(state, client, id);
    if state.registry.font(id).is_ok() {
        return Ok(id);
    }
    if let Ok(gc) = state.registry.gcontext(id) {
        if gc.font != NONE {
            return Ok(gc.font);
        }
    }
    Err(XError::font(id))
}

fn narrow(
    state: &ServerState,
    client: ClientId,
    drawable: DrawableId,
    gc: GContextId,
    items: &[TextItem],
) -> Result<(DrawableId, crate::resources::gcontext::GContext), XError> {
    let drawable = globalize(state, client, drawable);
    let gc = globalize(state, client, gc);
    state.registry.drawable(drawable)?;
    let record = state.registry.gcontext(gc)?.clone();
    // Validate font shifts before the front-end sees them.
    for item in items {
        if let TextItem::FontShift(font) = item {
            state.registry.font(globalize(state, client, *font))?;
        }
    }
    Ok((drawable, record))
}

/// Fixed-cell metrics served when the front-end opts out of font
/// queries; matches a 6x13 terminal font.
fn fallback_font_info() -> FontInfo {
    let bounds = CharInfo {
        left_side_bearing: 0,
        right_side_bearing: 6,
        character_width: 6,
        ascent: 11,
        descent: 2,
        attributes: 0,
    };
    FontInfo {
        min_bounds: bounds,
        max_bounds: bounds,
        min_char_or_byte2: 32,
        max_char_or_byte2: 126,
        default_char: 32,
        draw_direction: 0,
        min_byte1: 0,
        max_byte1: 0,
        all_chars_exist: true,
        font_ascent: 11,
        font_descent: 2,
        properties: Vec::new(),
    }
}
