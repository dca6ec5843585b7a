//! Pixmap and graphics-context lifecycle.

use super::{done, globalize, reply, HandlerResult};
use crate::protocol::errors::XError;
use crate::protocol::replies::Reply;
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::resources::gcontext::GContext;
use crate::resources::pixmap::PixmapRecord;
use crate::resources::registry::Resource;
use crate::server::state::ServerState;

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::CreatePixmap { depth, pid, drawable, width, height } => {
            if pid == NONE || pid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(pid));
            }
            if width == 0 || height == 0 {
                return Err(XError::value(0));
            }
            let pid = globalize(state, client, pid);
            let drawable = globalize(state, client, drawable);
            state.registry.drawable(drawable)?;
            if !matches!(depth, 1 | 24 | 32) {
                return Err(XError::value(depth as u32));
            }
            state.registry.insert(
                client,
                pid,
                Resource::Pixmap(PixmapRecord { id: pid, width, height, depth, origin_drawable: drawable }),
            )?;
            state.frontend.create_pixmap(pid, drawable, width, height, depth);
            done()
        }
        Request::FreePixmap { pixmap } => {
            let pixmap = globalize(state, client, pixmap);
            state.registry.pixmap(pixmap)?;
            state.registry.remove(pixmap);
            state.frontend.free_pixmap(pixmap);
            done()
        }
        Request::CreateGC { cid, drawable, mask, values } => {
            if cid == NONE || cid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(cid));
            }
            let cid = globalize(state, client, cid);
            let drawable = globalize(state, client, drawable);
            state.registry.drawable(drawable)?;
            if let Some(font) = values.font {
                let font = globalize(state, client, font);
                if font != NONE {
                    state.registry.font(font)?;
                }
            }
            let mut gc = GContext::new(cid, drawable);
            let mut values = values;
            values.font = values.font.map(|f| globalize(state, client, f));
            values.tile = values.tile.map(|p| globalize(state, client, p));
            values.stipple = values.stipple.map(|p| globalize(state, client, p));
            values.clip_mask = values.clip_mask.map(|p| globalize(state, client, p));
            gc.apply(mask, &values);
            state.registry.insert(client, cid, Resource::GContext(Box::new(gc)))?;
            let gc = state.registry.gcontext(cid)?;
            state.frontend.create_gc(gc);
            done()
        }
        Request::ChangeGC { gc, mask, values } => {
            let gc = globalize(state, client, gc);
            if let Some(font) = values.font {
                let font = globalize(state, client, font);
                if font != NONE {
                    state.registry.font(font)?;
                }
            }
            let mut values = values;
            values.font = values.font.map(|f| globalize(state, client, f));
            values.tile = values.tile.map(|p| globalize(state, client, p));
            values.stipple = values.stipple.map(|p| globalize(state, client, p));
            values.clip_mask = values.clip_mask.map(|p| globalize(state, client, p));
            state.registry.gcontext_mut(gc)?.apply(mask, &values);
            let gc_ref = state.registry.gcontext(gc)?;
            state.frontend.change_gc(gc_ref, mask);
            done()
        }
        Request::CopyGC { src_gc, dst_gc, mask } => {
            let src_gc = globalize(state, client, src_gc);
            let dst_gc = globalize(state, client, dst_gc);
            let source = state.registry.gcontext(src_gc)?.clone();
            state.registry.gcontext_mut(dst_gc)?.copy_from(&source, mask);
            let gc_ref = state.registry.gcontext(dst_gc)?;
            state.frontend.change_gc(gc_ref, mask);
            done()
        }
        Request::SetDashes { gc, dash_offset, dashes } => {
            let gc = globalize(state, client, gc);
            if dashes.is_empty() || dashes.contains(&0) {
                return Err(XError::value(0));
            }
            let record = state.registry.gcontext_mut(gc)?;
            record.dash_offset = dash_offset;
            record.dashes = dashes;
            done()
        }
        Request::SetClipRectangles { gc, clip_x_origin, clip_y_origin, rectangles, .. } => {
            let gc = globalize(state, client, gc);
            let record = state.registry.gcontext_mut(gc)?;
            record.clip_x_origin = clip_x_origin;
            record.clip_y_origin = clip_y_origin;
            record.clip_mask = NONE;
            record.clip_rectangles = rectangles;
            done()
        }
        Request::FreeGC { gc } => {
            let gc = globalize(state, client, gc);
            state.registry.gcontext(gc)?;
            state.registry.remove(gc);
            state.frontend.free_gc(gc);
            done()
        }
        Request::QueryBestSize { class, drawable, width, height } => {
            let drawable = globalize(state, client, drawable);
            state.registry.drawable(drawable)?;
            if class > 2 {
                return Err(XError::value(class as u32));
            }
            // Cursors have one sensible size; tiles and stipples take
            // whatever was asked.
            let (width, height) = if class == 0 { (32, 32) } else { (width, height) };
            reply(Reply::QueryBestSize { width, height })
        }
        other => unreachable!("non-gc request routed here: {other:?}"),
    }
}
