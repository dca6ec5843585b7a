//! Drawing requests: validated, then forwarded to the front-end.
//!
//! The core owns no pixels. Each handler narrows the drawable and the
//! GC, then hands the parameters across the adapter; CopyArea and
//! CopyPlane additionally honour the GC's graphics-exposures flag with a
//! NoExposure event (the core has no occlusion knowledge, so a full
//! GraphicsExposure never happens).

use super::{done, globalize, reply, HandlerResult};
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::opcodes;
use crate::protocol::replies::Reply;
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::server::state::ServerState;

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::ClearArea { window, x, y, width, height, .. } => {
            let window = globalize(state, client, window);
            let node = state.registry.window(window)?;
            let area = Rectangle {
                x,
                y,
                width: if width == 0 { node.width.saturating_sub(x.max(0) as u16) } else { width },
                height: if height == 0 { node.height.saturating_sub(y.max(0) as u16) } else { height },
            };
            state.frontend.clear_area(window, area);
            done()
        }
        Request::CopyArea {
            src_drawable,
            dst_drawable,
            gc,
            src_x,
            src_y,
            dst_x,
            dst_y,
            width,
            height,
        } => {
            let src = globalize(state, client, src_drawable);
            let dst = globalize(state, client, dst_drawable);
            let gc = globalize(state, client, gc);
            let src_depth = state.registry.drawable(src)?.depth();
            let dst_depth = state.registry.drawable(dst)?.depth();
            if src_depth != dst_depth {
                return Err(XError::match_error());
            }
            let record = state.registry.gcontext(gc)?.clone();
            state.frontend.copy_area(src, dst, &record, src_x, src_y, dst_x, dst_y, width, height);
            if record.graphics_exposures {
                no_exposure(state, client, dst, opcodes::COPY_AREA);
            }
            done()
        }
        Request::CopyPlane {
            src_drawable,
            dst_drawable,
            gc,
            src_x,
            src_y,
            dst_x,
            dst_y,
            width,
            height,
            bit_plane,
        } => {
            if bit_plane == 0 || bit_plane.count_ones() != 1 {
                return Err(XError::value(bit_plane));
            }
            let src = globalize(state, client, src_drawable);
            let dst = globalize(state, client, dst_drawable);
            let gc = globalize(state, client, gc);
            state.registry.drawable(src)?;
            state.registry.drawable(dst)?;
            let record = state.registry.gcontext(gc)?.clone();
            state
                .frontend
                .copy_plane(src, dst, &record, src_x, src_y, dst_x, dst_y, width, height, bit_plane);
            if record.graphics_exposures {
                no_exposure(state, client, dst, opcodes::COPY_PLANE);
            }
            done()
        }
        Request::PolyPoint { coordinate_mode, drawable, gc, points } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_point(drawable, &record, coordinate_mode, &points);
            done()
        }
        Request::PolyLine { coordinate_mode, drawable, gc, points } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_line(drawable, &record, coordinate_mode, &points);
            done()
        }
        Request::PolySegment { drawable, gc, segments } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_segment(drawable, &record, &segments);
            done()
        }
        Request::PolyRectangle { drawable, gc, rectangles } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_rectangle(drawable, &record, &rectangles);
            done()
        }
        Request::PolyArc { drawable, gc, arcs } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_arc(drawable, &record, &arcs);
            done()
        }
        Request::FillPoly { drawable, gc, shape, coordinate_mode, points } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.fill_poly(drawable, &record, shape, coordinate_mode, &points);
            done()
        }
        Request::PolyFillRectangle { drawable, gc, rectangles } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_fill_rectangle(drawable, &record, &rectangles);
            done()
        }
        Request::PolyFillArc { drawable, gc, arcs } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            state.frontend.poly_fill_arc(drawable, &record, &arcs);
            done()
        }
        Request::PutImage { format, drawable, gc, width, height, dst_x, dst_y, left_pad, depth, data } => {
            let (drawable, record) = narrow(state, client, drawable, gc)?;
            let drawable_depth = state.registry.drawable(drawable)?.depth();
            match format {
                ImageFormat::Bitmap => {
                    if depth != 1 {
                        return Err(XError::match_error());
                    }
                }
                ImageFormat::XyPixmap | ImageFormat::ZPixmap => {
                    if depth != drawable_depth {
                        return Err(XError::match_error());
                    }
                }
            }
            if format == ImageFormat::ZPixmap && left_pad != 0 {
                return Err(XError::match_error());
            }
            let geometry = Rectangle { x: dst_x, y: dst_y, width, height };
            state.frontend.put_image(drawable, &record, format, depth, geometry, left_pad, &data);
            done()
        }
        Request::GetImage { format, drawable, x, y, width, height, plane_mask } => {
            if format == ImageFormat::Bitmap {
                return Err(XError::value(format as u32));
            }
            let drawable = globalize(state, client, drawable);
            let view = state.registry.drawable(drawable)?;
            let depth = view.depth();
            let (dw, dh) = view.size();
            if x < 0
                || y < 0
                || (x as i32 + width as i32) > dw as i32
                || (y as i32 + height as i32) > dh as i32
            {
                return Err(XError::match_error());
            }
            let geometry = Rectangle { x, y, width, height };
            let data = state
                .frontend
                .get_image(drawable, format, geometry, plane_mask)
                .ok_or_else(XError::match_error)?;
            let visual = state.root_visual.id;
            reply(Reply::GetImage { depth, visual, data })
        }
        other => unreachable!("non-drawing request routed here: {other:?}"),
    }
}

/// Narrow the drawable and clone the GC for a front-end call.
fn narrow(
    state: &ServerState,
    client: ClientId,
    drawable: DrawableId,
    gc: GContextId,
) -> Result<(DrawableId, crate::resources::gcontext::GContext), XError> {
    let drawable = globalize(state, client, drawable);
    let gc = globalize(state, client, gc);
    state.registry.drawable(drawable)?;
    let record = state.registry.gcontext(gc)?.clone();
    Ok((drawable, record))
}

/// The copy had no occluded source regions to report, but the client
/// asked for graphics exposures, so it gets the NoExposure terminator.
fn no_exposure(state: &mut ServerState, client: ClientId, drawable: DrawableId, major: u8) {
    if let Some(receiver) = state.clients.get_mut(client) {
        let event = Event::NoExposure {
            drawable: receiver.localize(drawable),
            minor_opcode: 0,
            major_opcode: major,
        };
        receiver.enqueue_event(&event, false);
    }
}
