//! Colormap requests.

use super::{done, globalize, reply, HandlerResult};
use crate::color::colormap::ColormapRecord;
use crate::color::named;
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::replies::{Reply, Rgb16};
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::resources::registry::Resource;
use crate::server::state::ServerState;

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::CreateColormap { alloc_all, mid, window, visual } => {
            if mid == NONE || mid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(mid));
            }
            let mid = globalize(state, client, mid);
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            if visual != state.root_visual.id {
                return Err(XError::match_error());
            }
            if alloc_all && !state.root_visual.class.is_writable() {
                // AllocAll on a static visual is illegal.
                return Err(XError::match_error());
            }
            let record = ColormapRecord::new(mid, state.root_visual);
            state.registry.insert(client, mid, Resource::Colormap(Box::new(record)))?;
            notify_colormap(state, window, mid, true, false);
            done()
        }
        Request::FreeColormap { colormap } => {
            let colormap = globalize(state, client, colormap);
            state.registry.colormap(colormap)?;
            if colormap != state.default_colormap {
                state.registry.remove(colormap);
            }
            done()
        }
        Request::CopyColormapAndFree { mid, src_colormap } => {
            if mid == NONE || mid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(mid));
            }
            let mid = globalize(state, client, mid);
            let src = globalize(state, client, src_colormap);
            let default = state.default_colormap;
            let (copy, emptied) = state.registry.colormap_mut(src)?.copy_and_free(mid, client);
            state.registry.insert(client, mid, Resource::Colormap(Box::new(copy)))?;
            if emptied && src != default {
                state.registry.remove(src);
            }
            done()
        }
        Request::InstallColormap { colormap } => {
            let colormap = globalize(state, client, colormap);
            state.registry.colormap_mut(colormap)?.installed = true;
            let root = state.root;
            notify_colormap(state, root, colormap, false, true);
            done()
        }
        Request::UninstallColormap { colormap } => {
            let colormap = globalize(state, client, colormap);
            if colormap == state.default_colormap {
                // The default map stays installed.
                return done();
            }
            state.registry.colormap_mut(colormap)?.installed = false;
            let root = state.root;
            notify_colormap(state, root, colormap, false, false);
            done()
        }
        Request::ListInstalledColormaps { window } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            let colormaps = vec![super::localize(state, client, state.default_colormap)];
            reply(Reply::ListInstalledColormaps { colormaps })
        }
        Request::AllocColor { colormap, red, green, blue } => {
            let colormap = globalize(state, client, colormap);
            let (pixel, color) =
                state.registry.colormap_mut(colormap)?.alloc_color(client, red, green, blue)?;
            reply(Reply::AllocColor { color, pixel })
        }
        Request::AllocNamedColor { colormap, name } => {
            let colormap = globalize(state, client, colormap);
            let (r, g, b) = named::lookup16(&name).ok_or_else(XError::name)?;
            let exact = Rgb16 { red: r, green: g, blue: b };
            let (pixel, visual) = state.registry.colormap_mut(colormap)?.alloc_color(client, r, g, b)?;
            reply(Reply::AllocNamedColor { pixel, exact, visual })
        }
        Request::AllocColorCells { contiguous, colormap, colors, planes } => {
            let colormap = globalize(state, client, colormap);
            if planes > 0 {
                // Plane allocation is only meaningful on deeper writable
                // visuals than the single advertised one.
                let record = state.registry.colormap(colormap)?;
                if !record.visual.class.is_writable() {
                    return Err(XError::access());
                }
                return Err(XError::alloc());
            }
            let pixels =
                state.registry.colormap_mut(colormap)?.alloc_cells(client, colors, contiguous)?;
            reply(Reply::AllocColorCells { pixels, masks: Vec::new() })
        }
        Request::AllocColorPlanes { contiguous, colormap, colors, reds, greens, blues } => {
            let colormap = globalize(state, client, colormap);
            if reds > 0 || greens > 0 || blues > 0 {
                let record = state.registry.colormap(colormap)?;
                if !record.visual.class.is_writable() {
                    return Err(XError::access());
                }
                return Err(XError::alloc());
            }
            let pixels =
                state.registry.colormap_mut(colormap)?.alloc_cells(client, colors, contiguous)?;
            reply(Reply::AllocColorPlanes { pixels, red_mask: 0, green_mask: 0, blue_mask: 0 })
        }
        Request::FreeColors { colormap, pixels, .. } => {
            let colormap = globalize(state, client, colormap);
            state.registry.colormap_mut(colormap)?.free_colors(&pixels);
            done()
        }
        Request::StoreColors { colormap, items } => {
            let colormap = globalize(state, client, colormap);
            let record = state.registry.colormap_mut(colormap)?;
            for item in items {
                record.store_color(item.pixel, item.red, item.green, item.blue, item.flags)?;
            }
            done()
        }
        Request::StoreNamedColor { flags, colormap, pixel, name } => {
            let colormap = globalize(state, client, colormap);
            let (r, g, b) = named::lookup16(&name).ok_or_else(XError::name)?;
            state.registry.colormap_mut(colormap)?.store_color(pixel, r, g, b, flags)?;
            done()
        }
        Request::QueryColors { colormap, pixels } => {
            let colormap = globalize(state, client, colormap);
            let record = state.registry.colormap(colormap)?;
            let colors = pixels.iter().map(|pixel| record.query(*pixel)).collect();
            reply(Reply::QueryColors { colors })
        }
        Request::LookupColor { colormap, name } => {
            let colormap = globalize(state, client, colormap);
            state.registry.colormap(colormap)?;
            let (r, g, b) = named::lookup16(&name).ok_or_else(XError::name)?;
            let exact = Rgb16 { red: r, green: g, blue: b };
            reply(Reply::LookupColor { exact, visual: exact })
        }
        other => unreachable!("non-colormap request routed here: {other:?}"),
    }
}

fn notify_colormap(state: &mut ServerState, window: WindowId, colormap: ColormapId, is_new: bool, installed: bool) {
    state.fan_out(window, EventMask::COLORMAP_CHANGE, |receiver| Event::ColormapNotify {
        window: receiver.localize(window),
        colormap: receiver.localize(colormap),
        is_new,
        installed,
    });
}
