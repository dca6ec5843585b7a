//! Window lifecycle, geometry, stacking, and tree queries.

use tracing::debug;

use super::{done, globalize, reply, HandlerResult};
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::replies::Reply;
use crate::protocol::requests::{Request, WindowAttributeValues};
use crate::protocol::types::*;
use crate::resources::registry::{DrawableRef, Resource};
use crate::server::state::ServerState;
use crate::window::tree::{self, WindowNode};

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::CreateWindow {
            depth,
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
        } => create_window(
            state, client, depth, wid, parent, x, y, width, height, border_width, class, visual,
            mask, values,
        ),
        Request::ChangeWindowAttributes { window, mask, values } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            apply_attributes(state, client, window, mask, &values)?;
            state.frontend.change_window_attributes(window, mask, &values);
            done()
        }
        Request::GetWindowAttributes { window } => {
            let window = globalize(state, client, window);
            let node = state.registry.window(window)?;
            let your_mask = node.event_masks.get(&client).copied().unwrap_or_default();
            let map_state = if !node.mapped {
                MapState::Unmapped
            } else if tree::is_viewable(&state.registry, window) {
                MapState::Viewable
            } else {
                MapState::Unviewable
            };
            reply(Reply::GetWindowAttributes {
                backing_store: node.backing_store,
                visual: node.visual,
                class: node.class,
                bit_gravity: node.bit_gravity,
                win_gravity: node.win_gravity,
                backing_planes: node.backing_planes,
                backing_pixel: node.backing_pixel,
                save_under: node.save_under,
                map_is_installed: true,
                map_state,
                override_redirect: node.override_redirect,
                colormap: node.colormap,
                all_event_masks: node.all_event_masks(),
                your_event_mask: your_mask,
                do_not_propagate_mask: node.do_not_propagate,
            })
        }
        Request::DestroyWindow { window } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            if window != state.root {
                state.destroy_window_cascade(window);
            }
            done()
        }
        Request::DestroySubwindows { window } => {
            let window = globalize(state, client, window);
            let children = state.registry.window(window)?.children.clone();
            for child in children {
                state.destroy_window_cascade(child);
            }
            done()
        }
        Request::ChangeSaveSet { mode, window } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            // Only windows created by other clients belong in a save-set.
            if state.registry.owner_of(window) == Some(client) {
                return Err(XError::match_error());
            }
            if let Some(client_state) = state.clients.get_mut(client) {
                match mode {
                    SaveSetMode::Insert => {
                        client_state.save_set.insert(window);
                    }
                    SaveSetMode::Delete => {
                        client_state.save_set.remove(&window);
                    }
                }
            }
            done()
        }
        Request::ReparentWindow { window, parent, x, y } => {
            reparent_window(state, client, window, parent, x, y)
        }
        Request::MapWindow { window } => {
            let window = globalize(state, client, window);
            map_window(state, client, window)
        }
        Request::MapSubwindows { window } => {
            let window = globalize(state, client, window);
            let children = state.registry.window(window)?.children.clone();
            for child in children {
                map_window(state, client, child)?;
            }
            done()
        }
        Request::UnmapWindow { window } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            state.unmap_window(window, false);
            done()
        }
        Request::UnmapSubwindows { window } => {
            let window = globalize(state, client, window);
            let children = state.registry.window(window)?.children.clone();
            for child in children {
                state.unmap_window(child, false);
            }
            done()
        }
        Request::ConfigureWindow { window, mask, values } => {
            configure_window(state, client, window, mask, values)
        }
        Request::CirculateWindow { direction, window } => {
            let window = globalize(state, client, window);
            circulate_window(state, direction, window)
        }
        Request::GetGeometry { drawable } => {
            let drawable = globalize(state, client, drawable);
            let root = state.root;
            match state.registry.drawable(drawable)? {
                DrawableRef::Window(node) => reply(Reply::GetGeometry {
                    depth: node.depth,
                    root,
                    x: node.x,
                    y: node.y,
                    width: node.width,
                    height: node.height,
                    border_width: node.border_width,
                }),
                DrawableRef::Pixmap(pixmap) => reply(Reply::GetGeometry {
                    depth: pixmap.depth,
                    root,
                    x: 0,
                    y: 0,
                    width: pixmap.width,
                    height: pixmap.height,
                    border_width: 0,
                }),
            }
        }
        Request::QueryTree { window } => {
            let window = globalize(state, client, window);
            let node = state.registry.window(window)?;
            let localizer = state.clients.get(client);
            let local = |id: XId| localizer.map(|c| c.localize(id)).unwrap_or(id);
            reply(Reply::QueryTree {
                root: local(state.root),
                parent: local(node.parent),
                children: node.children.iter().map(|child| local(*child)).collect(),
            })
        }
        Request::TranslateCoordinates { src_window, dst_window, src_x, src_y } => {
            let src = globalize(state, client, src_window);
            let dst = globalize(state, client, dst_window);
            state.registry.window(src)?;
            state.registry.window(dst)?;
            let (src_ox, src_oy) = tree::root_origin(&state.registry, src);
            let (dst_ox, dst_oy) = tree::root_origin(&state.registry, dst);
            let dst_x = (src_ox + src_x as i32 - dst_ox) as i16;
            let dst_y = (src_oy + src_y as i32 - dst_oy) as i16;
            let child = tree::child_at(&state.registry, dst, dst_x, dst_y).unwrap_or(NONE);
            let child = super::localize(state, client, child);
            reply(Reply::TranslateCoordinates { same_screen: true, child, dst_x, dst_y })
        }
        other => unreachable!("non-window request routed here: {other:?}"),
    }
}

#[allow(clippy::too_many_arguments)]
fn create_window(
    state: &mut ServerState,
    client: ClientId,
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
) -> HandlerResult {
    if wid == NONE || wid > RESOURCE_ID_MASK {
        return Err(XError::id_choice(wid));
    }
    if width == 0 || height == 0 {
        return Err(XError::value(if width == 0 { width as u32 } else { height as u32 }));
    }
    let global_wid = globalize(state, client, wid);
    let parent = globalize(state, client, parent);
    let parent_node = state.registry.window(parent)?;
    let parent_depth = parent_node.depth;
    let parent_class = parent_node.class;
    let parent_colormap = parent_node.colormap;

    let class = match class {
        WindowClass::CopyFromParent => parent_class,
        explicit => explicit,
    };
    let depth = match (class, depth) {
        (WindowClass::InputOnly, 0) => 0,
        (WindowClass::InputOnly, _) => return Err(XError::match_error()),
        (_, 0) => parent_depth,
        (_, d) if d == parent_depth || d == 24 => d,
        _ => return Err(XError::match_error()),
    };
    if visual != COPY_FROM_PARENT && visual != state.root_visual.id {
        return Err(XError::match_error());
    }

    let node = WindowNode::new(
        global_wid,
        parent,
        depth,
        class,
        if visual == COPY_FROM_PARENT { state.root_visual.id } else { visual },
        Rectangle { x, y, width, height },
        border_width,
        parent_colormap,
    );
    state.registry.insert(client, global_wid, Resource::Window(Box::new(node)))?;
    state.registry.window_mut(parent)?.children.push(global_wid);

    if let Err(err) = apply_attributes(state, client, global_wid, mask, &values) {
        // A bad attribute aborts the creation entirely.
        state.registry.remove(global_wid);
        if let Ok(parent_node) = state.registry.window_mut(parent) {
            parent_node.children.retain(|child| *child != global_wid);
        }
        return Err(err);
    }

    let override_redirect = values.override_redirect.unwrap_or(false);
    state.frontend.create_window(
        global_wid,
        parent,
        Rectangle { x, y, width, height },
        border_width,
        override_redirect,
    );
    debug!(window = global_wid, parent, width, height, "window created");

    state.fan_out(parent, EventMask::SUBSTRUCTURE_NOTIFY, |receiver| Event::CreateNotify {
        parent: receiver.localize(parent),
        window: receiver.localize(global_wid),
        x,
        y,
        width,
        height,
        border_width,
        override_redirect,
    });
    done()
}

/// Apply a value-mask-selected attribute subset, with the id validation
/// and redirect-selector rules the protocol requires.
fn apply_attributes(
    state: &mut ServerState,
    client: ClientId,
    window: WindowId,
    mask: AttributeMask,
    values: &WindowAttributeValues,
) -> Result<(), XError> {
    // Validate referenced resources before touching the node.
    let background_pixmap = values.background_pixmap.map(|p| globalize(state, client, p));
    if let Some(pixmap) = background_pixmap {
        if pixmap != NONE && pixmap != PARENT_RELATIVE {
            state.registry.pixmap(pixmap)?;
        }
    }
    let border_pixmap = values.border_pixmap.map(|p| globalize(state, client, p));
    if let Some(pixmap) = border_pixmap {
        if pixmap != COPY_FROM_PARENT {
            state.registry.pixmap(pixmap)?;
        }
    }
    let cursor = values.cursor.map(|c| globalize(state, client, c));
    if let Some(cursor) = cursor {
        if cursor != NONE {
            state.registry.cursor(cursor)?;
        }
    }
    let colormap = values.colormap.map(|c| globalize(state, client, c));
    if let Some(colormap) = colormap {
        if colormap != COPY_FROM_PARENT {
            state.registry.colormap(colormap)?;
        }
    }

    // SubstructureRedirect and ResizeRedirect admit one selector per
    // window.
    if let Some(event_mask) = values.event_mask {
        for exclusive in [EventMask::SUBSTRUCTURE_REDIRECT, EventMask::RESIZE_REDIRECT] {
            if event_mask.intersects(exclusive) {
                let node = state.registry.window(window)?;
                let taken = node
                    .event_masks
                    .iter()
                    .any(|(other, selected)| *other != client && selected.intersects(exclusive));
                if taken {
                    return Err(XError::access());
                }
            }
        }
    }

    let node = state.registry.window_mut(window)?;
    if let Some(pixmap) = background_pixmap {
        node.background_pixmap = (pixmap != NONE).then_some(pixmap);
    }
    if let Some(pixel) = values.background_pixel {
        node.background_pixel = Some(pixel);
    }
    if let Some(pixmap) = border_pixmap {
        node.border_pixmap = (pixmap != COPY_FROM_PARENT).then_some(pixmap);
    }
    if let Some(pixel) = values.border_pixel {
        node.border_pixel = Some(pixel);
    }
    if let Some(gravity) = values.bit_gravity {
        node.bit_gravity = gravity;
    }
    if let Some(gravity) = values.win_gravity {
        node.win_gravity = gravity;
    }
    if let Some(store) = values.backing_store {
        node.backing_store = store;
    }
    if let Some(planes) = values.backing_planes {
        node.backing_planes = planes;
    }
    if let Some(pixel) = values.backing_pixel {
        node.backing_pixel = pixel;
    }
    if let Some(flag) = values.override_redirect {
        node.override_redirect = flag;
    }
    if let Some(flag) = values.save_under {
        node.save_under = flag;
    }
    if let Some(event_mask) = values.event_mask {
        // Event selection is per (window, client).
        if event_mask.is_empty() {
            node.event_masks.remove(&client);
        } else {
            node.event_masks.insert(client, event_mask);
        }
    }
    if let Some(dnp) = values.do_not_propagate_mask {
        node.do_not_propagate = dnp;
    }
    if let Some(colormap) = colormap {
        if colormap != COPY_FROM_PARENT {
            node.colormap = colormap;
        }
    }
    if let Some(cursor_id) = cursor {
        node.cursor = cursor_id;
        state.frontend.set_window_cursor(window, cursor_id);
    }
    Ok(())
}

fn map_window(state: &mut ServerState, client: ClientId, window: WindowId) -> HandlerResult {
    let node = state.registry.window(window)?;
    if node.mapped {
        return done();
    }
    let parent = node.parent;
    let override_redirect = node.override_redirect;
    let (width, height) = (node.width, node.height);

    // A substructure-redirect selector on the parent intercepts the map.
    if !override_redirect && parent != NONE {
        let redirector: Option<ClientId> = state
            .registry
            .window(parent)
            .ok()
            .and_then(|parent_node| {
                parent_node
                    .event_masks
                    .iter()
                    .find(|(other, selected)| {
                        **other != client && selected.intersects(EventMask::SUBSTRUCTURE_REDIRECT)
                    })
                    .map(|(other, _)| *other)
            });
        if let Some(redirector) = redirector {
            debug!(window, redirector, "map redirected");
            if let Some(receiver) = state.clients.get_mut(redirector) {
                let event = Event::MapRequest {
                    parent: receiver.localize(parent),
                    window: receiver.localize(window),
                };
                receiver.enqueue_event(&event, false);
            }
            return done();
        }
    }

    state.registry.window_mut(window)?.mapped = true;
    state.frontend.map_window(window);
    state.structure_notify(window, move |receiver, event_window| Event::MapNotify {
        event: receiver.localize(event_window),
        window: receiver.localize(window),
        override_redirect,
    });
    // The freshly mapped window needs painting. Exposure selectors get
    // the Expose; a window whose owner selected nothing still gets one,
    // so clients that never select can draw their first frame.
    let exposure_selectors = state.registry.window(window)?.selectors_of(EventMask::EXPOSURE);
    let expose = move |receiver: &crate::server::client::ClientState| Event::Expose {
        window: receiver.localize(window),
        x: 0,
        y: 0,
        width,
        height,
        count: 0,
    };
    if exposure_selectors.is_empty() {
        if let Some(owner) = state.registry.owner_of(window) {
            if let Some(receiver) = state.clients.get_mut(owner) {
                let event = expose(receiver);
                receiver.enqueue_event(&event, false);
            }
        }
    } else {
        for selector in exposure_selectors {
            if let Some(receiver) = state.clients.get_mut(selector) {
                let event = expose(receiver);
                receiver.enqueue_event(&event, false);
            }
        }
    }
    done()
}

fn reparent_window(
    state: &mut ServerState,
    client: ClientId,
    window: WindowId,
    parent: WindowId,
    x: i16,
    y: i16,
) -> HandlerResult {
    let window = globalize(state, client, window);
    let parent = globalize(state, client, parent);
    state.registry.window(parent)?;
    let node = state.registry.window(window)?;
    if window == state.root || window == parent {
        return Err(XError::match_error());
    }
    if tree::is_ancestor(&state.registry, window, parent) {
        return Err(XError::match_error());
    }
    let old_parent = node.parent;
    let was_mapped = node.mapped;

    if was_mapped {
        state.unmap_window(window, false);
    }
    if let Ok(old) = state.registry.window_mut(old_parent) {
        old.children.retain(|child| *child != window);
    }
    {
        let node = state.registry.window_mut(window)?;
        node.parent = parent;
        node.x = x;
        node.y = y;
    }
    state.registry.window_mut(parent)?.children.push(window);

    let override_redirect = state.registry.window(window)?.override_redirect;
    state.structure_notify(window, move |receiver, event_window| Event::ReparentNotify {
        event: receiver.localize(event_window),
        window: receiver.localize(window),
        parent: receiver.localize(parent),
        x,
        y,
        override_redirect,
    });
    if was_mapped {
        map_window(state, client, window)?;
    }
    done()
}

fn configure_window(
    state: &mut ServerState,
    client: ClientId,
    window: WindowId,
    mask: ConfigureMask,
    values: crate::protocol::requests::ConfigureValues,
) -> HandlerResult {
    let window = globalize(state, client, window);
    let node = state.registry.window(window)?;
    let parent = node.parent;
    let override_redirect = node.override_redirect;

    let sibling = values.sibling.map(|s| globalize(state, client, s));
    if sibling.is_some() && values.stack_mode.is_none() {
        return Err(XError::match_error());
    }
    if let Some(sibling) = sibling {
        let sibling_node = state.registry.window(sibling)?;
        if sibling_node.parent != parent {
            return Err(XError::match_error());
        }
    }

    // A substructure-redirect selector on the parent intercepts the
    // configure request from other clients.
    if !override_redirect && parent != NONE {
        let redirector: Option<ClientId> = state.registry.window(parent).ok().and_then(|p| {
            p.event_masks
                .iter()
                .find(|(other, selected)| {
                    **other != client && selected.intersects(EventMask::SUBSTRUCTURE_REDIRECT)
                })
                .map(|(other, _)| *other)
        });
        if let Some(redirector) = redirector {
            let node = state.registry.window(window)?;
            let event_fields = (
                values.x.unwrap_or(node.x),
                values.y.unwrap_or(node.y),
                values.width.unwrap_or(node.width),
                values.height.unwrap_or(node.height),
                values.border_width.unwrap_or(node.border_width),
            );
            if let Some(receiver) = state.clients.get_mut(redirector) {
                let event = Event::ConfigureRequest {
                    stack_mode: values.stack_mode.map(|m| m as u8).unwrap_or(0),
                    parent: receiver.localize(parent),
                    window: receiver.localize(window),
                    sibling: receiver.localize(sibling.unwrap_or(NONE)),
                    x: event_fields.0,
                    y: event_fields.1,
                    width: event_fields.2,
                    height: event_fields.3,
                    border_width: event_fields.4,
                    value_mask: mask.bits(),
                };
                receiver.enqueue_event(&event, false);
            }
            return done();
        }
    }

    // A resize-redirect selector on the window itself intercepts size
    // changes requested by other clients; position and stacking still
    // apply.
    let mut values = values;
    if values.width.is_some() || values.height.is_some() {
        let resize_redirector: Option<ClientId> = state
            .registry
            .window(window)?
            .event_masks
            .iter()
            .find(|(other, selected)| {
                **other != client && selected.intersects(EventMask::RESIZE_REDIRECT)
            })
            .map(|(other, _)| *other);
        if let Some(redirector) = resize_redirector {
            let node = state.registry.window(window)?;
            let (width, height) =
                (values.width.unwrap_or(node.width), values.height.unwrap_or(node.height));
            if let Some(receiver) = state.clients.get_mut(redirector) {
                let event = Event::ResizeRequest {
                    window: receiver.localize(window),
                    width,
                    height,
                };
                receiver.enqueue_event(&event, false);
            }
            values.width = None;
            values.height = None;
        }
    }

    let (old_width, old_height);
    {
        let node = state.registry.window_mut(window)?;
        old_width = node.width;
        old_height = node.height;
        if let Some(x) = values.x {
            node.x = x;
        }
        if let Some(y) = values.y {
            node.y = y;
        }
        if let Some(width) = values.width {
            if width == 0 {
                return Err(XError::value(0));
            }
            node.width = width;
        }
        if let Some(height) = values.height {
            if height == 0 {
                return Err(XError::value(0));
            }
            node.height = height;
        }
        if let Some(border) = values.border_width {
            node.border_width = border;
        }
    }

    if let Some(stack_mode) = values.stack_mode {
        restack(state, window, parent, sibling, stack_mode)?;
    }

    apply_child_gravity(state, window, old_width, old_height);

    let node = state.registry.window(window)?;
    let geometry = node.geometry();
    let border_width = node.border_width;
    let above = state
        .registry
        .window(parent)
        .ok()
        .and_then(|p| {
            let index = p.children.iter().position(|c| *c == window)?;
            index.checked_sub(1).map(|below| p.children[below])
        })
        .unwrap_or(NONE);

    state.frontend.configure_window(window, geometry, border_width, sibling, values.stack_mode);
    state.structure_notify(window, move |receiver, event_window| Event::ConfigureNotify {
        event: receiver.localize(event_window),
        window: receiver.localize(window),
        above_sibling: receiver.localize(above),
        x: geometry.x,
        y: geometry.y,
        width: geometry.width,
        height: geometry.height,
        border_width,
        override_redirect,
    });
    done()
}

/// After a resize, reposition (or unmap) children according to their
/// window gravity and tell movers about it with GravityNotify.
fn apply_child_gravity(state: &mut ServerState, window: WindowId, old_width: u16, old_height: u16) {
    let Ok(node) = state.registry.window(window) else {
        return;
    };
    let dw = node.width as i32 - old_width as i32;
    let dh = node.height as i32 - old_height as i32;
    if dw == 0 && dh == 0 {
        return;
    }
    let children = node.children.clone();
    for child in children {
        let Ok(child_node) = state.registry.window(child) else {
            continue;
        };
        // Offsets per gravity value; NorthWest and Static stay put.
        let offset = match child_node.win_gravity {
            0 => {
                // Unmap gravity: the child is unmapped instead of moved.
                state.unmap_window(child, true);
                continue;
            }
            2 => (dw / 2, 0),  // North
            3 => (dw, 0),      // NorthEast
            4 => (0, dh / 2),  // West
            5 => (dw / 2, dh / 2), // Center
            6 => (dw, dh / 2), // East
            7 => (0, dh),      // SouthWest
            8 => (dw / 2, dh), // South
            9 => (dw, dh),     // SouthEast
            _ => (0, 0),
        };
        if offset == (0, 0) {
            continue;
        }
        let (x, y) = {
            let child_node = match state.registry.window_mut(child) {
                Ok(node) => node,
                Err(_) => continue,
            };
            child_node.x = (child_node.x as i32 + offset.0) as i16;
            child_node.y = (child_node.y as i32 + offset.1) as i16;
            (child_node.x, child_node.y)
        };
        state.structure_notify(child, move |receiver, event_window| Event::GravityNotify {
            event: receiver.localize(event_window),
            window: receiver.localize(child),
            x,
            y,
        });
    }
}

fn restack(
    state: &mut ServerState,
    window: WindowId,
    parent: WindowId,
    sibling: Option<WindowId>,
    mode: StackMode,
) -> Result<(), XError> {
    if parent == NONE {
        return Ok(());
    }
    let parent_node = state.registry.window_mut(parent)?;
    let children = &mut parent_node.children;
    let Some(position) = children.iter().position(|c| *c == window) else {
        return Ok(());
    };
    children.remove(position);
    let target = match (mode, sibling) {
        (StackMode::Above, Some(sibling)) => {
            let at = children.iter().position(|c| *c == sibling).map(|i| i + 1);
            at.unwrap_or(children.len())
        }
        (StackMode::Below, Some(sibling)) => {
            children.iter().position(|c| *c == sibling).unwrap_or(0)
        }
        (StackMode::Above, None) | (StackMode::TopIf, _) => children.len(),
        (StackMode::Below, None) | (StackMode::BottomIf, _) => 0,
        (StackMode::Opposite, _) => {
            if position == children.len() {
                0
            } else {
                children.len()
            }
        }
    };
    children.insert(target, window);
    Ok(())
}

fn circulate_window(
    state: &mut ServerState,
    direction: CirculateDirection,
    window: WindowId,
) -> HandlerResult {
    let node = state.registry.window_mut(window)?;
    if node.children.len() < 2 {
        return done();
    }
    let (moved, on_top) = match direction {
        CirculateDirection::RaiseLowest => {
            let lowest = node.children.remove(0);
            node.children.push(lowest);
            (lowest, true)
        }
        CirculateDirection::LowerHighest => {
            let highest = node.children.pop().expect("len checked above");
            node.children.insert(0, highest);
            (highest, false)
        }
    };
    state.structure_notify(moved, move |receiver, event_window| Event::CirculateNotify {
        event: receiver.localize(event_window),
        window: receiver.localize(moved),
        placed_on_top: on_top,
    });
    done()
}
