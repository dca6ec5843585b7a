//! Grab requests, focus, pointer queries, and SendEvent.

use tracing::debug;

use super::{done, globalize, reply, HandlerResult};
use crate::input::grabs::{ActiveGrab, PassiveGrab};
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::replies::Reply;
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::server::state::ServerState;
use crate::window::tree;

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::GrabPointer {
            owner_events,
            grab_window,
            event_mask,
            pointer_mode,
            keyboard_mode,
            confine_to,
            cursor,
            time,
        } => {
            let grab_window = globalize(state, client, grab_window);
            let confine_to = globalize(state, client, confine_to);
            let cursor = globalize(state, client, cursor);
            state.registry.window(grab_window)?;
            if confine_to != NONE {
                state.registry.window(confine_to)?;
            }
            if cursor != NONE {
                state.registry.cursor(cursor)?;
            }
            if !tree::is_viewable(&state.registry, grab_window) {
                return reply(Reply::GrabStatus { status: GrabStatus::NotViewable });
            }
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            if time > now {
                return reply(Reply::GrabStatus { status: GrabStatus::InvalidTime });
            }
            let frozen = pointer_mode == GrabMode::Sync;
            let status = state.input.pointer_grab.activate(ActiveGrab {
                client,
                window: grab_window,
                owner_events,
                event_mask,
                pointer_mode,
                keyboard_mode,
                confine_to,
                cursor,
                since: time,
                from_passive: false,
                frozen,
                queue: Default::default(),
                xi_mask: 0,
            });
            if status == GrabStatus::Success {
                let pointer_window = state.input.pointer.window;
                if pointer_window != grab_window {
                    state.emit_crossing(pointer_window, grab_window, NotifyMode::Grab);
                }
                debug!(client, window = grab_window, "pointer grabbed");
            }
            reply(Reply::GrabStatus { status })
        }
        Request::UngrabPointer { .. } => {
            let held = state.input.pointer_grab.active.as_ref().map(|grab| grab.window);
            if state.input.pointer_grab.release(client) {
                let pointer_window = state.input.pointer.window;
                if let Some(grab_window) = held {
                    if pointer_window != grab_window {
                        state.emit_crossing(grab_window, pointer_window, NotifyMode::Ungrab);
                    }
                }
                debug!(client, "pointer ungrabbed");
            }
            done()
        }
        Request::GrabButton {
            owner_events,
            grab_window,
            event_mask,
            pointer_mode,
            keyboard_mode,
            confine_to,
            cursor,
            button,
            modifiers,
        } => {
            let grab_window = globalize(state, client, grab_window);
            let confine_to = globalize(state, client, confine_to);
            let cursor = globalize(state, client, cursor);
            state.registry.window(grab_window)?;
            if confine_to != NONE {
                state.registry.window(confine_to)?;
            }
            if cursor != NONE {
                state.registry.cursor(cursor)?;
            }
            state.input.pointer_grab.add_passive(PassiveGrab {
                client,
                window: grab_window,
                detail: button,
                modifiers,
                owner_events,
                event_mask,
                pointer_mode,
                keyboard_mode,
                confine_to,
                cursor,
                xi_mask: 0,
            });
            done()
        }
        Request::UngrabButton { button, grab_window, modifiers } => {
            let grab_window = globalize(state, client, grab_window);
            state.registry.window(grab_window)?;
            state.input.pointer_grab.remove_passive(grab_window, button, modifiers);
            done()
        }
        Request::ChangeActivePointerGrab { cursor, time, event_mask } => {
            let cursor = globalize(state, client, cursor);
            if cursor != NONE {
                state.registry.cursor(cursor)?;
            }
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            if let Some(grab) = state.input.pointer_grab.active.as_mut() {
                if grab.client == client && !grab.from_passive && time >= grab.since {
                    grab.event_mask = event_mask;
                    grab.cursor = cursor;
                }
            }
            done()
        }
        Request::GrabKeyboard { owner_events, grab_window, time, pointer_mode, keyboard_mode } => {
            let grab_window = globalize(state, client, grab_window);
            state.registry.window(grab_window)?;
            if !tree::is_viewable(&state.registry, grab_window) {
                return reply(Reply::GrabStatus { status: GrabStatus::NotViewable });
            }
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            if time > now {
                return reply(Reply::GrabStatus { status: GrabStatus::InvalidTime });
            }
            let frozen = keyboard_mode == GrabMode::Sync;
            let old_focus = state.input.focus.window;
            let status = state.input.keyboard_grab.activate(ActiveGrab {
                client,
                window: grab_window,
                owner_events,
                event_mask: EventMask::KEY_PRESS | EventMask::KEY_RELEASE,
                pointer_mode,
                keyboard_mode,
                confine_to: NONE,
                cursor: NONE,
                since: time,
                from_passive: false,
                frozen,
                queue: Default::default(),
                xi_mask: 0,
            });
            if status == GrabStatus::Success {
                state.emit_focus_change(old_focus, grab_window, NotifyMode::Grab);
                debug!(client, window = grab_window, "keyboard grabbed");
            }
            reply(Reply::GrabStatus { status })
        }
        Request::UngrabKeyboard { .. } => {
            let held = state.input.keyboard_grab.active.as_ref().map(|grab| grab.window);
            if state.input.keyboard_grab.release(client) {
                if let Some(grab_window) = held {
                    let focus = state.input.focus.window;
                    state.emit_focus_change(grab_window, focus, NotifyMode::Ungrab);
                }
                debug!(client, "keyboard ungrabbed");
            }
            done()
        }
        Request::GrabKey { owner_events, grab_window, modifiers, key, pointer_mode, keyboard_mode } => {
            let grab_window = globalize(state, client, grab_window);
            state.registry.window(grab_window)?;
            state.input.keyboard_grab.add_passive(PassiveGrab {
                client,
                window: grab_window,
                detail: key,
                modifiers,
                owner_events,
                event_mask: EventMask::KEY_PRESS | EventMask::KEY_RELEASE,
                pointer_mode,
                keyboard_mode,
                confine_to: NONE,
                cursor: NONE,
                xi_mask: 0,
            });
            debug!(client, window = grab_window, key, "passive key grab installed");
            done()
        }
        Request::UngrabKey { key, grab_window, modifiers } => {
            let grab_window = globalize(state, client, grab_window);
            state.registry.window(grab_window)?;
            state.input.keyboard_grab.remove_passive(grab_window, key, modifiers);
            done()
        }
        Request::AllowEvents { mode, .. } => {
            state.apply_allow_events(client, mode);
            done()
        }
        Request::QueryPointer { window } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            let (root_x, root_y) = (state.input.pointer.root_x, state.input.pointer.root_y);
            let (win_x, win_y) = tree::root_to_window(&state.registry, window, root_x, root_y);
            let child = tree::child_at(&state.registry, window, win_x, win_y).unwrap_or(NONE);
            let localizer = state.clients.get(client);
            let local = |id: XId| localizer.map(|c| c.localize(id)).unwrap_or(id);
            reply(Reply::QueryPointer {
                same_screen: true,
                root: local(state.root),
                child: local(child),
                root_x,
                root_y,
                win_x,
                win_y,
                mask: state.input.pointer.state,
            })
        }
        Request::GetMotionEvents { window, start, stop } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            let now = state.now();
            let start = if start == CURRENT_TIME { now } else { start };
            let stop = if stop == CURRENT_TIME { now } else { stop };
            reply(Reply::GetMotionEvents { events: state.input.motion.between(start, stop) })
        }
        Request::WarpPointer {
            src_window,
            dst_window,
            src_x,
            src_y,
            src_width,
            src_height,
            dst_x,
            dst_y,
        } => {
            let src_window = globalize(state, client, src_window);
            let dst_window = globalize(state, client, dst_window);
            if src_window != NONE {
                state.registry.window(src_window)?;
                // The warp only applies while the pointer sits in the
                // source rectangle.
                let (sx, sy) = tree::root_to_window(
                    &state.registry,
                    src_window,
                    state.input.pointer.root_x,
                    state.input.pointer.root_y,
                );
                let node = state.registry.window(src_window)?;
                let width = if src_width == 0 { node.width } else { src_width };
                let height = if src_height == 0 { node.height } else { src_height };
                let rect = Rectangle { x: src_x, y: src_y, width, height };
                if !rect.contains(sx, sy) {
                    return done();
                }
            }
            let (root_x, root_y) = if dst_window == NONE {
                (
                    state.input.pointer.root_x.saturating_add(dst_x),
                    state.input.pointer.root_y.saturating_add(dst_y),
                )
            } else {
                state.registry.window(dst_window)?;
                let (ox, oy) = tree::root_origin(&state.registry, dst_window);
                ((ox + dst_x as i32) as i16, (oy + dst_y as i32) as i16)
            };
            state.frontend.warp_pointer(root_x, root_y);
            state.move_pointer_to(root_x, root_y);
            done()
        }
        Request::SetInputFocus { revert_to, focus, time } => {
            let focus = if focus == NONE || focus == POINTER_ROOT {
                focus
            } else {
                let focus = globalize(state, client, focus);
                state.registry.window(focus)?;
                if !tree::is_viewable(&state.registry, focus) {
                    return Err(XError::match_error());
                }
                focus
            };
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            if time > now || time < state.input.focus.since {
                return done();
            }
            state.set_focus(focus, revert_to, time);
            done()
        }
        Request::GetInputFocus => {
            let focus = state.input.focus;
            let window = match focus.window {
                NONE => NONE,
                POINTER_ROOT => POINTER_ROOT,
                window => super::localize(state, client, window),
            };
            reply(Reply::GetInputFocus { revert_to: focus.revert_to, focus: window })
        }
        Request::QueryKeymap => reply(Reply::QueryKeymap { keys: state.input.keys_down }),
        Request::SendEvent { propagate, destination, event_mask, event } => {
            send_event(state, client, propagate, destination, event_mask, event)
        }
        other => unreachable!("non-input request routed here: {other:?}"),
    }
}

/// SendEvent: re-emit the 32-byte body with the synthetic bit set. The
/// body itself is opaque; only destination resolution and mask-based
/// fan-out happen here.
fn send_event(
    state: &mut ServerState,
    client: ClientId,
    propagate: bool,
    destination: WindowId,
    event_mask: EventMask,
    body: [u8; 32],
) -> HandlerResult {
    let target = match destination {
        POINTER_WINDOW => state.input.pointer.window,
        INPUT_FOCUS => match state.input.focus.window {
            NONE => return done(),
            POINTER_ROOT => state.input.pointer.window,
            window => window,
        },
        window => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            window
        }
    };

    if event_mask.is_empty() {
        // Empty mask targets the window's creator.
        let receiver = state.registry.owner_of(target).unwrap_or(client);
        state.clients.deliver(receiver, &Event::Raw(body), true);
        return done();
    }

    let mut current = target;
    while current != NONE {
        let node = state.registry.window(current)?;
        let selectors = node.selectors_of(event_mask);
        let parent = node.parent;
        let blocked = node.do_not_propagate.intersects(event_mask);
        if !selectors.is_empty() {
            for receiver in selectors {
                state.clients.deliver(receiver, &Event::Raw(body), true);
            }
            return done();
        }
        if !propagate || blocked {
            return done();
        }
        current = parent;
    }
    done()
}
