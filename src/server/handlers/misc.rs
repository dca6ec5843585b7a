//! Cursors, extensions, keyboard/pointer bookkeeping, hosts, screen
//! saver, close-down, and the other odds and ends of the core protocol.

use tracing::debug;

use super::{done, globalize, reply, HandlerResult};
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::opcodes;
use crate::protocol::replies::{HostEntry, Reply};
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::resources::cursor::{CursorRecord, CursorSource};
use crate::resources::registry::Resource;
use crate::server::keymap;
use crate::server::state::ServerState;

pub fn handle_cursor(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::CreateCursor {
            cid,
            source,
            mask,
            fore_red,
            fore_green,
            fore_blue,
            back_red,
            back_green,
            back_blue,
            x,
            y,
        } => {
            if cid == NONE || cid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(cid));
            }
            let cid = globalize(state, client, cid);
            let source = globalize(state, client, source);
            let mask = globalize(state, client, mask);
            let source_pixmap = state.registry.pixmap(source)?;
            if source_pixmap.depth != 1 {
                return Err(XError::match_error());
            }
            if mask != NONE {
                let mask_pixmap = state.registry.pixmap(mask)?;
                if mask_pixmap.depth != 1 {
                    return Err(XError::match_error());
                }
            }
            let record = CursorRecord {
                id: cid,
                source: CursorSource::Pixmaps,
                fore_rgb: (fore_red, fore_green, fore_blue),
                back_rgb: (back_red, back_green, back_blue),
            };
            state.registry.insert(client, cid, Resource::Cursor(record.clone()))?;
            state.frontend.create_cursor(&record, source, mask, x, y);
            done()
        }
        Request::CreateGlyphCursor {
            cid,
            source_font,
            mask_font,
            source_char,
            mask_char,
            fore_red,
            fore_green,
            fore_blue,
            back_red,
            back_green,
            back_blue,
        } => {
            if cid == NONE || cid > RESOURCE_ID_MASK {
                return Err(XError::id_choice(cid));
            }
            let cid = globalize(state, client, cid);
            let source_font = globalize(state, client, source_font);
            let mask_font = globalize(state, client, mask_font);
            state.registry.font(source_font)?;
            if mask_font != NONE {
                state.registry.font(mask_font)?;
            }
            let record = CursorRecord {
                id: cid,
                source: CursorSource::Glyph { source_char, mask_char },
                fore_rgb: (fore_red, fore_green, fore_blue),
                back_rgb: (back_red, back_green, back_blue),
            };
            state.registry.insert(client, cid, Resource::Cursor(record.clone()))?;
            state.frontend.create_glyph_cursor(&record, source_font, mask_font);
            done()
        }
        Request::FreeCursor { cursor } => {
            let cursor = globalize(state, client, cursor);
            state.registry.cursor(cursor)?;
            state.registry.remove(cursor);
            state.frontend.free_cursor(cursor);
            done()
        }
        Request::RecolorCursor {
            cursor,
            fore_red,
            fore_green,
            fore_blue,
            back_red,
            back_green,
            back_blue,
        } => {
            let cursor = globalize(state, client, cursor);
            let record = state.registry.cursor_mut(cursor)?;
            record.fore_rgb = (fore_red, fore_green, fore_blue);
            record.back_rgb = (back_red, back_green, back_blue);
            let record = state.registry.cursor(cursor)?.clone();
            state.frontend.recolor_cursor(&record);
            done()
        }
        other => unreachable!("non-cursor request routed here: {other:?}"),
    }
}

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::QueryExtension { name } => {
            let present = name == "XInputExtension";
            reply(Reply::QueryExtension {
                present,
                major_opcode: if present { opcodes::XINPUT_MAJOR } else { 0 },
                first_event: if present { crate::xinput::FIRST_EVENT } else { 0 },
                first_error: if present { crate::xinput::FIRST_ERROR } else { 0 },
            })
        }
        Request::ListExtensions => {
            reply(Reply::ListExtensions { names: vec!["XInputExtension".to_string()] })
        }
        Request::GrabServer => {
            // Bookkeeping only: the single-writer model already serialises
            // request handling across connections.
            state.server_grab = Some(client);
            done()
        }
        Request::UngrabServer => {
            if state.server_grab == Some(client) {
                state.server_grab = None;
            }
            done()
        }
        Request::ChangeKeyboardMapping { first_keycode, keysyms_per_keycode, keysyms } => {
            if first_keycode < keymap::MIN_KEYCODE {
                return Err(XError::value(first_keycode as u32));
            }
            let accepted = state.frontend.change_keyboard_mapping(
                first_keycode,
                keysyms_per_keycode,
                &keysyms,
            );
            if !accepted {
                // Keep a server-side copy so GetKeyboardMapping agrees.
                store_keymap(state, first_keycode, keysyms_per_keycode, &keysyms);
            }
            let count = (keysyms.len() / keysyms_per_keycode.max(1) as usize) as u8;
            broadcast_mapping(state, 1, first_keycode, count);
            done()
        }
        Request::GetKeyboardMapping { first_keycode, count } => {
            if first_keycode < keymap::MIN_KEYCODE
                || first_keycode as u16 + count as u16 - 1 > keymap::MAX_KEYCODE as u16
            {
                return Err(XError::value(first_keycode as u32));
            }
            if let Some((per, keysyms)) = state.frontend.get_keyboard_mapping(first_keycode, count) {
                return reply(Reply::GetKeyboardMapping { keysyms_per_keycode: per, keysyms });
            }
            let per = state.keymap.keysyms_per_keycode;
            let start = (first_keycode - keymap::MIN_KEYCODE) as usize * per as usize;
            let len = count as usize * per as usize;
            let keysyms = state.keymap.keysyms[start..start + len].to_vec();
            reply(Reply::GetKeyboardMapping { keysyms_per_keycode: per, keysyms })
        }
        Request::ChangeKeyboardControl { mask, values } => {
            // Value list in mask-bit order: key-click, bell volume/pitch/
            // duration, led, led-mode, key, auto-repeat-mode.
            let mut values = values.into_iter();
            if mask & 0x01 != 0 {
                if let Some(value) = values.next() {
                    state.keyboard_settings.key_click_percent = value as u8;
                }
            }
            if mask & 0x02 != 0 {
                if let Some(value) = values.next() {
                    state.keyboard_settings.bell_percent = value as u8;
                }
            }
            if mask & 0x04 != 0 {
                if let Some(value) = values.next() {
                    state.keyboard_settings.bell_pitch = value as u16;
                }
            }
            if mask & 0x08 != 0 {
                if let Some(value) = values.next() {
                    state.keyboard_settings.bell_duration = value as u16;
                }
            }
            done()
        }
        Request::GetKeyboardControl => {
            let settings = &state.keyboard_settings;
            reply(Reply::GetKeyboardControl {
                global_auto_repeat: settings.global_auto_repeat,
                led_mask: settings.led_mask,
                key_click_percent: settings.key_click_percent,
                bell_percent: settings.bell_percent,
                bell_pitch: settings.bell_pitch,
                bell_duration: settings.bell_duration,
                auto_repeats: settings.auto_repeats,
            })
        }
        Request::Bell { percent } => {
            if !(-100..=100).contains(&percent) {
                return Err(XError::value(percent as u32));
            }
            state.frontend.bell(percent);
            done()
        }
        Request::ChangePointerControl {
            acceleration_numerator,
            acceleration_denominator,
            threshold,
            do_acceleration,
            do_threshold,
        } => {
            if do_acceleration {
                if acceleration_denominator == 0 {
                    return Err(XError::value(0));
                }
                state.pointer_settings.acceleration_numerator = acceleration_numerator as u16;
                state.pointer_settings.acceleration_denominator = acceleration_denominator as u16;
            }
            if do_threshold {
                state.pointer_settings.threshold = threshold as u16;
            }
            done()
        }
        Request::GetPointerControl => {
            let settings = state.pointer_settings;
            reply(Reply::GetPointerControl {
                acceleration_numerator: settings.acceleration_numerator,
                acceleration_denominator: settings.acceleration_denominator,
                threshold: settings.threshold,
            })
        }
        Request::SetPointerMapping { map } => {
            if map.len() != state.keymap.pointer_map.len() {
                return Err(XError::value(map.len() as u32));
            }
            // Remapping a pressed button is refused with a Busy status.
            let busy = !state.input.pointer.state.is_empty()
                && state.input.pointer.state.intersects(
                    KeyButMask::BUTTON1
                        | KeyButMask::BUTTON2
                        | KeyButMask::BUTTON3
                        | KeyButMask::BUTTON4
                        | KeyButMask::BUTTON5,
                );
            if busy {
                return reply(Reply::SetPointerMapping { status: 1 });
            }
            if !state.frontend.set_pointer_mapping(&map) {
                state.keymap.pointer_map = map;
            }
            broadcast_mapping(state, 2, 0, 0);
            reply(Reply::SetPointerMapping { status: 0 })
        }
        Request::GetPointerMapping => {
            let map = state.frontend.get_pointer_mapping();
            let map = if map.is_empty() { state.keymap.pointer_map.clone() } else { map };
            reply(Reply::GetPointerMapping { map })
        }
        Request::SetModifierMapping { keycodes_per_modifier, keycodes } => {
            if keycodes.len() != 8 * keycodes_per_modifier as usize {
                return Err(XError::length());
            }
            state.keymap.keycodes_per_modifier = keycodes_per_modifier;
            state.keymap.modifier_map = keycodes;
            broadcast_mapping(state, 0, 0, 0);
            reply(Reply::SetModifierMapping { status: 0 })
        }
        Request::GetModifierMapping => reply(Reply::GetModifierMapping {
            keycodes_per_modifier: state.keymap.keycodes_per_modifier,
            keycodes: state.keymap.modifier_map.clone(),
        }),
        Request::SetScreenSaver { timeout, interval, prefer_blanking, allow_exposures } => {
            if prefer_blanking > 2 || allow_exposures > 2 {
                return Err(XError::value(prefer_blanking.max(allow_exposures) as u32));
            }
            if timeout >= 0 {
                state.screen_saver.timeout = timeout;
            }
            if interval >= 0 {
                state.screen_saver.interval = interval;
            }
            state.screen_saver.prefer_blanking = prefer_blanking;
            state.screen_saver.allow_exposures = allow_exposures;
            done()
        }
        Request::GetScreenSaver => {
            let saver = state.screen_saver;
            reply(Reply::GetScreenSaver {
                timeout: saver.timeout as u16,
                interval: saver.interval as u16,
                prefer_blanking: saver.prefer_blanking,
                allow_exposures: saver.allow_exposures,
            })
        }
        Request::ForceScreenSaver { .. } => {
            // There is no physical screen to blank behind the forwarder.
            done()
        }
        Request::ChangeHosts { insert, family, address } => {
            if family > 2 && family != 5 && family != 6 {
                return Err(XError::value(family as u32));
            }
            if insert {
                let exists = state
                    .hosts
                    .iter()
                    .any(|host| host.family == family && host.address == address);
                if !exists {
                    state.hosts.push(HostEntry { family, address });
                }
            } else {
                state
                    .hosts
                    .retain(|host| !(host.family == family && host.address == address));
            }
            done()
        }
        Request::ListHosts => reply(Reply::ListHosts {
            enabled: state.access_control,
            hosts: state.hosts.clone(),
        }),
        Request::SetAccessControl { enabled } => {
            state.access_control = enabled;
            done()
        }
        Request::SetCloseDownMode { mode } => {
            if let Some(client_state) = state.clients.get_mut(client) {
                client_state.close_down = mode;
            }
            debug!(client, ?mode, "close-down mode recorded");
            done()
        }
        Request::KillClient { resource } => {
            if resource == NONE {
                // AllTemporary: nothing is retained, so nothing to kill.
                return done();
            }
            let resource = globalize(state, client, resource);
            if !state.kill_by_resource(resource) {
                return Err(XError::value(resource));
            }
            done()
        }
        Request::NoOperation => done(),
        other => unreachable!("unrouted request: {other:?}"),
    }
}

fn store_keymap(state: &mut ServerState, first_keycode: KeyCode, per: u8, keysyms: &[KeySym]) {
    if per != state.keymap.keysyms_per_keycode {
        // Re-shape the table when a client uses a different width.
        let count = keymap::MAX_KEYCODE - keymap::MIN_KEYCODE + 1;
        let mut table = vec![0; count as usize * per as usize];
        let old_per = state.keymap.keysyms_per_keycode as usize;
        for keycode in 0..count as usize {
            for sym in 0..old_per.min(per as usize) {
                table[keycode * per as usize + sym] = state.keymap.keysyms[keycode * old_per + sym];
            }
        }
        state.keymap.keysyms = table;
        state.keymap.keysyms_per_keycode = per;
    }
    let start = (first_keycode - keymap::MIN_KEYCODE) as usize * per as usize;
    let end = (start + keysyms.len()).min(state.keymap.keysyms.len());
    state.keymap.keysyms[start..end].copy_from_slice(&keysyms[..end - start]);
}

/// MappingNotify goes to every connected client.
fn broadcast_mapping(state: &mut ServerState, request: u8, first_keycode: KeyCode, count: u8) {
    for client in state.clients.ids() {
        state.clients.deliver(
            client,
            &Event::MappingNotify { request, first_keycode, count },
            false,
        );
    }
}
