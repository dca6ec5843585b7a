//! Atoms, properties, and selections.

use tracing::debug;

use super::{done, globalize, reply, HandlerResult};
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::replies::Reply;
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::resources::atoms::predefined;
use crate::server::state::{SelectionRecord, ServerState};
use crate::window::properties::PropertyFetch;

pub fn handle(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    match request {
        Request::InternAtom { only_if_exists, name } => {
            let atom = state.atoms.intern(&name, only_if_exists).unwrap_or(NONE);
            reply(Reply::InternAtom { atom })
        }
        Request::GetAtomName { atom } => {
            let name = state.atoms.name(atom).ok_or_else(|| XError::atom(atom))?;
            reply(Reply::GetAtomName { name: name.to_string() })
        }
        Request::ChangeProperty { mode, window, property, property_type, format, data } => {
            let window = globalize(state, client, window);
            if !state.atoms.exists(property) {
                return Err(XError::atom(property));
            }
            let node = state.registry.window_mut(window)?;
            node.properties.change(property, property_type, format, mode, &data)?;

            // Title relay: WM_NAME / _NET_WM_NAME drive the front-end's
            // window caption.
            let net_wm_name = state.atoms.lookup("_NET_WM_NAME");
            if property == predefined::WM_NAME || Some(property) == net_wm_name {
                let title: String = data.iter().map(|b| *b as char).collect();
                state.frontend.set_window_title(window, &title);
            }

            let time = state.now();
            state.fan_out(window, EventMask::PROPERTY_CHANGE, |receiver| Event::PropertyNotify {
                window: receiver.localize(window),
                atom: property,
                time,
                deleted: false,
            });
            done()
        }
        Request::DeleteProperty { window, property } => {
            let window = globalize(state, client, window);
            if !state.atoms.exists(property) {
                return Err(XError::atom(property));
            }
            let removed = state.registry.window_mut(window)?.properties.delete(property);
            if removed.is_some() {
                let time = state.now();
                state.fan_out(window, EventMask::PROPERTY_CHANGE, |receiver| {
                    Event::PropertyNotify {
                        window: receiver.localize(window),
                        atom: property,
                        time,
                        deleted: true,
                    }
                });
            }
            done()
        }
        Request::GetProperty { delete, window, property, property_type, long_offset, long_length } => {
            let window = globalize(state, client, window);
            if !state.atoms.exists(property) {
                return Err(XError::atom(property));
            }
            let fetch = state.registry.window_mut(window)?.properties.fetch(
                property,
                property_type,
                long_offset,
                long_length,
                delete,
            )?;
            match fetch {
                PropertyFetch::Missing => reply(Reply::GetProperty {
                    format: 0,
                    property_type: NONE,
                    bytes_after: 0,
                    value: Vec::new(),
                }),
                PropertyFetch::TypeMismatch { actual_type, format, total_len } => {
                    reply(Reply::GetProperty {
                        format,
                        property_type: actual_type,
                        bytes_after: total_len,
                        value: Vec::new(),
                    })
                }
                PropertyFetch::Value { type_atom, format, bytes_after, data, exhausted } => {
                    if exhausted {
                        let time = state.now();
                        state.fan_out(window, EventMask::PROPERTY_CHANGE, |receiver| {
                            Event::PropertyNotify {
                                window: receiver.localize(window),
                                atom: property,
                                time,
                                deleted: true,
                            }
                        });
                    }
                    reply(Reply::GetProperty {
                        format,
                        property_type: type_atom,
                        bytes_after,
                        value: data,
                    })
                }
            }
        }
        Request::ListProperties { window } => {
            let window = globalize(state, client, window);
            let atoms = state.registry.window(window)?.properties.atoms();
            reply(Reply::ListProperties { atoms })
        }
        Request::RotateProperties { window, delta, properties } => {
            let window = globalize(state, client, window);
            for atom in &properties {
                if !state.atoms.exists(*atom) {
                    return Err(XError::atom(*atom));
                }
            }
            let rotated = state.registry.window_mut(window)?.properties.rotate(&properties, delta)?;
            let time = state.now();
            for atom in rotated {
                state.fan_out(window, EventMask::PROPERTY_CHANGE, |receiver| {
                    Event::PropertyNotify {
                        window: receiver.localize(window),
                        atom,
                        time,
                        deleted: false,
                    }
                });
            }
            done()
        }
        Request::SetSelectionOwner { owner, selection, time } => {
            let owner = globalize(state, client, owner);
            if !state.atoms.exists(selection) {
                return Err(XError::atom(selection));
            }
            if owner != NONE {
                state.registry.window(owner)?;
            }
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            let previous = state.selections.get(&selection).copied();
            if let Some(previous) = previous {
                // Late requests lose silently, per protocol.
                if time < previous.since {
                    return done();
                }
                if previous.owner != owner && previous.owner != NONE {
                    if let Some(receiver) = state.clients.get_mut(previous.client) {
                        let event = Event::SelectionClear {
                            time,
                            owner: receiver.localize(previous.owner),
                            selection,
                        };
                        receiver.enqueue_event(&event, false);
                    }
                }
            }
            if owner == NONE {
                state.selections.remove(&selection);
            } else {
                state
                    .selections
                    .insert(selection, SelectionRecord { owner, client, since: time });
            }
            debug!(selection, owner, "selection owner changed");
            done()
        }
        Request::GetSelectionOwner { selection } => {
            if !state.atoms.exists(selection) {
                return Err(XError::atom(selection));
            }
            let owner = state.selections.get(&selection).map(|record| record.owner).unwrap_or(NONE);
            let owner = super::localize(state, client, owner);
            reply(Reply::GetSelectionOwner { owner })
        }
        Request::ConvertSelection { requestor, selection, target, property, time } => {
            let requestor = globalize(state, client, requestor);
            state.registry.window(requestor)?;
            for atom in [selection, target] {
                if !state.atoms.exists(atom) {
                    return Err(XError::atom(atom));
                }
            }
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            match state.selections.get(&selection).copied() {
                Some(record) => {
                    // Relay a SelectionRequest to the owner, which will
                    // answer with its own SendEvent.
                    if let Some(receiver) = state.clients.get_mut(record.client) {
                        let event = Event::SelectionRequest {
                            time,
                            owner: receiver.localize(record.owner),
                            requestor: receiver.localize(requestor),
                            selection,
                            target,
                            property,
                        };
                        receiver.enqueue_event(&event, false);
                    }
                }
                None => {
                    // No owner: bridge the host clipboard for text
                    // targets, otherwise refuse.
                    let mut granted = NONE;
                    let text_target = target == predefined::STRING
                        || state.atoms.name(target) == Some("UTF8_STRING");
                    if text_target && property != NONE {
                        if let Some(data) = state.frontend.read_clipboard() {
                            state.registry.window_mut(requestor)?.properties.change(
                                property,
                                target,
                                8,
                                PropertyMode::Replace,
                                &data,
                            )?;
                            granted = property;
                        }
                    }
                    if let Some(receiver) = state.clients.get_mut(client) {
                        let event = Event::SelectionNotify {
                            time,
                            requestor: receiver.localize(requestor),
                            selection,
                            target,
                            property: granted,
                        };
                        receiver.enqueue_event(&event, false);
                    }
                }
            }
            done()
        }
        other => unreachable!("non-property request routed here: {other:?}"),
    }
}
