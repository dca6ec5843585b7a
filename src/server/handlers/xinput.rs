//! XInput extension request handlers.

use tracing::debug;

use super::{done, globalize, reply, HandlerResult};
use crate::input::grabs::{ActiveGrab, PassiveGrab};
use crate::protocol::errors::XError;
use crate::protocol::events::Event;
use crate::protocol::replies::Reply;
use crate::protocol::types::*;
use crate::protocol::xinput::{EventClass, XIReply, XInputRequest};
use crate::server::state::ServerState;
use crate::window::tree;
use crate::xinput;

pub fn handle(state: &mut ServerState, client: ClientId, request: XInputRequest) -> HandlerResult {
    match request {
        XInputRequest::GetExtensionVersion { .. } => reply(Reply::XInput(
            XIReply::GetExtensionVersion { major: 2, minor: 2, present: true },
        )),
        XInputRequest::ListInputDevices => {
            let devices = xinput::device_inventory(
                state.config.width,
                state.config.height,
                state.config.motion_buffer_size,
            );
            reply(Reply::XInput(XIReply::ListInputDevices { devices }))
        }
        XInputRequest::OpenDevice { device } => {
            let device = crate::xinput::XInputState::check_device(device)?;
            if let Some(client_state) = state.clients.get_mut(client) {
                client_state.open_devices.insert(device);
            }
            debug!(client, device, "device opened");
            reply(Reply::XInput(XIReply::OpenDevice {
                classes: xinput::open_device_classes(device),
            }))
        }
        XInputRequest::CloseDevice { device } => {
            let device = crate::xinput::XInputState::check_device(device)?;
            if let Some(client_state) = state.clients.get_mut(client) {
                client_state.open_devices.remove(&device);
            }
            done()
        }
        XInputRequest::SelectExtensionEvent { window, classes } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            for class in classes {
                crate::xinput::XInputState::check_device(class.device)?;
                // Selecting the same device again replaces the mask.
                state.xinput.select(window, client, class.device, class.mask);
            }
            done()
        }
        XInputRequest::GetSelectedExtensionEvents { window } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            let mut this_client = Vec::new();
            let mut all_clients = Vec::new();
            for (owner, device, mask) in state.xinput.selections_on(window) {
                let class = EventClass { device, mask };
                if owner == client {
                    this_client.push(class);
                }
                all_clients.push(class);
            }
            reply(Reply::XInput(XIReply::GetSelectedExtensionEvents { this_client, all_clients }))
        }
        XInputRequest::GrabDevice {
            window,
            time,
            this_device_mode,
            other_device_mode,
            owner_events,
            device,
            classes,
        } => {
            let device = crate::xinput::XInputState::check_device(device)?;
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            if !tree::is_viewable(&state.registry, window) {
                return reply(Reply::XInput(XIReply::GrabDevice {
                    status: GrabStatus::NotViewable,
                }));
            }
            let now = state.now();
            let time = if time == CURRENT_TIME { now } else { time };
            if time > now {
                return reply(Reply::XInput(XIReply::GrabDevice {
                    status: GrabStatus::InvalidTime,
                }));
            }
            let xi_mask = classes
                .iter()
                .filter(|class| class.device == device)
                .fold(0u32, |acc, class| acc | class.mask);
            let frozen = this_device_mode == GrabMode::Sync;
            let status = state.xinput.grab_set(device).activate(ActiveGrab {
                client,
                window,
                owner_events,
                event_mask: EventMask::empty(),
                pointer_mode: this_device_mode,
                keyboard_mode: other_device_mode,
                confine_to: NONE,
                cursor: NONE,
                since: time,
                from_passive: false,
                frozen,
                queue: Default::default(),
                xi_mask,
            });
            debug!(client, device, window, ?status, "device grab");
            reply(Reply::XInput(XIReply::GrabDevice { status }))
        }
        XInputRequest::UngrabDevice { device, .. } => {
            let device = crate::xinput::XInputState::check_device(device)?;
            state.xinput.grab_set(device).release(client);
            done()
        }
        XInputRequest::GrabDeviceKey {
            window,
            modifiers,
            grabbed_device,
            key,
            this_device_mode,
            other_device_mode,
            owner_events,
            classes,
            ..
        } => {
            let device = crate::xinput::XInputState::check_device(grabbed_device)?;
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            let xi_mask = classes
                .iter()
                .filter(|class| class.device == device)
                .fold(0u32, |acc, class| acc | class.mask);
            state.xinput.grab_set(device).add_passive(PassiveGrab {
                client,
                window,
                detail: key,
                modifiers,
                owner_events,
                event_mask: EventMask::empty(),
                pointer_mode: this_device_mode,
                keyboard_mode: other_device_mode,
                confine_to: NONE,
                cursor: NONE,
                xi_mask,
            });
            done()
        }
        XInputRequest::UngrabDeviceKey { window, modifiers, key, grabbed_device, .. } => {
            let device = crate::xinput::XInputState::check_device(grabbed_device)?;
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            state.xinput.grab_set(device).remove_passive(window, key, modifiers);
            done()
        }
        XInputRequest::GrabDeviceButton {
            window,
            grabbed_device,
            modifiers,
            this_device_mode,
            other_device_mode,
            button,
            owner_events,
            classes,
            ..
        } => {
            let device = crate::xinput::XInputState::check_device(grabbed_device)?;
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            let xi_mask = classes
                .iter()
                .filter(|class| class.device == device)
                .fold(0u32, |acc, class| acc | class.mask);
            state.xinput.grab_set(device).add_passive(PassiveGrab {
                client,
                window,
                detail: button,
                modifiers,
                owner_events,
                event_mask: EventMask::empty(),
                pointer_mode: this_device_mode,
                keyboard_mode: other_device_mode,
                confine_to: NONE,
                cursor: NONE,
                xi_mask,
            });
            done()
        }
        XInputRequest::UngrabDeviceButton { window, modifiers, button, grabbed_device, .. } => {
            let device = crate::xinput::XInputState::check_device(grabbed_device)?;
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            state.xinput.grab_set(device).remove_passive(window, button, modifiers);
            done()
        }
        XInputRequest::AllowDeviceEvents { mode, device, .. } => {
            let device = crate::xinput::XInputState::check_device(device)?;
            // Same thaw semantics as core AllowEvents, per device.
            let grab_set = state.xinput.grab_set(device);
            if let Some(grab) = grab_set.active.as_mut() {
                if grab.client == client {
                    match mode {
                        // AsyncThisDevice and friends all thaw.
                        0 | 1 | 2 | 3 | 4 | 5 => {
                            grab.frozen = false;
                            grab.queue.clear();
                        }
                        other => return Err(XError::value(other as u32)),
                    }
                }
            }
            done()
        }
        XInputRequest::SendExtensionEvent { destination, device, propagate, events, classes } => {
            let device = crate::xinput::XInputState::check_device(device)?;
            let destination = globalize(state, client, destination);
            state.registry.window(destination)?;
            let mask = classes
                .iter()
                .filter(|class| class.device == device)
                .fold(0u32, |acc, class| acc | class.mask);
            send_extension_events(state, destination, device, mask, propagate, &events);
            done()
        }
        XInputRequest::XiSelectEvents { window, masks } => {
            let window = globalize(state, client, window);
            state.registry.window(window)?;
            for mask in masks {
                state.xinput.set_xi2_mask(window, client, mask.device, mask.mask);
            }
            done()
        }
        XInputRequest::XiQueryVersion { major, minor } => {
            let (major, minor) = state.xinput.negotiate(client, major, minor);
            reply(Reply::XInput(XIReply::XiQueryVersion { major, minor }))
        }
        XInputRequest::XiQueryDevice { device } => {
            let devices = xinput::device_inventory(
                state.config.width,
                state.config.height,
                state.config.motion_buffer_size,
            );
            let devices = match device {
                // 0 = XIAllDevices, 1 = XIAllMasterDevices.
                0 | 1 => devices,
                id => {
                    let wanted: Vec<_> = devices
                        .into_iter()
                        .filter(|descriptor| descriptor.id as u16 == id)
                        .collect();
                    if wanted.is_empty() {
                        return Err(XError::value(id as u32));
                    }
                    wanted
                }
            };
            reply(Reply::XInput(XIReply::XiQueryDevice { devices }))
        }
    }
}

/// Deliver the raw extension event bodies to every client whose selection
/// on the destination (or, with propagate, an ancestor) matches the class
/// mask.
fn send_extension_events(
    state: &mut ServerState,
    destination: WindowId,
    device: DeviceId,
    mask: u32,
    propagate: bool,
    events: &[[u8; 32]],
) {
    let mut current = destination;
    while current != NONE {
        let receivers = state.xinput.selectors_of(current, device, mask);
        if !receivers.is_empty() {
            for receiver in receivers {
                for body in events {
                    state.clients.deliver(receiver, &Event::Raw(*body), true);
                }
            }
            return;
        }
        if !propagate {
            return;
        }
        current = state.registry.window(current).map(|node| node.parent).unwrap_or(NONE);
    }
}
