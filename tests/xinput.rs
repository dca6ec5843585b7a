//! XInput extension scenarios.

mod common;

use common::{body, create_window_body, server, u32le, TestClient};
use sshterm_x11::protocol::opcodes::{self, xinput};
use sshterm_x11::server::client::compose_id;

const WID_LOCAL: u32 = 0x0010_0001;
const BUTTON_PRESS: u32 = 0x0000_0004;
const DEVICE_BUTTON_PRESS_MASK: u32 = 0x0000_0004;
const POINTER_DEVICE: u8 = 2;
const KEYBOARD_DEVICE: u8 = 3;

fn class_word(device: u8, mask: u32) -> u32 {
    (mask << 8) | device as u32
}

#[tokio::test]
async fn query_extension_and_list_devices() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;

    let name = b"XInputExtension";
    let mut request = (name.len() as u16).to_le_bytes().to_vec();
    request.extend_from_slice(&[0u8; 2]);
    request.extend_from_slice(name);
    request.push(0); // pad to 4
    let sequence = client.send(opcodes::QUERY_EXTENSION, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(reply[8], 1); // present
    assert_eq!(reply[9], opcodes::XINPUT_MAJOR);
    assert_eq!(reply[10], 64); // first event

    let sequence = client.send(opcodes::XINPUT_MAJOR, xinput::LIST_INPUT_DEVICES, &[]).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(reply[8], 2); // two virtual devices
    // first device header: type atom, id, class count, use
    assert_eq!(reply[36], POINTER_DEVICE);
    assert_eq!(reply[38], 1); // IsXPointer
}

#[tokio::test]
async fn open_device_reports_classes() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;

    let sequence = client
        .send(opcodes::XINPUT_MAJOR, xinput::OPEN_DEVICE, &[POINTER_DEVICE, 0, 0, 0])
        .await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(reply[8], 2); // button + valuator classes

    // Unknown device ids are refused.
    let sequence = client.send(opcodes::XINPUT_MAJOR, xinput::OPEN_DEVICE, &[9, 0, 0, 0]).await;
    let error = client.expect_error(2, sequence).await; // Value
    assert_eq!(error[10], opcodes::XINPUT_MAJOR);
    assert_eq!(u16::from_le_bytes([error[8], error[9]]), xinput::OPEN_DEVICE as u16);
}

#[tokio::test]
async fn device_grab_preempts_core_selection() {
    // S5: the device grabber sees DeviceButtonPress; the core selector
    // sees nothing.
    let (server, _frontend) = server();
    let mut grabber = TestClient::connect(&server).await;
    let mut other = TestClient::connect(&server).await;
    let root = grabber.root;
    let wid_global = compose_id(2, WID_LOCAL);

    grabber
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID_LOCAL, root, 0, 0, 300, 300, 0, &[]),
        )
        .await;
    grabber.send(opcodes::MAP_WINDOW, 0, &u32le(WID_LOCAL)).await;

    // The other client selects the core ButtonPress.
    let select = body(&[&u32le(wid_global), &u32le(0x0000_0800), &u32le(BUTTON_PRESS)]);
    other.send(opcodes::CHANGE_WINDOW_ATTRIBUTES, 0, &select).await;

    // Open + select + grab the pointer device.
    grabber
        .send(opcodes::XINPUT_MAJOR, xinput::OPEN_DEVICE, &[POINTER_DEVICE, 0, 0, 0])
        .await;
    grabber.read_message().await; // OpenDevice reply

    let select = body(&[
        &u32le(WID_LOCAL),
        &1u16.to_le_bytes(),
        &[0u8; 2],
        &u32le(class_word(POINTER_DEVICE, DEVICE_BUTTON_PRESS_MASK)),
    ]);
    grabber.send(opcodes::XINPUT_MAJOR, xinput::SELECT_EXTENSION_EVENT, &select).await;

    let grab = body(&[
        &u32le(WID_LOCAL),
        &u32le(0), // CurrentTime
        &1u16.to_le_bytes(),
        &[1u8, 1, 0, POINTER_DEVICE], // async, async, owner_events=false
        &[0u8; 2],
        &u32le(class_word(POINTER_DEVICE, DEVICE_BUTTON_PRESS_MASK)),
    ]);
    let sequence = grabber.send(opcodes::XINPUT_MAJOR, xinput::GRAB_DEVICE, &grab).await;
    let reply = grabber.expect_reply(sequence).await;
    assert_eq!(reply[8], 0); // Success

    server.send_mouse_event(wid_global, sshterm_x11::MouseEventKind::Down, 10, 10, 1);

    let event = grabber.expect_event(64 + 3).await; // DeviceButtonPress
    assert_eq!(event[1], 1); // button
    assert_eq!(event[31], POINTER_DEVICE);
    other.expect_silence().await;
}

#[tokio::test]
async fn selections_fire_without_grab() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID_LOCAL, root, 0, 0, 300, 300, 0, &[]),
        )
        .await;
    client.send(opcodes::MAP_WINDOW, 0, &u32le(WID_LOCAL)).await;

    let select = body(&[
        &u32le(WID_LOCAL),
        &1u16.to_le_bytes(),
        &[0u8; 2],
        &u32le(class_word(POINTER_DEVICE, DEVICE_BUTTON_PRESS_MASK)),
    ]);
    client.send(opcodes::XINPUT_MAJOR, xinput::SELECT_EXTENSION_EVENT, &select).await;

    let wid_global = compose_id(2, WID_LOCAL);
    server.send_mouse_event(wid_global, sshterm_x11::MouseEventKind::Down, 5, 5, 1);
    let event = client.expect_event(64 + 3).await;
    assert_eq!(event[31], POINTER_DEVICE);
}

#[tokio::test]
async fn selecting_again_replaces_the_mask() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;
    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID_LOCAL, root, 0, 0, 100, 100, 0, &[]),
        )
        .await;

    for mask in [DEVICE_BUTTON_PRESS_MASK, 0x0000_0010] {
        let select = body(&[
            &u32le(WID_LOCAL),
            &1u16.to_le_bytes(),
            &[0u8; 2],
            &u32le(class_word(POINTER_DEVICE, mask)),
        ]);
        client.send(opcodes::XINPUT_MAJOR, xinput::SELECT_EXTENSION_EVENT, &select).await;
    }

    let sequence = client
        .send(
            opcodes::XINPUT_MAJOR,
            xinput::GET_SELECTED_EXTENSION_EVENTS,
            &u32le(WID_LOCAL),
        )
        .await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u16::from_le_bytes([reply[8], reply[9]]), 1); // one class for this client
    let word = u32::from_le_bytes([reply[32], reply[33], reply[34], reply[35]]);
    assert_eq!(word, class_word(POINTER_DEVICE, 0x0000_0010));
}

#[tokio::test]
async fn xi2_version_negotiation() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;

    let request = body(&[&2u16.to_le_bytes(), &4u16.to_le_bytes()]);
    let sequence = client.send(opcodes::XINPUT_MAJOR, xinput::XI_QUERY_VERSION, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u16::from_le_bytes([reply[8], reply[9]]), 2);
    assert_eq!(u16::from_le_bytes([reply[10], reply[11]]), 2); // server caps at 2.2

    let request = body(&[&1u16.to_le_bytes(), &0u16.to_le_bytes()]);
    let sequence = client.send(opcodes::XINPUT_MAJOR, xinput::XI_QUERY_VERSION, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u16::from_le_bytes([reply[8], reply[9]]), 1);
    assert_eq!(u16::from_le_bytes([reply[10], reply[11]]), 0);
}

#[tokio::test]
async fn xi_query_device_enumerates() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;

    let request = body(&[&0u16.to_le_bytes(), &[0u8; 2]]); // XIAllDevices
    let sequence = client.send(opcodes::XINPUT_MAJOR, xinput::XI_QUERY_DEVICE, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u16::from_le_bytes([reply[8], reply[9]]), 2);

    let request = body(&[&(KEYBOARD_DEVICE as u16).to_le_bytes(), &[0u8; 2]]);
    let sequence = client.send(opcodes::XINPUT_MAJOR, xinput::XI_QUERY_DEVICE, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u16::from_le_bytes([reply[8], reply[9]]), 1);
    assert_eq!(u16::from_le_bytes([reply[32], reply[33]]), KEYBOARD_DEVICE as u16);
}
