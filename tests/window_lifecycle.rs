//! Window creation, mapping, geometry, and the tree invariants.

mod common;

use common::{body, create_window_body, server, u32le, TestClient};
use sshterm_x11::frontend::FrontendCall;
use sshterm_x11::protocol::opcodes;

const WID: u32 = 0x0010_0001;
const EXPOSURE: u32 = 0x0000_8000;
const STRUCTURE_NOTIFY: u32 = 0x0002_0000;

#[tokio::test]
async fn create_map_expose() {
    // CreateWindow with an empty value mask + MapWindow still yields
    // exactly one Expose for the owner.
    let (server, frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID, root, 0, 0, 800, 600, 0, &[]),
        )
        .await;
    client.send(opcodes::MAP_WINDOW, 0, &u32le(WID)).await;

    let expose = client.expect_event(12).await;
    assert_eq!(u32::from_le_bytes([expose[4], expose[5], expose[6], expose[7]]), WID);
    assert_eq!(u16::from_le_bytes([expose[8], expose[9]]), 0); // x
    assert_eq!(u16::from_le_bytes([expose[10], expose[11]]), 0); // y
    assert_eq!(u16::from_le_bytes([expose[12], expose[13]]), 800);
    assert_eq!(u16::from_le_bytes([expose[14], expose[15]]), 600);
    assert_eq!(u16::from_le_bytes([expose[16], expose[17]]), 0); // count
    client.expect_silence().await;

    // The front-end saw the same lifecycle.
    let calls = frontend.calls();
    assert!(calls.iter().any(|call| matches!(call, FrontendCall::CreateWindow { .. })));
    assert!(calls.iter().any(|call| matches!(call, FrontendCall::MapWindow { .. })));
}

#[tokio::test]
async fn expose_respects_exposure_selectors() {
    // Once anyone selects Exposure, delivery is strictly by selection.
    let (server, _frontend) = server();
    let mut owner = TestClient::connect(&server).await;
    let mut watcher = TestClient::connect(&server).await;
    let root = owner.root;
    let wid_global = sshterm_x11::server::client::compose_id(2, WID);

    owner
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 64, 64, 0, &[]))
        .await;
    let select = body(&[&u32le(wid_global), &u32le(0x0000_0800), &u32le(EXPOSURE)]);
    watcher.send(opcodes::CHANGE_WINDOW_ATTRIBUTES, 0, &select).await;
    owner.send(opcodes::MAP_WINDOW, 0, &u32le(WID)).await;

    let expose = watcher.expect_event(12).await;
    assert_eq!(
        u32::from_le_bytes([expose[4], expose[5], expose[6], expose[7]]),
        wid_global
    );
    owner.expect_silence().await;
}

#[tokio::test]
async fn structure_notify_reports_map_and_configure() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID, root, 10, 10, 300, 200, STRUCTURE_NOTIFY, &[STRUCTURE_NOTIFY]),
        )
        .await;
    client.send(opcodes::MAP_WINDOW, 0, &u32le(WID)).await;
    let map_notify = client.expect_event(19).await;
    assert_eq!(
        u32::from_le_bytes([map_notify[8], map_notify[9], map_notify[10], map_notify[11]]),
        WID
    );

    // ConfigureWindow x/y/width selected by the mask, in mask order.
    let configure = body(&[
        &u32le(WID),
        &0x0005u16.to_le_bytes(), // X | WIDTH
        &[0u8; 2],
        &u32le(50i32 as u32),
        &u32le(640),
    ]);
    client.send(opcodes::CONFIGURE_WINDOW, 0, &configure).await;
    let notify = client.expect_event(22).await;
    let x = i16::from_le_bytes([notify[16], notify[17]]);
    let width = u16::from_le_bytes([notify[20], notify[21]]);
    assert_eq!(x, 50);
    assert_eq!(width, 640);

    // GetGeometry agrees.
    let sequence = client.send(opcodes::GET_GEOMETRY, 0, &u32le(WID)).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(i16::from_le_bytes([reply[12], reply[13]]), 50);
    assert_eq!(u16::from_le_bytes([reply[16], reply[17]]), 640);
    assert_eq!(reply[1], 24); // depth
}

#[tokio::test]
async fn query_tree_lists_children_bottom_first() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    for wid in [WID, WID + 1] {
        client
            .send(
                opcodes::CREATE_WINDOW,
                24,
                &create_window_body(wid, root, 0, 0, 100, 100, 0, &[]),
            )
            .await;
    }
    let sequence = client.send(opcodes::QUERY_TREE, 0, &u32le(WID)).await;
    let reply = client.expect_reply(sequence).await;
    // parent is the root, no children
    assert_eq!(u32::from_le_bytes([reply[12], reply[13], reply[14], reply[15]]), root);
    assert_eq!(u16::from_le_bytes([reply[16], reply[17]]), 0);

    let sequence = client.send(opcodes::QUERY_TREE, 0, &u32le(root)).await;
    let reply = client.expect_reply(sequence).await;
    let count = u16::from_le_bytes([reply[16], reply[17]]) as usize;
    assert_eq!(count, 2);
    let first = u32::from_le_bytes([reply[32], reply[33], reply[34], reply[35]]);
    let second = u32::from_le_bytes([reply[36], reply[37], reply[38], reply[39]]);
    assert_eq!((first, second), (WID, WID + 1));
}

#[tokio::test]
async fn create_window_errors() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    // Unknown parent.
    let sequence = client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID, 0x0004_2000, 0, 0, 10, 10, 0, &[]),
        )
        .await;
    client.expect_error(3, sequence).await; // Window

    // Duplicate id.
    client
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 10, 10, 0, &[]))
        .await;
    let sequence = client
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 10, 10, 0, &[]))
        .await;
    client.expect_error(14, sequence).await; // IDChoice

    // Zero width.
    let sequence = client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID + 1, root, 0, 0, 0, 10, 0, &[]),
        )
        .await;
    client.expect_error(2, sequence).await; // Value
}

#[tokio::test]
async fn translate_coordinates_finds_child() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID, root, 100, 50, 400, 300, 0, &[]),
        )
        .await;
    client.send(opcodes::MAP_WINDOW, 0, &u32le(WID)).await;

    let request = body(&[
        &u32le(root),
        &u32le(WID),
        &150i16.to_le_bytes(),
        &80i16.to_le_bytes(),
    ]);
    let sequence = client.send(opcodes::TRANSLATE_COORDINATES, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(i16::from_le_bytes([reply[12], reply[13]]), 50);
    assert_eq!(i16::from_le_bytes([reply[14], reply[15]]), 30);

    // From root to root, the child field points at the mapped window.
    let request = body(&[
        &u32le(root),
        &u32le(root),
        &150i16.to_le_bytes(),
        &80i16.to_le_bytes(),
    ]);
    let sequence = client.send(opcodes::TRANSLATE_COORDINATES, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]), WID);
}

#[tokio::test]
async fn destroy_window_cascades() {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    client
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 100, 100, 0, &[]))
        .await;
    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID + 1, WID, 0, 0, 50, 50, 0, &[]),
        )
        .await;
    client.send(opcodes::DESTROY_WINDOW, 0, &u32le(WID)).await;

    // Both windows are gone: mapping the child now fails.
    let sequence = client.send(opcodes::MAP_WINDOW, 0, &u32le(WID + 1)).await;
    client.expect_error(3, sequence).await;

    server.with_state(|state| {
        assert_eq!(state.registry.counts().windows, 1); // just the root
    });
}
