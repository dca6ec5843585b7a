//! Disconnect reclamation: every client-owned resource must be
//! unreachable and freed after the connection drops (§ testable
//! property 4), asserted through the registry's live counters.

mod common;

use std::time::Duration;

use common::{body, create_window_body, server, u32le, TestClient};
use sshterm_x11::protocol::opcodes;

const WID: u32 = 0x0010_0001;
const PIXMAP: u32 = 0x0010_0002;
const GC: u32 = 0x0010_0003;

async fn wait_until(server: &sshterm_x11::Server, pred: impl Fn(usize) -> bool) {
    for _ in 0..50 {
        let count = server.with_state(|state| state.clients.len());
        if pred(count) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("client never disconnected");
}

async fn wait_for_disconnect(server: &sshterm_x11::Server) {
    wait_until(server, |count| count == 0).await;
}

#[tokio::test]
async fn disconnect_reclaims_all_resources() {
    let (server, frontend) = server();
    let baseline = server.with_state(|state| state.registry.counts());

    let mut client = TestClient::connect(&server).await;
    let root = client.root;

    client
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 100, 100, 0, &[]))
        .await;
    let pixmap = body(&[&u32le(PIXMAP), &u32le(WID), &16u16.to_le_bytes(), &16u16.to_le_bytes()]);
    client.send(opcodes::CREATE_PIXMAP, 24, &pixmap).await;
    let gc = body(&[&u32le(GC), &u32le(WID), &u32le(0)]);
    client.send(opcodes::CREATE_GC, 0, &gc).await;

    // Make the requests land before dropping the stream.
    let sequence = client.send(opcodes::GET_INPUT_FOCUS, 0, &[]).await;
    client.expect_reply(sequence).await;

    server.with_state(|state| {
        let counts = state.registry.counts();
        assert_eq!(counts.windows, baseline.windows + 1);
        assert_eq!(counts.pixmaps, baseline.pixmaps + 1);
        assert_eq!(counts.gcontexts, baseline.gcontexts + 1);
    });

    client.close().await;
    wait_for_disconnect(&server).await;

    server.with_state(|state| {
        assert_eq!(state.registry.counts(), baseline);
        assert!(state.registry.window(state.root).is_ok());
    });

    // The front-end was told to drop its side too.
    let calls = frontend.calls();
    use sshterm_x11::frontend::FrontendCall;
    assert!(calls.iter().any(|call| matches!(call, FrontendCall::DestroyWindow { .. })));
    assert!(calls.iter().any(|call| matches!(call, FrontendCall::FreePixmap { .. })));
    assert!(calls.iter().any(|call| matches!(call, FrontendCall::FreeGc { .. })));
}

#[tokio::test]
async fn atoms_survive_their_interning_client() {
    let (server, _frontend) = server();
    let mut first = TestClient::connect(&server).await;

    let name = b"_SURVIVOR";
    let mut request = (name.len() as u16).to_le_bytes().to_vec();
    request.extend_from_slice(&[0u8; 2]);
    request.extend_from_slice(name);
    request.extend_from_slice(&[0u8; 3]);
    let sequence = first.send(opcodes::INTERN_ATOM, 0, &request).await;
    let reply = first.expect_reply(sequence).await;
    let atom = u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]);
    first.close().await;
    wait_for_disconnect(&server).await;

    let mut second = TestClient::connect(&server).await;
    let sequence = second.send(opcodes::INTERN_ATOM, 1, &request).await; // only-if-exists
    let reply = second.expect_reply(sequence).await;
    assert_eq!(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]), atom);
}

#[tokio::test]
async fn kill_client_dooms_the_owner() {
    let (server, _frontend) = server();
    let mut victim = TestClient::connect(&server).await;
    let mut killer = TestClient::connect(&server).await;
    let root = victim.root;

    victim
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 10, 10, 0, &[]))
        .await;
    let sequence = victim.send(opcodes::GET_INPUT_FOCUS, 0, &[]).await;
    victim.expect_reply(sequence).await;

    // The killer names the victim's window (global id) as the resource.
    let wid_global = sshterm_x11::server::client::compose_id(2, WID);
    killer.send(opcodes::KILL_CLIENT, 0, &u32le(wid_global)).await;

    wait_until(&server, |count| count == 1).await;
    server.with_state(|state| {
        assert_eq!(state.registry.counts().windows, 1);
    });

    // The killer itself is still alive and served.
    let sequence = killer.send(opcodes::GET_INPUT_FOCUS, 0, &[]).await;
    killer.expect_reply(sequence).await;
}
