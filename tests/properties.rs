//! Atom interning and the property round-trips of the protocol.

mod common;

use common::{body, create_window_body, padded_string, server, u32le, TestClient};
use sshterm_x11::protocol::opcodes;

const WID: u32 = 0x0010_0001;
const WM_NAME: u32 = 39;
const STRING: u32 = 31;

async fn setup() -> (sshterm_x11::Server, TestClient) {
    let (server, _frontend) = server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;
    client
        .send(opcodes::CREATE_WINDOW, 24, &create_window_body(WID, root, 0, 0, 100, 100, 0, &[]))
        .await;
    (server, client)
}

fn change_property_body(property: u32, type_atom: u32, format: u8, data: &[u8]) -> Vec<u8> {
    let mut out = body(&[&u32le(WID), &u32le(property), &u32le(type_atom)]);
    out.push(format);
    out.extend_from_slice(&[0u8; 3]);
    out.extend_from_slice(&(data.len() as u32 / (format as u32 / 8)).to_le_bytes());
    out.extend_from_slice(data);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

#[tokio::test]
async fn intern_atom_and_property_round_trip() {
    // S3 end to end.
    let (_server, mut client) = setup().await;

    let request = body(&[&7u16.to_le_bytes(), &[0u8; 2], &padded_string("WM_NAME")]);
    let sequence = client.send(opcodes::INTERN_ATOM, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]), WM_NAME);

    client
        .send(opcodes::CHANGE_PROPERTY, 0, &change_property_body(WM_NAME, STRING, 8, b"xterm"))
        .await;

    let request = body(&[&u32le(WID), &u32le(WM_NAME), &u32le(0), &u32le(0), &u32le(100)]);
    let sequence = client.send(opcodes::GET_PROPERTY, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(reply[1], 8); // format
    assert_eq!(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]), STRING);
    assert_eq!(u32::from_le_bytes([reply[12], reply[13], reply[14], reply[15]]), 0); // bytes-after
    assert_eq!(u32::from_le_bytes([reply[16], reply[17], reply[18], reply[19]]), 5);
    assert_eq!(&reply[32..37], b"xterm");
}

#[tokio::test]
async fn interned_atoms_are_stable_and_new_ones_monotonic() {
    let (_server, mut client) = setup().await;
    let request = body(&[&12u16.to_le_bytes(), &[0u8; 2], &padded_string("_NET_WM_NAME")]);
    let sequence = client.send(opcodes::INTERN_ATOM, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    let first = u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]);
    assert_eq!(first, 69);

    let sequence = client.send(opcodes::INTERN_ATOM, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]), first);

    // GetAtomName inverts.
    let sequence = client.send(opcodes::GET_ATOM_NAME, 0, &u32le(first)).await;
    let reply = client.expect_reply(sequence).await;
    let len = u16::from_le_bytes([reply[8], reply[9]]) as usize;
    assert_eq!(&reply[32..32 + len], b"_NET_WM_NAME");
}

#[tokio::test]
async fn get_property_slices_and_reports_tail() {
    let (_server, mut client) = setup().await;
    client
        .send(
            opcodes::CHANGE_PROPERTY,
            0,
            &change_property_body(WM_NAME, STRING, 8, b"0123456789"),
        )
        .await;

    let request = body(&[&u32le(WID), &u32le(WM_NAME), &u32le(0), &u32le(1), &u32le(1)]);
    let sequence = client.send(opcodes::GET_PROPERTY, 0, &request).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(&reply[32..36], b"4567");
    assert_eq!(u32::from_le_bytes([reply[12], reply[13], reply[14], reply[15]]), 2);
}

#[tokio::test]
async fn append_type_mismatch_is_match_error() {
    let (_server, mut client) = setup().await;
    client
        .send(opcodes::CHANGE_PROPERTY, 0, &change_property_body(WM_NAME, STRING, 8, b"ab"))
        .await;
    // Append with format 16 against the stored format 8.
    let sequence = client
        .send(opcodes::CHANGE_PROPERTY, 2, &change_property_body(WM_NAME, STRING, 16, b"cdcd"))
        .await;
    client.expect_error(8, sequence).await; // Match
}

#[tokio::test]
async fn rotate_properties_moves_values() {
    // §8 property 8: delta 1 produces [v_c, v_a, v_b].
    let (_server, mut client) = setup().await;

    // Intern three fresh atoms a, b, c.
    let mut atoms = Vec::new();
    for name in ["PROP_A", "PROP_B", "PROP_C"] {
        let request =
            body(&[&(name.len() as u16).to_le_bytes(), &[0u8; 2], &padded_string(name)]);
        let sequence = client.send(opcodes::INTERN_ATOM, 0, &request).await;
        let reply = client.expect_reply(sequence).await;
        atoms.push(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]));
    }
    for (atom, value) in atoms.iter().zip([b"va", b"vb", b"vc"]) {
        client
            .send(opcodes::CHANGE_PROPERTY, 0, &change_property_body(*atom, STRING, 8, value))
            .await;
    }

    let rotate = body(&[
        &u32le(WID),
        &3u16.to_le_bytes(),
        &1i16.to_le_bytes(),
        &u32le(atoms[0]),
        &u32le(atoms[1]),
        &u32le(atoms[2]),
    ]);
    client.send(opcodes::ROTATE_PROPERTIES, 0, &rotate).await;

    let mut values = Vec::new();
    for atom in &atoms {
        let request = body(&[&u32le(WID), &u32le(*atom), &u32le(0), &u32le(0), &u32le(10)]);
        let sequence = client.send(opcodes::GET_PROPERTY, 0, &request).await;
        let reply = client.expect_reply(sequence).await;
        values.push(reply[32..34].to_vec());
    }
    assert_eq!(values, vec![b"vc".to_vec(), b"va".to_vec(), b"vb".to_vec()]);

    // delta 0 is a no-op; a missing property is a Match error.
    let rotate = body(&[
        &u32le(WID),
        &2u16.to_le_bytes(),
        &1i16.to_le_bytes(),
        &u32le(atoms[0]),
        &u32le(9999),
    ]);
    let sequence = client.send(opcodes::ROTATE_PROPERTIES, 0, &rotate).await;
    client.expect_error(5, sequence).await; // Atom (9999 never interned)
}

#[tokio::test]
async fn property_notify_fires_for_selectors() {
    const PROPERTY_CHANGE: u32 = 0x0040_0000;
    let (server, _frontend) = common::server();
    let mut client = TestClient::connect(&server).await;
    let root = client.root;
    client
        .send(
            opcodes::CREATE_WINDOW,
            24,
            &create_window_body(WID, root, 0, 0, 64, 64, PROPERTY_CHANGE, &[PROPERTY_CHANGE]),
        )
        .await;
    client
        .send(opcodes::CHANGE_PROPERTY, 0, &change_property_body(WM_NAME, STRING, 8, b"hi"))
        .await;
    let event = client.expect_event(28).await;
    assert_eq!(u32::from_le_bytes([event[8], event[9], event[10], event[11]]), WM_NAME);
    assert_eq!(event[16], 0); // NewValue
}

#[tokio::test]
async fn selections_have_single_owners() {
    let (_server, mut client) = setup().await;
    const PRIMARY: u32 = 1;

    let request = body(&[&u32le(WID), &u32le(PRIMARY), &u32le(0)]);
    client.send(opcodes::SET_SELECTION_OWNER, 0, &request).await;

    let sequence = client.send(opcodes::GET_SELECTION_OWNER, 0, &u32le(PRIMARY)).await;
    let reply = client.expect_reply(sequence).await;
    assert_eq!(u32::from_le_bytes([reply[8], reply[9], reply[10], reply[11]]), WID);
}
