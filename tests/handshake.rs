//! Connection setup scenarios.

mod common;

use common::{server, TestClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn little_endian_handshake_advertises_the_screen() {
    let (server, _frontend) = server();
    let client = TestClient::connect(&server).await;

    let setup = &client.setup;
    assert_eq!(setup[0], 1);
    assert_eq!(u16::from_le_bytes([setup[2], setup[3]]), 11);
    assert_eq!(u16::from_le_bytes([setup[4], setup[5]]), 0);

    // resource-id base 0, mask 0x1FFFFF, motion buffer 256
    assert_eq!(u32::from_le_bytes([setup[12], setup[13], setup[14], setup[15]]), 0);
    assert_eq!(
        u32::from_le_bytes([setup[16], setup[17], setup[18], setup[19]]),
        0x001f_ffff
    );
    assert_eq!(u32::from_le_bytes([setup[20], setup[21], setup[22], setup[23]]), 256);

    // vendor string
    let vendor_len = u16::from_le_bytes([setup[24], setup[25]]) as usize;
    assert_eq!(&setup[40..40 + vendor_len], b"sshterm");

    // one screen, one format
    assert_eq!(setup[28], 1);
    assert_eq!(setup[29], 1);

    // the single visual is TrueColor with the advertised channel masks
    let n = setup.len();
    let visual = &setup[n - 24..];
    assert_eq!(visual[4], 4); // TrueColor
    assert_eq!(u32::from_le_bytes([visual[8], visual[9], visual[10], visual[11]]), 0x00ff_0000);
    assert_eq!(u32::from_le_bytes([visual[12], visual[13], visual[14], visual[15]]), 0x0000_ff00);
    assert_eq!(u32::from_le_bytes([visual[16], visual[17], visual[18], visual[19]]), 0x0000_00ff);

    // root window id sits above the client-local id mask
    assert!(client.root > 0x001f_ffff);
}

#[tokio::test]
async fn big_endian_handshake() {
    let (server, _frontend) = server();
    let client = TestClient::connect_with_order(&server, b'B').await;
    let setup = &client.setup;
    assert_eq!(setup[0], 1);
    assert_eq!(u16::from_be_bytes([setup[2], setup[3]]), 11);
    assert_eq!(
        u32::from_be_bytes([setup[16], setup[17], setup[18], setup[19]]),
        0x001f_ffff
    );
}

#[tokio::test]
async fn bad_byte_order_is_refused() {
    let (server, _frontend) = server();
    let (mut stream, server_end) = tokio::io::duplex(4096);
    let inner = server.clone();
    tokio::spawn(async move {
        let _ = inner.serve_stream(server_end).await;
    });

    let mut prefix = [0u8; 12];
    prefix[0] = b'X';
    stream.write_all(&prefix).await.unwrap();
    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 0); // Failed
}

#[tokio::test]
async fn auth_material_is_consumed_and_discarded() {
    let (server, _frontend) = server();
    let (mut stream, server_end) = tokio::io::duplex(1 << 16);
    let inner = server.clone();
    tokio::spawn(async move {
        let _ = inner.serve_stream(server_end).await;
    });

    let mut prefix = [0u8; 12];
    prefix[0] = b'l';
    prefix[2..4].copy_from_slice(&11u16.to_le_bytes());
    prefix[6..8].copy_from_slice(&18u16.to_le_bytes()); // name len
    prefix[8..10].copy_from_slice(&16u16.to_le_bytes()); // data len
    stream.write_all(&prefix).await.unwrap();
    stream.write_all(b"MIT-MAGIC-COOKIE-1\0\0").await.unwrap(); // padded to 20
    stream.write_all(&[0xaa; 16]).await.unwrap();

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 1);
}
