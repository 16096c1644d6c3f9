mod common;

use std::net::SocketAddr;

use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use common::{login_pair, start_server, test_config, TestClient};

/// Deterministic pseudo-random payload, no RNG needed.
fn payload_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) >> 3) as u8).collect()
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Runs the control-port brokering for one accepted transfer and returns the
/// minted UUID (checked identical on both sides).
async fn broker_accepted_transfer(
    alice: &mut TestClient,
    bob: &mut TestClient,
    checksum: &str,
) -> String {
    alice
        .send_line(&format!(
            "FILE_TRANSFER_REQ {{\"sender\":\"alice\",\"receiver\":\"bob\",\
             \"filename\":\"a.txt\",\"checksum\":\"{checksum}\"}}"
        ))
        .await;
    assert_eq!(alice.expect("FILE_TRANSFER_RESP").await["status"], "OK");

    let forwarded = bob.expect("FILE_TRANSFER_REQ").await;
    assert_eq!(forwarded["sender"], "alice");
    assert_eq!(forwarded["filename"], "a.txt");
    assert_eq!(forwarded["checksum"], checksum);

    bob.send_line("FILE_TRANSFER_RESP {\"status\":\"ACCEPT\"}").await;

    let sender_ready = alice.expect("FILE_TRANSFER_READY").await;
    assert_eq!(sender_ready["type"], "s");
    assert_eq!(sender_ready["checksum"], checksum);
    let receiver_ready = bob.expect("FILE_TRANSFER_READY").await;
    assert_eq!(receiver_ready["type"], "r");
    assert_eq!(receiver_ready["filename"], "a.txt");

    let uuid = sender_ready["uuid"].as_str().expect("uuid").to_string();
    assert_eq!(receiver_ready["uuid"], uuid.as_str());
    assert_eq!(uuid.len(), 36);
    uuid
}

async fn open_relay(relay: SocketAddr, uuid: &str, role: u8) -> TcpStream {
    let mut stream = TcpStream::connect(relay).await.expect("relay connect");
    stream.write_all(uuid.as_bytes()).await.expect("uuid");
    stream.write_all(&[role]).await.expect("role");
    stream
}

#[tokio::test]
async fn relay_delivers_the_exact_bytes_receiver_first() {
    let (control, relay) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    let bytes = payload_bytes(256 * 1024);
    let checksum = sha256_hex(&bytes);
    let uuid = broker_accepted_transfer(&mut alice, &mut bob, &checksum).await;

    // Receiver reaches the relay first and parks.
    let mut receiver = open_relay(relay, &uuid, b'r').await;

    let mut sender = open_relay(relay, &uuid, b's').await;
    sender.write_all(&bytes).await.expect("file bytes");
    sender.shutdown().await.expect("half-close");

    let mut received = Vec::new();
    receiver
        .read_to_end(&mut received)
        .await
        .expect("read download");
    assert_eq!(received.len(), bytes.len());
    assert_eq!(received, bytes);
    assert_eq!(sha256_hex(&received), checksum);
}

#[tokio::test]
async fn relay_accepts_the_sender_first_too() {
    let (control, relay) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    let bytes = payload_bytes(4096);
    let checksum = sha256_hex(&bytes);
    let uuid = broker_accepted_transfer(&mut alice, &mut bob, &checksum).await;

    // Sender parks with its bytes already in flight.
    let mut sender = open_relay(relay, &uuid, b's').await;
    sender.write_all(&bytes).await.expect("file bytes");
    sender.shutdown().await.expect("half-close");

    let mut receiver = open_relay(relay, &uuid, b'r').await;
    let mut received = Vec::new();
    receiver
        .read_to_end(&mut received)
        .await
        .expect("read download");
    assert_eq!(received, bytes);
}

#[tokio::test]
async fn decline_is_forwarded_to_the_sender() {
    let (control, _) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    alice
        .send_line(
            "FILE_TRANSFER_REQ {\"sender\":\"alice\",\"receiver\":\"bob\",\
             \"filename\":\"a.txt\",\"checksum\":\"x\"}",
        )
        .await;
    alice.expect("FILE_TRANSFER_RESP").await;
    bob.expect("FILE_TRANSFER_REQ").await;

    bob.send_line("FILE_TRANSFER_RESP {\"status\":\"DECLINE\"}").await;
    let resp = alice.expect("FILE_TRANSFER_RESP").await;
    assert_eq!(resp["status"], "DECLINE");
}

#[tokio::test]
async fn transfer_request_validation_codes() {
    let (control, _) = start_server(test_config()).await;

    let mut anon = TestClient::connect(control).await;
    anon.send_line(
        "FILE_TRANSFER_REQ {\"sender\":\"x\",\"receiver\":\"bob\",\
         \"filename\":\"a\",\"checksum\":\"c\"}",
    )
    .await;
    assert_eq!(anon.expect("FILE_TRANSFER_RESP").await["code"], 13000);

    let mut alice = TestClient::login(control, "alice").await;
    alice
        .send_line(
            "FILE_TRANSFER_REQ {\"sender\":\"alice\",\"receiver\":\"alice\",\
             \"filename\":\"a\",\"checksum\":\"c\"}",
        )
        .await;
    assert_eq!(alice.expect("FILE_TRANSFER_RESP").await["code"], 13002);

    alice
        .send_line(
            "FILE_TRANSFER_REQ {\"sender\":\"alice\",\"receiver\":\"nobody\",\
             \"filename\":\"a\",\"checksum\":\"c\"}",
        )
        .await;
    assert_eq!(alice.expect("FILE_TRANSFER_RESP").await["code"], 13001);
}

#[tokio::test]
async fn unknown_uuid_is_rejected_at_the_relay() {
    let (_, relay) = start_server(test_config()).await;

    let mut stream =
        open_relay(relay, "00000000-0000-4000-8000-000000000000", b's').await;
    let mut buf = Vec::new();
    let read = stream.read_to_end(&mut buf).await.expect("read");
    assert_eq!(read, 0, "socket should be closed without any bytes");
}

#[tokio::test]
async fn duplicate_role_is_rejected_but_the_transfer_survives() {
    let (control, relay) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    let bytes = payload_bytes(1024);
    let checksum = sha256_hex(&bytes);
    let uuid = broker_accepted_transfer(&mut alice, &mut bob, &checksum).await;

    let mut receiver = open_relay(relay, &uuid, b'r').await;
    let mut first_sender = open_relay(relay, &uuid, b's').await;

    // Stream the first half and wait for it to come out the other side;
    // that proves the first sender is the bound one.
    let (head, tail) = bytes.split_at(512);
    first_sender.write_all(head).await.expect("first half");
    let mut received_head = vec![0u8; head.len()];
    receiver
        .read_exact(&mut received_head)
        .await
        .expect("read first half");
    assert_eq!(received_head, head);

    // A second sender for the same UUID is cut off immediately.
    let mut second_sender = open_relay(relay, &uuid, b's').await;
    let mut buf = Vec::new();
    let read = second_sender.read_to_end(&mut buf).await.expect("read");
    assert_eq!(read, 0);

    // The original pair still completes.
    first_sender.write_all(tail).await.expect("second half");
    first_sender.shutdown().await.expect("half-close");

    let mut received_tail = Vec::new();
    receiver
        .read_to_end(&mut received_tail)
        .await
        .expect("read rest");
    assert_eq!(received_tail, tail);
}
