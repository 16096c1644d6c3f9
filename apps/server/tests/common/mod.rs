#![allow(dead_code)]

//! Shared harness: a real server on ephemeral ports plus a line-level test
//! client driving raw `TcpStream`s.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time;

use parley_server::config::Config;
use parley_server::Server;

/// Test defaults: ephemeral ports, heartbeat slow enough to stay out of the
/// way unless a test configures otherwise.
pub fn test_config() -> Config {
    Config {
        control_port: 0,
        relay_port: 0,
        ping_interval: Duration::from_secs(30),
        pong_timeout: Duration::from_secs(5),
        relay_ttl: Duration::from_secs(5),
    }
}

/// Starts a server in the background; returns `(control_addr, relay_addr)`.
pub async fn start_server(config: Config) -> (SocketAddr, SocketAddr) {
    let server = Server::bind(config).await.expect("bind");
    let control = server.control_addr().expect("control addr").port();
    let relay = server.relay_addr().expect("relay addr").port();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (
        SocketAddr::from(([127, 0, 0, 1], control)),
        SocketAddr::from(([127, 0, 0, 1], relay)),
    )
}

/// A control-channel client speaking raw frames.
pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    /// Payload of the READY greeting.
    pub greeting: Value,
}

impl TestClient {
    /// Connects and consumes the READY greeting.
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
            greeting: Value::Null,
        };
        let (verb, payload) = client.recv().await;
        assert_eq!(verb, "READY");
        client.greeting = payload;
        client
    }

    /// Connects and logs in, asserting success.
    pub async fn login(addr: SocketAddr, username: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client
            .send_line(&format!("ENTER {{\"username\":\"{username}\"}}"))
            .await;
        let payload = client.expect("ENTER_RESP").await;
        assert_eq!(payload["status"], "OK", "login as {username}: {payload}");
        client
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("write frame");
        self.writer.write_all(b"\n").await.expect("write newline");
    }

    /// Next frame as `(verb, payload)`.
    pub async fn recv(&mut self) -> (String, Value) {
        let line = time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a frame")
            .expect("read frame")
            .expect("connection closed while a frame was expected");
        let (verb, payload) = line.split_once(' ').expect("framed line");
        (
            verb.to_string(),
            serde_json::from_str(payload).expect("json payload"),
        )
    }

    /// Asserts the next frame's verb and returns its payload.
    pub async fn expect(&mut self, verb: &str) -> Value {
        let (got, payload) = self.recv().await;
        assert_eq!(got, verb, "payload: {payload}");
        payload
    }

    /// Asserts the server closes the connection.
    pub async fn expect_eof(&mut self) {
        let next = time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for EOF")
            .expect("read");
        assert_eq!(next, None, "expected EOF");
    }

    /// Asserts that nothing arrives for `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        let result = time::timeout(window, self.lines.next_line()).await;
        assert!(result.is_err(), "expected silence, got {result:?}");
    }
}

/// Logs in `alice` and `bob` and drains alice's JOINED notification so both
/// clients start with empty queues.
pub async fn login_pair(control: SocketAddr) -> (TestClient, TestClient) {
    let mut alice = TestClient::login(control, "alice").await;
    let bob = TestClient::login(control, "bob").await;
    let joined = alice.expect("JOINED").await;
    assert_eq!(joined["username"], "bob");
    (alice, bob)
}
