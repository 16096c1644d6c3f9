mod common;

use common::{login_pair, start_server, test_config, TestClient};

#[tokio::test]
async fn greeting_carries_the_crate_version() {
    let (control, _) = start_server(test_config()).await;
    let client = TestClient::connect(control).await;
    assert_eq!(client.greeting["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (control, _) = start_server(test_config()).await;
    let _alice = TestClient::login(control, "alice").await;

    let mut impostor = TestClient::connect(control).await;
    impostor.send_line("ENTER {\"username\":\"alice\"}").await;
    let payload = impostor.expect("ENTER_RESP").await;
    assert_eq!(payload["status"], "ERROR");
    assert_eq!(payload["code"], 5000);
}

#[tokio::test]
async fn username_grammar_boundaries() {
    let (control, _) = start_server(test_config()).await;

    let mut client = TestClient::connect(control).await;
    for bad in ["ab", "a23456789012345", "bad-name"] {
        client
            .send_line(&format!("ENTER {{\"username\":\"{bad}\"}}"))
            .await;
        let payload = client.expect("ENTER_RESP").await;
        assert_eq!(payload["code"], 5001, "username {bad:?}");
    }

    // 3 and 14 characters are both fine.
    let _three = TestClient::login(control, "abc").await;
    let _fourteen = TestClient::login(control, "a2345678901234").await;
}

#[tokio::test]
async fn second_enter_on_a_named_session_is_rejected() {
    let (control, _) = start_server(test_config()).await;
    let mut alice = TestClient::login(control, "alice").await;

    alice.send_line("ENTER {\"username\":\"other\"}").await;
    let payload = alice.expect("ENTER_RESP").await;
    assert_eq!(payload["code"], 5002);
}

#[tokio::test]
async fn broadcast_requires_login() {
    let (control, _) = start_server(test_config()).await;
    let mut client = TestClient::connect(control).await;

    client.send_line("BROADCAST_REQ {\"message\":\"hi\"}").await;
    let payload = client.expect("BROADCAST_RESP").await;
    assert_eq!(payload["status"], "ERROR");
    assert_eq!(payload["code"], 6000);
}

#[tokio::test]
async fn broadcast_reaches_everyone_but_the_author() {
    let (control, _) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    alice
        .send_line("BROADCAST_REQ {\"message\":\"hello room\"}")
        .await;
    let resp = alice.expect("BROADCAST_RESP").await;
    assert_eq!(resp["status"], "OK");

    let event = bob.expect("BROADCAST").await;
    assert_eq!(event["username"], "alice");
    assert_eq!(event["message"], "hello room");

    // The author never sees an echo: the next frame alice receives is bob's
    // own broadcast, not her earlier one.
    bob.send_line("BROADCAST_REQ {\"message\":\"hi back\"}").await;
    bob.expect("BROADCAST_RESP").await;
    let event = alice.expect("BROADCAST").await;
    assert_eq!(event["username"], "bob");
}

#[tokio::test]
async fn unknown_and_malformed_frames_keep_the_session_open() {
    let (control, _) = start_server(test_config()).await;
    let mut alice = TestClient::login(control, "alice").await;

    // Unknown verb.
    alice.send_line("MSG hello").await;
    alice.expect("UNKNOWN_COMMAND").await;

    // Known verb without the payload separator.
    alice.send_line("ENTER").await;
    alice.expect("UNKNOWN_COMMAND").await;

    // Known verb with unparseable JSON.
    alice.send_line("BROADCAST_REQ not-json").await;
    alice.expect("PARSE_ERROR").await;

    // Still alive and able to serve requests.
    alice.send_line("LIST_REQ {}").await;
    let list = alice.expect("LIST_RESP").await;
    assert_eq!(list["status"], "OK");
}

#[tokio::test]
async fn list_snapshots_every_named_session_including_the_requester() {
    let (control, _) = start_server(test_config()).await;
    let (mut alice, _bob) = login_pair(control).await;

    alice.send_line("LIST_REQ {}").await;
    let payload = alice.expect("LIST_RESP").await;
    let mut clients: Vec<&str> = payload["clients"]
        .as_array()
        .expect("clients array")
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    clients.sort_unstable();
    assert_eq!(clients, ["alice", "bob"]);
}

#[tokio::test]
async fn list_requires_login() {
    let (control, _) = start_server(test_config()).await;
    let mut client = TestClient::connect(control).await;

    client.send_line("LIST_REQ {}").await;
    let payload = client.expect("LIST_RESP").await;
    assert_eq!(payload["code"], 9000);
}

#[tokio::test]
async fn private_messages_route_to_exactly_one_receiver() {
    let (control, _) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    alice
        .send_line("PRIVATE_MSG_REQ {\"receiver\":\"bob\",\"message\":\"psst\"}")
        .await;
    let resp = alice.expect("PRIVATE_MSG_RESP").await;
    assert_eq!(resp["status"], "OK");

    let msg = bob.expect("PRIVATE_MSG").await;
    assert_eq!(msg["sender"], "alice");
    assert_eq!(msg["message"], "psst");
}

#[tokio::test]
async fn private_message_error_codes() {
    let (control, _) = start_server(test_config()).await;

    let mut anon = TestClient::connect(control).await;
    anon.send_line("PRIVATE_MSG_REQ {\"receiver\":\"bob\",\"message\":\"m\"}")
        .await;
    assert_eq!(anon.expect("PRIVATE_MSG_RESP").await["code"], 10001);

    let mut alice = TestClient::login(control, "alice").await;
    alice
        .send_line("PRIVATE_MSG_REQ {\"receiver\":\"alice\",\"message\":\"m\"}")
        .await;
    assert_eq!(alice.expect("PRIVATE_MSG_RESP").await["code"], 10003);

    alice
        .send_line("PRIVATE_MSG_REQ {\"receiver\":\"nobody\",\"message\":\"m\"}")
        .await;
    assert_eq!(alice.expect("PRIVATE_MSG_RESP").await["code"], 10002);
}

#[tokio::test]
async fn bye_logs_out_frees_the_name_and_announces_left() {
    let (control, _) = start_server(test_config()).await;
    let (mut alice, mut bob) = login_pair(control).await;

    bob.send_line("BYE {}").await;
    let resp = bob.expect("BYE_RESP").await;
    assert_eq!(resp["status"], "OK");
    bob.expect_eof().await;

    let left = alice.expect("LEFT").await;
    assert_eq!(left["username"], "bob");

    // ENTER followed by BYE leaves the registry in its pre-ENTER state.
    let _bob_again = TestClient::login(control, "bob").await;
}

#[tokio::test]
async fn dropped_connection_announces_left() {
    let (control, _) = start_server(test_config()).await;
    let (mut alice, bob) = login_pair(control).await;

    drop(bob);
    let left = alice.expect("LEFT").await;
    assert_eq!(left["username"], "bob");
}
