//! User command integration tests.
//!
//! Covers message relay, registration errors, name listings, and the
//! informational commands.

mod common;

use common::TestServer;
use std::time::Duration;

#[tokio::test]
async fn channel_message_reaches_members_but_not_sender() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    alice.join("#general").await.unwrap();
    bob.join("#general").await.unwrap();
    // Drain bob's join as seen by alice.
    alice
        .recv_until(|l| l.contains(":bob JOIN"))
        .await
        .unwrap();

    alice.privmsg("#general", "hello everyone").await.unwrap();
    let line = bob.recv().await.unwrap();
    assert_eq!(line, ":alice PRIVMSG #general :hello everyone");
    assert!(
        alice.recv_timeout(Duration::from_millis(200)).await.is_err(),
        "sender must not receive its own message"
    );
}

#[tokio::test]
async fn direct_message_is_delivered() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    alice.privmsg("bob", "psst").await.unwrap();
    let line = bob.recv().await.unwrap();
    assert_eq!(line, ":alice PRIVMSG bob :psst");
}

#[tokio::test]
async fn message_to_unjoined_channel_yields_404() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    alice.join("#general").await.unwrap();
    bob.privmsg("#general", "drive-by").await.unwrap();
    let line = bob.recv().await.unwrap();
    assert!(line.contains(" 404 "), "{line}");
}

#[tokio::test]
async fn privmsg_without_text_yields_461() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();

    alice.send_raw("PRIVMSG #general").await.unwrap();
    let line = alice.recv().await.unwrap();
    assert!(line.contains(" 461 "), "{line}");
}

#[tokio::test]
async fn nickname_collision_yields_433() {
    let server = TestServer::spawn().await.unwrap();
    let _alice = server.connect("alice").await.unwrap();

    let mut imposter = server.connect_raw("alice").await.unwrap();
    imposter
        .send_raw(&format!("PASS {}", common::TEST_PASSWORD))
        .await
        .unwrap();
    imposter.send_raw("NICK alice").await.unwrap();
    let line = imposter.recv().await.unwrap();
    assert!(line.contains(" 433 "), "{line}");
}

#[tokio::test]
async fn wrong_password_yields_464() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = server.connect_raw("alice").await.unwrap();

    client.send_raw("PASS letmein").await.unwrap();
    let line = client.recv().await.unwrap();
    assert!(line.contains(" 464 "), "{line}");
}

#[tokio::test]
async fn names_lists_channel_members() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    alice.join("#general").await.unwrap();
    bob.join("#general").await.unwrap();

    bob.send_raw("NAMES #general").await.unwrap();
    let lines = bob.recv_until(|l| l.contains(" 366 ")).await.unwrap();
    let names = lines.iter().find(|l| l.contains(" 353 ")).unwrap();
    assert!(names.contains("@alice"), "{names}");
    assert!(names.contains("bob"), "{names}");
}

#[tokio::test]
async fn list_reports_channels_with_member_counts() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = server.connect("alice").await.unwrap();

    alice.join("#one").await.unwrap();
    alice.send_raw("LIST").await.unwrap();
    let lines = alice.recv_until(|l| l.contains(" 323 ")).await.unwrap();
    assert!(lines.first().unwrap().contains(" 321 "));
    assert!(lines.iter().any(|l| l.contains("#one 1")), "{lines:?}");
}

#[tokio::test]
async fn help_is_available_before_registration() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = server.connect_raw("alice").await.unwrap();

    client.send_raw("HELP").await.unwrap();
    let line = client.recv().await.unwrap();
    assert!(line.starts_with(":test.server NOTICE * "), "{line}");
    assert!(line.contains("PRIVMSG"), "{line}");
}

#[tokio::test]
async fn cap_and_who_are_silently_ignored() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = server.connect_raw("alice").await.unwrap();

    client.send_raw("CAP LS 302").await.unwrap();
    client.send_raw("WHO #general").await.unwrap();
    client.send_raw("HELP").await.unwrap();
    // The first reply on the wire is the HELP notice, nothing for CAP/WHO.
    let line = client.recv().await.unwrap();
    assert!(line.contains("NOTICE"), "{line}");
    assert!(line.contains("Available commands"), "{line}");
}
