//! Bridge over the on-disk whitelist, driven through the console runner

mod common;

use common::{write_config, RecordingSink};
use std::sync::Arc;
use std::time::Duration;
use wlbridge_core::bridge::{run_console, Bridge};
use wlbridge_core::core_command::{ChannelHandle, DispatchOutcome, InboundMessage, Sender};
use wlbridge_core::core_membership::{FileMembershipStore, MembershipStore};
use wlbridge_core::shutdown::ShutdownCoordinator;

fn message(text: &str) -> InboundMessage {
    InboundMessage::new(text, Sender::user("U1", "alice"), ChannelHandle::new("general"))
}

#[tokio::test]
async fn test_mutations_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "!", &["U1"]);
    let sink = Arc::new(RecordingSink::default());

    let bridge = Bridge::start(dir.path().join("config.toml"), sink.clone())
        .await
        .unwrap();
    assert_eq!(bridge.handle(&message("!wl add Steve")).await, DispatchOutcome::Replied);
    assert_eq!(bridge.handle(&message("!wl add Alex")).await, DispatchOutcome::Replied);
    assert_eq!(bridge.handle(&message("!wl remove alex")).await, DispatchOutcome::Replied);

    let reopened = FileMembershipStore::open(config.storage.whitelist_path())
        .await
        .unwrap();
    let entries = reopened.list_all().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name.as_deref(), Some("Steve"));

    let audit = std::fs::read_to_string(config.storage.audit_path()).unwrap();
    let lines: Vec<&str> = audit.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("ADD Steve by alice (U1)"));
    assert!(lines[2].ends_with("REMOVE alex by alice (U1)"));
}

#[tokio::test]
async fn test_locale_file_overrides_replies() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "!", &["U1"]);
    std::fs::write(
        dir.path().join("locale_en.toml"),
        "[messages.discord]\nplayer_added = \"+ {player}\"\n",
    )
    .unwrap();
    let sink = Arc::new(RecordingSink::default());

    let bridge = Bridge::start(dir.path().join("config.toml"), sink.clone())
        .await
        .unwrap();
    bridge.handle(&message("!wl add Steve")).await;
    bridge.handle(&message("!wl add Steve")).await;

    assert_eq!(
        sink.texts().await,
        vec!["+ Steve", "Steve is already whitelisted."]
    );
}

#[tokio::test]
async fn test_console_runs_until_eof() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "!", &["U1"]);
    let sink = Arc::new(RecordingSink::default());
    let bridge = Arc::new(
        Bridge::start(dir.path().join("config.toml"), sink.clone())
            .await
            .unwrap(),
    );

    let input: &[u8] = b"hello there\n\n!wl add Steve\n/help\n";
    let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
    run_console(bridge.clone(), input, Sender::user("U1", "alice"), &coordinator)
        .await
        .unwrap();

    let sent = sink.take().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(channel, _)| channel == "console"));
    assert!(sent
        .iter()
        .any(|(_, text)| text == "Steve has been added to the whitelist."));
    assert!(sent
        .iter()
        .any(|(_, text)| text == "Usage: /reload | /status | /help"));
}

#[tokio::test]
async fn test_console_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "!", &["U1"]);
    let sink = Arc::new(RecordingSink::default());
    let bridge = Arc::new(
        Bridge::start(dir.path().join("config.toml"), sink.clone())
            .await
            .unwrap(),
    );

    // Input that never ends
    let (_writer, reader) = tokio::io::duplex(64);
    let reader = tokio::io::BufReader::new(reader);
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(1)));

    let runner = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            run_console(bridge, reader, Sender::user("U1", "alice"), &coordinator).await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    coordinator.shutdown().await;

    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
