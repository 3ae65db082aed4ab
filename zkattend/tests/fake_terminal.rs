//! End-to-end tests against a scripted terminal on localhost.

mod common;

use std::time::Duration;

use chrono::NaiveDate;
use common::{FakeTerminal, StoredPunch, TerminalState};
use pretty_assertions::assert_eq;
use zkattend::{Command, Device, Error};

fn users() -> Vec<(u16, String, String)> {
    vec![
        (1, "1001".into(), "Alice".into()),
        (2, "1002".into(), "".into()),
    ]
}

fn punches(n: usize) -> Vec<StoredPunch> {
    let base = NaiveDate::from_ymd_opt(2024, 5, 2)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| StoredPunch {
            uid: 1 + (i % 2) as u16,
            user_id: if i % 2 == 0 { "1001".into() } else { "1002".into() },
            at: base + chrono::Duration::minutes(i as i64 * 7),
            status: 1,
            punch: if i % 4 < 2 { 0 } else { 1 },
        })
        .collect()
}

fn device(port: u16) -> Device {
    Device::new("127.0.0.1", port).with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_read_users_and_chunked_attendance() {
    // 3000 * 40 bytes forces several 1024-byte data packets per chunk
    let terminal = FakeTerminal::start(TerminalState {
        users: users(),
        punches: punches(3000),
        ..Default::default()
    })
    .await;

    let mut device = device(terminal.port);
    device.connect().await.unwrap();
    assert!(device.is_connected());

    device.disable_device().await.unwrap();
    assert!(!terminal.state.lock().await.enabled);

    let users = device.get_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].name, "NN-1002");

    let records = device.get_attendance_for(&users).await.unwrap();
    assert_eq!(records.len(), 3000);
    assert_eq!(records[0].user_id, "1001");
    assert_eq!(records[1].user_id, "1002");
    assert_eq!(records[2999].timestamp, punches(3000)[2999].at);

    device.enable_device().await.unwrap();
    device.disconnect().await.unwrap();
    assert!(!device.is_connected());

    let st = terminal.state.lock().await;
    assert!(st.enabled);
    assert!(st.log.contains(&Command::FreeData));
    assert_eq!(st.log.last(), Some(&Command::Exit));
}

#[tokio::test]
async fn test_device_info_and_clock() {
    let terminal = FakeTerminal::start(TerminalState {
        users: users(),
        punches: punches(4),
        ..Default::default()
    })
    .await;

    let mut device = device(terminal.port);
    device.connect().await.unwrap();

    let info = device.get_device_info().await.unwrap();
    assert_eq!(info.serial_number, "FAKE0001");
    assert_eq!(info.firmware_version, "Ver 6.60 Apr 2020");
    assert_eq!(info.device_name, None);
    assert_eq!(info.capacity.records, 4);

    let at = NaiveDate::from_ymd_opt(2024, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 58)
        .unwrap();
    device.set_time(at).await.unwrap();
    assert_eq!(device.get_time().await.unwrap(), at);

    device.clear_attendance().await.unwrap();
    assert!(device.get_attendance().await.unwrap().is_empty());

    device.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_commkey_authentication() {
    let terminal = FakeTerminal::start(TerminalState {
        commkey: Some(123_456),
        ..Default::default()
    })
    .await;

    let mut wrong = device(terminal.port).with_password(1);
    assert!(matches!(wrong.connect().await, Err(Error::InvalidResponse(_))));

    let mut right = device(terminal.port).with_password(123_456);
    right.connect().await.unwrap();
    assert!(right.is_connected());
    right.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_a_connection_failure() {
    // Bind then drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut device = device(port);
    let err = device.connect().await.unwrap_err();
    assert!(err.is_connection_failure());
}
