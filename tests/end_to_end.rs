//! End-to-end scenarios driving a full [`Host`] over an in-memory
//! `tokio::io::duplex` transport, standing in for a UART-connected
//! controller.

use std::time::Duration;

use tokio::io::{AsyncWriteExt, DuplexStream};

use ble_hci::hci::{ConnHandle, Host, HostConfig};
use ble_hci::Error;

fn harness() -> (Host<DuplexStream>, DuplexStream) {
    let (local, remote) = tokio::io::duplex(4096);
    (Host::new(local), remote)
}

/// Scenario 1: `Reset` round trip.
#[tokio::test]
async fn reset_round_trip() {
    let (host, mut remote) = harness();
    let reply = tokio::spawn(async move { host.reset().await });
    remote
        .write_all(&[0x04, 0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00])
        .await
        .unwrap();
    reply.await.unwrap().unwrap();
}

/// Scenario 2: a second command submitted while one is outstanding is
/// rejected synchronously; the first still resolves once its completion
/// arrives.
#[tokio::test]
async fn busy_rejects_second_command() {
    let (host, mut remote) = harness();
    let host = std::sync::Arc::new(host);
    let first = {
        let host = host.clone();
        tokio::spawn(async move { host.reset().await })
    };
    // Give the spawned task a chance to claim the pending slot before the
    // second command is attempted.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = host.read_bd_addr().await;
    assert!(matches!(second, Err(Error::Busy)));

    remote
        .write_all(&[0x04, 0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00])
        .await
        .unwrap();
    first.await.unwrap().unwrap();
}

/// Scenario 3: an oversized `LE_Set_Advertising_Data` payload never
/// succeeds. This crate pre-rejects locally rather than round-tripping to
/// the controller, which the scenario permits.
#[tokio::test]
async fn oversized_advertising_data_is_rejected_locally() {
    let (host, _remote) = harness();
    let data = vec![0xAB; 32];
    let err = host.le_set_advertising_data(&data).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ParamsTooLarge { max: 31, got: 32, .. }
    ));
}

/// Scenario 4: a command with no completion within the configured timeout
/// fails with `Timeout`, and the dispatcher recovers for the next command.
#[tokio::test]
async fn timeout_then_recovery() {
    let (local, mut remote) = tokio::io::duplex(4096);
    let cfg = HostConfig {
        command_timeout: Duration::from_millis(50),
        ..HostConfig::default()
    };
    let host = Host::with_config(local, cfg);

    let err = host.le_read_buffer_size().await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    let reply = tokio::spawn(async move { host.reset().await });
    remote
        .write_all(&[0x04, 0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00])
        .await
        .unwrap();
    reply.await.unwrap().unwrap();
}

/// Scenario 5: one `LE_Advertising_Report` event carrying three reports
/// fans out as three distinct notifications, in order.
#[tokio::test]
async fn advertising_reports_fan_out_in_order() {
    let (host, mut remote) = harness();
    let mut reports = host.le_advertising_reports();

    #[rustfmt::skip]
    let params: &[u8] = &[
        0x02,                   // subevent: Advertising_Report
        0x03,                   // Num_Reports
        0x00, 0x01, 0x02,       // Event_Type per report
        0x00, 0x00, 0x00,       // Address_Type per report (all public)
        0, 0, 0, 0, 0, 0,       // Address[0]
        0, 0, 0, 0, 0, 0,       // Address[1]
        0, 0, 0, 0, 0, 0,       // Address[2]
        0x00, 0x00, 0x00,       // Data_Length per report (no data)
        0x7F, 0x7F, 0x7F,       // RSSI per report (unavailable)
    ];
    let mut frame = vec![0x04, 0x3E, params.len() as u8];
    frame.extend_from_slice(params);
    remote.write_all(&frame).await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(reports.recv().await.unwrap().event_type);
    }
    assert_eq!(seen, vec![0x00, 0x01, 0x02]);
}

/// Scenario 6: a command completion is matched by the connection handle
/// embedded in its return parameters, not just its opcode. A completion
/// for the wrong handle is silently dropped.
#[tokio::test]
async fn completion_is_demultiplexed_by_connection_handle() {
    let (host, mut remote) = harness();
    let wanted = ConnHandle::new(0x000A).unwrap();
    let reply = tokio::spawn(async move { host.le_read_channel_map(wanted).await });

    // LE_Read_Channel_Map completion for a different handle: ignored.
    remote
        .write_all(&[
            0x04, 0x0E, 0x0B, 0x01, 0x15, 0x20, 0x00, 0x0B, 0x00, 0, 0, 0, 0, 0,
        ])
        .await
        .unwrap();
    // Give the reader task a chance to observe (and drop) the mismatch
    // before the matching completion follows.
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Completion for the handle actually awaited: resolves the call.
    remote
        .write_all(&[
            0x04, 0x0E, 0x0B, 0x01, 0x15, 0x20, 0x00, 0x0A, 0x00, 1, 2, 3, 4, 5,
        ])
        .await
        .unwrap();

    let map = reply.await.unwrap().unwrap();
    assert_eq!(map.handle, wanted);
    assert_eq!(map.channel_map, [1, 2, 3, 4, 5]);
}
