use bytes::Bytes;

use super::*;
use crate::hci::consts::EventCode;

fn event(wire: &[u8]) -> Event {
    Event::parse(Bytes::copy_from_slice(wire)).unwrap()
}

#[test]
fn command_complete_decodes_opcode_and_status() {
    // Num_HCI_Command_Packets=1, opcode=Reset (0x0C03), status=Success.
    let e = event(&[0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00]);
    assert_eq!(e.typ(), EventType::Hci(EventCode::CommandComplete));
    assert!(e.typ().is_cmd());
    assert_eq!(e.opcode(), Opcode::Reset);
    assert!(e.status().is_ok());
    assert_eq!(e.cmd_quota(), 1);
    assert!(e.ok().is_ok());
}

#[test]
fn command_status_carries_status_before_opcode() {
    let e = event(&[0x0F, 0x04, 0x12, 0x01, 0x0D, 0x08]); // status=Invalid params, quota=1, opcode=LeCreateConnection
    assert_eq!(e.typ(), EventType::Hci(EventCode::CommandStatus));
    assert!(!e.status().is_ok());
    assert_eq!(e.opcode(), Opcode::LeCreateConnection);
}

#[test]
fn disconnection_complete_decodes() {
    let e = event(&[0x05, 0x04, 0x00, 0x0A, 0x00, 0x13]);
    let d = DisconnectionComplete::from(&mut e.clone());
    assert!(d.status.is_ok());
    assert_eq!(d.handle.raw(), 0x000A);
    assert_eq!(d.reason, Status::from(0x13));
}

#[test]
fn unknown_event_code_is_rejected() {
    assert!(Event::parse(Bytes::from_static(&[0xFE, 0x00])).is_err());
}

#[test]
fn advertising_report_fans_out_multiple_reports() {
    // Num_Reports=2, two ADV_IND (event_type=0) public reports, no data, RSSI -40/-50.
    let params: &[u8] = &[
        0x02, 0x02, // subevent=AdvertisingReport, num_reports=2
        0x00, 0x00, // event_type x2
        0x00, 0x00, // addr_type x2
        0x11, 0x11, 0x11, 0x11, 0x11, 0x11, // addr 1
        0x22, 0x22, 0x22, 0x22, 0x22, 0x22, // addr 2
        0x00, 0x00, // length x2 (no data)
        0xD8_u8 as u8, 0xCE_u8 as u8, // rssi -40, -50
    ];
    let mut wire = vec![0x3E, u8::try_from(params.len()).unwrap()];
    wire.extend_from_slice(params);
    let mut e = event(&wire);
    assert_eq!(e.typ(), EventType::Le(SubeventCode::AdvertisingReport));
    let reports = AdvertisingReport::parse_all(&mut e);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].rssi, Some(-40));
    assert_eq!(reports[1].rssi, Some(-50));
}
