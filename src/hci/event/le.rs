//! Decoders for `HCI_LE_Meta` sub-events ([Vol 4] Part E, Section 7.7.65).

use std::time::Duration;

use bytes::Bytes;

use super::{Event, EventType};
use crate::hci::conn::ConnHandle;
use crate::hci::consts::{Role, Status, SubeventCode};
use crate::le::{Addr, TxPower};
use crate::wire::{duration_10ms, duration_1250us};

/// Central clock accuracy, indexed by the 3-bit `Central_Clock_Accuracy`
/// field ([Vol 4] Part E, Section 7.7.65.1).
const CENTRAL_CLOCK_ACCURACY_PPM: [u16; 8] = [500, 250, 150, 100, 75, 50, 30, 20];

/// `LE_Connection_Complete`/`LE_Enhanced_Connection_Complete` ([Vol 4] Part
/// E, Sections 7.7.65.1, 7.7.65.10), unified since they differ only in
/// whether the resolvable private addresses are present.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LeConnectionComplete {
    pub status: Status,
    pub handle: ConnHandle,
    pub role: Role,
    pub peer_addr: Addr,
    /// Present only for `LE_Enhanced_Connection_Complete`.
    pub local_rpa: Option<Addr>,
    /// Present only for `LE_Enhanced_Connection_Complete`.
    pub peer_rpa: Option<Addr>,
    pub conn_interval: Duration,
    pub conn_latency: u16,
    pub supervision_timeout: Duration,
    pub central_clock_accuracy_ppm: u16,
}

impl From<&mut Event> for LeConnectionComplete {
    fn from(e: &mut Event) -> Self {
        let enhanced = matches!(e.typ(), EventType::Le(SubeventCode::EnhancedConnectionComplete));
        let role = Role::try_from(e.u8()).unwrap_or(Role::Central);
        let peer_addr_type = e.u8();
        let peer_raw = e.addr();
        let (local_rpa, peer_rpa) = if enhanced {
            (Some(Addr::peer(0x01, e.addr())), Some(Addr::peer(0x01, e.addr())))
        } else {
            (None, None)
        };
        let conn_interval = duration_1250us(e.u16());
        let conn_latency = e.u16();
        let supervision_timeout = duration_10ms(e.u16());
        let cca = usize::from(e.u8());
        Self {
            status: e.status(),
            handle: e.conn_handle().unwrap_or_default(),
            role,
            peer_addr: Addr::peer(peer_addr_type, peer_raw),
            local_rpa,
            peer_rpa,
            conn_interval,
            conn_latency,
            supervision_timeout,
            central_clock_accuracy_ppm: CENTRAL_CLOCK_ACCURACY_PPM.get(cca).copied().unwrap_or(500),
        }
    }
}

/// One report from a legacy `LE_Advertising_Report` event ([Vol 4] Part E,
/// Section 7.7.65.2).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AdvertisingReport {
    /// Raw `Event_Type` value (`ADV_IND`..`SCAN_RSP`, 0x00-0x04).
    pub event_type: u8,
    pub addr: Addr,
    pub data: Bytes,
    /// `None` when the controller reports RSSI as unavailable (`0x7F`).
    pub rssi: Option<i8>,
}

impl AdvertisingReport {
    /// Decodes the legacy report event's struct-of-arrays layout: parallel
    /// per-report fields followed by the variable-length advertising data
    /// and a trailing RSSI array.
    pub(crate) fn parse_all(e: &mut Event) -> Vec<Self> {
        let n = usize::from(e.u8());
        let event_types: Vec<u8> = (0..n).map(|_| e.u8()).collect();
        let addr_types: Vec<u8> = (0..n).map(|_| e.u8()).collect();
        let addrs: Vec<_> = (0..n).map(|_| e.addr()).collect();
        let lens: Vec<usize> = (0..n).map(|_| usize::from(e.u8())).collect();
        let datas: Vec<Bytes> = lens
            .iter()
            .map(|&len| e.skip(len).map(|mut u| u.rest()).unwrap_or_default())
            .collect();
        let rssis: Vec<i8> = (0..n).map(|_| e.i8()).collect();
        (0..n)
            .map(|i| Self {
                event_type: event_types[i],
                addr: Addr::peer(addr_types[i], addrs[i]),
                data: datas[i].clone(),
                rssi: (rssis[i] != 0x7F).then_some(rssis[i]),
            })
            .collect()
    }
}

/// One report from an `LE_Extended_Advertising_Report` event ([Vol 4] Part
/// E, Section 7.7.65.13).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExtendedAdvertisingReport {
    /// Raw `Event_Type` bitmask (connectable/scannable/directed, legacy
    /// flag, and data-status bits).
    pub event_type: u16,
    pub addr: Addr,
    pub primary_phy: u8,
    /// `0` if the advertisement has no secondary channel.
    pub secondary_phy: u8,
    /// `0xFF` if the advertising set has no SID.
    pub advertising_sid: u8,
    pub tx_power: Option<TxPower>,
    pub rssi: Option<i8>,
    /// `Duration::ZERO` if the advertisement is not periodic.
    pub periodic_advertising_interval: Duration,
    pub direct_addr: Addr,
    pub data: Bytes,
}

impl ExtendedAdvertisingReport {
    pub(crate) fn parse_all(e: &mut Event) -> Vec<Self> {
        let n = usize::from(e.u8());
        (0..n)
            .map(|_| {
                let event_type = e.u16();
                let addr_type = e.u8();
                let raw = e.addr();
                let primary_phy = e.u8();
                let secondary_phy = e.u8();
                let advertising_sid = e.u8();
                let tx_power = e.i8();
                let rssi = e.i8();
                let periodic_interval = e.u16();
                let direct_addr_type = e.u8();
                let direct_raw = e.addr();
                let len = usize::from(e.u8());
                let data = e.skip(len).map(|mut u| u.rest()).unwrap_or_default();
                Self {
                    event_type,
                    addr: Addr::peer(addr_type, raw),
                    primary_phy,
                    secondary_phy,
                    advertising_sid,
                    tx_power: (tx_power != 0x7F).then(|| TxPower::dbm(tx_power)),
                    rssi: (rssi != 0x7F).then_some(rssi),
                    periodic_advertising_interval: duration_1250us(periodic_interval),
                    direct_addr: Addr::peer(direct_addr_type, direct_raw),
                    data,
                }
            })
            .collect()
    }
}

/// `LE_Connection_Update_Complete` ([Vol 4] Part E, Section 7.7.65.3).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnectionUpdateComplete {
    pub status: Status,
    pub handle: ConnHandle,
    pub conn_interval: Duration,
    pub conn_latency: u16,
    pub supervision_timeout: Duration,
}

impl From<&mut Event> for ConnectionUpdateComplete {
    fn from(e: &mut Event) -> Self {
        Self {
            status: e.status(),
            handle: e.conn_handle().unwrap_or_default(),
            conn_interval: duration_1250us(e.u16()),
            conn_latency: e.u16(),
            supervision_timeout: duration_10ms(e.u16()),
        }
    }
}

/// `LE_Read_Remote_Features_Complete` ([Vol 4] Part E, Section 7.7.65.4).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReadRemoteFeaturesComplete {
    pub status: Status,
    pub handle: ConnHandle,
    /// Raw `LE_Features` bitmask ([Vol 6] Part B, Section 4.6).
    pub features: u64,
}

impl From<&mut Event> for ReadRemoteFeaturesComplete {
    fn from(e: &mut Event) -> Self {
        Self {
            status: e.status(),
            handle: e.conn_handle().unwrap_or_default(),
            features: e.u64(),
        }
    }
}

/// `LE_Channel_Selection_Algorithm` ([Vol 4] Part E, Section 7.7.65.20).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChannelSelectionAlgorithm {
    pub handle: ConnHandle,
    /// `false` for algorithm #1, `true` for algorithm #2.
    pub algorithm_2: bool,
}

impl From<&mut Event> for ChannelSelectionAlgorithm {
    fn from(e: &mut Event) -> Self {
        Self {
            handle: e.conn_handle().unwrap_or_default(),
            algorithm_2: e.bool(),
        }
    }
}
