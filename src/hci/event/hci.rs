//! Decoders for events that are not `CommandComplete`/`CommandStatus` and
//! are not carried under `HCI_LE_Meta` ([Vol 4] Part E, Section 7.7).

use smallvec::SmallVec;

use super::Event;
use crate::hci::conn::ConnHandle;
use crate::hci::consts::Status;

/// `HCI_Disconnection_Complete` ([Vol 4] Part E, Section 7.7.5).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DisconnectionComplete {
    pub status: Status,
    pub handle: ConnHandle,
    pub reason: Status,
}

impl From<&mut Event> for DisconnectionComplete {
    fn from(e: &mut Event) -> Self {
        Self {
            status: e.status(),
            handle: e.conn_handle().unwrap_or_default(),
            reason: Status::from(e.u8()),
        }
    }
}

/// `HCI_Encryption_Change` ([Vol 4] Part E, Section 7.7.8). The LE
/// controller reports only AES-CCM encryption, so `enabled` collapses the
/// core spec's `Encryption_Enabled` byte to a single flag.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EncryptionChange {
    pub status: Status,
    pub handle: ConnHandle,
    pub enabled: bool,
}

impl From<&mut Event> for EncryptionChange {
    fn from(e: &mut Event) -> Self {
        Self {
            status: e.status(),
            handle: e.conn_handle().unwrap_or_default(),
            enabled: e.bool(),
        }
    }
}

/// One connection handle's worth of buffer credit returned by the
/// controller ([Vol 4] Part E, Section 7.7.19).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CompletedPackets {
    pub handle: ConnHandle,
    pub count: u16,
}

/// `HCI_Number_Of_Completed_Packets`. Forwarded unmodified; ACL
/// flow-control bookkeeping is left to the caller (Non-goal: ACL
/// reassembly and Link Layer flow control).
#[derive(Clone, Debug, Default)]
pub struct NumberOfCompletedPackets {
    pub entries: SmallVec<[CompletedPackets; 4]>,
}

impl From<&mut Event> for NumberOfCompletedPackets {
    fn from(e: &mut Event) -> Self {
        let n = usize::from(e.u8());
        let mut entries = SmallVec::with_capacity(n);
        for _ in 0..n {
            let handle = ConnHandle::new(e.u16()).unwrap_or_default();
            let count = e.u16();
            entries.push(CompletedPackets { handle, count });
        }
        Self { entries }
    }
}
