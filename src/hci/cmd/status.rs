//! Status Parameters commands ([Vol 4] Part E, Section 7.5).

use crate::hci::{ConnHandle, Event, Host, Opcode, Transport};
use crate::wire::Packer;
use crate::Result;

/// `HCI_Read_RSSI` return parameters ([Vol 4] Part E, Section 7.5.4).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rssi {
    pub handle: ConnHandle,
    /// dBm, or `127` if the controller cannot report it.
    pub rssi: i8,
}

impl From<&mut Event> for Rssi {
    fn from(e: &mut Event) -> Self {
        Self {
            handle: ConnHandle::new(e.u16()).unwrap_or_default(),
            rssi: e.i8(),
        }
    }
}

impl<T: Transport> Host<T> {
    /// `HCI_Read_RSSI` ([Vol 4] Part E, Section 7.5.4).
    pub async fn read_rssi(&self, handle: ConnHandle) -> Result<Rssi> {
        let mut p = Packer::with_capacity(2);
        p.u16(handle.raw());
        self.exec_for_conn(Opcode::ReadRssi, p.as_ref(), handle).await?.into()
    }
}
