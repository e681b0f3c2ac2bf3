//! Informational Parameters commands ([Vol 4] Part E, Section 7.4). These
//! report fixed controller capabilities, never anything connection-scoped.

use crate::hci::consts::CoreVersion;
use crate::hci::{Event, Host, Opcode, Transport};
use crate::le::RawAddr;
use crate::Result;

/// `HCI_Read_Local_Version_Information` return parameters ([Vol 4] Part E,
/// Section 7.4.1).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LocalVersion {
    pub hci_version: CoreVersion,
    pub hci_revision: u16,
    pub lmp_version: CoreVersion,
    pub manufacturer_name: u16,
    pub lmp_subversion: u16,
}

impl From<&mut Event> for LocalVersion {
    fn from(e: &mut Event) -> Self {
        Self {
            hci_version: CoreVersion::from(e.u8()),
            hci_revision: e.u16(),
            lmp_version: CoreVersion::from(e.u8()),
            manufacturer_name: e.u16(),
            lmp_subversion: e.u16(),
        }
    }
}

/// `HCI_Read_Local_Supported_Commands` return parameters ([Vol 4] Part E,
/// Section 7.4.2): a 64-byte bitmask, one bit per defined command.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct LocalSupportedCommands([u8; 64]);

impl LocalSupportedCommands {
    /// Returns whether the bit at `octet * 8 + bit` is set, using the
    /// numbering from the Core Specification's "Supported Commands" table
    /// (e.g. octet 5, bit 6 is `HCI_Read_Remote_Version_Information`).
    #[must_use]
    pub fn supports(&self, octet: usize, bit: u8) -> bool {
        self.0.get(octet).is_some_and(|b| b & (1 << bit) != 0)
    }
}

impl std::fmt::Debug for LocalSupportedCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalSupportedCommands({:02x?})", &self.0[..])
    }
}

impl From<&mut Event> for LocalSupportedCommands {
    fn from(e: &mut Event) -> Self {
        Self(e.array())
    }
}

/// `HCI_Read_Buffer_Size` return parameters ([Vol 4] Part E, Section 7.4.5).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BufferSize {
    pub acl_data_packet_length: u16,
    pub sco_data_packet_length: u8,
    pub total_num_acl_data_packets: u16,
    pub total_num_sco_data_packets: u16,
}

impl From<&mut Event> for BufferSize {
    fn from(e: &mut Event) -> Self {
        Self {
            acl_data_packet_length: e.u16(),
            sco_data_packet_length: e.u8(),
            total_num_acl_data_packets: e.u16(),
            total_num_sco_data_packets: e.u16(),
        }
    }
}

impl From<&mut Event> for RawAddr {
    fn from(e: &mut Event) -> Self {
        Self::new(e.array())
    }
}

impl<T: Transport> Host<T> {
    /// `HCI_Read_Local_Version_Information` ([Vol 4] Part E, Section 7.4.1).
    pub async fn read_local_version_information(&self) -> Result<LocalVersion> {
        self.exec(Opcode::ReadLocalVersionInformation).await?.into()
    }

    /// `HCI_Read_Local_Supported_Commands` ([Vol 4] Part E, Section 7.4.2).
    pub async fn read_local_supported_commands(&self) -> Result<LocalSupportedCommands> {
        self.exec(Opcode::ReadLocalSupportedCommands).await?.into()
    }

    /// `HCI_Read_Local_Supported_Features` ([Vol 4] Part E, Section 7.4.3):
    /// the raw LMP/LL features bitmask.
    pub async fn read_local_supported_features(&self) -> Result<u64> {
        self.exec(Opcode::ReadLocalSupportedFeatures)
            .await?
            .ok()?
            .decode(|e| e.u64())
    }

    /// `HCI_Read_Buffer_Size` ([Vol 4] Part E, Section 7.4.5): classic ACL
    /// and synchronous buffer limits, not the LE-specific sizes (see
    /// [`Host::le_read_buffer_size`]).
    pub async fn read_buffer_size(&self) -> Result<BufferSize> {
        self.exec(Opcode::ReadBufferSize).await?.into()
    }

    /// `HCI_Read_BD_ADDR` ([Vol 4] Part E, Section 7.4.6): the controller's
    /// public address.
    pub async fn read_bd_addr(&self) -> Result<RawAddr> {
        self.exec(Opcode::ReadBdAddr).await?.into()
    }
}
