//! Control and Baseband commands ([Vol 4] Part E, Section 7.3).

use bitflags::bitflags;

use crate::hci::{Host, Opcode, Transport};
use crate::wire::Packer;
use crate::Result;

bitflags! {
    /// `Event_Mask` ([Vol 4] Part E, Section 7.3.1). Named bits cover the
    /// events this crate can decode; set [`Self::all`] to receive
    /// everything this client understands.
    #[derive(Default)]
    pub struct EventMask: u64 {
        const DISCONNECTION_COMPLETE = 1 << 4;
        const ENCRYPTION_CHANGE = 1 << 7;
        const HARDWARE_ERROR = 1 << 15;
        const NUMBER_OF_COMPLETED_PACKETS = 1 << 24;
        const ENCRYPTION_KEY_REFRESH_COMPLETE = 1 << 47;
        const LE_META = 1 << 61;
    }
}

impl<T: Transport> Host<T> {
    /// `HCI_Set_Event_Mask` ([Vol 4] Part E, Section 7.3.1).
    pub async fn set_event_mask(&self, mask: EventMask) -> Result<()> {
        let mut p = Packer::with_capacity(8);
        p.u64(mask.bits());
        self.exec_params(Opcode::SetEventMask, p.as_ref()).await?.into()
    }

    /// `HCI_Reset` ([Vol 4] Part E, Section 7.3.2). The recommended
    /// recovery after a [`crate::Error::Timeout`].
    pub async fn reset(&self) -> Result<()> {
        self.exec(Opcode::Reset).await?.into()
    }

    /// `HCI_Set_Controller_To_Host_Flow_Control` ([Vol 4] Part E, Section
    /// 7.3.38). `flow_control_enable` is a 3-bit field: bit 0 for ACL, bit 1
    /// for synchronous data.
    pub async fn set_controller_to_host_flow_control(&self, flow_control_enable: u8) -> Result<()> {
        let mut p = Packer::with_capacity(1);
        p.u8(flow_control_enable);
        self.exec_params(Opcode::SetControllerToHostFlowControl, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_Host_Buffer_Size` ([Vol 4] Part E, Section 7.3.39), announcing
    /// how much host-side buffer space backs
    /// `HCI_Set_Controller_To_Host_Flow_Control`.
    pub async fn host_buffer_size(
        &self,
        acl_data_packet_length: u16,
        sco_data_packet_length: u8,
        total_num_acl_data_packets: u16,
        total_num_sco_data_packets: u16,
    ) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u16(acl_data_packet_length)
            .u8(sco_data_packet_length)
            .u16(total_num_acl_data_packets)
            .u16(total_num_sco_data_packets);
        self.exec_params(Opcode::HostBufferSize, p.as_ref()).await?.into()
    }

    /// `HCI_Set_Event_Mask_Page_2` ([Vol 4] Part E, Section 7.3.69).
    pub async fn set_event_mask_page_2(&self, mask: u64) -> Result<()> {
        let mut p = Packer::with_capacity(8);
        p.u64(mask);
        self.exec_params(Opcode::SetEventMaskPage2, p.as_ref()).await?.into()
    }

    /// `HCI_Write_LE_Host_Support` ([Vol 4] Part E, Section 7.3.79).
    /// `simultaneous_le_host` is reserved for future use and ignored by
    /// every controller implementing Core 4.0 or later, but the field is
    /// still sent for protocol compliance.
    pub async fn write_le_host_support(&self, le_supported_host: bool) -> Result<()> {
        let mut p = Packer::with_capacity(2);
        p.bool(le_supported_host).bool(false);
        self.exec_params(Opcode::WriteLeHostSupport, p.as_ref()).await?.into()
    }
}
