//! LE Controller commands ([Vol 4] Part E, Section 7.8): the bulk of the
//! command surface, covering advertising (legacy and extended), scanning,
//! connection establishment and maintenance, encryption key exchange, data
//! length, PHY preference, and resolving-list/filter-accept-list
//! management.

use std::time::Duration;

use bitflags::bitflags;

use crate::hci::{
    AdvAddrType, AdvChanMap, AdvDataOp, AdvFilterPolicy, AdvHandle, AdvPhy, AdvProp, ConnHandle,
    Event, Host, LegacyAdvType, Opcode, ScanFilterDuplicates, ScanPhys, ScanType, Transport,
};
use crate::le::{Addr, RawAddr, TxPower};
use crate::wire::{ticks_10ms, ticks_1250us, ticks_1280ms, ticks_625us, ticks_625us_u16, Packer};
use crate::{Error, Result};

/// `LE_Event_Mask` bits ([Vol 4] Part E, Section 7.8.1), named for the
/// sub-events this crate can decode. Unlisted bits are reserved.
bitflags! {
    #[derive(Default)]
    pub struct LeEventMask: u64 {
        const CONNECTION_COMPLETE = 1 << 0;
        const ADVERTISING_REPORT = 1 << 1;
        const CONNECTION_UPDATE_COMPLETE = 1 << 2;
        const READ_REMOTE_FEATURES_COMPLETE = 1 << 3;
        const LONG_TERM_KEY_REQUEST = 1 << 4;
        const ENHANCED_CONNECTION_COMPLETE = 1 << 9;
        const EXTENDED_ADVERTISING_REPORT = 1 << 12;
        const CHANNEL_SELECTION_ALGORITHM = 1 << 19;
    }
}

/// `Initiator_Filter_Policy` ([Vol 4] Part E, Sections 7.8.12, 7.8.66).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum InitiatorFilterPolicy {
    #[default]
    UsePeerAddress = 0x00,
    UseFilterAcceptList = 0x01,
}

/// `HCI_LE_Read_Buffer_Size` return parameters ([Vol 4] Part E, Section
/// 7.8.2), unified across v1/v2: the ISO fields are zero when the
/// controller only supports v1 (no ISO channels).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LeBufferSize {
    pub acl_data_len: u16,
    pub acl_num_pkts: u8,
    pub iso_data_len: u16,
    pub iso_num_pkts: u8,
}

impl From<&mut Event> for LeBufferSize {
    fn from(e: &mut Event) -> Self {
        let v2 = e.opcode() == Opcode::LeReadBufferSizeV2;
        Self {
            acl_data_len: e.u16(),
            acl_num_pkts: e.u8(),
            iso_data_len: if v2 { e.u16() } else { 0 },
            iso_num_pkts: if v2 { e.u8() } else { 0 },
        }
    }
}

/// `HCI_LE_Set_Advertising_Parameters` command parameters ([Vol 4] Part E,
/// Section 7.8.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LegacyAdvParams {
    pub interval: (Duration, Duration),
    pub adv_type: LegacyAdvType,
    pub own_addr_type: AdvAddrType,
    pub peer_addr: Addr,
    pub channel_map: AdvChanMap,
    pub filter_policy: AdvFilterPolicy,
}

/// `HCI_LE_Create_Connection` command parameters ([Vol 4] Part E, Section
/// 7.8.12).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LegacyConnParams {
    pub scan_interval: Duration,
    pub scan_window: Duration,
    pub filter_policy: InitiatorFilterPolicy,
    pub peer_addr: Addr,
    pub own_addr_type: AdvAddrType,
    pub conn_interval: (Duration, Duration),
    pub conn_latency: u16,
    pub supervision_timeout: Duration,
    pub ce_len: (Duration, Duration),
}

/// `Conn_Interval`/`Conn_Latency`/`Supervision_Timeout`/`CE_Length`
/// parameters shared by `LE_Connection_Update` and the per-PHY blocks of
/// `LE_Extended_Create_Connection` ([Vol 4] Part E, Sections 7.8.18,
/// 7.8.66).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnUpdateParams {
    pub conn_interval: (Duration, Duration),
    pub conn_latency: u16,
    pub supervision_timeout: Duration,
    pub ce_len: (Duration, Duration),
}

impl ConnUpdateParams {
    fn pack(&self, p: &mut Packer) {
        p.u16(ticks_1250us(self.conn_interval.0).unwrap_or(0))
            .u16(ticks_1250us(self.conn_interval.1).unwrap_or(0))
            .u16(self.conn_latency)
            .u16(ticks_10ms(self.supervision_timeout).unwrap_or(0))
            .u16(ticks_625us_u16(self.ce_len.0))
            .u16(ticks_625us_u16(self.ce_len.1));
    }
}

/// One PHY's scan and connection parameters for
/// `HCI_LE_Extended_Create_Connection` ([Vol 4] Part E, Section 7.8.66).
/// Only [`AdvPhy::Le1M`], [`AdvPhy::Le2M`], and [`AdvPhy::LeCoded`] are
/// meaningful here.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnPhyParams {
    pub phy: AdvPhy,
    pub scan_interval: Duration,
    pub scan_window: Duration,
    pub conn: ConnUpdateParams,
}

bitflags! {
    /// `Initiating_PHYs` bitmask ([Vol 4] Part E, Section 7.8.66): one bit
    /// per initiating PHY, ordinal order matching [`AdvPhy`]'s values.
    struct InitiatingPhys: u8 {
        const LE_1M = 1 << 0;
        const LE_2M = 1 << 1;
        const LE_CODED = 1 << 2;
    }
}

impl From<AdvPhy> for InitiatingPhys {
    fn from(phy: AdvPhy) -> Self {
        match phy {
            AdvPhy::Le1M => Self::LE_1M,
            AdvPhy::Le2M => Self::LE_2M,
            AdvPhy::LeCoded => Self::LE_CODED,
        }
    }
}

/// One PHY's scan type/interval/window for `HCI_LE_Set_Extended_Scan_Parameters`
/// ([Vol 4] Part E, Section 7.8.64). Only [`AdvPhy::Le1M`] and
/// [`AdvPhy::LeCoded`] are valid scanning PHYs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScanPhyParams {
    pub phy: AdvPhy,
    pub scan_type: ScanType,
    pub interval: Duration,
    pub window: Duration,
}

/// `HCI_LE_Read_Maximum_Data_Length` return parameters ([Vol 4] Part E,
/// Section 7.8.46).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MaximumDataLength {
    pub max_tx_octets: u16,
    pub max_tx_time: u16,
    pub max_rx_octets: u16,
    pub max_rx_time: u16,
}

impl From<&mut Event> for MaximumDataLength {
    fn from(e: &mut Event) -> Self {
        Self {
            max_tx_octets: e.u16(),
            max_tx_time: e.u16(),
            max_rx_octets: e.u16(),
            max_rx_time: e.u16(),
        }
    }
}

/// `HCI_LE_Read_Suggested_Default_Data_Length` return parameters ([Vol 4]
/// Part E, Section 7.8.34).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SuggestedDefaultDataLength {
    pub tx_octets: u16,
    pub tx_time: u16,
}

impl From<&mut Event> for SuggestedDefaultDataLength {
    fn from(e: &mut Event) -> Self {
        Self {
            tx_octets: e.u16(),
            tx_time: e.u16(),
        }
    }
}

/// `HCI_LE_Read_PHY` return parameters ([Vol 4] Part E, Section 7.8.47).
/// `tx_phy`/`rx_phy` are the raw single-PHY values (1/2/3 for 1M/2M/Coded).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PhyPreference {
    pub handle: ConnHandle,
    pub tx_phy: u8,
    pub rx_phy: u8,
}

impl From<&mut Event> for PhyPreference {
    fn from(e: &mut Event) -> Self {
        Self {
            handle: ConnHandle::new(e.u16()).unwrap_or_default(),
            tx_phy: e.u8(),
            rx_phy: e.u8(),
        }
    }
}

/// `HCI_LE_Read_Channel_Map` return parameters ([Vol 4] Part E, Section
/// 7.8.20). `channel_map` is the 37-bit channel map, one bit per data
/// channel, in the low 37 bits of 5 little-endian bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChannelMap {
    pub handle: ConnHandle,
    pub channel_map: [u8; 5],
}

impl From<&mut Event> for ChannelMap {
    fn from(e: &mut Event) -> Self {
        Self {
            handle: ConnHandle::new(e.u16()).unwrap_or_default(),
            channel_map: e.array(),
        }
    }
}

/// Legacy advertising/scan-response data is at most 31 bytes ([Section
/// 3](crate) invariants). Payloads are always sent as the fixed 32-byte
/// `[length, data[31]]` shape regardless of the actual length.
const LEGACY_DATA_MAX: usize = 31;

fn pack_legacy_data(opcode: Opcode, data: &[u8]) -> Result<Packer> {
    if data.len() > LEGACY_DATA_MAX {
        return Err(Error::ParamsTooLarge {
            opcode,
            max: LEGACY_DATA_MAX,
            got: data.len(),
        });
    }
    let mut p = Packer::with_capacity(1 + LEGACY_DATA_MAX);
    #[allow(clippy::cast_possible_truncation)]
    p.u8(data.len() as u8).put(data);
    for _ in data.len()..LEGACY_DATA_MAX {
        p.u8(0u8);
    }
    Ok(p)
}

/// Extended advertising/scan-response/periodic data is fragmented by the
/// host into chunks of at most this many bytes ([Vol 4] Part E, Sections
/// 7.8.54, 7.8.55, 7.8.62).
pub const EXTENDED_DATA_FRAGMENT_MAX: usize = 251;

fn pack_fragment(opcode: Opcode, data: &[u8]) -> Result<()> {
    if data.len() > EXTENDED_DATA_FRAGMENT_MAX {
        return Err(Error::ParamsTooLarge {
            opcode,
            max: EXTENDED_DATA_FRAGMENT_MAX,
            got: data.len(),
        });
    }
    Ok(())
}

impl<T: Transport> Host<T> {
    /// `HCI_LE_Set_Event_Mask` ([Vol 4] Part E, Section 7.8.1).
    pub async fn le_set_event_mask(&self, mask: LeEventMask) -> Result<()> {
        let mut p = Packer::with_capacity(8);
        p.u64(mask.bits());
        self.exec_params(Opcode::LeSetEventMask, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Read_Buffer_Size` ([Vol 4] Part E, Section 7.8.2). Tries the
    /// v2 (ISO-aware) form first and falls back to v1 if the controller
    /// doesn't recognize it.
    pub async fn le_read_buffer_size(&self) -> Result<LeBufferSize> {
        let r = self.exec(Opcode::LeReadBufferSizeV2).await?;
        if r.status() != crate::hci::Status::UnknownCommand {
            return r.into();
        }
        self.exec(Opcode::LeReadBufferSize).await?.into()
    }

    /// `HCI_LE_Read_Local_Supported_Features` ([Vol 4] Part E, Section
    /// 7.8.3): the raw `LE_Features` bitmask ([Vol 6] Part B, Section 4.6).
    pub async fn le_read_local_supported_features(&self) -> Result<u64> {
        self.exec(Opcode::LeReadLocalSupportedFeatures)
            .await?
            .ok()?
            .decode(|e| e.u64())
    }

    /// `HCI_LE_Set_Random_Address` ([Vol 4] Part E, Section 7.8.4).
    pub async fn le_set_random_address(&self, addr: RawAddr) -> Result<()> {
        let mut p = Packer::with_capacity(6);
        p.put(addr);
        self.exec_params(Opcode::LeSetRandomAddress, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Set_Advertising_Parameters` ([Vol 4] Part E, Section 7.8.5).
    pub async fn le_set_advertising_parameters(&self, p: LegacyAdvParams) -> Result<()> {
        let mut pk = Packer::with_capacity(15);
        pk.u16(ticks_625us_u16(p.interval.0))
            .u16(ticks_625us_u16(p.interval.1))
            .u8(p.adv_type)
            .u8(p.own_addr_type)
            .u8(p.peer_addr.peer_type_bit())
            .put(p.peer_addr.raw())
            .u8(p.channel_map.bits())
            .u8(p.filter_policy);
        self.exec_params(Opcode::LeSetAdvertisingParameters, pk.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Read_Advertising_Physical_Channel_Tx_Power` ([Vol 4] Part E,
    /// Section 7.8.6).
    pub async fn le_read_advertising_physical_channel_tx_power(&self) -> Result<TxPower> {
        self.exec(Opcode::LeReadAdvertisingPhysicalChannelTxPower)
            .await?
            .ok()?
            .decode(|e| TxPower::dbm(e.i8()))
    }

    /// `HCI_LE_Set_Advertising_Data` ([Vol 4] Part E, Section 7.8.7). `data`
    /// must be at most 31 bytes.
    pub async fn le_set_advertising_data(&self, data: &[u8]) -> Result<()> {
        let p = pack_legacy_data(Opcode::LeSetAdvertisingData, data)?;
        self.exec_params(Opcode::LeSetAdvertisingData, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Set_Scan_Response_Data` ([Vol 4] Part E, Section 7.8.8).
    /// `data` must be at most 31 bytes.
    pub async fn le_set_scan_response_data(&self, data: &[u8]) -> Result<()> {
        let p = pack_legacy_data(Opcode::LeSetScanResponseData, data)?;
        self.exec_params(Opcode::LeSetScanResponseData, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Advertising_Enable` ([Vol 4] Part E, Section 7.8.9).
    pub async fn le_set_advertising_enable(&self, enable: bool) -> Result<()> {
        let mut p = Packer::with_capacity(1);
        p.bool(enable);
        self.exec_params(Opcode::LeSetAdvertisingEnable, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Scan_Parameters` ([Vol 4] Part E, Section 7.8.10).
    #[allow(clippy::too_many_arguments)]
    pub async fn le_set_scan_parameters(
        &self,
        scan_type: ScanType,
        interval: Duration,
        window: Duration,
        own_addr_type: AdvAddrType,
        filter_policy: AdvFilterPolicy,
    ) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u8(scan_type)
            .u16(ticks_625us_u16(interval))
            .u16(ticks_625us_u16(window))
            .u8(own_addr_type)
            .u8(filter_policy);
        self.exec_params(Opcode::LeSetScanParameters, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Set_Scan_Enable` ([Vol 4] Part E, Section 7.8.11).
    /// `filter_duplicates` is a plain flag here: the legacy command has no
    /// "reset each period" mode (that's extended-only, see
    /// [`Self::le_set_extended_scan_enable`]).
    pub async fn le_set_scan_enable(&self, enable: bool, filter_duplicates: bool) -> Result<()> {
        let mut p = Packer::with_capacity(2);
        p.bool(enable).bool(filter_duplicates);
        self.exec_params(Opcode::LeSetScanEnable, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Create_Connection` ([Vol 4] Part E, Section 7.8.12).
    /// Resolves on `CommandStatus`; the resulting connection arrives
    /// asynchronously as [`crate::hci::LeConnectionComplete`].
    pub async fn le_create_connection(&self, p: LegacyConnParams) -> Result<()> {
        let mut pk = Packer::with_capacity(25);
        pk.u16(ticks_625us_u16(p.scan_interval))
            .u16(ticks_625us_u16(p.scan_window))
            .u8(p.filter_policy)
            .u8(p.peer_addr.peer_type_bit())
            .put(p.peer_addr.raw())
            .u8(p.own_addr_type)
            .u16(ticks_1250us(p.conn_interval.0).unwrap_or(0))
            .u16(ticks_1250us(p.conn_interval.1).unwrap_or(0))
            .u16(p.conn_latency)
            .u16(ticks_10ms(p.supervision_timeout).unwrap_or(0))
            .u16(ticks_625us_u16(p.ce_len.0))
            .u16(ticks_625us_u16(p.ce_len.1));
        self.exec_params(Opcode::LeCreateConnection, pk.as_ref()).await?.into()
    }

    /// `HCI_LE_Create_Connection_Cancel` ([Vol 4] Part E, Section 7.8.13).
    pub async fn le_create_connection_cancel(&self) -> Result<()> {
        self.exec(Opcode::LeCreateConnectionCancel).await?.into()
    }

    /// `HCI_LE_Read_Filter_Accept_List_Size` ([Vol 4] Part E, Section
    /// 7.8.14).
    pub async fn le_read_filter_accept_list_size(&self) -> Result<u8> {
        self.exec(Opcode::LeReadFilterAcceptListSize)
            .await?
            .ok()?
            .decode(|e| e.u8())
    }

    /// `HCI_LE_Clear_Filter_Accept_List` ([Vol 4] Part E, Section 7.8.15).
    pub async fn le_clear_filter_accept_list(&self) -> Result<()> {
        self.exec(Opcode::LeClearFilterAcceptList).await?.into()
    }

    /// `HCI_LE_Add_Device_To_Filter_Accept_List` ([Vol 4] Part E, Section
    /// 7.8.16). `addr` must be [`Addr::Public`] or [`Addr::Random`].
    pub async fn le_add_device_to_filter_accept_list(&self, addr: Addr) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u8(addr.peer_type_bit()).put(addr.raw());
        self.exec_params(Opcode::LeAddDeviceToFilterAcceptList, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Remove_Device_From_Filter_Accept_List` ([Vol 4] Part E,
    /// Section 7.8.17).
    pub async fn le_remove_device_from_filter_accept_list(&self, addr: Addr) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u8(addr.peer_type_bit()).put(addr.raw());
        self.exec_params(Opcode::LeRemoveDeviceFromFilterAcceptList, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Connection_Update` ([Vol 4] Part E, Section 7.8.18).
    /// Resolves on `CommandStatus`; the new parameters arrive
    /// asynchronously as [`crate::hci::ConnectionUpdateComplete`].
    pub async fn le_connection_update(&self, handle: ConnHandle, p: ConnUpdateParams) -> Result<()> {
        let mut pk = Packer::with_capacity(14);
        pk.u16(handle.raw());
        p.pack(&mut pk);
        self.exec_params(Opcode::LeConnectionUpdate, pk.as_ref()).await?.into()
    }

    /// `HCI_LE_Set_Host_Channel_Classification` ([Vol 4] Part E, Section
    /// 7.8.19). `channel_map` is the 37-bit channel map in the low 37 bits
    /// of 5 little-endian bytes (bit 0 = channel 0).
    pub async fn le_set_host_channel_classification(&self, channel_map: [u8; 5]) -> Result<()> {
        let mut p = Packer::with_capacity(5);
        p.put(channel_map);
        self.exec_params(Opcode::LeSetHostChannelClassification, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Read_Channel_Map` ([Vol 4] Part E, Section 7.8.20).
    pub async fn le_read_channel_map(&self, handle: ConnHandle) -> Result<ChannelMap> {
        let mut p = Packer::with_capacity(2);
        p.u16(handle.raw());
        self.exec_for_conn(Opcode::LeReadChannelMap, p.as_ref(), handle)
            .await?
            .into()
    }

    /// `HCI_LE_Read_Remote_Features` ([Vol 4] Part E, Section 7.8.21).
    /// Resolves on `CommandStatus`; the features arrive asynchronously as
    /// [`crate::hci::ReadRemoteFeaturesComplete`].
    pub async fn le_read_remote_features(&self, handle: ConnHandle) -> Result<()> {
        let mut p = Packer::with_capacity(2);
        p.u16(handle.raw());
        self.exec_params(Opcode::LeReadRemoteFeatures, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Enable_Encryption` ([Vol 4] Part E, Section 7.8.24).
    /// `long_term_key` is forwarded opaquely — key derivation and storage
    /// are the caller's responsibility (Non-goal: pairing/key agreement).
    /// Resolves on `CommandStatus`; the result arrives asynchronously as
    /// [`crate::hci::EncryptionChange`].
    pub async fn le_enable_encryption(
        &self,
        handle: ConnHandle,
        random_number: u64,
        encrypted_diversifier: u16,
        long_term_key: [u8; 16],
    ) -> Result<()> {
        let mut p = Packer::with_capacity(28);
        p.u16(handle.raw())
            .u64(random_number)
            .u16(encrypted_diversifier)
            .put(long_term_key);
        self.exec_params(Opcode::LeEnableEncryption, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Long_Term_Key_Request_Reply` ([Vol 4] Part E, Section 7.8.25).
    pub async fn le_long_term_key_request_reply(
        &self,
        handle: ConnHandle,
        long_term_key: [u8; 16],
    ) -> Result<()> {
        let mut p = Packer::with_capacity(18);
        p.u16(handle.raw()).put(long_term_key);
        self.exec_for_conn(Opcode::LeLongTermKeyRequestReply, p.as_ref(), handle)
            .await?
            .into()
    }

    /// `HCI_LE_Long_Term_Key_Request_Negative_Reply` ([Vol 4] Part E,
    /// Section 7.8.26).
    pub async fn le_long_term_key_request_negative_reply(&self, handle: ConnHandle) -> Result<()> {
        let mut p = Packer::with_capacity(2);
        p.u16(handle.raw());
        self.exec_for_conn(Opcode::LeLongTermKeyRequestNegativeReply, p.as_ref(), handle)
            .await?
            .into()
    }

    /// `HCI_LE_Read_Supported_States` ([Vol 4] Part E, Section 7.8.27): a
    /// 64-bit bitmask, bits 0-41 each a fixed Link Layer state
    /// combination, bits 42-63 reserved.
    pub async fn le_read_supported_states(&self) -> Result<u64> {
        self.exec(Opcode::LeReadSupportedStates)
            .await?
            .ok()?
            .decode(|e| e.u64())
    }

    /// `HCI_LE_Set_Data_Length` ([Vol 4] Part E, Section 7.8.33).
    pub async fn le_set_data_length(&self, handle: ConnHandle, tx_octets: u16, tx_time: u16) -> Result<()> {
        let mut p = Packer::with_capacity(6);
        p.u16(handle.raw()).u16(tx_octets).u16(tx_time);
        self.exec_for_conn(Opcode::LeSetDataLength, p.as_ref(), handle)
            .await?
            .into()
    }

    /// `HCI_LE_Read_Suggested_Default_Data_Length` ([Vol 4] Part E, Section
    /// 7.8.34).
    pub async fn le_read_suggested_default_data_length(&self) -> Result<SuggestedDefaultDataLength> {
        self.exec(Opcode::LeReadSuggestedDefaultDataLength).await?.into()
    }

    /// `HCI_LE_Write_Suggested_Default_Data_Length` ([Vol 4] Part E,
    /// Section 7.8.35).
    pub async fn le_write_suggested_default_data_length(&self, tx_octets: u16, tx_time: u16) -> Result<()> {
        let mut p = Packer::with_capacity(4);
        p.u16(tx_octets).u16(tx_time);
        self.exec_params(Opcode::LeWriteSuggestedDefaultDataLength, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Add_Device_To_Resolving_List` ([Vol 4] Part E, Section
    /// 7.8.38). `peer_addr` must be [`Addr::Public`] or [`Addr::Random`];
    /// IRKs are forwarded opaquely (Non-goal: pairing/key agreement).
    pub async fn le_add_device_to_resolving_list(
        &self,
        peer_addr: Addr,
        peer_irk: [u8; 16],
        local_irk: [u8; 16],
    ) -> Result<()> {
        let mut p = Packer::with_capacity(39);
        p.u8(peer_addr.peer_type_bit())
            .put(peer_addr.raw())
            .put(peer_irk)
            .put(local_irk);
        self.exec_params(Opcode::LeAddDeviceToResolvingList, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Remove_Device_From_Resolving_List` ([Vol 4] Part E, Section
    /// 7.8.39).
    pub async fn le_remove_device_from_resolving_list(&self, peer_addr: Addr) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u8(peer_addr.peer_type_bit()).put(peer_addr.raw());
        self.exec_params(Opcode::LeRemoveDeviceFromResolvingList, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Clear_Resolving_List` ([Vol 4] Part E, Section 7.8.40).
    pub async fn le_clear_resolving_list(&self) -> Result<()> {
        self.exec(Opcode::LeClearResolvingList).await?.into()
    }

    /// `HCI_LE_Read_Resolving_List_Size` ([Vol 4] Part E, Section 7.8.41).
    pub async fn le_read_resolving_list_size(&self) -> Result<u8> {
        self.exec(Opcode::LeReadResolvingListSize)
            .await?
            .ok()?
            .decode(|e| e.u8())
    }

    /// `HCI_LE_Set_Address_Resolution_Enable` ([Vol 4] Part E, Section
    /// 7.8.44).
    pub async fn le_set_address_resolution_enable(&self, enable: bool) -> Result<()> {
        let mut p = Packer::with_capacity(1);
        p.bool(enable);
        self.exec_params(Opcode::LeSetAddressResolutionEnable, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Resolvable_Private_Address_Timeout` ([Vol 4] Part E,
    /// Section 7.8.45). `timeout` is rounded down to whole seconds; valid
    /// range is 1 s to 1 hour.
    pub async fn le_set_resolvable_private_address_timeout(&self, timeout: Duration) -> Result<()> {
        let mut p = Packer::with_capacity(2);
        #[allow(clippy::cast_possible_truncation)]
        p.u16(timeout.as_secs() as u16);
        self.exec_params(Opcode::LeSetResolvablePrivateAddressTimeout, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Read_Maximum_Data_Length` ([Vol 4] Part E, Section 7.8.46).
    pub async fn le_read_maximum_data_length(&self) -> Result<MaximumDataLength> {
        self.exec(Opcode::LeReadMaximumDataLength).await?.into()
    }

    /// `HCI_LE_Read_PHY` ([Vol 4] Part E, Section 7.8.47).
    pub async fn le_read_phy(&self, handle: ConnHandle) -> Result<PhyPreference> {
        let mut p = Packer::with_capacity(2);
        p.u16(handle.raw());
        self.exec_for_conn(Opcode::LeReadPhy, p.as_ref(), handle)
            .await?
            .into()
    }

    /// `HCI_LE_Set_Default_PHY` ([Vol 4] Part E, Section 7.8.48). `tx_phys`
    /// and `rx_phys` are raw per-PHY preference bitmasks (bit 0 = 1M, bit 1
    /// = 2M, bit 2 = Coded); `all_phys` bits 0/1 waive the tx/rx preference
    /// respectively.
    pub async fn le_set_default_phy(&self, all_phys: u8, tx_phys: u8, rx_phys: u8) -> Result<()> {
        let mut p = Packer::with_capacity(3);
        p.u8(all_phys).u8(tx_phys).u8(rx_phys);
        self.exec_params(Opcode::LeSetDefaultPhy, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Set_PHY` ([Vol 4] Part E, Section 7.8.49). Resolves on
    /// `CommandStatus`; the controller's choice arrives via the PHY Update
    /// Complete event, which is outside this crate's decoded event set
    /// (Non-goal: the narrower event surface named in §4.4).
    pub async fn le_set_phy(
        &self,
        handle: ConnHandle,
        all_phys: u8,
        tx_phys: u8,
        rx_phys: u8,
        phy_options: u16,
    ) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u16(handle.raw())
            .u8(all_phys)
            .u8(tx_phys)
            .u8(rx_phys)
            .u16(phy_options);
        self.exec_params(Opcode::LeSetPhy, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Set_Advertising_Set_Random_Address` ([Vol 4] Part E, Section
    /// 7.8.52).
    pub async fn le_set_advertising_set_random_address(&self, handle: AdvHandle, addr: RawAddr) -> Result<()> {
        let mut p = Packer::with_capacity(7);
        p.u8(handle).put(addr);
        self.exec_params(Opcode::LeSetAdvertisingSetRandomAddress, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Extended_Advertising_Parameters` ([Vol 4] Part E,
    /// Section 7.8.53).
    #[allow(clippy::too_many_arguments)]
    pub async fn le_set_extended_advertising_parameters(
        &self,
        handle: AdvHandle,
        props: AdvProp,
        pri_interval: (Duration, Duration),
        pri_chan_map: AdvChanMap,
        own_addr_type: AdvAddrType,
        peer_addr: Addr,
        filter_policy: AdvFilterPolicy,
        tx_power: Option<TxPower>,
        pri_phy: AdvPhy,
        sec_max_skip: u8,
        sec_phy: AdvPhy,
        sid: u8,
        scan_request_notify: bool,
    ) -> Result<TxPower> {
        let mut p = Packer::with_capacity(25);
        p.u8(handle)
            .u16(props.bits())
            .u24(ticks_625us(pri_interval.0).unwrap_or(0))
            .u24(ticks_625us(pri_interval.1).unwrap_or(0))
            .u8(pri_chan_map.bits())
            .u8(own_addr_type)
            .u8(peer_addr.peer_type_bit())
            .put(peer_addr.raw())
            .u8(filter_policy)
            .i8(tx_power.map_or(TxPower::NONE, TxPower::get))
            .u8(pri_phy)
            .u8(sec_max_skip)
            .u8(sec_phy)
            .u8(sid)
            .bool(scan_request_notify);
        self.exec_params(Opcode::LeSetExtendedAdvertisingParameters, p.as_ref())
            .await?
            .ok()?
            .decode(|e| TxPower::dbm(e.i8()))
    }

    /// `HCI_LE_Set_Extended_Advertising_Data` ([Vol 4] Part E, Section
    /// 7.8.54). `data` must fit within one [`EXTENDED_DATA_FRAGMENT_MAX`]
    /// fragment; the caller issues one call per fragment with `op` set
    /// accordingly for data that doesn't fit in a single fragment.
    /// `fragment_preference`, `true` lets the controller further fragment
    /// the data (written on the wire as `0`); `false` forces this call's
    /// data to be sent as-is (written as `1`).
    pub async fn le_set_extended_advertising_data(
        &self,
        handle: AdvHandle,
        op: AdvDataOp,
        fragment_preference: bool,
        data: &[u8],
    ) -> Result<()> {
        pack_fragment(Opcode::LeSetExtendedAdvertisingData, data)?;
        let mut p = Packer::with_capacity(3 + data.len());
        #[allow(clippy::cast_possible_truncation)]
        p.u8(handle)
            .u8(op)
            .u8(u8::from(!fragment_preference))
            .u8(data.len() as u8)
            .put(data);
        self.exec_params(Opcode::LeSetExtendedAdvertisingData, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Extended_Scan_Response_Data` ([Vol 4] Part E, Section
    /// 7.8.55). See [`Self::le_set_extended_advertising_data`] for
    /// `fragment_preference` and fragment-size semantics.
    pub async fn le_set_extended_scan_response_data(
        &self,
        handle: AdvHandle,
        op: AdvDataOp,
        fragment_preference: bool,
        data: &[u8],
    ) -> Result<()> {
        pack_fragment(Opcode::LeSetExtendedScanResponseData, data)?;
        let mut p = Packer::with_capacity(3 + data.len());
        #[allow(clippy::cast_possible_truncation)]
        p.u8(handle)
            .u8(op)
            .u8(u8::from(!fragment_preference))
            .u8(data.len() as u8)
            .put(data);
        self.exec_params(Opcode::LeSetExtendedScanResponseData, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Extended_Advertising_Enable` ([Vol 4] Part E, Section
    /// 7.8.56).
    pub async fn le_set_extended_advertising_enable(&self, enable: bool, cfg: &[AdvEnableParams]) -> Result<()> {
        let mut p = Packer::with_capacity(2 + cfg.len() * 4);
        #[allow(clippy::cast_possible_truncation)]
        p.bool(enable).u8(cfg.len() as u8);
        for c in cfg {
            p.u8(c.handle)
                .u16(ticks_10ms(c.duration).unwrap_or(0))
                .u8(c.max_events);
        }
        self.exec_params(Opcode::LeSetExtendedAdvertisingEnable, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Read_Maximum_Advertising_Data_Length` ([Vol 4] Part E,
    /// Section 7.8.57).
    pub async fn le_read_maximum_advertising_data_length(&self) -> Result<u16> {
        self.exec(Opcode::LeReadMaximumAdvertisingDataLength)
            .await?
            .ok()?
            .decode(|e| e.u16())
    }

    /// `HCI_LE_Read_Number_Of_Supported_Advertising_Sets` ([Vol 4] Part E,
    /// Section 7.8.58). Dynamic: may shrink as other advertising sets are
    /// configured.
    pub async fn le_read_number_of_supported_advertising_sets(&self) -> Result<u8> {
        self.exec(Opcode::LeReadNumberOfSupportedAdvertisingSets)
            .await?
            .ok()?
            .decode(|e| e.u8())
    }

    /// `HCI_LE_Remove_Advertising_Set` ([Vol 4] Part E, Section 7.8.59).
    pub async fn le_remove_advertising_set(&self, handle: AdvHandle) -> Result<()> {
        let mut p = Packer::with_capacity(1);
        p.u8(handle);
        self.exec_params(Opcode::LeRemoveAdvertisingSet, p.as_ref()).await?.into()
    }

    /// `HCI_LE_Clear_Advertising_Sets` ([Vol 4] Part E, Section 7.8.60).
    pub async fn le_clear_advertising_sets(&self) -> Result<()> {
        self.exec(Opcode::LeClearAdvertisingSets).await?.into()
    }

    /// `HCI_LE_Set_Periodic_Advertising_Parameters` ([Vol 4] Part E,
    /// Section 7.8.61).
    pub async fn le_set_periodic_advertising_parameters(
        &self,
        handle: AdvHandle,
        interval: (Duration, Duration),
        props: AdvProp,
    ) -> Result<()> {
        let mut p = Packer::with_capacity(6);
        p.u8(handle)
            .u16(ticks_1250us(interval.0).unwrap_or(0))
            .u16(ticks_1250us(interval.1).unwrap_or(0))
            .u16(props.bits());
        self.exec_params(Opcode::LeSetPeriodicAdvertisingParameters, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Periodic_Advertising_Data` ([Vol 4] Part E, Section
    /// 7.8.62). See [`Self::le_set_extended_advertising_data`] for
    /// fragment-size semantics; periodic data has no `Unchanged` operation.
    pub async fn le_set_periodic_advertising_data(&self, handle: AdvHandle, op: AdvDataOp, data: &[u8]) -> Result<()> {
        pack_fragment(Opcode::LeSetPeriodicAdvertisingData, data)?;
        let mut p = Packer::with_capacity(2 + data.len());
        #[allow(clippy::cast_possible_truncation)]
        p.u8(handle).u8(op).u8(data.len() as u8).put(data);
        self.exec_params(Opcode::LeSetPeriodicAdvertisingData, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Periodic_Advertising_Enable` ([Vol 4] Part E, Section
    /// 7.8.63).
    pub async fn le_set_periodic_advertising_enable(&self, enable: bool, include_adi: bool, handle: AdvHandle) -> Result<()> {
        let mut p = Packer::with_capacity(2);
        p.u8(u8::from(include_adi) << 1 | u8::from(enable)).u8(handle);
        self.exec_params(Opcode::LeSetPeriodicAdvertisingEnable, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Extended_Scan_Parameters` ([Vol 4] Part E, Section
    /// 7.8.64). Writes the per-PHY sub-blocks grouped — all types, then
    /// all intervals, then all windows — across the selected PHYs in
    /// ascending PHY ordinal order (1M before Coded); `phys` need not
    /// already be sorted.
    pub async fn le_set_extended_scan_parameters(
        &self,
        own_addr_type: AdvAddrType,
        filter_policy: AdvFilterPolicy,
        phys: &[ScanPhyParams],
    ) -> Result<()> {
        let mut ordered: Vec<&ScanPhyParams> = phys.iter().collect();
        ordered.sort_by_key(|p| u8::from(matches!(p.phy, AdvPhy::LeCoded)));
        let mut mask = ScanPhys::empty();
        for p in &ordered {
            mask |= match p.phy {
                AdvPhy::LeCoded => ScanPhys::LE_CODED,
                _ => ScanPhys::LE_1M,
            };
        }
        let mut p = Packer::with_capacity(3 + ordered.len() * 5);
        p.u8(own_addr_type).u8(filter_policy).u8(mask.bits());
        for s in &ordered {
            p.u8(s.scan_type);
        }
        for s in &ordered {
            p.u16(ticks_625us_u16(s.interval));
        }
        for s in &ordered {
            p.u16(ticks_625us_u16(s.window));
        }
        self.exec_params(Opcode::LeSetExtendedScanParameters, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Set_Extended_Scan_Enable` ([Vol 4] Part E, Section 7.8.65).
    /// `duration` uses 10 ms ticks, `period` uses 1.28 s ticks; both zero
    /// means scan until explicitly disabled.
    pub async fn le_set_extended_scan_enable(
        &self,
        enable: bool,
        filter_duplicates: ScanFilterDuplicates,
        duration: Duration,
        period: Duration,
    ) -> Result<()> {
        let mut p = Packer::with_capacity(6);
        p.bool(enable)
            .u8(filter_duplicates)
            .u16(ticks_10ms(duration).unwrap_or(0))
            .u16(ticks_1280ms(period).unwrap_or(0));
        self.exec_params(Opcode::LeSetExtendedScanEnable, p.as_ref())
            .await?
            .into()
    }

    /// `HCI_LE_Extended_Create_Connection` ([Vol 4] Part E, Section
    /// 7.8.66). Resolves on `CommandStatus`; the resulting connection
    /// arrives asynchronously as [`crate::hci::LeConnectionComplete`].
    /// Per-PHY blocks are written in ascending PHY ordinal order (1M, 2M,
    /// Coded), independent of `phys`'s input order.
    pub async fn le_extended_create_connection(
        &self,
        filter_policy: InitiatorFilterPolicy,
        own_addr_type: AdvAddrType,
        peer_addr: Addr,
        phys: &[ConnPhyParams],
    ) -> Result<()> {
        let mut ordered: Vec<&ConnPhyParams> = phys.iter().collect();
        ordered.sort_by_key(|p| p.phy as u8);
        let mut mask = InitiatingPhys::empty();
        for p in &ordered {
            mask |= InitiatingPhys::from(p.phy);
        }
        let mut p = Packer::with_capacity(10 + ordered.len() * 16);
        p.u8(filter_policy)
            .u8(own_addr_type)
            .u8(peer_addr.peer_type_bit())
            .put(peer_addr.raw())
            .u8(mask.bits());
        for c in &ordered {
            p.u16(ticks_625us_u16(c.scan_interval)).u16(ticks_625us_u16(c.scan_window));
            c.conn.pack(&mut p);
        }
        self.exec_params(Opcode::LeExtendedCreateConnection, p.as_ref())
            .await?
            .into()
    }
}

/// `HCI_LE_Set_Extended_Advertising_Enable` per-set parameters ([Vol 4]
/// Part E, Section 7.8.56).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AdvEnableParams {
    pub handle: AdvHandle,
    pub duration: Duration,
    pub max_events: u8,
}

impl From<AdvHandle> for AdvEnableParams {
    #[inline]
    fn from(handle: AdvHandle) -> Self {
        Self {
            handle,
            duration: Duration::default(),
            max_events: 0,
        }
    }
}
