//! HCI opcodes, event codes, status codes, and bitfield parameter types
//! ([Vol 4] Part E, Sections 5 and 7).

#![allow(clippy::use_self)]

use bitflags::bitflags;

use OpcodeGroup::{HciControl, InfoParams, Le, StatusParams};

/// HCI command header size: 2-byte opcode + 1-byte parameter length
/// ([Vol 4] Part E, Section 5.4.1).
pub(crate) const CMD_HDR: usize = 3;
pub(crate) const CMD_BUF: usize = CMD_HDR + u8::MAX as usize;

/// HCI ACL data header size: 2-byte handle+flags + 2-byte data length
/// ([Vol 4] Part E, Section 5.4.2).
pub(crate) const ACL_HDR: usize = 4;

/// HCI event header size: 1-byte event code + 1-byte parameter length
/// ([Vol 4] Part E, Section 5.4.4).
pub(crate) const EVT_HDR: usize = 2;
pub(crate) const EVT_BUF: usize = EVT_HDR + u8::MAX as usize;

/// Packet-type indicator prefixing every packet on the shared byte stream
/// ([Vol 4] Part E, Section 5.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum PacketType {
    Command = 0x01,
    Acl = 0x02,
    Event = 0x04,
}

/// HCI command opcodes ([Vol 4] Part E, Section 7).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    num_enum::FromPrimitive,
    num_enum::IntoPrimitive,
    strum::Display,
)]
#[non_exhaustive]
#[repr(u16)]
pub enum Opcode {
    /// Opcode 0x0000 is used only to update `Num_HCI_Command_Packets`
    /// ([Vol 4] Part E, Section 7.7.14) and never appears as a real command.
    #[default]
    #[num_enum(default)]
    None = 0x0000,

    // HCI Control and Baseband commands ([Vol 4] Part E, Section 7.3)
    SetEventMask = HciControl.ocf(0x0001),
    Reset = HciControl.ocf(0x0003),
    SetControllerToHostFlowControl = HciControl.ocf(0x0031),
    HostBufferSize = HciControl.ocf(0x0033),
    SetEventMaskPage2 = HciControl.ocf(0x0063),
    WriteLeHostSupport = HciControl.ocf(0x006D),

    // Informational parameters commands ([Vol 4] Part E, Section 7.4)
    ReadLocalVersionInformation = InfoParams.ocf(0x0001),
    ReadLocalSupportedCommands = InfoParams.ocf(0x0002),
    ReadLocalSupportedFeatures = InfoParams.ocf(0x0003),
    ReadBufferSize = InfoParams.ocf(0x0005),
    ReadBdAddr = InfoParams.ocf(0x0009),

    // Status parameters commands ([Vol 4] Part E, Section 7.5)
    ReadRssi = StatusParams.ocf(0x0005),

    // LE Controller commands ([Vol 4] Part E, Section 7.8)
    LeSetEventMask = Le.ocf(0x0001),
    LeReadBufferSize = Le.ocf(0x0002),
    LeReadLocalSupportedFeatures = Le.ocf(0x0003),
    LeSetRandomAddress = Le.ocf(0x0005),
    LeSetAdvertisingParameters = Le.ocf(0x0006),
    LeReadAdvertisingPhysicalChannelTxPower = Le.ocf(0x0007),
    LeSetAdvertisingData = Le.ocf(0x0008),
    LeSetScanResponseData = Le.ocf(0x0009),
    LeSetAdvertisingEnable = Le.ocf(0x000A),
    LeSetScanParameters = Le.ocf(0x000B),
    LeSetScanEnable = Le.ocf(0x000C),
    LeCreateConnection = Le.ocf(0x000D),
    LeCreateConnectionCancel = Le.ocf(0x000E),
    LeReadFilterAcceptListSize = Le.ocf(0x000F),
    LeClearFilterAcceptList = Le.ocf(0x0010),
    LeAddDeviceToFilterAcceptList = Le.ocf(0x0011),
    LeRemoveDeviceFromFilterAcceptList = Le.ocf(0x0012),
    LeConnectionUpdate = Le.ocf(0x0013),
    LeSetHostChannelClassification = Le.ocf(0x0014),
    LeReadChannelMap = Le.ocf(0x0015),
    LeReadRemoteFeatures = Le.ocf(0x0016),
    LeEnableEncryption = Le.ocf(0x0019),
    LeLongTermKeyRequestReply = Le.ocf(0x001A),
    LeLongTermKeyRequestNegativeReply = Le.ocf(0x001B),
    LeReadSupportedStates = Le.ocf(0x001C),
    LeSetDataLength = Le.ocf(0x0022),
    LeReadSuggestedDefaultDataLength = Le.ocf(0x0023),
    LeWriteSuggestedDefaultDataLength = Le.ocf(0x0024),
    LeAddDeviceToResolvingList = Le.ocf(0x0027),
    LeRemoveDeviceFromResolvingList = Le.ocf(0x0028),
    LeClearResolvingList = Le.ocf(0x0029),
    LeReadResolvingListSize = Le.ocf(0x002A),
    LeSetAddressResolutionEnable = Le.ocf(0x002D),
    LeSetResolvablePrivateAddressTimeout = Le.ocf(0x002E),
    LeReadMaximumDataLength = Le.ocf(0x002F),
    LeReadPhy = Le.ocf(0x0030),
    LeSetDefaultPhy = Le.ocf(0x0031),
    LeSetPhy = Le.ocf(0x0032),
    LeSetAdvertisingSetRandomAddress = Le.ocf(0x0035),
    LeSetExtendedAdvertisingParameters = Le.ocf(0x0036),
    LeSetExtendedAdvertisingData = Le.ocf(0x0037),
    LeSetExtendedScanResponseData = Le.ocf(0x0038),
    LeSetExtendedAdvertisingEnable = Le.ocf(0x0039),
    LeReadMaximumAdvertisingDataLength = Le.ocf(0x003A),
    LeReadNumberOfSupportedAdvertisingSets = Le.ocf(0x003B),
    LeRemoveAdvertisingSet = Le.ocf(0x003C),
    LeClearAdvertisingSets = Le.ocf(0x003D),
    LeSetPeriodicAdvertisingParameters = Le.ocf(0x003E),
    LeSetPeriodicAdvertisingData = Le.ocf(0x003F),
    LeSetPeriodicAdvertisingEnable = Le.ocf(0x0040),
    LeSetExtendedScanParameters = Le.ocf(0x0041),
    LeSetExtendedScanEnable = Le.ocf(0x0042),
    LeExtendedCreateConnection = Le.ocf(0x0043),
    LeReadBufferSizeV2 = Le.ocf(0x0060),
}

impl Opcode {
    #[inline(always)]
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// Opcode group field definitions ([Vol 4] Part E, Section 5.4.1).
#[derive(Clone, Copy)]
#[repr(u16)]
enum OpcodeGroup {
    _LinkControl = 0x01,
    HciControl = 0x03,
    InfoParams = 0x04,
    StatusParams = 0x05,
    Le = 0x08,
}

impl OpcodeGroup {
    /// Combines OGF with OCF to create a full opcode: `(ogf << 10) | ocf`.
    #[inline]
    const fn ocf(self, ocf: u16) -> u16 {
        (self as u16) << 10 | ocf
    }
}

/// HCI event codes ([Vol 4] Part E, Section 7.7).
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::TryFromPrimitive, strum::Display, strum::EnumIter,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum EventCode {
    DisconnectionComplete = 0x05,
    EncryptionChange = 0x08,
    ReadRemoteVersionInformationComplete = 0x0C,
    CommandComplete = 0x0E,
    CommandStatus = 0x0F,
    HardwareError = 0x10,
    NumberOfCompletedPackets = 0x13,
    EncryptionKeyRefreshComplete = 0x30,
    LeMeta = 0x3E,
    Vendor = 0xFF,
}

impl EventCode {
    /// Returns whether the event code is either `CommandComplete` or
    /// `CommandStatus`.
    #[inline]
    #[must_use]
    pub const fn is_cmd(self) -> bool {
        matches!(self, Self::CommandComplete | Self::CommandStatus)
    }

    /// Returns the format of the associated event parameters.
    #[must_use]
    pub(crate) const fn param_fmt(self) -> EventFmt {
        use EventFmt as F;
        match self {
            Self::DisconnectionComplete => F::STATUS.union(F::CONN_HANDLE),
            Self::EncryptionChange => F::STATUS.union(F::CONN_HANDLE),
            Self::ReadRemoteVersionInformationComplete => F::STATUS.union(F::CONN_HANDLE),
            Self::CommandComplete | Self::CommandStatus => F::STATUS,
            Self::HardwareError => F::empty(),
            Self::NumberOfCompletedPackets => F::empty(),
            Self::EncryptionKeyRefreshComplete => F::STATUS.union(F::CONN_HANDLE),
            Self::LeMeta => F::empty(),
            Self::Vendor => F::empty(),
        }
    }
}

/// LE meta sub-event codes, carried as the first byte of `HCI_LE_Meta`
/// event parameters ([Vol 4] Part E, Section 7.7.65).
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::TryFromPrimitive, strum::Display, strum::EnumIter,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum SubeventCode {
    ConnectionComplete = 0x01,
    AdvertisingReport = 0x02,
    ConnectionUpdateComplete = 0x03,
    ReadRemoteFeaturesComplete = 0x04,
    LongTermKeyRequest = 0x05,
    EnhancedConnectionComplete = 0x0A,
    ExtendedAdvertisingReport = 0x0D,
    ChannelSelectionAlgorithm = 0x14,
}

impl SubeventCode {
    /// Returns the format of the associated sub-event parameters.
    #[must_use]
    pub(crate) const fn param_fmt(self) -> EventFmt {
        use EventFmt as F;
        match self {
            Self::ConnectionComplete | Self::EnhancedConnectionComplete => {
                F::STATUS.union(F::CONN_HANDLE)
            }
            Self::AdvertisingReport => F::empty(),
            Self::ConnectionUpdateComplete => F::STATUS.union(F::CONN_HANDLE),
            Self::ReadRemoteFeaturesComplete => F::STATUS.union(F::CONN_HANDLE),
            Self::LongTermKeyRequest => F::CONN_HANDLE,
            Self::ExtendedAdvertisingReport => F::empty(),
            Self::ChannelSelectionAlgorithm => F::CONN_HANDLE,
        }
    }
}

bitflags! {
    /// Event parameter format, used to know which leading fields a raw
    /// event payload starts with before the event-specific parameters.
    #[derive(Default)]
    pub(crate) struct EventFmt: u8 {
        /// Event contains a status parameter.
        const STATUS = 1 << 0;
        /// Event contains a connection handle.
        const CONN_HANDLE = 1 << 1;
    }
}

/// HCI command/event status codes ([Vol 1] Part F, Section 1.3; [Vol 2]
/// Part D).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::FromPrimitive, strum::Display)]
#[non_exhaustive]
#[repr(u8)]
pub enum Status {
    #[default]
    Success = 0x00,
    UnknownCommand = 0x01,
    UnknownConnectionIdentifier = 0x02,
    HardwareFailure = 0x03,
    PageTimeout = 0x04,
    AuthenticationFailure = 0x05,
    PinOrKeyMissing = 0x06,
    MemoryCapacityExceeded = 0x07,
    ConnectionTimeout = 0x08,
    ConnectionLimitExceeded = 0x09,
    ConnectionAlreadyExists = 0x0B,
    CommandDisallowed = 0x0C,
    ConnectionRejectedDueToLimitedResources = 0x0D,
    ConnectionRejectedDueToSecurityReasons = 0x0E,
    ConnectionRejectedDueToUnacceptableBdAddr = 0x0F,
    ConnectionAcceptTimeoutExceeded = 0x10,
    UnsupportedFeatureOrParameterValue = 0x11,
    InvalidCommandParameters = 0x12,
    RemoteUserTerminatedConnection = 0x13,
    RemoteDeviceTerminatedConnectionDueToLowResources = 0x14,
    RemoteDeviceTerminatedConnectionDueToPowerOff = 0x15,
    ConnectionTerminatedByLocalHost = 0x16,
    RepeatedAttempts = 0x17,
    PairingNotAllowed = 0x18,
    UnsupportedRemoteFeature = 0x1A,
    InvalidLmpLlParameters = 0x1E,
    #[num_enum(default)] // [Vol 4] Part E, Section 1.2
    UnspecifiedError = 0x1F,
    UnsupportedLmpLlParameterValue = 0x20,
    InstantPassed = 0x28,
    DifferentTransactionCollision = 0x2A,
    InsufficientSecurity = 0x2F,
    ParameterOutOfMandatoryRange = 0x30,
    HostBusyPairing = 0x38,
    ControllerBusy = 0x3A,
    UnacceptableConnectionParameters = 0x3B,
    AdvertisingTimeout = 0x3C,
    ConnectionTerminatedDueToMicFailure = 0x3D,
    ConnectionFailedToBeEstablished = 0x3E,
    UnknownAdvertisingIdentifier = 0x42,
    LimitReached = 0x43,
    OperationCancelledByHost = 0x44,
}

impl Status {
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::error::Error for Status {}

/// Device connection role ([Vol 4] Part E, Sections 7.7.65.1 and 7.7.65.10).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::TryFromPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum Role {
    #[default]
    Central = 0x00,
    Peripheral = 0x01,
}

/// Bluetooth Core Specification versions ([Assigned Numbers] Section 2.1).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    num_enum::FromPrimitive,
    num_enum::IntoPrimitive,
    strum::Display,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum CoreVersion {
    V4_0 = 0x06,
    V4_1 = 0x07,
    V4_2 = 0x08,
    V5_0 = 0x09,
    V5_1 = 0x0A,
    V5_2 = 0x0B,
    V5_3 = 0x0C,
    V5_4 = 0x0D,
    #[default]
    #[num_enum(default)]
    Unknown = 0xFF,
}

bitflags! {
    /// Basic properties of an advertising event ([Vol 4] Part E, Section
    /// 7.8.53).
    #[derive(Default)]
    pub struct AdvProp: u16 {
        const CONNECTABLE = 1 << 0;
        const SCANNABLE = 1 << 1;
        const DIRECTED = 1 << 2;
        const HIGH_DUTY_CYCLE = 1 << 3;
        const LEGACY = 1 << 4;
        const ANONYMOUS = 1 << 5;
        const INCLUDE_TX_POWER = 1 << 6;
    }
}

bitflags! {
    /// Channels used for transmitting advertising packets ([Vol 4] Part E,
    /// Section 7.8.53).
    pub struct AdvChanMap: u8 {
        const CH37 = 1 << 0;
        const CH38 = 1 << 1;
        const CH39 = 1 << 2;
    }
}

impl Default for AdvChanMap {
    #[inline]
    fn default() -> Self {
        Self::all()
    }
}

/// Controller-generated-address behavior for an advertising set ([Vol 4]
/// Part E, Section 7.8.53).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum AdvAddrType {
    #[default]
    Public = 0x00,
    Random = 0x01,
    PrivateOrPublic = 0x02,
    PrivateOrRandom = 0x03,
}

/// Filter policy for scan and connection requests ([Vol 4] Part E, Section
/// 7.8.53).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum AdvFilterPolicy {
    #[default]
    None = 0x00,
    FilterScan = 0x01,
    FilterConnect = 0x02,
    FilterAll = 0x03,
}

/// Physical layer mode ([Vol 4] Part E, Section 7.8.53).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::IntoPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum AdvPhy {
    #[default]
    Le1M = 0x01,
    Le2M = 0x02,
    LeCoded = 0x03,
}

/// PHY selector used by scanning commands, one bit per PHY ([Vol 4] Part E,
/// Section 7.8.64).
bitflags! {
    pub struct ScanPhys: u8 {
        const LE_1M = 1 << 0;
        const LE_CODED = 1 << 2;
    }
}

/// Interpretation of fragmented advertising/scan-response/periodic data
/// ([Vol 4] Part E, Section 7.8.54).
#[derive(Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum AdvDataOp {
    /// Intermediate fragment of fragmented extended advertising data.
    Cont = 0x00,
    /// First fragment of fragmented extended advertising data.
    First = 0x01,
    /// Last fragment of fragmented extended advertising data.
    Last = 0x02,
    /// Complete extended advertising data.
    Complete = 0x03,
    /// Unchanged data (just update the Advertising DID).
    Unchanged = 0x04,
}

/// Advertising type for legacy `LE_Set_Advertising_Parameters` ([Vol 4]
/// Part E, Section 7.8.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum LegacyAdvType {
    Undirected = 0x00,
    DirectedHighDuty = 0x01,
    Scannable = 0x02,
    NonConnectable = 0x03,
    DirectedLowDuty = 0x04,
}

/// LE scan type ([Vol 4] Part E, Section 7.8.10).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum ScanType {
    #[default]
    Passive = 0x00,
    Active = 0x01,
}

/// Duplicate-filtering behavior for scanning ([Vol 4] Part E, Sections
/// 7.8.10, 7.8.11, 7.8.64).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum ScanFilterDuplicates {
    #[default]
    Disabled = 0x00,
    Enabled = 0x01,
    ResetEachPeriod = 0x02,
}
