//! LE addressing and transmit power types shared by command parameters and
//! event payloads.

use std::fmt;

/// A 48-bit Bluetooth device address, transmitted least-significant-byte
/// first ([Vol 4] Part E, Section 6.1).
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct RawAddr([u8; 6]);

impl RawAddr {
    #[inline]
    #[must_use]
    pub const fn new(b: [u8; 6]) -> Self {
        Self(b)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl From<[u8; 6]> for RawAddr {
    #[inline]
    fn from(b: [u8; 6]) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for RawAddr {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RawAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, f2] = self.0;
        write!(f, "{f2:02X}:{e:02X}:{d:02X}:{c:02X}:{b:02X}:{a:02X}")
    }
}

impl fmt::Display for RawAddr {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A device address together with the addressing scheme used to reach it
/// ([Vol 4] Part E, Sections 7.8.5, 7.8.53).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum Addr {
    Public(RawAddr),
    Random(RawAddr),
    PublicIdentity(RawAddr),
    RandomIdentity(RawAddr),
    #[default]
    Anonymous,
}

impl Addr {
    /// Builds an `Addr` from a peer address-type byte (0-3, or anonymous
    /// for any other value) and its raw bytes, as used by LE connection and
    /// advertising-report events.
    #[must_use]
    pub fn peer(addr_type: u8, raw: RawAddr) -> Self {
        match addr_type {
            0x00 => Self::Public(raw),
            0x01 => Self::Random(raw),
            0x02 => Self::PublicIdentity(raw),
            0x03 => Self::RandomIdentity(raw),
            _ => Self::Anonymous,
        }
    }

    /// Returns the raw address bytes, or the all-zero address for
    /// `Anonymous`.
    #[must_use]
    pub fn raw(self) -> RawAddr {
        match self {
            Self::Public(a) | Self::Random(a) | Self::PublicIdentity(a) | Self::RandomIdentity(a) => a,
            Self::Anonymous => RawAddr::default(),
        }
    }

    /// Returns the one-byte peer-address-type encoding used by connection
    /// and advertising-parameter commands ({Public, Random}).
    #[must_use]
    pub fn peer_type_bit(self) -> u8 {
        matches!(self, Self::Random(_) | Self::RandomIdentity(_)) as u8
    }
}

/// Advertising transmit power in dBm ([Vol 4] Part E, Section 7.8.53).
///
/// `0x7F` is reserved to mean "host has no preference"; `0x7E` is the
/// largest magnitude the controller is asked to select from when a
/// preference is expressed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct TxPower(i8);

impl TxPower {
    /// Sentinel meaning "host has no preference".
    pub const NONE: i8 = 0x7F;
    /// Largest explicit value accepted below the `NONE` sentinel.
    pub const MAX: i8 = 0x7E;

    #[inline]
    #[must_use]
    pub const fn dbm(v: i8) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> i8 {
        self.0
    }
}

impl From<TxPower> for i8 {
    #[inline]
    fn from(t: TxPower) -> Self {
        t.0
    }
}

impl From<i8> for TxPower {
    #[inline]
    fn from(v: i8) -> Self {
        Self(v)
    }
}
