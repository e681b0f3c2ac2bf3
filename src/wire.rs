//! Little-endian packed-buffer reader/writer used by every command encoder
//! and event decoder in [`crate::hci`].
//!
//! Burble's `hci` module builds its command payloads and event parameters
//! through `structbuf::Packer`/`structbuf::Unpacker`, chaining calls like
//! `cmd.u8(h).u16(x).put(bytes)`. This module provides the same chainable
//! surface backed by [`bytes::BytesMut`]/[`bytes::Bytes`] so the rest of the
//! crate reads identically to the source it is grounded on without pulling
//! in a dependency this crate can't independently verify.

use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Builds a command or event payload one field at a time, in wire order.
#[derive(Debug, Default)]
pub struct Packer(BytesMut);

impl Packer {
    /// Creates an empty packer with room for `cap` bytes.
    #[inline]
    #[must_use]
    pub fn with_capacity(cap: usize) -> Self {
        Self(BytesMut::with_capacity(cap))
    }

    /// Appends an unsigned byte.
    #[inline]
    pub fn u8(&mut self, v: impl Into<u8>) -> &mut Self {
        self.0.put_u8(v.into());
        self
    }

    /// Appends a signed byte.
    #[inline]
    pub fn i8(&mut self, v: i8) -> &mut Self {
        self.0.put_i8(v);
        self
    }

    /// Appends a little-endian `u16`.
    #[inline]
    pub fn u16(&mut self, v: impl Into<u16>) -> &mut Self {
        self.0.put_u16_le(v.into());
        self
    }

    /// Appends the low 24 bits of `v`, little-endian.
    #[inline]
    pub fn u24(&mut self, v: u32) -> &mut Self {
        let b = v.to_le_bytes();
        self.0.extend_from_slice(&b[..3]);
        self
    }

    /// Appends a little-endian `u64`.
    #[inline]
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.0.put_u64_le(v);
        self
    }

    /// Appends a little-endian `u128` (used for 16-byte keys).
    #[inline]
    pub fn u128(&mut self, v: impl Into<u128>) -> &mut Self {
        self.0.put_u128_le(v.into());
        self
    }

    /// Appends a single boolean byte (`0x00`/`0x01`).
    #[inline]
    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.0.put_u8(u8::from(v));
        self
    }

    /// Appends raw bytes verbatim (addresses, advertising data, keys).
    #[inline]
    pub fn put(&mut self, v: impl AsRef<[u8]>) -> &mut Self {
        self.0.extend_from_slice(v.as_ref());
        self
    }

    /// Number of bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the packer, returning the finished payload.
    #[inline]
    #[must_use]
    pub fn freeze(self) -> Bytes {
        self.0.freeze()
    }
}

impl AsRef<[u8]> for Packer {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reads fields out of a received payload in wire order. Every decoder in
/// `crate::hci::event` is built on top of this cursor.
///
/// A read that runs past the end of the buffer is padded with zero bytes
/// rather than panicking — events are decoded inside the background reader
/// task, where there is no caller to unwind to — but the shortfall is
/// accumulated in `deficit` so callers can still reject the decode per the
/// wire codec's "never silently tolerated" rule (see
/// [`super::hci::Event::ok`]'s blanket `From<Event> for Result<R>`).
#[derive(Clone, Debug, Default)]
pub struct Unpacker {
    buf: Bytes,
    deficit: usize,
}

impl Unpacker {
    #[inline]
    #[must_use]
    pub fn new(b: impl Into<Bytes>) -> Self {
        Self {
            buf: b.into(),
            deficit: 0,
        }
    }

    /// Splits off and returns the next `n` bytes as their own cursor,
    /// advancing past them.
    #[inline]
    #[must_use]
    pub fn skip(&mut self, n: usize) -> Option<Self> {
        if self.buf.len() < n {
            return None;
        }
        Some(Self {
            buf: self.buf.split_to(n),
            deficit: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn u8(&mut self) -> u8 {
        if self.buf.is_empty() {
            self.deficit += 1;
            return 0;
        }
        self.buf.get_u8()
    }

    #[inline]
    #[must_use]
    pub fn i8(&mut self) -> i8 {
        self.u8() as i8
    }

    #[inline]
    #[must_use]
    pub fn u16(&mut self) -> u16 {
        if self.buf.len() < 2 {
            self.deficit += 2 - self.buf.len();
            self.buf.advance(self.buf.len());
            return 0;
        }
        self.buf.get_u16_le()
    }

    /// Reads 3 little-endian bytes as a `u32`.
    #[inline]
    #[must_use]
    pub fn u24(&mut self) -> u32 {
        if self.buf.len() < 3 {
            self.deficit += 3 - self.buf.len();
            self.buf.advance(self.buf.len());
            return 0;
        }
        let mut b = [0u8; 4];
        b[..3].copy_from_slice(&self.buf[..3]);
        self.buf.advance(3);
        u32::from_le_bytes(b)
    }

    #[inline]
    #[must_use]
    pub fn u64(&mut self) -> u64 {
        if self.buf.len() < 8 {
            self.deficit += 8 - self.buf.len();
            self.buf.advance(self.buf.len());
            return 0;
        }
        self.buf.get_u64_le()
    }

    #[inline]
    #[must_use]
    pub fn u128(&mut self) -> u128 {
        if self.buf.len() < 16 {
            self.deficit += 16 - self.buf.len();
            self.buf.advance(self.buf.len());
            return 0;
        }
        self.buf.get_u128_le()
    }

    #[inline]
    #[must_use]
    pub fn bool(&mut self) -> bool {
        self.u8() != 0
    }

    /// Reads a fixed-size array, e.g. a 6-byte device address.
    #[must_use]
    pub fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        let n = N.min(self.buf.len());
        out[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        self.deficit += N - n;
        out
    }

    /// Consumes and returns the rest of the buffer.
    #[must_use]
    pub fn rest(&mut self) -> Bytes {
        self.buf.split_to(self.buf.len())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total bytes short across every read so far that ran past the end of
    /// the buffer. Non-zero means the decode above this cursor must not be
    /// trusted.
    #[inline]
    #[must_use]
    pub(crate) fn deficit(&self) -> usize {
        self.deficit
    }
}

impl AsRef<[u8]> for Unpacker {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

/// Converts a duration in 0.625 ms ticks (primary advertising and legacy
/// scan intervals) to `ms`. `round(ms / 0.625)`, clamped to the supplied
/// field width is the caller's responsibility via the `u16`/`u24` packer
/// calls.
#[must_use]
pub fn ticks_625us(d: Duration) -> Option<u32> {
    to_ticks(d, 625)
}

/// Converts a duration to 1.25 ms ticks (connection interval fields).
#[must_use]
pub fn ticks_1250us(d: Duration) -> Option<u16> {
    to_ticks(d, 1250).map(|v| v as u16)
}

/// Converts a duration to 10 ms ticks (supervision timeout, extended
/// advertising duration).
#[must_use]
pub fn ticks_10ms(d: Duration) -> Option<u16> {
    to_ticks(d, 10_000).map(|v| v as u16)
}

/// Converts a duration to 1.28 s ticks (extended scan period).
#[must_use]
pub fn ticks_1280ms(d: Duration) -> Option<u16> {
    to_ticks(d, 1_280_000).map(|v| v as u16)
}

fn to_ticks(d: Duration, unit_us: u64) -> Option<u32> {
    let us = u64::try_from(d.as_micros()).ok()?;
    let ticks = (us + unit_us / 2) / unit_us;
    u32::try_from(ticks).ok()
}

/// Like [`ticks_625us`], truncated to the 2-byte field width used by legacy
/// advertising/scan interval and window parameters (only the extended
/// advertising parameters' primary-interval fields are 3 bytes wide).
#[must_use]
pub fn ticks_625us_u16(d: Duration) -> u16 {
    ticks_625us(d)
        .and_then(|t| u16::try_from(t).ok())
        .unwrap_or(u16::MAX)
}

/// Converts 0.625 ms ticks back to a [`Duration`].
#[must_use]
pub fn duration_625us(ticks: u16) -> Duration {
    Duration::from_micros(u64::from(ticks) * 625)
}

/// Converts 1.25 ms ticks back to a [`Duration`].
#[must_use]
pub fn duration_1250us(ticks: u16) -> Duration {
    Duration::from_micros(u64::from(ticks) * 1250)
}

/// Converts 10 ms ticks back to a [`Duration`].
#[must_use]
pub fn duration_10ms(ticks: u16) -> Duration {
    Duration::from_millis(u64::from(ticks) * 10)
}

/// Converts 1.28 s ticks back to a [`Duration`].
#[must_use]
pub fn duration_1280ms(ticks: u16) -> Duration {
    Duration::from_millis(u64::from(ticks) * 1280)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_fields() {
        let mut p = Packer::with_capacity(16);
        p.u8(0x12_u8).u16(0x3456_u16).u24(0x0102_03).u64(1).bool(true);
        let mut u = Unpacker::new(p.freeze());
        assert_eq!(u.u8(), 0x12);
        assert_eq!(u.u16(), 0x3456);
        assert_eq!(u.u24(), 0x0102_03);
        assert_eq!(u.u64(), 1);
        assert!(u.bool());
        assert!(u.is_empty());
    }

    #[test]
    fn ms_to_ticks_625us_round_trips_bounds() {
        for ms in [20_u64, 10_240] {
            let ticks = ticks_625us(Duration::from_millis(ms)).unwrap();
            let back = duration_625us(u16::try_from(ticks).unwrap());
            assert_eq!(back.as_millis() as u64, ms);
        }
    }
}
