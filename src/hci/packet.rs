//! Packet framer (C2): prepends/strips the packet-type indicator and the
//! per-type header ([Vol 4] Part E, Sections 5.4.1, 5.4.2, 5.4.4).
//!
//! HCI has no framing mark of its own — the declared length in each header
//! is the only thing separating one packet from the next on the shared byte
//! stream. A declared length that outruns what the stream actually has is
//! unrecoverable desync; the conservative policy (and this crate's) is to
//! close the transport and report [`crate::Error::Transport`].

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::hci::consts::{ACL_HDR, CMD_HDR, EVT_HDR};
use crate::hci::Opcode;
use crate::{Error, Result};

/// A framed packet read from the transport, tagged by its packet-type byte.
#[derive(Debug)]
pub enum Frame {
    /// Event packet payload (parameters only, header stripped).
    Event(Bytes),
    /// ACL packet: `(handle_and_flags, data)`.
    Acl(u16, Bytes),
}

/// Encodes a command packet: `0x01 | opcode(LE16) | len(u8) | payload`.
pub(crate) fn encode_command(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= u8::MAX as usize, "command payload too long");
    let mut buf = Vec::with_capacity(1 + CMD_HDR + payload.len());
    buf.push(0x01);
    buf.extend_from_slice(&u16::from(opcode).to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    buf.push(payload.len() as u8);
    buf.extend_from_slice(payload);
    buf
}

/// Encodes an ACL data packet: `0x02 | handle+flags(LE16) | len(LE16) | data`.
pub(crate) fn encode_acl(handle_and_flags: u16, data: &[u8]) -> Vec<u8> {
    debug_assert!(data.len() <= u16::MAX as usize, "ACL payload too long");
    let mut buf = Vec::with_capacity(1 + ACL_HDR + data.len());
    buf.push(0x02);
    buf.extend_from_slice(&handle_and_flags.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
    buf.extend_from_slice(data);
    buf
}

/// Reads the next complete frame from `r`. Buffers until a full header and
/// its declared payload length have arrived; an EOF mid-frame or an
/// unrecognized packet-type tag is reported as [`Error::Transport`], since
/// there is no way to resynchronize the stream.
pub(crate) async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> Result<Frame> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag).await.map_err(Error::Transport)?;
    match tag[0] {
        0x04 => {
            let mut hdr = [0u8; EVT_HDR];
            r.read_exact(&mut hdr).await.map_err(Error::Transport)?;
            let len = usize::from(hdr[1]);
            let mut payload = vec![0u8; EVT_HDR + len];
            payload[..EVT_HDR].copy_from_slice(&hdr);
            r.read_exact(&mut payload[EVT_HDR..])
                .await
                .map_err(Error::Transport)?;
            Ok(Frame::Event(Bytes::from(payload)))
        }
        0x02 => {
            let mut hdr = [0u8; ACL_HDR];
            r.read_exact(&mut hdr).await.map_err(Error::Transport)?;
            let handle = u16::from_le_bytes([hdr[0], hdr[1]]);
            let len = usize::from(u16::from_le_bytes([hdr[2], hdr[3]]));
            let mut data = vec![0u8; len];
            r.read_exact(&mut data).await.map_err(Error::Transport)?;
            Ok(Frame::Acl(handle, Bytes::from(data)))
        }
        other => {
            // No framing mark exists to resynchronize on; treat an
            // unrecognized tag the same as a transport failure.
            Err(Error::Transport(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unrecognized HCI packet-type tag {other:#04x}"),
            )))
        }
    }
}

/// Writes a complete framed packet (already including its leading
/// packet-type byte) to `w`.
pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(w: &mut W, frame: &[u8]) -> Result<()> {
    w.write_all(frame).await.map_err(Error::Transport)?;
    w.flush().await.map_err(Error::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_event_frame() {
        let wire = [0x04, 0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00];
        let mut cursor: &[u8] = &wire;
        let frame = read_frame(&mut cursor).await.unwrap();
        match frame {
            Frame::Event(b) => assert_eq!(&b[..], &wire[1..]),
            Frame::Acl(..) => panic!("expected event frame"),
        }
    }

    #[tokio::test]
    async fn short_stream_is_a_transport_error() {
        let wire = [0x04, 0x0E, 0x04, 0x01]; // declares 4 bytes, only has 1
        let mut cursor: &[u8] = &wire;
        assert!(read_frame(&mut cursor).await.is_err());
    }
}
