//! Crate-wide error type.
//!
//! Three disjoint kinds, matching the source's error-handling design:
//! parser errors (host-side/protocol-sync problems), controller errors (a
//! non-success status byte returned by the controller), and transport
//! errors (propagated unchanged from the byte stream, always fatal to the
//! connection).

use crate::hci::{EventType, Opcode, Status};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while driving a [`crate::hci::Host`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A decoder's minimum return-parameter length was not met.
    #[error("{opcode} return parameters too short: need at least {need} bytes, got {got}")]
    InvalidPayloadSize {
        opcode: Opcode,
        need: usize,
        got: usize,
    },

    /// A caller-supplied variable-length field (advertising data, scan
    /// response data) exceeds what the command's fixed-size wire field can
    /// hold. Caught locally rather than left for the controller to reject,
    /// since there is no completion event to carry the failure.
    #[error("{opcode} parameter too large: max {max} bytes, got {got}")]
    ParamsTooLarge {
        opcode: Opcode,
        max: usize,
        got: usize,
    },

    /// A command was submitted while another command's completion was
    /// still outstanding.
    #[error("a command is already pending")]
    Busy,

    /// A command's completion did not arrive within the configured
    /// timeout. The transport is left in an undefined state; recovery is
    /// by `Reset`.
    #[error("command timed out")]
    Timeout,

    /// The pending command was cancelled (e.g. the caller's future was
    /// dropped) before it completed.
    #[error("command was cancelled")]
    Cancelled,

    /// An event packet's header was malformed (declared length did not
    /// match the bytes actually present).
    #[error("malformed event packet: {0:?}")]
    InvalidEvent(Vec<u8>),

    /// An event or LE sub-event code is not one this crate recognizes.
    #[error("unknown event (code={code:#04x}, subevent={subevent:#04x})")]
    UnknownEvent {
        code: u8,
        subevent: u8,
        params: Vec<u8>,
    },

    /// [`crate::hci::event::Event::ok`] was called on an event that is not
    /// `CommandComplete`/`CommandStatus`.
    #[error("{typ} is not a command completion event")]
    NonCommandEvent { typ: EventType },

    /// The controller returned a command completion with a non-`Success`
    /// status.
    #[error("{opcode} failed: {status}")]
    CommandFailed { opcode: Opcode, status: Status },

    /// The underlying transport returned an I/O error. All pending state
    /// is abandoned; a new `Host` must be constructed to recover.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),
}

impl From<Status> for Error {
    /// Converts a non-success status into a [`Error::CommandFailed`] with
    /// [`Opcode::None`]. Prefer constructing `CommandFailed` directly when
    /// the opcode is known.
    #[inline]
    fn from(status: Status) -> Self {
        Self::CommandFailed {
            opcode: Opcode::None,
            status,
        }
    }
}
