//! HCI event decoding and routing (C4): classifies incoming event packets,
//! parses known events, and fans asynchronous notifications out to
//! subscribers ([Vol 4] Part E, Section 7.7).

use tokio::sync::broadcast;
use tracing::trace;

pub use hci::*;
pub use le::*;

use crate::hci::consts::{EventCode, EventFmt, SubeventCode};
use crate::hci::conn::ConnHandle;
use crate::hci::{Opcode, Status};
use crate::wire::Unpacker;
use crate::{Error, Result};

mod hci;
mod le;

#[cfg(test)]
mod tests;

/// HCI event code or LE meta sub-event code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum EventType {
    Hci(EventCode),
    Le(SubeventCode),
}

impl EventType {
    /// Returns whether the event type is `CommandComplete` or
    /// `CommandStatus`.
    #[inline]
    #[must_use]
    pub const fn is_cmd(self) -> bool {
        matches!(self, Self::Hci(EventCode::CommandComplete | EventCode::CommandStatus))
    }

    #[must_use]
    pub(crate) const fn param_fmt(self) -> EventFmt {
        match self {
            Self::Hci(c) => c.param_fmt(),
            Self::Le(c) => c.param_fmt(),
        }
    }
}

impl Default for EventType {
    #[inline]
    fn default() -> Self {
        Self::Hci(EventCode::Vendor)
    }
}

/// A decoded HCI event: fixed leading fields already parsed, event-specific
/// parameters available for further decoding through [`Unpacker`]'s methods
/// via `Deref`/`DerefMut`.
///
/// Unlike the zero-copy borrow burble's `Event<'a>` takes over a reused USB
/// transfer buffer, this type owns its payload (a cheaply-`Clone`able
/// [`bytes::Bytes`]) so it can cross the channel between the background
/// reader task and a waiting caller without `unsafe`.
#[derive(Clone, Debug, Default)]
pub struct Event {
    typ: EventType,
    status: Status,
    cmd_quota: u8,
    opcode: Opcode,
    handle: u16,
    params: Unpacker,
}

impl Event {
    #[inline]
    #[must_use]
    pub const fn typ(&self) -> EventType {
        self.typ
    }

    /// Returns the event status, or [`Status::Success`] for events without
    /// a status parameter.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the opcode from `CommandComplete`/`CommandStatus` events, or
    /// [`Opcode::None`] for any other event.
    #[inline]
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// `Num_HCI_Command_Packets` credit carried by `CommandComplete`/
    /// `CommandStatus` ([Vol 4] Part E, Section 7.7.14). Informational only
    /// in this crate: we never pipeline more than one outstanding command.
    #[inline]
    #[must_use]
    pub const fn cmd_quota(&self) -> u8 {
        self.cmd_quota
    }

    /// Returns the associated connection handle, or `None` for events that
    /// don't carry one.
    #[inline]
    #[must_use]
    pub fn conn_handle(&self) -> Option<ConnHandle> {
        self.typ
            .param_fmt()
            .contains(EventFmt::CONN_HANDLE)
            .then(|| ConnHandle::new(self.handle))
            .flatten()
    }

    /// Reads the next 6 bytes as a device address.
    #[inline]
    pub fn addr(&mut self) -> crate::le::RawAddr {
        crate::le::RawAddr::new(self.params.array())
    }

    /// Validates that this event is a successful command completion and
    /// returns a fresh handle to its (still undecoded) parameters.
    pub fn ok(&self) -> Result<Self> {
        if !self.typ.is_cmd() {
            return Err(Error::NonCommandEvent { typ: self.typ });
        }
        if !self.status.is_ok() {
            return Err(Error::CommandFailed {
                opcode: self.opcode,
                status: self.status,
            });
        }
        Ok(self.clone())
    }

    /// Reads a single scalar return value out of an already-[`ok`](Self::ok)
    /// completion, rejecting a short return-parameter payload as
    /// [`Error::InvalidPayloadSize`] instead of silently handing back a
    /// zero-filled value. This mirrors the deficit check the blanket
    /// `From<Event> for Result<R>` conversion performs for multi-field
    /// decoders, for the handful of commands whose return value is read
    /// inline rather than through a dedicated `From<&mut Event>` impl.
    pub(crate) fn decode<R>(mut self, f: impl FnOnce(&mut Self) -> R) -> Result<R> {
        let got = self.params.len();
        let r = f(&mut self);
        let deficit = self.params.deficit();
        if deficit > 0 {
            return Err(Error::InvalidPayloadSize {
                opcode: self.opcode,
                need: got + deficit,
                got,
            });
        }
        Ok(r)
    }

    /// Parses the event header (and, for `CommandComplete`/`CommandStatus`,
    /// the header-adjacent status/opcode fields) out of a framed event
    /// payload (`code, len, params...`).
    pub(crate) fn parse(orig: bytes::Bytes) -> Result<Self> {
        let mut evt = Unpacker::new(orig.clone());
        let Some(mut hdr) = evt.skip(crate::hci::consts::EVT_HDR) else {
            return Err(Error::InvalidEvent(orig.to_vec()));
        };
        let code = hdr.u8();
        if evt.len() != usize::from(hdr.u8()) {
            return Err(Error::InvalidEvent(orig.to_vec()));
        }
        let typ = match EventCode::try_from(code) {
            Ok(EventCode::LeMeta) => {
                let subevent = evt.u8();
                match SubeventCode::try_from(subevent) {
                    Ok(se) => EventType::Le(se),
                    Err(_) => {
                        return Err(Error::UnknownEvent {
                            code,
                            subevent,
                            params: evt.as_ref().to_vec(),
                        })
                    }
                }
            }
            Ok(c) => EventType::Hci(c),
            Err(_) => {
                return Err(Error::UnknownEvent {
                    code,
                    subevent: 0,
                    params: evt.as_ref().to_vec(),
                })
            }
        };
        let mut e = Self {
            typ,
            params: evt,
            ..Self::default()
        };
        match typ {
            EventType::Hci(EventCode::CommandComplete) => {
                e.cmd_quota = e.params.u8();
                e.opcode = Opcode::from(e.params.u16());
                if !e.params.is_empty() {
                    e.status = Status::from(e.params.u8());
                }
            }
            EventType::Hci(EventCode::CommandStatus) => {
                e.status = Status::from(e.params.u8());
                e.cmd_quota = e.params.u8();
                e.opcode = Opcode::from(e.params.u16());
            }
            _ => {
                let pf = typ.param_fmt();
                if pf.contains(EventFmt::STATUS) {
                    e.status = Status::from(e.params.u8());
                }
                if pf.contains(EventFmt::CONN_HANDLE) {
                    e.handle = e.params.u16();
                }
            }
        }
        Ok(e)
    }

    /// Returns the connection handle embedded in the first two
    /// return-parameter bytes of a per-connection command completion,
    /// without consuming it, for dispatcher correlation ([Vol 4] Part E,
    /// Section 4.4).
    pub(crate) fn peek_conn_handle(&self) -> Option<ConnHandle> {
        let b = self.params.as_ref();
        if b.len() < 2 {
            return None;
        }
        ConnHandle::new(u16::from_le_bytes([b[0], b[1]]))
    }
}

impl std::ops::Deref for Event {
    type Target = Unpacker;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl std::ops::DerefMut for Event {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.params
    }
}

/// Converts events with no additional parameters (e.g. `Reset`).
impl From<&mut Event> for () {
    #[inline]
    fn from(_: &mut Event) -> Self {}
}

/// Converts a raw [`Event`] into the caller's typed return value, failing
/// if the event wasn't a successful command completion. Mirrors the
/// source's `From<EventGuard<T>> for Result<R>` blanket conversion so every
/// command function can end with `r.await?.into()`.
impl<R: for<'a> From<&'a mut Event>> From<Event> for Result<R> {
    fn from(raw: Event) -> Self {
        let mut e = raw.ok()?;
        let got = e.params.len();
        let r = R::from(&mut e);
        let deficit = e.params.deficit();
        if deficit > 0 {
            return Err(Error::InvalidPayloadSize {
                opcode: e.opcode,
                need: got + deficit,
                got,
            });
        }
        debug_assert!(e.params.is_empty(), "unconsumed event parameters");
        Ok(r)
    }
}

/// Role played by the local device in a connection ([Vol 4] Part E,
/// Sections 7.7.65.1 and 7.7.65.10). Re-exported here since it appears in
/// decoded event payloads, not command parameters.
pub use crate::hci::consts::Role as ConnRole;

/// One broadcast channel per event family, matching Design Note 9's
/// instruction to expose typed subscriptions instead of a string-keyed
/// emitter.
pub(crate) struct Subscribers {
    pub disconnection: broadcast::Sender<DisconnectionComplete>,
    pub encryption_change: broadcast::Sender<EncryptionChange>,
    pub number_of_completed_packets: broadcast::Sender<NumberOfCompletedPackets>,
    pub le_connection: broadcast::Sender<LeConnectionComplete>,
    pub le_advertising_report: broadcast::Sender<AdvertisingReport>,
    pub le_extended_advertising_report: broadcast::Sender<ExtendedAdvertisingReport>,
    pub le_connection_update: broadcast::Sender<ConnectionUpdateComplete>,
    pub le_read_remote_features: broadcast::Sender<ReadRemoteFeaturesComplete>,
    pub le_channel_selection_algorithm: broadcast::Sender<ChannelSelectionAlgorithm>,
}

impl Subscribers {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            disconnection: broadcast::channel(capacity).0,
            encryption_change: broadcast::channel(capacity).0,
            number_of_completed_packets: broadcast::channel(capacity).0,
            le_connection: broadcast::channel(capacity).0,
            le_advertising_report: broadcast::channel(capacity).0,
            le_extended_advertising_report: broadcast::channel(capacity).0,
            le_connection_update: broadcast::channel(capacity).0,
            le_read_remote_features: broadcast::channel(capacity).0,
            le_channel_selection_algorithm: broadcast::channel(capacity).0,
        }
    }

    /// Dispatches a non-command event to its subscriber channel(s). Called
    /// only from the background reader task. Returns without effect if the
    /// event carries no subscribers (`send` on a channel with no receivers
    /// is not an error — it simply means nobody is listening yet).
    pub(crate) fn dispatch(&self, mut evt: Event) {
        match evt.typ() {
            EventType::Hci(EventCode::DisconnectionComplete) => {
                let _ = self.disconnection.send(DisconnectionComplete::from(&mut evt));
            }
            EventType::Hci(EventCode::EncryptionChange) => {
                let _ = self.encryption_change.send(EncryptionChange::from(&mut evt));
            }
            EventType::Hci(EventCode::NumberOfCompletedPackets) => {
                let _ = self
                    .number_of_completed_packets
                    .send(NumberOfCompletedPackets::from(&mut evt));
            }
            EventType::Le(SubeventCode::ConnectionComplete | SubeventCode::EnhancedConnectionComplete) => {
                let _ = self.le_connection.send(LeConnectionComplete::from(&mut evt));
            }
            EventType::Le(SubeventCode::AdvertisingReport) => {
                for report in AdvertisingReport::parse_all(&mut evt) {
                    let _ = self.le_advertising_report.send(report);
                }
            }
            EventType::Le(SubeventCode::ExtendedAdvertisingReport) => {
                for report in ExtendedAdvertisingReport::parse_all(&mut evt) {
                    let _ = self.le_extended_advertising_report.send(report);
                }
            }
            EventType::Le(SubeventCode::ConnectionUpdateComplete) => {
                let _ = self
                    .le_connection_update
                    .send(ConnectionUpdateComplete::from(&mut evt));
            }
            EventType::Le(SubeventCode::ReadRemoteFeaturesComplete) => {
                let _ = self
                    .le_read_remote_features
                    .send(ReadRemoteFeaturesComplete::from(&mut evt));
            }
            EventType::Le(SubeventCode::ChannelSelectionAlgorithm) => {
                let _ = self
                    .le_channel_selection_algorithm
                    .send(ChannelSelectionAlgorithm::from(&mut evt));
            }
            EventType::Le(SubeventCode::LongTermKeyRequest) => {
                // Forwarded as an opaque request; key agreement is the
                // caller's responsibility (Non-goal: pairing/key agreement).
                trace!("LE_Long_Term_Key_Request for {:?}", evt.conn_handle());
            }
            other => trace!("unhandled event for subscriber fan-out: {other:?}"),
        }
    }
}
