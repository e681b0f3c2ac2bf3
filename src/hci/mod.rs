//! Host Controller Interface: command encoding, packet framing, the
//! single-outstanding-command dispatcher, and the event router.
//!
//! [`Host`] is the crate's single entry point. It owns the transport, the
//! dispatcher's pending-command slot, and the per-event-family broadcast
//! channels subscribers read from.

mod conn;
mod consts;
mod event;
mod packet;

pub mod cmd;

pub use conn::{AdvHandle, ConnHandle};
pub use consts::{
    AdvAddrType, AdvChanMap, AdvDataOp, AdvFilterPolicy, AdvPhy, AdvProp, CoreVersion, EventCode,
    LegacyAdvType, Opcode, PacketType, ScanFilterDuplicates, ScanPhys, ScanType,
    SubeventCode, Status,
};
pub use event::{
    AdvertisingReport, ChannelSelectionAlgorithm, CompletedPackets, ConnRole,
    ConnectionUpdateComplete, DisconnectionComplete, EncryptionChange, Event, EventType,
    ExtendedAdvertisingReport, LeConnectionComplete, NumberOfCompletedPackets,
    ReadRemoteFeaturesComplete,
};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{broadcast, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{Error, Result};
use packet::Frame;

/// A transport byte stream a [`Host`] can be driven over: a UART, a pty, an
/// in-memory pipe for tests, or anything else implementing ordinary async
/// read/write. Blanket-implemented for any type that qualifies.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> Transport for T {}

/// Tunable knobs for a [`Host`]. `Default` matches the controller timing
/// assumed by the Bluetooth Core Specification's `HCI_Command_Timeout`
/// guidance.
#[derive(Clone, Copy, Debug)]
pub struct HostConfig {
    /// How long to wait for a command's `CommandComplete`/terminal
    /// `CommandStatus` before failing with [`Error::Timeout`].
    pub command_timeout: Duration,
    /// Capacity of each per-event-family broadcast channel and the raw ACL
    /// channel. A slow subscriber that falls behind this many notifications
    /// starts missing them (`broadcast::error::RecvError::Lagged`).
    pub event_channel_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_millis(2000),
            event_channel_capacity: 64,
        }
    }
}

/// A connection handle or advertising handle a pending command's completion
/// must be correlated against, for commands whose return parameters (not
/// the generic event header) carry the handle ([Vol 4] Part E, Section
/// 7.7.14).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PendingHandle {
    None,
    Conn(ConnHandle),
}

/// The dispatcher's single-outstanding-command discipline, made explicit as
/// a state enum rather than an implicit invariant over scattered fields: at
/// any instant there is either no command in flight, or exactly one, with
/// everything needed to match and complete it.
enum PendingSlot {
    Idle,
    Pending {
        opcode: Opcode,
        handle: PendingHandle,
        tx: oneshot::Sender<Result<Event>>,
    },
}

/// One received ACL data packet, forwarded unmodified: no reassembly of
/// fragmented L2CAP frames, no flow-control accounting (Non-goals).
#[derive(Clone, Debug)]
pub struct AclData {
    pub handle: ConnHandle,
    /// `PB_Flag` (`Packet_Boundary_Flag`), 2 bits ([Vol 4] Part E, Section
    /// 5.4.2).
    pub pb_flag: u8,
    /// `BC_Flag` (`Broadcast_Flag`), 2 bits.
    pub bc_flag: u8,
    pub data: Bytes,
}

/// A host-side HCI client driving one controller over `T`.
pub struct Host<T> {
    write: AsyncMutex<WriteHalf<T>>,
    pending: Arc<Mutex<PendingSlot>>,
    subs: Arc<event::Subscribers>,
    acl_tx: broadcast::Sender<AclData>,
    cfg: HostConfig,
    cancel: CancellationToken,
    reader: JoinHandle<()>,
}

impl<T: Transport> Host<T> {
    /// Creates a host with [`HostConfig::default`] and starts its
    /// background event-reader task.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, HostConfig::default())
    }

    /// Creates a host with an explicit configuration.
    #[must_use]
    pub fn with_config(transport: T, cfg: HostConfig) -> Self {
        let (r, w) = tokio::io::split(transport);
        let pending = Arc::new(Mutex::new(PendingSlot::Idle));
        let subs = Arc::new(event::Subscribers::new(cfg.event_channel_capacity));
        let (acl_tx, _) = broadcast::channel(cfg.event_channel_capacity);
        let cancel = CancellationToken::new();
        let reader = tokio::spawn(Self::reader_task(
            r,
            Arc::clone(&pending),
            Arc::clone(&subs),
            acl_tx.clone(),
            cancel.clone(),
        ));
        Self {
            write: AsyncMutex::new(w),
            pending,
            subs,
            acl_tx,
            cfg,
            cancel,
            reader,
        }
    }

    async fn reader_task(
        mut r: ReadHalf<T>,
        pending: Arc<Mutex<PendingSlot>>,
        subs: Arc<event::Subscribers>,
        acl_tx: broadcast::Sender<AclData>,
        cancel: CancellationToken,
    ) {
        loop {
            let frame = tokio::select! {
                () = cancel.cancelled() => return,
                f = packet::read_frame(&mut r) => f,
            };
            let frame = match frame {
                Ok(f) => f,
                Err(e) => {
                    warn!("transport closed, abandoning any pending command: {e}");
                    Self::fail_pending(&pending, e);
                    return;
                }
            };
            match frame {
                Frame::Event(bytes) => match event::Event::parse(bytes) {
                    Ok(evt) if evt.typ().is_cmd() => Self::complete_pending(&pending, evt),
                    Ok(evt) => subs.dispatch(evt),
                    Err(e) => debug!("dropping unparseable event: {e}"),
                },
                Frame::Acl(handle_and_flags, data) => {
                    let Some(handle) = ConnHandle::new(handle_and_flags & 0x0FFF) else {
                        debug!("dropping ACL packet with invalid handle field");
                        continue;
                    };
                    #[allow(clippy::cast_possible_truncation)]
                    let pb_flag = ((handle_and_flags >> 12) & 0x3) as u8;
                    #[allow(clippy::cast_possible_truncation)]
                    let bc_flag = ((handle_and_flags >> 14) & 0x3) as u8;
                    let _ = acl_tx.send(AclData {
                        handle,
                        pb_flag,
                        bc_flag,
                        data,
                    });
                }
            }
        }
    }

    /// Completes the pending command if `evt` is its `CommandComplete`/
    /// `CommandStatus`, matched by opcode and (when the command is scoped
    /// to a connection or advertising set) by the handle embedded in its
    /// return parameters. A completion that matches nothing currently
    /// pending is logged and dropped: it cannot be delivered to anyone.
    fn complete_pending(pending: &Mutex<PendingSlot>, evt: Event) {
        let mut guard = pending.lock();
        let is_match = match &*guard {
            PendingSlot::Pending { opcode, handle, .. } => {
                evt.opcode() == *opcode
                    && match handle {
                        PendingHandle::None => true,
                        PendingHandle::Conn(want) => evt.peek_conn_handle() == Some(*want),
                    }
            }
            PendingSlot::Idle => false,
        };
        if !is_match {
            trace!(
                "completion for {:?} does not match pending command, dropping",
                evt.opcode()
            );
            return;
        }
        if let PendingSlot::Pending { tx, .. } = std::mem::replace(&mut *guard, PendingSlot::Idle) {
            let _ = tx.send(Ok(evt));
        }
    }

    /// Fails whatever command is pending when the transport dies, since
    /// nothing will ever complete it.
    fn fail_pending(pending: &Mutex<PendingSlot>, cause: Error) {
        let prior = std::mem::replace(&mut *pending.lock(), PendingSlot::Idle);
        if let PendingSlot::Pending { tx, .. } = prior {
            let msg = cause.to_string();
            let _ = tx.send(Err(Error::Transport(std::io::Error::other(msg))));
        }
    }

    async fn write_frame(&self, frame: &[u8]) -> Result<()> {
        let mut w = self.write.lock().await;
        packet::write_frame(&mut *w, frame).await
    }

    /// Sends `opcode` with no parameters and awaits its completion.
    pub(crate) async fn exec(&self, opcode: Opcode) -> Result<Event> {
        self.exec_with(opcode, &[], PendingHandle::None).await
    }

    /// Sends `opcode` with `payload` parameters and awaits its completion.
    pub(crate) async fn exec_params(&self, opcode: Opcode, payload: &[u8]) -> Result<Event> {
        self.exec_with(opcode, payload, PendingHandle::None).await
    }

    /// Like [`Self::exec_params`], but the completion is also required to
    /// carry `handle` in its return parameters before it is accepted as
    /// this command's answer.
    pub(crate) async fn exec_for_conn(
        &self,
        opcode: Opcode,
        payload: &[u8],
        handle: ConnHandle,
    ) -> Result<Event> {
        self.exec_with(opcode, payload, PendingHandle::Conn(handle)).await
    }

    async fn exec_with(&self, opcode: Opcode, payload: &[u8], handle: PendingHandle) -> Result<Event> {
        let (tx, rx) = oneshot::channel();
        {
            let mut guard = self.pending.lock();
            if !matches!(&*guard, PendingSlot::Idle) {
                return Err(Error::Busy);
            }
            *guard = PendingSlot::Pending { opcode, handle, tx };
        }
        let frame = packet::encode_command(opcode, payload);
        if let Err(e) = self.write_frame(&frame).await {
            *self.pending.lock() = PendingSlot::Idle;
            return Err(e);
        }
        match tokio::time::timeout(self.cfg.command_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Cancelled),
            Err(_) => {
                *self.pending.lock() = PendingSlot::Idle;
                Err(Error::Timeout)
            }
        }
    }

    /// Sends a raw ACL data packet. No fragmentation: `data` must already
    /// fit within whatever `ACL_Data_Packet_Length` the controller
    /// advertised via `Read_Buffer_Size` (Non-goal: ACL reassembly).
    pub async fn send_acl(&self, handle: ConnHandle, pb_flag: u8, bc_flag: u8, data: &[u8]) -> Result<()> {
        let handle_and_flags = handle.raw() | (u16::from(pb_flag & 0x3) << 12) | (u16::from(bc_flag & 0x3) << 14);
        let frame = packet::encode_acl(handle_and_flags, data);
        self.write_frame(&frame).await
    }

    /// Subscribes to incoming ACL data packets.
    #[must_use]
    pub fn acl_reports(&self) -> broadcast::Receiver<AclData> {
        self.acl_tx.subscribe()
    }

    #[must_use]
    pub fn disconnections(&self) -> broadcast::Receiver<DisconnectionComplete> {
        self.subs.disconnection.subscribe()
    }

    #[must_use]
    pub fn encryption_changes(&self) -> broadcast::Receiver<EncryptionChange> {
        self.subs.encryption_change.subscribe()
    }

    #[must_use]
    pub fn number_of_completed_packets(&self) -> broadcast::Receiver<NumberOfCompletedPackets> {
        self.subs.number_of_completed_packets.subscribe()
    }

    #[must_use]
    pub fn le_connections(&self) -> broadcast::Receiver<LeConnectionComplete> {
        self.subs.le_connection.subscribe()
    }

    #[must_use]
    pub fn le_advertising_reports(&self) -> broadcast::Receiver<AdvertisingReport> {
        self.subs.le_advertising_report.subscribe()
    }

    #[must_use]
    pub fn le_extended_advertising_reports(&self) -> broadcast::Receiver<ExtendedAdvertisingReport> {
        self.subs.le_extended_advertising_report.subscribe()
    }

    #[must_use]
    pub fn le_connection_updates(&self) -> broadcast::Receiver<ConnectionUpdateComplete> {
        self.subs.le_connection_update.subscribe()
    }

    #[must_use]
    pub fn le_read_remote_features(&self) -> broadcast::Receiver<ReadRemoteFeaturesComplete> {
        self.subs.le_read_remote_features.subscribe()
    }

    #[must_use]
    pub fn le_channel_selection_algorithm(&self) -> broadcast::Receiver<ChannelSelectionAlgorithm> {
        self.subs.le_channel_selection_algorithm.subscribe()
    }
}

impl<T> Drop for Host<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Cooperative cancellation above is enough for a reader task
        // parked in its `select!`, but `abort` also reclaims a task stuck
        // mid-poll (e.g. inside a transport read that never completes)
        // instead of leaving it detached.
        self.reader.abort();
    }
}
