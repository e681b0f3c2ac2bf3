//! Host-side Bluetooth LE HCI client.
//!
//! Drives a BLE controller over a byte-oriented transport (typically
//! UART): encodes commands, frames them onto the wire, matches their
//! completion against a single outstanding command, and classifies/fans
//! out asynchronous events to subscribers.
//!
//! Scope is deliberately narrow: Link Layer behavior, GAP/GATT/SMP/ATT
//! profile logic, pairing/key-agreement cryptography, bond persistence,
//! and transport auto-detection all live above or below this crate.
//! Security-relevant payloads (pairing PDUs, encrypted long-term keys) are
//! forwarded as opaque bytes.

pub mod error;
pub mod hci;
pub mod le;
pub mod wire;

pub use error::{Error, Result};
pub use hci::{Host, HostConfig};
