//! Command encoders, grouped by OGF the way the Core Specification ([Vol 4]
//! Part E, Section 7) lays them out: Control and Baseband, Informational
//! Parameters, Status Parameters, and LE Controller.
//!
//! Every function here is `Host::<T>::method`, built on
//! [`super::Host::exec`]/[`super::Host::exec_params`]: pack the command's
//! parameters, send it, decode the completion's return parameters into a
//! typed result.

mod ctl;
mod info;
mod le;
mod status;

pub use ctl::EventMask;
pub use info::{BufferSize, LocalSupportedCommands, LocalVersion};
pub use le::*;
pub use status::Rssi;
