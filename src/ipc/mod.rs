//! IPC listener that accepts messages over a Unix socket.
//!
//! External tools (scripts, test drivers, a real shell bridge) connect to
//! the socket and send newline-delimited JSON [`Message`]s: either
//! mutations of the simulated host or shell events to feed straight into
//! the controller.

pub mod listener;

use crate::event::ShellEvent;
use crate::host::headless::HostCommand;
use serde::{Deserialize, Serialize};

/// One line on the socket.
///
/// ```json
/// {"Host":{"Snap":{"window":3,"position":"Primary"}}}
/// {"Shell":{"RemoveGroup":{"window":3}}}
/// {"Shell":"OverviewEnding"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Change the simulated host; the events it produces are forwarded.
    Host(HostCommand),
    /// Deliver a shell event directly.
    Shell(ShellEvent),
}
