//! **snapgrd**: a snap-group manager.
//!
//! Two windows snapped to opposite halves of a display can be *grouped*:
//! they then tile the work area around a shared draggable divider and keep
//! their split ratio across display changes.  Snapping a third window onto
//! one side of a group replaces that side's member ("snap-to-replace").
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowSystem`] abstracts the host's windows, displays and
//!   desks so the grouping logic is not coupled to any specific shell.
//! * [`traits::EventSource`] abstracts the transport that delivers shell
//!   events (a Unix socket, a compositor bridge, …) so the main loop is not
//!   coupled to any specific IPC mechanism.
//!
//! [`controller::SnapGroupController`] owns every [`snap_group::SnapGroup`]
//! and dispatches [`event::ShellEvent`]s to them.  Concrete implementations
//! live in [`host`] (an in-memory host simulator) and [`ipc`] (Unix-socket
//! listener).

pub mod config;
pub mod controller;
pub mod divider;
pub mod event;
pub mod geometry;
pub mod host;
pub mod ipc;
pub mod snap_group;
pub mod traits;
