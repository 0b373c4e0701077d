//! Core traits that decouple snapgrd from any specific host window system
//! or event transport.
//!
//! The [`SnapGroupController`](crate::controller::SnapGroupController) only
//! depends on these abstractions.  Concrete implementations live in
//! [`host`](crate::host) (an in-memory window system) and
//! [`ipc`](crate::ipc) (a Unix-socket event listener).

use crate::event::{
    ContainerId, DisplayId, ExitPoint, GroupId, SnapActionSource, WindowId,
    WindowStateType,
};
use crate::geometry::{Rect, Size};
use std::sync::mpsc;
use std::time::Duration;

/// Abstraction over the host window system and its workspace geometry.
///
/// Windows are owned by the host: the controller observes and re-lays them
/// out but never creates or destroys them.  All methods take `&self`;
/// implementations that need to mutate state use interior mutability, since
/// everything runs on the single UI thread.
pub trait WindowSystem {
    /// The error type produced by this window system.
    type Error: std::error::Error + Send + 'static;

    /// Screen bounds of `window`.
    fn bounds(&self, window: WindowId) -> Result<Rect, Self::Error>;

    /// Move / resize `window`.
    fn set_bounds(&self, window: WindowId, bounds: Rect) -> Result<(), Self::Error>;

    /// The container (desk) `window` is parented to.
    fn parent(&self, window: WindowId) -> Result<ContainerId, Self::Error>;

    /// The display `window` is shown on.
    fn display_of(&self, window: WindowId) -> Result<DisplayId, Self::Error>;

    /// Usable work area of `display`, excluding shelf and other chrome.
    fn work_area(&self, display: DisplayId) -> Result<Rect, Self::Error>;

    fn is_visible(&self, window: WindowId) -> Result<bool, Self::Error>;

    /// Show or force-hide `window` without changing its state type.
    fn set_visible(&self, window: WindowId, visible: bool) -> Result<(), Self::Error>;

    fn state_type(&self, window: WindowId) -> Result<WindowStateType, Self::Error>;

    /// The fraction of the work area `window` occupies on its snap side, or
    /// `None` if it has never been snapped.
    fn snap_ratio(&self, window: WindowId) -> Result<Option<f64>, Self::Error>;

    fn set_snap_ratio(&self, window: WindowId, ratio: f64) -> Result<(), Self::Error>;

    fn minimum_size(&self, window: WindowId) -> Result<Size, Self::Error>;

    /// Whether `window` is pinned to every desk.
    fn is_visible_on_all_workspaces(&self, window: WindowId) -> Result<bool, Self::Error>;

    fn minimize(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Restore a minimized `window` to the state it had before.
    fn unminimize(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Windows parented to `container`, topmost first.
    fn window_stack(&self, container: ContainerId) -> Result<Vec<WindowId>, Self::Error>;

    /// The container the user is currently looking at.
    fn active_container(&self) -> Result<ContainerId, Self::Error>;
}

//  Telemetry

/// Events sent from the controller to an external observer over an
/// [`mpsc`](std::sync::mpsc) channel.
///
/// The controller holds an `Option<mpsc::Sender<GroupEvent>>`; a metrics
/// recorder, a debug logger, etc. can consume these independently.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEvent {
    Created {
        group: GroupId,
        window1: WindowId,
        window2: WindowId,
        source: Option<SnapActionSource>,
    },
    Removed {
        group: GroupId,
        reason: ExitPoint,
        /// Time since the group (or the group it replaced) was first
        /// created.  `None` on the snap-to-replace path, whose successor
        /// group reports the lifetime instead.
        lifetime: Option<Duration>,
    },
    /// A divider drag finished with the given primary ratio.
    Resized { group: GroupId, primary_ratio: f64 },
}

//  Event Source

/// A source of [`ShellEvent`](crate::event::ShellEvent)s.
///
/// Implementations listen on some transport (a Unix socket, a compositor
/// event stream, an in-memory channel, …) and forward parsed events into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received item must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The item type forwarded into the sink.
    type Item: Send + 'static;
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming item into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Self::Item>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ShellEvent, TabletState};
    use std::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of events.
    struct MockSource {
        events: Vec<ShellEvent>,
    }

    impl EventSource for MockSource {
        type Item = ShellEvent;
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<ShellEvent>) -> Result<(), MockError> {
            for event in self.events.drain(..) {
                let _ = sink.send(event);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_events() {
        let mut src = MockSource {
            events: vec![
                ShellEvent::OverviewEnding,
                ShellEvent::TabletStateChanged(TabletState::InTablet),
            ],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let events: Vec<ShellEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ShellEvent::OverviewEnding);
        assert_eq!(
            events[1],
            ShellEvent::TabletStateChanged(TabletState::InTablet)
        );
    }
}
