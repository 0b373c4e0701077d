//! Identifiers, window states and the events that drive snap groups.
//!
//! This module defines the vocabulary every component shares:
//! [`ShellEvent`] is the tagged union of everything the host shell can tell
//! the [`SnapGroupController`](crate::controller::SnapGroupController), and
//! the id / state types describe the windows those events are about.
//!
//! All types are serde (de)serialisable so events can be delivered as JSON
//! over the IPC socket.

use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of an on-screen window, owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Identity of a physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(pub u64);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "display-{}", self.0)
    }
}

/// Identity of a parent container (a desk / workspace on one display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container-{}", self.0)
    }
}

/// Identity of a snap group, allocated by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// The two canonical sides of a snap pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapPosition {
    /// Left in landscape, top in portrait.
    Primary,
    /// Right in landscape, bottom in portrait.
    Secondary,
}

impl SnapPosition {
    pub fn opposite(self) -> Self {
        match self {
            SnapPosition::Primary => SnapPosition::Secondary,
            SnapPosition::Secondary => SnapPosition::Primary,
        }
    }
}

impl fmt::Display for SnapPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapPosition::Primary => write!(f, "primary"),
            SnapPosition::Secondary => write!(f, "secondary"),
        }
    }
}

/// Window state as reported by the host window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowStateType {
    #[default]
    Normal,
    PrimarySnapped,
    SecondarySnapped,
    Maximized,
    Fullscreen,
    Minimized,
    Floating,
}

impl WindowStateType {
    /// The side this state snaps to, if it is a snapped state.
    pub fn snap_position(self) -> Option<SnapPosition> {
        match self {
            WindowStateType::PrimarySnapped => Some(SnapPosition::Primary),
            WindowStateType::SecondarySnapped => Some(SnapPosition::Secondary),
            _ => None,
        }
    }

    pub fn is_snapped(self) -> bool {
        self.snap_position().is_some()
    }
}

impl From<SnapPosition> for WindowStateType {
    fn from(position: SnapPosition) -> Self {
        match position {
            SnapPosition::Primary => WindowStateType::PrimarySnapped,
            SnapPosition::Secondary => WindowStateType::SecondarySnapped,
        }
    }
}

/// How the user snapped a window.  Only used for logging and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapActionSource {
    #[default]
    DragWindowToEdge,
    KeyboardShortcut,
    SnapButton,
    OverviewDrop,
}

/// Tablet-mode lifecycle as reported by the display manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TabletState {
    #[default]
    Clamshell,
    EnteringTablet,
    InTablet,
    ExitingTablet,
}

impl TabletState {
    /// Whether snap groups are disallowed in this state.
    pub fn in_tablet_mode(self) -> bool {
        matches!(self, TabletState::EnteringTablet | TabletState::InTablet)
    }
}

/// Which display metrics changed.  Missing fields deserialise as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayChanges {
    pub bounds: bool,
    pub rotation: bool,
    pub scale_factor: bool,
    pub work_area: bool,
}

impl DisplayChanges {
    /// Every metric at once (e.g. a display configuration reset).
    pub fn all() -> Self {
        Self {
            bounds: true,
            rotation: true,
            scale_factor: true,
            work_area: true,
        }
    }

    /// Whether any change requires snapped bounds to be recomputed.
    pub fn affects_layout(&self) -> bool {
        self.bounds || self.rotation || self.scale_factor || self.work_area
    }
}

/// Why a snap group was removed.  Reported through telemetry only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitPoint {
    WindowDestroyed,
    SnapStateChanged,
    UserUnlock,
    TabletTransition,
    SnapToReplace,
    CanNotFit,
    Shutdown,
}

impl fmt::Display for ExitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitPoint::WindowDestroyed => "window-destroyed",
            ExitPoint::SnapStateChanged => "snap-state-changed",
            ExitPoint::UserUnlock => "user-unlock",
            ExitPoint::TabletTransition => "tablet-transition",
            ExitPoint::SnapToReplace => "snap-to-replace",
            ExitPoint::CanNotFit => "can-not-fit",
            ExitPoint::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// Everything the host shell reports to the snap-group controller.
///
/// # Wire format
///
/// Externally tagged JSON, one event per line:
///
/// ```json
/// {"WindowSnapped":{"window":1,"source":"KeyboardShortcut"}}
/// {"WindowDestroyed":{"window":2}}
/// {"DisplayMetricsChanged":{"display":0,"changes":{"rotation":true}}}
/// {"TabletStateChanged":"InTablet"}
/// "OverviewEnding"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShellEvent {
    /// `window` has just been snapped (its state type is already snapped).
    WindowSnapped {
        window: WindowId,
        #[serde(default)]
        source: SnapActionSource,
    },

    /// The state type of `window` changed from `old` to `new`.
    StateTypeChanged {
        window: WindowId,
        old: WindowStateType,
        new: WindowStateType,
    },

    /// `window` is gone.  The host never reuses ids.
    WindowDestroyed { window: WindowId },

    /// `window` is being dragged by its title bar and currently has `bounds`.
    WindowDragMoved { window: WindowId, bounds: Rect },

    /// The title-bar drag of `window` finished.
    WindowDragEnded { window: WindowId },

    /// The user pressed on the divider of the group containing `window`.
    DividerResizeStarted { window: WindowId, point: Point },

    /// The pointer moved while dragging the divider.
    DividerResizeUpdated { window: WindowId, point: Point },

    /// The pointer was released.
    DividerResizeEnded { window: WindowId, point: Point },

    /// Explicitly lock two snapped windows into a group.
    AddGroup { window1: WindowId, window2: WindowId },

    /// Explicitly unlock the group containing `window`.
    RemoveGroup { window: WindowId },

    /// Minimize both members of the group containing `window`.
    MinimizeGroup { window: WindowId },

    /// Keyboard-shortcut snap-to-replace on the active container.
    SnapToReplaceWithKeyboard,

    DisplayMetricsChanged {
        display: DisplayId,
        #[serde(default)]
        changes: DisplayChanges,
    },

    /// Overview is starting.  `partial` names the window kept on screen
    /// beside a partial (split-screen) overview session, if any.
    OverviewStarting {
        #[serde(default)]
        partial: Option<WindowId>,
    },

    OverviewEnding,

    OverviewEndingAnimationComplete {
        #[serde(default)]
        canceled: bool,
    },

    TabletStateChanged(TabletState),
}
