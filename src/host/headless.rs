//! In-memory [`WindowSystem`] implementation.
//!
//! [`HeadlessWindowSystem`] models displays, desks and windows without any
//! real compositor behind them.  Mutations are made through
//! [`HostCommand`]s (or the matching inherent methods), each of which
//! reports the [`ShellEvent`]s a real shell would emit for it.  The daemon
//! uses it as a scriptable simulator; the test suites use it as their fake
//! host.

use crate::event::{
    ContainerId, DisplayChanges, DisplayId, ShellEvent, SnapActionSource, SnapPosition, WindowId,
    WindowStateType,
};
use crate::geometry::{solo_snapped_bounds, Orientation, Rect, Size};
use crate::traits::WindowSystem;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Errors from the headless window system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeadlessError {
    #[error("unknown window {0}")]
    UnknownWindow(WindowId),
    #[error("unknown display {0}")]
    UnknownDisplay(DisplayId),
    #[error("unknown container {0}")]
    UnknownContainer(ContainerId),
    #[error("no active container")]
    NoActiveContainer,
}

/// A mutation of the simulated host.
///
/// # Wire format
///
/// ```json
/// {"AddWindow":{"desk":1,"bounds":{"x":0,"y":0,"width":400,"height":300}}}
/// {"Snap":{"window":1,"position":"Primary","ratio":0.5}}
/// {"Destroy":{"window":1}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    AddDisplay {
        work_area: Rect,
    },
    AddDesk {
        display: DisplayId,
    },
    AddWindow {
        desk: ContainerId,
        bounds: Rect,
        #[serde(default)]
        minimum_size: Size,
    },
    Snap {
        window: WindowId,
        position: SnapPosition,
        #[serde(default = "half")]
        ratio: f64,
        #[serde(default)]
        source: SnapActionSource,
    },
    SetState {
        window: WindowId,
        state: WindowStateType,
    },
    Minimize {
        window: WindowId,
    },
    Unminimize {
        window: WindowId,
    },
    Destroy {
        window: WindowId,
    },
    Activate {
        window: WindowId,
    },
    SetWorkArea {
        display: DisplayId,
        work_area: Rect,
    },
}

fn half() -> f64 {
    0.5
}

#[derive(Debug, Clone)]
struct WindowRecord {
    desk: ContainerId,
    bounds: Rect,
    state: WindowStateType,
    /// State to return to when unminimized.
    restore_state: Option<WindowStateType>,
    snap_ratio: Option<f64>,
    minimum_size: Size,
    visible: bool,
    on_all_workspaces: bool,
}

#[derive(Debug, Clone)]
struct Desk {
    display: DisplayId,
    /// Topmost first.
    stack: Vec<WindowId>,
}

#[derive(Debug, Default)]
struct State {
    displays: BTreeMap<DisplayId, Rect>,
    desks: BTreeMap<ContainerId, Desk>,
    windows: HashMap<WindowId, WindowRecord>,
    active: Option<ContainerId>,
    next_id: u64,
}

impl State {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn window(&self, window: WindowId) -> Result<&WindowRecord, HeadlessError> {
        self.windows
            .get(&window)
            .ok_or(HeadlessError::UnknownWindow(window))
    }

    fn window_mut(&mut self, window: WindowId) -> Result<&mut WindowRecord, HeadlessError> {
        self.windows
            .get_mut(&window)
            .ok_or(HeadlessError::UnknownWindow(window))
    }

    fn desk(&self, desk: ContainerId) -> Result<&Desk, HeadlessError> {
        self.desks
            .get(&desk)
            .ok_or(HeadlessError::UnknownContainer(desk))
    }

    fn work_area_of(&self, window: WindowId) -> Result<Rect, HeadlessError> {
        let display = self.desk(self.window(window)?.desk)?.display;
        self.displays
            .get(&display)
            .copied()
            .ok_or(HeadlessError::UnknownDisplay(display))
    }

    fn raise(&mut self, window: WindowId) -> Result<(), HeadlessError> {
        let desk = self.window(window)?.desk;
        let stack = &mut self
            .desks
            .get_mut(&desk)
            .ok_or(HeadlessError::UnknownContainer(desk))?
            .stack;
        stack.retain(|w| *w != window);
        stack.insert(0, window);
        Ok(())
    }

    /// Change the state of `window`, returning the event for it (if any).
    fn set_state(&mut self, window: WindowId, new: WindowStateType) -> Result<Option<ShellEvent>, HeadlessError> {
        let record = self.window_mut(window)?;
        let old = record.state;
        if old == new {
            return Ok(None);
        }
        record.state = new;
        Ok(Some(ShellEvent::StateTypeChanged { window, old, new }))
    }
}

/// In-memory host window system.
///
/// Interior mutability lets it satisfy the `&self` [`WindowSystem`]
/// contract while tests and the daemon keep mutating it.
#[derive(Debug, Default)]
pub struct HeadlessWindowSystem {
    state: RefCell<State>,
}

impl HeadlessWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a display with the given work area.
    pub fn add_display(&self, work_area: Rect) -> DisplayId {
        let mut state = self.state.borrow_mut();
        let id = DisplayId(state.alloc_id());
        state.displays.insert(id, work_area);
        id
    }

    /// Add an empty desk on `display`.  The first desk becomes active.
    pub fn add_desk(&self, display: DisplayId) -> Result<ContainerId, HeadlessError> {
        let mut state = self.state.borrow_mut();
        if !state.displays.contains_key(&display) {
            return Err(HeadlessError::UnknownDisplay(display));
        }
        let id = ContainerId(state.alloc_id());
        state.desks.insert(
            id,
            Desk {
                display,
                stack: Vec::new(),
            },
        );
        state.active.get_or_insert(id);
        Ok(id)
    }

    /// Open a normal window on top of `desk`.
    pub fn add_window(&self, desk: ContainerId, bounds: Rect) -> Result<WindowId, HeadlessError> {
        let mut state = self.state.borrow_mut();
        state.desk(desk)?;
        let id = WindowId(state.alloc_id());
        state.windows.insert(
            id,
            WindowRecord {
                desk,
                bounds,
                state: WindowStateType::Normal,
                restore_state: None,
                snap_ratio: None,
                minimum_size: Size::default(),
                visible: true,
                on_all_workspaces: false,
            },
        );
        state.raise(id)?;
        Ok(id)
    }

    pub fn set_minimum_size(&self, window: WindowId, size: Size) -> Result<(), HeadlessError> {
        self.state.borrow_mut().window_mut(window)?.minimum_size = size;
        Ok(())
    }

    pub fn set_visible_on_all_workspaces(&self, window: WindowId, on_all: bool) -> Result<(), HeadlessError> {
        self.state.borrow_mut().window_mut(window)?.on_all_workspaces = on_all;
        Ok(())
    }

    pub fn set_active_container(&self, desk: ContainerId) -> Result<(), HeadlessError> {
        let mut state = self.state.borrow_mut();
        state.desk(desk)?;
        state.active = Some(desk);
        Ok(())
    }

    /// Snap `window` to `position`, giving it `ratio` of the work area and
    /// raising it.  Reports the state change followed by the snap.
    pub fn snap(
        &self,
        window: WindowId,
        position: SnapPosition,
        ratio: f64,
    ) -> Result<Vec<ShellEvent>, HeadlessError> {
        self.snap_from(window, position, ratio, SnapActionSource::default())
    }

    pub fn snap_from(
        &self,
        window: WindowId,
        position: SnapPosition,
        ratio: f64,
        source: SnapActionSource,
    ) -> Result<Vec<ShellEvent>, HeadlessError> {
        let mut state = self.state.borrow_mut();
        let work_area = state.work_area_of(window)?;
        let mut events = Vec::new();
        events.extend(state.set_state(window, position.into())?);
        let record = state.window_mut(window)?;
        record.snap_ratio = Some(ratio);
        record.bounds = solo_snapped_bounds(
            &work_area,
            Orientation::for_work_area(&work_area),
            position,
            ratio,
        );
        state.raise(window)?;
        events.push(ShellEvent::WindowSnapped { window, source });
        Ok(events)
    }

    /// Remove `window` from the host.
    pub fn destroy(&self, window: WindowId) -> Result<Vec<ShellEvent>, HeadlessError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .windows
            .remove(&window)
            .ok_or(HeadlessError::UnknownWindow(window))?;
        if let Some(desk) = state.desks.get_mut(&record.desk) {
            desk.stack.retain(|w| *w != window);
        }
        Ok(vec![ShellEvent::WindowDestroyed { window }])
    }

    /// Raise `window` to the top of its desk and make that desk active.
    pub fn activate(&self, window: WindowId) -> Result<(), HeadlessError> {
        let mut state = self.state.borrow_mut();
        state.raise(window)?;
        let desk = state.window(window)?.desk;
        state.active = Some(desk);
        Ok(())
    }

    /// Change the work area of `display`.  Windows are not moved; that is
    /// the job of whoever handles the resulting event.
    pub fn set_work_area(&self, display: DisplayId, work_area: Rect) -> Result<Vec<ShellEvent>, HeadlessError> {
        let mut state = self.state.borrow_mut();
        let current = state
            .displays
            .get_mut(&display)
            .ok_or(HeadlessError::UnknownDisplay(display))?;
        let rotated = Orientation::for_work_area(current) != Orientation::for_work_area(&work_area);
        *current = work_area;
        Ok(vec![ShellEvent::DisplayMetricsChanged {
            display,
            changes: DisplayChanges {
                work_area: true,
                rotation: rotated,
                ..DisplayChanges::default()
            },
        }])
    }

    /// Apply a [`HostCommand`], returning the events it produced.
    pub fn apply(&self, command: HostCommand) -> Result<Vec<ShellEvent>, HeadlessError> {
        match command {
            HostCommand::AddDisplay { work_area } => {
                self.add_display(work_area);
                Ok(Vec::new())
            }
            HostCommand::AddDesk { display } => {
                self.add_desk(display)?;
                Ok(Vec::new())
            }
            HostCommand::AddWindow {
                desk,
                bounds,
                minimum_size,
            } => {
                let window = self.add_window(desk, bounds)?;
                self.set_minimum_size(window, minimum_size)?;
                Ok(Vec::new())
            }
            HostCommand::Snap {
                window,
                position,
                ratio,
                source,
            } => self.snap_from(window, position, ratio, source),
            HostCommand::SetState { window, state } => {
                Ok(self.state.borrow_mut().set_state(window, state)?.into_iter().collect())
            }
            HostCommand::Minimize { window } => {
                let old = self.state_type(window)?;
                self.minimize(window)?;
                Ok(vec![ShellEvent::StateTypeChanged {
                    window,
                    old,
                    new: WindowStateType::Minimized,
                }])
            }
            HostCommand::Unminimize { window } => {
                self.unminimize(window)?;
                let new = self.state_type(window)?;
                Ok(vec![ShellEvent::StateTypeChanged {
                    window,
                    old: WindowStateType::Minimized,
                    new,
                }])
            }
            HostCommand::Destroy { window } => self.destroy(window),
            HostCommand::Activate { window } => {
                self.activate(window)?;
                Ok(Vec::new())
            }
            HostCommand::SetWorkArea { display, work_area } => self.set_work_area(display, work_area),
        }
    }
}

//  WindowSystem implementation

impl WindowSystem for HeadlessWindowSystem {
    type Error = HeadlessError;

    fn bounds(&self, window: WindowId) -> Result<Rect, Self::Error> {
        Ok(self.state.borrow().window(window)?.bounds)
    }

    fn set_bounds(&self, window: WindowId, bounds: Rect) -> Result<(), Self::Error> {
        self.state.borrow_mut().window_mut(window)?.bounds = bounds;
        Ok(())
    }

    fn parent(&self, window: WindowId) -> Result<ContainerId, Self::Error> {
        Ok(self.state.borrow().window(window)?.desk)
    }

    fn display_of(&self, window: WindowId) -> Result<DisplayId, Self::Error> {
        let state = self.state.borrow();
        Ok(state.desk(state.window(window)?.desk)?.display)
    }

    fn work_area(&self, display: DisplayId) -> Result<Rect, Self::Error> {
        self.state
            .borrow()
            .displays
            .get(&display)
            .copied()
            .ok_or(HeadlessError::UnknownDisplay(display))
    }

    fn is_visible(&self, window: WindowId) -> Result<bool, Self::Error> {
        let state = self.state.borrow();
        let record = state.window(window)?;
        Ok(record.visible && record.state != WindowStateType::Minimized)
    }

    fn set_visible(&self, window: WindowId, visible: bool) -> Result<(), Self::Error> {
        self.state.borrow_mut().window_mut(window)?.visible = visible;
        Ok(())
    }

    fn state_type(&self, window: WindowId) -> Result<WindowStateType, Self::Error> {
        Ok(self.state.borrow().window(window)?.state)
    }

    fn snap_ratio(&self, window: WindowId) -> Result<Option<f64>, Self::Error> {
        Ok(self.state.borrow().window(window)?.snap_ratio)
    }

    fn set_snap_ratio(&self, window: WindowId, ratio: f64) -> Result<(), Self::Error> {
        self.state.borrow_mut().window_mut(window)?.snap_ratio = Some(ratio);
        Ok(())
    }

    fn minimum_size(&self, window: WindowId) -> Result<Size, Self::Error> {
        Ok(self.state.borrow().window(window)?.minimum_size)
    }

    fn is_visible_on_all_workspaces(&self, window: WindowId) -> Result<bool, Self::Error> {
        Ok(self.state.borrow().window(window)?.on_all_workspaces)
    }

    fn minimize(&self, window: WindowId) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        let record = state.window_mut(window)?;
        if record.state != WindowStateType::Minimized {
            record.restore_state = Some(record.state);
            record.state = WindowStateType::Minimized;
        }
        Ok(())
    }

    fn unminimize(&self, window: WindowId) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        let record = state.window_mut(window)?;
        if record.state == WindowStateType::Minimized {
            record.state = record.restore_state.take().unwrap_or_default();
        }
        Ok(())
    }

    fn window_stack(&self, container: ContainerId) -> Result<Vec<WindowId>, Self::Error> {
        Ok(self.state.borrow().desk(container)?.stack.clone())
    }

    fn active_container(&self) -> Result<ContainerId, Self::Error> {
        self.state
            .borrow()
            .active
            .ok_or(HeadlessError::NoActiveContainer)
    }
}

//  Tests
