//! A pair of snapped windows tiled around a shared [`Divider`].
//!
//! [`SnapGroup`] keeps the tiling invariant between its two windows: while
//! the divider is visible, `window1 + divider + window2` exactly covers the
//! work area along the split axis.  `window1` is always the primary-snapped
//! window and `window2` the secondary-snapped one.
//!
//! A group never removes itself.  Event handlers return a [`GroupReaction`]
//! and the [`SnapGroupController`](crate::controller::SnapGroupController),
//! which owns the window → group index, performs the removal.

use crate::config::SnapGroupConfig;
use crate::divider::{Divider, DividerError, DividerLimits};
use crate::event::{DisplayChanges, DisplayId, ExitPoint, GroupId, SnapPosition, WindowId, WindowStateType};
use crate::geometry::{
    can_fit, clamp_divider_position, divider_position_for_ratio, gap_between,
    ratio_for_divider_position, snapped_window_bounds, solo_snapped_bounds, Orientation, Point,
    Rect, RATIO_EPSILON,
};
use crate::traits::WindowSystem;
use log::{debug, warn};
use std::time::Instant;

/// Possible errors from a snap group.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// The window system returned an error.
    #[error("window system error: {0}")]
    WindowSystem(String),
    #[error(transparent)]
    Divider(#[from] DividerError),
}

fn host_err<E: std::error::Error>(e: E) -> GroupError {
    GroupError::WindowSystem(e.to_string())
}

/// What the controller should do with a group after it handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupReaction {
    Keep,
    Remove(ExitPoint),
}

/// Work area and per-window minimum lengths along the split axis.
#[derive(Debug, Clone, Copy)]
struct Layout {
    work_area: Rect,
    orientation: Orientation,
    upper_limit: i32,
    min_primary: i32,
    min_secondary: i32,
}

pub struct SnapGroup {
    id: GroupId,
    window1: WindowId,
    window2: WindowId,
    divider: Divider,
    default_ratio: f64,
    /// When this group object was constructed.
    created_at: Instant,
    /// When the pair was first grouped; carried across snap-to-replace.
    actual_created_at: Instant,
    /// Both windows were force-hidden for a partial overview session.
    windows_force_hidden: bool,
    /// The divider was hidden because a member is dragged over its sibling.
    hidden_for_drag: bool,
    minimized: bool,
}

impl std::fmt::Debug for SnapGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapGroup")
            .field("id", &self.id)
            .field("window1", &self.window1)
            .field("window2", &self.window2)
            .field("divider", &self.divider)
            .field("minimized", &self.minimized)
            .finish()
    }
}

impl SnapGroup {
    /// Group `a` and `b`, which must already be snapped to opposite sides.
    ///
    /// The windows are canonicalised so that `window1` is the primary one
    /// regardless of argument order.  The divider is shown and the bounds
    /// recomputed immediately, unless the windows are already further apart
    /// than the divider is thick (e.g. restored from overview with a gap), in
    /// which case the divider stays hidden until overview finishes.
    pub fn new<W: WindowSystem>(
        id: GroupId,
        wm: &W,
        a: WindowId,
        b: WindowId,
        config: &SnapGroupConfig,
        actual_created_at: Option<Instant>,
    ) -> Result<Self, GroupError> {
        let a_is_secondary =
            wm.state_type(a).map_err(host_err)? == WindowStateType::SecondarySnapped;
        let (window1, window2) = if a_is_secondary { (b, a) } else { (a, b) };
        let now = Instant::now();

        let mut group = Self {
            id,
            window1,
            window2,
            divider: Divider::new(config.divider_thickness),
            default_ratio: config.default_ratio,
            created_at: now,
            actual_created_at: actual_created_at.unwrap_or(now),
            windows_force_hidden: false,
            hidden_for_drag: false,
            minimized: false,
        };

        let layout = group.layout(wm)?;
        let b1 = wm.bounds(window1).map_err(host_err)?;
        let b2 = wm.bounds(window2).map_err(host_err)?;
        let gap = gap_between(&b1, &b2, layout.orientation);
        if gap >= config.divider_thickness {
            debug!("{}: windows already {}px apart, divider stays hidden", id, gap);
            let ratio = group.primary_ratio(wm)?;
            let position = group.clamped_position(&layout, ratio);
            group
                .divider
                .set_layout(layout.work_area, layout.orientation, position);
        } else {
            group.divider.show();
            group.refresh_bounds(wm)?;
        }
        Ok(group)
    }

    //  Accessors

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// The primary-snapped window.
    pub fn window1(&self) -> WindowId {
        self.window1
    }

    /// The secondary-snapped window.
    pub fn window2(&self) -> WindowId {
        self.window2
    }

    pub fn windows(&self) -> [WindowId; 2] {
        [self.window1, self.window2]
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.window1 == window || self.window2 == window
    }

    /// The other member of the group, if `window` is a member.
    pub fn sibling_of(&self, window: WindowId) -> Option<WindowId> {
        if window == self.window1 {
            Some(self.window2)
        } else if window == self.window2 {
            Some(self.window1)
        } else {
            None
        }
    }

    pub fn window_at(&self, position: SnapPosition) -> WindowId {
        match position {
            SnapPosition::Primary => self.window1,
            SnapPosition::Secondary => self.window2,
        }
    }

    pub fn position_of(&self, window: WindowId) -> Option<SnapPosition> {
        if window == self.window1 {
            Some(SnapPosition::Primary)
        } else if window == self.window2 {
            Some(SnapPosition::Secondary)
        } else {
            None
        }
    }

    pub fn divider(&self) -> &Divider {
        &self.divider
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn actual_created_at(&self) -> Instant {
        self.actual_created_at
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn windows_force_hidden(&self) -> bool {
        self.windows_force_hidden
    }

    /// The primary window's share of the work area, read from its snap ratio.
    pub fn primary_ratio<W: WindowSystem>(&self, wm: &W) -> Result<f64, GroupError> {
        Ok(wm
            .snap_ratio(self.window1)
            .map_err(host_err)?
            .unwrap_or(self.default_ratio))
    }

    /// The display the group is shown on.
    pub fn display<W: WindowSystem>(&self, wm: &W) -> Result<DisplayId, GroupError> {
        wm.display_of(self.window1).map_err(host_err)
    }

    /// Whether both windows still fit the work area side by side.
    pub fn fits<W: WindowSystem>(&self, wm: &W) -> Result<bool, GroupError> {
        let layout = self.layout(wm)?;
        Ok(can_fit(
            layout.upper_limit,
            self.divider.thickness(),
            layout.min_primary,
            layout.min_secondary,
        ))
    }

    //  Bounds

    fn layout<W: WindowSystem>(&self, wm: &W) -> Result<Layout, GroupError> {
        let display = wm.display_of(self.window1).map_err(host_err)?;
        let work_area = wm.work_area(display).map_err(host_err)?;
        let orientation = Orientation::for_work_area(&work_area);
        let min1 = wm.minimum_size(self.window1).map_err(host_err)?;
        let min2 = wm.minimum_size(self.window2).map_err(host_err)?;
        Ok(Layout {
            work_area,
            orientation,
            upper_limit: orientation.length(&work_area),
            min_primary: orientation.size_along(&min1),
            min_secondary: orientation.size_along(&min2),
        })
    }

    fn limits(&self, layout: &Layout) -> DividerLimits {
        let thickness = self.divider.thickness();
        DividerLimits {
            min: clamp_divider_position(0, layout.upper_limit, thickness, layout.min_primary, layout.min_secondary),
            max: clamp_divider_position(
                layout.upper_limit,
                layout.upper_limit,
                thickness,
                layout.min_primary,
                layout.min_secondary,
            ),
        }
    }

    fn clamped_position(&self, layout: &Layout, ratio: f64) -> i32 {
        let thickness = self.divider.thickness();
        clamp_divider_position(
            divider_position_for_ratio(layout.upper_limit, ratio, thickness),
            layout.upper_limit,
            thickness,
            layout.min_primary,
            layout.min_secondary,
        )
    }

    /// Re-run the bounds algorithm with the preserved primary ratio.
    pub fn refresh_bounds<W: WindowSystem>(&mut self, wm: &W) -> Result<(), GroupError> {
        let ratio = self.primary_ratio(wm)?;
        self.apply_primary_ratio(wm, ratio)
    }

    /// Place the divider at `ratio` of the work area (clamped by minimum
    /// sizes), derive both windows' bounds from it, and persist the ratio.
    pub fn apply_primary_ratio<W: WindowSystem>(
        &mut self,
        wm: &W,
        ratio: f64,
    ) -> Result<(), GroupError> {
        let layout = self.layout(wm)?;
        let thickness = self.divider.thickness();
        let unclamped = divider_position_for_ratio(layout.upper_limit, ratio, thickness);
        let position = self.clamped_position(&layout, ratio);
        self.divider
            .set_layout(layout.work_area, layout.orientation, position);
        self.update_bounds_from_divider(wm)?;

        let persisted = if position == unclamped {
            ratio
        } else {
            ratio_for_divider_position(layout.upper_limit, position, thickness)
        };
        self.persist_ratio(wm, persisted)
    }

    /// Give each window everything on its side of the divider.
    fn update_bounds_from_divider<W: WindowSystem>(&self, wm: &W) -> Result<(), GroupError> {
        let work_area = self.divider.work_area();
        let orientation = self.divider.orientation();
        let position = self.divider.position();
        let thickness = self.divider.thickness();
        for (window, side) in [
            (self.window1, SnapPosition::Primary),
            (self.window2, SnapPosition::Secondary),
        ] {
            let bounds = snapped_window_bounds(&work_area, orientation, side, position, thickness);
            wm.set_bounds(window, bounds).map_err(host_err)?;
        }
        Ok(())
    }

    fn persist_ratio<W: WindowSystem>(&self, wm: &W, primary: f64) -> Result<(), GroupError> {
        wm.set_snap_ratio(self.window1, primary).map_err(host_err)?;
        wm.set_snap_ratio(self.window2, 1.0 - primary).map_err(host_err)?;
        Ok(())
    }

    /// Put every still-snapped member back to the bounds it would have if
    /// it were snapped alone, and hide the divider.  Members that are gone
    /// or no longer snapped are left alone.
    pub fn restore_solo_bounds<W: WindowSystem>(&mut self, wm: &W) {
        self.divider.hide();
        for window in self.windows() {
            if let Err(e) = self.restore_window(wm, window) {
                debug!("{}: not restoring {}: {}", self.id, window, e);
            }
        }
        self.windows_force_hidden = false;
    }

    fn restore_window<W: WindowSystem>(&self, wm: &W, window: WindowId) -> Result<(), GroupError> {
        if self.windows_force_hidden {
            wm.set_visible(window, true).map_err(host_err)?;
        }
        let Some(side) = wm.state_type(window).map_err(host_err)?.snap_position() else {
            return Ok(());
        };
        let ratio = wm
            .snap_ratio(window)
            .map_err(host_err)?
            .unwrap_or(self.default_ratio);
        let work_area = wm
            .work_area(wm.display_of(window).map_err(host_err)?)
            .map_err(host_err)?;
        let orientation = Orientation::for_work_area(&work_area);
        let bounds = solo_snapped_bounds(&work_area, orientation, side, ratio);
        wm.set_bounds(window, bounds).map_err(host_err)
    }

    /// Show the divider and re-tile both windows around it.
    pub fn show_divider_and_refresh<W: WindowSystem>(&mut self, wm: &W) -> Result<(), GroupError> {
        self.divider.show();
        self.refresh_bounds(wm)
    }

    //  Divider resize

    /// Begin a divider drag.  Drag tracking lives in the divider, which
    /// rejects a second concurrent drag.
    pub fn start_resize(&mut self, point: Point) -> Result<(), GroupError> {
        self.divider.begin_drag(point)?;
        Ok(())
    }

    /// Follow the pointer and re-derive both windows' bounds.
    pub fn update_resize<W: WindowSystem>(&mut self, wm: &W, point: Point) -> Result<(), GroupError> {
        let layout = self.layout(wm)?;
        self.divider.drag_to(point, self.limits(&layout))?;
        self.update_bounds_from_divider(wm)
    }

    /// Finish the drag, lay the windows out a final time and persist the
    /// resulting ratio, which is returned.
    pub fn end_resize<W: WindowSystem>(&mut self, wm: &W, point: Point) -> Result<f64, GroupError> {
        let layout = self.layout(wm)?;
        let position = self.divider.end_drag(point, self.limits(&layout))?;
        let ratio = ratio_for_divider_position(layout.upper_limit, position, self.divider.thickness());
        self.apply_primary_ratio(wm, ratio)?;
        Ok(ratio)
    }

    //  Minimize

    /// Minimize both windows together.
    pub fn minimize<W: WindowSystem>(&mut self, wm: &W) -> Result<(), GroupError> {
        self.minimized = true;
        self.divider.hide();
        for window in self.windows() {
            if wm.state_type(window).map_err(host_err)? != WindowStateType::Minimized {
                wm.minimize(window).map_err(host_err)?;
            }
        }
        Ok(())
    }

    //  Window events

    pub fn on_window_destroyed(&self, window: WindowId) -> GroupReaction {
        if self.contains(window) {
            GroupReaction::Remove(ExitPoint::WindowDestroyed)
        } else {
            GroupReaction::Keep
        }
    }

    /// React to `window` changing state.  Leaving the snapped state
    /// dissolves the group, except for minimizing, which takes the sibling
    /// along; unminimizing brings the sibling back.
    pub fn on_state_type_changed<W: WindowSystem>(
        &mut self,
        wm: &W,
        window: WindowId,
        new: WindowStateType,
    ) -> Result<GroupReaction, GroupError> {
        let Some(expected) = self.position_of(window) else {
            return Ok(GroupReaction::Keep);
        };
        if new == WindowStateType::Minimized {
            if !self.minimized {
                debug!("{}: {} minimized, minimizing group", self.id, window);
                self.minimize(wm)?;
            }
            return Ok(GroupReaction::Keep);
        }
        if new.snap_position() != Some(expected) {
            return Ok(GroupReaction::Remove(ExitPoint::SnapStateChanged));
        }
        if self.minimized {
            debug!("{}: {} restored, restoring group", self.id, window);
            self.minimized = false;
            let sibling = self.window_at(expected.opposite());
            if wm.state_type(sibling).map_err(host_err)? == WindowStateType::Minimized {
                wm.unminimize(sibling).map_err(host_err)?;
            }
            if wm.state_type(sibling).map_err(host_err)?.snap_position() != Some(expected.opposite()) {
                return Ok(GroupReaction::Remove(ExitPoint::SnapStateChanged));
            }
            self.divider.show();
            self.refresh_bounds(wm)?;
        }
        Ok(GroupReaction::Keep)
    }

    /// A member is being dragged by its title bar.  Hide the divider while
    /// the dragged window overlaps its sibling so the divider does not end
    /// up stacked above it.
    pub fn on_window_drag_moved<W: WindowSystem>(
        &mut self,
        wm: &W,
        window: WindowId,
        bounds: Rect,
    ) -> Result<(), GroupError> {
        let Some(sibling) = self.sibling_of(window) else {
            return Ok(());
        };
        let sibling_bounds = wm.bounds(sibling).map_err(host_err)?;
        let over_sibling = bounds.intersects(&sibling_bounds);
        if over_sibling && self.divider.is_visible() {
            self.divider.hide();
            self.hidden_for_drag = true;
        } else if !over_sibling && self.hidden_for_drag {
            self.divider.show();
            self.hidden_for_drag = false;
        }
        Ok(())
    }

    pub fn on_window_drag_ended<W: WindowSystem>(
        &mut self,
        wm: &W,
        window: WindowId,
    ) -> Result<(), GroupError> {
        if !self.contains(window) {
            return Ok(());
        }
        if self.hidden_for_drag || self.divider.is_visible() {
            self.hidden_for_drag = false;
            self.divider.show();
            self.refresh_bounds(wm)?;
        }
        Ok(())
    }

    //  Display

    /// Re-lay the group out after its display changed, preserving the
    /// primary ratio.  Skipped while the divider is hidden (overview,
    /// minimized); a group that no longer fits asks to be removed.
    pub fn on_display_metrics_changed<W: WindowSystem>(
        &mut self,
        wm: &W,
        display: DisplayId,
        changes: DisplayChanges,
    ) -> Result<GroupReaction, GroupError> {
        if !changes.affects_layout() || self.display(wm)? != display {
            return Ok(GroupReaction::Keep);
        }
        if !self.divider.is_visible() {
            debug!("{}: divider hidden, skipping display change", self.id);
            return Ok(GroupReaction::Keep);
        }
        if !self.fits(wm)? {
            return Ok(GroupReaction::Remove(ExitPoint::CanNotFit));
        }
        let before = self.primary_ratio(wm)?;
        self.refresh_bounds(wm)?;
        let after = self.primary_ratio(wm)?;
        if (before - after).abs() > RATIO_EPSILON {
            warn!(
                "{}: ratio moved from {:.3} to {:.3} to honour minimum sizes",
                self.id, before, after
            );
        }
        Ok(GroupReaction::Keep)
    }

    //  Overview

    /// Overview is starting: hide the divider.  When a partial overview
    /// keeps `partial` on screen in the same container, both windows of this
    /// group are force-hidden until overview ends.
    pub fn on_overview_starting<W: WindowSystem>(
        &mut self,
        wm: &W,
        partial: Option<WindowId>,
    ) -> Result<(), GroupError> {
        self.divider.hide();
        self.hidden_for_drag = false;
        let Some(partial) = partial else {
            return Ok(());
        };
        if self.contains(partial) {
            return Ok(());
        }
        let same_container =
            wm.parent(partial).map_err(host_err)? == wm.parent(self.window1).map_err(host_err)?;
        if same_container {
            for window in self.windows() {
                wm.set_visible(window, false).map_err(host_err)?;
            }
            self.windows_force_hidden = true;
        }
        Ok(())
    }

    pub fn on_overview_ending<W: WindowSystem>(&mut self, wm: &W) -> Result<(), GroupError> {
        if self.windows_force_hidden {
            for window in self.windows() {
                wm.set_visible(window, true).map_err(host_err)?;
            }
            self.windows_force_hidden = false;
        }
        Ok(())
    }

    /// The overview exit animation finished: show the divider again and
    /// re-tile the windows.
    pub fn on_overview_ending_animation_complete<W: WindowSystem>(
        &mut self,
        wm: &W,
    ) -> Result<(), GroupError> {
        if self.minimized {
            return Ok(());
        }
        self.show_divider_and_refresh(wm)
    }
}

//  Tests
