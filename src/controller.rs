//! The registry that ties snap groups, the host window system and shell
//! events together.
//!
//! [`SnapGroupController`] owns every [`SnapGroup`] and the window → group
//! index.  It reacts to [`ShellEvent`]s by creating, updating and removing
//! groups, and it answers the queries other parts of the shell ask about
//! them (is this pair grouped, which group is on top, …).
//!
//! Removing a group unlinks it immediately but keeps the object alive in a
//! pending-release queue until [`SnapGroupController::flush_pending_releases`]
//! runs at the end of the current event-loop iteration.

use crate::config::SnapGroupConfig;
use crate::divider::DividerError;
use crate::event::{
    ContainerId, DisplayChanges, DisplayId, ExitPoint, GroupId, ShellEvent, SnapActionSource,
    SnapPosition, TabletState, WindowId, WindowStateType,
};
use crate::geometry::{can_fit, ratios_complement, Orientation, Point, Rect};
use crate::snap_group::{GroupError, GroupReaction, SnapGroup};
use crate::traits::{GroupEvent, WindowSystem};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Instant;

/// Possible errors from the controller.
///
/// Every variant except [`WindowSystem`](ControllerError::WindowSystem) and
/// [`Divider`](ControllerError::Divider) is a precondition rejection: no
/// group was created and the caller decides how to fall back.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("{0} and {1} have different parents")]
    DifferentParents(WindowId, WindowId),
    #[error("{0} and {1} do not fit the work area side by side")]
    DoesNotFit(WindowId, WindowId),
    #[error("{0} is already in a snap group")]
    AlreadyGrouped(WindowId),
    #[error("{0} is visible on all workspaces")]
    VisibleOnAllWorkspaces(WindowId),
    #[error("{0} is not snapped")]
    NotSnapped(WindowId),
    #[error("{0} and {1} are not snapped to opposite sides")]
    SameSide(WindowId, WindowId),
    #[error("snap groups are unavailable in tablet mode")]
    TabletMode,
    /// The window system returned an error.
    #[error("window system error: {0}")]
    WindowSystem(String),
    #[error(transparent)]
    Divider(DividerError),
}

impl ControllerError {
    /// Whether this is a precondition rejection rather than a failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            ControllerError::WindowSystem(_) | ControllerError::Divider(_)
        )
    }
}

impl From<GroupError> for ControllerError {
    fn from(e: GroupError) -> Self {
        match e {
            GroupError::WindowSystem(msg) => ControllerError::WindowSystem(msg),
            GroupError::Divider(d) => ControllerError::Divider(d),
        }
    }
}

fn host_err<E: std::error::Error>(e: E) -> ControllerError {
    ControllerError::WindowSystem(e.to_string())
}

/// What happened when a window was snapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapOutcome {
    /// The window replaced a member of an existing group.
    Replaced(GroupId),
    /// The window was grouped with the window snapped opposite it.
    Grouped(GroupId),
    /// The window stays snapped on its own.
    Independent,
}

/// Owns all snap groups and keeps the window → group index consistent.
///
/// The controller is generic over any [`WindowSystem`], so it is
/// independent of a concrete host.  It is constructed by the composition
/// root and handed around by reference.
///
/// # Typical usage
///
/// ```ignore
/// let mut controller = SnapGroupController::new(host, config.snap_groups);
/// controller.handle(ShellEvent::WindowSnapped { window, source })?;
/// controller.flush_pending_releases();
/// ```
pub struct SnapGroupController<W: WindowSystem> {
    wm: W,
    config: SnapGroupConfig,
    groups: Vec<SnapGroup>,
    /// Derived from `groups`; must always agree with it.
    window_to_group: HashMap<WindowId, GroupId>,
    /// Unlinked groups waiting for the end of the event-loop iteration.
    pending_release: Vec<SnapGroup>,
    next_group_id: u64,
    tablet_state: TabletState,
    /// From overview start until its exit animation completes.
    in_overview: bool,
    event_tx: Option<mpsc::Sender<GroupEvent>>,
}

impl<W: WindowSystem> SnapGroupController<W> {
    /// Create a controller with no groups.
    pub fn new(wm: W, config: SnapGroupConfig) -> Self {
        Self {
            wm,
            config,
            groups: Vec::new(),
            window_to_group: HashMap::new(),
            pending_release: Vec::new(),
            next_group_id: 1,
            tablet_state: TabletState::default(),
            in_overview: false,
            event_tx: None,
        }
    }

    /// Attach a telemetry channel.  See [`GroupEvent`].
    pub fn set_event_channel(&mut self, tx: mpsc::Sender<GroupEvent>) {
        self.event_tx = Some(tx);
    }

    /// The host window system.
    pub fn window_system(&self) -> &W {
        &self.wm
    }

    pub fn config(&self) -> &SnapGroupConfig {
        &self.config
    }

    /// Live groups in creation order.
    pub fn groups(&self) -> &[SnapGroup] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn snap_group(&self, id: GroupId) -> Option<&SnapGroup> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn snap_group_for_window(&self, window: WindowId) -> Option<&SnapGroup> {
        let id = self.window_to_group.get(&window)?;
        self.snap_group(*id)
    }

    /// Whether `a` and `b` belong to the same group.
    pub fn are_windows_in_snap_group(&self, a: WindowId, b: WindowId) -> bool {
        match (self.window_to_group.get(&a), self.window_to_group.get(&b)) {
            (Some(ga), Some(gb)) => ga == gb,
            _ => false,
        }
    }

    pub fn is_grouped(&self, window: WindowId) -> bool {
        self.window_to_group.contains_key(&window)
    }

    pub fn tablet_state(&self) -> TabletState {
        self.tablet_state
    }

    /// Number of removed groups not yet released.
    pub fn pending_release_count(&self) -> usize {
        self.pending_release.len()
    }

    //  Creation and removal

    /// Group two snapped windows.
    ///
    /// Rejected when the windows have different parents, cannot fit the work
    /// area side by side, are already grouped, are visible on all
    /// workspaces, are not snapped to opposite sides, or when tablet mode is
    /// active.
    pub fn add_snap_group(&mut self, a: WindowId, b: WindowId) -> Result<GroupId, ControllerError> {
        self.add_snap_group_with(a, b, None, None)
    }

    fn add_snap_group_with(
        &mut self,
        a: WindowId,
        b: WindowId,
        actual_created_at: Option<Instant>,
        source: Option<SnapActionSource>,
    ) -> Result<GroupId, ControllerError> {
        self.check_can_group(a, b)?;

        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        let mut group = SnapGroup::new(id, &self.wm, a, b, &self.config, actual_created_at)?;
        // A pre-existing gap only keeps the divider hidden while overview
        // is still restoring windows.
        if !self.in_overview && !group.divider().is_visible() {
            group.show_divider_and_refresh(&self.wm)?;
        }
        let (window1, window2) = (group.window1(), group.window2());
        self.window_to_group.insert(window1, id);
        self.window_to_group.insert(window2, id);
        self.groups.push(group);
        self.check_index();

        info!("{}: grouped {} (primary) and {} (secondary)", id, window1, window2);
        self.emit(GroupEvent::Created {
            group: id,
            window1,
            window2,
            source,
        });
        Ok(id)
    }

    fn check_can_group(&self, a: WindowId, b: WindowId) -> Result<(), ControllerError> {
        if self.tablet_state.in_tablet_mode() {
            return Err(ControllerError::TabletMode);
        }
        if a == b {
            return Err(ControllerError::SameSide(a, b));
        }
        for window in [a, b] {
            if self.is_grouped(window) {
                return Err(ControllerError::AlreadyGrouped(window));
            }
        }
        if self.wm.parent(a).map_err(host_err)? != self.wm.parent(b).map_err(host_err)? {
            return Err(ControllerError::DifferentParents(a, b));
        }
        for window in [a, b] {
            if self.wm.is_visible_on_all_workspaces(window).map_err(host_err)? {
                return Err(ControllerError::VisibleOnAllWorkspaces(window));
            }
        }
        let side_a = self.snap_position(a)?.ok_or(ControllerError::NotSnapped(a))?;
        let side_b = self.snap_position(b)?.ok_or(ControllerError::NotSnapped(b))?;
        if side_a == side_b {
            return Err(ControllerError::SameSide(a, b));
        }
        if !self.pair_fits(a, b)? {
            return Err(ControllerError::DoesNotFit(a, b));
        }
        Ok(())
    }

    fn snap_position(&self, window: WindowId) -> Result<Option<SnapPosition>, ControllerError> {
        Ok(self.wm.state_type(window).map_err(host_err)?.snap_position())
    }

    /// Whether the minimum sizes of `a` and `b` leave room for both plus the
    /// divider on `a`'s display.
    fn pair_fits(&self, a: WindowId, b: WindowId) -> Result<bool, ControllerError> {
        let display = self.wm.display_of(a).map_err(host_err)?;
        let work_area = self.wm.work_area(display).map_err(host_err)?;
        let orientation = Orientation::for_work_area(&work_area);
        let min_a = orientation.size_along(&self.wm.minimum_size(a).map_err(host_err)?);
        let min_b = orientation.size_along(&self.wm.minimum_size(b).map_err(host_err)?);
        Ok(can_fit(
            orientation.length(&work_area),
            self.config.divider_thickness,
            min_a,
            min_b,
        ))
    }

    /// Unlink group `id`, restore its windows to their solo snapped bounds
    /// and queue it for release.  Returns `false` if there is no such group.
    pub fn remove_snap_group(&mut self, id: GroupId, reason: ExitPoint) -> bool {
        let Some(index) = self.groups.iter().position(|g| g.id() == id) else {
            debug!("{}: already removed", id);
            return false;
        };
        let mut group = self.groups.remove(index);
        for window in group.windows() {
            self.window_to_group.remove(&window);
        }
        self.check_index();

        group.restore_solo_bounds(&self.wm);
        let lifetime = match reason {
            ExitPoint::SnapToReplace => None,
            _ => Some(group.actual_created_at().elapsed()),
        };
        info!("{}: removed ({})", id, reason);
        self.emit(GroupEvent::Removed {
            group: id,
            reason,
            lifetime,
        });
        self.pending_release.push(group);
        true
    }

    pub fn remove_snap_group_containing_window(&mut self, window: WindowId, reason: ExitPoint) -> bool {
        match self.window_to_group.get(&window).copied() {
            Some(id) => self.remove_snap_group(id, reason),
            None => false,
        }
    }

    /// Remove every group.
    pub fn remove_all(&mut self, reason: ExitPoint) {
        let ids: Vec<GroupId> = self.groups.iter().map(|g| g.id()).collect();
        for id in ids {
            self.remove_snap_group(id, reason);
        }
    }

    /// Release groups removed during the current event-loop iteration.
    /// Returns how many were released.
    pub fn flush_pending_releases(&mut self) -> usize {
        let released = self.pending_release.len();
        if released > 0 {
            debug!("releasing {} snap group(s)", released);
            self.pending_release.clear();
        }
        released
    }

    //  Snapping

    /// A window was just snapped: try snap-to-replace, then automatic
    /// grouping with the window snapped opposite it.
    pub fn on_window_snapped(
        &mut self,
        candidate: WindowId,
        source: SnapActionSource,
    ) -> Result<SnapOutcome, ControllerError> {
        if let Some(id) = self.window_to_group.get(&candidate) {
            return Ok(SnapOutcome::Grouped(*id));
        }
        if self.on_snapping_window(candidate, source)? {
            let id = self.window_to_group.get(&candidate).copied();
            return Ok(id.map_or(SnapOutcome::Independent, SnapOutcome::Replaced));
        }
        if !self.config.automatically_lock_group {
            return Ok(SnapOutcome::Independent);
        }
        let Some(side) = self.snap_position(candidate)? else {
            return Ok(SnapOutcome::Independent);
        };
        let Some(sibling) = self.topmost_snapped_at(candidate, side.opposite())? else {
            return Ok(SnapOutcome::Independent);
        };
        if self.is_grouped(sibling) {
            return Ok(SnapOutcome::Independent);
        }
        match self.add_snap_group_with(candidate, sibling, None, Some(source)) {
            Ok(id) => Ok(SnapOutcome::Grouped(id)),
            Err(e) if e.is_rejection() => {
                debug!("not grouping {} with {}: {}", candidate, sibling, e);
                Ok(SnapOutcome::Independent)
            }
            Err(e) => Err(e),
        }
    }

    /// Snap-to-replace: if the window snapped opposite `candidate` belongs to
    /// a group, swap the group's member on `candidate`'s side for
    /// `candidate`.  Returns whether a replacement happened.
    pub fn on_snapping_window(
        &mut self,
        candidate: WindowId,
        source: SnapActionSource,
    ) -> Result<bool, ControllerError> {
        if self.tablet_state.in_tablet_mode() || self.is_grouped(candidate) {
            return Ok(false);
        }
        let Some(side) = self.snap_position(candidate)? else {
            return Ok(false);
        };
        let Some(opposite) = self.topmost_snapped_at(candidate, side.opposite())? else {
            return Ok(false);
        };
        let Some(group_id) = self.window_to_group.get(&opposite).copied() else {
            return Ok(false);
        };
        self.replace_in_group(candidate, group_id, source)
    }

    /// Topmost window other than `exclude` in `exclude`'s container that is
    /// snapped to `side`.
    fn topmost_snapped_at(
        &self,
        exclude: WindowId,
        side: SnapPosition,
    ) -> Result<Option<WindowId>, ControllerError> {
        let container = self.wm.parent(exclude).map_err(host_err)?;
        for window in self.wm.window_stack(container).map_err(host_err)? {
            if window != exclude && self.snap_position(window)? == Some(side) {
                return Ok(Some(window));
            }
        }
        Ok(None)
    }

    fn replace_in_group(
        &mut self,
        candidate: WindowId,
        group_id: GroupId,
        source: SnapActionSource,
    ) -> Result<bool, ControllerError> {
        let Some(side) = self.snap_position(candidate)? else {
            return Ok(false);
        };
        let Some(group) = self.snap_group(group_id) else {
            return Ok(false);
        };
        let displaced = group.window_at(side);
        let survivor = group.window_at(side.opposite());
        let actual_created_at = group.actual_created_at();
        let preserved_ratio = group.primary_ratio(&self.wm)?;

        let default = self.config.default_ratio;
        let incoming_ratio = self.wm.snap_ratio(candidate).map_err(host_err)?.unwrap_or(default);
        let displaced_ratio = self.wm.snap_ratio(displaced).map_err(host_err)?.unwrap_or(default);
        let diff = (incoming_ratio - displaced_ratio).abs();
        if diff > self.config.snap_to_replace_threshold {
            debug!(
                "not replacing {} with {}: ratio differs by {:.3}",
                displaced, candidate, diff
            );
            return Ok(false);
        }
        if self.wm.parent(candidate).map_err(host_err)? != self.wm.parent(survivor).map_err(host_err)?
            || self.wm.is_visible_on_all_workspaces(candidate).map_err(host_err)?
            || !self.pair_fits(candidate, survivor)?
        {
            debug!("not replacing {} with {}: pair not eligible", displaced, candidate);
            return Ok(false);
        }

        info!("{}: replacing {} with {} ({:?})", group_id, displaced, candidate, source);
        self.remove_snap_group(group_id, ExitPoint::SnapToReplace);
        let new_id =
            self.add_snap_group_with(candidate, survivor, Some(actual_created_at), Some(source))?;
        if let Some(group) = self.groups.iter_mut().find(|g| g.id() == new_id) {
            group.apply_primary_ratio(&self.wm, preserved_ratio)?;
        }
        Ok(true)
    }

    /// Find a window on the active container that could replace a member of
    /// the topmost group: it must be snapped with a ratio that exactly
    /// complements the group member opposite it.  Returns `(candidate,
    /// displaced)` without changing anything.
    pub fn window_pair_for_snap_to_replace_with_keyboard_shortcut(
        &self,
    ) -> Result<Option<(WindowId, WindowId)>, ControllerError> {
        let Some(group) = self
            .topmost_snap_group()?
            .and_then(|id| self.snap_group(id))
        else {
            return Ok(None);
        };
        let container = self.wm.active_container().map_err(host_err)?;
        for window in self.wm.window_stack(container).map_err(host_err)? {
            if self.is_grouped(window) || !self.wm.is_visible(window).map_err(host_err)? {
                continue;
            }
            let Some(side) = self.snap_position(window)? else {
                continue;
            };
            let opposite = group.window_at(side.opposite());
            let (Some(ratio), Some(opposite_ratio)) = (
                self.wm.snap_ratio(window).map_err(host_err)?,
                self.wm.snap_ratio(opposite).map_err(host_err)?,
            ) else {
                continue;
            };
            if ratios_complement(ratio, opposite_ratio) {
                return Ok(Some((window, group.window_at(side))));
            }
        }
        Ok(None)
    }

    /// Keyboard-shortcut snap-to-replace on the active container.
    pub fn snap_to_replace_with_keyboard_shortcut(&mut self) -> Result<bool, ControllerError> {
        let Some((candidate, displaced)) =
            self.window_pair_for_snap_to_replace_with_keyboard_shortcut()?
        else {
            return Ok(false);
        };
        let Some(group_id) = self.window_to_group.get(&displaced).copied() else {
            return Ok(false);
        };
        self.replace_in_group(candidate, group_id, SnapActionSource::KeyboardShortcut)
    }

    //  Queries

    /// The highest-stacked group on the active container.
    pub fn topmost_snap_group(&self) -> Result<Option<GroupId>, ControllerError> {
        let container = self.wm.active_container().map_err(host_err)?;
        for window in self.wm.window_stack(container).map_err(host_err)? {
            if let Some(id) = self.window_to_group.get(&window) {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }

    /// The highest-stacked group in `container` whose windows are both
    /// visible.
    pub fn topmost_visible_snap_group(
        &self,
        container: ContainerId,
    ) -> Result<Option<GroupId>, ControllerError> {
        for window in self.wm.window_stack(container).map_err(host_err)? {
            let Some(group) = self.snap_group_for_window(window) else {
                continue;
            };
            let mut visible = true;
            for member in group.windows() {
                visible &= self.wm.is_visible(member).map_err(host_err)?;
            }
            if visible {
                return Ok(Some(group.id()));
            }
        }
        Ok(None)
    }

    //  Group operations

    fn group_mut(&mut self, window: WindowId) -> Option<&mut SnapGroup> {
        let id = *self.window_to_group.get(&window)?;
        self.groups.iter_mut().find(|g| g.id() == id)
    }

    pub fn start_resize(&mut self, window: WindowId, point: Point) -> Result<(), ControllerError> {
        let Some(group) = self.group_mut(window) else {
            debug!("resize start for ungrouped {}", window);
            return Ok(());
        };
        group.start_resize(point)?;
        Ok(())
    }

    pub fn update_resize(&mut self, window: WindowId, point: Point) -> Result<(), ControllerError> {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            return Ok(());
        };
        let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) else {
            return Ok(());
        };
        group.update_resize(&self.wm, point)?;
        Ok(())
    }

    pub fn end_resize(&mut self, window: WindowId, point: Point) -> Result<(), ControllerError> {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            return Ok(());
        };
        let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) else {
            return Ok(());
        };
        let primary_ratio = group.end_resize(&self.wm, point)?;
        debug!("{}: resized to {:.3}", id, primary_ratio);
        self.emit(GroupEvent::Resized {
            group: id,
            primary_ratio,
        });
        Ok(())
    }

    /// Minimize both windows of the group containing `window`.
    pub fn minimize_snap_group(&mut self, window: WindowId) -> Result<(), ControllerError> {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            return Ok(());
        };
        if let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) {
            group.minimize(&self.wm)?;
        }
        Ok(())
    }

    //  Window events

    pub fn on_window_destroyed(&mut self, window: WindowId) {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            debug!("{} destroyed, not grouped", window);
            return;
        };
        let reaction = self
            .snap_group(id)
            .map_or(GroupReaction::Keep, |g| g.on_window_destroyed(window));
        if let GroupReaction::Remove(reason) = reaction {
            self.remove_snap_group(id, reason);
        }
    }

    pub fn on_state_type_changed(
        &mut self,
        window: WindowId,
        new: WindowStateType,
    ) -> Result<(), ControllerError> {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            return Ok(());
        };
        let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) else {
            return Ok(());
        };
        if let GroupReaction::Remove(reason) = group.on_state_type_changed(&self.wm, window, new)? {
            self.remove_snap_group(id, reason);
        }
        Ok(())
    }

    pub fn on_window_drag_moved(&mut self, window: WindowId, bounds: Rect) -> Result<(), ControllerError> {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            return Ok(());
        };
        if let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) {
            group.on_window_drag_moved(&self.wm, window, bounds)?;
        }
        Ok(())
    }

    pub fn on_window_drag_ended(&mut self, window: WindowId) -> Result<(), ControllerError> {
        let Some(id) = self.window_to_group.get(&window).copied() else {
            return Ok(());
        };
        if let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) {
            group.on_window_drag_ended(&self.wm, window)?;
        }
        Ok(())
    }

    //  Lifecycle forwarding

    /// Run `f` on every live group, then remove the groups that asked for
    /// it.  Host errors are logged per group so one bad group does not stop
    /// the others.
    fn broadcast<F>(&mut self, what: &str, mut f: F)
    where
        F: FnMut(&mut SnapGroup, &W) -> Result<GroupReaction, GroupError>,
    {
        let mut removals = Vec::new();
        for group in &mut self.groups {
            match f(group, &self.wm) {
                Ok(GroupReaction::Keep) => {}
                Ok(GroupReaction::Remove(reason)) => removals.push((group.id(), reason)),
                Err(e) => warn!("{}: {} failed: {}", group.id(), what, e),
            }
        }
        for (id, reason) in removals {
            self.remove_snap_group(id, reason);
        }
    }

    pub fn on_display_metrics_changed(&mut self, display: DisplayId, changes: DisplayChanges) {
        self.broadcast("display change", |group, wm| {
            group.on_display_metrics_changed(wm, display, changes)
        });
    }

    pub fn on_overview_mode_starting(&mut self, partial: Option<WindowId>) {
        self.in_overview = true;
        self.broadcast("overview start", |group, wm| {
            group.on_overview_starting(wm, partial)?;
            Ok(GroupReaction::Keep)
        });
    }

    pub fn on_overview_mode_ending(&mut self) {
        self.broadcast("overview end", |group, wm| {
            group.on_overview_ending(wm)?;
            Ok(GroupReaction::Keep)
        });
    }

    pub fn on_overview_mode_ending_animation_complete(&mut self, canceled: bool) {
        debug!("overview animation complete (canceled: {})", canceled);
        self.in_overview = false;
        self.broadcast("overview animation end", |group, wm| {
            group.on_overview_ending_animation_complete(wm)?;
            Ok(GroupReaction::Keep)
        });
    }

    /// Entering tablet mode tears down every group.  Leaving it does not
    /// bring them back.
    pub fn on_display_tablet_state_changed(&mut self, state: TabletState) {
        let was_tablet = self.tablet_state.in_tablet_mode();
        self.tablet_state = state;
        if state.in_tablet_mode() {
            if !self.groups.is_empty() {
                info!("tablet mode: removing {} snap group(s)", self.groups.len());
            }
            self.remove_all(ExitPoint::TabletTransition);
        } else if was_tablet {
            info!("left tablet mode");
        }
    }

    //  Event dispatch

    /// Process a single [`ShellEvent`].
    ///
    /// Precondition rejections (e.g. an explicit `AddGroup` that cannot be
    /// honoured) and out-of-order divider calls are returned as errors; the
    /// controller state is unchanged in both cases.
    pub fn handle(&mut self, event: ShellEvent) -> Result<(), ControllerError> {
        match event {
            ShellEvent::WindowSnapped { window, source } => {
                let outcome = self.on_window_snapped(window, source)?;
                debug!("{} snapped via {:?}: {:?}", window, source, outcome);
            }
            ShellEvent::StateTypeChanged { window, old, new } => {
                debug!("{}: {:?} -> {:?}", window, old, new);
                self.on_state_type_changed(window, new)?;
            }
            ShellEvent::WindowDestroyed { window } => self.on_window_destroyed(window),
            ShellEvent::WindowDragMoved { window, bounds } => {
                self.on_window_drag_moved(window, bounds)?;
            }
            ShellEvent::WindowDragEnded { window } => self.on_window_drag_ended(window)?,
            ShellEvent::DividerResizeStarted { window, point } => self.start_resize(window, point)?,
            ShellEvent::DividerResizeUpdated { window, point } => {
                self.update_resize(window, point)?;
            }
            ShellEvent::DividerResizeEnded { window, point } => self.end_resize(window, point)?,
            ShellEvent::AddGroup { window1, window2 } => {
                self.add_snap_group(window1, window2)?;
            }
            ShellEvent::RemoveGroup { window } => {
                if !self.remove_snap_group_containing_window(window, ExitPoint::UserUnlock) {
                    debug!("{} is not grouped, nothing to unlock", window);
                }
            }
            ShellEvent::MinimizeGroup { window } => self.minimize_snap_group(window)?,
            ShellEvent::SnapToReplaceWithKeyboard => {
                let replaced = self.snap_to_replace_with_keyboard_shortcut()?;
                debug!("keyboard snap-to-replace: {}", replaced);
            }
            ShellEvent::DisplayMetricsChanged { display, changes } => {
                self.on_display_metrics_changed(display, changes);
            }
            ShellEvent::OverviewStarting { partial } => self.on_overview_mode_starting(partial),
            ShellEvent::OverviewEnding => self.on_overview_mode_ending(),
            ShellEvent::OverviewEndingAnimationComplete { canceled } => {
                self.on_overview_mode_ending_animation_complete(canceled);
            }
            ShellEvent::TabletStateChanged(state) => self.on_display_tablet_state_changed(state),
        }
        Ok(())
    }

    //  Helpers

    fn emit(&self, event: GroupEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// The index must mirror the group list exactly.  A mismatch is a bug,
    /// so fail fast.
    fn check_index(&self) {
        assert_eq!(
            self.window_to_group.len(),
            self.groups.len() * 2,
            "snap group index out of sync with group list"
        );
        for group in &self.groups {
            for window in group.windows() {
                assert_eq!(
                    self.window_to_group.get(&window),
                    Some(&group.id()),
                    "{} not indexed to {}",
                    window,
                    group.id()
                );
            }
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DisplayId;
    use crate::geometry::Size;
    use crate::host::headless::HeadlessWindowSystem;

    const WORK_AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 800,
        height: 700,
    };

    struct Fixture {
        ctl: SnapGroupController<HeadlessWindowSystem>,
        display: DisplayId,
        desk: ContainerId,
    }

    impl Fixture {
        fn new(config: SnapGroupConfig) -> Self {
            let host = HeadlessWindowSystem::new();
            let display = host.add_display(WORK_AREA);
            let desk = host.add_desk(display).unwrap();
            Self {
                ctl: SnapGroupController::new(host, config),
                display,
                desk,
            }
        }

        /// Fixture that only groups windows when asked to.
        fn manual() -> Self {
            Self::new(SnapGroupConfig {
                automatically_lock_group: false,
                ..SnapGroupConfig::default()
            })
        }

        fn host(&self) -> &HeadlessWindowSystem {
            self.ctl.window_system()
        }

        fn window(&self) -> WindowId {
            self.host().add_window(self.desk, Rect::new(10, 10, 200, 200)).unwrap()
        }

        fn feed(&mut self, events: Vec<ShellEvent>) {
            for event in events {
                self.ctl.handle(event).unwrap();
            }
            self.ctl.flush_pending_releases();
        }

        /// Snap `window` and deliver the resulting events.
        fn snap(&mut self, window: WindowId, position: SnapPosition, ratio: f64) {
            let events = self.host().snap(window, position, ratio).unwrap();
            self.feed(events);
        }

        /// Snap `window` without telling the controller.
        fn snap_quietly(&self, window: WindowId, position: SnapPosition, ratio: f64) {
            self.host().snap(window, position, ratio).unwrap();
        }
    }

    fn grouped_pair(fx: &mut Fixture) -> (WindowId, WindowId, GroupId) {
        let w1 = fx.window();
        let w2 = fx.window();
        fx.snap_quietly(w1, SnapPosition::Primary, 0.5);
        fx.snap_quietly(w2, SnapPosition::Secondary, 0.5);
        let id = fx.ctl.add_snap_group(w1, w2).unwrap();
        (w1, w2, id)
    }

    #[test]
    fn add_then_destroy_member() {
        let mut fx = Fixture::manual();
        let (w1, w2, _) = grouped_pair(&mut fx);
        assert_eq!(fx.ctl.group_count(), 1);
        assert!(fx.ctl.are_windows_in_snap_group(w1, w2));

        let events = fx.host().destroy(w1).unwrap();
        fx.ctl.handle(events[0].clone()).unwrap();
        assert_eq!(fx.ctl.group_count(), 0);
        assert!(!fx.ctl.is_grouped(w2));
        assert!(fx.ctl.snap_group_for_window(w2).is_none());
        // Released on the next tick, not synchronously.
        assert_eq!(fx.ctl.pending_release_count(), 1);
        assert_eq!(fx.ctl.flush_pending_releases(), 1);
        assert_eq!(fx.ctl.pending_release_count(), 0);
        // The survivor is back to its solo snapped bounds.
        assert_eq!(fx.host().bounds(w2).unwrap(), Rect::new(400, 0, 400, 700));
    }

    #[test]
    fn add_canonicalises_order() {
        let mut fx = Fixture::manual();
        let a = fx.window();
        let b = fx.window();
        fx.snap_quietly(a, SnapPosition::Secondary, 0.5);
        fx.snap_quietly(b, SnapPosition::Primary, 0.5);
        let id = fx.ctl.add_snap_group(a, b).unwrap();
        let group = fx.ctl.snap_group(id).unwrap();
        assert_eq!(group.window1(), b);
        assert_eq!(group.window2(), a);
    }

    #[test]
    fn window_can_only_be_in_one_group() {
        let mut fx = Fixture::manual();
        let (_, w2, _) = grouped_pair(&mut fx);
        let w3 = fx.window();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.5);
        assert!(matches!(
            fx.ctl.add_snap_group(w3, w2),
            Err(ControllerError::AlreadyGrouped(w)) if w == w2
        ));
        assert_eq!(fx.ctl.group_count(), 1);
    }

    #[test]
    fn rejects_different_parents() {
        let mut fx = Fixture::manual();
        let other_desk = fx.host().add_desk(fx.display).unwrap();
        let a = fx.window();
        let b = fx.host().add_window(other_desk, Rect::new(0, 0, 100, 100)).unwrap();
        fx.snap_quietly(a, SnapPosition::Primary, 0.5);
        fx.snap_quietly(b, SnapPosition::Secondary, 0.5);
        assert!(matches!(
            fx.ctl.add_snap_group(a, b),
            Err(ControllerError::DifferentParents(..))
        ));
    }

    #[test]
    fn rejects_pair_that_does_not_fit() {
        let mut fx = Fixture::manual();
        let a = fx.window();
        let b = fx.window();
        fx.host().set_minimum_size(a, Size::new(450, 0)).unwrap();
        fx.host().set_minimum_size(b, Size::new(450, 0)).unwrap();
        fx.snap_quietly(a, SnapPosition::Primary, 0.5);
        fx.snap_quietly(b, SnapPosition::Secondary, 0.5);
        let err = fx.ctl.add_snap_group(a, b).unwrap_err();
        assert!(matches!(err, ControllerError::DoesNotFit(..)));
        assert!(err.is_rejection());
    }

    #[test]
    fn rejects_visible_on_all_workspaces() {
        let mut fx = Fixture::manual();
        let a = fx.window();
        let b = fx.window();
        fx.host().set_visible_on_all_workspaces(b, true).unwrap();
        fx.snap_quietly(a, SnapPosition::Primary, 0.5);
        fx.snap_quietly(b, SnapPosition::Secondary, 0.5);
        assert!(matches!(
            fx.ctl.add_snap_group(a, b),
            Err(ControllerError::VisibleOnAllWorkspaces(w)) if w == b
        ));
    }

    #[test]
    fn rejects_unsnapped_and_same_side() {
        let mut fx = Fixture::manual();
        let a = fx.window();
        let b = fx.window();
        fx.snap_quietly(a, SnapPosition::Primary, 0.5);
        assert!(matches!(
            fx.ctl.add_snap_group(a, b),
            Err(ControllerError::NotSnapped(w)) if w == b
        ));
        fx.snap_quietly(b, SnapPosition::Primary, 0.5);
        assert!(matches!(
            fx.ctl.add_snap_group(a, b),
            Err(ControllerError::SameSide(..))
        ));
    }

    #[test]
    fn snapping_opposite_windows_groups_them() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (tx, rx) = mpsc::channel();
        fx.ctl.set_event_channel(tx);
        let w1 = fx.window();
        let w2 = fx.window();
        fx.snap(w1, SnapPosition::Primary, 0.5);
        assert_eq!(fx.ctl.group_count(), 0);
        fx.snap(w2, SnapPosition::Secondary, 0.5);
        assert_eq!(fx.ctl.group_count(), 1);
        assert!(fx.ctl.are_windows_in_snap_group(w1, w2));
        let events: Vec<GroupEvent> = rx.try_iter().collect();
        assert!(matches!(
            events.as_slice(),
            [GroupEvent::Created { window1, window2, .. }] if *window1 == w1 && *window2 == w2
        ));
    }

    #[test]
    fn manual_mode_does_not_auto_group() {
        let mut fx = Fixture::manual();
        let w1 = fx.window();
        let w2 = fx.window();
        fx.snap(w1, SnapPosition::Primary, 0.5);
        fx.snap(w2, SnapPosition::Secondary, 0.5);
        assert_eq!(fx.ctl.group_count(), 0);
    }

    #[test]
    fn snap_to_replace_within_threshold() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (tx, rx) = mpsc::channel();
        let (w1, w2, old_id) = grouped_pair(&mut fx);
        let first_created = fx.ctl.snap_group(old_id).unwrap().actual_created_at();
        fx.ctl.set_event_channel(tx);

        let w3 = fx.window();
        fx.snap(w3, SnapPosition::Primary, 0.52);

        assert_eq!(fx.ctl.group_count(), 1);
        assert!(fx.ctl.are_windows_in_snap_group(w3, w2));
        assert!(!fx.ctl.is_grouped(w1));
        let group = fx.ctl.snap_group_for_window(w3).unwrap();
        assert_eq!(group.window1(), w3);
        assert_eq!(group.window2(), w2);
        assert_ne!(group.id(), old_id);
        assert_eq!(group.actual_created_at(), first_created);
        // The old group's primary ratio carries over.
        assert_eq!(fx.host().bounds(w3).unwrap(), Rect::new(0, 0, 396, 700));
        assert_eq!(fx.host().bounds(w2).unwrap(), Rect::new(404, 0, 396, 700));

        let events: Vec<GroupEvent> = rx.try_iter().collect();
        assert!(matches!(
            events[0],
            GroupEvent::Removed { reason: ExitPoint::SnapToReplace, lifetime: None, .. }
        ));
        assert!(matches!(events[1], GroupEvent::Created { .. }));
    }

    #[test]
    fn snap_to_replace_with_smaller_ratio_shows_divider() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, _) = grouped_pair(&mut fx);
        let w3 = fx.window();
        // Restoring w2 to its solo bounds leaves a 16px gap next to w3.
        fx.snap(w3, SnapPosition::Primary, 0.48);

        let group = fx.ctl.snap_group_for_window(w3).unwrap();
        assert!(!fx.ctl.is_grouped(w1));
        assert!(group.divider().is_visible());
        assert_eq!(group.divider().position(), 396);
        assert_eq!(fx.host().bounds(w3).unwrap(), Rect::new(0, 0, 396, 700));
        assert_eq!(fx.host().bounds(w2).unwrap(), Rect::new(404, 0, 396, 700));

        fx.feed(vec![
            ShellEvent::DividerResizeStarted {
                window: w3,
                point: Point::new(400, 350),
            },
            ShellEvent::DividerResizeEnded {
                window: w3,
                point: Point::new(300, 350),
            },
        ]);
        assert_eq!(fx.host().bounds(w3).unwrap().width, 296);
    }

    #[test]
    fn snap_to_replace_rejected_when_pair_does_not_fit() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, id) = grouped_pair(&mut fx);
        fx.host().set_minimum_size(w2, Size::new(300, 0)).unwrap();
        let w3 = fx.window();
        fx.host().set_minimum_size(w3, Size::new(500, 0)).unwrap();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.5);

        assert!(!fx.ctl.on_snapping_window(w3, SnapActionSource::DragWindowToEdge).unwrap());
        assert!(fx.ctl.are_windows_in_snap_group(w1, w2));
        assert_eq!(fx.ctl.snap_group_for_window(w2).unwrap().id(), id);
        assert!(!fx.ctl.is_grouped(w3));
    }

    #[test]
    fn snap_to_replace_rejects_window_on_all_workspaces() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, id) = grouped_pair(&mut fx);
        let w3 = fx.window();
        fx.host().set_visible_on_all_workspaces(w3, true).unwrap();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.5);

        assert!(!fx.ctl.on_snapping_window(w3, SnapActionSource::DragWindowToEdge).unwrap());
        assert!(fx.ctl.are_windows_in_snap_group(w1, w2));
        assert_eq!(fx.ctl.snap_group_for_window(w1).unwrap().id(), id);
    }

    #[test]
    fn snap_to_replace_ignores_groups_on_other_desks() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, id) = grouped_pair(&mut fx);
        let other_desk = fx.host().add_desk(fx.display).unwrap();
        let w3 = fx.host().add_window(other_desk, Rect::new(0, 0, 100, 100)).unwrap();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.5);

        assert!(!fx.ctl.on_snapping_window(w3, SnapActionSource::DragWindowToEdge).unwrap());
        assert!(fx.ctl.are_windows_in_snap_group(w1, w2));
        assert_eq!(fx.ctl.snap_group_for_window(w1).unwrap().id(), id);
    }

    #[test]
    fn gap_keeps_divider_hidden_only_during_overview() {
        let mut fx = Fixture::manual();
        let a = fx.window();
        let b = fx.window();
        fx.snap_quietly(a, SnapPosition::Primary, 0.4);
        fx.snap_quietly(b, SnapPosition::Secondary, 0.4);

        fx.feed(vec![ShellEvent::OverviewStarting { partial: None }]);
        let id = fx.ctl.add_snap_group(a, b).unwrap();
        assert!(!fx.ctl.snap_group(id).unwrap().divider().is_visible());
        fx.feed(vec![
            ShellEvent::OverviewEnding,
            ShellEvent::OverviewEndingAnimationComplete { canceled: false },
        ]);
        assert!(fx.ctl.snap_group(id).unwrap().divider().is_visible());

        let c = fx.window();
        let d = fx.window();
        fx.snap_quietly(c, SnapPosition::Primary, 0.4);
        fx.snap_quietly(d, SnapPosition::Secondary, 0.4);
        let id = fx.ctl.add_snap_group(c, d).unwrap();
        assert!(fx.ctl.snap_group(id).unwrap().divider().is_visible());
        assert_eq!(fx.host().bounds(c).unwrap(), Rect::new(0, 0, 316, 700));
        assert_eq!(fx.host().bounds(d).unwrap(), Rect::new(324, 0, 476, 700));
    }

    #[test]
    fn snap_to_replace_rejected_beyond_threshold() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, id) = grouped_pair(&mut fx);
        let w3 = fx.window();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.3);
        assert!(!fx.ctl.on_snapping_window(w3, SnapActionSource::DragWindowToEdge).unwrap());
        assert_eq!(
            fx.ctl.on_window_snapped(w3, SnapActionSource::DragWindowToEdge).unwrap(),
            SnapOutcome::Independent
        );
        assert!(fx.ctl.are_windows_in_snap_group(w1, w2));
        assert_eq!(fx.ctl.snap_group_for_window(w1).unwrap().id(), id);
    }

    #[test]
    fn snap_to_replace_secondary_side() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, _) = grouped_pair(&mut fx);
        let w3 = fx.window();
        fx.snap(w3, SnapPosition::Secondary, 0.5);
        let group = fx.ctl.snap_group_for_window(w3).unwrap();
        assert_eq!(group.window1(), w1);
        assert_eq!(group.window2(), w3);
        assert!(!fx.ctl.is_grouped(w2));
    }

    #[test]
    fn keyboard_pair_lookup_has_no_side_effects() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        let (w1, w2, id) = grouped_pair(&mut fx);
        let w3 = fx.window();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.5);

        let pair = fx
            .ctl
            .window_pair_for_snap_to_replace_with_keyboard_shortcut()
            .unwrap();
        assert_eq!(pair, Some((w3, w1)));
        assert_eq!(fx.ctl.snap_group_for_window(w1).unwrap().id(), id);

        fx.feed(vec![ShellEvent::SnapToReplaceWithKeyboard]);
        assert!(fx.ctl.are_windows_in_snap_group(w3, w2));
        assert!(!fx.ctl.is_grouped(w1));
    }

    #[test]
    fn keyboard_pair_requires_complementary_ratio() {
        let mut fx = Fixture::new(SnapGroupConfig::default());
        grouped_pair(&mut fx);
        let w3 = fx.window();
        fx.snap_quietly(w3, SnapPosition::Primary, 0.3);
        assert_eq!(
            fx.ctl
                .window_pair_for_snap_to_replace_with_keyboard_shortcut()
                .unwrap(),
            None
        );
    }

    #[test]
    fn tablet_mode_drains_all_groups() {
        let mut fx = Fixture::manual();
        grouped_pair(&mut fx);
        grouped_pair(&mut fx);
        assert_eq!(fx.ctl.group_count(), 2);

        fx.feed(vec![ShellEvent::TabletStateChanged(TabletState::EnteringTablet)]);
        assert_eq!(fx.ctl.group_count(), 0);

        let a = fx.window();
        let b = fx.window();
        fx.snap_quietly(a, SnapPosition::Primary, 0.5);
        fx.snap_quietly(b, SnapPosition::Secondary, 0.5);
        assert!(matches!(
            fx.ctl.add_snap_group(a, b),
            Err(ControllerError::TabletMode)
        ));

        fx.feed(vec![ShellEvent::TabletStateChanged(TabletState::ExitingTablet)]);
        // Nothing is rebuilt on exit.
        assert_eq!(fx.ctl.group_count(), 0);
        assert!(fx.ctl.add_snap_group(a, b).is_ok());
    }

    #[test]
    fn display_change_relayouts_preserving_ratio() {
        let mut fx = Fixture::manual();
        let (w1, w2, id) = grouped_pair(&mut fx);
        let events = fx
            .host()
            .set_work_area(fx.display, Rect::new(0, 0, 1000, 700))
            .unwrap();
        fx.feed(events);
        let group = fx.ctl.snap_group(id).unwrap();
        assert!((group.primary_ratio(fx.host()).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(fx.host().bounds(w1).unwrap(), Rect::new(0, 0, 496, 700));
        assert_eq!(fx.host().bounds(w2).unwrap(), Rect::new(504, 0, 496, 700));
    }

    #[test]
    fn display_change_that_breaks_fit_removes_group() {
        let mut fx = Fixture::manual();
        let (w1, w2, _) = grouped_pair(&mut fx);
        fx.host().set_minimum_size(w1, Size::new(380, 0)).unwrap();
        fx.host().set_minimum_size(w2, Size::new(380, 0)).unwrap();
        let events = fx
            .host()
            .set_work_area(fx.display, Rect::new(0, 0, 700, 600))
            .unwrap();
        fx.feed(events);
        assert_eq!(fx.ctl.group_count(), 0);
    }

    #[test]
    fn overview_hides_and_reshows_divider() {
        let mut fx = Fixture::manual();
        let (w1, _, id) = grouped_pair(&mut fx);
        fx.feed(vec![ShellEvent::OverviewStarting { partial: None }]);
        assert!(!fx.ctl.snap_group(id).unwrap().divider().is_visible());

        // Display changes during overview are skipped.
        let before = fx.host().bounds(w1).unwrap();
        let events = fx
            .host()
            .set_work_area(fx.display, Rect::new(0, 0, 1000, 700))
            .unwrap();
        fx.feed(events);
        assert_eq!(fx.host().bounds(w1).unwrap(), before);

        fx.feed(vec![
            ShellEvent::OverviewEnding,
            ShellEvent::OverviewEndingAnimationComplete { canceled: false },
        ]);
        assert!(fx.ctl.snap_group(id).unwrap().divider().is_visible());
        assert_eq!(fx.host().bounds(w1).unwrap(), Rect::new(0, 0, 496, 700));
    }

    #[test]
    fn divider_drag_through_events() {
        let mut fx = Fixture::manual();
        let (tx, rx) = mpsc::channel();
        fx.ctl.set_event_channel(tx);
        let (w1, w2, id) = grouped_pair(&mut fx);
        fx.feed(vec![
            ShellEvent::DividerResizeStarted {
                window: w2,
                point: Point::new(400, 350),
            },
            ShellEvent::DividerResizeUpdated {
                window: w2,
                point: Point::new(500, 350),
            },
        ]);
        assert!(fx.ctl.snap_group(id).unwrap().divider().is_resizing());
        assert!(matches!(
            fx.ctl.handle(ShellEvent::DividerResizeStarted {
                window: w1,
                point: Point::new(0, 0),
            }),
            Err(ControllerError::Divider(DividerError::AlreadyResizing))
        ));
        fx.feed(vec![ShellEvent::DividerResizeEnded {
            window: w2,
            point: Point::new(600, 350),
        }]);
        assert_eq!(fx.host().bounds(w1).unwrap().width, 596);
        assert_eq!(fx.host().bounds(w2).unwrap(), Rect::new(604, 0, 196, 700));
        let resized = rx
            .try_iter()
            .find_map(|e| match e {
                GroupEvent::Resized { primary_ratio, .. } => Some(primary_ratio),
                _ => None,
            })
            .unwrap();
        assert!((resized - 0.75).abs() < 1e-9);
    }

    #[test]
    fn resize_update_without_start_is_rejected() {
        let mut fx = Fixture::manual();
        let (w1, _, _) = grouped_pair(&mut fx);
        assert!(matches!(
            fx.ctl.update_resize(w1, Point::new(10, 10)),
            Err(ControllerError::Divider(DividerError::NotResizing))
        ));
    }

    #[test]
    fn unsnapping_a_member_dissolves_group() {
        let mut fx = Fixture::manual();
        let (tx, rx) = mpsc::channel();
        fx.ctl.set_event_channel(tx);
        let (w1, w2, _) = grouped_pair(&mut fx);
        let events = fx
            .host()
            .apply(crate::host::headless::HostCommand::SetState {
                window: w1,
                state: WindowStateType::Maximized,
            })
            .unwrap();
        fx.feed(events);
        assert_eq!(fx.ctl.group_count(), 0);
        assert_eq!(fx.host().bounds(w2).unwrap(), Rect::new(400, 0, 400, 700));
        assert!(rx.try_iter().any(|e| matches!(
            e,
            GroupEvent::Removed { reason: ExitPoint::SnapStateChanged, lifetime: Some(_), .. }
        )));
    }

    #[test]
    fn minimize_group_keeps_it() {
        let mut fx = Fixture::manual();
        let (w1, w2, id) = grouped_pair(&mut fx);
        fx.feed(vec![ShellEvent::MinimizeGroup { window: w2 }]);
        assert_eq!(fx.ctl.group_count(), 1);
        assert!(fx.ctl.snap_group(id).unwrap().is_minimized());
        assert_eq!(fx.host().state_type(w1).unwrap(), WindowStateType::Minimized);
        assert_eq!(fx.host().state_type(w2).unwrap(), WindowStateType::Minimized);
    }

    #[test]
    fn topmost_queries() {
        let mut fx = Fixture::manual();
        let (_, _, lower) = grouped_pair(&mut fx);
        let (w3, _, upper) = grouped_pair(&mut fx);
        assert_eq!(fx.ctl.topmost_snap_group().unwrap(), Some(upper));
        assert_eq!(fx.ctl.topmost_visible_snap_group(fx.desk).unwrap(), Some(upper));

        fx.ctl.minimize_snap_group(w3).unwrap();
        assert_eq!(fx.ctl.topmost_visible_snap_group(fx.desk).unwrap(), Some(lower));
    }

    #[test]
    fn explicit_unlock() {
        let mut fx = Fixture::manual();
        let (w1, _, _) = grouped_pair(&mut fx);
        fx.feed(vec![ShellEvent::RemoveGroup { window: w1 }]);
        assert_eq!(fx.ctl.group_count(), 0);
        // A second unlock is a no-op.
        fx.feed(vec![ShellEvent::RemoveGroup { window: w1 }]);
    }

    #[test]
    fn late_destroy_event_is_ignored() {
        let mut fx = Fixture::manual();
        fx.feed(vec![ShellEvent::WindowDestroyed {
            window: WindowId(12345),
        }]);
        assert_eq!(fx.ctl.group_count(), 0);
    }

    #[test]
    fn removing_unknown_group_returns_false() {
        let mut fx = Fixture::manual();
        assert!(!fx.ctl.remove_snap_group(GroupId(99), ExitPoint::UserUnlock));
        assert!(!fx
            .ctl
            .remove_snap_group_containing_window(WindowId(1), ExitPoint::UserUnlock));
    }
}
