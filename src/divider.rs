//! The draggable boundary between the two windows of a snap group.
//!
//! A [`Divider`] owns its geometry (work area, orientation, position and
//! thickness), its visibility, and the drag interaction.  It knows nothing
//! about windows: the owning [`SnapGroup`](crate::snap_group::SnapGroup)
//! supplies the allowed position range and derives window bounds from
//! [`Divider::position`].
//!
//! The drag interaction is a small state machine:
//!
//! ```text
//!   Idle ──begin_drag──▶ Resizing ──drag_to──▶ Resizing
//!     ▲                                   │
//!     └─────────────── end_drag ──────────┘
//! ```
//!
//! Only one drag can be active at a time.

use crate::geometry::{divider_bounds, Orientation, Point, Rect};
use log::debug;

/// Errors from calling the drag interaction out of order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DividerError {
    #[error("divider is already being resized")]
    AlreadyResizing,
    #[error("divider is not being resized")]
    NotResizing,
    #[error("divider is hidden")]
    Hidden,
}

/// Allowed divider positions, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerLimits {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone)]
pub struct Divider {
    work_area: Rect,
    orientation: Orientation,
    /// Offset from the work area origin along the split axis.
    position: i32,
    thickness: i32,
    visible: bool,
    /// `Some(offset)` while dragging: pointer position minus divider
    /// position at the moment the drag started.
    grab_offset: Option<i32>,
}

impl Divider {
    /// Create a hidden divider of the given thickness.
    pub fn new(thickness: i32) -> Self {
        Self {
            work_area: Rect::default(),
            orientation: Orientation::Horizontal,
            position: 0,
            thickness,
            visible: false,
            grab_offset: None,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn thickness(&self) -> i32 {
        self.thickness
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn work_area(&self) -> Rect {
        self.work_area
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_resizing(&self) -> bool {
        self.grab_offset.is_some()
    }

    /// Screen bounds of the divider.
    pub fn bounds(&self) -> Rect {
        divider_bounds(&self.work_area, self.orientation, self.position, self.thickness)
    }

    /// Place the divider in `work_area` at `position`.
    pub fn set_layout(&mut self, work_area: Rect, orientation: Orientation, position: i32) {
        self.work_area = work_area;
        self.orientation = orientation;
        self.position = position;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Hide the divider.  An in-progress drag is abandoned.
    pub fn hide(&mut self) {
        if self.grab_offset.take().is_some() {
            debug!("divider hidden mid-drag, abandoning resize");
        }
        self.visible = false;
    }

    /// Start dragging from `point`.
    pub fn begin_drag(&mut self, point: Point) -> Result<(), DividerError> {
        if !self.visible {
            return Err(DividerError::Hidden);
        }
        if self.grab_offset.is_some() {
            return Err(DividerError::AlreadyResizing);
        }
        let along = self.orientation.point_along(point) - self.orientation.origin(&self.work_area);
        self.grab_offset = Some(along - self.position);
        Ok(())
    }

    /// Follow the pointer to `point`, clamped to `limits`.  Returns the new
    /// position.
    pub fn drag_to(&mut self, point: Point, limits: DividerLimits) -> Result<i32, DividerError> {
        let offset = self.grab_offset.ok_or(DividerError::NotResizing)?;
        let along = self.orientation.point_along(point) - self.orientation.origin(&self.work_area);
        self.position = (along - offset).clamp(limits.min, limits.max.max(limits.min));
        Ok(self.position)
    }

    /// Finish the drag at `point`.  Returns the final position.
    pub fn end_drag(&mut self, point: Point, limits: DividerLimits) -> Result<i32, DividerError> {
        let position = self.drag_to(point, limits)?;
        self.grab_offset = None;
        Ok(position)
    }
}

//  Tests
