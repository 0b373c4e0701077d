//! Workspace geometry for snapped windows.
//!
//! Everything in this module is pure arithmetic on rectangles: where the
//! divider sits for a given ratio, which rectangle each side of the divider
//! receives, and whether two windows can share a work area at all.
//!
//! Divider positions are offsets along the split axis, measured from the
//! work area's origin.  For a horizontal (side-by-side) layout the axis is
//! `x`; for a vertical (top/bottom) layout it is `y`.

use crate::event::SnapPosition;
use serde::{Deserialize, Serialize};

/// Two ratios closer than this are considered equal.
pub const RATIO_EPSILON: f64 = 1e-3;

/// An integer rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether the two rectangles share any area.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// A width/height pair, used for minimum window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A point in screen coordinates (e.g. the pointer during a divider drag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Direction in which a work area is split between the two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Primary on the left, secondary on the right.
    Horizontal,
    /// Primary on top, secondary at the bottom.
    Vertical,
}

impl Orientation {
    /// Landscape work areas split side-by-side, portrait ones top/bottom.
    pub fn for_work_area(work_area: &Rect) -> Self {
        if work_area.width >= work_area.height {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Length of `rect` along the split axis.
    pub fn length(self, rect: &Rect) -> i32 {
        match self {
            Orientation::Horizontal => rect.width,
            Orientation::Vertical => rect.height,
        }
    }

    /// Start coordinate of `rect` along the split axis.
    pub fn origin(self, rect: &Rect) -> i32 {
        match self {
            Orientation::Horizontal => rect.x,
            Orientation::Vertical => rect.y,
        }
    }

    pub fn size_along(self, size: &Size) -> i32 {
        match self {
            Orientation::Horizontal => size.width,
            Orientation::Vertical => size.height,
        }
    }

    pub fn point_along(self, p: Point) -> i32 {
        match self {
            Orientation::Horizontal => p.x,
            Orientation::Vertical => p.y,
        }
    }
}

/// Divider position that gives the primary side `ratio` of `upper_limit`.
///
/// The divider is centred on the ratio line, so half of its thickness is
/// taken from each side.
pub fn divider_position_for_ratio(upper_limit: i32, ratio: f64, thickness: i32) -> i32 {
    (upper_limit as f64 * ratio - thickness as f64 / 2.0).round() as i32
}

/// Inverse of [`divider_position_for_ratio`].
pub fn ratio_for_divider_position(upper_limit: i32, position: i32, thickness: i32) -> f64 {
    if upper_limit <= 0 {
        return 0.5;
    }
    (position as f64 + thickness as f64 / 2.0) / upper_limit as f64
}

/// Whether two windows with the given minimum lengths (along the split axis)
/// fit next to each other with a divider between them.
pub fn can_fit(upper_limit: i32, thickness: i32, min_primary: i32, min_secondary: i32) -> bool {
    min_primary + thickness + min_secondary <= upper_limit
}

/// Clamp a divider position so that neither window drops below its minimum
/// length and the divider stays inside the work area.
///
/// When the minimums cannot both be honoured the primary minimum wins; callers
/// are expected to have checked [`can_fit`] first.
pub fn clamp_divider_position(
    position: i32,
    upper_limit: i32,
    thickness: i32,
    min_primary: i32,
    min_secondary: i32,
) -> i32 {
    let lower = min_primary.max(0);
    let upper = (upper_limit - thickness - min_secondary.max(0)).max(lower);
    position.clamp(lower, upper)
}

/// Bounds of the window on side `position` of a divider at
/// `divider_position`.
///
/// The snapped window occupies everything on its side of the divider.  With a
/// `thickness` of `0` this gives the bounds of a lone snapped window.
pub fn snapped_window_bounds(
    work_area: &Rect,
    orientation: Orientation,
    position: SnapPosition,
    divider_position: i32,
    thickness: i32,
) -> Rect {
    let length = orientation.length(work_area);
    let (start, extent) = match position {
        SnapPosition::Primary => (0, divider_position),
        SnapPosition::Secondary => {
            let start = divider_position + thickness;
            (start, length - start)
        }
    };
    match orientation {
        Orientation::Horizontal => Rect::new(
            work_area.x + start,
            work_area.y,
            extent.max(0),
            work_area.height,
        ),
        Orientation::Vertical => Rect::new(
            work_area.x,
            work_area.y + start,
            work_area.width,
            extent.max(0),
        ),
    }
}

/// Bounds of the divider itself.
pub fn divider_bounds(
    work_area: &Rect,
    orientation: Orientation,
    divider_position: i32,
    thickness: i32,
) -> Rect {
    match orientation {
        Orientation::Horizontal => Rect::new(
            work_area.x + divider_position,
            work_area.y,
            thickness,
            work_area.height,
        ),
        Orientation::Vertical => Rect::new(
            work_area.x,
            work_area.y + divider_position,
            work_area.width,
            thickness,
        ),
    }
}

/// Bounds a window snapped alone at `ratio` would have (no divider).
pub fn solo_snapped_bounds(
    work_area: &Rect,
    orientation: Orientation,
    position: SnapPosition,
    ratio: f64,
) -> Rect {
    let length = orientation.length(work_area);
    let primary_ratio = match position {
        SnapPosition::Primary => ratio,
        SnapPosition::Secondary => 1.0 - ratio,
    };
    let split = divider_position_for_ratio(length, primary_ratio, 0);
    snapped_window_bounds(work_area, orientation, position, split, 0)
}

/// Distance along the split axis between the end of `primary` and the start
/// of `secondary`.  Negative when they overlap.
pub fn gap_between(primary: &Rect, secondary: &Rect, orientation: Orientation) -> i32 {
    match orientation {
        Orientation::Horizontal => secondary.x - primary.right(),
        Orientation::Vertical => secondary.y - primary.bottom(),
    }
}

/// Whether two ratios add up to one within [`RATIO_EPSILON`].
pub fn ratios_complement(a: f64, b: f64) -> bool {
    (a + b - 1.0).abs() < RATIO_EPSILON
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape() -> Rect {
        Rect::new(0, 0, 800, 700)
    }

    #[test]
    fn orientation_follows_aspect() {
        assert_eq!(Orientation::for_work_area(&landscape()), Orientation::Horizontal);
        assert_eq!(
            Orientation::for_work_area(&Rect::new(0, 0, 700, 800)),
            Orientation::Vertical
        );
    }

    #[test]
    fn half_split_centres_divider() {
        assert_eq!(divider_position_for_ratio(800, 0.5, 8), 396);
        let r = ratio_for_divider_position(800, 396, 8);
        assert!((r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn divider_and_windows_tile_work_area() {
        let wa = Rect::new(100, 20, 1000, 600);
        let pos = divider_position_for_ratio(1000, 0.3, 8);
        let p = snapped_window_bounds(&wa, Orientation::Horizontal, SnapPosition::Primary, pos, 8);
        let d = divider_bounds(&wa, Orientation::Horizontal, pos, 8);
        let s = snapped_window_bounds(&wa, Orientation::Horizontal, SnapPosition::Secondary, pos, 8);
        assert_eq!(p.x, 100);
        assert_eq!(p.right(), d.x);
        assert_eq!(d.right(), s.x);
        assert_eq!(s.right(), wa.right());
        assert_eq!(p.width + d.width + s.width, 1000);
    }

    #[test]
    fn vertical_split_uses_height() {
        let wa = Rect::new(0, 0, 600, 1000);
        let pos = divider_position_for_ratio(1000, 0.5, 8);
        let p = snapped_window_bounds(&wa, Orientation::Vertical, SnapPosition::Primary, pos, 8);
        let s = snapped_window_bounds(&wa, Orientation::Vertical, SnapPosition::Secondary, pos, 8);
        assert_eq!(p.width, 600);
        assert_eq!(p.height + 8 + s.height, 1000);
        assert_eq!(s.bottom(), 1000);
    }

    #[test]
    fn clamp_respects_minimums() {
        assert_eq!(clamp_divider_position(50, 800, 8, 300, 200), 300);
        assert_eq!(clamp_divider_position(700, 800, 8, 300, 200), 592);
        assert_eq!(clamp_divider_position(400, 800, 8, 300, 200), 400);
    }

    #[test]
    fn fit_check() {
        assert!(can_fit(800, 8, 396, 396));
        assert!(!can_fit(800, 8, 400, 400));
    }

    #[test]
    fn solo_bounds_split_without_divider() {
        let wa = landscape();
        let p = solo_snapped_bounds(&wa, Orientation::Horizontal, SnapPosition::Primary, 0.5);
        let s = solo_snapped_bounds(&wa, Orientation::Horizontal, SnapPosition::Secondary, 0.5);
        assert_eq!(p, Rect::new(0, 0, 400, 700));
        assert_eq!(s, Rect::new(400, 0, 400, 700));
        assert_eq!(gap_between(&p, &s, Orientation::Horizontal), 0);
    }

    #[test]
    fn intersection() {
        let a = Rect::new(0, 0, 100, 100);
        assert!(a.intersects(&Rect::new(50, 50, 100, 100)));
        assert!(!a.intersects(&Rect::new(100, 0, 100, 100)));
        assert!(!a.intersects(&Rect::new(10, 10, 0, 10)));
    }

    #[test]
    fn complementary_ratios() {
        assert!(ratios_complement(1.0 / 3.0, 2.0 / 3.0));
        assert!(!ratios_complement(0.5, 0.4));
    }
}
