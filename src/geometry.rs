//! Geometry primitives and pure helpers for fold construction.
//!
//! Coordinates are pixels with `y` growing downwards. Three spaces are in play:
//! *global* (relative to the block that hosts the book), *book* (relative to the
//! top-left of the two-page bounds rect) and *page* (origin at the spine, `x`
//! growing towards the outer edge of the page being flipped).

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::flip::FlipDirection;

/// A point in 2D pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    #[inline]
    pub fn distance_to(&self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// A line segment given by its two end points
pub type Segment = (Point, Point);

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Four corners of a (possibly rotated) page rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectPoints {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

/// Bounds of the book inside its host block.
///
/// `width` always spans two pages; in portrait the rect is shifted left by one
/// page so the single visible page sits in the middle of the block.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub page_width: f64,
}

impl PageRect {
    /// X coordinate of the spine in global space
    pub fn spine_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Global → book-local
    pub fn to_book(&self, pos: Point) -> Point {
        Point::new(pos.x - self.left, pos.y - self.top)
    }

    /// Global → page-local for a flip in `direction`
    pub fn to_page(&self, pos: Point, direction: FlipDirection) -> Point {
        let x = match direction {
            FlipDirection::Forward => pos.x - self.left - self.width / 2.0,
            FlipDirection::Back => self.width / 2.0 - pos.x + self.left,
        };
        Point::new(x, pos.y - self.top)
    }

    /// Page-local → global for a flip in `direction`
    pub fn to_global(&self, pos: Point, direction: FlipDirection) -> Point {
        let x = match direction {
            FlipDirection::Forward => pos.x + self.left + self.width / 2.0,
            FlipDirection::Back => self.width / 2.0 - pos.x + self.left,
        };
        Point::new(x, pos.y + self.top)
    }

    pub fn rect_to_global(&self, rect: &RectPoints, direction: FlipDirection) -> RectPoints {
        RectPoints {
            top_left: self.to_global(rect.top_left, direction),
            top_right: self.to_global(rect.top_right, direction),
            bottom_left: self.to_global(rect.bottom_left, direction),
            bottom_right: self.to_global(rect.bottom_right, direction),
        }
    }

    /// The same rect moved horizontally by `dx`
    pub fn shifted(&self, dx: f64) -> Self {
        Self {
            left: self.left + dx,
            ..*self
        }
    }
}

/// Length of a segment
pub fn segment_length(segment: Segment) -> f64 {
    segment.0.distance_to(segment.1)
}

/// Unsigned angle between two lines, in radians
pub fn angle_between_lines(one: Segment, two: Segment) -> f64 {
    let a1 = one.0.y - one.1.y;
    let a2 = two.0.y - two.1.y;
    let b1 = one.1.x - one.0.x;
    let b2 = two.1.x - two.0.x;

    let cos = (a1 * a2 + b1 * b2) / ((a1 * a1 + b1 * b1).sqrt() * (a2 * a2 + b2 * b2).sqrt());
    cos.clamp(-1.0, 1.0).acos()
}

/// Returns `pos` when it lies inside `rect` (edges included)
pub fn point_in_rect(rect: Rect, pos: Point) -> Option<Point> {
    let inside = pos.x >= rect.left
        && pos.x <= rect.left + rect.width
        && pos.y >= rect.top
        && pos.y <= rect.top + rect.height;
    inside.then_some(pos)
}

/// Rotates `point` by `angle` (clockwise in y-down space) and translates it by `origin`
pub fn rotated_point(point: Point, origin: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(
        point.x * cos + point.y * sin + origin.x,
        point.y * cos - point.x * sin + origin.y,
    )
}

/// Pulls `point` back onto the circle of `radius` around `center` when it lies outside
pub fn limit_point_to_circle(center: Point, radius: f64, point: Point) -> Point {
    if center.distance_to(point) <= radius {
        return point;
    }

    let (a, b) = (center.x, center.y);
    let (n, m) = (point.x, point.y);

    let mut x = ((radius.powi(2) * (a - n).powi(2)) / ((a - n).powi(2) + (b - m).powi(2))).sqrt() + a;
    if point.x < 0.0 {
        x = -x;
    }

    let mut y = ((x - a) * (b - m)) / (a - n) + b;
    if a - n + b == 0.0 {
        y = radius;
    }

    Point::new(x, y)
}

/// Intersection of two infinite lines.
///
/// `Ok(None)` for parallel lines, `Err(SegmentIncluded)` when they coincide.
pub fn line_intersection(one: Segment, two: Segment) -> Result<Option<Point>, GeometryError> {
    let a1 = one.0.y - one.1.y;
    let a2 = two.0.y - two.1.y;
    let b1 = one.1.x - one.0.x;
    let b2 = two.1.x - two.0.x;
    let c1 = one.0.x * one.1.y - one.1.x * one.0.y;
    let c2 = two.0.x * two.1.y - two.1.x * two.0.y;

    let det1 = a1 * c2 - a2 * c1;
    let det2 = b1 * c2 - b2 * c1;

    let x = -((c1 * b2 - c2 * b1) / (a1 * b2 - a2 * b1));
    let y = -((a1 * c2 - a2 * c1) / (a1 * b2 - a2 * b1));

    if x.is_finite() && y.is_finite() {
        return Ok(Some(Point::new(x, y)));
    }
    if (det1 - det2).abs() < 0.1 {
        return Err(GeometryError::SegmentIncluded);
    }
    Ok(None)
}

/// Line intersection restricted to `bound`
pub fn segment_intersection(
    bound: Rect,
    one: Segment,
    two: Segment,
) -> Result<Option<Point>, GeometryError> {
    Ok(line_intersection(one, two)?.and_then(|p| point_in_rect(bound, p)))
}

/// Pixel-stepped points from `from` to `to`, both ends included.
///
/// One step per pixel along the longer axis.
pub fn points_between(from: Point, to: Point) -> Vec<Point> {
    let size_x = (from.x - to.x).abs();
    let size_y = (from.y - to.y).abs();
    let steps = size_x.max(size_y);

    let coord = |c1: f64, c2: f64, size: f64, i: f64| {
        if c2 > c1 {
            c1 + i * (size / steps)
        } else if c2 < c1 {
            c1 - i * (size / steps)
        } else {
            c1
        }
    };

    let count = steps.floor() as usize;
    let mut result = Vec::with_capacity(count + 1);
    result.push(from);
    for i in 1..=count {
        let i = i as f64;
        result.push(Point::new(
            coord(from.x, to.x, size_x, i),
            coord(from.y, to.y, size_y, i),
        ));
    }
    result
}
