//! Paper-fold geometry for one flip gesture.
//!
//! All points are page-local: origin at the spine end of the corner edge,
//! `x` towards the outer edge of the flipping page.

use std::f64::consts::PI;

use tracing::trace;

use super::{FlipCorner, FlipDirection};
use crate::error::GeometryError;
use crate::geometry::{
    angle_between_lines, limit_point_to_circle, rotated_point, segment_intersection, Point, Rect,
    RectPoints, Segment,
};

/// Fold state for one gesture, recomputed from every drag point
#[derive(Debug, Clone, PartialEq)]
pub struct FlipCalculation {
    direction: FlipDirection,
    corner: FlipCorner,
    page_width: f64,
    page_height: f64,
    position: Point,
    angle: f64,
    rect: RectPoints,
    top_intersection: Option<Point>,
    side_intersection: Option<Point>,
    bottom_intersection: Option<Point>,
}

/// Integer prefix of a dimension string: `"400.7"` and `"400px"` are both 400
fn parse_dimension(raw: &str, name: &'static str) -> Result<f64, GeometryError> {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(raw.len(), |(i, _)| i);
    raw[..end]
        .parse::<i64>()
        .map(|v| v as f64)
        .map_err(|_| GeometryError::InvalidDimension(name))
}

impl FlipCalculation {
    /// Dimensions are truncated to whole pixels
    pub fn new(direction: FlipDirection, corner: FlipCorner, page_width: f64, page_height: f64) -> Self {
        Self {
            direction,
            corner,
            page_width: page_width.trunc(),
            page_height: page_height.trunc(),
            position: Point::default(),
            angle: 0.0,
            rect: RectPoints::default(),
            top_intersection: None,
            side_intersection: None,
            bottom_intersection: None,
        }
    }

    /// Build from dimension strings such as `"400"` or `"400px"`
    pub fn parse(
        direction: FlipDirection,
        corner: FlipCorner,
        page_width: &str,
        page_height: &str,
    ) -> Result<Self, GeometryError> {
        let width = parse_dimension(page_width, "width")?;
        let height = parse_dimension(page_height, "height")?;
        Ok(Self::new(direction, corner, width, height))
    }

    /// Recompute the fold for `pos`.
    ///
    /// Returns false for a degenerate fold; the previous geometry is kept.
    pub fn calc(&mut self, pos: Point) -> bool {
        let mut next = self.clone();
        match next.try_calc(pos) {
            Ok(()) => {
                *self = next;
                true
            }
            Err(e) => {
                trace!("Fold rejected at ({:.1}, {:.1}): {}", pos.x, pos.y, e);
                false
            }
        }
    }

    fn try_calc(&mut self, pos: Point) -> Result<(), GeometryError> {
        self.position = self.calc_angle_and_position(pos)?;
        self.calculate_intersections(self.position)
    }

    fn calc_angle_and_position(&mut self, pos: Point) -> Result<Point, GeometryError> {
        self.update_angle_and_geometry(pos)?;

        let (pw, ph) = (self.page_width, self.page_height);
        let result = match self.corner {
            FlipCorner::Top => {
                self.limit_to_spine(pos, Point::new(0.0, 0.0), Point::new(0.0, ph))?
            }
            FlipCorner::Bottom => {
                self.limit_to_spine(pos, Point::new(0.0, ph), Point::new(0.0, 0.0))?
            }
        };

        if (result.x - pw).abs() < 1.0 && result.y.abs() < 1.0 {
            return Err(GeometryError::PointTooSmall);
        }
        Ok(result)
    }

    fn update_angle_and_geometry(&mut self, pos: Point) -> Result<(), GeometryError> {
        self.angle = self.calculate_angle(pos)?;
        self.rect = self.page_rect(pos);
        Ok(())
    }

    fn calculate_angle(&self, pos: Point) -> Result<f64, GeometryError> {
        let left = self.page_width - pos.x + 1.0;
        let top = match self.corner {
            FlipCorner::Bottom => self.page_height - pos.y,
            FlipCorner::Top => pos.y,
        };

        let mut angle = 2.0 * (left / (top * top + left * left).sqrt()).acos();
        if top < 0.0 {
            angle = -angle;
        }

        let da = PI - angle;
        if !angle.is_finite() || (0.0..0.003).contains(&da) {
            return Err(GeometryError::DegenerateAngle);
        }

        if self.corner == FlipCorner::Bottom {
            angle = -angle;
        }
        Ok(angle)
    }

    fn page_rect(&self, pos: Point) -> RectPoints {
        let (pw, ph) = (self.page_width, self.page_height);
        let (top, bottom) = match self.corner {
            FlipCorner::Top => (0.0, ph),
            FlipCorner::Bottom => (-ph, 0.0),
        };
        RectPoints {
            top_left: rotated_point(Point::new(0.0, top), pos, self.angle),
            top_right: rotated_point(Point::new(pw, top), pos, self.angle),
            bottom_left: rotated_point(Point::new(0.0, bottom), pos, self.angle),
            bottom_right: rotated_point(Point::new(pw, bottom), pos, self.angle),
        }
    }

    /// Keep the page attached at the spine: the corner may travel at most one
    /// page width from the near spine end, and once the far corner crosses the
    /// spine at most one page diagonal from the opposite end.
    fn limit_to_spine(
        &mut self,
        pos: Point,
        near: Point,
        far: Point,
    ) -> Result<Point, GeometryError> {
        let mut result = pos;

        let limited = limit_point_to_circle(near, self.page_width, result);
        if limited != result {
            result = limited;
            self.update_angle_and_geometry(result)?;
        }

        let diagonal = self.page_width.hypot(self.page_height);
        let (check, corner) = match self.corner {
            FlipCorner::Top => (self.rect.bottom_right, self.rect.top_left),
            FlipCorner::Bottom => (self.rect.top_right, self.rect.bottom_left),
        };

        if check.x <= 0.0 {
            result = limit_point_to_circle(far, diagonal, corner);
            self.update_angle_and_geometry(result)?;
        }

        Ok(result)
    }

    fn calculate_intersections(&mut self, pos: Point) -> Result<(), GeometryError> {
        let (pw, ph) = (self.page_width, self.page_height);
        let bound = Rect {
            left: -1.0,
            top: -1.0,
            width: pw + 2.0,
            height: ph + 2.0,
        };
        let top_edge: Segment = (Point::new(0.0, 0.0), Point::new(pw, 0.0));
        let side_edge: Segment = (Point::new(pw, 0.0), Point::new(pw, ph));
        let bottom_edge: Segment = (Point::new(0.0, ph), Point::new(pw, ph));
        let rect = self.rect;

        match self.corner {
            FlipCorner::Top => {
                self.top_intersection = segment_intersection(bound, (pos, rect.top_right), top_edge)?;
                self.side_intersection = segment_intersection(bound, (pos, rect.bottom_left), side_edge)?;
            }
            FlipCorner::Bottom => {
                self.top_intersection =
                    segment_intersection(bound, (rect.top_left, rect.top_right), top_edge)?;
                self.side_intersection = segment_intersection(bound, (pos, rect.top_left), side_edge)?;
            }
        }
        self.bottom_intersection =
            segment_intersection(bound, (rect.bottom_left, rect.bottom_right), bottom_edge)?;
        Ok(())
    }

    /// Visible part of the flipping page, in rotated page coordinates
    pub fn flipping_clip_area(&self) -> Vec<Point> {
        let mut result = vec![self.rect.top_left];
        result.extend(self.top_intersection);

        let clip_bottom = match self.side_intersection {
            Some(side) => {
                result.push(side);
                false
            }
            None => true,
        };

        result.extend(self.bottom_intersection);
        if clip_bottom || self.corner == FlipCorner::Bottom {
            result.push(self.rect.bottom_left);
        }
        result
    }

    /// Part of the page underneath exposed by the fold
    pub fn bottom_clip_area(&self) -> Vec<Point> {
        let (pw, ph) = (self.page_width, self.page_height);
        let mut result = Vec::new();
        result.extend(self.top_intersection);

        match self.corner {
            FlipCorner::Top => result.push(Point::new(pw, 0.0)),
            FlipCorner::Bottom => {
                if self.top_intersection.is_some() {
                    result.push(Point::new(pw, 0.0));
                }
                result.push(Point::new(pw, ph));
            }
        }

        match self.side_intersection {
            Some(side) => {
                let far_enough = self
                    .top_intersection
                    .map_or(true, |top| side.distance_to(top) >= 10.0);
                if far_enough {
                    result.push(side);
                }
            }
            None => {
                if self.corner == FlipCorner::Top {
                    result.push(Point::new(pw, ph));
                }
            }
        }

        result.extend(self.bottom_intersection);
        result.extend(self.top_intersection);
        result
    }

    /// Rotation of the flipping page, radians
    pub fn angle(&self) -> f64 {
        match self.direction {
            FlipDirection::Forward => -self.angle,
            FlipDirection::Back => self.angle,
        }
    }

    pub fn rect(&self) -> &RectPoints {
        &self.rect
    }

    /// The limited drag point of the last successful `calc`
    pub fn position(&self) -> Point {
        self.position
    }

    /// Corner of the rotated page used as its drawing anchor
    pub fn active_corner(&self) -> Point {
        match self.direction {
            FlipDirection::Forward => self.rect.top_left,
            FlipDirection::Back => self.rect.top_right,
        }
    }

    pub fn direction(&self) -> FlipDirection {
        self.direction
    }

    pub fn corner(&self) -> FlipCorner {
        self.corner
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    /// 0 at rest, 50 at the spine, 100 fully turned
    pub fn flipping_progress(&self) -> f64 {
        ((self.position.x - self.page_width) / (2.0 * self.page_width) * 100.0).abs()
    }

    pub fn bottom_page_position(&self) -> Point {
        match self.direction {
            FlipDirection::Back => Point::new(self.page_width, 0.0),
            FlipDirection::Forward => Point::new(0.0, 0.0),
        }
    }

    pub fn shadow_start_point(&self) -> Option<Point> {
        match self.corner {
            FlipCorner::Top => self.top_intersection,
            FlipCorner::Bottom => self.side_intersection.or(self.top_intersection),
        }
    }

    pub fn shadow_angle(&self) -> Option<f64> {
        let segment = self.shadow_line()?;
        let angle = angle_between_lines(segment, (Point::new(0.0, 0.0), Point::new(self.page_width, 0.0)));
        Some(match self.direction {
            FlipDirection::Forward => angle,
            FlipDirection::Back => PI - angle,
        })
    }

    fn shadow_line(&self) -> Option<Segment> {
        let first = self.shadow_start_point()?;
        let second = match self.side_intersection {
            Some(side) if side != first => side,
            _ => self.bottom_intersection?,
        };
        Some((first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn forward_top() -> FlipCalculation {
        FlipCalculation::new(FlipDirection::Forward, FlipCorner::Top, 400.0, 300.0)
    }

    #[test]
    fn test_new_truncates_dimensions() {
        let calc = FlipCalculation::new(FlipDirection::Back, FlipCorner::Bottom, 400.9, 300.2);
        assert_eq!(calc.page_width(), 400.0);
        assert_eq!(calc.page_height(), 300.0);
    }

    #[test]
    fn test_parse_uses_integer_prefix() {
        let calc = FlipCalculation::parse(FlipDirection::Forward, FlipCorner::Top, "400.7", "300px")
            .unwrap();
        assert_eq!(calc.page_width(), 400.0);
        assert_eq!(calc.page_height(), 300.0);
        assert_eq!(
            FlipCalculation::parse(FlipDirection::Forward, FlipCorner::Top, "wide", "300"),
            Err(GeometryError::InvalidDimension("width"))
        );
    }

    #[test]
    fn test_rest_position_has_no_progress() {
        let mut calc = forward_top();
        assert!(calc.calc(Point::new(399.0, 1.0)));
        assert!(calc.flipping_progress() < 0.5);
    }

    #[test]
    fn test_point_on_rest_corner_is_rejected() {
        let mut calc = forward_top();
        assert!(calc.calc(Point::new(300.0, 40.0)));
        let before = calc.clone();

        assert!(!calc.calc(Point::new(400.0, 0.0)));
        assert_eq!(calc, before);
    }

    #[test]
    fn test_behind_spine_is_past_halfway() {
        let mut calc = forward_top();
        assert!(calc.calc(Point::new(-100.0, 50.0)));
        assert!((calc.flipping_progress() - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_far_drag_collapses_to_full_turn() {
        let mut calc = forward_top();
        assert!(calc.calc(Point::new(-1000.0, 5.0)));
        assert!((calc.flipping_progress() - 100.0).abs() < 0.01);
        assert!(calc.position().distance_to(Point::new(0.0, 0.0)) <= 400.0 + 1e-6);
    }

    #[test]
    fn test_angle_sign_follows_direction() {
        let mut forward = forward_top();
        let mut back = FlipCalculation::new(FlipDirection::Back, FlipCorner::Top, 400.0, 300.0);
        let pos = Point::new(250.0, 60.0);
        assert!(forward.calc(pos));
        assert!(back.calc(pos));
        assert!((forward.angle() + back.angle()).abs() < 1e-12);
        assert!(forward.angle() < 0.0);
    }

    #[test]
    fn test_bottom_page_position() {
        let back = FlipCalculation::new(FlipDirection::Back, FlipCorner::Top, 400.0, 300.0);
        assert_eq!(back.bottom_page_position(), Point::new(400.0, 0.0));
        assert_eq!(forward_top().bottom_page_position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_clip_areas_for_a_corner_fold() {
        let mut calc = forward_top();
        assert!(calc.calc(Point::new(300.0, 50.0)));

        let flipping = calc.flipping_clip_area();
        assert_eq!(flipping[0], calc.rect().top_left);
        assert!(flipping.len() >= 3);

        let bottom = calc.bottom_clip_area();
        assert_eq!(bottom.first(), bottom.last());
        assert!(bottom.contains(&Point::new(400.0, 0.0)));

        assert!(calc.shadow_start_point().is_some());
        let angle = calc.shadow_angle().unwrap();
        assert!((0.0..=PI).contains(&angle));
    }

    proptest! {
        #[test]
        fn prop_calc_is_idempotent(x in -600.0f64..399.0, y in 0.0f64..300.0) {
            let mut once = forward_top();
            let ok = once.calc(Point::new(x, y));
            let mut twice = once.clone();
            prop_assert_eq!(twice.calc(Point::new(x, y)), ok);
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn prop_progress_stays_in_range(x in -2000.0f64..399.0, y in 1.0f64..299.0) {
            let mut calc = forward_top();
            if calc.calc(Point::new(x, y)) {
                let progress = calc.flipping_progress();
                prop_assert!((0.0..=100.0 + 1e-6).contains(&progress));
            }
        }
    }
}
