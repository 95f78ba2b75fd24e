use super::ease_out;
use crate::geometry::Point;

/// Smallest per-frame step so a fully smoothed corner still converges
pub const MIN_SMOOTHING_STEP: f64 = 0.02;

/// Per-frame blend factor for a `corner_smoothing` setting in `[0, 1]`.
/// 0 follows the pointer immediately, values near 1 lag behind it.
pub fn smoothing_step(corner_smoothing: f64) -> f64 {
    (1.0 - corner_smoothing.clamp(0.0, 1.0)).max(MIN_SMOOTHING_STEP)
}

/// Move the smoothed hover point one frame toward `target`.
/// Call this every frame while the corner is hovered.
pub fn smooth_point(current: Point, target: Point, corner_smoothing: f64) -> Point {
    let factor = smoothing_step(corner_smoothing);
    Point::new(
        ease_out(current.x, target.x, factor),
        ease_out(current.y, target.y, factor),
    )
}

/// Whether the smoothed point is close enough to stop interpolating
pub fn settled(current: Point, target: Point) -> bool {
    current.distance_to(target) < 0.5
}
