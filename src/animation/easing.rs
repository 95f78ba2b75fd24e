//! Timing curves for flip playback.
//!
//! Every curve maps `[0, 1]` onto `[0, 1]` with `0 → 0` and `1 → 1`. Input
//! outside the unit interval is clamped.

use std::fmt;

use tracing::warn;

use crate::geometry::Point;

/// Named timing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Easing {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
}

impl Easing {
    pub const ALL: [Easing; 13] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
    ];

    /// Strict lookup. Accepts camelCase, kebab-case and snake_case names.
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        let easing = match key.as_str() {
            "linear" => Easing::Linear,
            "easein" => Easing::EaseIn,
            "easeout" => Easing::EaseOut,
            "easeinout" => Easing::EaseInOut,
            "easeinquad" => Easing::EaseInQuad,
            "easeoutquad" => Easing::EaseOutQuad,
            "easeinoutquad" => Easing::EaseInOutQuad,
            "easeincubic" => Easing::EaseInCubic,
            "easeoutcubic" => Easing::EaseOutCubic,
            "easeinoutcubic" => Easing::EaseInOutCubic,
            "easeinquart" => Easing::EaseInQuart,
            "easeoutquart" => Easing::EaseOutQuart,
            "easeinoutquart" => Easing::EaseInOutQuart,
            _ => return None,
        };
        Some(easing)
    }

    /// Lenient lookup: unknown names fall back to ease-out
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!("Unknown easing \"{}\", falling back to easeOut", name);
            Easing::EaseOut
        })
    }

    /// Canonical camelCase name
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "easeIn",
            Easing::EaseOut => "easeOut",
            Easing::EaseInOut => "easeInOut",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInCubic => "easeInCubic",
            Easing::EaseOutCubic => "easeOutCubic",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInQuart => "easeInQuart",
            Easing::EaseOutQuart => "easeOutQuart",
            Easing::EaseInOutQuart => "easeInOutQuart",
        }
    }

    /// Apply the curve to a progress value
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            // The plain in/out family is the sine curve set
            Easing::EaseIn => 1.0 - (t * std::f64::consts::FRAC_PI_2).cos(),
            Easing::EaseOut => (t * std::f64::consts::FRAC_PI_2).sin(),
            Easing::EaseInOut => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInQuad => ease_in_pow(t, 2),
            Easing::EaseOutQuad => ease_out_pow(t, 2),
            Easing::EaseInOutQuad => ease_in_out_pow(t, 2),
            Easing::EaseInCubic => ease_in_pow(t, 3),
            Easing::EaseOutCubic => ease_out_pow(t, 3),
            Easing::EaseInOutCubic => ease_in_out_pow(t, 3),
            Easing::EaseInQuart => ease_in_pow(t, 4),
            Easing::EaseOutQuart => ease_out_pow(t, 4),
            Easing::EaseInOutQuart => ease_in_out_pow(t, 4),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn ease_in_pow(t: f64, n: i32) -> f64 {
    t.powi(n)
}

#[inline]
fn ease_out_pow(t: f64, n: i32) -> f64 {
    1.0 - (1.0 - t).powi(n)
}

#[inline]
fn ease_in_out_pow(t: f64, n: i32) -> f64 {
    if t < 0.5 {
        2f64.powi(n - 1) * t.powi(n)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(n) / 2.0
    }
}

/// Blend two scalars under `easing`
pub fn interpolate(from: f64, to: f64, t: f64, easing: Easing) -> f64 {
    from + (to - from) * easing.apply(t)
}

/// Blend two points under `easing`
pub fn interpolate_point(from: Point, to: Point, t: f64, easing: Easing) -> Point {
    let k = easing.apply(t);
    Point::new(from.x + (to.x - from.x) * k, from.y + (to.y - from.y) * k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_boundaries() {
        for easing in Easing::ALL {
            assert!(easing.apply(0.0).abs() < 1e-9, "{:?} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{:?} at t=1", easing);
        }
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in Easing::ALL {
            let mut prev = 0.0;
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let v = easing.apply(t);
                assert!(v + 1e-12 >= prev, "{:?} not monotonic at t={}", easing, t);
                prev = v;
            }
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(-3.0), easing.apply(0.0));
            assert_eq!(easing.apply(7.5), easing.apply(1.0));
        }
    }

    #[test]
    fn test_names_round_trip() {
        for easing in Easing::ALL {
            assert_eq!(Easing::parse(easing.name()), Some(easing));
        }
        assert_eq!(Easing::parse("ease-in-out-cubic"), Some(Easing::EaseInOutCubic));
        assert_eq!(Easing::parse("ease_out_quart"), Some(Easing::EaseOutQuart));
    }

    #[test]
    fn test_unknown_name_falls_back_to_ease_out() {
        assert_eq!(Easing::parse("bounce"), None);
        assert_eq!(Easing::from_name("bounce"), Easing::EaseOut);
    }

    #[test]
    fn test_interpolate_point_midway_linear() {
        let p = interpolate_point(Point::new(0.0, 10.0), Point::new(10.0, 30.0), 0.5, Easing::Linear);
        assert_eq!(p, Point::new(5.0, 20.0));
        assert_eq!(interpolate(2.0, 4.0, 2.0, Easing::EaseInQuad), 4.0);
    }
}
