//! Book configuration: the raw option set and its validated form.
//!
//! [`FlipSetting`] mirrors the options embedding code passes in (camelCase
//! keys, JSON or TOML). [`validate`] turns it into an immutable [`Settings`]
//! or fails on the first violated rule.

use serde::{Deserialize, Serialize};

use crate::animation::Easing;
use crate::error::ConfigError;

/// How the book is sized inside its host block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeType {
    /// Pages keep the configured width and height
    Fixed,
    /// Pages stretch to fill the block within the min/max clamps
    Stretch,
}

impl SizeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeType::Fixed => "fixed",
            SizeType::Stretch => "stretch",
        }
    }
}

/// Which pointer region triggers the hover fold preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationMode {
    /// Small squares around the physical corners
    Corner,
    /// Full-height bands along the outer page edges
    Page,
}

impl AnimationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationMode::Corner => "corner",
            AnimationMode::Page => "page",
        }
    }
}

/// Raw book options as supplied by embedding code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlipSetting {
    pub start_page: usize,
    pub size: String,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub draw_shadow: bool,
    pub max_shadow_opacity: f64,
    /// Milliseconds for a full flip
    pub flipping_time: f64,
    pub use_portrait: bool,
    pub start_z_index: i32,
    pub show_cover: bool,
    pub mobile_scroll_support: bool,
    pub click_event_forward: bool,
    pub use_mouse_events: bool,
    pub swipe_distance: f64,
    pub show_page_corners: bool,
    pub disable_flip_by_click: bool,
    pub easing: String,
    pub corner_smoothing: f64,
    pub animation_mode: String,
    pub max_hover_fold_distance: f64,
    pub lock_y_on_drag: bool,
    /// Milliseconds during which a repeated discrete trigger is ignored
    pub duplicate_event_window: f64,
}

impl Default for FlipSetting {
    fn default() -> Self {
        Self {
            start_page: 0,
            size: "fixed".into(),
            width: 0.0,
            height: 0.0,
            min_width: 0.0,
            max_width: 0.0,
            min_height: 0.0,
            max_height: 0.0,
            draw_shadow: true,
            max_shadow_opacity: 1.0,
            flipping_time: 1000.0,
            use_portrait: true,
            start_z_index: 0,
            show_cover: false,
            mobile_scroll_support: true,
            click_event_forward: true,
            use_mouse_events: true,
            swipe_distance: 30.0,
            show_page_corners: true,
            disable_flip_by_click: false,
            easing: "easeOut".into(),
            corner_smoothing: 0.75,
            animation_mode: "corner".into(),
            max_hover_fold_distance: 0.3,
            lock_y_on_drag: false,
            duplicate_event_window: 350.0,
        }
    }
}

impl FlipSetting {
    /// Options for a book of `width`×`height` pages, everything else default
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Shorthand for [`validate`]
    pub fn validate(self) -> Result<Settings, ConfigError> {
        validate(self)
    }
}

/// Validated, normalized book options
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub start_page: usize,
    pub size: SizeType,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub draw_shadow: bool,
    pub max_shadow_opacity: f64,
    pub flipping_time: f64,
    pub use_portrait: bool,
    pub start_z_index: i32,
    pub show_cover: bool,
    pub mobile_scroll_support: bool,
    pub click_event_forward: bool,
    pub use_mouse_events: bool,
    pub swipe_distance: f64,
    pub show_page_corners: bool,
    pub disable_flip_by_click: bool,
    pub easing: Easing,
    pub corner_smoothing: f64,
    pub animation_mode: AnimationMode,
    pub max_hover_fold_distance: f64,
    pub lock_y_on_drag: bool,
    pub duplicate_event_window: f64,
}

impl Settings {
    /// Width / height of a single page
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

impl From<&Settings> for FlipSetting {
    fn from(s: &Settings) -> Self {
        Self {
            start_page: s.start_page,
            size: s.size.as_str().into(),
            width: s.width,
            height: s.height,
            min_width: s.min_width,
            max_width: s.max_width,
            min_height: s.min_height,
            max_height: s.max_height,
            draw_shadow: s.draw_shadow,
            max_shadow_opacity: s.max_shadow_opacity,
            flipping_time: s.flipping_time,
            use_portrait: s.use_portrait,
            start_z_index: s.start_z_index,
            show_cover: s.show_cover,
            mobile_scroll_support: s.mobile_scroll_support,
            click_event_forward: s.click_event_forward,
            use_mouse_events: s.use_mouse_events,
            swipe_distance: s.swipe_distance,
            show_page_corners: s.show_page_corners,
            disable_flip_by_click: s.disable_flip_by_click,
            easing: s.easing.name().into(),
            corner_smoothing: s.corner_smoothing,
            animation_mode: s.animation_mode.as_str().into(),
            max_hover_fold_distance: s.max_hover_fold_distance,
            lock_y_on_drag: s.lock_y_on_drag,
            duplicate_event_window: s.duplicate_event_window,
        }
    }
}

fn unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

/// Finite and strictly positive; rejects NaN and infinities
fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Validate and normalize raw options. Fails on the first violated rule.
pub fn validate(raw: FlipSetting) -> Result<Settings, ConfigError> {
    let size = match raw.size.as_str() {
        "fixed" => SizeType::Fixed,
        "stretch" => SizeType::Stretch,
        other => return Err(ConfigError::InvalidSize(other.to_string())),
    };

    if !positive(raw.width) || !positive(raw.height) {
        return Err(ConfigError::InvalidDimensions {
            width: raw.width,
            height: raw.height,
        });
    }
    if !positive(raw.flipping_time) {
        return Err(ConfigError::InvalidFlippingTime(raw.flipping_time));
    }
    if !unit_interval(raw.corner_smoothing) {
        return Err(ConfigError::InvalidCornerSmoothing(raw.corner_smoothing));
    }
    let animation_mode = match raw.animation_mode.as_str() {
        "corner" => AnimationMode::Corner,
        "page" => AnimationMode::Page,
        other => return Err(ConfigError::InvalidAnimationMode(other.to_string())),
    };
    if !unit_interval(raw.max_hover_fold_distance) {
        return Err(ConfigError::InvalidMaxHoverFoldDistance(
            raw.max_hover_fold_distance,
        ));
    }
    if !unit_interval(raw.max_shadow_opacity) {
        return Err(ConfigError::InvalidMaxShadowOpacity(raw.max_shadow_opacity));
    }
    if !(raw.swipe_distance >= 0.0) {
        return Err(ConfigError::InvalidSwipeDistance(raw.swipe_distance));
    }
    if !(raw.duplicate_event_window >= 0.0) {
        return Err(ConfigError::InvalidDuplicateEventWindow(
            raw.duplicate_event_window,
        ));
    }

    let (mut min_width, mut max_width, mut min_height, mut max_height) =
        (raw.min_width, raw.max_width, raw.min_height, raw.max_height);

    match size {
        SizeType::Stretch => {
            if min_width <= 0.0 {
                min_width = 100.0;
            }
            if max_width < min_width {
                max_width = 2000.0;
            }
            if min_height <= 0.0 {
                min_height = 100.0;
            }
            if max_height < min_height {
                max_height = 2000.0;
            }
        }
        SizeType::Fixed => {
            min_width = raw.width;
            max_width = raw.width;
            min_height = raw.height;
            max_height = raw.height;
        }
    }

    Ok(Settings {
        start_page: raw.start_page,
        size,
        width: raw.width,
        height: raw.height,
        min_width,
        max_width,
        min_height,
        max_height,
        draw_shadow: raw.draw_shadow,
        max_shadow_opacity: raw.max_shadow_opacity,
        flipping_time: raw.flipping_time,
        use_portrait: raw.use_portrait,
        start_z_index: raw.start_z_index,
        show_cover: raw.show_cover,
        mobile_scroll_support: raw.mobile_scroll_support,
        click_event_forward: raw.click_event_forward,
        use_mouse_events: raw.use_mouse_events,
        swipe_distance: raw.swipe_distance,
        show_page_corners: raw.show_page_corners,
        disable_flip_by_click: raw.disable_flip_by_click,
        easing: Easing::from_name(&raw.easing),
        corner_smoothing: raw.corner_smoothing,
        animation_mode,
        max_hover_fold_distance: raw.max_hover_fold_distance,
        lock_y_on_drag: raw.lock_y_on_drag,
        duplicate_event_window: raw.duplicate_event_window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_zero_width_is_rejected() {
        let err = validate(FlipSetting::with_size(0.0, 500.0)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDimensions {
                width: 0.0,
                height: 500.0
            }
        );
    }

    #[test]
    fn test_infinite_sizes_are_rejected() {
        assert!(matches!(
            validate(FlipSetting::with_size(f64::INFINITY, 500.0)),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            validate(FlipSetting::with_size(400.0, f64::NAN)),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        let raw = FlipSetting {
            flipping_time: f64::INFINITY,
            ..FlipSetting::with_size(400.0, 500.0)
        };
        assert_eq!(
            validate(raw),
            Err(ConfigError::InvalidFlippingTime(f64::INFINITY))
        );
    }

    #[test]
    fn test_size_must_be_exact() {
        let raw = FlipSetting {
            size: "Stretch".into(),
            ..FlipSetting::with_size(400.0, 500.0)
        };
        assert_eq!(validate(raw), Err(ConfigError::InvalidSize("Stretch".into())));
    }

    #[test]
    fn test_range_rules() {
        let base = FlipSetting::with_size(400.0, 500.0);
        let cases = [
            FlipSetting { flipping_time: 0.0, ..base.clone() },
            FlipSetting { corner_smoothing: 1.5, ..base.clone() },
            FlipSetting { animation_mode: "edge".into(), ..base.clone() },
            FlipSetting { max_hover_fold_distance: -0.1, ..base.clone() },
            FlipSetting { max_shadow_opacity: 2.0, ..base.clone() },
            FlipSetting { height: f64::NAN, ..base.clone() },
        ];
        for raw in cases {
            assert!(validate(raw.clone()).is_err(), "{:?} should be rejected", raw);
        }
    }

    #[test]
    fn test_stretch_defaults_bounds() {
        let raw = FlipSetting {
            size: "stretch".into(),
            min_width: 0.0,
            max_width: 50.0,
            min_height: 300.0,
            max_height: 900.0,
            ..FlipSetting::with_size(400.0, 500.0)
        };
        let s = validate(raw).unwrap();
        assert_eq!(s.size, SizeType::Stretch);
        assert_eq!((s.min_width, s.max_width), (100.0, 2000.0));
        assert_eq!((s.min_height, s.max_height), (300.0, 900.0));
    }

    #[test]
    fn test_fixed_collapses_bounds() {
        let raw = FlipSetting {
            min_width: 10.0,
            max_width: 9000.0,
            ..FlipSetting::with_size(400.0, 500.0)
        };
        let s = validate(raw).unwrap();
        assert_eq!((s.min_width, s.max_width), (400.0, 400.0));
        assert_eq!((s.min_height, s.max_height), (500.0, 500.0));
    }

    #[test]
    fn test_unknown_easing_is_lenient() {
        let raw = FlipSetting {
            easing: "wobble".into(),
            ..FlipSetting::with_size(400.0, 500.0)
        };
        assert_eq!(validate(raw).unwrap().easing, Easing::EaseOut);
    }

    #[test]
    fn test_from_json_camel_case() {
        let raw = FlipSetting::from_json(
            r#"{"width": 550, "height": 733, "size": "stretch", "showCover": true,
                "animationMode": "page", "lockYOnDrag": true}"#,
        )
        .unwrap();
        assert_eq!(raw.width, 550.0);
        assert!(raw.show_cover && raw.lock_y_on_drag);
        assert_eq!(raw.animation_mode, "page");
        assert_eq!(raw.flipping_time, 1000.0);
    }

    #[test]
    fn test_from_toml() {
        let raw = FlipSetting::from_toml("width = 300.0\nheight = 420.0\neasing = \"easeInOutCubic\"\n").unwrap();
        assert_eq!(validate(raw).unwrap().easing, Easing::EaseInOutCubic);
    }

    prop_compose! {
        fn valid_setting()(
            width in 1.0f64..3000.0,
            height in 1.0f64..3000.0,
            stretch in any::<bool>(),
            bounds in (-50.0f64..600.0, -50.0f64..3000.0, -50.0f64..600.0, -50.0f64..3000.0),
            flipping_time in 1.0f64..5000.0,
            corner_smoothing in 0.0f64..=1.0,
            hover in 0.0f64..=1.0,
            page_mode in any::<bool>(),
            easing in 0usize..Easing::ALL.len(),
        ) -> FlipSetting {
            let (min_width, max_width, min_height, max_height) = bounds;
            FlipSetting {
                size: if stretch { "stretch" } else { "fixed" }.into(),
                min_width, max_width, min_height, max_height,
                flipping_time,
                corner_smoothing,
                max_hover_fold_distance: hover,
                animation_mode: if page_mode { "page" } else { "corner" }.into(),
                easing: Easing::ALL[easing].name().into(),
                ..FlipSetting::with_size(width, height)
            }
        }
    }

    proptest! {
        #[test]
        fn prop_validate_is_idempotent(raw in valid_setting()) {
            let once = validate(raw).unwrap();
            let twice = validate(FlipSetting::from(&once)).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
