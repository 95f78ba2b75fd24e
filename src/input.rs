//! Pointer, touch and keyboard interpretation.
//!
//! [`Input`] turns raw events into [`Gesture`]s for the book to dispatch:
//! a press that moves more than a few pixels becomes a drag, a press that
//! doesn't becomes a click, and a short fast touch stroke becomes a swipe.
//! Touch presses only start a drag after [`SWIPE_TIMEOUT_MS`] so a swipe can
//! claim them first.

use tracing::debug;

use crate::flip::{FlipCorner, FlippingState};
use crate::geometry::Point;
use crate::settings::Settings;

/// Longest touch stroke that still counts as a swipe, and the delay before a
/// touch press starts a drag
pub const SWIPE_TIMEOUT_MS: f64 = 250.0;

/// Pointer travel before a press becomes a drag
const DRAG_THRESHOLD: f64 = 5.0;

/// Horizontal travel before a touch move is taken from page scrolling
const TOUCH_SCROLL_THRESHOLD: f64 = 10.0;

/// What the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerTarget {
    /// The book itself
    #[default]
    Page,
    /// A link or button laid over a page
    Interactive,
}

/// Keys the book reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
}

/// A gesture for the flip controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Hover without a press
    ShowCorner(Point),
    /// Drag the page
    Fold(Point),
    /// Press and release without moving
    Click(Point),
    /// Release after a drag
    StopMove,
    FlipNext(FlipCorner),
    FlipPrev(FlipCorner),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchPoint {
    point: Point,
    time: f64,
}

/// Suppresses repeats of a discrete trigger inside a time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    window: f64,
    last: Option<f64>,
}

impl Cooldown {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window: window_ms,
            last: None,
        }
    }

    /// Whether a trigger at `now` may fire. Records it when it does.
    pub fn try_fire(&mut self, now: f64) -> bool {
        if let Some(last) = self.last {
            if now - last < self.window {
                debug!("Duplicate trigger {:.0}ms after the last one ignored", now - last);
                return false;
            }
        }
        self.last = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone)]
pub struct Input {
    press: Option<Point>,
    is_user_touch: bool,
    is_user_move: bool,
    touch_point: Option<TouchPoint>,
    pending_touch: Option<TouchPoint>,
    cooldown: Cooldown,
}

impl Input {
    pub fn new(settings: &Settings) -> Self {
        Self {
            press: None,
            is_user_touch: false,
            is_user_move: false,
            touch_point: None,
            pending_touch: None,
            cooldown: Cooldown::new(settings.duplicate_event_window),
        }
    }

    /// Gate for discrete triggers (clicks, swipes, keys, flip commands)
    pub fn allow_trigger(&mut self, now: f64) -> bool {
        self.cooldown.try_fire(now)
    }

    fn accepts(settings: &Settings, target: PointerTarget) -> bool {
        !(settings.click_event_forward && target == PointerTarget::Interactive)
    }

    fn start_user_touch(&mut self, pos: Point) {
        self.press = Some(pos);
        self.is_user_touch = true;
        self.is_user_move = false;
    }

    /// Returns whether the host should suppress its default action
    pub fn mouse_down(&mut self, settings: &Settings, pos: Point, target: PointerTarget) -> bool {
        if !settings.use_mouse_events || !Self::accepts(settings, target) {
            return false;
        }
        self.start_user_touch(pos);
        true
    }

    /// Returns whether the host should suppress its default action
    pub fn touch_start(&mut self, settings: &Settings, pos: Point, target: PointerTarget, now: f64) -> bool {
        if !settings.use_mouse_events || !Self::accepts(settings, target) {
            return false;
        }
        let touch = TouchPoint { point: pos, time: now };
        self.touch_point = Some(touch);
        self.pending_touch = Some(touch);
        !settings.mobile_scroll_support
    }

    pub fn has_pending_touch(&self) -> bool {
        self.pending_touch.is_some()
    }

    /// Start the delayed drag of a touch press once the swipe window passed
    pub fn poll_touch_start(&mut self, now: f64) -> bool {
        match self.pending_touch {
            Some(touch) if now - touch.time >= SWIPE_TIMEOUT_MS => {
                self.pending_touch = None;
                if self.touch_point.is_some() {
                    self.start_user_touch(touch.point);
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    pub fn mouse_move(&mut self, settings: &Settings, pos: Point) -> Option<Gesture> {
        if !settings.use_mouse_events {
            return None;
        }
        self.user_move(settings, pos, false)
    }

    /// Returns the gesture, if any, and whether the host should suppress scrolling
    pub fn touch_move(
        &mut self,
        settings: &Settings,
        pos: Point,
        state: FlippingState,
    ) -> (Option<Gesture>, bool) {
        if !settings.use_mouse_events {
            return (None, false);
        }
        if !settings.mobile_scroll_support {
            return (self.user_move(settings, pos, true), false);
        }

        let mut gesture = None;
        if let Some(touch) = self.touch_point {
            if (touch.point.x - pos.x).abs() > TOUCH_SCROLL_THRESHOLD || state != FlippingState::Read {
                gesture = self.user_move(settings, pos, true);
            }
        }
        (gesture, state != FlippingState::Read)
    }

    fn user_move(&mut self, settings: &Settings, pos: Point, is_touch: bool) -> Option<Gesture> {
        if !self.is_user_touch && !is_touch && settings.show_page_corners {
            return Some(Gesture::ShowCorner(pos));
        }
        if self.is_user_touch {
            let press = self.press?;
            if press.distance_to(pos) > DRAG_THRESHOLD {
                self.is_user_move = true;
                return Some(Gesture::Fold(pos));
            }
        }
        None
    }

    pub fn mouse_up(&mut self, settings: &Settings, pos: Point) -> Option<Gesture> {
        if !settings.use_mouse_events {
            return None;
        }
        self.user_stop(pos, false)
    }

    /// `book_height` picks the corner of a swipe flip
    pub fn touch_end(
        &mut self,
        settings: &Settings,
        pos: Point,
        book_top: f64,
        book_height: f64,
        now: f64,
    ) -> Vec<Gesture> {
        if !settings.use_mouse_events {
            return Vec::new();
        }

        let mut gestures = Vec::new();
        let mut is_swipe = false;
        self.pending_touch = None;

        if let Some(touch) = self.touch_point.take() {
            let dx = pos.x - touch.point.x;
            let dist_y = (pos.y - touch.point.y).abs();
            let distance = settings.swipe_distance;

            if dx.abs() > distance && dist_y < distance * 2.0 && now - touch.time < SWIPE_TIMEOUT_MS {
                let corner = FlipCorner::for_y(touch.point.y - book_top, book_height);
                gestures.push(if dx > 0.0 {
                    Gesture::FlipPrev(corner)
                } else {
                    Gesture::FlipNext(corner)
                });
                is_swipe = true;
            }
        }

        gestures.extend(self.user_stop(pos, is_swipe));
        gestures
    }

    fn user_stop(&mut self, pos: Point, is_swipe: bool) -> Option<Gesture> {
        if !self.is_user_touch {
            return None;
        }
        self.is_user_touch = false;
        if is_swipe {
            return None;
        }
        if self.is_user_move {
            Some(Gesture::StopMove)
        } else {
            Some(Gesture::Click(pos))
        }
    }
}
