pub mod easing;
pub mod scheduler;
pub mod transitions;

pub use easing::{interpolate, interpolate_point, Easing};
pub use scheduler::{Clock, FlagScheduler, FrameScheduler, ManualClock, ManualScheduler, SystemClock};

use crate::geometry::{points_between, Point};

/// What happens once a flip animation has played its last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// The page was turned past the spine: advance or retreat the spread
    pub turned: bool,
    /// Return to `Read` and drop the gesture
    pub reset: bool,
}

/// Result of sampling an animation at a frame timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Playback {
    /// Apply this drag point
    Frame(Point),
    /// The animation ran out of frames
    Finished(Completion),
}

/// A precomputed flip animation: one drag point per frame
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Point>,
    duration: f64,
    frame_duration: f64,
    started_at: Option<f64>,
    completion: Completion,
}

impl Animation {
    pub fn new(frames: Vec<Point>, duration: f64, completion: Completion) -> Self {
        let frame_duration = if frames.is_empty() {
            0.0
        } else {
            duration / frames.len() as f64
        };
        Self {
            frames,
            duration,
            frame_duration,
            started_at: None,
            completion,
        }
    }

    /// Frames from `start` to `dest`, one per pixel of travel, spaced by `easing`
    pub fn between(start: Point, dest: Point, easing: Easing) -> Vec<Point> {
        let count = points_between(start, dest).len();
        if count <= 1 {
            return vec![start];
        }
        let last = (count - 1) as f64;
        (0..count)
            .map(|i| interpolate_point(start, dest, i as f64 / last, easing))
            .collect()
    }

    /// Playback length for `frame_count` frames: the full flipping time from
    /// 1000 frames upwards, proportionally shorter below that.
    pub fn duration_for(frame_count: usize, flipping_time: f64) -> f64 {
        if frame_count >= 1000 {
            flipping_time
        } else {
            (frame_count as f64 / 1000.0) * flipping_time
        }
    }

    pub fn frames(&self) -> &[Point] {
        &self.frames
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn last_frame(&self) -> Option<Point> {
        self.frames.last().copied()
    }

    /// Sample the animation at `timer`. The first call latches the start time.
    pub fn sample(&mut self, timer: f64) -> Playback {
        let started_at = *self.started_at.get_or_insert(timer);

        if self.frame_duration <= 0.0 {
            return match self.frames.first() {
                Some(p) if timer <= started_at => Playback::Frame(*p),
                _ => Playback::Finished(self.completion),
            };
        }

        let index = ((timer - started_at) / self.frame_duration).round();
        if index >= 0.0 && (index as usize) < self.frames.len() {
            Playback::Frame(self.frames[index as usize])
        } else {
            Playback::Finished(self.completion)
        }
    }
}

/// Linear interpolation
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Exponential ease-out interpolation (smooth approach)
pub fn ease_out(current: f64, target: f64, factor: f64) -> f64 {
    current + (target - current) * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const DONE: Completion = Completion {
        turned: true,
        reset: true,
    };

    #[test]
    fn test_duration_scales_below_thousand_frames() {
        assert_eq!(Animation::duration_for(500, 1000.0), 500.0);
        assert_eq!(Animation::duration_for(1000, 800.0), 800.0);
        assert_eq!(Animation::duration_for(4000, 800.0), 800.0);
    }

    #[test]
    fn test_between_keeps_endpoints() {
        let frames = Animation::between(Point::new(100.0, 0.0), Point::new(-100.0, 0.0), Easing::EaseInOutCubic);
        assert_eq!(frames.len(), 201);
        assert_eq!(frames[0], Point::new(100.0, 0.0));
        assert_eq!(frames[200], Point::new(-100.0, 0.0));
    }

    #[test]
    fn test_sample_plays_frames_then_finishes() {
        let frames = vec![Point::new(3.0, 0.0), Point::new(2.0, 0.0), Point::new(1.0, 0.0)];
        let mut animation = Animation::new(frames, 30.0, DONE);

        assert_eq!(animation.sample(1000.0), Playback::Frame(Point::new(3.0, 0.0)));
        assert_eq!(animation.sample(1010.0), Playback::Frame(Point::new(2.0, 0.0)));
        assert_eq!(animation.sample(1020.0), Playback::Frame(Point::new(1.0, 0.0)));
        assert_eq!(animation.sample(1030.0), Playback::Finished(DONE));
    }

    #[test]
    fn test_zero_duration_finishes_after_first_frame() {
        let mut animation = Animation::new(vec![Point::new(1.0, 1.0)], 0.0, DONE);
        assert_eq!(animation.sample(5.0), Playback::Frame(Point::new(1.0, 1.0)));
        assert_eq!(animation.sample(6.0), Playback::Finished(DONE));
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
        assert_eq!(ease_out(0.0, 10.0, 0.25), 2.5);
    }
}
