//! Flip controller: the gesture state machine.
//!
//! The controller owns the per-gesture [`FlipCalculation`] and the handles of
//! the pages taking part in the flip. Everything else it touches (render
//! layer, page collection, event listeners) is lent to it for the duration of
//! a call through [`FlipContext`].

pub mod calculation;

use tracing::debug;

pub use calculation::FlipCalculation;

use crate::animation::transitions::{settled, smooth_point};
use crate::animation::{Animation, Completion};
use crate::error::{FlipError, FlipResult};
use crate::events::{BookEvent, EventBus};
use crate::geometry::Point;
use crate::page::{PageCollection, PageDensity, PageHandle, PageOrientation};
use crate::render::{Orientation, Render};
use crate::settings::{AnimationMode, Settings};

/// Which way the book is being paged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlipDirection {
    #[default]
    Forward,
    Back,
}

/// Vertical half of the book edge a fold starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlipCorner {
    #[default]
    Top,
    Bottom,
}

impl FlipCorner {
    /// Corner for a book-local `y` in a book `height` pixels tall
    pub fn for_y(y: f64, height: f64) -> Self {
        if y >= height / 2.0 {
            FlipCorner::Bottom
        } else {
            FlipCorner::Top
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlippingState {
    /// Idle
    #[default]
    Read,
    /// Hovering a corner, no press
    FoldCorner,
    /// Dragging the page
    UserFold,
    /// Animating to completion or back to rest
    Flipping,
}

impl FlippingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlippingState::Read => "read",
            FlippingState::FoldCorner => "fold_corner",
            FlippingState::UserFold => "user_fold",
            FlippingState::Flipping => "flipping",
        }
    }
}

/// Pages the render layer draws on top of the current spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlipScene {
    pub state: FlippingState,
    pub flipping: Option<PageHandle>,
    pub bottom: Option<PageHandle>,
    /// Visible page rotating away during a hard landscape flip
    pub lifting: Option<usize>,
}

/// Book components lent to the controller for one call
pub struct FlipContext<'a> {
    pub render: &'a mut Render,
    pub pages: &'a mut PageCollection,
    pub events: &'a mut EventBus,
}

impl FlipContext<'_> {
    pub fn settings(&self) -> &Settings {
        self.render.settings()
    }

    /// Show the spread holding `page` and announce the new page index
    pub fn show(&mut self, page: Option<usize>) -> Option<usize> {
        let shown = self.pages.show(page);
        self.after_show(shown)
    }

    pub fn show_next(&mut self) -> Option<usize> {
        let shown = self.pages.show_next();
        self.after_show(shown)
    }

    pub fn show_prev(&mut self) -> Option<usize> {
        let shown = self.pages.show_prev();
        self.after_show(shown)
    }

    fn after_show(&mut self, shown: Option<usize>) -> Option<usize> {
        if let Some(page) = shown {
            self.recenter();
            self.events.emit(&BookEvent::Flip(page));
            self.render.request_frame();
        }
        shown
    }

    /// Center a lone cover or trailing page in landscape
    pub fn recenter(&mut self) {
        let side = if self.settings().show_cover {
            self.pages.single_page_side()
        } else {
            None
        };
        self.render.center_single_page(side);
    }
}

#[derive(Debug, Default)]
pub struct Flip {
    state: FlippingState,
    calc: Option<FlipCalculation>,
    flipping: Option<PageHandle>,
    bottom: Option<PageHandle>,
    lifting: Option<usize>,
    smoothed: Option<Point>,
    hover_target: Option<Point>,
    locked_y: Option<f64>,
}

impl Flip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FlippingState {
        self.state
    }

    pub fn calculation(&self) -> Option<&FlipCalculation> {
        self.calc.as_ref()
    }

    /// Smoothed hover point, page-local
    pub fn smoothed_position(&self) -> Option<Point> {
        self.smoothed
    }

    pub fn scene(&self) -> FlipScene {
        FlipScene {
            state: self.state,
            flipping: self.flipping,
            bottom: self.bottom,
            lifting: self.lifting,
        }
    }

    /// Whether hover smoothing still has ground to cover
    pub fn hover_pending(&self) -> bool {
        self.state == FlippingState::FoldCorner
            && match (self.smoothed, self.hover_target) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(current), Some(target)) => current != target,
            }
    }

    fn set_state(&mut self, ctx: &mut FlipContext<'_>, state: FlippingState) {
        if self.state != state {
            debug!("Flip state {} -> {}", self.state.as_str(), state.as_str());
            self.state = state;
            ctx.events.emit(&BookEvent::ChangeState(state));
        }
    }

    // ── Gestures ──

    /// Drag the page to `pos` (global)
    pub fn fold(&mut self, ctx: &mut FlipContext<'_>, pos: Point) {
        if ctx.render.has_animation() {
            self.finish_animation(ctx);
        }
        self.smoothed = None;
        self.hover_target = None;

        if self.calc.is_none() && !self.start(ctx, pos) {
            return;
        }
        self.set_state(ctx, FlippingState::UserFold);

        let mut page_pos = ctx.render.to_page(pos);
        if ctx.settings().lock_y_on_drag {
            page_pos.y = *self.locked_y.get_or_insert(page_pos.y);
        }
        self.do_(ctx, page_pos);
    }

    /// Turn the page from a click at `pos` (global)
    pub fn flip(&mut self, ctx: &mut FlipContext<'_>, pos: Point) {
        if ctx.settings().disable_flip_by_click && !self.is_point_on_corners(ctx, pos) {
            return;
        }
        if self.calc.is_some() {
            self.finish_animation(ctx);
        }
        if !self.start(ctx, pos) {
            return;
        }

        let rect = ctx.render.rect();
        self.set_state(ctx, FlippingState::Flipping);

        let margin = rect.height / 10.0;
        let Some(corner) = self.calc.as_ref().map(FlipCalculation::corner) else {
            return;
        };
        let (y_start, y_dest) = match corner {
            FlipCorner::Bottom => (rect.height - margin, rect.height),
            FlipCorner::Top => (margin, 0.0),
        };

        let start = Point::new(rect.page_width - margin, y_start);
        if let Some(calc) = self.calc.as_mut() {
            calc.calc(start);
        }
        self.animate_flipping_to(
            ctx,
            start,
            Point::new(-rect.page_width, y_dest),
            Completion {
                turned: true,
                reset: true,
            },
        );
    }

    /// Begin a gesture at `pos` (global). False when no flip is possible.
    pub fn start(&mut self, ctx: &mut FlipContext<'_>, pos: Point) -> bool {
        if ctx.render.has_animation() {
            self.finish_animation(ctx);
        }
        self.reset(ctx);

        let rect = ctx.render.rect();
        let book_pos = rect.to_book(pos);
        let direction = self.direction_by_point(ctx, book_pos);
        let corner = self.corner_by_point(ctx, book_pos);

        if !self.check_direction(ctx, direction) {
            debug!("No page to flip {:?} from page {}", direction, ctx.pages.current_page_index());
            return false;
        }

        match self.prepare(ctx, direction, corner) {
            Ok(()) => true,
            Err(e) => {
                debug!("Cannot flip {:?}: {}", direction, e);
                self.reset(ctx);
                false
            }
        }
    }

    fn prepare(
        &mut self,
        ctx: &mut FlipContext<'_>,
        direction: FlipDirection,
        corner: FlipCorner,
    ) -> FlipResult<()> {
        let flipping = ctx.pages.flipping_page(direction)?;
        self.flipping = Some(flipping);
        self.bottom = Some(ctx.pages.bottom_page(direction)?);

        if ctx.render.orientation() == Orientation::Landscape {
            let neighbour = match direction {
                FlipDirection::Back => ctx.pages.next_by(flipping),
                FlipDirection::Forward => ctx.pages.prev_by(flipping),
            };
            if let Some(neighbour) = neighbour {
                let density = ctx
                    .pages
                    .get(flipping)
                    .map(|p| p.density())
                    .ok_or(FlipError::InvalidPage(flipping.index()))?;
                let neighbour_page = ctx
                    .pages
                    .get_mut(neighbour)
                    .ok_or(FlipError::InvalidPage(neighbour.index()))?;
                if neighbour_page.density() != density {
                    neighbour_page.set_drawing_density(PageDensity::Hard);
                    if let Some(page) = ctx.pages.get_mut(flipping) {
                        page.set_drawing_density(PageDensity::Hard);
                    }
                }
                self.lifting = Some(neighbour.index());
            }
        }

        let rect = ctx.render.rect();
        ctx.render.set_direction(direction);
        self.calc = Some(FlipCalculation::new(direction, corner, rect.page_width, rect.height));
        Ok(())
    }

    /// Apply the fold for `page_pos` (page-local) to the pages in play
    pub fn do_(&mut self, ctx: &mut FlipContext<'_>, page_pos: Point) {
        let Some(calc) = self.calc.as_mut() else {
            return;
        };
        if !calc.calc(page_pos) {
            return;
        }

        let progress = calc.flipping_progress();
        let direction = calc.direction();
        let landscape = ctx.render.orientation() == Orientation::Landscape;

        if let Some(page) = self.bottom.and_then(|h| ctx.pages.get_mut(h)) {
            page.set_area(calc.bottom_clip_area());
            page.set_position(calc.bottom_page_position());
            page.set_angle(0.0);
            page.set_hard_angle(0.0);
            page.set_orientation(match direction {
                FlipDirection::Back => PageOrientation::Left,
                FlipDirection::Forward => PageOrientation::Right,
            });
        }

        let hard_angle = match direction {
            FlipDirection::Forward => 90.0 * (200.0 - progress * 2.0) / 100.0,
            FlipDirection::Back => -90.0 * (200.0 - progress * 2.0) / 100.0,
        };
        let lifting_angle = match direction {
            FlipDirection::Forward => hard_angle - 180.0,
            FlipDirection::Back => hard_angle + 180.0,
        };

        let mut hard = false;
        if let Some(page) = self.flipping.and_then(|h| ctx.pages.get_mut(h)) {
            page.set_area(calc.flipping_clip_area());
            page.set_position(calc.active_corner());
            page.set_angle(calc.angle());
            page.set_hard_angle(hard_angle);
            page.set_orientation(if direction == FlipDirection::Forward && landscape {
                PageOrientation::Left
            } else {
                PageOrientation::Right
            });

            hard = page.drawing_density() == PageDensity::Hard;
            if hard && !landscape && direction == FlipDirection::Forward {
                page.set_hard_drawing_angle(lifting_angle);
            }
        }

        if hard && landscape {
            if let Some(page) = self.lifting.and_then(|i| ctx.pages.page_mut(i).ok()) {
                page.set_hard_drawing_angle(lifting_angle);
            }
        }

        ctx.render.set_page_rect(*calc.rect());
        if let (Some(start), Some(angle)) = (calc.shadow_start_point(), calc.shadow_angle()) {
            ctx.render.set_shadow_data(start, angle, progress, direction);
        }
        ctx.render.request_frame();
    }

    /// Flip to the spread holding `page`, jumping to its neighbour first
    pub fn flip_to_page(&mut self, ctx: &mut FlipContext<'_>, page: usize, corner: FlipCorner) {
        let current = ctx.pages.current_spread_index();
        let Some(next) = ctx.pages.spread_index_by_page(page) else {
            debug!("Page {} is not in the book", page);
            return;
        };

        let (neighbour, direction) = if next > current {
            (next - 1, FlipDirection::Forward)
        } else if next < current {
            (next + 1, FlipDirection::Back)
        } else {
            return;
        };

        if ctx.pages.set_current_spread_index(neighbour).is_err() {
            return;
        }
        ctx.recenter();
        match direction {
            FlipDirection::Forward => self.flip_next(ctx, corner),
            FlipDirection::Back => self.flip_prev(ctx, corner),
        }
        if self.state != FlippingState::Flipping {
            // Nothing started: put the spread back
            let _ = ctx.pages.set_current_spread_index(current);
            ctx.recenter();
        }
    }

    pub fn flip_next(&mut self, ctx: &mut FlipContext<'_>, corner: FlipCorner) {
        let rect = ctx.render.rect();
        let y = match corner {
            FlipCorner::Top => 1.0,
            FlipCorner::Bottom => rect.height - 2.0,
        };
        self.flip(ctx, Point::new(rect.left + rect.page_width * 2.0 - 10.0, rect.top + y));
    }

    pub fn flip_prev(&mut self, ctx: &mut FlipContext<'_>, corner: FlipCorner) {
        let rect = ctx.render.rect();
        let y = match corner {
            FlipCorner::Top => 1.0,
            FlipCorner::Bottom => rect.height - 2.0,
        };
        let left = match ctx.render.orientation() {
            Orientation::Portrait => rect.left + rect.page_width,
            Orientation::Landscape => rect.left,
        };
        self.flip(ctx, Point::new(left + 10.0, rect.top + y));
    }

    /// Release a drag: finish the turn past the spine, otherwise fall back
    pub fn stop_move(&mut self, ctx: &mut FlipContext<'_>) {
        let Some(calc) = self.calc.as_ref() else {
            return;
        };
        let pos = calc.position();
        let corner = calc.corner();
        let rect = ctx.render.rect();
        let y = match corner {
            FlipCorner::Bottom => rect.height,
            FlipCorner::Top => 0.0,
        };

        self.smoothed = None;
        self.hover_target = None;
        if self.state == FlippingState::UserFold {
            self.set_state(ctx, FlippingState::Flipping);
        }

        if pos.x <= 0.0 {
            self.animate_flipping_to(
                ctx,
                pos,
                Point::new(-rect.page_width, y),
                Completion {
                    turned: true,
                    reset: true,
                },
            );
        } else {
            self.animate_flipping_to(
                ctx,
                pos,
                Point::new(rect.page_width, y),
                Completion {
                    turned: false,
                    reset: true,
                },
            );
        }
    }

    /// Pointer moved without a press: preview the fold near a corner
    pub fn show_corner(&mut self, ctx: &mut FlipContext<'_>, pos: Point) {
        if !matches!(self.state, FlippingState::Read | FlippingState::FoldCorner) {
            return;
        }

        if self.is_point_on_corners(ctx, pos) {
            if self.state == FlippingState::Read && ctx.render.has_animation() {
                self.finish_animation(ctx);
            }

            if self.calc.is_some() {
                self.hover_target = self.hover_target_for(ctx, pos);
                ctx.render.request_frame();
                return;
            }
            if !self.start(ctx, pos) {
                return;
            }
            self.set_state(ctx, FlippingState::FoldCorner);

            let rect = ctx.render.rect();
            let (pw, h) = (rect.page_width, rect.height);
            let settings = ctx.settings();
            let size = (settings.max_hover_fold_distance * pw).min(50.0);
            let page_mode = settings.animation_mode == AnimationMode::Page;

            let Some(corner) = self.calc.as_ref().map(FlipCalculation::corner) else {
                return;
            };
            let (y_start, y_dest) = match corner {
                FlipCorner::Bottom => (h - 1.0, h - size),
                FlipCorner::Top => (1.0, size),
            };
            let y_dest = if page_mode { y_start } else { y_dest };

            let start = Point::new(pw - 1.0, y_start);
            if let Some(calc) = self.calc.as_mut() {
                calc.calc(start);
            }
            self.hover_target = self.hover_target_for(ctx, pos);
            self.animate_flipping_to(
                ctx,
                start,
                Point::new(pw - size.max(1.0), y_dest),
                Completion {
                    turned: false,
                    reset: false,
                },
            );
        } else if self.state == FlippingState::FoldCorner {
            self.set_state(ctx, FlippingState::Read);
            self.finish_animation(ctx);
            self.stop_move(ctx);
        }
    }

    /// Page-local point the hover fold should settle on for pointer `pos`
    fn hover_target_for(&self, ctx: &FlipContext<'_>, pos: Point) -> Option<Point> {
        let calc = self.calc.as_ref()?;
        let rect = ctx.render.rect();
        let settings = ctx.settings();
        let (pw, h) = (rect.page_width, rect.height);
        let limit = settings.max_hover_fold_distance * pw;

        let edge_y = match calc.corner() {
            FlipCorner::Bottom => h - 1.0,
            FlipCorner::Top => 1.0,
        };
        let rest = Point::new(pw - 1.0, edge_y);
        let pointer = ctx.render.to_page(pos);

        let target = match settings.animation_mode {
            AnimationMode::Page => Point::new(pointer.x.clamp(rest.x - limit, rest.x), edge_y),
            AnimationMode::Corner => {
                let (dx, dy) = (pointer.x - rest.x, pointer.y - rest.y);
                let travel = dx.hypot(dy);
                let scale = if travel > limit && travel > 0.0 {
                    limit / travel
                } else {
                    1.0
                };
                Point::new(
                    (rest.x + dx * scale).min(rest.x),
                    (rest.y + dy * scale).clamp(1.0, h - 1.0),
                )
            }
        };
        Some(target)
    }

    /// Advance hover smoothing by one frame. Returns whether more frames are needed.
    pub fn step_hover(&mut self, ctx: &mut FlipContext<'_>) -> bool {
        if self.state != FlippingState::FoldCorner {
            return false;
        }
        let (Some(target), Some(calc)) = (self.hover_target, self.calc.as_ref()) else {
            return false;
        };

        let current = self.smoothed.unwrap_or_else(|| calc.position());
        let mut next = smooth_point(current, target, ctx.settings().corner_smoothing);
        if settled(next, target) {
            next = target;
        }
        self.smoothed = Some(next);
        self.do_(ctx, next);

        let more = next != target;
        if more {
            ctx.render.request_frame();
        }
        more
    }

    fn animate_flipping_to(
        &mut self,
        ctx: &mut FlipContext<'_>,
        start: Point,
        dest: Point,
        completion: Completion,
    ) {
        if ctx.render.has_animation() {
            self.finish_animation(ctx);
            if self.calc.is_none() {
                return;
            }
        }

        let settings = ctx.settings();
        let frames = Animation::between(start, dest, settings.easing);
        let duration = Animation::duration_for(frames.len(), settings.flipping_time);
        debug!(
            "Animating {} frames over {:.0}ms (turn: {})",
            frames.len(),
            duration,
            completion.turned
        );
        ctx.render.start_animation(Animation::new(frames, duration, completion));
    }

    /// Jump the running animation to its last frame and complete it
    pub fn finish_animation(&mut self, ctx: &mut FlipContext<'_>) {
        if let Some(animation) = ctx.render.take_animation() {
            if let Some(last) = animation.last_frame() {
                self.do_(ctx, last);
            }
            self.on_animation_end(ctx, animation.completion());
        }
    }

    /// Completion path of a flip animation
    pub fn on_animation_end(&mut self, ctx: &mut FlipContext<'_>, completion: Completion) {
        let Some(direction) = self.calc.as_ref().map(FlipCalculation::direction) else {
            return;
        };

        if completion.reset {
            ctx.render.clear_shadow();
            self.set_state(ctx, FlippingState::Read);
        }
        if completion.turned {
            match direction {
                FlipDirection::Back => ctx.show_prev(),
                FlipDirection::Forward => ctx.show_next(),
            };
        }
        if completion.reset {
            self.reset(ctx);
        } else if self.hover_pending() {
            ctx.render.request_frame();
        }
    }

    /// Abandon whatever is in progress and return to `Read` without turning
    pub fn cancel(&mut self, ctx: &mut FlipContext<'_>) {
        if let Some(animation) = ctx.render.take_animation() {
            debug!("Cancelled animation of {} frames", animation.frames().len());
        }
        ctx.render.clear_shadow();
        self.set_state(ctx, FlippingState::Read);
        self.reset(ctx);
    }

    /// Drop the gesture and put every page in play back at rest
    pub fn reset(&mut self, ctx: &mut FlipContext<'_>) {
        let handles = [self.flipping, self.bottom, self.lifting.map(PageHandle::Page)];
        for handle in handles.into_iter().flatten() {
            if let Ok(page) = ctx.pages.page_mut(handle.index()) {
                page.restore_drawing_density();
                page.reset_state();
                page.hide_temporary_copy();
            }
        }

        self.calc = None;
        self.flipping = None;
        self.bottom = None;
        self.lifting = None;
        self.smoothed = None;
        self.hover_target = None;
        self.locked_y = None;
        ctx.render.clear_page_rect();
    }

    // ── Hit testing ──

    /// Whether the gesture may go `direction` from the current page
    pub fn check_direction(&self, ctx: &FlipContext<'_>, direction: FlipDirection) -> bool {
        let current = ctx.pages.current_page_index();
        match direction {
            FlipDirection::Forward => current + 1 < ctx.pages.page_count(),
            FlipDirection::Back => current >= 1,
        }
    }

    /// Direction for a press at `book_pos` (book-local)
    pub fn direction_by_point(&self, ctx: &FlipContext<'_>, book_pos: Point) -> FlipDirection {
        let rect = ctx.render.rect();
        let back = match ctx.render.orientation() {
            Orientation::Portrait => book_pos.x - rect.page_width <= rect.width / 5.0,
            Orientation::Landscape => book_pos.x < rect.width / 2.0,
        };
        if back {
            FlipDirection::Back
        } else {
            FlipDirection::Forward
        }
    }

    /// Corner for a press at `book_pos`; page mode resolves the middle band to bottom
    pub fn corner_by_point(&self, ctx: &FlipContext<'_>, book_pos: Point) -> FlipCorner {
        let height = ctx.render.rect().height;
        let dead_zone = ctx.settings().animation_mode == AnimationMode::Page
            && (book_pos.y - height / 2.0).abs() <= height * 0.05;
        if dead_zone {
            FlipCorner::Bottom
        } else {
            FlipCorner::for_y(book_pos.y, height)
        }
    }

    /// Whether `pos` (global) is inside a region that starts a hover fold
    pub fn is_point_on_corners(&self, ctx: &FlipContext<'_>, pos: Point) -> bool {
        let rect = ctx.render.rect();
        let book_pos = rect.to_book(pos);
        let (pw, h) = (rect.page_width, rect.height);

        let inner_left = match ctx.render.orientation() {
            Orientation::Portrait => pw,
            Orientation::Landscape => 0.0,
        };
        let inside = book_pos.x > inner_left
            && book_pos.y > 0.0
            && book_pos.x < rect.width
            && book_pos.y < h;
        if !inside {
            return false;
        }

        match ctx.settings().animation_mode {
            AnimationMode::Page => {
                let band = pw / 4.0;
                book_pos.x < inner_left + band || book_pos.x > rect.width - band
            }
            AnimationMode::Corner => {
                let distance = pw.hypot(h) / 5.0;
                (book_pos.x < inner_left + distance || book_pos.x > rect.width - distance)
                    && (book_pos.y < distance || book_pos.y > h - distance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ManualScheduler;
    use crate::page::testing::RecordingSurface;
    use crate::page::PageSource;
    use crate::settings::FlipSetting;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Rig {
        flip: Flip,
        render: Render,
        pages: PageCollection,
        events: EventBus,
        seen: Rc<RefCell<Vec<BookEvent>>>,
    }

    impl Rig {
        /// Landscape book 800x300 in an 800x300 block, pages 400x300
        fn new(count: usize, tweak: impl FnOnce(&mut FlipSetting)) -> Self {
            let mut raw = FlipSetting::with_size(400.0, 300.0);
            tweak(&mut raw);
            let settings = raw.validate().unwrap();
            let render = Render::new(settings.clone(), Box::new(ManualScheduler::new()), 800.0, 300.0);
            let sources = (0..count)
                .map(|_| PageSource::soft(Box::new(RecordingSurface::default())))
                .collect();
            let pages = PageCollection::new(sources, settings.show_cover, render.orientation());
            let mut events = EventBus::new();
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = seen.clone();
            events.on_any(move |e| sink.borrow_mut().push(e.clone()));
            Self {
                flip: Flip::new(),
                render,
                pages,
                events,
                seen,
            }
        }

        fn ctx(&mut self) -> (&mut Flip, FlipContext<'_>) {
            (
                &mut self.flip,
                FlipContext {
                    render: &mut self.render,
                    pages: &mut self.pages,
                    events: &mut self.events,
                },
            )
        }

        fn finish(&mut self) {
            let (flip, mut ctx) = self.ctx();
            flip.finish_animation(&mut ctx);
        }
    }

    #[test]
    fn test_direction_guard_at_first_page() {
        let mut rig = Rig::new(4, |_| {});
        let (flip, mut ctx) = rig.ctx();
        assert!(!flip.start(&mut ctx, Point::new(10.0, 10.0)));
        assert_eq!(flip.state(), FlippingState::Read);
        assert!(flip.calculation().is_none());
    }

    #[test]
    fn test_flip_next_turns_spread() {
        let mut rig = Rig::new(4, |_| {});
        {
            let (flip, mut ctx) = rig.ctx();
            flip.flip_next(&mut ctx, FlipCorner::Top);
            assert_eq!(flip.state(), FlippingState::Flipping);
        }
        rig.finish();

        assert_eq!(rig.flip.state(), FlippingState::Read);
        assert_eq!(rig.pages.current_page_index(), 2);
        let seen = rig.seen.borrow();
        assert_eq!(
            *seen,
            vec![
                BookEvent::ChangeState(FlippingState::Flipping),
                BookEvent::ChangeState(FlippingState::Read),
                BookEvent::Flip(2),
            ]
        );
    }

    #[test]
    fn test_flip_to_page_from_cover_uses_full_spread() {
        let mut rig = Rig::new(6, |s| s.show_cover = true);
        let (flip, mut ctx) = rig.ctx();
        ctx.recenter();
        let left = ctx.render.bounds_rect().left;
        assert_eq!(ctx.render.rect().left, left - 200.0);

        flip.flip_to_page(&mut ctx, 4, FlipCorner::Top);
        assert_eq!(flip.state(), FlippingState::Flipping);
        assert_eq!(ctx.pages.current_spread_index(), 1);
        assert_eq!(ctx.render.rect().left, left);
    }

    #[test]
    fn test_release_behind_spine_ends_fully_turned() {
        let mut rig = Rig::new(4, |_| {});
        let (flip, mut ctx) = rig.ctx();
        flip.fold(&mut ctx, Point::new(780.0, 20.0));
        flip.fold(&mut ctx, Point::new(350.0, 60.0));
        flip.stop_move(&mut ctx);

        let animation = ctx.render.take_animation().unwrap();
        let last = animation.last_frame().unwrap();
        assert!(last.distance_to(Point::new(-400.0, 0.0)) < 1e-9);

        flip.do_(&mut ctx, last);
        let calc = flip.calculation().unwrap();
        assert!((calc.flipping_progress() - 100.0).abs() < 1e-9);
        let page = ctx.pages.get(flip.scene().flipping.unwrap()).unwrap();
        assert!(page.state().hard_angle.abs() < 1e-9);

        flip.on_animation_end(&mut ctx, animation.completion());
        assert_eq!(flip.state(), FlippingState::Read);
        assert_eq!(ctx.pages.current_page_index(), 2);
    }

    #[test]
    fn test_hard_angle_follows_progress() {
        let mut rig = Rig::new(4, |_| {});
        let (flip, mut ctx) = rig.ctx();
        assert!(flip.start(&mut ctx, Point::new(790.0, 10.0)));
        flip.do_(&mut ctx, Point::new(200.0, 40.0));

        let progress = flip.calculation().unwrap().flipping_progress();
        let page = ctx.pages.get(flip.scene().flipping.unwrap()).unwrap();
        let expected = 90.0 * (200.0 - 2.0 * progress) / 100.0;
        assert!((page.state().hard_angle - expected).abs() < 1e-9);
    }

    #[test]
    fn test_release_behind_spine_completes_turn() {
        let mut rig = Rig::new(4, |_| {});
        {
            let (flip, mut ctx) = rig.ctx();
            flip.fold(&mut ctx, Point::new(780.0, 20.0));
            flip.fold(&mut ctx, Point::new(350.0, 60.0));
            assert_eq!(flip.state(), FlippingState::UserFold);
            assert!(flip.calculation().unwrap().position().x <= 0.0);
            flip.stop_move(&mut ctx);
            assert_eq!(flip.state(), FlippingState::Flipping);
        }
        rig.finish();
        assert_eq!(rig.pages.current_page_index(), 2);
    }

    #[test]
    fn test_release_before_spine_falls_back() {
        let mut rig = Rig::new(4, |_| {});
        {
            let (flip, mut ctx) = rig.ctx();
            flip.fold(&mut ctx, Point::new(780.0, 20.0));
            flip.fold(&mut ctx, Point::new(700.0, 60.0));
            flip.stop_move(&mut ctx);
        }
        rig.finish();
        assert_eq!(rig.pages.current_page_index(), 0);
        assert_eq!(rig.flip.state(), FlippingState::Read);
        assert!(rig.pages.page(2).unwrap().state().area.is_none());
    }

    #[test]
    fn test_lock_y_pins_drag_height() {
        let mut rig = Rig::new(4, |s| s.lock_y_on_drag = true);
        let (flip, mut ctx) = rig.ctx();
        flip.fold(&mut ctx, Point::new(780.0, 40.0));
        flip.fold(&mut ctx, Point::new(600.0, 120.0));
        let flipping = flip.scene().flipping.unwrap();
        assert!(ctx.pages.get(flipping).unwrap().state().area.is_some());
        assert_eq!(flip.locked_y, Some(40.0));
    }

    #[test]
    fn test_mixed_density_pairs_as_hard_and_restores() {
        let mut rig = Rig::new(4, |_| {});
        rig.pages.page_mut(2).unwrap().set_density(PageDensity::Hard);
        {
            let (flip, mut ctx) = rig.ctx();
            assert!(flip.start(&mut ctx, Point::new(790.0, 10.0)));
            assert_eq!(flip.scene().lifting, Some(1));
        }
        assert_eq!(rig.pages.page(1).unwrap().drawing_density(), PageDensity::Hard);
        assert_eq!(rig.pages.page(2).unwrap().drawing_density(), PageDensity::Hard);

        let (flip, mut ctx) = rig.ctx();
        flip.reset(&mut ctx);
        assert_eq!(ctx.pages.page(1).unwrap().drawing_density(), PageDensity::Soft);
    }

    #[test]
    fn test_corner_mode_hover_region() {
        let mut rig = Rig::new(4, |_| {});
        let (flip, ctx) = rig.ctx();
        // diagonal of 400x300 is 500, operating distance 100
        assert!(flip.is_point_on_corners(&ctx, Point::new(750.0, 50.0)));
        assert!(!flip.is_point_on_corners(&ctx, Point::new(750.0, 150.0)));
        assert!(!flip.is_point_on_corners(&ctx, Point::new(400.0, 20.0)));
    }

    #[test]
    fn test_page_mode_dead_zone_resolves_to_bottom() {
        let mut rig = Rig::new(4, |s| s.animation_mode = "page".into());
        let (flip, ctx) = rig.ctx();
        assert!(flip.is_point_on_corners(&ctx, Point::new(760.0, 150.0)));
        assert_eq!(flip.corner_by_point(&ctx, Point::new(760.0, 140.0)), FlipCorner::Bottom);
        assert_eq!(flip.corner_by_point(&ctx, Point::new(760.0, 100.0)), FlipCorner::Top);
    }

    #[test]
    fn test_hover_smoothing_converges() {
        let mut rig = Rig::new(4, |_| {});
        let (flip, mut ctx) = rig.ctx();
        flip.show_corner(&mut ctx, Point::new(780.0, 20.0));
        assert_eq!(flip.state(), FlippingState::FoldCorner);
        flip.finish_animation(&mut ctx);
        assert_eq!(flip.state(), FlippingState::FoldCorner);

        flip.show_corner(&mut ctx, Point::new(760.0, 40.0));
        let target = flip.hover_target.unwrap();
        let mut steps = 0;
        while flip.step_hover(&mut ctx) {
            steps += 1;
            assert!(steps < 1000);
        }
        assert_eq!(flip.smoothed_position(), Some(target));
    }

    #[test]
    fn test_hover_target_travel_is_limited() {
        let mut rig = Rig::new(4, |s| s.max_hover_fold_distance = 0.1);
        let (flip, mut ctx) = rig.ctx();
        flip.show_corner(&mut ctx, Point::new(720.0, 90.0));
        let target = flip.hover_target.unwrap();
        let rest = Point::new(399.0, 1.0);
        assert!(target.distance_to(rest) <= 40.0 + 1e-9);
    }
}
