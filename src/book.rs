//! The public book object.
//!
//! [`Book`] owns every engine component and is the only type embedding code
//! needs: it takes pages, pointer and keyboard input, and frame callbacks, and
//! reports back through [`BookEvent`] listeners and [`FrameSnapshot`]s.

use tracing::{debug, info};

use crate::animation::{Clock, FrameScheduler, ManualScheduler, Playback, SystemClock};
use crate::error::FlipResult;
use crate::events::{BookEvent, BookEventKind, EventBus, ListenerId};
use crate::flip::{Flip, FlipContext, FlipCorner, FlippingState};
use crate::geometry::{PageRect, Point};
use crate::input::{Gesture, Input, Key, PointerTarget};
use crate::page::{PageCollection, PageSnapshot, PageSource};
use crate::render::{FrameSnapshot, Orientation, Render};
use crate::settings::{FlipSetting, Settings};

#[derive(Debug)]
pub struct Book {
    render: Render,
    pages: PageCollection,
    flip: Flip,
    input: Input,
    events: EventBus,
    clock: Box<dyn Clock>,
    last_frame: Option<FrameSnapshot>,
}

impl Book {
    /// Book in a `width`×`height` block, driven by a [`ManualScheduler`] and
    /// the system clock
    pub fn new(raw: FlipSetting, width: f64, height: f64) -> FlipResult<Self> {
        Self::with_runtime(
            raw,
            width,
            height,
            Box::new(ManualScheduler::new()),
            Box::new(SystemClock::new()),
        )
    }

    /// Book with an injected frame scheduler and clock.
    ///
    /// Settings are validated before anything else is built; this is the only
    /// place an error reaches the caller.
    pub fn with_runtime(
        raw: FlipSetting,
        width: f64,
        height: f64,
        scheduler: Box<dyn FrameScheduler>,
        clock: Box<dyn Clock>,
    ) -> FlipResult<Self> {
        let settings = raw.validate()?;
        let render = Render::new(settings.clone(), scheduler, width, height);
        let pages = PageCollection::empty(render.orientation());
        info!(
            "Book ready: {}x{} pages, {} layout",
            settings.width,
            settings.height,
            render.orientation().as_str()
        );
        Ok(Self {
            input: Input::new(&settings),
            render,
            pages,
            flip: Flip::new(),
            events: EventBus::new(),
            clock,
            last_frame: None,
        })
    }

    fn split(&mut self) -> (&mut Flip, FlipContext<'_>) {
        (
            &mut self.flip,
            FlipContext {
                render: &mut self.render,
                pages: &mut self.pages,
                events: &mut self.events,
            },
        )
    }

    // ── Pages ──

    /// Replace the book content and show the start page
    pub fn load(&mut self, sources: Vec<PageSource>) {
        self.cancel_flip();
        self.pages.destroy();
        self.pages = PageCollection::new(sources, self.render.settings().show_cover, self.render.orientation());
        debug!("Loaded {} pages", self.pages.page_count());

        let start = self.render.settings().start_page;
        let (_, mut ctx) = self.split();
        if ctx.show(Some(start)).is_none() {
            ctx.show(Some(0));
        }

        let event = BookEvent::Init {
            page: self.pages.current_page_index(),
            mode: self.render.orientation(),
        };
        self.events.emit(&event);
    }

    /// Swap the page list. The same count patches pages in place, any other
    /// count rebuilds the collection.
    pub fn update_pages(&mut self, sources: Vec<PageSource>) {
        self.cancel_flip();
        let current = self.pages.current_page_index();

        if sources.len() == self.pages.page_count() {
            self.pages.patch(sources);
        } else {
            self.pages.destroy();
            self.pages = PageCollection::new(sources, self.render.settings().show_cover, self.render.orientation());
        }
        debug!("Updated to {} pages", self.pages.page_count());

        let target = current.min(self.pages.page_count().saturating_sub(1));
        let (_, mut ctx) = self.split();
        ctx.show(Some(target));

        let event = BookEvent::Update {
            page: self.pages.current_page_index(),
            mode: self.render.orientation(),
        };
        self.events.emit(&event);
    }

    /// Hide every page and drop the content
    pub fn destroy(&mut self) {
        self.cancel_flip();
        self.pages.destroy();
        self.render.cancel_frame();
        self.last_frame = None;
    }

    /// Fit the book into a new block size
    pub fn resize(&mut self, width: f64, height: f64) {
        let changed = self.render.update(width, height);
        let (flip, mut ctx) = self.split();

        if let Some(orientation) = changed {
            info!("Orientation changed to {}", orientation.as_str());
            flip.cancel(&mut ctx);
            ctx.pages.set_orientation(orientation);
            ctx.show(None);
            ctx.events.emit(&BookEvent::ChangeOrientation(orientation));
        } else {
            ctx.recenter();
        }
        ctx.render.request_frame();
    }

    fn cancel_flip(&mut self) {
        let (flip, mut ctx) = self.split();
        flip.cancel(&mut ctx);
    }

    // ── Frames ──

    /// Advance animation or hover smoothing to `timer` (ms) and draw
    pub fn render_frame(&mut self, timer: f64) -> FrameSnapshot {
        self.render.cancel_frame();
        let now = self.clock.now_ms();
        if self.input.poll_touch_start(now) {
            debug!("Touch press became a drag");
        }

        let (flip, mut ctx) = self.split();
        match ctx.render.advance(timer) {
            Some(Playback::Frame(pos)) => flip.do_(&mut ctx, pos),
            Some(Playback::Finished(completion)) => flip.on_animation_end(&mut ctx, completion),
            None => {
                flip.step_hover(&mut ctx);
            }
        }

        let scene = self.flip.scene();
        let frame = self.render.draw_frame(&mut self.pages, &scene);

        if self.render.has_animation() || self.flip.hover_pending() || self.input.has_pending_touch() {
            self.render.request_frame();
        }
        self.last_frame = Some(frame.clone());
        frame
    }

    /// [`Book::render_frame`] at the clock's current time
    pub fn tick(&mut self) -> FrameSnapshot {
        let now = self.clock.now_ms();
        self.render_frame(now)
    }

    pub fn frame_pending(&self) -> bool {
        self.render.frame_pending()
    }

    /// Ask the scheduler for another frame even when nothing in the book moves
    pub fn request_frame(&mut self) {
        self.render.request_frame();
    }

    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.last_frame.as_ref()
    }

    // ── Input ──

    /// Returns whether the host should suppress its default action
    pub fn mouse_down(&mut self, pos: Point, target: PointerTarget) -> bool {
        self.input.mouse_down(self.render.settings(), pos, target)
    }

    pub fn mouse_move(&mut self, pos: Point) {
        if let Some(gesture) = self.input.mouse_move(self.render.settings(), pos) {
            self.dispatch(gesture);
        }
    }

    pub fn mouse_up(&mut self, pos: Point) {
        if let Some(gesture) = self.input.mouse_up(self.render.settings(), pos) {
            self.dispatch(gesture);
        }
    }

    /// Returns whether the host should suppress its default action
    pub fn touch_start(&mut self, pos: Point, target: PointerTarget) -> bool {
        let now = self.clock.now_ms();
        let prevent = self.input.touch_start(self.render.settings(), pos, target, now);
        if self.input.has_pending_touch() {
            self.render.request_frame();
        }
        prevent
    }

    /// Returns whether the host should suppress scrolling
    pub fn touch_move(&mut self, pos: Point) -> bool {
        let state = self.flip.state();
        let (gesture, prevent) = self.input.touch_move(self.render.settings(), pos, state);
        if let Some(gesture) = gesture {
            self.dispatch(gesture);
        }
        prevent
    }

    pub fn touch_end(&mut self, pos: Point) {
        let now = self.clock.now_ms();
        let rect = self.render.rect();
        let gestures = self
            .input
            .touch_end(self.render.settings(), pos, rect.top, rect.height, now);
        for gesture in gestures {
            self.dispatch(gesture);
        }
    }

    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::ArrowRight | Key::PageDown => self.flip_next(FlipCorner::Top),
            Key::ArrowLeft | Key::PageUp => self.flip_prev(FlipCorner::Top),
            Key::Home => self.turn_to_page(0),
            Key::End => self.turn_to_page(self.pages.page_count().saturating_sub(1)),
        }
    }

    fn allow_trigger(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.input.allow_trigger(now)
    }

    fn dispatch(&mut self, gesture: Gesture) {
        let discrete = matches!(
            gesture,
            Gesture::Click(_) | Gesture::FlipNext(_) | Gesture::FlipPrev(_)
        );
        if discrete && !self.allow_trigger() {
            return;
        }

        let (flip, mut ctx) = self.split();
        match gesture {
            Gesture::ShowCorner(pos) => flip.show_corner(&mut ctx, pos),
            Gesture::Fold(pos) => flip.fold(&mut ctx, pos),
            Gesture::Click(pos) => flip.flip(&mut ctx, pos),
            Gesture::StopMove => flip.stop_move(&mut ctx),
            Gesture::FlipNext(corner) => flip.flip_next(&mut ctx, corner),
            Gesture::FlipPrev(corner) => flip.flip_prev(&mut ctx, corner),
        }
    }

    // ── Commands ──

    /// Animate a turn to the next spread
    pub fn flip_next(&mut self, corner: FlipCorner) {
        self.dispatch(Gesture::FlipNext(corner));
    }

    /// Animate a turn to the previous spread
    pub fn flip_prev(&mut self, corner: FlipCorner) {
        self.dispatch(Gesture::FlipPrev(corner));
    }

    /// Animate a turn to the spread holding `page`
    pub fn flip(&mut self, page: usize, corner: FlipCorner) {
        if !self.allow_trigger() {
            return;
        }
        let (flip, mut ctx) = self.split();
        flip.flip_to_page(&mut ctx, page, corner);
    }

    /// Jump to `page` without animating
    pub fn turn_to_page(&mut self, page: usize) {
        if page >= self.pages.page_count() {
            debug!("turn_to_page({}) outside {} pages", page, self.pages.page_count());
            return;
        }
        let (flip, mut ctx) = self.split();
        flip.cancel(&mut ctx);
        ctx.show(Some(page));
    }

    pub fn turn_to_next_page(&mut self) {
        let (flip, mut ctx) = self.split();
        flip.cancel(&mut ctx);
        ctx.show_next();
    }

    pub fn turn_to_prev_page(&mut self) {
        let (flip, mut ctx) = self.split();
        flip.cancel(&mut ctx);
        ctx.show_prev();
    }

    // ── Events ──

    pub fn on(&mut self, kind: BookEventKind, callback: impl FnMut(&BookEvent) + 'static) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn on_any(&mut self, callback: impl FnMut(&BookEvent) + 'static) -> ListenerId {
        self.events.on_any(callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    // ── Queries ──

    pub fn current_page_index(&self) -> usize {
        self.pages.current_page_index()
    }

    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    pub fn orientation(&self) -> Orientation {
        self.render.orientation()
    }

    pub fn state(&self) -> FlippingState {
        self.flip.state()
    }

    /// Effective book rect, including the single-page centering shift
    pub fn bounds_rect(&self) -> PageRect {
        self.render.rect()
    }

    pub fn settings(&self) -> &Settings {
        self.render.settings()
    }

    /// Snapshot page `index` was last drawn with
    pub fn page_snapshot(&self, index: usize) -> Option<&PageSnapshot> {
        self.pages.page(index).ok()?.last_snapshot()
    }

    pub fn pages(&self) -> &PageCollection {
        &self.pages
    }
}
