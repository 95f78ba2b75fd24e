//! Viewport geometry, animation playback and per-frame drawing.

use tracing::trace;

use crate::animation::{Animation, FrameScheduler, Playback};
use crate::flip::{FlipDirection, FlipScene, FlippingState};
use crate::geometry::{PageRect, Point, RectPoints};
use crate::page::{DrawContext, PageCollection, PageDensity, PageHandle, PageOrientation, PageSnapshot};
use crate::settings::{Settings, SizeType};

/// One page (portrait) or two-page spreads (landscape)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Shadow cast by the flipping page, page-local
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub pos: Point,
    pub angle: f64,
    pub width: f64,
    pub opacity: f64,
    pub direction: FlipDirection,
    pub progress: f64,
}

/// Shadow in global coordinates, as drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrame {
    pub origin: Point,
    pub angle: f64,
    pub width: f64,
    pub opacity: f64,
    pub direction: FlipDirection,
    pub progress: f64,
    /// Visible page the flipping page lands on
    pub receiver: Option<usize>,
}

/// Role a page played in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRole {
    Left,
    Right,
    Bottom,
    Lifting,
    Flipping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnPage {
    pub handle: PageHandle,
    pub role: DrawRole,
    pub snapshot: PageSnapshot,
}

/// Everything drawn in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub index: u64,
    pub timer: f64,
    pub rect: PageRect,
    pub orientation: Orientation,
    pub state: FlippingState,
    /// Rotated flipping page rect, global
    pub fold_rect: Option<RectPoints>,
    pub shadow: Option<ShadowFrame>,
    /// Pages in draw order
    pub pages: Vec<DrawnPage>,
}

impl FrameSnapshot {
    pub fn page(&self, role: DrawRole) -> Option<&DrawnPage> {
        self.pages.iter().find(|p| p.role == role)
    }
}

const Z_FLAT: i32 = 1;
const Z_BOTTOM: i32 = 2;
const Z_FLIPPING: i32 = 3;
const Z_LIFTING: i32 = 4;
const Z_HARD: i32 = 5;

/// Bounds rect and orientation for a block of `block_width`×`block_height`
pub fn calculate_bounds(settings: &Settings, block_width: f64, block_height: f64) -> (PageRect, Orientation) {
    let mut orientation = Orientation::Landscape;
    let middle = Point::new(block_width / 2.0, block_height / 2.0);
    let ratio = settings.aspect_ratio();

    let mut page_width = settings.width;
    let mut page_height = settings.height;
    let mut left = middle.x - page_width;

    match settings.size {
        SizeType::Stretch => {
            if block_width < settings.min_width * 2.0 && settings.use_portrait {
                orientation = Orientation::Portrait;
            }

            page_width = match orientation {
                Orientation::Portrait => block_width,
                Orientation::Landscape => block_width / 2.0,
            };
            if page_width > settings.max_width {
                page_width = settings.max_width;
            }

            page_height = page_width / ratio;
            if page_height > block_height {
                page_height = block_height;
                page_width = page_height * ratio;
            }

            left = match orientation {
                Orientation::Portrait => middle.x - page_width / 2.0 - page_width,
                Orientation::Landscape => middle.x - page_width,
            };
        }
        SizeType::Fixed => {
            if block_width < page_width * 2.0 && settings.use_portrait {
                orientation = Orientation::Portrait;
                left = middle.x - page_width / 2.0 - page_width;
            }
        }
    }

    let rect = PageRect {
        left,
        top: middle.y - page_height / 2.0,
        width: page_width * 2.0,
        height: page_height,
        page_width,
    };
    (rect, orientation)
}

#[derive(Debug)]
pub struct Render {
    settings: Settings,
    scheduler: Box<dyn FrameScheduler>,
    block_width: f64,
    block_height: f64,
    bounds: PageRect,
    orientation: Orientation,
    /// Horizontal shift that centers a lone landscape page
    offset: f64,
    direction: FlipDirection,
    animation: Option<Animation>,
    shadow: Option<Shadow>,
    page_rect: Option<RectPoints>,
    timer: f64,
    frame_index: u64,
}

impl Render {
    pub fn new(
        settings: Settings,
        scheduler: Box<dyn FrameScheduler>,
        block_width: f64,
        block_height: f64,
    ) -> Self {
        let (bounds, orientation) = calculate_bounds(&settings, block_width, block_height);
        Self {
            settings,
            scheduler,
            block_width,
            block_height,
            bounds,
            orientation,
            offset: 0.0,
            direction: FlipDirection::Forward,
            animation: None,
            shadow: None,
            page_rect: None,
            timer: 0.0,
            frame_index: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Recompute the bounds for a new block size.
    /// Returns the new orientation when it changed.
    pub fn update(&mut self, block_width: f64, block_height: f64) -> Option<Orientation> {
        self.block_width = block_width;
        self.block_height = block_height;
        let (bounds, orientation) = calculate_bounds(&self.settings, block_width, block_height);
        self.bounds = bounds;
        self.request_frame();

        if orientation != self.orientation {
            self.orientation = orientation;
            return Some(orientation);
        }
        None
    }

    pub fn block_size(&self) -> (f64, f64) {
        (self.block_width, self.block_height)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Bounds without the single-page centering shift
    pub fn bounds_rect(&self) -> PageRect {
        self.bounds
    }

    /// Effective bounds used for drawing and hit testing
    pub fn rect(&self) -> PageRect {
        self.bounds.shifted(self.offset)
    }

    pub fn center_single_page(&mut self, side: Option<PageOrientation>) {
        let half = self.bounds.page_width / 2.0;
        self.offset = match (self.orientation, side) {
            (Orientation::Landscape, Some(PageOrientation::Right)) => -half,
            (Orientation::Landscape, Some(PageOrientation::Left)) => half,
            _ => 0.0,
        };
    }

    pub fn direction(&self) -> FlipDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: FlipDirection) {
        self.direction = direction;
    }

    // ── Coordinates ──

    pub fn to_book(&self, pos: Point) -> Point {
        self.rect().to_book(pos)
    }

    /// Global → page-local for the current flip direction
    pub fn to_page(&self, pos: Point) -> Point {
        self.rect().to_page(pos, self.direction)
    }

    pub fn to_global(&self, pos: Point) -> Point {
        self.rect().to_global(pos, self.direction)
    }

    // ── Frame loop ──

    pub fn request_frame(&mut self) {
        self.scheduler.schedule_frame();
    }

    pub fn frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn cancel_frame(&mut self) {
        self.scheduler.cancel();
    }

    pub fn timer(&self) -> f64 {
        self.timer
    }

    pub fn has_animation(&self) -> bool {
        self.animation.is_some()
    }

    /// Replace the running animation. Callers finish the previous one first.
    pub fn start_animation(&mut self, animation: Animation) {
        self.animation = Some(animation);
        self.request_frame();
    }

    /// Detach the running animation so its owner can complete it
    pub fn take_animation(&mut self) -> Option<Animation> {
        self.animation.take()
    }

    /// Sample the running animation at `timer`
    pub fn advance(&mut self, timer: f64) -> Option<Playback> {
        self.timer = timer;
        let playback = self.animation.as_mut()?.sample(timer);
        if let Playback::Finished(_) = playback {
            self.animation = None;
        }
        Some(playback)
    }

    // ── Flip visuals ──

    pub fn set_page_rect(&mut self, rect: RectPoints) {
        self.page_rect = Some(rect);
    }

    pub fn clear_page_rect(&mut self) {
        self.page_rect = None;
    }

    pub fn set_shadow_data(&mut self, pos: Point, angle: f64, progress: f64, direction: FlipDirection) {
        if !self.settings.draw_shadow {
            return;
        }
        self.shadow = Some(Shadow {
            pos,
            angle,
            width: self.rect().page_width * 3.0 / 4.0 * progress / 100.0,
            opacity: (100.0 - progress) * self.settings.max_shadow_opacity / 100.0,
            direction,
            progress,
        });
    }

    pub fn clear_shadow(&mut self) {
        self.shadow = None;
    }

    pub fn shadow(&self) -> Option<&Shadow> {
        self.shadow.as_ref()
    }

    /// Draw every page in play and describe the frame.
    ///
    /// Order: left (landscape only), right, bottom, flipping. Pages that are
    /// not drawn this frame are hidden.
    pub fn draw_frame(&mut self, pages: &mut PageCollection, scene: &FlipScene) -> FrameSnapshot {
        self.frame_index += 1;
        let rect = self.rect();
        let direction = self.direction;
        let base = self.settings.start_z_index;
        let landscape = self.orientation == Orientation::Landscape;

        let (left, right) = pages.visible_pages();
        let left = left.filter(|_| landscape);
        let flipping_page = match scene.flipping {
            Some(PageHandle::Page(i)) => Some(i),
            _ => None,
        };
        let bottom = scene.bottom.filter(|b| Some(*b) != scene.flipping);
        let hard_flip = scene
            .flipping
            .and_then(|h| pages.get(h))
            .is_some_and(|p| p.drawing_density() == PageDensity::Hard);
        let lifting = scene.lifting.filter(|_| hard_flip && landscape);

        let drawn = [left, right, flipping_page, bottom.map(|b| b.index())];
        for (i, page) in pages.pages_mut().iter_mut().enumerate() {
            if !drawn.contains(&Some(i)) {
                page.hide();
            }
            if scene.flipping != Some(PageHandle::Copy(i)) {
                page.hide_temporary_copy();
            }
        }

        let ctx = |z: i32| DrawContext {
            rect,
            direction,
            z_index: base + z,
        };
        let mut out = Vec::new();
        let mut record = |handle: PageHandle, role: DrawRole, pages: &PageCollection| {
            if let Some(snapshot) = pages.get(handle).and_then(|p| p.last_snapshot()) {
                out.push(DrawnPage {
                    handle,
                    role,
                    snapshot: snapshot.clone(),
                });
            }
        };

        let slots = [(left, PageOrientation::Left, DrawRole::Left), (right, PageOrientation::Right, DrawRole::Right)];
        for (slot, side, role) in slots {
            let Some(i) = slot else { continue };
            let Ok(page) = pages.page_mut(i) else { continue };
            if lifting == Some(i) {
                page.set_orientation(side);
                page.draw(&ctx(Z_LIFTING), Some(PageDensity::Hard));
                record(PageHandle::Page(i), DrawRole::Lifting, pages);
            } else {
                page.simple_draw(&ctx(Z_FLAT), side);
                record(PageHandle::Page(i), role, pages);
            }
        }

        if let Some(handle) = bottom {
            if let Some(page) = pages.get_mut(handle) {
                page.draw(&ctx(Z_BOTTOM), hard_flip.then_some(PageDensity::Hard));
                record(handle, DrawRole::Bottom, pages);
            }
        }

        if let Some(handle) = scene.flipping {
            if let Some(page) = pages.get_mut(handle) {
                let z = if hard_flip { Z_HARD } else { Z_FLIPPING };
                page.draw(&ctx(z), None);
                record(handle, DrawRole::Flipping, pages);
            }
        }

        let shadow = self.shadow.map(|s| ShadowFrame {
            origin: rect.to_global(s.pos, s.direction),
            angle: s.angle,
            width: s.width,
            opacity: s.opacity,
            direction: s.direction,
            progress: s.progress,
            receiver: pages.flipping_cover_page(s.direction).map(|h| h.index()),
        });

        trace!("Frame {} drew {} pages", self.frame_index, out.len());
        FrameSnapshot {
            index: self.frame_index,
            timer: self.timer,
            rect,
            orientation: self.orientation,
            state: scene.state,
            fold_rect: self.page_rect.map(|r| rect.rect_to_global(&r, direction)),
            shadow,
            pages: out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Completion, ManualScheduler};
    use crate::page::testing::RecordingSurface;
    use crate::page::PageSource;
    use crate::settings::FlipSetting;
    use pretty_assertions::assert_eq;

    fn settings(tweak: impl FnOnce(&mut FlipSetting)) -> Settings {
        let mut raw = FlipSetting::with_size(400.0, 300.0);
        tweak(&mut raw);
        raw.validate().unwrap()
    }

    #[test]
    fn test_fixed_landscape_bounds() {
        let (rect, orientation) = calculate_bounds(&settings(|_| {}), 1000.0, 500.0);
        assert_eq!(orientation, Orientation::Landscape);
        assert_eq!(
            rect,
            PageRect {
                left: 100.0,
                top: 100.0,
                width: 800.0,
                height: 300.0,
                page_width: 400.0,
            }
        );
    }

    #[test]
    fn test_fixed_portrait_shifts_left_by_a_page() {
        let (rect, orientation) = calculate_bounds(&settings(|_| {}), 600.0, 300.0);
        assert_eq!(orientation, Orientation::Portrait);
        assert_eq!(rect.left, 300.0 - 200.0 - 400.0);
        assert_eq!(rect.width, 800.0);
    }

    #[test]
    fn test_fixed_without_portrait_stays_landscape() {
        let (_, orientation) = calculate_bounds(&settings(|s| s.use_portrait = false), 600.0, 300.0);
        assert_eq!(orientation, Orientation::Landscape);
    }

    #[test]
    fn test_stretch_caps_width_and_refits_height() {
        let s = settings(|s| {
            s.size = "stretch".into();
            s.min_width = 200.0;
            s.max_width = 500.0;
            s.min_height = 150.0;
            s.max_height = 400.0;
        });
        let (rect, orientation) = calculate_bounds(&s, 1200.0, 300.0);
        assert_eq!(orientation, Orientation::Landscape);
        // 600 wide pages capped to 500, 375 tall refit to the 300px block
        assert_eq!(rect.height, 300.0);
        assert!((rect.page_width - 400.0).abs() < 1e-9);

        let (rect, orientation) = calculate_bounds(&s, 300.0, 1000.0);
        assert_eq!(orientation, Orientation::Portrait);
        assert_eq!(rect.page_width, 300.0);
        assert!((rect.height - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_reports_orientation_change() {
        let mut render = Render::new(settings(|_| {}), Box::new(ManualScheduler::new()), 1000.0, 500.0);
        assert_eq!(render.update(900.0, 500.0), None);
        assert_eq!(render.update(500.0, 500.0), Some(Orientation::Portrait));
        assert_eq!(render.orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_centering_offset() {
        let mut render = Render::new(settings(|_| {}), Box::new(ManualScheduler::new()), 800.0, 300.0);
        render.center_single_page(Some(PageOrientation::Right));
        assert_eq!(render.rect().left, -200.0);
        assert_eq!(render.bounds_rect().left, 0.0);
        render.center_single_page(None);
        assert_eq!(render.rect().left, 0.0);
    }

    #[test]
    fn test_shadow_data() {
        let mut render = Render::new(
            settings(|s| s.max_shadow_opacity = 0.5),
            Box::new(ManualScheduler::new()),
            800.0,
            300.0,
        );
        render.set_shadow_data(Point::new(10.0, 0.0), 0.3, 40.0, FlipDirection::Forward);
        let shadow = render.shadow().unwrap();
        assert_eq!(shadow.width, 120.0);
        assert_eq!(shadow.opacity, 0.3);

        let mut render = Render::new(
            settings(|s| s.draw_shadow = false),
            Box::new(ManualScheduler::new()),
            800.0,
            300.0,
        );
        render.set_shadow_data(Point::new(10.0, 0.0), 0.3, 40.0, FlipDirection::Forward);
        assert!(render.shadow().is_none());
    }

    #[test]
    fn test_advance_drops_finished_animation() {
        let scheduler = ManualScheduler::new();
        let mut render = Render::new(settings(|_| {}), Box::new(scheduler.clone()), 800.0, 300.0);
        let done = Completion {
            turned: false,
            reset: true,
        };
        render.start_animation(Animation::new(vec![Point::new(1.0, 1.0)], 10.0, done));
        assert!(scheduler.is_pending());

        assert_eq!(render.advance(100.0), Some(Playback::Frame(Point::new(1.0, 1.0))));
        assert_eq!(render.advance(120.0), Some(Playback::Finished(done)));
        assert!(!render.has_animation());
        assert_eq!(render.advance(130.0), None);
    }

    #[test]
    fn test_draw_frame_hides_pages_off_the_spread() {
        let mut render = Render::new(settings(|_| {}), Box::new(ManualScheduler::new()), 800.0, 300.0);
        let logs: Vec<_> = (0..4).map(|_| RecordingSurface::default()).collect();
        let sources = logs
            .iter()
            .map(|s| PageSource::soft(Box::new(s.clone())))
            .collect();
        let mut pages = PageCollection::new(sources, false, render.orientation());

        pages.show(Some(2));
        let frame = render.draw_frame(&mut pages, &FlipScene::default());
        let roles: Vec<_> = frame.pages.iter().map(|p| (p.handle, p.role)).collect();
        assert_eq!(
            roles,
            vec![
                (PageHandle::Page(2), DrawRole::Left),
                (PageHandle::Page(3), DrawRole::Right),
            ]
        );
        assert!(frame.pages.iter().all(|p| p.snapshot.z_index == 1));

        pages.show(Some(0));
        render.draw_frame(&mut pages, &FlipScene::default());
        assert_eq!(logs[2].log.borrow().hides, 1);
        assert_eq!(logs[0].log.borrow().draws.len(), 1);
    }
}
