//! A single flippable page and the surface it draws through.
//!
//! The controller only mutates [`PageState`]; at draw time the page turns its
//! state into an immutable [`PageSnapshot`] and hands that to its
//! [`PageSurface`], which is the only backend-specific piece.

pub mod collection;

use std::fmt;

use tracing::warn;

use crate::error::RenderError;
use crate::flip::FlipDirection;
use crate::geometry::{rotated_point, PageRect, Point};

pub use collection::{PageCollection, PageHandle, PageSource};

/// Whether a page bends or rotates rigidly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageDensity {
    #[default]
    Soft,
    Hard,
}

/// Which side of the spine a page is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageOrientation {
    Left,
    #[default]
    Right,
}

/// Mutable visual state written by the flip controller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageState {
    /// Anchor of the page in page-local coordinates
    pub position: Point,
    /// Visible polygon in page-local coordinates; `None` is the full page
    pub area: Option<Vec<Point>>,
    /// Soft fold rotation, radians
    pub angle: f64,
    /// Hard page rotation around the spine, degrees
    pub hard_angle: f64,
    /// Angle actually used to draw a hard page, degrees
    pub hard_drawing_angle: f64,
    /// Bumped on every mutation
    pub version: u64,
}

/// How a page is laid out for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Untransformed page at its spread slot
    Flat { origin: Point },
    /// Translated to `origin`, rotated by `angle` radians, clipped by `clip`
    /// (element-local coordinates)
    Soft {
        origin: Point,
        angle: f64,
        clip: Option<Vec<Point>>,
    },
    /// Rotated `angle_deg` around the vertical axis at `pivot_x`
    /// (element-local), backface hidden
    Hard {
        origin: Point,
        pivot_x: f64,
        angle_deg: f64,
    },
}

/// Immutable per-frame view of a page handed to its surface
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub version: u64,
    pub density: PageDensity,
    pub orientation: PageOrientation,
    pub z_index: i32,
    pub width: f64,
    pub height: f64,
    pub placement: Placement,
}

impl PageSnapshot {
    /// Visible outline of the page in global coordinates.
    ///
    /// Empty when a hard page faces away from the viewer.
    pub fn outline(&self) -> Vec<Point> {
        let (w, h) = (self.width, self.height);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];

        match &self.placement {
            Placement::Flat { origin } => corners
                .iter()
                .map(|c| Point::new(origin.x + c.x, origin.y + c.y))
                .collect(),
            Placement::Soft {
                origin,
                angle,
                clip,
            } => {
                let (sin, cos) = angle.sin_cos();
                let local: &[Point] = clip.as_deref().unwrap_or(&corners);
                local
                    .iter()
                    .map(|p| {
                        Point::new(
                            origin.x + p.x * cos - p.y * sin,
                            origin.y + p.x * sin + p.y * cos,
                        )
                    })
                    .collect()
            }
            Placement::Hard {
                origin,
                pivot_x,
                angle_deg,
            } => {
                let cos = angle_deg.to_radians().cos();
                if cos <= 1e-6 {
                    return Vec::new();
                }
                corners
                    .iter()
                    .map(|c| Point::new(origin.x + pivot_x + (c.x - pivot_x) * cos, origin.y + c.y))
                    .collect()
            }
        }
    }

    /// Whether the page is drawn as its full, untransformed rectangle
    pub fn is_full_page(&self) -> bool {
        matches!(self.placement, Placement::Flat { .. })
    }
}

/// Frame-wide data a page needs to lay itself out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    /// Effective bounds rect (centering applied)
    pub rect: PageRect,
    /// Direction of the flip in progress, forward when idle
    pub direction: FlipDirection,
    pub z_index: i32,
}

/// Rendering backend for one page
pub trait PageSurface: fmt::Debug {
    /// Present the page for this frame
    fn draw(&mut self, snapshot: &PageSnapshot) -> Result<(), RenderError>;

    /// Stop presenting the page
    fn hide(&mut self);

    /// A second surface showing the same content, used as the mirrored back
    /// side while a page is flipped in portrait mode
    fn duplicate(&self) -> Result<Box<dyn PageSurface>, RenderError>;
}

/// One flippable page
#[derive(Debug)]
pub struct Page {
    density: PageDensity,
    drawing_density: PageDensity,
    orientation: PageOrientation,
    state: PageState,
    surface: Box<dyn PageSurface>,
    temporary_copy: Option<Box<Page>>,
    visible: bool,
    last_snapshot: Option<PageSnapshot>,
}

impl Page {
    pub fn new(surface: Box<dyn PageSurface>, density: PageDensity) -> Self {
        Self {
            density,
            drawing_density: density,
            orientation: PageOrientation::Right,
            state: PageState::default(),
            surface,
            temporary_copy: None,
            visible: false,
            last_snapshot: None,
        }
    }

    pub fn density(&self) -> PageDensity {
        self.density
    }

    pub(crate) fn set_density(&mut self, density: PageDensity) {
        self.density = density;
        self.drawing_density = density;
    }

    pub fn drawing_density(&self) -> PageDensity {
        self.drawing_density
    }

    pub fn set_drawing_density(&mut self, density: PageDensity) {
        self.drawing_density = density;
    }

    /// Back to the construction density
    pub fn restore_drawing_density(&mut self) {
        self.drawing_density = self.density;
    }

    pub fn orientation(&self) -> PageOrientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: PageOrientation) {
        self.orientation = orientation;
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    fn touch(&mut self) {
        self.state.version = self.state.version.wrapping_add(1);
    }

    pub fn set_area(&mut self, area: Vec<Point>) {
        self.state.area = Some(area);
        self.touch();
    }

    pub fn set_position(&mut self, position: Point) {
        self.state.position = position;
        self.touch();
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.state.angle = angle;
        self.touch();
    }

    /// Rigid rotation in degrees; also resets the drawing angle
    pub fn set_hard_angle(&mut self, angle: f64) {
        self.state.hard_angle = angle;
        self.state.hard_drawing_angle = angle;
        self.touch();
    }

    pub fn set_hard_drawing_angle(&mut self, angle: f64) {
        self.state.hard_drawing_angle = angle;
        self.touch();
    }

    /// Drop any fold: full rectangle, no rotation
    pub fn reset_state(&mut self) {
        self.state.area = None;
        self.state.angle = 0.0;
        self.state.hard_angle = 0.0;
        self.state.hard_drawing_angle = 0.0;
        self.touch();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Snapshot handed to the surface on the most recent draw
    pub fn last_snapshot(&self) -> Option<&PageSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Swap in a new surface, keeping the visual state
    pub(crate) fn replace_surface(&mut self, surface: Box<dyn PageSurface>) {
        self.hide_temporary_copy();
        if self.visible {
            self.surface.hide();
            self.visible = false;
        }
        self.surface = surface;
    }

    /// Build the snapshot for a folded or rotated page
    pub fn snapshot(&self, ctx: &DrawContext, density: Option<PageDensity>) -> PageSnapshot {
        let density = density.unwrap_or(self.drawing_density);
        let rect = ctx.rect;

        let placement = match density {
            PageDensity::Hard => {
                let spine = rect.spine_x();
                match self.orientation {
                    PageOrientation::Left => Placement::Hard {
                        origin: Point::new(spine - rect.page_width, rect.top),
                        pivot_x: rect.page_width,
                        angle_deg: self.state.hard_drawing_angle,
                    },
                    PageOrientation::Right => Placement::Hard {
                        origin: Point::new(spine, rect.top),
                        pivot_x: 0.0,
                        angle_deg: self.state.hard_drawing_angle,
                    },
                }
            }
            PageDensity::Soft => {
                let position = self.state.position;
                let clip = self.state.area.as_ref().map(|area| {
                    area.iter()
                        .map(|p| {
                            let local = match ctx.direction {
                                FlipDirection::Back => {
                                    Point::new(-p.x + position.x, p.y - position.y)
                                }
                                FlipDirection::Forward => {
                                    Point::new(p.x - position.x, p.y - position.y)
                                }
                            };
                            rotated_point(local, Point::default(), self.state.angle)
                        })
                        .collect()
                });
                Placement::Soft {
                    origin: rect.to_global(position, ctx.direction),
                    angle: self.state.angle,
                    clip,
                }
            }
        };

        PageSnapshot {
            version: self.state.version,
            density,
            orientation: self.orientation,
            z_index: ctx.z_index,
            width: rect.page_width,
            height: rect.height,
            placement,
        }
    }

    /// Snapshot for an unfolded page sitting in its spread slot
    pub fn simple_snapshot(&self, ctx: &DrawContext, orientation: PageOrientation) -> PageSnapshot {
        let rect = ctx.rect;
        let x = match orientation {
            PageOrientation::Left => rect.left,
            PageOrientation::Right => rect.left + rect.page_width,
        };
        PageSnapshot {
            version: self.state.version,
            density: self.drawing_density,
            orientation,
            z_index: ctx.z_index,
            width: rect.page_width,
            height: rect.height,
            placement: Placement::Flat {
                origin: Point::new(x, rect.top),
            },
        }
    }

    /// Draw folded/rotated from the current state
    pub fn draw(&mut self, ctx: &DrawContext, density: Option<PageDensity>) {
        let snapshot = self.snapshot(ctx, density);
        self.present(snapshot);
    }

    /// Draw flat at its spread slot
    pub fn simple_draw(&mut self, ctx: &DrawContext, orientation: PageOrientation) {
        self.orientation = orientation;
        let snapshot = self.simple_snapshot(ctx, orientation);
        self.present(snapshot);
    }

    fn present(&mut self, snapshot: PageSnapshot) {
        match self.surface.draw(&snapshot) {
            Ok(()) => self.visible = true,
            Err(e) => warn!("Skipping page this frame: {}", e),
        }
        self.last_snapshot = Some(snapshot);
    }

    pub fn hide(&mut self) {
        if self.visible {
            self.surface.hide();
            self.visible = false;
        }
    }

    /// Mirrored stand-in used while this page flips in portrait.
    ///
    /// A page drawn hard flips itself, so `Ok(false)` means "use the page";
    /// `Ok(true)` means the copy exists and should be used.
    pub fn new_temporary_copy(&mut self) -> Result<bool, RenderError> {
        if self.drawing_density == PageDensity::Hard {
            return Ok(false);
        }
        if self.temporary_copy.is_none() {
            let surface = self.surface.duplicate()?;
            let mut copy = Page::new(surface, self.density);
            copy.orientation = self.orientation;
            self.temporary_copy = Some(Box::new(copy));
        }
        Ok(true)
    }

    pub fn temporary_copy(&self) -> Option<&Page> {
        self.temporary_copy.as_deref()
    }

    pub fn temporary_copy_mut(&mut self) -> Option<&mut Page> {
        self.temporary_copy.as_deref_mut()
    }

    /// Release the temporary copy created for a flip
    pub fn hide_temporary_copy(&mut self) {
        if let Some(mut copy) = self.temporary_copy.take() {
            copy.hide();
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// What a recording surface saw
    #[derive(Debug, Default)]
    pub struct SurfaceLog {
        pub draws: Vec<PageSnapshot>,
        pub hides: usize,
        pub duplicates: usize,
    }

    /// Surface that records draws into a shared log
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSurface {
        pub log: Rc<RefCell<SurfaceLog>>,
        pub fail_duplicate: bool,
    }

    impl PageSurface for RecordingSurface {
        fn draw(&mut self, snapshot: &PageSnapshot) -> Result<(), RenderError> {
            self.log.borrow_mut().draws.push(snapshot.clone());
            Ok(())
        }

        fn hide(&mut self) {
            self.log.borrow_mut().hides += 1;
        }

        fn duplicate(&self) -> Result<Box<dyn PageSurface>, RenderError> {
            if self.fail_duplicate {
                return Err(RenderError::SurfaceUnavailable("no clone".into()));
            }
            self.log.borrow_mut().duplicates += 1;
            Ok(Box::new(RecordingSurface::default()))
        }
    }

    pub fn page(density: PageDensity) -> Page {
        Page::new(Box::new(RecordingSurface::default()), density)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(direction: FlipDirection) -> DrawContext {
        DrawContext {
            rect: PageRect {
                left: 100.0,
                top: 10.0,
                width: 800.0,
                height: 500.0,
                page_width: 400.0,
            },
            direction,
            z_index: 3,
        }
    }

    #[test]
    fn test_mutations_bump_version() {
        let mut p = page(PageDensity::Soft);
        let v0 = p.state().version;
        p.set_angle(0.5);
        p.set_position(Point::new(1.0, 2.0));
        p.set_hard_angle(45.0);
        assert_eq!(p.state().version, v0 + 3);
        assert_eq!(p.state().hard_drawing_angle, 45.0);
    }

    #[test]
    fn test_simple_snapshot_slots() {
        let p = page(PageDensity::Soft);
        let left = p.simple_snapshot(&ctx(FlipDirection::Forward), PageOrientation::Left);
        let right = p.simple_snapshot(&ctx(FlipDirection::Forward), PageOrientation::Right);
        assert_eq!(left.placement, Placement::Flat { origin: Point::new(100.0, 10.0) });
        assert_eq!(right.placement, Placement::Flat { origin: Point::new(500.0, 10.0) });
        assert_eq!(right.outline()[2], Point::new(900.0, 510.0));
    }

    #[test]
    fn test_soft_outline_matches_global_area() {
        let mut p = page(PageDensity::Soft);
        let area = vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0), Point::new(150.0, 500.0), Point::new(0.0, 500.0)];
        p.set_position(Point::new(120.0, 40.0));
        p.set_angle(0.3);
        p.set_area(area.clone());

        for direction in [FlipDirection::Forward, FlipDirection::Back] {
            let c = ctx(direction);
            let outline = p.snapshot(&c, None).outline();
            for (got, want) in outline.iter().zip(area.iter()) {
                let want = c.rect.to_global(*want, direction);
                assert!(got.distance_to(want) < 1e-6, "{:?} vs {:?}", got, want);
            }
        }
    }

    #[test]
    fn test_hard_page_facing_away_is_hidden() {
        let mut p = page(PageDensity::Hard);
        p.set_orientation(PageOrientation::Left);
        p.set_hard_angle(180.0);
        assert!(p.snapshot(&ctx(FlipDirection::Forward), None).outline().is_empty());

        p.set_hard_angle(0.0);
        let outline = p.snapshot(&ctx(FlipDirection::Forward), None).outline();
        assert_eq!(outline[0], Point::new(100.0, 10.0));
        assert_eq!(outline[1], Point::new(500.0, 10.0));
    }

    #[test]
    fn test_temporary_copy_is_lazy_and_idempotent() {
        let surface = RecordingSurface::default();
        let log = surface.log.clone();
        let mut p = Page::new(Box::new(surface), PageDensity::Soft);

        assert_eq!(p.new_temporary_copy(), Ok(true));
        assert_eq!(p.new_temporary_copy(), Ok(true));
        assert_eq!(log.borrow().duplicates, 1);

        p.hide_temporary_copy();
        assert!(p.temporary_copy().is_none());
    }

    #[test]
    fn test_hard_page_is_its_own_copy() {
        let mut p = page(PageDensity::Hard);
        assert_eq!(p.new_temporary_copy(), Ok(false));
        assert!(p.temporary_copy().is_none());
    }

    #[test]
    fn test_failed_duplicate_is_reported() {
        let surface = RecordingSurface {
            fail_duplicate: true,
            ..Default::default()
        };
        let mut p = Page::new(Box::new(surface), PageDensity::Soft);
        assert!(p.new_temporary_copy().is_err());
    }

    #[test]
    fn test_reset_state_clears_clip() {
        let mut p = page(PageDensity::Soft);
        p.set_area(vec![Point::new(0.0, 0.0)]);
        p.set_angle(1.0);
        p.reset_state();
        assert_eq!(p.state().area, None);
        assert_eq!(p.state().angle, 0.0);
    }
}
