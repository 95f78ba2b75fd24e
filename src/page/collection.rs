//! Ordered pages grouped into spreads.
//!
//! Landscape pairs consecutive pages (`[0] [1,2] [3,4] …` with a cover,
//! `[0,1] [2,3] …` without); portrait shows one page per spread. The current
//! spread index always refers to the spread list of the current orientation.

use tracing::{debug, warn};

use super::{Page, PageDensity, PageOrientation, PageSurface};
use crate::error::{FlipError, FlipResult};
use crate::flip::FlipDirection;
use crate::render::Orientation;

/// A page surface supplied by the content loader
#[derive(Debug)]
pub struct PageSource {
    pub surface: Box<dyn PageSurface>,
    pub density: PageDensity,
}

impl PageSource {
    pub fn new(surface: Box<dyn PageSurface>, density: PageDensity) -> Self {
        Self { surface, density }
    }

    pub fn soft(surface: Box<dyn PageSurface>) -> Self {
        Self::new(surface, PageDensity::Soft)
    }

    pub fn hard(surface: Box<dyn PageSurface>) -> Self {
        Self::new(surface, PageDensity::Hard)
    }
}

/// Refers to a page or to its temporary flip copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageHandle {
    Page(usize),
    Copy(usize),
}

impl PageHandle {
    /// Index of the underlying page
    pub fn index(&self) -> usize {
        match *self {
            PageHandle::Page(i) | PageHandle::Copy(i) => i,
        }
    }
}

type Spread = Vec<usize>;

#[derive(Debug)]
pub struct PageCollection {
    pages: Vec<Page>,
    landscape_spread: Vec<Spread>,
    portrait_spread: Vec<Spread>,
    current_spread_index: usize,
    current_page_index: usize,
    orientation: Orientation,
    show_cover: bool,
}

impl PageCollection {
    pub fn new(sources: Vec<PageSource>, show_cover: bool, orientation: Orientation) -> Self {
        let pages = sources
            .into_iter()
            .map(|s| Page::new(s.surface, s.density))
            .collect();
        let mut collection = Self {
            pages,
            landscape_spread: Vec::new(),
            portrait_spread: Vec::new(),
            current_spread_index: 0,
            current_page_index: 0,
            orientation,
            show_cover,
        };
        collection.create_spread();
        collection
    }

    pub fn empty(orientation: Orientation) -> Self {
        Self::new(Vec::new(), false, orientation)
    }

    fn create_spread(&mut self) {
        self.landscape_spread.clear();
        self.portrait_spread = (0..self.pages.len()).map(|i| vec![i]).collect();

        let mut start = 0;
        if self.show_cover && !self.pages.is_empty() {
            self.pages[0].set_density(PageDensity::Hard);
            self.landscape_spread.push(vec![0]);
            start = 1;
        }

        let mut i = start;
        while i < self.pages.len() {
            if i + 1 < self.pages.len() {
                self.landscape_spread.push(vec![i, i + 1]);
            } else {
                self.landscape_spread.push(vec![i]);
                self.pages[i].set_density(PageDensity::Hard);
            }
            i += 2;
        }
    }

    /// Patch pages in place with new surfaces of the same count
    pub fn patch(&mut self, sources: Vec<PageSource>) {
        debug_assert_eq!(sources.len(), self.pages.len());
        for (page, source) in self.pages.iter_mut().zip(sources) {
            page.replace_surface(source.surface);
            page.set_density(source.density);
        }
        self.create_spread();
    }

    /// Hide every surface before the collection is dropped
    pub fn destroy(&mut self) {
        for page in &mut self.pages {
            page.hide_temporary_copy();
            page.hide();
        }
        self.pages.clear();
        self.landscape_spread.clear();
        self.portrait_spread.clear();
        self.current_spread_index = 0;
        self.current_page_index = 0;
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn spreads(&self) -> &[Spread] {
        match self.orientation {
            Orientation::Landscape => &self.landscape_spread,
            Orientation::Portrait => &self.portrait_spread,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    pub fn page(&self, index: usize) -> FlipResult<&Page> {
        self.pages.get(index).ok_or(FlipError::InvalidPage(index))
    }

    pub fn page_mut(&mut self, index: usize) -> FlipResult<&mut Page> {
        self.pages.get_mut(index).ok_or(FlipError::InvalidPage(index))
    }

    pub fn get(&self, handle: PageHandle) -> Option<&Page> {
        match handle {
            PageHandle::Page(i) => self.pages.get(i),
            PageHandle::Copy(i) => self.pages.get(i).and_then(Page::temporary_copy),
        }
    }

    pub fn get_mut(&mut self, handle: PageHandle) -> Option<&mut Page> {
        match handle {
            PageHandle::Page(i) => self.pages.get_mut(i),
            PageHandle::Copy(i) => self.pages.get_mut(i).and_then(Page::temporary_copy_mut),
        }
    }

    /// Spread containing `page`
    pub fn spread_index_by_page(&self, page: usize) -> Option<usize> {
        self.spreads().iter().position(|s| s.contains(&page))
    }

    /// Lowest page number in spread `spread`
    pub fn spread_first_page(&self, spread: usize) -> Option<usize> {
        self.spreads().get(spread).and_then(|s| s.first().copied())
    }

    pub fn current_spread_index(&self) -> usize {
        self.current_spread_index
    }

    pub fn set_current_spread_index(&mut self, index: usize) -> FlipResult<()> {
        if index < self.spreads().len() {
            self.current_spread_index = index;
            Ok(())
        } else {
            Err(FlipError::InvalidPage(index))
        }
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    fn spread_at(&self, index: Option<usize>, direction: FlipDirection) -> FlipResult<&Spread> {
        index
            .and_then(|i| self.spreads().get(i))
            .ok_or_else(|| FlipError::InvalidGesture(format!("no spread to flip {:?}", direction)))
    }

    fn neighbour_spread(&self, direction: FlipDirection) -> FlipResult<&Spread> {
        let current = self.current_spread_index;
        let index = match direction {
            FlipDirection::Forward => Some(current + 1),
            FlipDirection::Back => current.checked_sub(1),
        };
        self.spread_at(index, direction)
    }

    fn existing(&self, index: Option<usize>) -> FlipResult<PageHandle> {
        match index {
            Some(i) if i < self.pages.len() => Ok(PageHandle::Page(i)),
            _ => Err(FlipError::InvalidGesture("missing page".into())),
        }
    }

    /// The page that turns over during a flip in `direction`
    pub fn flipping_page(&mut self, direction: FlipDirection) -> FlipResult<PageHandle> {
        let current = self.current_spread_index;
        match self.orientation {
            Orientation::Portrait => match direction {
                FlipDirection::Forward => {
                    let page = self.page_mut(current)?;
                    match page.new_temporary_copy() {
                        Ok(true) => Ok(PageHandle::Copy(current)),
                        Ok(false) => Ok(PageHandle::Page(current)),
                        Err(e) => {
                            warn!("Page {} unavailable for flipping: {}", current, e);
                            Err(e.into())
                        }
                    }
                }
                FlipDirection::Back => self.existing(current.checked_sub(1)),
            },
            Orientation::Landscape => {
                let spread = self.neighbour_spread(direction)?;
                let index = match (spread.len(), direction) {
                    (1, _) | (_, FlipDirection::Forward) => spread[0],
                    (_, FlipDirection::Back) => spread[1],
                };
                self.existing(Some(index))
            }
        }
    }

    /// The page revealed underneath the flipping page
    pub fn bottom_page(&self, direction: FlipDirection) -> FlipResult<PageHandle> {
        let current = self.current_spread_index;
        match self.orientation {
            Orientation::Portrait => match direction {
                FlipDirection::Forward => self.existing(Some(current + 1)),
                FlipDirection::Back => self.existing(current.checked_sub(1)),
            },
            Orientation::Landscape => {
                let spread = self.neighbour_spread(direction)?;
                let index = match (spread.len(), direction) {
                    (1, _) | (_, FlipDirection::Back) => spread[0],
                    (_, FlipDirection::Forward) => spread[1],
                };
                self.existing(Some(index))
            }
        }
    }

    /// The visible page the flipping page lands on, if any.
    ///
    /// Landscape only: the left page of the current spread when flipping
    /// forward, the right page when flipping back.
    pub fn flipping_cover_page(&self, direction: FlipDirection) -> Option<PageHandle> {
        if self.orientation == Orientation::Portrait {
            return None;
        }
        let (left, right) = self.visible_pages();
        let index = match direction {
            FlipDirection::Forward => left,
            FlipDirection::Back => right,
        };
        index.map(PageHandle::Page)
    }

    pub fn next_by(&self, handle: PageHandle) -> Option<PageHandle> {
        let next = handle.index() + 1;
        (next < self.pages.len()).then_some(PageHandle::Page(next))
    }

    pub fn prev_by(&self, handle: PageHandle) -> Option<PageHandle> {
        handle.index().checked_sub(1).map(PageHandle::Page)
    }

    /// Pages of the current spread as (left, right) slots
    pub fn visible_pages(&self) -> (Option<usize>, Option<usize>) {
        let Some(spread) = self.spreads().get(self.current_spread_index) else {
            return (None, None);
        };
        match spread.as_slice() {
            [left, right] => (Some(*left), Some(*right)),
            [single] => {
                let last = self.pages.len().saturating_sub(1);
                if self.orientation == Orientation::Landscape && *single == last && *single != 0 {
                    (Some(*single), None)
                } else {
                    (None, Some(*single))
                }
            }
            _ => (None, None),
        }
    }

    /// Side a lone landscape page sits on, used to center it
    pub fn single_page_side(&self) -> Option<PageOrientation> {
        if self.orientation != Orientation::Landscape {
            return None;
        }
        match self.visible_pages() {
            (Some(_), None) => Some(PageOrientation::Left),
            (None, Some(_)) => Some(PageOrientation::Right),
            _ => None,
        }
    }

    fn show_spread(&mut self) -> Option<usize> {
        let first = self.spread_first_page(self.current_spread_index)?;
        self.current_page_index = first;
        debug!(
            "Showing spread {} (page {})",
            self.current_spread_index, self.current_page_index
        );
        Some(first)
    }

    /// Show the spread holding `page` (the current page when `None`).
    /// Returns the new current page index.
    pub fn show(&mut self, page: Option<usize>) -> Option<usize> {
        let page = page.unwrap_or(self.current_page_index);
        if page >= self.pages.len() {
            return None;
        }
        let spread = self.spread_index_by_page(page)?;
        self.current_spread_index = spread;
        self.show_spread()
    }

    pub fn show_next(&mut self) -> Option<usize> {
        if self.current_spread_index + 1 < self.spreads().len() {
            self.current_spread_index += 1;
            return self.show_spread();
        }
        None
    }

    pub fn show_prev(&mut self) -> Option<usize> {
        if self.current_spread_index > 0 {
            self.current_spread_index -= 1;
            return self.show_spread();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::testing::RecordingSurface;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn book(count: usize, show_cover: bool, orientation: Orientation) -> PageCollection {
        let sources = (0..count)
            .map(|_| PageSource::soft(Box::new(RecordingSurface::default())))
            .collect();
        PageCollection::new(sources, show_cover, orientation)
    }

    #[test]
    fn test_landscape_spreads_with_cover() {
        let c = book(6, true, Orientation::Landscape);
        assert_eq!(c.spreads(), &[vec![0], vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(c.page(0).unwrap().density(), PageDensity::Hard);
        assert_eq!(c.page(5).unwrap().density(), PageDensity::Hard);
        assert_eq!(c.page(3).unwrap().density(), PageDensity::Soft);
    }

    #[test]
    fn test_landscape_spreads_without_cover() {
        let c = book(4, false, Orientation::Landscape);
        assert_eq!(c.spreads(), &[vec![0, 1], vec![2, 3]]);
        assert_eq!(c.spread_index_by_page(3), Some(1));
    }

    #[test]
    fn test_landscape_flipping_and_bottom_pages() {
        let mut c = book(6, true, Orientation::Landscape);
        c.show(Some(1));
        assert_eq!(c.current_spread_index(), 1);
        assert_eq!(c.flipping_page(FlipDirection::Forward), Ok(PageHandle::Page(3)));
        assert_eq!(c.bottom_page(FlipDirection::Forward), Ok(PageHandle::Page(4)));
        assert_eq!(c.flipping_page(FlipDirection::Back), Ok(PageHandle::Page(0)));
        assert_eq!(c.bottom_page(FlipDirection::Back), Ok(PageHandle::Page(0)));
        assert_eq!(c.flipping_cover_page(FlipDirection::Forward), Some(PageHandle::Page(1)));
        assert_eq!(c.flipping_cover_page(FlipDirection::Back), Some(PageHandle::Page(2)));
    }

    #[test]
    fn test_portrait_forward_uses_temporary_copy() {
        let mut c = book(3, false, Orientation::Portrait);
        assert_eq!(c.flipping_page(FlipDirection::Forward), Ok(PageHandle::Copy(0)));
        assert!(c.get(PageHandle::Copy(0)).is_some());
        assert_eq!(c.bottom_page(FlipDirection::Forward), Ok(PageHandle::Page(1)));
        assert!(c.flipping_page(FlipDirection::Back).is_err());
        assert_eq!(c.flipping_cover_page(FlipDirection::Forward), None);
    }

    #[test]
    fn test_no_spread_past_the_end() {
        let mut c = book(2, false, Orientation::Landscape);
        assert!(c.flipping_page(FlipDirection::Forward).is_err());
        assert!(c.bottom_page(FlipDirection::Back).is_err());
    }

    #[test]
    fn test_show_next_and_prev_stop_at_bounds() {
        let mut c = book(3, false, Orientation::Portrait);
        assert_eq!(c.show_prev(), None);
        assert_eq!(c.show_next(), Some(1));
        assert_eq!(c.show_next(), Some(2));
        assert_eq!(c.show_next(), None);
        assert_eq!(c.current_page_index(), 2);
    }

    #[test]
    fn test_set_current_spread_index_out_of_range() {
        let mut c = book(3, false, Orientation::Landscape);
        assert!(c.set_current_spread_index(1).is_ok());
        assert_eq!(c.set_current_spread_index(2), Err(FlipError::InvalidPage(2)));
    }

    #[test]
    fn test_visible_pages_and_single_side() {
        let mut c = book(5, true, Orientation::Landscape);
        assert_eq!(c.visible_pages(), (None, Some(0)));
        assert_eq!(c.single_page_side(), Some(PageOrientation::Right));
        c.show(Some(4));
        assert_eq!(c.spreads()[c.current_spread_index()], vec![3, 4]);
        assert_eq!(c.single_page_side(), None);

        let mut c = book(4, true, Orientation::Landscape);
        c.show(Some(3));
        assert_eq!(c.visible_pages(), (Some(3), None));
        assert_eq!(c.single_page_side(), Some(PageOrientation::Left));
    }

    #[test]
    fn test_next_prev_by() {
        let c = book(3, false, Orientation::Portrait);
        assert_eq!(c.next_by(PageHandle::Copy(1)), Some(PageHandle::Page(2)));
        assert_eq!(c.next_by(PageHandle::Page(2)), None);
        assert_eq!(c.prev_by(PageHandle::Page(0)), None);
    }

    proptest! {
        #[test]
        fn prop_page_spread_mapping_is_stable(
            count in 1usize..40,
            show_cover in any::<bool>(),
            landscape in any::<bool>(),
            seed in any::<usize>(),
        ) {
            let orientation = if landscape { Orientation::Landscape } else { Orientation::Portrait };
            let c = book(count, show_cover, orientation);
            let page = seed % count;

            let spread = c.spread_index_by_page(page).expect("every page has a spread");
            let first = c.spread_first_page(spread).expect("spread is not empty");
            prop_assert!(first <= page);
            prop_assert_eq!(c.spread_index_by_page(first), Some(spread));
            if !landscape {
                prop_assert_eq!(spread, page);
            }
        }
    }
}
