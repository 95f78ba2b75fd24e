use std::cell::RefCell;
use std::rc::Rc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use folio::animation::{FrameScheduler, SystemClock};
use folio::{Book, BookEvent, FlipCorner, FrameSnapshot, Key, Point, PointerTarget};
use ratatui::layout::Rect;
use tracing::{debug, info};

use crate::brochure::Brochure;
use crate::config::Config;
use crate::event::Event;
use crate::ui::surface::{Sheet, SheetBuffer};

/// Ticks a toast stays on screen
const TOAST_TICKS: u16 = 90;

// ── Application State ─────────────────────────────────────────────────

pub struct App {
    pub book: Book,
    pub brochure: Brochure,
    pub should_quit: bool,
    pub show_help: bool,
    pub mouse_enabled: bool,

    /// Engine pixels per terminal cell
    pub cell: (f64, f64),
    /// Terminal area the book is drawn in
    pub book_area: Rect,

    /// Sheets of the most recent frame, lowest z first
    pub scene: Vec<Sheet>,
    pub frame: Option<FrameSnapshot>,
    sheets: SheetBuffer,

    // Toast notification
    pub toast: Option<String>,
    toast_ticks: u16,
    events: Rc<RefCell<Vec<BookEvent>>>,
}

impl App {
    pub fn new(
        config: &Config,
        brochure: Brochure,
        book_area: Rect,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Result<Self> {
        let cell = config.cell_size();
        let (width, height) = pixel_size(book_area, cell);
        let mut book = Book::with_runtime(
            config.book.clone(),
            width,
            height,
            scheduler,
            Box::new(SystemClock::new()),
        )?;

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        book.on_any(move |e| sink.borrow_mut().push(e.clone()));

        let sheets = SheetBuffer::default();
        book.load(brochure.sources(&sheets));
        info!(
            "Opened \"{}\" with {} pages",
            brochure.title,
            book.page_count()
        );

        Ok(Self {
            book,
            brochure,
            should_quit: false,
            show_help: false,
            mouse_enabled: config.viewer.mouse,
            cell,
            book_area,
            scene: Vec::new(),
            frame: None,
            sheets,
            toast: None,
            toast_ticks: 0,
            events,
        })
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Tick => self.on_tick(),
            // Layout is recomputed on the next draw
            Event::Resize(w, h) => debug!("Terminal resized to {}x{}", w, h),
        }
        self.drain_events();
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => self.book.key_down(Key::ArrowRight),
            KeyCode::Left | KeyCode::Char('h') => self.book.key_down(Key::ArrowLeft),
            KeyCode::PageDown => self.book.key_down(Key::PageDown),
            KeyCode::PageUp => self.book.key_down(Key::PageUp),
            KeyCode::Home | KeyCode::Char('g') => self.book.key_down(Key::Home),
            KeyCode::End | KeyCode::Char('G') => self.book.key_down(Key::End),
            KeyCode::Char('n') => self.book.flip_next(FlipCorner::Bottom),
            KeyCode::Char('p') => self.book.flip_prev(FlipCorner::Bottom),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !self.mouse_enabled || self.show_help {
            return;
        }
        let pos = self.to_book_point(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.book.mouse_down(pos, PointerTarget::Page);
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => self.book.mouse_move(pos),
            MouseEventKind::Up(MouseButton::Left) => self.book.mouse_up(pos),
            MouseEventKind::ScrollDown => self.book.flip_next(FlipCorner::Top),
            MouseEventKind::ScrollUp => self.book.flip_prev(FlipCorner::Top),
            _ => {}
        }
    }

    /// Run a frame and pick up what the surfaces drew
    pub fn on_tick(&mut self) {
        let frame = self.book.tick();
        self.scene = self.sheets.take();
        self.frame = Some(frame);

        if self.toast_ticks > 0 {
            self.toast_ticks -= 1;
            if self.toast_ticks == 0 {
                self.toast = None;
            } else {
                // Ticks only arrive while a frame is pending
                self.book.request_frame();
            }
        }
    }

    /// Fit the book to the terminal area it is drawn in
    pub fn set_viewport(&mut self, area: Rect) {
        if area == self.book_area {
            return;
        }
        self.book_area = area;
        let (width, height) = pixel_size(area, self.cell);
        self.book.resize(width, height);
    }

    /// Center of the cell at (`column`, `row`) in book block pixels
    pub fn to_book_point(&self, column: u16, row: u16) -> Point {
        let (cw, ch) = self.cell;
        let x = (f64::from(column) - f64::from(self.book_area.x) + 0.5) * cw;
        let y = (f64::from(row) - f64::from(self.book_area.y) + 0.5) * ch;
        Point::new(x, y)
    }

    fn drain_events(&mut self) {
        let events: Vec<BookEvent> = self.events.borrow_mut().drain(..).collect();
        for event in events {
            debug!("Book event: {:?}", event);
            match event {
                BookEvent::ChangeOrientation(orientation) => {
                    self.show_toast(format!("{} layout", orientation.as_str()));
                }
                BookEvent::Update { page, .. } => {
                    self.show_toast(format!("Reloaded at page {}", page + 1));
                }
                _ => {}
            }
        }
    }

    fn show_toast(&mut self, message: String) {
        self.toast = Some(message);
        self.toast_ticks = TOAST_TICKS;
        self.book.request_frame();
    }
}

fn pixel_size(area: Rect, (cw, ch): (f64, f64)) -> (f64, f64) {
    (f64::from(area.width) * cw, f64::from(area.height) * ch)
}
