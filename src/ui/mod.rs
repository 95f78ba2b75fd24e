pub mod book_view;
pub mod help;
pub mod status_bar;
pub mod surface;
pub mod theme;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;

/// Split the terminal into header, book and status rows
pub fn layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Top-level draw function
pub fn draw(f: &mut Frame, app: &mut App) {
    let full = f.area();
    let [header, body, status] = layout(full);
    app.set_viewport(body);

    let title = Line::from(vec![
        Span::styled(" folio ", theme::style_accent_bold()),
        Span::styled(app.brochure.title.clone(), theme::style_default()),
    ]);
    f.render_widget(Paragraph::new(title).alignment(Alignment::Left), header);

    book_view::render(f, app, body);
    status_bar::render(f, app, status);

    if app.show_help {
        help::render(f, full);
    }
}

/// A `width`×`height` rect centered in `area`
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
