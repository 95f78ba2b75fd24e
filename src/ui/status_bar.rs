use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::theme;
use crate::app::App;

/// Render the bottom status bar: keybinding hints left, book state right
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let hints = if app.show_help {
        vec![key("?"), desc("Close "), key("Esc"), desc("Close")]
    } else {
        vec![
            key("←→"),
            desc("Flip "),
            key("Home/End"),
            desc("Jump "),
            key("n/p"),
            desc("Bottom corner "),
            key("?"),
            desc("Help "),
            key("q"),
            desc("Quit"),
        ]
    };
    frame.render_widget(Paragraph::new(Line::from(hints)), chunks[0]);

    let book = &app.book;
    let mut status = vec![Span::styled(
        format!(
            "Page {}/{} ",
            book.current_page_index() + 1,
            book.page_count()
        ),
        theme::style_accent_bold(),
    )];
    status.push(Span::styled("│ ", theme::style_border()));
    status.push(Span::styled(
        format!("{} ", book.orientation().as_str()),
        theme::style_dim(),
    ));
    status.push(Span::styled("│ ", theme::style_border()));
    status.push(Span::styled(
        format!("{} ", book.state().as_str()),
        theme::style_dim(),
    ));
    if let Some(ref toast) = app.toast {
        status.insert(0, Span::styled(format!("{toast} "), theme::style_warning()));
    }

    let para = Paragraph::new(Line::from(status)).alignment(Alignment::Right);
    frame.render_widget(para, chunks[1]);
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(format!(" [{k}] "), theme::style_key_hint())
}

fn desc(d: &'static str) -> Span<'static> {
    Span::styled(d, theme::style_key_desc())
}
