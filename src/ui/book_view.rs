use folio::{FlipDirection, FrameSnapshot, PageRect, Point};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line};
use ratatui::widgets::Block;
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use super::surface::Sheet;
use super::theme;
use crate::app::App;

/// Render the book: pages in z order, the fold shadow under the turning page,
/// then page text wherever it is not covered.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (cw, ch) = app.cell;
    let width = f64::from(area.width) * cw;
    let height = f64::from(area.height) * ch;
    let sheets = &app.scene;
    let outlines: Vec<Vec<Point>> = sheets.iter().map(|s| s.snapshot.outline()).collect();
    let top_z = sheets.iter().map(|s| s.snapshot.z_index).max();
    let base_z = sheets.iter().map(|s| s.snapshot.z_index).min();
    let shadow = app.frame.as_ref().and_then(|f| shadow_band(f, ch));

    let canvas = Canvas::default()
        .block(Block::default().style(theme::style_default()))
        .marker(Marker::HalfBlock)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(move |ctx| {
            let flip_y = |y: f64| height - y;

            for (i, sheet) in sheets.iter().enumerate() {
                let is_top = Some(sheet.snapshot.z_index) == top_z && top_z != base_z;
                if is_top {
                    if let Some(band) = &shadow {
                        for (y, x1, x2, color) in band {
                            ctx.draw(&Line {
                                x1: *x1,
                                y1: flip_y(*y),
                                x2: *x2,
                                y2: flip_y(*y),
                                color: *color,
                            });
                        }
                    }
                }
                let paper = sheet_color(sheet);
                fill_polygon(ctx, &outlines[i], ch / 2.0, paper, flip_y);
                let edge = if is_top { theme::ACCENT } else { theme::EDGE };
                stroke_polygon(ctx, &outlines[i], edge, flip_y);
            }

            for (i, sheet) in sheets.iter().enumerate() {
                if sheet.mirrored {
                    continue;
                }
                let covers = &outlines[i + 1..];
                print_text(ctx, sheet, &outlines[i], covers, (cw, ch), flip_y);
            }
        });

    frame.render_widget(canvas, area);
}

fn sheet_color(sheet: &Sheet) -> Color {
    let paper = sheet.content.paper();
    match (sheet.mirrored, paper) {
        (false, _) => paper,
        (true, theme::PAPER) => theme::PAPER_BACK,
        (true, _) => theme::shade(paper, 0.15),
    }
}

// ── Rasterizing ──

/// Even-odd scanline fill
fn fill_polygon(ctx: &mut Context, outline: &[Point], step: f64, color: Color, flip_y: impl Fn(f64) -> f64) {
    if outline.len() < 3 || step <= 0.0 {
        return;
    }
    let min_y = outline.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = outline.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let mut y = (min_y / step).floor() * step + step / 2.0;
    while y <= max_y {
        let xs = scanline(outline, y);
        for pair in xs.chunks_exact(2) {
            ctx.draw(&Line {
                x1: pair[0],
                y1: flip_y(y),
                x2: pair[1],
                y2: flip_y(y),
                color,
            });
        }
        y += step;
    }
}

fn stroke_polygon(ctx: &mut Context, outline: &[Point], color: Color, flip_y: impl Fn(f64) -> f64) {
    for (i, a) in outline.iter().enumerate() {
        let b = outline[(i + 1) % outline.len()];
        ctx.draw(&Line {
            x1: a.x,
            y1: flip_y(a.y),
            x2: b.x,
            y2: flip_y(b.y),
            color,
        });
    }
}

/// Sorted x coordinates where the horizontal line at `y` crosses `outline`
fn scanline(outline: &[Point], y: f64) -> Vec<f64> {
    let mut xs = Vec::new();
    for (i, a) in outline.iter().enumerate() {
        let b = outline[(i + 1) % outline.len()];
        if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
            xs.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
        }
    }
    xs.sort_by(f64::total_cmp);
    xs
}

fn contains(outline: &[Point], p: Point) -> bool {
    scanline(outline, p.y)
        .chunks_exact(2)
        .any(|pair| pair[0] <= p.x && p.x <= pair[1])
}

// ── Shadow ──

type Band = Vec<(f64, f64, f64, Color)>;

/// Horizontal strokes of the shadow cast next to the fold line
fn shadow_band(frame: &FrameSnapshot, ch: f64) -> Option<Band> {
    let shadow = frame.shadow?;
    if shadow.width <= 0.0 || shadow.opacity <= 0.02 {
        return None;
    }
    let (sin, cos) = shadow.angle.sin_cos();
    if cos.abs() < 1e-3 {
        return None;
    }
    let rect: PageRect = frame.rect;
    let color = theme::shade(theme::SHADOW, 1.0 - shadow.opacity.clamp(0.0, 1.0));
    let side = match shadow.direction {
        FlipDirection::Forward => 1.0,
        FlipDirection::Back => -1.0,
    };

    let step = ch / 2.0;
    let mut band = Vec::new();
    let mut y = rect.top + step / 2.0;
    while y < rect.top + rect.height {
        // Fold line direction is (-sin, cos)
        let x = shadow.origin.x - (y - shadow.origin.y) * sin / cos;
        let (x1, x2) = (x, x + side * shadow.width / 4.0);
        let (lo, hi) = (x1.min(x2), x1.max(x2));
        let lo = lo.max(rect.left);
        let hi = hi.min(rect.left + rect.width);
        if lo < hi {
            band.push((y, lo, hi, color));
        }
        y += step;
    }
    Some(band)
}

// ── Text ──

fn print_text(
    ctx: &mut Context,
    sheet: &Sheet,
    outline: &[Point],
    covers: &[Vec<Point>],
    (cw, ch): (f64, f64),
    flip_y: impl Fn(f64) -> f64,
) {
    let Some(origin) = text_origin(outline, cw, ch) else {
        return;
    };
    let paper = sheet_color(sheet);
    let ink = theme::ink_for(paper);
    let title_style = Style::default().fg(ink).bg(paper).add_modifier(ratatui::style::Modifier::BOLD);
    let body_style = Style::default().fg(ink).bg(paper);

    let page_no = format!("{}", sheet.index + 1);
    let mut lines = vec![(sheet.content.title.as_str(), title_style), ("", body_style)];
    lines.extend(sheet.content.body.iter().map(|l| (l.as_str(), body_style)));
    lines.push(("", body_style));
    lines.push((page_no.as_str(), body_style));

    for (row, (text, style)) in lines.into_iter().enumerate() {
        let y = origin.y + ch * (row as f64 + 0.5);
        let visible = visible_prefix(text, Point::new(origin.x, y), cw, |p| {
            contains(outline, p) && !covers.iter().any(|c| contains(c, p))
        });
        if !visible.is_empty() {
            ctx.print(origin.x, flip_y(y), TextLine::from(Span::styled(visible, style)));
        }
    }
}

/// Top-left of the text block: one cell in from the outline's top-left
fn text_origin(outline: &[Point], cw: f64, ch: f64) -> Option<Point> {
    if outline.len() < 3 {
        return None;
    }
    let left = outline.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let top = outline.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    Some(Point::new(left + cw * 2.0, top + ch))
}

/// Longest prefix of `text` whose every cell passes `visible`
fn visible_prefix(text: &str, start: Point, cw: f64, visible: impl Fn(Point) -> bool) -> String {
    let mut out = String::new();
    let mut x = start.x;
    for c in text.chars() {
        let w = c.width().unwrap_or(0) as f64;
        if w > 0.0 && !visible(Point::new(x + cw * w / 2.0, start.y)) {
            break;
        }
        out.push(c);
        x += cw * w;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]
    }

    #[test]
    fn test_scanline_crossings() {
        assert_eq!(scanline(&square(), 50.0), vec![0.0, 100.0]);
        assert!(scanline(&square(), 150.0).is_empty());
    }

    #[test]
    fn test_contains() {
        assert!(contains(&square(), Point::new(10.0, 10.0)));
        assert!(!contains(&square(), Point::new(110.0, 10.0)));
    }

    #[test]
    fn test_visible_prefix_stops_at_cover() {
        let text = visible_prefix("Harbour", Point::new(0.0, 8.0), 8.0, |p| p.x < 24.0);
        assert_eq!(text, "Har");
    }
}
