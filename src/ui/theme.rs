use ratatui::style::{Color, Modifier, Style};

// ─── Color Palette (terminal-adaptive, transparency-friendly) ──────────

/// Background: always Reset so the terminal background shows through
pub const BG: Color = Color::Reset;

/// Primary text color
pub const FG: Color = Color::White;

/// Dimmed text (labels, inactive elements)
pub const FG_DIM: Color = Color::DarkGray;

/// Accent color (keybinding hints, page edges while folding)
pub const ACCENT: Color = Color::Cyan;

/// Border color
pub const BORDER: Color = Color::DarkGray;

/// Default paper
pub const PAPER: Color = Color::Rgb(0xf2, 0xee, 0xe4);

/// Back side of a turning page
pub const PAPER_BACK: Color = Color::Rgb(0xd8, 0xd2, 0xc4);

/// Ink on light paper
pub const INK: Color = Color::Rgb(0x22, 0x22, 0x22);

/// Page edges
pub const EDGE: Color = Color::Rgb(0x8a, 0x82, 0x74);

/// Cast shadow
pub const SHADOW: Color = Color::Rgb(0x3a, 0x36, 0x30);

/// Warning color (toasts)
pub const WARNING: Color = Color::Yellow;

// ─── Style Constructors ──────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(FG).bg(BG)
}

pub fn style_dim() -> Style {
    Style::default().fg(FG_DIM).bg(BG)
}

pub fn style_accent() -> Style {
    Style::default().fg(ACCENT).bg(BG)
}

pub fn style_accent_bold() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG)
        .add_modifier(Modifier::BOLD)
}

pub fn style_warning() -> Style {
    Style::default().fg(WARNING).bg(BG)
}

pub fn style_border() -> Style {
    Style::default().fg(BORDER).bg(BG)
}

pub fn style_key_hint() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG)
        .add_modifier(Modifier::BOLD)
}

pub fn style_key_desc() -> Style {
    Style::default().fg(FG_DIM).bg(BG)
}

/// Ink that stays readable on `paper`
pub fn ink_for(paper: Color) -> Color {
    match paper {
        Color::Rgb(r, g, b) => {
            let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
            if luma < 128.0 {
                Color::White
            } else {
                INK
            }
        }
        Color::Black | Color::DarkGray | Color::Blue | Color::Red | Color::Magenta => Color::White,
        _ => INK,
    }
}

/// Darken an RGB color by `amount` in [0, 1]; named colors pass through
pub fn shade(color: Color, amount: f64) -> Color {
    let keep = (1.0 - amount).clamp(0.0, 1.0);
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            (f64::from(r) * keep) as u8,
            (f64::from(g) * keep) as u8,
            (f64::from(b) * keep) as u8,
        ),
        other => other,
    }
}

/// Parse a color string into a ratatui Color.
/// Supports: named colors, "reset", "#RRGGBB" hex.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "reset" | "default" | "transparent" => Some(Color::Reset),
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" | "dark_gray" | "dark_grey" => Some(Color::DarkGray),
        hex if hex.starts_with('#') && hex.len() == 7 => {
            let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
            let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
            let b = u8::from_str_radix(&hex[5..7], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#1f3b57"), Some(Color::Rgb(0x1f, 0x3b, 0x57)));
        assert_eq!(parse_color(" Dark_Gray "), Some(Color::DarkGray));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn test_ink_contrasts_with_paper() {
        assert_eq!(ink_for(Color::Rgb(0x1f, 0x3b, 0x57)), Color::White);
        assert_eq!(ink_for(PAPER), INK);
        assert_eq!(shade(Color::Rgb(200, 100, 50), 0.5), Color::Rgb(100, 50, 25));
    }
}
