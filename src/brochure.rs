use std::path::Path;
use std::rc::Rc;

use color_eyre::eyre::{Result, WrapErr};
use folio::{PageDensity, PageSource};
use ratatui::style::Color;
use serde::Deserialize;

use crate::ui::surface::{SheetBuffer, TerminalSurface};
use crate::ui::theme::parse_color;

const SAMPLE_BROCHURE: &str = include_str!("../assets/sample_brochure.toml");

/// One page of printed content
#[derive(Debug, Clone, Deserialize)]
pub struct PageContent {
    pub title: String,
    #[serde(default)]
    pub body: Vec<String>,
    /// Named or `#rrggbb` paper color
    #[serde(default)]
    pub color: Option<String>,
    /// Stiff page, flips without bending
    #[serde(default)]
    pub hard: bool,
}

impl PageContent {
    pub fn paper(&self) -> Color {
        self.color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(crate::ui::theme::PAPER)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Brochure {
    pub title: String,
    #[serde(rename = "page")]
    pub pages: Vec<PageContent>,
}

impl Brochure {
    pub fn sample() -> Result<Self> {
        Self::parse(SAMPLE_BROCHURE).wrap_err("built-in sample brochure is invalid")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read brochure {}", path.display()))?;
        Self::parse(&source).wrap_err_with(|| format!("Failed to parse brochure {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let brochure: Brochure = toml::from_str(source)?;
        if brochure.pages.is_empty() {
            color_eyre::eyre::bail!("brochure \"{}\" has no pages", brochure.title);
        }
        Ok(brochure)
    }

    /// One terminal surface per page, all drawing into `buffer`
    pub fn sources(&self, buffer: &SheetBuffer) -> Vec<PageSource> {
        self.pages
            .iter()
            .enumerate()
            .map(|(index, content)| {
                let surface = TerminalSurface::new(index, Rc::new(content.clone()), buffer.clone());
                let density = if content.hard {
                    PageDensity::Hard
                } else {
                    PageDensity::Soft
                };
                PageSource::new(Box::new(surface), density)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_brochure_parses() {
        let brochure = Brochure::sample().unwrap();
        assert!(brochure.pages.len() >= 8);
        assert!(brochure.pages[0].hard);
    }

    #[test]
    fn test_empty_brochure_is_rejected() {
        assert!(Brochure::parse("title = \"Empty\"\npage = []\n").is_err());
    }

    #[test]
    fn test_sources_match_pages() {
        let brochure = Brochure::parse(
            "title = \"T\"\n[[page]]\ntitle = \"Cover\"\nhard = true\n[[page]]\ntitle = \"One\"\ncolor = \"#ffeecc\"\n",
        )
        .unwrap();
        let sources = brochure.sources(&SheetBuffer::default());
        assert_eq!(sources.len(), 2);
        assert_eq!(brochure.pages[1].paper(), Color::Rgb(0xff, 0xee, 0xcc));
    }
}
