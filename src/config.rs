use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use folio::FlipSetting;
use serde::Deserialize;
use tracing::info;

// ─── Embedded Default ────────────────────────────────────────────────────
/// Always available as the base layer, even without a config file on disk
const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

// ─── CLI Arguments (override layer) ─────────────────────────────────────
/// folio: flip through a brochure in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "folio", version, about, long_about = None)]
pub struct CliArgs {
    /// Brochure file (TOML) to open; a built-in sample is used otherwise
    pub brochure: Option<PathBuf>,

    /// Path to a custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log file path (logging disabled if not specified)
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Log level filter (overrides config file)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Target FPS while pages move (overrides config file)
    #[arg(long)]
    pub fps: Option<u16>,

    /// Page to open at
    #[arg(short, long)]
    pub start_page: Option<usize>,

    /// Flip animation: "corner" or "page"
    #[arg(long)]
    pub animation_mode: Option<String>,

    /// Never fall back to a single-page layout
    #[arg(long)]
    pub no_portrait: bool,

    /// Disable mouse support
    #[arg(long)]
    pub no_mouse: bool,

    /// Print the default config to stdout and exit
    #[arg(long)]
    pub print_default_config: bool,
}

// ─── TOML Structs ───────────────────────────────────────────────────────

/// Root configuration, parsed from TOML then overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    /// Engine options, validated when the book is built
    #[serde(default)]
    pub book: FlipSetting,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub fps: u16,
    pub cell_width: u16,
    pub cell_height: u16,
    pub log_level: String,
    pub mouse: bool,
    /// Empty = built-in sample
    pub brochure: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            cell_width: 8,
            cell_height: 16,
            log_level: "info".into(),
            mouse: true,
            brochure: String::new(),
        }
    }
}

impl Config {
    /// Standard config file path: ~/.config/folio/config.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
            .join("config.toml")
    }

    /// The embedded defaults
    #[cfg(test)]
    pub fn embedded() -> Result<Self> {
        toml::from_str(DEFAULT_CONFIG_TOML).wrap_err("embedded default_config.toml is invalid")
    }

    /// Tick interval from FPS
    pub fn tick_rate_ms(&self) -> u64 {
        let fps = self.viewer.fps.max(1);
        1000 / fps as u64
    }

    /// Engine pixels per terminal cell, never zero
    pub fn cell_size(&self) -> (f64, f64) {
        (
            f64::from(self.viewer.cell_width.max(1)),
            f64::from(self.viewer.cell_height.max(1)),
        )
    }

    /// Brochure path from the config file, if set
    pub fn brochure(&self) -> Option<PathBuf> {
        let path = self.viewer.brochure.trim();
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }

    fn apply(&mut self, cli: &CliArgs) {
        if let Some(ref level) = cli.log_level {
            self.viewer.log_level = level.clone();
        }
        if let Some(fps) = cli.fps {
            self.viewer.fps = fps;
        }
        if let Some(ref path) = cli.brochure {
            self.viewer.brochure = path.display().to_string();
        }
        if cli.no_mouse {
            self.viewer.mouse = false;
        }
        if let Some(page) = cli.start_page {
            self.book.start_page = page;
        }
        if let Some(ref mode) = cli.animation_mode {
            self.book.animation_mode = mode.clone();
        }
        if cli.no_portrait {
            self.book.use_portrait = false;
        }
    }
}

// ─── Bootloader ─────────────────────────────────────────────────────────

/// The single entry point for configuration. Called exactly once at startup.
///
/// 1. Resolve config file path (CLI override or default)
/// 2. If the default file doesn't exist, create it from the embedded copy
/// 3. Parse TOML from disk into Config
/// 4. Apply CLI overrides on top
pub fn load(cli: &CliArgs) -> Result<Config> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    if !config_path.exists() {
        if cli.config.is_some() {
            color_eyre::eyre::bail!("Config file {} does not exist", config_path.display());
        }
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&config_path, DEFAULT_CONFIG_TOML).wrap_err_with(|| {
            format!("Failed to write default config to {}", config_path.display())
        })?;
        info!("Created default config at {}", config_path.display());
    }

    let toml_str = std::fs::read_to_string(&config_path)
        .wrap_err_with(|| format!("Failed to read config from {}", config_path.display()))?;
    let mut config = parse(&toml_str).wrap_err_with(|| {
        format!(
            "Failed to parse config at {}.\n\
             Delete the file to regenerate defaults, or run:\n  \
             folio --print-default-config > {:?}",
            config_path.display(),
            config_path
        )
    })?;

    config.apply(cli);
    Ok(config)
}

/// Parse a config file. Missing `[book]` keys keep the embedded values.
pub fn parse(source: &str) -> Result<Config> {
    let mut base: toml::Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
    let user: toml::Table = toml::from_str(source)?;
    for (section, value) in user {
        match (base.get_mut(&section), value) {
            (Some(toml::Value::Table(into)), toml::Value::Table(from)) => into.extend(from),
            (_, value) => {
                base.insert(section, value);
            }
        }
    }
    let config = toml::Value::Table(base).try_into()?;
    Ok(config)
}

/// Returns the embedded default config TOML string.
pub fn default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.viewer.fps, 60);
        assert!(config.book.clone().validate().is_ok());
    }

    #[test]
    fn test_partial_book_section_keeps_defaults() {
        let config = parse("[book]\nshowCover = false\n").unwrap();
        assert!(!config.book.show_cover);
        assert_eq!(config.book.width, 400.0);
        assert_eq!(config.viewer.cell_height, 16);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliArgs::parse_from(["folio", "--fps", "30", "--no-portrait", "-s", "3"]);
        let mut config = Config::embedded().unwrap();
        config.apply(&cli);
        assert_eq!(config.tick_rate_ms(), 33);
        assert!(!config.book.use_portrait);
        assert_eq!(config.book.start_page, 3);
    }
}
