mod app;
mod brochure;
mod config;
mod event;
mod ui;

use std::io;
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use folio::animation::FlagScheduler;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::app::App;
use crate::brochure::Brochure;
use crate::config::{CliArgs, Config};
use crate::event::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    // Initialize color-eyre with custom panic hook that restores terminal
    install_panic_hook();

    if cli.print_default_config {
        print!("{}", config::default_config_toml());
        return Ok(());
    }

    let config = config::load(&cli)?;
    let _log_guard = init_logging(cli.log.as_deref(), &config.viewer.log_level)?;
    info!("folio starting");

    let brochure = match config.brochure() {
        Some(path) => Brochure::load(&path)?,
        None => Brochure::sample()?,
    };

    // Settings are validated before the terminal is touched
    config
        .book
        .clone()
        .validate()
        .wrap_err("Invalid [book] settings")?;

    // Setup terminal
    enable_raw_mode().wrap_err("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if config.viewer.mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, &config, brochure).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("folio exiting");
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    brochure: Brochure,
) -> Result<()> {
    let scheduler = FlagScheduler::new();
    let mut event_handler = EventHandler::new(config.tick_rate_ms(), scheduler.flag());

    let size = terminal.size()?;
    let [_, book_area, _] = ui::layout(ratatui::layout::Rect::new(0, 0, size.width, size.height));
    let mut app = App::new(config, brochure, book_area, Box::new(scheduler))?;
    app.on_tick();

    // ── Main event loop ───────────────────────────────────────────────
    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if let Some(event) = event_handler.next().await {
            app.handle_event(event);
            if app.should_quit {
                break;
            }
        } else {
            break;
        }
    }

    event_handler.stop();
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        // Call default handler
        default_hook(panic_info);
    }));
    color_eyre::install().ok();
}

/// Initialize tracing to a log file.
///
/// The terminal owns stdout, so without a log path nothing is recorded. The
/// returned guard flushes the writer when dropped.
fn init_logging(log_path: Option<&Path>, level: &str) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let Some(path) = log_path else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .with_writer(io::sink)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| color_eyre::eyre::eyre!("Log path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}
