//! TATM - Terminal ATM Kiosk
//!
//! Wires the kiosk together: the backing API (in-process bank by
//! default, HTTP when `ATM_API_URL` is set), the screen resolver with
//! its loaders, and the terminal event loop.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tatm::application::{App, ScreenResolver};
use tatm::domain::{AtmApi, ScreenId};
use tatm::infrastructure::{ApiTransactionExecutor, HttpAtmApi, MockBank};
use tatm::presentation::{InputHandler, render_ui, screen_loaders, welcome_view};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "tatm.log";

/// How long one render frame waits for input before redrawing, so
/// background screen loads become visible without a keypress.
const POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let api: Arc<dyn AtmApi> = match std::env::var("ATM_API_URL") {
        Ok(url) => Arc::new(HttpAtmApi::new(url)?),
        Err(_) => Arc::new(MockBank::new()),
    };
    let executor = Arc::new(ApiTransactionExecutor::new(Arc::clone(&api)));
    let resolver = Arc::new(ScreenResolver::new(welcome_view(), screen_loaders()));
    // The first screen a customer reaches; warm it before the loop.
    resolver.preload(&[ScreenId::PinEntry]).await;
    let mut app = App::new(api, executor, resolver);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Main event loop: resolve the active screen, draw, handle one key.
async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        let rendered = app.resolve_screen();
        terminal.draw(|f| render_ui(f, app, &rendered))?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    InputHandler::handle_key_event(app, key.code, key.modifiers).await;
                }
            }
        }
    }
}
