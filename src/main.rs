//! StreamTV - remote-control media player for the terminal
//!
//! Arrow keys move focus, Enter activates, Escape backs out of panels.
//! Three quick presses of Enter arm a pointer cursor for anything the
//! arrows cannot reach.
//!
//! # Usage
//!
//! ```bash
//! # Launch the player idle
//! streamtv
//!
//! # Play an item
//! streamtv play 603 --title "The Matrix" --start 12:00
//!
//! # CLI mode (for automation)
//! streamtv resolve 603 --json
//! streamtv convert subs.srt -o subs.vtt
//! ```

use std::io::{stdout, Stdout};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use streamtv::ambient::{AmbientColorCache, HttpArtworkSource};
use streamtv::api::{HttpRecommendations, HttpSourceResolver};
use streamtv::app::PlayerApp;
use streamtv::captions::{BlobStore, HttpCaptionFetcher, SubtitleConverter};
use streamtv::cli::{Cli, Command, ExitCode, Output, PlayCmd};
use streamtv::commands;
use streamtv::config::Config;
use streamtv::models::{Rect, Severity};
use streamtv::player::{HeadlessSurface, PlaybackSession, Services, SessionDriver};
use streamtv::services::{
    FileSettingsStore, MemorySettingsStore, Notifier, NoopCallbacks, RecordingNotifier,
    SettingsStore, StaticText,
};
use streamtv::ui;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).with_env(),
        None => Config::load(),
    };

    let output = Output::new(&cli);
    let code = match cli.command {
        Some(Command::Resolve(cmd)) => commands::resolve_cmd(cmd, &config, &output).await,
        Some(Command::Convert(cmd)) => commands::convert_cmd(cmd, &output),
        Some(Command::Play(cmd)) => match cmd.start_seconds() {
            Some(_) => tui_exit(run_tui(&config, Some(cmd)).await, &output),
            None => output.error(
                format!("Invalid start position: {}", cmd.start),
                ExitCode::InvalidArgs,
            ),
        },
        None => tui_exit(run_tui(&config, None).await, &output),
    };
    code.into()
}

fn tui_exit(result: Result<()>, output: &Output) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            error!(error = %e, "player failed");
            output.error(e.to_string(), ExitCode::Error)
        }
    }
}

/// Log to a file so the alternate screen stays clean
///
/// Filter comes from `STREAMTV_LOG` (default `streamtv=info`).
fn init_logging() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("streamtv")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("streamtv.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_env("STREAMTV_LOG")
        .unwrap_or_else(|_| EnvFilter::new("streamtv=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn settings_store() -> Arc<dyn SettingsStore> {
    match FileSettingsStore::default_path() {
        Some(path) => Arc::new(FileSettingsStore::open(path)),
        None => Arc::new(MemorySettingsStore::new()),
    }
}

/// Wire the player to the HTTP services
fn build_app(
    config: &Config,
    provider: Option<String>,
    servers: Vec<String>,
    viewport: Rect,
) -> PlayerApp<HeadlessSurface> {
    let notifier = Arc::new(RecordingNotifier::new());
    let services = Services {
        resolver: Arc::new(HttpSourceResolver::with_base_url(&config.resolver_url)),
        recommendations: Arc::new(HttpRecommendations::with_base_url(&config.recommendations_url)),
        converter: SubtitleConverter::new(Arc::new(HttpCaptionFetcher::new()), BlobStore::new()),
        notifier: notifier.clone(),
        callbacks: Arc::new(NoopCallbacks),
    };
    let session = PlaybackSession::new(
        HeadlessSurface::new(true),
        Arc::new(StaticText::default()),
        config.language(),
    )
    .with_preferences(provider, servers);
    let ambient = Arc::new(AmbientColorCache::new(
        config.ambient_cache_size,
        Arc::new(HttpArtworkSource::new()),
    ));

    PlayerApp::new(
        session,
        SessionDriver::new(services),
        settings_store(),
        notifier,
        ambient,
        viewport,
    )
}

/// Run interactive TUI
async fn run_tui(config: &Config, play: Option<PlayCmd>) -> Result<()> {
    let mut terminal = init_terminal()?;
    let size = terminal.size()?;
    let viewport = Rect::new(0.0, 0.0, size.width as f64, size.height as f64);
    let (provider, servers) = match &play {
        Some(cmd) => {
            let request = cmd
                .item
                .request(config.provider.clone(), &config.server_preferences);
            (request.provider, request.server_preferences)
        }
        None => (config.provider.clone(), config.server_preferences.clone()),
    };
    let mut app = build_app(config, provider, servers, viewport);

    match play {
        Some(cmd) => {
            let item = cmd.to_item();
            let start = cmd.start_seconds().unwrap_or(0.0);
            info!(item = %item.id, start, "starting playback");
            app.open(item, cmd.item.episode_ref(), start);
        }
        None => app
            .notifier()
            .notify("Nothing playing. Run `streamtv play <id>` to start.", Severity::Info),
    }

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    result
}

/// Main event loop - handles input, advances the clock, renders
async fn run_event_loop(terminal: &mut Tui, app: &mut PlayerApp<HeadlessSurface>) -> Result<()> {
    let mut last = Instant::now();

    while !app.should_quit() {
        let now = Instant::now();
        terminal.draw(|frame| ui::render(frame, app, now))?;

        if event::poll(TICK_RATE)? {
            match event::read()? {
                // Only handle key press events (ignore releases on Windows)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now());
                }
                Event::Resize(w, h) => app.resize(Rect::new(0.0, 0.0, w as f64, h as f64)),
                _ => {}
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;
        app.session_mut().surface_mut().advance(dt);
        app.tick(now);
    }

    Ok(())
}
