//! Orderdesk - a terminal client for the order-management backend.
//!
//! Runs the keyboard-driven TUI by default. `--login`, `--logout` and
//! `--whoami` manage the stored session without opening the UI.

mod app;
mod forms;
mod ui;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orderdesk_core::{ApiClient, Config, LoginCredentials, Route, SessionState, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const USAGE: &str = "\
Usage: orderdesk [OPTION | PATH]

  --login      Sign in and store the session
  --logout     Remove the stored session
  --whoami     Show who the stored session belongs to
  --help       Show this message
  PATH         Open the TUI at a route, e.g. /orders/12";

/// What the command line asked for
enum Command {
    Tui(Route),
    Login,
    Logout,
    WhoAmI,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Tui(Route::LANDING)),
        [arg] => match arg.as_str() {
            "--login" => Ok(Command::Login),
            "--logout" => Ok(Command::Logout),
            "--whoami" => Ok(Command::WhoAmI),
            "--help" | "-h" => Ok(Command::Help),
            path if path.starts_with('/') => match Route::parse(path) {
                Some(route) => Ok(Command::Tui(route)),
                None => bail!("Unknown route: {}", path),
            },
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        },
        _ => bail!("Expected at most one argument\n\n{}", USAGE),
    }
}

/// Log to stderr for the command-line actions
fn init_stderr_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a file while the TUI owns the terminal. The guard flushes on drop.
fn init_file_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = Config::log_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir).context("Failed to create log directory")?;
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix("orderdesk")
            .filename_suffix("log")
            .build(dir)
            .context("Failed to open log file")
    });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(_) => {
            // Anything written to the terminal would corrupt the UI
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::sink))
                .with(filter)
                .init();
            None
        }
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    })
}

fn build_session(config: &Config) -> Result<SessionStore> {
    let storage = config.build_storage()?;
    let api = ApiClient::new(&config.effective_api_url())?;
    Ok(SessionStore::new(api, storage))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let route = match command {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Tui(route) => route,
        cli => {
            init_stderr_tracing();
            let mut config = load_config();
            let session = build_session(&config)?;
            return match cli {
                Command::Login => cli_login(&mut config, &session).await,
                Command::Logout => {
                    session.logout();
                    println!("Logged out");
                    Ok(())
                }
                _ => cli_whoami(&session).await,
            };
        }
    };

    let _log_guard = init_file_tracing();
    info!(%route, "Orderdesk starting");

    let config = load_config();
    let session = build_session(&config)?;

    // Resolve the stored session while the UI shows its loading placeholder
    let resolver = session.clone();
    tokio::spawn(async move {
        resolver.initialize().await;
    });

    let mut app = App::new(config, session, route);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }

    info!("Orderdesk shutting down");
    Ok(())
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.sync_session();

        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// Command-line actions
// ============================================================================

async fn cli_login(config: &mut Config, session: &SessionStore) -> Result<()> {
    let default_username = config.initial_username();
    match default_username {
        Some(ref name) => print!("Username [{}]: ", name),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let username = match line.trim() {
        "" => default_username.unwrap_or_default(),
        typed => typed.to_string(),
    };

    let password = rpassword::prompt_password("Password: ")?;
    let credentials = LoginCredentials::new(username.clone(), password);

    let user = session.login(&credentials).await?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {} ({})", user.display_name(), user.username);
    Ok(())
}

async fn cli_whoami(session: &SessionStore) -> Result<()> {
    match session.initialize().await {
        SessionState::Authenticated(user) => {
            println!("{} ({})", user.display_name(), user.username);
        }
        _ => println!("not logged in"),
    }
    Ok(())
}
