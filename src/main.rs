use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use phantom_dash::{events, ui, App, Backend, Dashboard, HttpBackend, Overrides, Settings, Theme};

#[derive(Parser, Debug)]
#[command(name = "phantom-dash")]
#[command(about = "Terminal dashboard for a PhantomFirewall instance")]
struct Args {
    /// Base URL of the firewall API [default: http://127.0.0.1:8080]
    #[arg(long)]
    endpoint: Option<String>,

    /// Polling interval for status and traffic, in milliseconds [default: 5000]
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Per-request timeout, in milliseconds [default: 3000]
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch every channel once, export to JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref(), args.export.is_some())?;

    let overrides = Overrides {
        endpoint: args.endpoint.clone(),
        refresh_ms: args.refresh,
        timeout_ms: args.timeout,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;
    info!(
        endpoint = %settings.endpoint,
        refresh_ms = settings.refresh_ms,
        timeout_ms = settings.timeout_ms,
        "starting"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let backend: Arc<dyn Backend> =
        Arc::new(HttpBackend::new(&settings.endpoint, settings.timeout())?);

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return export_to_file(&rt, backend, &settings, &export_path);
    }

    // Channels and the scheduler spawn onto this runtime while the TUI owns
    // the main thread.
    let _guard = rt.enter();
    let mut dashboard = Dashboard::new(backend, settings.refresh_interval());
    dashboard.mount()?;

    let result = run_tui(&dashboard);

    dashboard.teardown();
    result
}

/// Install the tracing subscriber.
///
/// Logs go to `log_file` when given, to stderr in export mode, and nowhere
/// otherwise since the TUI owns the terminal.
fn init_tracing(log_file: Option<&Path>, export: bool) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if export {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}

/// Run the TUI over a mounted dashboard
fn run_tui(dashboard: &Dashboard) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(dashboard.watch(), dashboard.description(), Theme::auto_detect());

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    let height = terminal.size()?.height;
                    events::handle_mouse_event(app, mouse, ui::rules_body_row(height));
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Pick up whatever the channels applied since the last frame
        app.sync();
    }

    Ok(())
}

/// Fetch every channel once and write the slots to a JSON file
fn export_to_file(
    rt: &tokio::runtime::Runtime,
    backend: Arc<dyn Backend>,
    settings: &Settings,
    export_path: &Path,
) -> Result<()> {
    let state = rt.block_on(async {
        let dashboard = Dashboard::new(backend, settings.refresh_interval());
        dashboard.refresh_all().await
    });

    for (endpoint, err) in state.errors() {
        warn!(channel = endpoint.label(), kind = err.kind(), error = %err, "fetch failed");
    }

    let json = serde_json::to_string_pretty(&state.to_export_json())?;
    std::fs::write(export_path, json)
        .with_context(|| format!("failed to write {}", export_path.display()))?;

    println!("Exported to {}", export_path.display());
    Ok(())
}
