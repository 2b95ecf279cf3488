mod host;
mod refresher;
mod runtimes;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use dockwatch_core::aggregate::Aggregator;
use dockwatch_core::config::Settings;
use dockwatch_core::feed::{self, FeedReader};
use dockwatch_core::runtime::RuntimeClient;
use dockwatch_core::view::Dashboard;

use host::SysinfoHost;
use refresher::{Refresher, spawn_refresher};
use runtimes::DemoRuntime;
use ui::dashboard::Areas;
use ui::input;

#[derive(Parser, Debug)]
#[command(name = "dockwatch")]
#[command(about = "Live terminal dashboard for local Docker containers", long_about = None)]
struct Cli {
    /// Settings file (default: dockwatch.yml in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Maximum concurrent per-container fetches
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log lines fetched per container, or "all"
    #[arg(short, long)]
    tail: Option<String>,

    /// Use synthetic containers instead of the Docker daemon
    #[arg(long)]
    demo: bool,

    /// Write diagnostics to this file (RUST_LOG sets the level)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the settings file.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ms) = self.interval {
            settings.set_interval_ms(ms);
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(tail) = &self.tail {
            settings.logs.tail = tail.clone();
        }
    }
}

fn load_settings(cli: &Cli, cwd: &Path) -> Result<Settings> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => Settings::find_in(cwd),
    };
    let mut settings = match &path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    cli.apply_overrides(&mut settings);
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

/// The dashboard owns stdout, so diagnostics only go to a file when asked.
fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let Some(path) = log_file else {
        return Ok(None);
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .with_context(|| format!("log file path {} has no file name", path.display()))?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

async fn connect_runtime(demo: bool) -> Result<Arc<dyn RuntimeClient>> {
    if demo {
        return Ok(Arc::new(DemoRuntime::new()));
    }

    #[cfg(feature = "docker")]
    let runtime: Arc<dyn RuntimeClient> = Arc::new(
        runtimes::DockerRuntime::connect()
            .await
            .context("could not connect to Docker (is the daemon running? try --demo)")?,
    );

    #[cfg(not(feature = "docker"))]
    let runtime: Arc<dyn RuntimeClient> = {
        tracing::warn!("built without docker support, using demo runtime");
        Arc::new(DemoRuntime::new())
    };

    Ok(runtime)
}

// --- Terminal setup/teardown ---
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_dashboard(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut reader: FeedReader,
    runtime: &str,
) -> io::Result<()> {
    let mut dashboard = Dashboard::new();
    let mut state = reader.latest();

    loop {
        if reader.has_changed() {
            state = reader.latest();
            if let Some(snapshot) = &state.snapshot {
                dashboard.apply(snapshot);
            }
        }

        terminal.draw(|f| {
            let areas = Areas::new(f.area());
            dashboard.scroll_mut().set_viewport(areas.log_height());
            let view = dashboard.render(&state);
            ui::dashboard::draw(f, &areas, &view, runtime);
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let ev = event::read()?;
        if let Some(action) = input::action_for(&ev) {
            if !input::apply(action, dashboard.scroll_mut()) {
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file.as_deref())?;

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let settings = load_settings(&cli, &cwd)?;
    info!(
        interval_ms = settings.interval_ms,
        deadline_ms = settings.deadline_ms,
        workers = settings.workers,
        tail = %settings.logs.tail,
        "settings loaded"
    );

    // Connection failures are fatal only here, before the refresh loop starts.
    let runtime = connect_runtime(cli.demo).await?;
    let runtime_name = runtime.name();

    let aggregator = Aggregator::new(runtime, Arc::new(SysinfoHost::new()))
        .with_workers(settings.workers)
        .with_log_options(settings.logs.clone());
    let (tx, reader) = feed::channel();
    let handle = spawn_refresher(
        Refresher::new(aggregator, settings.interval(), settings.deadline()),
        tx,
    );

    let mut terminal = setup_terminal().context("failed to set up terminal")?;
    let result = run_dashboard(&mut terminal, reader, runtime_name);
    restore_terminal(&mut terminal).context("failed to restore terminal")?;
    handle.abort();

    result.context("dashboard failed")?;
    info!("dockwatch exited");
    Ok(())
}
