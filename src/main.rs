use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::info;

use sensorwatch::config::{DashboardConfig, ResponseOrdering};
use sensorwatch::source::{
    ChannelSource, HttpFetcher, MetricFetcher, PollScheduler, Reading, TableRefresher, TableView,
};
use sensorwatch::ui::Theme;
use sensorwatch::{events, logging, ui, App};

/// Frame interval; also bounds how long a key press waits.
const FRAME: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "sensorwatch")]
#[command(about = "Live terminal dashboard for CO2, temperature and humidity")]
struct Args {
    /// Config file (TOML, JSON, YAML, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sensor base URL, e.g. http://co2meter.local
    #[arg(short, long)]
    url: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Persist table sort state in this file
    #[arg(long)]
    table_state: Option<PathBuf>,

    /// Ignore responses older than one already shown
    #[arg(long)]
    latest_only: bool,

    /// Fetch every metric once, write readings to this JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(url) = args.url {
        config.base_url = url;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file;
    }
    if args.table_state.is_some() {
        config.table_state_file = args.table_state;
    }
    if args.latest_only {
        config.ordering = ResponseOrdering::Latest;
    }
    config.validate()?;

    if let Some(ref path) = config.log_file {
        logging::init_logging(path)?;
    }
    let http = HttpFetcher::new(config.base_url.clone());
    info!(base_url = http.base_url(), ordering = ?config.ordering, "starting sensorwatch");

    let rt = Runtime::new()?;
    let fetcher: Arc<dyn MetricFetcher> = Arc::new(http);

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return rt.block_on(export_once(fetcher, &config, &export_path));
    }

    run_tui(&rt, fetcher, &config)
}

/// Fetch each metric once and export the readings.
async fn export_once(
    fetcher: Arc<dyn MetricFetcher>,
    config: &DashboardConfig,
    export_path: &Path,
) -> Result<()> {
    let (tx, source) = ChannelSource::create(&config.base_url);
    for channel in config.channels() {
        match fetcher.fetch(&channel.path).await {
            Ok(body) => {
                let _ = tx.send(Reading {
                    metric: channel.metric,
                    seq: 1,
                    body,
                });
            }
            Err(e) => eprintln!("{}: {}", channel.metric.label(), e),
        }
    }

    let mut app = App::new(Box::new(source), config);
    app.update(Instant::now());
    app.export_readings(export_path)?;

    println!("Exported readings to: {}", export_path.display());
    Ok(())
}

/// Start polling and run the TUI until the user quits.
fn run_tui(rt: &Runtime, fetcher: Arc<dyn MetricFetcher>, config: &DashboardConfig) -> Result<()> {
    // Timers are spawned onto the runtime and keep running while the UI loop
    // owns this thread.
    let _guard = rt.enter();

    let (reading_tx, source) = ChannelSource::create(&config.base_url);
    let poller = PollScheduler::new(Arc::clone(&fetcher), reading_tx).spawn(&config.channels());

    let (table_tx, table_rx) = mpsc::unbounded_channel();
    let table_view = TableView::new(fetcher, config.table_path.clone(), table_tx);
    table_view.spawn_reload(rt.handle());
    let refresher = TableRefresher::spawn(table_view, config.table_interval());

    let theme = Theme::auto_detect();
    let mut app = App::new(Box::new(source), config)
        .with_table_updates(table_rx)
        .with_poller(poller)
        .with_table_refresher(refresher)
        .with_theme(theme);

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

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("sensorwatch stopped");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.update(Instant::now());

        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(FRAME)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                // Terminal will redraw on next iteration
                _ => {}
            }
        }
    }

    Ok(())
}
