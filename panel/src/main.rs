mod app;
mod layout;
mod ui;

use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use rtouch::config;
use rtouch::dashboard::storage::FileStore;
use rtouch::dashboard::{spawn_polling, PollingStore, ProxyClient};
use std::fs::{self, OpenOptions};
use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Redraw and long-press timer resolution
const TICK: Duration = Duration::from_millis(50);

/// Restores the terminal even if the event loop bails out early
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        stdout()
            .execute(EnterAlternateScreen)?
            .execute(EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout()
            .execute(DisableMouseCapture)
            .and_then(|out| out.execute(LeaveAlternateScreen));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_from_env().context("Failed to load configuration")?;
    let dashboard = config.dashboard;

    // Log to a file under the storage dir; stdout belongs to the UI
    fs::create_dir_all(&dashboard.storage_dir).context("Failed to create storage directory")?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dashboard.storage_dir.join("panel.log"))
        .context("Failed to open panel log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtouch_panel=info,rtouch=info".into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    info!(proxy = %dashboard.proxy_url, "RTOUCH panel starting...");

    let backend = ProxyClient::new(dashboard.proxy_url.clone(), Duration::from_secs(10))
        .context("Failed to initialize proxy client")?;
    let store = Arc::new(PollingStore::new(
        Arc::new(backend),
        Arc::new(FileStore::new(dashboard.storage_dir.clone())),
        dashboard.refresh_delay(),
    ));

    let polling = spawn_polling(
        store.clone(),
        dashboard.poll_interval(),
        CancellationToken::new(),
    );

    let mut app = App::new(store.clone(), &dashboard);
    let result = run(&mut app, &store).await;

    polling.cancel();
    if let Err(e) = polling.join().await {
        error!(error = %e, "Polling task failed");
    }
    info!("RTOUCH panel stopped");
    result
}

async fn run(app: &mut App, store: &Arc<PollingStore>) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout())).context("Failed to create terminal")?;

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            _ = tick.tick() => app.on_tick(Instant::now()),
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.on_key(key),
                Some(Ok(Event::Mouse(mouse))) => {
                    if let Some(call) = app.on_mouse(mouse, Instant::now()) {
                        info!(domain = %call.domain, service = %call.service, "Dispatching service call");
                        let store = store.clone();
                        tokio::spawn(async move {
                            store.dispatch(call).await;
                        });
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Terminal event stream failed"),
                None => break,
            },
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
