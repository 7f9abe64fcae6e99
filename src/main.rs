use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod console;
mod editor;
mod host;
mod input;
mod process;
mod render;
mod scripting;
mod session;
mod theme;

use app::App;
use config::Settings;
use editor::Editor;
use host::HostEditor;
use process::ChannelEvent;
use render::Renderer;

/// Environment variable holding the log filter
const LOG_ENV: &str = "REPLPANE_LOG";
const DEFAULT_LOG_FILTER: &str = "replpane=info";

/// How often the interpreter is checked for having exited
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Log to a file in the config directory; stdout belongs to the UI
fn init_logging() {
    let Some(dir) = Settings::config_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("replpane.log"))
    else {
        return;
    };

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    init_logging();
    tracing::info!("{} v{} starting", host::NAME, host::VERSION);

    let (settings, problems) = config::load();

    // Parse command line args
    let editor = match env::args().nth(1) {
        Some(path) => Editor::open(PathBuf::from(path))?,
        None => Editor::new(),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut app = App::new(editor, settings, events_tx);
    if let Some(problem) = problems.first() {
        app.host.show_message(&problem.to_string());
    }

    // Set up terminal
    Renderer::setup()?;
    let result = match Renderer::new() {
        Ok(mut renderer) => run(&mut app, &mut renderer, &mut events_rx).await,
        Err(e) => Err(e),
    };

    // Cleanup
    app.shutdown();
    Renderer::teardown()?;
    tracing::info!("exiting");

    result
}

async fn run(
    app: &mut App,
    renderer: &mut Renderer,
    events_rx: &mut UnboundedReceiver<ChannelEvent>,
) -> io::Result<()> {
    // Initial render
    renderer.adjust_scroll(app);
    renderer.render(app)?;

    // Event stream for async key reading
    let mut event_stream = EventStream::new();
    let mut poll = tokio::time::interval(POLL_INTERVAL);

    // Main loop
    while app.is_running() {
        tokio::select! {
            Some(Ok(event)) = event_stream.next() => {
                if let Event::Resize(width, height) = event {
                    renderer.resize(width, height);
                }
                let layout = renderer.layout(app);
                input::handle_event(app, event, &layout);
            }
            Some(event) = events_rx.recv() => {
                app.handle_channel_event(event);
                // Apply everything already queued before repainting
                while let Ok(event) = events_rx.try_recv() {
                    app.handle_channel_event(event);
                }
            }
            _ = poll.tick() => app.tick(),
        }
        renderer.adjust_scroll(app);
        renderer.render(app)?;
    }

    Ok(())
}
