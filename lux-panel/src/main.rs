//! Lux panel receiver entry point.
//!
//! ```text
//! lux-panel                    Listen with defaults (0.0.0.0:44444)
//! lux-panel --config <path>   Use custom config TOML
//! lux-panel --listen <addr>   Override the listen address
//! lux-panel --gen-config      Dump default config and exit
//! lux-panel --headless        Receive and log, no terminal UI
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lux_core::{FrameAssembler, FrameReceiver, PixelEncoding, ReceiverStats, Rgb, UdpTransport};

use lux_panel::config::PanelConfig;
use lux_panel::sink::TerminalSink;
use lux_panel::ui::PanelApp;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lux-panel", about = "LED matrix frame receiver with a terminal preview")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "lux-panel.toml")]
    config: PathBuf,

    /// Listen address (overrides config). Example: 0.0.0.0:44444
    #[arg(short, long)]
    listen: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Run without the terminal UI.
    #[arg(long)]
    headless: bool,
}

/// Input events forwarded from the blocking crossterm thread.
enum UiEvent {
    Key(crossterm::event::KeyEvent),
    Resize,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&PanelConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = PanelConfig::load(&cli.config);
    if let Some(addr) = cli.listen {
        config.network.listen = addr;
    }

    // Init tracing. The TUI owns stdout, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("lux-panel v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Build the pipeline ───────────────────────────────────

    let listen: SocketAddr = config.network.listen.parse()?;
    let encoding: PixelEncoding = config.panel.encoding.parse()?;
    let (width, height) = (config.panel.width, config.panel.height);

    let transport = UdpTransport::bind(listen).await?;
    let local = transport.local_addr()?;

    let sink = TerminalSink::new(width, height);
    let frame_rx = sink.frame_receiver();

    let mut assembler = FrameAssembler::new(width * height * encoding.bytes_per_pixel())?;
    if let Some(timeout) = config.protocol.stale_after() {
        assembler = assembler.with_stale_after(timeout);
    }

    let mut receiver = FrameReceiver::new(transport, sink, assembler, encoding)?;
    let stats_rx = receiver.stats_receiver();
    let stop = receiver.stop_handle();

    info!("listening on {local} for {width}x{height} {encoding} frames");

    // ── 2. Spawn the receive loop ───────────────────────────────

    let alive = Arc::new(AtomicBool::new(true));
    let task_alive = alive.clone();
    let recv_handle = tokio::spawn(async move {
        if let Err(e) = receiver.run().await {
            error!("receiver error: {e}");
        }
        task_alive.store(false, Ordering::SeqCst);
    });

    // ── 3. Front end ────────────────────────────────────────────

    if cli.headless {
        run_headless(stats_rx, alive).await;
    } else {
        let app = PanelApp::new(width, height, local.to_string(), encoding.to_string());
        run_tui(app, frame_rx, stats_rx, alive).await?;
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    stop.store(false, Ordering::SeqCst);
    recv_handle.abort();
    let _ = recv_handle.await;

    Ok(())
}

// ── Front ends ───────────────────────────────────────────────────

/// Log-only mode: summarize the link every few seconds until ctrl-c.
async fn run_headless(stats_rx: watch::Receiver<ReceiverStats>, alive: Arc<AtomicBool>) {
    info!("headless mode; ctrl-c to stop");
    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let s = stats_rx.borrow().clone();
                info!(
                    fps = s.fps,
                    frames = s.frames_presented,
                    rejected = s.chunks_rejected,
                    bytes = s.bytes_received,
                    "link stats"
                );
            }
        }
    }
}

/// Terminal UI mode: a blocking input thread feeds this select loop,
/// which owns the terminal and redraws on frames, stats, and keys.
async fn run_tui(
    mut app: PanelApp,
    mut frame_rx: watch::Receiver<Vec<Rgb>>,
    mut stats_rx: watch::Receiver<ReceiverStats>,
    alive: Arc<AtomicBool>,
) -> std::io::Result<()> {
    // Input task (dedicated thread for the blocking crossterm poll).
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                if let Ok(ev) = event::read() {
                    let sent = match ev {
                        Event::Key(key) => ui_tx.send(UiEvent::Key(key)),
                        Event::Resize(_, _) => ui_tx.send(UiEvent::Resize),
                        _ => Ok(()),
                    };
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    });

    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
    terminal.clear()?;

    loop {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            // A frame was presented.
            Ok(()) = frame_rx.changed() => {
                app.pixels = frame_rx.borrow_and_update().clone();
            }

            // Counters moved.
            Ok(()) = stats_rx.changed() => {
                app.stats = stats_rx.borrow_and_update().clone();
            }

            // Keyboard.
            Some(ev) = ui_rx.recv() => {
                if let UiEvent::Key(key) = ev {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.exit = true,
                            KeyCode::Char('c')
                                if key.modifiers.contains(KeyModifiers::CONTROL) =>
                            {
                                app.exit = true;
                            }
                            _ => {}
                        }
                    }
                }
            }

            // Redraw cadence while the link is quiet.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }

        if app.exit || !alive.load(Ordering::SeqCst) {
            break;
        }
    }

    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;

    Ok(())
}
