//! Test-pattern sender entry point.
//!
//! ```text
//! lux-send --target 192.168.1.103:44444
//! lux-send --target <addr> --pattern gradient --encoding raw24
//! lux-send --target <addr> --pattern solid --color 255,64,0 --fps 30
//! ```

use std::net::SocketAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lux_core::{FrameSender, PixelEncoding, Rgb};

use lux_send::pattern::{PatternGen, PatternKind};
use lux_send::service::PatternService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lux-send", about = "Chunked-UDP test pattern sender for LED matrices")]
struct Cli {
    /// Panel address. Example: 192.168.1.103:44444
    #[arg(short, long)]
    target: SocketAddr,

    /// Panel width in pixels.
    #[arg(long, default_value_t = 32)]
    width: usize,

    /// Panel height in pixels.
    #[arg(long, default_value_t = 32)]
    height: usize,

    /// Wire pixel encoding (packed565, raw24).
    #[arg(short, long, default_value = "packed565")]
    encoding: PixelEncoding,

    /// Frames per second.
    #[arg(short, long, default_value_t = 20.0)]
    fps: f64,

    /// Pattern to stream (sparkle, gradient, solid).
    #[arg(short, long, default_value = "sparkle")]
    pattern: PatternKind,

    /// Color for the solid pattern, as "R,G,B".
    #[arg(long, default_value = "255,255,255", value_parser = parse_color)]
    color: Rgb,
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("expected R,G,B".into());
    }
    let chan = |p: &str| {
        p.trim()
            .parse::<u8>()
            .map_err(|e| format!("bad channel {p:?}: {e}"))
    };
    Ok(Rgb::new(chan(parts[0])?, chan(parts[1])?, chan(parts[2])?))
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("lux-send v{}", env!("CARGO_PKG_VERSION"));

    // Catches zero and NaN before the interval math does.
    if !(cli.fps > 0.0) {
        return Err("fps must be positive".into());
    }

    let sender = FrameSender::connect(cli.target).await?;
    let pattern = PatternGen::new(cli.pattern, cli.width, cli.height, cli.color);
    let mut service = PatternService::new(sender, pattern, cli.encoding, cli.fps);
    let stop = service.stop_handle();

    // Ctrl-C handler.
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("ctrl-c received; shutting down");
        stop_clone.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    service.run().await?;

    Ok(())
}
