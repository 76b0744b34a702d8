//! The receive-side tick driver.
//!
//! Ties the pipeline together, one datagram per tick:
//!
//! ```text
//! transport.poll() ──► assembler.accept() ──► [Complete?]
//!                                                │
//!                        decode into back buffer ◄┘
//!                        assembler.reset()
//!                        sink.present()
//! ```
//!
//! The ordering is the load-bearing part: decode writes only the back
//! buffer, the swap happens after the reset, so the frame on screen is
//! never half-overwritten by the one being assembled.
//!
//! [`FrameReceiver::tick`] is synchronous and never suspends; the async
//! [`run`](FrameReceiver::run) wrapper owns the cadence (drain bursts,
//! sleep when idle), applies the staleness policy, and publishes
//! [`ReceiverStats`] through a `tokio::sync::watch` channel for UIs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::assembler::{FrameAssembler, FrameStatus, RejectReason};
use crate::error::LuxError;
use crate::pixel::{PixelEncoding, decode_into};
use crate::sink::DisplaySink;
use crate::transport::Transport;
use crate::wire::Chunk;

/// Idle sleep between polls when the socket has nothing for us.
const POLL_IDLE: Duration = Duration::from_millis(1);

/// Present intervals kept for the fps estimate.
const FPS_WINDOW: usize = 60;

// ── TickEvent ────────────────────────────────────────────────────

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// No datagram was waiting.
    Idle,
    /// A chunk was buffered; the frame is still incomplete.
    Buffered,
    /// The datagram was discarded.
    Rejected(RejectReason),
    /// A frame completed, was decoded, and is now on screen.
    Presented,
}

// ── ReceiverStats ────────────────────────────────────────────────

/// Live counters exposed to the surrounding application.
#[derive(Debug, Clone, Default)]
pub struct ReceiverStats {
    /// Smoothed frames per second over a sliding window.
    pub fps: f64,
    /// Frames decoded and presented.
    pub frames_presented: u64,
    /// Partial frames cleared by the staleness timeout.
    pub frames_expired: u64,
    /// Chunks accepted into the frame buffer.
    pub chunks_accepted: u64,
    /// Datagrams discarded (malformed, out of bounds, truncated).
    pub chunks_rejected: u64,
    /// Chunks that re-wrote an already-filled slot.
    pub duplicates: u64,
    /// Raw bytes taken off the socket.
    pub bytes_received: u64,
    /// Address of the most recent sender.
    pub source: Option<SocketAddr>,
}

// ── FrameReceiver ────────────────────────────────────────────────

/// Receives chunk datagrams, reassembles frames, and presents them.
///
/// Owns the transport, the assembler, and the sink exclusively; there
/// is no locking anywhere in the pipeline. Construction verifies that
/// the frame buffer, the pixel encoding, and the sink agree on
/// geometry, the one configuration error this protocol can detect.
pub struct FrameReceiver<T, S> {
    transport: T,
    sink: S,
    assembler: FrameAssembler,
    encoding: PixelEncoding,
    running: Arc<AtomicBool>,
    stats_tx: watch::Sender<ReceiverStats>,
    stats_rx: watch::Receiver<ReceiverStats>,
    fps: f64,
    frames_presented: u64,
    truncated: u64,
    bytes_received: u64,
    last_source: Option<SocketAddr>,
}

impl<T: Transport, S: DisplaySink> FrameReceiver<T, S> {
    /// Wire up the pipeline.
    ///
    /// Fails with [`LuxError::ConfigMismatch`] when the assembler's
    /// frame size is not exactly `sink pixels × bytes per pixel`; the
    /// tick loop must not start on a mismatched pipeline.
    pub fn new(
        transport: T,
        sink: S,
        assembler: FrameAssembler,
        encoding: PixelEncoding,
    ) -> Result<Self, LuxError> {
        let pixels = sink.pixel_count();
        if pixels == 0 {
            return Err(LuxError::InvalidGeometry("display sink has zero pixels"));
        }
        let bpp = encoding.bytes_per_pixel();
        let expected = pixels * bpp;
        if assembler.frame_len() != expected {
            return Err(LuxError::ConfigMismatch {
                frame_bytes: assembler.frame_len(),
                expected,
                pixels,
                bpp,
            });
        }

        let (stats_tx, stats_rx) = watch::channel(ReceiverStats::default());
        Ok(Self {
            transport,
            sink,
            assembler,
            encoding,
            running: Arc::new(AtomicBool::new(false)),
            stats_tx,
            stats_rx,
            fps: 0.0,
            frames_presented: 0,
            truncated: 0,
            bytes_received: 0,
            last_source: None,
        })
    }

    /// Process at most one datagram. See [`tick_at`](Self::tick_at).
    pub fn tick(&mut self) -> Result<TickEvent, LuxError> {
        self.tick_at(Instant::now())
    }

    /// Process at most one datagram, with an explicit clock for the
    /// staleness policy.
    ///
    /// Bounded, run-to-completion, no suspension points. Errors are
    /// only the unrecoverable kind (socket death, sink failure);
    /// malformed traffic comes back as [`TickEvent::Rejected`].
    pub fn tick_at(&mut self, now: Instant) -> Result<TickEvent, LuxError> {
        // A stalled partial frame expires even while the link is quiet.
        self.assembler.expire_stale(now);

        // 1. Poll the transport.
        let Some(datagram) = self.transport.poll()? else {
            return Ok(TickEvent::Idle);
        };
        self.bytes_received += datagram.payload.len() as u64;
        self.last_source = Some(datagram.source);

        // 2. Split header from payload.
        let chunk = match Chunk::parse(datagram.payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(source = %datagram.source, error = %e, "discarding datagram");
                self.truncated += 1;
                return Ok(TickEvent::Rejected(RejectReason::MalformedHeader));
            }
        };

        // 3. Accumulate.
        match self.assembler.accept_at(chunk, now) {
            FrameStatus::Incomplete => Ok(TickEvent::Buffered),
            FrameStatus::Rejected(reason) => Ok(TickEvent::Rejected(reason)),
            FrameStatus::Complete => {
                // 4. Decode into the back buffer.
                decode_into(self.assembler.frame(), self.encoding, self.sink.back_buffer());
                // 5. Release the slot for the next frame.
                self.assembler.reset();
                // 6. Swap buffers; the new frame becomes visible.
                self.sink.present()?;
                self.frames_presented += 1;
                debug!(frames = self.frames_presented, "frame presented");
                Ok(TickEvent::Presented)
            }
        }
    }

    /// Run the tick loop until the stop handle flips.
    ///
    /// Drains datagram bursts back-to-back and sleeps briefly when the
    /// socket is idle. Publishes stats after every non-idle tick.
    pub async fn run(&mut self) -> Result<(), LuxError> {
        self.running.store(true, Ordering::SeqCst);
        info!(
            encoding = %self.encoding,
            pixels = self.sink.pixel_count(),
            frame_bytes = self.assembler.frame_len(),
            chunks = self.assembler.capacity(),
            "receiver running"
        );

        let mut fps_samples: Vec<Duration> = Vec::with_capacity(FPS_WINDOW * 2);
        let mut last_present = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            match self.tick()? {
                TickEvent::Idle => {
                    tokio::time::sleep(POLL_IDLE).await;
                }
                TickEvent::Presented => {
                    let now = Instant::now();
                    fps_samples.push(now.duration_since(last_present));
                    last_present = now;
                    if fps_samples.len() > FPS_WINDOW {
                        fps_samples.remove(0);
                    }
                    let avg = fps_samples.iter().map(|d| d.as_secs_f64()).sum::<f64>()
                        / fps_samples.len() as f64;
                    self.fps = if avg > 0.0 { 1.0 / avg } else { 0.0 };
                    self.publish_stats();
                }
                TickEvent::Buffered | TickEvent::Rejected(_) => {
                    self.publish_stats();
                }
            }
        }

        info!("receiver stopped");
        Ok(())
    }

    /// A cloneable stop handle; store `false` to end [`run`](Self::run).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal the run loop to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the run loop is live.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Obtain a `watch::Receiver` for live stats.
    pub fn stats_receiver(&self) -> watch::Receiver<ReceiverStats> {
        self.stats_rx.clone()
    }

    /// Current counters, assembled on demand.
    pub fn stats(&self) -> ReceiverStats {
        let a = self.assembler.stats();
        ReceiverStats {
            fps: self.fps,
            frames_presented: self.frames_presented,
            frames_expired: a.expired,
            chunks_accepted: a.accepted,
            chunks_rejected: a.rejected + self.truncated,
            duplicates: a.duplicates,
            bytes_received: self.bytes_received,
            source: self.last_source,
        }
    }

    /// Whether a partial frame is currently being assembled.
    pub fn in_progress(&self) -> bool {
        self.assembler.in_progress()
    }

    /// The sink, for reading what was presented.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The configured incoming pixel encoding.
    pub fn encoding(&self) -> PixelEncoding {
        self.encoding
    }

    fn publish_stats(&self) {
        let _ = self.stats_tx.send(self.stats());
    }
}
