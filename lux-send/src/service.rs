//! Pattern streaming service.
//!
//! Drives the send side of the pipeline: render a test pattern,
//! encode it for the wire, chunk it into datagrams, pace to the
//! target frame rate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use lux_core::{FrameSender, LuxError, PixelEncoding, Rgb, encode_into};

use crate::pattern::PatternGen;

/// Streams generated frames to one panel until stopped.
pub struct PatternService {
    sender: FrameSender,
    pattern: PatternGen,
    encoding: PixelEncoding,
    fps: f64,
    running: Arc<AtomicBool>,
    pixels: Vec<Rgb>,
    wire: Vec<u8>,
}

impl PatternService {
    pub fn new(
        sender: FrameSender,
        pattern: PatternGen,
        encoding: PixelEncoding,
        fps: f64,
    ) -> Self {
        let pixel_count = pattern.pixel_count();
        Self {
            sender,
            pattern,
            encoding,
            fps,
            running: Arc::new(AtomicBool::new(false)),
            pixels: vec![Rgb::BLACK; pixel_count],
            wire: vec![0u8; pixel_count * encoding.bytes_per_pixel()],
        }
    }

    /// A cloneable handle that can stop the stream from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal the stream to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the stream loop is live.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the stream loop until the stop handle flips.
    pub async fn run(&mut self) -> Result<(), LuxError> {
        self.running.store(true, Ordering::SeqCst);
        let frame_interval = Duration::from_secs_f64(1.0 / self.fps);
        let mut last_report = Instant::now();

        info!(
            target = %self.sender.target(),
            encoding = %self.encoding,
            fps = self.fps,
            frame_bytes = self.wire.len(),
            "pattern stream running"
        );

        while self.running.load(Ordering::SeqCst) {
            let loop_start = Instant::now();

            // 1. Render the next frame.
            self.pattern.next_frame(&mut self.pixels);

            // 2. Encode for the wire.
            encode_into(&self.pixels, self.encoding, &mut self.wire);

            // 3. Chunk and send.
            self.sender.send_frame(&self.wire).await?;

            // Periodic summary.
            if last_report.elapsed() >= Duration::from_secs(5) {
                info!(
                    frames = self.sender.frames_sent(),
                    bytes = self.sender.bytes_sent(),
                    "streaming"
                );
                last_report = Instant::now();
            }

            // 4. Frame pacing.
            Self::pace(loop_start, frame_interval).await;
        }

        info!(frames = self.sender.frames_sent(), "pattern stream stopped");
        Ok(())
    }

    /// Sleep for the remainder of the frame interval.
    async fn pace(loop_start: Instant, interval: Duration) {
        let elapsed = loop_start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
}
