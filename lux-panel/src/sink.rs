//! Terminal display sink.
//!
//! Owns the double buffer and hands each presented frame to the TUI
//! through a `tokio::sync::watch` channel. The tick loop never waits
//! on rendering; the drawing task picks up whatever frame is newest
//! and silently skips the ones it missed.

use lux_core::{DisplaySink, LuxError, Rgb};
use tokio::sync::watch;

/// A [`DisplaySink`] whose "screen" is a watch channel.
pub struct TerminalSink {
    width: usize,
    height: usize,
    front: Vec<Rgb>,
    back: Vec<Rgb>,
    frame_tx: watch::Sender<Vec<Rgb>>,
    frame_rx: watch::Receiver<Vec<Rgb>>,
    presents: u64,
}

impl TerminalSink {
    pub fn new(width: usize, height: usize) -> Self {
        let black = vec![Rgb::BLACK; width * height];
        let (frame_tx, frame_rx) = watch::channel(black.clone());
        Self {
            width,
            height,
            front: black.clone(),
            back: black,
            frame_tx,
            frame_rx,
            presents: 0,
        }
    }

    /// Obtain a `watch::Receiver` carrying the latest presented frame.
    pub fn frame_receiver(&self) -> watch::Receiver<Vec<Rgb>> {
        self.frame_rx.clone()
    }

    /// Completed swaps so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl DisplaySink for TerminalSink {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn back_buffer(&mut self) -> &mut [Rgb] {
        &mut self.back
    }

    fn present(&mut self) -> Result<(), LuxError> {
        std::mem::swap(&mut self.front, &mut self.back);
        self.presents += 1;
        // Both channel ends live here, so send cannot fail.
        let _ = self.frame_tx.send(self.front.clone());
        Ok(())
    }
}
