//! Display sink trait and the in-memory double buffer.
//!
//! A sink owns two pixel buffers: the front buffer is what is currently
//! visible, the back buffer is where the decoder writes the next frame.
//! [`present`](DisplaySink::present) swaps them. The decoder therefore
//! never touches pixels that are being displayed.

use crate::error::LuxError;
use crate::pixel::Rgb;

// ── DisplaySink ──────────────────────────────────────────────────

/// Presentation target for decoded frames.
///
/// Implementations range from a real panel driver to the in-memory
/// [`MemorySink`] used for tests and headless runs.
pub trait DisplaySink {
    /// Panel width in pixels.
    fn width(&self) -> usize;

    /// Panel height in pixels.
    fn height(&self) -> usize;

    /// Total pixels per frame.
    fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// The writable back buffer, row-major, `pixel_count()` long.
    fn back_buffer(&mut self) -> &mut [Rgb];

    /// Swap front and back buffers and make the new front visible.
    fn present(&mut self) -> Result<(), LuxError>;
}

// ── MemorySink ───────────────────────────────────────────────────

/// Double-buffered sink with no output device.
///
/// Serves headless runs and tests; the front buffer is readable so
/// callers can assert on what a present made visible.
pub struct MemorySink {
    width: usize,
    height: usize,
    front: Vec<Rgb>,
    back: Vec<Rgb>,
    presents: u64,
}

impl MemorySink {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            front: vec![Rgb::BLACK; width * height],
            back: vec![Rgb::BLACK; width * height],
            presents: 0,
        }
    }

    /// The currently visible buffer.
    pub fn front(&self) -> &[Rgb] {
        &self.front
    }

    /// How many times `present` has run.
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl DisplaySink for MemorySink {
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_swaps_front_and_back() {
        let mut sink = MemorySink::new(2, 1);
        sink.back_buffer()[0] = Rgb::new(1, 2, 3);
        sink.back_buffer()[1] = Rgb::new(4, 5, 6);

        // Nothing visible until the swap.
        assert_eq!(sink.front(), &[Rgb::BLACK, Rgb::BLACK]);

        sink.present().unwrap();
        assert_eq!(sink.front(), &[Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]);
        assert_eq!(sink.presents(), 1);
    }

    #[test]
    fn writes_after_present_leave_front_intact() {
        let mut sink = MemorySink::new(1, 1);
        sink.back_buffer()[0] = Rgb::new(9, 9, 9);
        sink.present().unwrap();

        sink.back_buffer()[0] = Rgb::new(1, 1, 1);
        assert_eq!(sink.front()[0], Rgb::new(9, 9, 9));
    }

    #[test]
    fn pixel_count_is_width_times_height() {
        let sink = MemorySink::new(16, 16);
        assert_eq!(sink.pixel_count(), 256);
    }
}
