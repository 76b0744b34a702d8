//! Test-pattern generators.
//!
//! Three frame sources, picked from the command line:
//!
//! - `sparkle`: light one dim random pixel per frame, walking the
//!   panel linearly and blanking it after each full sweep. The stock
//!   demo animation.
//! - `gradient`: a static coordinate plot, red rising along x, green
//!   along y, blue at half scale everywhere.
//! - `solid`: every pixel the same color.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lux_core::Rgb;

// ── PatternKind ──────────────────────────────────────────────────

/// Which generator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Sparkle,
    Gradient,
    Solid,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Sparkle => write!(f, "sparkle"),
            PatternKind::Gradient => write!(f, "gradient"),
            PatternKind::Solid => write!(f, "solid"),
        }
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparkle" => Ok(PatternKind::Sparkle),
            "gradient" => Ok(PatternKind::Gradient),
            "solid" => Ok(PatternKind::Solid),
            other => Err(format!("unknown pattern: {other}")),
        }
    }
}

// ── PatternGen ───────────────────────────────────────────────────

/// Stateful frame source; call [`next_frame`](Self::next_frame) once
/// per outgoing frame.
pub struct PatternGen {
    kind: PatternKind,
    width: usize,
    height: usize,
    color: Rgb,
    frame: u64,
    rng: StdRng,
}

impl PatternGen {
    pub fn new(kind: PatternKind, width: usize, height: usize, color: Rgb) -> Self {
        Self {
            kind,
            width,
            height,
            color,
            frame: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Pixels per frame.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Render the next frame in place.
    ///
    /// `pixels` keeps its contents between calls; sparkle accumulates
    /// dots on whatever is already there.
    pub fn next_frame(&mut self, pixels: &mut [Rgb]) {
        match self.kind {
            PatternKind::Sparkle => self.sparkle(pixels),
            PatternKind::Gradient => self.gradient(pixels),
            PatternKind::Solid => pixels.fill(self.color),
        }
        self.frame += 1;
    }

    fn sparkle(&mut self, pixels: &mut [Rgb]) {
        if pixels.is_empty() {
            return;
        }
        let slot = (self.frame % pixels.len() as u64) as usize;
        if slot == 0 {
            pixels.fill(Rgb::BLACK);
        }
        pixels[slot] = Rgb::new(
            self.rng.gen_range(0..100),
            self.rng.gen_range(0..100),
            self.rng.gen_range(0..100),
        );
    }

    fn gradient(&self, pixels: &mut [Rgb]) {
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = i % self.width;
            let y = i / self.width;
            *px = Rgb::new(((x * 8) & 0xFF) as u8, ((y * 8) & 0xFF) as u8, 128);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r#gen(kind: PatternKind) -> PatternGen {
        PatternGen::new(kind, 32, 32, Rgb::new(200, 100, 50))
    }

    #[test]
    fn solid_fills_every_pixel() {
        let mut g = r#gen(PatternKind::Solid);
        let mut px = vec![Rgb::BLACK; g.pixel_count()];
        g.next_frame(&mut px);
        assert!(px.iter().all(|&p| p == Rgb::new(200, 100, 50)));
    }

    #[test]
    fn gradient_matches_the_coordinate_plot() {
        let mut g = r#gen(PatternKind::Gradient);
        let mut px = vec![Rgb::BLACK; g.pixel_count()];
        g.next_frame(&mut px);
        assert_eq!(px[0], Rgb::new(0, 0, 128));
        // x = 5, y = 2.
        assert_eq!(px[2 * 32 + 5], Rgb::new(40, 16, 128));
        // Rightmost column of the top row.
        assert_eq!(px[31], Rgb::new(248, 0, 128));
    }

    #[test]
    fn sparkle_walks_one_pixel_per_frame() {
        let mut g = r#gen(PatternKind::Sparkle);
        let mut px = vec![Rgb::BLACK; g.pixel_count()];

        g.next_frame(&mut px);
        // Frame 0 touches only the first pixel, and dimly.
        assert!(px[1..].iter().all(|&p| p == Rgb::BLACK));
        assert!(px[0].r < 100 && px[0].g < 100 && px[0].b < 100);

        g.next_frame(&mut px);
        // Frame 1 lights the second; the first stays put.
        assert!(px[2..].iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn sparkle_blanks_after_a_full_sweep() {
        let mut g = PatternGen::new(PatternKind::Sparkle, 2, 2, Rgb::BLACK);
        let mut px = vec![Rgb::BLACK; 4];
        for _ in 0..4 {
            g.next_frame(&mut px);
        }
        // The wrap-around frame clears the sweep's leftovers.
        g.next_frame(&mut px);
        assert!(px[1..].iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn kind_from_str() {
        assert_eq!(
            "sparkle".parse::<PatternKind>().unwrap(),
            PatternKind::Sparkle
        );
        assert_eq!(
            "GRADIENT".parse::<PatternKind>().unwrap(),
            PatternKind::Gradient
        );
        assert!("plaid".parse::<PatternKind>().is_err());
    }
}
