//! Pixel encodings and the frame-buffer decode step.
//!
//! Incoming frames carry one of two encodings, selected by configuration
//! and fixed for the lifetime of a receiver:
//!
//! **Raw24** (3 bytes per pixel):
//! ```text
//! byte 0: red
//! byte 1: green
//! byte 2: blue
//! ```
//!
//! **Packed565** (2 bytes per pixel, big-endian u16):
//! ```text
//! bits 15..11: red   (5 bits)
//! bits 10..5:  green (6 bits)
//! bits  4..0:  blue  (5 bits)
//! ```
//!
//! Packed channels are widened to 8 bits by left-shifting into the high
//! bits (`r5 << 3`, `g6 << 2`, `b5 << 3`); low bits are zero-filled, not
//! replicated, so full-scale 565 white decodes to (248, 252, 248).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Rgb ──────────────────────────────────────────────────────────

/// One pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// ── PixelEncoding ────────────────────────────────────────────────

/// Wire encoding of incoming pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelEncoding {
    /// 2 bytes per pixel, big-endian 5-6-5.
    Packed565,
    /// 3 bytes per pixel, direct R, G, B.
    Raw24,
}

impl PixelEncoding {
    /// Bytes consumed by a single pixel in this encoding.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelEncoding::Packed565 => 2,
            PixelEncoding::Raw24 => 3,
        }
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelEncoding::Packed565 => write!(f, "packed565"),
            PixelEncoding::Raw24 => write!(f, "raw24"),
        }
    }
}

impl FromStr for PixelEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "packed565" | "565" | "16" => Ok(PixelEncoding::Packed565),
            "raw24" | "rgb" | "24" => Ok(PixelEncoding::Raw24),
            other => Err(format!("unknown pixel encoding: {other}")),
        }
    }
}

// ── Packed 5-6-5 helpers ─────────────────────────────────────────

/// Widen a big-endian packed 5-6-5 value to 8-bit channels.
pub const fn unpack565(raw: u16) -> Rgb {
    Rgb {
        r: (((raw >> 11) & 0x1F) as u8) << 3,
        g: (((raw >> 5) & 0x3F) as u8) << 2,
        b: ((raw & 0x1F) as u8) << 3,
    }
}

/// Pack 8-bit channels into 5-6-5, truncating low bits.
pub const fn pack565(px: Rgb) -> u16 {
    ((px.r as u16 & 0xF8) << 8) | ((px.g as u16 & 0xFC) << 3) | (px.b as u16 >> 3)
}

// ── Decode / encode ──────────────────────────────────────────────

/// Decode a completed frame buffer into a pixel slice.
///
/// Pure over the bytes: linear pixel `i` maps to row-major
/// `(i % width, i / width)` in the destination. Sizes are validated
/// once at receiver construction, not here; if the slices disagree the
/// shorter one bounds the work.
pub fn decode_into(frame: &[u8], encoding: PixelEncoding, out: &mut [Rgb]) {
    match encoding {
        PixelEncoding::Raw24 => {
            for (px, bytes) in out.iter_mut().zip(frame.chunks_exact(3)) {
                *px = Rgb::new(bytes[0], bytes[1], bytes[2]);
            }
        }
        PixelEncoding::Packed565 => {
            for (px, bytes) in out.iter_mut().zip(frame.chunks_exact(2)) {
                *px = unpack565(u16::from_be_bytes([bytes[0], bytes[1]]));
            }
        }
    }
}

/// Encode a pixel slice into wire bytes (the sender-side inverse).
pub fn encode_into(pixels: &[Rgb], encoding: PixelEncoding, out: &mut [u8]) {
    match encoding {
        PixelEncoding::Raw24 => {
            for (bytes, px) in out.chunks_exact_mut(3).zip(pixels) {
                bytes[0] = px.r;
                bytes[1] = px.g;
                bytes[2] = px.b;
            }
        }
        PixelEncoding::Packed565 => {
            for (bytes, px) in out.chunks_exact_mut(2).zip(pixels) {
                bytes.copy_from_slice(&pack565(*px).to_be_bytes());
            }
        }
    }
}
