//! Domain-specific error types for the lux protocol.
//!
//! All fallible operations return `Result<T, LuxError>`.
//! Per-datagram problems (bad header fields, out-of-bounds writes) are
//! *not* errors; they surface as [`FrameStatus::Rejected`] and the
//! offending datagram is discarded. Only conditions that stop the
//! receiver (bad configuration, a dead socket) live here.
//!
//! [`FrameStatus::Rejected`]: crate::assembler::FrameStatus::Rejected

use thiserror::Error;

/// The canonical error type for the lux protocol.
#[derive(Debug, Error)]
pub enum LuxError {
    // ── Configuration Errors ─────────────────────────────────────
    /// The frame buffer and the display sink disagree on geometry.
    ///
    /// Checked once at receiver construction; the tick loop never
    /// starts when this fires.
    #[error(
        "configuration mismatch: frame is {frame_bytes} bytes, sink needs {expected} \
         ({pixels} pixels at {bpp} bytes each)"
    )]
    ConfigMismatch {
        frame_bytes: usize,
        expected: usize,
        pixels: usize,
        bpp: usize,
    },

    /// A dimension or size parameter that can never work.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    /// The frame would need more chunks than the mask can track.
    #[error("frame too large: {size} bytes needs {chunks} chunks (max {max})")]
    FrameTooLarge {
        size: usize,
        chunks: usize,
        max: usize,
    },

    // ── Datagram Errors ──────────────────────────────────────────
    /// A datagram shorter than the 2-byte chunk header.
    #[error("truncated datagram: {len} bytes (header is {header})")]
    TruncatedDatagram { len: usize, header: usize },

    // ── Transport Errors ─────────────────────────────────────────
    /// The UDP/IO layer reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A watch or mpsc channel closed while the run loop was live.
    #[error("channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = LuxError::ConfigMismatch {
            frame_bytes: 6144,
            expected: 4096,
            pixels: 2048,
            bpp: 2,
        };
        assert!(e.to_string().contains("6144"));
        assert!(e.to_string().contains("4096"));

        let e = LuxError::FrameTooLarge {
            size: 100_000,
            chunks: 98,
            max: 64,
        };
        assert!(e.to_string().contains("98"));
        assert!(e.to_string().contains("64"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: LuxError = io_err.into();
        assert!(matches!(e, LuxError::Transport(_)));
    }
}
