//! # lux-core
//!
//! Core protocol library for lux, a chunked-datagram pixel streamer
//! for LED matrix panels and their stand-ins.
//!
//! This crate contains:
//! - **Wire**: the 2-byte chunk header, frame splitting, size constants
//! - **Assembler**: `FrameAssembler`, single-slot out-of-order frame
//!   reassembly with a `u64` chunk mask
//! - **Pixel**: `PixelEncoding` (Packed565 / Raw24) and the pure
//!   decode/encode passes
//! - **Transport**: the non-blocking `Transport` trait, `UdpTransport`,
//!   and the sending `FrameSender`
//! - **Sink**: the `DisplaySink` trait and the double-buffered
//!   `MemorySink`
//! - **Receiver**: `FrameReceiver`, the tick driver wiring poll →
//!   accept → decode → present, plus its async run loop and stats
//! - **Error**: `LuxError`, the typed `thiserror`-based error hierarchy

pub mod assembler;
pub mod error;
pub mod pixel;
pub mod receiver;
pub mod sink;
pub mod transport;
pub mod wire;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use assembler::{AssemblerStats, FrameAssembler, FrameStatus, RejectReason};
pub use error::LuxError;
pub use pixel::{PixelEncoding, Rgb, decode_into, encode_into, pack565, unpack565};
pub use receiver::{FrameReceiver, ReceiverStats, TickEvent};
pub use sink::{DisplaySink, MemorySink};
pub use transport::{Datagram, FrameSender, Transport, UdpTransport};
pub use wire::{CHUNK_PAYLOAD, Chunk, ChunkHeader, MAX_CHUNKS, MAX_DATAGRAM, split_frame};
