//! Chunk framing for pixel-frame datagrams.
//!
//! A frame is split into fixed-stride chunks, one UDP datagram each.
//! There is no magic number, version byte, or checksum; the link is
//! assumed private and best-effort, and a damaged frame simply never
//! completes.
//!
//! ## Wire format
//!
//! **Chunk datagram** (2 byte header + payload):
//! ```text
//! byte 0:     chunk_index   u8   (0-based)
//! byte 1:     total_chunks  u8   (1-based count for this frame)
//! bytes 2..:  payload       [u8] (≤ CHUNK_PAYLOAD; shorter only for
//!                                 the final chunk of a frame)
//! ```

use bytes::Bytes;

use crate::error::LuxError;

// ── Constants ────────────────────────────────────────────────────

/// Fixed chunk payload stride. Chunk `i` lands at byte offset
/// `i * CHUNK_PAYLOAD` of the frame; only the final chunk may carry
/// fewer bytes.
pub const CHUNK_PAYLOAD: usize = 1024;

/// Maximum chunks per frame (the receive mask is a `u64`).
pub const MAX_CHUNKS: usize = 64;

/// Largest datagram the protocol produces.
pub const MAX_DATAGRAM: usize = ChunkHeader::SIZE + CHUNK_PAYLOAD;

// ── ChunkHeader ──────────────────────────────────────────────────

/// The 2-byte header prepended to every chunk datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// 0-based chunk index within the frame.
    pub index: u8,
    /// Total chunks in the frame this chunk belongs to.
    pub total: u8,
}

impl ChunkHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 2;

    /// Serialize to bytes.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        [self.index, self.total]
    }

    /// Deserialize from the front of a datagram.
    pub fn decode(data: &[u8]) -> Result<Self, LuxError> {
        if data.len() < Self::SIZE {
            return Err(LuxError::TruncatedDatagram {
                len: data.len(),
                header: Self::SIZE,
            });
        }
        Ok(Self {
            index: data[0],
            total: data[1],
        })
    }
}

// ── Chunk ────────────────────────────────────────────────────────

/// One parsed chunk datagram.
///
/// Transient: consumed into the frame buffer immediately, never
/// retained. The payload is a zero-copy slice of the datagram.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 0-based chunk index within the frame.
    pub index: u8,
    /// Total chunks in this chunk's frame.
    pub total: u8,
    /// Chunk payload bytes.
    pub payload: Bytes,
}

impl Chunk {
    /// Parse a raw datagram into a chunk.
    ///
    /// Only framing is checked here; semantic validation (index range,
    /// payload bounds) happens in the assembler.
    pub fn parse(datagram: Bytes) -> Result<Self, LuxError> {
        let header = ChunkHeader::decode(&datagram)?;
        Ok(Self {
            index: header.index,
            total: header.total,
            payload: datagram.slice(ChunkHeader::SIZE..),
        })
    }

    /// Serialize back into a datagram (header + payload).
    pub fn to_datagram(&self) -> Vec<u8> {
        let header = ChunkHeader {
            index: self.index,
            total: self.total,
        };
        let mut pkt = Vec::with_capacity(ChunkHeader::SIZE + self.payload.len());
        pkt.extend_from_slice(&header.encode());
        pkt.extend_from_slice(&self.payload);
        pkt
    }
}

// ── Frame splitting (sender side) ────────────────────────────────

/// Number of chunks a frame of `frame_len` bytes occupies.
pub const fn chunk_count(frame_len: usize) -> usize {
    frame_len.div_ceil(CHUNK_PAYLOAD)
}

/// Split a frame into ready-to-send chunk datagrams.
///
/// Every datagram carries the full stride except the last, which takes
/// the remainder.
pub fn split_frame(frame: &[u8]) -> Result<Vec<Vec<u8>>, LuxError> {
    if frame.is_empty() {
        return Err(LuxError::InvalidGeometry("cannot split an empty frame"));
    }
    let total = chunk_count(frame.len());
    if total > MAX_CHUNKS {
        return Err(LuxError::FrameTooLarge {
            size: frame.len(),
            chunks: total,
            max: MAX_CHUNKS,
        });
    }

    let mut datagrams = Vec::with_capacity(total);
    for (index, payload) in frame.chunks(CHUNK_PAYLOAD).enumerate() {
        let header = ChunkHeader {
            index: index as u8,
            total: total as u8,
        };
        let mut pkt = Vec::with_capacity(ChunkHeader::SIZE + payload.len());
        pkt.extend_from_slice(&header.encode());
        pkt.extend_from_slice(payload);
        datagrams.push(pkt);
    }
    Ok(datagrams)
}
