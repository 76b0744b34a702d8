//! Single-slot frame reassembly.
//!
//! The assembler owns one frame-sized byte buffer and a `u64` bitmask of
//! which chunks have landed. Chunks arrive in any order, may duplicate,
//! and may vanish; the assembler accumulates them until every index
//! `0..total` of some datagram's `total` is present, then reports
//! [`FrameStatus::Complete`] and leaves the buffer untouched for the
//! decoder. The caller resets the mask afterwards, never the buffer;
//! its bytes are simply overwritten by the next frame.
//!
//! There is no per-frame generation number on the wire, so a partially
//! received frame is implicitly abandoned when later traffic overwrites
//! its slots (last writer wins). An optional staleness timeout clears
//! long-stalled partial frames; it is off unless configured.
//!
//! Malformed or out-of-bounds chunks are discarded with zero state
//! change. The bounds check before every copy is the safety-critical
//! property of the whole protocol: a hostile or corrupt datagram must
//! never write outside the frame buffer.

use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::error::LuxError;
use crate::wire::{CHUNK_PAYLOAD, Chunk, MAX_CHUNKS, chunk_count};

// ── FrameStatus ──────────────────────────────────────────────────

/// Outcome of feeding one chunk to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Chunk accepted, frame not yet complete.
    Incomplete,
    /// Chunk accepted and every chunk of the frame is now present.
    /// The caller must [`reset`](FrameAssembler::reset) after reading
    /// the buffer; completion does not reset implicitly.
    Complete,
    /// Chunk discarded; buffer and mask are untouched.
    Rejected(RejectReason),
}

/// Why a chunk was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Bad header fields: zero or out-of-capacity total, index not
    /// below total, or an empty payload.
    MalformedHeader,
    /// The payload exceeds the chunk stride or the copy would run past
    /// the end of the frame buffer.
    BufferOverrun,
}

// ── AssemblerStats ───────────────────────────────────────────────

/// Diagnostic counters, monotonic since construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblerStats {
    /// Chunks copied into a previously empty slot.
    pub accepted: u64,
    /// Chunks re-copied over an already-filled slot.
    pub duplicates: u64,
    /// Chunks discarded by validation.
    pub rejected: u64,
    /// Frames completed.
    pub completed: u64,
    /// Partial frames cleared by the staleness timeout.
    pub expired: u64,
}

// ── FrameAssembler ───────────────────────────────────────────────

/// Reassembles one frame at a time from chunk datagrams.
///
/// The buffer and mask are a single reusable slot allocated once at
/// construction; the hot path is allocation-free.
pub struct FrameAssembler {
    /// Frame bytes, fixed length, never resized.
    frame: Vec<u8>,
    /// Bit `i` set ⇔ chunk `i` of the current frame has been written.
    mask: u64,
    /// Chunks this frame occupies; headers beyond it can never
    /// complete and are rejected outright.
    capacity: usize,
    /// When the first chunk of the in-progress frame arrived.
    started_at: Option<Instant>,
    /// Clear a partial frame older than this. `None` disables expiry.
    stale_after: Option<Duration>,
    stats: AssemblerStats,
}

impl FrameAssembler {
    /// Create an assembler for frames of exactly `frame_len` bytes.
    pub fn new(frame_len: usize) -> Result<Self, LuxError> {
        if frame_len == 0 {
            return Err(LuxError::InvalidGeometry("frame buffer cannot be empty"));
        }
        let capacity = chunk_count(frame_len);
        if capacity > MAX_CHUNKS {
            return Err(LuxError::FrameTooLarge {
                size: frame_len,
                chunks: capacity,
                max: MAX_CHUNKS,
            });
        }
        Ok(Self {
            frame: vec![0; frame_len],
            mask: 0,
            capacity,
            started_at: None,
            stale_after: None,
            stats: AssemblerStats::default(),
        })
    }

    /// Enable the staleness timeout for stalled partial frames.
    pub fn with_stale_after(mut self, timeout: Duration) -> Self {
        self.stale_after = Some(timeout);
        self
    }

    /// Feed one chunk. See [`accept_at`](Self::accept_at).
    pub fn accept(&mut self, chunk: Chunk) -> FrameStatus {
        self.accept_at(chunk, Instant::now())
    }

    /// Feed one chunk, with an explicit arrival time for the staleness
    /// clock.
    ///
    /// Validates, copies the payload into its slot, marks the mask, and
    /// reports whether bits `0..chunk.total` are now all present. The
    /// `total` of the *current* datagram drives the completion check;
    /// cross-chunk agreement is not enforced, matching the wire
    /// format's per-packet advisory count.
    pub fn accept_at(&mut self, chunk: Chunk, now: Instant) -> FrameStatus {
        let total = chunk.total as usize;
        if total == 0 || total > self.capacity {
            warn!(
                index = chunk.index,
                total = chunk.total,
                capacity = self.capacity,
                "chunk total outside frame capacity"
            );
            return self.reject(RejectReason::MalformedHeader);
        }
        // total ≤ capacity ≤ MAX_CHUNKS, so index < total also keeps
        // the index inside the mask.
        if chunk.index as usize >= total {
            warn!(
                index = chunk.index,
                total = chunk.total,
                "chunk index not below total"
            );
            return self.reject(RejectReason::MalformedHeader);
        }
        if chunk.payload.is_empty() {
            warn!(index = chunk.index, "empty chunk payload");
            return self.reject(RejectReason::MalformedHeader);
        }
        if chunk.payload.len() > CHUNK_PAYLOAD {
            warn!(
                index = chunk.index,
                len = chunk.payload.len(),
                max = CHUNK_PAYLOAD,
                "chunk payload exceeds stride"
            );
            return self.reject(RejectReason::BufferOverrun);
        }
        let offset = chunk.index as usize * CHUNK_PAYLOAD;
        let end = offset + chunk.payload.len();
        if end > self.frame.len() {
            warn!(
                index = chunk.index,
                end,
                frame_len = self.frame.len(),
                "chunk would overrun frame buffer"
            );
            return self.reject(RejectReason::BufferOverrun);
        }

        if self.mask == 0 {
            self.started_at = Some(now);
        }

        self.frame[offset..end].copy_from_slice(&chunk.payload);
        let bit = 1u64 << chunk.index;
        if self.mask & bit != 0 {
            self.stats.duplicates += 1;
        } else {
            self.mask |= bit;
            self.stats.accepted += 1;
        }

        trace!(
            index = chunk.index,
            total = chunk.total,
            received = self.mask.count_ones(),
            "chunk written"
        );

        // Stale bits from an abandoned frame may satisfy a smaller
        // total early; that is the observed last-writer-wins contract.
        let needed = if total == MAX_CHUNKS {
            u64::MAX
        } else {
            (1u64 << total) - 1
        };
        if self.mask & needed == needed {
            self.stats.completed += 1;
            FrameStatus::Complete
        } else {
            FrameStatus::Incomplete
        }
    }

    /// Clear a partial frame older than the configured timeout.
    ///
    /// Returns `true` if a frame was expired. No-op when expiry is
    /// disabled or no frame is in progress.
    pub fn expire_stale(&mut self, now: Instant) -> bool {
        let (Some(timeout), Some(started)) = (self.stale_after, self.started_at) else {
            return false;
        };
        let age = now.duration_since(started);
        if age < timeout {
            return false;
        }
        warn!(
            age_ms = age.as_millis() as u64,
            received = self.mask.count_ones(),
            "expiring stale partial frame"
        );
        self.stats.expired += 1;
        self.reset();
        true
    }

    /// Drop the in-progress frame. Clears only the mask; buffer bytes
    /// are overwritten lazily by the next frame's chunks.
    pub fn reset(&mut self) {
        self.mask = 0;
        self.started_at = None;
    }

    /// The reassembled frame bytes (valid after `Complete`).
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Frame buffer length in bytes.
    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    /// Chunks a full frame occupies.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Chunks of the in-progress frame received so far.
    pub fn received(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Whether a partial frame is in progress.
    pub fn in_progress(&self) -> bool {
        self.mask != 0
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    fn reject(&mut self, reason: RejectReason) -> FrameStatus {
        self.stats.rejected += 1;
        FrameStatus::Rejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn chunk(index: u8, total: u8, payload: &[u8]) -> Chunk {
        Chunk {
            index,
            total,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Assembler sized for `total` full chunks.
    fn assembler(total: usize) -> FrameAssembler {
        FrameAssembler::new(total * CHUNK_PAYLOAD).unwrap()
    }

    #[test]
    fn single_chunk_frame_completes() {
        let mut asm = FrameAssembler::new(16).unwrap();
        let status = asm.accept(chunk(0, 1, &[7u8; 16]));
        assert_eq!(status, FrameStatus::Complete);
        assert_eq!(asm.frame(), &[7u8; 16]);
    }

    #[test]
    fn out_of_order_completes_on_last_chunk() {
        let mut asm = assembler(3);
        let p0 = vec![0xA0; CHUNK_PAYLOAD];
        let p1 = vec![0xB1; CHUNK_PAYLOAD];
        let p2 = vec![0xC2; CHUNK_PAYLOAD];

        assert_eq!(asm.accept(chunk(0, 3, &p0)), FrameStatus::Incomplete);
        assert_eq!(asm.accept(chunk(2, 3, &p2)), FrameStatus::Incomplete);
        assert_eq!(asm.accept(chunk(1, 3, &p1)), FrameStatus::Complete);

        let mut expected = p0;
        expected.extend_from_slice(&p1);
        expected.extend_from_slice(&p2);
        assert_eq!(asm.frame(), &expected[..]);
    }

    #[test]
    fn every_permutation_completes_exactly_once_on_last() {
        let orders: [[u8; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut asm = assembler(3);
            let mut completions = 0;
            for (nth, &index) in order.iter().enumerate() {
                let status = asm.accept(chunk(index, 3, &[index; CHUNK_PAYLOAD]));
                match status {
                    FrameStatus::Complete => {
                        completions += 1;
                        assert_eq!(nth, 2, "completed before the last chunk: {order:?}");
                    }
                    FrameStatus::Incomplete => {}
                    other => panic!("unexpected status {other:?} for {order:?}"),
                }
            }
            assert_eq!(completions, 1);
        }
    }

    #[test]
    fn duplicate_recopy_is_idempotent() {
        let mut asm = assembler(2);
        assert_eq!(
            asm.accept(chunk(0, 2, &[1; CHUNK_PAYLOAD])),
            FrameStatus::Incomplete
        );
        // Same slot again: harmless, does not advance completion.
        assert_eq!(
            asm.accept(chunk(0, 2, &[1; CHUNK_PAYLOAD])),
            FrameStatus::Incomplete
        );
        assert_eq!(asm.stats().duplicates, 1);
        assert_eq!(
            asm.accept(chunk(1, 2, &[2; CHUNK_PAYLOAD])),
            FrameStatus::Complete
        );
    }

    #[test]
    fn duplicate_never_corrupts_neighbor_slots() {
        let mut asm = assembler(2);
        asm.accept(chunk(1, 2, &[0xEE; CHUNK_PAYLOAD]));
        let neighbor_before = asm.frame()[CHUNK_PAYLOAD..].to_vec();

        asm.accept(chunk(0, 2, &[0x11; CHUNK_PAYLOAD]));
        asm.accept(chunk(0, 2, &[0x22; CHUNK_PAYLOAD]));

        assert_eq!(&asm.frame()[CHUNK_PAYLOAD..], &neighbor_before[..]);
        // The duplicate's own slot took the newer bytes.
        assert!(asm.frame()[..CHUNK_PAYLOAD].iter().all(|&b| b == 0x22));
    }

    #[test]
    fn rejects_index_not_below_total() {
        let mut asm = assembler(4);
        let frame_before = asm.frame().to_vec();

        let status = asm.accept(chunk(3, 3, &[9; 10]));
        assert_eq!(status, FrameStatus::Rejected(RejectReason::MalformedHeader));
        assert_eq!(asm.frame(), &frame_before[..]);
        assert_eq!(asm.received(), 0);
    }

    #[test]
    fn rejects_total_zero_and_total_beyond_capacity() {
        let mut asm = assembler(4);
        assert_eq!(
            asm.accept(chunk(0, 0, &[1; 8])),
            FrameStatus::Rejected(RejectReason::MalformedHeader)
        );
        // A frame of 5 chunks can never complete in a 4-chunk buffer.
        assert_eq!(
            asm.accept(chunk(0, 5, &[1; 8])),
            FrameStatus::Rejected(RejectReason::MalformedHeader)
        );
        assert_eq!(asm.stats().rejected, 2);
    }

    #[test]
    fn rejects_empty_payload() {
        let mut asm = assembler(2);
        assert_eq!(
            asm.accept(chunk(0, 2, &[])),
            FrameStatus::Rejected(RejectReason::MalformedHeader)
        );
        assert!(!asm.in_progress());
    }

    #[test]
    fn rejects_payload_over_stride() {
        let mut asm = assembler(4);
        let status = asm.accept(chunk(0, 4, &vec![5; CHUNK_PAYLOAD + 1]));
        assert_eq!(status, FrameStatus::Rejected(RejectReason::BufferOverrun));
        assert_eq!(asm.received(), 0);
    }

    #[test]
    fn rejects_copy_past_frame_end() {
        // 2500-byte frame: chunk 2 starts at 2048, so at most 452
        // bytes fit there.
        let mut asm = FrameAssembler::new(2500).unwrap();
        let frame_before = asm.frame().to_vec();

        let status = asm.accept(chunk(2, 3, &[7; 500]));
        assert_eq!(status, FrameStatus::Rejected(RejectReason::BufferOverrun));
        assert_eq!(asm.frame(), &frame_before[..]);
        assert_eq!(asm.received(), 0);

        // The short final chunk that actually fits is fine.
        assert_eq!(asm.accept(chunk(2, 3, &[7; 452])), FrameStatus::Incomplete);
    }

    #[test]
    fn abandoned_partial_is_superseded_by_smaller_frame() {
        let mut asm = assembler(3);
        assert_eq!(
            asm.accept(chunk(0, 3, &[1; CHUNK_PAYLOAD])),
            FrameStatus::Incomplete
        );
        assert_eq!(
            asm.accept(chunk(1, 3, &[2; CHUNK_PAYLOAD])),
            FrameStatus::Incomplete
        );
        // Chunk 2 never arrives. A new frame with total=2 reuses the
        // slots; its first chunk already finds bits 0..2 set, so the
        // stale mask completes it immediately (last writer wins).
        assert_eq!(
            asm.accept(chunk(0, 2, &[3; CHUNK_PAYLOAD])),
            FrameStatus::Complete
        );
        assert_eq!(asm.stats().completed, 1);
    }

    #[test]
    fn fresh_smaller_frame_completes_without_stale_chunks() {
        let mut asm = assembler(3);
        asm.accept(chunk(0, 3, &[1; CHUNK_PAYLOAD]));
        asm.accept(chunk(1, 3, &[2; CHUNK_PAYLOAD]));
        asm.reset();

        // After a reset nothing stale remains: the two-chunk frame
        // needs both of its own chunks and never chunk 2.
        assert_eq!(
            asm.accept(chunk(0, 2, &[3; CHUNK_PAYLOAD])),
            FrameStatus::Incomplete
        );
        assert_eq!(
            asm.accept(chunk(1, 2, &[4; CHUNK_PAYLOAD])),
            FrameStatus::Complete
        );
    }

    #[test]
    fn reset_clears_mask_but_not_bytes() {
        let mut asm = FrameAssembler::new(8).unwrap();
        asm.accept(chunk(0, 1, &[0xAB; 8]));
        asm.reset();
        assert!(!asm.in_progress());
        assert_eq!(asm.frame(), &[0xAB; 8]);
    }

    #[test]
    fn full_mask_capacity_frame_completes() {
        // 64 chunks exercises the all-ones mask without shifting by 64.
        let mut asm = assembler(MAX_CHUNKS);
        for i in 0..MAX_CHUNKS as u8 {
            let status = asm.accept(chunk(i, MAX_CHUNKS as u8, &[i; CHUNK_PAYLOAD]));
            if i as usize == MAX_CHUNKS - 1 {
                assert_eq!(status, FrameStatus::Complete);
            } else {
                assert_eq!(status, FrameStatus::Incomplete);
            }
        }
        assert_eq!(asm.frame()[CHUNK_PAYLOAD * 63], 63);
    }

    #[test]
    fn stale_partial_expires_and_fresh_frame_completes() {
        let mut asm = assembler(2).with_stale_after(Duration::from_millis(100));
        let t0 = Instant::now();

        assert_eq!(
            asm.accept_at(chunk(0, 2, &[1; CHUNK_PAYLOAD]), t0),
            FrameStatus::Incomplete
        );
        assert!(!asm.expire_stale(t0 + Duration::from_millis(50)));
        assert!(asm.expire_stale(t0 + Duration::from_millis(150)));
        assert!(!asm.in_progress());
        assert_eq!(asm.stats().expired, 1);

        // The next frame needs both of its own chunks again.
        let t1 = t0 + Duration::from_millis(200);
        assert_eq!(
            asm.accept_at(chunk(0, 2, &[2; CHUNK_PAYLOAD]), t1),
            FrameStatus::Incomplete
        );
        assert_eq!(
            asm.accept_at(chunk(1, 2, &[3; CHUNK_PAYLOAD]), t1),
            FrameStatus::Complete
        );
    }

    #[test]
    fn expiry_disabled_by_default() {
        let mut asm = assembler(2);
        let t0 = Instant::now();
        asm.accept_at(chunk(0, 2, &[1; CHUNK_PAYLOAD]), t0);
        assert!(!asm.expire_stale(t0 + Duration::from_secs(3600)));
        assert!(asm.in_progress());
    }

    #[test]
    fn counters_track_outcomes() {
        let mut asm = assembler(2);
        asm.accept(chunk(0, 2, &[1; CHUNK_PAYLOAD]));
        asm.accept(chunk(0, 2, &[1; CHUNK_PAYLOAD]));
        asm.accept(chunk(9, 2, &[1; 4]));
        asm.accept(chunk(1, 2, &[2; CHUNK_PAYLOAD]));

        let stats = asm.stats();
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn construction_validates_frame_size() {
        assert!(matches!(
            FrameAssembler::new(0),
            Err(LuxError::InvalidGeometry(_))
        ));
        assert!(matches!(
            FrameAssembler::new(MAX_CHUNKS * CHUNK_PAYLOAD + 1),
            Err(LuxError::FrameTooLarge { .. })
        ));
        assert!(FrameAssembler::new(MAX_CHUNKS * CHUNK_PAYLOAD).is_ok());
    }
}
