//! UDP transport: non-blocking receive for the tick loop, chunked
//! send for the source side.
//!
//! The receive side is deliberately poll-shaped: the tick driver owns
//! its own cadence and must never suspend inside a tick, so
//! [`Transport::poll`] returns `Ok(None)` instead of waiting. The send
//! side is a thin wrapper over [`split_frame`] that fires one datagram
//! per chunk with no pacing of its own.

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::error::LuxError;
use crate::wire::{MAX_DATAGRAM, split_frame};

// ── Datagram ─────────────────────────────────────────────────────

/// One raw datagram as delivered by a transport.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Where it came from.
    pub source: SocketAddr,
    /// Raw bytes, header included.
    pub payload: Bytes,
}

// ── Transport ────────────────────────────────────────────────────

/// Datagram source feeding the tick loop.
pub trait Transport {
    /// Non-blocking poll for the next datagram.
    ///
    /// Returns `Ok(None)` when nothing is waiting. Must never block or
    /// suspend; the caller decides when to poll again.
    fn poll(&mut self) -> Result<Option<Datagram>, LuxError>;
}

// ── UdpTransport ─────────────────────────────────────────────────

/// Receive-only UDP transport.
pub struct UdpTransport {
    socket: UdpSocket,
    /// Reused receive buffer. One byte larger than the biggest legal
    /// datagram so an oversized one still parses to an over-stride
    /// payload and gets rejected, instead of truncating to a valid
    /// size.
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind a listening socket.
    pub async fn bind(addr: SocketAddr) -> Result<Self, LuxError> {
        let socket = UdpSocket::bind(addr).await?;
        debug!(local = %socket.local_addr()?, "udp transport bound");
        Ok(Self::new(socket))
    }

    /// Wrap an already-bound socket.
    pub fn new(socket: UdpSocket) -> Self {
        Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM + 1],
        }
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr, LuxError> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn poll(&mut self) -> Result<Option<Datagram>, LuxError> {
        match self.socket.try_recv_from(&mut self.buf) {
            Ok((len, source)) => Ok(Some(Datagram {
                source,
                payload: Bytes::copy_from_slice(&self.buf[..len]),
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ── FrameSender ──────────────────────────────────────────────────

/// Source side: splits frames into chunk datagrams and sends them.
///
/// Fire-and-forget; there is no acknowledgment channel and no
/// retransmission. A dropped datagram means that frame never completes
/// at the receiver.
pub struct FrameSender {
    socket: UdpSocket,
    target: SocketAddr,
    frames_sent: u64,
    bytes_sent: u64,
}

impl FrameSender {
    /// Bind an ephemeral local socket targeting `target`.
    pub async fn connect(target: SocketAddr) -> Result<Self, LuxError> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            "0.0.0.0:0".parse().map_err(|_| {
                LuxError::InvalidGeometry("unparseable wildcard bind address")
            })?
        } else {
            "[::]:0".parse().map_err(|_| {
                LuxError::InvalidGeometry("unparseable wildcard bind address")
            })?
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        Ok(Self::new(socket, target))
    }

    /// Wrap an already-bound socket targeting `target`.
    pub fn new(socket: UdpSocket, target: SocketAddr) -> Self {
        Self {
            socket,
            target,
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Send one frame as a burst of chunk datagrams.
    ///
    /// Returns the number of datagrams sent.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<usize, LuxError> {
        let datagrams = split_frame(frame)?;
        let total = datagrams.len();
        for pkt in &datagrams {
            self.socket.send_to(pkt, self.target).await?;
            self.bytes_sent += pkt.len() as u64;
        }
        self.frames_sent += 1;
        trace!(chunks = total, bytes = frame.len(), "frame sent");
        Ok(total)
    }

    /// Frames sent since construction.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Wire bytes sent since construction, headers included.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// The remote address this sender targets.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}
