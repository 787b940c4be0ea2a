//! Send-only datagram adapter.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::core::{FrameWrite, TextCodec, TransportError, TransportResult};

/// Send side of a data-diode connection.
///
/// Adapts a send-only UDP socket to the [`FrameWrite`] capability: each
/// [`push`](FrameWrite::push) encodes its text into a reusable buffer and
/// hands it to the network as exactly one datagram addressed to the fixed
/// peer. Nothing is retained between pushes, which leaves
/// [`flush`](FrameWrite::flush) with nothing to do.
#[derive(Debug)]
pub struct DiodeWriter {
    /// The send socket, connected to `peer`; `None` once closed.
    socket: Option<UdpSocket>,
    /// Reusable encode buffer.
    buf: Vec<u8>,
    /// Frame capacity in bytes.
    capacity: usize,
    /// Shared socket timeout.
    timeout: Duration,
    /// Frame payload codec.
    codec: TextCodec,
    /// Fixed peer every frame is sent to.
    peer: SocketAddr,
}

impl DiodeWriter {
    /// Wrap an already-bound send socket, fixing `peer` as the only
    /// destination.
    ///
    /// Connects the socket, so a setup failure surfaces here rather than
    /// on the first push.
    pub async fn from_socket(
        socket: UdpSocket,
        peer: SocketAddr,
        capacity: usize,
        timeout: Duration,
        codec: TextCodec,
    ) -> TransportResult<Self> {
        socket
            .connect(peer)
            .await
            .map_err(|source| TransportError::Unreachable { source })?;
        Ok(Self {
            socket: Some(socket),
            buf: Vec::with_capacity(capacity),
            capacity,
            timeout,
            codec,
            peer,
        })
    }

    /// Whether the send side is still open.
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// The fixed peer address frames are sent to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Frame capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The shared socket timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl FrameWrite for DiodeWriter {
    async fn push(&mut self, text: &str) -> TransportResult<()> {
        let socket = self.socket.as_ref().ok_or(TransportError::Closed)?;

        self.buf.clear();
        self.codec.encode_into(text, &mut self.buf)?;

        // Capacity is checked before the socket is touched: a frame that
        // cannot fit one datagram must leave the wire untouched.
        if self.buf.len() > self.capacity {
            return Err(TransportError::Overflow {
                len: self.buf.len(),
                capacity: self.capacity,
            });
        }

        let sent = match timeout(self.timeout, socket.send(&self.buf)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::TimedOut {
                    timeout: self.timeout,
                });
            }
        };
        trace!(peer = %self.peer, bytes = sent, "sent frame");
        Ok(())
    }

    async fn flush(&mut self) -> TransportResult<()> {
        if self.socket.is_none() {
            return Err(TransportError::Closed);
        }
        // Every push already reached the network.
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        if self.socket.take().is_some() {
            debug!(peer = %self.peer, "send side closed");
        }
        Ok(())
    }
}
