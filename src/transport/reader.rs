//! Receive-only datagram adapter.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace, warn};

use crate::core::{FrameRead, TextCodec, TransportError, TransportResult};

/// Receive side of a data-diode connection.
///
/// Adapts a receive-only UDP socket to the [`FrameRead`] capability: each
/// [`fill`](FrameRead::fill) call delivers the decoded characters of
/// exactly one datagram. The receive buffer is allocated once at the frame
/// capacity and reused for every call, and the socket accepts datagrams
/// from any source - a diode deployment may rewrite the sender address in
/// flight.
#[derive(Debug)]
pub struct DiodeReader {
    /// The receive socket; `None` once closed.
    socket: Option<UdpSocket>,
    /// Reusable receive buffer, sized to the frame capacity.
    buf: Box<[u8]>,
    /// Shared socket timeout.
    timeout: Duration,
    /// Frame payload codec.
    codec: TextCodec,
}

impl DiodeReader {
    /// Wrap an already-bound receive socket.
    pub fn from_socket(
        socket: UdpSocket,
        capacity: usize,
        timeout: Duration,
        codec: TextCodec,
    ) -> Self {
        Self {
            socket: Some(socket),
            buf: vec![0u8; capacity].into_boxed_slice(),
            timeout,
            codec,
        }
    }

    /// Whether the receive side is still open.
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Local address the receive socket is bound to.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        let socket = self.socket.as_ref().ok_or(TransportError::Closed)?;
        Ok(socket.local_addr()?)
    }

    /// Frame capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The shared socket timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl FrameRead for DiodeReader {
    async fn fill(&mut self, out: &mut String) -> TransportResult<usize> {
        let socket = self.socket.as_ref().ok_or(TransportError::Closed)?;

        // One deadline for the whole call, not per datagram.
        let deadline = Instant::now() + self.timeout;
        loop {
            let (len, from) = match timeout_at(deadline, socket.recv_from(&mut self.buf)).await {
                Ok(received) => received?,
                Err(_) => {
                    return Err(TransportError::TimedOut {
                        timeout: self.timeout,
                    });
                }
            };

            // Keepalive probes arrive as empty datagrams; they carry no
            // characters, so keep waiting within the same deadline.
            if len == 0 {
                trace!(%from, "skipping empty datagram");
                continue;
            }
            if len == self.buf.len() {
                warn!(
                    %from,
                    len,
                    "inbound datagram filled the frame buffer; payload may be truncated"
                );
            }

            let appended = self.codec.decode_into(&self.buf[..len], out)?;
            trace!(%from, bytes = len, chars = appended, "received frame");
            return Ok(appended);
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        let Some(socket) = self.socket.take() else {
            return Ok(());
        };

        // Best-effort drain of one straggler before the port is released;
        // a one-way link has no way to tell the peer to stop sending.
        match socket.try_recv_from(&mut self.buf) {
            Ok((len, from)) => debug!(%from, len, "drained pending datagram at close"),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => debug!(error = %e, "drain at close failed"),
        }
        debug!("receive side closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CodecError, MalformedPolicy};

    async fn reader_with(capacity: usize, timeout: Duration, codec: TextCodec) -> DiodeReader {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        DiodeReader::from_socket(socket, capacity, timeout, codec)
    }

    async fn sender_to(reader: &DiodeReader) -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = reader.local_addr().unwrap();
        (socket, target)
    }

    #[tokio::test]
    async fn test_fill_returns_one_frame() {
        let mut reader =
            reader_with(20480, Duration::from_millis(500), TextCodec::utf8()).await;
        let (sender, target) = sender_to(&reader).await;

        sender.send_to(b"4.sync,8.31163115;", target).await.unwrap();
        sender.send_to(b"3.nop;", target).await.unwrap();

        let mut out = String::new();
        let n = reader.fill(&mut out).await.unwrap();
        assert_eq!(out, "4.sync,8.31163115;");
        assert_eq!(n, 18);

        // The second datagram is a separate frame, not merged into the first.
        let n = reader.fill(&mut out).await.unwrap();
        assert_eq!(n, 6);
        assert_eq!(out, "4.sync,8.31163115;3.nop;");
    }

    #[tokio::test]
    async fn test_fill_times_out() {
        let timeout = Duration::from_millis(100);
        let mut reader = reader_with(20480, timeout, TextCodec::utf8()).await;

        let started = std::time::Instant::now();
        let mut out = String::new();
        let err = reader.fill(&mut out).await.unwrap_err();

        assert!(matches!(err, TransportError::TimedOut { .. }));
        assert!(started.elapsed() >= timeout);
        assert!(out.is_empty());
        // A timeout leaves the reader usable.
        assert!(reader.is_open());
    }

    #[tokio::test]
    async fn test_empty_datagram_skipped_within_deadline() {
        let mut reader =
            reader_with(20480, Duration::from_millis(500), TextCodec::utf8()).await;
        let (sender, target) = sender_to(&reader).await;

        sender.send_to(b"", target).await.unwrap();
        sender.send_to(b"0.;", target).await.unwrap();

        // A single call rides over the empty datagram to the real frame.
        let mut out = String::new();
        let n = reader.fill(&mut out).await.unwrap();
        assert_eq!(out, "0.;");
        assert_eq!(n, 3);
    }

    #[tokio::test]
    async fn test_fill_after_close() {
        let mut reader =
            reader_with(20480, Duration::from_millis(100), TextCodec::utf8()).await;
        reader.close().await.unwrap();

        assert!(!reader.is_open());
        let mut out = String::new();
        let err = reader.fill(&mut out).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        assert!(matches!(reader.local_addr(), Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let mut reader =
            reader_with(20480, Duration::from_millis(100), TextCodec::utf8()).await;
        reader.close().await.unwrap();
        reader.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_with_pending_datagram() {
        let mut reader =
            reader_with(20480, Duration::from_millis(500), TextCodec::utf8()).await;
        let (sender, target) = sender_to(&reader).await;

        sender.send_to(b"10.disconnect;", target).await.unwrap();
        // Give the kernel a moment to queue it.
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Close drains it without blocking and without failing.
        reader.close().await.unwrap();
        assert!(!reader.is_open());
    }

    #[tokio::test]
    async fn test_strict_codec_rejects_malformed_frame() {
        let mut reader =
            reader_with(20480, Duration::from_millis(500), TextCodec::utf8()).await;
        let (sender, target) = sender_to(&reader).await;

        sender.send_to(b"bad\xff\xfe", target).await.unwrap();

        let mut out = String::new();
        let err = reader.fill(&mut out).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Codec(CodecError::Malformed { offset: 3, .. })
        ));
        // The reader survives a rejected frame.
        assert!(reader.is_open());
    }

    #[tokio::test]
    async fn test_replace_codec_substitutes_malformed_frame() {
        let codec = TextCodec::utf8().with_policy(MalformedPolicy::Replace);
        let mut reader = reader_with(20480, Duration::from_millis(500), codec).await;
        let (sender, target) = sender_to(&reader).await;

        sender.send_to(b"bad\xff", target).await.unwrap();

        let mut out = String::new();
        let n = reader.fill(&mut out).await.unwrap();
        assert_eq!(out, "bad\u{FFFD}");
        assert_eq!(n, 4);
    }

    #[tokio::test]
    async fn test_oversized_datagram_truncates_at_capacity() {
        // Latin-1 keeps the truncation point off any multi-byte boundary.
        let mut reader = reader_with(4, Duration::from_millis(500), TextCodec::latin1()).await;
        let (sender, target) = sender_to(&reader).await;

        sender.send_to(b"0123456789", target).await.unwrap();

        let mut out = String::new();
        let n = reader.fill(&mut out).await.unwrap();
        assert_eq!(out, "0123");
        assert_eq!(n, 4);
    }
}
