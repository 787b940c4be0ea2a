//! Data-diode socket: composition and lifecycle.
//!
//! A [`DiodeSocket`] owns one [`DiodeReader`] and one [`DiodeWriter`] and
//! presents them as a single bidirectional connection. It performs no I/O
//! of its own; everything on the wire goes through the halves.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};
use tracing::debug;

use super::reader::DiodeReader;
use super::writer::DiodeWriter;
use crate::core::{
    FRAME_CAPACITY, FrameRead, FrameWrite, SOCKET_TIMEOUT, StreamSocket, TextCodec,
    TransportError, TransportResult,
};

/// A bidirectional gateway connection emulated over two one-way UDP
/// sockets.
///
/// The send socket binds an ephemeral local port and targets the peer's
/// fixed port; the receive socket binds a fixed local port, conventionally
/// the same number as the send port so client-facing configuration is
/// unchanged by the diode deployment. One timeout and one codec govern
/// both halves.
///
/// # Example
///
/// ```ignore
/// use diode_transport::prelude::*;
///
/// let mut socket = DiodeSocket::connect("gateway.internal", DEFAULT_GATEWAY_PORT).await?;
/// socket.writer().push("6.select,3.rdp;").await?;
///
/// let mut buf = String::new();
/// socket.reader().fill(&mut buf).await?;
/// socket.close().await?;
/// ```
#[derive(Debug)]
pub struct DiodeSocket {
    reader: DiodeReader,
    writer: DiodeWriter,
}

impl DiodeSocket {
    /// Connect with the symmetric-port convention: send to `host:port`,
    /// listen on local port `port`.
    pub async fn connect(host: &str, port: u16) -> TransportResult<Self> {
        Self::builder().connect(host, port).await
    }

    /// A builder for a non-default capacity, timeout, codec, or an
    /// asymmetric port pair.
    pub fn builder() -> DiodeSocketBuilder {
        DiodeSocketBuilder::new()
    }

    /// Consume the socket, yielding independently owned halves so receive
    /// and send can run on separate tasks.
    ///
    /// Each half keeps the shared timeout and codec and manages its own
    /// lifetime from here on; there is no composed lifecycle to return to.
    pub fn into_split(self) -> (DiodeReader, DiodeWriter) {
        (self.reader, self.writer)
    }

    /// Local address of the receive socket.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        self.reader.local_addr()
    }

    /// Fixed peer address of the send socket.
    pub fn peer_addr(&self) -> SocketAddr {
        self.writer.peer_addr()
    }
}

#[async_trait]
impl StreamSocket for DiodeSocket {
    type Reader = DiodeReader;
    type Writer = DiodeWriter;

    fn reader(&mut self) -> &mut DiodeReader {
        &mut self.reader
    }

    fn writer(&mut self) -> &mut DiodeWriter {
        &mut self.writer
    }

    /// Open means usable in both directions.
    fn is_open(&self) -> bool {
        self.reader.is_open() && self.writer.is_open()
    }

    async fn close(&mut self) -> TransportResult<()> {
        // Each half tolerates repeated closes, so the composed close is
        // idempotent too.
        self.reader.close().await?;
        self.writer.close().await?;
        debug!("diode socket closed");
        Ok(())
    }
}

/// Builder for [`DiodeSocket`].
///
/// Every knob defaults to the fixed operating parameters; none can change
/// after `connect`.
#[derive(Debug, Clone)]
pub struct DiodeSocketBuilder {
    recv_port: Option<u16>,
    capacity: usize,
    timeout: Duration,
    codec: TextCodec,
}

impl Default for DiodeSocketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiodeSocketBuilder {
    /// Create a builder with the default operating parameters.
    pub fn new() -> Self {
        Self {
            recv_port: None,
            capacity: FRAME_CAPACITY,
            timeout: SOCKET_TIMEOUT,
            codec: TextCodec::utf8(),
        }
    }

    /// Listen on `port` instead of mirroring the peer's send port.
    ///
    /// The symmetric pair is a configuration convenience, not a protocol
    /// requirement; deployments with colliding services set this.
    pub fn recv_port(mut self, port: u16) -> Self {
        self.recv_port = Some(port);
        self
    }

    /// Set the frame capacity in bytes.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the shared socket timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the frame payload codec.
    pub fn codec(mut self, codec: TextCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Resolve `host:send_port`, open both sockets, and compose the diode
    /// connection.
    ///
    /// Every setup failure - resolution, bind, socket creation - surfaces
    /// as [`TransportError::Unreachable`]. Nothing is retried: a one-way
    /// medium has no handshake, so a socket that cannot be set up is
    /// simply unreachable.
    pub async fn connect(self, host: &str, send_port: u16) -> TransportResult<DiodeSocket> {
        let recv_port = self.recv_port.unwrap_or(send_port);
        debug!(host, send_port, recv_port, "opening diode socket pair");

        let peer = resolve(host, send_port).await?;

        // Bind in the peer's address family so loopback and dual-stack
        // deployments behave the same.
        let wildcard: IpAddr = if peer.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };

        let send_socket = UdpSocket::bind((wildcard, 0))
            .await
            .map_err(|source| TransportError::Unreachable { source })?;
        let recv_socket = UdpSocket::bind((wildcard, recv_port))
            .await
            .map_err(|source| TransportError::Unreachable { source })?;

        let reader = DiodeReader::from_socket(recv_socket, self.capacity, self.timeout, self.codec);
        let writer =
            DiodeWriter::from_socket(send_socket, peer, self.capacity, self.timeout, self.codec)
                .await?;

        debug!(%peer, recv_port, "diode socket open");
        Ok(DiodeSocket { reader, writer })
    }
}

/// Resolve `host:port` to the first usable address.
async fn resolve(host: &str, port: u16) -> TransportResult<SocketAddr> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Unreachable { source })?;
    addrs.next().ok_or_else(|| TransportError::Unreachable {
        source: io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {host}"),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_GATEWAY_PORT;

    /// Assemble a socket directly from bound halves, sidestepping the
    /// builder so tests can wire arbitrary topologies on port 0.
    async fn socket_from_parts(
        recv: UdpSocket,
        peer: SocketAddr,
        timeout: Duration,
    ) -> DiodeSocket {
        let send = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let reader = DiodeReader::from_socket(recv, FRAME_CAPACITY, timeout, TextCodec::utf8());
        let writer = DiodeWriter::from_socket(send, peer, FRAME_CAPACITY, timeout, TextCodec::utf8())
            .await
            .unwrap();
        DiodeSocket { reader, writer }
    }

    /// Two sockets wired back-to-back over loopback.
    async fn loopback_pair(timeout: Duration) -> (DiodeSocket, DiodeSocket) {
        let a_recv = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b_recv = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let a_to = b_recv.local_addr().unwrap();
        let b_to = a_recv.local_addr().unwrap();
        let a = socket_from_parts(a_recv, a_to, timeout).await;
        let b = socket_from_parts(b_recv, b_to, timeout).await;
        (a, b)
    }

    /// Grab a port that is free right now. The tiny window before reuse
    /// is acceptable in a test process.
    async fn free_port() -> u16 {
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        probe.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_connect_scenario_roundtrip() {
        // With symmetric ports on loopback, a socket's writer targets its
        // own reader, so one instance exercises the full path.
        let port = free_port().await;
        let mut socket = DiodeSocket::builder()
            .timeout(Duration::from_millis(500))
            .connect("localhost", port)
            .await
            .unwrap();

        assert!(socket.is_open());
        socket.writer().push("7.connect;").await.unwrap();

        let mut buf = String::new();
        let n = socket.reader().fill(&mut buf).await.unwrap();
        assert_eq!(buf, "7.connect;");
        assert_eq!(n, 10);

        socket.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_pair_roundtrip_both_directions() {
        let (mut a, mut b) = loopback_pair(Duration::from_millis(500)).await;

        a.writer().push("4.size,4.1024,3.768;").await.unwrap();
        b.writer().push("3.ack,1.0;").await.unwrap();

        let mut buf = String::new();
        b.reader().fill(&mut buf).await.unwrap();
        assert_eq!(buf, "4.size,4.1024,3.768;");

        buf.clear();
        a.reader().fill(&mut buf).await.unwrap();
        assert_eq!(buf, "3.ack,1.0;");
    }

    #[tokio::test]
    async fn test_is_open_lifecycle() {
        let (mut a, _b) = loopback_pair(Duration::from_millis(200)).await;

        // Open from construction, with no traffic required.
        assert!(a.is_open());

        a.close().await.unwrap();
        assert!(!a.is_open());

        // Both halves refuse further use.
        let err = a.writer().push("3.nop;").await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        let mut buf = String::new();
        let err = a.reader().fill(&mut buf).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let (mut a, _b) = loopback_pair(Duration::from_millis(200)).await;
        a.close().await.unwrap();
        a.close().await.unwrap();
        assert!(!a.is_open());
    }

    #[tokio::test]
    async fn test_half_closed_socket_is_not_open() {
        let (mut a, _b) = loopback_pair(Duration::from_millis(200)).await;

        a.reader().close().await.unwrap();

        // One closed half is enough to make the connection unusable.
        assert!(!a.is_open());
        assert!(a.writer().is_open());
    }

    #[tokio::test]
    async fn test_construction_failure_is_unreachable() {
        let err = DiodeSocket::connect("host.invalid", DEFAULT_GATEWAY_PORT)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unreachable { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_port_pairs_are_isolated() {
        let (mut a, mut b) = loopback_pair(Duration::from_millis(150)).await;
        let (mut c, mut d) = loopback_pair(Duration::from_millis(150)).await;

        a.writer().push("5.mouse,4.100,4.200;").await.unwrap();

        // Only the paired socket sees the frame.
        let mut buf = String::new();
        b.reader().fill(&mut buf).await.unwrap();
        assert_eq!(buf, "5.mouse,4.100,4.200;");

        buf.clear();
        let err = d.reader().fill(&mut buf).await.unwrap_err();
        assert!(matches!(err, TransportError::TimedOut { .. }));
        assert!(buf.is_empty());

        c.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_into_split_concurrent_halves() {
        let (a, mut b) = loopback_pair(Duration::from_millis(500)).await;
        let (_a_reader, mut a_writer) = a.into_split();

        let sender = tokio::spawn(async move {
            for i in 0..5 {
                a_writer.push(&format!("4.blob,1.{i};")).await.unwrap();
            }
            a_writer.close().await.unwrap();
        });

        let mut buf = String::new();
        for _ in 0..5 {
            b.reader().fill(&mut buf).await.unwrap();
        }
        assert_eq!(buf, "4.blob,1.0;4.blob,1.1;4.blob,1.2;4.blob,1.3;4.blob,1.4;");

        sender.await.unwrap();
    }

    #[tokio::test]
    async fn test_builder_applies_parameters() {
        let port = free_port().await;
        let socket = DiodeSocket::builder()
            .capacity(512)
            .timeout(Duration::from_millis(250))
            .codec(TextCodec::latin1())
            .connect("127.0.0.1", port)
            .await
            .unwrap();

        let (reader, writer) = socket.into_split();
        assert_eq!(reader.capacity(), 512);
        assert_eq!(writer.capacity(), 512);
        assert_eq!(reader.timeout(), Duration::from_millis(250));
        assert_eq!(writer.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_asymmetric_port_pair() {
        // Listen on a different port than the peer target.
        let listen_port = free_port().await;
        let peer_port = free_port().await;
        let socket = DiodeSocket::builder()
            .recv_port(listen_port)
            .timeout(Duration::from_millis(200))
            .connect("127.0.0.1", peer_port)
            .await
            .unwrap();

        assert_eq!(socket.local_addr().unwrap().port(), listen_port);
        assert_eq!(socket.peer_addr().port(), peer_port);
    }
}
