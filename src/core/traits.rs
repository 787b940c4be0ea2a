//! Capability traits for gateway connections.
//!
//! Upstream protocol code consumes a connection through these seams rather
//! than through concrete socket types, so a different transport - or a
//! decorator such as the spooled receive path - drops in without touching
//! instruction handling.
//!
//! [`FrameRead`] and [`FrameWrite`] are object safe; `Box<dyn FrameRead>`
//! works where the concrete half is not known until runtime.

use async_trait::async_trait;

use super::error::TransportResult;

/// Capability to pull character data off a connection, one frame at a
/// time.
#[async_trait]
pub trait FrameRead: Send {
    /// Append the character data of exactly one frame to `out`.
    ///
    /// Waits until a frame arrives or the transport's timeout elapses.
    /// Returns the number of characters appended, at least one on success:
    /// a frame is never split across calls, never merged with the next,
    /// and an empty frame is never surfaced.
    ///
    /// # Errors
    ///
    /// - `TransportError::TimedOut` when no frame arrives in time
    /// - `TransportError::Closed` after [`close`](Self::close)
    /// - `TransportError::Codec` when the payload violates a strict codec
    async fn fill(&mut self, out: &mut String) -> TransportResult<usize>;

    /// Release the receive side.
    ///
    /// Idempotent; closing twice is a no-op. Afterwards every
    /// [`fill`](Self::fill) fails with `TransportError::Closed`.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Capability to push character data onto a connection, one frame per
/// call.
#[async_trait]
pub trait FrameWrite: Send {
    /// Transmit `text` as exactly one frame.
    ///
    /// No coalescing and no queueing: the frame is handed to the network
    /// before the call returns. A write whose encoded form exceeds the
    /// frame capacity fails before any network I/O happens, so a rejected
    /// push transmits nothing at all.
    ///
    /// # Errors
    ///
    /// - `TransportError::Overflow` when the encoded text cannot fit one
    ///   frame
    /// - `TransportError::Codec` when the text violates a strict codec
    /// - `TransportError::Closed` after [`close`](Self::close)
    async fn push(&mut self, text: &str) -> TransportResult<()>;

    /// Flush any buffered output.
    ///
    /// Writers that transmit on every push have nothing to flush and
    /// return immediately, but callers must not assume so.
    async fn flush(&mut self) -> TransportResult<()>;

    /// Release the send side.
    ///
    /// Idempotent; closing twice is a no-op. Afterwards every
    /// [`push`](Self::push) fails with `TransportError::Closed`.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Capability of a bidirectional, stream-oriented gateway connection.
///
/// Composes one [`FrameRead`] and one [`FrameWrite`] under a shared
/// lifecycle. The composition performs no I/O of its own.
#[async_trait]
pub trait StreamSocket: Send {
    /// Concrete read half.
    type Reader: FrameRead;

    /// Concrete write half.
    type Writer: FrameWrite;

    /// The read half of the connection.
    fn reader(&mut self) -> &mut Self::Reader;

    /// The write half of the connection.
    fn writer(&mut self) -> &mut Self::Writer;

    /// Whether the connection is usable: `true` exactly while *both*
    /// halves are open.
    fn is_open(&self) -> bool;

    /// Close both halves. Idempotent.
    async fn close(&mut self) -> TransportResult<()>;
}
