//! # diode-transport
//!
//! A one-way ("data-diode") UDP transport for remote-desktop gateway
//! connections.
//!
//! A data diode physically forwards traffic in one direction only, so the
//! single bidirectional TCP stream a gateway connection normally rides on
//! cannot cross it. This crate carries that connection over two independent
//! unreliable datagram sockets instead, one that only sends and one that
//! only receives, and emulates the stream the upstream protocol expects:
//!
//! - **Framing**: one UDP datagram is one frame, never split, never merged
//! - **Text**: every payload passes through an explicit [`TextCodec`] with
//!   a declared policy for malformed input
//! - **Timeouts**: every blocking operation is bounded by one shared
//!   per-socket timeout
//! - **Honesty**: no acknowledgment, retransmission, or flow control is
//!   possible on a one-way medium, and none is pretended
//!
//! ## Feature Flags
//!
//! - `transport` (default): tokio-backed datagram adapters and the diode
//!   socket
//!
//! ## Modules
//!
//! - [`core`]: capability traits, constants, errors, and the frame codec
//!   (always included)
//! - [`transport`]: the diode socket and its adapters (requires the
//!   `transport` feature)
//!
//! ## Example Usage
//!
//! ```ignore
//! use diode_transport::prelude::*;
//!
//! let mut socket = DiodeSocket::connect("gateway.internal", DEFAULT_GATEWAY_PORT).await?;
//!
//! socket.writer().push("6.select,3.rdp;").await?;
//!
//! let mut buf = String::new();
//! socket.reader().fill(&mut buf).await?;
//!
//! socket.close().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits, constants, codec, and errors
    pub use crate::core::*;

    // Transport types (when enabled)
    #[cfg(feature = "transport")]
    pub use crate::transport::{
        DiodeReader, DiodeSocket, DiodeSocketBuilder, DiodeWriter, OverflowPolicy,
        SpooledReader,
    };
}

// Re-export commonly used items at crate root
pub use core::{
    CodecError, FrameRead, FrameWrite, StreamSocket, TextCodec, TransportError,
    TransportResult,
};

#[cfg(feature = "transport")]
pub use transport::{
    DiodeReader, DiodeSocket, DiodeSocketBuilder, DiodeWriter, OverflowPolicy, SpooledReader,
};
