//! Core of the diode transport, free of any runtime dependency.
//!
//! Everything the transport adapters and their consumers share lives here:
//!
//! - **Capability traits**: [`FrameRead`], [`FrameWrite`], [`StreamSocket`]
//! - **Frame codec**: [`TextCodec`] with its [`Encoding`] and
//!   [`MalformedPolicy`]
//! - **Errors**: [`TransportError`], [`CodecError`], [`TransportResult`]
//! - **Operating parameters**: [`FRAME_CAPACITY`], [`SOCKET_TIMEOUT`],
//!   [`DEFAULT_GATEWAY_PORT`]

mod codec;
mod constants;
mod error;
mod traits;

pub use codec::{Encoding, MalformedPolicy, TextCodec};
pub use constants::*;
pub use error::{CodecError, TransportError, TransportResult};
pub use traits::{FrameRead, FrameWrite, StreamSocket};
