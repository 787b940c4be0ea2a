//! Error types for the diode transport.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors from the frame text codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A byte sequence the configured encoding cannot decode.
    #[error("malformed {encoding} sequence at byte {offset}")]
    Malformed {
        /// Offset of the first offending byte within the frame.
        offset: usize,
        /// Name of the encoding that rejected the input.
        encoding: &'static str,
    },

    /// A character the configured encoding cannot represent.
    #[error("character {ch:?} is not representable in {encoding}")]
    Unencodable {
        /// The offending character.
        ch: char,
        /// Name of the encoding that rejected it.
        encoding: &'static str,
    },
}

/// Errors surfaced through the transport capabilities.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection setup failed: address resolution, socket creation, or
    /// bind. Terminal - a one-way medium has no handshake to retry.
    #[error("gateway unreachable: {source}")]
    Unreachable {
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The socket timeout elapsed with the operation still pending.
    #[error("transport operation timed out after {timeout:?}")]
    TimedOut {
        /// The window that elapsed.
        timeout: Duration,
    },

    /// The channel was used after `close`.
    #[error("transport is closed")]
    Closed,

    /// A write whose encoded form exceeds the frame capacity.
    #[error("frame of {len} bytes exceeds capacity of {capacity}")]
    Overflow {
        /// Encoded length of the rejected write.
        len: usize,
        /// Fixed frame capacity of the socket.
        capacity: usize,
    },

    /// A frame payload the codec rejected.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Any other socket failure while the channel is in use.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Whether the channel is unusable after this error.
    ///
    /// Timeouts, overflows, and codec rejections leave the socket open;
    /// the next call may well succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Closed)
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let unreachable = TransportError::Unreachable {
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "test"),
        };
        assert!(unreachable.is_fatal());
        assert!(TransportError::Closed.is_fatal());

        let timed_out = TransportError::TimedOut {
            timeout: Duration::from_millis(15000),
        };
        assert!(!timed_out.is_fatal());
        assert!(
            !TransportError::Overflow {
                len: 30000,
                capacity: 20480
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::Overflow {
            len: 30000,
            capacity: 20480,
        };
        assert_eq!(
            err.to_string(),
            "frame of 30000 bytes exceeds capacity of 20480"
        );

        let err = TransportError::from(CodecError::Malformed {
            offset: 3,
            encoding: "utf-8",
        });
        assert_eq!(err.to_string(), "codec error: malformed utf-8 sequence at byte 3");
    }
}
