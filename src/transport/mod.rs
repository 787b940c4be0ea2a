//! Diode transport layer.
//!
//! Emulates a bidirectional, stream-oriented gateway connection on top of
//! two one-way UDP sockets. It provides:
//!
//! - **Receive adapter**: [`DiodeReader`], one frame per `fill`
//! - **Send adapter**: [`DiodeWriter`], one frame per `push`
//! - **Composition**: [`DiodeSocket`] and [`DiodeSocketBuilder`] with the
//!   shared lifecycle behind [`StreamSocket`](crate::core::StreamSocket)
//! - **Decoupled receive**: [`SpooledReader`] with an explicit
//!   [`OverflowPolicy`]
//!
//! # Architecture
//!
//! The adapters sit between the gateway instruction layer and the raw
//! datagram sockets. They carry text frames and timeouts; reliability is
//! deliberately absent, because a one-way medium cannot acknowledge.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Gateway instruction layer          │
//! ├─────────────────────────────────────────┤
//! │      Capability traits (core)           │
//! ├─────────────────────────────────────────┤
//! │      Diode transport                    │  ← This module
//! │   reader ▲ fixed port ∙ writer ▼ peer   │
//! ├─────────────────────────────────────────┤
//! │      UDP, one-way link each direction   │
//! └─────────────────────────────────────────┘
//! ```

mod reader;
mod socket;
mod spool;
mod writer;

pub use reader::DiodeReader;
pub use socket::{DiodeSocket, DiodeSocketBuilder};
pub use spool::{OverflowPolicy, SpooledReader};
pub use writer::DiodeWriter;

// The error surface lives in core with the capability traits; re-export
// it here for callers that only import the transport layer.
pub use crate::core::{TransportError, TransportResult};
