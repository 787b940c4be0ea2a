//! Fixed operating parameters of the diode transport.
//!
//! These are the defaults a socket builder starts from; any of them can be
//! overridden per socket at construction and none can change afterwards.

use std::time::Duration;

/// Upper bound on the payload of a single frame, in bytes.
///
/// One datagram is one frame. The transport never splits or merges frames,
/// so this is also the largest read or write the adapters ever perform.
pub const FRAME_CAPACITY: usize = 20480;

/// How long a blocking transport operation may wait before failing.
///
/// Applied to every receive and every send; there is no per-call override.
pub const SOCKET_TIMEOUT: Duration = Duration::from_millis(15000);

/// Port a remote-desktop gateway proxy conventionally listens on.
///
/// The diode convention reuses the same number for the local receive port,
/// which keeps client-facing configuration identical to a direct
/// deployment.
pub const DEFAULT_GATEWAY_PORT: u16 = 4822;
