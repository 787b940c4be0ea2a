//! Decoupled receive path with an explicit overflow policy.
//!
//! The plain [`DiodeReader`] touches the wire only inside `fill`, so a
//! consumer that stalls stops draining the socket. When receive latency
//! must be decoupled from the consumer's scheduling, a [`SpooledReader`]
//! runs one dedicated task that pulls frames off the wire into a bounded
//! queue. Nothing about that queue is implicit: its depth and its
//! [`OverflowPolicy`] are both chosen at spawn time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use super::reader::DiodeReader;
use crate::core::{FrameRead, TransportError, TransportResult};

/// What a full spool does with the next inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest queued frame to admit the newest.
    ///
    /// Keeps the task draining the wire at the cost of losing the frames
    /// the consumer was slowest to collect. Evictions are counted and
    /// observable through [`SpooledReader::dropped`].
    DropOldest,

    /// Park the receive task until the consumer makes room.
    ///
    /// The kernel socket buffer then absorbs the backlog and, once full,
    /// sheds new datagrams - the only backpressure a one-way medium can
    /// express.
    Block,
}

/// State shared between the receive task and the consumer.
#[derive(Debug)]
struct Spool {
    state: Mutex<SpoolState>,
    /// Signalled when a frame is queued or the task stops.
    readable: Notify,
    /// Signalled when queue space frees up, for [`OverflowPolicy::Block`].
    writable: Notify,
    /// Signalled by `close` to stop the task.
    shutdown: Notify,
    /// Frames evicted under [`OverflowPolicy::DropOldest`].
    dropped: AtomicU64,
}

#[derive(Debug)]
struct SpoolState {
    frames: VecDeque<String>,
    /// The failure that stopped the task, handed to the next caller.
    failure: Option<TransportError>,
    /// Set once the task is stopping for good.
    finished: bool,
}

/// A [`FrameRead`] fed by a dedicated receive task.
///
/// Wraps a [`DiodeReader`] and consumes frames from the spool instead of
/// the socket, with the same call surface and the same timeout, so
/// upstream code cannot tell the two apart. The task rides out idle
/// timeouts on the wire and stops on the first real failure, which is
/// then surfaced from `fill` once, followed by `Closed`. Deployments
/// that expect dirty input should spool with a `Replace` codec.
#[derive(Debug)]
pub struct SpooledReader {
    spool: Arc<Spool>,
    /// The receive task; `None` once closed.
    task: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl SpooledReader {
    /// Start a receive task over `reader` with a queue of `depth` frames
    /// (at least one) and the given overflow policy.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(reader: DiodeReader, depth: usize, policy: OverflowPolicy) -> Self {
        let timeout = reader.timeout();
        let depth = depth.max(1);
        let spool = Arc::new(Spool {
            state: Mutex::new(SpoolState {
                frames: VecDeque::with_capacity(depth),
                failure: None,
                finished: false,
            }),
            readable: Notify::new(),
            writable: Notify::new(),
            shutdown: Notify::new(),
            dropped: AtomicU64::new(0),
        });

        let task = tokio::spawn(pump(reader, Arc::clone(&spool), depth, policy));
        debug!(depth, ?policy, "spooled reader started");
        Self {
            spool,
            task: Some(task),
            timeout,
        }
    }

    /// Whether the spool is still open.
    pub fn is_open(&self) -> bool {
        self.task.is_some()
    }

    /// Frames evicted so far under [`OverflowPolicy::DropOldest`].
    pub fn dropped(&self) -> u64 {
        self.spool.dropped.load(Ordering::Relaxed)
    }

    /// Frames currently queued.
    pub async fn queued(&self) -> usize {
        self.spool.state.lock().await.frames.len()
    }
}

#[async_trait]
impl FrameRead for SpooledReader {
    async fn fill(&mut self, out: &mut String) -> TransportResult<usize> {
        if self.task.is_none() {
            return Err(TransportError::Closed);
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            let notified = {
                let mut state = self.spool.state.lock().await;
                if let Some(frame) = state.frames.pop_front() {
                    self.spool.writable.notify_one();
                    let chars = frame.chars().count();
                    out.push_str(&frame);
                    return Ok(chars);
                }
                // Queued frames drain before a failure is reported.
                if let Some(err) = state.failure.take() {
                    return Err(err);
                }
                if state.finished {
                    return Err(TransportError::Closed);
                }
                self.spool.readable.notified()
            };
            if timeout_at(deadline, notified).await.is_err() {
                return Err(TransportError::TimedOut {
                    timeout: self.timeout,
                });
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        self.spool.state.lock().await.finished = true;
        self.spool.shutdown.notify_one();
        // Unstick a receive task parked on a full queue.
        self.spool.writable.notify_one();
        let _ = task.await;
        debug!("spooled reader closed");
        Ok(())
    }
}

impl Drop for SpooledReader {
    fn drop(&mut self) {
        // Stop the task when close was never called.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The receive task: wire to queue until shutdown or failure.
async fn pump(mut reader: DiodeReader, spool: Arc<Spool>, depth: usize, policy: OverflowPolicy) {
    loop {
        let mut frame = String::new();
        let result = tokio::select! {
            _ = spool.shutdown.notified() => break,
            result = reader.fill(&mut frame) => result,
        };
        match result {
            Ok(_) => enqueue(&spool, depth, policy, frame).await,
            // An idle wire is not a failure; keep listening.
            Err(TransportError::TimedOut { .. }) => {}
            Err(err) => {
                debug!(error = %err, "spool receive task stopping");
                let mut state = spool.state.lock().await;
                state.failure = Some(err);
                state.finished = true;
                break;
            }
        }
    }
    let _ = reader.close().await;
    // Wake a consumer that was waiting when the task stopped.
    spool.readable.notify_one();
}

async fn enqueue(spool: &Spool, depth: usize, policy: OverflowPolicy, frame: String) {
    match policy {
        OverflowPolicy::DropOldest => {
            let mut state = spool.state.lock().await;
            if state.finished {
                return;
            }
            if state.frames.len() >= depth {
                let _ = state.frames.pop_front();
                let evicted = spool.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(evicted, "spool full; evicted oldest frame");
            }
            state.frames.push_back(frame);
            spool.readable.notify_one();
        }
        OverflowPolicy::Block => {
            loop {
                let notified = {
                    let state = spool.state.lock().await;
                    if state.finished {
                        return;
                    }
                    if state.frames.len() < depth {
                        break;
                    }
                    spool.writable.notified()
                };
                notified.await;
            }
            // Sole producer: the space observed above is still there.
            let mut state = spool.state.lock().await;
            if state.finished {
                return;
            }
            state.frames.push_back(frame);
            spool.readable.notify_one();
        }
    }
}
