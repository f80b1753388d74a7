//! Deferred disconnect
//!
//! A keepalive job holds a connection open for a bounded idle window. It runs
//! on its own thread and waits on a cancel channel; when the window elapses
//! without a cancel it calls its expiry callback with its id. The callback is
//! responsible for checking, under the session lock, that the job is still
//! the pending one.

use std::io;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};

/// Handle to a scheduled deferred disconnect
///
/// Dropping the handle cancels the job as well.
#[derive(Debug)]
pub struct KeepaliveHandle {
    id: u64,
    cancel: Sender<()>,
}

impl KeepaliveHandle {
    /// Spawn a job that calls `on_expire(id)` after `ttl` unless cancelled
    pub fn schedule<F>(id: u64, ttl: Duration, on_expire: F) -> io::Result<Self>
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let (cancel, cancelled) = bounded::<()>(1);

        thread::Builder::new()
            .name(format!("jvc-keepalive-{id}"))
            .spawn(move || match cancelled.recv_timeout(ttl) {
                Err(RecvTimeoutError::Timeout) => on_expire(id),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            })?;

        Ok(Self { id, cancel })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel the job
    ///
    /// A callback that already fired and is waiting for the session lock will
    /// find its id no longer pending.
    pub fn cancel(self) {
        let _ = self.cancel.try_send(());
    }
}
