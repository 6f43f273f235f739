//! Live-reload modes and the background scan worker.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};

use super::DiskShared;

/// How changed disk files are picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReloadMode {
    /// No automatic checking.
    None,
    /// A background thread scans on a fixed interval.
    #[default]
    Async,
    /// Scans run only when the caller polls.
    Poll,
}

/// Background thread running periodic scans.
///
/// Dropping the worker signals it to stop and joins it, unless the drop
/// happens on the worker thread itself.
pub(super) struct ReloadWorker {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ReloadWorker {
    pub(super) fn spawn(shared: Arc<DiskShared>, interval: Duration) -> std::io::Result<Self> {
        let (stop, stopped) = bounded(1);
        let thread = thread::Builder::new()
            .name("vfs-live-reload".into())
            .spawn(move || run(&shared, &stopped, interval))?;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "live reload worker started");
        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }
}

fn run(shared: &DiskShared, stopped: &Receiver<()>, interval: Duration) {
    loop {
        match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                shared.check_for_updated_files();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

impl Drop for ReloadWorker {
    fn drop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the worker
        drop(self.stop.take());
        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.thread().id() == thread::current().id() {
            // Stopped from an observer on the worker itself: the loop exits
            // on disconnect once the scan returns
            tracing::debug!("live reload worker stopping itself");
            return;
        }
        if thread.join().is_err() {
            tracing::warn!("live reload worker panicked");
        }
        tracing::debug!("live reload worker stopped");
    }
}
