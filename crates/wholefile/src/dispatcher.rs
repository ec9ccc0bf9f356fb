// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

use core::pin::Pin;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::task::{Context, Poll};
use core::time::Duration;
use std::fmt;
use std::sync::Arc;

const WORKER_CAP: usize = 4;
const IDLE_SHUTDOWN: Duration = Duration::from_secs(10);

/// A small pool of worker threads that runs blocking filesystem calls
/// on behalf of the async API.
///
/// One worker is alive from the start. Whenever the backlog of queued
/// operations reaches the number of live workers, another worker is
/// spawned, up to [`WORKER_CAP`]. Workers that sit idle for
/// [`IDLE_SHUTDOWN`] exit, leaving at least one behind.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

struct Shared {
    queue_tx: flume::Sender<async_task::Runnable>,
    queue_rx: flume::Receiver<async_task::Runnable>,
    workers: AtomicUsize,
    backlog: AtomicUsize,
}

impl Dispatcher {
    /// Creates a dispatcher with a single initial worker thread.
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = flume::unbounded();
        let shared = Arc::new(Shared {
            queue_tx,
            queue_rx,
            workers: AtomicUsize::new(1),
            backlog: AtomicUsize::new(0),
        });
        Shared::spawn_worker(&shared);
        Self { shared }
    }

    /// Hands a blocking operation to a worker thread.
    ///
    /// The returned future resolves to the closure's return value. A panic
    /// on the worker is re-raised on the awaiting task.
    pub fn dispatch<T: Send + 'static>(&self, op: impl FnOnce() -> T + Send + 'static) -> DispatchFuture<T> {
        let queue_tx = self.shared.queue_tx.clone();
        let schedule = move |runnable: async_task::Runnable| {
            let _ = queue_tx.send(runnable);
        };

        let (runnable, task) =
            async_task::spawn(async move { std::panic::catch_unwind(core::panic::AssertUnwindSafe(op)) }, schedule);

        self.shared.note_queued();
        runnable.schedule();

        DispatchFuture { task }
    }
}

impl Shared {
    /// Accounts for a newly queued operation and grows the pool when the
    /// backlog has caught up with the number of live workers.
    fn note_queued(self: &Arc<Self>) {
        let queued_before = self.backlog.fetch_add(1, Ordering::Relaxed);
        let workers = self.workers.load(Ordering::Acquire);
        if queued_before < workers || workers >= WORKER_CAP {
            return;
        }
        if self
            .workers
            .compare_exchange(workers, workers + 1, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            Self::spawn_worker(self);
        }
    }

    /// Spawns a worker thread. The caller has already accounted for it in
    /// the worker count.
    fn spawn_worker(shared: &Arc<Self>) {
        let shared = Arc::clone(shared);
        let _ = std::thread::Builder::new()
            .name("wholefile-io".into())
            .spawn(move || shared.run_worker())
            .expect("failed to spawn wholefile worker thread");
    }

    fn run_worker(&self) {
        loop {
            match self.queue_rx.recv_timeout(IDLE_SHUTDOWN) {
                Ok(runnable) => {
                    let _ = runnable.run();
                    let _ = self.backlog.fetch_sub(1, Ordering::Relaxed);
                }
                Err(flume::RecvTimeoutError::Timeout) => {
                    if self.try_retire() {
                        return;
                    }
                    // Last worker keeps running.
                }
                Err(flume::RecvTimeoutError::Disconnected) => {
                    let _ = self.workers.fetch_sub(1, Ordering::AcqRel);
                    return;
                }
            }
        }
    }

    /// Decrements the worker count unless this is the last worker.
    /// The CAS loop guarantees one worker always remains.
    fn try_retire(&self) -> bool {
        let mut count = self.workers.load(Ordering::Relaxed);
        while count > 1 {
            match self
                .workers
                .compare_exchange_weak(count, count - 1, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => count = actual,
            }
        }
        false
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.shared.workers.load(Ordering::Relaxed))
            .field("backlog", &self.shared.backlog.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves to the result of a dispatched operation.
///
/// If the worker thread panicked while running the operation, the panic
/// payload is re-raised here via [`std::panic::resume_unwind`].
pub struct DispatchFuture<T> {
    task: async_task::Task<std::thread::Result<T>>,
}

impl<T> Future for DispatchFuture<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        match Pin::new(&mut this.task).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            Poll::Ready(Err(payload)) => std::panic::resume_unwind(payload),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for DispatchFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchFuture").finish_non_exhaustive()
    }
}
