use crate::config::{AsyncConfig, MissedCallback};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::fmt::MakeWriter;

/// Target used for the relay's and the HTTP client's own diagnostics.
///
/// Subscribers that feed an [`AsyncWriter`] must filter this target out,
/// otherwise the writer's own reports are written back into it.
pub const INTERNAL_TARGET: &str = "appinsights_log_sink::internal";

/// Non-blocking, loss-tolerant writer in front of a synchronous one.
///
/// Every `write` copies the record into a bounded channel and returns
/// immediately. A dedicated worker thread drains the channel in FIFO order
/// and writes each record to the wrapped writer, one at a time. When the
/// channel is full the new record is dropped and counted; dropped counts
/// are reported through the configured `on_missed` callback.
///
/// Handles are cheap to clone and all feed the same worker. The relay is
/// closed by [`AsyncWriter::close`] or when the last handle is dropped.
#[derive(Clone)]
pub struct AsyncWriter {
    shared: Arc<Shared>,
}

struct Shared {
    sender: mpsc::Sender<Vec<u8>>,
    counters: Arc<Counters>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct Counters {
    /// Successfully enqueued into the channel.
    accepted: AtomicU64,
    /// Dropped because the channel was full. Never reset.
    dropped: AtomicU64,
    /// Dropped since the last loss report.
    unreported: AtomicU64,
    /// Written to the inner writer without error.
    delivered: AtomicU64,
    /// Rejected by the inner writer.
    failed: AtomicU64,
}

/// Point-in-time view of an [`AsyncWriter`]'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    pub accepted: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl AsyncWriter {
    /// Wrap `inner` and spawn the drain worker.
    ///
    /// The worker runs on its own thread with a current-thread tokio
    /// runtime, so no ambient runtime is needed.
    pub fn new<W>(inner: W, config: AsyncConfig) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        let capacity = config.buffer_capacity.max(1);
        let (tx, rx) = mpsc::channel::<Vec<u8>>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let counters = Arc::new(Counters::default());

        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        let drain = Drain {
            inner,
            counters: Arc::clone(&counters),
            on_missed: config.on_missed,
        };
        let worker = thread::Builder::new()
            .name("appinsights-drain".to_string())
            .spawn(move || runtime.block_on(drain.run(rx, shutdown_rx)))?;

        Ok(Self {
            shared: Arc::new(Shared {
                sender: tx,
                counters,
                shutdown: Mutex::new(Some(shutdown_tx)),
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Enqueue one record without blocking.
    ///
    /// **Returns**
    /// - `Ok(raw.len())` whether the record was queued or dropped because
    ///   the buffer was full.
    /// - `Err(..)` with kind `BrokenPipe` once the relay has been closed.
    pub fn write_record(&self, raw: &[u8]) -> io::Result<usize> {
        let counters = &self.shared.counters;
        // Reserve first so a dropped record is never copied.
        match self.shared.sender.try_reserve() {
            Ok(permit) => {
                permit.send(raw.to_vec());
                counters.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(raw.len())
            }
            Err(TrySendError::Full(_)) => {
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                counters.unreported.fetch_add(1, Ordering::Release);
                Ok(raw.len())
            }
            Err(TrySendError::Closed(_)) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "async writer is closed"))
            }
        }
    }

    /// Stop accepting records, write every buffered record to the inner
    /// writer and wait for the worker to exit.
    ///
    /// Blocks the calling thread until the buffer is drained, including
    /// when another thread is already closing. Calling it after the relay
    /// has closed is a no-op.
    pub fn close(&self) -> io::Result<()> {
        self.shared.close()
    }

    pub fn stats(&self) -> RelayStats {
        let counters = &self.shared.counters;
        RelayStats {
            accepted: counters.accepted.load(Ordering::Relaxed),
            dropped: counters.dropped.load(Ordering::Relaxed),
            delivered: counters.delivered.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Shared {
    fn close(&self) -> io::Result<()> {
        if let Some(shutdown) = self.shutdown.lock().unwrap_or_else(PoisonError::into_inner).take() {
            // The worker may already be gone; then there is nothing to signal.
            let _ = shutdown.send(());
        }

        // Held across the join so concurrent closers also wait for the drain.
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match worker.take() {
            // Dropped from the drain thread itself (e.g. inside `on_missed`):
            // the worker exits on its own once the queue is flushed.
            Some(handle) if handle.thread().id() == thread::current().id() => Ok(()),
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "drain worker panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(target: INTERNAL_TARGET, error = %e, "failed to close async writer");
        }
    }
}

struct Drain<W> {
    inner: W,
    counters: Arc<Counters>,
    on_missed: Option<MissedCallback>,
}

impl<W: Write> Drain<W> {
    async fn run(mut self, mut rx: mpsc::Receiver<Vec<u8>>, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                record = rx.recv() => match record {
                    Some(record) => self.deliver(&record),
                    None => break,
                },
                _ = &mut shutdown => {
                    // Refuse new records, then flush what is already queued.
                    rx.close();
                    while let Some(record) = rx.recv().await {
                        self.deliver(&record);
                        self.report_missed();
                    }
                    break;
                }
            }
            self.report_missed();
        }

        self.report_missed();
        if let Err(e) = self.inner.flush() {
            tracing::warn!(target: INTERNAL_TARGET, error = %e, "failed to flush inner writer");
        }
    }

    fn deliver(&mut self, record: &[u8]) {
        match self.inner.write_all(record) {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: INTERNAL_TARGET, error = %e, "dropping log record rejected by writer");
            }
        }
    }

    fn report_missed(&self) {
        let missed = self.counters.unreported.swap(0, Ordering::Acquire);
        if missed == 0 {
            return;
        }
        match &self.on_missed {
            Some(callback) => callback(missed),
            None => tracing::error!(
                target: INTERNAL_TARGET,
                missed,
                "missed log entries flush to Application Insights"
            ),
        }
    }
}

impl Write for AsyncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for AsyncWriter {
    type Writer = AsyncWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
