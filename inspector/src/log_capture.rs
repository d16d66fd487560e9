//! Logger that forwards to `env_logger` and keeps the most recent collscope
//! records in a ring buffer.
//!
//! Raycast interception logs from whatever thread the host runs spatial
//! queries on, so the buffer is behind a `parking_lot` mutex and the running
//! total is atomic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::Mutex;

/// Only records whose target starts with this are captured.
pub const CAPTURE_TARGET_PREFIX: &str = "collscope";

/// A single captured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub timestamp: Instant,
}

/// Ring buffer of captured log entries.
#[derive(Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    max_capacity: usize,
}

impl LogBuffer {
    pub fn new(max_capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity.min(1024)),
            max_capacity,
        }
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.max_capacity == 0 {
            return;
        }
        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Buffer plus the number of entries ever pushed, shareable across threads.
#[derive(Debug)]
pub struct CaptureSink {
    buffer: Mutex<LogBuffer>,
    total: AtomicU64,
}

impl CaptureSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(LogBuffer::new(capacity)),
            total: AtomicU64::new(0),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.buffer.lock().push(entry);
    }

    /// Entries pushed since creation, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.buffer.lock().entries().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

static CAPTURE_SINK: OnceLock<Arc<CaptureSink>> = OnceLock::new();

/// The sink of the installed capture logger, if any.
pub fn capture_sink() -> Option<Arc<CaptureSink>> {
    CAPTURE_SINK.get().cloned()
}

/// Wraps `env_logger` and copies collscope records into a [`CaptureSink`].
pub struct LogCapture {
    inner: env_logger::Logger,
    sink: Arc<CaptureSink>,
}

impl LogCapture {
    pub fn new(inner: env_logger::Logger, sink: Arc<CaptureSink>) -> Self {
        Self { inner, sink }
    }
}

impl log::Log for LogCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.enabled(record.metadata()) {
            return;
        }
        self.inner.log(record);

        if record.target().starts_with(CAPTURE_TARGET_PREFIX) {
            self.sink.push(LogEntry {
                level: record.level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
                timestamp: Instant::now(),
            });
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the capturing logger as the global logger.
///
/// Filtering follows `RUST_LOG`, defaulting to `info` with collscope at `debug`.
pub fn install(capacity: usize) -> Result<Arc<CaptureSink>, log::SetLoggerError> {
    let inner = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("info,{CAPTURE_TARGET_PREFIX}=debug")),
    )
    .build();
    let max_level = inner.filter();

    let sink = Arc::new(CaptureSink::new(capacity));
    log::set_boxed_logger(Box::new(LogCapture::new(inner, sink.clone())))?;
    log::set_max_level(max_level);
    let sink = CAPTURE_SINK.get_or_init(|| sink).clone();
    Ok(sink)
}
