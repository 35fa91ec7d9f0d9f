// # Value Sinks
//
// Where the sample loop writes each computed value.
//
// - `StdoutSink`: one `Computed funny value: {n}` line per value on stdout
// - `MemorySink`: keeps values in memory (embedding, tests)

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Prefix of every line the stdout sink writes
pub const OUTPUT_PREFIX: &str = "Computed funny value: ";

/// Format a computed value as an output line (without newline)
pub fn format_value(value: i32) -> String {
    format!("{}{}", OUTPUT_PREFIX, value)
}

/// Destination for computed values
///
/// Implementations must be cheap to call once per tick. A failed `emit` is
/// reported back to the loop, which logs it and keeps running.
#[async_trait]
pub trait ValueSink: Send + Sync {
    /// Publish one computed value
    async fn emit(&self, value: i32) -> Result<()>;

    /// Sink name for logs
    fn sink_name(&self) -> &'static str;
}

/// Writes `Computed funny value: {n}` lines to an async writer
///
/// Each line is flushed immediately.
pub struct StdoutSink<W = tokio::io::Stdout> {
    out: tokio::sync::Mutex<W>,
}

impl StdoutSink {
    /// Sink writing to the process stdout
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: AsyncWrite + Unpin + Send> StdoutSink<W> {
    /// Sink writing to an arbitrary writer
    pub fn with_writer(out: W) -> Self {
        Self {
            out: tokio::sync::Mutex::new(out),
        }
    }

    /// Take the writer back out of the sink
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ValueSink for StdoutSink<W> {
    async fn emit(&self, value: i32) -> Result<()> {
        let mut line = format_value(value);
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::sink(format!("Failed to write value {}: {}", value, e)))?;
        out.flush()
            .await
            .map_err(|e| Error::sink(format!("Failed to flush value {}: {}", value, e)))?;
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "stdout"
    }
}

/// In-memory sink
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the loop.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    values: Arc<Mutex<Vec<i32>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every value emitted so far
    pub fn values(&self) -> Vec<i32> {
        self.values
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Number of values emitted so far
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Whether nothing was emitted yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ValueSink for MemorySink {
    async fn emit(&self, value: i32) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| Error::sink("memory sink lock poisoned"))?
            .push(value);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}
