//! Test doubles shared by the contract tests

#![allow(dead_code)]

use dds_core::config::LoopConfig;
use dds_core::error::{Error, Result};
use dds_core::sink::ValueSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A sink that fails every `fail_every`-th emit and records the rest
pub struct FlakySink {
    fail_every: usize,
    calls: Arc<AtomicUsize>,
    accepted: Arc<std::sync::Mutex<Vec<i32>>>,
}

impl FlakySink {
    pub fn new(fail_every: usize) -> Self {
        Self {
            fail_every,
            calls: Arc::new(AtomicUsize::new(0)),
            accepted: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Create a sink sharing counters with another one
    pub fn sharing_with(other: &FlakySink) -> Self {
        Self {
            fail_every: other.fail_every,
            calls: Arc::clone(&other.calls),
            accepted: Arc::clone(&other.accepted),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<i32> {
        self.accepted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ValueSink for FlakySink {
    async fn emit(&self, value: i32) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.fail_every == 0 {
            return Err(Error::sink(format!("refused value {}", value)));
        }
        self.accepted.lock().unwrap().push(value);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "flaky"
    }
}

/// Loop configuration with a short interval for tests
pub fn fast_loop_config() -> LoopConfig {
    LoopConfig::default().with_interval(Duration::from_millis(10))
}
