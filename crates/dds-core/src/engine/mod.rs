//! Sample loop
//!
//! The SampleLoop drives one node on a fixed interval:
//! - Feed the current counter to the node's computation
//! - Write the result to a ValueSink
//! - Advance the counter (wrapping at 32 bits)
//! - Wait for the next tick or a shutdown signal
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  tick  ┌──────────────┐  compute  ┌──────────────┐
//! │ IntervalStream │───────▶│  SampleLoop  │──────────▶│   NodeKind   │
//! └────────────────┘        └──────────────┘           └──────────────┘
//!                                   │
//!                 ┌─────────────────┴─────────────────┐
//!                 ▼                                   ▼
//!         ┌──────────────┐                    ┌──────────────┐
//!         │  ValueSink   │                    │    Events    │
//!         │   (emit)     │                    │   (notify)   │
//!         └──────────────┘                    └──────────────┘
//! ```
//!
//! The first iteration runs immediately; later ones run once per interval.
//! A slow sink delays the schedule instead of causing a burst of catch-up
//! iterations.

use crate::config::LoopConfig;
use crate::error::Result;
use crate::node::NodeKind;
use crate::sink::ValueSink;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Events emitted by the SampleLoop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// Loop started
    Started {
        node_name: String,
        start_counter: i32,
    },

    /// One iteration computed a value
    Computed {
        iteration: u64,
        input: i32,
        result: i32,
    },

    /// The sink rejected a value
    SinkFailed {
        iteration: u64,
        error: String,
    },

    /// Loop stopped
    Stopped {
        reason: String,
        iterations: u64,
    },
}

/// Fixed-interval driver for a single node
///
/// ## Lifecycle
///
/// 1. Create with [`SampleLoop::new()`]
/// 2. Start with [`SampleLoop::run()`] or [`SampleLoop::run_with_shutdown()`]
/// 3. Loop runs until shutdown (or until `max_iterations` is reached)
///
/// ## Threading
///
/// Everything happens on the calling task. The only suspension points are
/// the tick wait and the sink write.
pub struct SampleLoop {
    /// Node being driven
    node: NodeKind,

    /// Destination for computed values
    sink: Box<dyn ValueSink>,

    /// Time between iterations
    interval: Duration,

    /// Input for the next iteration
    counter: i32,

    /// Iterations completed so far
    iterations: u64,

    /// Optional iteration limit
    max_iterations: Option<u64>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<LoopEvent>,

    /// Set once the event receiver has been dropped
    events_closed: bool,
}

impl SampleLoop {
    /// Create a new sample loop
    ///
    /// # Returns
    ///
    /// A tuple of (loop, event_receiver) where event_receiver yields loop events
    pub fn new(
        node: NodeKind,
        sink: Box<dyn ValueSink>,
        config: LoopConfig,
    ) -> Result<(Self, mpsc::Receiver<LoopEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let sample_loop = Self {
            node,
            sink,
            interval: config.interval(),
            counter: config.start_counter,
            iterations: 0,
            max_iterations: config.max_iterations,
            event_tx: tx,
            events_closed: false,
        };

        Ok((sample_loop, rx))
    }

    /// Node being driven
    pub fn node(&self) -> &NodeKind {
        &self.node
    }

    /// Input the next iteration will use
    pub fn counter(&self) -> i32 {
        self.counter
    }

    /// Iterations completed so far
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Run one iteration without waiting
    ///
    /// Returns the computed value. A sink failure is logged and reported as a
    /// [`LoopEvent::SinkFailed`]; the counter still advances.
    pub async fn step(&mut self) -> i32 {
        let input = self.counter;
        let result = self.node.compute(input);
        self.iterations += 1;

        debug!(
            "Iteration {}: compute({}) = {}",
            self.iterations, input, result
        );
        self.emit_event(LoopEvent::Computed {
            iteration: self.iterations,
            input,
            result,
        });

        if let Err(e) = self.sink.emit(result).await {
            error!(
                "Sink {} failed on iteration {}: {}",
                self.sink.sink_name(),
                self.iterations,
                e
            );
            self.emit_event(LoopEvent::SinkFailed {
                iteration: self.iterations,
                error: e.to_string(),
            });
        }

        self.counter = self.counter.wrapping_add(1);
        result
    }

    /// Run the loop until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the loop until `shutdown_rx` fires
    ///
    /// `None` falls back to Ctrl-C. A dropped sender counts as a shutdown
    /// request.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        info!(
            "Starting sample loop for {} node '{}' (interval {:?}, start {})",
            self.node.kind_name(),
            self.node.name(),
            self.interval,
            self.counter
        );
        self.emit_event(LoopEvent::Started {
            node_name: self.node.name().to_string(),
            start_counter: self.counter,
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(ticker);

        let reason = loop {
            if let Some(max) = self.max_iterations
                && self.iterations >= max
            {
                info!("Iteration limit {} reached", max);
                break "Iteration limit reached";
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break "Shutdown signal";
                }

                Some(_) = ticks.next() => {
                    self.step().await;
                }
            }
        };

        self.emit_event(LoopEvent::Stopped {
            reason: reason.to_string(),
            iterations: self.iterations,
        });
        info!("Sample loop stopped after {} iteration(s)", self.iterations);

        Ok(())
    }

    /// Emit a loop event
    ///
    /// Nobody listening is fine: the first failed send is logged and later
    /// events are discarded quietly.
    fn emit_event(&mut self, event: LoopEvent) {
        if self.events_closed {
            return;
        }
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, no further loop events will be sent");
                self.events_closed = true;
            }
        }
    }
}
