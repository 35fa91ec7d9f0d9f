//! Configuration types for the DDS node system
//!
//! Defaults reproduce the demo node exactly: seed 42, counter starting at 0,
//! one iteration per second, forever.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::node::{FunnyNode, NodeKind};

/// Main configuration for a node host process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FakeNodeConfig {
    /// Which node to drive
    #[serde(default)]
    pub node: NodeConfig,

    /// Sample loop settings
    #[serde(default)]
    pub sample_loop: LoopConfig,
}

impl FakeNodeConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.sample_loop.validate()
    }
}

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    /// Voltage + seed demo node
    Funny {
        /// Seed stored in the node's integer value
        #[serde(default = "default_seed")]
        seed: i32,
    },
}

impl NodeConfig {
    /// Build the configured node
    pub fn build(&self) -> NodeKind {
        match self {
            NodeConfig::Funny { seed } => NodeKind::Funny(FunnyNode::new(*seed)),
        }
    }

    /// Get the node type name
    pub fn type_name(&self) -> &str {
        match self {
            NodeConfig::Funny { .. } => "funny",
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig::Funny {
            seed: default_seed(),
        }
    }
}

/// Sample loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Time between iterations (in milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Counter value fed to the first iteration
    #[serde(default)]
    pub start_counter: i32,

    /// Stop after this many iterations; `None` runs until shutdown
    #[serde(default)]
    pub max_iterations: Option<u64>,

    /// Capacity of the loop event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl LoopConfig {
    /// Interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Set the interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Set the first counter value
    pub fn with_start_counter(mut self, start: i32) -> Self {
        self.start_counter = start;
        self
    }

    /// Limit the number of iterations
    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Validate the loop configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_ms == 0 {
            return Err(crate::Error::config("Sample loop interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "Sample loop event channel capacity must be > 0",
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(crate::Error::config(
                "Sample loop max_iterations must be > 0 when set",
            ));
        }
        Ok(())
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            start_counter: 0,
            max_iterations: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_seed() -> i32 {
    42
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo() {
        let config = FakeNodeConfig::new();
        assert_eq!(config.node, NodeConfig::Funny { seed: 42 });
        assert_eq!(config.sample_loop.interval(), Duration::from_secs(1));
        assert_eq!(config.sample_loop.start_counter, 0);
        assert_eq!(config.sample_loop.max_iterations, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: FakeNodeConfig = serde_json::from_str(
            r#"{ "node": { "type": "funny" }, "sample_loop": { "interval_ms": 250 } }"#,
        )
        .unwrap();
        assert_eq!(config.node, NodeConfig::Funny { seed: 42 });
        assert_eq!(config.sample_loop.interval_ms, 250);
        assert_eq!(config.sample_loop.event_channel_capacity, 1000);

        let empty: FakeNodeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, FakeNodeConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = LoopConfig {
            interval_ms: 0,
            ..LoopConfig::default()
        };
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity_and_iterations() {
        let config = LoopConfig {
            event_channel_capacity: 0,
            ..LoopConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LoopConfig {
            max_iterations: Some(0),
            ..LoopConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_node() {
        let node = NodeConfig::Funny { seed: -8 }.build();
        assert_eq!(node.compute(0), 42);
        assert_eq!(NodeConfig::default().type_name(), "funny");
    }

    #[test]
    fn test_builders() {
        let config = LoopConfig::default()
            .with_interval(Duration::from_millis(20))
            .with_start_counter(-3)
            .with_max_iterations(5);
        assert_eq!(config.interval_ms, 20);
        assert_eq!(config.start_counter, -3);
        assert_eq!(config.max_iterations, Some(5));
    }
}
