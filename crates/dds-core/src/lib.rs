// # dds-core
//
// Core library for the DDS node scaffolding.
//
// ## Architecture Overview
//
// - **ValueType**: typed scalar holders (`Current`, `Voltage`, `Int32`)
// - **DdsNode**: named entity every node embeds (name + age)
// - **FunnyNode**: demo composite node combining a voltage with a seed value
// - **NodeKind**: closed set of node variants the sample loop can drive
// - **SampleLoop**: fixed-interval driver with an injected shutdown signal
// - **ValueSink**: where computed values end up (stdout in production)
// - **NodeRegistry**: `node_registry.json` bookkeeping for node packages
//
// Node and value operations are total. Integer arithmetic wraps on overflow
// the same way fixed-width 32-bit hardware arithmetic does.

pub mod types;
pub mod node;
pub mod engine;
pub mod sink;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use types::{Current, Int32, ValueType, Voltage};
pub use node::{DdsNode, FunnyNode, NodeKind};
pub use engine::{LoopEvent, SampleLoop};
pub use sink::{MemorySink, StdoutSink, ValueSink};
pub use registry::{NodeRegistry, RegistryEntry};
pub use config::{FakeNodeConfig, LoopConfig, NodeConfig};
pub use error::{Error, Result};
