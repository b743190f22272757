//! # Sink Adapters
//!
//! Implementations of the [`EntitySink`](crate::sink::EntitySink) port for
//! development, testing, and offline processing.

pub mod jsonl_sink;
pub mod memory_sink;

pub use jsonl_sink::JsonLinesSink;
pub use memory_sink::InMemorySink;
