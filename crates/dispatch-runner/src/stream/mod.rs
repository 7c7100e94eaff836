//! Streaming answer aggregation.
//!
//! Transport chunks are reassembled into events, each answer increment is
//! forwarded to the live channel as it arrives, and the full answer is
//! accumulated for usage accounting.

pub mod aggregator;

pub use aggregator::{StreamAggregator, StreamState, StreamedAnswer};
