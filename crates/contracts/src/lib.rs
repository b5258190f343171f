//! # Contracts
//!
//! Shared interface contracts between the stream-syncer crates: the sample
//! data model, configuration structures, producer/consumer traits and the
//! common error type. Business crates depend on this crate only; nothing
//! here depends back on them.
//!
//! ## Time Model
//! - Sample timestamps are plain `f64` values supplied by the producer
//!   (typically milliseconds since the Unix epoch); the core never
//!   interprets their unit, it only requires them to be non-decreasing per
//!   source.
//! - `tuple_id` is a 1-based emission counter, used for ordering/diagnostics

mod config;
mod error;
mod sample;
mod sample_source;
mod sink;
mod stats;

pub use config::*;
pub use error::*;
pub use sample::*;
pub use sample_source::{SampleBatchCallback, SampleFeed, SampleSource};
pub use sink::*;
pub use stats::*;
