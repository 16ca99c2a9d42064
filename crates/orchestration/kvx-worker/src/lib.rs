//! kvx-worker - batch driver for kvx step pipelines.
//!
//! Wraps a [`TransformChain`](kvx_traits::TransformChain) with:
//!
//! - An error policy deciding what happens to messages a step fails on
//! - Multi-threaded batch processing that keeps input order
//! - Run statistics safe to update from every thread
//!
//! # Example
//!
//! ```ignore
//! use kvx_transform::PipelineConfig;
//! use kvx_worker::Pipeline;
//!
//! let config = PipelineConfig::from_file("pipeline.json")?;
//! let pipeline = Pipeline::from_config(&config, 4)?;
//!
//! for outcome in pipeline.process_batch(messages)? {
//!     if let Some(message) = outcome.into_message() {
//!         emit(message);
//!     }
//! }
//! eprintln!("{:?}", pipeline.stats().snapshot());
//! ```

pub mod config;
pub mod pipeline;
pub mod stats;

pub use config::WorkerConfig;
pub use pipeline::{Outcome, Pipeline};
pub use stats::{PipelineStats, StatsSnapshot};
