//! Integration tests for kvx.
//!
//! These exercise whole step pipelines through the public crate APIs:
//! configuration parsing, chained steps, the batch driver, and schema cache
//! behaviour under concurrent use.
//!
//! ```bash
//! cargo test -p integration-tests
//! ```

mod common;
mod concurrency_test;
mod pipeline_test;
