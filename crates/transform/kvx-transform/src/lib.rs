//! Key/value transform steps for kvx pipelines.
//!
//! This crate provides the steps that rewrite the key and value sides of a
//! [`TransformContext`](kvx_types::TransformContext):
//!
//! - **[`DropFieldStep`]**: removes named fields from the key and/or value record
//! - **[`MergeKeyValueStep`]**: folds the key record's fields into the value record
//! - **[`UnwrapKeyValueStep`]**: collapses a key/value pair into its key or its value
//! - **[`CastStep`]**: re-encodes the key and/or value as a primitive type
//!
//! Steps that derive schemas memoize them per source schema in a
//! [`SchemaCache`] owned by the step instance. A step is built once and
//! shared by every worker thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use kvx_transform::{PipelineConfig, StepConfig};
//!
//! let config = PipelineConfig::with_steps(vec![
//!     StepConfig::DropFields {
//!         key_fields: vec![],
//!         value_fields: vec!["password".to_string()],
//!     },
//!     StepConfig::MergeKeyValue,
//! ]);
//!
//! let chain = config.build_chain()?;
//! chain.process(&mut context)?;
//! ```

mod cache;
mod cast;
mod config;
mod conversion;
mod drop_field;
mod merge_key_value;
mod unwrap_key_value;

#[cfg(test)]
mod test_util;

pub use cache::{DropSchemaCache, MergeSchemaCache, SchemaCache};
pub use cast::CastStep;
pub use config::{ErrorPolicy, PipelineConfig, StepConfig};
pub use conversion::{convert, convert_primitive};
pub use drop_field::DropFieldStep;
pub use merge_key_value::MergeKeyValueStep;
pub use unwrap_key_value::UnwrapKeyValueStep;
