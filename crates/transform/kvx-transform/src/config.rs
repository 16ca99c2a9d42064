//! Configuration types for step pipelines.

use crate::{CastStep, DropFieldStep, MergeKeyValueStep, UnwrapKeyValueStep};
use kvx_error::{KvxError, Result};
use kvx_traits::{TransformChain, TransformStep};
use kvx_types::PrimitiveType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StepConfig {
    /// Remove fields from the key and/or value records.
    DropFields {
        #[serde(default)]
        key_fields: Vec<String>,
        #[serde(default)]
        value_fields: Vec<String>,
    },

    /// Merge the key record's fields into the value record.
    MergeKeyValue,

    /// Collapse a key/value pair into its key (`unwrap_key`) or its value.
    UnwrapKeyValue {
        #[serde(default)]
        unwrap_key: bool,
    },

    /// Re-encode the key and/or value as a primitive type.
    Cast {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_schema_type: Option<PrimitiveType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_schema_type: Option<PrimitiveType>,
    },
}

impl StepConfig {
    /// Returns the step type name as written in configuration.
    pub fn type_name(&self) -> &'static str {
        match self {
            StepConfig::DropFields { .. } => "drop-fields",
            StepConfig::MergeKeyValue => "merge-key-value",
            StepConfig::UnwrapKeyValue { .. } => "unwrap-key-value",
            StepConfig::Cast { .. } => "cast",
        }
    }

    /// Builds the configured step.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a cast with no target type.
    pub fn build(&self) -> Result<Box<dyn TransformStep>> {
        let step: Box<dyn TransformStep> = match self {
            StepConfig::DropFields {
                key_fields,
                value_fields,
            } => Box::new(DropFieldStep::new(key_fields.clone(), value_fields.clone())),
            StepConfig::MergeKeyValue => Box::new(MergeKeyValueStep::new()),
            StepConfig::UnwrapKeyValue { unwrap_key } => Box::new(UnwrapKeyValueStep::new(*unwrap_key)),
            StepConfig::Cast {
                key_schema_type,
                value_schema_type,
            } => Box::new(CastStep::new(*key_schema_type, *value_schema_type)?),
        };
        Ok(step)
    }
}

/// A sequence of steps plus the policy for messages they fail on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Error handling policy.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl PipelineConfig {
    /// Creates a config with the given steps and the default error policy.
    pub fn with_steps(steps: Vec<StepConfig>) -> Self {
        Self {
            steps,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Sets the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Parses a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| KvxError::Config(format!("Invalid pipeline config: {e}")))
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| KvxError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Checks every step without building it.
    pub fn validate(&self) -> Result<()> {
        for (idx, step) in self.steps.iter().enumerate() {
            if let StepConfig::Cast {
                key_schema_type: None,
                value_schema_type: None,
            } = step
            {
                return Err(KvxError::Config(format!(
                    "step {idx} (cast) requires key_schema_type or value_schema_type"
                )));
            }
        }
        Ok(())
    }

    /// Builds the steps into a chain, in order.
    pub fn build_chain(&self) -> Result<TransformChain> {
        self.validate()?;
        self.steps
            .iter()
            .try_fold(TransformChain::new().with_name("pipeline"), |chain, step| -> Result<_> {
                Ok(chain.push(step.build()?))
            })
    }
}

/// Error handling policies for step failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Drop messages that fail, continue processing.
    #[default]
    Drop,

    /// Stop at the first failing message.
    Fail,

    /// Pass failing messages through unchanged.
    Passthrough,
}
