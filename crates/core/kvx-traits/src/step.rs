//! Step trait for per-message key/value processing.

use kvx_error::Result;
use kvx_types::TransformContext;
use tracing::trace;

/// A unit of work over one message's [`TransformContext`].
///
/// Steps may rewrite the key side, the value side, or both:
/// - Projection (dropping fields)
/// - Merging the key record into the value record
/// - Unwrapping a key/value pair into a single value
/// - Re-encoding a side under another representation
///
/// # No-op Semantics
///
/// A step that does not apply to a message must leave both sides
/// referentially unchanged so the modification flags stay false and the
/// driver can forward the original encoding.
///
/// # Thread Safety
///
/// Steps must be `Send + Sync`: one instance is invoked concurrently from
/// several worker threads, each with its own context. Shared state (schema
/// caches) must use appropriate synchronization.
pub trait TransformStep: Send + Sync {
    /// Applies the step to one message.
    ///
    /// On error the context must be left exactly as it was received.
    fn process(&self, context: &mut TransformContext) -> Result<()>;

    /// Returns the name of this step for logging.
    fn name(&self) -> &str {
        "step"
    }
}

/// Steps applied in sequence, each seeing the previous step's output.
pub struct TransformChain {
    steps: Vec<Box<dyn TransformStep>>,
    name: String,
}

impl TransformChain {
    /// Creates a new empty chain.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "chain".to_string(),
        }
    }

    /// Adds a step to the chain.
    pub fn push(mut self, step: Box<dyn TransformStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Sets the name of this chain.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns true if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of steps in the chain.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for TransformChain {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStep for TransformChain {
    fn process(&self, context: &mut TransformContext) -> Result<()> {
        for step in &self.steps {
            step.process(context)?;
            trace!(
                step = step.name(),
                key_modified = context.key_modified(),
                value_modified = context.value_modified(),
                "Step applied"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
