//! Collapses a paired key/value into a single value.

use kvx_error::Result;
use kvx_traits::TransformStep;
use kvx_types::TransformContext;
use tracing::{debug, trace};

/// Keeps one side of a key/value pair and discards the other.
///
/// With `unwrap_key` the key becomes the value; otherwise the value is kept.
/// Either way the key side is removed and the value is flagged as modified,
/// since the message encoding changes even when the value object does not.
/// Messages without a key side pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapKeyValueStep {
    unwrap_key: bool,
}

impl UnwrapKeyValueStep {
    pub fn new(unwrap_key: bool) -> Self {
        debug!(unwrap_key, "Created UnwrapKeyValueStep");
        Self { unwrap_key }
    }

    pub fn unwrap_key(&self) -> bool {
        self.unwrap_key
    }
}

impl TransformStep for UnwrapKeyValueStep {
    fn process(&self, context: &mut TransformContext) -> Result<()> {
        let Some(key) = context.take_key() else {
            trace!("No key side, skipping unwrap");
            return Ok(());
        };

        if self.unwrap_key {
            context.replace_value(key);
        }
        context.mark_value_modified();
        Ok(())
    }

    fn name(&self) -> &str {
        "unwrap-key-value"
    }
}
