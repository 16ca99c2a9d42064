//! Re-encodes the key and/or value as a primitive type.

use crate::conversion::convert;
use kvx_error::{KvxError, Result};
use kvx_traits::TransformStep;
use kvx_types::{PrimitiveType, TransformContext};
use tracing::{debug, trace};

/// Converts each addressed side to a target primitive type.
///
/// Both sides are converted before either is written back, so a failing
/// conversion leaves the context exactly as it was.
#[derive(Debug, Clone, Copy)]
pub struct CastStep {
    key_type: Option<PrimitiveType>,
    value_type: Option<PrimitiveType>,
}

impl CastStep {
    /// Creates a cast step.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if neither target type is given.
    pub fn new(key_type: Option<PrimitiveType>, value_type: Option<PrimitiveType>) -> Result<Self> {
        if key_type.is_none() && value_type.is_none() {
            return Err(KvxError::Config(
                "cast requires a key or value schema type".to_string(),
            ));
        }
        debug!(?key_type, ?value_type, "Created CastStep");
        Ok(Self {
            key_type,
            value_type,
        })
    }

    /// Casts only the value side.
    pub fn value(target: PrimitiveType) -> Self {
        Self {
            key_type: None,
            value_type: Some(target),
        }
    }

    /// Casts only the key side.
    pub fn key(target: PrimitiveType) -> Self {
        Self {
            key_type: Some(target),
            value_type: None,
        }
    }

    pub fn key_type(&self) -> Option<PrimitiveType> {
        self.key_type
    }

    pub fn value_type(&self) -> Option<PrimitiveType> {
        self.value_type
    }
}

impl TransformStep for CastStep {
    fn process(&self, context: &mut TransformContext) -> Result<()> {
        let key = match (self.key_type, context.key()) {
            (Some(target), Some(key)) => convert(key, target)?,
            _ => None,
        };
        let value = match self.value_type {
            Some(target) => convert(context.value(), target)?,
            None => None,
        };

        if key.is_none() && value.is_none() {
            trace!("Already in target representation");
        }
        if let Some(key) = key {
            context.replace_key(key);
        }
        if let Some(value) = value {
            context.replace_value(value);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "cast"
    }
}
