//! Registry of decoders for user-defined (`u`-tagged) classes.

use std::collections::HashMap;

use crate::error::MarshalError;
use crate::types::CustomValue;

/// A registered decode function: raw payload bytes to an opaque value.
pub type DecodeFn =
    Box<dyn Fn(&[u8]) -> Result<Box<dyn CustomValue>, MarshalError> + Send + Sync>;

/// Maps class names to decode functions for `u`-tagged values.
///
/// Populated before decoding and passed to the [`Decoder`](crate::Decoder)
/// by reference; the decoder never mutates it, so one registry may be shared
/// across concurrent decodes once registration is done.
#[derive(Default)]
pub struct Registry {
    decoders: HashMap<String, DecodeFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `class_name` with a decode function. Re-registering a name
    /// overwrites the previous function.
    pub fn register<F, T>(&mut self, class_name: impl Into<String>, decode: F)
    where
        F: Fn(&[u8]) -> Result<T, MarshalError> + Send + Sync + 'static,
        T: CustomValue,
    {
        self.decoders.insert(
            class_name.into(),
            Box::new(move |payload| decode(payload).map(|v| Box::new(v) as Box<dyn CustomValue>)),
        );
    }

    /// Looks up the decode function for `class_name`.
    pub fn resolve(&self, class_name: &str) -> Option<&DecodeFn> {
        self.decoders.get(class_name)
    }

    pub fn is_registered(&self, class_name: &str) -> bool {
        self.decoders.contains_key(class_name)
    }
}
