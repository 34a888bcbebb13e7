//! Model descriptors and fetch options.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a model type within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Options forwarded to the store on a fetch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FindOptions {
    /// Bypass cached records and refetch from the backing source
    #[serde(default)]
    pub reload: bool,
}
