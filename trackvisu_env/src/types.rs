//! Common types for the TrackVisu collaborator layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a pooled resource.
///
/// Uses UUID v4 so handles stay distinct across pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub Uuid);

impl ResourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // first 8 chars are enough in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Kind of resource a pool keeps separate idle queues for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceTag(String);

impl ResourceTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl std::fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
