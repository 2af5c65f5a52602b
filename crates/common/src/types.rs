use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entity or aggregate instance.
///
/// An opaque string token compared by value. Generated identifiers are
/// random v4 UUIDs drawn from the operating system's cryptographically
/// secure RNG, so no weaker fallback source exists. Identifiers supplied by
/// callers (e.g. loaded from storage) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueEntityId(String);

impl UniqueEntityId {
    /// Creates a new random identifier.
    pub fn new() -> Self {
        Self::generate()
    }

    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing token.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `other` is present and carries the same token.
    pub fn equals(&self, other: Option<&UniqueEntityId>) -> bool {
        other.is_some_and(|other| other.0 == self.0)
    }
}

impl Default for UniqueEntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UniqueEntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UniqueEntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UniqueEntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<Uuid> for UniqueEntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<UniqueEntityId> for String {
    fn from(id: UniqueEntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for UniqueEntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
