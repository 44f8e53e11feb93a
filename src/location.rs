//! Location identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name of a node in the location graph.
///
/// Equality and hashing ignore case: `"Saloon"` and `"saloon"` are the same
/// location. The spelling first supplied is kept for display.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LocationId {
    name: Arc<str>,
    key: Arc<str>,
}

impl LocationId {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let lowered = name.to_lowercase();
        let display: Arc<str> = Arc::from(name);
        // Already-normalized names share one allocation.
        let key = if lowered == name {
            display.clone()
        } else {
            Arc::from(lowered)
        };
        Self { name: display, key }
    }

    /// Display spelling.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-normalized key used for equality and hashing.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for LocationId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for LocationId {}

impl Hash for LocationId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for LocationId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocationId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationId({:?})", self.name)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for LocationId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for LocationId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<LocationId> for String {
    fn from(id: LocationId) -> Self {
        id.name.to_string()
    }
}

impl Borrow<str> for LocationId {
    fn borrow(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(LocationId::new("Saloon"), LocationId::new("SALOON"));
        assert_ne!(LocationId::new("Saloon"), LocationId::new("Town"));
    }

    #[test]
    fn test_hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(LocationId::new("BusStop"));
        assert!(set.contains(&LocationId::new("busstop")));
        assert!(set.contains("busstop"));
    }

    #[test]
    fn test_display_keeps_spelling() {
        let id = LocationId::new("JojaMart");
        assert_eq!(id.to_string(), "JojaMart");
        assert_eq!(id.key(), "jojamart");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id: LocationId = serde_json::from_str("\"Beach\"").unwrap();
        assert_eq!(id, LocationId::new("beach"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Beach\"");
    }
}
