//! Hashed shader-visible names.
//!
//! A [`BindName`] identifies a parameter, texture or constant buffer as the
//! shader sees it. The xxh3 hash is computed once at construction so map
//! lookups and equality checks rarely touch the string.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use xxhash_rust::xxh3::xxh3_64;

/// A shader-visible name with a precomputed hash.
#[derive(Clone)]
pub struct BindName {
    name: Arc<str>,
    hash: u64,
}

impl BindName {
    /// Create a bind name, hashing it once.
    pub fn new(name: &str) -> Self {
        Self {
            hash: xxh3_64(name.as_bytes()),
            name: Arc::from(name),
        }
    }

    /// The name as written in the shader.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The precomputed xxh3 hash of the name.
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Strip `prefix`, returning the remainder as a new bind name.
    pub fn strip_prefix(&self, prefix: &str) -> Option<BindName> {
        self.name.strip_prefix(prefix).map(BindName::new)
    }

    /// Whether the name is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for BindName {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for BindName {}

impl Hash for BindName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialOrd for BindName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BindName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialEq<str> for BindName {
    fn eq(&self, other: &str) -> bool {
        &*self.name == other
    }
}

impl PartialEq<&str> for BindName {
    fn eq(&self, other: &&str) -> bool {
        &*self.name == *other
    }
}

impl From<&str> for BindName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BindName {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl AsRef<str> for BindName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for BindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for BindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindName({:?})", &*self.name)
    }
}

impl Serialize for BindName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for BindName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(BindName::new(&name))
    }
}

static_assertions::assert_impl_all!(BindName: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equal_names_hash_equal() {
        let a = BindName::new("uniWorldMatrix");
        let b = BindName::from("uniWorldMatrix".to_string());
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
        assert_ne!(a, BindName::new("uniViewMatrix"));
    }

    #[test]
    fn strip_prefix() {
        let name = BindName::new("uniInvert_uniWorldMatrix");
        assert_eq!(
            name.strip_prefix("uniInvert_"),
            Some(BindName::new("uniWorldMatrix"))
        );
        assert_eq!(name.strip_prefix("uniRcp_"), None);
    }

    #[test]
    fn usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(BindName::new("a"), 1);
        assert_eq!(map.get(&BindName::new("a")), Some(&1));
    }

    #[test]
    fn compares_with_str() {
        let name = BindName::new("uniTime");
        assert!(name == "uniTime");
        assert_eq!(name.to_string(), "uniTime");
    }
}
