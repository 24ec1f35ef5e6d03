//! ProviderId - Cheap-to-clone provider-space identifier
//!
//! Event ids, provider player ids and provider team ids come in whatever shape
//! the provider uses (integers, UUIDs, numeric strings). They are kept verbatim
//! as `Arc<str>` so cloning them across results and report rows is O(1).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Provider-space identifier with cheap cloning.
///
/// # Examples
/// ```
/// use contracts::ProviderId;
///
/// let id: ProviderId = "8f2c1a".into();
/// let id2 = id.clone();
/// assert_eq!(id, id2);
/// assert_eq!(ProviderId::from(1234_i64).as_str(), "1234");
/// ```
#[derive(Clone, Default)]
pub struct ProviderId(Arc<str>);

impl ProviderId {
    /// Create a new ProviderId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id carries no characters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for ProviderId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ProviderId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProviderId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for ProviderId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<i64> for ProviderId {
    fn from(value: i64) -> Self {
        Self::from(value.to_string())
    }
}

impl From<u64> for ProviderId {
    fn from(value: u64) -> Self {
        Self::from(value.to_string())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({:?})", self.0)
    }
}

impl PartialEq for ProviderId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for ProviderId {}

impl PartialEq<str> for ProviderId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for ProviderId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Hash for ProviderId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for ProviderId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProviderId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Serialize for ProviderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Providers mix numeric and string ids for the same concept.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Self::from(v),
            Raw::Str(s) => Self::from(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clone_is_cheap() {
        let id1: ProviderId = "a1b2".into();
        let id2 = id1.clone();
        assert_eq!(id1.as_str().as_ptr(), id2.as_str().as_ptr());
    }

    #[test]
    fn test_hashmap_lookup_by_str() {
        let mut map: HashMap<ProviderId, u64> = HashMap::new();
        map.insert("p1".into(), 1);
        map.insert(ProviderId::from(42_i64), 2);

        assert_eq!(map.get("p1"), Some(&1));
        assert_eq!(map.get("42"), Some(&2));
    }

    #[test]
    fn test_deserialize_numeric_and_string() {
        let ids: Vec<ProviderId> = serde_json::from_str(r#"[17, "17", "x-9"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], "x-9");

        let json = serde_json::to_string(&ids[0]).unwrap();
        assert_eq!(json, "\"17\"");
    }
}
