use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque customer identifier as served by the customer directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id stands for "no customer chosen".
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_count_as_empty() {
        assert!(CustomerId::new("").is_empty());
        assert!(CustomerId::new("   ").is_empty());
        assert!(!CustomerId::new("A").is_empty());
    }

    #[test]
    fn deserializes_from_plain_json_string() {
        let ids: Vec<CustomerId> = serde_json::from_str(r#"["A","cust-7"]"#).unwrap();
        assert_eq!(ids, vec![CustomerId::from("A"), CustomerId::from("cust-7")]);
    }
}
