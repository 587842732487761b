use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque, serializable key-value payload carried across every phase of a
/// transaction. The coordinator never inspects a value it does not own
/// (spec §1, §6 "Dictionaries are serialised as opaque byte strings"); typed
/// accessors here exist only for the handful of keys the core itself reads
/// (originator, phase tag, lock-policy overrides).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dict(serde_json::Map<String, Value>);

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Copies every key from `other` into `self`, overwriting on conflict.
    /// This is the "merge its payload dictionary into the accumulated
    /// transaction dictionary" step of spec §4.5.
    pub fn merge_from(&mut self, other: &Dict) {
        for (key, value) in other.0.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, Value>> for Dict {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_conflicting_keys_and_keeps_the_rest() {
        let mut base = Dict::new();
        base.insert("a", 1).insert("b", 2);
        let mut incoming = Dict::new();
        incoming.insert("b", 3).insert("c", 4);

        base.merge_from(&incoming);

        assert_eq!(base.get_i64("a"), Some(1));
        assert_eq!(base.get_i64("b"), Some(3));
        assert_eq!(base.get_i64("c"), Some(4));
    }

    #[test]
    fn typed_accessors_return_none_on_wrong_type_or_missing_key() {
        let mut dict = Dict::new();
        dict.insert("flag", true);

        assert_eq!(dict.get_bool("flag"), Some(true));
        assert_eq!(dict.get_str("flag"), None);
        assert_eq!(dict.get_i64("missing"), None);
    }
}
