//! Element attributes and attribute updates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The attributes of an element start: an ordered map of name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// An empty attribute map.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insertion of one attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The attributes that result from applying `update`.
    ///
    /// The update's old values are not checked here; see
    /// [`AttributesUpdate::matches`].
    pub fn updated(&self, update: &AttributesUpdate) -> Attributes {
        let mut map = self.0.clone();
        for change in update.changes() {
            match &change.new {
                Some(value) => {
                    map.insert(change.key.clone(), value.clone());
                }
                None => {
                    map.remove(&change.key);
                }
            }
        }
        Attributes(map)
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One entry of an attribute update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeChange {
    pub key: String,
    /// Value before the update; `None` if the attribute was absent.
    pub old: Option<String>,
    /// Value after the update; `None` removes the attribute.
    pub new: Option<String>,
}

/// A set of attribute changes with unique keys, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributesUpdate(Vec<AttributeChange>);

impl AttributesUpdate {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add (or overwrite) the change for `key`.
    pub fn with(
        mut self,
        key: impl Into<String>,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Self {
        self.set(AttributeChange {
            key: key.into(),
            old: old.map(str::to_string),
            new: new.map(str::to_string),
        });
        self
    }

    fn set(&mut self, change: AttributeChange) {
        match self.0.binary_search_by(|c| c.key.cmp(&change.key)) {
            Ok(i) => self.0[i] = change,
            Err(i) => self.0.insert(i, change),
        }
    }

    pub fn changes(&self) -> &[AttributeChange] {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&AttributeChange> {
        self.0
            .binary_search_by(|c| c.key.as_str().cmp(key))
            .ok()
            .map(|i| &self.0[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether every old value agrees with `attributes`.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        self.0
            .iter()
            .all(|c| attributes.get(&c.key) == c.old.as_deref())
    }

    /// The update equivalent to applying `self` and then `next`.
    pub fn compose(&self, next: &AttributesUpdate) -> AttributesUpdate {
        let mut result = self.clone();
        for change in next.changes() {
            let old = match self.get(&change.key) {
                Some(first) => first.old.clone(),
                None => change.old.clone(),
            };
            result.set(AttributeChange {
                key: change.key.clone(),
                old,
                new: change.new.clone(),
            });
        }
        result
    }

    /// The update that undoes this one.
    pub fn invert(&self) -> AttributesUpdate {
        AttributesUpdate(
            self.0
                .iter()
                .map(|c| AttributeChange {
                    key: c.key.clone(),
                    old: c.new.clone(),
                    new: c.old.clone(),
                })
                .collect(),
        )
    }

    /// Replace old values of keys that `base` also changes with `base`'s new
    /// values, so this update applies after `base`.
    pub fn rebase_onto(&self, base: &AttributesUpdate) -> AttributesUpdate {
        AttributesUpdate(
            self.0
                .iter()
                .map(|c| match base.get(&c.key) {
                    Some(b) => AttributeChange {
                        key: c.key.clone(),
                        old: b.new.clone(),
                        new: c.new.clone(),
                    },
                    None => c.clone(),
                })
                .collect(),
        )
    }

    /// Drop every key that `other` changes.
    pub fn without_keys_of(&self, other: &AttributesUpdate) -> AttributesUpdate {
        AttributesUpdate(
            self.0
                .iter()
                .filter(|c| !other.contains_key(&c.key))
                .cloned()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_updated_sets_and_removes() {
        let base = attrs(&[("a", "1"), ("b", "2")]);
        let update = AttributesUpdate::new()
            .with("a", Some("1"), Some("9"))
            .with("b", Some("2"), None)
            .with("c", None, Some("3"));

        assert!(update.matches(&base));
        assert_eq!(base.updated(&update), attrs(&[("a", "9"), ("c", "3")]));
    }

    #[test]
    fn test_update_keys_stay_sorted_and_unique() {
        let update = AttributesUpdate::new()
            .with("z", None, Some("1"))
            .with("a", None, Some("2"))
            .with("z", None, Some("3"));
        let keys: Vec<_> = update.changes().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "z"]);
        assert_eq!(update.get("z").and_then(|c| c.new.as_deref()), Some("3"));
    }

    #[test]
    fn test_compose_keeps_first_old_and_last_new() {
        let first = AttributesUpdate::new().with("a", Some("1"), Some("2"));
        let second = AttributesUpdate::new()
            .with("a", Some("2"), Some("3"))
            .with("b", None, Some("x"));
        let composed = first.compose(&second);
        assert_eq!(
            composed,
            AttributesUpdate::new()
                .with("a", Some("1"), Some("3"))
                .with("b", None, Some("x"))
        );
    }

    #[test]
    fn test_invert_restores() {
        let base = attrs(&[("a", "1")]);
        let update = AttributesUpdate::new()
            .with("a", Some("1"), None)
            .with("b", None, Some("2"));
        let after = base.updated(&update);
        assert!(update.invert().matches(&after));
        assert_eq!(after.updated(&update.invert()), base);
    }

    #[test]
    fn test_rebase_and_exclude() {
        let client = AttributesUpdate::new()
            .with("a", Some("1"), Some("c"))
            .with("b", None, Some("c"));
        let server = AttributesUpdate::new()
            .with("a", Some("1"), Some("s"))
            .with("z", None, Some("s"));

        let rebased = client.rebase_onto(&server);
        assert_eq!(rebased.get("a").and_then(|c| c.old.as_deref()), Some("s"));
        assert_eq!(rebased.get("b").and_then(|c| c.old.as_deref()), None);

        let excluded = server.without_keys_of(&client);
        assert!(!excluded.contains_key("a"));
        assert!(excluded.contains_key("z"));
    }

    fn arb_value() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-c]")
    }

    proptest! {
        #[test]
        fn prop_update_inverse_restores(
            base in prop::collection::btree_map("[a-d]", "[a-c]", 0..4),
            changes in prop::collection::btree_map("[a-d]", arb_value(), 0..4),
        ) {
            let base: Attributes = base.into_iter().collect();
            let update = changes.iter().fold(AttributesUpdate::new(), |u, (k, new)| {
                u.with(k.clone(), base.get(k), new.as_deref())
            });
            prop_assert!(update.matches(&base));
            let after = base.updated(&update);
            prop_assert!(update.invert().matches(&after));
            prop_assert_eq!(after.updated(&update.invert()), base);
        }
    }
}
