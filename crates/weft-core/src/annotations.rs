//! Annotation boundaries and the set of annotation changes active at a
//! point of an operation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;

/// A change of one annotation key from `old` to `new`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueChange {
    pub old: Option<String>,
    pub new: Option<String>,
}

impl ValueChange {
    pub fn new(old: Option<&str>, new: Option<&str>) -> Self {
        Self {
            old: old.map(str::to_string),
            new: new.map(str::to_string),
        }
    }

    /// The change in the opposite direction.
    pub fn inverted(&self) -> Self {
        Self {
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }
}

/// An annotation boundary: keys whose change ends here, and keys whose
/// change starts (or is replaced) here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationBoundary {
    pub ends: BTreeSet<String>,
    pub changes: BTreeMap<String, ValueChange>,
}

impl AnnotationBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: end the change of `key`.
    pub fn end(mut self, key: impl Into<String>) -> Self {
        self.ends.insert(key.into());
        self
    }

    /// Builder-style: start changing `key` from `old` to `new`.
    pub fn change(mut self, key: impl Into<String>, old: Option<&str>, new: Option<&str>) -> Self {
        self.changes.insert(key.into(), ValueChange::new(old, new));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty() && self.changes.is_empty()
    }

    /// The boundary that moves an operation from the `from` active set to
    /// the `to` active set.
    pub fn between(from: &ActiveAnnotations, to: &ActiveAnnotations) -> Self {
        let ends = from
            .keys()
            .filter(|k| !to.contains_key(*k))
            .cloned()
            .collect();
        let changes = to
            .iter()
            .filter(|(k, v)| from.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { ends, changes }
    }

    /// The same boundary with every change reversed.
    pub fn inverted(&self) -> Self {
        Self {
            ends: self.ends.clone(),
            changes: self
                .changes
                .iter()
                .map(|(k, v)| (k.clone(), v.inverted()))
                .collect(),
        }
    }
}

/// Annotation changes active at a point of an operation, keyed by name.
pub type ActiveAnnotations = BTreeMap<String, ValueChange>;

/// Advance `active` past `boundary`.
///
/// Fails if the boundary ends a key that is not active, or both ends and
/// changes the same key.
pub fn apply_boundary(
    active: &mut ActiveAnnotations,
    boundary: &AnnotationBoundary,
) -> Result<(), ValidationError> {
    for key in &boundary.ends {
        if boundary.changes.contains_key(key) {
            return Err(ValidationError::AnnotationKeyConflict(key.clone()));
        }
        if active.remove(key).is_none() {
            return Err(ValidationError::AnnotationNotActive(key.clone()));
        }
    }
    for (key, change) in &boundary.changes {
        active.insert(key.clone(), change.clone());
    }
    Ok(())
}

/// Apply the active changes to an item's annotation values.
pub fn annotate(values: &mut BTreeMap<String, String>, active: &ActiveAnnotations) {
    for (key, change) in active {
        match &change.new {
            Some(value) => {
                values.insert(key.clone(), value.clone());
            }
            None => {
                values.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_boundary_tracks_active_keys() {
        let mut active = ActiveAnnotations::new();
        let open = AnnotationBoundary::new().change("bold", None, Some("true"));
        apply_boundary(&mut active, &open).unwrap();
        assert_eq!(active.len(), 1);

        let close = AnnotationBoundary::new().end("bold");
        apply_boundary(&mut active, &close).unwrap();
        assert!(active.is_empty());
    }

    #[test]
    fn test_apply_boundary_rejects_unknown_end() {
        let mut active = ActiveAnnotations::new();
        let close = AnnotationBoundary::new().end("bold");
        assert!(matches!(
            apply_boundary(&mut active, &close),
            Err(ValidationError::AnnotationNotActive(_))
        ));
    }

    #[test]
    fn test_between_is_minimal() {
        let mut from = ActiveAnnotations::new();
        from.insert("a".into(), ValueChange::new(None, Some("1")));
        from.insert("b".into(), ValueChange::new(None, Some("2")));
        let mut to = ActiveAnnotations::new();
        to.insert("a".into(), ValueChange::new(None, Some("1")));
        to.insert("c".into(), ValueChange::new(Some("x"), None));

        let boundary = AnnotationBoundary::between(&from, &to);
        assert_eq!(boundary.ends.iter().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(boundary.changes.keys().collect::<Vec<_>>(), vec!["c"]);

        let mut active = from.clone();
        apply_boundary(&mut active, &boundary).unwrap();
        assert_eq!(active, to);
    }

    #[test]
    fn test_annotate_sets_and_clears() {
        let mut values = BTreeMap::new();
        values.insert("lang".to_string(), "en".to_string());
        let mut active = ActiveAnnotations::new();
        active.insert("lang".into(), ValueChange::new(Some("en"), None));
        active.insert("bold".into(), ValueChange::new(None, Some("true")));
        annotate(&mut values, &active);
        assert_eq!(values.get("bold").map(String::as_str), Some("true"));
        assert!(!values.contains_key("lang"));
    }
}
