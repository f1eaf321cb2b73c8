use std::collections::HashMap;

/// An entity with a unique string key
pub(crate) trait Keyed {
    /// The entity's primary key
    fn key(&self) -> &str;
}

/// Keyed collection that iterates in insertion order
#[derive(Debug, Clone)]
pub(crate) struct Registry<T> {
    /// Keys in insertion order
    order: Vec<String>,
    /// Entities by key
    entries: HashMap<String, T>,
}

impl<T: Keyed> Registry<T> {
    /// Create an empty registry
    pub(crate) fn new() -> Self {
        Self { order: Vec::new(), entries: HashMap::new() }
    }

    /// Insert `item` unless its key is taken; returns whether it was inserted
    pub(crate) fn insert(&mut self, item: T) -> bool {
        let key = item.key().to_string();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.order.push(key.clone());
        self.entries.insert(key, item);
        true
    }

    /// Look up by key
    pub(crate) fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Look up by key for mutation
    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    /// Remove the entry under `key` if it exists and `allowed` approves it
    pub(crate) fn remove_if(&mut self, key: &str, allowed: impl FnOnce(&T) -> bool) -> bool {
        if !self.entries.get(key).is_some_and(allowed) {
            return false;
        }
        self.entries.remove(key);
        self.order.retain(|k| k != key);
        true
    }

    /// Entities in insertion order
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Number of entities
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Keyed, Registry};

    /// Minimal keyed item
    #[derive(Debug, PartialEq)]
    struct Item(&'static str, u32);

    impl Keyed for Item {
        fn key(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_insert_is_first_writer_wins() {
        let mut registry = Registry::new();
        assert!(registry.insert(Item("a", 1)));
        assert!(!registry.insert(Item("a", 2)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a"), Some(&Item("a", 1)));
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut registry = Registry::new();
        for (key, n) in [("c", 1), ("a", 2), ("b", 3)] {
            assert!(registry.insert(Item(key, n)));
        }
        let keys: Vec<&str> = registry.iter().map(Keyed::key).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_remove_if_respects_predicate() {
        let mut registry = Registry::new();
        assert!(registry.insert(Item("a", 1)));
        assert!(registry.insert(Item("b", 2)));

        assert!(!registry.remove_if("a", |item| item.1 > 1));
        assert!(!registry.remove_if("missing", |_| true));
        assert!(registry.remove_if("b", |item| item.1 > 1));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("b").is_none());
        assert_eq!(registry.iter().count(), 1);
    }
}
