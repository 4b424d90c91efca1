//! Link graph - a node's ordered, capacity-bounded destination list.
//!
//! Order is insertion order and is never rotated: the transfer engine always
//! tries endpoints front to back.

use crate::components::BlockKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGraph {
    endpoints: Vec<BlockKey>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `dest` unless the list already holds `max` endpoints, already
    /// contains `dest`, or `dest` has no stable text form
    pub fn try_add(&mut self, dest: BlockKey, max: usize) -> bool {
        if self.endpoints.len() >= max || self.contains(&dest) || !dest.is_encodable() {
            return false;
        }
        self.endpoints.push(dest);
        true
    }

    /// Remove `dest`, keeping the order of the remaining endpoints
    pub fn prune(&mut self, dest: &BlockKey) -> bool {
        match self.endpoints.iter().position(|e| e == dest) {
            Some(idx) => {
                self.endpoints.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, dest: &BlockKey) -> bool {
        self.endpoints.iter().any(|e| e == dest)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockKey> {
        self.endpoints.iter()
    }

    pub fn as_slice(&self) -> &[BlockKey] {
        &self.endpoints
    }

    /// Build from an ordered list, applying the cap and duplicate rule
    pub fn from_ordered(keys: impl IntoIterator<Item = BlockKey>, max: usize) -> Self {
        let mut graph = Self::new();
        for key in keys {
            graph.try_add(key, max);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chest(x: i32) -> BlockKey {
        BlockKey::new("world", x, 64, 0)
    }

    #[test]
    fn test_try_add_rejects_duplicates_and_overflow() {
        let mut links = LinkGraph::new();
        assert!(links.try_add(chest(1), 2));
        assert!(!links.try_add(chest(1), 2));
        assert!(links.try_add(chest(2), 2));
        assert!(!links.try_add(chest(3), 2));
        assert_eq!(links.as_slice(), &[chest(1), chest(2)]);
    }

    #[test]
    fn test_prune_keeps_order() {
        let mut links = LinkGraph::from_ordered((1..=4).map(chest), 8);
        assert!(links.prune(&chest(2)));
        assert!(!links.prune(&chest(2)));
        assert_eq!(links.as_slice(), &[chest(1), chest(3), chest(4)]);
    }

    #[test]
    fn test_from_ordered_applies_cap() {
        let links = LinkGraph::from_ordered(vec![chest(1), chest(1), chest(2), chest(3)], 2);
        assert_eq!(links.as_slice(), &[chest(1), chest(2)]);
    }

    #[test]
    fn test_unencodable_endpoint_is_refused() {
        let mut links = LinkGraph::new();
        assert!(!links.try_add(BlockKey::new("w;x", 1, 1, 1), 8));
        assert!(links.is_empty());
    }
}
