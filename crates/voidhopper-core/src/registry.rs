//! Hopper registry - every placed node keyed by its block
//!
//! The registry is an explicit store object owned by `HopperService`; there
//! is no global instance. Every state-changing call writes the registry
//! file before returning, so memory and disk differ by at most one
//! operation. A failed write is logged and memory stays authoritative until
//! the next successful save.

use std::collections::HashMap;
use uuid::Uuid;

use crate::components::{BlockKey, ResourceKind};
use crate::error::PersistenceError;
use crate::filter::VoidFilter;
use crate::links::LinkGraph;
use crate::node::{HopperNode, NodeSnapshot};
use crate::persistence::PersistenceStore;

pub struct HopperRegistry {
    nodes: HashMap<BlockKey, HopperNode>,
    store: Option<PersistenceStore>,
    max_links: usize,
}

impl HopperRegistry {
    /// Registry without a backing file
    pub fn in_memory(max_links: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            store: None,
            max_links,
        }
    }

    /// Empty registry that saves to `store`
    pub fn with_store(store: PersistenceStore, max_links: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            store: Some(store),
            max_links,
        }
    }

    /// Registry restored from `store`, keeping records whose world exists
    pub fn load(
        store: PersistenceStore,
        world_exists: impl Fn(&str) -> bool,
        max_links: usize,
    ) -> Result<Self, PersistenceError> {
        let loaded = store.load(world_exists, max_links)?;

        log::info!(
            "Loaded {} vacuum hoppers from {} ({} records dropped, {} entries dropped)",
            loaded.nodes.len(),
            store.path().display(),
            loaded.dropped_records,
            loaded.dropped_entries
        );

        Ok(Self {
            nodes: loaded.nodes,
            store: Some(store),
            max_links,
        })
    }

    pub fn max_links(&self) -> usize {
        self.max_links
    }

    // === Registration ===

    /// Create (or overwrite) the node at `key`. Returns false if the key
    /// cannot be stored.
    pub fn register(
        &mut self,
        key: BlockKey,
        owner: Option<Uuid>,
        filter: VoidFilter,
        links: impl IntoIterator<Item = BlockKey>,
    ) -> bool {
        let links = LinkGraph::from_ordered(links, self.max_links);
        self.insert_node(key, HopperNode::new(owner, filter, links))
    }

    /// Insert a fully built node, e.g. one restored from a portable record.
    /// Keys whose world name holds a separator are refused.
    pub fn insert_node(&mut self, key: BlockKey, node: HopperNode) -> bool {
        if !key.is_encodable() {
            log::warn!("Refusing hopper at {}: world name cannot be stored", key);
            return false;
        }
        if self.nodes.insert(key.clone(), node).is_some() {
            log::debug!("Hopper {} re-registered", key);
        }
        self.save();
        true
    }

    /// Remove the node at `key`, handing its state back to the caller
    pub fn unregister(&mut self, key: &BlockKey) -> Option<HopperNode> {
        let removed = self.nodes.remove(key)?;
        self.save();
        Some(removed)
    }

    /// Remove without saving; the transfer pass saves once at the end
    pub(crate) fn evict(&mut self, key: &BlockKey) -> Option<HopperNode> {
        self.nodes.remove(key)
    }

    pub fn lookup(&self, key: &BlockKey) -> Option<&HopperNode> {
        self.nodes.get(key)
    }

    pub(crate) fn lookup_mut(&mut self, key: &BlockKey) -> Option<&mut HopperNode> {
        self.nodes.get_mut(key)
    }

    pub fn exists(&self, key: &BlockKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Copy of the current key set; passes iterate this instead of the map
    pub fn keys(&self) -> Vec<BlockKey> {
        let mut keys: Vec<BlockKey> = self.nodes.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &HashMap<BlockKey, HopperNode> {
        &self.nodes
    }

    // === Link Management ===

    /// Append `dest` to the node's links. Fails without mutation if the node
    /// is unknown or the link graph refuses `dest`.
    pub fn add_link(&mut self, key: &BlockKey, dest: BlockKey) -> bool {
        let max_links = self.max_links;
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        if !node.links.try_add(dest.clone(), max_links) {
            log::debug!("Link rejected for hopper {}: {} not accepted", key, dest);
            return false;
        }
        self.save();
        true
    }

    pub fn remove_link(&mut self, key: &BlockKey, dest: &BlockKey) -> bool {
        let removed = self
            .nodes
            .get_mut(key)
            .map(|node| node.links.prune(dest))
            .unwrap_or(false);
        if removed {
            self.save();
        }
        removed
    }

    // === Filter Management ===

    pub fn add_filter(&mut self, key: &BlockKey, kind: ResourceKind) -> bool {
        let added = self
            .nodes
            .get_mut(key)
            .map(|node| node.filter.insert(kind))
            .unwrap_or(false);
        if added {
            self.save();
        }
        added
    }

    pub fn remove_filter(&mut self, key: &BlockKey, kind: &ResourceKind) -> bool {
        let removed = self
            .nodes
            .get_mut(key)
            .map(|node| node.filter.remove(kind))
            .unwrap_or(false);
        if removed {
            self.save();
        }
        removed
    }

    /// Display copy of one node
    pub fn snapshot(&self, key: &BlockKey) -> Option<NodeSnapshot> {
        self.nodes
            .get(key)
            .map(|node| node.snapshot(key, self.max_links))
    }

    // === Persistence ===

    /// Write the registry file, reporting failure to the log. Returns
    /// whether the write succeeded (always true without a store).
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save vacuum hopper data: {}", e);
                false
            }
        }
    }

    pub fn try_save(&self) -> Result<(), PersistenceError> {
        match &self.store {
            Some(store) => store.save(&self.nodes),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hopper() -> BlockKey {
        BlockKey::new("world", 0, 64, 0)
    }

    fn chest(x: i32) -> BlockKey {
        BlockKey::new("world", x, 64, 0)
    }

    fn kind(s: &str) -> ResourceKind {
        ResourceKind::new(s).unwrap()
    }

    #[test]
    fn test_register_lookup_unregister() {
        let mut registry = HopperRegistry::in_memory(8);
        assert!(!registry.exists(&hopper()));
        assert!(registry.lookup(&hopper()).is_none());

        registry.register(hopper(), None, VoidFilter::new(), vec![chest(1)]);
        assert!(registry.exists(&hopper()));
        assert_eq!(registry.lookup(&hopper()).unwrap().links.len(), 1);

        let removed = registry.unregister(&hopper()).unwrap();
        assert_eq!(removed.links.as_slice(), &[chest(1)]);
        assert!(registry.unregister(&hopper()).is_none());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut registry = HopperRegistry::in_memory(8);
        registry.register(hopper(), None, VoidFilter::new(), vec![chest(1)]);
        registry.lookup_mut(&hopper()).unwrap().items_collected = 10;

        registry.register(hopper(), None, VoidFilter::new(), vec![chest(2)]);

        let node = registry.lookup(&hopper()).unwrap();
        assert_eq!(node.links.as_slice(), &[chest(2)]);
        assert_eq!(node.items_collected, 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_link_rejections_do_not_mutate() {
        let mut registry = HopperRegistry::in_memory(2);
        assert!(!registry.add_link(&hopper(), chest(1)));

        registry.register(hopper(), None, VoidFilter::new(), Vec::new());
        assert!(registry.add_link(&hopper(), chest(1)));
        assert!(!registry.add_link(&hopper(), chest(1)));
        assert!(registry.add_link(&hopper(), chest(2)));

        let before = registry.lookup(&hopper()).unwrap().clone();
        assert!(!registry.add_link(&hopper(), chest(3)));
        assert!(!registry.add_link(&hopper(), chest(3)));
        assert_eq!(registry.lookup(&hopper()).unwrap(), &before);
    }

    #[test]
    fn test_filter_mutators() {
        let mut registry = HopperRegistry::in_memory(8);
        assert!(!registry.add_filter(&hopper(), kind("BONE")));

        registry.register(hopper(), None, VoidFilter::new(), Vec::new());
        assert!(registry.add_filter(&hopper(), kind("BONE")));
        assert!(!registry.add_filter(&hopper(), kind("BONE")));
        assert!(registry.remove_filter(&hopper(), &kind("BONE")));
        assert!(!registry.remove_filter(&hopper(), &kind("BONE")));
    }

    #[test]
    fn test_remove_link() {
        let mut registry = HopperRegistry::in_memory(8);
        registry.register(hopper(), None, VoidFilter::new(), vec![chest(1), chest(2)]);

        assert!(registry.remove_link(&hopper(), &chest(1)));
        assert!(!registry.remove_link(&hopper(), &chest(1)));
        assert_eq!(registry.snapshot(&hopper()).unwrap().links, vec![chest(2)]);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hoppers.json");
        let mut registry = HopperRegistry::with_store(PersistenceStore::new(&path), 8);

        registry.register(hopper(), Some(Uuid::nil()), VoidFilter::new(), Vec::new());
        registry.add_link(&hopper(), chest(4));
        registry.add_filter(&hopper(), kind("ARROW"));

        let reloaded = HopperRegistry::load(PersistenceStore::new(&path), |_| true, 8).unwrap();
        let node = reloaded.lookup(&hopper()).unwrap();
        assert_eq!(node.owner, Some(Uuid::nil()));
        assert_eq!(node.links.as_slice(), &[chest(4)]);
        assert!(node.filter.contains(&kind("ARROW")));

        registry.add_link(&hopper(), chest(5));
        registry.remove_link(&hopper(), &chest(4));
        let reloaded = HopperRegistry::load(PersistenceStore::new(&path), |_| true, 8).unwrap();
        assert_eq!(reloaded.lookup(&hopper()).unwrap().links.as_slice(), &[chest(5)]);

        registry.remove_filter(&hopper(), &kind("ARROW"));
        let reloaded = HopperRegistry::load(PersistenceStore::new(&path), |_| true, 8).unwrap();
        assert!(reloaded.lookup(&hopper()).unwrap().filter.is_empty());

        registry.unregister(&hopper());
        let reloaded = HopperRegistry::load(PersistenceStore::new(&path), |_| true, 8).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_unstorable_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hoppers.json");
        let mut registry = HopperRegistry::with_store(PersistenceStore::new(&path), 8);
        let odd = BlockKey::new("my:world", 1, 2, 3);

        assert!(!registry.register(odd.clone(), None, VoidFilter::new(), Vec::new()));
        assert!(!registry.exists(&odd));

        assert!(registry.register(hopper(), None, VoidFilter::new(), Vec::new()));
        assert!(!registry.add_link(&hopper(), BlockKey::new("w;x", 1, 1, 1)));

        let reloaded = HopperRegistry::load(PersistenceStore::new(&path), |_| true, 8).unwrap();
        assert_eq!(reloaded.keys(), vec![hopper()]);
        assert!(reloaded.lookup(&hopper()).unwrap().links.is_empty());
    }

    #[test]
    fn test_failed_save_keeps_memory_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("blocked.json");
        std::fs::create_dir(&path).unwrap();
        let mut registry = HopperRegistry::with_store(PersistenceStore::new(&path), 8);

        registry.register(hopper(), None, VoidFilter::new(), Vec::new());

        assert!(registry.exists(&hopper()));
        assert!(!registry.save());
        assert!(registry.try_save().is_err());
    }
}
