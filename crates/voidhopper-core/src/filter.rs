//! Void filter - resource kinds a node destroys on contact

use crate::components::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidFilter {
    kinds: HashSet<ResourceKind>,
}

impl VoidFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: &ResourceKind) -> bool {
        self.kinds.contains(kind)
    }

    /// Returns false if the kind was already filtered
    pub fn insert(&mut self, kind: ResourceKind) -> bool {
        self.kinds.insert(kind)
    }

    /// Returns false if the kind was not filtered
    pub fn remove(&mut self, kind: &ResourceKind) -> bool {
        self.kinds.remove(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceKind> {
        self.kinds.iter()
    }

    /// Kinds in lexical order, for stable file and tag output
    pub fn sorted(&self) -> Vec<&ResourceKind> {
        let mut kinds: Vec<&ResourceKind> = self.kinds.iter().collect();
        kinds.sort();
        kinds
    }
}

impl FromIterator<ResourceKind> for VoidFilter {
    fn from_iter<I: IntoIterator<Item = ResourceKind>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}
