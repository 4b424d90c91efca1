//! Node state: one placed hopper

use crate::components::{BlockKey, ResourceKind};
use crate::filter::VoidFilter;
use crate::links::LinkGraph;
use serde::Serialize;
use uuid::Uuid;

/// A placed routing node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HopperNode {
    pub owner: Option<Uuid>,
    pub filter: VoidFilter,
    pub links: LinkGraph,
    /// Lifetime units routed into destinations
    pub items_collected: u64,
    /// Lifetime units destroyed by the filter
    pub items_voided: u64,
}

impl HopperNode {
    pub fn new(owner: Option<Uuid>, filter: VoidFilter, links: LinkGraph) -> Self {
        Self {
            owner,
            filter,
            links,
            items_collected: 0,
            items_voided: 0,
        }
    }

    pub fn record_collected(&mut self, amount: u32) {
        self.items_collected = self.items_collected.saturating_add(amount as u64);
    }

    pub fn record_voided(&mut self, amount: u32) {
        self.items_voided = self.items_voided.saturating_add(amount as u64);
    }

    pub fn snapshot(&self, key: &BlockKey, max_links: usize) -> NodeSnapshot {
        NodeSnapshot {
            key: key.clone(),
            owner: self.owner,
            filter: self.filter.sorted().into_iter().cloned().collect(),
            links: self.links.as_slice().to_vec(),
            max_links,
            items_collected: self.items_collected,
            items_voided: self.items_voided,
        }
    }
}

/// Read-only copy of a node for display by a configuration surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub key: BlockKey,
    pub owner: Option<Uuid>,
    /// Filtered kinds, sorted
    pub filter: Vec<ResourceKind>,
    /// Endpoints in routing order
    pub links: Vec<BlockKey>,
    pub max_links: usize,
    pub items_collected: u64,
    pub items_voided: u64,
}
