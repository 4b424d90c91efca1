//! Placement, removal and link-tool events from the host world

use uuid::Uuid;

use crate::components::BlockKey;
use crate::node::{HopperNode, NodeSnapshot};
use crate::portable::PortableHopper;
use crate::registry::HopperRegistry;
use crate::world::HostWorld;

/// Result of using the link tool on a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked { count: usize, max: usize },
    /// The clicked block offers no storage
    NotAContainer,
    /// The tool points at a node that is gone
    HopperMissing,
    /// Already linked or at capacity
    Rejected,
}

/// A node item was placed at `key`. Restores filter, links and counters
/// from `record` when the item carried one. Returns `None` if the registry
/// refused the key.
pub fn on_place(
    registry: &mut HopperRegistry,
    key: BlockKey,
    owner: Uuid,
    record: Option<&PortableHopper>,
) -> Option<NodeSnapshot> {
    let node = match record {
        Some(record) => record.to_node(Some(owner), registry.max_links()),
        None => HopperNode::new(Some(owner), Default::default(), Default::default()),
    };
    let snapshot = node.snapshot(&key, registry.max_links());
    if !registry.insert_node(key.clone(), node) {
        return None;
    }
    log::info!("Hopper placed at {} by {}", key, owner);
    Some(snapshot)
}

/// The block at `key` was broken. Returns the record to put on the dropped
/// item, or `None` if no node lived there.
pub fn on_break(registry: &mut HopperRegistry, key: &BlockKey) -> Option<PortableHopper> {
    let node = registry.unregister(key)?;
    log::info!("Hopper removed at {}", key);
    Some(PortableHopper::from_node(&node))
}

/// Link tool used on `target` for the node at `hopper`
pub fn link_container<W: HostWorld>(
    registry: &mut HopperRegistry,
    world: &W,
    hopper: &BlockKey,
    target: BlockKey,
) -> LinkOutcome {
    if !world.is_storage(&target) {
        return LinkOutcome::NotAContainer;
    }
    if !registry.exists(hopper) {
        return LinkOutcome::HopperMissing;
    }
    if !registry.add_link(hopper, target) {
        return LinkOutcome::Rejected;
    }

    let count = registry
        .lookup(hopper)
        .map(|node| node.links.len())
        .unwrap_or(0);
    LinkOutcome::Linked {
        count,
        max: registry.max_links(),
    }
}
