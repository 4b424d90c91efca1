//! Transfer system - one vacuum pass over every registered node
//!
//! For each node: check it is still live, scan loose units around it, void
//! filtered kinds, and route the rest through its links front to back.
//! Whatever no destination takes is nudged toward the node and left in the
//! world.

use serde::Serialize;

use crate::components::{BlockKey, ItemStack, Vec3};
use crate::config::HopperConfig;
use crate::node::HopperNode;
use crate::registry::HopperRegistry;
use crate::world::{HostWorld, Resolution};

/// What one pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Nodes whose surroundings were scanned
    pub nodes_visited: usize,
    /// Nodes skipped because their region was inactive
    pub nodes_skipped_inactive: usize,
    /// Nodes removed because their marker block was gone
    pub nodes_deregistered: usize,
    /// Nodes that hit the per-pass transfer cap
    pub nodes_throttled: usize,
    /// Endpoints removed because they no longer offer storage
    pub links_pruned: usize,
    pub units_collected: u64,
    pub units_voided: u64,
    /// Loose unit entities fully consumed (routed or voided)
    pub entities_removed: usize,
    pub entities_pulled: usize,
}

impl PassReport {
    /// Whether the pass changed registry structure and needs a save
    pub fn structure_changed(&self) -> bool {
        self.nodes_deregistered > 0 || self.links_pruned > 0
    }

    pub fn accumulate(&mut self, other: &PassReport) {
        self.nodes_visited += other.nodes_visited;
        self.nodes_skipped_inactive += other.nodes_skipped_inactive;
        self.nodes_deregistered += other.nodes_deregistered;
        self.nodes_throttled += other.nodes_throttled;
        self.links_pruned += other.links_pruned;
        self.units_collected += other.units_collected;
        self.units_voided += other.units_voided;
        self.entities_removed += other.entities_removed;
        self.entities_pulled += other.entities_pulled;
    }
}

/// Run one pass over a snapshot of the registry keys.
///
/// Nodes unregistered after the snapshot was taken simply miss on lookup.
/// Structural changes (deregistered nodes, pruned links) are saved once at
/// the end of the pass.
pub fn transfer_pass<W: HostWorld>(
    registry: &mut HopperRegistry,
    world: &mut W,
    config: &HopperConfig,
) -> PassReport {
    let mut report = PassReport::default();

    for key in registry.keys() {
        if !registry.exists(&key) {
            continue;
        }

        // Inactive region: transient, retry next pass
        if !world.is_region_active(&key) {
            report.nodes_skipped_inactive += 1;
            continue;
        }

        if !world.is_hopper_block(&key) {
            registry.evict(&key);
            report.nodes_deregistered += 1;
            log::debug!("Hopper {} no longer has its marker block, deregistered", key);
            continue;
        }

        let Some(node) = registry.lookup_mut(&key) else {
            continue;
        };
        report.nodes_visited += 1;
        vacuum_node(&key, node, world, config, &mut report);
    }

    if report.structure_changed() {
        registry.save();
    }

    log::debug!(
        "Pass: {} nodes, {} collected, {} voided, {} links pruned, {} deregistered",
        report.nodes_visited,
        report.units_collected,
        report.units_voided,
        report.links_pruned,
        report.nodes_deregistered
    );

    report
}

/// Scan and process the loose units around one node
fn vacuum_node<W: HostWorld>(
    key: &BlockKey,
    node: &mut HopperNode,
    world: &mut W,
    config: &HopperConfig,
    report: &mut PassReport,
) {
    let center = key.center();
    let mut routed: u64 = 0;

    for id in world.nearby_items(&key.world, center, config.vacuum_radius) {
        let Some(item) = world.item(id) else {
            continue;
        };
        // Freshly dropped: players get first pick
        if item.pickup_delay > config.pickup_grace_ticks || item.stack.is_empty() {
            continue;
        }

        let amount = item.stack.amount;

        if node.filter.contains(&item.stack.kind) {
            node.record_voided(amount);
            world.remove_item(id);
            report.units_voided += amount as u64;
            report.entities_removed += 1;
            continue;
        }

        let remaining = distribute(key, node, world, &item.stack, report);
        let accepted = amount - remaining;

        if remaining == 0 {
            world.remove_item(id);
            report.entities_removed += 1;
        } else {
            if accepted > 0 {
                world.set_item_amount(id, remaining);
            }
            if pull_toward(world, id, item.position, center, config) {
                report.entities_pulled += 1;
            }
        }

        routed += accepted as u64;
        if routed >= config.transfer_rate as u64 {
            report.nodes_throttled += 1;
            break;
        }
    }
}

/// Offer `stack` to each endpoint in link order, pruning endpoints that no
/// longer offer storage. Returns the quantity nobody accepted.
fn distribute<W: HostWorld>(
    key: &BlockKey,
    node: &mut HopperNode,
    world: &mut W,
    stack: &ItemStack,
    report: &mut PassReport,
) -> u32 {
    let mut remaining = stack.amount;
    let endpoints: Vec<BlockKey> = node.links.as_slice().to_vec();

    for dest in endpoints {
        // Endpoints past the one that took the rest are not visited, so a
        // stale one there is pruned on the first pass that reaches it
        if remaining == 0 {
            break;
        }

        match world.resolve_destination(&dest) {
            Resolution::Unavailable => continue,
            Resolution::Invalid => {
                node.links.prune(&dest);
                report.links_pruned += 1;
                log::debug!("Hopper {} lost link {}, pruned", key, dest);
            }
            Resolution::Ready(target) => {
                let left = target.offer(&stack.with_amount(remaining)).min(remaining);
                let accepted = remaining - left;
                node.record_collected(accepted);
                report.units_collected += accepted as u64;
                remaining = left;
            }
        }
    }

    remaining
}

/// Nudge a unit toward the node centre; returns whether a pull was applied
fn pull_toward<W: HostWorld>(
    world: &mut W,
    id: W::ItemId,
    from: Vec3,
    center: Vec3,
    config: &HopperConfig,
) -> bool {
    if from.distance(&center) <= config.pull_min_distance || config.pull_strength <= 0.0 {
        return false;
    }
    let direction = (center - from).normalize();
    world.set_item_velocity(id, direction * config.pull_strength);
    true
}
