//! Host world contract.
//!
//! The transfer engine only ever talks to the world through [`HostWorld`]
//! and to storage through [`Destination`]. [`SimWorld`] is the in-process
//! implementation used by the tests, the benchmark and the simtest harness.

mod sim;

pub use sim::SimWorld;

use crate::components::{BlockKey, ItemStack, Vec3};

/// Anything that can take units: `offer` stores what fits and returns the
/// unaccepted remainder.
pub trait Destination {
    fn offer(&mut self, stack: &ItemStack) -> u32;
}

/// Outcome of resolving a link endpoint at pass time
pub enum Resolution<'a> {
    /// Endpoint offers storage right now
    Ready(&'a mut dyn Destination),
    /// World or chunk not active; try again next pass
    Unavailable,
    /// Nothing storage-capable at the endpoint any more
    Invalid,
}

/// Snapshot of a loose unit as returned by the spatial query
#[derive(Debug, Clone, PartialEq)]
pub struct LooseItem {
    pub stack: ItemStack,
    pub position: Vec3,
    pub pickup_delay: u32,
}

/// Spatial and block queries the core needs from its host.
///
/// All calls happen on the single logic thread that drives passes.
pub trait HostWorld {
    /// Handle to a loose unit entity
    type ItemId: Copy + Eq + std::fmt::Debug;

    /// Whether a world with this name exists at all
    fn world_exists(&self, world: &str) -> bool;

    /// World loaded and the chunk containing `key` loaded
    fn is_region_active(&self, key: &BlockKey) -> bool;

    /// Whether the block at `key` is still the node marker
    fn is_hopper_block(&self, key: &BlockKey) -> bool;

    /// Whether the block at `key` offers storage
    fn is_storage(&self, key: &BlockKey) -> bool;

    /// Live loose units inside the cube of half-size `radius` around
    /// `center`, in a stable order
    fn nearby_items(&self, world: &str, center: Vec3, radius: f64) -> Vec<Self::ItemId>;

    fn item(&self, id: Self::ItemId) -> Option<LooseItem>;

    fn set_item_amount(&mut self, id: Self::ItemId, amount: u32);

    fn remove_item(&mut self, id: Self::ItemId);

    fn set_item_velocity(&mut self, id: Self::ItemId, velocity: Vec3);

    fn resolve_destination(&mut self, key: &BlockKey) -> Resolution<'_>;
}
