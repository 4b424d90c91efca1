//! Block state in the host world: node markers and storage containers.

use super::item::ItemStack;
use crate::world::Destination;

/// Default number of slots in a storage container (single chest)
pub const CONTAINER_SLOTS: usize = 27;

/// Default maximum units per slot
pub const MAX_STACK: u32 = 64;

/// What occupies a block position
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// The marker block a node sits on
    Hopper,
    /// A storage-capable block
    Container(Container),
    /// Any other block
    Solid,
}

/// Slot inventory that accepts stacks the way a chest does: top up
/// matching partial stacks first, then spill into empty slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub slots: Vec<Option<ItemStack>>,
    pub max_stack: u32,
}

impl Container {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            max_stack: MAX_STACK,
        }
    }

    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self
    }

    /// Total units held across all slots
    pub fn total(&self) -> u64 {
        self.slots
            .iter()
            .flatten()
            .map(|s| s.amount as u64)
            .sum()
    }

    /// Units of one kind held across all slots
    pub fn count_of(&self, kind: &str) -> u64 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.kind.as_str() == kind)
            .map(|s| s.amount as u64)
            .sum()
    }

    /// How many more units of `stack.kind` would fit
    pub fn free_capacity_for(&self, stack: &ItemStack) -> u64 {
        self.slots
            .iter()
            .map(|slot| match slot {
                None => self.max_stack as u64,
                Some(s) if s.kind == stack.kind => {
                    self.max_stack.saturating_sub(s.amount) as u64
                }
                Some(_) => 0,
            })
            .sum()
    }

    /// Store as much of `stack` as fits, returning what did not
    pub fn add(&mut self, stack: &ItemStack) -> u32 {
        let mut remaining = stack.amount;

        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.kind == stack.kind && slot.amount < self.max_stack {
                let moved = remaining.min(self.max_stack - slot.amount);
                slot.amount += moved;
                remaining -= moved;
            }
        }

        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let moved = remaining.min(self.max_stack);
                *slot = Some(stack.with_amount(moved));
                remaining -= moved;
            }
        }

        remaining
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(CONTAINER_SLOTS)
    }
}

impl Destination for Container {
    fn offer(&mut self, stack: &ItemStack) -> u32 {
        self.add(stack)
    }
}
