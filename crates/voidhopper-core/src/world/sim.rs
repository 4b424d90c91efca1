//! In-process host world backed by a `hecs` ECS.
//!
//! Loose units are entities carrying `DroppedItem`, `Position`, `Velocity`,
//! `ItemStack` and `PickupDelay`. Blocks are plain per-world maps since they
//! never move. Worlds and chunks can be unloaded to reproduce the transient
//! conditions a real server produces.

use hecs::{Entity, World};
use std::collections::{HashMap, HashSet};

use super::{HostWorld, LooseItem, Resolution};
use crate::components::*;
use crate::systems::item_physics_system;

#[derive(Debug, Default)]
struct Dimension {
    loaded: bool,
    unloaded_chunks: HashSet<(i32, i32)>,
    blocks: HashMap<(i32, i32, i32), Block>,
}

/// Reference host world
pub struct SimWorld {
    /// ECS world holding every loose unit
    pub entities: World,
    dimensions: HashMap<String, Dimension>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            entities: World::new(),
            dimensions: HashMap::new(),
        }
    }

    /// Create (or reload) a named world with every chunk loaded
    pub fn add_world(&mut self, name: impl Into<String>) {
        let dim = self.dimensions.entry(name.into()).or_default();
        dim.loaded = true;
    }

    pub fn unload_world(&mut self, name: &str) {
        if let Some(dim) = self.dimensions.get_mut(name) {
            dim.loaded = false;
        }
    }

    /// Delete a world and everything in it
    pub fn remove_world(&mut self, name: &str) {
        self.dimensions.remove(name);
        let doomed: Vec<Entity> = self
            .entities
            .query::<&DroppedItem>()
            .iter()
            .filter(|(_, dropped)| dropped.world == name)
            .map(|(entity, _)| entity)
            .collect();
        for entity in doomed {
            let _ = self.entities.despawn(entity);
        }
    }

    pub fn unload_chunk(&mut self, world: &str, chunk_x: i32, chunk_z: i32) {
        if let Some(dim) = self.dimensions.get_mut(world) {
            dim.unloaded_chunks.insert((chunk_x, chunk_z));
        }
    }

    pub fn load_chunk(&mut self, world: &str, chunk_x: i32, chunk_z: i32) {
        if let Some(dim) = self.dimensions.get_mut(world) {
            dim.unloaded_chunks.remove(&(chunk_x, chunk_z));
        }
    }

    /// Place a block. A missing world is created loaded; an unloaded one
    /// stays unloaded.
    pub fn set_block(&mut self, key: &BlockKey, block: Block) {
        let dim = self
            .dimensions
            .entry(key.world.clone())
            .or_insert_with(|| Dimension {
                loaded: true,
                ..Dimension::default()
            });
        dim.blocks.insert((key.x, key.y, key.z), block);
    }

    /// Break a block, returning what was there
    pub fn remove_block(&mut self, key: &BlockKey) -> Option<Block> {
        self.dimensions
            .get_mut(&key.world)
            .and_then(|dim| dim.blocks.remove(&(key.x, key.y, key.z)))
    }

    pub fn block(&self, key: &BlockKey) -> Option<&Block> {
        self.dimensions
            .get(&key.world)
            .and_then(|dim| dim.blocks.get(&(key.x, key.y, key.z)))
    }

    pub fn container(&self, key: &BlockKey) -> Option<&Container> {
        match self.block(key) {
            Some(Block::Container(c)) => Some(c),
            _ => None,
        }
    }

    pub fn container_mut(&mut self, key: &BlockKey) -> Option<&mut Container> {
        match self.block_mut(key) {
            Some(Block::Container(c)) => Some(c),
            _ => None,
        }
    }

    fn block_mut(&mut self, key: &BlockKey) -> Option<&mut Block> {
        self.dimensions
            .get_mut(&key.world)
            .and_then(|dim| dim.blocks.get_mut(&(key.x, key.y, key.z)))
    }

    /// Drop a loose unit into the world
    pub fn spawn_item(
        &mut self,
        world: &str,
        position: Vec3,
        stack: ItemStack,
        pickup_delay: u32,
    ) -> Entity {
        self.entities.spawn((
            DroppedItem {
                world: world.to_string(),
            },
            Position(position),
            Velocity::default(),
            stack,
            PickupDelay(pickup_delay),
        ))
    }

    pub fn item_count(&self) -> usize {
        self.entities.query::<&DroppedItem>().iter().count()
    }

    /// Sum of units lying loose in the world
    pub fn loose_units(&self) -> u64 {
        self.entities
            .query::<(&DroppedItem, &ItemStack)>()
            .iter()
            .map(|(_, (_, stack))| stack.amount as u64)
            .sum()
    }

    pub fn velocity(&self, entity: Entity) -> Option<Vec3> {
        self.entities.get::<&Velocity>(entity).ok().map(|v| v.0)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Advance physics: pickup delays count down and velocities integrate
    pub fn advance(&mut self, ticks: u32) {
        for _ in 0..ticks {
            item_physics_system(&mut self.entities);
        }
    }

    fn dimension_active(&self, key: &BlockKey) -> bool {
        self.dimensions
            .get(&key.world)
            .map(|dim| dim.loaded && !dim.unloaded_chunks.contains(&key.chunk()))
            .unwrap_or(false)
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl HostWorld for SimWorld {
    type ItemId = Entity;

    fn world_exists(&self, world: &str) -> bool {
        self.dimensions.contains_key(world)
    }

    fn is_region_active(&self, key: &BlockKey) -> bool {
        self.dimension_active(key)
    }

    fn is_hopper_block(&self, key: &BlockKey) -> bool {
        matches!(self.block(key), Some(Block::Hopper))
    }

    fn is_storage(&self, key: &BlockKey) -> bool {
        self.container(key).is_some()
    }

    fn nearby_items(&self, world: &str, center: Vec3, radius: f64) -> Vec<Entity> {
        let mut found: Vec<(Entity, f64)> = self
            .entities
            .query::<(&DroppedItem, &Position)>()
            .iter()
            .filter(|(_, (dropped, pos))| dropped.world == world && center.within_box(&pos.0, radius))
            .map(|(entity, (_, pos))| (entity, center.distance_squared(&pos.0)))
            .collect();

        // Nearest first; entity id breaks ties so the order is reproducible
        found.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.id().cmp(&b.0.id()))
        });
        found.into_iter().map(|(entity, _)| entity).collect()
    }

    fn item(&self, id: Entity) -> Option<LooseItem> {
        let stack = self.entities.get::<&ItemStack>(id).ok()?;
        let position = self.entities.get::<&Position>(id).ok()?;
        let pickup_delay = self
            .entities
            .get::<&PickupDelay>(id)
            .map(|d| d.0)
            .unwrap_or(0);

        Some(LooseItem {
            stack: (*stack).clone(),
            position: position.0,
            pickup_delay,
        })
    }

    fn set_item_amount(&mut self, id: Entity, amount: u32) {
        if amount == 0 {
            let _ = self.entities.despawn(id);
            return;
        }
        if let Ok(mut stack) = self.entities.get::<&mut ItemStack>(id) {
            stack.amount = amount;
        }
    }

    fn remove_item(&mut self, id: Entity) {
        let _ = self.entities.despawn(id);
    }

    fn set_item_velocity(&mut self, id: Entity, velocity: Vec3) {
        if let Ok(mut vel) = self.entities.get::<&mut Velocity>(id) {
            vel.0 = velocity;
        }
    }

    fn resolve_destination(&mut self, key: &BlockKey) -> Resolution<'_> {
        if !self.dimension_active(key) {
            return Resolution::Unavailable;
        }
        match self.block_mut(key) {
            Some(Block::Container(container)) => Resolution::Ready(container),
            _ => Resolution::Invalid,
        }
    }
}
