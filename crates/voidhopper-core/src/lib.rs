//! Voidhopper Core - Vacuum Void Hopper routing engine
//!
//! Placed hopper nodes periodically scan their surroundings for loose
//! resource units, destroy the kinds their void filter names, and route the
//! rest into an ordered list of linked storage destinations.
//!
//! # Architecture
//!
//! - **Registry** ([`registry`]): every node keyed by its block, saved to
//!   disk on each state change
//! - **Link graph** ([`links`]): per-node ordered, capped destination list
//! - **Transfer pass** ([`systems`]): the per-pass vacuum and routing logic
//! - **Persistence** ([`persistence`], [`portable`]): registry file and the
//!   record carried by a broken node's item
//! - **Host world** ([`world`]): the contract the engine needs from the
//!   game world, plus an ECS-backed `SimWorld`
//!
//! # Example
//!
//! ```rust,no_run
//! use voidhopper_core::prelude::*;
//!
//! let mut world = SimWorld::new();
//! let mut service = HopperService::new(HopperConfig::default());
//!
//! // Host tick loop
//! loop {
//!     world.advance(1);
//!     if let Some(report) = service.tick(&mut world) {
//!         println!("collected {}", report.units_collected);
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod filter;
pub mod links;
pub mod node;
pub mod persistence;
pub mod portable;
pub mod registry;
pub mod systems;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::HopperConfig;
    pub use crate::engine::{FixedInterval, HopperService};
    pub use crate::events::{link_container, on_break, on_place, LinkOutcome};
    pub use crate::filter::VoidFilter;
    pub use crate::links::LinkGraph;
    pub use crate::node::{HopperNode, NodeSnapshot};
    pub use crate::portable::PortableHopper;
    pub use crate::registry::HopperRegistry;
    pub use crate::systems::PassReport;
    pub use crate::world::{Destination, HostWorld, SimWorld};
}
