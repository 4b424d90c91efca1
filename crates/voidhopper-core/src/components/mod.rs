//! Plain data shared by the registry, the transfer engine and the host world.
//!
//! Nothing in here knows about passes or persistence; behaviour lives in
//! `systems`, `registry` and `world`.

mod block;
mod common;
mod item;
mod key;

pub use block::*;
pub use common::*;
pub use item::*;
pub use key::*;
