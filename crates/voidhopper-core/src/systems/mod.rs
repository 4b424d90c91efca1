//! Systems - logic that runs every pass or every host tick

mod movement;
mod transfer;

pub use movement::*;
pub use transfer::*;
