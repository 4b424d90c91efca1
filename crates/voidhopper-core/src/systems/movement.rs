//! Movement system - loose unit physics inside `SimWorld`

use crate::components::{PickupDelay, Position, Velocity, Vec3};
use hecs::World;

/// Fraction of velocity kept each tick
const DRAG: f64 = 0.98;

/// Below this speed a unit is considered at rest
const REST_SPEED: f64 = 0.001;

/// Advance every loose unit by one tick: integrate velocity with drag and
/// count pickup delays down
pub fn item_physics_system(world: &mut World) {
    for (_entity, (pos, vel, delay)) in
        world.query_mut::<(&mut Position, &mut Velocity, Option<&mut PickupDelay>)>()
    {
        if let Some(delay) = delay {
            delay.0 = delay.0.saturating_sub(1);
        }

        if vel.0.length() < REST_SPEED {
            vel.0 = Vec3::ZERO;
            continue;
        }

        pos.0 = pos.0 + vel.0;
        vel.0 = vel.0 * DRAG;
    }
}
