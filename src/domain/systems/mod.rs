// Per-tick pure transition functions for the match simulator.

pub mod movement;
pub mod safezone;

pub use movement::{step_entity_velocity, resolve_collisions, SPEED_BASE};
pub use safezone::{apply_shrink, check_out_of_zone, check_idle};
