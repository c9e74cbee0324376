//! Physics simulation module
//!
//! Kinematic локомоция + Rapier backend для climb probes.

pub mod movement;
pub mod rapier;

// Re-export основных типов
pub use movement::{
    apply_gravity, apply_movement_input, ground_detection, integrate_velocity_to_transform,
    orient_towards, spawn_climbing_character, walk_direction, LocomotionPlugin,
};
pub use rapier::{rapier_refresh_probes, spawn_ledge_wall, ProbeCollider, RapierBackend};
