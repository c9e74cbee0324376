//! Collision Layers Constants
//!
//! Rapier collision groups: centralised constants для всего проекта.
//!
//! ## Архитектура:
//! - **Layers (битовая маска):** На каком слое находится объект (memberships)
//! - **Mask (битовая маска):** С какими слоями объект коллидирует (filters)
//!
//! ## Layers:
//! - Layer 1 (0b1 = 1): Reserved
//! - Layer 2 (0b10 = 2): Actors (climber capsule)
//! - Layer 3 (0b100 = 4): Environment (пол, стены без уступов)
//! - Layer 4 (0b1000 = 8): Climbable (стены/уступы, за которые можно схватиться)
//!
//! Climb probes смотрят ТОЛЬКО в climbable канал (`PROBE_CHANNEL_CLIMBABLE`).

use bevy_rapier3d::prelude::{CollisionGroups, Group};

// ============================================================================
// Layer Битовые Маски (на каком слое объект находится)
// ============================================================================

/// Layer 2: Actors (climber capsule)
pub const COLLISION_LAYER_ACTORS: u32 = 0b10; // 2

/// Layer 3: Environment (static geometry без climb семантики)
pub const COLLISION_LAYER_ENVIRONMENT: u32 = 0b100; // 4

/// Layer 4: Climbable (уступы и стены для probes)
pub const COLLISION_LAYER_CLIMBABLE: u32 = 0b1000; // 8

// ============================================================================
// Mask Битовые Маски (с чем объект коллидирует)
// ============================================================================

/// Mask: Actors collide with Environment + Climbable
///
/// Акторы НЕ коллидируют друг с другом (climber проходит сквозь других climbers).
pub const COLLISION_MASK_ACTORS: u32 = COLLISION_LAYER_ENVIRONMENT | COLLISION_LAYER_CLIMBABLE;

/// Единственный канал, который видят climb probes
pub const PROBE_CHANNEL_CLIMBABLE: u32 = COLLISION_LAYER_CLIMBABLE;

// ============================================================================
// Helper Functions
// ============================================================================

/// CollisionGroups для climber capsule
pub fn actor_groups() -> CollisionGroups {
    CollisionGroups::new(
        Group::from_bits_truncate(COLLISION_LAYER_ACTORS),
        Group::from_bits_truncate(COLLISION_MASK_ACTORS),
    )
}

/// CollisionGroups для climbable геометрии (статичные стены/уступы)
pub fn climbable_groups() -> CollisionGroups {
    CollisionGroups::new(
        Group::from_bits_truncate(COLLISION_LAYER_CLIMBABLE),
        Group::from_bits_truncate(COLLISION_LAYER_ACTORS),
    )
}

/// Groups фильтра для probe запроса по каналу (любой membership → channel filter)
pub fn probe_groups(channel: u32) -> CollisionGroups {
    CollisionGroups::new(Group::ALL, Group::from_bits_truncate(channel))
}

/// Получить название слоя для debug логов
pub fn get_layer_name(layer_bits: u32) -> &'static str {
    match layer_bits {
        COLLISION_LAYER_ACTORS => "Actors",
        COLLISION_LAYER_ENVIRONMENT => "Environment",
        COLLISION_LAYER_CLIMBABLE => "Climbable",
        _ => "Unknown",
    }
}
