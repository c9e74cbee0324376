//! Геометрия манёвров: поза захвата, интерполяция вдоль уступа

use bevy::prelude::*;

use crate::components::{Side, WallContact};
use crate::config::ClimbConfig;

/// Поворот вокруг Y, при котором forward (-Z) смотрит вдоль `direction` (в плоскости XZ)
pub fn facing_rotation(direction: Vec3) -> Quat {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z))
}

/// Целевая поза захвата уступа
///
/// - XZ: точка касания стены, отодвинутая вдоль нормали на `grab_wall_offset`
/// - Y: высота уступа минус `grab_height_drop`
/// - лицом к стене (нормаль, развёрнутая на 180°)
pub fn grab_target(wall: &WallContact, ledge: Vec3, config: &ClimbConfig) -> (Vec3, Quat) {
    let offset = wall.location + wall.normal * config.grab_wall_offset;
    let translation = Vec3::new(offset.x, ledge.y - config.grab_height_drop, offset.z);

    (translation, facing_rotation(-wall.normal))
}

/// Поза за внешним углом стены
///
/// Capsule сдвигается на `corner_travel` (в осях до поворота) и разворачивается
/// на 90° лицом к боковой грани: forward = −right стороны поворота.
pub fn corner_target(
    translation: Vec3,
    rotation: Quat,
    side: Side,
    config: &ClimbConfig,
) -> (Vec3, Quat) {
    let target = config.corner_travel.for_side(side).to_world(translation, rotation);
    let right = rotation * Vec3::X;

    (target, facing_rotation(-right * side.sign()))
}

/// Экспоненциальное сближение с целью (VInterpTo)
///
/// Доля пути за tick = `delta * speed`, ограничена [0, 1]; speed ≤ 0: мгновенно.
pub fn vinterp_to(current: Vec3, target: Vec3, delta: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }
    let alpha = (delta * speed).clamp(0.0, 1.0);
    current + (target - current) * alpha
}
