//! Kinematic локомоция персонажа (на земле и в воздухе)
//!
//! Архитектура:
//! - Rapier для коллизий/запросов (RigidBody::KinematicPositionBased)
//! - Custom velocity integration (не используем Rapier forces)
//! - Gravity + ground check (плоскость `ground_level`) + walk input
//!
//! Пока персонаж в climb состоянии, walk input игнорируется: позицией управляет climb FSM.
//! Flying режим (висит, прыгает между уступами): без gravity и ground check.
//!
//! Детерминизм: fixed timestep (60Hz), все системы цепочкой после `ClimbSet::Movement`.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::climb::{facing_rotation, ClimbSet};
use crate::components::{
    ClimbController, ClimbInput, ClimbState, Climber, KinematicBody, KinematicController,
    MovementMode,
};
use crate::shared::collision;

/// Максимальное горизонтальное ускорение в воздухе при air_control = 1
const AIR_ACCELERATION: f32 = 2048.0;

/// Допуск ground check (численные ошибки интеграции)
const GROUND_TOLERANCE: f32 = 0.5;

/// Направление ходьбы из осей input (мировые оси: y → −Z, x → +X)
pub fn walk_direction(axes: Vec2) -> Vec3 {
    Vec3::new(axes.x, 0.0, -axes.y).clamp_length_max(1.0)
}

/// Поворот к направлению движения с ограниченной угловой скоростью
pub fn orient_towards(current: Quat, direction: Vec3, rate_degrees: f32, delta: f32) -> Quat {
    let target = facing_rotation(direction);
    let angle = current.angle_between(target);
    if angle <= f32::EPSILON {
        return target;
    }

    let max_step = rate_degrees.to_radians() * delta;
    current.slerp(target, (max_step / angle).min(1.0))
}

/// Система применения движения от input
///
/// Walking: горизонтальная скорость = direction × walk_speed.
/// Falling: ускорение к желаемой скорости, ограниченное air_control.
pub fn apply_movement_input(
    mut query: Query<
        (
            &ClimbInput,
            &ClimbState,
            &KinematicController,
            &mut KinematicBody,
            &mut Transform,
        ),
        With<Climber>,
    >,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (input, state, controller, mut body, mut transform) in query.iter_mut() {
        if state.is_climbing() {
            continue;
        }

        let direction = walk_direction(Vec2::new(input.right_axis(), input.forward_axis()));
        let desired = direction * controller.walk_speed;

        match body.mode {
            MovementMode::Walking => {
                body.velocity.x = desired.x;
                body.velocity.z = desired.z;
            }
            MovementMode::Falling => {
                let horizontal = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
                let max_change = AIR_ACCELERATION * controller.air_control * delta;
                let next = horizontal + (desired - horizontal).clamp_length_max(max_change);
                body.velocity.x = next.x;
                body.velocity.z = next.z;
            }
            MovementMode::Flying => continue,
        }

        if direction.length_squared() > 0.01 {
            transform.rotation =
                orient_towards(transform.rotation, direction, controller.rotation_rate, delta);
        }
    }
}

/// Система применения gravity к velocity
pub fn apply_gravity(
    mut query: Query<(&KinematicController, &mut KinematicBody)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (controller, mut body) in query.iter_mut() {
        if body.mode == MovementMode::Flying || controller.grounded {
            continue;
        }
        body.velocity.y += controller.gravity * delta;
    }
}

/// Система интеграции velocity → Transform
///
/// Пока идёт grab интерполяция, Transform принадлежит ей.
pub fn integrate_velocity_to_transform(
    mut query: Query<(&KinematicBody, &ClimbController, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (body, climb, mut transform) in query.iter_mut() {
        if climb.grab.is_some() || body.is_idle() {
            continue;
        }
        transform.translation += body.velocity * delta;
    }
}

/// Система ground detection через простую Y-проверку
///
/// Пол: горизонтальная плоскость `ground_level`; при касании capsule ставится на неё.
pub fn ground_detection(mut query: Query<(&mut Transform, &mut KinematicController, &mut KinematicBody)>) {
    for (mut transform, mut controller, mut body) in query.iter_mut() {
        if body.mode == MovementMode::Flying {
            controller.grounded = false;
            continue;
        }

        let standing = controller.standing_height();
        let touching = transform.translation.y <= standing + GROUND_TOLERANCE;

        if touching && body.velocity.y <= 0.0 {
            if body.mode == MovementMode::Falling {
                crate::log(&format!("🦶 landed at {:?}", transform.translation));
            }
            transform.translation.y = standing;
            body.velocity.y = 0.0;
            body.mode = MovementMode::Walking;
            controller.grounded = true;
        } else {
            body.mode = MovementMode::Falling;
            controller.grounded = false;
        }
    }
}

/// Plugin для kinematic локомоции
///
/// Регистрирует все системы в FixedUpdate после climb FSM.
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                apply_movement_input,
                apply_gravity,
                integrate_velocity_to_transform,
                ground_detection,
            )
                .chain()
                .after(ClimbSet::Movement),
        );
    }
}

/// Spawn helper для climbing персонажа
///
/// Создает entity с полным набором компонентов:
/// - Climber (+ required climb/movement компоненты)
/// - Rapier: kinematic capsule в слое actors
pub fn spawn_climbing_character(commands: &mut Commands, position: Vec3) -> Entity {
    let controller = KinematicController::default();

    commands
        .spawn((
            Climber,
            Transform::from_translation(position),
            controller,
            // Rapier physics
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(
                controller.capsule_half_height - controller.capsule_radius,
                controller.capsule_radius,
            ),
            collision::actor_groups(),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_direction_world_axes() {
        assert_eq!(walk_direction(Vec2::new(0.0, 1.0)), Vec3::NEG_Z);
        assert_eq!(walk_direction(Vec2::new(1.0, 0.0)), Vec3::X);
        // Диагональ не быстрее прямой
        assert!(walk_direction(Vec2::new(1.0, 1.0)).length() <= 1.0 + 1e-5);
    }

    #[test]
    fn test_orient_towards_is_rate_limited() {
        let delta = 1.0 / 60.0;
        // Разворот на 180°: за один tick не больше 540°/s × dt = 9°
        let rotated = orient_towards(Quat::IDENTITY, Vec3::Z, 540.0, delta);
        let step = Quat::IDENTITY.angle_between(rotated).to_degrees();
        assert!((step - 9.0).abs() < 0.01, "step = {}", step);

        // Маленький угол: сразу в цель
        let target = facing_rotation(Vec3::new(0.01, 0.0, -1.0));
        let rotated = orient_towards(Quat::IDENTITY, Vec3::new(0.01, 0.0, -1.0), 540.0, delta);
        assert!(rotated.angle_between(target) < 1e-4);
    }

    #[test]
    fn test_apply_gravity_only_to_airborne_bodies() {
        use bevy::ecs::system::RunSystemOnce;
        use std::time::Duration;

        let mut world = World::new();
        let mut time = Time::<Fixed>::from_duration(Duration::from_secs_f64(1.0 / 60.0));
        time.advance_by(Duration::from_secs_f64(1.0 / 60.0));
        world.insert_resource(time);

        let airborne = |mode| {
            (
                KinematicController {
                    grounded: false,
                    ..default()
                },
                KinematicBody { mode, ..default() },
            )
        };
        let falling = world.spawn(airborne(MovementMode::Falling)).id();
        let flying = world.spawn(airborne(MovementMode::Flying)).id();
        let grounded = world
            .spawn((
                KinematicController {
                    grounded: true,
                    ..default()
                },
                KinematicBody {
                    mode: MovementMode::Walking,
                    ..default()
                },
            ))
            .id();

        world
            .run_system_once(apply_gravity)
            .expect("apply_gravity runs");

        // -980 × (1/60) ≈ -16.33
        let vy = |entity| world.get::<KinematicBody>(entity).expect("body").velocity.y;
        assert!((vy(falling) - -16.333).abs() < 0.01, "vy = {}", vy(falling));
        assert_eq!(vy(flying), 0.0);
        assert_eq!(vy(grounded), 0.0);
    }
}
