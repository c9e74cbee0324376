//! Rapier backend для climb probes
//!
//! Probes превращаются в shape casts (`RapierContext::cast_shape`):
//! - sweep: скорость формы = end − start, max time of impact = 1 → t ∈ [0, 1]
//! - overlap (`start == end`): нулевая скорость + stop_at_penetration
//!
//! Фильтр: collision groups канала probe, без сенсоров, без собственного тела персонажа.
//! Требует `RapierPhysicsPlugin` в приложении.

use bevy::prelude::*;
use bevy_rapier3d::parry::shape::{Ball, Capsule, Shape};
use bevy_rapier3d::prelude::*;

use crate::climb::ClimbSet;
use crate::components::{Climber, ClimbState, ProbeResults};
use crate::config::ClimbConfig;
use crate::probes::{refresh_probes, ProbeBackend, ProbePose, ProbeShape, SweepHit};
use crate::shared::collision;

/// Parry форма для probe
pub enum ProbeCollider {
    Ball(Ball),
    Capsule(Capsule),
}

impl ProbeCollider {
    pub fn from_probe(shape: ProbeShape) -> Self {
        match shape {
            ProbeShape::Sphere { radius } => ProbeCollider::Ball(Ball::new(radius)),
            ProbeShape::Capsule {
                radius,
                half_height,
            } => {
                // parry считает half height только по сегменту (без полусфер)
                let segment_half = (half_height - radius).max(0.0);
                ProbeCollider::Capsule(Capsule::new_y(segment_half, radius))
            }
        }
    }

    pub fn as_shape(&self) -> &dyn Shape {
        match self {
            ProbeCollider::Ball(ball) => ball,
            ProbeCollider::Capsule(capsule) => capsule,
        }
    }
}

/// Shape cast одного probe через RapierContext
fn rapier_sweep(
    context: &RapierContext,
    exclude_entity: Entity,
    start: Vec3,
    end: Vec3,
    shape: ProbeShape,
    channel: u32,
) -> Option<SweepHit> {
    let collider = ProbeCollider::from_probe(shape);
    let velocity = end - start;

    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(collision::probe_groups(channel));

    context
        .cast_shape(
            start,
            Quat::IDENTITY,
            velocity,
            collider.as_shape(),
            ShapeCastOptions {
                max_time_of_impact: 1.0,
                stop_at_penetration: true,
                ..default()
            },
            filter,
        )
        .map(|(_, hit)| {
            let normal = hit
                .details
                .map(|details| details.normal1)
                .unwrap_or_else(|| -velocity.normalize_or_zero());
            SweepHit {
                location: start + velocity * hit.time_of_impact,
                normal,
            }
        })
}

/// Backend: probes через Rapier query pipeline
pub struct RapierBackend;

impl ProbeBackend for RapierBackend {
    fn add_probe_systems(app: &mut App) {
        app.add_systems(FixedUpdate, rapier_refresh_probes.in_set(ClimbSet::Probe));
    }
}

/// Система: обновление probes через Rapier
pub fn rapier_refresh_probes(
    rapier_context: ReadRapierContext,
    config: Res<ClimbConfig>,
    mut climbers: Query<(Entity, &Transform, &ClimbState, &mut ProbeResults), With<Climber>>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, state, mut results) in climbers.iter_mut() {
        let world = |start: Vec3, end: Vec3, shape: ProbeShape, channel: u32| {
            rapier_sweep(&context, entity, start, end, shape, channel)
        };

        let pose = ProbePose::from_transform(transform);
        refresh_probes(&world, &pose, state.is_hanging(), &config, &mut results);
    }
}

/// Spawn helper: climbable стена с уступом наверху (статичный cuboid)
///
/// Геометрия та же, что у `SyntheticWorld::with_ledge_wall`.
pub fn spawn_ledge_wall(
    commands: &mut Commands,
    x_range: (f32, f32),
    top: f32,
    front_z: f32,
    depth: f32,
) -> Entity {
    const WALL_HEIGHT: f32 = 1_000.0;

    let half = Vec3::new(
        (x_range.1 - x_range.0).abs() * 0.5,
        WALL_HEIGHT * 0.5,
        depth * 0.5,
    );
    let center = Vec3::new(
        (x_range.0 + x_range.1) * 0.5,
        top - half.y,
        front_z - half.z,
    );

    crate::log(&format!(
        "🧱 ledge wall x {:?}, top {}, front z {} ({} layer)",
        x_range,
        top,
        front_z,
        collision::get_layer_name(collision::COLLISION_LAYER_CLIMBABLE)
    ));

    commands
        .spawn((
            Transform::from_translation(center),
            RigidBody::Fixed,
            Collider::cuboid(half.x, half.y, half.z),
            collision::climbable_groups(),
        ))
        .id()
}
