//! Synthetic геометрия для probes (headless симуляция, тесты)
//!
//! Мир: набор axis-aligned блоков с collision слоями.
//! Sweep формы против блока = луч против блока, расширенного на полуразмеры формы
//! (Minkowski sum без скругления углов). Для climb probes этого достаточно:
//! стены и уступы: прямоугольные блоки.
//!
//! Детерминизм: никаких float reduction в произвольном порядке, блоки перебираются по индексу.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{refresh_probes, ClimbWorldQuery, ProbeBackend, ProbePose, ProbeShape, SweepHit};
use crate::climb::ClimbSet;
use crate::components::{Climber, ClimbState, ProbeResults};
use crate::config::ClimbConfig;
use crate::shared::collision::{COLLISION_LAYER_CLIMBABLE, COLLISION_LAYER_ENVIRONMENT};

const EPSILON: f32 = 1e-5;

/// Axis-aligned блок
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct SyntheticBlock {
    pub min: Vec3,
    pub max: Vec3,
    /// Collision слои блока (битовая маска)
    pub layers: u32,
}

impl SyntheticBlock {
    pub fn new(min: Vec3, max: Vec3, layers: u32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            layers,
        }
    }

    pub fn climbable(min: Vec3, max: Vec3) -> Self {
        Self::new(min, max, COLLISION_LAYER_CLIMBABLE)
    }

    /// Sweep формы от `start` к `end`; t ∈ [0, 1] + нормаль входа
    fn sweep(&self, start: Vec3, end: Vec3, extents: Vec3) -> Option<(f32, Vec3)> {
        let min = self.min - extents;
        let max = self.max + extents;
        let delta = end - start;

        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let origin = start[axis];
            let direction = delta[axis];

            if direction.abs() < EPSILON {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            if t0 > t_enter {
                t_enter = t0;
                let mut axis_normal = Vec3::ZERO;
                axis_normal[axis] = -direction.signum();
                normal = axis_normal;
            }
            t_exit = t_exit.min(t1);

            if t_enter > t_exit {
                return None;
            }
        }

        if normal == Vec3::ZERO {
            // Старт внутри блока (initial overlap): нормаль ближайшей грани
            normal = Self::penetration_normal(start, min, max);
        }

        Some((t_enter, normal))
    }

    /// Нормаль грани с минимальной глубиной проникновения
    fn penetration_normal(point: Vec3, min: Vec3, max: Vec3) -> Vec3 {
        let mut best_depth = f32::MAX;
        let mut best = Vec3::Y;

        for axis in 0..3 {
            let to_min = point[axis] - min[axis];
            let to_max = max[axis] - point[axis];

            if to_min < best_depth {
                best_depth = to_min;
                best = Vec3::ZERO;
                best[axis] = -1.0;
            }
            if to_max < best_depth {
                best_depth = to_max;
                best = Vec3::ZERO;
                best[axis] = 1.0;
            }
        }

        best
    }
}

/// Synthetic мир (Resource)
#[derive(Resource, Debug, Clone, Default, Reflect)]
#[reflect(Resource)]
pub struct SyntheticWorld {
    pub blocks: Vec<SyntheticBlock>,
}

impl SyntheticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: SyntheticBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Пол (environment слой: probes его не видят)
    pub fn with_floor(self, height: f32) -> Self {
        self.with_block(SyntheticBlock::new(
            Vec3::new(-10_000.0, height - 100.0, -10_000.0),
            Vec3::new(10_000.0, height, 10_000.0),
            COLLISION_LAYER_ENVIRONMENT,
        ))
    }

    /// Climbable стена с уступом наверху
    ///
    /// Лицевая грань смотрит в +Z на `front_z`, толщина `depth` уходит в -Z.
    pub fn with_ledge_wall(self, x_range: (f32, f32), top: f32, front_z: f32, depth: f32) -> Self {
        self.with_block(SyntheticBlock::climbable(
            Vec3::new(x_range.0, top - 1_000.0, front_z - depth),
            Vec3::new(x_range.1, top, front_z),
        ))
    }

    /// Детерминированная трасса уступов вдоль +X (seeded ChaCha8)
    ///
    /// Соседние уступы разделены зазорами, куда можно только допрыгнуть,
    /// высоты слегка варьируются.
    pub fn ledge_course(seed: u64, ledge_count: usize, base_top: f32, front_z: f32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut world = Self::new().with_floor(0.0);
        let mut x = -200.0;

        for _ in 0..ledge_count {
            let width = rng.gen_range(300.0..600.0);
            let top = base_top + rng.gen_range(-15.0..15.0);
            world = world.with_ledge_wall((x, x + width), top, front_z, 200.0);

            let gap = rng.gen_range(90.0..130.0);
            x += width + gap;
        }

        world
    }
}

impl ClimbWorldQuery for SyntheticWorld {
    fn sweep(&self, start: Vec3, end: Vec3, shape: ProbeShape, channel: u32) -> Option<SweepHit> {
        let extents = shape.half_extents();

        self.blocks
            .iter()
            .filter(|block| block.layers & channel != 0)
            .filter_map(|block| block.sweep(start, end, extents))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal)| SweepHit {
                location: start.lerp(end, t),
                normal,
            })
    }
}

/// Backend: probes по `SyntheticWorld` resource
pub struct SyntheticBackend;

impl ProbeBackend for SyntheticBackend {
    fn add_probe_systems(app: &mut App) {
        app.init_resource::<SyntheticWorld>();
        app.add_systems(FixedUpdate, synthetic_refresh_probes.in_set(ClimbSet::Probe));
    }
}

/// Система: обновление probes по synthetic геометрии
pub fn synthetic_refresh_probes(
    world: Res<SyntheticWorld>,
    config: Res<ClimbConfig>,
    mut climbers: Query<(&Transform, &ClimbState, &mut ProbeResults), With<Climber>>,
) {
    for (transform, state, mut results) in climbers.iter_mut() {
        let pose = ProbePose::from_transform(transform);
        refresh_probes(&*world, &pose, state.is_hanging(), &config, &mut results);
    }
}
