//! Probe Subsystem: геометрические запросы для climb FSM
//!
//! Каждый tick отвечает на вопросы "есть ли climbable геометрия в направлении/объёме D":
//! - forward: стена перед персонажем (точка + нормаль)
//! - height: уступ в досягаемости (gap pelvis − ledge в окне захвата)
//! - lateral: продолжается ли уступ слева/справа
//! - side jump: соседний уступ, до которого можно допрыгнуть
//! - corner: можно ли обогнуть угол
//! - jump up: нависающий уступ сверху
//!
//! Архитектура:
//! - Мир инжектится через `ClimbWorldQuery` (Rapier или synthetic геометрия)
//! - Probes: чистые запросы, пишут только в свои поля `ProbeResults`
//! - Порядок фиксирован: side jump / corner зависят от lateral в ЭТОМ ЖЕ tick

use bevy::prelude::*;

use crate::components::{ProbeResults, Side, WallContact};
use crate::config::ClimbConfig;

pub mod synthetic;


pub use synthetic::{SyntheticBackend, SyntheticBlock, SyntheticWorld};

/// Форма sweep'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeShape {
    Sphere {
        radius: f32,
    },
    /// Вертикальная capsule; `half_height` включает полусферы
    Capsule {
        radius: f32,
        half_height: f32,
    },
}

impl ProbeShape {
    /// Полуразмеры AABB формы (для synthetic геометрии)
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            ProbeShape::Sphere { radius } => Vec3::splat(radius),
            ProbeShape::Capsule {
                radius,
                half_height,
            } => Vec3::new(radius, half_height.max(radius), radius),
        }
    }
}

/// Ближайшее блокирующее попадание sweep'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Центр формы в момент касания
    pub location: Vec3,
    /// Нормаль поверхности в точке касания
    pub normal: Vec3,
}

/// Провайдер запросов к миру
///
/// `start == end`: стационарный overlap тест (без перемещения формы).
/// `channel`: битовая маска collision канала (см. `shared::collision`).
pub trait ClimbWorldQuery {
    fn sweep(&self, start: Vec3, end: Vec3, shape: ProbeShape, channel: u32) -> Option<SweepHit>;
}

impl<F> ClimbWorldQuery for F
where
    F: Fn(Vec3, Vec3, ProbeShape, u32) -> Option<SweepHit>,
{
    fn sweep(&self, start: Vec3, end: Vec3, shape: ProbeShape, channel: u32) -> Option<SweepHit> {
        self(start, end, shape, channel)
    }
}

/// Backend мира для probes (подключается generic параметром `ClimbPlugin`)
pub trait ProbeBackend: 'static + Send + Sync {
    /// Регистрирует систему обновления probes в `ClimbSet::Probe`
    fn add_probe_systems(app: &mut App);
}

/// Поза персонажа для probes
#[derive(Debug, Clone, Copy)]
pub struct ProbePose {
    pub location: Vec3,
    pub rotation: Quat,
}

impl ProbePose {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            location: transform.translation,
            rotation: transform.rotation,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Forward без вертикальной компоненты
    pub fn flat_forward(&self) -> Vec3 {
        let forward = self.forward();
        Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero()
    }

    pub fn pelvis_height(&self, config: &ClimbConfig) -> f32 {
        self.location.y + config.pelvis_offset
    }
}

/// Forward probe: sphere вперёд от персонажа
///
/// Нет попадания: стена невалидна (`wall = None`).
pub fn probe_forward<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    config: &ClimbConfig,
    results: &mut ProbeResults,
) {
    let start = pose.location;
    let end = start + pose.flat_forward() * config.forward_probe_distance;
    let shape = ProbeShape::Sphere {
        radius: config.forward_probe_radius,
    };

    results.wall = world
        .sweep(start, end, shape, config.probe_channel)
        .map(|hit| WallContact {
            location: hit.location,
            normal: hit.normal,
        });
}

/// Height probe: sphere вниз по вертикали перед персонажем
///
/// Записывает точку уступа и gap относительно pelvis socket.
pub fn probe_height<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    config: &ClimbConfig,
    results: &mut ProbeResults,
) {
    let start = pose.location
        + Vec3::Y * config.height_probe_rise
        + pose.forward() * config.height_probe_forward;
    let end = start - Vec3::Y * config.height_probe_depth;
    let shape = ProbeShape::Sphere {
        radius: config.height_probe_radius,
    };

    match world.sweep(start, end, shape, config.probe_channel) {
        Some(hit) => {
            let gap = pose.pelvis_height(config) - hit.location.y;
            results.ledge = Some(hit.location);
            results.ledge_gap = Some(gap);
            results.ledge_in_reach = config.ledge_in_reach(gap);
        }
        None => {
            results.ledge = None;
            results.ledge_gap = None;
            results.ledge_in_reach = false;
        }
    }
}

/// Lateral probe: стационарная capsule у бокового marker'а
pub fn probe_lateral<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    config: &ClimbConfig,
    side: Side,
    results: &mut ProbeResults,
) {
    let marker = config
        .lateral_marker
        .for_side(side)
        .to_world(pose.location, pose.rotation);
    let shape = ProbeShape::Capsule {
        radius: config.lateral_probe_radius,
        half_height: config.lateral_probe_half_height,
    };

    let hit = world.sweep(marker, marker, shape, config.probe_channel).is_some();
    results.lateral.set(side, hit);
}

/// Side jump probe: стационарная capsule у дальнего marker'а
///
/// Прыжок возможен только туда, куда нельзя просто сдвинуться (`!lateral[side]`).
pub fn probe_side_jump<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    config: &ClimbConfig,
    side: Side,
    results: &mut ProbeResults,
) {
    if results.can_move(side) {
        results.side_jump.set(side, false);
        return;
    }

    let marker = config
        .side_jump_marker
        .for_side(side)
        .to_world(pose.location, pose.rotation);
    let shape = ProbeShape::Capsule {
        radius: config.side_jump_probe_radius,
        half_height: config.side_jump_probe_half_height,
    };

    let hit = world.sweep(marker, marker, shape, config.probe_channel).is_some();
    results.side_jump.set(side, hit);
}

/// Corner probe: sphere вперёд от поднятого lateral marker'а
///
/// Пустота перед marker'ом = стена заворачивает, поворот за угол возможен.
/// Только если ни сдвинуться, ни прыгнуть в эту сторону нельзя.
pub fn probe_corner<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    config: &ClimbConfig,
    side: Side,
    results: &mut ProbeResults,
) {
    if results.can_move(side) || results.can_jump(side) {
        results.corner.set(side, false);
        return;
    }

    let start = config
        .lateral_marker
        .for_side(side)
        .to_world(pose.location, pose.rotation)
        + Vec3::Y * config.corner_probe_rise;
    let end = start + pose.forward() * config.corner_probe_distance;
    let shape = ProbeShape::Sphere {
        radius: config.corner_probe_radius,
    };

    let hit = world.sweep(start, end, shape, config.probe_channel).is_some();
    results.corner.set(side, !hit);
}

/// Jump up probe: стационарная capsule над персонажем
pub fn probe_jump_up<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    config: &ClimbConfig,
    results: &mut ProbeResults,
) {
    let marker = config.jump_up_marker.to_world(pose.location, pose.rotation);
    let shape = ProbeShape::Capsule {
        radius: config.jump_up_probe_radius,
        half_height: config.jump_up_probe_half_height,
    };

    results.jump_up = world.sweep(marker, marker, shape, config.probe_channel).is_some();
}

/// Полный проход probes за tick (фиксированный порядок)
///
/// 1. forward → 2. height → 3. jump up → 4. lateral (обе стороны) → 5. side jump / corner
///
/// Боковые probes считаются только пока персонаж висит; иначе сбрасываются.
pub fn refresh_probes<W: ClimbWorldQuery + ?Sized>(
    world: &W,
    pose: &ProbePose,
    hanging: bool,
    config: &ClimbConfig,
    results: &mut ProbeResults,
) {
    probe_forward(world, pose, config, results);
    probe_height(world, pose, config, results);
    probe_jump_up(world, pose, config, results);

    if !hanging {
        results.clear_hanging_probes();
        return;
    }

    for side in Side::BOTH {
        probe_lateral(world, pose, config, side, results);
    }

    for side in Side::BOTH {
        probe_side_jump(world, pose, config, side, results);
        probe_corner(world, pose, config, side, results);
    }
}
