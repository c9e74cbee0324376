//! LEDGECLIMB Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: climbing персонаж, который хватается за уступы,
//! скользит вдоль них, прыгает между ними и огибает углы.
//!
//! Слои:
//! - probes: геометрические запросы (Rapier или synthetic мир)
//! - climb: FSM + отложенные действия
//! - physics: kinematic локомоция на земле/в воздухе
//! - animation: порт к визуальному слою (по умолчанию no-op)

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

// Публичные модули
pub mod animation;
pub mod climb;
pub mod components;
pub mod config;
pub mod logger;
pub mod physics;
pub mod probes;
pub mod shared;

// Re-export базовых типов для удобства
pub use animation::{
    AnimationNotification, AnimationSignal, AnimationSignalKind, ClimbAnimationObserver,
    ClimbAnimator, NoAnimation, RecordingAnimator,
};
pub use climb::{
    ClimbAction, ClimbActionEvent, ClimbContext, ClimbPlugin, ClimbSet, ClimbStateChanged,
    DeferredAction, PendingActions,
};
pub use components::*;
pub use config::{ClimbConfig, LocalOffset};
pub use logger::*;
pub use physics::{spawn_climbing_character, spawn_ledge_wall, LocomotionPlugin, RapierBackend};
pub use probes::{
    ClimbWorldQuery, ProbeBackend, ProbeShape, SweepHit, SyntheticBackend, SyntheticBlock,
    SyntheticWorld,
};

/// Длительность fixed tick (60Hz)
pub const FIXED_TICK: Duration = Duration::from_nanos(16_666_667);

/// Главный plugin симуляции (synthetic геометрия, без Rapier pipeline)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_duration(FIXED_TICK))
            .add_plugins((ClimbPlugin::<SyntheticBackend>::default(), LocomotionPlugin));
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную: один `app.update()` = один fixed tick
/// (первый update только инициализирует часы).
pub fn create_headless_app(world: SyntheticWorld) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(FIXED_TICK))
        .insert_resource(world);

    app
}

/// Spawn climbing персонажа без Rapier компонентов (synthetic мир)
pub fn spawn_headless_climber(world: &mut World, position: Vec3) -> Entity {
    world
        .spawn((Climber, Transform::from_translation(position)))
        .id()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
