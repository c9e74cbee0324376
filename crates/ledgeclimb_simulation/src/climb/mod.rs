//! Climb State Machine: захват уступов, скольжение, прыжки, повороты
//!
//! Архитектура:
//! - `ClimbState` (components): единственный источник истины о climb режиме
//! - `ClimbContext` (machine): все переходы FSM
//! - `PendingActions` (scheduler): отложенные действия с token'ами
//! - Probes обновляются backend'ом (`ProbeBackend`) в `ClimbSet::Probe`
//!
//! Всё выполняется в FixedUpdate (60Hz), системы идут цепочкой `ClimbSet`.

use bevy::prelude::*;
use std::marker::PhantomData;

pub mod events;
pub mod machine;
pub mod maneuvers;
pub mod scheduler;
pub mod systems;

#[cfg(test)]
mod machine_tests;

pub use events::{ClimbAction, ClimbActionEvent, ClimbStateChanged};
pub use machine::ClimbContext;
pub use maneuvers::{corner_target, facing_rotation, grab_target, vinterp_to};
pub use scheduler::{DeferredAction, PendingActions, ScheduledTask, TokenSequence, TOKEN_MODULUS};
pub use systems::*;

use crate::animation::AnimationSignal;
use crate::components::{
    ClimbController, ClimbInput, ClimbState, Climber, KinematicBody, KinematicController,
    LateralMotion, ProbeResults,
};
use crate::config::ClimbConfig;
use crate::probes::ProbeBackend;

/// Фазы climb tick'а (FixedUpdate, строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimbSet {
    /// Cooldown + отложенные действия
    Timers,
    /// Обновление `ProbeResults`
    Probe,
    /// Переходы FSM (сигналы, input, захват)
    Transition,
    /// Скольжение и grab интерполяция
    Movement,
}

/// Climb plugin, generic по backend'у probes
///
/// ```ignore
/// app.add_plugins(ClimbPlugin::<SyntheticBackend>::default());
/// ```
pub struct ClimbPlugin<B: ProbeBackend> {
    _backend: PhantomData<B>,
}

impl<B: ProbeBackend> Default for ClimbPlugin<B> {
    fn default() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: ProbeBackend> Plugin for ClimbPlugin<B> {
    fn build(&self, app: &mut App) {
        app.init_resource::<ClimbConfig>()
            .add_event::<ClimbActionEvent>()
            .add_event::<AnimationSignal>()
            .add_event::<ClimbStateChanged>()
            .register_type::<ClimbConfig>()
            .register_type::<Climber>()
            .register_type::<ClimbState>()
            .register_type::<ProbeResults>()
            .register_type::<LateralMotion>()
            .register_type::<ClimbInput>()
            .register_type::<ClimbController>()
            .register_type::<PendingActions>()
            .register_type::<KinematicBody>()
            .register_type::<KinematicController>()
            .configure_sets(
                FixedUpdate,
                (
                    ClimbSet::Timers,
                    ClimbSet::Probe,
                    ClimbSet::Transition,
                    ClimbSet::Movement,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, tick_climb_timers.in_set(ClimbSet::Timers))
            .add_systems(
                FixedUpdate,
                (apply_animation_signals, apply_climb_actions, detect_ledges)
                    .chain()
                    .in_set(ClimbSet::Transition),
            )
            .add_systems(
                FixedUpdate,
                (slide_along_ledge, advance_grab_moves)
                    .chain()
                    .in_set(ClimbSet::Movement),
            );

        B::add_probe_systems(app);
    }
}
