//! Climb systems (FixedUpdate)
//!
//! Порядок внутри tick (см. `ClimbSet`):
//! 1. Timers: regrab cooldown + отложенные действия
//! 2. Probe: backend обновляет `ProbeResults`
//! 3. Transition: animation сигналы → discrete input → захват уступа по probes
//! 4. Movement: скольжение вдоль уступа → grab интерполяция

use bevy::ecs::query::QueryData;
use bevy::prelude::*;

use super::events::{ClimbActionEvent, ClimbStateChanged};
use super::machine::ClimbContext;
use super::scheduler::PendingActions;
use crate::animation::{AnimationSignal, ClimbAnimator};
use crate::components::{
    ClimbController, ClimbInput, ClimbState, Climber, KinematicBody, KinematicController,
    LateralMotion, ProbeResults,
};
use crate::config::ClimbConfig;

/// Все компоненты, которые трогает climb FSM
#[derive(QueryData)]
#[query_data(mutable)]
pub struct ClimberQuery {
    pub entity: Entity,
    pub state: &'static mut ClimbState,
    pub probes: &'static ProbeResults,
    pub motion: &'static mut LateralMotion,
    pub input: &'static mut ClimbInput,
    pub controller: &'static mut ClimbController,
    pub pending: &'static mut PendingActions,
    pub body: &'static mut KinematicBody,
    pub locomotion: &'static mut KinematicController,
    pub transform: &'static mut Transform,
    pub animator: &'static ClimbAnimator,
}

impl<'w> ClimberQueryItem<'w> {
    /// Контекст FSM поверх компонентов персонажа
    pub fn context<'a>(&'a mut self, config: &'a ClimbConfig) -> ClimbContext<'a> {
        ClimbContext {
            entity: self.entity,
            state: &mut self.state,
            probes: &self.probes,
            motion: &mut self.motion,
            input: &mut self.input,
            controller: &mut self.controller,
            pending: &mut self.pending,
            body: &mut self.body,
            locomotion: &mut self.locomotion,
            transform: &mut self.transform,
            animator: self.animator.observer(),
            config,
            transitions: Vec::new(),
        }
    }
}

fn emit_transitions(
    context: ClimbContext,
    state_changes: &mut EventWriter<ClimbStateChanged>,
) {
    for (from, to) in context.transitions {
        state_changes.write(ClimbStateChanged {
            entity: context.entity,
            from,
            to,
        });
    }
}

/// Система: regrab cooldown + срабатывание отложенных действий
pub fn tick_climb_timers(
    mut climbers: Query<ClimberQuery, With<Climber>>,
    config: Res<ClimbConfig>,
    time: Res<Time<Fixed>>,
    mut state_changes: EventWriter<ClimbStateChanged>,
) {
    let delta = time.delta_secs();

    for mut climber in climbers.iter_mut() {
        climber.controller.tick(delta);

        if climber.pending.is_empty() {
            continue;
        }

        let due = climber.pending.advance(delta);
        let mut context = climber.context(&config);
        for task in due {
            context.fire_deferred(task);
        }
        emit_transitions(context, &mut state_changes);
    }
}

/// Система: сигналы завершения montage от animation graph
pub fn apply_animation_signals(
    mut signals: EventReader<AnimationSignal>,
    mut climbers: Query<ClimberQuery, With<Climber>>,
    config: Res<ClimbConfig>,
    mut state_changes: EventWriter<ClimbStateChanged>,
) {
    for signal in signals.read() {
        let Ok(mut climber) = climbers.get_mut(signal.entity) else {
            crate::log_warning(&format!(
                "AnimationSignal {:?} for unknown climber {:?}",
                signal.kind, signal.entity
            ));
            continue;
        };

        let mut context = climber.context(&config);
        context.on_animation_signal(signal.kind);
        emit_transitions(context, &mut state_changes);
    }
}

/// Система: discrete climb input
pub fn apply_climb_actions(
    mut actions: EventReader<ClimbActionEvent>,
    mut climbers: Query<ClimberQuery, With<Climber>>,
    config: Res<ClimbConfig>,
    mut state_changes: EventWriter<ClimbStateChanged>,
) {
    for event in actions.read() {
        let Ok(mut climber) = climbers.get_mut(event.entity) else {
            crate::log_warning(&format!(
                "ClimbAction {:?} for unknown climber {:?}",
                event.action, event.entity
            ));
            continue;
        };

        let mut context = climber.context(&config);
        context.handle_action(event.action);
        emit_transitions(context, &mut state_changes);
    }
}

/// Система: захват уступа, как только probes нашли его в досягаемости
pub fn detect_ledges(
    mut climbers: Query<ClimberQuery, With<Climber>>,
    config: Res<ClimbConfig>,
    mut state_changes: EventWriter<ClimbStateChanged>,
) {
    for mut climber in climbers.iter_mut() {
        if *climber.state != ClimbState::Grounded || !climber.probes.ledge_in_reach {
            continue;
        }

        let mut context = climber.context(&config);
        context.try_grab_from_probe();
        emit_transitions(context, &mut state_changes);
    }
}

/// Система: скольжение вдоль уступа по lateral оси
pub fn slide_along_ledge(
    mut climbers: Query<ClimberQuery, With<Climber>>,
    config: Res<ClimbConfig>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for mut climber in climbers.iter_mut() {
        climber.context(&config).slide(delta);
    }
}

/// Система: grab интерполяция к позе на стене
pub fn advance_grab_moves(
    mut climbers: Query<ClimberQuery, With<Climber>>,
    config: Res<ClimbConfig>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for mut climber in climbers.iter_mut() {
        if climber.controller.grab.is_none() {
            continue;
        }
        climber.context(&config).advance_grab(delta);
    }
}
