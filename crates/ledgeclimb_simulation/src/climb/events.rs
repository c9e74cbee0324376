//! Climb events: discrete input и уведомления о смене состояния

use bevy::prelude::*;

use crate::components::ClimbState;

/// Discrete climb action (нажатие кнопки)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimbAction {
    /// Прыжок: на земле обычный, на уступе: side jump / climb up / jump up / jump back
    Jump,
    /// Развернуться спиной к стене, повторно: отпустить уступ
    ExitClimb,
    TurnLeftCorner,
    TurnRightCorner,
    /// Развернуться обратно лицом к стене
    TurnForward,
}

/// Event: input персонажа
#[derive(Event, Debug, Clone, Copy)]
pub struct ClimbActionEvent {
    pub entity: Entity,
    pub action: ClimbAction,
}

/// Event: climb FSM перешла в новое состояние
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ClimbStateChanged {
    pub entity: Entity,
    pub from: ClimbState,
    pub to: ClimbState,
}
