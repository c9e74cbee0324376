//! Animation port: связь climb FSM с визуальным слоем
//!
//! Исходящие уведомления (ECS → анимация):
//! - `ClimbAnimationObserver`: capability interface, все методы по умолчанию no-op
//! - `ClimbAnimator`: компонент с привязанным observer (резолвится один раз при spawn)
//!
//! Входящие сигналы (анимация → ECS):
//! - `AnimationSignal`: завершение montage (climb up, side jump, jump up)
//!
//! FSM всегда вызывает порт; механический эффект перехода (режим движения, состояние)
//! выполняется независимо от того, реализует ли визуальный слой уведомление.

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use crate::components::Side;

/// Уведомления для animation graph персонажа
///
/// Fire-and-forget: возвращаемых значений нет, реализация может игнорировать любое.
pub trait ClimbAnimationObserver: Send + Sync {
    fn character_can_grab(&self, _can_grab: bool) {}

    fn character_climbing_ledge(&self, _climbing: bool) {}

    fn move_left_right(&self, _axis: f32) {}

    fn jump_left(&self, _jumping: bool) {}

    fn jump_right(&self, _jumping: bool) {}

    fn jump_up(&self, _jumping: bool) {}

    fn turn_back(&self, _turned_back: bool) {}

    /// Визуальный cue поворота за угол (montage)
    fn play_corner_turn(&self, _side: Side) {}
}

/// Observer без визуального слоя (headless, тесты)
pub struct NoAnimation;

impl ClimbAnimationObserver for NoAnimation {}

/// Привязка animation observer к персонажу
#[derive(Component)]
pub struct ClimbAnimator(pub Box<dyn ClimbAnimationObserver>);

impl Default for ClimbAnimator {
    fn default() -> Self {
        Self(Box::new(NoAnimation))
    }
}

impl ClimbAnimator {
    pub fn new(observer: impl ClimbAnimationObserver + 'static) -> Self {
        Self(Box::new(observer))
    }

    pub fn observer(&self) -> &dyn ClimbAnimationObserver {
        self.0.as_ref()
    }
}

/// Записанное уведомление (для тестов и debug overlay)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationNotification {
    CanGrab(bool),
    ClimbingLedge(bool),
    MoveLeftRight(f32),
    JumpLeft(bool),
    JumpRight(bool),
    JumpUp(bool),
    TurnBack(bool),
    CornerTurn(Side),
}

/// Observer, который складывает уведомления в общий буфер
///
/// Клон делит буфер с оригиналом: один экземпляр уходит в `ClimbAnimator`,
/// второй остаётся у теста для проверок.
#[derive(Clone, Default)]
pub struct RecordingAnimator {
    log: Arc<Mutex<Vec<AnimationNotification>>>,
}

impl RecordingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, notification: AnimationNotification) {
        if let Ok(mut log) = self.log.lock() {
            log.push(notification);
        }
    }

    pub fn notifications(&self) -> Vec<AnimationNotification> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Уведомления без потока MoveLeftRight (он идёт каждый tick пока висим)
    pub fn discrete_notifications(&self) -> Vec<AnimationNotification> {
        self.notifications()
            .into_iter()
            .filter(|n| !matches!(n, AnimationNotification::MoveLeftRight(_)))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }
}

impl ClimbAnimationObserver for RecordingAnimator {
    fn character_can_grab(&self, can_grab: bool) {
        self.push(AnimationNotification::CanGrab(can_grab));
    }

    fn character_climbing_ledge(&self, climbing: bool) {
        self.push(AnimationNotification::ClimbingLedge(climbing));
    }

    fn move_left_right(&self, axis: f32) {
        self.push(AnimationNotification::MoveLeftRight(axis));
    }

    fn jump_left(&self, jumping: bool) {
        self.push(AnimationNotification::JumpLeft(jumping));
    }

    fn jump_right(&self, jumping: bool) {
        self.push(AnimationNotification::JumpRight(jumping));
    }

    fn jump_up(&self, jumping: bool) {
        self.push(AnimationNotification::JumpUp(jumping));
    }

    fn turn_back(&self, turned_back: bool) {
        self.push(AnimationNotification::TurnBack(turned_back));
    }

    fn play_corner_turn(&self, side: Side) {
        self.push(AnimationNotification::CornerTurn(side));
    }
}

/// Сигнал завершения от animation graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationSignalKind {
    /// Montage залезания закончился: персонаж стоит на уступе
    ClimbUpFinished,
    /// Montage прыжка в сторону закончился
    SideJumpFinished(Side),
    /// Montage прыжка вверх закончился
    JumpUpFinished,
}

/// Event: animation graph сообщает о завершении montage
#[derive(Event, Debug, Clone, Copy)]
pub struct AnimationSignal {
    pub entity: Entity,
    pub kind: AnimationSignalKind,
}
