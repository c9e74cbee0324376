//! Отложенные climb действия (grab после прыжка, включение input после угла, fallback таймауты)
//!
//! Каждое действие получает token (по кругу 0..TOKEN_MODULUS, занятые пропускаются),
//! по token или по виду действия задачу можно отменить.
//! Время считается в секундах fixed tick'ов: никаких wall-clock таймеров.

use bevy::prelude::*;

/// Размер пространства token'ов
pub const TOKEN_MODULUS: u8 = 26;

/// Генератор token'ов с переполнением по модулю
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct TokenSequence {
    next: u8,
}

impl TokenSequence {
    /// Следующий свободный token (пропускает те, что ещё в полёте)
    ///
    /// Если заняты все `TOKEN_MODULUS` token'ов, возвращается очередной по кругу.
    pub fn issue(&mut self, in_flight: impl Fn(u8) -> bool) -> u8 {
        for _ in 0..TOKEN_MODULUS {
            let token = self.advance();
            if !in_flight(token) {
                return token;
            }
        }

        self.advance()
    }

    fn advance(&mut self) -> u8 {
        let token = self.next;
        self.next = (self.next + 1) % TOKEN_MODULUS;
        token
    }
}

/// Вид отложенного действия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum DeferredAction {
    /// Повторный захват уступа (после прыжка в сторону / поворота за угол)
    GrabLedge,
    /// Вернуть управление после поворота за угол
    EnableInput,
    /// Fallback: montage прыжка вверх не прислал сигнал
    FinishJumpUp,
    /// Fallback: montage залезания не прислал сигнал
    FinishClimbUp,
}

/// Запланированная задача
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ScheduledTask {
    pub token: u8,
    /// Секунд до срабатывания
    pub remaining: f32,
    pub action: DeferredAction,
}

/// Очередь отложенных действий персонажа
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PendingActions {
    tasks: Vec<ScheduledTask>,
    tokens: TokenSequence,
}

impl PendingActions {
    /// Планирует действие через `delay` секунд, возвращает token
    pub fn schedule(&mut self, action: DeferredAction, delay: f32) -> u8 {
        let token = self.reserve_token();
        self.tasks.push(ScheduledTask {
            token,
            remaining: delay.max(0.0),
            action,
        });
        token
    }

    /// Token без задачи (для манёвров, которые тикают сами, например grab)
    pub fn reserve_token(&mut self) -> u8 {
        let tasks = &self.tasks;
        self.tokens.issue(|token| tasks.iter().any(|task| task.token == token))
    }

    pub fn cancel(&mut self, token: u8) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.token != token);
        self.tasks.len() != before
    }

    /// Отменяет все задачи данного вида, возвращает сколько отменено
    pub fn cancel_kind(&mut self, action: DeferredAction) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.action != action);
        before - self.tasks.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    pub fn is_pending(&self, action: DeferredAction) -> bool {
        self.tasks.iter().any(|task| task.action == action)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Продвигает время, забирает созревшие задачи
    ///
    /// Созревшие возвращаются в порядке срабатывания (при равенстве: в порядке планирования).
    pub fn advance(&mut self, delta: f32) -> Vec<ScheduledTask> {
        let mut due = Vec::new();

        self.tasks.retain_mut(|task| {
            task.remaining -= delta;
            if task.remaining <= 0.0 {
                due.push(*task);
                false
            } else {
                true
            }
        });

        due.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        due
    }
}
