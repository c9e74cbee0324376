//! Climb FSM: все переходы в одном месте
//!
//! `ClimbContext` собирает мутабельные компоненты одного персонажа (state, input, body,
//! transform, pending actions) + config + animation port. Каждый переход: метод.
//!
//! Правила:
//! - Смена `ClimbState` только через `transition()` (таблица `ClimbState::target`)
//! - Animation port вызывается всегда; механический эффект не зависит от визуального слоя
//! - Отложенные действия перепроверяют состояние при срабатывании (устаревшие отбрасываются)

use bevy::prelude::*;
use std::f32::consts::PI;

use super::maneuvers::{corner_target, grab_target, vinterp_to};
use super::scheduler::{DeferredAction, PendingActions, ScheduledTask};
use super::ClimbAction;
use crate::animation::{AnimationSignalKind, ClimbAnimationObserver};
use crate::components::{
    ClimbController, ClimbInput, ClimbState, ClimbTransition, GrabMove, KinematicBody,
    KinematicController, LateralMotion, MovementMode, ProbeResults, Side,
};
use crate::config::ClimbConfig;

/// Climb контекст одного персонажа на время одного вызова системы
pub struct ClimbContext<'a> {
    pub entity: Entity,
    pub state: &'a mut ClimbState,
    pub probes: &'a ProbeResults,
    pub motion: &'a mut LateralMotion,
    pub input: &'a mut ClimbInput,
    pub controller: &'a mut ClimbController,
    pub pending: &'a mut PendingActions,
    pub body: &'a mut KinematicBody,
    pub locomotion: &'a mut KinematicController,
    pub transform: &'a mut Transform,
    pub animator: &'a dyn ClimbAnimationObserver,
    pub config: &'a ClimbConfig,
    /// Переходы за этот вызов (from, to): системы превращают их в `ClimbStateChanged`
    pub transitions: Vec<(ClimbState, ClimbState)>,
}

impl<'a> ClimbContext<'a> {
    /// Применяет переход по таблице; false: переход из текущего состояния запрещён
    fn transition(&mut self, transition: ClimbTransition, reason: &str) -> bool {
        let from = *self.state;
        let Some(to) = from.target(transition) else {
            return false;
        };

        *self.state = to;
        self.transitions.push((from, to));
        crate::log(&format!("🧗 {:?} {:?} → {:?} ({})", self.entity, from, to, reason));
        true
    }

    // ========================================================================
    // Grab
    // ========================================================================

    /// Захват уступа по результатам probes (Grounded → Hanging)
    pub fn try_grab_from_probe(&mut self) -> bool {
        if *self.state != ClimbState::Grounded
            || !self.controller.can_grab()
            || !self.probes.ledge_in_reach
            || self.probes.wall.is_none()
            || self.probes.ledge.is_none()
        {
            return false;
        }

        self.animator.character_can_grab(true);
        self.body.mode = MovementMode::Flying;
        self.transition(ClimbTransition::Grab, "ledge in reach");
        self.grab_ledge()
    }

    /// Grab манёвр: интерполяция capsule к позе на стене
    ///
    /// Без валидных wall/ledge данных манёвр отменяется и персонаж отпускает стену.
    pub fn grab_ledge(&mut self) -> bool {
        let (Some(wall), Some(ledge)) = (self.probes.wall, self.probes.ledge) else {
            crate::log_warning(&format!(
                "⚠️ {:?} grab aborted: no wall/ledge data (wall: {}, ledge: {})",
                self.entity,
                self.probes.wall.is_some(),
                self.probes.ledge.is_some()
            ));
            self.exit_climb("grab aborted");
            return false;
        };

        let (to_translation, to_rotation) = grab_target(&wall, ledge, self.config);
        self.start_move(to_translation, to_rotation, self.config.grab_duration);
        true
    }

    /// Запускает интерполяцию capsule к позе (grab или перенос за угол)
    fn start_move(&mut self, to_translation: Vec3, to_rotation: Quat, duration: f32) {
        let token = self.pending.reserve_token();

        let previous = self.controller.grab.replace(GrabMove {
            from_translation: self.transform.translation,
            from_rotation: self.transform.rotation,
            to_translation,
            to_rotation,
            duration,
            elapsed: 0.0,
            token,
        });

        if let Some(previous) = previous {
            crate::log(&format!(
                "{:?} move #{} replaces in-flight move #{}",
                self.entity, token, previous.token
            ));
        }
    }

    /// Продвигает активную grab интерполяцию
    pub fn advance_grab(&mut self, delta: f32) {
        let Some(grab) = self.controller.grab.as_mut() else {
            return;
        };

        if grab.advance(delta, self.transform) {
            self.ledge_movement_finished();
        }
    }

    /// Grab завершён: персонаж неподвижно висит (режим остаётся Flying)
    pub fn ledge_movement_finished(&mut self) {
        if let Some(grab) = self.controller.grab.take() {
            crate::log(&format!(
                "{:?} grab #{} finished at {:?}",
                self.entity, grab.token, grab.to_translation
            ));
        }
        self.body.stop();
    }

    // ========================================================================
    // Climb up / exit
    // ========================================================================

    /// Залезть на уступ (Hanging → ClimbingUp)
    pub fn climb_ledge(&mut self) -> bool {
        if !self.transition(ClimbTransition::ClimbUp, "climb up") {
            return false;
        }

        self.animator.character_climbing_ledge(true);
        self.body.mode = MovementMode::Flying;
        self.motion.moving = None;
        self.controller.climb_up_target = self
            .probes
            .ledge
            .map(|ledge| ledge - Vec3::Y * self.config.height_probe_radius);

        if let Some(timeout) = self.config.climb_up_timeout {
            self.pending.schedule(DeferredAction::FinishClimbUp, timeout);
        }
        true
    }

    /// Завершение залезания: персонаж стоит на уступе (ClimbingUp → Grounded)
    pub fn finish_climb_up(&mut self, reason: &str) -> bool {
        if !self.transition(ClimbTransition::FinishClimbUp, reason) {
            return false;
        }

        self.pending.cancel_kind(DeferredAction::FinishClimbUp);
        self.controller.grab = None;
        self.body.stop();
        self.body.mode = MovementMode::Walking;
        self.animator.character_climbing_ledge(false);

        if let Some(top) = self.controller.climb_up_target.take() {
            self.locomotion.ground_level = top.y;
            self.transform.translation = Vec3::new(top.x, self.locomotion.standing_height(), top.z);
        }
        true
    }

    /// Отпустить уступ (любое hanging состояние → Grounded)
    ///
    /// На земле: no-op.
    pub fn exit_climb(&mut self, reason: &str) -> bool {
        self.leave_ledge(ClimbTransition::Exit, reason)
    }

    fn leave_ledge(&mut self, transition: ClimbTransition, reason: &str) -> bool {
        let from = *self.state;
        if !from.is_hanging() || !self.transition(transition, reason) {
            return false;
        }

        if let ClimbState::JumpingSide(side) = from {
            self.notify_side_jump(side, false);
        }
        if from == ClimbState::JumpingUp {
            self.animator.jump_up(false);
        }

        let cancelled = self.pending.cancel_all();
        if cancelled > 0 {
            crate::log(&format!("{:?} cancelled {} pending climb actions", self.entity, cancelled));
        }

        self.body.mode = MovementMode::Walking;
        self.animator.character_can_grab(false);
        self.controller.grab = None;
        self.controller.regrab_cooldown = self.config.regrab_cooldown;
        self.input.enabled = true;
        self.motion.moving = None;
        true
    }

    // ========================================================================
    // Jumps
    // ========================================================================

    /// Jump input: выбор манёвра по состоянию и probes
    ///
    /// Hanging: вправо (ось > 0) иначе climb up, если можно прыгнуть вправо;
    /// влево (ось < 0) иначе climb up, если можно прыгнуть влево;
    /// вверх (ось нейтральна) если есть уступ сверху; иначе climb up.
    pub fn handle_jump(&mut self) -> bool {
        match *self.state {
            ClimbState::Grounded => self.ground_jump(),
            ClimbState::TurnedBack => self.jump_back(),
            ClimbState::Hanging => {
                let axis = self.input.right_axis();

                if self.probes.can_jump(Side::Right) {
                    if axis > 0.0 {
                        self.jump_side(Side::Right)
                    } else {
                        self.climb_ledge()
                    }
                } else if self.probes.can_jump(Side::Left) {
                    if axis < 0.0 {
                        self.jump_side(Side::Left)
                    } else {
                        self.climb_ledge()
                    }
                } else if self.probes.can_jump_up() {
                    // С боковым input прыжок вверх не срабатывает и climb up не выбирается
                    self.jump_up()
                } else {
                    self.climb_ledge()
                }
            }
            // Манёвр в процессе
            _ => false,
        }
    }

    /// Обычный прыжок с земли
    fn ground_jump(&mut self) -> bool {
        if !self.locomotion.grounded || self.body.mode != MovementMode::Walking {
            return false;
        }

        self.body.velocity.y = self.locomotion.jump_velocity;
        self.body.mode = MovementMode::Falling;
        self.locomotion.grounded = false;
        crate::log(&format!("🦘 {:?} jump (vy={})", self.entity, self.locomotion.jump_velocity));
        true
    }

    /// Прыжок к соседнему уступу (Hanging → JumpingSide)
    ///
    /// Ось должна смотреть в сторону прыжка. Повторный вызов во время прыжка ничего не планирует.
    pub fn jump_side(&mut self, side: Side) -> bool {
        if *self.state != ClimbState::Hanging
            || !self.probes.can_jump(side)
            || Side::from_axis(self.input.right_axis()) != Some(side)
        {
            return false;
        }

        self.body.mode = MovementMode::Flying;
        self.transition(ClimbTransition::JumpSide(side), "side jump");
        self.notify_side_jump(side, true);

        self.controller.grab = None;
        self.motion.moving = None;
        let right = self.transform.rotation * Vec3::X;
        self.body.velocity = right * side.sign() * self.config.side_jump_travel_speed;

        self.pending
            .schedule(DeferredAction::GrabLedge, self.config.side_jump_grab_delay);
        true
    }

    /// Прыжок к уступу сверху (Hanging → JumpingUp)
    pub fn jump_up(&mut self) -> bool {
        if *self.state != ClimbState::Hanging
            || self.input.right_axis() != 0.0
            || !self.probes.can_jump_up()
        {
            return false;
        }

        self.body.mode = MovementMode::Flying;
        self.transition(ClimbTransition::JumpUp, "jump up");
        self.input.enabled = false;
        self.motion.moving = None;
        self.animator.jump_up(true);

        if let Some(timeout) = self.config.jump_up_timeout {
            self.pending.schedule(DeferredAction::FinishJumpUp, timeout);
        }
        true
    }

    /// Завершение прыжка вверх: захват верхнего уступа (JumpingUp → Hanging)
    pub fn finish_jump_up(&mut self, reason: &str) -> bool {
        if *self.state != ClimbState::JumpingUp {
            return false;
        }

        self.pending.cancel_kind(DeferredAction::FinishJumpUp);
        self.body.stop();
        self.animator.jump_up(false);
        self.input.enabled = true;
        self.transition(ClimbTransition::Reattach, reason);
        self.grab_ledge()
    }

    /// Прыжок от стены спиной (TurnedBack / Hanging → Grounded)
    ///
    /// Импульс назад и вверх, потом разворот на 180° по yaw.
    pub fn jump_back(&mut self) -> bool {
        if !self.state.allows(ClimbTransition::JumpBack) {
            return false;
        }

        let forward = self.transform.rotation * Vec3::NEG_Z;
        let flat_forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
        let impulse = flat_forward * self.config.jump_back_forward_velocity
            + Vec3::Y * self.config.jump_back_vertical_velocity;

        self.leave_ledge(ClimbTransition::JumpBack, "jump back");
        self.body.launch(impulse);
        self.animator.turn_back(false);
        self.transform.rotate_y(PI);
        true
    }

    // ========================================================================
    // Turns
    // ========================================================================

    /// Поворот за угол (Hanging → TurningCorner)
    ///
    /// Capsule переносится за ребро лицом к боковой грани (`corner_target`),
    /// повторный grab через `corner_grab_delay` берёт уже эту грань.
    /// Input отключается до `corner_input_delay`.
    pub fn turn_corner(&mut self, side: Side) -> bool {
        if *self.state != ClimbState::Hanging
            || self.probes.can_jump(side)
            || !self.probes.can_turn(side)
        {
            return false;
        }

        self.input.enabled = false;
        self.motion.moving = None;
        self.transition(ClimbTransition::TurnCorner(side), "corner turn");
        self.animator.play_corner_turn(side);

        let (to_translation, to_rotation) = corner_target(
            self.transform.translation,
            self.transform.rotation,
            side,
            self.config,
        );
        self.start_move(to_translation, to_rotation, self.config.corner_travel_duration);

        self.pending
            .schedule(DeferredAction::GrabLedge, self.config.corner_grab_delay);
        self.pending
            .schedule(DeferredAction::EnableInput, self.config.corner_input_delay);
        true
    }

    /// Развернуться спиной к стене
    pub fn turn_back(&mut self) -> bool {
        if !self.transition(ClimbTransition::TurnBack, "turn back") {
            return false;
        }
        self.motion.moving = None;
        self.animator.turn_back(true);
        true
    }

    /// Развернуться обратно лицом к стене
    pub fn turn_forward(&mut self) -> bool {
        if !self.transition(ClimbTransition::TurnForward, "turn forward") {
            return false;
        }
        self.animator.turn_back(false);
        true
    }

    /// Exit input: сначала разворот спиной, повторно: отпустить уступ
    pub fn check_for_turn_back_or_exit(&mut self) -> bool {
        match *self.state {
            ClimbState::TurnedBack => {
                self.animator.turn_back(false);
                self.exit_climb("exit from turned back")
            }
            ClimbState::Hanging => self.turn_back(),
            _ => false,
        }
    }

    // ========================================================================
    // Lateral sliding
    // ========================================================================

    /// Скольжение вдоль уступа по lateral оси
    pub fn slide(&mut self, delta: f32) {
        if *self.state != ClimbState::Hanging {
            self.motion.moving = None;
            return;
        }

        let axis = self.input.right_axis();
        self.animator.move_left_right(axis);

        let Some(side) = Side::from_axis(axis) else {
            self.motion.moving = None;
            return;
        };

        if !self.probes.can_move(side) || self.controller.grab.is_some() {
            self.motion.moving = None;
            return;
        }

        let right = self.transform.rotation * Vec3::X;
        let target = self.transform.translation + right * side.sign() * self.config.slide_step;
        self.transform.translation = vinterp_to(
            self.transform.translation,
            target,
            delta,
            self.config.slide_interp_speed,
        );
        self.motion.moving = Some(side);
    }

    // ========================================================================
    // Inbound: actions, animation signals, deferred tasks
    // ========================================================================

    /// Discrete input; при отключённом input отбрасывается
    pub fn handle_action(&mut self, action: ClimbAction) -> bool {
        if !self.input.enabled {
            crate::log(&format!(
                "{:?} {:?} dropped: input disabled ({:?})",
                self.entity, action, self.state
            ));
            return false;
        }

        match action {
            ClimbAction::Jump => self.handle_jump(),
            ClimbAction::ExitClimb => self.check_for_turn_back_or_exit(),
            ClimbAction::TurnLeftCorner => self.turn_corner(Side::Left),
            ClimbAction::TurnRightCorner => self.turn_corner(Side::Right),
            ClimbAction::TurnForward => self.turn_forward(),
        }
    }

    /// Сигнал завершения от animation graph
    pub fn on_animation_signal(&mut self, kind: AnimationSignalKind) -> bool {
        match kind {
            AnimationSignalKind::ClimbUpFinished => self.finish_climb_up("climb up montage finished"),
            AnimationSignalKind::SideJumpFinished(side) => {
                if *self.state != ClimbState::JumpingSide(side) {
                    return false;
                }
                self.body.stop();
                true
            }
            AnimationSignalKind::JumpUpFinished => self.finish_jump_up("jump up montage finished"),
        }
    }

    /// Срабатывание отложенного действия (с перепроверкой состояния)
    pub fn fire_deferred(&mut self, task: ScheduledTask) -> bool {
        let fired = match task.action {
            DeferredAction::GrabLedge => self.reattach(),
            DeferredAction::EnableInput => {
                self.input.enabled = true;
                true
            }
            DeferredAction::FinishJumpUp => self.finish_jump_up("jump up timeout"),
            DeferredAction::FinishClimbUp => self.finish_climb_up("climb up timeout"),
        };

        if !fired {
            crate::log(&format!(
                "{:?} stale {:?} #{} discarded in {:?}",
                self.entity, task.action, task.token, self.state
            ));
        }
        fired
    }

    /// Повторный захват после прыжка в сторону / поворота за угол
    fn reattach(&mut self) -> bool {
        let side = match *self.state {
            ClimbState::JumpingSide(side) => {
                self.notify_side_jump(side, false);
                side
            }
            ClimbState::TurningCorner(side) => side,
            _ => return false,
        };

        self.body.stop();
        self.transition(ClimbTransition::Reattach, &format!("regrab after {:?} maneuver", side));
        self.grab_ledge()
    }

    fn notify_side_jump(&self, side: Side, jumping: bool) {
        match side {
            Side::Left => self.animator.jump_left(jumping),
            Side::Right => self.animator.jump_right(jumping),
        }
    }
}
