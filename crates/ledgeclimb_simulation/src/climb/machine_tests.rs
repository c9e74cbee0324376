//! Tests for climb FSM transitions.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::super::machine::ClimbContext;
    use super::super::scheduler::{DeferredAction, PendingActions};
    use super::super::ClimbAction;
    use crate::animation::{AnimationNotification, AnimationSignalKind, RecordingAnimator};
    use crate::components::*;
    use crate::config::ClimbConfig;

    const TICK: f32 = 1.0 / 60.0;

    /// Компоненты одного персонажа без ECS мира
    struct Fixture {
        state: ClimbState,
        probes: ProbeResults,
        motion: LateralMotion,
        input: ClimbInput,
        controller: ClimbController,
        pending: PendingActions,
        body: KinematicBody,
        locomotion: KinematicController,
        transform: Transform,
        recorder: RecordingAnimator,
        config: ClimbConfig,
    }

    impl Fixture {
        /// Персонаж стоит перед стеной с уступом в досягаемости
        fn facing_ledge() -> Self {
            let probes = ProbeResults {
                wall: Some(WallContact {
                    location: Vec3::new(0.0, 96.0, -40.0),
                    normal: Vec3::Z,
                }),
                ledge: Some(Vec3::new(0.0, 130.0, -70.0)),
                ledge_gap: Some(-34.0),
                ledge_in_reach: true,
                ..default()
            };

            Self {
                state: ClimbState::Grounded,
                probes,
                motion: LateralMotion::default(),
                input: ClimbInput::default(),
                controller: ClimbController::default(),
                pending: PendingActions::default(),
                body: KinematicBody::default(),
                locomotion: KinematicController {
                    grounded: true,
                    ..default()
                },
                transform: Transform::from_xyz(0.0, 96.0, 0.0),
                recorder: RecordingAnimator::new(),
                config: ClimbConfig::default(),
            }
        }

        /// Уже висит на уступе (grab завершён)
        fn hanging() -> Self {
            let mut fixture = Self::facing_ledge();
            assert!(fixture.ctx().try_grab_from_probe());
            fixture.ctx().advance_grab(1.0);
            fixture.recorder.clear();
            fixture
        }

        fn ctx(&mut self) -> ClimbContext<'_> {
            ClimbContext {
                entity: Entity::PLACEHOLDER,
                state: &mut self.state,
                probes: &self.probes,
                motion: &mut self.motion,
                input: &mut self.input,
                controller: &mut self.controller,
                pending: &mut self.pending,
                body: &mut self.body,
                locomotion: &mut self.locomotion,
                transform: &mut self.transform,
                animator: &self.recorder,
                config: &self.config,
                transitions: Vec::new(),
            }
        }

        /// Прогоняет таймеры на `seconds` fixed tick'ами
        fn run_timers(&mut self, seconds: f32) {
            let ticks = (seconds / TICK).ceil() as usize;
            for _ in 0..ticks {
                self.controller.tick(TICK);
                let due = self.pending.advance(TICK);
                let mut ctx = self.ctx();
                for task in due {
                    ctx.fire_deferred(task);
                }
                ctx.advance_grab(TICK);
            }
        }
    }

    #[test]
    fn test_grab_from_probe() {
        let mut fixture = Fixture::facing_ledge();

        assert!(fixture.ctx().try_grab_from_probe());
        assert_eq!(fixture.state, ClimbState::Hanging);
        assert_eq!(fixture.body.mode, MovementMode::Flying);
        assert_eq!(
            fixture.recorder.discrete_notifications(),
            vec![AnimationNotification::CanGrab(true)]
        );

        let grab = fixture.controller.grab.expect("grab in flight");
        assert!((grab.to_translation - Vec3::new(0.0, 10.0, -18.0)).length() < 1e-4);
        assert_eq!(grab.duration, 0.13);

        fixture.run_timers(0.2);
        assert!(fixture.controller.grab.is_none());
        assert!((fixture.transform.translation - Vec3::new(0.0, 10.0, -18.0)).length() < 1e-3);
        assert!(fixture.body.is_idle());
        assert_eq!(fixture.body.mode, MovementMode::Flying);
    }

    #[test]
    fn test_no_grab_out_of_reach_or_on_cooldown() {
        let mut fixture = Fixture::facing_ledge();
        fixture.probes.ledge_in_reach = false;
        assert!(!fixture.ctx().try_grab_from_probe());
        assert_eq!(fixture.state, ClimbState::Grounded);

        let mut fixture = Fixture::facing_ledge();
        fixture.controller.regrab_cooldown = 0.3;
        assert!(!fixture.ctx().try_grab_from_probe());

        let mut fixture = Fixture::facing_ledge();
        fixture.probes.wall = None;
        assert!(!fixture.ctx().try_grab_from_probe());
        assert!(fixture.recorder.notifications().is_empty());
    }

    #[test]
    fn test_exit_climb_when_grounded_is_noop() {
        let mut fixture = Fixture::facing_ledge();
        fixture.body.velocity = Vec3::new(10.0, 0.0, 0.0);

        let mut ctx = fixture.ctx();
        assert!(!ctx.exit_climb("test"));
        assert!(ctx.transitions.is_empty());
        drop(ctx);

        assert_eq!(fixture.state, ClimbState::Grounded);
        assert_eq!(fixture.body.mode, MovementMode::Walking);
        assert_eq!(fixture.body.velocity, Vec3::new(10.0, 0.0, 0.0));
        assert!(fixture.recorder.notifications().is_empty());
        assert!(fixture.controller.can_grab());
    }

    #[test]
    fn test_hang_then_exit() {
        let mut fixture = Fixture::hanging();

        // Первое нажатие: разворот спиной, второе: отпустить
        assert!(fixture.ctx().handle_action(ClimbAction::ExitClimb));
        assert_eq!(fixture.state, ClimbState::TurnedBack);
        assert!(fixture.ctx().handle_action(ClimbAction::ExitClimb));

        assert_eq!(fixture.state, ClimbState::Grounded);
        assert!(!fixture.state.is_hanging());
        assert!(!fixture.state.is_jumping());
        assert!(!fixture.state.is_turned_back());
        assert_eq!(fixture.body.mode, MovementMode::Walking);
        assert!(!fixture.controller.can_grab());
        assert_eq!(
            fixture.recorder.discrete_notifications(),
            vec![
                AnimationNotification::TurnBack(true),
                AnimationNotification::TurnBack(false),
                AnimationNotification::CanGrab(false),
            ]
        );
    }

    #[test]
    fn test_exit_climb_directly() {
        let mut fixture = Fixture::hanging();

        let mut ctx = fixture.ctx();
        assert!(ctx.exit_climb("test"));
        assert_eq!(ctx.transitions, vec![(ClimbState::Hanging, ClimbState::Grounded)]);
        drop(ctx);

        assert_eq!(fixture.body.mode, MovementMode::Walking);
        assert_eq!(fixture.controller.regrab_cooldown, 0.5);
    }

    #[test]
    fn test_side_jump_requires_matching_axis() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Right, true);

        // Ось не в ту сторону
        fixture.input.axes = Vec2::new(-1.0, 0.0);
        assert!(!fixture.ctx().jump_side(Side::Right));
        assert_eq!(fixture.state, ClimbState::Hanging);

        fixture.input.axes = Vec2::new(1.0, 0.0);
        assert!(fixture.ctx().jump_side(Side::Right));
        assert_eq!(fixture.state, ClimbState::JumpingSide(Side::Right));
        assert_eq!(fixture.body.mode, MovementMode::Flying);
        assert!(fixture.body.velocity.x > 0.0);
        assert_eq!(
            fixture.recorder.discrete_notifications(),
            vec![AnimationNotification::JumpRight(true)]
        );
        assert_eq!(fixture.pending.len(), 1);
        assert!(fixture.pending.is_pending(DeferredAction::GrabLedge));
    }

    #[test]
    fn test_side_jump_not_rescheduled_while_jumping() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Left, true);
        fixture.input.axes = Vec2::new(-1.0, 0.0);

        assert!(fixture.ctx().handle_action(ClimbAction::Jump));
        assert!(!fixture.ctx().handle_action(ClimbAction::Jump));
        assert!(!fixture.ctx().jump_side(Side::Left));
        assert_eq!(fixture.pending.len(), 1);
    }

    #[test]
    fn test_side_jump_blocked_when_lateral_free() {
        let mut fixture = Fixture::hanging();
        fixture.probes.lateral.set(Side::Right, true);
        fixture.input.axes = Vec2::new(1.0, 0.0);

        assert!(!fixture.ctx().jump_side(Side::Right));
        assert!(fixture.pending.is_empty());
    }

    #[test]
    fn test_side_jump_regrabs_after_delay() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Right, true);
        fixture.input.axes = Vec2::new(1.0, 0.0);
        assert!(fixture.ctx().jump_side(Side::Right));

        fixture.run_timers(0.7);
        assert_eq!(fixture.state, ClimbState::JumpingSide(Side::Right));

        fixture.run_timers(0.4);
        assert_eq!(fixture.state, ClimbState::Hanging);
        assert!(fixture
            .recorder
            .discrete_notifications()
            .contains(&AnimationNotification::JumpRight(false)));
    }

    #[test]
    fn test_side_jump_signal_stops_movement() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Right, true);
        fixture.input.axes = Vec2::new(1.0, 0.0);
        assert!(fixture.ctx().jump_side(Side::Right));

        assert!(!fixture
            .ctx()
            .on_animation_signal(AnimationSignalKind::SideJumpFinished(Side::Left)));
        assert!(fixture
            .ctx()
            .on_animation_signal(AnimationSignalKind::SideJumpFinished(Side::Right)));
        assert!(fixture.body.is_idle());
        assert_eq!(fixture.state, ClimbState::JumpingSide(Side::Right));
    }

    #[test]
    fn test_jump_tie_break_prefers_climb_without_axis() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Right, true);
        fixture.probes.jump_up = true;

        assert!(fixture.ctx().handle_jump());
        assert_eq!(fixture.state, ClimbState::ClimbingUp);
        assert_eq!(
            fixture.recorder.discrete_notifications(),
            vec![AnimationNotification::ClimbingLedge(true)]
        );
    }

    #[test]
    fn test_jump_up_when_axis_neutral() {
        let mut fixture = Fixture::hanging();
        fixture.probes.jump_up = true;

        assert!(fixture.ctx().handle_jump());
        assert_eq!(fixture.state, ClimbState::JumpingUp);
        assert!(!fixture.input.enabled);
        assert!(fixture.state.is_jumping());

        // Input отключён: discrete actions отбрасываются
        assert!(!fixture.ctx().handle_action(ClimbAction::ExitClimb));
        assert_eq!(fixture.state, ClimbState::JumpingUp);

        assert!(fixture
            .ctx()
            .on_animation_signal(AnimationSignalKind::JumpUpFinished));
        assert_eq!(fixture.state, ClimbState::Hanging);
        assert!(fixture.input.enabled);
        assert!(fixture.controller.grab.is_some());
        assert!(!fixture.pending.is_pending(DeferredAction::FinishJumpUp));
    }

    #[test]
    fn test_jump_up_fallback_timeout() {
        let mut fixture = Fixture::hanging();
        fixture.probes.jump_up = true;
        assert!(fixture.ctx().jump_up());

        fixture.run_timers(1.1);
        assert_eq!(fixture.state, ClimbState::Hanging);
        assert!(fixture.input.enabled);
    }

    #[test]
    fn test_climb_up_and_finish() {
        let mut fixture = Fixture::hanging();

        assert!(fixture.ctx().climb_ledge());
        assert_eq!(fixture.state, ClimbState::ClimbingUp);
        assert!(fixture.state.is_climbing_ledge());

        assert!(fixture
            .ctx()
            .on_animation_signal(AnimationSignalKind::ClimbUpFinished));
        assert_eq!(fixture.state, ClimbState::Grounded);
        assert_eq!(fixture.body.mode, MovementMode::Walking);
        // Стоит на уступе: верх уступа 110, capsule half height 96
        assert!((fixture.transform.translation.y - 206.0).abs() < 1e-3);
        assert_eq!(fixture.locomotion.ground_level, 110.0);
        assert!(fixture.pending.is_empty());
    }

    #[test]
    fn test_jump_back_from_turned_back() {
        let mut fixture = Fixture::hanging();
        assert!(fixture.ctx().turn_back());
        fixture.recorder.clear();

        assert!(fixture.ctx().handle_jump());

        assert_eq!(fixture.state, ClimbState::Grounded);
        assert_eq!(fixture.body.mode, MovementMode::Falling);
        // Лицом к стене было −Z: назад от стены = +Z
        assert!((fixture.body.velocity - Vec3::new(0.0, 700.0, 500.0)).length() < 1e-3);
        // Развернулся на 180°: теперь forward = +Z
        let forward = fixture.transform.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::Z).length() < 1e-4);
        assert_eq!(
            fixture.recorder.discrete_notifications(),
            vec![
                AnimationNotification::CanGrab(false),
                AnimationNotification::TurnBack(false),
            ]
        );
    }

    #[test]
    fn test_turn_forward_restores_hanging() {
        let mut fixture = Fixture::hanging();
        assert!(!fixture.ctx().turn_forward());
        assert!(fixture.ctx().turn_back());
        assert!(fixture.ctx().handle_action(ClimbAction::TurnForward));
        assert_eq!(fixture.state, ClimbState::Hanging);
    }

    #[test]
    fn test_corner_turn_disables_input_then_restores() {
        let mut fixture = Fixture::hanging();
        fixture.probes.corner.set(Side::Left, true);

        assert!(!fixture.ctx().turn_corner(Side::Right));
        assert!(fixture.ctx().handle_action(ClimbAction::TurnLeftCorner));
        assert_eq!(fixture.state, ClimbState::TurningCorner(Side::Left));
        assert!(!fixture.input.enabled);
        assert_eq!(
            fixture.recorder.discrete_notifications(),
            vec![AnimationNotification::CornerTurn(Side::Left)]
        );

        // Перенос за ребро закончился раньше повторного grab
        fixture.run_timers(0.6);
        assert_eq!(fixture.state, ClimbState::TurningCorner(Side::Left));
        assert!(fixture.controller.grab.is_none());
        let translation = fixture.transform.translation;
        assert!(
            (translation - Vec3::new(-100.0, 10.0, -78.0)).length() < 1e-2,
            "carried to {:?}",
            translation
        );
        let forward = fixture.transform.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-3, "facing {:?}", forward);

        fixture.run_timers(0.25);
        assert_eq!(fixture.state, ClimbState::Hanging);
        assert!(!fixture.input.enabled, "input ещё отключён до 1.5 сек");

        fixture.run_timers(0.7);
        assert!(fixture.input.enabled);
    }

    #[test]
    fn test_jump_up_with_sideways_axis_does_nothing() {
        let mut fixture = Fixture::hanging();
        fixture.probes.jump_up = true;
        assert!(fixture.probes.can_jump_up());
        fixture.input.axes = Vec2::new(1.0, 0.0);

        assert!(!fixture.ctx().handle_jump());
        assert_eq!(fixture.state, ClimbState::Hanging);
        assert!(fixture.pending.is_empty());
        assert!(fixture.recorder.discrete_notifications().is_empty());

        // Без бокового input тот же прыжок идёт вверх
        fixture.input.axes = Vec2::ZERO;
        assert!(fixture.ctx().handle_jump());
        assert_eq!(fixture.state, ClimbState::JumpingUp);
    }

    #[test]
    fn test_exit_cancels_pending_regrab() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Right, true);
        fixture.input.axes = Vec2::new(1.0, 0.0);
        assert!(fixture.ctx().jump_side(Side::Right));

        assert!(fixture.ctx().exit_climb("test"));
        assert!(fixture.pending.is_empty());

        fixture.run_timers(1.0);
        assert_eq!(fixture.state, ClimbState::Grounded);
    }

    #[test]
    fn test_stale_regrab_is_discarded() {
        let mut fixture = Fixture::facing_ledge();
        let task = {
            fixture.pending.schedule(DeferredAction::GrabLedge, 0.0);
            fixture.pending.advance(TICK)[0]
        };

        assert!(!fixture.ctx().fire_deferred(task));
        assert_eq!(fixture.state, ClimbState::Grounded);
    }

    #[test]
    fn test_grab_without_wall_aborts_climb() {
        let mut fixture = Fixture::hanging();
        fixture.probes.side_jump.set(Side::Right, true);
        fixture.input.axes = Vec2::new(1.0, 0.0);
        assert!(fixture.ctx().jump_side(Side::Right));

        // В точке приземления стены нет
        fixture.probes = ProbeResults::default();
        fixture.run_timers(0.9);

        assert_eq!(fixture.state, ClimbState::Grounded);
        assert_eq!(fixture.body.mode, MovementMode::Walking);
    }

    #[test]
    fn test_slide_only_where_ledge_continues() {
        let mut fixture = Fixture::hanging();
        let start = fixture.transform.translation;

        fixture.input.axes = Vec2::new(1.0, 0.0);
        fixture.ctx().slide(TICK);
        assert_eq!(fixture.motion.moving, None);
        assert_eq!(fixture.transform.translation, start);

        fixture.probes.lateral.set(Side::Right, true);
        fixture.ctx().slide(TICK);
        assert!(fixture.motion.moving_right());
        let step = fixture.transform.translation.x - start.x;
        assert!((step - 20.0 * 17.0 * TICK).abs() < 1e-3);

        fixture.input.axes = Vec2::ZERO;
        fixture.ctx().slide(TICK);
        assert_eq!(fixture.motion.moving, None);
        assert!(!fixture.motion.moving_left());
        assert!(fixture
            .recorder
            .notifications()
            .contains(&AnimationNotification::MoveLeftRight(0.0)));
    }

    #[test]
    fn test_slide_clears_motion_when_not_hanging() {
        let mut fixture = Fixture::facing_ledge();
        fixture.motion.moving = Some(Side::Left);
        fixture.input.axes = Vec2::new(-1.0, 0.0);

        fixture.ctx().slide(TICK);
        assert_eq!(fixture.motion.moving, None);
        assert!(fixture.recorder.notifications().is_empty());
    }

    #[test]
    fn test_ground_jump() {
        let mut fixture = Fixture::facing_ledge();
        fixture.probes = ProbeResults::default();

        assert!(fixture.ctx().handle_action(ClimbAction::Jump));
        assert_eq!(fixture.body.velocity.y, 600.0);
        assert_eq!(fixture.body.mode, MovementMode::Falling);
        assert!(!fixture.ctx().handle_jump(), "в воздухе повторно не прыгаем");
    }

    #[test]
    fn test_random_action_sequences_keep_state_consistent() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let actions = [
            ClimbAction::Jump,
            ClimbAction::ExitClimb,
            ClimbAction::TurnLeftCorner,
            ClimbAction::TurnRightCorner,
            ClimbAction::TurnForward,
        ];

        for _ in 0..200 {
            let mut fixture = Fixture::facing_ledge();

            for _ in 0..40 {
                // Случайные (но согласованные) результаты probes
                let mut probes = fixture.probes.clone();
                for side in Side::BOTH {
                    let lateral = rng.gen_bool(0.5);
                    let jump = !lateral && rng.gen_bool(0.5);
                    let corner = !lateral && !jump && rng.gen_bool(0.5);
                    probes.lateral.set(side, lateral);
                    probes.side_jump.set(side, jump);
                    probes.corner.set(side, corner);
                }
                probes.jump_up = rng.gen_bool(0.3);
                fixture.probes = probes;
                fixture.input.axes = Vec2::new(rng.gen_range(-1..=1) as f32, 0.0);

                match rng.gen_range(0..4) {
                    0 => {
                        fixture.ctx().try_grab_from_probe();
                    }
                    1 => fixture.run_timers(rng.gen_range(0.0..1.0)),
                    _ => {
                        let action = actions[rng.gen_range(0..actions.len())];
                        fixture.ctx().handle_action(action);
                    }
                }

                let state = fixture.state;
                // Grounded: никаких висящих флагов и отложенных действий
                if state == ClimbState::Grounded {
                    assert!(!state.is_hanging());
                    assert!(fixture.pending.is_empty());
                    assert!(fixture.input.enabled);
                }
                // Input отключён только в манёврах, которые его отключают
                if !fixture.input.enabled {
                    assert!(matches!(
                        state,
                        ClimbState::JumpingUp
                            | ClimbState::TurningCorner(_)
                            | ClimbState::Hanging
                    ));
                }
                assert!(!(state.is_jumping() && state.is_turned_back()));
                if fixture.motion.moving.is_some() {
                    assert_eq!(state, ClimbState::Hanging);
                }
            }
        }
    }
}
