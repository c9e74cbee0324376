//! Climb компоненты: ClimbState (FSM), ProbeResults, LateralMotion, ClimbInput

use bevy::prelude::*;

use crate::animation::ClimbAnimator;
use crate::climb::PendingActions;
use crate::components::movement::{GrabMove, KinematicBody, KinematicController};

/// Marker: персонаж, который умеет лазать по уступам
///
/// Все climb компоненты добавляются через Required Components,
/// animation port по умолчанию: no-op (`ClimbAnimator::default()`).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(
    Transform,
    ClimbState,
    ProbeResults,
    LateralMotion,
    ClimbInput,
    ClimbController,
    PendingActions,
    KinematicBody,
    KinematicController,
    ClimbAnimator
)]
pub struct Climber;

/// Сторона относительно персонажа (lateral движение, прыжки, углы)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// -1 для Left, +1 для Right (знак lateral оси)
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    /// Сторона по lateral оси (0 → None)
    pub fn from_axis(axis: f32) -> Option<Side> {
        if axis > 0.0 {
            Some(Side::Right)
        } else if axis < 0.0 {
            Some(Side::Left)
        } else {
            None
        }
    }
}

/// Пара значений left/right
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct Sided<T> {
    pub left: T,
    pub right: T,
}

impl<T: Copy> Sided<T> {
    pub fn get(&self, side: Side) -> T {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, value: T) {
        match side {
            Side::Left => self.left = value,
            Side::Right => self.right = value,
        }
    }
}

/// Climb FSM состояния
///
/// Один enum вместо набора независимых флагов (hanging / climbing / jumping / turned back):
/// недопустимые комбинации (например прыжок в сторону лицом от стены) непредставимы.
/// Старые флаги доступны через `is_*` accessors.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum ClimbState {
    /// На земле / в воздухе, обычная локомоция
    #[default]
    Grounded,
    /// Висит на уступе лицом к стене
    Hanging,
    /// Висит на уступе, развернулся спиной к стене
    TurnedBack,
    /// Залезает на уступ (ждём завершения анимации)
    ClimbingUp,
    /// Перелёт на соседний уступ
    JumpingSide(Side),
    /// Прыжок к уступу сверху
    JumpingUp,
    /// Скриптовый поворот за угол
    TurningCorner(Side),
}

/// Переходы FSM (ключи таблицы переходов)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimbTransition {
    Grab,
    ClimbUp,
    FinishClimbUp,
    Exit,
    JumpSide(Side),
    JumpUp,
    TurnCorner(Side),
    TurnBack,
    TurnForward,
    JumpBack,
    /// Завершение прыжка / поворота за угол повторным захватом
    Reattach,
}

impl ClimbState {
    /// Таблица переходов: куда ведёт `transition` из текущего состояния
    ///
    /// `None`: переход из этого состояния запрещён.
    pub fn target(self, transition: ClimbTransition) -> Option<ClimbState> {
        use ClimbState::*;
        use ClimbTransition as T;

        match (self, transition) {
            (Grounded, T::Grab) => Some(Hanging),
            (Hanging, T::ClimbUp) => Some(ClimbingUp),
            (ClimbingUp, T::FinishClimbUp) => Some(Grounded),
            (state, T::Exit) if state.is_hanging() => Some(Grounded),
            (Hanging, T::JumpSide(side)) => Some(JumpingSide(side)),
            (Hanging, T::JumpUp) => Some(JumpingUp),
            (Hanging, T::TurnCorner(side)) => Some(TurningCorner(side)),
            (Hanging, T::TurnBack) => Some(TurnedBack),
            (TurnedBack, T::TurnForward) => Some(Hanging),
            (Hanging | TurnedBack, T::JumpBack) => Some(Grounded),
            (JumpingSide(_) | JumpingUp | TurningCorner(_), T::Reattach) => Some(Hanging),
            _ => None,
        }
    }

    pub fn allows(self, transition: ClimbTransition) -> bool {
        self.target(transition).is_some()
    }

    /// Персонаж прикреплён к стене (включая прыжки между уступами и поворот за угол)
    pub fn is_hanging(self) -> bool {
        matches!(
            self,
            ClimbState::Hanging
                | ClimbState::TurnedBack
                | ClimbState::JumpingSide(_)
                | ClimbState::JumpingUp
                | ClimbState::TurningCorner(_)
        )
    }

    pub fn is_climbing_ledge(self) -> bool {
        self == ClimbState::ClimbingUp
    }

    pub fn is_jumping(self) -> bool {
        matches!(self, ClimbState::JumpingSide(_) | ClimbState::JumpingUp)
    }

    pub fn is_turned_back(self) -> bool {
        self == ClimbState::TurnedBack
    }

    /// Любое climb состояние кроме Grounded
    pub fn is_climbing(self) -> bool {
        self != ClimbState::Grounded
    }
}

/// Контакт со стеной от forward probe
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct WallContact {
    /// Центр probe sphere в момент касания
    pub location: Vec3,
    /// Нормаль поверхности стены (наружу)
    pub normal: Vec3,
}

/// Результаты climb probes за текущий tick
///
/// Перезаписываются каждый tick. "Нет попадания" = данные невалидны (`None` / `false`),
/// устаревшая стена из прошлых тиков никогда не переиспользуется.
///
/// Инварианты (обеспечиваются порядком probes):
/// - `side_jump[s]` ⇒ `!lateral[s]`
/// - `corner[s]` ⇒ `!lateral[s] && !side_jump[s]`
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ProbeResults {
    /// Forward probe
    pub wall: Option<WallContact>,
    /// Height probe: точка касания уступа
    pub ledge: Option<Vec3>,
    /// pelvis.y − ledge.y
    pub ledge_gap: Option<f32>,
    /// gap в окне захвата
    pub ledge_in_reach: bool,
    /// canMoveLeft / canMoveRight
    pub lateral: Sided<bool>,
    /// canJumpLeft / canJumpRight
    pub side_jump: Sided<bool>,
    /// canTurnLeft / canTurnRight
    pub corner: Sided<bool>,
    /// canJumpUp
    pub jump_up: bool,
}

impl ProbeResults {
    pub fn can_move(&self, side: Side) -> bool {
        self.lateral.get(side)
    }

    pub fn can_jump(&self, side: Side) -> bool {
        self.side_jump.get(side)
    }

    pub fn can_turn(&self, side: Side) -> bool {
        self.corner.get(side)
    }

    pub fn can_jump_up(&self) -> bool {
        self.jump_up
    }

    /// Сбрасывает всё, что считается только пока персонаж висит
    pub fn clear_hanging_probes(&mut self) {
        self.lateral = Sided::default();
        self.side_jump = Sided::default();
        self.corner = Sided::default();
    }
}

/// Lateral движение вдоль уступа (movingLeft / movingRight)
///
/// `Some(side)` только пока в этом tick шла интерполяция вдоль уступа.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct LateralMotion {
    pub moving: Option<Side>,
}

impl LateralMotion {
    pub fn moving_left(&self) -> bool {
        self.moving == Some(Side::Left)
    }

    pub fn moving_right(&self) -> bool {
        self.moving == Some(Side::Right)
    }
}

/// Непрерывный input персонажа (сэмплируется раз в tick)
///
/// - `axes.x`: left/right strafe (-1..1)
/// - `axes.y`: forward/back (-1..1)
///
/// `enabled == false`: input отключён манёвром (угол, прыжок вверх):
/// оси читаются как ноль, discrete actions отбрасываются.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ClimbInput {
    pub axes: Vec2,
    pub enabled: bool,
}

impl Default for ClimbInput {
    fn default() -> Self {
        Self {
            axes: Vec2::ZERO,
            enabled: true,
        }
    }
}

impl ClimbInput {
    /// Lateral ось с учётом отключённого input
    pub fn right_axis(&self) -> f32 {
        if self.enabled {
            self.axes.x
        } else {
            0.0
        }
    }

    pub fn forward_axis(&self) -> f32 {
        if self.enabled {
            self.axes.y
        } else {
            0.0
        }
    }
}

/// Служебное состояние climb контроллера
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ClimbController {
    /// Сколько ещё секунд запрещён повторный grab после отпускания уступа
    pub regrab_cooldown: f32,
    /// Активная grab интерполяция (одна на персонажа, новая заменяет старую)
    pub grab: Option<GrabMove>,
    /// Верх уступа, на который персонаж залезает (ставится в `ClimbingUp`)
    pub climb_up_target: Option<Vec3>,
}

impl ClimbController {
    pub fn can_grab(&self) -> bool {
        self.regrab_cooldown <= 0.0
    }

    pub fn tick(&mut self, delta: f32) {
        self.regrab_cooldown = (self.regrab_cooldown - delta).max(0.0);
    }
}
