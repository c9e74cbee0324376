//! Movement компоненты: режим движения, скорость, kinematic tuning, grab интерполяция

use bevy::prelude::*;

/// Режим движения персонажа
///
/// - Walking: на земле, input + трение
/// - Falling: в воздухе, gravity + air control
/// - Flying: без gravity, позицией управляет climb (интерполяции, перелёты)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum MovementMode {
    #[default]
    Walking,
    Falling,
    Flying,
}

/// Kinematic тело: скорость + режим движения
///
/// Velocity интегрируем сами (Rapier только для коллизий/запросов).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct KinematicBody {
    pub velocity: Vec3,
    pub mode: MovementMode,
}

impl KinematicBody {
    /// Мгновенная остановка (StopMovementImmediately)
    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Добавить импульс скорости (launch): тело переходит в падение
    pub fn launch(&mut self, velocity: Vec3) {
        self.velocity += velocity;
        self.mode = MovementMode::Falling;
    }

    pub fn is_idle(&self) -> bool {
        self.velocity == Vec3::ZERO
    }
}

/// Kinematic контроллер (тюнинг локомоции)
///
/// Units: ≈ см, секунды.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct KinematicController {
    /// Скорость ходьбы (units/s)
    pub walk_speed: f32,
    /// Начальная вертикальная скорость прыжка
    pub jump_velocity: f32,
    /// Гравитация (units/s²)
    pub gravity: f32,
    /// Доля горизонтального контроля в воздухе
    pub air_control: f32,
    /// Скорость разворота по направлению движения (градусы/сек)
    pub rotation_rate: f32,
    /// Радиус capsule
    pub capsule_radius: f32,
    /// Половина высоты capsule (включая полусферы)
    pub capsule_half_height: f32,
    /// Высота пола (плоскость)
    pub ground_level: f32,
    /// На земле ли персонаж
    pub grounded: bool,
}

impl Default for KinematicController {
    fn default() -> Self {
        Self {
            walk_speed: 600.0,
            jump_velocity: 600.0,
            gravity: -980.0,
            air_control: 0.2,
            rotation_rate: 540.0,
            capsule_radius: 42.0,
            capsule_half_height: 96.0,
            ground_level: 0.0,
            grounded: false,
        }
    }
}

impl KinematicController {
    /// Высота центра capsule, стоящей на полу
    pub fn standing_height(&self) -> f32 {
        self.ground_level + self.capsule_half_height
    }
}

/// Активная grab интерполяция (перенос capsule к позе на стене)
///
/// Линейная интерполяция позиции + slerp поворота за `duration`.
/// Хранится в `ClimbController::grab`; по завершении сбрасывается, скорость обнуляется.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct GrabMove {
    pub from_translation: Vec3,
    pub from_rotation: Quat,
    pub to_translation: Vec3,
    pub to_rotation: Quat,
    pub duration: f32,
    pub elapsed: f32,
    /// Token манёвра (для логов и отмены)
    pub token: u8,
}

impl GrabMove {
    /// Продвигает интерполяцию, возвращает true когда манёвр завершён
    pub fn advance(&mut self, delta: f32, transform: &mut Transform) -> bool {
        self.elapsed += delta;

        let alpha = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };

        transform.translation = self.from_translation.lerp(self.to_translation, alpha);
        transform.rotation = self.from_rotation.slerp(self.to_rotation, alpha);

        alpha >= 1.0
    }
}
