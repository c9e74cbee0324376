//! Climb tuning (probe геометрия, тайминги манёвров, скорости)
//!
//! Единицы: world units (1 unit ≈ 1 см, capsule персонажа 42 × 96).
//! Defaults совпадают с исходным тюнингом контроллера; overrides грузятся из TOML:
//!
//! ```toml
//! grab_duration = 0.2
//! side_jump_grab_delay = 1.0
//!
//! [lateral_marker]
//! forward = 40.0
//! right = 80.0
//! up = 40.0
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Side;
use crate::shared::collision::PROBE_CHANNEL_CLIMBABLE;

/// Точка в локальных осях персонажа (forward / right / up)
///
/// Используется для probe markers (аналог дочерних arrow-компонентов на capsule).
/// Bevy конвенция: forward = -Z, right = +X, up = +Y.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct LocalOffset {
    pub forward: f32,
    pub right: f32,
    pub up: f32,
}

impl LocalOffset {
    pub const fn new(forward: f32, right: f32, up: f32) -> Self {
        Self { forward, right, up }
    }

    /// Зеркалит offset на нужную сторону (markers описаны для правой стороны)
    pub fn for_side(&self, side: Side) -> Self {
        Self {
            forward: self.forward,
            right: self.right.abs() * side.sign(),
            up: self.up,
        }
    }

    /// Локальный offset → world position
    pub fn to_world(&self, location: Vec3, rotation: Quat) -> Vec3 {
        location + rotation * Vec3::new(self.right, self.up, -self.forward)
    }
}

/// Параметры climb системы
#[derive(Resource, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct ClimbConfig {
    /// Collision канал, в который смотрят все probes
    pub probe_channel: u32,

    // === Forward probe ===
    pub forward_probe_radius: f32,
    pub forward_probe_distance: f32,

    // === Height probe ===
    pub height_probe_radius: f32,
    /// Сдвиг вертикальной линии вперёд от актора
    pub height_probe_forward: f32,
    /// Старт sweep'а над актором
    pub height_probe_rise: f32,
    /// Длина sweep'а вниз
    pub height_probe_depth: f32,
    /// Допустимый gap (pelvis − ledge), включительно
    pub ledge_reach_min: f32,
    pub ledge_reach_max: f32,
    /// Высота pelvis socket относительно центра capsule
    pub pelvis_offset: f32,

    // === Lateral / side jump / corner / jump up markers ===
    pub lateral_marker: LocalOffset,
    pub lateral_probe_radius: f32,
    pub lateral_probe_half_height: f32,

    pub side_jump_marker: LocalOffset,
    pub side_jump_probe_radius: f32,
    pub side_jump_probe_half_height: f32,

    pub corner_probe_radius: f32,
    /// Подъём старта corner sweep'а над lateral marker
    pub corner_probe_rise: f32,
    pub corner_probe_distance: f32,

    pub jump_up_marker: LocalOffset,
    pub jump_up_probe_radius: f32,
    pub jump_up_probe_half_height: f32,

    // === Grab maneuver ===
    /// Отступ от стены вдоль нормали
    pub grab_wall_offset: f32,
    /// Насколько capsule висит ниже уступа
    pub grab_height_drop: f32,
    pub grab_duration: f32,
    /// Пауза после отпускания уступа, пока повторный grab запрещён
    pub regrab_cooldown: f32,

    // === Lateral sliding ===
    pub slide_step: f32,
    pub slide_interp_speed: f32,

    // === Side jump ===
    pub side_jump_grab_delay: f32,
    /// Скорость перелёта к соседнему уступу (0 = перелёт целиком на root motion анимации)
    pub side_jump_travel_speed: f32,

    // === Corner turn ===
    pub corner_grab_delay: f32,
    pub corner_input_delay: f32,
    /// Перенос capsule за внешний угол (оси до поворота, описан для правой стороны)
    pub corner_travel: LocalOffset,
    /// Длительность переноса; должна быть меньше `corner_grab_delay`
    pub corner_travel_duration: f32,

    // === Jump back ===
    /// Вдоль forward оси (отрицательное: назад от стены)
    pub jump_back_forward_velocity: f32,
    pub jump_back_vertical_velocity: f32,

    // === Fallback таймауты для animation-driven завершений ===
    pub jump_up_timeout: Option<f32>,
    pub climb_up_timeout: Option<f32>,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            probe_channel: PROBE_CHANNEL_CLIMBABLE,

            forward_probe_radius: 20.0,
            forward_probe_distance: 150.0,

            height_probe_radius: 20.0,
            height_probe_forward: 70.0,
            height_probe_rise: 500.0,
            height_probe_depth: 500.0,
            ledge_reach_min: -50.0,
            ledge_reach_max: 0.0,
            pelvis_offset: 0.0,

            lateral_marker: LocalOffset::new(40.0, 70.0, 40.0),
            lateral_probe_radius: 20.0,
            lateral_probe_half_height: 60.0,

            side_jump_marker: LocalOffset::new(50.0, 150.0, 40.0),
            side_jump_probe_radius: 25.0,
            side_jump_probe_half_height: 60.0,

            corner_probe_radius: 20.0,
            corner_probe_rise: 60.0,
            corner_probe_distance: 70.0,

            jump_up_marker: LocalOffset::new(65.0, 0.0, 290.0),
            jump_up_probe_radius: 20.0,
            jump_up_probe_half_height: 100.0,

            grab_wall_offset: 22.0,
            grab_height_drop: 120.0,
            grab_duration: 0.13,
            regrab_cooldown: 0.5,

            slide_step: 20.0,
            slide_interp_speed: 17.0,

            side_jump_grab_delay: 0.8,
            side_jump_travel_speed: 187.5, // 150 units за 0.8 сек

            corner_grab_delay: 0.8,
            corner_input_delay: 1.5,
            corner_travel: LocalOffset::new(60.0, 100.0, 0.0),
            corner_travel_duration: 0.5,

            jump_back_forward_velocity: -500.0,
            jump_back_vertical_velocity: 700.0,

            jump_up_timeout: Some(1.0),
            climb_up_timeout: Some(1.2),
        }
    }
}

impl ClimbConfig {
    /// Парсит TOML overrides (отсутствующие поля берутся из Default)
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Попадает ли gap (pelvis − ledge) в окно захвата
    pub fn ledge_in_reach(&self, gap: f32) -> bool {
        gap >= self.ledge_reach_min && gap <= self.ledge_reach_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let config = ClimbConfig::default();
        assert_eq!(config.forward_probe_distance, 150.0);
        assert_eq!(config.grab_wall_offset, 22.0);
        assert_eq!(config.grab_height_drop, 120.0);
        assert_eq!(config.grab_duration, 0.13);
        assert_eq!(config.side_jump_grab_delay, 0.8);
        assert_eq!(config.corner_input_delay, 1.5);
        assert_eq!(config.slide_interp_speed, 17.0);
    }

    #[test]
    fn test_ledge_reach_is_inclusive() {
        let config = ClimbConfig::default();
        assert!(config.ledge_in_reach(-50.0));
        assert!(config.ledge_in_reach(0.0));
        assert!(config.ledge_in_reach(-25.0));
        assert!(!config.ledge_in_reach(0.5));
        assert!(!config.ledge_in_reach(-50.5));
    }

    #[test]
    fn test_toml_overrides_keep_defaults() {
        let config = ClimbConfig::from_toml_str(
            r#"
            grab_duration = 0.2
            jump_up_timeout = 2.5

            [lateral_marker]
            forward = 40.0
            right = 80.0
            up = 40.0
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.grab_duration, 0.2);
        assert_eq!(config.jump_up_timeout, Some(2.5));
        assert_eq!(config.lateral_marker.right, 80.0);
        // Не указанные поля: defaults
        assert_eq!(config.side_jump_grab_delay, 0.8);
    }

    #[test]
    fn test_toml_type_error_is_reported() {
        assert!(ClimbConfig::from_toml_str("grab_duration = \"slow\"").is_err());
    }

    #[test]
    fn test_local_offset_mirrors_and_rotates() {
        let marker = LocalOffset::new(40.0, 70.0, 40.0);
        let left = marker.for_side(Side::Left);
        assert_eq!(left.right, -70.0);

        // Identity rotation: forward = -Z, right = +X
        let world = marker.to_world(Vec3::ZERO, Quat::IDENTITY);
        assert!((world - Vec3::new(70.0, 40.0, -40.0)).length() < 1e-4);

        // Поворот на 180° вокруг Y: forward смотрит в +Z
        let turned = marker.to_world(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::PI));
        assert!((turned - Vec3::new(-70.0, 40.0, 40.0)).length() < 1e-3);
    }
}
