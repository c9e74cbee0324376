//! ECS Components для climbing персонажа
//!
//! Организация по доменам:
//! - climb: climb FSM и результаты probes (Climber, ClimbState, ProbeResults, LateralMotion, ClimbInput)
//! - movement: kinematic движение (KinematicBody, KinematicController, GrabMove)

pub mod climb;
pub mod movement;

// Re-exports для удобного импорта
pub use climb::*;
pub use movement::*;
