//! Shared domain: cross-cutting константы
//!
//! Содержит:
//! - Collision layers / masks (climbable канал для probes)

pub mod collision;

pub use collision::*;
