//! Headless симуляция LEDGECLIMB
//!
//! Персонаж идёт к стене, прыгает, хватается за уступ, скользит вправо,
//! разворачивается спиной и отпрыгивает. Все смены climb состояния печатаются.
//!
//! Использование: `ledgeclimb_simulation [config.toml]`

use bevy::prelude::*;
use ledgeclimb_simulation::{
    create_headless_app, log_error, log_info, spawn_headless_climber, ClimbAction,
    ClimbActionEvent, ClimbConfig, ClimbInput, ClimbSet, ClimbState, ClimbStateChanged, Climber,
    SyntheticWorld,
};

/// Кадры скрипта: (tick, действие)
enum ScriptStep {
    Axes(Vec2),
    Action(ClimbAction),
}

const SCRIPT: &[(u32, ScriptStep)] = &[
    (10, ScriptStep::Axes(Vec2::new(0.0, 1.0))),
    (25, ScriptStep::Axes(Vec2::ZERO)),
    (50, ScriptStep::Action(ClimbAction::Jump)),
    (120, ScriptStep::Axes(Vec2::new(1.0, 0.0))),
    (240, ScriptStep::Axes(Vec2::ZERO)),
    (260, ScriptStep::Action(ClimbAction::ExitClimb)),
    (300, ScriptStep::Action(ClimbAction::Jump)),
];

const TICK_COUNT: u32 = 480;

fn load_config() -> ClimbConfig {
    let Some(path) = std::env::args().nth(1) else {
        return ClimbConfig::default();
    };

    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            log_error(&format!("Cannot read config {}: {} (using defaults)", path, err));
            return ClimbConfig::default();
        }
    };

    match ClimbConfig::from_toml_str(&source) {
        Ok(config) => {
            log_info(&format!("Loaded climb config from {}", path));
            config
        }
        Err(err) => {
            log_error(&format!("Invalid config {}: {} (using defaults)", path, err));
            ClimbConfig::default()
        }
    }
}

/// Печать смены climb состояния
fn print_state_changes(mut changes: EventReader<ClimbStateChanged>) {
    for change in changes.read() {
        println!("  {:?}: {:?} → {:?}", change.entity, change.from, change.to);
    }
}

fn main() {
    println!("Starting LEDGECLIMB headless simulation");

    // Стена с уступом на высоте 250 в 60 units перед стартом
    let world = SyntheticWorld::new()
        .with_floor(0.0)
        .with_ledge_wall((-300.0, 300.0), 250.0, -60.0, 200.0);

    let mut app = create_headless_app(world);
    app.insert_resource(load_config());
    app.add_systems(FixedUpdate, print_state_changes.after(ClimbSet::Movement));

    // Synthetic backend: Rapier компоненты не нужны
    let character = spawn_headless_climber(app.world_mut(), Vec3::new(0.0, 96.0, 150.0));

    for tick in 0..TICK_COUNT {
        for (at, step) in SCRIPT.iter().filter(|(at, _)| *at == tick) {
            match step {
                ScriptStep::Axes(axes) => {
                    if let Some(mut input) = app.world_mut().get_mut::<ClimbInput>(character) {
                        input.axes = *axes;
                    }
                }
                ScriptStep::Action(action) => {
                    app.world_mut().send_event(ClimbActionEvent {
                        entity: character,
                        action: *action,
                    });
                }
            }
            println!("Tick {}: {:?}", at, step_name(step));
        }

        app.update();

        if tick % 60 == 0 {
            let mut query = app
                .world_mut()
                .query_filtered::<(&Transform, &ClimbState), With<Climber>>();
            for (transform, state) in query.iter(app.world()) {
                println!("Tick {}: {:?} at {:?}", tick, state, transform.translation);
            }
        }
    }

    println!("Simulation complete!");
}

fn step_name(step: &ScriptStep) -> String {
    match step {
        ScriptStep::Axes(axes) => format!("axes {:?}", axes),
        ScriptStep::Action(action) => format!("action {:?}", action),
    }
}
