//! Drawing designs end to end against a simulated controller.

mod common;

use std::{fs, path::Path, time::Duration};

use common::SimulatedController;
use scribe::{
    device::DeviceLink,
    error::DrawingError,
    geometry::Planner,
    sequencer::{PenSettings, Plotter},
    Design, PlotError, PlotterConfig,
};

const SQUARE_AND_TICK: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
    <path d="M 10 10 L 60 10 L 60 60 L 10 60 Z" stroke="black" fill="none"/>
    <path d="M 70 80 L 80 90 L 95 65" stroke="black" fill="none"/>
</svg>"#;

fn config_in(dir: &Path) -> PlotterConfig {
    PlotterConfig {
        pen: PenSettings {
            settle_ms: 0,
            ..PenSettings::default()
        },
        poll_interval_ms: 0,
        checkpoint: dir.join("progress.txt"),
        ..PlotterConfig::default()
    }
}

fn load_design(dir: &Path, svg: &str) -> Design {
    let path = dir.join("design.svg");
    fs::write(&path, svg).unwrap();
    Design::load(&path).unwrap()
}

#[test]
fn plan_and_draw() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let design = load_design(dir.path(), SQUARE_AND_TICK);
    assert_eq!(design.name(), "design");

    let instructions = scribe::plan(&design, &config).unwrap();
    let lifts = instructions
        .iter()
        .filter(|instruction| !instruction.pen_down_after)
        .count();
    assert_eq!(lifts, 2, "pen lifts once after each stroke");
    assert!(!instructions.last().unwrap().pen_down_after);

    let frame = &config.canvas;
    for instruction in &instructions {
        assert!(instruction.x_cm >= frame.padding().left - 1e-6);
        assert!(instruction.x_cm <= frame.width() - frame.padding().right + 1e-6);
        assert!(instruction.y_cm >= frame.padding().bottom - 1e-6);
        assert!(instruction.y_cm <= frame.height() - frame.padding().top + 1e-6);
    }
    for pair in instructions.windows(2) {
        if pair[0].pen_down_after {
            let gap = (pair[1].x_cm - pair[0].x_cm).hypot(pair[1].y_cm - pair[0].y_cm);
            assert!(gap <= config.max_cm_between_points + 1e-9, "drawn gap of {gap}cm");
        }
    }

    let controller = SimulatedController::new(2);
    let link = DeviceLink::new(controller.clone(), config.serial.max_read_attempts);
    let summary = scribe::draw(
        &instructions,
        link,
        config.actuators().unwrap(),
        &config,
        0,
    )
    .unwrap();
    assert_eq!(summary.drawn, instructions.len());
    assert_eq!(summary.skipped, 0);

    let state = controller.state.borrow();
    assert_eq!(state.commands[0], "s0=500", "pen is lifted before moving");
    assert_eq!(state.commands_for('t').len(), instructions.len() * 2);
    assert_eq!(
        state.commands_for('i').len(),
        instructions.len() * 3,
        "each move is polled until finished"
    );
    assert_eq!(
        state.commands_for('s'),
        ["s0=500", "s0=666", "s0=500", "s0=666", "s0=500"],
        "pen goes down and up once per stroke"
    );

    let last = instructions.last().unwrap();
    assert_eq!(state.steppers[&0], last.left_motor_steps);
    assert_eq!(
        state.steppers[&1], -last.right_motor_steps,
        "right motor is mounted backwards"
    );
    assert!(!config.checkpoint.exists(), "finished jobs leave no checkpoint");
}

#[test]
fn resume_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let design = load_design(dir.path(), SQUARE_AND_TICK);
    let instructions = scribe::plan(&design, &config).unwrap();

    fs::write(&config.checkpoint, "5").unwrap();
    let start_from = scribe::resume_point(&config).unwrap();
    assert_eq!(start_from, 5);

    let controller = SimulatedController::new(0);
    let link = DeviceLink::new(controller.clone(), 5);
    let summary = scribe::draw(
        &instructions,
        link,
        config.actuators().unwrap(),
        &config,
        start_from,
    )
    .unwrap();
    assert_eq!(summary.skipped, 5);
    assert_eq!(summary.drawn, instructions.len() - 5);

    let state = controller.state.borrow();
    let left_targets = state.commands_for('t').into_iter().step_by(2).collect::<Vec<_>>();
    assert_eq!(left_targets.len(), instructions.len() - 5);
    assert_eq!(
        left_targets[0],
        format!("t0={}", instructions[5].left_motor_steps),
        "the first move drawn is instruction 5"
    );
    assert_eq!(scribe::resume_point(&config).unwrap(), 0);
}

#[test]
fn unusable_designs_are_rejected_before_drawing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    assert!(matches!(
        Design::load(&dir.path().join("missing.svg")),
        Err(PlotError::DesignUnreadable { .. })
    ));

    let flat = load_design(
        dir.path(),
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
            <path d="M 10 50 L 90 50" stroke="black" fill="none"/>
        </svg>"#,
    );
    assert!(matches!(
        scribe::plan(&flat, &config),
        Err(PlotError::Drawing(DrawingError::Degenerate { .. }))
    ));

    let empty = load_design(
        dir.path(),
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"></svg>"#,
    );
    assert!(matches!(
        scribe::plan(&empty, &config),
        Err(PlotError::Drawing(DrawingError::Empty))
    ));
}

#[test]
fn short_stroke_gets_one_midpoint() {
    let config = PlotterConfig::default();
    let planner = Planner::new(config.canvas, config.rig, 1.5).unwrap();
    let instructions =
        planner.instructions(&[vec![(10.0, 10.0).into(), (10.0, 12.0).into()]]);

    let points: Vec<(f64, f64)> = instructions
        .iter()
        .map(|instruction| (instruction.x_cm, instruction.y_cm))
        .collect();
    assert_eq!(points, [(10.0, 10.0), (10.0, 11.0), (10.0, 12.0)]);
    let pen: Vec<bool> = instructions
        .iter()
        .map(|instruction| instruction.pen_down_after)
        .collect();
    assert_eq!(pen, [true, true, false]);

    let controller = SimulatedController::new(1);
    let mut plotter = Plotter::new(
        DeviceLink::new(controller.clone(), 5),
        config.actuators().unwrap(),
        PenSettings {
            settle_ms: 0,
            ..PenSettings::default()
        },
        Duration::ZERO,
    );
    plotter.run(&instructions, 0).unwrap();
    assert!(!plotter.pen_down());
    assert_eq!(
        plotter.link().observations().value(config.left_stepper.id()),
        Some(instructions[2].left_motor_steps as f64)
    );
}
