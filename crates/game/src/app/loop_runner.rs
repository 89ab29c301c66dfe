use std::process::ExitCode;

use engine::app::run_frames;
use tracing::info;

use super::bootstrap::{AppWiring, FRAME_STEP_MS};
use super::demo;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        mut engine,
        mut host,
        demo: state,
        frames,
    } = app;

    let summary = run_frames(&mut engine, &mut host, frames, FRAME_STEP_MS, |frame, _, host| {
        demo::autopilot(frame, host)
    });

    let enemies_left = engine.game_objects_of(state.enemy).len();
    info!(
        screen = ?engine.current_screen_name(),
        screen_switches = summary.screen_switches,
        enemies_left,
        cave_cleared = state.cave_cleared.get(),
        metrics = ?engine.last_metrics(),
        "demo_finished"
    );
    ExitCode::SUCCESS
}
