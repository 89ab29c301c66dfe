use serde::Deserialize;
use tracing::{debug, info};

use super::engine::Engine;
use super::host::{HeadlessHost, Host};
use super::screen::DEFAULT_MUSIC_VOLUME;

/// Which collection the per-frame update pass walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectScope {
    /// One collection shared by every screen. Screens keep their background,
    /// music and tilemap but no objects of their own.
    Global,
    /// Each screen owns its objects; only the current screen's are updated.
    #[default]
    PerScreen,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub object_scope: ObjectScope,
    pub max_frame_delta_ms: Option<f32>,
    pub metrics_log_interval_ms: f64,
    pub default_music_volume: u8,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            object_scope: ObjectScope::PerScreen,
            max_frame_delta_ms: None,
            metrics_log_interval_ms: 1000.0,
            default_music_volume: DEFAULT_MUSIC_VOLUME,
            screen_width: 160,
            screen_height: 120,
        }
    }
}

/// Turns host runtime timestamps into frame deltas.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    frame_time_ms: f32,
    max_delta_ms: Option<f32>,
}

impl FrameClock {
    pub fn new(max_delta_ms: Option<f32>) -> Self {
        Self {
            last_ms: None,
            frame_time_ms: 0.0,
            max_delta_ms: normalize_max_delta(max_delta_ms),
        }
    }

    /// Records `now_ms` and returns the time since the previous tick. The
    /// first tick, backwards clocks and non-finite values all yield 0.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let delta = match self.last_ms {
            Some(last) => (now_ms - last) as f32,
            None => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        let delta = if delta.is_finite() && delta > 0.0 {
            delta
        } else {
            0.0
        };
        self.frame_time_ms = match self.max_delta_ms {
            Some(max) => delta.min(max),
            None => delta,
        };
        self.frame_time_ms
    }

    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }
}

fn normalize_max_delta(value: Option<f32>) -> Option<f32> {
    value.filter(|max| max.is_finite() && *max > 0.0)
}

/// What one call to [`Engine::update_frame`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub frame_time_ms: f32,
    pub objects_updated: usize,
    pub spawned: usize,
    pub destroyed: usize,
    pub dialog_open: bool,
    pub switched_screen: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u32,
    pub objects_updated: usize,
    pub destroyed: usize,
    pub screen_switches: u32,
}

/// Drives `engine` on a headless host for `frames` frames of `step_ms` each.
/// `before_frame` runs ahead of every frame, for scripted input.
pub fn run_frames(
    engine: &mut Engine,
    host: &mut HeadlessHost,
    frames: u32,
    step_ms: f64,
    mut before_frame: impl FnMut(u32, &mut Engine, &mut HeadlessHost),
) -> RunSummary {
    info!(
        frames,
        step_ms,
        scope = ?engine.config().object_scope,
        "run_started"
    );
    let mut summary = RunSummary::default();
    for frame in 0..frames {
        before_frame(frame, engine, host);
        let report = engine.update_frame(host);
        summary.frames += 1;
        summary.objects_updated += report.objects_updated;
        summary.destroyed += report.destroyed;
        if report.switched_screen {
            summary.screen_switches += 1;
            debug!(frame, screen = ?engine.current_screen_name(), "frame_switched_screen");
        }
        host.advance(step_ms);
    }
    info!(
        frames = summary.frames,
        objects_updated = summary.objects_updated,
        destroyed = summary.destroyed,
        screen_switches = summary.screen_switches,
        runtime_ms = host.runtime_ms(),
        "run_finished"
    );
    summary
}
