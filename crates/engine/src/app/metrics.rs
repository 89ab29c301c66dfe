#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub objects_per_frame: f32,
    pub destroyed: u32,
}

/// Per-interval counters, timed on the host's runtime clock.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start_ms: Option<f64>,
    interval_ms: f64,
    frames: u32,
    object_updates: u32,
    destroyed: u32,
    frame_time_sum_ms: f64,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval_ms: f64) -> Self {
        Self {
            interval_start_ms: None,
            interval_ms,
            frames: 0,
            object_updates: 0,
            destroyed: 0,
            frame_time_sum_ms: 0.0,
        }
    }

    pub(crate) fn record_frame(
        &mut self,
        frame_time_ms: f32,
        object_updates: usize,
        destroyed: usize,
    ) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum_ms += f64::from(frame_time_ms);
        self.object_updates = self
            .object_updates
            .saturating_add(u32::try_from(object_updates).unwrap_or(u32::MAX));
        self.destroyed = self
            .destroyed
            .saturating_add(u32::try_from(destroyed).unwrap_or(u32::MAX));
    }

    /// The first call only starts the interval.
    pub(crate) fn maybe_snapshot(&mut self, now_ms: f64) -> Option<LoopMetricsSnapshot> {
        let Some(start) = self.interval_start_ms else {
            self.interval_start_ms = Some(now_ms);
            return None;
        };
        let elapsed_ms = now_ms - start;
        if elapsed_ms.is_nan() || elapsed_ms < self.interval_ms {
            return None;
        }

        let elapsed_seconds = (elapsed_ms / 1000.0).max(f64::EPSILON);
        let (frame_time_ms, objects_per_frame) = if self.frames == 0 {
            (0.0, 0.0)
        } else {
            let frames = f64::from(self.frames);
            (
                self.frame_time_sum_ms / frames,
                f64::from(self.object_updates) / frames,
            )
        };

        let snapshot = LoopMetricsSnapshot {
            fps: (f64::from(self.frames) / elapsed_seconds) as f32,
            frame_time_ms: frame_time_ms as f32,
            objects_per_frame: objects_per_frame as f32,
            destroyed: self.destroyed,
        };

        self.interval_start_ms = Some(now_ms);
        self.frames = 0;
        self.object_updates = 0;
        self.destroyed = 0;
        self.frame_time_sum_ms = 0.0;

        Some(snapshot)
    }
}
