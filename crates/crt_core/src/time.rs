use std::time::{Duration, Instant};

const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// Variable-timestep frame clock. Each frame advances by however much wall
/// time passed since the previous frame.
pub struct FrameClock {
    pub real_dt: Duration,
    pub total_time: Duration,
    pub frame_count: u64,
    last_instant: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            real_dt: Duration::ZERO,
            total_time: Duration::ZERO,
            frame_count: 0,
            last_instant: Instant::now(),
        }
    }

    pub fn begin_frame(&mut self) -> Duration {
        let now = Instant::now();
        self.real_dt = now.duration_since(self.last_instant);
        self.last_instant = now;
        self.total_time += self.real_dt;
        self.frame_count += 1;
        self.real_dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts drawn frames and publishes the count once per second of
/// accumulated update time.
#[derive(Debug, Clone, Default)]
pub struct FrameRateCounter {
    frame_rate: u32,
    frame_counter: u32,
    elapsed: Duration,
}

impl FrameRateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;

        if self.elapsed > PUBLISH_INTERVAL {
            self.elapsed -= PUBLISH_INTERVAL;
            self.frame_rate = self.frame_counter;
            self.frame_counter = 0;
        }
    }

    pub fn record_draw(&mut self) {
        self.frame_counter += 1;
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Milliseconds per frame, or 1 before the first publication.
    pub fn ms_per_frame(&self) -> f32 {
        if self.frame_rate == 0 {
            1.0
        } else {
            1000.0 / self.frame_rate as f32
        }
    }

    pub fn fps_label(&self) -> String {
        format!("fps: {}", self.frame_rate)
    }

    pub fn spf_label(&self) -> String {
        format!("spf: {:.4}", self.ms_per_frame())
    }
}
