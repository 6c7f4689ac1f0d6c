use log::{debug, log_enabled, Level};
use std::time::{Duration, Instant};

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if millis < 1_000 {
        format!("{millis} ms")
    } else if secs < 60 {
        format!("{secs}.{:03} s", duration.subsec_millis())
    } else {
        format!("{}:{:02}.{:03} min", secs / 60, secs % 60, duration.subsec_millis())
    }
}

/// Logs the duration of consecutive pipeline steps at debug level.
pub struct StepMeasure {
    enabled: bool,
    step: Option<String>,
    start: Instant,
    total: Instant,
}

impl StepMeasure {
    pub fn new(step: &str) -> Self {
        let now = Instant::now();
        Self {
            enabled: log_enabled!(Level::Debug),
            step: Some(step.to_string()),
            start: now,
            total: now,
        }
    }

    fn log_step(&self) {
        if let Some(step) = &self.step {
            debug!("{step} took {}", format_duration(self.start.elapsed()));
        }
    }

    pub fn tick(&mut self, step: &str) {
        if self.enabled {
            self.log_step();
            self.step = Some(step.to_string());
            self.start = Instant::now();
        }
    }

    pub fn stop(&mut self) {
        if self.enabled && self.step.is_some() {
            self.log_step();
            debug!("all steps took {}", format_duration(self.total.elapsed()));
            self.step = None;
        }
    }
}

impl Drop for StepMeasure {
    fn drop(&mut self) {
        self.stop();
    }
}
