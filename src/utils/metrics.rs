//! Stage timing

use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock timer for a named stage
#[derive(Debug)]
pub struct Timer {
    name: String,
    start: Instant,
    checkpoints: Vec<(String, Duration)>,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        info!(stage = %name, "Starting");
        Self {
            name,
            start: Instant::now(),
            checkpoints: Vec::new(),
        }
    }

    /// Record the elapsed time under `name`
    pub fn checkpoint(&mut self, name: impl Into<String>) {
        self.checkpoints.push((name.into(), self.start.elapsed()));
    }

    pub fn checkpoints(&self) -> &[(String, Duration)] {
        &self.checkpoints
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop and log the total along with the time spent between checkpoints
    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        let mut prev = Duration::ZERO;
        for (name, at) in &self.checkpoints {
            info!(
                stage = %self.name,
                step = %name,
                "{:.3}s (+{:.3}s)",
                at.as_secs_f64(),
                (*at - prev).as_secs_f64()
            );
            prev = *at;
        }
        info!(stage = %self.name, "Completed in {:.3}s", elapsed.as_secs_f64());
        elapsed
    }
}
