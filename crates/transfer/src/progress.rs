use std::time::{Duration, SystemTime};

/// Wall-clock duration of one transfer.
///
/// Uses [`SystemTime`] rather than `Instant` so a resumed download can
/// take its start time from the resume marker on disk.
#[derive(Debug, Clone, Default)]
pub struct TransferClock {
    started_at: Option<SystemTime>,
    frozen: Option<Duration>,
}

impl TransferClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing now, discarding any previous measurement.
    pub fn start(&mut self) {
        self.start_at(SystemTime::now());
    }

    /// Starts timing from an earlier point, e.g. a persisted timestamp.
    pub fn start_at(&mut self, started_at: SystemTime) {
        self.started_at = Some(started_at);
        self.frozen = None;
    }

    /// Freezes the elapsed time and returns it.
    pub fn stop(&mut self) -> Duration {
        let elapsed = self.elapsed();
        self.frozen = Some(elapsed);
        elapsed
    }

    /// Clears the clock back to "never started".
    pub fn reset(&mut self) {
        self.started_at = None;
        self.frozen = None;
    }

    /// Time since start, the frozen value once stopped, or zero if never
    /// started. A start time in the future also reads as zero.
    pub fn elapsed(&self) -> Duration {
        if let Some(frozen) = self.frozen {
            return frozen;
        }
        match self.started_at {
            Some(t) => SystemTime::now()
                .duration_since(t)
                .unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.frozen.is_none()
    }
}
