use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Identity and start time of the daemon process.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRecord {
    pid: u32,
    started_at: SystemTime,
    started: Instant,
}

impl ProcessRecord {
    /// Captures the current process id and time.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            pid: std::process::id(),
            started_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    /// Operating-system process id.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Wall-clock start time.
    #[must_use]
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Start time as fractional seconds since the Unix epoch.
    #[must_use]
    pub fn started_unix_seconds(&self) -> f64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }

    /// Time elapsed since the start, measured on the monotonic clock.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
