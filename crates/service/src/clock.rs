use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Wall-clock timestamps that never go backwards.
///
/// The UNIX time is sampled once at construction; later readings add the
/// monotonic time elapsed since then, so a system clock step does not
/// reorder timestamps.
#[derive(Debug, Clone)]
pub struct Clock {
    anchor_unix_secs: f64,
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let anchor_unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            anchor_unix_secs,
            origin: Instant::now(),
        }
    }

    pub fn unix_timestamp(&self) -> f64 {
        self.anchor_unix_secs + self.origin.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timestamps_are_non_decreasing() {
        let clock = Clock::new();
        let mut previous = clock.unix_timestamp();
        for _ in 0..1000 {
            let now = clock.unix_timestamp();
            assert!(now >= previous, "{now} < {previous}");
            previous = now;
        }
    }

    #[test]
    fn timestamp_tracks_elapsed_time() {
        let clock = Clock::new();
        let before = clock.unix_timestamp();
        std::thread::sleep(Duration::from_millis(20));
        assert!(clock.unix_timestamp() - before >= 0.02);
    }

    #[test]
    fn timestamp_is_close_to_system_time() {
        let clock = Clock::new();
        let system = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        assert!((clock.unix_timestamp() - system).abs() < 1.0);
    }
}
