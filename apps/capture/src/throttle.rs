use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between prediction requests.
///
/// Frames that arrive inside the interval are simply not sent; nothing is
/// queued, so the next request always carries the newest frame.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    pub fn ready(&self, now: Instant) -> bool {
        self.last_sent
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval)
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_always_ready() {
        let throttle = Throttle::new(Duration::from_millis(250));
        assert!(throttle.ready(Instant::now()));
    }

    #[test]
    fn frames_inside_the_interval_wait() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(250));
        throttle.mark(start);

        assert!(!throttle.ready(start + Duration::from_millis(100)));
        assert!(!throttle.ready(start + Duration::from_millis(249)));
        assert!(throttle.ready(start + Duration::from_millis(250)));
        assert!(throttle.ready(start + Duration::from_secs(3)));
    }

    #[test]
    fn clock_skew_does_not_panic() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut throttle = Throttle::new(Duration::from_millis(10));
        throttle.mark(start);
        assert!(!throttle.ready(start - Duration::from_millis(500)));
    }
}
