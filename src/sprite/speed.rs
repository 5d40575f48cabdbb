use crate::config::SpeedConfig;
use std::collections::VecDeque;

/// Milliseconds-per-frame driven by how fast the player is clicking.
///
/// Keeps the click timestamps of the trailing window. Every click recomputes
/// `max(min, base - clicks_per_second * reduction)` and pushes the decay
/// deadline one window into the future; once [`ClickRate::poll`] sees that
/// deadline pass with no new click, the window is emptied and the speed
/// returns to base. Timestamps come from the caller so the whole thing runs
/// on a virtual clock in tests.
#[derive(Debug, Clone)]
pub struct ClickRate {
    config: SpeedConfig,
    clicks: VecDeque<f64>,
    speed: f64,
    decay_at: Option<f64>,
}

impl ClickRate {
    pub fn new(config: SpeedConfig) -> Self {
        ClickRate {
            config,
            clicks: VecDeque::new(),
            speed: config.base_ms,
            decay_at: None,
        }
    }

    pub fn config(&self) -> &SpeedConfig {
        &self.config
    }

    /// Current milliseconds per frame
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn clicks_in_window(&self) -> usize {
        self.clicks.len()
    }

    pub fn clicks_per_second(&self) -> f64 {
        self.clicks.len() as f64 / (self.config.window_ms / 1000.0)
    }

    pub fn record(&mut self, now: f64) -> f64 {
        self.clicks.push_back(now);
        self.prune(now);
        self.speed = self
            .config
            .clamp(self.config.base_ms - self.clicks_per_second() * self.config.reduction_ms);
        self.decay_at = Some(now + self.config.window_ms);
        self.speed
    }

    /// Fires the decay timer if it is due. Returns true when the speed was reset.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.decay_at {
            Some(deadline) if now >= deadline => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Override the speed, clamped to `[min, base]`; the decay timer still applies
    pub fn set_speed(&mut self, speed_ms: f64) {
        self.speed = self.config.clamp(speed_ms);
    }

    pub fn reset(&mut self) {
        self.clicks.clear();
        self.speed = self.config.base_ms;
        self.decay_at = None;
    }

    fn prune(&mut self, now: f64) {
        let oldest = now - self.config.window_ms;
        while self.clicks.front().map_or(false, |time| *time < oldest) {
            self.clicks.pop_front();
        }
    }
}

impl Default for ClickRate {
    fn default() -> Self {
        ClickRate::new(SpeedConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn clicks(rate: &mut ClickRate, count: usize, span_ms: f64) {
        for i in 0..count {
            rate.record(i as f64 * span_ms / count as f64);
        }
    }

    #[test]
    fn starts_at_base() {
        let rate = ClickRate::default();
        assert_relative_eq!(rate.speed(), 70.0);
    }

    #[test]
    fn ten_clicks_in_a_second() {
        let mut rate = ClickRate::default();
        clicks(&mut rate, 10, 1000.0);

        let config = SpeedConfig::default();
        let expected = (config.base_ms - 10.0 / 1.5 * config.reduction_ms).max(config.min_ms);
        assert_relative_eq!(rate.speed(), expected);

        // 1.5s of silence after the last click
        assert!(!rate.poll(900.0 + 1_499.0));
        assert!(rate.poll(900.0 + 1_500.0));
        assert_relative_eq!(rate.speed(), config.base_ms);
        assert_eq!(rate.clicks_in_window(), 0);
    }

    #[test]
    fn one_second_window_matches_clicks_per_second_directly() {
        let config = SpeedConfig {
            window_ms: 1000.0,
            ..SpeedConfig::default()
        };
        let mut rate = ClickRate::new(config);
        clicks(&mut rate, 10, 1000.0);

        assert_relative_eq!(
            rate.speed(),
            (config.base_ms - 10.0 * config.reduction_ms).max(config.min_ms)
        );
    }

    #[test]
    fn speed_is_non_increasing_in_click_rate_and_floored() {
        let config = SpeedConfig::default();
        let mut previous = config.base_ms;
        for count in 1..60 {
            let mut rate = ClickRate::new(config);
            clicks(&mut rate, count, 1000.0);
            assert!(rate.speed() <= previous);
            assert!(rate.speed() >= config.min_ms);
            previous = rate.speed();
        }
        assert_relative_eq!(previous, config.min_ms);
    }

    #[test]
    fn old_clicks_fall_out_of_the_window() {
        let mut rate = ClickRate::default();
        rate.record(0.0);
        rate.record(100.0);
        rate.record(2_000.0);

        assert_eq!(rate.clicks_in_window(), 1);
    }

    #[test]
    fn each_click_pushes_the_decay_deadline() {
        let mut rate = ClickRate::default();
        rate.record(0.0);
        rate.record(1_000.0);

        assert!(!rate.poll(1_600.0));
        assert!(rate.poll(2_500.0));
    }

    #[test]
    fn set_speed_is_clamped() {
        let mut rate = ClickRate::default();
        rate.set_speed(1.0);
        assert_relative_eq!(rate.speed(), rate.config().min_ms);
        rate.set_speed(1_000.0);
        assert_relative_eq!(rate.speed(), rate.config().base_ms);
    }
}
