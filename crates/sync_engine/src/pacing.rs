//! Backlog-driven pacing of synchronization attempts.

use std::time::Duration;

use contracts::PacingConfig;

/// Where a backlog sits relative to the watermarks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogZone {
    /// Above the high watermark: consumer falling behind
    Above,
    /// Between the watermarks (inclusive): hold
    Within,
    /// Below the low watermark: sources idle
    Below,
}

/// Multiplicative pacing controller
///
/// Shrinks the delay by `decay_factor` while the backlog is above the high
/// watermark, grows it by `recovery_factor` while below the low watermark
/// and leaves it alone in between. The delay always stays within
/// `[min_delay_ms, max_delay_ms]`.
#[derive(Debug, Clone)]
pub struct PacingController {
    config: PacingConfig,
    floor_ms: f64,
    ceiling_ms: f64,
    delay_ms: f64,
}

impl PacingController {
    pub fn new(config: PacingConfig) -> Self {
        let floor_ms = config.min_delay_ms.max(0.0);
        let ceiling_ms = config.max_delay_ms.max(floor_ms);
        let delay_ms = bound(config.initial_delay_ms, floor_ms, ceiling_ms);
        Self {
            config,
            floor_ms,
            ceiling_ms,
            delay_ms,
        }
    }

    /// Classify a backlog against the watermarks
    pub fn zone(&self, backlog: usize) -> BacklogZone {
        if backlog > self.config.high_watermark {
            BacklogZone::Above
        } else if backlog < self.config.low_watermark {
            BacklogZone::Below
        } else {
            BacklogZone::Within
        }
    }

    /// Feed the current backlog and get the delay before the next attempt
    pub fn update(&mut self, backlog: usize) -> Duration {
        match self.zone(backlog) {
            BacklogZone::Above => {
                self.delay_ms = bound(
                    self.delay_ms * self.config.decay_factor,
                    self.floor_ms,
                    self.ceiling_ms,
                );
            }
            BacklogZone::Below => {
                self.delay_ms = bound(
                    self.delay_ms * self.config.recovery_factor,
                    self.floor_ms,
                    self.ceiling_ms,
                );
            }
            BacklogZone::Within => {}
        }
        self.current_delay()
    }

    /// Delay as of the last update
    ///
    /// Saturates at `Duration::MAX` for ceilings too large to represent.
    pub fn current_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_ms / 1000.0).unwrap_or(Duration::MAX)
    }

    /// Delay in milliseconds
    pub fn current_delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Back to the (bounded) initial delay
    pub fn reset(&mut self) {
        self.delay_ms = bound(self.config.initial_delay_ms, self.floor_ms, self.ceiling_ms);
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }
}

/// Clamp that tolerates NaN (maps it to the floor)
fn bound(value: f64, floor: f64, ceiling: f64) -> f64 {
    value.max(floor).min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PacingController {
        PacingController::new(PacingConfig::default())
    }

    #[test]
    fn test_initial_delay() {
        let pacing = controller();
        assert_eq!(pacing.current_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_high_backlog_decreases_to_floor() {
        let mut pacing = controller();
        let mut previous = pacing.current_delay();

        for _ in 0..200 {
            let delay = pacing.update(1500);
            assert!(delay <= previous);
            assert!(pacing.current_delay_ms() >= 1.0);
            previous = delay;
        }
        assert!((pacing.current_delay_ms() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_decay_step() {
        let mut pacing = controller();
        pacing.update(1001);
        assert!((pacing.current_delay_ms() - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_low_backlog_increases_to_ceiling() {
        let mut pacing = controller();
        let mut previous = pacing.current_delay();

        for _ in 0..200 {
            let delay = pacing.update(0);
            assert!(delay >= previous);
            assert!(pacing.current_delay_ms() <= 50.0);
            previous = delay;
        }
        assert!((pacing.current_delay_ms() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_hysteresis_band_holds() {
        let mut pacing = controller();
        pacing.update(5000);
        let held = pacing.current_delay_ms();

        for backlog in [300, 500, 999, 1000] {
            pacing.update(backlog);
            assert_eq!(pacing.current_delay_ms(), held, "backlog {backlog}");
        }
    }

    #[test]
    fn test_zone_boundaries() {
        let pacing = controller();
        assert_eq!(pacing.zone(1001), BacklogZone::Above);
        assert_eq!(pacing.zone(1000), BacklogZone::Within);
        assert_eq!(pacing.zone(300), BacklogZone::Within);
        assert_eq!(pacing.zone(299), BacklogZone::Below);
    }

    #[test]
    fn test_unit_recovery_factor_never_grows() {
        let mut pacing = PacingController::new(PacingConfig {
            recovery_factor: 1.0,
            ..Default::default()
        });
        pacing.update(2000);
        let after_decay = pacing.current_delay_ms();
        for _ in 0..10 {
            pacing.update(0);
        }
        assert_eq!(pacing.current_delay_ms(), after_decay);
    }

    #[test]
    fn test_huge_ceiling_saturates() {
        let mut pacing = PacingController::new(PacingConfig {
            initial_delay_ms: 1e300,
            max_delay_ms: 1e300,
            ..Default::default()
        });
        assert_eq!(pacing.update(500), Duration::MAX);
        assert_eq!(pacing.update(0), Duration::MAX);
    }

    #[test]
    fn test_negative_factors_stay_within_bounds() {
        let mut pacing = PacingController::new(PacingConfig {
            decay_factor: -0.5,
            recovery_factor: -2.0,
            ..Default::default()
        });

        let delay = pacing.update(0);
        assert_eq!(pacing.current_delay_ms(), 1.0);
        assert_eq!(delay, Duration::from_millis(1));

        pacing.update(5000);
        assert_eq!(pacing.current_delay_ms(), 1.0);
    }

    #[test]
    fn test_nan_factor_falls_to_floor() {
        let mut pacing = PacingController::new(PacingConfig {
            recovery_factor: f64::NAN,
            ..Default::default()
        });
        assert_eq!(pacing.update(0), Duration::from_millis(1));
    }

    #[test]
    fn test_initial_delay_clamped_and_reset() {
        let mut pacing = PacingController::new(PacingConfig {
            initial_delay_ms: 500.0,
            ..Default::default()
        });
        assert_eq!(pacing.current_delay_ms(), 50.0);

        pacing.update(5000);
        assert!(pacing.current_delay_ms() < 50.0);
        pacing.reset();
        assert_eq!(pacing.current_delay_ms(), 50.0);
    }
}
