use std::time::Duration;

/// Stand-in progress clock for players that cannot report timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticClock {
    elapsed: Duration,
    nominal: Duration,
}

impl SyntheticClock {
    pub fn new(nominal: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            nominal,
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Move the clock forward; returns true once the nominal duration is reached.
    pub fn advance(&mut self, step: Duration) -> bool {
        self.elapsed = (self.elapsed + step).min(self.nominal);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.nominal
    }

    pub fn position_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn duration_secs(&self) -> f64 {
        self.nominal.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finishes_at_nominal_duration() {
        let mut clock = SyntheticClock::new(Duration::from_millis(300));
        assert!(!clock.advance(Duration::from_millis(100)));
        assert!(!clock.advance(Duration::from_millis(100)));
        assert!(clock.advance(Duration::from_millis(150)));
        assert_eq!(clock.position_secs(), 0.3);

        clock.reset();
        assert_eq!(clock.position_secs(), 0.0);
        assert!(!clock.is_finished());
    }
}
