//! Rate limiting for debounces and held-input repeats.
use std::time::Duration;

/// Rate limiter on a caller-supplied clock.
///
/// [`Cooldown::try_fire`] succeeds when at least `period` elapsed since the
/// last successful fire. Rejected attempts don't restart the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    period: Duration,
    last: Option<Duration>,
}
impl Cooldown {
    pub const fn new(period: Duration) -> Self {
        Cooldown { period, last: None }
    }

    pub fn is_ready(&self, now: Duration) -> bool {
        match self.last {
            None => true,
            // A clock going backward (new navigator origin) re-arms.
            Some(last) => now < last || now - last >= self.period,
        }
    }

    pub fn try_fire(&mut self, now: Duration) -> bool {
        let ready = self.is_ready(now);
        if ready {
            self.last = Some(now);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn rejected_attempts_do_not_extend() {
        let mut cooldown = Cooldown::new(ms(75));
        assert!(cooldown.try_fire(ms(1000)));
        assert!(!cooldown.try_fire(ms(1050)));
        assert!(!cooldown.try_fire(ms(1074)));
        assert!(cooldown.try_fire(ms(1075)));
    }

    #[test]
    fn reset_rearms() {
        let mut cooldown = Cooldown::new(ms(150));
        assert!(cooldown.try_fire(ms(10)));
        cooldown.reset();
        assert!(cooldown.try_fire(ms(20)));
    }
}
