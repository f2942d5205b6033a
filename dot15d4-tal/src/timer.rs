//! Timer service used by the TAL.
//!
//! The platform owns the hardware timer. When a started timer expires, the
//! platform calls [`Tal::on_timer`](crate::Tal::on_timer) with its
//! [`TimerId`].

use crate::time::{Duration, Instant};

/// Timers the TAL starts.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimerId {
    /// Backoff of the software CSMA-CA.
    CsmaBackoff,
    /// Start of the CCAs of slotted CSMA-CA, at an absolute time.
    CcaTimer,
    /// Slotted CSMA-CA waiting for a beacon that does not come.
    BeaconLoss,
    /// Periodic filter tuning and PLL calibration.
    Calibration,
}

impl TimerId {
    pub const ALL: [TimerId; 4] = [
        TimerId::CsmaBackoff,
        TimerId::CcaTimer,
        TimerId::BeaconLoss,
        TimerId::Calibration,
    ];
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Timeout {
    /// Expire after the given duration.
    Relative(Duration),
    /// Expire at the given time. Drift does not accumulate when a sequence of
    /// timeouts is computed from one reference.
    Absolute(Instant),
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimerError {
    /// The timeout is zero or an absolute time that has already passed.
    InvalidTimeout,
    /// The timer is already running.
    AlreadyRunning,
}

pub trait Timer {
    /// Current time of the free running microsecond clock. The clock wraps
    /// at 2^32 µs.
    fn now(&self) -> Instant;

    /// Start timer `id`.
    fn start(&mut self, id: TimerId, timeout: Timeout) -> Result<(), TimerError>;

    /// Stop timer `id`. Stopping a timer that is not running is a no-op.
    fn stop(&mut self, id: TimerId);

    /// Returns `true` while timer `id` is running.
    fn is_running(&self, id: TimerId) -> bool;
}

#[cfg(test)]
pub mod test {
    use std::vec::Vec;

    use super::*;

    /// A timer whose clock only moves when told to.
    #[derive(Debug, Default)]
    pub struct MockTimer {
        pub now: u32,
        /// Running timers and their expiry.
        pub running: Vec<(TimerId, Instant)>,
        /// Every successful start, in order.
        pub started: Vec<(TimerId, Timeout)>,
        pub stopped: Vec<TimerId>,
    }

    impl MockTimer {
        pub fn at(now: u32) -> Self {
            Self {
                now,
                ..Default::default()
            }
        }

        pub fn expiry(&self, id: TimerId) -> Option<Instant> {
            self.running
                .iter()
                .find(|(running, _)| *running == id)
                .map(|(_, at)| *at)
        }

        pub fn advance(&mut self, us: u32) {
            self.now = self.now.wrapping_add(us);
        }

        /// Move the clock to the expiry of `id` and mark it expired.
        pub fn expire(&mut self, id: TimerId) -> bool {
            match self.expiry(id) {
                Some(at) => {
                    self.now = at.as_us();
                    self.running.retain(|(running, _)| *running != id);
                    true
                }
                None => false,
            }
        }
    }

    impl Timer for MockTimer {
        fn now(&self) -> Instant {
            Instant::from_us(self.now)
        }

        fn start(&mut self, id: TimerId, timeout: Timeout) -> Result<(), TimerError> {
            if self.is_running(id) {
                return Err(TimerError::AlreadyRunning);
            }

            let now = self.now();
            let at = match timeout {
                Timeout::Relative(duration) if duration.as_us() == 0 => {
                    return Err(TimerError::InvalidTimeout)
                }
                Timeout::Relative(duration) => now + duration,
                Timeout::Absolute(at) if !at.is_after(now) => {
                    return Err(TimerError::InvalidTimeout)
                }
                Timeout::Absolute(at) => at,
            };

            self.running.push((id, at));
            self.started.push((id, timeout));
            Ok(())
        }

        fn stop(&mut self, id: TimerId) {
            self.running.retain(|(running, _)| *running != id);
            self.stopped.push(id);
        }

        fn is_running(&self, id: TimerId) -> bool {
            self.running.iter().any(|(running, _)| *running == id)
        }
    }

    #[test]
    fn absolute_in_the_past_is_invalid() {
        let mut timer = MockTimer::at(1_000);
        assert_eq!(
            timer.start(TimerId::CcaTimer, Timeout::Absolute(Instant::from_us(500))),
            Err(TimerError::InvalidTimeout)
        );
        assert!(timer
            .start(TimerId::CcaTimer, Timeout::Absolute(Instant::from_us(1_500)))
            .is_ok());
        assert_eq!(
            timer.start(TimerId::CcaTimer, Timeout::Relative(Duration::from_us(10))),
            Err(TimerError::AlreadyRunning)
        );
        assert!(timer.expire(TimerId::CcaTimer));
        assert_eq!(timer.now, 1_500);
        assert!(!timer.is_running(TimerId::CcaTimer));
    }

    #[test]
    fn relative_across_wrap() {
        let mut timer = MockTimer::at(u32::MAX - 10);
        timer
            .start(TimerId::BeaconLoss, Timeout::Relative(Duration::from_us(100)))
            .unwrap();
        assert_eq!(timer.expiry(TimerId::BeaconLoss), Some(Instant::from_us(89)));
        assert!(timer.expiry(TimerId::BeaconLoss).unwrap().is_after(timer.now()));
    }
}
