use crate::battery::profile::HOURS_PER_DAY;

/// Position of one simulated hour within the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourStamp {
    /// Hour index from the start of the run.
    pub index: usize,
    /// Day index from the start of the run.
    pub day: usize,
}

/// An hourly simulation clock over a fixed horizon.
///
/// # Examples
///
/// ```
/// use slb_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(30);
/// let mut days = Vec::new();
///
/// clock.run(|stamp| days.push(stamp.day));
/// assert_eq!(days.len(), 30);
/// assert_eq!(days[25], 1);
/// ```
pub struct Clock {
    /// Next hour to hand out.
    current: usize,
    /// Total hours in the horizon.
    total: usize,
}

impl Clock {
    /// Number of evenly spaced progress checkpoints over the horizon.
    pub const CHECKPOINTS: usize = 10;

    /// Creates a clock over `total` hours.
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Total hours in the horizon.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Hands out the next hour, or `None` once the horizon is exhausted.
    pub fn tick(&mut self) -> Option<HourStamp> {
        if self.current < self.total {
            let index = self.current;
            self.current += 1;
            Some(HourStamp {
                index,
                day: index / HOURS_PER_DAY,
            })
        } else {
            None
        }
    }

    /// Whether `index` closes one of the [`Clock::CHECKPOINTS`] tenths of the
    /// horizon.
    pub fn is_checkpoint(&self, index: usize) -> bool {
        let interval = (self.total / Self::CHECKPOINTS).max(1);
        index > 0 && index % interval == 0
    }

    /// Calls `f` for every remaining hour.
    pub fn run(&mut self, mut f: impl FnMut(HourStamp)) {
        while let Some(stamp) = self.tick() {
            f(stamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_index_and_day() {
        let mut clock = Clock::new(26);
        let stamps: Vec<HourStamp> = std::iter::from_fn(|| clock.tick()).collect();
        assert_eq!(stamps.len(), 26);
        assert_eq!(
            stamps[25],
            HourStamp {
                index: 25,
                day: 1
            }
        );
    }

    #[test]
    fn empty_clock_never_runs() {
        let mut clock = Clock::new(0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn checkpoints_every_tenth_of_a_year() {
        let clock = Clock::new(8760);
        assert!(!clock.is_checkpoint(0));
        assert!(clock.is_checkpoint(876));
        assert!(clock.is_checkpoint(8760 - 876));
        assert!(!clock.is_checkpoint(877));
    }

    #[test]
    fn short_horizons_checkpoint_every_hour() {
        let clock = Clock::new(5);
        assert!((1..5).all(|h| clock.is_checkpoint(h)));
    }
}
