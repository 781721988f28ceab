use crate::battery::degradation::DegradationTable;

/// Cumulative SoC swing (percentage points) that makes up one equivalent
/// full cycle: a full discharge plus a full charge.
pub const EFC_SWING_PCT: f64 = 200.0;

/// Smallest usable capacity the state will hold (Ah).
///
/// Capacity is clamped here instead of reaching zero, which would make the
/// SoC update divide by zero.
pub const CAPACITY_FLOOR_AH: f64 = 1e-6;

/// Depth of discharge used to look up the fade rate of a completed EFC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DodPolicy {
    /// Always use a fixed reference DoD (100% reproduces the study's
    /// behaviour, where every EFC is treated as a full-depth cycle).
    Reference { dod_pct: f64 },
    /// Use the mean depth of the monotonic SoC swings that accumulated into
    /// the completed EFC.
    SwingAverage,
}

impl Default for DodPolicy {
    fn default() -> Self {
        Self::Reference { dod_pct: 100.0 }
    }
}

/// What happens once usable capacity hits [`CAPACITY_FLOOR_AH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Keep simulating at the floor capacity; the run is flagged end-of-life.
    #[default]
    Floor,
    /// Stop the run at the hour capacity is exhausted.
    Halt,
}

/// Result of advancing the battery by one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourUpdate {
    /// State of charge after the step (%).
    pub soc_pct: f64,
    /// State of health after the step (% of nominal).
    pub soh_pct: f64,
    /// Usable capacity after the step (Ah).
    pub capacity_ah: f64,
    /// Equivalent full cycles credited during this step.
    pub efc_increment: f64,
    /// Whether a degradation event fired during this step.
    pub degraded: bool,
    /// Whether this step drove capacity down to the floor.
    pub exhausted: bool,
}

/// Tracks monotonic SoC runs for [`DodPolicy::SwingAverage`].
#[derive(Debug, Clone, Default)]
struct SwingTracker {
    direction: f64,
    depth_pct: f64,
    closed_depth_sum_pct: f64,
    closed_count: u32,
}

impl SwingTracker {
    fn record(&mut self, delta_soc_pct: f64) {
        if delta_soc_pct == 0.0 {
            return;
        }
        let direction = delta_soc_pct.signum();
        if self.direction != 0.0 && direction != self.direction && self.depth_pct > 0.0 {
            self.closed_depth_sum_pct += self.depth_pct;
            self.closed_count += 1;
            self.depth_pct = 0.0;
        }
        self.direction = direction;
        self.depth_pct += delta_soc_pct.abs();
    }

    /// Mean depth of the swings closed since the last call.
    ///
    /// The run in progress stays open and is counted at its full depth once it
    /// closes. It only stands in for the average when no swing has closed yet.
    fn take_average(&mut self) -> f64 {
        let sum = self.closed_depth_sum_pct;
        let count = self.closed_count;
        self.closed_depth_sum_pct = 0.0;
        self.closed_count = 0;

        if count > 0 {
            sum / f64::from(count)
        } else if self.depth_pct > 0.0 {
            self.depth_pct
        } else {
            100.0
        }
    }
}

/// Mutable state of a single battery over one simulation run.
///
/// Capacity fade is driven by equivalent full cycles: every hour the absolute
/// SoC change is added to a swing buffer, and each time the buffer reaches
/// [`EFC_SWING_PCT`] the buffer is converted into EFCs and the corresponding
/// fade is subtracted from usable capacity.
///
/// # Sign Convention
/// - Positive current: charging
/// - Negative current: discharging
#[derive(Debug, Clone)]
pub struct BatteryState {
    /// Nameplate capacity of the pack when new (Ah).
    pub nominal_capacity_ah: f64,

    /// Usable capacity at the start of the run (Ah). Fade is expressed as a
    /// fraction of this value.
    pub initial_capacity_ah: f64,

    /// Current usable capacity (Ah).
    pub capacity_ah: f64,

    /// State of health as a percentage of nominal capacity.
    pub soh_pct: f64,

    /// State of charge as a percentage of usable capacity.
    pub soc_pct: f64,

    /// Cumulative equivalent full cycles.
    pub efc_total: f64,

    /// SoC swing not yet converted into EFCs (0..200).
    dod_buffer_pct: f64,

    swing: SwingTracker,

    exhausted: bool,
}

impl BatteryState {
    /// Creates the state of a pack at the start of a run.
    ///
    /// # Arguments
    ///
    /// * `nominal_capacity_ah` - Nameplate capacity (must be > 0)
    /// * `initial_soh_pct` - SoH at the start of the run, in (0, 100]
    /// * `initial_soc_pct` - SoC at the start of the run, in \[0, 100\]
    ///
    /// # Panics
    ///
    /// Panics if any argument is outside its range.
    pub fn new(nominal_capacity_ah: f64, initial_soh_pct: f64, initial_soc_pct: f64) -> Self {
        assert!(nominal_capacity_ah > 0.0, "nominal capacity must be > 0");
        assert!(
            initial_soh_pct > 0.0 && initial_soh_pct <= 100.0,
            "initial SoH must be in (0, 100]"
        );
        assert!(
            (0.0..=100.0).contains(&initial_soc_pct),
            "initial SoC must be in [0, 100]"
        );

        let initial_capacity_ah = initial_soh_pct / 100.0 * nominal_capacity_ah;
        Self {
            nominal_capacity_ah,
            initial_capacity_ah,
            capacity_ah: initial_capacity_ah,
            soh_pct: initial_capacity_ah / nominal_capacity_ah * 100.0,
            soc_pct: initial_soc_pct,
            efc_total: 0.0,
            dod_buffer_pct: 0.0,
            swing: SwingTracker::default(),
            exhausted: false,
        }
    }

    /// SoC swing carried toward the next EFC (percentage points).
    pub fn dod_buffer_pct(&self) -> f64 {
        self.dod_buffer_pct
    }

    /// Whether capacity has been driven down to [`CAPACITY_FLOOR_AH`].
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Advances the state by one step of `dt_hours` at a constant current.
    ///
    /// The SoC change is computed against the capacity at the start of the
    /// step. When the swing buffer reaches [`EFC_SWING_PCT`], the whole buffer
    /// divided by 200 is credited as EFCs (possibly more than one), fade is
    /// applied relative to the initial capacity, and the buffer keeps only the
    /// remainder. SoH is recomputed every step.
    pub fn step(
        &mut self,
        current_a: f64,
        dt_hours: f64,
        table: &DegradationTable,
        policy: DodPolicy,
    ) -> HourUpdate {
        let previous_soc_pct = self.soc_pct;
        let delta_soc_pct = current_a * dt_hours / self.capacity_ah * 100.0;
        let soc_pct = (previous_soc_pct + delta_soc_pct).clamp(0.0, 100.0);

        let applied_delta = soc_pct - previous_soc_pct;
        self.dod_buffer_pct += applied_delta.abs();
        self.swing.record(applied_delta);

        let mut efc_increment = 0.0;
        let degraded = self.dod_buffer_pct >= EFC_SWING_PCT;
        if degraded {
            efc_increment = self.dod_buffer_pct / EFC_SWING_PCT;
            self.efc_total += efc_increment;

            let dod_pct = match policy {
                DodPolicy::Reference { dod_pct } => dod_pct,
                DodPolicy::SwingAverage => self.swing.take_average(),
            };
            let fade_pct_of_initial = table.rate_per_efc(dod_pct) * efc_increment * 100.0;
            let fade_ah = fade_pct_of_initial / 100.0 * self.initial_capacity_ah;
            self.capacity_ah -= fade_ah;

            self.dod_buffer_pct %= EFC_SWING_PCT;
        }

        let mut exhausted = false;
        if self.capacity_ah <= CAPACITY_FLOOR_AH {
            self.capacity_ah = CAPACITY_FLOOR_AH;
            exhausted = !self.exhausted;
            self.exhausted = true;
        }

        self.soc_pct = soc_pct;
        self.soh_pct = self.capacity_ah / self.nominal_capacity_ah * 100.0;

        HourUpdate {
            soc_pct: self.soc_pct,
            soh_pct: self.soh_pct,
            capacity_ah: self.capacity_ah,
            efc_increment,
            degraded,
            exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> DegradationTable {
        DegradationTable::reference()
    }

    #[test]
    fn new_state_derives_capacity_from_soh() {
        let state = BatteryState::new(100.0, 80.0, 100.0);
        assert_relative_eq!(state.initial_capacity_ah, 80.0);
        assert_relative_eq!(state.capacity_ah, 80.0);
        assert_relative_eq!(state.soh_pct, 80.0);
        assert_eq!(state.efc_total, 0.0);
        assert_eq!(state.dod_buffer_pct(), 0.0);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        BatteryState::new(0.0, 80.0, 50.0);
    }

    #[test]
    #[should_panic]
    fn soc_above_full_panics() {
        BatteryState::new(100.0, 80.0, 101.0);
    }

    #[test]
    fn soc_change_uses_current_capacity() {
        let mut state = BatteryState::new(100.0, 80.0, 100.0);
        let update = state.step(-20.0, 1.0, &reference(), DodPolicy::default());
        // 20 Ah out of 80 Ah usable is 25 percentage points.
        assert_relative_eq!(update.soc_pct, 75.0);
        assert_relative_eq!(state.dod_buffer_pct(), 25.0);
        assert!(!update.degraded);
    }

    #[test]
    fn soc_is_clamped_to_bounds() {
        let mut state = BatteryState::new(100.0, 80.0, 10.0);
        let update = state.step(-50.0, 1.0, &reference(), DodPolicy::default());
        assert_eq!(update.soc_pct, 0.0);
        // Only the swing that actually happened counts.
        assert_relative_eq!(state.dod_buffer_pct(), 10.0);

        let update = state.step(500.0, 1.0, &reference(), DodPolicy::default());
        assert_eq!(update.soc_pct, 100.0);
        assert_relative_eq!(state.dod_buffer_pct(), 110.0);
    }

    #[test]
    fn full_cycle_triggers_one_efc() {
        let mut state = BatteryState::new(100.0, 80.0, 100.0);
        state.step(-80.0, 1.0, &reference(), DodPolicy::default());
        let update = state.step(80.0, 1.0, &reference(), DodPolicy::default());

        assert!(update.degraded);
        assert_relative_eq!(update.efc_increment, 1.0);
        assert_relative_eq!(state.efc_total, 1.0);
        assert_eq!(state.dod_buffer_pct(), 0.0);

        // 0.15% per 100 EFC => 0.0015 of the initial 80 Ah per EFC.
        assert_relative_eq!(update.capacity_ah, 80.0 - 0.0015 * 80.0, epsilon = 1e-12);
        assert_relative_eq!(update.soh_pct, (80.0 - 0.12) / 100.0 * 100.0, epsilon = 1e-12);
    }

    #[test]
    fn buffer_keeps_remainder_after_conversion() {
        let mut state = BatteryState::new(100.0, 100.0, 100.0);
        state.step(-100.0, 1.0, &reference(), DodPolicy::default());
        state.step(100.0, 1.0, &reference(), DodPolicy::default());
        assert_relative_eq!(state.efc_total, 1.0);
        assert_eq!(state.dod_buffer_pct(), 0.0);

        let capacity = state.capacity_ah;
        state.step(-50.0, 1.0, &reference(), DodPolicy::default());
        state.step(-40.0, 1.0, &reference(), DodPolicy::default());
        let expected = 50.0 / capacity * 100.0 + 40.0 / capacity * 100.0;
        assert_relative_eq!(state.dod_buffer_pct(), expected, epsilon = 1e-9);
        assert_relative_eq!(state.efc_total, 1.0);
    }

    #[test]
    fn large_swing_credits_more_than_one_efc() {
        let mut state = BatteryState::new(100.0, 100.0, 100.0);
        state.step(-100.0, 1.0, &reference(), DodPolicy::default());
        state.step(99.0, 1.0, &reference(), DodPolicy::default());
        assert_relative_eq!(state.dod_buffer_pct(), 199.0, epsilon = 1e-9);

        // Emptying from 99% adds 99 points: 298 in the buffer.
        let update = state.step(-100.0, 1.0, &reference(), DodPolicy::default());
        assert!(update.degraded);
        assert_relative_eq!(update.efc_increment, 1.49, epsilon = 1e-9);
        assert_relative_eq!(state.dod_buffer_pct(), 98.0, epsilon = 1e-9);
        assert_relative_eq!(
            update.capacity_ah,
            100.0 - 0.0015 * 1.49 * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn zero_current_leaves_state_untouched() {
        let mut state = BatteryState::new(100.0, 80.0, 60.0);
        let soh = state.soh_pct;
        for _ in 0..100 {
            let update = state.step(0.0, 1.0, &reference(), DodPolicy::default());
            assert_eq!(update.soc_pct, 60.0);
            assert_eq!(update.soh_pct, soh);
            assert!(!update.degraded);
        }
        assert_eq!(state.efc_total, 0.0);
    }

    #[test]
    fn swing_average_uses_shallow_rate_for_shallow_cycles() {
        let mut reference_state = BatteryState::new(100.0, 100.0, 100.0);
        let mut swing_state = BatteryState::new(100.0, 100.0, 100.0);

        // Ten 10%-deep half cycles make 200 points of swing.
        for i in 0..20 {
            let current = if i % 2 == 0 { -10.0 } else { 10.0 };
            reference_state.step(current, 1.0, &reference(), DodPolicy::default());
            swing_state.step(current, 1.0, &reference(), DodPolicy::SwingAverage);
        }

        assert_relative_eq!(reference_state.efc_total, 1.0, epsilon = 1e-9);
        assert_relative_eq!(swing_state.efc_total, 1.0, epsilon = 1e-9);

        let reference_fade = 100.0 - reference_state.capacity_ah;
        let swing_fade = 100.0 - swing_state.capacity_ah;
        assert_relative_eq!(reference_fade, 0.0015 * 100.0, epsilon = 1e-9);
        assert_relative_eq!(swing_fade, 0.00015 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn swing_split_by_efc_counts_at_full_depth() {
        let mut tracker = SwingTracker::default();
        let run = |tracker: &mut SwingTracker, step: f64, hours: usize| {
            for _ in 0..hours {
                tracker.record(step);
            }
        };

        // 70-point swings: the first 200 points end 60 points into the third.
        run(&mut tracker, -10.0, 7);
        run(&mut tracker, 10.0, 7);
        run(&mut tracker, -10.0, 6);
        assert_relative_eq!(tracker.take_average(), 70.0);

        // The open run finishes at 70 and is counted in the next window.
        run(&mut tracker, -10.0, 1);
        run(&mut tracker, 10.0, 7);
        run(&mut tracker, -10.0, 7);
        run(&mut tracker, 10.0, 5);
        assert_relative_eq!(tracker.take_average(), 70.0);
    }

    #[test]
    fn open_run_stands_in_before_any_swing_closes() {
        let mut tracker = SwingTracker::default();
        assert_eq!(tracker.take_average(), 100.0);
        tracker.record(-40.0);
        assert_relative_eq!(tracker.take_average(), 40.0);
    }

    #[test]
    fn capacity_is_floored_and_flagged_once() {
        let table = DegradationTable::new(&[(0.0, 0.0), (100.0, 60.0)]).unwrap();
        let mut state = BatteryState::new(10.0, 100.0, 100.0);
        let mut exhausted_events = 0;
        for i in 0..20 {
            let current = if i % 2 == 0 { -1000.0 } else { 1000.0 };
            let update = state.step(current, 1.0, &table, DodPolicy::default());
            assert!(update.capacity_ah >= CAPACITY_FLOOR_AH);
            assert!(update.capacity_ah.is_finite());
            if update.exhausted {
                exhausted_events += 1;
            }
        }
        assert!(state.is_exhausted());
        assert_eq!(exhausted_events, 1);
    }
}
