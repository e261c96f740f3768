use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const SECONDS_PER_DAY: u32 = 86_400;
pub const MIDNIGHT: u32 = 0;

/// Second of day for a whole hour (`24` maps back to midnight).
pub const fn hour_to_second(hour: u32) -> u32 {
    (hour * SECONDS_PER_HOUR) % SECONDS_PER_DAY
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick
// ─────────────────────────────────────────────────────────────────────────────

/// The logical instant handed to every component during one advance.
///
/// `step` is the width of the window the tick covers: a target second is
/// considered reached when it falls in `(second - step, second]`, wrapping
/// around midnight. With a one-second step this is plain equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTick {
    pub day: u32,
    pub second: u32,
    pub step: u32,
}

impl ClockTick {
    /// A one-second tick at the given instant.
    pub const fn at(day: u32, second: u32) -> Self {
        ClockTick {
            day,
            second: second % SECONDS_PER_DAY,
            step: 1,
        }
    }

    /// Whether `target` (seconds of day, `86400` meaning midnight) falls
    /// inside the window covered by this tick.
    pub fn hits(&self, target: u32) -> bool {
        let target = target % SECONDS_PER_DAY;
        let elapsed = (self.second + SECONDS_PER_DAY - target) % SECONDS_PER_DAY;
        elapsed < self.step
    }

    pub fn is_day_start(&self) -> bool {
        self.hits(MIDNIGHT)
    }

    /// Last tick of the day: the next advance crosses midnight.
    pub fn is_day_end(&self) -> bool {
        self.second + self.step >= SECONDS_PER_DAY
    }

    pub fn hour(&self) -> u32 {
        self.second / SECONDS_PER_HOUR
    }

    pub fn minute(&self) -> u32 {
        (self.second % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Day counter plus second-of-day counter, advanced by a fixed step.
///
/// A fresh clock sits one step before midnight of day 0, so the first
/// advance lands exactly on 00:00 of day 1 and the firing pass of the
/// first day is not skipped.
#[derive(Clone, Debug)]
pub struct Clock {
    day: u32,
    second: u32,
    step: u32,
    ticks: u64,
}

impl Clock {
    pub fn new(step: u32) -> Result<Self, ConfigError> {
        if step == 0 || SECONDS_PER_HOUR % step != 0 {
            return Err(ConfigError::ClockStep(step));
        }
        Ok(Clock {
            day: 0,
            second: SECONDS_PER_DAY - step,
            step,
            ticks: 0,
        })
    }

    pub fn advance(&mut self) -> ClockTick {
        self.second += self.step;
        if self.second >= SECONDS_PER_DAY {
            self.second -= SECONDS_PER_DAY;
            self.day += 1;
        }
        self.ticks += 1;
        self.current()
    }

    pub fn current(&self) -> ClockTick {
        ClockTick {
            day: self.day,
            second: self.second,
            step: self.step,
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn ticks_per_day(&self) -> u64 {
        u64::from(SECONDS_PER_DAY / self.step)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notification order
// ─────────────────────────────────────────────────────────────────────────────

/// Handlers the scheduler invokes on every advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPhase {
    /// Every business compares employee positions at opening time.
    BusinessDelays,
    /// Employment office firing pass (only at its instant).
    Firing,
    /// Employment office hiring pass followed by payroll (only at its instant).
    HiringAndPayroll,
    /// Every resident evaluates its transition.
    Persons,
}

/// Fixed notification order. Businesses and the office run before any
/// resident so a person fired this tick is already unemployed when it
/// evaluates its departure.
pub const TICK_ORDER: [TickPhase; 4] = [
    TickPhase::BusinessDelays,
    TickPhase::Firing,
    TickPhase::HiringAndPayroll,
    TickPhase::Persons,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_advance_lands_on_midnight_of_day_one() {
        let mut clock = Clock::new(60).unwrap();
        let tick = clock.advance();
        assert_eq!(tick.day, 1);
        assert_eq!(tick.second, 0);
        assert!(tick.is_day_start());
    }

    #[test]
    fn clock_wraps_at_24h() {
        let mut clock = Clock::new(3_600).unwrap();
        for _ in 0..24 {
            clock.advance();
        }
        let tick = clock.current();
        assert_eq!((tick.day, tick.hour()), (1, 23));
        let tick = clock.advance();
        assert_eq!((tick.day, tick.second), (2, 0));
    }

    #[test]
    fn step_must_divide_an_hour() {
        assert_eq!(Clock::new(0).unwrap_err(), ConfigError::ClockStep(0));
        assert_eq!(Clock::new(7).unwrap_err(), ConfigError::ClockStep(7));
        assert!(Clock::new(1).is_ok());
        assert!(Clock::new(900).is_ok());
    }

    #[test]
    fn one_second_ticks_hit_only_their_own_second() {
        let tick = ClockTick::at(1, 28_800);
        assert!(tick.hits(28_800));
        assert!(!tick.hits(28_799));
        assert!(!tick.hits(28_801));
    }

    #[test]
    fn end_of_day_target_is_midnight() {
        assert!(ClockTick::at(3, 0).hits(SECONDS_PER_DAY));
        assert!(!ClockTick::at(3, 1).hits(SECONDS_PER_DAY));
    }

    #[test]
    fn coarse_ticks_hit_every_instant_exactly_once() {
        let mut clock = Clock::new(900).unwrap();
        let target = 23 * SECONDS_PER_HOUR + 7 * SECONDS_PER_MINUTE + 13;
        let mut hits = 0;
        for _ in 0..clock.ticks_per_day() {
            if clock.advance().hits(target) {
                hits += 1;
            }
        }
        assert_eq!(hits, 1);
    }

    #[test]
    fn coarse_window_wraps_over_midnight() {
        let tick = ClockTick {
            day: 2,
            second: 300,
            step: 600,
        };
        assert!(tick.hits(SECONDS_PER_DAY - 100));
        assert!(tick.hits(0));
        assert!(!tick.hits(301));
    }

    #[test]
    fn day_ends_on_the_last_tick_for_any_step() {
        for step in [1, 60, 900] {
            let mut clock = Clock::new(step).unwrap();
            let ends = (0..clock.ticks_per_day())
                .map(|_| clock.advance())
                .filter(ClockTick::is_day_end)
                .count();
            assert_eq!(ends, 1, "step {step}");
            assert!(clock.current().is_day_end());
        }
    }

    #[test]
    fn businesses_and_office_precede_persons() {
        let persons = TICK_ORDER.iter().position(|p| *p == TickPhase::Persons);
        let firing = TICK_ORDER.iter().position(|p| *p == TickPhase::Firing);
        assert_eq!(TICK_ORDER[0], TickPhase::BusinessDelays);
        assert!(firing < persons);
        assert_eq!(persons, Some(TICK_ORDER.len() - 1));
    }
}
