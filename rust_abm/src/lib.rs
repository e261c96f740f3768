/*!
# `city_abm` — commuting city simulation core

A discrete-time model of a small city. Residents live in zones, commute
over capacity-limited transport lines to businesses in other zones, and
are hired, fired and paid by a central employment office.

The core uses [krABMaga](https://github.com/krABMaga/krABMaga) (krabmaga) as
the scheduling framework: every resident is a proxy agent in the schedule
while businesses and the office are stepped by the state ahead of them.
With the `python` feature the same loop is exposed through
[PyO3](https://pyo3.rs).

## Quick start

```no_run
use city_abm::{run_simulation, CityLayout, SimulationConfig};

let reports = run_simulation(CityLayout::default(), SimulationConfig::default(), 7)?;
for r in &reports {
    println!("day {}: {} employed, {:.1}% congestion", r.day, r.employed, r.average_congestion);
}
# Ok::<(), city_abm::SimError>(())
```
*/

pub mod agents;
pub mod clock;
pub mod config;
pub mod error;
pub mod markets;
pub mod state;
pub mod stats;
pub mod transport;
pub mod zone;

#[cfg(feature = "python")]
mod python;

use krabmaga::engine::schedule::Schedule;
use krabmaga::engine::state::State;

pub use agents::{Business, BusinessTier, Person, PersonState};
pub use clock::{Clock, ClockTick};
pub use config::{OfficePolicy, SimulationConfig};
pub use error::{ConfigError, Result, SimError};
pub use markets::EmploymentOffice;
pub use state::CityState;
pub use stats::SimulationReport;
pub use transport::TransportNetwork;
pub use zone::CityLayout;

// ─────────────────────────────────────────────────────────────────────────────
// Main simulation entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Run a krabmaga-scheduled simulation for `days` whole days and return
/// one report per completed day.
///
/// # Errors
///
/// A [`SimError::Config`] if the layout or configuration is rejected, or
/// the first [`SimError::InvalidState`] raised by a resident.
pub fn run_simulation(layout: CityLayout, config: SimulationConfig, days: u32) -> Result<Vec<SimulationReport>> {
    let mut state = CityState::new(layout, config)?;
    let mut schedule = Schedule::new();

    // Initialise agent schedule (calls CityState::init)
    state.init(&mut schedule);

    let ticks = u64::from(days) * state.clock.ticks_per_day();
    for _ in 0..ticks {
        schedule.step(&mut state);
        state.take_fault()?;
    }

    Ok(state.records)
}
