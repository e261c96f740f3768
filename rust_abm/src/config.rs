use serde::{Deserialize, Serialize};

use crate::clock::{hour_to_second, Clock};
use crate::error::ConfigError;

/// Employment office policy: per-cycle caps and the two daily instants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficePolicy {
    /// Most employees a single business may lose in one firing pass.
    pub max_firing_per_cycle: usize,
    /// Most residents a single business may take on in one hiring pass.
    pub max_hiring_per_cycle: usize,
    /// Second of day of the firing pass.
    pub firing_second: u32,
    /// Second of day of the hiring and payroll pass.
    pub hiring_second: u32,
}

impl Default for OfficePolicy {
    fn default() -> Self {
        OfficePolicy {
            max_firing_per_cycle: 3,
            max_hiring_per_cycle: 2,
            firing_second: hour_to_second(0),
            hiring_second: hour_to_second(23),
        }
    }
}

/// Parameters supplied by the driving application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub population: usize,
    /// Percentage of each line's nominal capacity available in this run.
    pub transport_capacity_percentage: u32,
    /// Logical seconds per clock advance.
    pub step_seconds: u32,
    pub seed: u64,
    /// Businesses created on top of the population-derived count.
    pub extra_businesses: usize,
    /// One business is created per this many residents.
    pub residents_per_business: usize,
    /// Bound on the personal offset applied to shift boundaries.
    pub shift_jitter_minutes: u32,
    pub office: OfficePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            population: 500,
            transport_capacity_percentage: 100,
            step_seconds: 60,
            seed: 42,
            extra_businesses: 0,
            residents_per_business: 10,
            shift_jitter_minutes: 15,
            office: OfficePolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.transport_capacity_percentage == 0 || self.transport_capacity_percentage > 100 {
            return Err(ConfigError::CapacityPercentage(self.transport_capacity_percentage));
        }
        if self.residents_per_business == 0 {
            return Err(ConfigError::BusinessDensity);
        }
        Clock::new(self.step_seconds)?;
        Ok(())
    }

    pub fn business_count(&self) -> usize {
        self.population / self.residents_per_business + self.extra_businesses
    }
}
