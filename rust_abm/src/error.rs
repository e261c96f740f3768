//! Error types for the city simulation.
//!
//! Congested lines, full businesses and an empty unemployed registry are
//! steady-state conditions and never show up here.

use crate::agents::PersonState;

/// Problems with the supplied configuration or city layout.
///
/// All of these abort simulation start: nothing meaningful can run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The requested population is zero, or the zone shares produced nobody.
    #[error("population must contain at least one resident")]
    EmptyPopulation,

    /// Transport capacity percentage outside `1..=100`.
    #[error("transport capacity percentage must be in 1..=100, got {0}")]
    CapacityPercentage(u32),

    /// The clock step cannot reach every second of the hour evenly.
    #[error("clock step of {0}s must be a positive divisor of one hour")]
    ClockStep(u32),

    /// Businesses are created one per `density` residents.
    #[error("business density divisor must be positive")]
    BusinessDensity,

    /// The layout has no zones at all.
    #[error("city layout has no zones")]
    NoZones,

    /// A `(min, max)` pair on a zone is inverted or empty.
    #[error("zone `{zone}` has an empty {field} range")]
    EmptyRange {
        /// Zone name.
        zone: String,
        /// Which range (`wealth` or `age`).
        field: &'static str,
    },

    /// A zone boundary with zero width or height.
    #[error("zone `{0}` has an empty boundary")]
    EmptyBoundary(String),

    /// A zone share that is not a percentage in `0..=100`.
    #[error("zone `{zone}` has an invalid {field} share of {value}")]
    InvalidShare {
        /// Zone name.
        zone: String,
        /// Which share (`resident` or `business`).
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Resident shares across zones add up to more than 100%.
    #[error("resident shares sum to {0}%, expected at most 100")]
    ResidentShares(f32),

    /// A transport line names a zone that is not in the layout.
    #[error("transport line `{line}` links unknown zone `{zone}`")]
    UnknownZone {
        /// Line name.
        line: String,
        /// The zone name that did not resolve.
        zone: String,
    },

    /// Residents of this zone have no business outside their own zone.
    #[error("no eligible employer zone for residents of `{0}`")]
    NoEligibleEmployerZone(String),
}

/// Errors raised while building or stepping a simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// Configuration or layout rejected at start.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An agent reached a state its transition table cannot handle.
    /// This is a modelling bug, never a runtime condition.
    #[error("person {person} is {state:?} without {missing}")]
    InvalidState {
        /// Index of the offending person.
        person: usize,
        /// State the person was found in.
        state: PersonState,
        /// What the state requires but was absent.
        missing: &'static str,
    },
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
