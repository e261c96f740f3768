//! Read-only aggregates over a [`CityState`].
//!
//! Nothing here mutates the simulation; every figure is derived from the
//! current entity collections when asked for. Empty denominators yield 0.

use serde::{Deserialize, Serialize};

use crate::agents::{BusinessId, BusinessTier, PersonId, PersonState};
use crate::state::CityState;
use crate::zone::{Position, ZoneId};

/// Per-zone figures for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub name: String,
    /// Daily payroll of the zone's businesses divided by their count.
    pub average_pay: f64,
    pub residents: usize,
    pub businesses: usize,
    pub direct_lines: usize,
}

/// One resident as seen from outside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonSnapshot {
    pub name: String,
    pub position: Option<Position>,
    pub state: PersonState,
    pub wallet: f64,
    pub employer: Option<BusinessId>,
    pub late: bool,
}

/// Employment summary recorded at the end of every day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub day: u32,
    pub total_people: usize,
    pub employed: usize,
    pub unemployed: usize,
    /// Employed share of the population, in percent.
    pub occupation_rate: f64,
    pub total_hired: u64,
    pub total_fired: u64,
    pub average_congestion: f64,
}

/// Share of residents in each behavioural state, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateShares {
    pub at_home: f64,
    pub moving: f64,
    pub working: f64,
}

/// Businesses flagged by their occupation rate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessEvaluation {
    /// No employees at all.
    pub to_close: Vec<BusinessId>,
    /// Every seat taken.
    pub to_expand: Vec<BusinessId>,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

impl CityState {
    pub fn zone_snapshot(&self, zone: ZoneId) -> Option<ZoneSnapshot> {
        let info = self.zones().get(zone)?;
        let local: Vec<_> = self.businesses.iter().filter(|b| b.zone == zone).collect();
        let payroll: f64 = local
            .iter()
            .map(|b| b.employees().len() as f64 * b.calculate_pay())
            .sum();
        let average_pay = if local.is_empty() {
            0.0
        } else {
            payroll / local.len() as f64
        };
        Some(ZoneSnapshot {
            name: info.name.clone(),
            average_pay,
            residents: self.persons.iter().filter(|p| p.residence == zone).count(),
            businesses: local.len(),
            direct_lines: self.transport.direct_lines_from(zone),
        })
    }

    pub fn person_snapshot(&self, person: PersonId) -> Option<PersonSnapshot> {
        let p = self.persons.get(person)?;
        Some(PersonSnapshot {
            name: p.name.clone(),
            position: p.position(),
            state: p.state(),
            wallet: p.wallet(),
            employer: p.employer(),
            late: p.is_late(),
        })
    }

    /// Employment totals for the current day.
    pub fn report(&self) -> SimulationReport {
        let total_people = self.persons.len();
        let employed = self.persons.iter().filter(|p| p.is_employed()).count();
        SimulationReport {
            day: self.clock.current().day,
            total_people,
            employed,
            unemployed: total_people - employed,
            occupation_rate: percentage(employed, total_people),
            total_hired: self.office.total_hired(),
            total_fired: self.office.total_fired(),
            average_congestion: self.transport.average_congestion(),
        }
    }

    pub fn state_shares(&self) -> StateShares {
        let total = self.persons.len();
        let count = |state: PersonState| self.persons.iter().filter(|p| p.state() == state).count();
        StateShares {
            at_home: percentage(count(PersonState::AtHome), total),
            moving: percentage(count(PersonState::Moving), total),
            working: percentage(count(PersonState::Working), total),
        }
    }

    /// `(line name, congestion)` for every line, in network order.
    pub fn line_congestion(&self) -> Vec<(String, f64)> {
        self.transport
            .lines()
            .iter()
            .map(|line| (line.name.clone(), line.congestion()))
            .collect()
    }

    /// Mean occupation rate of the businesses of each tier.
    pub fn tier_occupation(&self) -> Vec<(BusinessTier, f64)> {
        BusinessTier::ALL
            .iter()
            .map(|&tier| {
                let rates: Vec<f64> = self
                    .businesses
                    .iter()
                    .filter(|b| b.tier == tier)
                    .map(|b| b.occupation_rate())
                    .collect();
                let mean = if rates.is_empty() {
                    0.0
                } else {
                    rates.iter().sum::<f64>() / rates.len() as f64
                };
                (tier, mean)
            })
            .collect()
    }

    pub fn evaluate_businesses(&self) -> BusinessEvaluation {
        let mut evaluation = BusinessEvaluation::default();
        for business in &self.businesses {
            if business.employees().is_empty() {
                evaluation.to_close.push(business.id);
            } else if !business.has_vacancy() {
                evaluation.to_expand.push(business.id);
            }
        }
        evaluation
    }

    /// The first zone whose boundary contains `position`.
    pub fn zone_at(&self, position: Position) -> Option<ZoneId> {
        self.zones().iter().position(|z| z.boundary.contains(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::zone::CityLayout;

    fn city() -> CityState {
        let config = SimulationConfig {
            population: 200,
            ..SimulationConfig::default()
        };
        CityState::new(CityLayout::default(), config).unwrap()
    }

    #[test]
    fn report_splits_the_population() {
        let state = city();
        let report = state.report();
        assert_eq!(report.total_people, 200);
        assert_eq!(report.employed + report.unemployed, 200);
        assert_eq!(report.employed, state.persons.iter().filter(|p| p.is_employed()).count());
        assert_eq!(report.total_hired, 0);
        assert_eq!(report.average_congestion, 0.0);
        let expected = report.employed as f64 * 100.0 / 200.0;
        assert!((report.occupation_rate - expected).abs() < 1e-9);
    }

    #[test]
    fn everyone_starts_at_home() {
        let shares = city().state_shares();
        assert_eq!(shares.at_home, 100.0);
        assert_eq!(shares.moving, 0.0);
        assert_eq!(shares.working, 0.0);
    }

    #[test]
    fn zone_average_pay_is_payroll_over_business_count() {
        let state = city();
        for zone in 0..state.zones().len() {
            let snapshot = state.zone_snapshot(zone).unwrap();
            let local: Vec<_> = state.businesses.iter().filter(|b| b.zone == zone).collect();
            assert_eq!(snapshot.businesses, local.len());
            if local.is_empty() {
                assert_eq!(snapshot.average_pay, 0.0);
            }
        }
        assert!(state.zone_snapshot(99).is_none());
        assert_eq!(state.zone_snapshot(1).unwrap().direct_lines, 2);
    }

    #[test]
    fn zone_lookup_by_position() {
        let state = city();
        assert_eq!(state.zone_at(Position::new(50, 50)), Some(0));
        assert_eq!(state.zone_at(Position::new(150, 150)), Some(3));
        assert_eq!(state.zone_at(Position::new(-5, 0)), None);
    }

    #[test]
    fn evaluation_flags_empty_and_full_businesses() {
        let state = city();
        let evaluation = state.evaluate_businesses();
        for id in &evaluation.to_close {
            assert!(state.businesses[*id].employees().is_empty());
        }
        for id in &evaluation.to_expand {
            assert!(!state.businesses[*id].has_vacancy());
        }
        assert_eq!(state.tier_occupation().len(), 3);
        assert_eq!(state.line_congestion().len(), state.transport.lines().len());
    }

    #[test]
    fn person_snapshot_mirrors_the_resident() {
        let state = city();
        let snapshot = state.person_snapshot(0).unwrap();
        assert_eq!(snapshot.name, state.persons[0].name);
        assert_eq!(snapshot.position, Some(state.persons[0].home));
        assert!(state.person_snapshot(10_000).is_none());
    }
}
