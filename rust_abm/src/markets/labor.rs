use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::{Business, Person, PersonId};
use crate::config::OfficePolicy;
use crate::transport::TransportNetwork;

/// What the employment office did during one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaborOutcome {
    pub fired: usize,
    pub hired: usize,
    pub payroll: f64,
}

/// The unemployed registry plus running hire/fire totals.
///
/// Candidates and evictions are always taken in registry (insertion) order;
/// a per-cycle cap keeps the first N.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmploymentOffice {
    unemployed: Vec<PersonId>,
    total_hired: u64,
    total_fired: u64,
}

impl EmploymentOffice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unemployed(&self) -> &[PersonId] {
        &self.unemployed
    }

    pub fn total_hired(&self) -> u64 {
        self.total_hired
    }

    pub fn total_fired(&self) -> u64 {
        self.total_fired
    }

    pub fn register(&mut self, person: PersonId) {
        if !self.unemployed.contains(&person) {
            self.unemployed.push(person);
        }
    }

    // ─── Firing ──────────────────────────────────────────────────────────────

    /// Fire `person` from `business` if its tardiness exceeds the tier's
    /// tolerance. Anything else leaves business, person and registry as
    /// they were.
    pub fn dismiss(&mut self, business: &mut Business, persons: &mut [Person], person: PersonId) -> bool {
        if business.fire(person).is_none() {
            return false;
        }
        if let Some(p) = persons.get_mut(person) {
            p.dismiss();
        }
        self.register(person);
        self.total_fired += 1;
        true
    }

    /// Fire up to `max_firing_per_cycle` overdue employees from every
    /// business.
    pub fn firing_pass(&mut self, businesses: &mut [Business], persons: &mut [Person], policy: &OfficePolicy) -> usize {
        let mut fired = 0;
        for business in businesses.iter_mut() {
            let overdue: Vec<PersonId> = business
                .late_employees()
                .take(policy.max_firing_per_cycle)
                .collect();
            for person in overdue {
                if self.dismiss(business, persons, person) {
                    fired += 1;
                }
            }
        }
        if fired > 0 {
            debug!(fired, unemployed = self.unemployed.len(), "firing pass");
        }
        fired
    }

    // ─── Hiring ──────────────────────────────────────────────────────────────

    /// Whether `person` may join `business`: it must live elsewhere (the
    /// commute is mandatory) and fit the tier's age band.
    pub fn is_eligible(business: &Business, person: &Person) -> bool {
        person.residence != business.zone && business.accepts_age(person.age)
    }

    /// Fill open seats from the registry, at most `max_hiring_per_cycle`
    /// per business.
    pub fn hiring_pass<R: Rng + ?Sized>(
        &mut self,
        businesses: &mut [Business],
        persons: &mut [Person],
        network: &TransportNetwork,
        policy: &OfficePolicy,
        max_jitter_minutes: u32,
        rng: &mut R,
    ) -> usize {
        let mut hired = 0;
        for business in businesses.iter_mut() {
            let open = business.vacancies().min(policy.max_hiring_per_cycle);
            if open == 0 || self.unemployed.is_empty() {
                continue;
            }
            let employer: &Business = business;
            let candidates: Vec<PersonId> = self
                .unemployed
                .iter()
                .copied()
                .filter(|&id| persons.get(id).is_some_and(|p| Self::is_eligible(employer, p)))
                .take(open)
                .collect();

            for id in candidates {
                let Some(person) = persons.get_mut(id) else {
                    continue;
                };
                if !business.hire(id) {
                    break;
                }
                let route = network
                    .route_between(person.residence, business.zone)
                    .unwrap_or_default();
                person.assign_employer(business, route, max_jitter_minutes, rng);
                self.unemployed.retain(|&u| u != id);
                self.total_hired += 1;
                hired += 1;
            }
        }
        if hired > 0 {
            debug!(hired, unemployed = self.unemployed.len(), "hiring pass");
        }
        hired
    }

    // ─── Payroll ─────────────────────────────────────────────────────────────

    /// Credit every current employee with its business's daily wage.
    /// Returns the total paid out.
    pub fn payroll_pass(businesses: &[Business], persons: &mut [Person]) -> f64 {
        let mut total = 0.0;
        for business in businesses {
            let pay = business.calculate_pay();
            for employee in business.employees() {
                if let Some(person) = persons.get_mut(employee.person) {
                    person.add_money(pay);
                    total += pay;
                }
            }
        }
        debug!(total, "payroll pass");
        total
    }
}
