use serde::{Deserialize, Serialize};

use crate::agents::person::{Person, PersonId};
use crate::clock::{hour_to_second, ClockTick};
use crate::zone::{Position, ZoneId};

pub type BusinessId = usize;

// ─────────────────────────────────────────────────────────────────────────────
// Tiers
// ─────────────────────────────────────────────────────────────────────────────

/// Size class of a business. Each tier fixes hours, pay and hiring policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessTier {
    Small,
    Medium,
    Big,
}

/// Hours, revenue and hiring policy shared by every business of one tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub revenue_per_hour: f64,
    pub max_employees: usize,
    pub min_age: u32,
    pub max_age: u32,
    /// Delays tolerated before an employee becomes eligible for firing.
    pub max_tardiness: u32,
}

impl BusinessTier {
    pub const ALL: [BusinessTier; 3] = [BusinessTier::Small, BusinessTier::Medium, BusinessTier::Big];

    pub const fn config(self) -> TierConfig {
        match self {
            BusinessTier::Small => TierConfig {
                opening_hour: 8,
                closing_hour: 13,
                revenue_per_hour: 7.5,
                max_employees: 5,
                min_age: 18,
                max_age: 29,
                max_tardiness: 9,
            },
            BusinessTier::Medium => TierConfig {
                opening_hour: 17,
                closing_hour: 23,
                revenue_per_hour: 12.0,
                max_employees: 10,
                min_age: 27,
                max_age: 50,
                max_tardiness: 5,
            },
            BusinessTier::Big => TierConfig {
                opening_hour: 12,
                closing_hour: 21,
                revenue_per_hour: 25.0,
                max_employees: 25,
                min_age: 20,
                max_age: 60,
                max_tardiness: 2,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employee
// ─────────────────────────────────────────────────────────────────────────────

/// A person on a business's payroll together with its delay count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub person: PersonId,
    tardiness: u32,
}

impl Employee {
    pub fn new(person: PersonId) -> Self {
        Employee {
            person,
            tardiness: 0,
        }
    }

    pub fn tardiness(&self) -> u32 {
        self.tardiness
    }

    /// Delays are never forgiven.
    pub fn increment_tardiness(&mut self) {
        self.tardiness += 1;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Business
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub tier: BusinessTier,
    pub zone: ZoneId,
    /// Fixed workplace position inside `zone`.
    pub position: Position,
    employees: Vec<Employee>,
}

impl Business {
    pub fn new(id: BusinessId, tier: BusinessTier, zone: ZoneId, position: Position) -> Self {
        Business {
            id,
            tier,
            zone,
            position,
            employees: Vec::with_capacity(tier.config().max_employees),
        }
    }

    pub fn config(&self) -> TierConfig {
        self.tier.config()
    }

    pub fn opening_second(&self) -> u32 {
        hour_to_second(self.config().opening_hour)
    }

    pub fn closing_second(&self) -> u32 {
        hour_to_second(self.config().closing_hour)
    }

    /// Flat daily wage: scheduled hours × hourly revenue, regardless of
    /// how long the employee was actually present.
    pub fn calculate_pay(&self) -> f64 {
        let config = self.config();
        let hours = f64::from(config.closing_hour) - f64::from(config.opening_hour);
        hours * config.revenue_per_hour
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee_mut(&mut self, person: PersonId) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|e| e.person == person)
    }

    pub fn employs(&self, person: PersonId) -> bool {
        self.employees.iter().any(|e| e.person == person)
    }

    pub fn vacancies(&self) -> usize {
        self.config().max_employees.saturating_sub(self.employees.len())
    }

    pub fn has_vacancy(&self) -> bool {
        self.vacancies() > 0
    }

    pub fn accepts_age(&self, age: u32) -> bool {
        let config = self.config();
        (config.min_age..=config.max_age).contains(&age)
    }

    /// Employed share of the maximum headcount, as a percentage.
    pub fn occupation_rate(&self) -> f64 {
        let max = self.config().max_employees;
        if max == 0 {
            return 0.0;
        }
        self.employees.len() as f64 * 100.0 / max as f64
    }

    /// Add `person` to the payroll. No-op once the business is full or
    /// when the person already works here.
    pub fn hire(&mut self, person: PersonId) -> bool {
        if !self.has_vacancy() || self.employs(person) {
            return false;
        }
        self.employees.push(Employee::new(person));
        true
    }

    pub fn should_fire(&self, employee: &Employee) -> bool {
        employee.tardiness > self.config().max_tardiness
    }

    /// Remove `person` if its tardiness exceeds the tier's tolerance.
    /// Returns the removed record, or `None` when nothing changed.
    pub fn fire(&mut self, person: PersonId) -> Option<Employee> {
        let index = self
            .employees
            .iter()
            .position(|e| e.person == person && self.should_fire(e))?;
        Some(self.employees.remove(index))
    }

    /// Employees currently eligible for firing, in hiring order.
    pub fn late_employees(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.employees
            .iter()
            .filter(|e| self.should_fire(e))
            .map(|e| e.person)
    }

    /// At opening time, count a delay for every employee who is not
    /// standing at the workplace. Returns how many were late.
    pub fn check_employee_delays(&mut self, tick: ClockTick, persons: &[Person]) -> usize {
        if !tick.hits(self.opening_second()) {
            return 0;
        }
        let position = Some(self.position);
        let mut late = 0;
        for employee in &mut self.employees {
            let present = persons
                .get(employee.person)
                .is_some_and(|p| p.position() == position);
            if !present {
                employee.increment_tardiness();
                late += 1;
            }
        }
        late
    }
}
