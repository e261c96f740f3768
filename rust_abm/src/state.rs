use std::any::Any;

use krabmaga::engine::{schedule::Schedule, state::State};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use tracing::{error, info};

use crate::agents::{Business, BusinessTier, Person, PersonAgent, PersonId};
use crate::clock::{Clock, ClockTick, TickPhase, TICK_ORDER};
use crate::config::SimulationConfig;
use crate::error::{ConfigError, Result, SimError};
use crate::markets::{EmploymentOffice, LaborOutcome};
use crate::stats::SimulationReport;
use crate::transport::TransportNetwork;
use crate::zone::{CityLayout, Zone};

// ─────────────────────────────────────────────────────────────────────────────
// City state (implements krabmaga State)
// ─────────────────────────────────────────────────────────────────────────────

/// Central state struct holding every entity of one simulation run.
///
/// Resident *proxy* structs ([`PersonAgent`]) are stored in the krabmaga
/// `Schedule`; the data they act on lives here. Businesses and the
/// employment office are stepped from `before_step` so they always run
/// ahead of the residents within a tick.
pub struct CityState {
    pub layout: CityLayout,
    pub transport: TransportNetwork,
    pub businesses: Vec<Business>,
    pub persons: Vec<Person>,
    pub office: EmploymentOffice,
    pub clock: Clock,
    pub config: SimulationConfig,
    pub rng: StdRng,

    /// Outcome of the most recent firing / hiring / payroll passes.
    pub labor_last: LaborOutcome,
    /// One report per completed day.
    pub records: Vec<SimulationReport>,

    // First error raised from inside an agent step, where it cannot be
    // returned directly.
    fault: Option<SimError>,
}

impl CityState {
    /// Build every entity for a fresh run.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] in the layout or configuration, including a zone
    /// whose residents have no business outside it.
    pub fn new(layout: CityLayout, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        layout.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let transport = TransportNetwork::from_layout(&layout, config.transport_capacity_percentage)?;
        let businesses = Self::create_businesses(&layout.zones, config.business_count(), &mut rng);
        let persons = Self::create_persons(&layout.zones, config.population, &mut rng);
        if persons.is_empty() {
            return Err(ConfigError::EmptyPopulation.into());
        }
        let clock = Clock::new(config.step_seconds)?;

        let mut state = CityState {
            layout,
            transport,
            businesses,
            persons,
            office: EmploymentOffice::new(),
            clock,
            config,
            rng,
            labor_last: LaborOutcome::default(),
            records: Vec::new(),
            fault: None,
        };
        state.initial_employment()?;
        info!(
            residents = state.persons.len(),
            businesses = state.businesses.len(),
            lines = state.transport.lines().len(),
            unemployed = state.office.unemployed().len(),
            "population generated"
        );
        Ok(state)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.layout.zones
    }

    // ─── Population generation ───────────────────────────────────────────────

    fn create_businesses(zones: &[Zone], count: usize, rng: &mut StdRng) -> Vec<Business> {
        // Shares are validated percentages; only an all-zero set fails here,
        // and then businesses are spread uniformly.
        let weights = WeightedIndex::new(zones.iter().map(|z| z.business_share)).ok();
        let mut businesses = Vec::with_capacity(count);
        for id in 0..count {
            let zone = match &weights {
                Some(weights) => weights.sample(rng),
                None => rng.gen_range(0..zones.len()),
            };
            let tier = BusinessTier::ALL[rng.gen_range(0..BusinessTier::ALL.len())];
            let position = zones[zone].random_position(rng);
            businesses.push(Business::new(id, tier, zone, position));
        }
        businesses
    }

    fn create_persons(zones: &[Zone], population: usize, rng: &mut StdRng) -> Vec<Person> {
        let mut persons = Vec::with_capacity(population);
        for (zone_id, zone) in zones.iter().enumerate() {
            let count = (population as f64 * f64::from(zone.resident_share) / 100.0) as usize;
            let ages = Uniform::new_inclusive(zone.age.0, zone.age.1);
            let wealth = Uniform::new_inclusive(zone.wealth.0, zone.wealth.1);
            for i in 0..count {
                let home = zone.random_position(rng);
                persons.push(Person::new(
                    &format!("{}-{}", zone.name, i),
                    ages.sample(rng),
                    zone_id,
                    home,
                    f64::from(wealth.sample(rng)),
                ));
            }
        }
        persons
    }

    /// Seat every resident at the first business (in creation order) with a
    /// free seat that it is eligible for; everyone else registers as
    /// unemployed.
    fn initial_employment(&mut self) -> Result<()> {
        let CityState {
            layout,
            transport,
            businesses,
            persons,
            office,
            config,
            rng,
            ..
        } = self;

        for (zone_id, zone) in layout.zones.iter().enumerate() {
            let has_residents = persons.iter().any(|p| p.residence == zone_id);
            if has_residents && !businesses.iter().any(|b| b.zone != zone_id) {
                return Err(ConfigError::NoEligibleEmployerZone(zone.name.clone()).into());
            }
        }

        for (id, person) in persons.iter_mut().enumerate() {
            let seat = businesses
                .iter_mut()
                .find(|b| b.has_vacancy() && EmploymentOffice::is_eligible(b, person));
            match seat {
                Some(business) => {
                    business.hire(id);
                    let route = transport
                        .route_between(person.residence, business.zone)
                        .unwrap_or_default();
                    person.assign_employer(business, route, config.shift_jitter_minutes, rng);
                }
                None => office.register(id),
            }
        }
        Ok(())
    }

    // ─── Per-tick pipeline ───────────────────────────────────────────────────

    /// Advance the clock and run every handler that precedes the residents.
    pub fn begin_tick(&mut self) -> ClockTick {
        let tick = self.clock.advance();
        for phase in TICK_ORDER {
            if phase != TickPhase::Persons {
                self.run_phase(phase, tick);
            }
        }
        tick
    }

    pub fn run_phase(&mut self, phase: TickPhase, tick: ClockTick) {
        match phase {
            TickPhase::BusinessDelays => {
                for business in &mut self.businesses {
                    business.check_employee_delays(tick, &self.persons);
                }
            }
            TickPhase::Firing => {
                if tick.hits(self.config.office.firing_second) {
                    self.labor_last.fired =
                        self.office
                            .firing_pass(&mut self.businesses, &mut self.persons, &self.config.office);
                }
            }
            TickPhase::HiringAndPayroll => {
                if tick.hits(self.config.office.hiring_second) {
                    self.labor_last.hired = self.office.hiring_pass(
                        &mut self.businesses,
                        &mut self.persons,
                        &self.transport,
                        &self.config.office,
                        self.config.shift_jitter_minutes,
                        &mut self.rng,
                    );
                    self.labor_last.payroll = EmploymentOffice::payroll_pass(&self.businesses, &mut self.persons);
                }
            }
            TickPhase::Persons => {
                for id in 0..self.persons.len() {
                    self.step_person(id);
                }
            }
        }
    }

    /// Evaluate one resident against the current tick. A failure is kept
    /// as the state's fault and stops further resident steps.
    pub fn step_person(&mut self, id: PersonId) {
        if self.fault.is_some() {
            return;
        }
        let tick = self.clock.current();
        let Some(person) = self.persons.get_mut(id) else {
            return;
        };
        if let Err(err) = person.check_state(id, tick, &mut self.transport) {
            error!(%err, "resident transition failed");
            self.fault = Some(err);
        }
    }

    /// End-of-tick bookkeeping: the last tick of a day records a report.
    pub fn finish_tick(&mut self, tick: ClockTick) {
        if tick.is_day_end() {
            let report = self.report();
            info!(
                day = report.day,
                employed = report.employed,
                unemployed = report.unemployed,
                congestion = report.average_congestion,
                "day completed"
            );
            self.records.push(report);
        }
    }

    /// Run one full tick without a krabmaga schedule.
    pub fn tick(&mut self) -> Result<ClockTick> {
        let tick = self.begin_tick();
        self.run_phase(TickPhase::Persons, tick);
        self.finish_tick(tick);
        self.take_fault()?;
        Ok(tick)
    }

    pub fn run_days(&mut self, days: u32) -> Result<()> {
        for _ in 0..u64::from(days) * self.clock.ticks_per_day() {
            self.tick()?;
        }
        Ok(())
    }

    /// Surface (and clear) a fault raised inside an agent step.
    pub fn take_fault(&mut self) -> Result<()> {
        match self.fault.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// krabmaga State implementation
// ─────────────────────────────────────────────────────────────────────────────

impl State for CityState {
    /// Schedule one proxy per resident. Businesses and the employment
    /// office are driven from `before_step` instead, which krabmaga always
    /// runs ahead of the agent queue.
    fn init(&mut self, schedule: &mut Schedule) {
        for i in 0..self.persons.len() {
            schedule.schedule_repeating(Box::new(PersonAgent { id: i }), 0.0, 0);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_state_mut(&mut self) -> &mut dyn State {
        self
    }

    fn as_state(&self) -> &dyn State {
        self
    }

    /// Discard every entity and rebuild from the stored layout and config.
    fn reset(&mut self) {
        match CityState::new(self.layout.clone(), self.config.clone()) {
            Ok(fresh) => *self = fresh,
            Err(err) => {
                error!(%err, "reset failed");
                self.fault = Some(err);
            }
        }
    }

    /// Advance the clock; businesses and the employment office react.
    fn before_step(&mut self, _schedule: &mut Schedule) {
        self.begin_tick();
    }

    /// Record the day's report on its last tick.
    fn after_step(&mut self, _schedule: &mut Schedule) {
        let tick = self.clock.current();
        self.finish_tick(tick);
    }

    fn update(&mut self, _step: u64) {}
}
