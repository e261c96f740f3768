use std::fmt;

use krabmaga::engine::{agent::Agent, state::State};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::agents::business::{Business, BusinessId};
use crate::clock::{ClockTick, MIDNIGHT, SECONDS_PER_DAY, SECONDS_PER_MINUTE};
use crate::error::{Result, SimError};
use crate::state::CityState;
use crate::transport::{calculate_arrival_time, LineId, Route, TransportNetwork};
use crate::zone::{Position, ZoneId};

pub type PersonId = usize;

// ─────────────────────────────────────────────────────────────────────────────
// Behavioural state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonState {
    AtHome,
    Moving,
    Working,
}

/// Where a trip ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Home,
    Work,
}

impl Destination {
    pub const fn state(self) -> PersonState {
        match self {
            Destination::Home => PersonState::AtHome,
            Destination::Work => PersonState::Working,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Employment {
    Unemployed,
    EmployedBy(BusinessId),
}

// ─────────────────────────────────────────────────────────────────────────────
// Shift times
// ─────────────────────────────────────────────────────────────────────────────

/// Offset `nominal` by up to `max_minutes` whole minutes either way.
/// Midnight is never moved.
pub fn jitter_second<R: Rng + ?Sized>(nominal: u32, max_minutes: u32, rng: &mut R) -> u32 {
    if nominal % SECONDS_PER_DAY == MIDNIGHT {
        return MIDNIGHT;
    }
    let max = i64::from(max_minutes);
    let offset = rng.gen_range(-max..=max) * i64::from(SECONDS_PER_MINUTE);
    (i64::from(nominal) + offset).rem_euclid(i64::from(SECONDS_PER_DAY)) as u32
}

/// Personal shift boundaries in seconds of day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub start: u32,
    pub end: u32,
}

impl Shift {
    /// Placeholder held while unemployed.
    pub const MIDNIGHT: Shift = Shift {
        start: MIDNIGHT,
        end: MIDNIGHT,
    };

    pub fn jittered<R: Rng + ?Sized>(opening: u32, closing: u32, max_minutes: u32, rng: &mut R) -> Self {
        Shift {
            start: jitter_second(opening, max_minutes, rng),
            end: jitter_second(closing, max_minutes, rng),
        }
    }
}

/// The route to the current (or last) workplace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commute {
    pub route: Route,
    pub workplace: Position,
}

/// A journey in progress. Owns the lines it reserved so the release on
/// arrival always matches the reservation on departure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Trip {
    destination: Destination,
    arrival: u32,
    lines: Vec<LineId>,
    position: Position,
}

// ─────────────────────────────────────────────────────────────────────────────
// Person
// ─────────────────────────────────────────────────────────────────────────────

/// One resident. Mutated only by its own transition logic and by the
/// employment office when it is hired, fired or paid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub residence: ZoneId,
    pub home: Position,
    wallet: f64,
    employment: Employment,
    state: PersonState,
    shift: Shift,
    commute: Option<Commute>,
    position: Option<Position>,
    late: bool,
    trip: Option<Trip>,
    last_arrival: Option<u32>,
}

impl Person {
    pub fn new(name: &str, age: u32, residence: ZoneId, home: Position, wallet: f64) -> Self {
        Person {
            name: name.to_string(),
            age,
            residence,
            home,
            wallet,
            employment: Employment::Unemployed,
            state: PersonState::AtHome,
            shift: Shift::MIDNIGHT,
            commute: None,
            position: Some(home),
            late: false,
            trip: None,
            last_arrival: None,
        }
    }

    pub fn state(&self) -> PersonState {
        self.state
    }

    pub fn employment(&self) -> Employment {
        self.employment
    }

    pub fn employer(&self) -> Option<BusinessId> {
        match self.employment {
            Employment::EmployedBy(id) => Some(id),
            Employment::Unemployed => None,
        }
    }

    pub fn is_employed(&self) -> bool {
        self.employer().is_some()
    }

    pub fn wallet(&self) -> f64 {
        self.wallet
    }

    pub fn add_money(&mut self, amount: f64) {
        self.wallet += amount;
    }

    pub fn shift(&self) -> Shift {
        self.shift
    }

    pub fn commute(&self) -> Option<&Commute> {
        self.commute.as_ref()
    }

    pub fn trip_duration(&self) -> u32 {
        self.commute.as_ref().map_or(0, |c| c.route.duration)
    }

    /// `None` while travelling.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn is_late(&self) -> bool {
        self.late
    }

    pub fn is_travelling(&self) -> bool {
        self.trip.is_some()
    }

    pub fn expected_arrival(&self) -> Option<u32> {
        self.trip.as_ref().map(|t| t.arrival)
    }

    pub fn last_arrival(&self) -> Option<u32> {
        self.last_arrival
    }

    #[cfg(test)]
    pub(crate) fn place_at(&mut self, position: Option<Position>) {
        self.position = position;
    }

    // ─── Employment interface ───────────────────────────────────────────────

    /// Start working for `business`: shift boundaries come from its hours
    /// with personal jitter, the commute from `route`.
    pub fn assign_employer<R: Rng + ?Sized>(
        &mut self,
        business: &Business,
        route: Route,
        max_jitter_minutes: u32,
        rng: &mut R,
    ) {
        self.employment = Employment::EmployedBy(business.id);
        self.shift = Shift::jittered(
            business.opening_second(),
            business.closing_second(),
            max_jitter_minutes,
            rng,
        );
        self.commute = Some(Commute {
            route,
            workplace: business.position,
        });
    }

    /// Back to the unemployed pool. The last commute is kept so a person
    /// dismissed at work can still ride home.
    pub fn dismiss(&mut self) {
        self.employment = Employment::Unemployed;
        self.shift = Shift::MIDNIGHT;
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    /// Evaluate one tick of the daily cycle.
    ///
    /// Only this person's own fields and the occupancy counters of the lines
    /// it boards or leaves are touched.
    pub fn check_state(&mut self, id: PersonId, tick: ClockTick, network: &mut TransportNetwork) -> Result<()> {
        if tick.is_day_start() && self.state != PersonState::Moving {
            self.late = false;
        }
        match self.state {
            PersonState::Moving => self.handle_arrival(id, tick, network),
            PersonState::Working => self.handle_departure(id, tick, network, Destination::Home),
            PersonState::AtHome => {
                if !self.is_employed() {
                    return Ok(());
                }
                self.handle_departure(id, tick, network, Destination::Work)
            }
        }
    }

    fn handle_departure(
        &mut self,
        id: PersonId,
        tick: ClockTick,
        network: &mut TransportNetwork,
        destination: Destination,
    ) -> Result<()> {
        let Some(commute) = &self.commute else {
            return Err(SimError::InvalidState {
                person: id,
                state: self.state,
                missing: "a commute",
            });
        };
        let duration = commute.route.duration;
        let target = match destination {
            Destination::Work => {
                (i64::from(self.shift.start) - i64::from(duration)).rem_euclid(i64::from(SECONDS_PER_DAY)) as u32
            }
            Destination::Home => self.shift.end,
        };

        if !(tick.hits(target) || self.late) {
            return Ok(());
        }
        if duration > 0 && network.is_congested(&commute.route.lines) {
            if !self.late {
                trace!(person = id, second = tick.second, "departure blocked by congestion");
            }
            self.late = true;
            return Ok(());
        }

        let position = match destination {
            Destination::Work => commute.workplace,
            Destination::Home => self.home,
        };
        self.late = false;
        if duration == 0 {
            self.settle(destination, position, tick.second);
            return Ok(());
        }

        let lines = commute.route.lines.clone();
        network.increment_occupancy(&lines);
        self.trip = Some(Trip {
            destination,
            arrival: calculate_arrival_time(tick.second, duration),
            lines,
            position,
        });
        self.state = PersonState::Moving;
        self.position = None;
        Ok(())
    }

    fn handle_arrival(&mut self, id: PersonId, tick: ClockTick, network: &mut TransportNetwork) -> Result<()> {
        let arrived = match &self.trip {
            Some(trip) => tick.hits(trip.arrival),
            None => {
                return Err(SimError::InvalidState {
                    person: id,
                    state: self.state,
                    missing: "a trip in progress",
                })
            }
        };
        if !arrived {
            return Ok(());
        }
        if let Some(trip) = self.trip.take() {
            network.decrement_occupancy(&trip.lines);
            self.settle(trip.destination, trip.position, tick.second);
        }
        Ok(())
    }

    fn settle(&mut self, destination: Destination, position: Position, second: u32) {
        self.state = destination.state();
        self.position = Some(position);
        self.last_arrival = Some(second);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// krabmaga Agent proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent for a single resident.
///
/// Only holds the index into `CityState::persons`; the state owns the data.
#[derive(Clone)]
pub struct PersonAgent {
    pub id: PersonId,
}

impl fmt::Display for PersonAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersonAgent({})", self.id)
    }
}

impl Agent for PersonAgent {
    /// Evaluate this resident's transition for the tick the state is on.
    fn step(&mut self, state: &mut dyn State) {
        let Some(state) = state.as_any_mut().downcast_mut::<CityState>() else {
            error!(agent = %self, "scheduled against a state that is not a CityState");
            return;
        };
        state.step_person(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::business::BusinessTier;
    use crate::transport::TransportLine;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const OPENING: u32 = 12 * 3_600;
    const CLOSING: u32 = 21 * 3_600;

    fn network(capacity: u32) -> TransportNetwork {
        TransportNetwork::new(vec![TransportLine::new("L1", capacity, 600, (0, 1))])
    }

    fn commuter(network: &TransportNetwork) -> Person {
        let firm = Business::new(0, BusinessTier::Big, 1, Position::new(150, 50));
        let mut person = Person::new("Ada", 30, 0, Position::new(10, 10), 100.0);
        let route = network.route_between(0, 1).unwrap();
        person.assign_employer(&firm, route, 0, &mut StdRng::seed_from_u64(1));
        person
    }

    #[test]
    fn starts_at_home_and_unemployed() {
        let person = Person::new("Ada", 30, 0, Position::new(1, 2), 10.0);
        assert_eq!(person.state(), PersonState::AtHome);
        assert_eq!(person.employment(), Employment::Unemployed);
        assert_eq!(person.position(), Some(Position::new(1, 2)));
    }

    #[test]
    fn commute_round_trip_leaves_occupancy_unchanged() {
        let mut net = network(5);
        let mut person = commuter(&net);
        assert_eq!(person.shift(), Shift { start: OPENING, end: CLOSING });

        person.check_state(0, ClockTick::at(1, OPENING - 601), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::AtHome);

        person.check_state(0, ClockTick::at(1, OPENING - 600), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::Moving);
        assert!(person.is_travelling());
        assert_eq!(person.position(), None);
        assert_eq!(person.expected_arrival(), Some(OPENING));
        assert_eq!(net.lines()[0].occupancy(), 1);

        person.check_state(0, ClockTick::at(1, OPENING), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::Working);
        assert_eq!(person.position(), Some(Position::new(150, 50)));
        assert_eq!(person.last_arrival(), Some(OPENING));
        assert!(!person.is_travelling());
        assert_eq!(net.lines()[0].occupancy(), 0);
    }

    #[test]
    fn heads_home_at_closing_time() {
        let mut net = network(5);
        let mut person = commuter(&net);
        person.check_state(0, ClockTick::at(1, OPENING - 600), &mut net).unwrap();
        person.check_state(0, ClockTick::at(1, OPENING), &mut net).unwrap();

        person.check_state(0, ClockTick::at(1, CLOSING - 1), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::Working);
        person.check_state(0, ClockTick::at(1, CLOSING), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::Moving);
        person.check_state(0, ClockTick::at(1, CLOSING + 600), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::AtHome);
        assert_eq!(person.position(), Some(person.home));
    }

    #[test]
    fn zero_duration_commute_skips_moving() {
        let mut net = TransportNetwork::default();
        let firm = Business::new(0, BusinessTier::Small, 1, Position::new(5, 5));
        let mut person = Person::new("Bo", 20, 0, Position::new(1, 1), 0.0);
        person.assign_employer(&firm, Route::default(), 0, &mut StdRng::seed_from_u64(1));

        person.check_state(0, ClockTick::at(1, 8 * 3_600), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::Working);
        assert_eq!(person.position(), Some(Position::new(5, 5)));
        assert!(!person.is_travelling());
    }

    #[test]
    fn congested_route_blocks_and_flags_late() {
        let mut net = network(2);
        let mut people: Vec<Person> = (0..3).map(|_| commuter(&net)).collect();
        let depart = ClockTick::at(1, OPENING - 600);
        for (id, person) in people.iter_mut().enumerate() {
            person.check_state(id, depart, &mut net).unwrap();
        }
        assert_eq!(net.lines()[0].occupancy(), 2);
        assert!(net.is_congested(&[0]));
        assert_eq!(people[2].state(), PersonState::AtHome);
        assert!(people[2].is_late());
        assert!(!people[0].is_late());
    }

    #[test]
    fn late_person_departs_once_capacity_frees() {
        let mut net = network(1);
        let mut first = commuter(&net);
        let mut second = commuter(&net);
        first.check_state(0, ClockTick::at(1, OPENING - 600), &mut net).unwrap();
        second.check_state(1, ClockTick::at(1, OPENING - 600), &mut net).unwrap();
        assert!(second.is_late());

        second.check_state(1, ClockTick::at(1, OPENING - 599), &mut net).unwrap();
        assert_eq!(second.state(), PersonState::AtHome);

        first.check_state(0, ClockTick::at(1, OPENING), &mut net).unwrap();
        second.check_state(1, ClockTick::at(1, OPENING + 1), &mut net).unwrap();
        assert_eq!(second.state(), PersonState::Moving);
        assert!(!second.is_late());
        assert_eq!(second.expected_arrival(), Some(OPENING + 601));
    }

    #[test]
    fn late_flag_is_cleared_at_day_start() {
        let mut net = network(0);
        let mut person = commuter(&net);
        person.check_state(0, ClockTick::at(1, OPENING - 600), &mut net).unwrap();
        assert!(person.is_late());
        person.check_state(0, ClockTick::at(2, 0), &mut net).unwrap();
        assert!(!person.is_late());
        assert_eq!(person.state(), PersonState::AtHome);
    }

    #[test]
    fn commute_scheduled_at_midnight_departs_at_second_zero() {
        let mut net = network(5);
        let mut person = commuter(&net);
        person.shift = Shift {
            start: 600,
            end: CLOSING,
        };
        person.check_state(0, ClockTick::at(2, 0), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::Moving);
        assert_eq!(person.expected_arrival(), Some(600));
    }

    #[test]
    fn arrival_after_midnight_wraps() {
        let mut net = network(5);
        let mut person = commuter(&net);
        person.shift = Shift {
            start: OPENING,
            end: 85_800,
        };
        person.check_state(0, ClockTick::at(1, OPENING - 600), &mut net).unwrap();
        person.check_state(0, ClockTick::at(1, OPENING), &mut net).unwrap();
        person.check_state(0, ClockTick::at(1, 85_800), &mut net).unwrap();
        assert_eq!(person.expected_arrival(), Some(0));
        person.check_state(0, ClockTick::at(2, 0), &mut net).unwrap();
        assert_eq!(person.state(), PersonState::AtHome);
    }

    #[test]
    fn unemployed_residents_stay_home() {
        let mut net = network(5);
        let mut person = commuter(&net);
        person.dismiss();
        for second in [0, OPENING - 600, OPENING, CLOSING] {
            person.check_state(0, ClockTick::at(1, second), &mut net).unwrap();
            assert_eq!(person.state(), PersonState::AtHome);
        }
        assert_eq!(person.shift(), Shift::MIDNIGHT);
    }

    #[test]
    fn moving_without_a_trip_is_an_invalid_state() {
        let mut net = network(5);
        let mut person = commuter(&net);
        person.state = PersonState::Moving;
        let err = person.check_state(4, ClockTick::at(1, 0), &mut net).unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidState {
                person: 4,
                state: PersonState::Moving,
                missing: "a trip in progress",
            }
        );
    }

    #[test]
    fn jitter_is_bounded_and_never_moves_midnight() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            assert_eq!(jitter_second(0, 15, &mut rng), 0);
            assert_eq!(jitter_second(SECONDS_PER_DAY, 15, &mut rng), 0);
            let second = jitter_second(OPENING, 15, &mut rng);
            assert!(second.abs_diff(OPENING) <= 15 * 60);
            assert_eq!(second % 60, 0);
        }
    }

    #[test]
    fn jitter_near_midnight_wraps_into_the_day() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let second = jitter_second(60, 10, &mut rng);
            assert!(second < SECONDS_PER_DAY);
        }
    }
}
