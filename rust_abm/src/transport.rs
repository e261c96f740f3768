//! Capacity-bounded transport lines between zone pairs.
//!
//! Occupancy counters saturate at `[0, capacity]`: a rider that cannot be
//! added is turned away by [`TransportNetwork::is_congested`] before it ever
//! boards, and increments or decrements past a bound are silently ignored.

use pathfinding::prelude::dijkstra;
use serde::{Deserialize, Serialize};

use crate::clock::SECONDS_PER_DAY;
use crate::error::ConfigError;
use crate::zone::{CityLayout, ZoneId};

pub type LineId = usize;

/// Congestion percentage at which a line refuses new riders.
pub const CONGESTION_THRESHOLD: f64 = 100.0;

/// Arrival second for a trip, wrapped into `[0, 86400)`.
pub fn calculate_arrival_time(depart_second: u32, duration: u32) -> u32 {
    (depart_second + duration % SECONDS_PER_DAY) % SECONDS_PER_DAY
}

/// Arithmetic mean congestion, `0.0` for an empty set.
pub fn average_congestion<'a, I>(lines: I) -> f64
where
    I: IntoIterator<Item = &'a TransportLine>,
{
    let (sum, count) = lines
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), line| (sum + line.congestion(), count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportLine {
    pub name: String,
    capacity: u32,
    occupancy: u32,
    /// Trip duration in seconds.
    pub duration: u32,
    pub link: (ZoneId, ZoneId),
}

impl TransportLine {
    pub fn new(name: &str, capacity: u32, duration: u32, link: (ZoneId, ZoneId)) -> Self {
        TransportLine {
            name: name.to_string(),
            capacity,
            occupancy: 0,
            duration,
            link,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    /// Occupancy as a percentage of capacity; `0.0` when capacity is zero.
    pub fn congestion(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.occupancy) * 100.0 / f64::from(self.capacity)
    }

    /// A zero-capacity line carries nobody, so it always counts as full.
    pub fn is_congested(&self) -> bool {
        self.capacity == 0 || self.congestion() >= CONGESTION_THRESHOLD
    }

    pub fn increment(&mut self) {
        if self.occupancy < self.capacity {
            self.occupancy += 1;
        }
    }

    pub fn decrement(&mut self) {
        self.occupancy = self.occupancy.saturating_sub(1);
    }

    pub fn touches(&self, zone: ZoneId) -> bool {
        self.link.0 == zone || self.link.1 == zone
    }

    /// The zone at the other end, if this line touches `zone`.
    fn other_end(&self, zone: ZoneId) -> Option<ZoneId> {
        if self.link.0 == zone {
            Some(self.link.1)
        } else if self.link.1 == zone {
            Some(self.link.0)
        } else {
            None
        }
    }

    /// Scale capacity to `percentage` of its configured value.
    fn rescale(&mut self, percentage: u32) {
        let scaled = u64::from(self.capacity) * u64::from(percentage) / 100;
        self.capacity = u32::try_from(scaled).unwrap_or(u32::MAX);
        self.occupancy = self.occupancy.min(self.capacity);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered lines a commute rides, with the summed trip duration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub lines: Vec<LineId>,
    pub duration: u32,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Network
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct TransportNetwork {
    lines: Vec<TransportLine>,
}

impl TransportNetwork {
    pub fn new(lines: Vec<TransportLine>) -> Self {
        TransportNetwork { lines }
    }

    /// Resolve the layout's line specs and scale every capacity to
    /// `capacity_percentage`.
    pub fn from_layout(layout: &CityLayout, capacity_percentage: u32) -> Result<Self, ConfigError> {
        if capacity_percentage == 0 || capacity_percentage > 100 {
            return Err(ConfigError::CapacityPercentage(capacity_percentage));
        }
        let resolve = |line: &str, zone: &str| {
            layout
                .zone_index(zone)
                .ok_or_else(|| ConfigError::UnknownZone {
                    line: line.to_string(),
                    zone: zone.to_string(),
                })
        };
        let mut lines = Vec::with_capacity(layout.lines.len());
        for spec in &layout.lines {
            let from = resolve(&spec.name, &spec.link.0)?;
            let to = resolve(&spec.name, &spec.link.1)?;
            let mut line = TransportLine::new(&spec.name, spec.capacity, spec.duration, (from, to));
            line.rescale(capacity_percentage);
            lines.push(line);
        }
        Ok(TransportNetwork { lines })
    }

    pub fn lines(&self) -> &[TransportLine] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&TransportLine> {
        self.lines.get(id)
    }

    pub fn congestion(&self, id: LineId) -> f64 {
        self.line(id).map_or(0.0, TransportLine::congestion)
    }

    /// True when any line of the route is at or above the threshold.
    pub fn is_congested(&self, route: &[LineId]) -> bool {
        route
            .iter()
            .filter_map(|&id| self.lines.get(id))
            .any(TransportLine::is_congested)
    }

    pub fn increment_occupancy(&mut self, route: &[LineId]) {
        for &id in route {
            if let Some(line) = self.lines.get_mut(id) {
                line.increment();
            }
        }
    }

    pub fn decrement_occupancy(&mut self, route: &[LineId]) {
        for &id in route {
            if let Some(line) = self.lines.get_mut(id) {
                line.decrement();
            }
        }
    }

    pub fn average_congestion(&self) -> f64 {
        average_congestion(&self.lines)
    }

    pub fn direct_lines_from(&self, zone: ZoneId) -> usize {
        self.lines.iter().filter(|l| l.touches(zone)).count()
    }

    /// Fastest chain of lines between two zones.
    ///
    /// Returns an empty route for `from == to` and `None` when the zones are
    /// not connected.
    pub fn route_between(&self, from: ZoneId, to: ZoneId) -> Option<Route> {
        let (zones, duration) = dijkstra(
            &from,
            |&zone| {
                self.lines
                    .iter()
                    .filter_map(move |line| line.other_end(zone).map(|next| (next, line.duration)))
                    .collect::<Vec<_>>()
            },
            |&zone| zone == to,
        )?;

        let lines = zones
            .windows(2)
            .map(|pair| self.fastest_line(pair[0], pair[1]))
            .collect::<Option<Vec<_>>>()?;
        Some(Route { lines, duration })
    }

    fn fastest_line(&self, a: ZoneId, b: ZoneId) -> Option<LineId> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.other_end(a) == Some(b))
            .min_by_key(|(_, line)| line.duration)
            .map(|(id, _)| id)
    }

    pub fn reset_occupancy(&mut self) {
        for line in &mut self.lines {
            line.occupancy = 0;
        }
    }
}
