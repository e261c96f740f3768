use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type ZoneId = usize;

/// A point on the city map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }
}

/// Axis-aligned rectangle covered by a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Boundary {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Boundary {
            x,
            y,
            width,
            height,
        }
    }

    /// Inclusive on every edge, so positions on a shared border belong to
    /// both neighbours.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.x
            && position.x <= self.x + self.width
            && position.y >= self.y
            && position.y <= self.y + self.height
    }

    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position {
            x: self.x + rng.gen_range(0..self.width),
            y: self.y + rng.gen_range(0..self.height),
        }
    }
}

/// A city district: demographic ranges plus its share of residents and
/// businesses. Immutable once the simulation starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    /// Percentage of the population living here.
    pub resident_share: f32,
    /// Relative weight when placing businesses.
    pub business_share: f32,
    /// Inclusive wallet range for residents at creation.
    pub wealth: (u32, u32),
    /// Inclusive age range for residents at creation.
    pub age: (u32, u32),
    pub boundary: Boundary,
}

impl Zone {
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        self.boundary.random_position(rng)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("resident", self.resident_share), ("business", self.business_share)] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidShare {
                    zone: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        if self.wealth.0 > self.wealth.1 {
            return Err(ConfigError::EmptyRange {
                zone: self.name.clone(),
                field: "wealth",
            });
        }
        if self.age.0 > self.age.1 {
            return Err(ConfigError::EmptyRange {
                zone: self.name.clone(),
                field: "age",
            });
        }
        if self.boundary.width <= 0 || self.boundary.height <= 0 {
            return Err(ConfigError::EmptyBoundary(self.name.clone()));
        }
        Ok(())
    }
}

/// A transport line as described by external configuration: zones are
/// referenced by name and resolved when the network is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub name: String,
    pub capacity: u32,
    /// Trip duration in seconds.
    pub duration: u32,
    pub link: (String, String),
}

impl LineSpec {
    pub fn new(name: &str, capacity: u32, duration: u32, from: &str, to: &str) -> Self {
        LineSpec {
            name: name.to_string(),
            capacity,
            duration,
            link: (from.to_string(), to.to_string()),
        }
    }
}

/// Zones and transport lines of one city, as produced by the data loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityLayout {
    pub zones: Vec<Zone>,
    pub lines: Vec<LineSpec>,
}

impl CityLayout {
    pub fn zone_index(&self, name: &str) -> Option<ZoneId> {
        self.zones.iter().position(|z| z.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        for zone in &self.zones {
            zone.validate()?;
        }
        let resident_total: f32 = self.zones.iter().map(|z| z.resident_share).sum();
        if resident_total > 100.0 + f32::EPSILON * 100.0 {
            return Err(ConfigError::ResidentShares(resident_total));
        }
        for line in &self.lines {
            for zone in [&line.link.0, &line.link.1] {
                if self.zone_index(zone).is_none() {
                    return Err(ConfigError::UnknownZone {
                        line: line.name.clone(),
                        zone: zone.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for CityLayout {
    /// Four districts on a 2×2 grid joined by a ring of lines plus one
    /// diagonal express.
    fn default() -> Self {
        let zone = |name: &str, residents, businesses, wealth, age, boundary| Zone {
            name: name.to_string(),
            resident_share: residents,
            business_share: businesses,
            wealth,
            age,
            boundary,
        };
        CityLayout {
            zones: vec![
                zone("Center", 15.0, 40.0, (2_000, 6_000), (18, 60), Boundary::new(0, 0, 100, 100)),
                zone("North", 30.0, 20.0, (1_000, 3_000), (18, 45), Boundary::new(100, 0, 100, 100)),
                zone("Harbor", 25.0, 25.0, (800, 2_500), (20, 65), Boundary::new(0, 100, 100, 100)),
                zone("Hills", 30.0, 15.0, (3_000, 9_000), (25, 65), Boundary::new(100, 100, 100, 100)),
            ],
            lines: vec![
                LineSpec::new("Line 1", 60, 1_200, "Center", "North"),
                LineSpec::new("Line 2", 40, 1_500, "North", "Hills"),
                LineSpec::new("Line 3", 50, 1_800, "Hills", "Harbor"),
                LineSpec::new("Line 4", 60, 900, "Harbor", "Center"),
                LineSpec::new("Express", 20, 2_400, "Center", "Hills"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_positions_stay_inside_the_boundary() {
        let boundary = Boundary::new(10, 20, 30, 5);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(boundary.contains(boundary.random_position(&mut rng)));
        }
    }

    #[test]
    fn boundary_edges_are_inclusive() {
        let boundary = Boundary::new(0, 0, 10, 10);
        assert!(boundary.contains(Position::new(5, 5)));
        assert!(boundary.contains(Position::new(10, 10)));
        assert!(!boundary.contains(Position::new(11, 5)));
    }

    #[test]
    fn default_layout_is_valid() {
        let layout = CityLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.zone_index("Hills"), Some(3));
    }

    #[test]
    fn line_to_unknown_zone_is_rejected() {
        let mut layout = CityLayout::default();
        layout.lines.push(LineSpec::new("Ghost", 10, 60, "Center", "Nowhere"));
        assert_eq!(
            layout.validate(),
            Err(ConfigError::UnknownZone {
                line: "Ghost".to_string(),
                zone: "Nowhere".to_string(),
            })
        );
    }

    #[test]
    fn inverted_age_range_is_rejected() {
        let mut layout = CityLayout::default();
        layout.zones[1].age = (50, 20);
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::EmptyRange { field: "age", .. })
        ));
    }

    #[test]
    fn negative_share_cannot_offset_another_zone() {
        let mut layout = CityLayout::default();
        layout.zones[0].resident_share = -50.0;
        layout.zones[1].resident_share = 95.0;
        assert_eq!(
            layout.validate(),
            Err(ConfigError::InvalidShare {
                zone: "Center".to_string(),
                field: "resident",
                value: -50.0,
            })
        );
    }

    #[test]
    fn non_finite_shares_are_rejected() {
        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut layout = CityLayout::default();
            layout.zones[2].business_share = value;
            assert!(matches!(
                layout.validate(),
                Err(ConfigError::InvalidShare { field: "business", .. })
            ));

            let mut layout = CityLayout::default();
            layout.zones[2].resident_share = value;
            assert!(matches!(
                layout.validate(),
                Err(ConfigError::InvalidShare { field: "resident", .. })
            ));
        }
    }

    #[test]
    fn share_above_one_hundred_is_rejected() {
        let mut layout = CityLayout::default();
        layout.zones[3].business_share = 140.0;
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidShare { field: "business", value, .. }) if value == 140.0
        ));
    }

    #[test]
    fn overfull_resident_shares_are_rejected() {
        let mut layout = CityLayout::default();
        layout.zones[0].resident_share = 50.0;
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::ResidentShares(_))
        ));
    }
}
