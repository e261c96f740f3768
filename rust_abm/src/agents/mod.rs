pub mod business;
pub mod person;

pub use business::{Business, BusinessId, BusinessTier, Employee, TierConfig};
pub use person::{
    jitter_second, Commute, Destination, Employment, Person, PersonAgent, PersonId, PersonState, Shift,
};
