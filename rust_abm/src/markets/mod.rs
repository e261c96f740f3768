pub mod labor;

pub use labor::{EmploymentOffice, LaborOutcome};
