use std::collections::HashMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::SimulationConfig;
use crate::stats::SimulationReport;
use crate::zone::CityLayout;

// ─────────────────────────────────────────────────────────────────────────────
// Python-visible day record
// ─────────────────────────────────────────────────────────────────────────────

/// Employment summary for one simulated day.
///
/// All fields are read-only from Python.
#[pyclass(get_all)]
#[derive(Clone, Debug)]
pub struct PyDayRecord {
    pub day: u32,
    pub total_people: usize,
    pub employed: usize,
    pub unemployed: usize,
    pub occupation_rate: f64,
    pub total_hired: u64,
    pub total_fired: u64,
    pub average_congestion: f64,
}

impl From<SimulationReport> for PyDayRecord {
    fn from(r: SimulationReport) -> Self {
        PyDayRecord {
            day: r.day,
            total_people: r.total_people,
            employed: r.employed,
            unemployed: r.unemployed,
            occupation_rate: r.occupation_rate,
            total_hired: r.total_hired,
            total_fired: r.total_fired,
            average_congestion: r.average_congestion,
        }
    }
}

#[pymethods]
impl PyDayRecord {
    fn __repr__(&self) -> String {
        format!(
            "PyDayRecord(day={}, employed={}, unemployed={}, average_congestion={:.2})",
            self.day, self.employed, self.unemployed, self.average_congestion
        )
    }

    /// Convert to a plain Python dict for easy interop with pandas / polars.
    fn to_dict(&self) -> HashMap<String, f64> {
        let mut m = HashMap::new();
        m.insert("day".to_string(), f64::from(self.day));
        m.insert("total_people".to_string(), self.total_people as f64);
        m.insert("employed".to_string(), self.employed as f64);
        m.insert("unemployed".to_string(), self.unemployed as f64);
        m.insert("occupation_rate".to_string(), self.occupation_rate);
        m.insert("total_hired".to_string(), self.total_hired as f64);
        m.insert("total_fired".to_string(), self.total_fired as f64);
        m.insert("average_congestion".to_string(), self.average_congestion);
        m
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Run the simulation over the built-in city layout.
///
/// Args:
///     population: Number of residents to create.
///     transport_capacity_percentage: Share of nominal line capacity (1-100).
///     days: Number of whole days to simulate.
///     step_seconds: Logical seconds per clock advance.
///     seed: Random seed for reproducibility.
///
/// Returns:
///     A list of :class:`PyDayRecord` objects, one per day.
#[pyfunction]
#[pyo3(signature = (population=500, transport_capacity_percentage=100, days=7, step_seconds=60, seed=42))]
fn run_simulation(
    population: usize,
    transport_capacity_percentage: u32,
    days: u32,
    step_seconds: u32,
    seed: u64,
) -> PyResult<Vec<PyDayRecord>> {
    let config = SimulationConfig {
        population,
        transport_capacity_percentage,
        step_seconds,
        seed,
        ..SimulationConfig::default()
    };
    let reports = crate::run_simulation(CityLayout::default(), config, days)
        .map_err(|err| PyValueError::new_err(err.to_string()))?;
    Ok(reports.into_iter().map(PyDayRecord::from).collect())
}

/// Commuting city simulation core.
#[pymodule]
fn city_abm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDayRecord>()?;
    m.add_function(wrap_pyfunction!(run_simulation, m)?)?;
    Ok(())
}
