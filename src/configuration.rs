use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub tolerance: f64,
    pub solver: Solver,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver: Solver::Microlp,
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solver {
    /// Use the microlp simplex solver, which covers both the continuous and
    /// the mixed integer problems built by this crate
    Microlp,
}
