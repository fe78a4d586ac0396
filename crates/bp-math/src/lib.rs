//! Budget Planner math utilities.

pub mod math;

pub use math::metrics::*;
pub use math::ols::{solve_min_norm, FitError, LinearModel};
pub use math::scaler::StandardScaler;
