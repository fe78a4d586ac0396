//! Core math modules.

pub mod metrics;
pub mod ols;
pub mod scaler;
