//! Synchronous flight-planning computations.
//!
//! Nothing in here performs I/O. Every function returns a typed
//! [`ComputationError`] to its immediate caller; stores wrap these into
//! service errors.

pub mod fuel;
pub mod geodesy;
pub mod performance;
pub mod route;
pub mod weight_balance;

#[cfg(test)]
#[path = "route_tests.rs"]
mod route_tests;

pub use fuel::{plan_fuel, FlightRules, FuelPlan, FuelPlanInput, ReservePolicy};
pub use performance::{PerformanceCalculation, PerformanceCalculator, PerformanceKind};
pub use route::RouteCalculator;
pub use weight_balance::{classify_cg, compute_landing_loading, compute_loading, limits_at};

/// Result type for computations.
pub type ComputationResult<T> = Result<T, ComputationError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComputationError {
    /// Structural violation of an input, naming the offending field.
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Total weight is zero or negative, CG is undefined.
    #[error("CG undefined: total weight {total_weight} is not positive")]
    DivisionUndefined { total_weight: f64 },

    /// Weight outside the weights the CG envelope defines.
    #[error("Weight {weight} outside CG envelope range [{min}, {max}]")]
    EnvelopeRangeExceeded { weight: f64, min: f64, max: f64 },

    /// Query outside the tabulated bounds of a performance table.
    #[error("Performance data out of range for {table}: {detail}")]
    PerformanceDataOutOfRange { table: String, detail: String },

    /// Running fuel goes negative before reaching a waypoint.
    #[error("Fuel exhausted on leg {leg_index} before reaching {waypoint} (short by {shortfall:.1})")]
    FuelExhausted {
        leg_index: usize,
        waypoint: String,
        shortfall: f64,
    },

    /// Fuel on board does not cover trip plus reserves.
    #[error("Insufficient fuel: {required:.1} required, {available:.1} available")]
    InsufficientFuel { required: f64, available: f64 },
}

impl ComputationError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn out_of_range(table: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::PerformanceDataOutOfRange {
            table: table.into(),
            detail: detail.into(),
        }
    }
}
