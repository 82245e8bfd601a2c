//! Rental property investment analysis.
//!
//! Turns a single [`rental::analysis::InvestmentInput`] into mortgage,
//! cashflow, sale-value, ROI and IRR figures, and runs the fixed stress
//! scenarios over the same inputs. Every calculation is a pure function
//! returning a [`ComputationOutput`] envelope.

pub mod error;
pub mod rental;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::RentalReturnsError;
pub use types::*;

/// Standard result type for all rental-returns operations
pub type RentalReturnsResult<T> = Result<T, RentalReturnsError>;
