use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use rental_returns_core::rental::analysis::{self, InvestmentInput};
use rental_returns_core::scenarios::stress;
use rental_returns_core::time_value;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, raw: &str) -> NapiResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Rental analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    let input: InvestmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analysis::analyze_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_scenarios(input_json: String) -> NapiResult<String> {
    let input: InvestmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = stress::generate_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value
// ---------------------------------------------------------------------------

/// Monthly payment as a decimal string. Amounts are passed as strings to
/// keep full decimal precision across the JS boundary.
#[napi]
pub fn mortgage_payment(principal: String, rate_pct: String, term_years: u32) -> NapiResult<String> {
    let principal = parse_decimal("principal", &principal)?;
    let rate_pct = parse_decimal("rate_pct", &rate_pct)?;
    let months = term_years
        .checked_mul(12)
        .ok_or_else(|| to_napi_error("term_years is too large"))?;
    let monthly_rate = rate_pct / Decimal::ONE_HUNDRED / Decimal::from(12);
    let payment = time_value::loan_payment(principal, monthly_rate, months).map_err(to_napi_error)?;
    Ok(payment.to_string())
}

#[derive(Deserialize)]
struct IrrRequest {
    cash_flows: Vec<Decimal>,
    #[serde(default)]
    guess: Option<Decimal>,
}

/// IRR of `{"cash_flows": [...], "guess": ...}` as a decimal string.
#[napi]
pub fn internal_rate_of_return(input_json: String) -> NapiResult<String> {
    let request: IrrRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let guess = request.guess.unwrap_or(time_value::DEFAULT_IRR_GUESS);
    let irr = time_value::irr(&request.cash_flows, guess).map_err(to_napi_error)?;
    Ok(irr.to_string())
}
