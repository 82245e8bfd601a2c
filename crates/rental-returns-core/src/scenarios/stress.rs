use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::rental::analysis::{compute_investment, InvestmentInput, ReturnMetric};
use crate::types::*;
use crate::RentalReturnsResult;

/// Upper bound on vacancy after a scenario adds to it.
pub const MAX_SCENARIO_VACANCY_PCT: Percent = dec!(40);

/// A named perturbation applied to the base inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioAdjustment {
    pub name: &'static str,
    pub rent_multiplier: Decimal,
    /// Percentage points added to vacancy
    pub vacancy_add_pct: Percent,
    /// Percentage points added to the loan APR
    pub rate_add_pct: Percent,
}

/// The fixed stress table, in display order.
pub const STANDARD_SCENARIOS: [ScenarioAdjustment; 4] = [
    ScenarioAdjustment {
        name: "Base",
        rent_multiplier: dec!(1.0),
        vacancy_add_pct: dec!(0),
        rate_add_pct: dec!(0),
    },
    ScenarioAdjustment {
        name: "Rent -10%",
        rent_multiplier: dec!(0.9),
        vacancy_add_pct: dec!(0),
        rate_add_pct: dec!(0),
    },
    ScenarioAdjustment {
        name: "Vacancy +5pp",
        rent_multiplier: dec!(1.0),
        vacancy_add_pct: dec!(5),
        rate_add_pct: dec!(0),
    },
    ScenarioAdjustment {
        name: "Rate +2pp",
        rent_multiplier: dec!(1.0),
        vacancy_add_pct: dec!(0),
        rate_add_pct: dec!(2),
    },
];

/// One row of the scenario comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub name: String,
    /// Gross monthly rent used
    pub monthly_rent: Money,
    /// Effective vacancy after adjustment and clamp
    pub vacancy_pct: Percent,
    /// Effective loan APR after adjustment
    pub loan_rate_apr_pct: Percent,
    /// Rounded to 2 dp
    pub monthly_mortgage_payment: Money,
    /// Rounded to 2 dp
    pub net_monthly_cashflow: Money,
    /// Rounded to 2 dp
    pub roi_pct: Option<Percent>,
}

/// Output of the stress scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub rows: Vec<ScenarioRow>,
}

/// Run the standard stress scenarios over `base`, wrapped with metadata.
pub fn generate_scenarios(
    base: &InvestmentInput,
) -> RentalReturnsResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if base.vacancy_pct > MAX_SCENARIO_VACANCY_PCT {
        warnings.push(format!(
            "Base vacancy {}% is above the {MAX_SCENARIO_VACANCY_PCT}% scenario cap; \
             vacancy scenarios are clamped below the base case",
            base.vacancy_pct
        ));
    }

    let rows = generate_scenario_rows(base)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental Stress Scenarios (rent, vacancy, rate)",
        &serde_json::json!({
            "base_inputs": base,
            "num_scenarios": STANDARD_SCENARIOS.len(),
            "max_vacancy_pct": MAX_SCENARIO_VACANCY_PCT.to_string(),
        }),
        warnings,
        elapsed,
        ScenarioOutput { rows },
    ))
}

/// Run the standard stress scenarios over `base`, one row per scenario in
/// table order.
pub fn generate_scenario_rows(base: &InvestmentInput) -> RentalReturnsResult<Vec<ScenarioRow>> {
    STANDARD_SCENARIOS
        .iter()
        .map(|adjustment| run_scenario(base, adjustment))
        .collect()
}

/// Apply one adjustment to a copy of `base`.
///
/// Scenarios only need cashflow and ROI, so IRR is never requested and a
/// non-converging exit cannot abort the table.
pub fn adjust_inputs(base: &InvestmentInput, adjustment: &ScenarioAdjustment) -> InvestmentInput {
    let vacancy_pct = if adjustment.vacancy_add_pct.is_zero() {
        base.vacancy_pct
    } else {
        (base.vacancy_pct + adjustment.vacancy_add_pct).min(MAX_SCENARIO_VACANCY_PCT)
    };

    InvestmentInput {
        // Saturate so an extreme base rate surfaces as InvalidInput downstream
        monthly_rent: base.monthly_rent.saturating_mul(adjustment.rent_multiplier),
        vacancy_pct,
        loan_rate_apr_pct: base.loan_rate_apr_pct.saturating_add(adjustment.rate_add_pct),
        return_metrics: ReturnMetric::Roi,
        ..base.clone()
    }
}

fn run_scenario(
    base: &InvestmentInput,
    adjustment: &ScenarioAdjustment,
) -> RentalReturnsResult<ScenarioRow> {
    let inputs = adjust_inputs(base, adjustment);
    let result = compute_investment(&inputs)?;

    debug!(
        scenario = adjustment.name,
        net_monthly_cashflow = %result.net_monthly_cashflow,
        "scenario evaluated"
    );

    Ok(ScenarioRow {
        name: adjustment.name.to_string(),
        monthly_rent: inputs.monthly_rent,
        vacancy_pct: inputs.vacancy_pct,
        loan_rate_apr_pct: inputs.loan_rate_apr_pct,
        monthly_mortgage_payment: result.monthly_mortgage_payment.round_dp(2),
        net_monthly_cashflow: result.net_monthly_cashflow.round_dp(2),
        roi_pct: result.roi_pct.map(|r| r.round_dp(2)),
    })
}
