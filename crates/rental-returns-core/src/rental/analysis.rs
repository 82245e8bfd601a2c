use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::RentalReturnsError;
use crate::rental::insight::{self, InvestmentInsight};
use crate::time_value;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::RentalReturnsResult;

/// Selling costs at exit as a share of the sale price.
const SALE_COST_RATE: Rate = dec!(0.03);

/// Floor for the ROI cost base so the ratio stays defined with nothing invested.
const MIN_COST_BASE: Money = dec!(1);

/// Vacancy above this is outside what the rental inputs normally allow.
const HIGH_VACANCY_PCT: Percent = dec!(30);

/// Longest holding period analysed; bounds the per-year cashflow series.
pub const MAX_HOLD_YEARS: u32 = 100;

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which return variant(s) an analysis computes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnMetric {
    /// Simple ROI on cash invested (ignores loan paydown)
    Roi,
    /// IRR on equity including net sale proceeds at exit
    Irr,
    /// Both variants from the same projection
    #[default]
    Both,
}

impl ReturnMetric {
    fn includes_roi(self) -> bool {
        matches!(self, ReturnMetric::Roi | ReturnMetric::Both)
    }

    fn includes_irr(self) -> bool {
        matches!(self, ReturnMetric::Irr | ReturnMetric::Both)
    }
}

/// Input parameters for a single-property rental analysis.
///
/// Percentages are on a 0-100 scale, as a user would type them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
    /// Acquisition price of the property
    pub purchase_price: Money,
    /// Up-front renovation spend
    pub renovation_cost: Money,
    /// Closing and legal costs at acquisition
    pub closing_cost: Money,
    /// Gross monthly rent at full occupancy
    pub monthly_rent: Money,
    /// Monthly operating expenses (management, insurance, maintenance)
    pub monthly_expenses: Money,
    /// Share of rent lost to vacancy, 0-100
    pub vacancy_pct: Percent,
    /// Down payment as a share of the purchase price, 0-100
    pub down_payment_pct: Percent,
    /// Nominal annual mortgage rate, compounded monthly
    pub loan_rate_apr_pct: Percent,
    /// Mortgage amortization term
    pub loan_term_years: u32,
    /// Annual price appreciation (may be negative)
    pub appreciation_pct: Percent,
    /// Years until the property is sold
    pub hold_years: u32,
    /// Return variant(s) to compute
    #[serde(default)]
    pub return_metrics: ReturnMetric,
}

impl Default for InvestmentInput {
    fn default() -> Self {
        Self {
            purchase_price: dec!(150000),
            renovation_cost: dec!(15000),
            closing_cost: dec!(3000),
            monthly_rent: dec!(1200),
            monthly_expenses: dec!(250),
            vacancy_pct: dec!(5),
            down_payment_pct: dec!(30),
            loan_rate_apr_pct: dec!(9.5),
            loan_term_years: 10,
            appreciation_pct: dec!(5),
            hold_years: 5,
            return_metrics: ReturnMetric::Both,
        }
    }
}

/// Figures shared by the ROI and IRR variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowProjection {
    /// Purchase + renovation + closing
    pub total_cost: Money,
    /// Down payment (share of purchase price only)
    pub down_payment: Money,
    /// Financed amount, never negative
    pub loan_amount: Money,
    /// APR / 12 as a decimal
    pub monthly_rate: Rate,
    /// Loan term in months
    pub num_payments: u32,
    pub monthly_mortgage_payment: Money,
    /// Rent after vacancy loss
    pub effective_rent: Money,
    pub net_monthly_cashflow: Money,
    pub net_annual_cashflow: Money,
    /// Flat operating cashflow for each year held
    pub annual_cashflows: Vec<Money>,
    /// Purchase price compounded at the appreciation rate over the hold
    pub future_sale_price: Money,
}

/// Simplified ROI: the full loan is treated as still outstanding at sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiBreakdown {
    /// Debt assumed repaid at sale (the original loan amount)
    pub remaining_debt_approx: Money,
    /// Held cashflow plus sale price net of debt
    pub profit_estimate: Money,
    /// Down payment + renovation + closing, floored at 1
    pub cost_base: Money,
    pub roi_pct: Percent,
}

/// Exit and equity-return figures for the IRR variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAnalysis {
    /// Loan balance after the hold period's payments
    pub remaining_balance: Money,
    /// Selling costs at 3% of the sale price
    pub sale_costs: Money,
    /// Sale price less remaining balance and selling costs
    pub net_sale_proceeds: Money,
    /// -down payment, then each year's cashflow; final year includes sale proceeds
    pub equity_cash_flows: Vec<Money>,
    pub irr: Rate,
}

/// Complete rental analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub total_cost: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_mortgage_payment: Money,
    pub effective_rent: Money,
    pub net_monthly_cashflow: Money,
    pub net_annual_cashflow: Money,
    pub future_sale_price: Money,
    /// Operating cashflow per year held (sale proceeds are in `exit`)
    pub annual_cashflows: Vec<Money>,
    /// ROI in percent, when the ROI variant was requested
    pub roi_pct: Option<Percent>,
    /// IRR as a decimal rate, when the IRR variant was requested
    pub irr: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_breakdown: Option<RoiBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitAnalysis>,
    pub insight: InvestmentInsight,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse a rental property: financing, cashflow, sale value and the
/// requested return variant(s).
///
/// Fails with `InvalidInput` for out-of-range inputs and with
/// `NoConvergence` when IRR is requested but has no solution.
pub fn analyze_investment(
    input: &InvestmentInput,
) -> RentalReturnsResult<ComputationOutput<InvestmentResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, &mut warnings)?;
    let result = build_result(input, &mut warnings)?;

    debug!(
        net_monthly_cashflow = %result.net_monthly_cashflow,
        roi_pct = ?result.roi_pct,
        irr = ?result.irr,
        "rental analysis complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental Property Cashflow, ROI and IRR Analysis",
        input,
        warnings,
        elapsed,
        result,
    ))
}

/// Same figures as [`analyze_investment`] without the envelope.
pub fn compute_investment(input: &InvestmentInput) -> RentalReturnsResult<InvestmentResult> {
    let mut warnings = Vec::new();
    validate_input(input, &mut warnings)?;
    build_result(input, &mut warnings)
}

/// Financing and operating projection shared by both return variants.
pub fn project_cashflows(input: &InvestmentInput) -> RentalReturnsResult<CashflowProjection> {
    validate_input(input, &mut Vec::new())?;
    project(input)
}

/// ROI variant on its own.
pub fn calculate_roi(input: &InvestmentInput) -> RentalReturnsResult<RoiBreakdown> {
    validate_input(input, &mut Vec::new())?;
    let projection = project(input)?;
    roi_breakdown(input, &projection)
}

/// IRR variant on its own.
pub fn calculate_irr(input: &InvestmentInput) -> RentalReturnsResult<ExitAnalysis> {
    validate_input(input, &mut Vec::new())?;
    let projection = project(input)?;
    exit_analysis(input, &projection)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &InvestmentInput, warnings: &mut Vec<String>) -> RentalReturnsResult<()> {
    let money_fields = [
        ("purchase_price", input.purchase_price),
        ("renovation_cost", input.renovation_cost),
        ("closing_cost", input.closing_cost),
        ("monthly_rent", input.monthly_rent),
        ("monthly_expenses", input.monthly_expenses),
    ];
    for (field, value) in money_fields {
        if value < Decimal::ZERO {
            return Err(RentalReturnsError::invalid(
                field,
                format!("Must be non-negative (got {value})"),
            ));
        }
    }

    for (field, value) in [
        ("vacancy_pct", input.vacancy_pct),
        ("down_payment_pct", input.down_payment_pct),
    ] {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(RentalReturnsError::invalid(
                field,
                format!("Percentage must be between 0 and 100 (got {value})"),
            ));
        }
    }

    if input.loan_rate_apr_pct < Decimal::ZERO {
        return Err(RentalReturnsError::invalid(
            "loan_rate_apr_pct",
            "Loan rate must be non-negative",
        ));
    }

    if input.loan_term_years < 1 {
        return Err(RentalReturnsError::invalid(
            "loan_term_years",
            "Loan term must be at least 1 year",
        ));
    }

    if input.hold_years < 1 {
        return Err(RentalReturnsError::invalid(
            "hold_years",
            "Holding period must be at least 1 year",
        ));
    }

    if input.hold_years > MAX_HOLD_YEARS {
        return Err(RentalReturnsError::invalid(
            "hold_years",
            format!(
                "Holding period must be at most {MAX_HOLD_YEARS} years (got {})",
                input.hold_years
            ),
        ));
    }

    for (field, years) in [
        ("loan_term_years", input.loan_term_years),
        ("hold_years", input.hold_years),
    ] {
        if years.checked_mul(MONTHS_PER_YEAR).is_none() {
            return Err(RentalReturnsError::invalid(
                field,
                format!("{years} years cannot be expressed in months"),
            ));
        }
    }

    // --- Warnings for unusual inputs ---
    if input.vacancy_pct > HIGH_VACANCY_PCT {
        warnings.push(format!(
            "Vacancy {}% exceeds {HIGH_VACANCY_PCT}% — far above typical rental markets",
            input.vacancy_pct
        ));
    }

    if input.return_metrics.includes_irr() && input.hold_years > input.loan_term_years {
        warnings.push(format!(
            "Hold period ({} years) outlasts the loan term ({} years); remaining balance \
             continues the amortization formula past payoff",
            input.hold_years, input.loan_term_years
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

fn project(input: &InvestmentInput) -> RentalReturnsResult<CashflowProjection> {
    let total_cost = checked(
        "purchase_price",
        input
            .purchase_price
            .checked_add(input.renovation_cost)
            .and_then(|sum| sum.checked_add(input.closing_cost)),
    )?;

    // Down payment is taken on the purchase price alone, not total cost
    let down_payment = checked(
        "down_payment_pct",
        input.purchase_price.checked_mul(pct_to_rate(input.down_payment_pct)),
    )?;
    let loan_amount = (input.purchase_price - down_payment).max(Decimal::ZERO);

    let monthly_rate = pct_to_rate(input.loan_rate_apr_pct) / Decimal::from(MONTHS_PER_YEAR);
    let num_payments = months(input.loan_term_years, "loan_term_years")?;
    let monthly_mortgage_payment = time_value::loan_payment(loan_amount, monthly_rate, num_payments)?;

    let effective_rent = checked(
        "monthly_rent",
        input
            .monthly_rent
            .checked_mul(Decimal::ONE - pct_to_rate(input.vacancy_pct)),
    )?;
    let net_monthly_cashflow = checked(
        "monthly_expenses",
        effective_rent
            .checked_sub(input.monthly_expenses)
            .and_then(|net| net.checked_sub(monthly_mortgage_payment)),
    )?;
    let net_annual_cashflow = checked(
        "monthly_rent",
        net_monthly_cashflow.checked_mul(Decimal::from(MONTHS_PER_YEAR)),
    )?;
    let annual_cashflows = vec![net_annual_cashflow; input.hold_years as usize];

    let future_sale_price = time_value::compound_growth(
        input.purchase_price,
        pct_to_rate(input.appreciation_pct),
        input.hold_years,
    )?;

    Ok(CashflowProjection {
        total_cost,
        down_payment,
        loan_amount,
        monthly_rate,
        num_payments,
        monthly_mortgage_payment,
        effective_rent,
        net_monthly_cashflow,
        net_annual_cashflow,
        annual_cashflows,
        future_sale_price,
    })
}

fn months(years: u32, field: &str) -> RentalReturnsResult<u32> {
    years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| RentalReturnsError::invalid(field, "Too many years to count in months"))
}

/// Map a checked-arithmetic result onto `InvalidInput` for `field`.
fn checked(field: &str, value: Option<Decimal>) -> RentalReturnsResult<Decimal> {
    value.ok_or_else(|| {
        RentalReturnsError::invalid(
            field,
            "A value derived from this input overflows the decimal range",
        )
    })
}

/// Down payment + renovation + closing, before the ROI floor.
fn cash_invested(
    input: &InvestmentInput,
    projection: &CashflowProjection,
) -> RentalReturnsResult<Money> {
    checked(
        "renovation_cost",
        projection
            .down_payment
            .checked_add(input.renovation_cost)
            .and_then(|sum| sum.checked_add(input.closing_cost)),
    )
}

// ---------------------------------------------------------------------------
// Return variants
// ---------------------------------------------------------------------------

fn roi_breakdown(
    input: &InvestmentInput,
    projection: &CashflowProjection,
) -> RentalReturnsResult<RoiBreakdown> {
    // The loan is assumed fully outstanding at sale; paydown is ignored
    let remaining_debt_approx = projection.loan_amount;
    let held_cashflow = projection
        .net_annual_cashflow
        .checked_mul(Decimal::from(input.hold_years));
    let profit_estimate = checked(
        "purchase_price",
        projection
            .future_sale_price
            .checked_sub(remaining_debt_approx)
            .zip(held_cashflow)
            .and_then(|(equity, held)| held.checked_add(equity)),
    )?;
    let cost_base = cash_invested(input, projection)?.max(MIN_COST_BASE);
    let roi_pct = checked(
        "purchase_price",
        (profit_estimate / cost_base).checked_mul(Decimal::ONE_HUNDRED),
    )?;

    Ok(RoiBreakdown {
        remaining_debt_approx,
        profit_estimate,
        cost_base,
        roi_pct,
    })
}

fn exit_analysis(
    input: &InvestmentInput,
    projection: &CashflowProjection,
) -> RentalReturnsResult<ExitAnalysis> {
    let hold_months = months(input.hold_years, "hold_years")?;
    let remaining_balance = time_value::remaining_balance(
        projection.loan_amount,
        projection.monthly_rate,
        projection.monthly_mortgage_payment,
        hold_months,
    )?;

    let sale_costs = projection.future_sale_price * SALE_COST_RATE;
    let net_sale_proceeds = checked(
        "hold_years",
        projection
            .future_sale_price
            .checked_sub(remaining_balance)
            .and_then(|net| net.checked_sub(sale_costs)),
    )?;

    let mut equity_cash_flows = Vec::with_capacity(projection.annual_cashflows.len() + 1);
    equity_cash_flows.push(-projection.down_payment);
    equity_cash_flows.extend_from_slice(&projection.annual_cashflows);
    if let Some(final_year) = equity_cash_flows.last_mut() {
        *final_year = checked("hold_years", final_year.checked_add(net_sale_proceeds))?;
    }

    let irr = time_value::irr(&equity_cash_flows, time_value::DEFAULT_IRR_GUESS)?;

    Ok(ExitAnalysis {
        remaining_balance,
        sale_costs,
        net_sale_proceeds,
        equity_cash_flows,
        irr,
    })
}

fn build_result(
    input: &InvestmentInput,
    warnings: &mut Vec<String>,
) -> RentalReturnsResult<InvestmentResult> {
    let projection = project(input)?;

    let roi_breakdown = if input.return_metrics.includes_roi() {
        let invested = cash_invested(input, &projection)?;
        if invested < MIN_COST_BASE {
            warnings.push(format!(
                "Cash invested ({invested}) is below {MIN_COST_BASE}; ROI cost base floored"
            ));
        }
        Some(roi_breakdown(input, &projection)?)
    } else {
        None
    };

    let exit = if input.return_metrics.includes_irr() {
        Some(exit_analysis(input, &projection)?)
    } else {
        None
    };

    if projection.net_monthly_cashflow < Decimal::ZERO {
        warnings.push(format!(
            "Net monthly cashflow is negative ({}) — returns depend on appreciation",
            projection.net_monthly_cashflow.round_dp(2)
        ));
    }

    let roi_pct = roi_breakdown.as_ref().map(|r| r.roi_pct);
    let irr = exit.as_ref().map(|e| e.irr);
    let insight = insight::classify(projection.net_monthly_cashflow, irr);

    Ok(InvestmentResult {
        total_cost: projection.total_cost,
        down_payment: projection.down_payment,
        loan_amount: projection.loan_amount,
        monthly_mortgage_payment: projection.monthly_mortgage_payment,
        effective_rent: projection.effective_rent,
        net_monthly_cashflow: projection.net_monthly_cashflow,
        net_annual_cashflow: projection.net_annual_cashflow,
        future_sale_price: projection.future_sale_price,
        annual_cashflows: projection.annual_cashflows,
        roi_pct,
        irr,
        roi_breakdown,
        exit,
        insight,
    })
}
