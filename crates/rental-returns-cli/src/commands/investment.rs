use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use rental_returns_core::rental::analysis::{self, InvestmentInput, ReturnMetric};
use rental_returns_core::scenarios::stress;

use crate::input;

/// Property, rental and financing inputs shared by `analyze` and `scenarios`.
///
/// Flag defaults describe a 150k property bought with 30% down.
#[derive(Args)]
pub struct PropertyArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long, default_value = "150000")]
    pub purchase_price: Decimal,

    /// Renovation cost
    #[arg(long, default_value = "15000")]
    pub renovation_cost: Decimal,

    /// Closing / legal costs
    #[arg(long, default_value = "3000")]
    pub closing_cost: Decimal,

    /// Monthly rent
    #[arg(long, default_value = "1200")]
    pub monthly_rent: Decimal,

    /// Monthly operating expenses
    #[arg(long, default_value = "250")]
    pub monthly_expenses: Decimal,

    /// Vacancy, percent of rent
    #[arg(long, default_value = "5")]
    pub vacancy_pct: Decimal,

    /// Down payment, percent of purchase price
    #[arg(long, default_value = "30")]
    pub down_payment_pct: Decimal,

    /// Loan rate, APR percent
    #[arg(long, default_value = "9.5")]
    pub loan_rate_pct: Decimal,

    /// Loan term in years
    #[arg(long, default_value_t = 10)]
    pub loan_term_years: u32,

    /// Annual appreciation percent (may be negative)
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    pub appreciation_pct: Decimal,

    /// Hold period in years
    #[arg(long, default_value_t = 5)]
    pub hold_years: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricsArg {
    Roi,
    Irr,
    Both,
}

impl From<MetricsArg> for ReturnMetric {
    fn from(arg: MetricsArg) -> Self {
        match arg {
            MetricsArg::Roi => ReturnMetric::Roi,
            MetricsArg::Irr => ReturnMetric::Irr,
            MetricsArg::Both => ReturnMetric::Both,
        }
    }
}

/// Arguments for a full property analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub property: PropertyArgs,

    /// Return variant(s) to compute (overrides the input file)
    #[arg(long, value_enum)]
    pub metrics: Option<MetricsArg>,
}

/// Arguments for the stress scenario table
#[derive(Args)]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub property: PropertyArgs,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut investment_input = resolve_input(args.property)?;
    if let Some(metrics) = args.metrics {
        investment_input.return_metrics = metrics.into();
    }
    let result = analysis::analyze_investment(&investment_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment_input = resolve_input(args.property)?;
    let result = stress::generate_scenarios(&investment_input)?;
    Ok(serde_json::to_value(result)?)
}

/// File beats stdin, stdin beats flags.
fn resolve_input(args: PropertyArgs) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    let piped = if args.input.is_none() {
        input::stdin::read_stdin()?
    } else {
        None
    };
    select_input(args, piped)
}

fn select_input(
    args: PropertyArgs,
    piped: Option<InvestmentInput>,
) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        debug!(path = %path, "reading property inputs from file");
        return input::file::read_structured(path);
    }
    if let Some(piped) = piped {
        debug!("reading property inputs from stdin");
        return Ok(piped);
    }

    debug!("building property inputs from flags");
    Ok(InvestmentInput {
        purchase_price: args.purchase_price,
        renovation_cost: args.renovation_cost,
        closing_cost: args.closing_cost,
        monthly_rent: args.monthly_rent,
        monthly_expenses: args.monthly_expenses,
        vacancy_pct: args.vacancy_pct,
        down_payment_pct: args.down_payment_pct,
        loan_rate_apr_pct: args.loan_rate_pct,
        loan_term_years: args.loan_term_years,
        appreciation_pct: args.appreciation_pct,
        hold_years: args.hold_years,
        return_metrics: ReturnMetric::default(),
    })
}
