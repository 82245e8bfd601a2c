use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use rental_returns_core::time_value;

use crate::input;

/// Arguments for a loan payment calculation
#[derive(Args)]
pub struct MortgageArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual rate, APR percent (e.g. 6.5)
    #[arg(long)]
    pub rate_pct: Decimal,

    /// Term in years
    #[arg(long)]
    pub term_years: u32,
}

/// Arguments for an IRR calculation
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON or YAML file with `cash_flows` (and optional `guess`)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows (comma-separated, e.g. "-1000,400,400,400")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting guess for the solver, as a decimal rate
    #[arg(long, allow_hyphen_values = true)]
    pub guess: Option<Decimal>,
}

#[derive(Deserialize)]
struct IrrInput {
    cash_flows: Vec<Decimal>,
    #[serde(default)]
    guess: Option<Decimal>,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let months = args
        .term_years
        .checked_mul(12)
        .ok_or("--term-years is too large")?;
    let monthly_rate = args.rate_pct / Decimal::ONE_HUNDRED / Decimal::from(12);
    let payment = time_value::loan_payment(args.principal, monthly_rate, months)?;
    let total_paid = payment
        .checked_mul(Decimal::from(months))
        .ok_or("total paid overflows the decimal range")?;
    let total_interest = total_paid
        .checked_sub(args.principal)
        .ok_or("total interest overflows the decimal range")?;

    Ok(json!({
        "result": {
            "principal": args.principal,
            "rate_pct": args.rate_pct,
            "term_months": months,
            "monthly_payment": payment.round_dp(2),
            "total_paid": total_paid.round_dp(2),
            "total_interest": total_interest.round_dp(2),
        }
    }))
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        IrrInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            guess: args.guess,
        }
    };

    let guess = irr_input.guess.unwrap_or(time_value::DEFAULT_IRR_GUESS);
    let irr = time_value::irr(&irr_input.cash_flows, guess)?;
    let residual = time_value::npv(irr, &irr_input.cash_flows)?;

    Ok(json!({
        "result": {
            "irr": irr,
            "npv_at_irr": residual,
            "periods": irr_input.cash_flows.len(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;
    use rust_decimal_macros::dec;
    use std::fs;

    #[test]
    fn test_mortgage_result_shape() {
        let cli = Cli::try_parse_from([
            "rra",
            "mortgage",
            "--principal",
            "105000",
            "--rate-pct",
            "9.5",
            "--term-years",
            "10",
        ])
        .unwrap();
        let Commands::Mortgage(args) = cli.command else {
            panic!("expected the mortgage subcommand");
        };
        let value = run_mortgage(args).unwrap();
        let result = &value["result"];

        assert_eq!(result["term_months"], 120);
        let payment: Decimal = serde_json::from_value(result["monthly_payment"].clone()).unwrap();
        assert_eq!(payment, dec!(1358.67));
        let total_paid: Decimal = serde_json::from_value(result["total_paid"].clone()).unwrap();
        let interest: Decimal = serde_json::from_value(result["total_interest"].clone()).unwrap();
        assert!((total_paid - interest - dec!(105000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_mortgage_zero_term_rejected() {
        let args = MortgageArgs {
            principal: dec!(1000),
            rate_pct: dec!(5),
            term_years: 0,
        };
        assert!(run_mortgage(args).is_err());
    }

    #[test]
    fn test_irr_result_shape_from_file() {
        let path = std::env::temp_dir().join(format!("rra-irr-{}.yaml", std::process::id()));
        fs::write(&path, "cash_flows: [-100, 110]\n").unwrap();
        let args = IrrArgs {
            input: Some(path.to_str().unwrap().to_string()),
            cash_flows: None,
            guess: None,
        };
        let value = run_irr(args).unwrap();
        fs::remove_file(path).ok();

        let result = &value["result"];
        assert_eq!(result["periods"], 2);
        let irr: Decimal = serde_json::from_value(result["irr"].clone()).unwrap();
        assert!((irr - dec!(0.10)).abs() < dec!(0.000001));
        let residual: Decimal = serde_json::from_value(result["npv_at_irr"].clone()).unwrap();
        assert!(residual.abs() < dec!(0.0000001));
    }
}
