use rental_returns_core::rental::analysis::{self, InvestmentInput, ReturnMetric};
use rental_returns_core::rental::insight::InsightVerdict;
use rental_returns_core::time_value;
use rental_returns_core::RentalReturnsError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn worked_example() -> InvestmentInput {
    InvestmentInput {
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

// ===========================================================================
// End-to-end worked example
// ===========================================================================

#[test]
fn test_worked_example_headline_figures() {
    let output = analysis::analyze_investment(&worked_example()).unwrap();
    let out = &output.result;

    assert_eq!(out.down_payment, dec!(45000));
    assert_eq!(out.loan_amount, dec!(105000));
    assert!(
        (out.monthly_mortgage_payment - dec!(1358.67)).abs() < dec!(0.01),
        "Expected payment ~1358.67, got {}",
        out.monthly_mortgage_payment
    );
    assert!(
        (out.net_monthly_cashflow - dec!(-468.67)).abs() < dec!(0.01),
        "Expected cashflow ~-468.67, got {}",
        out.net_monthly_cashflow
    );
    assert!((out.future_sale_price - dec!(191442.23)).abs() < dec!(0.01));
    assert_eq!(out.annual_cashflows.len(), 5);
}

#[test]
fn test_worked_example_returns() {
    let out = analysis::compute_investment(&worked_example()).unwrap();

    let roi = out.roi_pct.unwrap();
    assert!(
        (roi - dec!(92.57)).abs() < dec!(0.01),
        "Expected ROI ~92.57%, got {}",
        roi
    );

    let irr = out.irr.unwrap();
    assert!(
        irr > dec!(0.13) && irr < dec!(0.14),
        "Expected IRR ~13.4%, got {}",
        irr
    );
    assert_eq!(out.insight.verdict, InsightVerdict::NegativeCashflow);
}

#[test]
fn test_worked_example_envelope() {
    let output = analysis::analyze_investment(&worked_example()).unwrap();
    assert_eq!(output.assumptions["hold_years"], 5);
    assert_eq!(output.assumptions["return_metrics"], "Both");
    assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    assert!(!output.warnings.is_empty());
}

// ===========================================================================
// Amortization
// ===========================================================================

#[test]
fn test_amortization_reference_loan() {
    // 100,000 at 9.5% APR over 10 years: 100000 * r / (1 - (1+r)^-120)
    let input = InvestmentInput {
        purchase_price: dec!(100000),
        down_payment_pct: Decimal::ZERO,
        ..worked_example()
    };
    let out = analysis::compute_investment(&input).unwrap();
    assert_eq!(out.loan_amount, dec!(100000));
    assert!((out.monthly_mortgage_payment - dec!(1293.98)).abs() < dec!(0.01));
}

#[test]
fn test_zero_rate_payment_exact_for_any_term() {
    for term in [1u32, 15, 30] {
        let input = InvestmentInput {
            loan_rate_apr_pct: Decimal::ZERO,
            loan_term_years: term,
            ..worked_example()
        };
        let out = analysis::compute_investment(&input).unwrap();
        assert_eq!(
            out.monthly_mortgage_payment,
            out.loan_amount / Decimal::from(term * 12)
        );
    }
}

#[test]
fn test_full_down_payment_removes_mortgage() {
    let input = InvestmentInput {
        down_payment_pct: dec!(100),
        ..worked_example()
    };
    let out = analysis::compute_investment(&input).unwrap();
    assert_eq!(out.monthly_mortgage_payment, Decimal::ZERO);
    assert_eq!(out.net_monthly_cashflow, out.effective_rent - dec!(250));
}

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_round_trip_across_holds() {
    for hold_years in [1u32, 3, 5, 10, 20] {
        let input = InvestmentInput {
            hold_years,
            ..worked_example()
        };
        let exit = analysis::calculate_irr(&input).unwrap();
        let residual = time_value::npv(exit.irr, &exit.equity_cash_flows).unwrap();
        assert!(
            residual.abs() < dec!(0.0001),
            "NPV at IRR for {} year hold was {}",
            hold_years,
            residual
        );
    }
}

#[test]
fn test_irr_no_solution_reported_as_error() {
    let input = InvestmentInput {
        monthly_rent: Decimal::ZERO,
        appreciation_pct: dec!(-100),
        return_metrics: ReturnMetric::Irr,
        ..worked_example()
    };
    match analysis::analyze_investment(&input) {
        Err(RentalReturnsError::NoConvergence { function, .. }) => assert_eq!(function, "IRR"),
        other => panic!("expected NoConvergence, got {:?}", other.map(|o| o.result.irr)),
    }
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_hold_years_zero_is_invalid() {
    let input = InvestmentInput {
        hold_years: 0,
        ..worked_example()
    };
    assert!(matches!(
        analysis::analyze_investment(&input),
        Err(RentalReturnsError::InvalidInput { .. })
    ));
}

#[test]
fn test_negative_money_is_invalid() {
    let cases = [
        InvestmentInput {
            purchase_price: dec!(-150000),
            ..worked_example()
        },
        InvestmentInput {
            closing_cost: dec!(-1),
            ..worked_example()
        },
        InvestmentInput {
            monthly_expenses: dec!(-0.01),
            ..worked_example()
        },
    ];
    for input in &cases {
        assert!(matches!(
            analysis::compute_investment(input),
            Err(RentalReturnsError::InvalidInput { .. })
        ));
    }
}
