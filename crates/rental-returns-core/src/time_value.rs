use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::RentalReturnsError;
use crate::types::{Money, Rate};
use crate::RentalReturnsResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_NEWTON_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const RATE_FLOOR: Rate = dec!(-0.99);
const RATE_CEILING: Rate = dec!(10.0);

/// Starting point for the Newton-Raphson IRR search.
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RentalReturnsResult<Money> {
    if rate <= dec!(-1) {
        return Err(RentalReturnsError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_and_slope(rate, cash_flows)
        .map(|(value, _)| value)
        .ok_or_else(|| overflow("cash_flows", "net present value"))
}

/// Internal Rate of Return.
///
/// Newton-Raphson from `guess`, falling back to bisection over
/// [-99%, 1000%] when Newton stalls or leaves the representable range.
/// Both stages are capped, so a series without a real root fails with
/// `NoConvergence` instead of looping.
pub fn irr(cash_flows: &[Money], guess: Rate) -> RentalReturnsResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(RentalReturnsError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_inflow || !has_outflow {
        // No sign change: NPV is monotone and never crosses zero
        return Err(RentalReturnsError::NoConvergence {
            function: "IRR".into(),
            iterations: 0,
            last_delta: cash_flows.iter().copied().sum(),
        });
    }

    if let Some(rate) = newton_raphson(cash_flows, guess) {
        return Ok(rate);
    }

    debug!(flows = cash_flows.len(), "IRR Newton-Raphson stalled, falling back to bisection");
    bisection(cash_flows)
}

/// Future Value
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> RentalReturnsResult<Money> {
    if rate.is_zero() {
        let total = pmt
            .checked_mul(Decimal::from(nper))
            .and_then(|paid| present_value.checked_add(paid))
            .ok_or_else(|| overflow("pmt", "future value of the payment stream"))?;
        return Ok(-total);
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| overflow("rate", "annuity factor"))?;

    let grown = present_value
        .checked_mul(factor)
        .ok_or_else(|| overflow("present_value", "compounded present value"))?;
    let annuity = pmt
        .checked_mul(annuity_factor)
        .ok_or_else(|| overflow("pmt", "compounded payment stream"))?;
    let total = grown
        .checked_add(annuity)
        .ok_or_else(|| overflow("pmt", "future value"))?;

    Ok(-total)
}

/// Level payment that fully amortizes `principal` over `nper` periods,
/// reported as a positive outgoing amount.
///
/// `principal * r / (1 - (1 + r)^-n)`, or `principal / n` at a zero rate.
pub fn loan_payment(principal: Money, periodic_rate: Rate, nper: u32) -> RentalReturnsResult<Money> {
    if nper == 0 {
        return Err(RentalReturnsError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if principal.is_zero() {
        return Ok(Decimal::ZERO);
    }

    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = growth_factor(periodic_rate, nper)?;
    let denominator = Decimal::ONE.checked_div(factor).map(|v| Decimal::ONE - v);
    let Some(denominator) = denominator.filter(|d| !d.is_zero()) else {
        return Err(RentalReturnsError::DivisionByZero {
            context: "loan payment annuity factor".into(),
        });
    };

    principal
        .checked_mul(periodic_rate)
        .and_then(|interest| interest.checked_div(denominator))
        .ok_or_else(|| overflow("principal", "level loan payment"))
}

/// Balance still owed after `payments_made` level payments: the future value
/// of the loan, positive while debt remains.
pub fn remaining_balance(
    principal: Money,
    periodic_rate: Rate,
    payment: Money,
    payments_made: u32,
) -> RentalReturnsResult<Money> {
    fv(periodic_rate, payments_made, payment, -principal)
}

/// `value * (1 + rate)^periods`
pub fn compound_growth(value: Money, rate: Rate, periods: u32) -> RentalReturnsResult<Money> {
    let factor = growth_factor(rate, periods)?;
    value
        .checked_mul(factor)
        .ok_or_else(|| RentalReturnsError::InvalidInput {
            field: "value".into(),
            reason: format!("{value} compounded at {rate} over {periods} periods overflows"),
        })
}

fn overflow(field: &str, quantity: &str) -> RentalReturnsError {
    RentalReturnsError::InvalidInput {
        field: field.into(),
        reason: format!("{quantity} is outside the representable range"),
    }
}

fn growth_factor(rate: Rate, periods: u32) -> RentalReturnsResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| RentalReturnsError::InvalidInput {
            field: "rate".into(),
            reason: format!("(1 + {rate})^{periods} is outside the representable range"),
        })
}

/// NPV and its derivative with respect to the rate. `None` when a term
/// overflows.
///
/// Flows are discounted by repeated multiplication with `1 / (1 + r)`, so at
/// high rates the factor decays toward zero rather than overflowing.
fn npv_and_slope(rate: Rate, cash_flows: &[Money]) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let per_period = Decimal::ONE.checked_div(one_plus_r)?;

    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(per_period)?;
        }
        let present = cf.checked_mul(discount)?;
        value = value.checked_add(present)?;
        if t > 0 {
            // d/dr [cf * (1+r)^-t] = -t * cf * (1+r)^-(t+1)
            let term = present
                .checked_mul(Decimal::from(t as u64))?
                .checked_mul(per_period)?;
            slope = slope.checked_sub(term)?;
        }
    }

    Some((value, slope))
}

fn newton_raphson(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    let mut rate = guess.clamp(RATE_FLOOR, RATE_CEILING);

    for i in 0..MAX_NEWTON_ITERATIONS {
        let (value, slope) = npv_and_slope(rate, cash_flows)?;

        if value.abs() < CONVERGENCE_THRESHOLD {
            debug!(iterations = i, %rate, "IRR converged by Newton-Raphson");
            return Some(rate);
        }

        if slope.is_zero() {
            return None;
        }

        rate = rate
            .checked_sub(value.checked_div(slope)?)?
            .clamp(RATE_FLOOR, RATE_CEILING);
    }

    None
}

/// Move a bracket end toward zero until NPV can be evaluated there.
fn evaluable_bound(cash_flows: &[Money], bound: Rate) -> Option<(Rate, Money)> {
    let mut rate = bound;
    for _ in 0..64 {
        if let Some((value, _)) = npv_and_slope(rate, cash_flows) {
            return Some((rate, value));
        }
        rate /= Decimal::TWO;
    }
    None
}

fn bisection(cash_flows: &[Money]) -> RentalReturnsResult<Rate> {
    let no_convergence = |iterations: u32, last_delta: Decimal| RentalReturnsError::NoConvergence {
        function: "IRR".into(),
        iterations,
        last_delta,
    };

    let (mut low, mut npv_low) =
        evaluable_bound(cash_flows, RATE_FLOOR).ok_or_else(|| no_convergence(0, Decimal::MAX))?;
    let (mut high, npv_high) =
        evaluable_bound(cash_flows, RATE_CEILING).ok_or_else(|| no_convergence(0, Decimal::MAX))?;

    if npv_low.abs() < CONVERGENCE_THRESHOLD {
        return Ok(low);
    }
    if npv_high.abs() < CONVERGENCE_THRESHOLD {
        return Ok(high);
    }
    if (npv_low > Decimal::ZERO) == (npv_high > Decimal::ZERO) {
        return Err(no_convergence(0, npv_low.abs().min(npv_high.abs())));
    }

    let mut last_delta = npv_low;
    for i in 1..=MAX_BISECTION_ITERATIONS {
        let mid = (low + high) / Decimal::TWO;
        let Some((npv_mid, _)) = npv_and_slope(mid, cash_flows) else {
            return Err(no_convergence(i, last_delta));
        };

        if npv_mid.abs() < CONVERGENCE_THRESHOLD {
            debug!(iterations = i, rate = %mid, "IRR converged by bisection");
            return Ok(mid);
        }

        if (npv_mid > Decimal::ZERO) == (npv_low > Decimal::ZERO) {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
        last_delta = npv_mid;
    }

    Err(no_convergence(MAX_BISECTION_ITERATIONS, last_delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(110)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        // IRR should be ~9.70%
        assert!((result - dec!(0.0970)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_single_period_exact() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        assert!((result - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_without_sign_change_fails() {
        let cfs = vec![dec!(100), dec!(200), dec!(300)];
        let err = irr(&cfs, DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, RentalReturnsError::NoConvergence { .. }));
    }

    #[test]
    fn test_irr_requires_two_flows() {
        let err = irr(&[dec!(-100)], DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, RentalReturnsError::InsufficientData(_)));
    }

    #[test]
    fn test_bisection_matches_newton() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let newton = newton_raphson(&cfs, DEFAULT_IRR_GUESS).unwrap();
        let bisected = bisection(&cfs).unwrap();
        assert!((newton - bisected).abs() < dec!(0.00001));
    }

    #[test]
    fn test_irr_deep_loss_uses_fallback_range() {
        // Lose 90% over one period: IRR = -90%
        let cfs = vec![dec!(-1000), dec!(100)];
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        assert!((result - dec!(-0.9)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_high_rate_over_long_series() {
        // 6000 a year for 40 years on 1000: close to a perpetuity, root at 600%
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(6000)).take(40));
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        assert!(
            (result - dec!(6.0)).abs() < dec!(0.000001),
            "Expected IRR of 6.0, got {result}"
        );
    }

    #[test]
    fn test_npv_at_high_rate_decays_instead_of_overflowing() {
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(6000)).take(40));
        // (1 + 9)^40 is far beyond Decimal range; the discounted sum is not
        let value = npv(dec!(9), &cfs).unwrap();
        assert!((value - dec!(-333.333333)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_fv_overflow_is_invalid_input() {
        let err = fv(dec!(0.5), 100, Decimal::ZERO, Decimal::MAX / dec!(2)).unwrap_err();
        assert!(matches!(err, RentalReturnsError::InvalidInput { .. }));

        let err = fv(Decimal::ZERO, 10, Decimal::MAX / dec!(2), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, RentalReturnsError::InvalidInput { .. }));
    }

    #[test]
    fn test_loan_payment_known_answer() {
        // 100,000 at 9.5% APR over 10 years
        let payment = loan_payment(dec!(100000), dec!(0.095) / dec!(12), 120).unwrap();
        assert!((payment - dec!(1293.98)).abs() < dec!(0.01));
    }

    #[test]
    fn test_loan_payment_zero_rate() {
        let payment = loan_payment(dec!(120000), Decimal::ZERO, 120).unwrap();
        assert_eq!(payment, dec!(1000));
    }

    #[test]
    fn test_loan_payment_zero_principal() {
        let payment = loan_payment(Decimal::ZERO, dec!(0.01), 360).unwrap();
        assert_eq!(payment, Decimal::ZERO);
    }

    #[test]
    fn test_loan_payment_zero_periods_rejected() {
        assert!(loan_payment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_remaining_balance_paid_off_at_term() {
        let rate = dec!(0.06) / dec!(12);
        let payment = loan_payment(dec!(200000), rate, 360).unwrap();
        let balance = remaining_balance(dec!(200000), rate, payment, 360).unwrap();
        assert!(balance.abs() < dec!(0.0001));
    }

    #[test]
    fn test_remaining_balance_zero_rate_is_linear() {
        let balance = remaining_balance(dec!(12000), Decimal::ZERO, dec!(100), 60).unwrap();
        assert_eq!(balance, dec!(6000));
    }

    #[test]
    fn test_remaining_balance_before_any_payment() {
        let rate = dec!(0.05) / dec!(12);
        let payment = loan_payment(dec!(50000), rate, 120).unwrap();
        let balance = remaining_balance(dec!(50000), rate, payment, 0).unwrap();
        assert_eq!(balance, dec!(50000));
    }

    #[test]
    fn test_compound_growth() {
        let grown = compound_growth(dec!(150000), dec!(0.05), 5).unwrap();
        assert!((grown - dec!(191442.234375)).abs() < dec!(0.000001));
        assert_eq!(compound_growth(dec!(150000), Decimal::ZERO, 30).unwrap(), dec!(150000));
    }
}
