use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// IRR above which a cash-positive property counts as a strong investment.
const STRONG_IRR: Rate = dec!(0.15);

/// Qualitative verdict shown alongside the headline metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightVerdict {
    /// Monthly cashflow is negative; returns rely on appreciation
    NegativeCashflow,
    /// Cash-positive with IRR above 15%
    StrongReturn,
    /// Everything else
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentInsight {
    pub verdict: InsightVerdict,
    pub message: String,
}

/// Classify an analysed property. Negative cashflow dominates; a missing IRR
/// (ROI-only analysis) can never be strong.
pub fn classify(net_monthly_cashflow: Money, irr: Option<Rate>) -> InvestmentInsight {
    let verdict = if net_monthly_cashflow < Decimal::ZERO {
        InsightVerdict::NegativeCashflow
    } else if irr.is_some_and(|r| r > STRONG_IRR) {
        InsightVerdict::StrongReturn
    } else {
        InsightVerdict::Moderate
    };

    InvestmentInsight {
        verdict,
        message: verdict.message().to_string(),
    }
}

impl InsightVerdict {
    pub fn message(self) -> &'static str {
        match self {
            InsightVerdict::NegativeCashflow => {
                "Negative cashflow property. Investment depends on appreciation."
            }
            InsightVerdict::StrongReturn => "Strong investment profile with high IRR.",
            InsightVerdict::Moderate => "Moderate return profile with balanced risk.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_cashflow_dominates_high_irr() {
        let insight = classify(dec!(-10), Some(dec!(0.40)));
        assert_eq!(insight.verdict, InsightVerdict::NegativeCashflow);
        assert!(insight.message.starts_with("Negative cashflow"));
    }

    #[test]
    fn test_strong_return_above_threshold() {
        assert_eq!(
            classify(dec!(150), Some(dec!(0.1501))).verdict,
            InsightVerdict::StrongReturn
        );
    }

    #[test]
    fn test_threshold_itself_is_moderate() {
        assert_eq!(
            classify(dec!(150), Some(dec!(0.15))).verdict,
            InsightVerdict::Moderate
        );
    }

    #[test]
    fn test_zero_cashflow_without_irr_is_moderate() {
        assert_eq!(classify(Decimal::ZERO, None).verdict, InsightVerdict::Moderate);
    }
}
