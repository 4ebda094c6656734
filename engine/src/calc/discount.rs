// Discount summary for the generated contract. When the discount field
// was left empty but the cash price undercuts the total, the difference
// is taken as the discount.

use super::CalcEngine;
use crate::events::CalcEvent;
use serde::Serialize;
use shared::models::{CalculationContext, MoneyValue};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscountSummary {
    /// Discount as a percentage of the total, rounded to two decimals.
    pub percent: f64,
    /// The amount the contract is actually charged on.
    pub base: MoneyValue,
    pub discount: MoneyValue,
}

impl CalcEngine {
    pub fn derive_discount(&self, ctx: &CalculationContext) -> DiscountSummary {
        let total = ctx.total;
        let cash = ctx.cash_amount;
        let mut discount = ctx.discount;
        let mut base = total;

        if discount.is_zero() && !total.is_zero() && !cash.is_zero() && cash < total {
            discount = total.saturating_sub(cash);
            base = cash;
            self.emit(CalcEvent::DiscountInferred { discount });
        }

        let percent = if total.is_zero() {
            0.0
        } else {
            ((discount.cents() as f64 / total.cents() as f64) * 10000.0).round() / 100.0
        };

        DiscountSummary {
            percent,
            base,
            discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;
    use shared::models::PaymentMethod;

    fn ctx(total: i64, cash: i64, discount: i64) -> CalculationContext {
        let mut ctx = CalculationContext::new(PaymentMethod::Cash);
        ctx.total = MoneyValue::from_cents(total);
        ctx.cash_amount = MoneyValue::from_cents(cash);
        ctx.discount = MoneyValue::from_cents(discount);
        ctx
    }

    #[test]
    fn test_discount_inferred_from_cash_price() {
        let engine = CalcEngine::default();
        let recorder = RecordingObserver::new();
        engine.subscribe(Box::new(recorder.clone()));

        let summary = engine.derive_discount(&ctx(100000, 90000, 0));
        assert_eq!(summary.discount, MoneyValue::from_cents(10000));
        assert_eq!(summary.base, MoneyValue::from_cents(90000));
        assert_eq!(summary.percent, 10.0);
        assert_eq!(
            recorder.events(),
            vec![CalcEvent::DiscountInferred {
                discount: MoneyValue::from_cents(10000)
            }]
        );
    }

    #[test]
    fn test_explicit_discount_wins() {
        let engine = CalcEngine::default();
        let recorder = RecordingObserver::new();
        engine.subscribe(Box::new(recorder.clone()));

        let summary = engine.derive_discount(&ctx(100000, 90000, 5000));
        assert_eq!(summary.discount, MoneyValue::from_cents(5000));
        assert_eq!(summary.base, MoneyValue::from_cents(100000));
        assert_eq!(summary.percent, 5.0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_no_inference_when_cash_not_below_total() {
        let engine = CalcEngine::default();
        let summary = engine.derive_discount(&ctx(100000, 100000, 0));
        assert_eq!(summary.discount, MoneyValue::ZERO);
        assert_eq!(summary.percent, 0.0);
    }

    #[test]
    fn test_zero_total_yields_zero_percent() {
        let engine = CalcEngine::default();
        let summary = engine.derive_discount(&ctx(0, 0, 5000));
        assert_eq!(summary.percent, 0.0);
        assert_eq!(summary.discount, MoneyValue::from_cents(5000));
    }

    #[test]
    fn test_percent_rounds_to_two_decimals() {
        let engine = CalcEngine::default();
        // 1/3 of the total -> 33.33%
        let summary = engine.derive_discount(&ctx(30000, 20000, 0));
        assert_eq!(summary.percent, 33.33);
    }
}
