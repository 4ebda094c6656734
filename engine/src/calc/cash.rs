// Cash payment: total and the cash amount mirror each other. Whichever
// side is present fills the other; when both are present and disagree,
// the total is authoritative and the cash amount is corrected.

use super::{CalcEngine, F_CASH_FROM_TOTAL, F_TOTAL_FROM_CASH};
use shared::models::{CalculationContext, ChangeSet, FieldSlot, RecomputeMode};

pub(super) fn recompute(
    engine: &CalcEngine,
    ctx: &CalculationContext,
    mode: RecomputeMode,
    changes: &mut ChangeSet,
) {
    let total = ctx.total;
    let cash = ctx.cash_amount;

    if !total.is_zero() && cash.is_zero() {
        engine.write_money(ctx, mode, changes, FieldSlot::CashAmount, total, F_CASH_FROM_TOTAL);
    } else if !cash.is_zero() && total.is_zero() {
        engine.write_money(ctx, mode, changes, FieldSlot::Total, cash, F_TOTAL_FROM_CASH);
    } else if !total.is_zero() && !cash.is_zero() {
        // stale cash amount follows the total; a no-op when consistent
        engine.write_money(ctx, mode, changes, FieldSlot::CashAmount, total, F_CASH_FROM_TOTAL);
    }
}

#[cfg(test)]
mod tests {
    use crate::calc::CalcEngine;
    use crate::events::{CalcEvent, RecordingObserver};
    use shared::models::{
        CalculationContext, FieldSlot, MoneyValue, PaymentMethod, RecomputeMode, SlotValue,
    };

    fn ctx(total_cents: i64, cash_cents: i64) -> CalculationContext {
        let mut ctx = CalculationContext::new(PaymentMethod::Cash);
        ctx.total = MoneyValue::from_cents(total_cents);
        ctx.cash_amount = MoneyValue::from_cents(cash_cents);
        ctx
    }

    #[test]
    fn test_cash_fills_from_total() {
        let engine = CalcEngine::default();
        let recorder = RecordingObserver::new();
        engine.subscribe(Box::new(recorder.clone()));

        let changes = engine.recompute(&ctx(10000, 0), RecomputeMode::Quiet);
        let writes: Vec<_> = changes.iter().collect();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].slot, FieldSlot::CashAmount);
        assert_eq!(writes[0].value, SlotValue::Money(MoneyValue::from_cents(10000)));

        assert!(matches!(
            recorder.events()[0],
            CalcEvent::ValueUpdated {
                slot: FieldSlot::CashAmount,
                ..
            }
        ));
    }

    #[test]
    fn test_cash_fills_total_from_cash() {
        let engine = CalcEngine::default();
        let changes = engine.recompute(&ctx(0, 10000), RecomputeMode::Quiet);
        let writes: Vec<_> = changes.iter().collect();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].slot, FieldSlot::Total);
        assert_eq!(writes[0].value, SlotValue::Money(MoneyValue::from_cents(10000)));
    }

    #[test]
    fn test_cash_forced_corrects_stale_cash_amount() {
        let engine = CalcEngine::default();
        let changes = engine.recompute(&ctx(10000, 9000), RecomputeMode::Forced);
        let writes: Vec<_> = changes.iter().collect();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].slot, FieldSlot::CashAmount);
        assert_eq!(writes[0].value, SlotValue::Money(MoneyValue::from_cents(10000)));
    }

    #[test]
    fn test_cash_quiet_inconsistency_only_suggests() {
        let engine = CalcEngine::default();
        let recorder = RecordingObserver::new();
        engine.subscribe(Box::new(recorder.clone()));

        let changes = engine.recompute(&ctx(10000, 9000), RecomputeMode::Quiet);
        assert!(changes.is_empty());
        assert_eq!(
            recorder.events(),
            vec![CalcEvent::SuggestionAvailable {
                slot: FieldSlot::CashAmount,
                suggested: SlotValue::Money(MoneyValue::from_cents(10000)),
                formula: "cash = total".to_string(),
            }]
        );
    }

    #[test]
    fn test_cash_consistent_or_empty_pair_is_stable() {
        let engine = CalcEngine::default();
        assert!(engine.recompute(&ctx(10000, 10000), RecomputeMode::Forced).is_empty());
        assert!(engine.recompute(&ctx(0, 0), RecomputeMode::Quiet).is_empty());
    }

    #[test]
    fn test_cash_locked_target_only_suggests() {
        let engine = CalcEngine::default();
        let recorder = RecordingObserver::new();
        engine.subscribe(Box::new(recorder.clone()));

        let mut ctx = ctx(10000, 0);
        ctx.set_locked(FieldSlot::CashAmount, true);
        let changes = engine.recompute(&ctx, RecomputeMode::Forced);
        assert!(changes.is_empty());
        assert!(matches!(
            recorder.events()[0],
            CalcEvent::SuggestionAvailable {
                slot: FieldSlot::CashAmount,
                ..
            }
        ));
    }

    #[test]
    fn test_cash_quiet_is_idempotent() {
        let engine = CalcEngine::default();
        let mut context = ctx(10000, 0);
        let first = engine.recompute(&context, RecomputeMode::Quiet);
        assert!(!first.is_empty());
        first.apply(&mut context);
        assert!(engine.recompute(&context, RecomputeMode::Quiet).is_empty());
    }
}
