// Billet (installment) payment: total = downPayment + installment * count.
// The pass first checks that a total exists or can be derived; without
// that, it aborts as a hard validation failure and writes nothing.

use super::{
    CalcEngine, F_CEIL_FINANCED, F_DOWN_PLUS_INSTALLMENTS, F_FINANCED_PER_N,
    F_TOTAL_MINUS_INSTALLMENTS,
};
use crate::events::{CalcErrorKind, CalcEvent};
use shared::models::{CalculationContext, ChangeSet, FieldSlot, RecomputeMode, SlotValue};

pub(super) fn recompute(
    engine: &CalcEngine,
    ctx: &CalculationContext,
    mode: RecomputeMode,
    changes: &mut ChangeSet,
) {
    let total = ctx.total;
    let down_payment = ctx.down_payment;
    let installment = ctx.installment_amount;
    let n_raw = ctx.installment_count;
    let n = n_raw.max(1);

    // total must be present or derivable from installment * count
    if total.is_zero() && installment.is_zero() {
        tracing::warn!("billet needs a total or an installment amount to derive one");
        engine.emit(CalcEvent::CalculationError {
            kind: CalcErrorKind::InvalidTotal,
        });
        return;
    }

    // a locked installment amount only drives the fields around it
    if ctx.is_locked(FieldSlot::InstallmentAmount) && !installment.is_zero() {
        if !total.is_zero() && down_payment.is_zero() {
            engine.write_money(
                ctx,
                mode,
                changes,
                FieldSlot::DownPayment,
                total.saturating_sub(installment.times(n)),
                F_TOTAL_MINUS_INSTALLMENTS,
            );
        } else if !down_payment.is_zero() && total.is_zero() {
            engine.write_money(
                ctx,
                mode,
                changes,
                FieldSlot::Total,
                down_payment.add(installment.times(n)),
                F_DOWN_PLUS_INSTALLMENTS,
            );
        } else if !total.is_zero() && !down_payment.is_zero() {
            // everything around the locked installment is already set:
            // surface a conflict instead of touching any field
            let expected = down_payment.add(installment.times(n));
            if total.abs_diff(expected).cents() > engine.settings().tolerance_cents {
                engine.emit(CalcEvent::SuggestionAvailable {
                    slot: FieldSlot::DownPayment,
                    suggested: SlotValue::Money(total.saturating_sub(installment.times(n))),
                    formula: F_TOTAL_MINUS_INSTALLMENTS.to_string(),
                });
            }
        }
        return;
    }

    let financed = total.saturating_sub(down_payment);

    if installment.is_zero() && !financed.is_zero() {
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::InstallmentAmount,
            financed.div_round(n),
            F_FINANCED_PER_N,
        );
        return;
    }

    // count absent (or left at the sanitized minimum): size it to cover
    // the financed amount
    if !total.is_zero() && !installment.is_zero() && n <= 1 {
        engine.write_count(
            ctx,
            changes,
            FieldSlot::InstallmentCount,
            financed.div_ceil_by(installment),
            F_CEIL_FINANCED,
        );
        return;
    }

    if total.is_zero() && !installment.is_zero() {
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::Total,
            down_payment.add(installment.times(n)),
            F_DOWN_PLUS_INSTALLMENTS,
        );
        return;
    }

    // down payment absent: it is the gap between the total and the
    // installments (zero when they already match)
    if !total.is_zero() && !installment.is_zero() && down_payment.is_zero() {
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::DownPayment,
            total.saturating_sub(installment.times(n)),
            F_TOTAL_MINUS_INSTALLMENTS,
        );
        return;
    }

    // all three known and inconsistent: total and down payment are
    // authoritative unless the installment was the last edit
    if !total.is_zero() && !installment.is_zero() {
        let expected = down_payment.add(installment.times(n));
        if total.abs_diff(expected).cents() > engine.settings().tolerance_cents {
            if ctx.last_edited == Some(FieldSlot::InstallmentAmount) {
                engine.write_money(ctx, mode, changes, FieldSlot::Total, expected, F_DOWN_PLUS_INSTALLMENTS);
            } else {
                engine.write_money(
                    ctx,
                    mode,
                    changes,
                    FieldSlot::InstallmentAmount,
                    financed.div_round(n),
                    F_FINANCED_PER_N,
                );
            }
        }
    }
}
