// Card payment: total = installment * count. One unknown is derived from
// the other two; with only a total, the count defaults and the
// installment follows. A stale side of an over-determined triple is
// corrected toward the last-edited side.

use super::{CalcEngine, F_DEFAULT_N, F_N_TIMES_INSTALLMENT, F_TOTAL_PER_N};
use crate::events::{CalcErrorKind, CalcEvent};
use shared::models::{CalculationContext, ChangeSet, FieldSlot, RecomputeMode};

pub(super) fn recompute(
    engine: &CalcEngine,
    ctx: &CalculationContext,
    mode: RecomputeMode,
    changes: &mut ChangeSet,
) {
    let total = ctx.total;
    let installment = ctx.installment_amount;
    let n_raw = ctx.installment_count;
    let n = n_raw.max(1);

    // total must be present or derivable from installment * count
    if total.is_zero() && installment.is_zero() {
        tracing::warn!("card needs a total or an installment amount to derive one");
        engine.emit(CalcEvent::CalculationError {
            kind: CalcErrorKind::InvalidTotal,
        });
        return;
    }

    // a locked installment amount drives the total, never the reverse
    if ctx.is_locked(FieldSlot::InstallmentAmount) && !installment.is_zero() {
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::Total,
            installment.times(n),
            F_N_TIMES_INSTALLMENT,
        );
        return;
    }

    if !total.is_zero() && installment.is_zero() && n_raw > 0 {
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::InstallmentAmount,
            total.div_round(n_raw),
            F_TOTAL_PER_N,
        );
        return;
    }

    if !installment.is_zero() && total.is_zero() && n_raw > 0 {
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::Total,
            installment.times(n_raw),
            F_N_TIMES_INSTALLMENT,
        );
        return;
    }

    // only a total: suggest the default plan
    if !total.is_zero() && n_raw == 0 && installment.is_zero() {
        let default_n = engine.settings().default_card_installments;
        engine.write_count(ctx, changes, FieldSlot::InstallmentCount, default_n, F_DEFAULT_N);
        engine.write_money(
            ctx,
            mode,
            changes,
            FieldSlot::InstallmentAmount,
            total.div_round(default_n),
            F_TOTAL_PER_N,
        );
        return;
    }

    // over-determined and inconsistent: correct the stale side
    if !total.is_zero() && !installment.is_zero() {
        let expected = installment.times(n);
        if total.abs_diff(expected).cents() > engine.settings().tolerance_cents {
            if ctx.last_edited == Some(FieldSlot::InstallmentAmount) {
                engine.write_money(ctx, mode, changes, FieldSlot::Total, expected, F_N_TIMES_INSTALLMENT);
            } else {
                engine.write_money(
                    ctx,
                    mode,
                    changes,
                    FieldSlot::InstallmentAmount,
                    total.div_round(n),
                    F_TOTAL_PER_N,
                );
            }
        }
    }
}
