// Bidirectional financial field inference. The engine reads a context
// snapshot built from the form fields, picks the formula for the active
// payment method, and returns the slot writes as an ordered ChangeSet.
// It is the sole writer of non-locked slots; the lock transition itself
// belongs to the host (reported through `field_edited`).

use crate::config::CalcSettings;
use crate::data::form::FieldAccess;
use crate::data::normalizer;
use crate::events::{CalcErrorKind, CalcEvent, CalcObserver};
use shared::models::{
    CalculationContext, ChangeSet, FieldSlot, MoneyValue, PaymentMethod, RecomputeMode, SlotValue,
    WriteSource,
};
use std::cell::{Cell, RefCell};

pub mod billet;
pub mod card;
pub mod cash;
pub mod discount;

// Formula tags carried on writes and suggestions, for logging and UI hints.
pub(crate) const F_CASH_FROM_TOTAL: &str = "cash = total";
pub(crate) const F_TOTAL_FROM_CASH: &str = "total = cash";
pub(crate) const F_TOTAL_PER_N: &str = "total/n";
pub(crate) const F_N_TIMES_INSTALLMENT: &str = "n*installment";
pub(crate) const F_DEFAULT_N: &str = "default installment count";
pub(crate) const F_FINANCED_PER_N: &str = "(total - downPayment)/n";
pub(crate) const F_TOTAL_MINUS_INSTALLMENTS: &str = "total - n*installment";
pub(crate) const F_DOWN_PLUS_INSTALLMENTS: &str = "downPayment + n*installment";
pub(crate) const F_CEIL_FINANCED: &str = "ceil((total - downPayment)/installment)";

pub struct CalcEngine {
    settings: CalcSettings,
    observers: RefCell<Vec<Box<dyn CalcObserver>>>,
    /// Re-entrancy guard: a recompute triggered from inside an event
    /// notification is dropped instead of recursing.
    calculating: Cell<bool>,
}

// Resets the guard when a pass unwinds.
struct CalcGuard<'a>(&'a Cell<bool>);

impl Drop for CalcGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Default for CalcEngine {
    fn default() -> Self {
        CalcEngine::new(CalcSettings::default())
    }
}

impl CalcEngine {
    pub fn new(settings: CalcSettings) -> Self {
        CalcEngine {
            settings,
            observers: RefCell::new(Vec::new()),
            calculating: Cell::new(false),
        }
    }

    pub fn settings(&self) -> &CalcSettings {
        &self.settings
    }

    pub fn subscribe(&self, observer: Box<dyn CalcObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    pub(crate) fn emit(&self, event: CalcEvent) {
        for observer in self.observers.borrow().iter() {
            observer.on_event(&event);
        }
    }

    /// Primary entry point: derives the under-determined slots for the
    /// context's payment method. Deterministic for a given context; a
    /// re-entrant call while a pass is running returns an empty set.
    pub fn recompute(&self, ctx: &CalculationContext, mode: RecomputeMode) -> ChangeSet {
        if self.calculating.replace(true) {
            tracing::debug!("recompute re-entered while a pass is running, dropping call");
            return ChangeSet::new();
        }
        let _guard = CalcGuard(&self.calculating);

        let mut changes = ChangeSet::new();
        tracing::debug!(method = ?ctx.method, mode = ?mode, "recomputing");
        match ctx.method {
            PaymentMethod::Cash => cash::recompute(self, ctx, mode, &mut changes),
            PaymentMethod::Card => card::recompute(self, ctx, mode, &mut changes),
            PaymentMethod::Billet => billet::recompute(self, ctx, mode, &mut changes),
            PaymentMethod::Unknown => {
                tracing::warn!("payment method not selected, nothing to calculate");
            }
        }
        changes
    }

    /// Builds a fresh context from the form fields through the normalizer,
    /// sanitizing the integer fields in place (installment count to
    /// 1..=max, due day to 1..=28).
    pub fn read_context(
        &self,
        fields: &mut dyn FieldAccess,
        method: PaymentMethod,
        last_edited: Option<FieldSlot>,
    ) -> CalculationContext {
        let mut ctx = CalculationContext::new(method);
        ctx.last_edited = last_edited;

        ctx.total = normalizer::parse_money(&fields.value(FieldSlot::Total));
        ctx.cash_amount = normalizer::parse_money(&fields.value(FieldSlot::CashAmount));
        ctx.installment_amount =
            normalizer::parse_money(&fields.value(FieldSlot::InstallmentAmount));
        ctx.down_payment = normalizer::parse_money(&fields.value(FieldSlot::DownPayment));
        ctx.discount = normalizer::parse_money(&fields.value(FieldSlot::Discount));

        match normalizer::parse_int(&fields.value(FieldSlot::InstallmentCount)) {
            Some(v) if v < 1 => {
                tracing::warn!(value = v, "installment count must be a positive integer, clamped to 1");
                self.emit(CalcEvent::CalculationError {
                    kind: CalcErrorKind::InvalidInstallmentCount,
                });
                ctx.installment_count = 1;
                fields.set_value(FieldSlot::InstallmentCount, "1");
            }
            Some(v) => {
                let n = normalizer::clamp_count(v, self.settings.max_installments);
                ctx.installment_count = n;
                fields.set_value(FieldSlot::InstallmentCount, &n.to_string());
            }
            None => ctx.installment_count = 0,
        }

        if let Some(v) = normalizer::parse_int(&fields.value(FieldSlot::DueDay)) {
            let day = normalizer::clamp_due_day(v, self.settings.max_due_day);
            ctx.due_day = Some(day);
            fields.set_value(FieldSlot::DueDay, &format!("{:02}", day));
        }

        for slot in FieldSlot::ALL {
            if fields.is_locked(slot) {
                ctx.set_locked(slot, true);
                ctx.set_source(slot, WriteSource::User);
            }
        }
        ctx
    }

    /// Writes a ChangeSet back to the form fields through the normalizer.
    pub fn apply_changes(&self, fields: &mut dyn FieldAccess, changes: &ChangeSet) {
        for change in changes.iter() {
            match change.value {
                SlotValue::Money(v) => {
                    fields.set_value(change.slot, &normalizer::format_money(v));
                }
                SlotValue::Count(n) => {
                    let text = if change.slot == FieldSlot::DueDay {
                        format!("{:02}", n)
                    } else {
                        n.to_string()
                    };
                    fields.set_value(change.slot, &text);
                }
            }
        }
    }

    /// Records a direct user edit: the slot locks and stays protected from
    /// silent automatic overwrites until the host unlocks it.
    pub fn field_edited(&self, fields: &mut dyn FieldAccess, slot: FieldSlot) {
        if !fields.is_locked(slot) {
            fields.set_lock(slot, true);
            self.emit(CalcEvent::FieldLocked { slot });
        }
    }

    /// Write policy shared by every formula. Locked slots and non-empty
    /// slots in quiet mode are never written; if the computed value still
    /// disagrees beyond tolerance, it surfaces as a suggestion instead.
    pub(crate) fn write_money(
        &self,
        ctx: &CalculationContext,
        mode: RecomputeMode,
        changes: &mut ChangeSet,
        slot: FieldSlot,
        value: MoneyValue,
        formula: &str,
    ) -> bool {
        let current = match ctx.slot_value(slot) {
            SlotValue::Money(m) => m,
            SlotValue::Count(_) => return false,
        };
        let differs = current.abs_diff(value).cents() > self.settings.tolerance_cents;

        let blocked = ctx.is_locked(slot)
            || (mode == RecomputeMode::Quiet && !current.is_zero());
        if blocked {
            if differs {
                self.emit(CalcEvent::SuggestionAvailable {
                    slot,
                    suggested: SlotValue::Money(value),
                    formula: formula.to_string(),
                });
            }
            return false;
        }

        if !differs {
            return false;
        }
        changes.push(slot, SlotValue::Money(value), formula);
        self.emit(CalcEvent::ValueUpdated {
            slot,
            new_value: SlotValue::Money(value),
            formula: formula.to_string(),
        });
        true
    }

    /// Count slots (installment count) skip the quiet emptiness gate: the
    /// formulas only derive a count when the field is absent or stale, and
    /// the original form corrects those in place. Locks still hold.
    pub(crate) fn write_count(
        &self,
        ctx: &CalculationContext,
        changes: &mut ChangeSet,
        slot: FieldSlot,
        value: u32,
        formula: &str,
    ) -> bool {
        let current = match ctx.slot_value(slot) {
            SlotValue::Count(n) => n,
            SlotValue::Money(_) => return false,
        };
        if current == value {
            return false;
        }
        if ctx.is_locked(slot) {
            self.emit(CalcEvent::SuggestionAvailable {
                slot,
                suggested: SlotValue::Count(value),
                formula: formula.to_string(),
            });
            return false;
        }
        changes.push(slot, SlotValue::Count(value), formula);
        self.emit(CalcEvent::ValueUpdated {
            slot,
            new_value: SlotValue::Count(value),
            formula: formula.to_string(),
        });
        true
    }
}
