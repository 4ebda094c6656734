// Observable side effects of a recompute pass. Observers are notified
// synchronously, in the order the engine resolves slots; applying the
// resulting ChangeSet to visible fields is the host's job, not the
// engine's.

use serde::Serialize;
use shared::models::{FieldSlot, MoneyValue, SlotValue};
use std::cell::RefCell;
use std::rc::Rc;

/// Why a recompute pass reported a problem. All of these are non-fatal:
/// the engine clamps or aborts, it never panics or returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalcErrorKind {
    /// The billet path had no total and no installment pair to derive one
    /// from; the pass aborted without writing any field.
    InvalidTotal,
    /// The installment count was negative or not an integer; it was
    /// clamped to 1 (warning, not a failure).
    InvalidInstallmentCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CalcEvent {
    /// A slot was written by the engine.
    ValueUpdated {
        slot: FieldSlot,
        new_value: SlotValue,
        formula: String,
    },
    /// The engine had a value for a slot it was not allowed to write
    /// (locked, or non-empty in quiet mode); the host may display it.
    SuggestionAvailable {
        slot: FieldSlot,
        suggested: SlotValue,
        formula: String,
    },
    CalculationError {
        kind: CalcErrorKind,
    },
    /// A slot transitioned to locked after direct user input.
    FieldLocked {
        slot: FieldSlot,
    },
    /// The discount slot was inferred from total and cash amount.
    DiscountInferred {
        discount: MoneyValue,
    },
}

/// Synchronous observer of the engine's event stream.
pub trait CalcObserver {
    fn on_event(&self, event: &CalcEvent);
}

/// Forwards every event to the tracing subscriber; subscribed by the CLI.
pub struct TracingObserver;

impl CalcObserver for TracingObserver {
    fn on_event(&self, event: &CalcEvent) {
        match event {
            CalcEvent::ValueUpdated {
                slot,
                new_value,
                formula,
            } => {
                tracing::info!(slot = %slot, value = ?new_value, formula = %formula, "field updated");
            }
            CalcEvent::SuggestionAvailable {
                slot,
                suggested,
                formula,
            } => {
                tracing::info!(slot = %slot, value = ?suggested, formula = %formula, "suggestion available");
            }
            CalcEvent::CalculationError { kind } => {
                tracing::warn!(kind = ?kind, "calculation error");
            }
            CalcEvent::FieldLocked { slot } => {
                tracing::debug!(slot = %slot, "field locked by user edit");
            }
            CalcEvent::DiscountInferred { discount } => {
                tracing::info!(discount_cents = discount.cents(), "discount inferred");
            }
        }
    }
}

/// Collects events into a shared buffer. Handy for hosts that render the
/// event stream after the pass, and for tests asserting emission order.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<CalcEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        RecordingObserver::default()
    }

    pub fn events(&self) -> Vec<CalcEvent> {
        self.events.borrow().clone()
    }
}

impl CalcObserver for RecordingObserver {
    fn on_event(&self, event: &CalcEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
