use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A non-negative monetary amount held as an integer count of cents.
/// All arithmetic stays in integer cents so repeated derivations never
/// accumulate floating-point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MoneyValue(i64);

impl MoneyValue {
    pub const ZERO: MoneyValue = MoneyValue(0);

    /// Builds a value from cents, clamping negative input to zero.
    pub fn from_cents(cents: i64) -> Self {
        MoneyValue(cents.max(0))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Zero doubles as the "unset/empty" display convention.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self - other`, floored at zero (a down payment larger than the
    /// total never produces a negative financed amount).
    pub fn saturating_sub(&self, other: MoneyValue) -> MoneyValue {
        MoneyValue((self.0 - other.0).max(0))
    }

    pub fn add(&self, other: MoneyValue) -> MoneyValue {
        MoneyValue(self.0 + other.0)
    }

    /// Installment amount times installment count.
    pub fn times(&self, n: u32) -> MoneyValue {
        MoneyValue(self.0 * i64::from(n))
    }

    /// Division by an installment count, rounded half-up to the cent.
    pub fn div_round(&self, n: u32) -> MoneyValue {
        let n = i64::from(n.max(1));
        MoneyValue((self.0 + n / 2) / n)
    }

    /// How many installments of `amount` cover `self`, rounded up.
    pub fn div_ceil_by(&self, amount: MoneyValue) -> u32 {
        if amount.0 <= 0 {
            return 1;
        }
        let n = (self.0 + amount.0 - 1) / amount.0;
        n.max(1) as u32
    }

    pub fn abs_diff(&self, other: MoneyValue) -> MoneyValue {
        MoneyValue((self.0 - other.0).abs())
    }
}

/// Canonical payment-method tokens. Raw selector text maps here via
/// substring matching in the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Billet,
    Unknown,
}

/// The financial fields of the contract form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldSlot {
    Total,
    CashAmount,
    InstallmentAmount,
    DownPayment,
    InstallmentCount,
    Discount,
    DueDay,
}

impl FieldSlot {
    pub const ALL: [FieldSlot; 7] = [
        FieldSlot::Total,
        FieldSlot::CashAmount,
        FieldSlot::InstallmentAmount,
        FieldSlot::DownPayment,
        FieldSlot::InstallmentCount,
        FieldSlot::Discount,
        FieldSlot::DueDay,
    ];

    /// Stable field identifier, matching the snapshot/JSON key.
    pub fn id(&self) -> &'static str {
        match self {
            FieldSlot::Total => "total",
            FieldSlot::CashAmount => "cashAmount",
            FieldSlot::InstallmentAmount => "installmentAmount",
            FieldSlot::DownPayment => "downPayment",
            FieldSlot::InstallmentCount => "installmentCount",
            FieldSlot::Discount => "discount",
            FieldSlot::DueDay => "dueDay",
        }
    }

    /// Whether the slot carries a monetary value (as opposed to a count).
    pub fn is_money(&self) -> bool {
        !matches!(self, FieldSlot::InstallmentCount | FieldSlot::DueDay)
    }
}

impl std::fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Who wrote a slot last. User writes lock the slot against silent
/// automatic overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteSource {
    User,
    Auto,
}

/// Recalculation policy: Quiet fills empty slots only, Forced overwrites
/// stale values. Locked slots are never written in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecomputeMode {
    Quiet,
    Forced,
}

/// Typed payload of a slot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotValue {
    Money(MoneyValue),
    Count(u32),
}

/// One slot write produced by a recompute pass, tagged with the formula
/// that derived it (for logging and UI hints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub slot: FieldSlot,
    pub value: SlotValue,
    pub formula: String,
}

/// The ordered list of writes from one recompute call. Order matches the
/// order the engine resolved the slots in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        ChangeSet::default()
    }

    pub fn push(&mut self, slot: FieldSlot, value: SlotValue, formula: &str) {
        self.changes.push(Change {
            slot,
            value,
            formula: formula.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Folds the writes back into a context, tagging each written slot as
    /// auto-filled. Used by callers that re-run the engine on the result.
    pub fn apply(&self, ctx: &mut CalculationContext) {
        for change in &self.changes {
            ctx.set_slot(change.slot, change.value);
            ctx.set_source(change.slot, WriteSource::Auto);
        }
    }
}

/// Snapshot of all field slots plus the active payment method, built fresh
/// for every recompute call and discarded after the outputs are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationContext {
    pub method: PaymentMethod,
    pub total: MoneyValue,
    pub cash_amount: MoneyValue,
    pub installment_amount: MoneyValue,
    pub down_payment: MoneyValue,
    pub discount: MoneyValue,
    /// 0 means the field is unset; method handlers clamp as they need.
    pub installment_count: u32,
    /// None means the field is empty; set values are clamped to 1..=28.
    pub due_day: Option<u8>,
    /// Which slot the user touched most recently; decides the authoritative
    /// side when an over-determined triple disagrees.
    pub last_edited: Option<FieldSlot>,
    locked: HashSet<FieldSlot>,
    sources: HashMap<FieldSlot, WriteSource>,
}

impl CalculationContext {
    pub fn new(method: PaymentMethod) -> Self {
        CalculationContext {
            method,
            total: MoneyValue::ZERO,
            cash_amount: MoneyValue::ZERO,
            installment_amount: MoneyValue::ZERO,
            down_payment: MoneyValue::ZERO,
            discount: MoneyValue::ZERO,
            installment_count: 0,
            due_day: None,
            last_edited: None,
            locked: HashSet::new(),
            sources: HashMap::new(),
        }
    }

    pub fn is_locked(&self, slot: FieldSlot) -> bool {
        self.locked.contains(&slot)
    }

    pub fn set_locked(&mut self, slot: FieldSlot, locked: bool) {
        if locked {
            self.locked.insert(slot);
        } else {
            self.locked.remove(&slot);
        }
    }

    pub fn source(&self, slot: FieldSlot) -> WriteSource {
        self.sources.get(&slot).copied().unwrap_or(WriteSource::Auto)
    }

    pub fn set_source(&mut self, slot: FieldSlot, source: WriteSource) {
        self.sources.insert(slot, source);
    }

    pub fn slot_value(&self, slot: FieldSlot) -> SlotValue {
        match slot {
            FieldSlot::Total => SlotValue::Money(self.total),
            FieldSlot::CashAmount => SlotValue::Money(self.cash_amount),
            FieldSlot::InstallmentAmount => SlotValue::Money(self.installment_amount),
            FieldSlot::DownPayment => SlotValue::Money(self.down_payment),
            FieldSlot::Discount => SlotValue::Money(self.discount),
            FieldSlot::InstallmentCount => SlotValue::Count(self.installment_count),
            FieldSlot::DueDay => SlotValue::Count(u32::from(self.due_day.unwrap_or(0))),
        }
    }

    /// Writes a slot. A count payload landing on a money slot (or vice
    /// versa) is ignored rather than panicking; the engine only ever emits
    /// matching payloads.
    pub fn set_slot(&mut self, slot: FieldSlot, value: SlotValue) {
        match (slot, value) {
            (FieldSlot::Total, SlotValue::Money(v)) => self.total = v,
            (FieldSlot::CashAmount, SlotValue::Money(v)) => self.cash_amount = v,
            (FieldSlot::InstallmentAmount, SlotValue::Money(v)) => self.installment_amount = v,
            (FieldSlot::DownPayment, SlotValue::Money(v)) => self.down_payment = v,
            (FieldSlot::Discount, SlotValue::Money(v)) => self.discount = v,
            (FieldSlot::InstallmentCount, SlotValue::Count(n)) => self.installment_count = n,
            (FieldSlot::DueDay, SlotValue::Count(d)) => {
                self.due_day = if d == 0 { None } else { Some(d.min(255) as u8) };
            }
            _ => {}
        }
    }
}
