// Engine constants, overridable when embedding the engine in a host shell
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CalcSettings {
    /// Monetary comparison tolerance, in cents. Differences at or below
    /// this are treated as consistent and never corrected.
    pub tolerance_cents: i64,
    /// Installment count suggested for card payments when the user gave
    /// a total but neither a count nor an installment amount.
    pub default_card_installments: u32,
    /// Ceiling applied when sanitizing the installment-count field.
    pub max_installments: u32,
    /// Due day is clamped to 1..=max_due_day (28 keeps every month valid).
    pub max_due_day: u8,
}

impl Default for CalcSettings {
    fn default() -> Self {
        CalcSettings {
            tolerance_cents: 1,
            default_card_installments: 12,
            max_installments: 36,
            max_due_day: 28,
        }
    }
}
