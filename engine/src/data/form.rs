// Field storage behind the engine. The real form lives in a host UI;
// the engine only ever talks to it through `FieldAccess`, so the
// in-memory `FormFields` here serves the CLI, tests, and any embedder
// without a rendered form.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use shared::models::FieldSlot;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Raw-text access to the form's financial fields. The engine reads and
/// writes through this seam; the lock flag transitions to true on direct
/// user input and shields the slot from silent automatic overwrites.
pub trait FieldAccess {
    fn value(&self, slot: FieldSlot) -> String;
    fn set_value(&mut self, slot: FieldSlot, text: &str);
    fn is_locked(&self, slot: FieldSlot) -> bool;
    fn set_lock(&mut self, slot: FieldSlot, locked: bool);
}

/// In-memory field store.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<FieldSlot, String>,
    locked: HashSet<FieldSlot>,
    /// Slot the user touched most recently, if known.
    pub last_edited: Option<FieldSlot>,
}

impl FormFields {
    pub fn new() -> Self {
        FormFields::default()
    }

    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        let mut fields = FormFields::new();
        fields.set_value(FieldSlot::Total, &snapshot.total);
        fields.set_value(FieldSlot::CashAmount, &snapshot.cash_amount);
        fields.set_value(FieldSlot::InstallmentAmount, &snapshot.installment_amount);
        fields.set_value(FieldSlot::DownPayment, &snapshot.down_payment);
        fields.set_value(FieldSlot::Discount, &snapshot.discount);
        fields.set_value(FieldSlot::InstallmentCount, &snapshot.installment_count);
        fields.set_value(FieldSlot::DueDay, &snapshot.due_day);
        for slot in &snapshot.locked {
            fields.set_lock(*slot, true);
        }
        fields.last_edited = snapshot.last_edited;
        fields
    }

    pub fn to_snapshot(&self, payment_method: &str, auto_calculate: bool) -> FormSnapshot {
        FormSnapshot {
            payment_method: payment_method.to_string(),
            auto_calculate,
            total: self.value(FieldSlot::Total),
            cash_amount: self.value(FieldSlot::CashAmount),
            installment_amount: self.value(FieldSlot::InstallmentAmount),
            down_payment: self.value(FieldSlot::DownPayment),
            discount: self.value(FieldSlot::Discount),
            installment_count: self.value(FieldSlot::InstallmentCount),
            due_day: self.value(FieldSlot::DueDay),
            locked: {
                let mut locked: Vec<FieldSlot> = self.locked.iter().copied().collect();
                locked.sort_by_key(|s| s.id());
                locked
            },
            last_edited: self.last_edited,
        }
    }
}

impl FieldAccess for FormFields {
    fn value(&self, slot: FieldSlot) -> String {
        self.values.get(&slot).cloned().unwrap_or_default()
    }

    fn set_value(&mut self, slot: FieldSlot, text: &str) {
        if text.is_empty() {
            self.values.remove(&slot);
        } else {
            self.values.insert(slot, text.to_string());
        }
    }

    fn is_locked(&self, slot: FieldSlot) -> bool {
        self.locked.contains(&slot)
    }

    fn set_lock(&mut self, slot: FieldSlot, locked: bool) {
        if locked {
            self.locked.insert(slot);
        } else {
            self.locked.remove(&slot);
        }
    }
}

/// One whole form serialized as JSON, the way the host's autosave stores
/// it. Field values stay as the raw display text so a snapshot round-trips
/// exactly what the user saw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSnapshot {
    pub payment_method: String,
    pub auto_calculate: bool,
    pub total: String,
    pub cash_amount: String,
    pub installment_amount: String,
    pub down_payment: String,
    pub discount: String,
    pub installment_count: String,
    pub due_day: String,
    pub locked: Vec<FieldSlot>,
    pub last_edited: Option<FieldSlot>,
}

impl Default for FormSnapshot {
    fn default() -> Self {
        FormSnapshot {
            payment_method: String::new(),
            auto_calculate: true,
            total: String::new(),
            cash_amount: String::new(),
            installment_amount: String::new(),
            down_payment: String::new(),
            discount: String::new(),
            installment_count: String::new(),
            due_day: String::new(),
            locked: Vec::new(),
            last_edited: None,
        }
    }
}

impl FormSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<FormSnapshot, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_form_fields_value_round_trip() {
        let mut fields = FormFields::new();
        fields.set_value(FieldSlot::Total, "R$ 1.200,00");
        assert_eq!(fields.value(FieldSlot::Total), "R$ 1.200,00");
        assert_eq!(fields.value(FieldSlot::CashAmount), "");

        fields.set_value(FieldSlot::Total, "");
        assert_eq!(fields.value(FieldSlot::Total), "");
    }

    #[test]
    fn test_form_fields_lock_flag() {
        let mut fields = FormFields::new();
        assert!(!fields.is_locked(FieldSlot::InstallmentAmount));
        fields.set_lock(FieldSlot::InstallmentAmount, true);
        assert!(fields.is_locked(FieldSlot::InstallmentAmount));
        fields.set_lock(FieldSlot::InstallmentAmount, false);
        assert!(!fields.is_locked(FieldSlot::InstallmentAmount));
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let snapshot = FormSnapshot {
            payment_method: "Cartão".to_string(),
            total: "R$ 1.200,00".to_string(),
            installment_count: "12".to_string(),
            locked: vec![FieldSlot::Total],
            last_edited: Some(FieldSlot::Total),
            ..FormSnapshot::default()
        };

        let file = NamedTempFile::new().unwrap();
        snapshot.save(file.path()).unwrap();
        let loaded = FormSnapshot::load(file.path()).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_snapshot_missing_keys_default() {
        // a partial autosave from an older form version still loads
        let loaded: FormSnapshot =
            serde_json::from_str(r#"{"paymentMethod":"Boleto","total":"R$ 500,00"}"#).unwrap();
        assert_eq!(loaded.payment_method, "Boleto");
        assert_eq!(loaded.total, "R$ 500,00");
        assert!(loaded.auto_calculate);
        assert!(loaded.locked.is_empty());
    }

    #[test]
    fn test_snapshot_to_fields_and_back() {
        let snapshot = FormSnapshot {
            payment_method: "Boleto".to_string(),
            total: "R$ 1.100,00".to_string(),
            down_payment: "R$ 100,00".to_string(),
            installment_count: "10".to_string(),
            locked: vec![FieldSlot::DownPayment],
            ..FormSnapshot::default()
        };
        let fields = FormFields::from_snapshot(&snapshot);
        assert!(fields.is_locked(FieldSlot::DownPayment));
        assert_eq!(fields.to_snapshot("Boleto", true), snapshot);
    }
}
