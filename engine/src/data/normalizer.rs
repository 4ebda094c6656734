// Brazilian currency and form-field normalization.
//
// Everything here is a pure function that degrades to the zero/unknown
// value on malformed input: parsing happens on live keystrokes, so an
// error must never interrupt the edit in progress.

use shared::models::{MoneyValue, PaymentMethod};

/// Parses currency text like "R$ 1.234,56" into cents. Strips the
/// currency marker, whitespace and thousand separators, then treats the
/// comma as the decimal separator. Empty, non-numeric, or negative input
/// parses as zero ("no data"), never as an error.
pub fn parse_money(text: &str) -> MoneyValue {
    let normalized = text
        .trim()
        .replace("R$", "")
        .replace(['.', ' ', '\u{a0}'], "")
        .replace(',', ".");

    if normalized.is_empty() {
        return MoneyValue::ZERO;
    }

    match normalized.parse::<f64>() {
        // round half-up to exactly two decimals; values are non-negative
        // from here on, so f64::round is half-up
        Ok(v) if v.is_finite() && v > 0.0 => MoneyValue::from_cents((v * 100.0).round() as i64),
        _ => MoneyValue::ZERO,
    }
}

/// Formats cents as "R$ 1.234,50". Zero renders as the empty string,
/// which is the "unset" display convention across the whole form.
pub fn format_money(value: MoneyValue) -> String {
    if value.cents() <= 0 {
        return String::new();
    }
    let whole = value.cents() / 100;
    let frac = value.cents() % 100;
    format!("R$ {},{:02}", group_thousands(whole), frac)
}

// "1234567" -> "1.234.567"
fn group_thousands(mut whole: i64) -> String {
    let mut groups = Vec::new();
    loop {
        let rest = whole / 1000;
        if rest == 0 {
            groups.push(whole.to_string());
            break;
        }
        groups.push(format!("{:03}", whole % 1000));
        whole = rest;
    }
    groups.reverse();
    groups.join(".")
}

/// Classifies the raw payment-method selector text. Matching is
/// case-insensitive and substring based, so both the display text
/// ("Cartão") and the raw token ("cartao") map to the same variant.
pub fn normalize_payment_method(raw: &str) -> PaymentMethod {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return PaymentMethod::Unknown;
    }
    if s.contains("vista") {
        PaymentMethod::Cash
    } else if s.contains("cart") {
        PaymentMethod::Card
    } else if s.contains("bol") {
        PaymentMethod::Billet
    } else {
        PaymentMethod::Unknown
    }
}

/// Canonical token for a payment method, the inverse of
/// `normalize_payment_method` for known variants.
pub fn payment_method_token(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "avista",
        PaymentMethod::Card => "cartao",
        PaymentMethod::Billet => "boleto",
        PaymentMethod::Unknown => "",
    }
}

/// Extracts an integer from free-form field text. Returns None for empty
/// or digit-free input; keeps a leading minus so out-of-range values can
/// be clamped (not silently reinterpreted) by the caller.
pub fn parse_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let negative = trimmed.starts_with('-');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Clamps an installment count to 1..=max.
pub fn clamp_count(value: i64, max: u32) -> u32 {
    value.clamp(1, i64::from(max)) as u32
}

/// Clamps a due day to 1..=max (out-of-range input is corrected, never
/// rejected).
pub fn clamp_due_day(value: i64, max: u8) -> u8 {
    value.clamp(1, i64::from(max)) as u8
}
