//! # Sale Summary Math
//!
//! Running totals for the sale being composed: subtotal, tax, discount,
//! grand total, change due and unit count.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► raw subtotal (Σ line totals, unrounded)                      │
//! │              │                                                          │
//! │              ├──► tax      = round2(raw × max(0, tax%)/100)             │
//! │              ├──► discount = round2(raw × clamp(disc%, 0, 100)/100)     │
//! │              │                                                          │
//! │              └──► grand    = round2(raw + tax − discount)                │
//! │                        │                                                │
//! │                        └──► change = round2(cash − grand)  (may be < 0) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax and discount are each rounded from the RAW subtotal, never from the
//! rounded one. Every output field is independently rounded to the cent.
//!
//! There are no error conditions: malformed input contributes zero, and
//! absurdly large input saturates instead of overflowing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Drug, SaleLineItem};

// =============================================================================
// Inputs
// =============================================================================

/// One line as seen by the summary math.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryLine {
    /// Line total as a raw decimal.
    pub line_total: f64,
    pub quantity: i64,
}

impl SummaryLine {
    pub fn new(line_total: f64, quantity: i64) -> Self {
        SummaryLine {
            line_total: finite_or_zero(line_total),
            quantity,
        }
    }

    /// Builds a line from an in-progress sale item. Without a price override
    /// and without a known drug the line contributes nothing to the subtotal.
    pub fn for_item(item: &SaleLineItem, drug: Option<&Drug>) -> Self {
        let unit_price = item
            .unit_price
            .or_else(|| drug.map(|d| d.price))
            .unwrap_or_default();
        SummaryLine::new(unit_price.raw_total(item.qty), item.qty)
    }

    /// Reads a loosely-typed line document (`total`/`lineTotal`,
    /// `quantity`/`qty`). A zero, blank or missing first key falls through to
    /// the second; anything non-numeric counts as zero.
    pub fn from_json(value: &Value) -> Self {
        let total = coerce_number(first_present(value, &["total", "lineTotal"]));
        let quantity = coerce_number(first_present(value, &["quantity", "qty"]));
        SummaryLine {
            line_total: total,
            quantity: quantity.trunc() as i64,
        }
    }
}

/// Tax and discount configuration, both in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SummaryRates {
    pub tax_rate_percent: f64,
    pub discount_rate_percent: f64,
}

impl SummaryRates {
    pub fn new(tax_rate_percent: f64, discount_rate_percent: f64) -> Self {
        SummaryRates {
            tax_rate_percent,
            discount_rate_percent,
        }
    }

    /// Tax rate as a fraction; negative rates count as zero.
    pub fn normalized_tax_rate(&self) -> f64 {
        finite_or_zero(self.tax_rate_percent).max(0.0) / 100.0
    }

    /// Discount rate as a fraction, clamped to 0..=100 percent.
    pub fn normalized_discount_rate(&self) -> f64 {
        finite_or_zero(self.discount_rate_percent).clamp(0.0, 100.0) / 100.0
    }
}

// =============================================================================
// Output
// =============================================================================

/// Derived totals for the current sale. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleSummary {
    #[ts(as = "f64")]
    pub subtotal: Money,
    #[ts(as = "f64")]
    pub tax_amount: Money,
    #[ts(as = "f64")]
    pub discount_amount: Money,
    #[ts(as = "f64")]
    pub grand_total: Money,
    /// Negative when the customer still owes money.
    #[ts(as = "f64")]
    pub change_due: Money,
    pub total_units: i64,
}

// =============================================================================
// Calculation
// =============================================================================

/// Computes the sale summary.
///
/// ## Example
/// ```rust
/// use pharma_core::summary::{calculate_sale_summary, SummaryLine, SummaryRates};
///
/// let lines = [SummaryLine::new(20.0, 2), SummaryLine::new(30.0, 3)];
/// let summary = calculate_sale_summary(&lines, SummaryRates::new(7.5, 10.0), 60.0);
///
/// assert_eq!(summary.subtotal.cents(), 5000);
/// assert_eq!(summary.tax_amount.cents(), 375);
/// assert_eq!(summary.discount_amount.cents(), 500);
/// assert_eq!(summary.grand_total.cents(), 4875);
/// assert_eq!(summary.change_due.cents(), 1125);
/// assert_eq!(summary.total_units, 5);
/// ```
pub fn calculate_sale_summary(
    lines: &[SummaryLine],
    rates: SummaryRates,
    cash_received: f64,
) -> SaleSummary {
    let raw_subtotal: f64 = lines.iter().map(|l| finite_or_zero(l.line_total)).sum();
    let total_units = lines
        .iter()
        .fold(0_i64, |acc, l| acc.saturating_add(l.quantity));

    let tax_amount = Money::from_decimal(raw_subtotal * rates.normalized_tax_rate());
    let discount_amount = Money::from_decimal(raw_subtotal * rates.normalized_discount_rate());
    let grand_total = Money::from_decimal(
        raw_subtotal + tax_amount.to_decimal() - discount_amount.to_decimal(),
    );
    let change_due = Money::from_decimal(finite_or_zero(cash_received) - grand_total.to_decimal());

    SaleSummary {
        subtotal: Money::from_decimal(raw_subtotal),
        tax_amount,
        discount_amount,
        grand_total,
        change_due,
        total_units,
    }
}

/// Computes the summary from a loosely-typed request document:
/// `{ items: [...], taxRate, discountRate, cashReceived }`.
pub fn calculate_sale_summary_json(request: &Value) -> SaleSummary {
    let lines: Vec<SummaryLine> = request
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(SummaryLine::from_json).collect())
        .unwrap_or_default();

    let rates = SummaryRates::new(
        coerce_number(request.get("taxRate")),
        coerce_number(request.get("discountRate")),
    );

    calculate_sale_summary(&lines, rates, coerce_number(request.get("cashReceived")))
}

// =============================================================================
// Number Coercion
// =============================================================================

/// Coerces a JSON value to a finite number: numbers pass through, numeric
/// strings are parsed, booleans count as 1/0, everything else is 0.
pub fn coerce_number<'a>(value: impl Into<Option<&'a Value>>) -> f64 {
    let parsed = match value.into() {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    finite_or_zero(parsed)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Returns the first key whose value is "present": not null, not zero, not
/// an empty string, not `false`.
fn first_present<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| is_present(v))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::UnitPrice;
    use crate::types::DrugId;
    use serde_json::json;

    #[test]
    fn test_basic_summary() {
        let summary = calculate_sale_summary_json(&json!({
            "items": [
                { "total": 20, "quantity": 2 },
                { "total": 30, "quantity": 3 }
            ],
            "taxRate": 7.5,
            "discountRate": 10,
            "cashReceived": 60
        }));

        assert_eq!(summary.subtotal, Money::from_cents(5000));
        assert_eq!(summary.tax_amount, Money::from_cents(375));
        assert_eq!(summary.discount_amount, Money::from_cents(500));
        assert_eq!(summary.grand_total, Money::from_cents(4875));
        assert_eq!(summary.change_due, Money::from_cents(1125));
        assert_eq!(summary.total_units, 5);
    }

    #[test]
    fn test_malformed_input_degrades_to_zero() {
        let summary = calculate_sale_summary_json(&json!({
            "items": [{ "total": "abc", "quantity": "xyz" }],
            "taxRate": -5,
            "discountRate": 120,
            "cashReceived": 0
        }));

        assert_eq!(summary, SaleSummary::default());
    }

    #[test]
    fn test_rates_are_clamped() {
        let rates = SummaryRates::new(-5.0, 120.0);
        assert_eq!(rates.normalized_tax_rate(), 0.0);
        assert_eq!(rates.normalized_discount_rate(), 1.0);

        let rates = SummaryRates::new(f64::NAN, f64::NAN);
        assert_eq!(rates.normalized_tax_rate(), 0.0);
        assert_eq!(rates.normalized_discount_rate(), 0.0);
    }

    #[test]
    fn test_full_discount_zeroes_grand_total() {
        let lines = [SummaryLine::new(19.99, 1)];
        let summary = calculate_sale_summary(&lines, SummaryRates::new(0.0, 100.0), 0.0);
        assert_eq!(summary.discount_amount.cents(), 1999);
        assert!(summary.grand_total.is_zero());
    }

    #[test]
    fn test_change_due_may_be_negative() {
        let lines = [SummaryLine::new(25.0, 1)];
        let summary = calculate_sale_summary(&lines, SummaryRates::default(), 10.0);
        assert_eq!(summary.change_due.cents(), -1500);
    }

    #[test]
    fn test_tax_and_discount_rounded_from_raw_subtotal() {
        // Raw subtotal 1.014 shows as 1.01, but tax is computed from the raw
        // value: 1.014 × 40% = 0.4056 → 0.41 (the rounded 1.01 would give 0.40).
        let lines = [SummaryLine::new(1.014, 1)];
        let summary = calculate_sale_summary(&lines, SummaryRates::new(40.0, 0.0), 2.0);
        assert_eq!(summary.subtotal.cents(), 101);
        assert_eq!(summary.tax_amount.cents(), 41);
        assert_eq!(summary.grand_total.cents(), 142);
        assert_eq!(summary.change_due.cents(), 58);
    }

    #[test]
    fn test_summary_is_pure() {
        let lines = [SummaryLine::new(12.34, 2), SummaryLine::new(0.66, 1)];
        let rates = SummaryRates::new(8.25, 5.0);
        let first = calculate_sale_summary(&lines, rates, 50.0);
        let second = calculate_sale_summary(&lines, rates, 50.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_line_total_falls_through_to_line_total_key() {
        let line = SummaryLine::from_json(&json!({ "total": 0, "lineTotal": "12.5", "qty": 2 }));
        assert_eq!(line.line_total, 12.5);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_line_for_item_uses_drug_price() {
        let drug = Drug {
            id: DrugId::from("d1"),
            name: "Cetirizine".to_string(),
            category: String::new(),
            quantity: 10,
            price: UnitPrice::from_cents(250),
            expiry: None,
            supplier: String::new(),
        };
        let item = SaleLineItem::new("d1", 4);

        assert_eq!(SummaryLine::for_item(&item, Some(&drug)).line_total, 10.0);
        assert_eq!(SummaryLine::for_item(&item, None).line_total, 0.0);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let summary = calculate_sale_summary_json(&json!({
            "items": [
                { "total": 1, "quantity": 1e19 },
                { "total": 1, "quantity": 1e19 }
            ]
        }));
        assert_eq!(summary.total_units, i64::MAX);
        assert_eq!(summary.subtotal.cents(), 200);

        let item = SaleLineItem::new("d1", i64::MAX).with_price(Money::from_cents(1000));
        let lines = [SummaryLine::for_item(&item, None), SummaryLine::for_item(&item, None)];
        let summary = calculate_sale_summary(&lines, SummaryRates::new(10.0, 0.0), 0.0);
        assert_eq!(summary.total_units, i64::MAX);
        assert_eq!(summary.subtotal.cents(), i64::MAX);
        assert_eq!(summary.grand_total.cents(), i64::MAX);
        assert!(summary.change_due.is_negative());
    }

    #[test]
    fn test_line_for_item_keeps_sub_cent_precision() {
        let item = SaleLineItem::new("d1", 3).with_price(UnitPrice::new(0.333));
        let line = SummaryLine::for_item(&item, None);
        let summary = calculate_sale_summary(&[line], SummaryRates::default(), 0.0);
        assert_eq!(summary.subtotal.cents(), 100);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(3.5)), 3.5);
        assert_eq!(coerce_number(&json!(" 4 ")), 4.0);
        assert_eq!(coerce_number(&json!("")), 0.0);
        assert_eq!(coerce_number(&json!("NaN")), 0.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!(true)), 1.0);
        assert_eq!(coerce_number(&json!([1])), 0.0);
        assert_eq!(coerce_number(None::<&Value>), 0.0);
    }
}
