//! # Validation Module
//!
//! The sale validator plus field-level input rules.
//!
//! ## Sale Validation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_sale_request(drugs, items)                                    │
//! │                                                                         │
//! │  pass 1: Σ requested qty per drug id (valid lines only, checked add)    │
//! │                                                                         │
//! │  pass 2: for EVERY line (no short-circuit)                              │
//! │     ├── no drug id / qty ≤ 0 ──► "Invalid entry for …"                 │
//! │     ├── id not in inventory  ──► "Drug not found: …"                   │
//! │     ├── Σ requested > stock  ──► "Insufficient stock for … (have, need)"│
//! │     │   or Σ overflowed         (once per drug id)                      │
//! │     └── qty × price overflow ──► "Line total too large for …"          │
//! │                                                                         │
//! │  ok = issues.is_empty()    any issue rejects the WHOLE sale             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Summing per drug id closes the oversell gap where two lines for the same
//! drug each fit the stock on their own but not together.
//!
//! The validator never mutates anything; call it speculatively as often as
//! the UI likes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::UnitPrice;
use crate::types::{Drug, DrugId, SaleLineItem};
use crate::MAX_DRUG_NAME_LEN;

/// Result type for field validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Sale Validator
// =============================================================================

/// Outcome of a sale validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleValidation {
    pub ok: bool,
    pub issues: Vec<String>,
}

impl SaleValidation {
    fn from_issues(issues: Vec<String>) -> Self {
        SaleValidation {
            ok: issues.is_empty(),
            issues,
        }
    }
}

/// Checks a proposed multi-line sale against current stock.
///
/// ## Example
/// ```rust
/// use pharma_core::types::{Drug, DrugId, SaleLineItem};
/// use pharma_core::validation::validate_sale_request;
/// use pharma_core::UnitPrice;
///
/// let drugs = vec![Drug {
///     id: DrugId::from("1"),
///     name: "Drug A".into(),
///     category: String::new(),
///     quantity: 5,
///     price: UnitPrice::from_cents(100),
///     expiry: None,
///     supplier: String::new(),
/// }];
/// let items = vec![
///     SaleLineItem::new("1", 3),
///     SaleLineItem::new("2", 1).with_name("Missing Drug"),
/// ];
///
/// let result = validate_sale_request(&drugs, &items);
/// assert!(!result.ok);
/// assert_eq!(result.issues, vec!["Drug not found: Missing Drug"]);
/// ```
pub fn validate_sale_request(drugs: &[Drug], items: &[SaleLineItem]) -> SaleValidation {
    let mut stock: HashMap<&DrugId, &Drug> = HashMap::with_capacity(drugs.len());
    for drug in drugs {
        // First record wins, matching Inventory::find_by_id.
        stock.entry(&drug.id).or_insert(drug);
    }

    // `None` marks a sum that overflowed i64; no stock level can cover it.
    let mut requested: HashMap<&DrugId, Option<i64>> = HashMap::new();
    for item in items {
        if let Some(id) = usable_id(item) {
            let total = requested.entry(id).or_insert(Some(0));
            *total = total.and_then(|sum| sum.checked_add(item.qty));
        }
    }

    let mut issues = Vec::new();
    let mut reported: HashSet<&DrugId> = HashSet::new();

    for item in items {
        let Some(id) = usable_id(item) else {
            issues.push(format!("Invalid entry for {}", submitted_name(item)));
            continue;
        };

        let Some(drug) = stock.get(id) else {
            issues.push(format!("Drug not found: {}", item.label()));
            continue;
        };

        let need = requested.get(id).copied().unwrap_or(Some(item.qty));
        let short = need.map(|n| n > drug.quantity).unwrap_or(true);
        if short && reported.insert(id) {
            let need = need
                .map(|n| n.to_string())
                .unwrap_or_else(|| "more than can be counted".to_string());
            issues.push(format!(
                "Insufficient stock for {} (have {}, need {})",
                item.label(),
                drug.quantity,
                need
            ));
        }

        if item.resolve_unit_price(drug).checked_line_total(item.qty).is_none() {
            issues.push(format!("Line total too large for {}", item.label()));
        }
    }

    SaleValidation::from_issues(issues)
}

/// The line's drug id when the line is well-formed (id present, qty > 0).
fn usable_id(item: &SaleLineItem) -> Option<&DrugId> {
    item.drug_id
        .as_ref()
        .filter(|id| !id.as_str().trim().is_empty())
        .filter(|_| item.qty > 0)
}

fn submitted_name(item: &SaleLineItem) -> &str {
    item.drug_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown item")
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a drug name: required, at most 200 characters.
pub fn validate_drug_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_DRUG_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_DRUG_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a quantity on hand (zero allowed).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price (zero allowed for free items).
pub fn validate_price(price: UnitPrice) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates the amount of an increase/decrease adjustment.
pub fn validate_adjustment_amount(amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates an adjustment reason: required.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    if reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::tests::drug;

    #[test]
    fn test_valid_sale() {
        let drugs = vec![drug("d1", 5, 1000)];
        let result = validate_sale_request(&drugs, &[SaleLineItem::new("d1", 3)]);
        assert!(result.ok);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_missing_drug_reported() {
        let mut drug_a = drug("1", 5, 100);
        drug_a.name = "Drug A".to_string();
        let items = vec![
            SaleLineItem::new("1", 3).with_name("Drug A"),
            SaleLineItem::new("2", 1).with_name("Missing Drug"),
        ];

        let result = validate_sale_request(&[drug_a], &items);
        assert!(!result.ok);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("Drug not found"));
    }

    #[test]
    fn test_insufficient_stock_message() {
        let drugs = vec![drug("d1", 5, 1000)];
        let result = validate_sale_request(&drugs, &[SaleLineItem::new("d1", 10)]);
        assert_eq!(
            result.issues,
            vec!["Insufficient stock for d1 (have 5, need 10)"]
        );
    }

    #[test]
    fn test_invalid_entries() {
        let drugs = vec![drug("d1", 5, 1000)];
        let items = vec![
            SaleLineItem::new("d1", 0).with_name("Zero Qty"),
            SaleLineItem {
                drug_id: None,
                ..SaleLineItem::default()
            },
            SaleLineItem::new("d1", -2),
        ];

        let result = validate_sale_request(&drugs, &items);
        assert_eq!(
            result.issues,
            vec![
                "Invalid entry for Zero Qty",
                "Invalid entry for Unknown item",
                "Invalid entry for Unknown item",
            ]
        );
    }

    #[test]
    fn test_every_line_checked() {
        let drugs = vec![drug("d1", 1, 1000), drug("d2", 1, 1000)];
        let items = vec![
            SaleLineItem::new("d1", 2),
            SaleLineItem::new("ghost", 1),
            SaleLineItem::new("d2", 5),
        ];

        let result = validate_sale_request(&drugs, &items);
        assert_eq!(result.issues.len(), 3);
    }

    #[test]
    fn test_duplicate_lines_are_aggregated() {
        // Each line fits on its own (3 ≤ 5) but together they need 6.
        let drugs = vec![drug("d1", 5, 1000)];
        let items = vec![SaleLineItem::new("d1", 3), SaleLineItem::new("d1", 3)];

        let result = validate_sale_request(&drugs, &items);
        assert!(!result.ok);
        assert_eq!(
            result.issues,
            vec!["Insufficient stock for d1 (have 5, need 6)"]
        );
    }

    #[test]
    fn test_duplicate_lines_within_stock_pass() {
        let drugs = vec![drug("d1", 6, 1000)];
        let items = vec![SaleLineItem::new("d1", 3), SaleLineItem::new("d1", 3)];
        assert!(validate_sale_request(&drugs, &items).ok);
    }

    #[test]
    fn test_overflowing_duplicate_lines_are_insufficient() {
        let drugs = vec![drug("d1", 5, 1000)];
        let items = vec![
            SaleLineItem::new("d1", i64::MAX),
            SaleLineItem::new("d1", i64::MAX),
        ];

        let result = validate_sale_request(&drugs, &items);
        assert!(!result.ok);
        assert_eq!(
            result.issues[0],
            "Insufficient stock for d1 (have 5, need more than can be counted)"
        );
    }

    #[test]
    fn test_line_total_overflow_rejected_even_with_stock() {
        let drugs = vec![drug("d1", i64::MAX, 1000)];
        let result = validate_sale_request(&drugs, &[SaleLineItem::new("d1", i64::MAX)]);
        assert_eq!(result.issues, vec!["Line total too large for d1"]);

        let free = vec![drug("d1", i64::MAX, 0)];
        assert!(validate_sale_request(&free, &[SaleLineItem::new("d1", i64::MAX)]).ok);
    }

    #[test]
    fn test_validate_drug_name() {
        assert!(validate_drug_name("Amoxicillin 500mg").is_ok());
        assert!(validate_drug_name("   ").is_err());
        assert!(validate_drug_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
        assert!(validate_price(UnitPrice::default()).is_ok());
        assert!(validate_price(UnitPrice::new(0.001)).is_ok());
        assert!(validate_price(UnitPrice::from_cents(-1)).is_err());
        assert!(validate_adjustment_amount(1).is_ok());
        assert!(validate_adjustment_amount(0).is_err());
        assert!(validate_reason("damaged").is_ok());
        assert!(validate_reason("").is_err());
    }
}
