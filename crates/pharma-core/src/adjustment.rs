//! # Stock Adjustments
//!
//! Manual stock changes outside the sale flow: deliveries, breakage, and
//! stock-count corrections. Each one is logged with the quantity before and
//! after, a short delta description, the reason and the actor.
//!
//! ```text
//!   Increase  +amount        old 10 ──► 15    change "+5"
//!   Decrease  -amount        old 10 ──► 7     change "-3"
//!   SetTo     = amount       old 10 ──► 4     change "set to 4"
//! ```
//!
//! A decrease larger than the quantity on hand is rejected outright rather
//! than clamped, so stock history always adds up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::inventory::Inventory;
use crate::types::{AdjustmentKind, DrugId, StockAdjustment};
use crate::validation::{validate_adjustment_amount, validate_reason, validate_stock_quantity};
use crate::SYSTEM_ACTOR;

/// A requested stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdjustmentRequest {
    pub drug_id: DrugId,
    pub kind: AdjustmentKind,
    pub amount: i64,
    pub reason: String,
}

impl AdjustmentRequest {
    pub fn new(
        drug_id: impl Into<DrugId>,
        kind: AdjustmentKind,
        amount: i64,
        reason: impl Into<String>,
    ) -> Self {
        AdjustmentRequest {
            drug_id: drug_id.into(),
            kind,
            amount,
            reason: reason.into(),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        match self.kind {
            AdjustmentKind::SetTo => validate_stock_quantity(self.amount)?,
            AdjustmentKind::Increase | AdjustmentKind::Decrease => {
                validate_adjustment_amount(self.amount)?
            }
        }
        validate_reason(&self.reason)?;
        Ok(())
    }

    fn change_label(&self) -> String {
        match self.kind {
            AdjustmentKind::Increase => format!("+{}", self.amount),
            AdjustmentKind::Decrease => format!("-{}", self.amount),
            AdjustmentKind::SetTo => format!("set to {}", self.amount),
        }
    }
}

/// Applies a stock adjustment and appends its record to `log`.
///
/// Nothing is changed when an error is returned.
pub fn apply_adjustment(
    inventory: &mut Inventory,
    log: &mut Vec<StockAdjustment>,
    request: &AdjustmentRequest,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<StockAdjustment> {
    request.validate()?;

    let drug = inventory
        .find_by_id_mut(&request.drug_id)
        .ok_or_else(|| CoreError::DrugNotFound(request.drug_id.clone()))?;

    let old_quantity = drug.quantity;
    let new_quantity = match request.kind {
        AdjustmentKind::Increase => old_quantity.saturating_add(request.amount),
        AdjustmentKind::Decrease => {
            if request.amount > old_quantity {
                return Err(CoreError::InsufficientStock {
                    name: drug.name.clone(),
                    available: old_quantity,
                    requested: request.amount,
                });
            }
            old_quantity - request.amount
        }
        AdjustmentKind::SetTo => request.amount,
    };
    drug.quantity = new_quantity;

    let record = StockAdjustment {
        id: Uuid::new_v4().to_string(),
        drug_id: drug.id.clone(),
        drug_name: drug.name.clone(),
        kind: request.kind,
        old_quantity,
        new_quantity,
        change: request.change_label(),
        reason: request.reason.trim().to_string(),
        date: now,
        user: actor
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(SYSTEM_ACTOR)
            .to_string(),
    };

    log.push(record.clone());
    Ok(record)
}

impl StockAdjustment {
    /// Human-readable audit text for this adjustment.
    pub fn audit_details(&self) -> String {
        format!(
            "Adjusted {} ({}): {} -> {}, reason: {}",
            self.drug_name, self.change, self.old_quantity, self.new_quantity, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::tests::drug;
    use crate::ValidationError;

    fn setup() -> (Inventory, Vec<StockAdjustment>) {
        (Inventory::new(vec![drug("d1", 10, 500)]), Vec::new())
    }

    #[test]
    fn test_increase_decrease_set() {
        let (mut inventory, mut log) = setup();
        let id = DrugId::from("d1");

        let inc = AdjustmentRequest::new("d1", AdjustmentKind::Increase, 5, "delivery");
        let record = apply_adjustment(&mut inventory, &mut log, &inc, Some("alice"), Utc::now()).unwrap();
        assert_eq!((record.old_quantity, record.new_quantity), (10, 15));
        assert_eq!(record.change, "+5");
        assert_eq!(record.user, "alice");

        let dec = AdjustmentRequest::new("d1", AdjustmentKind::Decrease, 3, "broken");
        let record = apply_adjustment(&mut inventory, &mut log, &dec, None, Utc::now()).unwrap();
        assert_eq!(record.change, "-3");
        assert_eq!(record.delta(), -3);
        assert_eq!(record.user, "system");

        let set = AdjustmentRequest::new("d1", AdjustmentKind::SetTo, 4, "stock count");
        let record = apply_adjustment(&mut inventory, &mut log, &set, None, Utc::now()).unwrap();
        assert_eq!(record.change, "set to 4");
        assert_eq!(inventory.stock_of(&id), Some(4));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_decrease_beyond_stock_rejected() {
        let (mut inventory, mut log) = setup();
        let before = inventory.clone();

        let dec = AdjustmentRequest::new("d1", AdjustmentKind::Decrease, 11, "expired");
        let err = apply_adjustment(&mut inventory, &mut log, &dec, None, Utc::now()).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { available: 10, requested: 11, .. }));
        assert_eq!(inventory, before);
        assert!(log.is_empty());
    }

    #[test]
    fn test_invalid_requests() {
        let (mut inventory, mut log) = setup();

        let zero = AdjustmentRequest::new("d1", AdjustmentKind::Increase, 0, "x");
        let err = apply_adjustment(&mut inventory, &mut log, &zero, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::MustBePositive { .. })));

        let no_reason = AdjustmentRequest::new("d1", AdjustmentKind::SetTo, 0, "  ");
        let err = apply_adjustment(&mut inventory, &mut log, &no_reason, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));

        let missing = AdjustmentRequest::new("ghost", AdjustmentKind::Increase, 1, "x");
        let err = apply_adjustment(&mut inventory, &mut log, &missing, None, Utc::now()).unwrap_err();
        assert_eq!(err, CoreError::DrugNotFound(DrugId::from("ghost")));

        assert!(log.is_empty());
    }
}
