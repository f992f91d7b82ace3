//! # Sale Processing
//!
//! Turns a validated list of line items into sale records, and undoes a
//! record again.
//!
//! ## Processing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_sale(inventory, sales, items, options, now)                    │
//! │                                                                         │
//! │  1. validate_sale_request(inventory, items)                             │
//! │       └── any issue? ──► Err(ValidationRejected), NOTHING touched       │
//! │                                                                         │
//! │  2. date/time from `now`, once, shared by every line                    │
//! │                                                                         │
//! │  3. for each line, in order:                                            │
//! │       ├── re-fetch drug (earlier lines may have decremented it)         │
//! │       ├── adjust_quantity(drug, -qty)                                   │
//! │       ├── SaleRecord { fresh UUID, line_total = round2(qty × price) }   │
//! │       └── append to sales                                               │
//! │                                                                         │
//! │  4. return the new records (caller persists + audits)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The caller is responsible for running this inside its critical section
//! so nothing can change the inventory between steps 1 and 3.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::inventory::Inventory;
use crate::types::{SaleLineItem, SaleOptions, SaleRecord};
use crate::validation::validate_sale_request;

/// Date format shared by sale records.
pub const SALE_DATE_FORMAT: &str = "%Y-%m-%d";
/// Time format shared by sale records.
pub const SALE_TIME_FORMAT: &str = "%H:%M:%S";

/// Validates and applies a sale.
///
/// ## Returns
/// * `Ok(records)` - one record per line item, in line order
/// * `Err(CoreError::ValidationRejected)` - inventory and sales untouched
pub fn process_sale(
    inventory: &mut Inventory,
    sales: &mut Vec<SaleRecord>,
    items: &[SaleLineItem],
    options: &SaleOptions,
    now: DateTime<Utc>,
) -> CoreResult<Vec<SaleRecord>> {
    if items.is_empty() {
        return Err(CoreError::ValidationRejected {
            issues: vec!["No items in sale".to_string()],
        });
    }

    let validation = validate_sale_request(inventory.drugs(), items);
    if !validation.ok {
        return Err(CoreError::ValidationRejected {
            issues: validation.issues,
        });
    }

    let date = now.format(SALE_DATE_FORMAT).to_string();
    let time = now.format(SALE_TIME_FORMAT).to_string();
    let customer_name = options.customer_name();
    let payment_method = options.payment_method();
    let sold_by = options.sold_by();

    let mut created = Vec::with_capacity(items.len());

    for item in items {
        // Validation guarantees a drug id and a matching drug.
        let drug_id = item
            .drug_id
            .clone()
            .ok_or_else(|| CoreError::ValidationRejected {
                issues: vec![format!("Invalid entry for {}", item.label())],
            })?;
        let drug = inventory
            .find_by_id(&drug_id)
            .ok_or_else(|| CoreError::DrugNotFound(drug_id.clone()))?;

        let unit_price = item.resolve_unit_price(drug);
        let drug_name = drug.name.clone();

        inventory.adjust_quantity(&drug_id, -item.qty);

        let record = SaleRecord {
            id: Uuid::new_v4().to_string(),
            drug_id,
            drug_name,
            quantity: item.qty,
            unit_price,
            line_total: unit_price.line_total(item.qty),
            customer_name: customer_name.clone(),
            payment_method,
            date: date.clone(),
            time: time.clone(),
            sold_by: sold_by.clone(),
        };

        sales.push(record.clone());
        created.push(record);
    }

    Ok(created)
}

/// What a reversal did.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleReversal {
    /// The removed record.
    pub record: SaleRecord,
    /// New quantity of the drug, or `None` when the drug no longer exists and
    /// the restore step was skipped.
    pub restored_quantity: Option<i64>,
}

/// Removes a sale record and puts its quantity back into stock.
///
/// ## Returns
/// * `Ok(reversal)` - record removed, stock restored when the drug exists
/// * `Err(CoreError::SaleNotFound)` - nothing changed
pub fn reverse_sale(
    inventory: &mut Inventory,
    sales: &mut Vec<SaleRecord>,
    sale_id: &str,
) -> CoreResult<SaleReversal> {
    let index = sales
        .iter()
        .position(|s| s.id == sale_id)
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    let record = sales.remove(index);
    let restored_quantity = inventory.adjust_quantity(&record.drug_id, record.quantity);

    Ok(SaleReversal {
        record,
        restored_quantity,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::tests::drug;
    use crate::money::{Money, UnitPrice};
    use crate::types::{DrugId, PaymentMethod};
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_single_line_sale() {
        let mut inventory = Inventory::new(vec![drug("d1", 5, 1000)]);
        let mut sales = Vec::new();
        let items = [SaleLineItem::new("d1", 3).with_price(Money::from_cents(1000))];

        let records =
            process_sale(&mut inventory, &mut sales, &items, &SaleOptions::default(), now())
                .unwrap();

        assert_eq!(inventory.stock_of(&DrugId::from("d1")), Some(2));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_total, Money::from_cents(3000));
        assert_eq!(records[0].customer_name, "Walk-in Customer");
        assert_eq!(records[0].payment_method, PaymentMethod::Cash);
        assert_eq!(records[0].sold_by, "unknown");
        assert_eq!(records[0].date, "2026-10-16");
        assert_eq!(records[0].time, "09:30:05");
        assert_eq!(sales, records);
    }

    #[test]
    fn test_rejected_sale_touches_nothing() {
        let mut inventory = Inventory::new(vec![drug("d1", 5, 1000)]);
        let mut sales = Vec::new();
        let before = inventory.clone();

        let err = process_sale(
            &mut inventory,
            &mut sales,
            &[SaleLineItem::new("d1", 10)],
            &SaleOptions::default(),
            now(),
        )
        .unwrap_err();

        assert!(err.issues()[0].contains("Insufficient stock for"));
        assert_eq!(inventory, before);
        assert!(sales.is_empty());
    }

    #[test]
    fn test_empty_sale_rejected() {
        let mut inventory = Inventory::default();
        let mut sales = Vec::new();
        let err = process_sale(&mut inventory, &mut sales, &[], &SaleOptions::default(), now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationRejected { .. }));
    }

    #[test]
    fn test_lines_share_timestamp_and_see_prior_decrements() {
        let mut inventory = Inventory::new(vec![drug("d1", 6, 250), drug("d2", 1, 99)]);
        let mut sales = Vec::new();
        let items = [
            SaleLineItem::new("d1", 2),
            SaleLineItem::new("d2", 1),
            SaleLineItem::new("d1", 4),
        ];
        let options = SaleOptions {
            customer_name: Some("Jane Doe".to_string()),
            payment_method: Some(PaymentMethod::Card),
            sold_by: Some("cashier1".to_string()),
        };

        let records = process_sale(&mut inventory, &mut sales, &items, &options, now()).unwrap();

        assert_eq!(inventory.stock_of(&DrugId::from("d1")), Some(0));
        assert_eq!(inventory.stock_of(&DrugId::from("d2")), Some(0));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.date == records[0].date && r.time == records[0].time));
        assert!(records.iter().all(|r| r.sold_by == "cashier1"));
        assert_eq!(records[2].line_total, Money::from_cents(1000));

        let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_sub_cent_price_rounds_line_total_only() {
        let mut zinc = drug("z1", 10, 0);
        zinc.price = UnitPrice::new(0.333);
        let mut inventory = Inventory::new(vec![zinc]);
        let mut sales = Vec::new();

        let records = process_sale(
            &mut inventory,
            &mut sales,
            &[SaleLineItem::new("z1", 3)],
            &SaleOptions::default(),
            now(),
        )
        .unwrap();

        assert_eq!(records[0].unit_price, UnitPrice::new(0.333));
        assert_eq!(records[0].line_total, Money::from_cents(100));
    }

    #[test]
    fn test_overflowing_quantities_rejected_without_changes() {
        let mut inventory = Inventory::new(vec![drug("d1", 5, 1000)]);
        let mut sales = Vec::new();
        let before = inventory.clone();
        let items = [
            SaleLineItem::new("d1", i64::MAX),
            SaleLineItem::new("d1", i64::MAX),
        ];

        let err = process_sale(&mut inventory, &mut sales, &items, &SaleOptions::default(), now())
            .unwrap_err();

        assert!(err.issues()[0].starts_with("Insufficient stock for d1"));
        assert_eq!(inventory, before);
        assert!(sales.is_empty());
    }

    #[test]
    fn test_reverse_restores_stock() {
        let mut inventory = Inventory::new(vec![drug("d1", 5, 1000)]);
        let mut sales = Vec::new();
        let records = process_sale(
            &mut inventory,
            &mut sales,
            &[SaleLineItem::new("d1", 2)],
            &SaleOptions::default(),
            now(),
        )
        .unwrap();

        let reversal = reverse_sale(&mut inventory, &mut sales, &records[0].id).unwrap();

        assert_eq!(reversal.restored_quantity, Some(5));
        assert_eq!(inventory.stock_of(&DrugId::from("d1")), Some(5));
        assert!(sales.is_empty());
    }

    #[test]
    fn test_reverse_with_deleted_drug_skips_restore() {
        let mut inventory = Inventory::new(vec![drug("d1", 5, 1000)]);
        let mut sales = Vec::new();
        let records = process_sale(
            &mut inventory,
            &mut sales,
            &[SaleLineItem::new("d1", 2)],
            &SaleOptions::default(),
            now(),
        )
        .unwrap();
        inventory.remove(&DrugId::from("d1"));

        let reversal = reverse_sale(&mut inventory, &mut sales, &records[0].id).unwrap();
        assert_eq!(reversal.restored_quantity, None);
        assert!(sales.is_empty());
    }

    #[test]
    fn test_reverse_unknown_sale() {
        let mut inventory = Inventory::default();
        let mut sales = Vec::new();
        let err = reverse_sale(&mut inventory, &mut sales, "nope").unwrap_err();
        assert_eq!(err, CoreError::SaleNotFound("nope".to_string()));
    }
}
