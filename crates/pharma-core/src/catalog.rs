//! Drug catalog maintenance: add, edit and remove drug records.
//!
//! Removing a drug never touches sale history; sale records keep their own
//! snapshot of the drug id and name.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::inventory::Inventory;
use crate::money::UnitPrice;
use crate::types::{optional_date, Drug, DrugId};
use crate::validation::{validate_drug_name, validate_price, validate_stock_quantity};

/// Fields for a new drug. The id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewDrug {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub quantity: i64,
    #[ts(as = "f64")]
    pub price: UnitPrice,
    #[serde(default, deserialize_with = "optional_date")]
    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,
    #[serde(default)]
    pub supplier: String,
}

impl NewDrug {
    fn validate(&self) -> CoreResult<()> {
        validate_drug_name(&self.name)?;
        validate_stock_quantity(self.quantity)?;
        validate_price(self.price)?;
        Ok(())
    }
}

/// Partial update of a drug; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DrugUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    #[ts(as = "Option<f64>")]
    pub price: Option<UnitPrice>,
    /// Absent leaves the expiry alone; `null` or `""` (`Some(None)`) clears it.
    #[serde(
        default,
        deserialize_with = "present_date",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(as = "Option<Option<String>>")]
    pub expiry: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl DrugUpdate {
    fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_drug_name(name)?;
        }
        if let Some(quantity) = self.quantity {
            validate_stock_quantity(quantity)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    fn apply_to(self, drug: &mut Drug) {
        if let Some(name) = self.name {
            drug.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            drug.category = category;
        }
        if let Some(quantity) = self.quantity {
            drug.quantity = quantity;
        }
        if let Some(price) = self.price {
            drug.price = price;
        }
        if let Some(expiry) = self.expiry {
            drug.expiry = expiry;
        }
        if let Some(supplier) = self.supplier {
            drug.supplier = supplier;
        }
    }
}

/// Only called when the key is present, so an explicit `null` becomes
/// `Some(None)` instead of collapsing into "unchanged".
fn present_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<NaiveDate>>, D::Error> {
    optional_date(deserializer).map(Some)
}

/// Validates and appends a new drug with a fresh id.
pub fn add_drug(inventory: &mut Inventory, new: NewDrug) -> CoreResult<Drug> {
    new.validate()?;

    let drug = Drug {
        id: DrugId::generate(),
        name: new.name.trim().to_string(),
        category: new.category,
        quantity: new.quantity,
        price: new.price,
        expiry: new.expiry,
        supplier: new.supplier,
    };
    inventory.push(drug.clone());
    Ok(drug)
}

/// Applies a partial update and returns the updated drug.
pub fn update_drug(inventory: &mut Inventory, id: &DrugId, update: DrugUpdate) -> CoreResult<Drug> {
    update.validate()?;

    let drug = inventory
        .find_by_id_mut(id)
        .ok_or_else(|| CoreError::DrugNotFound(id.clone()))?;
    update.apply_to(drug);
    Ok(drug.clone())
}

/// Removes a drug and returns it.
pub fn remove_drug(inventory: &mut Inventory, id: &DrugId) -> CoreResult<Drug> {
    inventory
        .remove(id)
        .ok_or_else(|| CoreError::DrugNotFound(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;
    use serde_json::json;

    fn new_drug(name: &str) -> NewDrug {
        NewDrug {
            name: name.to_string(),
            category: "Antibiotics".to_string(),
            quantity: 20,
            price: UnitPrice::from_cents(450),
            expiry: NaiveDate::from_ymd_opt(2027, 6, 30),
            supplier: "MedSupply".to_string(),
        }
    }

    #[test]
    fn test_add_assigns_fresh_ids() {
        let mut inventory = Inventory::default();
        let a = add_drug(&mut inventory, new_drug("  Amoxicillin  ")).unwrap();
        let b = add_drug(&mut inventory, new_drug("Ibuprofen")).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "Amoxicillin");
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn test_add_rejects_bad_fields() {
        let mut inventory = Inventory::default();

        let err = add_drug(&mut inventory, new_drug("")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));

        let mut negative = new_drug("X");
        negative.quantity = -1;
        assert!(add_drug(&mut inventory, negative).is_err());

        let mut free = new_drug("Y");
        free.price = UnitPrice::from_cents(-5);
        assert!(add_drug(&mut inventory, free).is_err());

        assert!(inventory.is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let mut inventory = Inventory::default();
        let drug = add_drug(&mut inventory, new_drug("Cetirizine")).unwrap();

        let updated = update_drug(
            &mut inventory,
            &drug.id,
            DrugUpdate {
                price: Some(UnitPrice::new(4.995)),
                expiry: Some(None),
                ..DrugUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.price, UnitPrice::new(4.995));
        assert_eq!(updated.expiry, None);
        assert_eq!(updated.quantity, 20);

        let bad = DrugUpdate {
            quantity: Some(-3),
            ..DrugUpdate::default()
        };
        assert!(update_drug(&mut inventory, &drug.id, bad).is_err());
        assert_eq!(inventory.stock_of(&drug.id), Some(20));

        let removed = remove_drug(&mut inventory, &drug.id).unwrap();
        assert_eq!(removed.name, "Cetirizine");
        assert_eq!(
            remove_drug(&mut inventory, &drug.id).unwrap_err(),
            CoreError::DrugNotFound(drug.id.clone())
        );
    }

    #[test]
    fn test_update_document_distinguishes_null_from_absent_expiry() {
        let clear: DrugUpdate = serde_json::from_value(json!({ "expiry": null })).unwrap();
        assert_eq!(clear.expiry, Some(None));

        let blank: DrugUpdate = serde_json::from_value(json!({ "expiry": "" })).unwrap();
        assert_eq!(blank.expiry, Some(None));

        let keep: DrugUpdate = serde_json::from_value(json!({ "price": 3 })).unwrap();
        assert_eq!(keep.expiry, None);
        assert_eq!(keep.price, Some(UnitPrice::from_cents(300)));

        let set: DrugUpdate = serde_json::from_value(json!({ "expiry": "2027-03-31" })).unwrap();
        assert_eq!(set.expiry, Some(NaiveDate::from_ymd_opt(2027, 3, 31)));

        let mut inventory = Inventory::default();
        let drug = add_drug(&mut inventory, new_drug("Loratadine")).unwrap();
        let updated = update_drug(&mut inventory, &drug.id, clear).unwrap();
        assert_eq!(updated.expiry, None);
    }
}
