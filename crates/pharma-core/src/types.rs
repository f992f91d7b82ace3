//! # Domain Types
//!
//! Core domain types used throughout the pharmacy engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Drug       │   │  SaleLineItem   │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (DrugId)    │◄──│  drug_id        │   │  id (UUID)      │       │
//! │  │  name           │   │  qty            │──►│  drug snapshot  │       │
//! │  │  quantity ≥ 0   │   │  unit_price?    │   │  line_total     │       │
//! │  │  price          │   │  (UI only)      │   │  (persisted)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ StockAdjustment │   │   AuditEvent    │   │ PaymentMethod   │       │
//! │  │  old → new qty  │   │  action/details │   │  Cash           │       │
//! │  │  reason, user   │   │  timestamp/user │   │  Card ...       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleRecord` copies the drug id and name at sale time, so history stays
//! readable after the drug itself is removed from the catalog.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{Money, UnitPrice};
use crate::{DEFAULT_CUSTOMER_NAME, DEFAULT_SOLD_BY};

// =============================================================================
// Drug Id
// =============================================================================

/// Canonical drug identifier.
///
/// ## Legacy Ids
/// Older stored documents carry numeric ids (`"id": 1718000000000`), newer
/// ones carry strings. Both are resolved into this textual form when a
/// document is deserialized, so every comparison after load is a plain
/// string comparison and `1` matches `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct DrugId(String);

impl DrugId {
    pub fn new(id: impl Into<String>) -> Self {
        DrugId(id.into())
    }

    /// Generates a fresh id for a newly added drug.
    pub fn generate() -> Self {
        DrugId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DrugId {
    fn from(id: &str) -> Self {
        DrugId(id.to_string())
    }
}

impl From<String> for DrugId {
    fn from(id: String) -> Self {
        DrugId(id)
    }
}

/// The two shapes an id can take in stored documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredId {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for DrugId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match StoredId::deserialize(deserializer)? {
            StoredId::Text(s) => Ok(DrugId(s)),
            StoredId::Number(n) => Ok(DrugId(legacy_number_to_id(&n))),
        }
    }
}

/// Renders a numeric id the way it was shown when it was created:
/// integral values without a fractional part.
fn legacy_number_to_id(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

// =============================================================================
// Drug
// =============================================================================

/// An inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Drug {
    /// Unique, stable identifier.
    pub id: DrugId,

    /// Display name shown to the cashier and copied onto sale records.
    pub name: String,

    #[serde(default)]
    pub category: String,

    /// Quantity on hand. Never negative.
    #[serde(deserialize_with = "lenient_quantity")]
    pub quantity: i64,

    /// Unit price, at the precision it was entered.
    #[ts(as = "f64")]
    pub price: UnitPrice,

    /// Expiry date (`YYYY-MM-DD`). Blank in some older documents.
    #[serde(default, deserialize_with = "optional_date")]
    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,

    #[serde(default)]
    pub supplier: String,
}

impl Drug {
    /// Stock value of this drug (quantity × price, rounded to the cent).
    pub fn stock_value(&self) -> Money {
        self.price.line_total(self.quantity)
    }

    /// Checks whether the drug expires on or before `date`.
    pub fn expires_by(&self, date: NaiveDate) -> bool {
        self.expiry.map(|e| e <= date).unwrap_or(false)
    }
}

/// Accepts integral numbers or numeric strings; anything unusable becomes 0
/// and negatives are clamped to 0 so loaded stock can never start negative.
fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(crate::summary::coerce_number(&value).trunc().max(0.0) as i64)
}

pub(crate) fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            // Accept full ISO timestamps by keeping the date part.
            let date_part = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map(Some)
                .map_err(de::Error::custom)
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "cash")]
    Cash,
    #[serde(alias = "card")]
    Card,
    #[serde(rename = "Mobile Money", alias = "mobile_money", alias = "mobile")]
    MobileMoney,
    #[serde(alias = "insurance")]
    Insurance,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::Insurance => "Insurance",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// One drug + quantity + price entry in a sale being composed.
///
/// Transient: never persisted on its own. `drug_id` is optional because the
/// UI may submit a row before a drug was picked; the validator reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineItem {
    #[serde(default)]
    pub drug_id: Option<DrugId>,

    #[serde(default)]
    pub drug_name: Option<String>,

    #[serde(alias = "quantity")]
    pub qty: i64,

    /// Price override; `None` means "use the drug's current price".
    #[serde(default, alias = "price")]
    #[ts(as = "Option<f64>")]
    pub unit_price: Option<UnitPrice>,
}

impl SaleLineItem {
    pub fn new(drug_id: impl Into<DrugId>, qty: i64) -> Self {
        SaleLineItem {
            drug_id: Some(drug_id.into()),
            drug_name: None,
            qty,
            unit_price: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.drug_name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<UnitPrice>) -> Self {
        self.unit_price = Some(price.into());
        self
    }

    /// Name used in messages: the submitted name, else the id, else a
    /// placeholder.
    pub fn label(&self) -> String {
        match (&self.drug_name, &self.drug_id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => id.to_string(),
            _ => "Unknown item".to_string(),
        }
    }

    /// Resolves the unit price for this line: the explicit override when
    /// given, otherwise the drug's catalog price.
    pub fn resolve_unit_price(&self, drug: &Drug) -> UnitPrice {
        self.unit_price.unwrap_or(drug.price)
    }

    /// Line total at the resolved price, rounded to the cent.
    pub fn line_total(&self, drug: &Drug) -> Money {
        self.resolve_unit_price(drug).line_total(self.qty)
    }
}

// =============================================================================
// Sale Options
// =============================================================================

/// Per-sale options shared by every line of one sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleOptions {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub sold_by: Option<String>,
}

impl SaleOptions {
    pub fn customer_name(&self) -> String {
        non_blank(&self.customer_name).unwrap_or(DEFAULT_CUSTOMER_NAME).to_string()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method.unwrap_or_default()
    }

    pub fn sold_by(&self) -> String {
        non_blank(&self.sold_by).unwrap_or(DEFAULT_SOLD_BY).to_string()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// =============================================================================
// Sale Record
// =============================================================================

/// A persisted, immutable record of one line item sold.
///
/// ## Lifecycle
/// `created → (optionally) deleted`. Records are never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    pub drug_id: DrugId,
    /// Drug name at time of sale (frozen).
    pub drug_name: String,
    pub quantity: i64,
    #[ts(as = "f64")]
    pub unit_price: UnitPrice,
    /// Always `round2(quantity × unit_price)`.
    #[ts(as = "f64")]
    pub line_total: Money,
    pub customer_name: String,
    pub payment_method: PaymentMethod,
    /// `YYYY-MM-DD`, shared by every line of one sale.
    pub date: String,
    /// `HH:MM:SS`, shared by every line of one sale.
    pub time: String,
    pub sold_by: String,
}

impl SaleRecord {
    /// Human-readable audit text for this line.
    pub fn audit_details(&self) -> String {
        format!(
            "Sold {} of {} for {}",
            self.quantity, self.drug_name, self.line_total
        )
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AdjustmentKind {
    Increase,
    Decrease,
    /// Replace the quantity on hand (stock count correction).
    SetTo,
}

/// A persisted record of one manual stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockAdjustment {
    pub id: String,
    pub drug_id: DrugId,
    pub drug_name: String,
    pub kind: AdjustmentKind,
    pub old_quantity: i64,
    pub new_quantity: i64,
    /// Delta description: `+5`, `-3` or `set to 10`.
    pub change: String,
    pub reason: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub user: String,
}

impl StockAdjustment {
    /// Signed stock movement caused by this adjustment.
    pub fn delta(&self) -> i64 {
        self.new_quantity - self.old_quantity
    }
}

// =============================================================================
// Audit Event
// =============================================================================

/// An append-only record of a mutating action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuditEvent {
    pub action: String,
    pub details: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "actor"))]
    pub user: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
