//! # Inventory Ledger
//!
//! The set of drug records with their quantity on hand.
//!
//! ## Who May Mutate Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Ledger Writers                            │
//! │                                                                         │
//! │  sale::process_sale     ──► adjust_quantity(id, -qty)                  │
//! │  sale::reverse_sale     ──► adjust_quantity(id, +qty)                  │
//! │  adjustment::apply      ──► increase / decrease / set-to               │
//! │  catalog (add/edit/remove drug records)                                 │
//! │                                                                         │
//! │  Everything else reads.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Drug, DrugId};

/// The drug list, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    drugs: Vec<Drug>,
}

impl Inventory {
    pub fn new(drugs: Vec<Drug>) -> Self {
        Inventory { drugs }
    }

    pub fn drugs(&self) -> &[Drug] {
        &self.drugs
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// Looks a drug up by id.
    pub fn find_by_id(&self, id: &DrugId) -> Option<&Drug> {
        self.drugs.iter().find(|d| &d.id == id)
    }

    pub(crate) fn find_by_id_mut(&mut self, id: &DrugId) -> Option<&mut Drug> {
        self.drugs.iter_mut().find(|d| &d.id == id)
    }

    /// Current quantity on hand, or `None` for an unknown drug.
    pub fn stock_of(&self, id: &DrugId) -> Option<i64> {
        self.find_by_id(id).map(|d| d.quantity)
    }

    /// Sets `quantity = max(0, quantity + delta)` and returns the new
    /// quantity. Unknown ids are left alone and yield `None`.
    ///
    /// Never fails. The zero floor absorbs restorations that overshoot.
    pub fn adjust_quantity(&mut self, id: &DrugId, delta: i64) -> Option<i64> {
        let drug = self.find_by_id_mut(id)?;
        drug.quantity = drug.quantity.saturating_add(delta).max(0);
        Some(drug.quantity)
    }

    pub(crate) fn push(&mut self, drug: Drug) {
        self.drugs.push(drug);
    }

    pub(crate) fn remove(&mut self, id: &DrugId) -> Option<Drug> {
        let index = self.drugs.iter().position(|d| &d.id == id)?;
        Some(self.drugs.remove(index))
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Drugs with quantity at or below `threshold`.
    pub fn low_stock(&self, threshold: i64) -> Vec<&Drug> {
        self.drugs.iter().filter(|d| d.quantity <= threshold).collect()
    }

    /// Drugs expiring on or before `today + days`, already-expired included,
    /// soonest first.
    pub fn expiring_within(&self, today: NaiveDate, days: i64) -> Vec<&Drug> {
        let horizon = today + Duration::days(days.clamp(0, 36_500));
        let mut expiring: Vec<&Drug> = self.drugs.iter().filter(|d| d.expires_by(horizon)).collect();
        expiring.sort_by_key(|d| d.expiry);
        expiring
    }

    /// Total stock value at catalog prices.
    pub fn inventory_value(&self) -> Money {
        self.drugs.iter().map(Drug::stock_value).sum()
    }
}

impl From<Vec<Drug>> for Inventory {
    fn from(drugs: Vec<Drug>) -> Self {
        Inventory::new(drugs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
