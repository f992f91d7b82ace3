//! # Sales Engine
//!
//! The service object the UI layer talks to. It owns the in-memory ledger
//! (drugs, sales, stock adjustments), runs every mutating operation as one
//! critical section, persists the touched documents and writes the audit
//! trail.
//!
//! ## Critical Section
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_sale(items, options)                                           │
//! │                                                                         │
//! │  ┌──────────────────── state.lock() ─────────────────────────────────┐  │
//! │  │                                                                   │  │
//! │  │  validate ──► mutate inventory + sales  (pharma_core::sale)       │  │
//! │  │     │                                                             │  │
//! │  │     └── rejected? return, nothing touched                         │  │
//! │  │                                                                   │  │
//! │  │  persist: BEGIN; drugs; sales; COMMIT                             │  │
//! │  │     │                                                             │  │
//! │  │     └── failed? state.dirty = true, keep memory, report Storage   │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  audit: one "sale" event per line (best-effort, lock already released)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No other sale, reversal or adjustment can run between validation and
//! mutation, so "validated before any mutation" holds with many callers.
//!
//! ## Storage Failures
//! A failed write leaves memory ahead of disk. Memory is never rolled back;
//! the engine is marked dirty and the next successful write (or an explicit
//! [`SalesEngine::flush`]) rewrites every document.

use chrono::{NaiveDate, Utc};
use pharma_core::adjustment::{apply_adjustment, AdjustmentRequest};
use pharma_core::catalog::{self, DrugUpdate, NewDrug};
use pharma_core::sale::{self, SaleReversal, SALE_DATE_FORMAT};
use pharma_core::summary::{calculate_sale_summary, SummaryLine};
use pharma_core::validation::validate_sale_request;
use pharma_core::{
    AuditEvent, Drug, DrugId, Inventory, Money, SaleLineItem, SaleOptions, SaleRecord,
    SaleSummary, SaleValidation, StockAdjustment, SummaryRates, SYSTEM_ACTOR,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{DbError, DbResult, EngineError, EngineResult};
use crate::pool::Database;

/// Document key for the drug list.
pub const DRUGS_KEY: &str = "drugs";
/// Document key for the sale list.
pub const SALES_KEY: &str = "sales";
/// Document key for the stock adjustment log.
pub const ADJUSTMENTS_KEY: &str = "stockAdjustments";

// =============================================================================
// Ledger State
// =============================================================================

/// The persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Document {
    Drugs,
    Sales,
    Adjustments,
}

impl Document {
    const ALL: [Document; 3] = [Document::Drugs, Document::Sales, Document::Adjustments];

    fn key(self) -> &'static str {
        match self {
            Document::Drugs => DRUGS_KEY,
            Document::Sales => SALES_KEY,
            Document::Adjustments => ADJUSTMENTS_KEY,
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    inventory: Inventory,
    sales: Vec<SaleRecord>,
    adjustments: Vec<StockAdjustment>,
    /// Memory holds changes that storage may not have.
    dirty: bool,
}

impl LedgerState {
    fn encode(&self, document: Document) -> DbResult<(&'static str, Value)> {
        let key = document.key();
        let value = match document {
            Document::Drugs => serde_json::to_value(&self.inventory),
            Document::Sales => serde_json::to_value(&self.sales),
            Document::Adjustments => serde_json::to_value(&self.adjustments),
        }
        .map_err(|e| DbError::serialization(key, e))?;
        Ok((key, value))
    }
}

// =============================================================================
// Sales Engine
// =============================================================================

/// Serialized access to the pharmacy ledger.
///
/// ## Example
/// ```rust,ignore
/// let db = Database::new(StoreConfig::new("./pharmacy.db")).await?;
/// let engine = SalesEngine::open(db, EngineConfig::from_env()).await?;
///
/// let records = engine
///     .process_sale(&[SaleLineItem::new("d1", 3)], &SaleOptions::default())
///     .await?;
/// ```
#[derive(Debug)]
pub struct SalesEngine {
    db: Database,
    config: EngineConfig,
    state: Mutex<LedgerState>,
}

impl SalesEngine {
    /// Loads the ledger documents and returns a ready engine.
    ///
    /// Missing documents start empty. Legacy numeric drug ids are converted
    /// to their string form here and written back as strings on the next
    /// save.
    pub async fn open(db: Database, config: EngineConfig) -> DbResult<Self> {
        let documents = db.documents();

        let inventory: Inventory = documents.load_as(DRUGS_KEY).await?.unwrap_or_default();
        let sales: Vec<SaleRecord> = documents.load_as(SALES_KEY).await?.unwrap_or_default();
        let adjustments: Vec<StockAdjustment> =
            documents.load_as(ADJUSTMENTS_KEY).await?.unwrap_or_default();

        info!(
            store = %config.store_name,
            drugs = inventory.len(),
            sales = sales.len(),
            adjustments = adjustments.len(),
            "Ledger loaded"
        );

        Ok(SalesEngine {
            db,
            config,
            state: Mutex::new(LedgerState {
                inventory,
                sales,
                adjustments,
                dirty: false,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Running totals for an in-progress sale. Items without a price use the
    /// drug's current price.
    pub async fn summarize(
        &self,
        items: &[SaleLineItem],
        rates: SummaryRates,
        cash_received: f64,
    ) -> SaleSummary {
        let state = self.state.lock().await;
        let lines: Vec<SummaryLine> = items
            .iter()
            .map(|item| {
                let drug = item
                    .drug_id
                    .as_ref()
                    .and_then(|id| state.inventory.find_by_id(id));
                SummaryLine::for_item(item, drug)
            })
            .collect();

        calculate_sale_summary(&lines, rates, cash_received)
    }

    /// [`summarize`](Self::summarize) at the configured default tax and
    /// discount rates.
    pub async fn summarize_at_default_rates(
        &self,
        items: &[SaleLineItem],
        cash_received: f64,
    ) -> SaleSummary {
        self.summarize(items, self.config.summary_rates(), cash_received)
            .await
    }

    /// Checks a sale without applying it.
    pub async fn validate(&self, items: &[SaleLineItem]) -> SaleValidation {
        let state = self.state.lock().await;
        validate_sale_request(state.inventory.drugs(), items)
    }

    /// Validates and applies a sale, then persists and audits it.
    ///
    /// ## Returns
    /// * `Ok(records)` - one record per line item
    /// * `Err(Rejected)` - nothing changed
    /// * `Err(Storage)` - the sale is applied in memory but not yet durable
    pub async fn process_sale(
        &self,
        items: &[SaleLineItem],
        options: &SaleOptions,
    ) -> EngineResult<Vec<SaleRecord>> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let records = match sale::process_sale(
            &mut state.inventory,
            &mut state.sales,
            items,
            options,
            Utc::now(),
        ) {
            Ok(records) => records,
            Err(err) => {
                info!(issues = ?err.issues(), "Sale rejected");
                return Err(err.into());
            }
        };

        let total: Money = records.iter().map(|r| r.line_total).sum();
        info!(lines = records.len(), total = %total, "Sale processed");

        let persisted = self
            .persist(state, &[Document::Drugs, Document::Sales])
            .await;
        drop(guard);

        let actor = actor_or_system(options.sold_by.as_deref());
        for record in &records {
            self.audit("sale", record.audit_details(), &actor).await;
        }

        persisted?;
        Ok(records)
    }

    /// Deletes a sale and restores the stock it consumed.
    ///
    /// When the drug was removed from the catalog in the meantime the
    /// restore step is skipped and only the record is deleted.
    pub async fn delete_sale(
        &self,
        sale_id: &str,
        actor: Option<&str>,
    ) -> EngineResult<SaleReversal> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let reversal = sale::reverse_sale(&mut state.inventory, &mut state.sales, sale_id)
            .map_err(|err| {
                info!(sale_id = %sale_id, "Sale to delete not found");
                EngineError::from(err)
            })?;

        let record = &reversal.record;
        match reversal.restored_quantity {
            Some(quantity) => info!(
                sale_id = %record.id,
                drug_id = %record.drug_id,
                restored = record.quantity,
                quantity,
                "Sale deleted, stock restored"
            ),
            None => warn!(
                sale_id = %record.id,
                drug_id = %record.drug_id,
                "Sale deleted, drug no longer exists so stock was not restored"
            ),
        }

        // Sales first: a crash in between leaves stock short, never a
        // missing sale with restored stock.
        let persisted = self
            .persist(state, &[Document::Sales, Document::Drugs])
            .await;
        drop(guard);

        let mut details = format!(
            "Deleted sale of {} x {} ({})",
            record.quantity, record.drug_name, record.line_total
        );
        if reversal.restored_quantity.is_none() {
            details.push_str("; stock not restored, drug removed");
        }
        self.audit("delete_sale", details, &actor_or_system(actor)).await;

        persisted?;
        Ok(reversal)
    }

    /// All sale records in insertion order.
    pub async fn list_sales(&self) -> Vec<SaleRecord> {
        self.state.lock().await.sales.clone()
    }

    /// Sale records dated `date`.
    pub async fn sales_on(&self, date: NaiveDate) -> Vec<SaleRecord> {
        let day = date.format(SALE_DATE_FORMAT).to_string();
        let state = self.state.lock().await;
        state.sales.iter().filter(|s| s.date == day).cloned().collect()
    }

    /// Sum of all line totals on record.
    pub async fn sales_total(&self) -> Money {
        let state = self.state.lock().await;
        state.sales.iter().map(|s| s.line_total).sum()
    }

    // =========================================================================
    // Stock Adjustments
    // =========================================================================

    /// Applies a manual stock change and logs it.
    pub async fn adjust_stock(
        &self,
        request: &AdjustmentRequest,
        actor: Option<&str>,
    ) -> EngineResult<StockAdjustment> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let record = apply_adjustment(
            &mut state.inventory,
            &mut state.adjustments,
            request,
            actor,
            Utc::now(),
        )
        .map_err(|err| {
            info!(drug_id = %request.drug_id, error = %err, "Stock adjustment rejected");
            EngineError::from(err)
        })?;

        info!(
            drug_id = %record.drug_id,
            old = record.old_quantity,
            new = record.new_quantity,
            change = %record.change,
            "Stock adjusted"
        );

        let persisted = self
            .persist(state, &[Document::Drugs, Document::Adjustments])
            .await;
        drop(guard);
        self.audit("stock_adjustment", record.audit_details(), &record.user)
            .await;

        persisted?;
        Ok(record)
    }

    /// The stock adjustment log in insertion order.
    pub async fn adjustments(&self) -> Vec<StockAdjustment> {
        self.state.lock().await.adjustments.clone()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn drugs(&self) -> Vec<Drug> {
        self.state.lock().await.inventory.drugs().to_vec()
    }

    pub async fn find_drug(&self, id: &DrugId) -> Option<Drug> {
        self.state.lock().await.inventory.find_by_id(id).cloned()
    }

    pub async fn add_drug(&self, new: NewDrug, actor: Option<&str>) -> EngineResult<Drug> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let drug = catalog::add_drug(&mut state.inventory, new)?;
        info!(drug_id = %drug.id, name = %drug.name, quantity = drug.quantity, "Drug added");

        let persisted = self.persist(state, &[Document::Drugs]).await;
        drop(guard);
        self.audit(
            "add_drug",
            format!("Added drug: {} (qty {})", drug.name, drug.quantity),
            &actor_or_system(actor),
        )
        .await;

        persisted?;
        Ok(drug)
    }

    pub async fn update_drug(
        &self,
        id: &DrugId,
        update: DrugUpdate,
        actor: Option<&str>,
    ) -> EngineResult<Drug> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let drug = catalog::update_drug(&mut state.inventory, id, update)?;
        info!(drug_id = %drug.id, "Drug updated");

        let persisted = self.persist(state, &[Document::Drugs]).await;
        drop(guard);
        self.audit(
            "edit_drug",
            format!("Updated drug: {}", drug.name),
            &actor_or_system(actor),
        )
        .await;

        persisted?;
        Ok(drug)
    }

    /// Removes a drug. Its sale records stay untouched.
    pub async fn remove_drug(&self, id: &DrugId, actor: Option<&str>) -> EngineResult<Drug> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let drug = catalog::remove_drug(&mut state.inventory, id)?;
        info!(drug_id = %drug.id, "Drug removed");

        let persisted = self.persist(state, &[Document::Drugs]).await;
        drop(guard);
        self.audit(
            "delete_drug",
            format!("Deleted drug: {}", drug.name),
            &actor_or_system(actor),
        )
        .await;

        persisted?;
        Ok(drug)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub async fn low_stock(&self, threshold: i64) -> Vec<Drug> {
        let state = self.state.lock().await;
        state.inventory.low_stock(threshold).into_iter().cloned().collect()
    }

    pub async fn expiring_within(&self, today: NaiveDate, days: i64) -> Vec<Drug> {
        let state = self.state.lock().await;
        state
            .inventory
            .expiring_within(today, days)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn inventory_value(&self) -> Money {
        self.state.lock().await.inventory.inventory_value()
    }

    // =========================================================================
    // Audit
    // =========================================================================

    pub async fn audit_log(&self) -> DbResult<Vec<AuditEvent>> {
        self.db.audit().list().await
    }

    pub async fn clear_audit_log(&self) -> DbResult<u64> {
        self.db.audit().clear().await
    }

    /// Best-effort audit write. Failures are logged and swallowed.
    ///
    /// Callers release the ledger lock first, so a slow audit insert never
    /// holds up other operations.
    async fn audit(&self, action: &str, details: String, actor: &str) {
        let event = AuditEvent {
            action: action.to_string(),
            details,
            timestamp: Utc::now(),
            user: actor.to_string(),
        };

        if let Err(err) = self.db.audit().record(&event).await {
            warn!(action = %action, error = %err, "Audit event not recorded");
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Whether memory holds changes that have not reached storage.
    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    /// Rewrites every document. Use after a `Storage` error.
    pub async fn flush(&self) -> EngineResult<()> {
        let mut guard = self.state.lock().await;
        self.persist(&mut guard, &Document::ALL).await?;
        info!("Ledger flushed to storage");
        Ok(())
    }

    async fn persist(&self, state: &mut LedgerState, touched: &[Document]) -> EngineResult<()> {
        // After an earlier failure any document may be stale.
        let documents: &[Document] = if state.dirty { &Document::ALL } else { touched };

        let result = match documents
            .iter()
            .map(|d| state.encode(*d))
            .collect::<DbResult<Vec<_>>>()
        {
            Ok(batch) => self.db.documents().save_batch(&batch).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                if state.dirty {
                    info!("Storage caught up with memory");
                }
                state.dirty = false;
                debug!(documents = documents.len(), "Ledger persisted");
                Ok(())
            }
            Err(err) => {
                state.dirty = true;
                error!(
                    error = %err,
                    "Ledger not saved; memory is ahead of storage, retry with flush"
                );
                Err(EngineError::Storage(err))
            }
        }
    }
}

fn actor_or_system(actor: Option<&str>) -> String {
    actor
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(SYSTEM_ACTOR)
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StoreConfig;
    use pharma_core::UnitPrice;
    use serde_json::json;

    async fn engine() -> SalesEngine {
        let db = Database::new(StoreConfig::in_memory()).await.unwrap();
        SalesEngine::open(db, EngineConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_empty_store() {
        let engine = engine().await;
        assert!(engine.drugs().await.is_empty());
        assert!(engine.list_sales().await.is_empty());
        assert!(!engine.is_dirty().await);
    }

    #[tokio::test]
    async fn test_open_migrates_legacy_ids() {
        let db = Database::new(StoreConfig::in_memory()).await.unwrap();
        db.documents()
            .save(
                DRUGS_KEY,
                &json!([{"id": 1718000000000_i64, "name": "Old", "quantity": 4, "price": 2.5}]),
            )
            .await
            .unwrap();

        let engine = SalesEngine::open(db.clone(), EngineConfig::default()).await.unwrap();
        let records = engine
            .process_sale(&[SaleLineItem::new("1718000000000", 1)], &SaleOptions::default())
            .await
            .unwrap();
        assert_eq!(records[0].line_total.cents(), 250);

        let stored = db.documents().load(DRUGS_KEY).await.unwrap().unwrap();
        assert_eq!(stored[0]["id"], json!("1718000000000"));
        assert_eq!(stored[0]["quantity"], json!(3));
    }

    #[tokio::test]
    async fn test_summarize_uses_catalog_prices() {
        let engine = engine().await;
        let drug = engine
            .add_drug(
                NewDrug {
                    name: "Paracetamol".into(),
                    category: String::new(),
                    quantity: 10,
                    price: UnitPrice::from_cents(250),
                    expiry: None,
                    supplier: String::new(),
                },
                None,
            )
            .await
            .unwrap();

        let items = [
            SaleLineItem::new(drug.id.clone(), 2),
            SaleLineItem::new(drug.id, 1).with_price(Money::from_cents(100)),
        ];
        let summary = engine.summarize(&items, SummaryRates::new(10.0, 0.0), 10.0).await;

        assert_eq!(summary.subtotal.cents(), 600);
        assert_eq!(summary.tax_amount.cents(), 60);
        assert_eq!(summary.grand_total.cents(), 660);
        assert_eq!(summary.change_due.cents(), 340);
        assert_eq!(summary.total_units, 3);
    }

    #[tokio::test]
    async fn test_summarize_at_default_rates_uses_config() {
        let db = Database::new(StoreConfig::in_memory()).await.unwrap();
        let config = EngineConfig {
            default_tax_rate_percent: 10.0,
            default_discount_rate_percent: 50.0,
            ..EngineConfig::default()
        };
        let engine = SalesEngine::open(db, config).await.unwrap();

        let items = [SaleLineItem::new("ghost", 2).with_price(Money::from_cents(500))];
        let summary = engine.summarize_at_default_rates(&items, 10.0).await;

        assert_eq!(summary.subtotal.cents(), 1000);
        assert_eq!(summary.tax_amount.cents(), 100);
        assert_eq!(summary.discount_amount.cents(), 500);
        assert_eq!(summary.grand_total.cents(), 600);
    }

    #[tokio::test]
    async fn test_audit_outage_leaves_ledger_usable() {
        let engine = engine().await;
        let drug = engine
            .add_drug(
                NewDrug {
                    name: "Ibuprofen".into(),
                    category: String::new(),
                    quantity: 10,
                    price: UnitPrice::from_cents(300),
                    expiry: None,
                    supplier: String::new(),
                },
                None,
            )
            .await
            .unwrap();

        sqlx::query("ALTER TABLE audit_log RENAME TO audit_log_offline")
            .execute(engine.database().pool())
            .await
            .unwrap();

        let records = engine
            .process_sale(&[SaleLineItem::new(drug.id.clone(), 2)], &SaleOptions::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        // The ledger lock is free again as soon as the sale returns.
        assert!(engine.state.try_lock().is_ok());
        assert_eq!(engine.find_drug(&drug.id).await.map(|d| d.quantity), Some(8));
        assert!(!engine.is_dirty().await);

        sqlx::query("ALTER TABLE audit_log_offline RENAME TO audit_log")
            .execute(engine.database().pool())
            .await
            .unwrap();
        let log = engine.audit_log().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, "add_drug");
    }

    #[test]
    fn test_actor_defaults_to_system() {
        assert_eq!(actor_or_system(None), "system");
        assert_eq!(actor_or_system(Some("  ")), "system");
        assert_eq!(actor_or_system(Some("alice")), "alice");
    }
}
