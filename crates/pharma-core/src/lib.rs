//! # pharma-core: Pure Business Logic for the Pharmacy POS
//!
//! This crate holds the sale-transaction and inventory-consistency rules of
//! the pharmacy point of sale as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pharmacy POS Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI layer (external)                          │   │
//! │  │    Sale form ──► Running total ──► Complete sale ──► Receipt    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              pharma-db::SalesEngine (critical section)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pharma-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  summary  │  │ inventory │  │ validation│  │   sale    │  │   │
//! │  │   │ subtotal  │  │  ledger   │  │ all issues│  │ process / │  │   │
//! │  │   │ tax/change│  │ ±quantity │  │  per sale │  │  reverse  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   types   │  │adjustment │  │  catalog  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS (callers pass `now`)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Drug, SaleLineItem, SaleRecord, AuditEvent)
//! - [`money`] - Money in integer cents, full-precision unit prices
//! - [`summary`] - Running sale totals (subtotal, tax, discount, change)
//! - [`inventory`] - The inventory ledger and its reports
//! - [`validation`] - Sale validator and field rules
//! - [`sale`] - Sale processing and reversal
//! - [`adjustment`] - Manual stock adjustments
//! - [`catalog`] - Adding, editing and removing drugs
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pharma_core::summary::{calculate_sale_summary, SummaryLine, SummaryRates};
//!
//! let lines = [SummaryLine::new(20.0, 2), SummaryLine::new(30.0, 3)];
//! let rates = SummaryRates {
//!     tax_rate_percent: 7.5,
//!     discount_rate_percent: 10.0,
//! };
//!
//! let summary = calculate_sale_summary(&lines, rates, 60.0);
//! assert_eq!(summary.grand_total.cents(), 4875);
//! assert_eq!(summary.change_due.cents(), 1125);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adjustment;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod money;
pub mod sale;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::Inventory;
pub use money::{Money, UnitPrice};
pub use summary::{SaleSummary, SummaryLine, SummaryRates};
pub use types::*;
pub use validation::SaleValidation;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer name recorded when the cashier leaves it blank.
pub const DEFAULT_CUSTOMER_NAME: &str = "Walk-in Customer";

/// `soldBy` recorded when no cashier is logged in.
pub const DEFAULT_SOLD_BY: &str = "unknown";

/// Actor recorded on audit events and adjustments when no user is known.
pub const SYSTEM_ACTOR: &str = "system";

/// Maximum length of a drug name, in characters.
pub const MAX_DRUG_NAME_LEN: usize = 200;
