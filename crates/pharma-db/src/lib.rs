//! # pharma-db: Storage and Engine Layer for the Pharmacy POS
//!
//! This crate persists the pharmacy ledger in SQLite and exposes
//! [`SalesEngine`], the single entry point for every mutating operation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pharmacy POS Data Flow                           │
//! │                                                                         │
//! │  UI: "Complete sale"                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pharma-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  SalesEngine  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (engine.rs)  │───►│   (kv.rs)     │    │  (embedded)  │  │   │
//! │  │   │               │    │  (audit.rs)   │    │              │  │   │
//! │  │   │ Mutex<Ledger> │    │               │    │ 001_init.sql │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │ pure rules         │                               │   │
//! │  │           ▼                    ▼                               │   │
//! │  │       pharma-core        Database (pool.rs)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: kv_store (drugs, sales, stockAdjustments), audit_log  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - The serialized sales engine
//! - [`config`] - Engine configuration (`PHARMA_*` variables)
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and engine error types
//! - [`repository`] - Document and audit repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharma_db::{Database, EngineConfig, SalesEngine, StoreConfig};
//! use pharma_core::{SaleLineItem, SaleOptions};
//!
//! let db = Database::new(StoreConfig::new("./pharmacy.db")).await?;
//! let engine = SalesEngine::open(db, EngineConfig::from_env()).await?;
//!
//! let records = engine
//!     .process_sale(&[SaleLineItem::new("d1", 2)], &SaleOptions::default())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use engine::{SalesEngine, ADJUSTMENTS_KEY, DRUGS_KEY, SALES_KEY};
pub use error::{ApiError, DbError, DbResult, EngineError, EngineResult, ErrorCode};
pub use pool::{Database, StoreConfig};

// Repository re-exports for convenience
pub use repository::audit::AuditRepository;
pub use repository::kv::DocumentRepository;
