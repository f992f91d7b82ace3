//! # Repository Module
//!
//! Database repositories for the pharmacy store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesEngine                                                            │
//! │       │                                                                 │
//! │       ├── db.documents()  DocumentRepository                           │
//! │       │     ├── load / load_as(key)                                    │
//! │       │     ├── save(key, doc)                                         │
//! │       │     └── save_batch([(key, doc), ...])   one transaction        │
//! │       │                                                                 │
//! │       └── db.audit()      AuditRepository                              │
//! │             ├── record(event)                                          │
//! │             ├── list() / list_by_action(action)                        │
//! │             └── clear()                                                │
//! │                                                                         │
//! │  SQLite: kv_store, audit_log                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DocumentRepository`](kv::DocumentRepository) - Key→JSON documents
//! - [`AuditRepository`](audit::AuditRepository) - Append-only audit log

pub mod audit;
pub mod kv;
