//! # till-db: SQLite Store for Till
//!
//! Durable implementations of the two external interfaces the checkout
//! depends on: the product catalog and the append-only sales ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Who talks to what                                │
//! │                                                                         │
//! │   till-core (sync, no I/O)           till-db (async, sqlx)              │
//! │   ────────────────────────           ─────────────────────              │
//! │   Catalog trait        ◄── same ops ──  ProductRepository               │
//! │   SalesLedger trait    ◄── same ops ──  SaleRepository                  │
//! │   StoreError           ◄── From ─────── DbError                         │
//! │                                                                         │
//! │   Checkout::prepare_sale ─► SaleRepository::append ─► Checkout::commit  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The repositories are async and the core is not, so the register drives
//! completion in two phases instead of handing a repository to
//! `Checkout::complete`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/till.db")).await?;
//! let hits = db.products().search("jack", 20).await?;
//!
//! let pending = checkout.prepare_sale()?;
//! db.sales().append(pending.record()).await?;
//! let record = checkout.commit(pending)?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, Durability};
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
