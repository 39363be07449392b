//! # Repositories
//!
//! One repository per table family. Both are cheap to build: each holds a
//! clone of the pool, so `db.products()` and `db.sales()` are called per use.
//!
//! ```text
//! products                           sales + sale_lines
//! ────────                           ──────────────────
//! ProductRepository                  SaleRepository
//!   search(query, limit)               append(record)        one transaction
//!   get_by_id / get_by_sku             get_by_id / get_by_receipt
//!   resolve(key)                       query(range)
//!   insert / update / soft_delete      receipt_sequence(terminal, day)
//! ```
//!
//! Sales are never updated or deleted once appended.

pub mod product;
pub mod sale;
