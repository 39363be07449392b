//! # Sales Ledger
//!
//! The append-only store of finalized sales, as seen from the core.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SalesLedger trait                                │
//! │                                                                         │
//! │  append(&record) ──► Ok(())            record is durable & visible     │
//! │                  └─► Err(StoreError)   nothing was written             │
//! │                                                                         │
//! │  get(id)         ──► SaleRecord | SaleNotFound                         │
//! │  query(range)    ──► records with start ≤ created_at ≤ end,            │
//! │                      in append order                                   │
//! │                                                                         │
//! │  InMemoryLedger   - this module (tests, single-session use)            │
//! │  SqliteSalesLedger- till-db (async, two-phase via Checkout)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{CoreError, CoreResult, StoreError, ValidationError};
use crate::sale::SaleRecord;

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive `[start, end]` timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// ## Errors
    /// `InvalidFormat` validation error when `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::invalid_format(
                "date_range",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(DateRange { start, end })
    }

    /// Midnight to the last nanosecond of `day` (UTC).
    pub fn day(day: NaiveDate) -> Self {
        let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::nanoseconds(1);
        DateRange { start, end }
    }

    /// Whole days from `first` through `last`, inclusive.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self, ValidationError> {
        Self::new(Self::day(first).start, Self::day(last).end)
    }

    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

// =============================================================================
// Ledger Trait
// =============================================================================

/// An append-only, queryable store of sale records.
pub trait SalesLedger {
    /// Durably records a sale. Must not return `Ok` before the record is
    /// visible to `get` and `query`.
    fn append(&mut self, record: &SaleRecord) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> CoreResult<SaleRecord>;

    /// Records created within `range`, in append order.
    fn query(&self, range: &DateRange) -> Vec<SaleRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// In-Memory Ledger
// =============================================================================

/// A `Vec`-backed ledger with an id index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    records: Vec<SaleRecord>,
    index: HashMap<String, usize>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in append order.
    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }
}

impl SalesLedger for InMemoryLedger {
    fn append(&mut self, record: &SaleRecord) -> Result<(), StoreError> {
        if self.index.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.clone()));
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record.clone());
        debug!(id = %record.id, receipt = %record.receipt_number, "Sale appended to in-memory ledger");
        Ok(())
    }

    fn get(&self, id: &str) -> CoreResult<SaleRecord> {
        self.index
            .get(id)
            .and_then(|i| self.records.get(*i))
            .cloned()
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))
    }

    fn query(&self, range: &DateRange) -> Vec<SaleRecord> {
        self.records
            .iter()
            .filter(|r| range.contains(r.created_at))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
