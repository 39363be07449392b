//! # Sale Repository
//!
//! The durable, append-only sales ledger.
//!
//! ## Append
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       append(record)                                    │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    INSERT INTO sales       (header, totals, tender, cart discount JSON)│
//! │    INSERT INTO sale_lines  (one row per line, line_no = position)      │
//! │  COMMIT   ← with synchronous=FULL this is on disk when it returns      │
//! │                                                                         │
//! │  Any failure rolls the whole sale back: no header without lines.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are never updated or deleted here.

use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use till_core::{
    DateRange, Discount, Money, PaymentMethod, ReceiptSequence, SaleLine, SaleRecord, TaxRate,
};

const SALE_COLUMNS: &str = r#"
    id, receipt_number, created_at,
    subtotal_cents, line_discount_cents, cart_discount, discount_cents,
    tax_rate_bps, tax_cents, total_cents,
    payment_method, cash_tendered_cents, change_given_cents,
    cashier_id, terminal_id, is_refund, original_sale_id
"#;

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    receipt_number: String,
    created_at: chrono::DateTime<Utc>,
    subtotal_cents: i64,
    line_discount_cents: i64,
    cart_discount: Option<String>,
    discount_cents: i64,
    tax_rate_bps: i64,
    tax_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    cash_tendered_cents: i64,
    change_given_cents: i64,
    cashier_id: String,
    terminal_id: String,
    is_refund: bool,
    original_sale_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct SaleLineRow {
    product_id: String,
    sku: String,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
    unit_cost_cents: Option<i64>,
    gross_cents: i64,
    discount_cents: i64,
    line_total_cents: i64,
}

impl From<SaleLineRow> for SaleLine {
    fn from(row: SaleLineRow) -> Self {
        SaleLine {
            product_id: row.product_id,
            sku: row.sku,
            name: row.name,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
            unit_cost: row.unit_cost_cents.map(Money::from_cents),
            gross: Money::from_cents(row.gross_cents),
            discount: Money::from_cents(row.discount_cents),
            line_total: Money::from_cents(row.line_total_cents),
        }
    }
}

impl SaleRow {
    fn into_record(self, lines: Vec<SaleLine>) -> DbResult<SaleRecord> {
        let cart_discount = self
            .cart_discount
            .as_deref()
            .map(serde_json::from_str::<Discount>)
            .transpose()
            .map_err(|e| DbError::corrupt("sales", format!("cart_discount of {}: {e}", self.id)))?;

        let tax_rate_bps = u32::try_from(self.tax_rate_bps).map_err(|_| {
            DbError::corrupt("sales", format!("tax_rate_bps {} of {}", self.tax_rate_bps, self.id))
        })?;

        Ok(SaleRecord {
            id: self.id,
            receipt_number: self.receipt_number,
            created_at: self.created_at,
            lines,
            subtotal: Money::from_cents(self.subtotal_cents),
            line_discount_total: Money::from_cents(self.line_discount_cents),
            cart_discount,
            discount: Money::from_cents(self.discount_cents),
            tax_rate: TaxRate::from_bps(tax_rate_bps),
            tax: Money::from_cents(self.tax_cents),
            total: Money::from_cents(self.total_cents),
            payment_method: self.payment_method,
            cash_tendered: Money::from_cents(self.cash_tendered_cents),
            change_given: Money::from_cents(self.change_given_cents),
            cashier_id: self.cashier_id,
            terminal_id: self.terminal_id,
            is_refund: self.is_refund,
            original_sale_id: self.original_sale_id,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the sales ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a finalized sale and its lines in one transaction.
    ///
    /// Returns only after the transaction has committed.
    ///
    /// ## Errors
    /// `UniqueViolation` if the id or receipt number is already recorded.
    pub async fn append(&self, record: &SaleRecord) -> DbResult<()> {
        debug!(id = %record.id, receipt_number = %record.receipt_number, "Appending sale");

        let cart_discount = record
            .cart_discount
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(format!("cart discount encoding: {e}")))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, created_at,
                subtotal_cents, line_discount_cents, cart_discount, discount_cents,
                tax_rate_bps, tax_cents, total_cents,
                payment_method, cash_tendered_cents, change_given_cents,
                cashier_id, terminal_id, is_refund, original_sale_id
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&record.id)
        .bind(&record.receipt_number)
        .bind(record.created_at)
        .bind(record.subtotal.cents())
        .bind(record.line_discount_total.cents())
        .bind(cart_discount)
        .bind(record.discount.cents())
        .bind(i64::from(record.tax_rate.bps()))
        .bind(record.tax.cents())
        .bind(record.total.cents())
        .bind(record.payment_method)
        .bind(record.cash_tendered.cents())
        .bind(record.change_given.cents())
        .bind(&record.cashier_id)
        .bind(&record.terminal_id)
        .bind(record.is_refund)
        .bind(&record.original_sale_id)
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in record.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, line_no, product_id, sku, name, quantity,
                    unit_price_cents, unit_cost_cents, gross_cents,
                    discount_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&record.id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.unit_cost.map(|c| c.cents()))
            .bind(line.gross.cents())
            .bind(line.discount.cents())
            .bind(line.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %record.id,
            receipt_number = %record.receipt_number,
            lines = record.lines.len(),
            total = %record.total,
            "Sale recorded"
        );
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.get_lines(&row.id).await?;
                Ok(Some(row.into_record(lines)?))
            }
            None => Ok(None),
        }
    }

    pub async fn get_by_receipt(&self, receipt_number: &str) -> DbResult<Option<SaleRecord>> {
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM sales WHERE receipt_number = ?1")
            .bind(receipt_number)
            .fetch_optional(&self.pool)
            .await?;

        match id {
            Some(id) => self.get_by_id(&id).await,
            None => Ok(None),
        }
    }

    /// Sales created within `range` (inclusive), in append order.
    pub async fn query(&self, range: &DateRange) -> DbResult<Vec<SaleRecord>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY seq"
        );
        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), start = %range.start(), end = %range.end(), "Queried sales");

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.get_lines(&row.id).await?;
            records.push(row.into_record(lines)?);
        }
        Ok(records)
    }

    async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let rows: Vec<SaleLineRow> = sqlx::query_as(
            r#"
            SELECT
                product_id, sku, name, quantity,
                unit_price_cents, unit_cost_cents, gross_cents,
                discount_cents, line_total_cents
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleLine::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Receipt counter for `terminal_id`, continuing from the last sale it
    /// recorded on `day`.
    pub async fn receipt_sequence(&self, terminal_id: &str, day: NaiveDate) -> DbResult<ReceiptSequence> {
        let range = DateRange::day(day);
        let last: Option<String> = sqlx::query_scalar(
            r#"
            SELECT receipt_number FROM sales
            WHERE terminal_id = ?1 AND created_at >= ?2 AND created_at <= ?3
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(terminal_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_optional(&self.pool)
        .await?;

        let last_seq = match last {
            Some(receipt) => parse_receipt_seq(&receipt).ok_or_else(|| {
                DbError::corrupt("sales", format!("unparseable receipt number {receipt}"))
            })?,
            None => 0,
        };

        debug!(terminal_id, %day, last_seq, "Resuming receipt sequence");
        Ok(ReceiptSequence::resume(day, last_seq))
    }
}

/// `20260131-01-0042` → 42
fn parse_receipt_seq(receipt: &str) -> Option<u32> {
    receipt.rsplit('-').next()?.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use till_core::StoreError;

    fn record(id: &str, receipt: &str, at: chrono::DateTime<Utc>) -> SaleRecord {
        let line = SaleLine {
            product_id: "p1".to_string(),
            sku: "JACDA001".to_string(),
            name: "Jack Daniels Old No. 7".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(2499),
            unit_cost: Some(Money::from_cents(1850)),
            gross: Money::from_cents(4998),
            discount: Money::zero(),
            line_total: Money::from_cents(4998),
        };
        SaleRecord {
            id: id.to_string(),
            receipt_number: receipt.to_string(),
            created_at: at,
            lines: vec![line.clone(), SaleLine { product_id: "p2".to_string(), ..line }],
            subtotal: Money::from_cents(9996),
            line_discount_total: Money::zero(),
            cart_discount: Some(Discount::percentage_bps(1000).unwrap().with_reason("loyalty")),
            discount: Money::from_cents(1000),
            tax_rate: TaxRate::from_bps(850),
            tax: Money::from_cents(765),
            total: Money::from_cents(9761),
            payment_method: PaymentMethod::Cash,
            cash_tendered: Money::from_cents(10_000),
            change_given: Money::from_cents(239),
            cashier_id: "CASHIER-001".to_string(),
            terminal_id: "01".to_string(),
            is_refund: false,
            original_sale_id: None,
        }
    }

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_append_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let original = record("s1", "20260131-01-0001", at(31, 12));

        db.sales().append(&original).await.unwrap();

        let stored = db.sales().get_by_id("s1").await.unwrap().unwrap();
        assert_eq!(stored, original);
        assert_eq!(stored.lines[1].product_id, "p2");

        let by_receipt = db.sales().get_by_receipt("20260131-01-0001").await.unwrap();
        assert_eq!(by_receipt.map(|r| r.id), Some("s1".to_string()));
        assert!(db.sales().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_append_maps_to_store_duplicate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let original = record("s1", "20260131-01-0001", at(31, 12));
        db.sales().append(&original).await.unwrap();

        let err = db.sales().append(&original).await.unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Duplicate(_)));
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_append_leaves_no_partial_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.sales().append(&record("s1", "R-1", at(31, 9))).await.unwrap();

        // Same receipt number, new id: header insert fails, nothing is kept.
        let clash = record("s2", "R-1", at(31, 10));
        assert!(db.sales().append(&clash).await.is_err());
        assert!(db.sales().get_by_id("s2").await.unwrap().is_none());

        let orphan_lines: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_lines WHERE sale_id = 's2'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphan_lines, 0);
    }

    #[tokio::test]
    async fn test_query_inclusive_in_append_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        repo.append(&record("late", "R-1", at(31, 18))).await.unwrap();
        repo.append(&record("early", "R-2", at(31, 8))).await.unwrap();
        repo.append(&record("other-day", "R-3", at(30, 12))).await.unwrap();
        repo.append(&record("noon", "R-4", at(31, 12))).await.unwrap();

        let range = DateRange::new(at(31, 8), at(31, 18)).unwrap();
        let ids: Vec<_> = repo.query(&range).await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["late", "early", "noon"]);

        let day = NaiveDate::from_ymd_opt(2026, 1, 30).unwrap();
        let ids: Vec<_> = repo
            .query(&DateRange::day(day))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["other-day"]);
    }

    #[tokio::test]
    async fn test_receipt_sequence_resumes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let day = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        let fresh = repo.receipt_sequence("01", day).await.unwrap();
        assert_eq!(fresh.peek("01", at(31, 9)), "20260131-01-0001");

        repo.append(&record("a", "20260131-01-0001", at(31, 9))).await.unwrap();
        repo.append(&record("b", "20260131-01-0002", at(31, 9) + Duration::minutes(5)))
            .await
            .unwrap();
        let other_terminal = SaleRecord {
            terminal_id: "02".to_string(),
            ..record("c", "20260131-02-0007", at(31, 10))
        };
        repo.append(&other_terminal).await.unwrap();

        let mut seq = repo.receipt_sequence("01", day).await.unwrap();
        assert_eq!(seq.issue("01", at(31, 11)), "20260131-01-0003");
    }

    #[test]
    fn test_parse_receipt_seq() {
        assert_eq!(parse_receipt_seq("20260131-01-0042"), Some(42));
        assert_eq!(parse_receipt_seq("garbage"), None);
    }
}
