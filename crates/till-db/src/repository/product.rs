//! # Product Repository
//!
//! The `products` table, serving both catalog lookup and the seed tool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Catalog Search Works                             │
//! │                                                                         │
//! │  Operator types: "jack"                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pattern = "%jack%"   (% and _ in the query are escaped)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE over name, sku, brand, category, barcode  (ASCII case-folded)    │
//! │  AND is_active = 1                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY name LIMIT ?   ← caller caps the result size                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::{Money, Product};

const PRODUCT_COLUMNS: &str =
    "id, sku, barcode, name, brand, category, price_cents, cost_cents, is_active";

/// `products` row as stored.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    barcode: Option<String>,
    name: String,
    brand: String,
    category: String,
    price_cents: i64,
    cost_cents: Option<i64>,
    is_active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            barcode: row.barcode,
            name: row.name,
            brand: row.brand,
            category: row.category,
            price: Money::from_cents(row.price_cents),
            cost: row.cost_cents.map(Money::from_cents),
            is_active: row.is_active,
        }
    }
}

/// ```rust,ignore
/// let hits = db.products().search("jack", 20).await?;
/// let product = db.products().resolve("JACDA001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Case-insensitive substring search over name, SKU, brand, category and
    /// barcode. Inactive products are never returned.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", escape_like(query));

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
            AND (
                name LIKE ?1 ESCAPE '\'
                OR sku LIKE ?1 ESCAPE '\'
                OR brand LIKE ?1 ESCAPE '\'
                OR category LIKE ?1 ESCAPE '\'
                OR barcode LIKE ?1 ESCAPE '\'
            )
            ORDER BY name
            LIMIT ?2
            "#
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Includes inactive products; the cart refuses those itself.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1 COLLATE NOCASE");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Looks a product up by id, then SKU, then exact barcode.
    ///
    /// This is what the register's `add` command resolves against.
    pub async fn resolve(&self, key: &str) -> DbResult<Option<Product>> {
        if let Some(product) = self.get_by_id(key).await? {
            return Ok(Some(product));
        }
        if let Some(product) = self.get_by_sku(key).await? {
            return Ok(Some(product));
        }
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 LIMIT 1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    /// ## Errors
    /// `UniqueViolation` if the id or SKU already exists.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, brand, category,
                price_cents, cost_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.price.cents())
        .bind(product.cost.map(|c| c.cents()))
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// ## Errors
    /// `NotFound` if no product has this id.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                name = ?4,
                brand = ?5,
                category = ?6,
                price_cents = ?7,
                cost_cents = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.price.cents())
        .bind(product.cost.map(|c| c.cents()))
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting `is_active = 0`.
    ///
    /// Past sales keep their frozen copy of the product either way.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Fresh catalog key for a product that has none yet.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================
