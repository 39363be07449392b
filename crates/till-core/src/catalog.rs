//! # Catalog
//!
//! Read-only product lookup as the checkout sees it.
//!
//! The SQLite-backed `ProductRepository` in till-db serves the register;
//! [`InMemoryCatalog`] serves tests and demos.
//!
//! ## Matching
//! ```text
//! query "jck dn"
//!   1. substring   "jck dn" in name/sku/brand/category/barcode?   no
//!   2. fuzzy       j..c..k.. ..d..n in order in any field?         yes
//!                  "Jack Daniel's Old No. 7"
//! ```
//! Substring matches win; fuzzy matching is only tried when no product
//! matches by substring.

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::types::Product;

/// Source of products for the cart.
pub trait Catalog {
    /// Active products matching `query`. An empty query returns every active
    /// product.
    fn search(&self, query: &str) -> Vec<Product>;

    /// ## Errors
    /// `ProductNotFound` if no product has this id.
    fn get(&self, id: &str) -> CoreResult<Product>;

    /// ## Errors
    /// `ProductNotFound` if no product has this SKU.
    fn get_by_sku(&self, sku: &str) -> CoreResult<Product>;
}

/// A `Vec`-backed catalog, kept sorted by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = InMemoryCatalog::default();
        for product in products {
            catalog.upsert(product);
        }
        catalog
    }

    /// Inserts or replaces by id.
    pub fn upsert(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
        self.products.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn active(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_active)
    }
}

impl Catalog for InMemoryCatalog {
    fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.active().cloned().collect();
        }

        let substring: Vec<Product> = self
            .active()
            .filter(|p| {
                p.search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        if !substring.is_empty() {
            debug!(query, hits = substring.len(), "Catalog substring search");
            return substring;
        }

        let fuzzy: Vec<Product> = self
            .active()
            .filter(|p| {
                p.search_fields()
                    .iter()
                    .any(|field| is_subsequence(&needle, &field.to_lowercase()))
            })
            .cloned()
            .collect();
        debug!(query, hits = fuzzy.len(), "Catalog fuzzy search");
        fuzzy
    }

    fn get(&self, id: &str) -> CoreResult<Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    fn get_by_sku(&self, sku: &str) -> CoreResult<Product> {
        self.products
            .iter()
            .find(|p| p.sku.eq_ignore_ascii_case(sku))
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(sku.to_string()))
    }
}

/// True when every non-space char of `needle` appears in `haystack`, in
/// order.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.chars();
    needle
        .chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| hay.any(|h| h == c))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn product(id: &str, name: &str, brand: &str, active: bool) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{id}"),
            barcode: Some(format!("0000{id}")),
            name: name.to_string(),
            brand: brand.to_string(),
            category: "Whiskey".to_string(),
            price: Money::from_cents(2499),
            cost: None,
            is_active: active,
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(vec![
            product("1", "Jack Daniel's Old No. 7", "Jack Daniel's", true),
            product("2", "Jameson Irish Whiskey", "Jameson", true),
            product("3", "Discontinued Rye", "Old Brand", false),
        ])
    }

    #[test]
    fn test_substring_search_case_insensitive() {
        let hits = catalog().search("JAMESON");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn test_search_matches_barcode_and_sku() {
        let c = catalog();
        assert_eq!(c.search("00001")[0].id, "1");
        assert_eq!(c.search("sku-2")[0].id, "2");
    }

    #[test]
    fn test_fuzzy_fallback() {
        let hits = catalog().search("jck dn");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn test_inactive_excluded_from_search() {
        let c = catalog();
        assert!(c.search("rye").is_empty());
        assert_eq!(c.search("").len(), 2);
        // Direct lookup still finds it; the cart refuses it.
        assert!(!c.get("3").unwrap().is_active);
    }

    #[test]
    fn test_get_missing() {
        let c = catalog();
        assert!(matches!(c.get("nope"), Err(CoreError::ProductNotFound(_))));
        assert_eq!(c.get_by_sku("sku-1").unwrap().id, "1");
    }

    #[test]
    fn test_upsert_replaces() {
        let mut c = catalog();
        let mut updated = product("2", "Jameson Black Barrel", "Jameson", true);
        updated.price = Money::from_cents(3999);
        c.upsert(updated);
        assert_eq!(c.len(), 3);
        assert_eq!(c.get("2").unwrap().price.cents(), 3999);
    }
}
