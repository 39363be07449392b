//! # Seed Data Generator
//!
//! Populates the catalog with liquor-store products for development.
//!
//! ## Usage
//! ```bash
//! # Base catalog (18 products, 750ml)
//! cargo run -p till-db --bin seed
//!
//! # Add 375ml / 1L / 1.75L variants as well
//! cargo run -p till-db --bin seed -- --sizes
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! Barcodes are sequential and not valid EAN check digits.

use std::env;
use till_core::{Money, Product};
use till_db::repository::product::generate_product_id;
use till_db::{Database, DbConfig};

/// (name, brand, category, sku, price_cents, cost_cents)
const CATALOG: &[(&str, &str, &str, &str, i64, i64)] = &[
    ("Jack Daniels Old No. 7", "Jack Daniels", "Whiskey", "JACDA001", 2499, 1850),
    ("Jameson Irish Whiskey", "Jameson", "Whiskey", "JAMIR001", 2999, 2200),
    ("Crown Royal Canadian Whisky", "Crown Royal", "Whiskey", "CRORO001", 3299, 2450),
    ("Macallan 18 Year Old", "Macallan", "Whiskey", "MACWHI001", 44999, 35000),
    ("Grey Goose Vodka", "Grey Goose", "Vodka", "GREVO001", 4299, 3200),
    ("Absolut Vodka", "Absolut", "Vodka", "ABSVO001", 1999, 1450),
    ("Tito's Handmade Vodka", "Tito's", "Vodka", "TITVO001", 2199, 1600),
    ("Kendall-Jackson Vintner's Reserve Chardonnay", "Kendall-Jackson", "Wine", "KENCHA001", 1899, 1350),
    ("Caymus Cabernet Sauvignon", "Caymus", "Wine", "CAYCAB001", 8999, 6500),
    ("Dom Pérignon Champagne", "Dom Pérignon", "Wine", "DOMCHA001", 19999, 15000),
    ("Corona Extra 12-Pack", "Corona", "Beer", "CORBEE001", 1499, 1100),
    ("Heineken 6-Pack", "Heineken", "Beer", "HEIBEE001", 999, 725),
    ("Bacardi Superior White Rum", "Bacardi", "Rum", "BACRUM001", 1699, 1250),
    ("Captain Morgan Spiced Rum", "Captain Morgan", "Rum", "CAPRUM001", 1999, 1475),
    ("Tanqueray London Dry Gin", "Tanqueray", "Gin", "TANGIN001", 2299, 1700),
    ("Bombay Sapphire Gin", "Bombay", "Gin", "BOMGIN001", 2499, 1850),
    ("Patron Silver Tequila", "Patron", "Tequila", "PATTEG001", 4999, 3750),
    ("Jose Cuervo Especial Gold", "Jose Cuervo", "Tequila", "JOSTEG001", 1799, 1325),
];

/// Extra bottle sizes: (label, SKU suffix, price multiplier in percent).
const SIZES: &[(&str, &str, i64)] = &[("375ml", "H", 55), ("1L", "L", 130), ("1.75L", "X", 190)];

/// Categories sold by the bottle; beer and packs have no size variants.
const SIZED_CATEGORIES: &[&str] = &["Whiskey", "Vodka", "Rum", "Gin", "Tequila"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut with_sizes = false;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sizes" | "-s" => with_sizes = true,
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sizes        Also insert 375ml / 1L / 1.75L variants");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    println!("Till Seed Data Generator");
    println!("========================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let products = build_catalog(with_sizes);
    let mut inserted = 0;
    for product in &products {
        if let Err(e) = db.products().insert(product).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }
        inserted += 1;
    }

    println!("✓ Inserted {inserted} of {} products", products.len());

    let hits = db.products().search("vodka", 10).await?;
    println!("  Search 'vodka': {} results", hits.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn build_catalog(with_sizes: bool) -> Vec<Product> {
    let mut products = Vec::new();
    let mut barcode_seq = 1737_u64;

    for &(name, brand, category, sku, price, cost) in CATALOG {
        products.push(product(name, brand, category, sku, price, cost, barcode_seq));
        barcode_seq += 7;

        if with_sizes && SIZED_CATEGORIES.contains(&category) {
            for &(label, suffix, pct) in SIZES {
                products.push(product(
                    &format!("{name} {label}"),
                    brand,
                    category,
                    &format!("{sku}{suffix}"),
                    scale_price(price, pct),
                    scale_price(cost, pct),
                    barcode_seq,
                ));
                barcode_seq += 7;
            }
        }
    }

    products
}

fn product(name: &str, brand: &str, category: &str, sku: &str, price: i64, cost: i64, barcode: u64) -> Product {
    Product {
        id: generate_product_id(),
        sku: sku.to_string(),
        barcode: Some(format!("0806860{barcode:05}")),
        name: name.to_string(),
        brand: brand.to_string(),
        category: category.to_string(),
        price: Money::from_cents(price),
        cost: Some(Money::from_cents(cost)),
        is_active: true,
    }
}

/// Scales a price by `pct` percent, landing on a .99 ending.
fn scale_price(cents: i64, pct: i64) -> i64 {
    let scaled = Money::from_cents(cents).mul_bps((pct * 100) as u32).cents();
    (scaled / 100) * 100 + 99
}
