//! # Seed Data Generator
//!
//! Populates the database with sample drugs for development.
//!
//! ## Usage
//! ```bash
//! # Generate 100 drugs (default) into $PHARMA_DB_PATH or ./pharmacy.db
//! cargo run -p pharma-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p pharma-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p pharma-db --bin seed -- --db ./data/pharmacy.db
//! ```
//!
//! Each drug gets a name and strength, a category, a stock level between 0
//! and 120, a price between $0.99 and $24.99, and an expiry date spread
//! over the next two years (a few already expired).

use chrono::{Duration, NaiveDate, Utc};
use pharma_core::catalog::NewDrug;
use pharma_core::UnitPrice;
use pharma_db::{Database, EngineConfig, SalesEngine, StoreConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Drug families for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Analgesics",
        &["Paracetamol", "Ibuprofen", "Aspirin", "Diclofenac", "Naproxen"],
    ),
    (
        "Antibiotics",
        &["Amoxicillin", "Azithromycin", "Ciprofloxacin", "Doxycycline", "Metronidazole"],
    ),
    (
        "Antihistamines",
        &["Cetirizine", "Loratadine", "Chlorpheniramine", "Fexofenadine"],
    ),
    (
        "Cardiovascular",
        &["Amlodipine", "Lisinopril", "Atenolol", "Losartan", "Atorvastatin"],
    ),
    (
        "Gastrointestinal",
        &["Omeprazole", "Ranitidine", "Loperamide", "Oral Rehydration Salts"],
    ),
    ("Diabetes", &["Metformin", "Glibenclamide", "Gliclazide"]),
];

/// Strength variants with a price add-on in cents
const STRENGTHS: &[(&str, i64)] = &[
    ("100mg", 0),
    ("250mg", 150),
    ("500mg", 300),
    ("Syrup 100ml", 450),
    ("Suspension 60ml", 600),
];

const SUPPLIERS: &[&str] = &["MedSupply Ltd", "PharmaDirect", "HealthWholesale", "CareDistributors"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = EngineConfig::from_env();
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 100;
    let mut db_path = config.database_path.display().to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pharmacy POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of drugs to generate (default: 100)");
                println!("  -d, --db <PATH>    Database file path (default: $PHARMA_DB_PATH or ./pharmacy.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Pharmacy POS Seed Data Generator");
    println!("===================================");
    println!("Store:    {}", config.store_name);
    println!("Database: {}", db_path);
    println!("Drugs:    {}", count);
    println!();

    let db = Database::new(StoreConfig::new(&db_path)).await?;
    let engine = SalesEngine::open(db, config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = engine.drugs().await.len();
    if existing > 0 {
        println!("⚠ Database already has {} drugs", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating drugs...");

    let today = Utc::now().date_naive();
    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (category, names) in CATEGORIES {
        for name in names.iter() {
            for (strength, price_addon) in STRENGTHS {
                if generated >= count {
                    break 'outer;
                }

                let drug = generate_drug(category, name, strength, *price_addon, generated, today);
                let label = drug.name.clone();

                if let Err(e) = engine.add_drug(drug, Some("seed")).await {
                    warn!(name = %label, error = %e, "Failed to insert drug");
                    continue;
                }

                generated += 1;

                if generated % 50 == 0 {
                    println!("  Generated {} drugs...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    info!(generated, ?elapsed, "Seed finished");

    let config = engine.config();
    println!();
    println!("✓ Generated {} drugs in {:?}", generated, elapsed);
    println!(
        "  Stock value: {}",
        config.format_currency(engine.inventory_value().await.cents())
    );
    println!(
        "  Low stock (≤ {}): {}",
        config.low_stock_threshold,
        engine.low_stock(config.low_stock_threshold).await.len()
    );
    println!(
        "  Expiring within {} days: {}",
        config.expiry_warning_days,
        engine
            .expiring_within(today, config.expiry_warning_days)
            .await
            .len()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single drug with deterministic pseudo-random data.
fn generate_drug(
    category: &str,
    name: &str,
    strength: &str,
    price_addon: i64,
    seed: usize,
    today: NaiveDate,
) -> NewDrug {
    // $0.99 - $19.99 base + strength addon
    let base_price = 99 + ((seed * 37) % 1900) as i64;

    // Mostly healthy stock, every seventh drug nearly out
    let quantity = if seed % 7 == 0 {
        (seed % 5) as i64
    } else {
        (seed * 13 % 121) as i64
    };

    // -30 .. +700 days; a handful already expired
    let expiry = today + Duration::days((seed * 53 % 730) as i64 - 30);

    NewDrug {
        name: format!("{} {}", name, strength),
        category: category.to_string(),
        quantity,
        price: UnitPrice::from_cents(base_price + price_addon),
        expiry: Some(expiry),
        supplier: SUPPLIERS[seed % SUPPLIERS.len()].to_string(),
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the default `info,pharma=debug,sqlx=warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pharma=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
