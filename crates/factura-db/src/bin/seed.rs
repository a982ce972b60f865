//! # Seed Data Generator
//!
//! Creates a demo fiscal profile and issues invoices against it through
//! the same transactional path the app uses.
//!
//! ## Usage
//! ```bash
//! # Issue 25 invoices (default)
//! cargo run -p factura-db --bin seed
//!
//! # Issue a custom amount
//! cargo run -p factura-db --bin seed -- --count 200
//!
//! # Specify database path (otherwise FACTURA_DB_PATH or ./factura.db)
//! cargo run -p factura-db --bin seed -- --db ./data/factura.db
//! ```

use chrono::{Duration, Local, Utc};
use factura_core::{format_currency, Discount, FiscalProfile, NewInvoice, NewInvoiceItem};
use factura_db::repository::profile::generate_profile_id;
use factura_db::{Database, DbError, StoreConfig};
use rust_decimal::Decimal;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (description, unit price in centavos)
const CATALOG: &[(&str, i64)] = &[
    ("Cemento gris 42.5 kg", 23_500),
    ("Varilla corrugada 3/8\"", 12_875),
    ("Bloque de concreto 15 cm", 1_650),
    ("Arena de río (m3)", 85_000),
    ("Clavos 3\" (libra)", 2_250),
    ("Pintura látex blanca (galón)", 48_999),
    ("Tubo PVC 1/2\"", 6_425),
    ("Alambre de amarre (libra)", 3_100),
];

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Consumidor Final", None),
    ("Constructora Valle de Sula", Some("05019001234567")),
    ("Inversiones Morazán", Some("08019995001122")),
    ("Ferretería San Pedro", Some("05012003004455")),
];

fn draft(index: usize) -> NewInvoice {
    let (customer_name, customer_rtn) = CUSTOMERS[index % CUSTOMERS.len()];

    let lines = 1 + index % 3;
    let items = (0..lines)
        .map(|line| {
            let (description, cents) = CATALOG[(index + line * 3) % CATALOG.len()];
            NewInvoiceItem {
                description: description.to_string(),
                quantity: 1 + ((index + line) % 5) as u32,
                unit_price: Decimal::new(cents, 2),
            }
        })
        .collect();

    let discount = match index % 4 {
        1 => Discount::Percentage(Decimal::from(5)),
        3 => Discount::Amount(Decimal::new(2_500, 2)),
        _ => Discount::None,
    };

    NewInvoice {
        customer_name: customer_name.to_string(),
        customer_rtn: customer_rtn.map(str::to_string),
        issue_date: Local::now().date_naive(),
        items,
        discount,
        notes: None,
    }
}

fn demo_profile(config: &StoreConfig) -> FiscalProfile {
    let now = Utc::now();
    let expires = Local::now().date_naive() + Duration::days(180);

    FiscalProfile {
        id: generate_profile_id(),
        business_name: "Ferretería El Martillo S. de R.L.".to_string(),
        rtn: "08011990123456".to_string(),
        cai: "35A9E6-F1B2C3-4D5E6F-A1B2C3-D4E5F6-7A".to_string(),
        cai_expiration_date: expires.format("%Y-%m-%d").to_string(),
        invoice_range_start: "000-001-01-00000001".to_string(),
        invoice_range_end: "000-001-01-00005000".to_string(),
        next_invoice_number: "000-001-01-00000001".to_string(),
        tax_rate: config.default_tax_rate,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = StoreConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut count: usize = 25;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Factura HN Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of invoices to issue (default: 25)");
                println!("  -d, --db <PATH>    Database file path (default: ./factura.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), count, "Seeding invoice store");

    let db = Database::new(config.db_config())
        .await?
        .with_issue_policy(config.issue_policy());

    let profile = db.profiles().create(&demo_profile(&config)).await?;
    info!(id = %profile.id, business = %profile.business_name, "Demo profile created");

    let start = std::time::Instant::now();
    let mut issued = 0;
    let mut grand_total = Decimal::ZERO;

    for index in 0..count {
        match db.invoices().issue(&profile.id, &draft(index)).await {
            Ok(result) => {
                issued += 1;
                grand_total += result.invoice.totals().total.to_decimal();
                if result.assessment.cai.is_expiring_soon {
                    warn!(days = result.assessment.cai.days_until_expiry, "CAI expiring soon");
                }
            }
            Err(err @ (DbError::OutOfRange { .. } | DbError::CaiExpired { .. })) => {
                warn!(error = %err, "Stopping: profile can no longer issue");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let next = db.profiles().next_invoice_number(&profile.id).await?;
    info!(
        issued,
        total = %format_currency(grand_total),
        next_invoice_number = %next,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
