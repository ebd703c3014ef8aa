mod collect;
mod export;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::collect::{CollectError, Notice, Reconciler};
use rocketlens_core::estimator::conversion_rate;
use rocketlens_core::format::format_count;
use rocketlens_core::product::ProductStatus;
use rocketlens_core::{load_app_config, AppConfig, ProductStore};
use rocketlens_wing::{merge_fc_quantities, RetailClient, WingClient, WingError};

#[derive(Debug, Parser)]
#[command(name = "rocketlens")]
#[command(about = "Seller metrics collection for Coupang listing pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile a captured listing page against the WING search API.
    Collect {
        /// Path to the saved listing-page HTML.
        #[arg(long)]
        page: PathBuf,
        /// URL the page was captured from (used for keyword derivation).
        #[arg(long)]
        page_url: String,
        /// Export the reconciled metrics as CSV after the run.
        #[arg(long)]
        export: bool,
    },
    /// Look up the metrics of a single item by its item id.
    Lookup { item_id: String },
    /// Collect returnable inventory and export it as CSV.
    VendorReturn,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_app_config()?;

    match cli.command {
        Commands::Collect {
            page,
            page_url,
            export,
        } => run_collect(&config, &page, &page_url, export).await,
        Commands::Lookup { item_id } => run_lookup(&config, &item_id).await,
        Commands::VendorReturn => run_vendor_return(&config).await,
    }
}

async fn run_collect(
    config: &AppConfig,
    page: &Path,
    page_url: &str,
    export: bool,
) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(page)?;

    let store = Arc::new(ProductStore::new());

    // Progress subscriber: one structured line per store change.
    store.subscribe(|state| {
        let complete = state
            .iter()
            .filter(|p| p.status == ProductStatus::Complete)
            .count();
        let failed = state
            .iter()
            .filter(|p| p.status == ProductStatus::Fail)
            .count();
        tracing::debug!(total = state.len(), complete, failed, "store updated");
    });

    // Completion counter, independent of the progress logger.
    let completed_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed_count);
    store.subscribe(move |state| {
        let count = state.iter().filter(|p| p.is_complete()).count();
        counter.store(count, Ordering::SeqCst);
    });

    let wing = Arc::new(WingClient::new(config)?);
    let retail = Arc::new(RetailClient::new(config)?);
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        wing,
        retail,
        config.max_concurrent_lookups,
    );

    let report = match reconciler.handle_view_metrics(page_url, &html).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", collect_failure_message(&e));
            return Err(e.into());
        }
    };

    for state in store.get_state() {
        let (status, rate, pv, sales, revenue) = match (&state.status, &state.metrics) {
            (ProductStatus::Complete, Some(m)) => (
                "complete",
                m.conversion_rate.clone(),
                format_count(m.page_views_28d),
                format_count(m.sales_28d),
                format_count(m.estimated_revenue),
            ),
            (ProductStatus::Empty, _) => ("no data", "-".into(), "-".into(), "-".into(), "-".into()),
            (ProductStatus::Fail, _) => ("failed", "-".into(), "-".into(), "-".into(), "-".into()),
            _ => ("loading", "-".into(), "-".into(), "-".into(), "-".into()),
        };
        println!(
            "{status:9} {name:<40} pv {pv:>10}  sales {sales:>8}  cvr {rate:>7}  est. revenue {revenue:>12}",
            name = truncate(&state.record.display_name, 40),
        );
    }

    println!(
        "\n{} of {} products complete ({} failed, {} without data)",
        completed_count.load(Ordering::SeqCst),
        report.total,
        report.failed,
        report.empty
    );
    for notice in &report.notices {
        match notice {
            Notice::LoginRequired => {
                eprintln!("Some lookups need a fresh WING sign-in; log in and retry the failed items.");
            }
            Notice::RateLimited => {
                eprintln!("The search API rate limited some lookups; wait a moment before retrying.");
            }
            Notice::Error(message) => eprintln!("Lookup error: {message}"),
        }
    }

    if export {
        let written = export::export_metrics_csv(&store.get_state(), &config.export_dir)?;
        for path in written {
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

fn collect_failure_message(error: &CollectError) -> String {
    if error.requires_login() {
        return "Not signed in to WING — log in at https://wing.coupang.com/login and retry."
            .to_owned();
    }
    match error {
        CollectError::Wing(WingError::RateLimited { .. }) => {
            "The WING search API is rate limiting requests — wait a moment and retry.".to_owned()
        }
        CollectError::Parse(_) => {
            "This page does not look like a supported product listing.".to_owned()
        }
        other => format!("Metrics collection failed: {other}"),
    }
}

async fn run_lookup(config: &AppConfig, item_id: &str) -> anyhow::Result<()> {
    let wing = WingClient::new(config)?;

    match wing.fetch_single(item_id).await {
        Ok(product) => {
            let rate = conversion_rate(product.pv_last_28_day, product.sales_last_28d);
            let revenue = match (product.sales_last_28d, product.sale_price) {
                (Some(sales), Some(price)) => format_count(Some(sales * price)),
                _ => "-".to_owned(),
            };
            println!(
                "{} ({})",
                product.product_name.as_deref().unwrap_or("(unnamed)"),
                product.brand_name.as_deref().unwrap_or("-")
            );
            println!(
                "  28d views {}  sales {}  conversion {}  est. revenue {} KRW",
                format_count(product.pv_last_28_day),
                format_count(product.sales_last_28d),
                rate,
                revenue
            );
            Ok(())
        }
        Err(WingError::EmptyResult { .. }) => {
            println!("No data available for item {item_id}.");
            Ok(())
        }
        Err(e) if e.requires_login() => {
            eprintln!("Not signed in to WING — log in at https://wing.coupang.com/login and retry.");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_vendor_return(config: &AppConfig) -> anyhow::Result<()> {
    let wing = WingClient::new(config)?;

    let collection = wing
        .fetch_return_items(config.vendor_return_page_size)
        .await?;
    if !collection.complete {
        tracing::warn!(
            collected = collection.items.len(),
            "vendor-return collection is partial"
        );
    }

    let items = merge_fc_quantities(collection.items);
    let path = export::export_vendor_return_csv(&items, &config.export_dir)?;
    println!(
        "Exported {} items{} to {}",
        items.len(),
        if collection.complete { "" } else { " (partial)" },
        path.display()
    );
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{cut}…")
}
