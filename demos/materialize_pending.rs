//! Materialize pending documents
//!
//! This demo shows the typical batch flow of campus-materializer:
//! - Loading a configuration file (or using the defaults)
//! - Registering document ids passed on the command line
//! - Subscribing to events
//! - Running one worklist pass that stops cleanly on Ctrl+C
//! - Crawling the configured guide pages
//!
//! ```bash
//! RUST_LOG=campus_materializer=debug cargo run --example materialize_pending -- config.json 1234 1235
//! ```

use std::path::Path;

use campus_materializer::{Config, DocumentId, Event, Materializer, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) if path.ends_with(".json") => {
            let config = Config::from_file(Path::new(path))?;
            args.remove(0);
            config
        }
        _ => Config::default(),
    };
    let ids: Vec<DocumentId> = args
        .iter()
        .map(|raw| raw.parse::<DocumentId>())
        .collect::<Result<_, _>>()?;

    let materializer = Materializer::new(config).await?;

    for id in &ids {
        if let Some(url) = materializer.config().source.page_url(*id) {
            materializer.db.upsert_document(*id, &url, None).await?;
        }
    }

    let mut events = materializer.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::MaterializationComplete {
                    id,
                    assets_stored,
                    assets_failed,
                } => {
                    println!("✓ #{}: {} asset(s) stored, {} failed", id, assets_stored, assets_failed);
                }
                Event::MaterializationReused { id } => {
                    println!("= #{}: already complete", id);
                }
                Event::MaterializationFailed { id, code, error } => {
                    println!("✗ #{}: [{}] {}", id, code, error);
                }
                Event::GuideCrawled { key, sections } => {
                    println!("✓ guide {}: {} section(s)", key, sections);
                }
                Event::GuideFailed { key, error } => {
                    println!("✗ guide {}: {}", key, error);
                }
                _ => {}
            }
        }
    });

    let (_, guide_stats) = materializer.crawl_all_guides().await;
    if guide_stats.total > 0 {
        println!(
            "Guides: {}/{} ({:.1}%)",
            guide_stats.succeeded, guide_stats.total, guide_stats.success_rate
        );
    }

    let summary = run_with_shutdown(materializer).await?;
    println!(
        "Documents: {} attempted, {} succeeded ({} unchanged), {} failed",
        summary.total, summary.succeeded, summary.reused, summary.failed
    );

    Ok(())
}
