use clap::{Parser, Subcommand};
use dealrank_engine::{DealEngine, DealQuery, EngineConfig, PriceDirection};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dealrank-cli")]
#[command(about = "Deal Ranking Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog path (overrides config)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for the best deals
    Search {
        /// Free-text query
        query: String,

        /// Shortlist size (defaults to config)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Base → target currency rate
        #[arg(short, long, default_value = "1.0")]
        fx_rate: f64,
    },

    /// Show which category and reference a query resolves to
    Resolve {
        /// Free-text query
        query: String,
    },

    /// Get catalog statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env()?;
    if let Some(catalog) = cli.catalog {
        config.catalog.path = catalog;
    }

    // Create engine
    let engine = DealEngine::from_config(&config).await?;

    match cli.command {
        Commands::Search { query, top_n, fx_rate } => {
            println!("🔍 Searching deals for: {}", query);

            let mut request = DealQuery::new(query).with_fx_rate(fx_rate);
            request.top_n = top_n;
            let response = engine.search(request).await?;

            println!("   Category: {}", response.category);
            if let Some(product) = &response.product {
                println!("   Product: {}", product.name);
            }
            if let Some(reference) = &response.reference {
                println!("   Reference: {} @ {} ({:.2})", reference.name, reference.platform, reference.price);
            }

            if response.deals.is_empty() {
                println!("\n😞 No deals ({:?})", response.result_type);
            } else {
                println!("\n🏆 Top deals ({}):", response.currency);
                for deal in &response.deals {
                    println!(
                        "   {}. {} @ {} - {:.2} (rating {:.1}, score {:.3})",
                        deal.rank,
                        deal.product_name,
                        deal.platform,
                        deal.converted_price,
                        deal.seller_rating,
                        deal.predicted_score
                    );
                    if let Some(comparison) = &deal.comparison {
                        let arrow = match comparison.price_delta_direction {
                            PriceDirection::Higher => "▲",
                            PriceDirection::Lower => "▼",
                            PriceDirection::Equal => "=",
                        };
                        println!("      {} {:+.2} vs {}", arrow, comparison.price_delta, comparison.reference.name);
                    }
                }
            }

            println!("\n   Candidates: {} (dropped {})", response.candidates, response.dropped);
            println!("   Oracle: {}", response.oracle);
            println!("   Latency: {:.2}ms", response.latency_ms);
        }

        Commands::Resolve { query } => {
            let resolution = engine.resolve(&query);

            println!("🧭 {} → {}", query, resolution.category);
            if let Some(product) = &resolution.product {
                println!("   Product: {}", product.name);
                if let Some(description) = &product.description {
                    println!("   {}", description);
                }
            }
            match resolution.reference {
                Some(reference) => {
                    println!("   Reference: {} ({:.2})", reference.name, reference.price);
                    if !reference.suggestions.is_empty() {
                        println!("   Suggestions: {}", reference.suggestions.join(", "));
                    }
                }
                None => println!("   No reference product"),
            }
        }

        Commands::Stats => {
            let stats = engine.catalog_stats();

            println!("📊 Catalog Statistics:");
            println!("   Source: {}", stats.source);
            println!("   Loaded at: {}", stats.loaded_at.format("%Y-%m-%d %H:%M:%S"));
            println!("   Total listings: {}", stats.total_listings);
            for (category, count) in &stats.listings_per_category {
                println!("     {}: {}", category, count);
            }
            println!("   Products: {}", stats.products);
            println!("   Reference products: {}", stats.references);
            println!("   Oracle: {}", engine.oracle_name());
        }
    }

    Ok(())
}
