//! Evaluation CLI for skin-type fit analysis.
//!
//! Usage:
//!     eval analyze "정제수, 글리세린, 부틸렌글라이콜" --skin-type OSNT
//!     eval analyze --file ocr.txt --free-text --skin-type DRPW --user-id 7
//!     eval rank --file products.json --skin-type OSNT --limit 4
//!     eval health

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skinfit_backend_catalog::{fetch_snapshot, CatalogBackend, CatalogConfig, ReferenceBackend};
use skinfit_model::{AnalysisResult, ProductListing, RankedProduct, UNCLASSIFIED_KEYWORD};
use skinfit_score::{analyze, rank_products, TokenMode};
use skinfit_text::{tokenize_delimited, tokenize_free_text};

#[derive(Parser)]
#[command(name = "eval")]
#[command(about = "Analyze cosmetic ingredient lists against skin-type profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog service URL
    #[arg(long, default_value = "http://127.0.0.1:8900")]
    catalog_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one ingredient list
    Analyze {
        /// Ingredient list text (comma-delimited unless --free-text)
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the input text from a file instead
        #[arg(short, long)]
        file: Option<String>,

        /// Skin type code (e.g. OSNT)
        #[arg(short, long)]
        skin_type: String,

        /// User id whose declared caution ingredients apply
        #[arg(short, long)]
        user_id: Option<u64>,

        /// Treat the input as free-form OCR text
        #[arg(long)]
        free_text: bool,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rank products from a JSON listing file
    Rank {
        /// Path to a JSON array of {product_name, category, ingredient_list}
        #[arg(short, long)]
        file: String,

        /// Skin type code (e.g. OSNT)
        #[arg(short, long)]
        skin_type: String,

        /// User id whose declared caution ingredients apply
        #[arg(short, long)]
        user_id: Option<u64>,

        /// Maximum items to return (clamped to 1..=20)
        #[arg(short, long, default_value = "4")]
        limit: usize,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check backend health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skinfit=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = CatalogConfig {
        base_url: cli.catalog_url,
        ..Default::default()
    };
    let backend = CatalogBackend::new(config);

    match cli.command {
        Commands::Analyze {
            text,
            file,
            skin_type,
            user_id,
            free_text,
            format,
        } => {
            let input = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read input file {path}"))?,
                (None, None) => unreachable!("clap enforces text or file"),
            };
            run_analyze(&backend, &input, &skin_type, user_id, free_text, &format).await?;
        }
        Commands::Rank {
            file,
            skin_type,
            user_id,
            limit,
            format,
        } => {
            run_rank(&backend, &file, &skin_type, user_id, limit, &format).await?;
        }
        Commands::Health => {
            run_health(&backend).await?;
        }
    }

    Ok(())
}

async fn run_analyze(
    backend: &CatalogBackend,
    input: &str,
    skin_type: &str,
    user_id: Option<u64>,
    free_text: bool,
    format: &str,
) -> Result<()> {
    let mode = if free_text {
        TokenMode::FreeText
    } else {
        TokenMode::Delimited
    };
    let tokens = match mode {
        TokenMode::Delimited => tokenize_delimited(input),
        TokenMode::FreeText => tokenize_free_text(input),
    };

    let snapshot = fetch_snapshot(backend, &tokens).await?;
    let profile = backend.weight_profile(skin_type).await?;
    let user_cautions = match user_id {
        Some(id) => backend.user_cautions(id).await?,
        None => Vec::new(),
    };

    let result = analyze(input, mode, skin_type, &snapshot, &profile, &user_cautions)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_analysis(&result);
    }

    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    println!(
        "Skin type: {} | Reliability: {} | Keyword hits: {}",
        result.skin_type,
        result.reliability.as_str(),
        result.keyword_hit_count
    );
    println!(
        "Verified ingredients: {} | Distinct keyword matches: {}",
        result.verified_count, result.matched_count
    );
    println!("---");
    println!(
        "Score: {}/100 (before caution penalty: {})",
        result.final_score, result.score_before
    );
    if let Some(warning) = &result.warning_message {
        println!("!! {warning}");
    }

    println!("\nBreakdown:");
    for (keyword, entry) in &result.breakdown {
        println!(
            "  {:<14} {:>5.1}%  target {}-{}  fit {:.2}  contribution {:.2}",
            keyword.to_string(),
            entry.percent,
            entry.target_range.lo,
            entry.target_range.hi,
            entry.fit_score,
            entry.contribution
        );
    }

    println!("\nMatched ingredients:");
    for item in &result.matched {
        println!("  * {} ({}, {})", item.name, item.purpose, item.keyword);
    }
    if !result.unmatched.is_empty() {
        println!("Unmatched ingredients:");
        for item in &result.unmatched {
            println!("  ? {} ({}, {})", item.name, item.purpose, UNCLASSIFIED_KEYWORD);
        }
    }

    println!("\nGood points:");
    for point in &result.good_points {
        println!("  + {point}");
    }
    println!("Weak points:");
    for point in &result.weak_points {
        println!("  - {point}");
    }

    if !result.caution_ingredients.is_empty() {
        println!("\nCaution ingredients:");
        for entry in &result.caution_ingredients {
            println!("  ! {} ({})", entry.korean_name, entry.caution_grade);
        }
    }

    println!("\n{}", result.opinion);
}

async fn run_rank(
    backend: &CatalogBackend,
    file: &str,
    skin_type: &str,
    user_id: Option<u64>,
    limit: usize,
    format: &str,
) -> Result<()> {
    let listing = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read product file {file}"))?;
    let products: Vec<ProductListing> =
        serde_json::from_str(&listing).context("Product file is not a valid JSON listing")?;

    // One bulk snapshot covering every product's tokens.
    let mut all_tokens = Vec::new();
    for product in &products {
        all_tokens.extend(tokenize_delimited(&product.ingredient_list));
    }

    let snapshot = fetch_snapshot(backend, &all_tokens).await?;
    let profile = backend.weight_profile(skin_type).await?;
    let user_cautions = match user_id {
        Some(id) => backend.user_cautions(id).await?,
        None => Vec::new(),
    };

    let ranked = rank_products(&products, &snapshot, &profile, &user_cautions, limit);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        print_ranking(&ranked, skin_type);
    }

    Ok(())
}

fn print_ranking(ranked: &[RankedProduct], skin_type: &str) {
    println!("Top products for skin type {skin_type}:");
    for (i, item) in ranked.iter().enumerate() {
        println!("\n{}. {} [{}]", i + 1, item.product_name, item.category);
        println!(
            "   Score: {} (before penalty: {}) | Hits: {} | Reliability: {}",
            item.final_score,
            item.score_before,
            item.total_keyword_hits,
            item.reliability.as_str()
        );
        if item.has_user_caution {
            println!("   Caution: {}", item.user_caution_hits.join(", "));
        }
    }
    println!("\n---");
    println!("Total: {} products", ranked.len());
}

async fn run_health(backend: &CatalogBackend) -> Result<()> {
    print!("Checking {} backend... ", backend.name());

    match backend.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}
