//! Show one product with its placement and similar products.
//!
//! Usage:
//!   catalog-product vicko-to82-zlate
//!   catalog-product 17 --catalog export.json --backend local

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use shopfront_catalog::config::Overrides;
use shopfront_catalog::view::{ProductCard, ProductDetail};
use shopfront_catalog::{Settings, logging, product_detail};

#[derive(Parser, Debug)]
#[command(name = "catalog-product")]
#[command(about = "Look up a product by id or slug")]
struct Cli {
    /// Product id or slug.
    product: String,
    #[command(flatten)]
    settings: Overrides,
    /// Output format.
    #[arg(long, value_parser = ["json", "text"], default_value = "json")]
    format: String,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct DetailOutput<'a> {
    #[serde(flatten)]
    detail: &'a ProductDetail<'a>,
    similar_cards: Vec<ProductCard<'a>>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = Settings::resolve(&cli.settings)?;
    let index = settings.load_index()?;
    let Some(detail) = product_detail(&index, &cli.product) else {
        bail!("product '{}' not found in catalog {}", cli.product, index.key());
    };

    match cli.format.as_str() {
        "json" => {
            let output = DetailOutput {
                detail: &detail,
                similar_cards: detail.similar.iter().map(|p| ProductCard::from(*p)).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => {
            let product = detail.product;
            println!("{} ({})", product.name, product.slug);
            let placement: Vec<&str> = [
                detail.category.map(|c| c.display_name.as_str()),
                detail.subcategory.map(|s| s.display_name.as_str()),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !placement.is_empty() {
                println!("in: {}", placement.join(" / "));
            }
            if let Some(price) = product.price {
                println!("price: {price:.2}");
            }
            if !product.description.is_empty() {
                println!("\n{}\n", product.description);
            }
            if !detail.similar.is_empty() {
                println!("similar:");
                for other in &detail.similar {
                    println!("- {}", other.name);
                }
            }
        }
        other => bail!("unknown format '{other}'"),
    }
    Ok(())
}
