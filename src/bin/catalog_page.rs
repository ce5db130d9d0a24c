//! Render one page of a catalog category.
//!
//! Usage:
//!   catalog-page --category vicka --subcategory to82 --page 2
//!   catalog-page --catalog export.json --backend directus --format text

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use shopfront_catalog::config::Overrides;
use shopfront_catalog::paginate::{PageLink, PageView};
use shopfront_catalog::view::{CategoryPage, ProductCard};
use shopfront_catalog::{
    CatalogViewState, CategoryKey, Settings, SubcategoryKey, SubcategoryListing, category_page,
    logging,
};

#[derive(Parser, Debug)]
#[command(name = "catalog-page")]
#[command(about = "Filter and paginate the products of one category")]
struct Cli {
    #[command(flatten)]
    settings: Overrides,
    /// Category key; defaults to the first category in the catalog.
    #[arg(long)]
    category: Option<String>,
    /// Restrict the listing to one subcategory.
    #[arg(long)]
    subcategory: Option<String>,
    /// 1-based page number; out-of-range values are clamped.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,
    /// Output format.
    #[arg(long, value_parser = ["json", "text"], default_value = "json")]
    format: String,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct PageOutput<'a> {
    catalog: &'a str,
    category_key: Option<&'a CategoryKey>,
    category_name: Option<&'a str>,
    subcategory_listing: &'static str,
    subcategories: Vec<SubcategoryOutput<'a>>,
    selected_subcategory: Option<&'a SubcategoryKey>,
    page: PageView<ProductCard<'a>>,
}

#[derive(Serialize)]
struct SubcategoryOutput<'a> {
    key: &'a SubcategoryKey,
    display_name: &'a str,
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

    let mut state = CatalogViewState::default();
    if let Some(category) = cli.category {
        state.select_category(CategoryKey::from(category));
    }
    state.select_subcategory(cli.subcategory.map(SubcategoryKey::from));
    state.go_to_page(cli.page);

    let page = category_page(&index, &state, settings.view_options());
    match cli.format.as_str() {
        "json" => {
            let output = to_output(index.key().as_str(), settings.listing, &page);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => print_text(&page),
        other => bail!("unknown format '{other}'"),
    }
    Ok(())
}

fn to_output<'a>(
    catalog: &'a str,
    listing: SubcategoryListing,
    page: &'a CategoryPage<'a>,
) -> PageOutput<'a> {
    PageOutput {
        catalog,
        subcategory_listing: listing.as_str(),
        category_key: page.category_key.as_ref(),
        category_name: page.category.map(|c| c.display_name.as_str()),
        subcategories: page
            .subcategories
            .iter()
            .map(|sub| SubcategoryOutput {
                key: &sub.key,
                display_name: &sub.display_name,
            })
            .collect(),
        selected_subcategory: page.selected_subcategory.as_ref(),
        page: page.page.clone().map(ProductCard::from),
    }
}

fn print_text(page: &CategoryPage<'_>) {
    match page.category {
        Some(category) => println!("{} [{}]", category.display_name, category.key),
        None => {
            let key = page.category_key.as_ref().map(|k| k.as_str()).unwrap_or("-");
            println!("unknown category '{key}'");
        }
    }
    if !page.subcategories.is_empty() {
        let names: Vec<String> = page
            .subcategories
            .iter()
            .map(|sub| {
                if page.selected_subcategory.as_ref() == Some(&sub.key) {
                    format!("*{}*", sub.display_name)
                } else {
                    sub.display_name.clone()
                }
            })
            .collect();
        println!("subcategories: {}", names.join(" | "));
    }
    for product in &page.page.items {
        match product.price {
            Some(price) => println!("- {} ({price:.2})", product.name),
            None => println!("- {}", product.name),
        }
    }
    if let Some(controls) = page.page.controls() {
        let window: Vec<String> = controls
            .window
            .iter()
            .map(|link| match link {
                PageLink::Page(n) if *n == page.page.page_number => format!("[{n}]"),
                PageLink::Page(n) => n.to_string(),
                PageLink::Ellipsis => "...".to_string(),
            })
            .collect();
        println!(
            "page {} of {}: {}",
            page.page.page_number,
            page.page.total_pages,
            window.join(" ")
        );
    }
}
