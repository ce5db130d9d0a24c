// Binary smoke tests: arguments, output formats and exit codes.
mod support;
#[path = "support/common.rs"]
mod common;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use support::{catalog_command, fixture_path, run_command};
use tempfile::TempDir;

use common::{demo_catalog_path, snapshot_doc, write_temp_json};

const PAGE_BIN: &str = env!("CARGO_BIN_EXE_catalog-page");
const PRODUCT_BIN: &str = env!("CARGO_BIN_EXE_catalog-product");
const IMPORT_BIN: &str = env!("CARGO_BIN_EXE_catalog-import");
const VALIDATE_BIN: &str = env!("CARGO_BIN_EXE_catalog-validate");

fn stdout_json(output: &std::process::Output) -> Result<Value> {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).context("stdout is not JSON")
}

#[test]
fn catalog_page_defaults_to_first_category() -> Result<()> {
    let output = run_command(&mut catalog_command(PAGE_BIN))?;
    let page = stdout_json(&output)?;
    assert_eq!(page["catalog"], json!("demo_storefront"));
    assert_eq!(page["category_key"], json!("vicka"));
    assert_eq!(page["page"]["page_number"], json!(1));
    assert_eq!(page["page"]["total_pages"], json!(2));
    assert_eq!(page["page"]["items"].as_array().map(Vec::len), Some(9));
    let subs: Vec<_> = page["subcategories"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|s| s["key"].clone())
        .collect();
    assert_eq!(subs, vec![json!("to82"), json!("to66")]);
    Ok(())
}

#[test]
fn catalog_page_clamps_and_filters() -> Result<()> {
    let output = run_command(
        catalog_command(PAGE_BIN).args(["--category", "vicka", "--page", "-3", "--page-size", "2"]),
    )?;
    let page = stdout_json(&output)?;
    assert_eq!(page["page"]["page_number"], json!(1));
    assert_eq!(page["page"]["total_pages"], json!(6));
    assert_eq!(
        page["page"]["windowed_page_numbers"],
        json!([1, 2, 3, "ellipsis", 6])
    );

    let output = run_command(catalog_command(PAGE_BIN).args([
        "--category",
        "vicka",
        "--subcategory",
        "to66",
        "--subcategories",
        "all",
    ]))?;
    let page = stdout_json(&output)?;
    let ids: Vec<_> = page["page"]["items"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|p| p["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("v03"), json!("v06"), json!("v09")]);
    assert_eq!(page["subcategories"].as_array().map(Vec::len), Some(3));
    assert_eq!(page["selected_subcategory"], json!("to66"));
    Ok(())
}

#[test]
fn catalog_page_reads_env_settings() -> Result<()> {
    let output = run_command(
        catalog_command(PAGE_BIN)
            .env("CATALOG_PAGE_SIZE", "5")
            .args(["--category", "vicka", "--page", "3"]),
    )?;
    let page = stdout_json(&output)?;
    assert_eq!(page["page"]["total_pages"], json!(3));
    assert_eq!(page["page"]["items"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn catalog_page_text_output() -> Result<()> {
    let output = run_command(
        catalog_command(PAGE_BIN).args(["--category", "sklenice", "--format", "text"]),
    )?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("Sklenice [sklenice]"));
    assert!(stdout.contains("- Sklenice zavařovací 370 ml (9.90)"));
    assert!(!stdout.contains("page "));
    Ok(())
}

#[test]
fn catalog_page_rejects_zero_page_size() -> Result<()> {
    let output = run_command(catalog_command(PAGE_BIN).args(["--page-size", "0"]))?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("page size"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn catalog_product_reports_similar_products() -> Result<()> {
    let output = run_command(catalog_command(PRODUCT_BIN).arg("vicko-to66-cerne"))?;
    let detail = stdout_json(&output)?;
    assert_eq!(detail["product"]["id"], json!("v03"));
    assert_eq!(detail["category"]["key"], json!("vicka"));
    assert_eq!(detail["subcategory"]["key"], json!("to66"));
    let similar: Vec<_> = detail["similar_cards"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|p| p["id"].clone())
        .collect();
    assert_eq!(similar, vec![json!("v06"), json!("v09")]);

    let missing = run_command(catalog_command(PRODUCT_BIN).arg("nope"))?;
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("not found"));
    Ok(())
}

#[test]
fn catalog_import_writes_a_loadable_snapshot() -> Result<()> {
    let temp = TempDir::new()?;
    let out = temp.path().join("shop.json");
    let output = run_command(
        catalog_command(IMPORT_BIN)
            .args(["--backend", "storyblok", "--key", "shop"])
            .arg("--input")
            .arg(fixture_path("storyblok_stories.json"))
            .arg("--out")
            .arg(&out),
    )?;
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let page = run_command(
        catalog_command(PAGE_BIN)
            .arg("--catalog")
            .arg(&out)
            .args(["--category", "vicka"]),
    )?;
    let page = stdout_json(&page)?;
    assert_eq!(page["catalog"], json!("shop"));
    assert_eq!(page["page"]["items"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn catalog_page_imports_backend_exports_directly() -> Result<()> {
    let output = run_command(
        catalog_command(PAGE_BIN)
            .arg("--catalog")
            .arg(fixture_path("local_api.json"))
            .args(["--backend", "local", "--category", "2"]),
    )?;
    let page = stdout_json(&output)?;
    let ids: Vec<_> = page["page"]["items"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|p| p["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("2")]);
    Ok(())
}

#[test]
fn catalog_validate_accepts_demo_and_rejects_duplicates() -> Result<()> {
    let output = run_command(
        catalog_command(VALIDATE_BIN)
            .arg("--file")
            .arg(demo_catalog_path()),
    )?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("demo_storefront: ok"));
    assert!(stdout.contains("17 products, 1 uncategorized"));

    let duplicate = snapshot_doc(
        json!([
            {"key": "vicka", "display_name": "A"},
            {"key": "vicka", "display_name": "B"}
        ]),
        json!([]),
        json!([]),
    );
    let file = write_temp_json(&duplicate)?;
    let output = run_command(
        catalog_command(VALIDATE_BIN)
            .arg("--file")
            .arg(file.path()),
    )?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate"));
    Ok(())
}
