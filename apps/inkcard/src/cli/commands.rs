//! # CLI Command Implementations

use super::CliError;
use crate::api;
use crate::config::Config;
use crate::distribution::Distribution;
use inkcard_core::{BusinessCard, CardId, OwnerId, RedbStore, Template};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Largest JSON file accepted by the import commands (10 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Resolve an input path: canonical, existing, and a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CliError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| CliError::Io(format!("Invalid file path '{}': {}", path.display(), e)))?;
    if !canonical.is_file() {
        return Err(CliError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CliError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(CliError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, CliError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let canonical_parent = parent.canonicalize().map_err(|e| {
        CliError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::Io("Output path has no file name".to_string()))?;
    Ok(canonical_parent.join(file_name))
}

/// Read and parse a JSON record after path and size checks.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_IMPORT_FILE_SIZE)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|source| CliError::Json { path, source })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// STORE
// =============================================================================

/// Open the configured database and wrap it in the facade.
pub fn open_distribution(config: &Config) -> Result<Distribution, CliError> {
    let store = RedbStore::open(&config.store.path)?;
    tracing::debug!(path = %config.store.path.display(), "Opened card database");
    Ok(
        Distribution::new(Arc::new(store), config.server.site_base.clone())
            .with_ledger(config.ledger())
            .with_timeout(config.store_timeout()),
    )
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), CliError> {
    let distribution = open_distribution(config)?;

    println!("Inkcard Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:   {}", config.server.bind_addr());
    println!("  Site base: {}", config.server.site_base);
    println!("  Database:  {}", config.store.path.display());
    println!("  Dedup:     {} s", config.ledger.window_secs);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.server, distribution)
        .await
        .map_err(|e| CliError::Io(format!("Server error: {}", e)))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty database.
pub fn cmd_init(config: &Config, force: bool) -> Result<(), CliError> {
    let path = &config.store.path;
    if path.exists() {
        if !force {
            return Err(CliError::Io(format!(
                "Database {} already exists. Use --force to overwrite.",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| CliError::Io(format!("Cannot remove '{}': {}", path.display(), e)))?;
    }
    RedbStore::open(path)?;
    println!("Initialized new card database at {}", path.display());
    Ok(())
}

// =============================================================================
// IMPORT COMMANDS
// =============================================================================

/// Import a template from JSON.
pub async fn cmd_import_template(
    config: &Config,
    file: &Path,
    json_mode: bool,
) -> Result<(), CliError> {
    let template: Template = read_json(file)?;
    let stored = open_distribution(config)?.put_template(template).await?;

    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "template_id": stored.id,
            "elements": stored.elements.len(),
        }))?;
    } else {
        println!(
            "Imported template {} ({} elements)",
            stored.id,
            stored.elements.len()
        );
    }
    Ok(())
}

/// Import a card from JSON.
pub async fn cmd_import_card(config: &Config, file: &Path, json_mode: bool) -> Result<(), CliError> {
    let card: BusinessCard = read_json(file)?;
    let stored = open_distribution(config)?.put_card(card).await?;

    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "card_id": stored.id,
            "template_id": stored.template_id,
        }))?;
    } else {
        match &stored.template_id {
            Some(template) => println!("Imported card {} (template {})", stored.id, template),
            None => println!("Imported card {} (no template)", stored.id),
        }
    }
    Ok(())
}

/// List templates.
pub async fn cmd_templates(config: &Config, json_mode: bool) -> Result<(), CliError> {
    let templates = open_distribution(config)?.list_templates().await?;

    if json_mode {
        let rows: Vec<api::TemplateSummary> =
            templates.iter().map(api::TemplateSummary::from).collect();
        print_json(&rows)?;
        return Ok(());
    }

    if templates.is_empty() {
        println!("No templates stored.");
    }
    for template in &templates {
        println!(
            "{:<24} {:<32} {} elements",
            template.id.as_str(),
            template.name,
            template.elements.len()
        );
    }
    Ok(())
}

/// List the cards of one owner.
pub async fn cmd_cards(config: &Config, owner: &str, json_mode: bool) -> Result<(), CliError> {
    let cards = open_distribution(config)?
        .list_cards(&OwnerId::new(owner))
        .await?;

    if json_mode {
        print_json(&cards)?;
        return Ok(());
    }

    if cards.is_empty() {
        println!("No cards for owner {}.", owner);
    }
    for card in &cards {
        let template = card.template_id.as_ref().map_or("-", |t| t.as_str());
        println!("{:<24} {:<32} {}", card.id.as_str(), card.name, template);
    }
    Ok(())
}

// =============================================================================
// OUTPUT COMMANDS
// =============================================================================

/// Show the render tree of a card.
pub async fn cmd_render(config: &Config, card_id: &str, json_mode: bool) -> Result<(), CliError> {
    let tree = open_distribution(config)?
        .resolve_card(&CardId::new(card_id))
        .await?;

    if json_mode {
        print_json(&tree)?;
        return Ok(());
    }

    println!("Card {} on template {}", tree.card_id, tree.template_id);
    println!("==========================");
    for element in &tree.elements {
        println!(
            "{:<16} {:<8} {:<16} {}",
            element.id.as_str(),
            format!("{:?}", element.kind),
            format!("{:?}", element.source),
            element.resolved_content
        );
    }
    for warning in &tree.warnings {
        println!("warning: {} {:?}", warning.element_id, warning.kind);
    }
    Ok(())
}

/// Show the print layout of a card.
pub async fn cmd_print(config: &Config, card_id: &str, json_mode: bool) -> Result<(), CliError> {
    let layout = open_distribution(config)?
        .export_paper_card(&CardId::new(card_id))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({
            "print_safe": layout.is_print_safe(),
            "layout": layout,
        }))?;
        return Ok(());
    }

    println!("Print Layout");
    println!("============");
    println!(
        "Page:       {:.2} x {:.2} pt ({:?})",
        layout.page_width, layout.page_height, layout.orientation
    );
    println!("Bleed:      {:.2} pt", layout.bleed);
    println!("Safe area:  {:.2} pt", layout.safe_area);
    println!("Resolution: {} dpi", layout.resolution_dpi);
    if !layout.background.is_blank() {
        println!(
            "Background: {} / {}",
            layout.background.color.as_deref().unwrap_or("-"),
            layout.background.image.as_deref().unwrap_or("-")
        );
    }
    println!("Elements:   {}", layout.elements.len());
    if layout.is_print_safe() {
        println!("Print safe: yes");
    } else {
        println!("Print safe: no");
        for violation in &layout.violations {
            println!("  {} {:?}", violation.element_id, violation.kind);
        }
    }
    Ok(())
}

/// Export a card as a vCard, to stdout or a file.
pub async fn cmd_vcard(config: &Config, card_id: &str, output: Option<&Path>) -> Result<(), CliError> {
    let payload = open_distribution(config)?
        .export_contact(&CardId::new(card_id))
        .await?;

    match output {
        Some(path) => {
            let path = validate_output_path(path)?;
            std::fs::write(&path, payload.text.as_bytes())
                .map_err(|e| CliError::Io(format!("Cannot write '{}': {}", path.display(), e)))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", payload.text),
    }
    Ok(())
}

/// Show the public URL of a card.
pub async fn cmd_share(config: &Config, card_id: &str, json_mode: bool) -> Result<(), CliError> {
    let url = open_distribution(config)?
        .share_url(&CardId::new(card_id))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({ "card_id": card_id, "url": url }))?;
    } else {
        println!("{}", url);
    }
    Ok(())
}

/// Show view counters of a card.
pub async fn cmd_stats(config: &Config, card_id: &str, json_mode: bool) -> Result<(), CliError> {
    let stats = open_distribution(config)?
        .get_stats(&CardId::new(card_id))
        .await?;

    if json_mode {
        print_json(&stats)?;
        return Ok(());
    }

    println!("Views of {}", card_id);
    println!("==================");
    println!("Total:  {}", stats.total_views);
    println!("Unique: {}", stats.unique_views);
    println!("Today:  {}", stats.today_views);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
