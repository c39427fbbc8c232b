//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{PassiveCommand, ReportCommand};
use crate::api;
use crate::config::{Backend, Config};
use fieldkit_core::{
    AssetDraft, Evaluation, FieldError, PassiveKind, ReportId, Workspace, export_json,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a draft file (1 MB).
///
/// Drafts are small JSON objects; anything larger is not a draft.
const MAX_DRAFT_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), FieldError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| FieldError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(FieldError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
///
/// Canonicalizing resolves `..` and symlinks before the file is opened.
fn validate_file_path(path: &Path) -> Result<PathBuf, FieldError> {
    let canonical = path.canonicalize().map_err(|e| {
        FieldError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(FieldError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, FieldError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        FieldError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(FieldError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| FieldError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a draft JSON file.
fn read_draft(path: &Path) -> Result<AssetDraft, FieldError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_DRAFT_FILE_SIZE)?;
    let data = std::fs::read(&validated)
        .map_err(|e| FieldError::IoError(format!("Read file: {}", e)))?;
    serde_json::from_slice(&data)
        .map_err(|e| FieldError::DeserializationError(format!("Invalid draft: {}", e)))
}

fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), FieldError> {
    let workspace = config.open_workspace()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    println!("fieldkit server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", config.storage.backend.as_str());
    println!("  Database: {:?}", config.storage.database);
    println!("  Data dir: {:?}", config.storage.data_dir);
    println!("  Plan:     {} rows", workspace.plan().len());
    println!();
    println!("Endpoints:");
    println!("  GET  /reports          - List reports");
    println!("  POST /validate         - Evaluate a draft");
    println!("  POST /assets           - Save an asset");
    println!("  POST /drafts           - Open an autosave session");
    println!("  PUT  /drafts/{{id}}      - Update a draft and autosave");
    println!("  GET  /health           - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, workspace).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize the database and data directory.
pub fn cmd_init(config: &Config, force: bool) -> Result<(), FieldError> {
    let db_path = &config.storage.database;
    if config.storage.backend == Backend::Redb {
        if db_path.exists() {
            if !force {
                return Err(FieldError::InvalidInput(
                    "Database already exists. Use --force to overwrite.".to_string(),
                ));
            }
            std::fs::remove_file(db_path)?;
        }
        Workspace::with_redb(db_path)?;
        println!("Initialized new redb database at {:?}", db_path);
    }

    std::fs::create_dir_all(&config.storage.data_dir)?;
    println!("Data directory ready at {:?}", config.storage.data_dir);

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show workspace status.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<(), FieldError> {
    let workspace = config.open_workspace()?;
    let status = workspace.status()?;

    if json_mode {
        let output = serde_json::json!({
            "backend": config.storage.backend.as_str(),
            "database": config.storage.database.to_string_lossy(),
            "data_dir": config.storage.data_dir.to_string_lossy(),
            "status": status,
        });
        print_json(&output);
        return Ok(());
    }

    println!("fieldkit Status");
    println!("===============");
    println!("Backend:  {}", config.storage.backend.as_str());
    println!("Database: {:?}", config.storage.database);
    println!();
    println!("Reports:       {}", status.reports);
    println!("In trash:      {}", status.trashed_reports);
    println!("Assets:        {}", status.assets);
    println!("Photos:        {}", status.photos);
    println!("Passive items: {}", status.passives);
    println!("Plan rows:     {}", status.plan_rows);

    Ok(())
}

// =============================================================================
// REPORT COMMANDS
// =============================================================================

/// Run a report subcommand.
pub fn cmd_report(
    config: &Config,
    json_mode: bool,
    action: ReportCommand,
) -> Result<(), FieldError> {
    let mut workspace = config.open_workspace()?;

    match action {
        ReportCommand::Create { name, node } => {
            let report = workspace.create_report(&name, &node)?;
            if json_mode {
                print_json(&report);
            } else {
                println!("Created report {} ({})", report.id, report.folder_name);
            }
        }
        ReportCommand::List { trashed } => {
            let reports = workspace.list_reports(trashed)?;
            if json_mode {
                print_json(&reports);
            } else if reports.is_empty() {
                println!("No reports");
            } else {
                for report in &reports {
                    println!("{:>6}  {:<32} node {}", report.id, report.name, report.node_name);
                }
            }
        }
        ReportCommand::Trash { id } => {
            let report = workspace.trash_report(ReportId(id))?;
            println!("Moved report {} to trash", report.id);
        }
        ReportCommand::Restore { id } => {
            let report = workspace.restore_report(ReportId(id))?;
            println!("Restored report {}", report.id);
        }
        ReportCommand::Purge { id } => {
            workspace.purge_report(ReportId(id))?;
            println!("Purged report {}", id);
        }
    }

    Ok(())
}

// =============================================================================
// VALIDATE / SAVE COMMANDS
// =============================================================================

fn print_evaluation(evaluation: &Evaluation) {
    match evaluation.message {
        None => println!("Ready: yes"),
        Some(message) => {
            println!("Ready: no");
            println!("Message: {}", message.text());
        }
    }
    if let Some(technology) = evaluation.technology {
        println!("Technology: {}", technology.label());
    }
    let checks = &evaluation.checks;
    println!();
    println!("  frequency set:        {}", checks.frequency_set);
    println!("  kind fields set:      {}", checks.kind_fields_set);
    println!("  photos ok:            {}", checks.photos_ok);
    println!("  amplifier adjustment: {}", checks.amplifier_adjustment_ok);
    println!("  node adjustment:      {}", checks.node_adjustment_ok);
    println!("  node allowed:         {}", checks.node_allowed);
}

/// Evaluate a draft file without writing anything.
pub fn cmd_validate(config: &Config, json_mode: bool, file: &Path) -> Result<(), FieldError> {
    let draft = read_draft(file)?;
    let workspace = config.open_workspace()?;
    let evaluation = workspace.evaluate_draft(&draft)?;

    if json_mode {
        print_json(&evaluation);
    } else {
        print_evaluation(&evaluation);
    }
    Ok(())
}

/// Explicitly save a draft file.
pub fn cmd_save(config: &Config, json_mode: bool, file: &Path) -> Result<(), FieldError> {
    let mut draft = read_draft(file)?;
    let mut workspace = config.open_workspace()?;
    let saved = workspace.save_asset(&mut draft)?;

    if json_mode {
        print_json(&saved);
    } else {
        let verb = if saved.created { "Created" } else { "Updated" };
        println!(
            "{} {} asset {} in report {}",
            verb, saved.asset.kind, saved.asset.id, saved.asset.report_id
        );
    }
    Ok(())
}

// =============================================================================
// PASSIVE COMMANDS
// =============================================================================

/// Run a passive-equipment subcommand.
pub fn cmd_passive(
    config: &Config,
    json_mode: bool,
    action: PassiveCommand,
) -> Result<(), FieldError> {
    let mut workspace = config.open_workspace()?;

    match action {
        PassiveCommand::Add {
            report,
            address,
            kind,
            observation,
        } => {
            let kind: PassiveKind = kind.parse()?;
            let report = workspace.report(ReportId(report))?;
            let item = workspace.add_passive(report.id, &address, kind, &observation)?;
            if json_mode {
                print_json(&item);
            } else {
                println!("Recorded passive item {} at {}", item.id, item.address);
            }
        }
        PassiveCommand::List { report } => {
            let report = workspace.report(ReportId(report))?;
            let items = workspace.passives(report.id)?;
            if json_mode {
                print_json(&items);
            } else if items.is_empty() {
                println!("No passive items in report {}", report.id);
            } else {
                for item in &items {
                    println!(
                        "{:>6}  {:<16} {:?}  {}",
                        item.id, item.address, item.kind, item.observation
                    );
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export a report to a JSON file.
pub fn cmd_export(config: &Config, report: u64, output: &Path) -> Result<(), FieldError> {
    let validated_output = validate_output_path(output)?;

    let workspace = config.open_workspace()?;
    let data = export_json(&workspace, ReportId(report))?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| FieldError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Look up a node in the configured plan table.
pub fn cmd_plan_check(config: &Config, json_mode: bool, node: &str) -> Result<(), FieldError> {
    let workspace = config.open_workspace()?;
    let row = workspace.plan().lookup(node);

    if json_mode {
        let output = serde_json::json!({
            "node": node,
            "found": row.is_some(),
            "row": row,
        });
        print_json(&output);
        return Ok(());
    }

    match row {
        Some(row) => {
            println!("Node:       {}", row.node_name);
            match row.technology {
                Some(technology) => println!("Technology: {}", technology.label()),
                None => println!("Technology: unrecognized ({:?})", row.raw_technology),
            }
        }
        None => println!("Node {} is not in the plan", node),
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
