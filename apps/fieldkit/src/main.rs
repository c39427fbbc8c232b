//! # fieldkit - Field Inspection Server
//!
//! The main binary for fieldkit.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) with autosave draft sessions
//! - CLI interface for reports, assets and exports
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/fieldkit (THE BINARY)         │
//! │                                               │
//! │   ┌─────────────┐          ┌─────────────┐    │
//! │   │    CLI      │          │  HTTP API   │    │
//! │   │   (clap)    │          │   (axum)    │    │
//! │   └──────┬──────┘          └──────┬──────┘    │
//! │          └──────────┬─────────────┘           │
//! │                     ▼                         │
//! │             ┌───────────────┐                 │
//! │             │ fieldkit-core │                 │
//! │             │  (THE RULES)  │                 │
//! │             └───────────────┘                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! fieldkit server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! fieldkit report create --name "Zona Norte" --node N-204
//! fieldkit validate -f draft.json
//! fieldkit export --report 1 -o report.json
//! ```

use clap::Parser;
use fieldkit::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // FIELDKIT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("FIELDKIT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fieldkit=info,fieldkit_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the fieldkit startup banner.
fn print_banner() {
    println!(
        r#"
   __ _      _     _ _    _ _
  / _(_) ___| | __| | | _(_) |_
 | |_| |/ _ \ |/ _` | |/ / | __|
 |  _| |  __/ | (_| |   <| | |_
 |_| |_|\___|_|\__,_|_|\_\_|\__|

  Field Inspection Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
