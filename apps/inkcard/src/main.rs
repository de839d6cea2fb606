//! # Inkcard
//!
//! Digital business card server and command-line tool.
//!
//! ```text
//!   CLI (clap) ──┐
//!                ├──► Distribution facade ──► inkcard-core engine
//!   HTTP (axum) ─┘            │
//!                             └──► RedbStore (blocking pool, timeout)
//! ```
//!
//! ## Usage
//!
//! ```bash
//! inkcard init
//! inkcard import-template -f classic.json
//! inkcard import-card -f anan.json
//! inkcard print anan
//! inkcard server --port 8080 --site-base https://cards.example.com
//! ```

use clap::Parser;
use inkcard::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // INKCARD_LOG_FORMAT=json switches to machine-parseable logs.
    let log_format = std::env::var("INKCARD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "inkcard=debug,inkcard_core=debug,tower_http=debug"
    } else {
        "inkcard=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ┌──────────────────────────────┐
  │  INKCARD  v{:<18}│
  │  cards · print · vCard       │
  └──────────────────────────────┘
"#,
        env!("CARGO_PKG_VERSION")
    );
}
