use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use bookstore_app::{gateway::StripeGateway, AppState};
use bookstore_db::MemoryStore;
use bookstore_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "bookstore", version, about = "Bookstore marketplace backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print every documented route
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load bookstore settings")?;

    match cli.command {
        Command::Serve => bookstore_app::run(settings).await,
        Command::Migrate => {
            bookstore_telemetry::init(&settings.telemetry)?;
            let applied = bookstore_app::migrate(settings).await?;
            println!("applied {applied} migrations");
            Ok(())
        }
        Command::Routes => print_routes(settings),
    }
}

fn print_routes(settings: Settings) -> anyhow::Result<()> {
    let gateway = Arc::new(StripeGateway::from_settings(&settings.payments)?);
    let state = AppState::new(Arc::new(settings), Arc::new(MemoryStore::new()), gateway);
    let registry = bookstore_app::build_registry(&state)?;

    let document = bookstore_http::router::merged_openapi(&registry);
    let Some(paths) = document.get("paths").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (path, operations) in paths {
        let methods = operations
            .as_object()
            .map(|ops| ops.keys().map(|m| m.to_uppercase()).collect::<Vec<_>>())
            .unwrap_or_default();
        println!("{:<8} {path}", methods.join(","));
    }

    Ok(())
}
