//! Shelf command-line entrypoint.
//!
//! ```bash
//! shelf serve          # run the HTTP server
//! shelf check-config   # print the resolved settings as JSON
//! shelf routes         # list the documented API paths
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_app::App;
use shelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about = "Shelf book tracking service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Load and validate configuration, then print it
    CheckConfig,
    /// Print every documented route with its methods
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load shelf settings")?;

    match cli.command {
        Commands::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "starting shelf server");
            App::build(settings).await?.serve().await
        }
        Commands::CheckConfig => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
        Commands::Routes => {
            let app = App::build(settings).await?;
            let spec = shelf_http::router::merged_openapi(app.registry());
            if let Some(paths) = spec["paths"].as_object() {
                for (path, item) in paths {
                    let methods: Vec<String> = item
                        .as_object()
                        .map(|ops| ops.keys().map(|m| m.to_uppercase()).collect())
                        .unwrap_or_default();
                    println!("{:<40} {}", path, methods.join(","));
                }
            }
            Ok(())
        }
    }
}
