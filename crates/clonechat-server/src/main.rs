//! Clone Chat — persona chatbot gateway over a local passage index.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use clonechat_core::CloneChatConfig;
use clonechat_server::{build_router, commands, AppState};

fn print_usage() {
    println!("Clone Chat — persona chatbot gateway");
    println!();
    println!("Usage: clonechat [command]");
    println!();
    println!("Commands:");
    println!("  serve (default)          Start the HTTP server");
    println!("  index <source-dir>       Chunk, embed and add files to the index");
    println!("  stats                    Show index statistics");
    println!("  help                     Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve") => serve().await,
        Some("index") => {
            let Some(source) = args.get(2) else {
                eprintln!("Usage: clonechat index <source-dir>");
                std::process::exit(1);
            };
            let config = CloneChatConfig::from_env()?;
            let report = commands::index(&config, &PathBuf::from(source)).await?;
            commands::print_index_report(&report);
            Ok(())
        }
        Some("stats") => {
            let config = CloneChatConfig::from_env_without_credentials()?;
            let stats = commands::stats(&config)?;
            commands::print_stats(&stats);
            Ok(())
        }
        Some("--help" | "-h" | "help") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'clonechat help' for usage.", other);
            std::process::exit(1);
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = CloneChatConfig::from_env()?;
    info!("Configuration: {:?}", config);

    let addr = config.bind_addr();
    let state = Arc::new(AppState::open(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Clone Chat listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
