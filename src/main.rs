//! MCP server exposing web, image, video and news search over a SearXNG instance
//!
//! Tool calls are translated into SearXNG JSON API queries and the results are normalized into a
//! stable shape. The same searches can be run once from the command line.
mod searxng_mcp;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rmcp::{transport::stdio, ServiceExt};
use searxng_mcp::server::to_payload;
use searxng_mcp::{
    SearXNGClient, SearXNGServer, SearchRequest, WebSearchParams, DEFAULT_BASE_URL,
    DEFAULT_LANGUAGE,
};
use std::process::exit;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the SearXNG instance to query
    #[arg(long, env = "SEARXNG_URL", default_value = DEFAULT_BASE_URL)]
    searxng_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Starts an MCP server on stdio exposing the search tools
    Mcp,
    /// Runs a general web search and prints the JSON result
    Search {
        /// Search keywords
        query: String,
        /// general, images, videos, news, map, music, it, science, files or social
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
        /// day, week, month or year; other values are ignored
        #[arg(long)]
        time_range: Option<String>,
        /// Number of results (1-20)
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Runs an image search and prints the JSON result
    Images {
        query: String,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Runs a video search and prints the JSON result
    Videos {
        query: String,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Runs a news search and prints the JSON result
    News {
        query: String,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Checks whether the SearXNG instance is reachable
    Health,
}

fn init_logging(command: &Commands) {
    match command {
        Commands::Mcp => {
            // stdout carries the protocol, so logs go to a file and only when asked for
            use std::fs::OpenOptions;

            if std::env::var("RUST_LOG").is_ok() {
                if let Ok(log_file) = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open("free-search-mcp.log")
                {
                    env_logger::Builder::from_env("RUST_LOG")
                        .target(env_logger::Target::Pipe(Box::new(log_file)))
                        .init();
                }
            }
        }
        _ => env_logger::init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let args = Cli::parse();
    init_logging(&args.command);

    let client = SearXNGClient::new(&args.searxng_url);

    match args.command {
        Commands::Mcp => {
            if !client.check_health().await {
                log::warn!(
                    "SearXNG at {} is not reachable, searches will fail until it is",
                    client.base_url()
                );
            }

            let service = SearXNGServer::with_client(client.clone())
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    log::error!("Failed to start MCP server: {}", e);
                })?;
            log::info!("Free search MCP server running with SearXNG: {}", client.base_url());
            service.waiting().await?;
        }
        Commands::Search {
            query,
            category,
            language,
            time_range,
            limit,
        } => {
            let request = SearchRequest::try_from(WebSearchParams {
                query,
                category: Some(category),
                language: Some(language),
                time_range,
                limit,
            })?;
            let response = client.search(request).await?;
            println!("{}", to_payload(&response));
        }
        Commands::Images { query, limit } => {
            let response = client.search_images(&query, limit).await?;
            println!("{}", to_payload(&response));
        }
        Commands::Videos { query, limit } => {
            let response = client.search_videos(&query, limit).await?;
            println!("{}", to_payload(&response));
        }
        Commands::News { query, limit } => {
            let response = client.search_news(&query, limit).await?;
            println!("{}", to_payload(&response));
        }
        Commands::Health => {
            if client.check_health().await {
                println!("ok");
            } else {
                eprintln!("SearXNG at {} is unreachable", client.base_url());
                exit(1);
            }
        }
    }

    Ok(())
}
