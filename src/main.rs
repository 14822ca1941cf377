//! Tether CLI binary entry point.

use std::sync::Arc;

use reqwest::Method;
use tether::auth::AuthError;
use tether::cli::{parse_query_pairs, AuthCommands, Cli, Commands, RequestArgs};
use tether::client::{ApiRequest, AuthenticatedClient, RequestBody};
use tether::config::TetherConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse_args();

    let result = match TetherConfig::from_env() {
        Ok(config) => match cli.command {
            Commands::Auth(auth_args) => match auth_args.command {
                AuthCommands::Login(args) => tether::cli::auth::handle_login(&config, &args).await,
                AuthCommands::Status => tether::cli::auth::handle_status(&config).await,
                AuthCommands::Logout => tether::cli::auth::handle_logout(&config).await,
            },
            Commands::Request(args) => handle_request(&config, args).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TETHER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_request(
    config: &TetherConfig,
    args: RequestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let method: Method = args
        .method
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| format!("Invalid HTTP method: '{}'", args.method))?;
    let body = match args.data {
        Some(raw) => Some(RequestBody::Json(
            serde_json::from_str(&raw).map_err(|e| format!("--data is not valid JSON: {e}"))?,
        )),
        None => None,
    };
    let request = ApiRequest::builder()
        .method(method)
        .path(args.path)
        .query(parse_query_pairs(&args.query)?)
        .maybe_body(body)
        .build();

    let listener = Arc::new(|reason: &AuthError| {
        eprintln!("❌ Session ended ({reason}). Run `tether auth login` to sign in again.");
    });
    let client = AuthenticatedClient::new(config, Arc::new(config.credential_store()), listener)?;

    let response = client.send(&request).await?;
    let text = response.text();
    let rendered = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or(text);

    if response.is_success() {
        println!("{rendered}");
        Ok(())
    } else {
        eprintln!("HTTP {}", response.status());
        if !rendered.is_empty() {
            eprintln!("{rendered}");
        }
        std::process::exit(1);
    }
}
