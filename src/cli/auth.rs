//! CLI auth command handlers for login, status, and logout.

use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::auth::{AuthError, AuthService};
use crate::config::TetherConfig;

use super::LoginArgs;

fn service(config: &TetherConfig) -> Result<AuthService, Box<dyn std::error::Error>> {
    let http = config.http_client()?;
    Ok(AuthService::new(
        config.token_endpoint(http),
        Arc::new(config.credential_store()),
    ))
}

/// Handle `tether auth login`.
pub async fn handle_login(
    config: &TetherConfig,
    args: &LoginArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match args.password.clone() {
        Some(p) => p,
        None => match std::env::var("TETHER_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => prompt_password()?,
        },
    };

    match service(config)?.login(&args.username, &password).await {
        Ok(pair) => {
            println!("✅ Logged in as {}", args.username);
            if !pair.has_refresh() {
                println!("   No refresh credential issued; log in again when the session ends.");
            }
            Ok(())
        }
        Err(AuthError::InvalidCredentials) => {
            eprintln!("❌ Incorrect username or password");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle `tether auth status`.
pub async fn handle_status(config: &TetherConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Session ({}):", config.base_url());
    match service(config)?.status()? {
        Some(pair) => {
            println!("  ✅ logged in (profile {})", config.profile());
            let refresh = if pair.has_refresh() { "yes" } else { "no" };
            println!("     refresh credential stored: {refresh}");
            if let Some(at) = pair.last_refresh {
                println!("     last refreshed: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => println!("  ❌ not logged in"),
    }
    Ok(())
}

/// Handle `tether auth logout`.
pub async fn handle_logout(config: &TetherConfig) -> Result<(), Box<dyn std::error::Error>> {
    service(config)?.logout()?;
    println!("✅ Logged out");
    Ok(())
}

fn prompt_password() -> Result<String, Box<dyn std::error::Error>> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(&['\r', '\n'][..]).to_string();
    if password.is_empty() {
        return Err("password must not be empty".into());
    }
    Ok(password)
}
