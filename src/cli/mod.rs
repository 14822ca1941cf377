//! CLI entry point for tether.

pub mod auth;

use clap::{Parser, Subcommand};

/// Tether CLI
#[derive(Parser, Debug)]
#[command(name = "tether", version, about = "Tether: authenticated API client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// Send an authenticated request
    Request(RequestArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Exchange username and password for a session
    Login(LoginArgs),
    /// Show the stored session
    Status,
    /// Remove the stored session
    Logout,
}

/// Arguments for `tether auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account username (email)
    #[arg(short, long)]
    pub username: String,

    /// Password; falls back to TETHER_PASSWORD, then a stdin prompt
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments for the `request` subcommand.
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the API base URL
    pub path: String,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query")]
    pub query: Vec<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Split `key=value` query arguments.
pub fn parse_query_pairs(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| format!("invalid query parameter '{pair}', expected key=value"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_auth_login() {
        let cli = Cli::try_parse_from(["tether", "auth", "login", "-u", "ada@example.com"])
            .unwrap();
        match cli.command {
            Commands::Auth(auth) => match auth.command {
                AuthCommands::Login(args) => {
                    assert_eq!(args.username, "ada@example.com");
                    assert!(args.password.is_none());
                }
                other => panic!("expected Login, got {other:?}"),
            },
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_auth_status_and_logout() {
        let cli = Cli::try_parse_from(["tether", "auth", "status"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth(AuthArgs {
                command: AuthCommands::Status
            })
        ));
        let cli = Cli::try_parse_from(["tether", "auth", "logout"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth(AuthArgs {
                command: AuthCommands::Logout
            })
        ));
    }

    #[test]
    fn parse_request_with_body_and_query() {
        let cli = Cli::try_parse_from([
            "tether",
            "request",
            "POST",
            "/ponds",
            "-d",
            r#"{"name":"Savings"}"#,
            "-q",
            "limit=10",
        ])
        .unwrap();
        match cli.command {
            Commands::Request(args) => {
                assert_eq!(args.method, "POST");
                assert_eq!(args.path, "/ponds");
                assert_eq!(args.data.as_deref(), Some(r#"{"name":"Savings"}"#));
                assert_eq!(args.query, vec!["limit=10".to_string()]);
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn parse_login_missing_username_is_error() {
        assert!(Cli::try_parse_from(["tether", "auth", "login"]).is_err());
    }

    #[test]
    fn query_pairs_split_on_first_equals() {
        let pairs = parse_query_pairs(&["a=1".to_string(), "b=x=y".to_string()]).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x=y".to_string())
            ]
        );
        assert!(parse_query_pairs(&["novalue".to_string()]).is_err());
        assert!(parse_query_pairs(&["=1".to_string()]).is_err());
    }
}
