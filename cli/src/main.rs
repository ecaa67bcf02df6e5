/*
    spotify-taste-rs | Rust client for your Spotify profile, top tracks and taste.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{debug, warn};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use taste_core::fetch::Transport;
use taste_core::markup::console_to_html;
use taste_core::{
    Config, DataFetcher, DataKind, FileTokenStore, MemoryTokenStore, MockTransport, Navigator,
    Payload, ReqwestTransport, Session, TokenStore, Url,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Location used when the client is opened without a redirect URL.
const HOME_LOCATION: &str = "/";

#[derive(Parser)]
#[command(name = "spotify-taste")]
#[command(about = "Log in with Spotify and look at your profile, top tracks and taste", long_about = None)]
struct Cli {
    /// Base URL of the gateway hosting /auth and the data endpoints
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where tokens are saved between runs
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Keep tokens in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Serve canned sample data instead of calling the gateway
    #[arg(long, global = true)]
    mock: bool,

    /// Also write the console log as HTML to this file
    #[arg(long, global = true)]
    html: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Opens the Spotify authorization page, then reads back the URL you were redirected to
    Login {
        /// Only print the authorization URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Completes a login from the URL the authorization page redirected to
    Callback {
        #[arg(value_name = "REDIRECT_URL")]
        url: String,
    },
    /// Shows whether you are logged in
    Status,
    /// Forgets the saved tokens
    Logout,
    /// Fetches your profile
    Profile {
        /// Output the raw response to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
    /// Fetches your top tracks
    Tracks {
        /// Output the raw response to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
    /// Fetches your listening-taste analysis
    Analysis {
        /// Output the raw response to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
    /// Fetches profile, top tracks and analysis at once
    All,
    /// Interactive session: type actions such as 'profile', 'tracks' or 'clear'
    Shell,
}

/// Stands in for the browser: keeps the current location and opens
/// navigations in the system browser.
struct CliNavigator {
    location: String,
    open_browser: bool,
}

impl Navigator for CliNavigator {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn navigate(&mut self, url: &Url) {
        println!("Open this URL to log in with Spotify:");
        println!("   {}", url);
        if self.open_browser {
            if let Err(e) = webbrowser::open(url.as_str()) {
                warn!("Could not open a browser: {}", e);
            }
        }
    }

    fn replace_location(&mut self, url: &str) {
        debug!("Location rewritten to {}", url);
        self.location = url.to_string();
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!();
        eprintln!("[ERROR] {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Login { no_browser } => handle_login(cli, !no_browser).await,
        Commands::Callback { url } => {
            let mut session = open_session(cli, url, false)?;
            session.bootstrap();
            present(cli, &session)
        }
        Commands::Status => {
            let mut session = open_session(cli, HOME_LOCATION, false)?;
            session.bootstrap();
            present(cli, &session)
        }
        Commands::Logout => {
            let mut session = open_session(cli, HOME_LOCATION, false)?;
            session.bootstrap();
            session.logout();
            present(cli, &session)
        }
        Commands::Profile { json } => handle_fetch(cli, DataKind::Profile, json.as_deref()).await,
        Commands::Tracks { json } => handle_fetch(cli, DataKind::Tracks, json.as_deref()).await,
        Commands::Analysis { json } => handle_fetch(cli, DataKind::Analysis, json.as_deref()).await,
        Commands::All => handle_all(cli).await,
        Commands::Shell => handle_shell(cli).await,
    }
}

fn open_session(cli: &Cli, location: &str, open_browser: bool) -> Result<Session> {
    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(api_url) = &cli.api_url {
        config = Config::new(api_url, config.token_path).context("Invalid --api-url")?;
    }
    if let Some(path) = &cli.token_file {
        config.token_path = path.clone();
    }

    let tokens: Box<dyn TokenStore> = if cli.ephemeral {
        Box::new(MemoryTokenStore::new())
    } else {
        let store = FileTokenStore::open(&config.token_path);
        debug!("Using token file {}", store.path().display());
        Box::new(store)
    };

    let transport: Arc<dyn Transport> = if cli.mock {
        Arc::new(MockTransport::default())
    } else {
        Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?)
    };

    let navigator = CliNavigator {
        location: location.to_string(),
        open_browser,
    };

    Ok(Session::new(
        tokens,
        DataFetcher::new(config, transport),
        Box::new(navigator),
    ))
}

/// Prints the status line and the console, newest entry first.
fn present(cli: &Cli, session: &Session) -> Result<()> {
    let status = session.status();
    println!();
    println!("---------------------------------------------------");
    println!(
        "Status: {}{}",
        status.text,
        if status.actions_visible {
            "  (actions: profile, tracks, analysis, all)"
        } else {
            ""
        }
    );
    println!("---------------------------------------------------");

    for entry in session.console().entries() {
        println!("{}", entry);
    }

    if let Some(path) = &cli.html {
        write_file(path, &console_to_html(session.console().entries()))?;
        println!("[SAVED] Console saved to: {}", path);
    }
    Ok(())
}

async fn handle_login(cli: &Cli, open_browser: bool) -> Result<()> {
    let mut session = open_session(cli, HOME_LOCATION, open_browser)?;
    session.bootstrap();
    session.login();

    println!();
    println!("After approving access you will be redirected; paste that URL here (empty to skip):");
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let redirect = stdin.next_line().await?.unwrap_or_default();

    if redirect.trim().is_empty() {
        println!("No redirect URL given. Run 'spotify-taste callback <URL>' once you have it.");
        return Ok(());
    }

    // The redirect is a fresh page load.
    let mut session = open_session(cli, redirect.trim(), false)?;
    session.bootstrap();
    present(cli, &session)
}

async fn handle_fetch(cli: &Cli, kind: DataKind, json_path: Option<&str>) -> Result<()> {
    let mut session = open_session(cli, HOME_LOCATION, false)?;
    session.bootstrap();

    let result = session.fetch(kind).await;
    present(cli, &session)?;

    match result {
        Ok(payload) => {
            if let Some(path) = json_path {
                save_payload(path, &payload)?;
            }
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] {}", e.console_message(kind));
            process::exit(1);
        }
    }
}

async fn handle_all(cli: &Cli) -> Result<()> {
    let mut session = open_session(cli, HOME_LOCATION, false)?;
    session.bootstrap();

    let results = session.fetch_all().await;
    present(cli, &session)?;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        eprintln!();
        eprintln!("[ERROR] {} of {} fetches failed", failed, results.len());
        process::exit(1);
    }
    Ok(())
}

async fn handle_shell(cli: &Cli) -> Result<()> {
    let mut session = open_session(cli, HOME_LOCATION, true)?;
    session.bootstrap();
    present(cli, &session)?;
    print_shell_help();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_shell_help();
                continue;
            }
            "login" => {
                session.login();
                println!("Paste the URL you were redirected to (empty to stay here):");
                let redirect = stdin.next_line().await?.unwrap_or_default();
                if !redirect.trim().is_empty() {
                    session = open_session(cli, redirect.trim(), true)?;
                    session.bootstrap();
                }
            }
            "logout" => session.logout(),
            "clear" => session.clear_console(),
            "status" => {}
            "all" => {
                session.fetch_all().await;
            }
            other => match other.parse::<DataKind>() {
                Ok(kind) => {
                    if let Err(e) = session.fetch(kind).await {
                        debug!("{} action failed: {}", kind, e);
                    }
                }
                Err(e) => {
                    println!("{}. Type 'help' for the list of actions.", e);
                    continue;
                }
            },
        }

        present(cli, &session)?;
    }

    Ok(())
}

fn print_shell_help() {
    println!();
    println!("Actions: login, logout, profile, tracks, analysis, all, clear, status, help, quit");
}

fn save_payload(path: &str, payload: &Payload) -> Result<()> {
    let json_content = serde_json::to_string_pretty(payload)?;
    write_file(path, &json_content)?;
    println!();
    println!("[SAVED] Response saved to: {}", path);
    Ok(())
}

fn write_file(path: &str, content: &str) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create file '{}'", path))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file '{}'", path))
}
