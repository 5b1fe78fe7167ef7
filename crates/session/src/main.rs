use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_core::config::VendorCredentials;
use parley_core::validation::validate_nickname;
use parley_session::client::ApiClient;
use parley_session::config::{ShellConfig, DEFAULT_API_URL, DEFAULT_SESSION_FILE};
use parley_session::relay::{Relay, VendorEvent};
use parley_session::session::{sign_in, sign_out, update_profile, Session, SessionStore};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "parley-session")]
#[command(about = "Parley chat session shell", version)]
struct Args {
    #[arg(long, env = "PARLEY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    #[arg(long, env = "PARLEY_SESSION_FILE", default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register (or refresh) a user and store the session locally
    Login {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        nickname: String,
    },
    /// Forget the local session
    Logout,
    /// Show the signed-in user as the API stores it
    Whoami,
    /// Edit the signed-in user's nickname and profile image
    Profile {
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        profile_url: Option<String>,
        /// Image file to upload and use as the profile image
        #[arg(long, conflicts_with = "profile_url")]
        avatar: Option<PathBuf>,
    },
    /// List live channels, newest first
    Channels,
    /// Show the most recent message events
    Events,
    /// Relay newline-delimited vendor events from stdin
    Relay {
        /// Channel the shell starts with selected
        #[arg(long)]
        channel: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    let config = ShellConfig {
        api_url: args.api_url,
        session_file: args.session_file,
    };

    run(config, args.command).await
}

async fn run(config: ShellConfig, command: Command) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let store = SessionStore::new(&config.session_file);

    match command {
        Command::Login { user_id, nickname } => {
            let session = sign_in(&client, &store, &user_id, &nickname).await?;
            print_json(&session)
        }
        Command::Logout => {
            if !sign_out(&store)? {
                info!("no session to clear");
            }
            Ok(())
        }
        Command::Whoami => {
            let session = store.require()?;
            print_json(&client.get_user(&session.id).await?)
        }
        Command::Profile {
            nickname,
            profile_url,
            avatar,
        } => {
            let session = store.require()?;
            validate_nickname(nickname.trim())?;
            let profile_url = match avatar {
                Some(path) => upload_avatar(&client, &path).await?,
                None => profile_url.unwrap_or_default(),
            };
            let (_, user) =
                update_profile(&client, &store, &session, &nickname, &profile_url)
                    .await?;
            print_json(&user)
        }
        Command::Channels => print_json(&client.list_channels().await?),
        Command::Events => print_json(&client.recent_events().await?),
        Command::Relay { channel } => {
            let session = store.require()?;
            relay_stdin(client, session, channel).await
        }
    }
}

async fn upload_avatar(client: &ApiClient, path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("avatar")
        .to_string();

    let url = client
        .upload(bytes, image_content_type(path), &file_name)
        .await?;
    info!(%url, "avatar uploaded");
    Ok(url)
}

async fn relay_stdin(
    client: ApiClient,
    session: Session,
    channel: Option<String>,
) -> anyhow::Result<()> {
    let credentials = VendorCredentials::from_env()?;
    info!(app_id = %credentials.app_id, user_id = %session.id, "relay started");

    let mut relay = Relay::new(client);
    relay.select_channel(channel);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handled = 0u64;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<VendorEvent>(line) {
            Ok(event) => {
                relay.handle(&session, event).await;
                handled += 1;
            }
            Err(err) => warn!(error = %err, "skipping malformed vendor event"),
        }
    }

    info!(
        handled,
        selected_channel = relay.selected_channel().unwrap_or_default(),
        "relay finished"
    );
    Ok(())
}

fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
