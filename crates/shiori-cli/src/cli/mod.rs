//! Command-line interface for the shiori watch list.

mod commands;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use shiori_api::ApiClient;
use shiori_core::catalog::SortOrder;
use shiori_core::config::AppConfig;
use shiori_core::event_log::{shared_event_log, SharedEventLog, StoreEvent};
use shiori_core::models::{ListFilter, Subject};
use shiori_core::session::Session;
use shiori_core::Status;

/// Shiori - keep track of the anime you watch
#[derive(Parser)]
#[command(name = "shiori")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show a watch list
    #[command(alias = "ls")]
    List {
        /// Another user's id; defaults to your own list
        #[arg(long)]
        user: Option<String>,
        /// all, favorites, or a status such as watching or on-hold
        #[arg(long, short, default_value = "all")]
        filter: ListFilter,
    },

    /// Add an anime to your list
    #[command(alias = "a")]
    Add { anime_id: String },

    /// Change the status of a list entry
    Status { anime_id: String, status: Status },

    /// Set or clear the note on a list entry
    Note {
        anime_id: String,
        /// Omit to clear the note
        text: Option<String>,
    },

    /// Toggle the favorite flag of a list entry
    Fav { anime_id: String },

    /// Remove an anime from your list
    #[command(alias = "remove")]
    Rm { anime_id: String },

    /// Count entries per status
    Stats {
        #[arg(long)]
        user: Option<String>,
    },

    /// Browse the catalog
    Catalog {
        #[arg(long)]
        genre: Option<String>,
        #[arg(long, short)]
        search: Option<String>,
        /// title-asc, title-desc or none
        #[arg(long, default_value = "title-asc")]
        sort: SortOrder,
    },

    /// Show one catalog entry
    Anime { id: String },

    /// Show a profile
    Profile {
        #[arg(long)]
        user: Option<String>,
    },

    /// Update your profile; unset fields keep their current value
    EditProfile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Manage friends and friend requests
    Friends {
        #[command(subcommand)]
        command: FriendsCommands,
    },

    /// Permanently delete your account
    DeleteAccount {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Show settings, or change and save them
    Config {
        /// Backend root, e.g. http://localhost:5000
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Send a message to the site operators
    Contact {
        name: String,
        email: String,
        message: String,
    },
}

#[derive(Subcommand)]
pub enum FriendsCommands {
    /// List your friends
    #[command(alias = "ls")]
    List,
    /// Show incoming friend requests
    Requests,
    /// Send a friend request
    Send { user_id: String },
    /// Accept an incoming request
    Accept { request_id: String },
    /// Decline an incoming request
    Reject { request_id: String },
    /// Remove a friend
    #[command(alias = "rm")]
    Remove { friend_id: String },
    /// Find users you can send a request to
    Search { query: String },
}

/// Config, stored session and the shared event log for one invocation.
pub struct Context {
    pub config: AppConfig,
    pub session: Option<Session>,
    pub events: SharedEventLog,
    session_path: PathBuf,
}

impl Context {
    pub fn load(config: AppConfig) -> anyhow::Result<Self> {
        let session_path = AppConfig::session_path();
        let session = Session::load(&session_path)?;
        Ok(Self {
            config,
            session,
            events: shared_event_log(),
            session_path,
        })
    }

    /// Client carrying the stored credential, if any.
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        let credential = self.session.as_ref().map(|s| s.token.clone());
        Ok(ApiClient::from_config(&self.config.api, credential)?)
    }

    /// Like [`client`](Self::client) but requires a logged-in session.
    pub fn authed_client(&self) -> anyhow::Result<ApiClient> {
        if self.session.is_none() {
            anyhow::bail!("not logged in; run `shiori login <email>` first");
        }
        self.client()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.user_id.as_deref())
    }

    pub fn save_session(&mut self, session: Session) -> anyhow::Result<()> {
        session
            .save(&self.session_path)
            .with_context(|| format!("saving session to {}", self.session_path.display()))?;
        self.session = Some(session);
        Ok(())
    }

    pub fn clear_session(&mut self) -> anyhow::Result<()> {
        Session::clear(&self.session_path)?;
        self.session = None;
        Ok(())
    }

    /// Print load problems the stores recorded (dropped entries and the like).
    pub fn report_warnings(&self) {
        let Ok(log) = self.events.lock() else {
            return;
        };
        for (_, event) in log.snapshot() {
            match event {
                StoreEvent::EntryDropped { entry_id, reason } => match entry_id {
                    Some(id) => eprintln!("warning: skipped entry {id}: {reason}"),
                    None => eprintln!("warning: skipped entry: {reason}"),
                },
                StoreEvent::UnknownStatus { anime_id, raw } => {
                    eprintln!("warning: {anime_id} has unknown status {raw:?}")
                }
                _ => {}
            }
        }
    }
}

fn subject(user: Option<String>) -> Subject {
    user.map(Subject::User).unwrap_or_default()
}

/// Read one line from stdin after printing `label`.
pub(crate) fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let mut ctx = Context::load(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::cmd_login(&mut ctx, &email, password).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::cmd_register(&mut ctx, &username, &email, password).await,
        Commands::Logout => commands::cmd_logout(&mut ctx),
        Commands::List { user, filter } => commands::cmd_list(&ctx, subject(user), filter).await,
        Commands::Add { anime_id } => commands::cmd_add(&ctx, &anime_id).await,
        Commands::Status { anime_id, status } => {
            commands::cmd_set_status(&ctx, &anime_id, status).await
        }
        Commands::Note { anime_id, text } => commands::cmd_note(&ctx, &anime_id, text).await,
        Commands::Fav { anime_id } => commands::cmd_favorite(&ctx, &anime_id).await,
        Commands::Rm { anime_id } => commands::cmd_remove(&ctx, &anime_id).await,
        Commands::Stats { user } => commands::cmd_stats(&ctx, subject(user)).await,
        Commands::Catalog {
            genre,
            search,
            sort,
        } => commands::cmd_catalog(&ctx, genre, search, sort).await,
        Commands::Anime { id } => commands::cmd_anime(&ctx, &id).await,
        Commands::Profile { user } => commands::cmd_profile(&ctx, subject(user)).await,
        Commands::EditProfile {
            username,
            email,
            avatar,
            password,
        } => commands::cmd_edit_profile(&ctx, username, email, avatar, password).await,
        Commands::Friends { command } => commands::cmd_friends(&ctx, command).await,
        Commands::DeleteAccount { yes } => commands::cmd_delete_account(&mut ctx, yes).await,
        Commands::Config {
            base_url,
            timeout_secs,
        } => commands::cmd_config(&mut ctx, base_url, timeout_secs),
        Commands::Contact {
            name,
            email,
            message,
        } => commands::cmd_contact(&ctx, name, email, message).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_filter() {
        let cli = Cli::try_parse_from(["shiori", "list", "--filter", "on-hold"]).unwrap();
        match cli.command {
            Commands::List { user, filter } => {
                assert!(user.is_none());
                assert_eq!(filter, ListFilter::Status(Status::OnHold));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_status_and_friends() {
        let cli = Cli::try_parse_from(["shiori", "status", "A1", "completed"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status { status: Status::Completed, .. }
        ));

        let cli = Cli::try_parse_from(["shiori", "friends", "accept", "r1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Friends {
                command: FriendsCommands::Accept { .. }
            }
        ));

        assert!(Cli::try_parse_from(["shiori", "status", "A1", "rewatching"]).is_err());
    }

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(["shiori", "config", "--timeout-secs", "30"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                base_url: None,
                timeout_secs: Some(30)
            }
        ));
    }
}
