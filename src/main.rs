use std::fs;
use std::sync::Arc;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use quill::auth::CredentialHasher;
use quill::config::{DEFAULT_SESSION_HOURS, ServerConfig};
use quill::server::{AppState, create_router};
use quill::store::{SqliteStore, Store};
use quill::types::User;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "A blogging platform backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Hours a session stays valid after sign-in (0 = never expire)
        #[arg(long, default_value_t = DEFAULT_SESSION_HOURS)]
        session_hours: u64,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the database (and optionally create a first account)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("quill.db");
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Database initialized at {}", db_path.display());

    if !non_interactive {
        create_first_account_prompt(&store)?;
    }

    Ok(())
}

fn create_first_account_prompt(store: &SqliteStore) -> anyhow::Result<()> {
    let create_account = inquire::Confirm::new("Would you like to create a first account?")
        .with_default(false)
        .prompt()?;

    if !create_account {
        return Ok(());
    }

    let username = inquire::Text::new("Username:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Username cannot be empty".into())
            } else if !input.chars().all(|c| c.is_ascii_alphanumeric()) {
                Err("Username can only contain letters and digits".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    let email = inquire::Text::new("Email:")
        .with_validator(|input: &str| {
            if input.contains('@') {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Err("Invalid email".into())
            }
        })
        .prompt()?;

    let password = inquire::Password::new("Password:").prompt()?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_lowercase(),
        email: email.to_lowercase(),
        password_hash: CredentialHasher::new().hash(&password)?,
        created_at: Utc::now(),
        profile_picture: None,
        about: None,
    };
    store.create_user(&user)?;

    println!();
    println!("Created account '{}'. Sign in through the API to get a session.", user.username);
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quill=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            session_hours,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                session_hours,
            };

            if !config.db_path().exists() {
                bail!(
                    "Server not initialized. Run 'quill admin init' first to create the database."
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState {
                store: Arc::new(store),
                session_hours: config.session_hours,
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
