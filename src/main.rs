use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use userdesk::app::App;
use userdesk::config::{ClientConfig, ConfigError};
use userdesk::net::api::Credentials;
use userdesk::net::client::ApiError;
use userdesk::net::envelope::Envelope;
use userdesk::router::RouteError;
use userdesk::router::history::History;
use userdesk::services::auth::AuthError;
use userdesk::storage::FileStorage;
use userdesk::util::translate::Catalog;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "userdesk", about = "User-management console client")]
struct Cli {
    /// Overrides `USERDESK_API_ROOT`.
    #[arg(long)]
    api_root: Option<String>,

    /// Overrides `USERDESK_STORAGE_PATH`.
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Overrides `USERDESK_TOKEN_FIELD`.
    #[arg(long)]
    token_field: Option<String>,

    /// Overrides `USERDESK_ENVELOPE` (`auto`, `flat` or `nested`).
    #[arg(long)]
    envelope: Option<Envelope>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "USERDESK_PASSWORD")]
        password: String,
    },
    /// Sign out on the server and locally.
    Logout,
    /// Show the persisted session.
    Status,
    /// Route a path through the navigation guard.
    Visit { path: String },
    /// Authenticated GET against an API path.
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api_root) = cli.api_root {
        config.api_root = api_root.trim_end_matches('/').to_owned();
    }
    if let Some(path) = cli.storage {
        config.storage_path = path;
    }
    if let Some(field) = cli.token_field {
        config.set_token_field(&field)?;
    }
    if let Some(envelope) = cli.envelope {
        config.shape.envelope = envelope;
    }

    let storage = Arc::new(FileStorage::open(&config.storage_path));
    let navigator = Arc::new(History::default());
    let app = App::bootstrap(&config, storage, navigator)?;

    match cli.command {
        Command::Login { email, password } => run_login(&app, Credentials::new(email, password)).await,
        Command::Logout => run_logout(&app).await,
        Command::Status => {
            print_status(&app);
            Ok(())
        }
        Command::Visit { path } => run_visit(&app, &path),
        Command::Get { path } => run_get(&app, &path).await,
    }
}

async fn run_login(app: &App, credentials: Credentials) -> Result<(), CliError> {
    match app.auth().login(&credentials).await {
        Ok(identity) => {
            println!(
                "signed in as {} (roles: {})",
                identity.name.as_deref().unwrap_or("<unnamed>"),
                identity.roles
            );
            Ok(())
        }
        Err(e) => {
            for (field, messages) in e.field_errors(&Catalog::portuguese()) {
                eprintln!("{field}: {}", messages.join("; "));
            }
            Err(e.into())
        }
    }
}

async fn run_logout(app: &App) -> Result<(), CliError> {
    let outcome = app.auth().logout().await;
    println!("signed out locally");
    outcome.map_err(CliError::from)
}

fn print_status(app: &App) {
    let session = app.session().snapshot();
    println!("authenticated: {}", session.is_authenticated());
    println!("admin: {}", session.is_admin());
    println!("roles: {}", session.identity.roles);
    if let Some(name) = &session.identity.name {
        println!("name: {name}");
    }
}

fn run_visit(app: &App, path: &str) -> Result<(), CliError> {
    let landing = app.router().navigate(path)?;
    if landing.was_redirected() {
        println!("{path} -> {} ({})", landing.path, landing.route.as_str());
    } else {
        println!("{} ({})", landing.path, landing.route.as_str());
    }
    Ok(())
}

async fn run_get(app: &App, path: &str) -> Result<(), CliError> {
    match app.client().get(path).await {
        Ok(response) => print_json(&response.body),
        Err(e) => {
            if !app.session().is_authenticated() {
                eprintln!("session ended; now at {}", app.current_path());
            }
            Err(e.into())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
