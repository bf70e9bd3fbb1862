//! Portfolio site command line.
//!
//! `serve` runs the stand-in data service; every other command is a client of a running
//! service (`SITE_API_URL`).

use std::error::Error;

use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_site::chat::{ChatAssistant, GeminiProvider};
use portfolio_site::client::ApiClient;
use portfolio_site::config::Config;
use portfolio_site::models::{ActivityDraft, ActivityKind, Collection, ServiceDraft};
use portfolio_site::query::{MutationExecutor, QueryClient};
use portfolio_site::session::AuthContext;
use portfolio_site::views::{self, AdminScreen, ScreenState};

#[derive(Parser)]
#[command(name = "portfolio-site")]
#[command(about = "Portfolio site content tools and local data service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local data service
    Serve,

    /// Create an admin account (needs the service key)
    SeedAdmin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SITE_ADMIN_PASSWORD")]
        password: String,
    },

    /// Sign in and check that the issued session is accepted
    VerifyLogin {
        #[arg(long, env = "SITE_ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "SITE_ADMIN_PASSWORD")]
        password: String,
    },

    /// Print a collection as JSON
    List {
        /// team-members, services, projects, activity, network, events, applications, feedback
        collection: Collection,
    },

    /// Print the public services section
    Services,

    /// Append an entry to the activity feed
    AddActivity {
        /// project, member or announcement
        #[arg(long = "type", default_value = "announcement")]
        kind: ActivityKind,
        title: String,
        #[arg(long, env = "SITE_ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "SITE_ADMIN_PASSWORD")]
        password: String,
    },

    /// Delete a record
    Delete {
        collection: Collection,
        id: String,
        #[arg(long, env = "SITE_ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "SITE_ADMIN_PASSWORD")]
        password: String,
    },

    /// Ask the chat assistant; reads questions from stdin when no message is given
    Chat { message: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The query cache is single-threaded; commands run on a local task set.
    LocalSet::new().run_until(run(cli.command, config)).await
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(config.api_url.clone());
    let cache = QueryClient::new();

    match command {
        Commands::Serve => {
            tracing::info!("Starting portfolio site data service");
            portfolio_site::serve(config).await?;
        }

        Commands::SeedAdmin { email, password } => {
            let client = match &config.service_key {
                Some(key) => client.with_service_key(key.clone()),
                None => client,
            };
            let body = json!({ "email": email, "password": password });
            let created: Value = client
                .request(Method::POST, "/auth/admin/users", Some(&body))
                .await?;
            println!("Created admin {}", created["email"].as_str().unwrap_or(&email));
        }

        Commands::VerifyLogin { email, password } => {
            let auth = AuthContext::new(client);
            let session = auth.login(&email, &password).await?;
            let restored = auth.restore(Some(session.token.clone())).await;
            if !restored.is_authenticated() {
                return Err("the service did not accept the issued session".into());
            }
            println!("Signed in as {} until {}", session.email, session.expires_at);
            auth.logout().await;
        }

        Commands::List { collection } => {
            let data = cache
                .fetch(&collection.query_key(), client.collection_fetcher(collection))
                .await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Commands::Services => {
            let state = views::collection_query::<ServiceDraft>(&cache, &client);
            let state = if state.is_settled() {
                state
            } else {
                cache.subscribe(&Collection::Services.query_key()).settled().await
            };

            let section = views::services_section(&state);
            if section.is_fallback {
                println!("(showing default services)");
            }
            for service in section.services {
                println!(
                    "{} {}: {}",
                    service.fields.icon().glyph(),
                    service.fields.title,
                    service.fields.description
                );
            }
        }

        Commands::AddActivity {
            kind,
            title,
            email,
            password,
        } => {
            let auth = AuthContext::new(client.clone());
            auth.login(&email, &password).await?;

            let mutations = MutationExecutor::new(cache).with_auth(auth.clone());
            let mut screen: AdminScreen<ActivityDraft> =
                AdminScreen::new(auth.authorized_client(), mutations);
            screen.load();
            if let ScreenState::LoadFailed { message } = screen.refreshed().await {
                return Err(message.clone().into());
            }

            screen.begin_add();
            if let Some(draft) = screen.draft_mut() {
                *draft = ActivityDraft::new(kind, title);
            }
            screen.submit().await?;
            screen.refreshed().await;

            for entry in screen.items() {
                println!("{}  [{}] {}", entry.created_at, entry.fields.kind, entry.fields.title);
            }
        }

        Commands::Delete {
            collection,
            id,
            email,
            password,
        } => {
            let auth = AuthContext::new(client.clone());
            auth.login(&email, &password).await?;

            let mutations = MutationExecutor::new(cache).with_auth(auth.clone());
            let writer = auth.authorized_client();
            mutations
                .mutate(writer.delete(collection, &id), &[collection.query_key()])
                .await?;
            println!("Deleted {} {}", collection, id);
        }

        Commands::Chat { message } => {
            let provider = GeminiProvider::new(&config.chat)?;
            let mut assistant = ChatAssistant::new(provider, config.contact_email.clone());

            if !message.is_empty() {
                if let Some(reply) = assistant.send(&message.join(" ")).await {
                    println!("{}", reply.text);
                }
                return Ok(());
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(reply) = assistant.send(&line).await {
                    println!("{}", reply.text);
                }
            }
        }
    }

    Ok(())
}
