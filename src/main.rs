//! Panel reconciliation CLI.
//!
//! Thin operational front end for the reconciliation engine: load host
//! declarations, publish the derived document, and inspect the control
//! plane. The web UI lives elsewhere and drives the same library API.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxy_panel::audit::LogAuditSink;
use proxy_panel::config::loader::load_or_default;
use proxy_panel::control_plane::ControlPlaneClient;
use proxy_panel::reconcile::Reconciler;
use proxy_panel::resilience::RetryPolicy;
use proxy_panel::store::{HostStore, MemoryStore, NewHost};

#[derive(Parser)]
#[command(name = "proxy-panel")]
#[command(about = "Reconcile declared proxy hosts onto a control plane", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load host declarations from a JSON file and publish the document
    Sync {
        /// JSON file holding an array of host declarations
        #[arg(long)]
        hosts: PathBuf,
    },
    /// Check control-plane liveness and version
    Status,
    /// Show certificate metadata for a domain
    Cert { domain: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "proxy_panel={}",
                    config.observability.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        control_plane = %config.control_plane.base_url,
        "proxy-panel v0.1.0 starting"
    );

    let client = ControlPlaneClient::new(
        config.control_plane.clone(),
        RetryPolicy::from(&config.retry),
    )?;

    match cli.command {
        Commands::Sync { hosts } => {
            let raw = std::fs::read_to_string(&hosts)?;
            let declarations: Vec<NewHost> = serde_json::from_str(&raw)?;

            let store = MemoryStore::new();
            let mut tx = store.begin().await?;
            for declaration in declarations {
                tx.insert(declaration).await?;
            }
            tx.commit().await?;

            let engine = Reconciler::new(store, client, LogAuditSink, config.control_plane.clone());
            let doc = engine.sync().await?;

            let routes = doc.apps.http.servers.values().map(|s| s.routes.len()).sum::<usize>();
            tracing::info!(routes, "document published");
        }
        Commands::Status => {
            let status = client.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Cert { domain } => match client.certificate_status(&domain).await {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("no certificate information for {}", domain),
        },
    }

    Ok(())
}
