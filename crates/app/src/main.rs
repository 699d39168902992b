//! idlink - log in against a third-party identity provider from the
//! command line and print the normalized identity.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use idlink_application::{CancellationToken, IdentityProvider, RequestContext};
use idlink_infrastructure::{AuthenticatedFetcher, ProviderRegistry};

use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "idlink", version, about)]
struct Cli {
    /// Settings file; missing files are ignored.
    #[arg(long, global = true, default_value = "idlink.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered providers and whether they are configured.
    Providers,
    /// Print the URL that starts a login.
    AuthorizeUrl {
        /// Provider name.
        provider: String,
        /// Opaque CSRF state echoed back on the redirect.
        #[arg(long)]
        state: String,
    },
    /// Exchange an authorization code and print the identity as JSON.
    Login {
        /// Provider name.
        provider: String,
        /// Authorization code from the redirect.
        code: String,
        /// Give up on the identity fetch after this many seconds.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;

    let fetcher = AuthenticatedFetcher::with_timeout(settings.http.timeout())
        .context("failed to build HTTP client")?;
    let registry = ProviderRegistry::builtin(Arc::new(fetcher));

    match cli.command {
        Command::Providers => {
            for name in registry.names() {
                let status = match settings.provider(name) {
                    Some(config) if config.enabled => "configured",
                    Some(_) => "disabled",
                    None => "not configured",
                };
                println!("{name}\t{status}");
            }
        }
        Command::AuthorizeUrl { provider, state } => {
            let provider = build_provider(&registry, &settings, &provider)?;
            println!("{}", provider.authorization_url(&state));
        }
        Command::Login {
            provider,
            code,
            timeout_secs,
        } => {
            let provider = build_provider(&registry, &settings, &provider)?;
            login(provider.as_ref(), &code, Duration::from_secs(timeout_secs)).await?;
        }
    }

    Ok(())
}

fn build_provider(
    registry: &ProviderRegistry,
    settings: &Settings,
    name: &str,
) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    if !registry.contains(name) {
        bail!(
            "unknown provider '{name}' (available: {})",
            registry.names().join(", ")
        );
    }
    let Some(config) = settings.provider(name) else {
        bail!("provider '{name}' has no [providers.{name}] settings");
    };
    Ok(registry.build(name, config)?)
}

async fn login(provider: &dyn IdentityProvider, code: &str, timeout: Duration) -> anyhow::Result<()> {
    let token = provider
        .exchange_code(code)
        .await
        .with_context(|| format!("{} rejected the authorization code", provider.name()))?;
    tracing::info!(provider = provider.name(), "authorization code exchanged");

    let (cancel, receiver) = CancellationToken::new();
    let ctx = RequestContext::background()
        .with_timeout(timeout)
        .with_cancellation(receiver);

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling identity fetch");
            cancel.cancel();
        }
    });

    let identity = provider.fetch_identity(&ctx, &token).await;
    interrupt.abort();

    let identity =
        identity.with_context(|| format!("failed to fetch identity from {}", provider.name()))?;
    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}
