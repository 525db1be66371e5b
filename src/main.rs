use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mapi::{
    app::{DiagramGenerationService, GenerationSettings},
    domain::{GenerationError, ProviderKind},
    infra::{
        credentials::{CredentialStore, FileCredentialStore},
        llm::ProviderRegistry,
    },
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "Generate Mermaid diagrams from plain-language prompts")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates Mermaid source for PROMPT and prints it to stdout.
    Generate {
        prompt: String,
        /// Provider to call. Defaults to the stored selection, then openai.
        #[arg(long)]
        provider: Option<ProviderKind>,
        /// API key to use instead of the stored one.
        #[arg(long)]
        api_key: Option<String>,
        /// Fail instead of returning a placeholder when no API key is available.
        #[arg(long)]
        no_offline: bool,
        /// HTTP timeout in seconds.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
    /// Manages stored API keys.
    Credentials {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Lists supported providers and their endpoints.
    Providers,
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Stores SECRET for PROVIDER. A blank secret removes the key.
    Set {
        provider: ProviderKind,
        secret: String,
    },
    Delete {
        provider: ProviderKind,
    },
    /// Makes PROVIDER the default for `generate`.
    Select {
        provider: ProviderKind,
    },
    /// Shows the selected provider and which providers have a key.
    Show,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Generate {
            prompt,
            provider,
            api_key,
            no_offline,
            timeout,
        } => generate(&prompt, provider, api_key, no_offline, timeout),
        Commands::Credentials { action } => {
            manage_credentials(action)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Providers => {
            list_providers()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn generate(
    prompt: &str,
    provider: Option<ProviderKind>,
    api_key: Option<String>,
    no_offline: bool,
    timeout: Option<u64>,
) -> Result<ExitCode> {
    let store = FileCredentialStore::open_default()
        .context("failed to locate the credential file")?;

    let provider = match provider {
        Some(provider) => provider,
        None => store
            .selected_provider()
            .context("failed to read the selected provider")?
            .unwrap_or_default(),
    };
    let credential = match api_key {
        Some(key) => Some(key),
        None => store
            .get(provider)
            .with_context(|| format!("failed to read the stored {provider} API key"))?,
    };

    let mut settings = GenerationSettings::from_env(timeout.map(Duration::from_secs))
        .map_err(|error| anyhow::anyhow!(error.user_message()))?;
    settings.offline_fallback = !no_offline;
    let registry =
        ProviderRegistry::from_env().map_err(|error| anyhow::anyhow!(error.user_message()))?;
    let service = DiagramGenerationService::with_settings(registry, settings)
        .map_err(|error| anyhow::anyhow!(error.user_message()))?;

    match service.generate(prompt, provider, credential.as_deref()) {
        Ok(diagram) => {
            println!("{diagram}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            report_generation_error(&error, provider);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_generation_error(error: &GenerationError, provider: ProviderKind) {
    tracing::debug!(category = ?error.category(), %error, "generation failed");
    eprintln!("error: {}", error.user_message());
    if error.requires_credential_entry() {
        eprintln!("hint: run `mapi credentials set {provider} <API_KEY>`");
    }
}

fn manage_credentials(action: CredentialAction) -> Result<()> {
    let store = FileCredentialStore::open_default()
        .context("failed to locate the credential file")?;

    match action {
        CredentialAction::Set { provider, secret } => {
            store
                .set(provider, &secret)
                .with_context(|| format!("failed to store the {provider} API key"))?;
            if secret.trim().is_empty() {
                println!("Removed {} API key", provider.display_name());
            } else {
                println!("Saved {} API key", provider.display_name());
            }
        }
        CredentialAction::Delete { provider } => {
            store
                .delete(provider)
                .with_context(|| format!("failed to delete the {provider} API key"))?;
            println!("Removed {} API key", provider.display_name());
        }
        CredentialAction::Select { provider } => {
            store
                .select_provider(provider)
                .context("failed to store the selected provider")?;
            println!("Selected {}", provider.label());
        }
        CredentialAction::Show => {
            let selected = store
                .selected_provider()
                .context("failed to read the selected provider")?
                .unwrap_or_default();
            println!("credentials: {}", store.path().display());
            for provider in ProviderKind::ALL {
                let configured = store
                    .get(provider)
                    .with_context(|| format!("failed to read the stored {provider} API key"))?
                    .is_some();
                let marker = if provider == selected { "*" } else { " " };
                let status = if configured { "key set" } else { "no key" };
                println!("{marker} {:<10} {status}", provider.id());
            }
        }
    }

    Ok(())
}

fn list_providers() -> Result<()> {
    let registry =
        ProviderRegistry::from_env().map_err(|error| anyhow::anyhow!(error.user_message()))?;

    for adapter in registry.providers() {
        let kind = adapter.kind();
        println!(
            "{:<10} {:<32} {}",
            kind.id(),
            kind.label(),
            adapter.endpoint_url()
        );
    }

    Ok(())
}
