use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing::info;

use drive_auth::{Credentials, OAuthConfig, StdinPrompt};

const DEFAULT_URL: &str = "https://www.googleapis.com/drive/v3/about?fields=user,storageQuota";

/// Obtain a Google Drive credential and make one authenticated GET request.
#[derive(Debug, Parser)]
#[command(name = "drive-auth", version)]
#[command(group(
    ArgGroup::new("credential")
        .required(true)
        .args(["token_file", "refresh_token", "access_token", "service_account"]),
))]
struct Cli {
    /// Token cache file; prompts for an authorization code when it can't be used.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Raw refresh token.
    #[arg(long)]
    refresh_token: Option<String>,

    /// Raw access token (not refreshed).
    #[arg(long)]
    access_token: Option<String>,

    /// Service-account key file.
    #[arg(long)]
    service_account: Option<PathBuf>,

    /// URL to request with the credential.
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,
}

impl Cli {
    fn credentials(self) -> Option<(Credentials, String)> {
        let url = self.url;
        let credentials = if let Some(path) = self.token_file {
            Credentials::TokenFile(path)
        } else if let Some(token) = self.refresh_token {
            Credentials::RefreshToken(token)
        } else if let Some(token) = self.access_token {
            Credentials::AccessToken(token)
        } else {
            Credentials::ServiceAccount(self.service_account?)
        };
        Some((credentials, url))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drive_auth=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let (credentials, url) = Cli::parse()
        .credentials()
        .context("one credential option is required")?;
    let config = OAuthConfig::from_env();
    info!("drive-auth v{}", env!("CARGO_PKG_VERSION"));

    let client = credentials
        .connect(&config, &StdinPrompt)
        .await
        .context("Failed to build authenticated client")?;

    let resp = client
        .get(url.as_str())
        .await?
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?;

    let status = resp.status();
    let body = resp.text().await.context("Failed to read response body")?;
    info!("GET {url} -> {status}");
    println!("{body}");

    if !status.is_success() {
        anyhow::bail!("request failed with {status}");
    }
    Ok(())
}
