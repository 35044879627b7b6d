//! Authorization host demo
//!
//! Plays the host application around `uploader-oauth`:
//! 1. Print the authorization URL for the user to open
//! 2. Read back the code (or the whole redirect URL) from the terminal
//! 3. Exchange it for a token and persist the account
//! 4. Check, refresh or drop the token on later runs
//!
//! Run with: cargo run -p uploader-oauth-authorize -- login --client-id ... --client-secret ...

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use uploader_oauth::{
    AccountRecord, AccountStore, AuthorizationGate, ClientCredential, OAuthConfig, OAuthToken,
};

#[derive(Parser, Debug)]
#[command(name = "uploader-oauth-authorize")]
#[command(about = "Authorize an uploader account and manage its OAuth token")]
struct Args {
    /// OAuth client id (overrides the stored one)
    #[arg(long, env = "UPLOADER_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret (overrides the stored one)
    #[arg(long, env = "UPLOADER_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Redirect URI registered with the provider
    #[arg(
        long,
        env = "UPLOADER_REDIRECT_URI",
        default_value = "https://getsharex.com/callback/"
    )]
    redirect_uri: String,

    /// Space-separated scopes to request
    #[arg(long, default_value = "submit")]
    scope: String,

    /// Account file (defaults to the platform config directory)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the consent page and exchange the returned code
    Login,
    /// Show the stored account and token
    Status,
    /// Make sure the token is usable, refreshing it if expired
    Ensure,
    /// Refresh the token now
    Refresh,
    /// Drop the token but keep the client credential
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uploader_oauth=info".into()),
        )
        .init();

    let args = Args::parse();
    let store = args
        .store
        .clone()
        .map(AccountStore::with_path)
        .unwrap_or_default();

    let record = account_record(&args, &store)?;
    let config = OAuthConfig::builder().scope(args.scope.clone()).build();
    let gate = AuthorizationGate::from_record(record, config)?;

    match args.command {
        Command::Login => {
            login(&gate).await?;
            store.save(&gate.record())?;
            println!("✓ Authorized. Account saved at {}", store.path().display());
        }
        Command::Status => {
            println!("Client ID: {}", gate.credential().client_id());
            println!("Status:    {}", gate.status());
            if let Some(token) = gate.current_token() {
                print_token_info(&token);
            }
            println!("Account storage: {}", store.path().display());
        }
        Command::Ensure => {
            let token = gate.valid_token().await?;
            store.save(&gate.record())?;
            println!("✓ Token is valid");
            print_token_info(&token);
        }
        Command::Refresh => {
            let token = gate.refresh().await?;
            store.save(&gate.record())?;
            println!("✓ Token refreshed");
            print_token_info(&token);
        }
        Command::Logout => {
            gate.logout();
            store.save(&gate.record())?;
            println!("✓ Logged out (client credential kept)");
        }
    }

    Ok(())
}

/// Stored account, with credential fields overridden from the command line
fn account_record(args: &Args, store: &AccountStore) -> anyhow::Result<AccountRecord> {
    let stored = store.load()?;

    let (client_id, client_secret) = match (&args.client_id, &args.client_secret, &stored) {
        (Some(id), Some(secret), _) => (id.clone(), secret.clone()),
        (id, secret, Some(record)) => (
            id.clone()
                .unwrap_or_else(|| record.credential.client_id().to_string()),
            secret
                .clone()
                .unwrap_or_else(|| record.credential.client_secret().to_string()),
        ),
        _ => bail!("no stored account; pass --client-id and --client-secret"),
    };

    let credential = ClientCredential::new(client_id, client_secret, args.redirect_uri.clone());
    let token = stored
        .filter(|record| record.credential == credential)
        .and_then(|record| record.token);

    Ok(AccountRecord { credential, token })
}

async fn login(gate: &AuthorizationGate) -> anyhow::Result<()> {
    println!();
    println!("To authorize, please:");
    println!("  1. Open the following URL in your browser");
    println!("  2. Approve access for this application");
    println!("  3. Paste the code (or the whole address you were redirected to) below");
    println!();
    println!("Authorization URL:");
    println!("  {}", gate.authorization_url());
    println!();

    let code = prompt_for_code()?;
    if code.is_empty() || code.eq_ignore_ascii_case("cancel") {
        bail!("authorization cancelled");
    }

    gate.exchange_code(&code)
        .await
        .context("exchanging authorization code")?;
    Ok(())
}

/// Read the authorization code from stdin
fn prompt_for_code() -> anyhow::Result<String> {
    print!("Enter authorization code (or 'cancel' to abort): ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;

    Ok(extract_code(input.trim())?.to_string())
}

/// Accept either a bare code or a redirect URL carrying `code=...`
///
/// A redirect carrying the provider's `error=...` instead is a refusal.
fn extract_code(input: &str) -> anyhow::Result<&str> {
    let Some((_, query)) = input.split_once('?') else {
        return Ok(input);
    };

    let mut error = None;
    for pair in query.split(['&', '#']) {
        if let Some(code) = pair.strip_prefix("code=") {
            return Ok(code);
        }
        if let Some(value) = pair.strip_prefix("error=") {
            error = Some(value);
        }
    }

    match error {
        Some(error) => bail!("provider refused authorization: {error}"),
        None => bail!("redirect address carries no code"),
    }
}

fn print_token_info(token: &OAuthToken) {
    println!("Token Information:");
    println!("  Type: {}", token.token_type());
    println!("  Access Token: {}", uploader_oauth::utils::redact(token.access_token()));

    if let Some(refresh) = token.refresh_token() {
        println!("  Refresh Token: {}", uploader_oauth::utils::redact(refresh));
    }

    if let Some(scope) = token.scope() {
        println!("  Scopes: {scope}");
    }

    match token.remaining_validity() {
        Some(remaining) => {
            let hours = remaining.as_secs() / 3600;
            let minutes = (remaining.as_secs() % 3600) / 60;
            println!("  Expires in: {hours}h {minutes}m");
        }
        None => println!("  Expired"),
    }
}
