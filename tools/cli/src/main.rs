//! FinVault CLI - Command line interface for profile and blob operations.
//!
//! This tool provides a command-line interface for creating profiles,
//! unlocking them with a PIN, and encrypting/decrypting blobs through the
//! vault's envelope format.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use finvault_common::{ProfileId, SensitiveBytes};
use finvault_crypto::{decrypt, encrypt, BlobEnvelope, KdfParams};
use finvault_storage::LocalStore;
use finvault_vault::{ManagerConfig, ProfileManager, Session};

#[derive(Parser)]
#[command(name = "finvault")]
#[command(about = "FinVault - Encrypted profile vault")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding profile records.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new profile.
    Create {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,

        /// Display name (defaults to the identifier).
        #[arg(short, long)]
        display_name: Option<String>,

        /// KDF strength: "interactive", "moderate", or "sensitive".
        #[arg(short, long, default_value = "interactive")]
        strength: String,
    },

    /// Verify that a PIN unlocks a profile.
    Unlock {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,
    },

    /// Encrypt a file into an envelope string.
    Encrypt {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,

        /// Source file to encrypt.
        #[arg(short, long)]
        source: PathBuf,

        /// Destination file for the serialized envelope.
        #[arg(short, long)]
        dest: PathBuf,

        /// Content tag bound into the ciphertext as associated data.
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Decrypt an envelope string back into a file.
    Decrypt {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,

        /// Source file holding the serialized envelope.
        #[arg(short, long)]
        source: PathBuf,

        /// Destination file for the plaintext.
        #[arg(short, long)]
        dest: PathBuf,
    },

    /// Change a profile's PIN.
    ChangePin {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,
    },

    /// Delete a profile (crypto-shred: all its envelopes become unrecoverable).
    Delete {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show profile information.
    Info {
        /// Profile identifier.
        #[arg(short, long)]
        name: String,
    },

    /// List profiles.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("Could not determine data directory")?
            .join("finvault"),
    };

    // One store and one manager serve every command; `create` picks its
    // KDF strength here so the manager is built with it.
    let kdf_params = match &cli.command {
        Commands::Create { strength, .. } => kdf_params_for(strength)?,
        _ => KdfParams::interactive(),
    };

    let store = Arc::new(LocalStore::new(&data_dir).context("Failed to open profile store")?);
    let manager = ProfileManager::with_config(
        store,
        ManagerConfig {
            kdf_params,
            idle_timeout: None,
        },
    );

    match cli.command {
        Commands::Create {
            name, display_name, ..
        } => cmd_create(&manager, &data_dir, &name, display_name.as_deref()).await,

        Commands::Unlock { name } => cmd_unlock(&manager, &name).await,

        Commands::Encrypt {
            name,
            source,
            dest,
            tag,
        } => cmd_encrypt(&manager, &name, &source, &dest, tag.as_deref()).await,

        Commands::Decrypt { name, source, dest } => {
            cmd_decrypt(&manager, &name, &source, &dest).await
        }

        Commands::ChangePin { name } => cmd_change_pin(&manager, &name).await,

        Commands::Delete { name, yes } => cmd_delete(&manager, &name, yes).await,

        Commands::Info { name } => cmd_info(&manager, &name).await,

        Commands::List => cmd_list(&manager).await,
    }
}

/// Prompt for a PIN securely.
fn prompt_pin(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read PIN")
}

fn kdf_params_for(strength: &str) -> Result<KdfParams> {
    match strength {
        "interactive" => Ok(KdfParams::interactive()),
        "moderate" => Ok(KdfParams::moderate()),
        "sensitive" => Ok(KdfParams::sensitive()),
        _ => anyhow::bail!("Invalid strength. Use: interactive, moderate, or sensitive"),
    }
}

fn parse_id(name: &str) -> Result<ProfileId> {
    ProfileId::new(name).context("Invalid profile name")
}

async fn login(manager: &ProfileManager, name: &str) -> Result<Session> {
    let id = parse_id(name)?;
    let pin = prompt_pin("Enter PIN: ")?;
    manager
        .login(&id, &pin)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))
}

/// Create a new profile.
async fn cmd_create(
    manager: &ProfileManager,
    data_dir: &Path,
    name: &str,
    display_name: Option<&str>,
) -> Result<()> {
    info!("Creating profile: {}", name);

    let pin = prompt_pin("Enter PIN: ")?;
    let confirm = prompt_pin("Confirm PIN: ")?;

    if pin != confirm {
        anyhow::bail!("PINs do not match");
    }

    let id = parse_id(name)?;
    let session = manager
        .create_profile(id, display_name.unwrap_or(name), &pin)
        .await
        .context("Failed to create profile")?;

    println!("Profile created successfully!");
    println!("  ID: {}", session.profile_id());
    println!("  Records: {}", data_dir.display());

    Ok(())
}

/// Verify a PIN.
async fn cmd_unlock(manager: &ProfileManager, name: &str) -> Result<()> {
    let session = login(manager, name).await?;

    println!("Profile unlocked successfully!");
    println!("  ID: {}", session.profile_id());
    println!("  Session: {}", session.handle().as_str());

    Ok(())
}

/// Encrypt a file.
async fn cmd_encrypt(
    manager: &ProfileManager,
    name: &str,
    source: &PathBuf,
    dest: &PathBuf,
    tag: Option<&str>,
) -> Result<()> {
    info!("Encrypting {} to {}", source.display(), dest.display());

    let content = tokio::fs::read(source)
        .await
        .context("Failed to read source file")?;

    let session = login(manager, name).await?;

    let envelope = encrypt(
        session.master_key().context("Session is locked")?,
        &content,
        tag.map(|t| t.as_bytes()),
    )
    .context("Encryption failed")?;

    tokio::fs::write(dest, envelope.serialize())
        .await
        .context("Failed to write envelope")?;

    println!(
        "File encrypted: {} ({} bytes plaintext)",
        dest.display(),
        content.len()
    );

    Ok(())
}

/// Decrypt an envelope file.
async fn cmd_decrypt(
    manager: &ProfileManager,
    name: &str,
    source: &PathBuf,
    dest: &PathBuf,
) -> Result<()> {
    info!("Decrypting {} to {}", source.display(), dest.display());

    let serialized = tokio::fs::read_to_string(source)
        .await
        .context("Failed to read envelope file")?;

    let envelope = BlobEnvelope::deserialize(serialized.trim())
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    let session = login(manager, name).await?;

    // Hold the plaintext in a zeroizing buffer until it is on disk.
    let plaintext = SensitiveBytes::new(
        decrypt(
            session.master_key().context("Session is locked")?,
            &envelope,
        )
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?,
    );

    tokio::fs::write(dest, plaintext.as_bytes())
        .await
        .context("Failed to write output file")?;

    println!(
        "File decrypted: {} ({} bytes)",
        dest.display(),
        plaintext.len()
    );

    Ok(())
}

/// Change a profile's PIN.
async fn cmd_change_pin(manager: &ProfileManager, name: &str) -> Result<()> {
    let id = parse_id(name)?;

    let old_pin = prompt_pin("Enter current PIN: ")?;
    let new_pin = prompt_pin("Enter new PIN: ")?;
    let confirm = prompt_pin("Confirm new PIN: ")?;

    if new_pin != confirm {
        anyhow::bail!("New PINs do not match");
    }

    let session = manager
        .login(&id, &old_pin)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    manager
        .change_pin(&session, &old_pin, &new_pin)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    println!("PIN changed successfully!");

    Ok(())
}

/// Delete a profile.
async fn cmd_delete(manager: &ProfileManager, name: &str, yes: bool) -> Result<()> {
    let id = parse_id(name)?;

    if !yes {
        println!(
            "Deleting profile '{}' destroys its key material; every blob \
             encrypted under it becomes permanently unrecoverable.",
            name
        );
        let answer = rpassword::prompt_password("Type the profile name to confirm: ")?;
        if answer != name {
            anyhow::bail!("Confirmation did not match; nothing deleted");
        }
    }

    manager
        .delete_profile(&id)
        .await
        .context("Failed to delete profile")?;

    println!("Profile deleted: {}", name);

    Ok(())
}

/// Show profile information.
async fn cmd_info(manager: &ProfileManager, name: &str) -> Result<()> {
    let id = parse_id(name)?;
    let record = manager
        .profile_record(&id)
        .await
        .context("Failed to load profile")?;

    println!("Profile Information:");
    println!("  ID: {}", record.id);
    println!("  Display name: {}", record.display_name);
    println!("  Created: {}", record.created_at);
    println!(
        "  Biometric factor: {}",
        if record.biometric_wrapped_master_key.is_some() {
            "enrolled"
        } else {
            "not enrolled"
        }
    );
    println!("  KDF Parameters:");
    println!("    Memory: {} KiB", record.kdf_params.memory_cost);
    println!("    Time: {} iterations", record.kdf_params.time_cost);
    println!("    Parallelism: {}", record.kdf_params.parallelism);

    Ok(())
}

/// List profiles.
async fn cmd_list(manager: &ProfileManager) -> Result<()> {
    let mut ids = manager.list_profiles().await?;
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    if ids.is_empty() {
        println!("No profiles.");
    } else {
        for id in ids {
            println!("{}", id);
        }
    }

    Ok(())
}
