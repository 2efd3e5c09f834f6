use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vc_core::paths::{confessions_path, data_dir, device_store_path, directory_path};
use vc_core::settings::{load_settings, save_settings, KeyBackend, Settings};
use vc_core::share::confess_link;
use vc_core::{Mailbox, MailboxError, TimeLock};
use vc_store::models::DisplayMetadata;
use vc_store::{
    FileConfessionStore, FileDirectory, FileKeyValueStore, IdentityDirectory, KeyCustodian,
    KeyValueStore, KeyringKeyValueStore, StoreError,
};

const KEYRING_SERVICE: &str = "valentine-confessions";

#[derive(Parser)]
#[command(name = "vc")]
#[command(about = "Sealed Valentine confessions", long_about = None)]
struct Cli {
    /// Data directory (defaults to the platform data dir, or VC_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or load this device's key and publish it for USER
    Init {
        user: String,
        /// Display name shown to senders
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
        /// Store the private key in the OS keyring instead of a file
        #[arg(long)]
        keyring: bool,
    },

    /// Show the time lock, key and inbox state for USER
    Status { user: String },

    /// Print the link senders use to confess to USER
    Link {
        user: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Seal a confession for RECIPIENT
    Confess {
        recipient: String,
        message: String,
        /// Sender label; anonymous when omitted
        #[arg(long)]
        from: Option<String>,
    },

    /// Decrypt USER's confessions (only after unlock)
    Reveal {
        user: String,
        #[arg(long)]
        json: bool,
    },

    /// Print this device's private key record for transfer to another device
    ExportKey,

    /// Replace this device's key with an exported record (argument or stdin)
    ImportKey { record: Option<String> },
}

struct App {
    data_dir: PathBuf,
    settings: Settings,
    custodian: KeyCustodian,
    directory: Arc<FileDirectory>,
    mailbox: Mailbox,
}

impl App {
    fn open(data_dir: PathBuf) -> Result<Self> {
        let settings = load_settings(&data_dir)
            .with_context(|| format!("loading settings from {}", data_dir.display()))?;
        let key_store: Arc<dyn KeyValueStore> = match settings.key_backend {
            KeyBackend::File => Arc::new(FileKeyValueStore::new(device_store_path(&data_dir))),
            KeyBackend::Keyring => Arc::new(KeyringKeyValueStore::new(KEYRING_SERVICE)),
        };
        let directory = Arc::new(FileDirectory::new(directory_path(&data_dir)));
        let store = Arc::new(FileConfessionStore::new(confessions_path(&data_dir)));
        let time_lock =
            TimeLock::configured().map_err(|e| anyhow!("invalid build-time unlock instant: {e}"))?;

        Ok(Self {
            custodian: KeyCustodian::new(key_store),
            mailbox: Mailbox::new(directory.clone(), store, time_lock),
            directory,
            settings,
            data_dir,
        })
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        let text = if self.settings.pretty_output {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{text}");
        Ok(())
    }
}

/// Fingerprint of this device's key, `None` when no usable record exists.
async fn local_fingerprint(custodian: &KeyCustodian) -> Result<Option<String>> {
    match custodian.private_key().await {
        Ok(key) => Ok(Some(key.public_key().fingerprint()?)),
        Err(StoreError::KeyMaterialAbsent) | Err(StoreError::Crypto(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vc_cli=info,vc_core=info,vc_store=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => data_dir()?,
    };

    match cli.command {
        Commands::Init {
            user,
            name,
            photo_url,
            keyring,
        } => {
            if keyring {
                let mut settings = load_settings(&data_dir)?;
                settings.key_backend = KeyBackend::Keyring;
                save_settings(&data_dir, &settings)?;
            }
            let app = App::open(data_dir)?;
            let display = DisplayMetadata {
                display_name: name,
                photo_url,
            };
            let report = app.mailbox.provision(&app.custodian, &user, display).await?;
            if report.replaced_corrupt_record {
                eprintln!("warning: the stored private key was unreadable and has been replaced");
            }
            if report.replaced_published_key {
                eprintln!("warning: confessions sealed for your previous key can no longer be decrypted here");
            }
            if report.device_key_differs {
                eprintln!("warning: your published key belongs to another device; import it with `vc import-key`");
            }
            info!(user = %user, data_dir = %app.data_dir.display(), "identity ready");
            app.print_json(&report)?;
        }
        Commands::Status { user } => {
            let app = App::open(data_dir)?;
            let now = Utc::now();
            let lock = app.mailbox.time_lock();
            let fingerprint = local_fingerprint(&app.custodian).await?;
            let published = app.directory.get_public_key(&user).await?.is_some();
            let status = serde_json::json!({
                "unlockAt": lock.unlock_at(),
                "unlocked": lock.is_unlocked(now),
                "remaining": lock.remaining(now).map(|c| c.to_string()),
                "keyMaterial": app.custodian.has_key_material().await?,
                "fingerprint": fingerprint,
                "published": published,
                "confessions": app.mailbox.confession_count(&user).await?,
            });
            app.print_json(&status)?;
        }
        Commands::Link { user, name } => {
            let app = App::open(data_dir)?;
            let name = match name {
                Some(name) => Some(name),
                None => app
                    .directory
                    .get_profile(&user)
                    .await?
                    .and_then(|p| p.display.display_name),
            };
            let url = confess_link(&app.settings.share_base_url, &user, name.as_deref())
                .map_err(|e| anyhow!("invalid share_base_url: {e}"))?;
            println!("{url}");
        }
        Commands::Confess {
            recipient,
            message,
            from,
        } => {
            let app = App::open(data_dir)?;
            let label = from.unwrap_or_else(|| app.settings.default_sender_label.clone());
            let id = app
                .mailbox
                .send(&recipient, &message, Some(&label), Utc::now())
                .await?;
            println!("{id}");
        }
        Commands::Reveal { user, json } => {
            let app = App::open(data_dir)?;
            let confessions = match app.mailbox.open_inbox(&app.custodian, &user, Utc::now()).await {
                Ok(confessions) => confessions,
                Err(MailboxError::Locked { unlock_at }) => {
                    let remaining = app
                        .mailbox
                        .time_lock()
                        .remaining(Utc::now())
                        .map(|c| c.to_string())
                        .unwrap_or_default();
                    return Err(anyhow!("sealed until {unlock_at} ({remaining} left)"));
                }
                Err(e) => return Err(e.into()),
            };
            if json {
                app.print_json(&confessions)?;
            } else if confessions.is_empty() {
                println!("No confessions yet.");
            } else {
                for c in &confessions {
                    println!("[{}] {}: {}", c.created_at.format("%Y-%m-%d %H:%M"), c.sender_label, c.message);
                }
            }
        }
        Commands::ExportKey => {
            let app = App::open(data_dir)?;
            let record = app.custodian.export_private_key().await?;
            println!("{}", record.as_str());
        }
        Commands::ImportKey { record } => {
            let app = App::open(data_dir)?;
            let record = match record {
                Some(record) => record,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let public_key = app.custodian.import_private_key(record.trim()).await?;
            println!("{}", public_key.fingerprint()?);
        }
    }

    Ok(())
}
