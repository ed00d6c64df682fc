//! lockbox - Local password manager
//!
//! Commands:
//! - (none) / menu: Interactive numbered menu
//! - init: Set the master passphrase
//! - add <ACCOUNT>: Store a credential (secret is prompted)
//! - list: Show every credential
//! - search <TERM>: Case-insensitive account search
//! - get <ACCOUNT>: Print one secret
//! - delete <ACCOUNT>: Remove a credential
//! - passwd: Change the master passphrase
//! - export [FILE]: Write an encrypted backup
//! - import <FILE>: Restore an encrypted backup

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use lockbox::error::{kind, LockboxError};
use lockbox::menu::{self, print_credential};
use lockbox::prompt::{Prompter, TerminalPrompter};
use lockbox::{Credential, UnlockedVault, Vault};
use lockbox_core::{Config, Paths};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(about = "Local password manager - credentials encrypted at rest behind a master passphrase")]
#[command(version)]
#[command(after_help = r#"FILES:
    Store directory (default ~/.local/share/lockbox, or --dir / store_dir in config):
    - key.key          AES-256 key, created on first unlock
    - master.hash      SHA-256 of the master passphrase
    - passwords.json   account -> username + sealed password
    Config: ~/.config/lockbox/config.json

SECURITY:
    - Three wrong master passphrases end the process
    - Anyone holding key.key can read the passwords; keep it private
    - No locking: run one lockbox process per store at a time"#)]
struct Cli {
    /// Store directory (overrides config)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,

    /// Set the master passphrase for a new store
    Init,

    /// Store a credential (secret is always prompted, hidden)
    Add {
        /// Account or website name
        account: String,
        /// Username or email (prompted if omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Replace an existing account without asking
        #[arg(short, long)]
        force: bool,
    },

    /// List every credential with its secret
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Find credentials whose account contains TERM (case-insensitive)
    Search {
        term: String,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print one secret
    Get {
        /// Don't print trailing newline (useful for piping)
        #[arg(short = 'n')]
        no_newline: bool,
        account: String,
    },

    /// Delete a credential permanently
    Delete {
        account: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Change the master passphrase
    Passwd,

    /// Export the store to an encrypted backup file
    Export {
        #[arg(default_value = "lockbox_backup.age")]
        file: PathBuf,
    },

    /// Restore the store from an encrypted backup file
    Import {
        file: PathBuf,
        /// Replace an existing store (requires unlocking it first)
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = Paths::new();
    let config = Config::load(&paths.config_file())?;
    let store_dir = config.store_dir(&paths, cli.dir.as_deref());
    let mut vault = Vault::new(&store_dir);
    let mut prompter = TerminalPrompter;

    match cli.command {
        None | Some(Commands::Menu) => {
            menu::run_interactive(&mut vault, &config, &mut prompter, &mut io::stdout())
        }
        Some(Commands::Init) => cmd_init(&vault, &paths, &config, &mut prompter),
        Some(Commands::Add {
            account,
            username,
            force,
        }) => cmd_add(&mut vault, &mut prompter, &account, username, force),
        Some(Commands::List { json }) => cmd_list(&mut vault, &mut prompter, &config, json),
        Some(Commands::Search { term, json }) => {
            cmd_search(&mut vault, &mut prompter, &config, &term, json)
        }
        Some(Commands::Get {
            no_newline,
            account,
        }) => cmd_get(&mut vault, &mut prompter, &account, no_newline),
        Some(Commands::Delete { account, yes }) => {
            cmd_delete(&mut vault, &mut prompter, &config, &account, yes)
        }
        Some(Commands::Passwd) => cmd_passwd(&mut vault, &mut prompter),
        Some(Commands::Export { file }) => cmd_export(&mut vault, &mut prompter, &file),
        Some(Commands::Import { file, force }) => {
            cmd_import(&mut vault, &mut prompter, &file, force)
        }
    }
}

/// Unlock an existing store, three tries
fn open(vault: &mut Vault, prompter: &mut impl Prompter) -> Result<UnlockedVault> {
    if !vault.is_initialized() {
        bail!(LockboxError::NotInitialized);
    }
    menu::unlock(vault, prompter, &mut io::stdout())
}

/// Ask twice for a new passphrase
fn new_passphrase(prompter: &mut impl Prompter, what: &str) -> Result<String> {
    let first = prompter.secret(&format!("New {}: ", what))?;
    let second = prompter.secret(&format!("Confirm {}: ", what))?;
    if first != second {
        bail!("Passphrases don't match");
    }
    if first.is_empty() {
        bail!(LockboxError::EmptyPassphrase);
    }
    Ok(first)
}

fn cmd_init(
    vault: &Vault,
    paths: &Paths,
    config: &Config,
    prompter: &mut impl Prompter,
) -> Result<()> {
    if vault.is_initialized() {
        println!("warning: Store already initialized at {}", vault.root().display());
        return Ok(());
    }

    menu::setup_master(vault, prompter, &mut io::stdout())?;
    println!("Store: {}", vault.root().display());

    let config_path = paths.config_file();
    if !config_path.exists() {
        config.save(&config_path)?;
        println!("Created default config at {}", config_path.display());
    }
    println!("Add credentials with: lockbox add <account>");
    Ok(())
}

fn cmd_add(
    vault: &mut Vault,
    prompter: &mut impl Prompter,
    account: &str,
    username: Option<String>,
    force: bool,
) -> Result<()> {
    let session = open(vault, prompter)?;

    let mut overwrite = force;
    if session.exists(account) && !overwrite {
        let question = format!("Account '{}' already exists. Overwrite?", account.trim());
        if !prompter.confirm(&question)? {
            println!("Cancelled.");
            return Ok(());
        }
        overwrite = true;
    }

    let username = match username {
        Some(u) => u,
        None => prompter.line("Username/Email: ")?,
    };
    let secret = prompter.secret("Password: ")?;

    session.add(account, &username, &secret, overwrite)?;
    println!("success: Password for '{}' saved", account.trim());
    Ok(())
}

/// JSON shape of a credential for --json output
#[derive(Serialize)]
struct CredentialView<'a> {
    account: &'a str,
    username: &'a str,
    password: Option<&'a str>,
    error: Option<String>,
    updated: Option<String>,
}

impl<'a> From<&'a Credential> for CredentialView<'a> {
    fn from(cred: &'a Credential) -> Self {
        Self {
            account: &cred.account,
            username: &cred.username,
            password: cred.secret.as_deref().ok(),
            error: cred.secret.as_ref().err().map(|e| e.to_string()),
            updated: cred.updated.map(|t| t.to_rfc3339()),
        }
    }
}

fn print_credentials(credentials: &[Credential], config: &Config, json: bool) -> Result<()> {
    if json {
        let views: Vec<CredentialView> = credentials.iter().map(CredentialView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    let mut out = io::stdout();
    for cred in credentials {
        print_credential(&mut out, cred, config.show_secrets)?;
    }
    Ok(())
}

fn cmd_list(
    vault: &mut Vault,
    prompter: &mut impl Prompter,
    config: &Config,
    json: bool,
) -> Result<()> {
    let session = open(vault, prompter)?;
    let credentials = session.view_all();

    if credentials.is_empty() && !json {
        println!("No passwords stored. Add one with: lockbox add <account>");
        return Ok(());
    }
    print_credentials(&credentials, config, json)
}

fn cmd_search(
    vault: &mut Vault,
    prompter: &mut impl Prompter,
    config: &Config,
    term: &str,
    json: bool,
) -> Result<()> {
    let session = open(vault, prompter)?;
    let matches = session.search(term);

    if matches.is_empty() && !json {
        println!("No account found matching '{}'", term);
        return Ok(());
    }
    print_credentials(&matches, config, json)
}

fn cmd_get(
    vault: &mut Vault,
    prompter: &mut impl Prompter,
    account: &str,
    no_newline: bool,
) -> Result<()> {
    let session = open(vault, prompter)?;
    let value = session.get(account)?.secret?;

    if no_newline {
        print!("{}", value);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn cmd_delete(
    vault: &mut Vault,
    prompter: &mut impl Prompter,
    config: &Config,
    account: &str,
    yes: bool,
) -> Result<()> {
    let session = open(vault, prompter)?;

    if !session.exists(account) {
        println!("Account '{}' not found.", account.trim());
        return Ok(());
    }

    if config.confirm_delete && !yes {
        let question = format!("Are you sure you want to delete '{}'?", account.trim());
        if !prompter.confirm(&question)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    match session.delete(account) {
        Ok(()) => {
            println!("success: Password for '{}' deleted", account.trim());
            Ok(())
        }
        Err(e) if matches!(kind(&e), Some(LockboxError::NotFound(_))) => {
            println!("Account '{}' not found.", account.trim());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_passwd(vault: &mut Vault, prompter: &mut impl Prompter) -> Result<()> {
    let session = open(vault, prompter)?;
    let passphrase = new_passphrase(prompter, "master password")?;
    session.change_master(&passphrase)?;
    println!("success: Master password changed");
    Ok(())
}

fn cmd_export(vault: &mut Vault, prompter: &mut impl Prompter, file: &Path) -> Result<()> {
    let session = open(vault, prompter)?;
    let passphrase = new_passphrase(prompter, "backup passphrase")?;
    session.export(file, &passphrase)?;

    println!("success: Store exported to: {}", file.display());
    println!("The backup contains the store key; keep the backup passphrase safe.");
    Ok(())
}

fn cmd_import(
    vault: &mut Vault,
    prompter: &mut impl Prompter,
    file: &Path,
    force: bool,
) -> Result<()> {
    if !file.exists() {
        bail!("Import file not found: {}", file.display());
    }

    // Replacing a store requires proving access to it first
    if vault.is_initialized() && force {
        open(vault, prompter)?;
    }

    let passphrase = prompter.secret("Backup passphrase: ")?;
    vault.import(file, &passphrase, force)?;

    println!("success: Store imported into {}", vault.root().display());
    Ok(())
}
