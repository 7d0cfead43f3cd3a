use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sigexport_cli::cli::{
    dump_conversations, list_chats, prepare_dest, resolve_owner, write_group_metadata, CliConfig,
};
use sigexport_core::tracing_setup::init_tracing;
use sigexport_core::{
    export_group_metadata, fetch_archive, ChatFilter, ConfigFileKeyResolver, CoreConfig,
    IngestOptions, MetadataOptions, SecretSource,
};

#[derive(Parser)]
#[command(name = "sigexport")]
#[command(about = "Export chats and group metadata from a Signal Desktop store")]
struct Cli {
    /// Path to the Signal source directory
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Raw store key (hex), as found in an old config.json
    #[arg(long, global = true)]
    key: Option<String>,

    /// Passphrase for the key resolver
    #[arg(long, global = true)]
    password: Option<String>,

    /// Path to JSON config file (source, key, password, owner)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Comma-separated chat names to include: contact names or group names
    #[arg(long, default_value = "", global = true)]
    chats: String,

    /// Keep chats that end up with no messages
    #[arg(long, global = true)]
    include_empty: bool,

    /// Keep disappearing messages
    #[arg(long, global = true)]
    include_disappearing: bool,

    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available chats and exit
    ListChats,

    /// Write group membership metadata (meta.json, members.csv) per group
    Metadata {
        /// Output directory
        dest: PathBuf,
        /// Owner service id or contact name (defaults to the store's account)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Write every retained chat as JSON lines
    Dump {
        /// Output directory
        dest: PathBuf,
        /// Replace DEST if it already exists
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: {:#}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let flags = CliConfig {
        source: cli.source,
        key: cli.key,
        password: cli.password,
        owner: match &cli.command {
            Commands::Metadata { owner, .. } => owner.clone(),
            _ => None,
        },
    };
    let config = match &cli.config {
        Some(path) => flags.or(CliConfig::load(path)?),
        None => flags,
    };

    let source_dir = match config.source.clone() {
        Some(dir) => dir,
        None => CoreConfig::default_source()
            .context("Could not locate the Signal directory, pass --source")?,
    };
    let core = CoreConfig::new(&source_dir);
    if config.key.is_none() && !core.config_json_path().is_file() {
        anyhow::bail!("config.json not found in directory {}", source_dir.display());
    }

    let secret = match config.key.clone() {
        Some(key) => SecretSource::Raw(key),
        None => SecretSource::Delegate {
            resolver: &ConfigFileKeyResolver,
            source_dir: source_dir.clone(),
            password: config.password.clone(),
        },
    };

    let chats = ChatFilter::parse(&cli.chats);
    let options = IngestOptions {
        chats: chats.clone(),
        include_empty: cli.include_empty,
        include_disappearing: cli.include_disappearing,
    };
    let archive = fetch_archive(&core, secret, &options)?;

    match cli.command {
        Commands::ListChats => {
            println!("{}", list_chats(&archive.contacts));
        }
        Commands::Metadata { dest, .. } => {
            let owner = resolve_owner(&archive, config.owner.as_deref())?;
            let meta_options = MetadataOptions::now(chats.names());
            let exports = export_group_metadata(&archive.contacts, owner, &meta_options)?;
            let written = write_group_metadata(&dest, &exports)?;
            println!("Wrote metadata for {} groups to {}", written.len(), dest.display());
        }
        Commands::Dump { dest, overwrite } => {
            prepare_dest(&dest, overwrite)?;
            let count = dump_conversations(&dest, &archive)?;
            println!("Wrote {} chats to {}", count, dest.display());
        }
    }

    Ok(())
}
