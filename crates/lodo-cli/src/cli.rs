use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lodo")]
#[command(about = "Offline-first todos that sync when you're back online")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for remote configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Commit changes locally without contacting the server
    #[arg(long, global = true)]
    pub offline: bool,

    /// Quick add: lodo "buy milk"
    #[arg(trailing_var_arg = true)]
    pub title: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new record
    #[command(alias = "new")]
    Add {
        /// Record title
        title: Vec<String>,
    },
    /// List records that are not in the trash
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List soft-deleted records awaiting purge
    Trash {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a record with its sync status
    Show {
        /// Record ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing record
    Edit {
        /// Record ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// Mark as completed
        #[arg(long, conflicts_with = "undone")]
        done: bool,
        /// Mark as not completed
        #[arg(long)]
        undone: bool,
    },
    /// Move a record to the trash
    #[command(alias = "rm")]
    Delete {
        /// Record ID or unique ID prefix
        id: String,
    },
    /// Restore a record from the trash
    Recover {
        /// Record ID or unique ID prefix
        id: String,
    },
    /// Retry a record whose last sync failed
    Resolve {
        /// Record ID or unique ID prefix
        id: String,
    },
    /// Pull remote changes and push pending local ones
    Sync,
    /// Purge trashed records past the retention window
    Sweep,
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// User access token (JWT) sent instead of the anon key
        #[arg(long, value_name = "TOKEN")]
        access_token: Option<String>,
        /// Remote table name
        #[arg(long, value_name = "NAME")]
        table: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the effective remote configuration
    Show {
        /// Profile name to show
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
