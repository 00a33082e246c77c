//! CLI module - Command-line interface for Cinelist
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::{SortKey, SortOrder};

/// Cinelist - Top-rated movie catalogue
/// Browse, search and inspect the top-rated movie list
#[derive(Parser)]
#[command(name = "cinelist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the top-rated catalogue
    #[command(alias = "t")]
    Top {
        /// Ignore the cached copy and fetch again
        #[arg(long)]
        refresh: bool,
        /// Only show movies tagged with this genre name
        #[arg(long, short)]
        genre: Option<String>,
        /// Number of entries to show
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// List movie genres
    #[command(alias = "g")]
    Genres {
        /// Ignore the cached copy and fetch again
        #[arg(long)]
        refresh: bool,
    },

    /// Search the cached catalogue by title
    #[command(alias = "s")]
    Search {
        /// Search text
        #[arg(required = true)]
        query: Vec<String>,
        /// Sort field: title or rank
        #[arg(long)]
        sort: Option<SortKey>,
        /// Sort direction: asc or desc
        #[arg(long)]
        order: Option<SortOrder>,
    },

    /// Show details for a movie
    #[command(alias = "i", alias = "info")]
    Details {
        /// Movie ID
        id: i64,
    },

    /// Live search reading one search-box value per stdin line
    Interactive,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create default config file
    Init,
    /// Print the effective configuration
    Show,
}

pub use commands::*;
