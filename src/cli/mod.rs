//! CLI module - Command-line interface for Mediashelf
//!
//! Browsing works anonymously; shelf commands sign in with `--user`/`--password`.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Mediashelf - movie and book shelves backed by TMDB and Google Books
#[derive(Parser)]
#[command(name = "mediashelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub credentials: Credentials,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
pub struct Credentials {
    /// Username used by shelf commands
    #[arg(long, global = true, env = "MEDIASHELF_USER")]
    pub user: Option<String>,

    /// Password used by shelf commands
    #[arg(long, global = true, env = "MEDIASHELF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Browse movies by category or search TMDB
    Movies {
        /// popular, now_playing, top_rated or upcoming
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, short, default_value = "1")]
        page: u32,
    },

    /// Show details about a movie
    Movie {
        /// TMDB id
        id: i64,
    },

    /// Browse books by category or search Google Books
    Books {
        /// fiction, science, history, biography, technology or art
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, short, default_value = "1")]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Show details about a book
    Book {
        /// Google Books volume id
        id: String,
    },

    /// Search as you type: each line read from stdin replaces the term
    Search { catalog: CatalogArg },

    /// Show one of your shelves
    #[command(alias = "ls")]
    List { shelf: ShelfArg },

    /// Put a movie or book on a shelf
    Add { shelf: ShelfArg, id: String },

    /// Take a movie or book off a shelf
    #[command(alias = "rm")]
    Remove { shelf: ShelfArg, id: String },

    /// Set the current page of a book you are reading
    Progress {
        /// Google Books volume id
        id: String,
        page: i32,
    },

    /// Write, update or delete a review
    Review {
        kind: ReviewKind,
        id: String,
        /// 1 to 10
        #[arg(long, short)]
        rating: Option<u8>,
        #[arg(long, short)]
        comment: Option<String>,
        #[arg(long, conflicts_with_all = ["rating", "comment"])]
        delete: bool,
    },

    /// Manage accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account
    Add { username: String, password: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShelfArg {
    ToWatch,
    Watched,
    MovieReviews,
    ToRead,
    Reading,
    Read,
    BookReviews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogArg {
    Movies,
    Books,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewKind {
    Movie,
    Book,
}

pub use commands::*;
