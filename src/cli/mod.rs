pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boardsync")]
#[command(about = "Read and post to a GitHub discussion board", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/boardsync/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with a personal access token
    Login {
        /// Token to use; read from stdin when omitted
        token: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List discussions
    List {
        /// Category to show ("all" for every category)
        #[arg(short, long)]
        category: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Only show discussions whose title or body contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a discussion and its comments
    Show {
        number: u64,
    },
    /// Comment on a discussion
    Comment {
        number: u64,
        body: String,
    },
    /// Start a new discussion
    Create {
        /// Discussion title
        #[arg(short, long)]
        title: String,

        /// Discussion body
        #[arg(short, long)]
        body: String,

        /// Category name
        #[arg(short, long, default_value = "general")]
        category: String,

        /// Extra tags, comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// React to a discussion (+1, -1, laugh, hooray, confused, heart, rocket, eyes)
    React {
        number: u64,
        #[arg(allow_hyphen_values = true)]
        reaction: String,
    },
    /// Delete one of your discussions
    Delete {
        number: u64,
    },
}
