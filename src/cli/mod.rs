//! CLI module for L.O.R.E
//!
//! Provides command-line interface parsing and handling for the lore binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// L.O.R.E - Local Retrieval Engine
///
/// Retrieval-augmented question answering over a local document collection.
#[derive(Parser, Debug)]
#[command(
    name = "lore",
    version,
    about = "L.O.R.E - Local Retrieval Engine",
    long_about = "Retrieval-augmented question answering over a local document collection.\n\n\
                  Index a directory of text files once, then ask questions against it;\n\
                  answers are generated by a hosted or local LLM grounded in the most\n\
                  similar chunks of your documents.",
    after_help = "EXAMPLES:\n    \
                  lore index ./docs             # Chunk, embed and index ./docs\n    \
                  lore ask \"What is Qlora?\"     # Answer one question from the index\n    \
                  lore ask --stream \"...\"       # Stream the answer token by token\n    \
                  lore chat                     # Interactive question loop"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "lore.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the index from a directory of documents
    ///
    /// Reads every matching file under the directory, splits the text into
    /// overlapping chunks, embeds them, and saves the index snapshot to the
    /// configured path.
    Index {
        /// Directory containing source documents
        dir: PathBuf,

        /// File extensions to read (defaults to txt,md,pdf)
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,
    },

    /// Answer a single question from the index
    Ask {
        /// The question to answer
        question: String,

        /// Stream the answer as it is generated
        #[arg(long)]
        stream: bool,

        /// Number of chunks to retrieve (overrides the configured top_k)
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the retrieved chunks after the answer
        #[arg(long)]
        show_sources: bool,
    },

    /// Interactive question-answering loop
    ///
    /// Type questions at the prompt; `quit` or `exit` leaves, `:reload`
    /// swaps in a freshly loaded index without restarting.
    Chat,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
