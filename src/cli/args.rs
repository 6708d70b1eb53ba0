//! Command-line argument parsing for the PrepEase AI service
//!
//! Flags override values read from the config file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, EmbedderKind};

/// PrepEase AI service - study material Q&A and quiz generation
#[derive(Parser, Debug)]
#[command(name = "prepease")]
#[command(version)]
#[command(about = "Retrieval-grounded study assistant served over HTTP", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.prepease/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to (host:port)
    #[arg(long)]
    pub bind: Option<String>,

    /// Embedding backend
    #[arg(long, value_enum)]
    pub embedder: Option<EmbedderKind>,

    /// Skip loading the generation model (/study-buddy answers 503)
    #[arg(long)]
    pub no_generator: bool,

    /// Verbosity level: -q (warnings only), default (info), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP service
    Serve,

    /// Print the text extracted from a PDF or PPTX file
    Extract {
        /// File to read
        file: PathBuf,
    },

    /// Display the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }

    /// Apply command-line overrides on top of the file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(embedder) = self.embedder {
            config.models.embedder = embedder;
        }
        if self.no_generator {
            config.models.generation_enabled = false;
        }
    }
}

impl Verbosity {
    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }
}
