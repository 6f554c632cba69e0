//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Resolve URLs into every mimetype the registered converters can reach
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Root directory, relative file paths resolve against it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: dataregistry.toml)
    #[arg(short = 'C', long, default_value = "dataregistry.toml")]
    pub config: PathBuf,

    /// Log every resolution, overriding `[registry] verbose`
    #[arg(short, long)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List every mimetype a URL resolves to, with its cost
    Resolve {
        /// URL or file path
        url: String,
    },

    /// List the URLs known to the registry
    Urls,

    /// Print the text stored under one mimetype
    Show {
        /// URL or file path
        url: String,

        /// Mimetype to print (default: the cheapest text entry)
        #[arg(short, long)]
        mime_type: Option<String>,
    },

    /// List the viewer labels available for a URL
    Labels {
        /// URL or file path
        url: String,
    },

    /// Open a viewer and wait for it to finish
    View {
        /// URL or file path
        url: String,

        /// Viewer label
        #[arg(default_value = "Print")]
        label: String,
    },
}

impl Commands {
    /// URL argument of the command, if it takes one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Resolve { url }
            | Self::Show { url, .. }
            | Self::Labels { url }
            | Self::View { url, .. } => Some(url),
            Self::Urls => None,
        }
    }
}
