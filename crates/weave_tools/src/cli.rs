//! CLI interface for weave-table

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use weave::lr::TableAlgorithm;

#[derive(Parser)]
#[command(name = "weave-table")]
#[command(about = "LR table inspection for the bundled weave languages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and render the LR table of a language
    Table {
        /// Language whose grammar is used
        #[arg(short, long, default_value = "arith")]
        language: Language,

        /// Table construction algorithm
        #[arg(short, long, default_value = "lr1")]
        algorithm: Algorithm,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// List the shift/reduce and reduce/reduce resolutions taken
        #[arg(short, long)]
        show_conflicts: bool,
    },

    /// Print the numbered rules of a language
    Rules {
        #[arg(short, long, default_value = "arith")]
        language: Language,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    Arith,
    Lambda,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arith" | "arithmetic" => Ok(Self::Arith),
            "lambda" => Ok(Self::Lambda),
            _ => Err(format!("Unknown language: {s}. Supported: arith, lambda")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Algorithm(pub TableAlgorithm);

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lr1" | "lr" => Ok(Self(TableAlgorithm::Lr1)),
            "lalr1" | "lalr" => Ok(Self(TableAlgorithm::Lalr1)),
            "slr" => Ok(Self(TableAlgorithm::Slr)),
            _ => Err(format!("Unknown algorithm: {s}. Supported: lr1, lalr1, slr")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Dot,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "dot" | "graphviz" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Supported: text, dot, json")),
        }
    }
}
