//! weave-table CLI
//!
//! Prints the LR table of a bundled weave language.

use clap::Parser;
use std::fs;
use tracing_subscriber::EnvFilter;
use weave_tools::cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Table {
            language,
            algorithm,
            output,
            format,
            show_conflicts,
        } => {
            let content =
                weave_tools::render_language(language, algorithm.0, format, show_conflicts)?;
            if let Some(output_path) = output {
                fs::write(&output_path, content)?;
                println!("Wrote table to {}", output_path.display());
            } else {
                print!("{content}");
            }
        }
        Commands::Rules { language } => {
            print!("{}", weave_tools::rules(language)?);
        }
    }

    Ok(())
}
