//! Weave Tools - developer utilities for weave grammars
//!
//! Builds the LR tables of the bundled languages and renders them for
//! inspection.

pub mod cli;
pub mod visualize;

pub use visualize::*;

use cli::{Language, OutputFormat};
use weave::error::LanguageError;
use weave::grammar::Grammar;
use weave::lr::{LrConfig, LrTable, TableAlgorithm};

/// Render the table of `grammar` in `format`.
///
/// # Errors
/// Table conflicts and JSON serialization failures.
pub fn render<T, V>(
    grammar: &Grammar<T, V>,
    algorithm: TableAlgorithm,
    format: OutputFormat,
    show_conflicts: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let table = LrTable::generate(grammar, &LrConfig::with_algorithm(algorithm))?;
    tracing::info!(
        algorithm = ?algorithm,
        states = table.state_count(),
        resolutions = table.resolutions().len(),
        "table built"
    );
    let content = match format {
        OutputFormat::Text => TableText {
            grammar,
            table: &table,
            show_conflicts,
        }
        .to_string(),
        OutputFormat::Dot => TableDot {
            grammar,
            table: &table,
            show_conflicts,
        }
        .to_string(),
        OutputFormat::Json => generate_json(grammar, &table)?,
    };
    Ok(content)
}

/// Render the table of a bundled language.
///
/// # Errors
/// See [`render`].
pub fn render_language(
    language: Language,
    algorithm: TableAlgorithm,
    format: OutputFormat,
    show_conflicts: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match language {
        Language::Arith => render(
            &weave::demo::ArithSpec::grammar()?,
            algorithm,
            format,
            show_conflicts,
        ),
        Language::Lambda => render(
            &weave::demo::LambdaSpec::grammar()?,
            algorithm,
            format,
            show_conflicts,
        ),
    }
}

/// The numbered rules of a bundled language.
///
/// # Errors
/// Grammar construction errors.
pub fn rules(language: Language) -> Result<String, LanguageError> {
    Ok(match language {
        Language::Arith => RulesText(&weave::demo::ArithSpec::grammar()?).to_string(),
        Language::Lambda => RulesText(&weave::demo::LambdaSpec::grammar()?).to_string(),
    })
}
