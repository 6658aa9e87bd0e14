//! Module for parsing gene reaction rule strings into AST values

use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::Gpr;

mod lexer;
pub mod parser;
mod token;

/// Parse a gene reaction rule string into a GPR tree
///
/// # Parameters
/// - `input`: &str representing the gene reaction rule
/// - `gene_map`: map of gene id strings to genes, extended with any genes
///   mentioned in the rule but missing from the map
///
/// # Returns
/// Parse result which is
/// - `Ok`: the root node of the GPR tree
/// - `Err`: the GprParseError describing the issue with the rule being parsed
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use driven_core::io::gpr_parse::parse_gpr;
/// let gpr: &str = "Rv0001 and Rv0002";
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
/// ```
pub fn parse_gpr(
    input: &str,
    gene_map: &mut IndexMap<String, Gene>,
) -> Result<Gpr, GprParseError> {
    // Start by creating a lexer and converting the rule string into tokens
    let mut lexer = lexer::Lexer::new(input);
    let tokens = lexer.lex()?;

    // Now parse those tokens into a GPR tree
    let mut parser = parser::GprParser::new(tokens, gene_map);
    let gpr = parser.parse()?;
    Ok(gpr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error)]
pub enum GprParseError {
    /// Lexing error
    #[error("Error occurred during lexing (conversion of rule string to tokens): {0}")]
    LexingError(#[from] LexerError),
    /// Parsing error
    #[error("Error occurred during parsing (conversion of tokens to rule tree): {0}")]
    ParsingError(#[from] ParseError),
}
