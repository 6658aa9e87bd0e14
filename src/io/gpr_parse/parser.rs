use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::{Gpr, GprOperatorType};

/*
GPR Grammar:
expression -> binary ;
binary -> primary (("AND" | "OR") primary)* ;
primary -> GENE | "(" expression ")" ;

e.g. (Gene1 AND Gene2) OR Gene3
 */

/// Gene reaction rule parser
pub struct GprParser<'gm> {
    /// Vector of tokens from the rule string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// Map containing the genes, updated with newly mentioned genes
    pub(crate) gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GprParser<'gm> {
    /// Create a new GprParser
    pub fn new(tokens: Vec<Token>, gene_map: &mut IndexMap<String, Gene>) -> GprParser {
        GprParser {
            tokens,
            current: 0,
            gene_map,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR AST
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.binary()?;
        if !self.is_at_end() {
            // If the entire expression has not been parsed, an error has occurred
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn binary(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.primary()?;

        while self.match_token(&[Token::And, Token::Or]) {
            let operator: GprOperatorType = match self.previous() {
                Token::Or => GprOperatorType::Or,
                Token::And => GprOperatorType::And,
                _ => return Err(ParseError::InvalidBinaryOperator),
            };
            let right = self.primary()?;
            expr = Gpr::new_binary_operation(expr, operator, right);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Some(identifier) = self.match_identifier() {
            self.insert_if_needed(&identifier);
            return Ok(Gpr::new_gene_node(&identifier));
        }

        if self.match_token(&[Token::LeftParen]) {
            let expr = self.binary()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches one of the provided `tokens`,
    /// if it does advance `self.current` and return true, otherwise return false
    fn match_token(&mut self, tokens: &[Token]) -> bool {
        for t in tokens {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Similar to [`Self::match_token`], but for matching an identifier token. If the current
    /// token is an identifier return `Some(GeneId)`, where GeneId is the gene's string
    /// identifier, otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if self.is_at_end() {
            return None;
        }
        if let Token::Identifier(id) = self.peek() {
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek() == *token
    }

    /// Advance `self.current` one position unless at the end of the token Vec, then return
    /// the previous token
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Check whether the parser is at the end of the token Vec
    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    /// Get a copy of the previous token
    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    /// Check whether the current token matches an input token, if it matches advance to the
    /// next token, and if it doesn't return an error. Used mainly for matching parenthesis.
    fn consume(&mut self, token: Token, msg: &str) -> Result<Token, ParseError> {
        if self.check(&token) {
            return Ok(self.advance());
        }

        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions

    // region Gene Map Functions

    /// Check if a gene id exists as a key in gene_map, if it doesn't insert a new gene with
    /// that id
    fn insert_if_needed(&mut self, gene_id: &str) {
        if self.gene_map.get(gene_id).is_none() {
            let _ = self
                .gene_map
                .insert(gene_id.to_string(), Gene::new(gene_id));
        }
    }

    // endregion Gene Map Functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Token was expected to be a binary operator but was not
    #[error("Invalid binary operator encountered, expected only `and` and `or`")]
    InvalidBinaryOperator,
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the gene reaction rule is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for stray tokens after the expression")]
    EarlyTermination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gpr_parse::lexer::Lexer;
    use crate::metabolic_model::model::GprOperation;

    fn parse(source: &str) -> Result<(Gpr, IndexMap<String, Gene>), ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.lex().unwrap();
        let mut gene_map = IndexMap::new();
        let mut parser = GprParser::new(tokens, &mut gene_map);
        let gpr = parser.parse()?;
        Ok((gpr, gene_map))
    }

    #[test]
    fn single_gene_parse() {
        let (gpr, gene_map) = parse("Rv1304").unwrap();
        match gpr {
            Gpr::GeneNode(gene) => assert_eq!(gene, "Rv1304"),
            Gpr::Operation(_) => panic!("Incorrect parse result (should have been single gene)"),
        }
        assert!(gene_map.contains_key("Rv1304"));
    }

    #[test]
    fn and_parse() {
        let (gpr, _) = parse("Rv1304 and Rv0023").unwrap();
        match gpr {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*left, Gpr::GeneNode("Rv1304".to_string()));
                assert_eq!(*right, Gpr::GeneNode("Rv0023".to_string()));
            }
            _ => panic!("Should have been an AND operation"),
        }
    }

    #[test]
    fn or_parse() {
        let (gpr, _) = parse("Rv1304 or Rv0023").unwrap();
        match gpr {
            Gpr::Operation(GprOperation::Or { left, right }) => {
                assert_eq!(*left, Gpr::GeneNode("Rv1304".to_string()));
                assert_eq!(*right, Gpr::GeneNode("Rv0023".to_string()));
            }
            _ => panic!("Should have been an OR operation"),
        }
    }

    #[test]
    fn grouping_parse() {
        let (gpr, _) = parse("(Rv3141 or Rv0023) and Rv0018").unwrap();
        match gpr {
            Gpr::Operation(GprOperation::And { left, right }) => {
                match *left {
                    Gpr::Operation(GprOperation::Or { left, right }) => {
                        assert_eq!(*left, Gpr::GeneNode("Rv3141".to_string()));
                        assert_eq!(*right, Gpr::GeneNode("Rv0023".to_string()));
                    }
                    _ => panic!("Should have parsed an OR operation"),
                }
                assert_eq!(*right, Gpr::GeneNode("Rv0018".to_string()));
            }
            _ => panic!("Incorrect parse (should have been an AND operation)"),
        }
    }

    #[test]
    fn repeated_binary_parse() {
        // Chained operators associate to the left
        let (gpr, _) = parse("Rv0001 and Rv0002 and Rv0003").unwrap();
        match gpr {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*right, Gpr::GeneNode("Rv0003".to_string()));
                match *left {
                    Gpr::Operation(GprOperation::And { left, right }) => {
                        assert_eq!(*left, Gpr::GeneNode("Rv0001".to_string()));
                        assert_eq!(*right, Gpr::GeneNode("Rv0002".to_string()));
                    }
                    _ => panic!("Incorrect parse"),
                }
            }
            _ => panic!("Incorrect parse"),
        }
    }

    #[test]
    fn missing_paren_parse() {
        match parse("(Rv0001 and Rv0002") {
            Err(ParseError::MissingToken(_)) => {}
            _ => panic!("Missing parenthesis not caught"),
        }
    }

    #[test]
    fn invalid_parse() {
        match parse("Rv0001 Rv0023") {
            Err(ParseError::EarlyTermination) => {}
            _ => panic!("Incorrect error returned"),
        }
    }

    #[test]
    fn empty_parse() {
        match parse("") {
            Err(ParseError::ExpectedExpression) => {}
            _ => panic!("Empty rule not caught"),
        }
    }
}
