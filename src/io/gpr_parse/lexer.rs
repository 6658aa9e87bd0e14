//! Lex a gene reaction rule string into a series of tokens for later parsing
use std::borrow::Borrow;

use thiserror::Error;

use crate::io::gpr_parse::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the rule string into tokens
    pub fn lex(&mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens.clone())
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single character tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            // Identifiers and operators
            c if Lexer::is_identifier_char(c) => self.read_identifier(),
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            other => return Err(LexerError::InvalidCharacter(other)),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_identifier(&mut self) {
        while Lexer::is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match text.borrow() {
            "and" | "And" | "AND" => self.add_token(Token::And),
            "or" | "Or" | "OR" => self.add_token(Token::Or),
            gene => self.add_token(Token::Identifier(gene.to_string())),
        }
    }

    fn is_identifier_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

/// Errors encountered while lexing a rule string
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexerError {
    /// A character which cannot appear in a gene reaction rule
    #[error("Invalid character {0:?} in gene reaction rule")]
    InvalidCharacter(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_gene() {
        let mut lexer = Lexer::new("Rv0023");
        let tokens = lexer.lex().unwrap();
        assert_eq!(
            tokens,
            vec![Token::Identifier(String::from("Rv0023")), Token::Eof]
        );
    }

    #[test]
    fn grouping() {
        let mut lexer = Lexer::new("(Rv0023 or Rv0123)");
        let tokens = lexer.lex().unwrap();
        let expected = vec![
            Token::LeftParen,
            Token::Identifier(String::from("Rv0023")),
            Token::Or,
            Token::Identifier(String::from("Rv0123")),
            Token::RightParen,
            Token::Eof,
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn operator_casing() {
        let mut lexer = Lexer::new("a AND b Or c");
        let tokens = lexer.lex().unwrap();
        assert_eq!(tokens[1], Token::And);
        assert_eq!(tokens[3], Token::Or);
    }

    #[test]
    fn invalid_character() {
        let mut lexer = Lexer::new("a & b");
        assert_eq!(lexer.lex(), Err(LexerError::InvalidCharacter('&')));
    }
}
