use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::Chars;
use lazy_static::lazy_static;
use thiserror::Error;
use crate::util;

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenType> = HashMap::from([
        ("and", TokenType::And),
        ("class", TokenType::Class),
        ("else", TokenType::Else),
        ("false", TokenType::False),
        ("for", TokenType::For),
        ("fun", TokenType::Fun),
        ("if", TokenType::If),
        ("nil", TokenType::Nil),
        ("or", TokenType::Or),
        ("print", TokenType::Print),
        ("return", TokenType::Return),
        ("super", TokenType::Super),
        ("this", TokenType::This),
        ("true", TokenType::True),
        ("var", TokenType::Var),
        ("while", TokenType::While),
    ]);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenType {
    ParenthesisLeft, ParenthesisRight,
    BracketLeft, BracketRight,
    Comma, Dot, Semicolon,

    Minus, Plus,
    Divide, Multiply,

    Not, NotEqual,
    Assign, Equal,
    Greater, GreaterEqual,
    Less, LessEqual,

    Identifier,
    String, Number,

    // Keywords
    And, Or,
    Class, Super, This,
    If, Else,
    For, While,
    Fun, Return,
    True, False, Nil,
    Print,
    Var,

    // EOF
    Eof,
}

/// The value carried by a literal token or a literal expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Nil => f.write_str("nil"),
            Literal::Boolean(value) => write!(f, "{}", value),
            Literal::Number(value) => write!(f, "{}", value),
            Literal::String(value) => f.write_str(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    token_type: TokenType,
    lexeme: String,
    literal: Option<Literal>,
    line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, literal: Option<Literal>, line: usize) -> Token {
        Token {
            token_type, lexeme: lexeme.into(),
            literal, line,
        }
    }

    pub fn token_type(&self) -> TokenType { self.token_type }
    pub fn lexeme(&self) -> &str { &self.lexeme }
    pub fn literal(&self) -> Option<&Literal> { self.literal.as_ref() }
    pub fn line(&self) -> usize { self.line }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.token_type {
            TokenType::Eof => f.write_str("end"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("Unexpected character '{character}'")]
    UnexpectedCharacter {
        line: usize,
        character: char,
    },
    #[error("Unterminated string")]
    UnterminatedString {
        line: usize,
    },
    #[error("Unterminated block comment")]
    UnterminatedComment {
        line: usize,
    },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::UnexpectedCharacter { line, .. } => *line,
            LexerError::UnterminatedString { line } => *line,
            LexerError::UnterminatedComment { line } => *line,
        }
    }
}

type LexerResult<T> = Result<T, LexerError>;

/// Scans the whole source text. The returned stream always ends with exactly one EOF token.
pub fn scan(source: &str) -> LexerResult<Vec<Token>> {
    Lexer::new(source).scan_tokens()
}

pub struct Lexer<'source> {
    input: &'source str,

    chars: Chars<'source>,
    peek_1: Option<char>,
    peek_2: Option<char>,

    start_index: usize,
    current_index: usize,

    line: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Lexer<'source> {
        Lexer {
            input: source,

            chars: source.chars(),
            peek_1: None,
            peek_2: None,

            start_index: 0,
            current_index: 0,

            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> LexerResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan_token()?;
            let eof = token.token_type() == TokenType::Eof;
            tokens.push(token);

            if eof {
                break;
            }
        }

        tracing::trace!(count = tokens.len(), "scanned tokens");
        Ok(tokens)
    }

    pub fn scan_token(&mut self) -> LexerResult<Token> {
        loop {
            self.skip_whitespace();
            self.start_index = self.current_index;

            let c = match self.consume() {
                Some(c) => c,
                None => return Ok(Token::new(TokenType::Eof, "", None, self.line)),
            };

            return match c {
                '(' => Ok(self.make_token(TokenType::ParenthesisLeft)),
                ')' => Ok(self.make_token(TokenType::ParenthesisRight)),
                '{' => Ok(self.make_token(TokenType::BracketLeft)),
                '}' => Ok(self.make_token(TokenType::BracketRight)),
                ',' => Ok(self.make_token(TokenType::Comma)),
                '.' => Ok(self.make_token(TokenType::Dot)),
                ';' => Ok(self.make_token(TokenType::Semicolon)),
                '-' => Ok(self.make_token(TokenType::Minus)),
                '+' => Ok(self.make_token(TokenType::Plus)),
                '*' => Ok(self.make_token(TokenType::Multiply)),

                '=' => Ok(if self.expect('=') { self.make_token(TokenType::Equal) } else {
                    self.make_token(TokenType::Assign)
                }),
                '!' => Ok(if self.expect('=') { self.make_token(TokenType::NotEqual) } else {
                    self.make_token(TokenType::Not)
                }),
                '>' => Ok(if self.expect('=') { self.make_token(TokenType::GreaterEqual) } else {
                    self.make_token(TokenType::Greater)
                }),
                '<' => Ok(if self.expect('=') { self.make_token(TokenType::LessEqual) } else {
                    self.make_token(TokenType::Less)
                }),

                '/' => if self.expect('/') {
                    self.skip_line();
                    continue;
                } else if self.expect('*') {
                    self.skip_block_comment()?;
                    continue;
                } else {
                    Ok(self.make_token(TokenType::Divide))
                },

                '"' => self.scan_string(),
                c if util::is_numeric(c) => Ok(self.scan_number()),
                c if util::is_alphabetic(c) => Ok(self.scan_identifier()),

                _ => Err(LexerError::UnexpectedCharacter { line: self.line, character: c }),
            };
        }
    }

    fn scan_string(&mut self) -> LexerResult<Token> {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }

            self.consume();
        }

        if self.consume().is_none() {
            return Err(LexerError::UnterminatedString { line: self.line });
        }

        // The literal value excludes the surrounding quotes, the lexeme keeps them
        let value = self.input[(self.start_index + 1)..(self.current_index - 1)].to_owned();
        Ok(self.make_literal_token(TokenType::String, Literal::String(value)))
    }

    fn scan_number(&mut self) -> Token {
        while self.peek().map_or(false, util::is_numeric) {
            self.consume();
        }

        if self.peek() == Some('.') && self.peek_next().map_or(false, util::is_numeric) {
            self.consume();

            while self.peek().map_or(false, util::is_numeric) {
                self.consume();
            }
        }

        let text = &self.input[self.start_index..self.current_index];
        // A run of ASCII digits with an optional fractional run always parses
        let value = text.parse::<f64>().unwrap_or_default();

        self.make_literal_token(TokenType::Number, Literal::Number(value))
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().map_or(false, util::is_alphanumeric) {
            self.consume();
        }

        let name = &self.input[self.start_index..self.current_index];
        let token_type = KEYWORDS.get(name).copied().unwrap_or(TokenType::Identifier);

        self.make_token(token_type)
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        Token::new(token_type, &self.input[self.start_index..self.current_index], None, self.line)
    }

    fn make_literal_token(&self, token_type: TokenType, literal: Literal) -> Token {
        Token::new(token_type, &self.input[self.start_index..self.current_index], Some(literal), self.line)
    }

    fn consume(&mut self) -> Option<char> {
        let c = if let Some(c) = self.peek_1.take() {
            self.peek_1 = self.peek_2.take();
            Some(c)
        } else {
            self.chars.next()
        }?;

        self.current_index += c.len_utf8();

        if c == '\n' {
            self.line += 1;
        }

        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        if self.peek_1.is_none() {
            self.peek_1 = self.chars.next();
        }

        self.peek_1
    }

    fn peek_next(&mut self) -> Option<char> {
        self.peek()?;

        if self.peek_2.is_none() {
            self.peek_2 = self.chars.next();
        }

        self.peek_2
    }

    fn expect(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\r' | '\t' | '\n') = self.peek() {
            self.consume();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }

            self.consume();
        }
    }

    // No nesting: the first `*/` closes the comment
    fn skip_block_comment(&mut self) -> LexerResult<()> {
        while let Some(c) = self.consume() {
            if c == '*' && self.expect('/') {
                return Ok(());
            }
        }

        Err(LexerError::UnterminatedComment { line: self.line })
    }
}
