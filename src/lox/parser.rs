use std::rc::Rc;
use lazy_static::lazy_static;
use thiserror::Error;
use crate::lox::ast::{Expr, FunctionDecl, Stmt};
use crate::lox::lexer::{Literal, Token, TokenType};
use crate::util;

/// Call arguments and function parameters are capped at this many entries.
pub const MAX_ARGUMENTS: usize = 255;

lazy_static! {
    // Tokens that begin a declaration or statement; synchronization stops in front of them
    static ref STATEMENT_START_TYPES: [TokenType; 8] = [
        TokenType::Class, TokenType::Fun, TokenType::Var,
        TokenType::For, TokenType::If, TokenType::While,
        TokenType::Print, TokenType::Return,
    ];
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl ParseError {
    pub fn new(token: Token, message: impl Into<String>) -> ParseError {
        ParseError { token, message: message.into() }
    }

    pub fn line(&self) -> usize {
        self.token.line()
    }

    pub fn location(&self) -> String {
        format!(" at {}", self.token)
    }
}

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,

    function_depth: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        if tokens.last().map(Token::token_type) != Some(TokenType::Eof) {
            let line = tokens.last().map_or(1, Token::line);
            tokens.push(Token::new(TokenType::Eof, "", None, line));
        }

        Parser {
            tokens,
            current: 0,
            function_depth: 0,
            errors: Vec::new(),
        }
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // Declaration parsing

    /// Parses the whole token stream. Statements that failed to parse are
    /// left out of the result and recorded in [`Parser::errors`].
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_eof() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        tracing::debug!(statements = statements.len(), errors = self.errors.len(), "parsed program");
        statements
    }

    fn parse_declaration(&mut self) -> Option<Stmt> {
        let result = util::ensure_sufficient_stack(|| {
            if self.matches(TokenType::Var) {
                self.parse_var_declaration()
            } else if self.matches(TokenType::Fun) {
                self.parse_function("function").map(|function| Stmt::Function(Rc::new(function)))
            } else {
                self.parse_statement()
            }
        });

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.record(error);
                self.synchronize();
                None
            },
        }
    }

    fn parse_var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenType::Identifier, "Expected variable name")?;

        let initializer = if self.matches(TokenType::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenType::Semicolon, "Expected ';' after variable declaration")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn parse_function(&mut self, kind: &str) -> ParseResult<FunctionDecl> {
        let name = self.expect(TokenType::Identifier, &format!("Expected {} name", kind))?;
        self.expect(TokenType::ParenthesisLeft, &format!("Expected '(' after {} name", kind))?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::ParenthesisRight) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.record(ParseError::new(token, format!("Can't have more than {} parameters", MAX_ARGUMENTS)));
                }

                let param = self.expect(TokenType::Identifier, "Expected parameter name")?;

                if params.iter().any(|existing| existing.lexeme() == param.lexeme()) {
                    self.record(ParseError::new(param.clone(), "Duplicate parameter name"));
                }

                params.push(param);

                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenType::ParenthesisRight, "Expected ')' after parameters")?;
        self.expect(TokenType::BracketLeft, &format!("Expected '{{' before {} body", kind))?;

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;

        Ok(FunctionDecl { name, params, body: body? })
    }

    // Statement parsing

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(TokenType::For) {
            self.parse_for_statement()
        } else if self.matches(TokenType::If) {
            self.parse_if_statement()
        } else if self.matches(TokenType::Print) {
            self.parse_print_statement()
        } else if self.matches(TokenType::Return) {
            self.parse_return_statement()
        } else if self.matches(TokenType::While) {
            self.parse_while_statement()
        } else if self.matches(TokenType::BracketLeft) {
            Ok(Stmt::Block(self.parse_block()?))
        } else {
            self.parse_expression_statement()
        }
    }

    // `for (init; cond; incr) body` becomes `{ init; while (cond) { body; incr; } }`
    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'for'")?;

        let initializer = if self.matches(TokenType::Semicolon) {
            None
        } else if self.matches(TokenType::Var) {
            Some(self.parse_var_declaration()?)
        } else {
            Some(self.parse_expression_statement()?)
        };

        let condition = if !self.check(TokenType::Semicolon) {
            self.parse_expression()?
        } else {
            Expr::Literal(Literal::Boolean(true))
        };
        self.expect(TokenType::Semicolon, "Expected ';' after loop condition")?;

        let increment = if !self.check(TokenType::ParenthesisRight) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenType::ParenthesisRight, "Expected ')' after for clauses")?;

        let mut body = self.parse_statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let mut statements = Vec::with_capacity(2);
        statements.extend(initializer);
        statements.push(Stmt::While { condition, body: Box::new(body) });

        Ok(Stmt::Block(statements))
    }

    fn parse_if_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::ParenthesisRight, "Expected ')' after if condition")?;

        let then = Box::new(self.parse_statement()?);
        let otherwise = if self.matches(TokenType::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If { condition, then, otherwise })
    }

    fn parse_print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.parse_expression()?;
        self.expect(TokenType::Semicolon, "Expected ';' after value")?;

        Ok(Stmt::Print(value))
    }

    fn parse_return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        if self.function_depth == 0 {
            self.record(ParseError::new(keyword.clone(), "Can't return from top-level code"));
        }

        let value = if !self.check(TokenType::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenType::Semicolon, "Expected ';' after return value")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::ParenthesisRight, "Expected ')' after condition")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenType::BracketRight) && !self.is_eof() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        self.expect(TokenType::BracketRight, "Expected '}' after block")?;
        Ok(statements)
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression()?;
        self.expect(TokenType::Semicolon, "Expected ';' after expression")?;

        Ok(Stmt::Expression(expr))
    }

    // Expression parsing

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        util::ensure_sufficient_stack(|| self.parse_assignment())
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_or()?;

        if self.matches(TokenType::Assign) {
            let equals = self.previous().clone();
            let value = self.parse_assignment()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign { name, value: Box::new(value) }),
                other => {
                    // Reported, but the parser is not confused, so no synchronization
                    self.record(ParseError::new(equals, "Invalid assignment target"));
                    Ok(other)
                },
            };
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;

        while self.matches(TokenType::Or) {
            let operator = self.previous().clone();
            let right = self.parse_and()?;

            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_equality()?;

        while self.matches(TokenType::And) {
            let operator = self.previous().clone();
            let right = self.parse_equality()?;

            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_comparison()?;

        while self.matches_any(&[TokenType::NotEqual, TokenType::Equal]) {
            let operator = self.previous().clone();
            let right = self.parse_comparison()?;

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_term()?;

        while self.matches_any(&[TokenType::Greater, TokenType::GreaterEqual, TokenType::Less, TokenType::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.parse_term()?;

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_factor()?;

        while self.matches_any(&[TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous().clone();
            let right = self.parse_factor()?;

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;

        while self.matches_any(&[TokenType::Divide, TokenType::Multiply]) {
            let operator = self.previous().clone();
            let right = self.parse_unary()?;

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.matches_any(&[TokenType::Not, TokenType::Minus]) {
            let operator = self.previous().clone();
            let right = util::ensure_sufficient_stack(|| self.parse_unary())?;

            return Ok(Expr::Unary { operator, expr: Box::new(right) });
        }

        self.parse_call()
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        while self.matches(TokenType::ParenthesisLeft) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = Vec::new();

        if !self.check(TokenType::ParenthesisRight) {
            args.push(self.parse_expression()?);

            while self.matches(TokenType::Comma) {
                if args.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.record(ParseError::new(token, format!("Can't have more than {} arguments", MAX_ARGUMENTS)));
                }

                args.push(self.parse_expression()?);
            }
        }

        let paren = self.expect(TokenType::ParenthesisRight, "Expected ')' after arguments")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, args })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenType::False) {
            return Ok(Expr::Literal(Literal::Boolean(false)));
        } else if self.matches(TokenType::True) {
            return Ok(Expr::Literal(Literal::Boolean(true)));
        } else if self.matches(TokenType::Nil) {
            return Ok(Expr::Literal(Literal::Nil));
        } else if self.matches_any(&[TokenType::Number, TokenType::String]) {
            let literal = self.previous().literal().cloned().unwrap_or(Literal::Nil);
            return Ok(Expr::Literal(literal));
        } else if self.matches(TokenType::Identifier) {
            return Ok(Expr::Variable(self.previous().clone()));
        } else if self.matches(TokenType::ParenthesisLeft) {
            let expr = self.parse_expression()?;
            self.expect(TokenType::ParenthesisRight, "Expected ')' after expression")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error_at_current("Expected expression"))
    }

    // Token handling

    fn consume(&mut self) -> &Token {
        if !self.is_eof() {
            self.current += 1;
        }

        self.previous()
    }

    fn expect(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(token_type) {
            return Ok(self.consume().clone());
        }

        Err(self.error_at_current(message))
    }

    fn matches(&mut self, token_type: TokenType) -> bool { // Should be called "match", but that's a keyword
        if !self.check(token_type) {
            return false;
        }

        self.consume();
        true
    }

    fn matches_any(&mut self, token_types: &[TokenType]) -> bool {
        for token_type in token_types {
            if self.check(*token_type) {
                self.consume();
                return true;
            }
        }

        false
    }

    #[inline]
    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type() == token_type
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_eof(&self) -> bool {
        self.peek().token_type() == TokenType::Eof
    }

    // Error handling

    fn synchronize(&mut self) {
        self.consume();

        while !self.is_eof() {
            if self.previous().token_type() == TokenType::Semicolon {
                return;
            }

            if STATEMENT_START_TYPES.contains(&self.peek().token_type()) {
                return;
            }

            self.consume();
        }
    }

    fn error_at_current(&self, message: &str) -> ParseError {
        ParseError::new(self.peek().clone(), message)
    }

    fn record(&mut self, error: ParseError) {
        tracing::debug!(line = error.line(), message = %error.message, "parse error");
        self.errors.push(error);
    }
}

/// Parses a token stream, failing with every recorded error if any statement was malformed.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, Vec<ParseError>> {
    let mut parser = Parser::new(tokens);
    let statements = parser.parse();

    if parser.had_error() {
        Err(parser.into_errors())
    } else {
        Ok(statements)
    }
}

#[cfg(test)]
mod tests;
