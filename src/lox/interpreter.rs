use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use crate::lox::ast::{Expr, Stmt};
use crate::lox::callable::{natives, Callable, UserFunction};
use crate::lox::environment::Environment;
use crate::lox::lexer::{Token, TokenType};
use crate::lox::sink::{Output, Stdout};
use crate::lox::value::Value;
use crate::util;

/// Nested calls deeper than this fail with a "Stack overflow" runtime error.
pub const MAX_CALL_DEPTH: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> RuntimeError {
        RuntimeError { token, message: message.into() }
    }

    pub fn line(&self) -> usize {
        self.token.line()
    }

    pub fn location(&self) -> String {
        format!(" at {}", self.token)
    }
}

type RuntimeResult<T> = Result<T, RuntimeError>;

/// How a statement finished. `Return` unwinds up to the nearest function call.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<O: Output = Stdout> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,

    output: O,
    call_depth: usize,
}

impl Interpreter<Stdout> {
    pub fn new() -> Interpreter<Stdout> {
        Interpreter::with_output(Stdout)
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<O: Output> Interpreter<O> {
    pub fn with_output(output: O) -> Interpreter<O> {
        let globals = Environment::new_global();

        for native in natives() {
            let name = native.name;
            globals.borrow_mut().define(name, Value::Callable(Rc::new(Callable::Native(native))));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            output,
            call_depth: 0,
        }
    }

    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Executes a program in order. The first runtime error stops execution and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {},
                // Only reachable when a top-level `return` slipped past the parser
                Ok(Flow::Return(_)) => break,
                Err(error) => {
                    tracing::debug!(line = error.line(), message = %error.message, "runtime error");
                    return Err(error);
                },
            }
        }

        Ok(())
    }

    // Statements

    fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        util::ensure_sufficient_stack(|| self.execute_statement(stmt))
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            },
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.output.write_line(&value.to_string());
            },
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name.lexeme(), value);
            },
            Stmt::Block(statements) => {
                let environment = Environment::new_with_parent(Rc::clone(&self.environment));
                return self.execute_block(statements, environment);
            },
            Stmt::If { condition, then, otherwise } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then);
                } else if let Some(otherwise) = otherwise {
                    return self.execute(otherwise);
                }
            },
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            },
            Stmt::Function(declaration) => {
                tracing::trace!(name = declaration.name.lexeme(), "declaring function");

                let function = Callable::User(UserFunction {
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                });

                self.environment.borrow_mut().define(declaration.name.lexeme(), Value::Callable(Rc::new(function)));
            },
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };

                return Ok(Flow::Return(value));
            },
        }

        Ok(Flow::Normal)
    }

    /// Runs `statements` inside `environment`, restoring the current scope
    /// afterwards whether they finish, return or fail.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> RuntimeResult<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    // Expressions

    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        util::ensure_sufficient_stack(|| self.evaluate_expression(expr))
    }

    fn evaluate_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { operator, expr } => {
                let operand = self.evaluate(expr)?;

                match (operator.token_type(), operand) {
                    (TokenType::Not, operand) => Ok(Value::Boolean(!operand.is_truthy())),
                    (TokenType::Minus, Value::Number(value)) => Ok(Value::Number(-value)),
                    (TokenType::Minus, _) => Err(RuntimeError::new(operator.clone(), "Operand must be a number")),
                    _ => Err(Self::unknown_operator(operator)),
                }
            },
            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                Self::evaluate_binary(operator, left, right)
            },
            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;

                let decided = match operator.token_type() {
                    TokenType::Or => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            },
            Expr::Variable(name) => self.environment.borrow().get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.borrow_mut().assign(name, value.clone())?;

                Ok(value)
            },
            Expr::Call { callee, paren, args } => self.evaluate_call(callee, paren, args),
        }
    }

    fn evaluate_binary(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
        match operator.token_type() {
            TokenType::Equal => return Ok(Value::Boolean(left == right)),
            TokenType::NotEqual => return Ok(Value::Boolean(left != right)),
            TokenType::Plus => return match (&left, &right) {
                (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
                (Value::String(_), _) | (_, Value::String(_)) =>
                    Ok(Value::String(format!("{}{}", left, right).into())),
                _ => Err(RuntimeError::new(operator.clone(), "Operands must be two numbers or two strings")),
            },
            _ => {},
        }

        let (left, right) = match (left, right) {
            (Value::Number(left), Value::Number(right)) => (left, right),
            _ => return Err(RuntimeError::new(operator.clone(), "Operands must be numbers")),
        };

        match operator.token_type() {
            TokenType::Minus => Ok(Value::Number(left - right)),
            TokenType::Multiply => Ok(Value::Number(left * right)),
            TokenType::Divide => Ok(Value::Number(left / right)),
            TokenType::Greater => Ok(Value::Boolean(left > right)),
            TokenType::GreaterEqual => Ok(Value::Boolean(left >= right)),
            TokenType::Less => Ok(Value::Boolean(left < right)),
            TokenType::LessEqual => Ok(Value::Boolean(left <= right)),
            _ => Err(Self::unknown_operator(operator)),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> RuntimeResult<Value> {
        let callable = match self.evaluate(callee)? {
            Value::Callable(callable) => callable,
            _ => return Err(RuntimeError::new(paren.clone(), "Can only call functions and classes")),
        };

        let mut values = Vec::with_capacity(args.len());

        for arg in args {
            values.push(self.evaluate(arg)?);
        }

        if values.len() != callable.arity() {
            return Err(RuntimeError::new(paren.clone(),
                format!("Expected {} arguments but got {}", callable.arity(), values.len())));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(paren.clone(), "Stack overflow"));
        }

        tracing::trace!(name = callable.name(), depth = self.call_depth, "calling function");

        self.call_depth += 1;
        let result = callable.call(self, paren, values);
        self.call_depth -= 1;

        result
    }

    fn unknown_operator(operator: &Token) -> RuntimeError {
        RuntimeError::new(operator.clone(), format!("Unknown operator '{}'", operator.lexeme()))
    }
}

#[cfg(test)]
mod tests;
