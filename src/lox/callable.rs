use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use crate::lox::ast::FunctionDecl;
use crate::lox::environment::Environment;
use crate::lox::interpreter::{Flow, Interpreter, RuntimeError};
use crate::lox::lexer::Token;
use crate::lox::sink::Output;
use crate::lox::value::Value;

pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: NativeFn,
}

/// A function declared in source, paired with the scope it was declared in.
pub struct UserFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
}

pub enum Callable {
    Native(NativeFunction),
    User(UserFunction),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::User(function) => function.declaration.params.len(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(native) => native.name,
            Callable::User(function) => function.declaration.name.lexeme(),
        }
    }

    /// Invokes the callable. The argument count must already match [`Callable::arity`].
    pub fn call<O: Output>(&self, interpreter: &mut Interpreter<O>, paren: &Token, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match self {
            Callable::Native(native) => (native.function)(&args)
                .map_err(|message| RuntimeError::new(paren.clone(), message)),
            Callable::User(function) => {
                let environment = Environment::new_with_parent(Rc::clone(&function.closure));

                {
                    let mut scope = environment.borrow_mut();

                    for (param, arg) in function.declaration.params.iter().zip(args) {
                        scope.define(param.lexeme(), arg);
                    }
                }

                // The body runs directly in the parameter scope
                match interpreter.execute_block(&function.declaration.body, environment)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Nil),
                }
            },
        }
    }
}

impl Display for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Native(_) => f.write_str("<native fn>"),
            Callable::User(function) => write!(f, "<fn {}>", function.declaration.name.lexeme()),
        }
    }
}

fn clock(_args: &[Value]) -> Result<Value, String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| format!("Clock error: {}", err))?;

    Ok(Value::Number(now.as_secs_f64()))
}

/// The builtins every interpreter starts with.
pub fn natives() -> Vec<NativeFunction> {
    vec![
        NativeFunction { name: "clock", arity: 0, function: clock },
    ]
}
