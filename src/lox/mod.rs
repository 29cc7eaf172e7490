pub mod lexer;
pub mod ast;
pub mod parser;
pub mod printer;
pub mod environment;
pub mod value;
pub mod callable;
pub mod interpreter;
pub mod error;
pub mod sink;
