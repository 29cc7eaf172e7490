use crate::lox::error::LoxError;

/// Receives one line per executed `print` statement.
pub trait Output {
    fn write_line(&mut self, text: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Output for Stdout {
    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }
}

impl Output for Vec<String> {
    fn write_line(&mut self, text: &str) {
        self.push(text.to_owned());
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub location: String,
    pub message: String,
}

/// Presents errors to the user. The interpreter core only hands over the
/// structured parts; formatting is up to the implementation.
pub trait Reporter {
    fn report(&mut self, line: usize, location: &str, message: &str);

    fn report_error(&mut self, error: &LoxError) {
        match error {
            LoxError::Lexer(err) => self.report(err.line(), "", &err.to_string()),
            LoxError::Parse(errors) => {
                for err in errors {
                    self.report(err.line(), &err.location(), &err.message);
                }
            },
            LoxError::Runtime(err) => self.report(err.line(), &err.location(), &err.message),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
    }
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.push(Diagnostic {
            line,
            location: location.to_owned(),
            message: message.to_owned(),
        });
    }
}
