use crate::lox::ast::Expr;

/// Renders expressions as fully parenthesized prefix forms, e.g. `(* (- 123) (group 45.67))`.
#[derive(Default)]
pub struct AstPrinter {
    output: String,
}

impl AstPrinter {
    pub fn new() -> AstPrinter {
        AstPrinter { output: String::new() }
    }

    pub fn print(mut self, expr: &Expr) -> String {
        self.write_expr(expr);
        self.output
    }

    fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(value) => self.output.push_str(&value.to_string()),
            Expr::Grouping(inner) => self.parenthesize("group", [inner.as_ref()]),
            Expr::Unary { operator, expr } => self.parenthesize(operator.lexeme(), [expr.as_ref()]),
            Expr::Binary { left, operator, right }
            | Expr::Logical { left, operator, right } =>
                self.parenthesize(operator.lexeme(), [left.as_ref(), right.as_ref()]),
            Expr::Variable(name) => self.output.push_str(name.lexeme()),
            Expr::Assign { name, value } => {
                self.output.push_str("(= ");
                self.output.push_str(name.lexeme());
                self.output.push(' ');
                self.write_expr(value);
                self.output.push(')');
            },
            Expr::Call { callee, args, .. } =>
                self.parenthesize("call", std::iter::once(callee.as_ref()).chain(args.iter())),
        }
    }

    fn parenthesize<'a>(&mut self, name: &str, exprs: impl IntoIterator<Item = &'a Expr>) {
        self.output.push('(');
        self.output.push_str(name);

        for expr in exprs {
            self.output.push(' ');
            self.write_expr(expr);
        }

        self.output.push(')');
    }
}
