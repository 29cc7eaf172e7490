use std::process::ExitCode;

fn main() -> ExitCode {
    treelox::run()
}
