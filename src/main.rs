use std::process::ExitCode;

use credit_scoring::app;

fn main() -> ExitCode {
    let Err(err) = app::run() else {
        return ExitCode::SUCCESS;
    };
    eprintln!("credit: {err}");
    ExitCode::from(err.exit_code())
}
