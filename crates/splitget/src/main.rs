use std::process::ExitCode;

use clap::Parser;
use cli::App;

mod cli;
mod logging;
mod runtime;
mod ui;

fn main() -> ExitCode {
    let app = App::parse();
    logging::init(app.verbose);

    match cli::download::run(app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
