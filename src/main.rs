use std::process::ExitCode;

use colored::Colorize;
use resolver_typeck::cli;

fn main() -> ExitCode {
    let command_line_interface = cli::CommandLineInterface::load();
    env_logger::Builder::from_default_env()
        .filter_level(command_line_interface.log_filter())
        .init();

    match command_line_interface.run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}
