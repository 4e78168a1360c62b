use clap::Parser;
use lazy_loader::cli::{Cli, LOG_ENV};
use loader_console::ConsoleLogger;
use log::debug;
use std::error::Error;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.effective_log_level(std::env::var(LOG_ENV).ok().as_deref());
    if let Err(err) = ConsoleLogger::new(level).init() {
        eprintln!("Warning: logging unavailable: {err}");
    }

    match lazy_loader::run(&cli.executable).and_then(|report| {
        let mut out = io::stdout().lock();
        writeln!(out, "{report}")
            .and_then(|()| out.flush())
            .map_err(lazy_loader::LoaderError::Report)
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            debug!("{err:?}");
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}
