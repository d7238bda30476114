//! `covenant`: analyze a PDF or DOCX contract and print a JSON risk report.

mod cli;

use std::io;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let stdout = io::stdout();
    if let Err(e) = cli::run(&cli, &mut stdout.lock()) {
        tracing::error!(path = %cli.file_path.display(), error = ?e, "Analysis failed");
        println!("{}", cli::error_line(&e));
    }
}

/// Logs go to stderr so stdout carries only the report or status line.
fn init_logging(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }
}
