use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use triage_console::cli::{self, Cli, CliError};
use triage_console::config::ConsoleConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConsoleConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(err) => return fail(CliError::from(err)),
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    // The guard flushes buffered log lines when the process exits.
    let _guard = init_tracing(&level, log_file.as_deref());

    tracing::debug!(
        app = triage_console::APP_NAME,
        version = triage_console::version(),
        "console bootstrap"
    );

    match cli::run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn fail(err: CliError) -> ExitCode {
    eprintln!("{err}");
    ExitCode::from(err.exit_code())
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("triage_console=debug"));

    match log_file {
        Some(path) => {
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let file_name = path.file_name().unwrap_or_else(|| OsStr::new("triage.log"));
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
