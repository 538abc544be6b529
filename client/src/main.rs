//! User directory entry-point: loads settings, installs tracing, and runs one
//! command on a current-thread runtime.

use std::ffi::OsString;
use std::fmt::Display;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use ortho_config::OrthoConfig;
use tracing::error;

use user_directory::cli::{Cli, CommandStatus, run};
use user_directory::config::ClientSettings;
use user_directory::telemetry::init_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match ClientSettings::load_from_iter([OsString::from("user-directory")]) {
        Ok(settings) => settings
            .with_api_url(cli.api_url.clone())
            .with_offline(cli.offline),
        Err(e) => {
            init_tracing(false);
            return fail("failed to load configuration", &e);
        }
    };
    init_tracing(settings.json_logs);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return fail("failed to start runtime", &e),
    };

    let mut stdout = std::io::stdout().lock();
    match runtime.block_on(run(cli.command, &settings, &mut stdout)) {
        Ok(CommandStatus::Success) => ExitCode::SUCCESS,
        Ok(CommandStatus::Failure) => ExitCode::FAILURE,
        Err(e) => fail("command failed", &e),
    }
}

fn fail(context: &str, e: &dyn Display) -> ExitCode {
    error!(error = %e, "{context}");
    if writeln!(std::io::stderr(), "user-directory: {context}: {e}").is_err() {
        return ExitCode::from(2);
    }
    ExitCode::FAILURE
}
