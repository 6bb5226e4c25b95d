use clap::{CommandFactory, Parser};
use drive_sorter_lib::cli::Cli;
use drive_sorter_lib::config::Settings;
use drive_sorter_lib::error::StartupError;
use drive_sorter_lib::logging::init_logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(options) = cli.scan_options() else {
        // Nothing to do is not an error
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Startup failed: {}", StartupError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&settings.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(drive_sorter_lib::run(&settings, options, cli.folder.clone())) {
        Ok(stats) => {
            tracing::info!("{}", stats.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
