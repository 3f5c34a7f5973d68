//! Command-line entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let config = match layerpaint_app::AppConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("layerpaint: {}\n{}", e, layerpaint_app::USAGE);
            return ExitCode::from(2);
        }
    };

    match layerpaint_app::export_file(&config) {
        Ok(summary) => {
            log::info!(
                "Wrote {} ({}x{}, {} bytes)",
                config.output.display(),
                summary.width,
                summary.height,
                summary.bytes
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Export failed: {}", e);
            eprintln!("layerpaint: {}", e);
            ExitCode::FAILURE
        }
    }
}
