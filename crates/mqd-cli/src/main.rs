use mqd_core::config::{self, LoggingConfig};
use mqd_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    let cfg = match config::load_or_init() {
        Ok(cfg) => cfg,
        Err(err) => {
            logging::init_logging_stderr(&LoggingConfig::default());
            eprintln!("mqd error: {:#}", err);
            std::process::exit(1);
        }
    };

    // Keep working with stderr logging if the log file is unavailable.
    if let Err(e) = logging::init_logging(&cfg.logging) {
        logging::init_logging_stderr(&cfg.logging);
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }
    tracing::debug!("loaded config: {:?}", cfg);

    if let Err(err) = CliCommand::run_from_args(&cfg).await {
        eprintln!("mqd error: {:#}", err);
        std::process::exit(1);
    }
}
