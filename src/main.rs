//! passwd-srv - Entry Point
//!
//! Privileged helper that changes passwords and adds or removes accounts on
//! behalf of local callers.

use log::{error, info};
use std::process::ExitCode;

use passwd_srv::Server;
use passwd_srv::config::ServiceConfig;
use passwd_srv::utils::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    setup_logging();

    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Launching password server...");

    let server = match Server::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", config.socket_path, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run_until_shutdown().await {
        error!("Server stopped: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
