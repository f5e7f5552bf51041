use clap::Parser;
use tracing::{error, info};

use relayd_core::init_logging;
use relayd_server::cli::Cli;
use relayd_server::gateway;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref(), cli.log_format.into()) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let socket = cli.socket_path();
    let config = cli.gateway_config();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        module = %config.module.address,
        port = config.module.port,
        "relayd starting"
    );

    if let Err(e) = gateway::run(config, &socket).await {
        error!(error = %e, "relayd exiting");
        std::process::exit(1);
    }
}
