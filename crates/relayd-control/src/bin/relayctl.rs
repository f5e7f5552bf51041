//! Command-line client for the relayd control socket.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use relayd_control::types::{IO_TYPE_OUTPUT, Zone};
use relayd_control::ControlClient;

/// Send commands to a running relayd gateway.
#[derive(Debug, Parser)]
#[command(name = "relayctl", version, about = "relayd control client")]
struct Cli {
    /// Control socket path (defaults to the standard location)
    #[arg(short = 's', long = "socket", value_name = "PATH")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Switch relays on
    On {
        /// Relay indices
        #[arg(required = true, value_name = "RELAY")]
        relays: Vec<u32>,
    },
    /// Switch relays off
    Off {
        /// Relay indices
        #[arg(required = true, value_name = "RELAY")]
        relays: Vec<u32>,
    },
    /// Query the pin count for an I/O type
    Count {
        /// I/O type ("bi" for inputs, "bo" for outputs)
        #[arg(default_value = IO_TYPE_OUTPUT, value_name = "TYPE")]
        io_type: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(message) = result {
        eprintln!("relayctl: {}", message);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut client = match cli.socket {
        Some(path) => ControlClient::connect_path(&path).await,
        None => ControlClient::connect().await,
    }
    .map_err(|e| e.to_string())?;

    let response = match cli.command {
        Command::On { relays } => {
            let zones = relays.into_iter().map(Zone::on).collect();
            client.set_zones(zones).await
        }
        Command::Off { relays } => {
            let zones = relays.into_iter().map(Zone::off).collect();
            client.set_zones(zones).await
        }
        Command::Count { io_type } => client.count(&io_type).await,
    }
    .map_err(|e| e.to_string())?;

    if !response.result {
        return Err(response
            .error
            .unwrap_or_else(|| "request failed".to_string()));
    }
    if let Some(count) = response.count {
        println!("{}", count);
    }
    Ok(())
}
