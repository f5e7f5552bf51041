//! Server CLI implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use relayd_control::socket::default_socket_path;
use relayd_core::{GatewayConfig, ModuleInfo};

/// Log output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliLogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

impl From<CliLogFormat> for relayd_core::LogFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Text => relayd_core::LogFormat::Text,
            CliLogFormat::Json => relayd_core::LogFormat::Json,
        }
    }
}

/// relayd - gateway between a control socket and a telnet relay module.
#[derive(Debug, Parser)]
#[command(
    name = "relayd",
    version,
    about = "relayd - telnet relay module gateway"
)]
pub struct Cli {
    /// Relay module address
    #[arg(short = 'a', long = "address", value_name = "HOST")]
    pub module_address: String,

    /// Relay module telnet port
    #[arg(short = 'p', long = "port", default_value = "23")]
    pub module_port: u16,

    /// Module login user name
    #[arg(short = 'u', long = "username", default_value = "admin")]
    pub username: String,

    /// Module login password
    #[arg(
        long = "password",
        default_value = "admin",
        env = "RELAYD_MODULE_PASSWORD",
        hide_env_values = true
    )]
    pub password: String,

    /// Control socket path (defaults to the standard location)
    #[arg(short = 's', long = "socket", value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Close the module session after this many seconds without a request
    #[arg(
        long = "idle-disconnect",
        default_value = "20",
        value_name = "SECONDS"
    )]
    pub idle_disconnect_secs: u64,

    /// Re-assert a non-zero relay state after this long without a confirmed write
    #[arg(
        long = "drift-interval",
        default_value = "120",
        value_name = "SECONDS"
    )]
    pub drift_interval_secs: u64,

    /// Increase verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Log to file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", default_value = "text")]
    pub log_format: CliLogFormat,
}

impl Cli {
    /// Build the core gateway configuration.
    pub fn gateway_config(&self) -> GatewayConfig {
        let module = ModuleInfo::new(
            self.module_address.clone(),
            self.username.clone(),
            self.password.clone(),
        )
        .with_port(self.module_port);

        GatewayConfig::new(module)
            .with_idle_disconnect(Duration::from_secs(self.idle_disconnect_secs))
            .with_drift_interval(Duration::from_secs(self.drift_interval_secs))
    }

    /// Resolve the control socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.socket.clone().unwrap_or_else(default_socket_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_args_parse_with_defaults() {
        let cli = Cli::try_parse_from(["relayd", "-a", "192.168.1.32"]).unwrap();
        assert_eq!(cli.module_address, "192.168.1.32");
        assert_eq!(cli.module_port, 23);
        assert_eq!(cli.username, "admin");
        assert_eq!(cli.idle_disconnect_secs, 20);
        assert_eq!(cli.drift_interval_secs, 120);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn address_is_required() {
        assert!(Cli::try_parse_from(["relayd"]).is_err());
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["relayd", "-a", "10.0.0.9", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn gateway_config_carries_cli_values() {
        let cli = Cli::try_parse_from([
            "relayd",
            "-a",
            "10.0.0.9",
            "-p",
            "2300",
            "-u",
            "operator",
            "--idle-disconnect",
            "5",
            "--drift-interval",
            "30",
        ])
        .unwrap();

        let config = cli.gateway_config();
        assert_eq!(config.module.address, "10.0.0.9");
        assert_eq!(config.module.port, 2300);
        assert_eq!(config.module.username, "operator");
        assert_eq!(config.idle_disconnect, Duration::from_secs(5));
        assert_eq!(config.drift_interval, Duration::from_secs(30));
    }

    #[test]
    fn socket_path_override() {
        let cli =
            Cli::try_parse_from(["relayd", "-a", "10.0.0.9", "-s", "/run/relayd.sock"]).unwrap();
        assert_eq!(cli.socket_path(), PathBuf::from("/run/relayd.sock"));
    }
}
