//! Clap derive structures for the `lorasync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lorasync_core::UpsertDeviceRequest;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lorasync -- LoRaWAN device ↔ platform asset synchronization
#[derive(Debug, Parser)]
#[command(
    name = "lorasync",
    version,
    about = "Keep LoRaWAN network-server devices in sync with building-platform assets",
    long_about = "Listens for asset changes on the building platform and applies them to the\n\
        matching devices of every configured network-server account, recording which\n\
        asset belongs to which device.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "LORASYNC_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the asset listener and HTTP API until interrupted
    Serve(ServeArgs),

    /// Create or update one device on every matching configuration
    #[command(alias = "upsert")]
    UpsertDevice(UpsertDeviceArgs),

    /// Check whether a value is a valid device EUI
    CheckEui {
        /// Candidate EUI (16, 32 or 64 hex characters)
        value: String,
    },

    /// Inspect the effective configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// HTTP port (overrides `listen_port`)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct UpsertDeviceArgs {
    /// Device EUI
    #[arg(long)]
    pub dev_eui: String,

    /// Network-server app id the device belongs to
    #[arg(long)]
    pub app_id: String,

    /// Platform asset type for the device asset
    #[arg(long)]
    pub asset_type: String,

    /// Only this configuration id
    #[arg(long)]
    pub config_id: Option<i64>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Join EUI (OTAA), used only when the device is created
    #[arg(long)]
    pub join_eui: Option<String>,

    /// Application key (OTAA), used only when the device is created
    #[arg(long, env = "LORASYNC_APP_KEY", hide_env_values = true)]
    pub app_key: Option<String>,

    /// Network key (OTAA 1.1), used only when the device is created
    #[arg(long, env = "LORASYNC_NWK_KEY", hide_env_values = true)]
    pub nwk_key: Option<String>,

    /// LoRaWAN device class (A, B or C)
    #[arg(long)]
    pub dev_class: Option<String>,
}

impl From<UpsertDeviceArgs> for UpsertDeviceRequest {
    fn from(args: UpsertDeviceArgs) -> Self {
        Self {
            dev_eui: args.dev_eui,
            app_id: args.app_id,
            asset_type_name: args.asset_type,
            config_id: args.config_id,
            title: args.title,
            description: args.description,
            join_eui: args.join_eui,
            app_key: args.app_key,
            nwk_key: args.nwk_key,
            dev_class: args.dev_class,
        }
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upsert_args_map_to_request() {
        let cli = Cli::try_parse_from([
            "lorasync",
            "upsert-device",
            "--dev-eui",
            "0123456789ABCDEF",
            "--app-id",
            "A1",
            "--asset-type",
            "lorawan_device",
            "--config-id",
            "2",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Command::UpsertDevice(args) = cli.command else {
            panic!("wrong subcommand");
        };
        let req = UpsertDeviceRequest::from(args);
        assert_eq!(req.config_id, Some(2));
        assert_eq!(req.asset_type_name, "lorawan_device");
        assert_eq!(req.title, None);
    }
}
