mod cli;
mod commands;
mod error;
mod http;
mod service;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let serving = matches!(cli.command, Command::Serve(_));
    init_tracing(cli.global.verbose, serving, cli.global.log_json);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, serving: bool, json: bool) {
    let filter = match verbosity {
        0 if serving => "info",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_file = cli.global.config.as_deref();

    match cli.command {
        // Neither needs a loaded configuration.
        Command::CheckEui { value } => commands::check_eui(&value),
        Command::Config(args) => commands::config(&args.command, config_file),

        Command::UpsertDevice(args) => {
            let cfg = lorasync_config::load_config(config_file)?;
            commands::upsert_device(&cfg, args.into()).await
        }

        Command::Serve(args) => {
            let cfg = lorasync_config::load_config(config_file)?;
            let port = args.port.unwrap_or(cfg.listen_port);

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, shutting down");
                    on_signal.cancel();
                }
            });

            service::serve(&cfg, port, cancel).await
        }
    }
}
