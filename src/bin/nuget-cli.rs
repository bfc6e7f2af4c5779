use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use nuget_cli::{commands::InstallCommand, install::EXIT_HELP};
use std::process::exit;
use tracing_subscriber::EnvFilter;

fn version() -> &'static str {
    option_env!("CARGO_VERSION_INFO").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Install packages from NuGet feeds.
#[derive(Parser)]
#[command(bin_name = "nuget-cli", version = version())]
struct NuGetCli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Install(InstallCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let code = match NuGetCli::parse().command {
        Some(Command::Install(cmd)) => match cmd.exec().await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error: {e:?}");
                1
            }
        },
        None => {
            NuGetCli::command().print_help()?;
            EXIT_HELP
        }
    };

    exit(code)
}
