//! Command dispatch logic for wlan-trends

use super::{FetchArgs, InitArgs, ValidateArgs, fetch_trends, init_config, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "wlan-trends", version, author, long_about = None)]
#[command(about = "Chart wireless connection, latency, and client-count trends for a network")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch statistics for a time range and write the reports
    Fetch(Box<FetchArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Fetch(fetch_args) => fetch_trends(host, fetch_args).await,
        Command::Init(init_args) => init_config(host, init_args),
        Command::Validate(validate_args) => validate_config(host, validate_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_arguments_parse() {
        let cli = Cli::try_parse_from([
            "wlan-trends",
            "fetch",
            "--network-id",
            "N_1",
            "--band",
            "2.4",
            "--days",
            "0.5",
            "--full-timestamps",
        ])
        .unwrap();

        let Command::Fetch(args) = cli.command else {
            panic!("expected the fetch command");
        };
        assert_eq!(args.network_id.as_deref(), Some("N_1"));
        assert_eq!(args.band, Some(crate::stats::Band::TwoPointFour));
        assert_eq!(args.days, Some(0.5));
        assert!(args.full_timestamps);
    }
}
