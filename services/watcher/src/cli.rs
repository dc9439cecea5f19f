use crate::runner::{check_config, watch};
use clap::{Args, Parser, Subcommand};
use slot_watch::config::DEFAULT_CONFIG_FILE;
use slot_watch::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "slot-watcher",
    about = "Watch enrollment centers for newly opened interview appointments",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    watch: WatchArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the scheduler until the cutoff date (default command)
    Watch(WatchArgs),
    /// Validate the config file and print the effective settings
    CheckConfig(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ConfigArgs {
    /// Config file to use
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub(crate) config: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub(crate) config: ConfigArgs,
    /// Run a single poll cycle, print the per-location results and exit
    #[arg(long)]
    pub(crate) once: bool,
    /// Log notifications instead of sending email
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        None => watch(cli.watch).await,
        Some(Command::Watch(args)) => watch(args).await,
        Some(Command::CheckConfig(args)) => check_config(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_watching_config_json() {
        let cli = Cli::try_parse_from(["slot-watcher"]).expect("no arguments parse");

        assert!(cli.command.is_none());
        assert_eq!(cli.watch.config.config, PathBuf::from("config.json"));
        assert!(!cli.watch.once);
        assert!(!cli.watch.dry_run);
    }

    #[test]
    fn top_level_flags_apply_to_the_default_command() {
        let cli = Cli::try_parse_from(["slot-watcher", "--config", "alt.json", "--dry-run"])
            .expect("flags parse");

        assert_eq!(cli.watch.config.config, PathBuf::from("alt.json"));
        assert!(cli.watch.dry_run);
    }

    #[test]
    fn parses_check_config_subcommand() {
        let cli = Cli::try_parse_from(["slot-watcher", "check-config", "--config", "x.json"])
            .expect("subcommand parses");

        match cli.command {
            Some(Command::CheckConfig(args)) => assert_eq!(args.config, PathBuf::from("x.json")),
            other => panic!("expected check-config, got {other:?}"),
        }
    }

    #[test]
    fn parses_watch_once() {
        let cli = Cli::try_parse_from(["slot-watcher", "watch", "--once"]).expect("watch parses");

        match cli.command {
            Some(Command::Watch(args)) => assert!(args.once),
            other => panic!("expected watch, got {other:?}"),
        }
    }
}
