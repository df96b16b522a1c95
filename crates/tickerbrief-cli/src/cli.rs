//! CLI argument definitions for tickerbrief.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Collect, summarize and deliver the brief (default) |
//! | `collect` | Collect market data only and print the block |
//! | `models` | Show the capability listing and the model a run would use |
//!
//! # Examples
//!
//! ```bash
//! # Full run with the configured tickers
//! tickerbrief
//!
//! # Print the report instead of sending it
//! tickerbrief run --dry-run --tickers NVDA,AAPL
//!
//! # Inspect the data block as JSON
//! tickerbrief collect --json
//! ```

use clap::{Args, Parser, Subcommand};

/// Daily market brief: quotes and headlines summarized by a generation model
/// and delivered to Telegram.
///
/// Configuration is read from the environment (and an optional `.env` file).
#[derive(Debug, Parser)]
#[command(name = "tickerbrief", author, version, about = "Daily market brief delivered to a chat")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// `run` with default arguments when no subcommand is given.
    pub fn selected_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run(RunArgs::default()))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 📨 Collect, summarize and deliver the brief.
    ///
    /// # Examples
    ///
    ///   tickerbrief run
    ///   tickerbrief run --dry-run
    ///   tickerbrief run --tickers NVDA,TSLA
    Run(RunArgs),

    /// 📊 Collect quotes and headlines without generating a report.
    Collect(CollectArgs),

    /// 🤖 List generation models and show which one would be selected.
    Models,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Print the message to stdout instead of sending it.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Comma separated tickers, overriding TICKERBRIEF_TICKERS.
    #[arg(long)]
    pub tickers: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CollectArgs {
    /// Print the block as JSON instead of the prompt text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Comma separated tickers, overriding TICKERBRIEF_TICKERS.
    #[arg(long)]
    pub tickers: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["tickerbrief"]).expect("parses");
        assert!(matches!(cli.selected_command(), Command::Run(RunArgs { dry_run: false, tickers: None })));
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = Cli::try_parse_from(["tickerbrief", "run", "--dry-run", "--tickers", "NVDA,AAPL"])
            .expect("parses");
        let Command::Run(args) = cli.selected_command() else {
            panic!("expected run");
        };
        assert!(args.dry_run);
        assert_eq!(args.tickers.as_deref(), Some("NVDA,AAPL"));
    }

    #[test]
    fn collect_json_flag() {
        let cli = Cli::try_parse_from(["tickerbrief", "collect", "--json"]).expect("parses");
        assert!(matches!(cli.selected_command(), Command::Collect(CollectArgs { json: true, .. })));
    }
}
