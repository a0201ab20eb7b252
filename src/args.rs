use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version = "0.1.0")]
#[command(about = "Test-network transfer drip")]
#[command(
    long_about = "Sends small randomized ETH transfers from each funded wallet to freshly \
    generated addresses, one transaction at a time, while watching the sender's balance \
    and waiting for each receipt."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send transfers from every account in the private keys file
    Run {
        /// Path to config.yaml file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Transactions to send per account. When omitted, prompts for every
        /// account before its balance is checked, so accounts that end up
        /// skipped for low balance are asked too.
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Generate a sample config file
    GenerateConfig {
        /// Path to output config file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_count_help_mentions_prompt_before_balance_check() {
        let cmd = Args::command();
        cmd.clone().debug_assert();

        let run = cmd.find_subcommand("run").unwrap();
        let count = run
            .get_arguments()
            .find(|arg| arg.get_id() == "count")
            .unwrap();
        let help = count
            .get_long_help()
            .or(count.get_help())
            .unwrap()
            .to_string();
        assert!(help.contains("before its balance is checked"));
    }

    #[test]
    fn test_parses_run_with_count() {
        let args = Args::try_parse_from(["testnet-drip", "run", "-n", "3"]).unwrap();
        match args.command {
            Commands::Run { count, config } => {
                assert_eq!(count, Some(3));
                assert_eq!(config, PathBuf::from("config.yaml"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
