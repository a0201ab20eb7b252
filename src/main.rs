mod args;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use testnet_drip::config::SAMPLE_CONFIG;
use testnet_drip::keys::load_accounts;
use testnet_drip::provider::connect_http;
use testnet_drip::{
    AccountProcessor, AccountReport, AccountStatus, Config, ProcessError, TracingSink,
    TransactionSubmitter,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Commands::Run { config, count } => run(config, count).await?,
        Commands::GenerateConfig { output } => {
            let mut file = File::create(&output)
                .context(format!("Failed to create config file at {:?}", output))?;
            file.write_all(SAMPLE_CONFIG.as_bytes())?;

            info!("Sample configuration file generated at {:?}", output);
            info!("Please edit the file with your RPC endpoint before running.");
        }
    }

    Ok(())
}

async fn run(config_path: PathBuf, count: Option<u32>) -> Result<()> {
    let config = Config::load(&config_path)
        .context(format!("Failed to load config from {:?}", config_path))?;
    info!("Configuration loaded successfully");

    let accounts = load_accounts(&config.private_keys_path)?;
    info!("Loaded {} accounts", accounts.len());

    let provider = Arc::new(connect_http(&config.rpc_url)?);
    let processor = AccountProcessor::new(
        provider,
        Arc::new(TracingSink),
        TransactionSubmitter::new(config.transfer_policy()?),
        config.processor_settings()?,
    );

    let mut reports = Vec::with_capacity(accounts.len());
    for account in &accounts {
        let count = match count {
            Some(count) => count,
            None => prompt_count(account.address.to_string()).await?,
        };

        match processor.process(account, count).await {
            Ok(report) => reports.push(report),
            Err(ProcessError::Submission {
                index,
                report,
                source,
                ..
            }) => {
                error!(address = %account.address, index, error = %source, "Stopping account after rejected transfer");
                reports.push(*report);
            }
            Err(e @ ProcessError::InitialBalance { .. }) => {
                error!(error = %e, "Skipping account");
                let mut report = AccountReport::new(account.address);
                report.status = AccountStatus::Aborted;
                reports.push(report);
            }
        }
    }

    print_summary(&reports);
    Ok(())
}

/// Asks for a transaction count until the answer parses.
async fn prompt_count(address: String) -> Result<u32> {
    tokio::task::spawn_blocking(move || -> Result<u32> {
        let stdin = io::stdin();
        loop {
            print!(
                "Enter the number of transactions you want to send for address {}: ",
                address
            );
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                anyhow::bail!("stdin closed before a transaction count was entered");
            }
            match line.trim().parse::<u32>() {
                Ok(count) => return Ok(count),
                Err(_) => println!("Please enter a whole number."),
            }
        }
    })
    .await?
}

fn print_summary(reports: &[AccountReport]) {
    println!("\n{:-^80}", " RESULTS SUMMARY ");
    println!(
        "{:<5} {:<44} {:<12} {:<10} {:<10} {:<8} {:<10} {:<5}",
        "No.", "Address", "Status", "Submitted", "Confirmed", "Failed", "Abandoned", "Low"
    );
    println!("{:-^80}", "");

    for (i, report) in reports.iter().enumerate() {
        let status = match report.status {
            AccountStatus::Completed => "DONE",
            AccountStatus::InsufficientBalance => "SKIPPED",
            AccountStatus::Aborted => "ABORTED",
        };
        println!(
            "{:<5} {:<44} {:<12} {:<10} {:<10} {:<8} {:<10} {:<5}",
            i + 1,
            report.address.to_string(),
            status,
            report.submitted,
            report.confirmed,
            report.failed,
            report.abandoned,
            if report.low_balance { "yes" } else { "no" }
        );
    }

    println!("\n{:-^80}", " STATISTICS ");
    println!("Accounts: {}", reports.len());
    println!(
        "Submitted: {}",
        reports.iter().map(|r| r.submitted).sum::<u32>()
    );
    println!(
        "Confirmed: {}",
        reports.iter().map(|r| r.confirmed).sum::<u32>()
    );
    println!("Failed: {}", reports.iter().map(|r| r.failed).sum::<u32>());
    println!(
        "Abandoned: {}",
        reports.iter().map(|r| r.abandoned).sum::<u32>()
    );
}
