//! Tokenscope CLI
//!
//! Connect a wallet, or type an address or ENS name, and list every ERC-20
//! token balance it holds.

mod config;
mod logging;
mod renderer;
mod types;

use anyhow::Result;
use clap::Parser;
use config::{Overrides, TokenscopeConfig};
use renderer::TerminalRenderer;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokenscope::erc20::{AlchemyTokenService, EvmChain};
use tokenscope::ethereum::{RpcWalletConnector, WalletBridge};
use tokenscope::{BalanceFormatter, BalanceQueryController, DisplayLocale, QueryOutcome, SkipReason};
use types::{CliResponse, MenuChoice};

#[derive(Debug, Parser)]
#[command(name = "tokenscope", version, about = "ERC-20 token balances of an address, ENS name or connected wallet")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network to query, by name, Alchemy slug or chain id
    #[arg(short, long)]
    network: Option<EvmChain>,

    /// URL of the local wallet JSON-RPC bridge
    #[arg(long)]
    wallet_rpc: Option<String>,

    /// Display locale such as `en-US` or `de-CH`
    #[arg(long)]
    locale: Option<String>,

    /// Query this address or name once and exit
    #[arg(short, long)]
    address: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            network: self.network,
            wallet_rpc_url: self.wallet_rpc.clone(),
            locale: self.locale.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // .env is optional
    let _ = dotenvy::dotenv();
    logging::init(args.log_json)?;

    let config = TokenscopeConfig::load(args.config.as_deref())?.with_overrides(args.overrides());
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let controller = build_controller(&config)?;

    if let Some(address) = args.address {
        controller.submit_query(&address).await?;
        return Ok(());
    }

    print_banner(&config);
    controller.publish();

    loop {
        print_main_menu(controller.view().is_connected());

        print!("\nYour choice: ");
        io::stdout().flush()?;

        let Some(choice) = read_line()? else {
            break;
        };

        match handle_main_menu_choice(&controller, &choice).await {
            Ok(CliResponse::Exit) => break,
            Ok(CliResponse::Continue) => continue,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        }
    }

    controller.disconnect();
    println!("\nGoodbye!");
    Ok(())
}

fn build_controller(config: &TokenscopeConfig) -> Result<BalanceQueryController> {
    let bridge = WalletBridge::new(&config.wallet_rpc_url, config.request_timeout_secs)?;
    let wallet = RpcWalletConnector::new(bridge).with_poll_interval(config.poll_interval());
    let data = AlchemyTokenService::with_config(config.network, config.provider_config()?)?;
    let formatter =
        BalanceFormatter::for_locale(DisplayLocale::from_env(config.locale.as_deref()));

    let controller = BalanceQueryController::builder()
        .wallet(Arc::new(wallet))
        .data_service(Arc::new(data))
        .renderer(Arc::new(TerminalRenderer::stdout()))
        .formatter(formatter)
        .build()?;
    Ok(controller)
}

/// Reads one line from stdin; `None` at end of input
fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_banner(config: &TokenscopeConfig) {
    println!();
    println!("  ╔══════════════════════════════════════════════════════╗");
    println!("  ║               ERC-20 Token Indexer                   ║");
    println!("  ╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Connect a wallet, or plug in an address and this tool will");
    println!("  return all of its ERC-20 token balances!");
    println!();
    println!(
        "  Tokenscope v{}  |  network: {}",
        tokenscope::version(),
        config.network.network()
    );
}

fn print_main_menu(connected: bool) {
    println!("\nGet all the ERC-20 token balances of this address:");
    if connected {
        println!("  [D] Disconnect wallet");
    } else {
        println!("  [C] Connect wallet");
    }
    println!("      - OR -");
    println!("  [A] Enter an address or ENS name");
    println!("  [Q] Check ERC-20 token balances");
    println!("  [X] Exit");
}

async fn handle_main_menu_choice(
    controller: &BalanceQueryController,
    input: &str,
) -> Result<CliResponse> {
    let Some(choice) = MenuChoice::parse(input) else {
        println!("Invalid option: {input}");
        return Ok(CliResponse::Continue);
    };

    match choice {
        MenuChoice::Connect => {
            // Failures were already alerted by the controller
            if let Err(e) = controller.connect().await {
                tracing::debug!(error = %e, "connect failed");
            }
        }
        MenuChoice::Disconnect => {
            if !controller.disconnect() {
                println!("No wallet connected.");
            }
        }
        MenuChoice::SetAddress => {
            print!("Address or ENS name (blank to use the wallet): ");
            io::stdout().flush()?;
            let address = read_line()?.unwrap_or_default();
            controller.set_input_address(address);
        }
        MenuChoice::Query => {
            let input = controller.view().input_address;
            match controller.submit_query(&input).await {
                Ok(QueryOutcome::Skipped(SkipReason::NoAddress)) => {
                    println!("Connect a wallet or enter an address first.");
                }
                Ok(QueryOutcome::Skipped(SkipReason::InFlight)) => {
                    println!("A query is already running.");
                }
                Ok(QueryOutcome::Discarded) => {
                    println!("The wallet changed during the query, please query again.");
                }
                Ok(QueryOutcome::Completed { .. }) => {}
                Err(e) => tracing::debug!(error = %e, "query failed"),
            }
        }
        MenuChoice::Exit => return Ok(CliResponse::Exit),
    }

    Ok(CliResponse::Continue)
}
