use anyhow::{anyhow, bail, Result};
use ethers::types::TxHash;

use crate::cli::{Cli, TxCommand};
use crate::commands::rpc_client;
use crate::config::Config;
use crate::validate;

pub async fn run(cli: &Cli, cmd: &TxCommand) -> Result<()> {
	let config = Config::load()?;
	let rpc = rpc_client(cli, &config)?;

	match cmd {
		TxCommand::Status { tx_hash } => {
			if !validate::is_hex32(tx_hash) {
				bail!("invalid transaction hash: {tx_hash} (expected 0x followed by 64 hex digits)");
			}
			let hash = tx_hash
				.parse::<TxHash>()
				.map_err(|e| anyhow!("invalid transaction hash {tx_hash}: {e}"))?;

			match rpc.transaction_status(hash).await? {
				Some(confirmation) => {
					let status = match confirmation.status {
						Some(1) => "confirmed",
						Some(_) => "failed",
						None => "mined (no status)",
					};
					println!("Transaction: {tx_hash}");
					println!("Status:      {status}");
					println!("Tip block:   {}", rpc.block_number().await?);
				}
				None => println!("Transaction pending or not found: {tx_hash}"),
			}
			Ok(())
		}
	}
}
