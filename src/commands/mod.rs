pub mod contract;
pub mod record;
pub mod tx;
pub mod wallet;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use ethers::types::Address;
use tracing::warn;

use crate::cli::Cli;
use crate::config::Config;
use crate::contracts::{ContractBinding, ContractInterface};
use crate::rpc::{ConnectionProvider, RpcClient};
use crate::session::Connection;
use crate::submitter::Submitter;
use crate::validate;

/// Resolve the RPC URL from CLI flag or config.
pub fn resolve_rpc(cli: &Cli, config: &Config) -> String {
	cli.rpc_url
		.clone()
		.unwrap_or_else(|| config.network.rpc_url.clone())
}

pub fn rpc_client(cli: &Cli, config: &Config) -> Result<Arc<RpcClient>> {
	Ok(Arc::new(RpcClient::new(
		&resolve_rpc(cli, config),
		config.poll_interval(),
	)?))
}

/// Load the interface from `--abi`, the config, or the built-in default.
pub fn resolve_interface(cli: &Cli, config: &Config) -> Result<ContractInterface> {
	match cli.abi.as_ref().or(config.contract.abi.as_ref()) {
		Some(path) => ContractInterface::load(path),
		None => ContractInterface::verification(),
	}
}

/// Bind the contract interface to the address from CLI flag or config.
/// Returns `None`, with a warning, when no address is configured.
pub fn resolve_binding(cli: &Cli, config: &Config) -> Result<Option<ContractBinding>> {
	let interface = resolve_interface(cli, config)?;
	let address = cli.contract.as_deref().or(config.contract.address.as_deref());
	let binding = ContractBinding::from_config(address, Arc::new(interface))?;
	if binding.is_none() {
		warn!("no contract address configured; set [contract] address or --contract");
	}
	Ok(binding)
}

/// Build the session connection from the saved or overridden account.
/// Does not prompt the wallet; that is what `connect` is for.
pub async fn resolve_connection(
	cli: &Cli,
	config: &Config,
	provider: &dyn ConnectionProvider,
) -> Result<Connection> {
	let account = resolve_account(cli, config)?;
	let chain_id = provider.chain_id().await?;
	Ok(Connection {
		chain_id: Some(chain_id),
		account,
	})
}

/// The account from `--account` or the config, if any. A malformed
/// address is an error rather than "no account".
pub fn resolve_account(cli: &Cli, config: &Config) -> Result<Option<Address>> {
	cli.account
		.as_deref()
		.or(config.account.address.as_deref())
		.map(parse_address)
		.transpose()
}

/// Everything a contract command needs.
pub async fn submitter(cli: &Cli, config: &Config) -> Result<(Submitter, Connection)> {
	let rpc = rpc_client(cli, config)?;
	let binding = resolve_binding(cli, config)?;
	let connection = resolve_connection(cli, config, rpc.as_ref()).await?;
	let submitter = Submitter::new(rpc, binding, config.submit_settings());
	Ok((submitter, connection))
}

pub fn parse_address(raw: &str) -> Result<Address> {
	let raw = raw.trim();
	if !validate::is_address(raw) {
		return Err(anyhow!("invalid address: {raw}"));
	}
	raw.parse().map_err(|e| anyhow!("invalid address {raw}: {e}"))
}

#[cfg(test)]
mod tests {
	use clap::Parser;

	use super::*;

	const ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	fn cli(args: &[&str]) -> Cli {
		Cli::parse_from(std::iter::once("docverify").chain(args.iter().copied()))
	}

	#[test]
	fn account_flag_wins_over_config() {
		let mut config = Config::default();
		config.account.address = Some("0x1111111111111111111111111111111111111111".into());

		let account = resolve_account(&cli(&["--account", ACCOUNT, "watch"]), &config).unwrap();
		assert_eq!(account, Some(ACCOUNT.parse().unwrap()));

		let saved = resolve_account(&cli(&["watch"]), &config).unwrap();
		assert_eq!(saved, Some(Address::repeat_byte(0x11)));
	}

	#[test]
	fn no_account_is_not_an_error() {
		assert_eq!(resolve_account(&cli(&["watch"]), &Config::default()).unwrap(), None);
	}

	#[test]
	fn malformed_account_is_an_error() {
		let err = resolve_account(&cli(&["--account", "0x12", "watch"]), &Config::default())
			.unwrap_err();
		assert!(err.to_string().contains("invalid address"), "{err}");
	}
}
