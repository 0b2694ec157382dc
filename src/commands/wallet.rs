use anyhow::Result;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::commands::{
	resolve_account, resolve_binding, resolve_connection, resolve_rpc, rpc_client,
};
use crate::config::Config;
use crate::rpc::ConnectionProvider;
use crate::session::{self, Connection};

/// Request accounts from the wallet and save the active one.
pub async fn connect(cli: &Cli) -> Result<()> {
	let mut config = Config::load()?;
	let rpc = rpc_client(cli, &config)?;

	let connection = session::connect(rpc.as_ref()).await?;
	println!("Connected: {connection}");

	if let Some(account) = connection.account {
		config.account.address = Some(ethers::utils::to_checksum(&account, None));
		config.save()?;
		println!("Account saved to config.");
	}
	Ok(())
}

pub async fn status(cli: &Cli) -> Result<()> {
	let config = Config::load()?;
	let rpc = rpc_client(cli, &config)?;
	let binding = resolve_binding(cli, &config)?;

	println!("Network");
	println!("  RPC:      {}", resolve_rpc(cli, &config));
	match resolve_connection(cli, &config, rpc.as_ref()).await {
		Ok(conn) => println!("  Session:  {conn}"),
		Err(e) => println!("  Session:  unreachable ({e})"),
	}

	println!("Contract");
	match &binding {
		Some(b) => {
			println!("  Address:  {}", ethers::utils::to_checksum(&b.address, None));
			println!("  ABI:      {} {}", b.interface.name, b.interface.version);
		}
		None => println!("  Address:  not configured"),
	}
	println!("  Fields:   {}", config.contract.read_fields.join(", "));
	Ok(())
}

/// Print the connection each time the wallet reports a change, until
/// Ctrl-C. The subscription is released when this returns.
pub async fn watch(cli: &Cli) -> Result<()> {
	let config = Config::load()?;
	let rpc = rpc_client(cli, &config)?;
	let account = resolve_account(cli, &config)?;
	let chain_id = match rpc.chain_id().await {
		Ok(id) => Some(id),
		Err(e) => {
			warn!(error = %e, "chain id unavailable, waiting for the first change");
			None
		}
	};
	let mut connection = Connection { chain_id, account };
	println!("Watching: {connection} (Ctrl-C to stop)");

	let mut events = rpc.subscribe()?;
	loop {
		tokio::select! {
			event = events.next() => {
				let Some(event) = event else { break };
				info!(?event, "wallet event");
				connection = session::reduce(connection, &event);
				println!("{connection}");
			}
			_ = tokio::signal::ctrl_c() => break,
		}
	}
	Ok(())
}
