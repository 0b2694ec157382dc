use anyhow::Result;
use clap::Parser;

use docverify_cli::cli::{Cli, Command};
use docverify_cli::{commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
	logging::init()?;

	let cli = Cli::parse();

	match &cli.command {
		Command::Connect => commands::wallet::connect(&cli).await,
		Command::Status => commands::wallet::status(&cli).await,
		Command::Watch => commands::wallet::watch(&cli).await,
		Command::Reads => commands::contract::reads(&cli).await,
		Command::Methods => commands::contract::methods(&cli),
		Command::Send { method, args } => commands::contract::send(&cli, method, args).await,
		Command::Call { method, args } => commands::contract::call(&cli, method, args).await,
		Command::Record { command } => commands::record::run(&cli, command).await,
		Command::Tx { command } => commands::tx::run(&cli, command).await,
	}
}

