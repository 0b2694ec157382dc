use anyhow::{anyhow, Result};

use crate::cli::{Cli, RecordCommand};
use crate::commands::{resolve_binding, rpc_client, submitter};
use crate::config::Config;
use crate::records;
use crate::submitter::InvocationOutcome;

pub async fn run(cli: &Cli, cmd: &RecordCommand) -> Result<()> {
	let config = Config::load()?;

	match cmd {
		RecordCommand::Add { hash, name } => {
			let (submitter, connection) = submitter(cli, &config).await?;
			let outcome =
				records::add_record(&submitter, &connection, hash, name, |o| println!("Status: {o}"))
					.await;
			if let InvocationOutcome::Error(msg) = outcome {
				return Err(anyhow!(msg));
			}
			Ok(())
		}
		RecordCommand::Verify { hash } => {
			let rpc = rpc_client(cli, &config)?;
			let binding = resolve_binding(cli, &config)?;
			let info = records::verify_record(rpc.as_ref(), binding.as_ref(), hash).await?;

			println!("Exists:    {}", if info.exists { "Yes" } else { "No" });
			if info.exists {
				println!("Issuer:    {}", ethers::utils::to_checksum(&info.issuer, None));
				println!("Name:      {}", info.name);
				match info.issued_at {
					Some(ts) => println!("Timestamp: {}", ts.to_rfc3339()),
					None => println!("Timestamp: invalid"),
				}
			}
			Ok(())
		}
	}
}
