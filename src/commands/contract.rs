use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::args;
use crate::cli::Cli;
use crate::commands::{resolve_binding, resolve_interface, rpc_client, submitter};
use crate::config::Config;
use crate::contracts::{self, Mutability};
use crate::reads;
use crate::submitter::{InvocationOutcome, InvocationRequest};
use crate::tx_builder;

pub async fn reads(cli: &Cli) -> Result<()> {
	let config = Config::load()?;
	let (submitter, _) = submitter(cli, &config).await?;
	let values = submitter
		.refresh_reads()
		.await
		.ok_or_else(|| anyhow!("Contract not initialized"))?;
	print_fields(&values);
	Ok(())
}

pub fn methods(cli: &Cli) -> Result<()> {
	let config = Config::load()?;
	let interface = resolve_interface(cli, &config)?;

	println!("{} {}", interface.name, interface.version);
	for function in interface.operations() {
		let kind = match contracts::mutability(function) {
			Mutability::Read => "read ",
			Mutability::Write => "write",
		};
		println!("  {kind}  {}", contracts::signature(function));
	}
	Ok(())
}

/// Generic writer: parse the argument line, submit, and print each outcome
/// as it arrives.
pub async fn send(cli: &Cli, method: &str, raw_args: &str) -> Result<()> {
	let config = Config::load()?;
	let (submitter, connection) = submitter(cli, &config).await?;
	let request = InvocationRequest::parse(method, raw_args);

	let outcome = submitter
		.invoke(&connection, &request, |o| println!("{o}"))
		.await;

	match outcome {
		InvocationOutcome::Confirmed(_) => {
			print_fields(&submitter.cached_reads());
			Ok(())
		}
		InvocationOutcome::Error(msg) => Err(anyhow!(msg)),
		_ => Ok(()),
	}
}

pub async fn call(cli: &Cli, method: &str, raw_args: &str) -> Result<()> {
	let config = Config::load()?;
	let rpc = rpc_client(cli, &config)?;
	let binding = resolve_binding(cli, &config)?.ok_or_else(|| anyhow!("Contract not initialized"))?;

	let values = args::parse(raw_args);
	let function = binding
		.interface
		.operation(method.trim(), values.len())
		.ok_or_else(|| anyhow!("Method \"{}\" not found on contract ABI.", method.trim()))?;
	let tokens = tx_builder::tokenize(function, &values)?;

	let outputs = reads::call_operation(rpc.as_ref(), &binding, &function.name, &tokens, None).await?;
	for (param, token) in function.outputs.iter().zip(&outputs) {
		let label = if param.name.is_empty() { "-" } else { param.name.as_str() };
		println!("{label}: {}", reads::display_token(token));
	}
	Ok(())
}

fn print_fields(values: &BTreeMap<String, String>) {
	for (field, value) in values {
		println!("{field}: {value}");
	}
}
