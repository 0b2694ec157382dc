use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use ethers::abi::Token;
use ethers::types::{Address, I256};
use futures_util::future::join_all;
use tracing::warn;

use crate::contracts::ContractBinding;
use crate::rpc::ConnectionProvider;
use crate::tx_builder;

/// Shown in place of a field the contract does not expose or that failed
/// to load.
pub const UNAVAILABLE: &str = "n/a";

/// Fields shown on the dashboard when none are configured.
pub const DEFAULT_FIELDS: [&str; 3] = ["count_Exporters", "count_hashes", "owner"];

/// Query every field concurrently and render the results for display.
///
/// Each field is independent: one that is missing from the interface or
/// whose call fails maps to [`UNAVAILABLE`] without affecting the others.
pub async fn refresh(
	provider: &dyn ConnectionProvider,
	binding: &ContractBinding,
	fields: &[String],
) -> BTreeMap<String, String> {
	let queries = fields.iter().map(|field| async move {
		let value = match read_field(provider, binding, field).await {
			Ok(v) => v,
			Err(e) => {
				warn!(field = %field, error = %e, "field unavailable");
				UNAVAILABLE.to_owned()
			}
		};
		(field.clone(), value)
	});
	join_all(queries).await.into_iter().collect()
}

async fn read_field(
	provider: &dyn ConnectionProvider,
	binding: &ContractBinding,
	field: &str,
) -> Result<String> {
	let outputs = call_operation(provider, binding, field, &[], None).await?;
	Ok(display_outputs(&outputs))
}

/// Run a read-only call of `name` and decode its return values.
pub async fn call_operation(
	provider: &dyn ConnectionProvider,
	binding: &ContractBinding,
	name: &str,
	args: &[Token],
	from: Option<Address>,
) -> Result<Vec<Token>> {
	let function = binding
		.interface
		.operation(name, args.len())
		.ok_or_else(|| anyhow!("operation \"{name}\" not found on contract interface"))?;
	let data = function.encode_input(args)?;
	let tx = tx_builder::build_call(binding, from, data);
	let raw = provider.call(&tx).await?;
	Ok(function.decode_output(&raw)?)
}

// -- Rendering --

/// One value per line-friendly string: a single return value as itself,
/// several as a parenthesised list.
pub fn display_outputs(outputs: &[Token]) -> String {
	match outputs {
		[single] => display_token(single),
		many => {
			let parts: Vec<String> = many.iter().map(display_token).collect();
			format!("({})", parts.join(", "))
		}
	}
}

/// Render a decoded value without going through floating point.
pub fn display_token(token: &Token) -> String {
	match token {
		Token::Address(a) => ethers::utils::to_checksum(a, None),
		Token::Uint(n) => n.to_string(),
		Token::Int(n) => I256::from_raw(*n).to_string(),
		Token::Bool(b) => b.to_string(),
		Token::String(s) => s.clone(),
		Token::Bytes(b) | Token::FixedBytes(b) => format!("0x{}", hex::encode(b)),
		Token::Array(items) | Token::FixedArray(items) => {
			let parts: Vec<String> = items.iter().map(display_token).collect();
			format!("[{}]", parts.join(", "))
		}
		Token::Tuple(items) => {
			let parts: Vec<String> = items.iter().map(display_token).collect();
			format!("({})", parts.join(", "))
		}
	}
}
