use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, TimeZone, Utc};
use ethers::abi::Token;
use ethers::types::{Address, U256};
use serde_json::Value;
use tracing::warn;

use crate::contracts::ContractBinding;
use crate::reads;
use crate::rpc::ConnectionProvider;
use crate::session::Connection;
use crate::submitter::{InvocationOutcome, InvocationRequest, Submitter};
use crate::validate;

const ADD_RECORD: &str = "addRecord";
const VERIFY_RECORD: &str = "verifyRecord";

/// What the contract knows about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
	pub exists: bool,
	pub issuer: Address,
	pub name: String,
	pub issued_at: Option<DateTime<Utc>>,
}

/// Anchor a document hash together with the student's name.
///
/// Goes through the submitter, so the outcome lifecycle and preconditions
/// are the same as for any other write.
pub async fn add_record<F>(
	submitter: &Submitter,
	connection: &Connection,
	doc_hash: &str,
	student_name: &str,
	mut notify: F,
) -> InvocationOutcome
where
	F: FnMut(&InvocationOutcome) + Send,
{
	let (doc_hash, student_name) = (doc_hash.trim(), student_name.trim());
	if doc_hash.is_empty() || student_name.is_empty() {
		let outcome = InvocationOutcome::Error("Provide doc hash and student name".into());
		notify(&outcome);
		return outcome;
	}
	check_hash_shape(doc_hash);

	let request = InvocationRequest::new(
		ADD_RECORD,
		vec![Value::from(doc_hash), Value::from(student_name)],
	);
	submitter.invoke(connection, &request, notify).await
}

/// Look a document hash up. Read-only: no account is needed.
pub async fn verify_record(
	provider: &dyn ConnectionProvider,
	binding: Option<&ContractBinding>,
	doc_hash: &str,
) -> Result<RecordInfo> {
	let binding = binding.ok_or_else(|| anyhow!("Contract not initialized"))?;
	let doc_hash = doc_hash.trim();
	if doc_hash.is_empty() {
		bail!("Provide a document hash to verify");
	}
	check_hash_shape(doc_hash);

	let outputs = reads::call_operation(
		provider,
		binding,
		VERIFY_RECORD,
		&[Token::String(doc_hash.to_owned())],
		None,
	)
	.await?;
	decode_record(&outputs)
}

fn decode_record(outputs: &[Token]) -> Result<RecordInfo> {
	match outputs {
		[Token::Address(issuer), Token::String(name), Token::Uint(timestamp), Token::Bool(exists)] => {
			Ok(RecordInfo {
				exists: *exists,
				issuer: *issuer,
				name: name.clone(),
				issued_at: to_datetime(*timestamp),
			})
		}
		other => bail!("unexpected {VERIFY_RECORD} result: {}", reads::display_outputs(other)),
	}
}

fn to_datetime(secs: U256) -> Option<DateTime<Utc>> {
	if secs > U256::from(i64::MAX as u64) {
		return None;
	}
	Utc.timestamp_opt(secs.low_u64() as i64, 0).single()
}

/// Document hashes may be CIDs or hex digests. A hex digest that is not
/// 32 bytes is accepted but most likely a typo.
fn check_hash_shape(doc_hash: &str) {
	if doc_hash.starts_with("0x") && !validate::is_hex32(doc_hash) {
		warn!(doc_hash, "0x-prefixed document hash is not 32 bytes");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_existing_record() {
		let issuer = Address::repeat_byte(0x42);
		let outputs = vec![
			Token::Address(issuer),
			Token::String("Alice".into()),
			Token::Uint(U256::from(1_700_000_000u64)),
			Token::Bool(true),
		];
		let info = decode_record(&outputs).unwrap();
		assert!(info.exists);
		assert_eq!(info.issuer, issuer);
		assert_eq!(info.name, "Alice");
		assert_eq!(
			info.issued_at.unwrap().to_rfc3339(),
			"2023-11-14T22:13:20+00:00"
		);
	}

	#[test]
	fn rejects_unexpected_shape() {
		assert!(decode_record(&[Token::Bool(true)]).is_err());
	}

	#[test]
	fn absurd_timestamps_have_no_date() {
		assert!(to_datetime(U256::MAX).is_none());
		assert_eq!(to_datetime(U256::zero()).unwrap().timestamp(), 0);
	}
}
