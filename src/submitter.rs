use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ethers::types::{TxHash, U256};
use serde_json::Value;
use tracing::{info, warn};

use crate::args;
use crate::contracts::ContractBinding;
use crate::error::InvokeError;
use crate::reads;
use crate::rpc::ConnectionProvider;
use crate::session::Connection;
use crate::tx_builder::{self, Resolution};

/// Gas limit sent with a structured payload, as a percentage of the
/// estimate.
pub const GAS_MARGIN_PERCENT: u64 = 120;

/// One attempt to invoke a contract operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
	pub operation: String,
	pub args: Vec<Value>,
}

impl InvocationRequest {
	pub fn new(operation: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			operation: operation.into(),
			args,
		}
	}

	/// Build a request from the free-text argument line a user typed.
	pub fn parse(operation: &str, raw_args: &str) -> Self {
		Self::new(operation.trim(), args::parse(raw_args))
	}
}

/// Where an invocation stands. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
	Pending(TxHash),
	Confirmed(TxHash),
	Failed(TxHash),
	Error(String),
}

impl InvocationOutcome {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, Self::Pending(_))
	}
}

impl fmt::Display for InvocationOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pending(h) => write!(f, "pending:{h:#x}"),
			Self::Confirmed(h) => write!(f, "confirmed:{h:#x}"),
			Self::Failed(h) => write!(f, "failed:{h:#x}"),
			Self::Error(msg) => f.write_str(msg),
		}
	}
}

/// Tuning for the submit-and-wait sequence.
#[derive(Debug, Clone)]
pub struct SubmitSettings {
	/// Blocks required on top of the transaction before it is final.
	pub confirmations: usize,
	/// Upper bound on the confirmation wait. `None` waits indefinitely.
	pub confirmation_timeout: Option<Duration>,
	/// Fields re-read after a confirmed transaction.
	pub read_fields: Vec<String>,
}

impl Default for SubmitSettings {
	fn default() -> Self {
		Self {
			confirmations: 1,
			confirmation_timeout: Some(Duration::from_secs(300)),
			read_fields: reads::DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
		}
	}
}

/// Sends operations of a bound contract and tracks them to a receipt.
///
/// Admits one submission at a time; a call made while another is in flight
/// is rejected rather than queued.
pub struct Submitter {
	provider: Arc<dyn ConnectionProvider>,
	binding: Option<ContractBinding>,
	settings: SubmitSettings,
	in_flight: AtomicBool,
	fields: Mutex<BTreeMap<String, String>>,
}

impl Submitter {
	pub fn new(
		provider: Arc<dyn ConnectionProvider>,
		binding: Option<ContractBinding>,
		settings: SubmitSettings,
	) -> Self {
		Self {
			provider,
			binding,
			settings,
			in_flight: AtomicBool::new(false),
			fields: Mutex::new(BTreeMap::new()),
		}
	}

	/// Last values read by [`Submitter::refresh_reads`].
	pub fn cached_reads(&self) -> BTreeMap<String, String> {
		self.fields.lock().map(|f| f.clone()).unwrap_or_default()
	}

	/// Re-read the display fields and cache them. Never fails: fields that
	/// cannot be read are set to the unavailable sentinel.
	pub async fn refresh_reads(&self) -> Option<BTreeMap<String, String>> {
		let binding = self.binding.as_ref()?;
		let values =
			reads::refresh(self.provider.as_ref(), binding, &self.settings.read_fields).await;
		if let Ok(mut cache) = self.fields.lock() {
			cache.clone_from(&values);
		}
		Some(values)
	}

	/// Invoke `request` from the connection's account.
	///
	/// `notify` sees every outcome in order: at most one `Pending`, then
	/// exactly one terminal outcome, which is also returned.
	pub async fn invoke<F>(
		&self,
		connection: &Connection,
		request: &InvocationRequest,
		mut notify: F,
	) -> InvocationOutcome
	where
		F: FnMut(&InvocationOutcome) + Send,
	{
		let outcome = match self.try_invoke(connection, request, &mut notify).await {
			Ok(outcome) => outcome,
			Err(e) => {
				warn!(operation = %request.operation, error = %e, "invocation failed");
				InvocationOutcome::Error(e.to_string())
			}
		};
		notify(&outcome);
		outcome
	}

	async fn try_invoke<F>(
		&self,
		connection: &Connection,
		request: &InvocationRequest,
		notify: &mut F,
	) -> Result<InvocationOutcome, InvokeError>
	where
		F: FnMut(&InvocationOutcome) + Send,
	{
		let binding = self
			.binding
			.as_ref()
			.ok_or_else(|| InvokeError::precondition("Contract not initialized"))?;
		let from = connection
			.account
			.ok_or_else(|| InvokeError::precondition("Connect a wallet to send transactions"))?;
		let name = request.operation.as_str();
		if name.is_empty() {
			return Err(InvokeError::precondition("Provide a method name to call"));
		}
		let function = binding
			.interface
			.operation(name, request.args.len())
			.ok_or_else(|| {
				InvokeError::precondition(format!("Method \"{name}\" not found on contract ABI."))
			})?;

		let _guard = InFlight::acquire(&self.in_flight).ok_or_else(|| {
			InvokeError::precondition("Another transaction is still pending; wait for it to finish")
		})?;

		let tx = match tx_builder::resolve(binding, function, &request.args, from)? {
			Resolution::StructuredPayload(mut tx) => {
				let estimate = self
					.provider
					.estimate_gas(&tx)
					.await
					.map_err(|e| InvokeError::Estimation(e.to_string()))?;
				let limit = gas_limit(estimate);
				info!(operation = name, %estimate, %limit, "gas estimated");
				tx.set_gas(limit);
				tx
			}
			Resolution::DirectCall(tx) => {
				info!(operation = name, "sending direct call, gas left to the provider");
				tx
			}
		};

		let tx_hash = self
			.provider
			.send_transaction(tx)
			.await
			.map_err(|e| InvokeError::Submission(e.to_string()))?;
		info!(operation = name, tx_hash = %format!("{tx_hash:#x}"), "transaction submitted");
		notify(&InvocationOutcome::Pending(tx_hash));

		let confirmation = self.await_confirmation(tx_hash).await?;
		if !confirmation.succeeded() {
			warn!(tx_hash = %format!("{tx_hash:#x}"), status = ?confirmation.status, "transaction failed");
			return Ok(InvocationOutcome::Failed(confirmation.tx_hash));
		}

		info!(tx_hash = %format!("{tx_hash:#x}"), "transaction confirmed");
		self.refresh_reads().await;
		Ok(InvocationOutcome::Confirmed(confirmation.tx_hash))
	}

	async fn await_confirmation(
		&self,
		tx_hash: TxHash,
	) -> Result<crate::rpc::Confirmation, InvokeError> {
		let wait = self
			.provider
			.wait_for_confirmation(tx_hash, self.settings.confirmations);
		let result = match self.settings.confirmation_timeout {
			Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
				InvokeError::Confirmation {
					tx_hash,
					reason: format!("no receipt after {}s", limit.as_secs()),
				}
			})?,
			None => wait.await,
		};

		match result {
			Ok(Some(confirmation)) => Ok(confirmation),
			Ok(None) => Err(InvokeError::Confirmation {
				tx_hash,
				reason: "dropped from the mempool".into(),
			}),
			Err(e) => Err(InvokeError::Confirmation {
				tx_hash,
				reason: e.to_string(),
			}),
		}
	}
}

/// Scale a gas estimate by [`GAS_MARGIN_PERCENT`] in 256-bit integer
/// arithmetic, saturating at the maximum.
pub fn gas_limit(estimate: U256) -> U256 {
	estimate
		.checked_mul(U256::from(GAS_MARGIN_PERCENT))
		.map(|scaled| scaled / U256::from(100u64))
		.unwrap_or(U256::MAX)
}

/// Holds the submitter's in-flight flag; releases it on drop, whatever
/// path the invocation took.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
	fn acquire(flag: &'a AtomicBool) -> Option<Self> {
		flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| Self(flag))
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gas_limit_adds_twenty_percent() {
		assert_eq!(gas_limit(U256::from(100_000u64)), U256::from(120_000u64));
		assert_eq!(gas_limit(U256::from(21_001u64)), U256::from(25_201u64));
		assert_eq!(gas_limit(U256::zero()), U256::zero());
	}

	#[test]
	fn gas_limit_is_exact_for_large_values() {
		let big = U256::from_dec_str("123456789012345678901234567890").unwrap();
		let expected = U256::from_dec_str("148148146814814814681481481468").unwrap();
		assert_eq!(gas_limit(big), expected);
		assert_eq!(gas_limit(U256::MAX), U256::MAX);
	}

	#[test]
	fn in_flight_flag_is_exclusive() {
		let flag = AtomicBool::new(false);
		let first = InFlight::acquire(&flag);
		assert!(first.is_some());
		assert!(InFlight::acquire(&flag).is_none());
		drop(first);
		assert!(InFlight::acquire(&flag).is_some());
	}

	#[test]
	fn outcome_rendering() {
		let h = TxHash::repeat_byte(0xab);
		let hex = format!("0x{}", "ab".repeat(32));
		assert_eq!(InvocationOutcome::Pending(h).to_string(), format!("pending:{hex}"));
		assert_eq!(InvocationOutcome::Confirmed(h).to_string(), format!("confirmed:{hex}"));
		assert_eq!(InvocationOutcome::Failed(h).to_string(), format!("failed:{hex}"));
		assert_eq!(InvocationOutcome::Error("boom".into()).to_string(), "boom");
		assert!(!InvocationOutcome::Pending(h).is_terminal());
		assert!(InvocationOutcome::Failed(h).is_terminal());
	}

	#[test]
	fn request_parses_argument_line() {
		let req = InvocationRequest::parse(" addRecord ", r#""QmDoc", 'Alice'"#);
		assert_eq!(req.operation, "addRecord");
		assert_eq!(req.args, vec![Value::from("QmDoc"), Value::from("Alice")]);
	}
}
