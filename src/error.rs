use ethers::types::TxHash;
use thiserror::Error;

/// Everything that can stop a contract invocation before it reaches a
/// receipt. A mined transaction with a non-success status is not an error:
/// it is reported as a failed outcome carrying its hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
	/// Checked locally; no network call was made.
	#[error("{0}")]
	Precondition(String),

	/// The arguments could not be encoded for the operation's parameters.
	#[error("invalid arguments for \"{operation}\": {reason}")]
	Arguments { operation: String, reason: String },

	#[error("gas estimation failed: {0}")]
	Estimation(String),

	#[error("transaction rejected: {0}")]
	Submission(String),

	/// Submitted, but no receipt could be obtained.
	#[error("transaction {tx_hash:#x} was not confirmed: {reason}")]
	Confirmation { tx_hash: TxHash, reason: String },
}

impl InvokeError {
	pub fn precondition(msg: impl Into<String>) -> Self {
		Self::Precondition(msg.into())
	}
}

/// Why a JSON argument value does not fit an ABI parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
	#[error("expected {expected} arguments, got {got}")]
	Arity { expected: usize, got: usize },

	#[error("argument {index}: expected {expected}, got {got}")]
	Mismatch {
		index: usize,
		expected: String,
		got: String,
	},
}
