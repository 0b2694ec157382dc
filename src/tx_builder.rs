use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Function, Param, ParamType, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, I256, U256};
use serde_json::Value;
use tracing::debug;

use crate::contracts::{self, ContractBinding, Mutability};
use crate::error::{CoerceError, InvokeError};
use crate::validate;

/// How an invocation will be sent.
#[derive(Debug, Clone)]
pub enum Resolution {
	/// Arguments type-checked against a state-changing operation. The caller
	/// estimates gas and sets an explicit limit before sending.
	StructuredPayload(TypedTransaction),
	/// Read-only operation, or arguments that only encode leniently. Sent
	/// without a gas limit so the provider fills it in.
	DirectCall(TypedTransaction),
}

impl Resolution {
	pub fn is_structured(&self) -> bool {
		matches!(self, Self::StructuredPayload(_))
	}

	pub fn transaction(&self) -> &TypedTransaction {
		match self {
			Self::StructuredPayload(tx) | Self::DirectCall(tx) => tx,
		}
	}
}

/// Build the unsigned transaction for `function` called with `args`.
///
/// Strict coercion is tried first; if the operation is read-only or strict
/// coercion fails, the arguments are re-encoded from their textual form.
/// Only when both fail is an error returned, and no network call is made
/// either way.
pub fn resolve(
	binding: &ContractBinding,
	function: &Function,
	args: &[Value],
	from: Address,
) -> Result<Resolution, InvokeError> {
	if contracts::mutability(function) == Mutability::Write {
		match strict_tokens(function, args) {
			Ok(tokens) => match function.encode_input(&tokens) {
				Ok(data) => {
					return Ok(Resolution::StructuredPayload(build_call(binding, Some(from), data)));
				}
				Err(e) => debug!(operation = %function.name, error = %e, "strict encoding failed"),
			},
			Err(e) => debug!(operation = %function.name, error = %e, "strict argument check failed"),
		}
	}

	let tokens = lenient_tokens(function, args)?;
	let data = function
		.encode_input(&tokens)
		.map_err(|e| arguments_error(function, e.to_string()))?;
	Ok(Resolution::DirectCall(build_call(binding, Some(from), data)))
}

/// Tokenize `args` for `function`, strictly if possible and leniently
/// otherwise. Used by read-only calls, which have no gas to estimate.
pub fn tokenize(function: &Function, args: &[Value]) -> Result<Vec<Token>, InvokeError> {
	match strict_tokens(function, args) {
		Ok(tokens) => Ok(tokens),
		Err(_) => lenient_tokens(function, args),
	}
}

/// An unsigned call to the bound contract carrying `data`.
pub fn build_call(binding: &ContractBinding, from: Option<Address>, data: Vec<u8>) -> TypedTransaction {
	let mut req = TransactionRequest::new().to(binding.address).data(data);
	if let Some(from) = from {
		req = req.from(from);
	}
	req.into()
}

// -- Strict coercion --

fn strict_tokens(function: &Function, args: &[Value]) -> Result<Vec<Token>, CoerceError> {
	coerce_args(&function.inputs, args)
}

/// Check every JSON value against its parameter type. Nothing is guessed:
/// numbers must be integers for integer types, hex strings must have the
/// exact width, and strings are only accepted where the type is textual.
pub fn coerce_args(params: &[Param], args: &[Value]) -> Result<Vec<Token>, CoerceError> {
	if params.len() != args.len() {
		return Err(CoerceError::Arity {
			expected: params.len(),
			got: args.len(),
		});
	}
	params
		.iter()
		.zip(args)
		.enumerate()
		.map(|(index, (param, value))| coerce(&param.kind, value, index))
		.collect()
}

fn coerce(kind: &ParamType, value: &Value, index: usize) -> Result<Token, CoerceError> {
	let token = match (kind, value) {
		(ParamType::Address, Value::String(s)) if validate::is_address(s) => {
			s.parse::<Address>().ok().map(Token::Address)
		}
		(ParamType::Bool, Value::Bool(b)) => Some(Token::Bool(*b)),
		(ParamType::String, Value::String(s)) => Some(Token::String(s.clone())),
		(ParamType::Bytes, Value::String(s)) => decode_hex(s).map(Token::Bytes),
		(ParamType::FixedBytes(len), Value::String(s)) => decode_hex(s)
			.filter(|bytes| bytes.len() == *len)
			.map(Token::FixedBytes),
		(ParamType::Uint(bits), value) => unsigned(value)
			.filter(|n| n.bits() <= *bits)
			.map(Token::Uint),
		(ParamType::Int(bits), value) => signed(value)
			.filter(|n| fits_signed(*n, *bits))
			.map(|n| Token::Int(n.into_raw())),
		(ParamType::Array(inner), Value::Array(items)) => items
			.iter()
			.map(|item| coerce(inner, item, index))
			.collect::<Result<Vec<_>, _>>()
			.map(Token::Array)
			.ok(),
		(ParamType::FixedArray(inner, len), Value::Array(items)) if items.len() == *len => items
			.iter()
			.map(|item| coerce(inner, item, index))
			.collect::<Result<Vec<_>, _>>()
			.map(Token::FixedArray)
			.ok(),
		(ParamType::Tuple(kinds), Value::Array(items)) if items.len() == kinds.len() => kinds
			.iter()
			.zip(items)
			.map(|(k, item)| coerce(k, item, index))
			.collect::<Result<Vec<_>, _>>()
			.map(Token::Tuple)
			.ok(),
		_ => None,
	};

	token.ok_or_else(|| CoerceError::Mismatch {
		index,
		expected: kind.to_string(),
		got: describe(value),
	})
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
	hex::decode(s.strip_prefix("0x")?).ok()
}

fn unsigned(value: &Value) -> Option<U256> {
	match value {
		Value::Number(n) => n.as_u64().map(U256::from),
		Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
			U256::from_dec_str(s).ok()
		}
		_ => None,
	}
}

fn signed(value: &Value) -> Option<I256> {
	match value {
		Value::Number(n) => n.as_i64().map(I256::from),
		Value::String(s) => {
			let digits = s.strip_prefix('-').unwrap_or(s);
			if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
				return None;
			}
			I256::from_dec_str(s).ok()
		}
		_ => None,
	}
}

/// Two's complement range check: `-2^(bits-1) <= n < 2^(bits-1)`.
fn fits_signed(n: I256, bits: usize) -> bool {
	if bits == 0 || bits > 256 {
		return false;
	}
	let bound = U256::one() << (bits - 1);
	if n.is_negative() {
		n.unsigned_abs() <= bound
	} else {
		n.into_raw() < bound
	}
}

fn describe(value: &Value) -> String {
	match value {
		Value::Null => "null".into(),
		Value::Bool(b) => format!("bool {b}"),
		Value::Number(n) => format!("number {n}"),
		Value::String(s) => format!("string {s:?}"),
		Value::Array(items) => format!("array of {}", items.len()),
		Value::Object(_) => "object".into(),
	}
}

// -- Lenient encoding --

fn lenient_tokens(function: &Function, args: &[Value]) -> Result<Vec<Token>, InvokeError> {
	if function.inputs.len() != args.len() {
		let err = CoerceError::Arity {
			expected: function.inputs.len(),
			got: args.len(),
		};
		return Err(arguments_error(function, err.to_string()));
	}
	function
		.inputs
		.iter()
		.zip(args)
		.enumerate()
		.map(|(index, (param, value))| {
			LenientTokenizer::tokenize(&param.kind, &as_text(value))
				.map_err(|e| arguments_error(function, format!("argument {index}: {e}")))
		})
		.collect()
}

/// The text form the lenient tokenizer understands: strings as-is,
/// everything else as JSON.
fn as_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn arguments_error(function: &Function, reason: String) -> InvokeError {
	InvokeError::Arguments {
		operation: function.name.clone(),
		reason,
	}
}
