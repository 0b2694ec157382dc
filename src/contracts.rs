use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ethers::abi::{Abi, Function, StateMutability};
use ethers::types::Address;
use serde::Deserialize;

use crate::validate;

/// Interface description of the Verification contract, compiled into the
/// binary so the tool works without an ABI file on disk.
const VERIFICATION_ARTIFACT: &str = include_str!("../abi/Verification.json");

/// Whether an operation can change contract state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
	Read,
	Write,
}

/// A named, versioned contract interface: the set of operations a binding
/// can dispatch to by name.
#[derive(Debug, Clone)]
pub struct ContractInterface {
	pub name: String,
	pub version: String,
	abi: Abi,
}

/// Accepted on-disk shapes: a bare ABI array, or a build artifact that
/// wraps it together with the contract name.
#[derive(Deserialize)]
#[serde(untagged)]
enum InterfaceFile {
	Artifact {
		#[serde(rename = "contractName")]
		contract_name: String,
		#[serde(default)]
		version: Option<String>,
		abi: Abi,
	},
	Bare(Abi),
}

impl ContractInterface {
	/// The built-in Verification contract interface.
	pub fn verification() -> Result<Self> {
		Self::from_json(VERIFICATION_ARTIFACT, "Verification")
	}

	/// Parse an interface description. `fallback_name` is used when the
	/// document is a bare ABI array and carries no name of its own.
	pub fn from_json(json: &str, fallback_name: &str) -> Result<Self> {
		let file: InterfaceFile =
			serde_json::from_str(json).context("invalid contract interface description")?;
		Ok(match file {
			InterfaceFile::Artifact {
				contract_name,
				version,
				abi,
			} => Self {
				name: contract_name,
				version: version.unwrap_or_else(|| "unversioned".into()),
				abi,
			},
			InterfaceFile::Bare(abi) => Self {
				name: fallback_name.to_owned(),
				version: "unversioned".into(),
				abi,
			},
		})
	}

	/// Load an interface description from a JSON file. A bare ABI is named
	/// after the file stem.
	pub fn load(path: &Path) -> Result<Self> {
		let json = std::fs::read_to_string(path)
			.with_context(|| format!("could not read ABI file {}", path.display()))?;
		let stem = path
			.file_stem()
			.and_then(|s| s.to_str())
			.unwrap_or("Contract");
		Self::from_json(&json, stem)
	}

	/// True if any overload of `name` exists.
	pub fn has_operation(&self, name: &str) -> bool {
		self.abi.functions.contains_key(name)
	}

	/// Resolve `name` to a function. For overloaded names the overload
	/// taking `arity` arguments is preferred, falling back to the first one.
	pub fn operation(&self, name: &str, arity: usize) -> Option<&Function> {
		let overloads = self.abi.functions.get(name)?;
		overloads
			.iter()
			.find(|f| f.inputs.len() == arity)
			.or_else(|| overloads.first())
	}

	/// All operations, ordered by name.
	pub fn operations(&self) -> impl Iterator<Item = &Function> {
		self.abi.functions.values().flatten()
	}
}

/// Read or write, derived from the function's declared state mutability.
pub fn mutability(function: &Function) -> Mutability {
	match function.state_mutability {
		StateMutability::Pure | StateMutability::View => Mutability::Read,
		StateMutability::NonPayable | StateMutability::Payable => Mutability::Write,
	}
}

/// Human-readable signature, e.g. `addRecord(string,string)`.
pub fn signature(function: &Function) -> String {
	let params: Vec<String> = function.inputs.iter().map(|p| p.kind.to_string()).collect();
	format!("{}({})", function.name, params.join(","))
}

/// An interface bound to a deployed address.
#[derive(Debug, Clone)]
pub struct ContractBinding {
	pub address: Address,
	pub interface: Arc<ContractInterface>,
}

impl ContractBinding {
	pub fn new(address: Address, interface: Arc<ContractInterface>) -> Self {
		Self { address, interface }
	}

	/// Bind `interface` to a configured address string. `None` means no
	/// contract is configured, which is not an error; a malformed address is.
	pub fn from_config(
		address: Option<&str>,
		interface: Arc<ContractInterface>,
	) -> Result<Option<Self>> {
		let Some(raw) = address.map(str::trim).filter(|s| !s.is_empty()) else {
			return Ok(None);
		};
		if !validate::is_address(raw) {
			return Err(anyhow!("invalid contract address: {raw}"));
		}
		let address: Address = raw
			.parse()
			.map_err(|e| anyhow!("invalid contract address {raw}: {e}"))?;
		Ok(Some(Self::new(address, interface)))
	}
}
