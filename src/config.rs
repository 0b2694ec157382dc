use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::reads;
use crate::submitter::SubmitSettings;

/// Environment variable that overrides the configured contract address.
pub const CONTRACT_ADDRESS_ENV: &str = "DOCVERIFY_CONTRACT_ADDRESS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub network: NetworkConfig,
	pub contract: ContractConfig,
	pub account: AccountConfig,
	pub submit: SubmitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
	pub rpc_url: String,
	/// How often to poll for receipts and wallet changes.
	pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
	/// Deployed Verification contract. Without it the dashboard still
	/// starts, but every contract action reports that it is not set.
	pub address: Option<String>,
	/// Interface description to use instead of the built-in one.
	pub abi: Option<PathBuf>,
	pub read_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
	pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
	pub confirmations: usize,
	/// Give up waiting for a receipt after this long. 0 waits forever.
	pub confirmation_timeout_secs: u64,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			rpc_url: "http://127.0.0.1:8545".into(),
			poll_interval_secs: 4,
		}
	}
}

impl Default for ContractConfig {
	fn default() -> Self {
		Self {
			address: None,
			abi: None,
			read_fields: reads::DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
		}
	}
}

impl Default for SubmitConfig {
	fn default() -> Self {
		Self {
			confirmations: 1,
			confirmation_timeout_secs: 300,
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.docverify/).
	pub fn dir() -> Result<PathBuf> {
		dirs::home_dir()
			.map(|home| home.join(".docverify"))
			.ok_or_else(|| anyhow!("could not determine home directory"))
	}

	/// Path to the config file.
	pub fn path() -> Result<PathBuf> {
		Ok(Self::dir()?.join("config.toml"))
	}

	/// Load config from disk, falling back to defaults if no file exists.
	/// The contract address environment variable wins over the file.
	pub fn load() -> Result<Self> {
		let path = Self::path()?;
		let mut config = if path.exists() {
			let content = std::fs::read_to_string(&path)?;
			toml::from_str(&content)?
		} else {
			Self::default()
		};
		config.apply_env(std::env::var(CONTRACT_ADDRESS_ENV).ok());
		Ok(config)
	}

	/// Persist the current config to disk, creating the directory if needed.
	pub fn save(&self) -> Result<()> {
		let path = Self::path()?;
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&path, toml::to_string_pretty(self)?)?;
		Ok(())
	}

	fn apply_env(&mut self, contract_address: Option<String>) {
		if let Some(addr) = contract_address.filter(|a| !a.trim().is_empty()) {
			self.contract.address = Some(addr);
		}
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.network.poll_interval_secs.max(1))
	}

	/// Submitter settings derived from the `[submit]` and `[contract]`
	/// sections.
	pub fn submit_settings(&self) -> SubmitSettings {
		let timeout = match self.submit.confirmation_timeout_secs {
			0 => None,
			secs => Some(Duration::from_secs(secs)),
		};
		SubmitSettings {
			confirmations: self.submit.confirmations.max(1),
			confirmation_timeout: timeout,
			read_fields: self.contract.read_fields.clone(),
		}
	}
}
