//! In-memory stand-in for a wallet-backed JSON-RPC endpoint.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use docverify_cli::contracts::{ContractBinding, ContractInterface};
use docverify_cli::rpc::{Confirmation, ConnectionProvider};
use docverify_cli::session::{Subscription, WalletEvent};
use ethers::abi::{Function, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TxHash, U256};
use tokio::sync::{mpsc, Notify};

pub const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub fn account() -> Address {
	ACCOUNT.parse().unwrap()
}

pub fn tx_hash() -> TxHash {
	TxHash::repeat_byte(0xab)
}

pub fn binding() -> ContractBinding {
	let iface = Arc::new(ContractInterface::verification().unwrap());
	ContractBinding::new(CONTRACT.parse().unwrap(), iface)
}

pub fn function(name: &str) -> Function {
	binding().interface.operations().find(|f| f.name == name).unwrap().clone()
}

#[derive(Default)]
pub struct Counters {
	pub accounts: AtomicUsize,
	pub chain_id: AtomicUsize,
	pub estimate: AtomicUsize,
	pub send: AtomicUsize,
	pub wait: AtomicUsize,
	pub call: AtomicUsize,
}

pub struct MockProvider {
	pub accounts: Vec<Address>,
	pub chain_id: u64,
	pub estimate: Result<U256, String>,
	pub send_error: Option<String>,
	/// Receipt status to report; `None` reports the transaction as dropped.
	pub receipt_status: Option<u64>,
	/// When set, confirmation waits until the gate is notified.
	pub wait_gate: Option<Arc<Notify>>,
	responses: HashMap<[u8; 4], Result<Bytes, String>>,
	pub counters: Counters,
	pub sent: Mutex<Vec<TypedTransaction>>,
	events: Mutex<Option<mpsc::UnboundedSender<WalletEvent>>>,
}

impl MockProvider {
	pub fn new() -> Self {
		Self {
			accounts: vec![account()],
			chain_id: 31337,
			estimate: Ok(U256::from(100_000u64)),
			send_error: None,
			receipt_status: Some(1),
			wait_gate: None,
			responses: HashMap::new(),
			counters: Counters::default(),
			sent: Mutex::new(Vec::new()),
			events: Mutex::new(None),
		}
	}

	/// Answer calls to `name` with ABI-encoded `outputs`.
	pub fn respond(mut self, name: &str, outputs: &[Token]) -> Self {
		let f = function(name);
		self.responses
			.insert(f.short_signature(), Ok(Bytes::from(ethers::abi::encode(outputs))));
		self
	}

	/// Make calls to `name` revert.
	pub fn revert(mut self, name: &str) -> Self {
		let f = function(name);
		self.responses
			.insert(f.short_signature(), Err(format!("execution reverted: {name}")));
		self
	}

	pub fn total_calls(&self) -> usize {
		let c = &self.counters;
		[&c.accounts, &c.chain_id, &c.estimate, &c.send, &c.wait, &c.call]
			.iter()
			.map(|n| n.load(Ordering::SeqCst))
			.sum()
	}

	pub fn count(counter: &AtomicUsize) -> usize {
		counter.load(Ordering::SeqCst)
	}

	pub fn last_sent(&self) -> Option<TypedTransaction> {
		self.sent.lock().unwrap().last().cloned()
	}

	/// Push a wallet event to the current subscriber. False if nobody is
	/// subscribed any more.
	pub fn emit(&self, event: WalletEvent) -> bool {
		match self.events.lock().unwrap().as_ref() {
			Some(tx) => tx.send(event).is_ok(),
			None => false,
		}
	}
}

#[async_trait::async_trait]
impl ConnectionProvider for MockProvider {
	async fn request_accounts(&self) -> Result<Vec<Address>> {
		self.counters.accounts.fetch_add(1, Ordering::SeqCst);
		Ok(self.accounts.clone())
	}

	async fn chain_id(&self) -> Result<u64> {
		self.counters.chain_id.fetch_add(1, Ordering::SeqCst);
		Ok(self.chain_id)
	}

	async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256> {
		self.counters.estimate.fetch_add(1, Ordering::SeqCst);
		self.estimate.clone().map_err(|e| anyhow!(e))
	}

	async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash> {
		self.counters.send.fetch_add(1, Ordering::SeqCst);
		if let Some(e) = &self.send_error {
			return Err(anyhow!(e.clone()));
		}
		self.sent.lock().unwrap().push(tx);
		Ok(tx_hash())
	}

	async fn wait_for_confirmation(
		&self,
		tx_hash: TxHash,
		_confirmations: usize,
	) -> Result<Option<Confirmation>> {
		self.counters.wait.fetch_add(1, Ordering::SeqCst);
		if let Some(gate) = &self.wait_gate {
			gate.notified().await;
		}
		Ok(self.receipt_status.map(|status| Confirmation {
			tx_hash,
			status: Some(status),
		}))
	}

	async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
		self.counters.call.fetch_add(1, Ordering::SeqCst);
		let data = tx.data().ok_or_else(|| anyhow!("call without data"))?;
		let selector: [u8; 4] = data
			.get(..4)
			.and_then(|s| s.try_into().ok())
			.ok_or_else(|| anyhow!("call data too short"))?;
		match self.responses.get(&selector) {
			Some(Ok(bytes)) => Ok(bytes.clone()),
			Some(Err(e)) => Err(anyhow!(e.clone())),
			None => Err(anyhow!("execution reverted")),
		}
	}

	fn subscribe(&self) -> Result<Subscription> {
		let (tx, rx) = mpsc::unbounded_channel();
		*self.events.lock().unwrap() = Some(tx);
		Ok(Subscription::new(rx, None))
	}
}
