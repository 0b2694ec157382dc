use std::time::Duration;

use anyhow::{anyhow, Result};
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TxHash, U256};
use tokio::sync::mpsc;
use tracing::debug;

use crate::session::{Subscription, WalletEvent};

/// Terminal status of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
	pub tx_hash: TxHash,
	/// Receipt status: 1 for success, 0 for a reverted execution. `None` for
	/// pre-Byzantium receipts that carry no status.
	pub status: Option<u64>,
}

impl Confirmation {
	pub fn succeeded(&self) -> bool {
		self.status == Some(1)
	}

	fn from_receipt(receipt: &TransactionReceipt) -> Self {
		Self {
			tx_hash: receipt.transaction_hash,
			status: receipt.status.map(|s| s.as_u64()),
		}
	}
}

/// Everything the dashboard needs from the wallet and the network.
///
/// Accounts are held by the wallet or node behind the endpoint; sending a
/// transaction asks it to sign with the `from` account, so no key material
/// ever passes through this crate.
#[async_trait::async_trait]
pub trait ConnectionProvider: Send + Sync {
	/// Ask the wallet to expose its accounts. The first one is active.
	async fn request_accounts(&self) -> Result<Vec<Address>>;

	async fn chain_id(&self) -> Result<u64>;

	/// Gas the transaction would use against the latest state.
	async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256>;

	/// Hand the transaction to the wallet for signing and broadcast.
	/// Returns as soon as the network has accepted it.
	async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash>;

	/// Wait until `tx_hash` has `confirmations` blocks on top of it. `None`
	/// if the transaction disappeared from the mempool.
	async fn wait_for_confirmation(
		&self,
		tx_hash: TxHash,
		confirmations: usize,
	) -> Result<Option<Confirmation>>;

	/// Execute a read-only call and return the raw output.
	async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;

	/// Start receiving account and chain changes.
	fn subscribe(&self) -> Result<Subscription>;
}

/// JSON-RPC endpoint of a node or wallet, via ethers.
pub struct RpcClient {
	provider: Provider<Http>,
	poll_interval: Duration,
}

impl RpcClient {
	pub fn new(url: &str, poll_interval: Duration) -> Result<Self> {
		let provider = Provider::<Http>::try_from(url)
			.map_err(|e| anyhow!("invalid RPC URL {url}: {e}"))?
			.interval(poll_interval);
		Ok(Self {
			provider,
			poll_interval,
		})
	}

	pub async fn block_number(&self) -> Result<u64> {
		Ok(self.provider.get_block_number().await?.as_u64())
	}

	/// Look up a transaction's receipt. `None` while it is still pending or
	/// if the node has never seen it.
	pub async fn transaction_status(&self, tx_hash: TxHash) -> Result<Option<Confirmation>> {
		let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
		Ok(receipt.as_ref().map(Confirmation::from_receipt))
	}
}

#[async_trait::async_trait]
impl ConnectionProvider for RpcClient {
	async fn request_accounts(&self) -> Result<Vec<Address>> {
		// Plain nodes do not implement the wallet method; their unlocked
		// accounts are already exposed through eth_accounts.
		match self
			.provider
			.request::<_, Vec<Address>>("eth_requestAccounts", ())
			.await
		{
			Ok(accounts) => Ok(accounts),
			Err(e) => {
				debug!(error = %e, "eth_requestAccounts unavailable, using eth_accounts");
				Ok(self.provider.get_accounts().await?)
			}
		}
	}

	async fn chain_id(&self) -> Result<u64> {
		Ok(self.provider.get_chainid().await?.low_u64())
	}

	async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
		Ok(self.provider.estimate_gas(tx, None).await?)
	}

	async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash> {
		let pending = self.provider.send_transaction(tx, None).await?;
		Ok(pending.tx_hash())
	}

	async fn wait_for_confirmation(
		&self,
		tx_hash: TxHash,
		confirmations: usize,
	) -> Result<Option<Confirmation>> {
		let receipt = PendingTransaction::new(tx_hash, &self.provider)
			.interval(self.poll_interval)
			.confirmations(confirmations)
			.await?;
		Ok(receipt.as_ref().map(Confirmation::from_receipt))
	}

	async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
		Ok(self.provider.call(tx, None).await?)
	}

	fn subscribe(&self) -> Result<Subscription> {
		let provider = self.provider.clone();
		let interval = self.poll_interval;
		let (events, rx) = mpsc::unbounded_channel();

		// HTTP endpoints cannot push, so diff the state on every tick and
		// report what changed since the previous one.
		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			let mut accounts: Option<Vec<Address>> = None;
			let mut chain: Option<U256> = None;

			loop {
				ticker.tick().await;
				if events.is_closed() {
					break;
				}

				match provider.get_accounts().await {
					Ok(now) => {
						if let Some(changed) = observe(&mut accounts, now) {
							if events.send(WalletEvent::AccountsChanged(changed)).is_err() {
								break;
							}
						}
					}
					Err(e) => debug!(error = %e, "account poll failed"),
				}

				match provider.get_chainid().await {
					Ok(now) => {
						if let Some(changed) = observe(&mut chain, now) {
							let event = WalletEvent::ChainChanged(format!("{changed:#x}"));
							if events.send(event).is_err() {
								break;
							}
						}
					}
					Err(e) => debug!(error = %e, "chain id poll failed"),
				}
			}
		});

		Ok(Subscription::new(rx, Some(task)))
	}
}

/// Record the latest polled value. Returns it when it differs from the
/// previous one; the first observation only sets the baseline.
fn observe<T: Clone + PartialEq>(last: &mut Option<T>, now: T) -> Option<T> {
	match last.replace(now.clone()) {
		Some(prev) if prev != now => Some(now),
		_ => None,
	}
}
