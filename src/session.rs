use std::fmt;

use anyhow::{anyhow, Result};
use ethers::types::Address;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::rpc::ConnectionProvider;

/// The session's view of the wallet: which network it is on and which
/// account, if any, can sign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
	pub chain_id: Option<u64>,
	pub account: Option<Address>,
}

impl Connection {
	/// Whether transactions can be sent from this connection.
	pub fn can_sign(&self) -> bool {
		self.account.is_some()
	}
}

impl fmt::Display for Connection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.account {
			Some(a) => write!(f, "account {}", ethers::utils::to_checksum(&a, None))?,
			None => write!(f, "no account")?,
		}
		match self.chain_id {
			Some(id) => write!(f, " on chain {id}"),
			None => write!(f, " on unknown chain"),
		}
	}
}

/// Changes reported by the wallet between explicit actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
	/// The list of exposed accounts changed; the first one is active.
	AccountsChanged(Vec<Address>),
	/// The wallet switched networks. Carries the chain id as hex, e.g. `0x1`.
	ChainChanged(String),
}

/// Apply one wallet event to a connection.
///
/// An empty account list detaches the signer but keeps the chain id. A
/// chain id that does not parse leaves the connection unchanged.
pub fn reduce(connection: Connection, event: &WalletEvent) -> Connection {
	match event {
		WalletEvent::AccountsChanged(accounts) => Connection {
			account: accounts.first().copied(),
			..connection
		},
		WalletEvent::ChainChanged(hex_id) => match parse_chain_id(hex_id) {
			Some(id) => Connection {
				chain_id: Some(id),
				..connection
			},
			None => {
				warn!(chain_id = %hex_id, "ignoring unparseable chain id");
				connection
			}
		},
	}
}

fn parse_chain_id(s: &str) -> Option<u64> {
	let digits = s
		.strip_prefix("0x")
		.or_else(|| s.strip_prefix("0X"))
		.unwrap_or(s);
	u64::from_str_radix(digits, 16).ok()
}

/// Ask the wallet for its accounts and the current network.
pub async fn connect(provider: &dyn ConnectionProvider) -> Result<Connection> {
	let accounts = provider.request_accounts().await?;
	let account = *accounts
		.first()
		.ok_or_else(|| anyhow!("the wallet did not expose any accounts"))?;
	let chain_id = provider.chain_id().await?;
	info!(account = %format!("{account:#x}"), chain_id, "wallet connected");
	Ok(Connection {
		chain_id: Some(chain_id),
		account: Some(account),
	})
}

// -- Subscriptions --

/// A live feed of wallet events. Dropping it unsubscribes: the producing
/// task, if any, is aborted and the channel closes.
pub struct Subscription {
	events: mpsc::UnboundedReceiver<WalletEvent>,
	task: Option<JoinHandle<()>>,
}

impl Subscription {
	pub fn new(events: mpsc::UnboundedReceiver<WalletEvent>, task: Option<JoinHandle<()>>) -> Self {
		Self { events, task }
	}

	/// Wait for the next event. `None` once the producer has gone away.
	pub async fn next(&mut self) -> Option<WalletEvent> {
		self.events.recv().await
	}

	#[cfg(test)]
	pub(crate) fn take_task(&mut self) -> Option<JoinHandle<()>> {
		self.task.take()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.events.close();
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn addr(byte: u8) -> Address {
		Address::repeat_byte(byte)
	}

	#[test]
	fn accounts_changed_selects_first() {
		let c = Connection {
			chain_id: Some(1),
			account: Some(addr(1)),
		};
		let c = reduce(c, &WalletEvent::AccountsChanged(vec![addr(2), addr(3)]));
		assert_eq!(c.account, Some(addr(2)));
		assert_eq!(c.chain_id, Some(1));
	}

	#[test]
	fn no_accounts_detaches_signer() {
		let c = Connection {
			chain_id: Some(5),
			account: Some(addr(1)),
		};
		let c = reduce(c, &WalletEvent::AccountsChanged(vec![]));
		assert!(!c.can_sign());
		assert_eq!(c.chain_id, Some(5));
	}

	#[test]
	fn chain_changed_parses_hex() {
		let c = reduce(Connection::default(), &WalletEvent::ChainChanged("0xaa36a7".into()));
		assert_eq!(c.chain_id, Some(11_155_111));
	}

	#[test]
	fn bad_chain_id_is_ignored() {
		let before = Connection {
			chain_id: Some(1),
			account: None,
		};
		let after = reduce(before.clone(), &WalletEvent::ChainChanged("0xnothex".into()));
		assert_eq!(after, before);
	}

	#[test]
	fn events_apply_in_order() {
		let events = [
			WalletEvent::ChainChanged("0x1".into()),
			WalletEvent::AccountsChanged(vec![addr(7)]),
			WalletEvent::ChainChanged("0x89".into()),
			WalletEvent::AccountsChanged(vec![]),
			WalletEvent::AccountsChanged(vec![addr(9)]),
		];
		let c = events.iter().fold(Connection::default(), reduce);
		assert_eq!(
			c,
			Connection {
				chain_id: Some(137),
				account: Some(addr(9)),
			}
		);
	}

	#[tokio::test]
	async fn dropping_subscription_closes_channel() {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut sub = Subscription::new(rx, None);

		tx.send(WalletEvent::ChainChanged("0x1".into())).unwrap();
		assert_eq!(sub.next().await, Some(WalletEvent::ChainChanged("0x1".into())));

		drop(sub);
		assert!(tx.is_closed());
		assert!(tx.send(WalletEvent::AccountsChanged(vec![])).is_err());
	}

	#[test]
	fn display_mentions_account_and_chain() {
		let c = Connection {
			chain_id: Some(31337),
			account: None,
		};
		assert_eq!(c.to_string(), "no account on chain 31337");
	}
}
