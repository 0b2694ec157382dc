use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
	name = "docverify",
	about = "Keyless CLI dashboard for the document Verification contract.",
	version
)]
pub struct Cli {
	/// Override RPC endpoint URL.
	#[arg(long, global = true)]
	pub rpc_url: Option<String>,

	/// Override the deployed contract address.
	#[arg(long, global = true)]
	pub contract: Option<String>,

	/// Contract interface (ABI JSON or build artifact) to use instead of
	/// the built-in one.
	#[arg(long, global = true)]
	pub abi: Option<PathBuf>,

	/// Override the active account address.
	#[arg(long, global = true)]
	pub account: Option<String>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Ask the wallet for its accounts and remember the active one.
	Connect,

	/// Show connection and configuration.
	Status,

	/// Read the contract's dashboard fields.
	Reads,

	/// List the operations on the contract interface.
	Methods,

	/// Send a transaction to any write method on the contract.
	Send {
		/// Method name, exactly as in the ABI.
		method: String,

		/// Arguments: comma-separated values or a JSON array.
		#[arg(default_value = "")]
		args: String,
	},

	/// Call a read-only method and print what it returns.
	Call {
		/// Method name, exactly as in the ABI.
		method: String,

		/// Arguments: comma-separated values or a JSON array.
		#[arg(default_value = "")]
		args: String,
	},

	/// Add and verify student document records.
	Record {
		#[command(subcommand)]
		command: RecordCommand,
	},

	/// Check transaction status on-chain.
	Tx {
		#[command(subcommand)]
		command: TxCommand,
	},

	/// Follow account and network changes until interrupted.
	Watch,
}

// -- Record subcommands --

#[derive(Subcommand)]
pub enum RecordCommand {
	/// Anchor a document hash with a student's name.
	Add {
		/// Document hash (IPFS CID or 0x-prefixed hex).
		#[arg(long)]
		hash: String,

		/// Student name.
		#[arg(long)]
		name: String,
	},

	/// Look up who issued a document and when.
	Verify {
		/// Document hash (IPFS CID or 0x-prefixed hex).
		#[arg(long)]
		hash: String,
	},
}

// -- Tx subcommands --

#[derive(Subcommand)]
pub enum TxCommand {
	/// Check confirmation status of a transaction.
	Status {
		/// Transaction hash (0x-prefixed).
		tx_hash: String,
	},
}
