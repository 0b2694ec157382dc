pub mod args;
pub mod cli;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod logging;
pub mod reads;
pub mod records;
pub mod rpc;
pub mod session;
pub mod submitter;
pub mod tx_builder;
pub mod validate;
