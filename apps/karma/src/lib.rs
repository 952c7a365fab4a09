//! # karma
//!
//! The karma bot application: everything around the ledger in `karma-core`.
//!
//! - `chat` - command routing, reply text and the message handler
//! - `config` - TOML configuration with CLI overrides
//! - `storage` - opening and saving a ledger for the configured backend
//! - `api` - HTTP server (axum)
//! - `cli` - command-line interface (clap)

pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod storage;
