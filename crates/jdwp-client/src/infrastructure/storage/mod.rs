//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file, fills in
//! defaults for anything missing, and converts the result into the
//! transport's [`SessionConfig`](jdwp_session::SessionConfig).

pub mod config;
