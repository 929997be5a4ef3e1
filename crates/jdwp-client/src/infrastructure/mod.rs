//! Infrastructure layer for the client application.
//!
//! Contains file-system adapters.  The network side lives in the
//! `jdwp-session` crate, which this layer hands a
//! [`SessionConfig`](jdwp_session::SessionConfig) built from the config file.
//!
//! **Dependency rule**: this layer may depend on `application`, `jdwp_core`
//! and `jdwp_session`, but MUST NOT be imported by the `application` layer.

pub mod storage;
