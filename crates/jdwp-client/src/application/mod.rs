//! Application layer: typed debugger commands.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The transport (`jdwp-session`) moves opaque byte payloads.  This layer
//! gives those payloads meaning: it turns a call like
//! `vm.all_threads()` into a command packet, performs the round trip, and
//! parses the reply into Rust values.
//!
//! Use cases here depend on the [`CommandChannel`](debugger_core::CommandChannel)
//! trait rather than on a concrete session, so every command can be tested
//! against a mock without a socket.
//!
//! # Sub-modules
//!
//! - **`debugger_core`** – The [`DebuggerCore`](debugger_core::DebuggerCore)
//!   façade: encode, send, check the error code, decode.  Also owns the
//!   identifier width table.
//!
//! - **`vm_commands`** – The VirtualMachine command set.
//!
//! - **`thread_commands`** – The ThreadReference command set.

pub mod debugger_core;
pub mod thread_commands;
pub mod vm_commands;

pub use debugger_core::{CommandChannel, CommandError, DebuggerCore};
pub use thread_commands::ThreadCommands;
pub use vm_commands::VmCommands;
