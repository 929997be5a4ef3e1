//! # jdwp-session
//!
//! The transport half of the JDWP client: one [`Session`] owns one
//! connection to a target VM and lets any number of tasks issue commands
//! over it at the same time.
//!
//! # How a command travels (for beginners)
//!
//! ```text
//!  caller task ──submit──▶ [correlation table] ─┐
//!       │                                        │ id → reply slot
//!       └──────────▶ [submission queue] ──▶ outbound loop ──▶ socket
//!                                                                │
//!  caller task ◀──reply slot── inbound loop ◀────────────────────┘
//!                                  │
//!                                  └──▶ [unsolicited queue] ──▶ event consumer
//! ```
//!
//! 1. The caller gets a fresh id, registers a reply slot under that id, and
//!    pushes the request onto the submission queue.
//! 2. The outbound loop is the only writer.  It writes requests in the
//!    order they were queued.
//! 3. The inbound loop is the only reader.  A reply is handed to the slot
//!    registered under its id; a command packet (an event from the VM) goes
//!    to the unsolicited queue.
//! 4. Any I/O or framing error fails the session.  Both loops stop, and
//!    every caller still waiting gets [`SessionError::ChannelClosed`].

pub mod config;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{ReplySlot, Session, SessionState, Transport};
