//! ThreadReference command set (command set 11).

use jdwp_core::commands::thread::Name;
use jdwp_core::payload::ThreadId;

use crate::application::debugger_core::{CommandChannel, CommandError, DebuggerCore};

/// ThreadReference commands, borrowed via [`DebuggerCore::threads`].
pub struct ThreadCommands<'a, C> {
    core: &'a DebuggerCore<C>,
}

impl<'a, C: CommandChannel> ThreadCommands<'a, C> {
    pub(crate) fn new(core: &'a DebuggerCore<C>) -> Self {
        Self { core }
    }

    /// The thread's name.
    ///
    /// # Errors
    ///
    /// [`CommandError::Remote`] with `INVALID_THREAD` if the thread has been
    /// collected.
    pub async fn name(&self, thread: ThreadId) -> Result<String, CommandError> {
        self.core.execute(&Name { thread }).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
