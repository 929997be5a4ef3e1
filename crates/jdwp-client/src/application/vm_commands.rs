//! VirtualMachine command set (command set 1).

use jdwp_core::commands::vm::{
    AllClasses, AllThreads, Capabilities, CapabilitiesNew, CapabilitiesNewReply,
    CapabilitiesReply, ClassInfo, Exit, GetIdSizes, HoldEvents, ReleaseEvents, Resume, Suspend,
    TopLevelThreadGroups, Version, VersionReply,
};
use jdwp_core::payload::{ThreadGroupId, ThreadId};
use jdwp_core::IdSizes;

use crate::application::debugger_core::{CommandChannel, CommandError, DebuggerCore};

/// VirtualMachine commands, borrowed from a [`DebuggerCore`] via
/// [`DebuggerCore::vm`].
pub struct VmCommands<'a, C> {
    core: &'a DebuggerCore<C>,
}

impl<'a, C: CommandChannel> VmCommands<'a, C> {
    pub(crate) fn new(core: &'a DebuggerCore<C>) -> Self {
        Self { core }
    }

    /// Protocol and VM version information.
    pub async fn version(&self) -> Result<VersionReply, CommandError> {
        self.core.execute(&Version).await
    }

    /// Every reference type currently loaded.
    pub async fn all_classes(&self) -> Result<Vec<ClassInfo>, CommandError> {
        self.core.execute(&AllClasses).await
    }

    /// Every live thread.
    pub async fn all_threads(&self) -> Result<Vec<ThreadId>, CommandError> {
        self.core.execute(&AllThreads).await
    }

    /// Thread groups without a parent.
    pub async fn top_level_thread_groups(&self) -> Result<Vec<ThreadGroupId>, CommandError> {
        self.core.execute(&TopLevelThreadGroups).await
    }

    /// The VM's identifier widths.  Does not change the façade's width
    /// table; see [`DebuggerCore::refresh_id_sizes`] for that.
    pub async fn id_sizes(&self) -> Result<IdSizes, CommandError> {
        self.core.execute(&GetIdSizes).await
    }

    pub async fn capabilities(&self) -> Result<CapabilitiesReply, CommandError> {
        self.core.execute(&Capabilities).await
    }

    pub async fn capabilities_new(&self) -> Result<CapabilitiesNewReply, CommandError> {
        self.core.execute(&CapabilitiesNew).await
    }

    /// Suspends every thread.  Suspensions nest; each needs a [`resume`](Self::resume).
    pub async fn suspend(&self) -> Result<(), CommandError> {
        self.core.execute(&Suspend).await
    }

    pub async fn resume(&self) -> Result<(), CommandError> {
        self.core.execute(&Resume).await
    }

    pub async fn hold_events(&self) -> Result<(), CommandError> {
        self.core.execute(&HoldEvents).await
    }

    pub async fn release_events(&self) -> Result<(), CommandError> {
        self.core.execute(&ReleaseEvents).await
    }

    /// Terminates the target VM.  The VM usually drops the connection
    /// right after replying.
    pub async fn exit(&self, exit_code: i32) -> Result<(), CommandError> {
        self.core.execute(&Exit { exit_code }).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
