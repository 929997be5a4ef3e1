//! VirtualMachine command set (command set 1).

use crate::commands::{CommandId, JdwpCommand};
use crate::payload::{
    ClassStatus, IdSizes, PayloadReader, PayloadWriter, ReferenceTypeId, ThreadGroupId, ThreadId,
    TypeTag,
};
use crate::protocol::ProtocolError;

/// Command set number of the VirtualMachine commands.
pub const COMMAND_SET: u8 = 1;

// ── Version (1, 1) ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Version;

/// Reply to [`Version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReply {
    /// Free-form description of the VM and protocol implementation.
    pub description: String,
    pub jdwp_major: i32,
    pub jdwp_minor: i32,
    pub vm_version: String,
    pub vm_name: String,
}

impl JdwpCommand for Version {
    const ID: CommandId = CommandId::new(COMMAND_SET, 1);
    type Reply = VersionReply;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<VersionReply, ProtocolError> {
        Ok(VersionReply {
            description: r.read_string()?,
            jdwp_major: r.read_i32()?,
            jdwp_minor: r.read_i32()?,
            vm_version: r.read_string()?,
            vm_name: r.read_string()?,
        })
    }
}

// ── AllClasses (1, 3) ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct AllClasses;

/// One loaded reference type in an [`AllClasses`] reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub ref_type_tag: TypeTag,
    pub type_id: ReferenceTypeId,
    /// JNI signature, e.g. `Ljava/lang/String;`.
    pub signature: String,
    pub status: ClassStatus,
}

impl JdwpCommand for AllClasses {
    const ID: CommandId = CommandId::new(COMMAND_SET, 3);
    type Reply = Vec<ClassInfo>;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<Vec<ClassInfo>, ProtocolError> {
        let count = r.read_count()?;
        // A count can claim far more entries than the body holds; cap the
        // preallocation by what the remaining bytes could possibly contain.
        let mut classes = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            classes.push(ClassInfo {
                ref_type_tag: TypeTag::try_from(r.read_u8()?)?,
                type_id: r.read_reference_type_id()?,
                signature: r.read_string()?,
                status: ClassStatus(r.read_i32()?),
            });
        }
        Ok(classes)
    }
}

// ── AllThreads (1, 4) / TopLevelThreadGroups (1, 5) ───────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct AllThreads;

impl JdwpCommand for AllThreads {
    const ID: CommandId = CommandId::new(COMMAND_SET, 4);
    type Reply = Vec<ThreadId>;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<Vec<ThreadId>, ProtocolError> {
        let count = r.read_count()?;
        let mut threads = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            threads.push(r.read_thread_id()?);
        }
        Ok(threads)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TopLevelThreadGroups;

impl JdwpCommand for TopLevelThreadGroups {
    const ID: CommandId = CommandId::new(COMMAND_SET, 5);
    type Reply = Vec<ThreadGroupId>;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<Vec<ThreadGroupId>, ProtocolError> {
        let count = r.read_count()?;
        let mut groups = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            groups.push(r.read_thread_group_id()?);
        }
        Ok(groups)
    }
}

// ── IDSizes (1, 7) ────────────────────────────────────────────────────────────

/// Asks the VM for the byte widths of its identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetIdSizes;

impl JdwpCommand for GetIdSizes {
    const ID: CommandId = CommandId::new(COMMAND_SET, 7);
    type Reply = IdSizes;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<IdSizes, ProtocolError> {
        let field = r.read_i32()?;
        let method = r.read_i32()?;
        let object = r.read_i32()?;
        let reference_type = r.read_i32()?;
        let frame = r.read_i32()?;
        IdSizes::from_reported(field, method, object, reference_type, frame)
    }
}

// ── Execution control ─────────────────────────────────────────────────────────

macro_rules! no_reply_command {
    ($(#[$meta:meta])* $name:ident, $command:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl JdwpCommand for $name {
            const ID: CommandId = CommandId::new(COMMAND_SET, $command);
            type Reply = ();

            fn decode_reply(_r: &mut PayloadReader<'_>) -> Result<(), ProtocolError> {
                Ok(())
            }
        }
    };
}

no_reply_command!(
    /// Suspends every thread in the VM.
    Suspend,
    8
);
no_reply_command!(
    /// Resumes every thread suspended by [`Suspend`] or by an event.
    Resume,
    9
);
no_reply_command!(
    /// Tells the VM to queue events instead of sending them.
    HoldEvents,
    15
);
no_reply_command!(
    /// Lets the VM send events again after [`HoldEvents`].
    ReleaseEvents,
    16
);

/// Terminates the target VM with the given exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub exit_code: i32,
}

impl JdwpCommand for Exit {
    const ID: CommandId = CommandId::new(COMMAND_SET, 10);
    type Reply = ();

    fn encode(&self, w: &mut PayloadWriter) -> Result<(), ProtocolError> {
        w.write_i32(self.exit_code);
        Ok(())
    }

    fn decode_reply(_r: &mut PayloadReader<'_>) -> Result<(), ProtocolError> {
        Ok(())
    }
}

// ── Capabilities (1, 12) ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities;

/// Optional features the VM supports, as reported by [`Capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitiesReply {
    pub can_watch_field_modification: bool,
    pub can_watch_field_access: bool,
    pub can_get_bytecodes: bool,
    pub can_get_synthetic_attribute: bool,
    pub can_get_owned_monitor_info: bool,
    pub can_get_current_contended_monitor: bool,
    pub can_get_monitor_info: bool,
}

impl JdwpCommand for Capabilities {
    const ID: CommandId = CommandId::new(COMMAND_SET, 12);
    type Reply = CapabilitiesReply;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<CapabilitiesReply, ProtocolError> {
        Ok(CapabilitiesReply {
            can_watch_field_modification: r.read_bool()?,
            can_watch_field_access: r.read_bool()?,
            can_get_bytecodes: r.read_bool()?,
            can_get_synthetic_attribute: r.read_bool()?,
            can_get_owned_monitor_info: r.read_bool()?,
            can_get_current_contended_monitor: r.read_bool()?,
            can_get_monitor_info: r.read_bool()?,
        })
    }
}

// ── CapabilitiesNew (1, 17) ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilitiesNew;

/// Number of trailing capability flags reserved for future use.
pub const RESERVED_CAPABILITIES: usize = 11;

/// Extended capability set; the first seven flags repeat [`CapabilitiesReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitiesNewReply {
    pub base: CapabilitiesReply,
    pub can_redefine_classes: bool,
    pub can_add_method: bool,
    pub can_unrestrictedly_redefine_classes: bool,
    pub can_pop_frames: bool,
    pub can_use_instance_filters: bool,
    pub can_get_source_debug_extension: bool,
    pub can_request_vm_death_event: bool,
    pub can_set_default_stratum: bool,
    pub can_get_instance_info: bool,
    pub can_request_monitor_events: bool,
    pub can_get_monitor_frame_info: bool,
    pub can_use_source_name_filters: bool,
    pub can_get_constant_pool: bool,
    pub can_force_early_return: bool,
    /// Flags 22 through 32.
    pub reserved: [bool; RESERVED_CAPABILITIES],
}

impl JdwpCommand for CapabilitiesNew {
    const ID: CommandId = CommandId::new(COMMAND_SET, 17);
    type Reply = CapabilitiesNewReply;

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<CapabilitiesNewReply, ProtocolError> {
        let base = Capabilities::decode_reply(r)?;
        let mut reply = CapabilitiesNewReply {
            base,
            can_redefine_classes: r.read_bool()?,
            can_add_method: r.read_bool()?,
            can_unrestrictedly_redefine_classes: r.read_bool()?,
            can_pop_frames: r.read_bool()?,
            can_use_instance_filters: r.read_bool()?,
            can_get_source_debug_extension: r.read_bool()?,
            can_request_vm_death_event: r.read_bool()?,
            can_set_default_stratum: r.read_bool()?,
            can_get_instance_info: r.read_bool()?,
            can_request_monitor_events: r.read_bool()?,
            can_get_monitor_frame_info: r.read_bool()?,
            can_use_source_name_filters: r.read_bool()?,
            can_get_constant_pool: r.read_bool()?,
            can_force_early_return: r.read_bool()?,
            reserved: [false; RESERVED_CAPABILITIES],
        };
        for flag in reply.reserved.iter_mut() {
            *flag = r.read_bool()?;
        }
        Ok(reply)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
