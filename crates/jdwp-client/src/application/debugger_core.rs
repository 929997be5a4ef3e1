//! DebuggerCore: the typed command façade over a [`CommandChannel`].
//!
//! Every typed command goes through [`DebuggerCore::execute`], which
//!
//! 1. encodes the request body with the current identifier widths,
//! 2. performs one round trip on the channel,
//! 3. turns a non-zero reply error code into [`CommandError::Remote`],
//! 4. decodes the reply body, rejecting trailing bytes.
//!
//! The width table starts at eight bytes per identifier kind and is replaced
//! by [`DebuggerCore::refresh_id_sizes`] once the VM has reported its real
//! widths.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use jdwp_core::commands::vm::GetIdSizes;
use jdwp_core::{
    CommandId, CommandPacket, ErrorCode, IdSizes, JdwpCommand, ProtocolError, ReplyPacket,
};
use jdwp_session::{Session, SessionError};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::thread_commands::ThreadCommands;
use crate::application::vm_commands::VmCommands;

/// Error type for typed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The transport failed or the session ended before the reply arrived.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The VM answered with a non-zero error code.
    #[error("command {command} failed: {code}")]
    Remote { command: CommandId, code: ErrorCode },

    /// The request could not be encoded or the reply body was malformed.
    #[error("payload error: {0}")]
    Payload(#[from] ProtocolError),
}

impl CommandError {
    /// The VM's error code, if this is a [`CommandError::Remote`].
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            CommandError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// One request/reply round trip.
///
/// [`Session`] is the production implementation; tests use the generated
/// `MockCommandChannel`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Sends `packet` and waits for its reply.  A non-zero error code in the
    /// reply is returned as-is.
    async fn send_command(&self, packet: CommandPacket) -> Result<ReplyPacket, SessionError>;
}

#[async_trait]
impl CommandChannel for Session {
    async fn send_command(&self, packet: CommandPacket) -> Result<ReplyPacket, SessionError> {
        self.submit(packet).await?.wait().await
    }
}

/// Typed command façade.
pub struct DebuggerCore<C> {
    channel: C,
    id_sizes: RwLock<IdSizes>,
}

impl<C: CommandChannel> DebuggerCore<C> {
    /// Wraps `channel` with the default eight-byte identifier widths.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            id_sizes: RwLock::new(IdSizes::default()),
        }
    }

    /// The underlying channel, e.g. to stop the session when done.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Identifier widths used for the next request.
    pub fn id_sizes(&self) -> IdSizes {
        *self.id_sizes.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the identifier width table.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidIdSize`] if any width lies outside `1..=8`;
    /// the table is left unchanged.
    pub fn set_id_sizes(&self, sizes: IdSizes) -> Result<(), ProtocolError> {
        sizes.validate()?;
        *self.id_sizes.write().unwrap_or_else(PoisonError::into_inner) = sizes;
        Ok(())
    }

    /// Runs one typed command.
    pub async fn execute<T>(&self, command: &T) -> Result<T::Reply, CommandError>
    where
        T: JdwpCommand + Sync,
    {
        let sizes = self.id_sizes();
        let packet = command.to_packet(sizes)?;
        debug!("executing command {}", T::ID);

        let reply = self.channel.send_command(packet).await?;
        let code = ErrorCode(reply.error_code);
        if !code.is_success() {
            debug!("command {} returned {code}", T::ID);
            return Err(CommandError::Remote {
                command: T::ID,
                code,
            });
        }
        Ok(T::parse_reply(&reply.data, sizes)?)
    }

    /// Asks the VM for its identifier widths and installs them.
    pub async fn refresh_id_sizes(&self) -> Result<IdSizes, CommandError> {
        let sizes = self.execute(&GetIdSizes).await?;
        self.set_id_sizes(sizes)?;
        info!(
            "identifier widths: field={} method={} object={} reference_type={} frame={}",
            sizes.field_id, sizes.method_id, sizes.object_id, sizes.reference_type_id, sizes.frame_id
        );
        Ok(sizes)
    }

    /// VirtualMachine commands.
    pub fn vm(&self) -> VmCommands<'_, C> {
        VmCommands::new(self)
    }

    /// ThreadReference commands.
    pub fn threads(&self) -> ThreadCommands<'_, C> {
        ThreadCommands::new(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jdwp_core::commands::vm::Version;
    use jdwp_core::PayloadWriter;

    fn ok_reply(data: Vec<u8>) -> Result<ReplyPacket, SessionError> {
        Ok(ReplyPacket {
            error_code: 0,
            data,
        })
    }

    fn id_sizes_body(widths: [i32; 5]) -> Vec<u8> {
        let mut w = PayloadWriter::default();
        for width in widths {
            w.write_i32(width);
        }
        w.into_bytes()
    }

    #[tokio::test]
    async fn test_execute_sends_command_and_decodes_reply() {
        // Arrange
        let mut w = PayloadWriter::default();
        w.write_string("Java Debug Wire Protocol").unwrap();
        w.write_i32(17);
        w.write_i32(0);
        w.write_string("17.0.2").unwrap();
        w.write_string("OpenJDK 64-Bit Server VM").unwrap();
        let body = w.into_bytes();

        let mut channel = MockCommandChannel::new();
        channel
            .expect_send_command()
            .withf(|p: &CommandPacket| p.command_set == 1 && p.command == 1 && p.data.is_empty())
            .times(1)
            .returning(move |_| ok_reply(body.clone()));
        let core = DebuggerCore::new(channel);

        // Act
        let version = core.execute(&Version).await.unwrap();

        // Assert
        assert_eq!(version.jdwp_major, 17);
        assert_eq!(version.vm_name, "OpenJDK 64-Bit Server VM");
    }

    #[tokio::test]
    async fn test_execute_maps_nonzero_error_code_to_remote() {
        // Arrange
        let mut channel = MockCommandChannel::new();
        channel.expect_send_command().returning(|_| {
            Ok(ReplyPacket {
                error_code: 112,
                data: Vec::new(),
            })
        });
        let core = DebuggerCore::new(channel);

        // Act
        let err = core.execute(&Version).await.unwrap_err();

        // Assert
        assert_eq!(err.error_code(), Some(ErrorCode::VM_DEAD));
        assert!(matches!(
            err,
            CommandError::Remote { command, .. } if command == CommandId::new(1, 1)
        ));
    }

    #[tokio::test]
    async fn test_execute_passes_session_errors_through() {
        let mut channel = MockCommandChannel::new();
        channel
            .expect_send_command()
            .returning(|_| Err(SessionError::ChannelClosed));
        let core = DebuggerCore::new(channel);

        let err = core.execute(&Version).await.unwrap_err();

        assert!(matches!(err, CommandError::Session(SessionError::ChannelClosed)));
        assert_eq!(err.error_code(), None);
    }

    #[tokio::test]
    async fn test_execute_rejects_truncated_reply() {
        // Arrange – a Version reply that stops after the description
        let mut w = PayloadWriter::default();
        w.write_string("partial").unwrap();
        let body = w.into_bytes();
        let mut channel = MockCommandChannel::new();
        channel
            .expect_send_command()
            .returning(move |_| ok_reply(body.clone()));
        let core = DebuggerCore::new(channel);

        // Act
        let err = core.execute(&Version).await.unwrap_err();

        // Assert
        assert!(matches!(
            err,
            CommandError::Payload(ProtocolError::InsufficientData { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_id_sizes_installs_reported_widths() {
        // Arrange
        let mut channel = MockCommandChannel::new();
        channel
            .expect_send_command()
            .withf(|p: &CommandPacket| p.command_set == 1 && p.command == 7)
            .returning(|_| ok_reply(id_sizes_body([8, 8, 4, 4, 8])));
        let core = DebuggerCore::new(channel);

        // Act
        let sizes = core.refresh_id_sizes().await.unwrap();

        // Assert
        assert_eq!(sizes.object_id, 4);
        assert_eq!(core.id_sizes(), sizes);
    }

    #[tokio::test]
    async fn test_refresh_id_sizes_rejects_unsupported_width_and_keeps_table() {
        // Arrange – a 16-byte object id cannot be represented
        let mut channel = MockCommandChannel::new();
        channel
            .expect_send_command()
            .returning(|_| ok_reply(id_sizes_body([8, 8, 16, 8, 8])));
        let core = DebuggerCore::new(channel);

        // Act
        let result = core.refresh_id_sizes().await;

        // Assert
        assert!(matches!(
            result,
            Err(CommandError::Payload(ProtocolError::InvalidIdSize { size: 16, .. }))
        ));
        assert_eq!(core.id_sizes(), IdSizes::default());
    }

    #[test]
    fn test_set_id_sizes_rejects_zero_width() {
        let core = DebuggerCore::new(MockCommandChannel::new());
        let sizes = IdSizes {
            frame_id: 0,
            ..IdSizes::default()
        };

        assert!(core.set_id_sizes(sizes).is_err());
        assert_eq!(core.id_sizes(), IdSizes::default());
    }
}
