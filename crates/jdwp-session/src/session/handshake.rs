//! The `JDWP-Handshake` exchange.
//!
//! Before any packet flows, the debugger writes the 14 ASCII bytes
//! `JDWP-Handshake` and the VM answers with the same 14 bytes.  Each
//! direction is bounded by its own timeout.

use jdwp_core::protocol::HANDSHAKE;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;

/// Performs the handshake on `stream`.
///
/// # Errors
///
/// [`SessionError::Handshake`] on a write or read timeout, a short read,
/// an I/O error, or (with `verify_handshake` on) a reply that is not the
/// magic string.
pub(crate) async fn perform<S>(stream: &mut S, config: &SessionConfig) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let write = async {
        stream.write_all(HANDSHAKE).await?;
        stream.flush().await
    };
    timeout(config.handshake_write_timeout, write)
        .await
        .map_err(|_| {
            SessionError::Handshake(format!(
                "timed out after {:?} writing handshake",
                config.handshake_write_timeout
            ))
        })?
        .map_err(|e| SessionError::Handshake(format!("write failed: {e}")))?;

    let mut echo = [0u8; HANDSHAKE.len()];
    timeout(config.handshake_read_timeout, stream.read_exact(&mut echo))
        .await
        .map_err(|_| {
            SessionError::Handshake(format!(
                "timed out after {:?} waiting for handshake reply",
                config.handshake_read_timeout
            ))
        })?
        .map_err(|e| SessionError::Handshake(format!("read failed: {e}")))?;

    if &echo != HANDSHAKE {
        let got = String::from_utf8_lossy(&echo);
        if config.verify_handshake {
            return Err(SessionError::Handshake(format!(
                "unexpected handshake reply {got:?}"
            )));
        }
        warn!("ignoring unexpected handshake reply {got:?}");
    }
    debug!("handshake complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::Builder;

    fn config() -> SessionConfig {
        SessionConfig {
            handshake_read_timeout: Duration::from_millis(50),
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_handshake_succeeds_on_echo() {
        // Arrange
        let mut stream = Builder::new().write(HANDSHAKE).read(HANDSHAKE).build();

        // Act
        let result = perform(&mut stream, &config()).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_handshake_accepts_echo_split_across_reads() {
        let mut stream = Builder::new()
            .write(HANDSHAKE)
            .read(b"JDWP-")
            .read(b"Handshake")
            .build();
        assert!(perform(&mut stream, &config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_handshake_short_read_fails() {
        // Arrange – the peer closes after four bytes
        let mut stream = Builder::new().write(HANDSHAKE).read(b"JDWP").build();

        // Act
        let result = perform(&mut stream, &config()).await;

        // Assert
        assert!(matches!(result, Err(SessionError::Handshake(_))));
    }

    #[tokio::test]
    async fn test_handshake_mismatch_fails_when_verifying() {
        let mut stream = Builder::new()
            .write(HANDSHAKE)
            .read(b"JDWP-Handshakf")
            .build();
        let result = perform(&mut stream, &config()).await;
        assert!(matches!(result, Err(SessionError::Handshake(msg)) if msg.contains("unexpected")));
    }

    #[tokio::test]
    async fn test_handshake_mismatch_tolerated_without_verification() {
        // Arrange
        let mut stream = Builder::new()
            .write(HANDSHAKE)
            .read(b"XXXXXXXXXXXXXX")
            .build();
        let cfg = SessionConfig {
            verify_handshake: false,
            ..config()
        };

        // Act / Assert
        assert!(perform(&mut stream, &cfg).await.is_ok());
    }

    #[tokio::test]
    async fn test_handshake_read_timeout() {
        // Arrange – the peer stays silent for longer than the read timeout
        let mut stream = Builder::new()
            .write(HANDSHAKE)
            .wait(Duration::from_millis(500))
            .build();

        // Act
        let result = perform(&mut stream, &config()).await;

        // Assert
        assert!(matches!(result, Err(SessionError::Handshake(msg)) if msg.contains("timed out")));
    }
}
