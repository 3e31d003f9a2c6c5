//! The persistent remote-command client (spec §4.1).
//!
//! A single coarse mutex serialises the request/response cycle: at most
//! one `exec` is ever in flight on the wire for a given [`RcClient`]. The
//! underlying TCP connection is held open across many calls and is only
//! torn down on an authentication failure or a socket error.

use std::net::SocketAddr;
use std::time::Duration;

use kubevote_utils::locks::AsyncMutex;
use tokio::io::{BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use crate::error::RcError;
use crate::packet::{self, AUTH_FAILED_ID, AUTH_PACKET_ID, EXEC_PACKET_ID, PACKET_AUTH, PACKET_EXEC};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

struct Session {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

/// A persistent, authenticated remote-command client.
///
/// Cheaply cloneable (wraps its state in `Arc`-free interior mutability —
/// share an `Arc<RcClient>` across tasks that need the same session; two
/// independent instances never contend on each other's socket).
pub struct RcClient {
    address: SocketAddr,
    password: String,
    session: AsyncMutex<Option<Session>>,
}

impl RcClient {
    /// Creates a client that connects lazily on the first `exec` call.
    #[must_use]
    pub fn new(address: SocketAddr, password: String) -> Self {
        Self {
            address,
            password,
            session: AsyncMutex::new(None),
        }
    }

    /// Executes a command on the game, reconnecting and re-authenticating
    /// first if the session isn't already established.
    ///
    /// # Errors
    /// Returns [`RcError::Unreachable`] if the game can't be dialed,
    /// [`RcError::AuthFailed`] if the password is rejected, or
    /// [`RcError::Disconnected`] if the socket fails mid-request (the next
    /// call will transparently reconnect).
    pub async fn exec(&self, command: &str) -> Result<String, RcError> {
        let mut guard = self.session.lock().await;

        if guard.is_none() {
            *guard = Some(self.connect_and_authenticate().await?);
        }

        match self.exec_on_session(guard.as_mut().expect("just populated"), command).await {
            Ok(response) => Ok(response),
            Err(err) => {
                *guard = None;
                Err(err)
            }
        }
    }

    /// Idempotently closes the connection, if one is open.
    pub async fn close(&self) {
        let mut guard = self.session.lock().await;
        *guard = None;
    }

    async fn connect_and_authenticate(&self) -> Result<Session, RcError> {
        tracing::debug!(address = %self.address, "connecting to remote command server");

        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(self.address))
            .await
            .map_err(|_| RcError::Unreachable(std::io::Error::from(std::io::ErrorKind::TimedOut)))?
            .map_err(RcError::Unreachable)?;

        let (read_half, write_half) = stream.into_split();
        let mut session = Session {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        };

        timeout(
            CONNECT_TIMEOUT,
            packet::write_packet(&mut session.writer, AUTH_PACKET_ID, PACKET_AUTH, &self.password),
        )
        .await
        .map_err(|_| RcError::Disconnected(std::io::Error::from(std::io::ErrorKind::TimedOut)))??;

        let response = timeout(CONNECT_TIMEOUT, packet::read_packet(&mut session.reader))
            .await
            .map_err(|_| RcError::Disconnected(std::io::Error::from(std::io::ErrorKind::TimedOut)))??;

        if response.id == AUTH_FAILED_ID {
            tracing::error!("remote command authentication rejected");
            return Err(RcError::AuthFailed);
        }

        tracing::info!(address = %self.address, "remote command session established");
        Ok(session)
    }

    async fn exec_on_session(&self, session: &mut Session, command: &str) -> Result<String, RcError> {
        timeout(
            IO_TIMEOUT,
            packet::write_packet(&mut session.writer, EXEC_PACKET_ID, PACKET_EXEC, command),
        )
        .await
        .map_err(|_| RcError::Disconnected(std::io::Error::from(std::io::ErrorKind::TimedOut)))??;

        let response = timeout(IO_TIMEOUT, packet::read_packet(&mut session.reader))
            .await
            .map_err(|_| RcError::Disconnected(std::io::Error::from(std::io::ErrorKind::TimedOut)))??;

        Ok(response.payload)
    }
}
