use crate::error::{RelayError, Result};
use ssh2::{Session, Sftp};
use std::fmt;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_SFTP_HOST: &str = "edi-prd-v1.intelipost.com.br";
pub const DEFAULT_SFTP_PORT: u16 = 22;
pub const DEFAULT_SFTP_PATH: &str = "/client67224/RODONAVES/NOTFIS";

/// Connection settings for the partner's SFTP server
#[derive(Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub username: String,
    pub password: String,
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFTP_HOST.to_string(),
            port: DEFAULT_SFTP_PORT,
            base_path: DEFAULT_SFTP_PATH.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl SftpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(RelayError::MissingConfig {
                name: "SFTP_USERNAME",
            });
        }
        if self.password.is_empty() {
            return Err(RelayError::MissingConfig {
                name: "SFTP_PASSWORD",
            });
        }
        Ok(())
    }
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Destination that accepts whole-file binary writes
pub trait RemoteStore {
    /// Create or truncate `path` and write `content` in one operation
    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()>;
}

/// Opens remote sessions; lets the pipeline run against any `RemoteStore`
pub trait SessionConnector: Send + 'static {
    type Session: RemoteStore;

    fn connect(&self, config: &SftpConfig) -> Result<Self::Session>;
}

/// Production connector backed by libssh2
#[derive(Debug, Clone, Copy, Default)]
pub struct Ssh2Connector;

impl SessionConnector for Ssh2Connector {
    type Session = SftpSession;

    fn connect(&self, config: &SftpConfig) -> Result<SftpSession> {
        SftpSession::connect(config)
    }
}

/// Authenticated SFTP channel over one SSH transport
///
/// Dropping the session shuts down the SFTP subsystem and then disconnects
/// the transport, on success and error paths alike.
pub struct SftpSession {
    sftp: Option<Sftp>,
    session: Session,
    host: String,
}

impl SftpSession {
    pub fn connect(config: &SftpConfig) -> Result<Self> {
        let address = format!("{}:{}", config.host, config.port);

        let tcp = TcpStream::connect((config.host.as_str(), config.port))
            .map_err(|e| RelayError::transfer(format!("failed to connect to {}", address), e))?;

        let mut session = Session::new()
            .map_err(|e| RelayError::transfer("failed to create SSH session", e))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| RelayError::transfer(format!("SSH handshake with {} failed", address), e))?;

        let sftp = match open_sftp(&session, config) {
            Ok(sftp) => sftp,
            Err(e) => {
                disconnect(&session, &config.host);
                return Err(e);
            }
        };

        info!("SFTP connection established with {}", address);
        Ok(Self {
            sftp: Some(sftp),
            session,
            host: config.host.clone(),
        })
    }
}

fn open_sftp(session: &Session, config: &SftpConfig) -> Result<Sftp> {
    session
        .userauth_password(&config.username, &config.password)
        .map_err(|e| RelayError::transfer("SFTP authentication failed", e))?;

    if !session.authenticated() {
        return Err(RelayError::transfer(
            "SFTP authentication failed",
            io::Error::new(io::ErrorKind::PermissionDenied, "server rejected credentials"),
        ));
    }

    session
        .sftp()
        .map_err(|e| RelayError::transfer("failed to start SFTP subsystem", e))
}

fn disconnect(session: &Session, host: &str) {
    if let Err(e) = session.disconnect(None, "relay finished", None) {
        warn!("Failed to disconnect from {}: {}", host, e);
    }
}

impl RemoteStore for SftpSession {
    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let sftp = self.sftp.as_ref().ok_or_else(|| {
            RelayError::transfer(
                format!("cannot write {}", path),
                io::Error::new(io::ErrorKind::NotConnected, "SFTP session closed"),
            )
        })?;

        let mut file = sftp
            .create(Path::new(path))
            .map_err(|e| RelayError::transfer(format!("failed to open remote file {}", path), e))?;
        file.write_all(content)
            .map_err(|e| RelayError::transfer(format!("failed to write remote file {}", path), e))?;

        Ok(())
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        drop(self.sftp.take());
        disconnect(&self.session, &self.host);
        debug!("SFTP session with {} closed", self.host);
    }
}

/// Store that records what would be written without touching the network
#[derive(Debug, Default)]
pub struct DryRunStore {
    pub planned: Vec<(String, usize)>,
}

impl RemoteStore for DryRunStore {
    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        info!("Would upload {} ({} bytes)", path, content.len());
        self.planned.push((path.to_string(), content.len()));
        Ok(())
    }
}
