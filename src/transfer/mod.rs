pub mod relay;
pub mod sftp;

pub use relay::{relay_archive, RelayReport, UploadedFile};
pub use sftp::{DryRunStore, RemoteStore, SessionConnector, SftpConfig, SftpSession, Ssh2Connector};
