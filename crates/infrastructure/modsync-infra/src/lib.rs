pub mod privilege;
pub mod transfer;

// Re-exports for convenience
pub use privilege::{OsPrivilegeProbe, PrivilegeProbe};
pub use transfer::sftp::{SftpOptions, SftpTransferClient};
pub use transfer::{Credentials, Endpoint, TransferClient, TransferError};
