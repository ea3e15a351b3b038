// Key custody: password-protected private-key backups
pub mod backup;

pub use backup::{BackupError, EncryptedBackup};
