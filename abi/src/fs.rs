//! File-system collaborator interface.
//!
//! The runtime never touches storage itself. Operations are forwarded to a
//! handler supplied by the embedding application.

use crate::error::OplResult;

/// A synchronous file-system request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsOperation {
    Exists(String),
    Read(String),
    Write { path: String, data: Vec<u8> },
    Dir(String),
    Stat(String),
    Rename { from: String, to: String },
    Mkdir(String),
    Rmdir(String),
    Delete(String),
}

impl FsOperation {
    /// True for operations that never change storage
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Exists(_) | Self::Read(_) | Self::Dir(_) | Self::Stat(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exists(_) => "exists",
            Self::Read(_) => "read",
            Self::Write { .. } => "write",
            Self::Dir(_) => "dir",
            Self::Stat(_) => "stat",
            Self::Rename { .. } => "rename",
            Self::Mkdir(_) => "mkdir",
            Self::Rmdir(_) => "rmdir",
            Self::Delete(_) => "delete",
        }
    }
}

/// File metadata returned by `Stat`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Seconds since the Unix epoch
    pub modified: u64,
    pub is_dir: bool,
}

/// Successful outcome of an `FsOperation`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsResult {
    Done,
    Exists(bool),
    Data(Vec<u8>),
    Entries(Vec<String>),
    Stat(FileStat),
}

/// Storage backend
pub trait FsHandler: Send + Sync {
    fn perform(&self, op: &FsOperation) -> OplResult<FsResult>;
}
