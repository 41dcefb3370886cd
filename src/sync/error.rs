use thiserror::Error;
use uuid::Uuid;

use crate::adapter::AdapterError;
use crate::store::StoreError;

pub type SyncResult<T> = Result<T, SyncError>;

/// Which phase of [`super::executor::SyncExecutor::execute`] an error
/// occurred in, attached to [`SyncError::Phase`] so a caller can tell a
/// download failure from an update failure without inspecting the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCategory {
    Download,
    Upload,
    Update,
    DeleteClient,
    DeleteServer,
}

impl std::fmt::Display for SyncCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncCategory::Download => "Download",
            SyncCategory::Upload => "Upload",
            SyncCategory::Update => "Update",
            SyncCategory::DeleteClient => "DeleteClient",
            SyncCategory::DeleteServer => "DeleteServer",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A single operation within `category` failed for `client_side_id`;
    /// the remainder of the plan was aborted. Partial progress from
    /// earlier categories/items is not rolled back.
    #[error("sync aborted in {category} phase for item {client_side_id}: {source}")]
    Phase {
        category: SyncCategory,
        client_side_id: Uuid,
        #[source]
        source: Box<SyncError>,
    },

    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn phase(category: SyncCategory, client_side_id: Uuid, source: SyncError) -> Self {
        SyncError::Phase {
            category,
            client_side_id,
            source: Box::new(source),
        }
    }
}
