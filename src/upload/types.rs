use crate::upload::api::ApiError;
use crate::utils::file_type::content_type_for;
use derivative::Derivative;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    /// Transfer in flight, or a remote delete in flight for a stored entry.
    Uploading,
    Completed,
    Error(String),
}

impl UploadStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Pending | Self::Uploading)
    }
}

/// Where an entry's bytes come from.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub enum FilePayload {
    Path(PathBuf),
    Bytes(#[derivative(Debug = "ignore")] Arc<[u8]>),
    /// Entries from a remote listing; their bytes are never downloaded.
    Placeholder,
}

/// A file as handed to `FileManager::select_files`.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub payload: FilePayload,
}

impl SelectedFile {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            name,
            size,
            payload: FilePayload::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            payload: FilePayload::Bytes(bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub id: String,
    pub name: String,
    pub progress: u8,
    pub size: u64,
    pub content_type: String,
    pub payload: FilePayload,
    pub status: UploadStatus,
    pub remote_location: Option<String>,
}

/// Something that happened to a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    UploadStarted,
    Progress(u8),
    Uploaded { location: Option<String> },
    DeleteStarted,
    Failed(String),
}

impl TrackedFile {
    pub fn pending(id: String, selected: SelectedFile) -> Self {
        Self {
            content_type: content_type_for(&selected.name).to_string(),
            id,
            name: selected.name,
            progress: 0,
            size: selected.size,
            payload: selected.payload,
            status: UploadStatus::Pending,
            remote_location: None,
        }
    }

    pub fn stored(id: String, name: String, location: Option<String>, size: u64) -> Self {
        Self {
            content_type: content_type_for(&name).to_string(),
            id,
            name,
            progress: 100,
            size,
            payload: FilePayload::Placeholder,
            status: UploadStatus::Completed,
            remote_location: location,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Returns the entry after `event`, or `None` when the event does not
    /// apply in the current status.
    pub fn apply(&self, event: &FileEvent) -> Option<TrackedFile> {
        let mut next = self.clone();
        match (&self.status, event) {
            (UploadStatus::Pending, FileEvent::UploadStarted) => {
                next.status = UploadStatus::Uploading;
            }
            (UploadStatus::Uploading, FileEvent::Progress(percent)) => {
                next.progress = self.progress.max((*percent).min(100));
            }
            (UploadStatus::Uploading, FileEvent::Uploaded { location }) => {
                next.progress = 100;
                next.status = UploadStatus::Completed;
                next.remote_location = location.clone();
            }
            (UploadStatus::Completed | UploadStatus::Error(_), FileEvent::DeleteStarted) => {
                next.status = UploadStatus::Uploading;
            }
            (UploadStatus::Pending | UploadStatus::Uploading, FileEvent::Failed(message)) => {
                next.status = UploadStatus::Error(message.clone());
            }
            _ => return None,
        }
        Some(next)
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no local content to upload")]
    NoContent(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl UploadError {
    /// Message shown on the entry's row.
    pub fn entry_message(&self) -> String {
        match self {
            Self::Read { .. } | Self::NoContent(_) => "Failed to process file".to_string(),
            Self::Api(ApiError::Timeout) => "Upload timed out".to_string(),
            Self::Api(ApiError::Network(_)) => "Network error occurred during upload".to_string(),
            Self::Api(ApiError::Status { status, reason }) => {
                format!("Upload failed: {} ({})", reason, status)
            }
            Self::Api(ApiError::InvalidBody(_)) => "Invalid response from server".to_string(),
            Self::Api(other) => format!("Upload failed: {}", other),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeleteRejected {
    #[error("no file with id {0}")]
    UnknownId(String),
    #[error("file {0} is still transferring")]
    Busy(String),
}
