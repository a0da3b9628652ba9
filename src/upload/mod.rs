pub mod api;
pub mod config;
mod manager;
pub mod picker;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{ApiError, FileApi, HttpFileApi};
pub use config::{ConfigError, ManagerConfig};
pub use manager::{FileManager, UploadHandle, FETCH_ERROR_TTL};
pub use picker::{FilePicker, NativeFilePicker};
pub use types::{
    DeleteRejected, FileEvent, FilePayload, SelectedFile, TrackedFile, UploadError, UploadStatus,
};
