use crate::upload::{TrackedFile, UploadStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Upload,
    Files,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub view: View,
    /// The listing view fetches once on first show, then on Refresh.
    pub listing_requested: bool,
    pub error_message: Option<String>,
}

/// Per-status counts over an upload collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub total: usize,
    pub pending: usize,
    pub uploading: usize,
    pub completed: usize,
    pub failed: usize,
    progress_sum: usize,
}

impl UploadSummary {
    pub fn from_files(files: &[TrackedFile]) -> Self {
        files.iter().fold(Self::default(), |mut summary, file| {
            summary.total += 1;
            summary.progress_sum += file.progress as usize;
            match file.status {
                UploadStatus::Pending => summary.pending += 1,
                UploadStatus::Uploading => summary.uploading += 1,
                UploadStatus::Completed => summary.completed += 1,
                UploadStatus::Error(_) => summary.failed += 1,
            }
            summary
        })
    }

    pub fn is_active(&self) -> bool {
        self.pending + self.uploading > 0
    }

    pub fn get_progress_percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.progress_sum as f32 / (self.total as f32 * 100.0)
        }
    }

    pub fn get_status_text(&self) -> String {
        if self.total == 0 {
            return String::new();
        }
        if self.is_active() {
            format!(
                "Progress: {}/{} files | ⏳ Pending: {} | ✅ Success: {} | ❌ Failed: {}",
                self.completed + self.failed,
                self.total,
                self.pending,
                self.completed,
                self.failed
            )
        } else {
            format!(
                "Final Status: {}/{} files | ✅ Success: {} | ❌ Failed: {}",
                self.total, self.total, self.completed, self.failed
            )
        }
    }
}
