use crate::utils::file_type::is_accepted;
use ignore::Walk;
use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// Native file-selection affordance.
pub trait FilePicker {
    fn pick_files(&self, accepted: &[String]) -> Option<Vec<PathBuf>>;
    fn pick_folder(&self) -> Option<PathBuf>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFilePicker;

impl FilePicker for NativeFilePicker {
    fn pick_files(&self, accepted: &[String]) -> Option<Vec<PathBuf>> {
        let mut dialog = FileDialog::new();
        if !accepted.is_empty() {
            dialog = dialog.add_filter("Accepted files", accepted);
        }
        dialog.pick_files()
    }

    fn pick_folder(&self) -> Option<PathBuf> {
        FileDialog::new().pick_folder()
    }
}

/// Every accepted file under `root`, skipping anything `.gitignore` excludes.
pub fn collect_folder_files(root: &Path, accepted: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Walk::new(root)
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|name| is_accepted(name, accepted))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}
