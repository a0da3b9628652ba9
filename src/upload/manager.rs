use crate::upload::api::{percent, ApiError, FileApi, ProgressFn, RemoteFile, UploadRequest};
use crate::upload::config::ManagerConfig;
use crate::upload::picker::{collect_folder_files, FilePicker};
use crate::upload::types::{
    DeleteRejected, FileEvent, FilePayload, SelectedFile, TrackedFile, UploadError, UploadStatus,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use derivative::Derivative;
use egui::{DroppedFile, HoveredFile};
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How long a failed delete keeps its banner up.
pub const FETCH_ERROR_TTL: Duration = Duration::from_secs(5);

pub type UploadHandle = JoinHandle<Result<Option<String>, UploadError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
    /// Set for delete failures, which clear themselves.
    ticket: Option<u64>,
}

enum ManagerEvent {
    File { id: String, event: FileEvent },
    Removed { id: String },
    Listing {
        generation: u64,
        result: Result<Vec<RemoteFile>, ApiError>,
    },
    DeleteFailed { id: String, message: String, ticket: u64 },
    ClearFetchError { ticket: u64 },
}

/// Owns the tracked-file collection of one view and drives its transfers.
///
/// Operations spawn tasks on the runtime; those tasks report back over a
/// channel and nothing changes until `poll` applies their events, so every
/// mutation happens on the caller's thread.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FileManager {
    files: Vec<TrackedFile>,
    fetches_in_flight: usize,
    fetch_generation: u64,
    /// Generation of the listing currently shown; older results are stale.
    shown_generation: u64,
    /// Entries whose upload task has been spawned.
    scheduled: HashSet<String>,
    fetch_error: Option<FetchError>,
    drag_hover: bool,
    config: ManagerConfig,
    #[derivative(Debug = "ignore")]
    api: Arc<dyn FileApi>,
    #[derivative(Debug = "ignore")]
    runtime: Handle,
    #[derivative(Debug = "ignore")]
    upload_slots: Arc<Semaphore>,
    #[derivative(Debug = "ignore")]
    sender: Sender<ManagerEvent>,
    #[derivative(Debug = "ignore")]
    receiver: Receiver<ManagerEvent>,
    next_ticket: u64,
}

impl FileManager {
    pub fn new(config: ManagerConfig, api: Arc<dyn FileApi>, runtime: Handle) -> Self {
        let permits = config
            .max_concurrent_uploads
            .unwrap_or(Semaphore::MAX_PERMITS)
            .clamp(1, Semaphore::MAX_PERMITS);
        let (sender, receiver) = channel();
        Self {
            files: Vec::new(),
            fetches_in_flight: 0,
            fetch_generation: 0,
            shown_generation: 0,
            scheduled: HashSet::new(),
            fetch_error: None,
            drag_hover: false,
            config,
            api,
            runtime,
            upload_slots: Arc::new(Semaphore::new(permits)),
            sender,
            receiver,
            next_ticket: 0,
        }
    }

    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    pub fn file(&self, id: &str) -> Option<&TrackedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.fetches_in_flight > 0
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_ref().map(|e| e.message.as_str())
    }

    pub fn is_drag_hovering(&self) -> bool {
        self.drag_hover
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Tracks each file as `pending` and schedules its upload.
    pub fn select_files(&mut self, selected: Vec<SelectedFile>) -> Vec<UploadHandle> {
        if selected.is_empty() {
            return Vec::new();
        }

        let mut taken: HashSet<String> = self.files.iter().map(|f| f.id.clone()).collect();
        let new_files: Vec<TrackedFile> = selected
            .into_iter()
            .map(|file| {
                let id = fresh_id(&taken);
                taken.insert(id.clone());
                TrackedFile::pending(id, file)
            })
            .collect();

        info!(count = new_files.len(), "Files selected for upload");
        self.files.extend(new_files.iter().cloned());
        new_files
            .iter()
            .filter_map(|file| self.upload_one(&file.id))
            .collect()
    }

    /// Schedules the upload of a tracked `pending` entry. Returns `None` for
    /// unknown ids and entries past `pending`, without touching the network.
    pub fn upload_one(&mut self, id: &str) -> Option<UploadHandle> {
        if self.scheduled.contains(id) {
            warn!(id = %id, "Upload already scheduled");
            return None;
        }
        let Some(file) = self.files.iter().find(|f| f.id == id) else {
            warn!(id = %id, "Upload requested for untracked file");
            return None;
        };
        if file.status != UploadStatus::Pending {
            warn!(id = %id, status = ?file.status, "Upload requested for settled file");
            return None;
        }

        let id = file.id.clone();
        let name = file.name.clone();
        let payload = file.payload.clone();
        let content_type = file.content_type.clone();
        let user_id = self.config.user_id.clone();
        let api = Arc::clone(&self.api);
        let slots = Arc::clone(&self.upload_slots);
        let sender = self.sender.clone();
        self.scheduled.insert(id.clone());

        Some(self.runtime.spawn(async move {
            // Held until the task ends; the semaphore is never closed.
            let _permit = slots.acquire_owned().await.ok();
            send_file_event(&sender, &id, FileEvent::UploadStarted);

            let progress: ProgressFn = {
                let sender = sender.clone();
                let id = id.clone();
                Arc::new(move |sent, total| {
                    send_file_event(&sender, &id, FileEvent::Progress(percent(sent, total)));
                })
            };

            let result = transfer(api.as_ref(), &name, payload, content_type, user_id, progress).await;
            match &result {
                Ok(location) => {
                    info!(file = %name, location = ?location, "Upload completed");
                    send_file_event(
                        &sender,
                        &id,
                        FileEvent::Uploaded {
                            location: location.clone(),
                        },
                    );
                }
                Err(e) => {
                    error!(file = %name, error = %e, "Upload failed");
                    send_file_event(&sender, &id, FileEvent::Failed(e.entry_message()));
                }
            }
            result
        }))
    }

    pub fn browse_files(&mut self, picker: &dyn FilePicker) -> Vec<UploadHandle> {
        match picker.pick_files(&self.config.accepted_extensions) {
            Some(paths) => self.select_files(paths.into_iter().map(SelectedFile::from_path).collect()),
            None => Vec::new(),
        }
    }

    pub fn select_folder(&mut self, picker: &dyn FilePicker) -> Vec<UploadHandle> {
        let Some(root) = picker.pick_folder() else {
            return Vec::new();
        };
        let paths = collect_folder_files(&root, &self.config.accepted_extensions);
        info!(folder = %root.display(), count = paths.len(), "Folder selected");
        self.select_files(paths.into_iter().map(SelectedFile::from_path).collect())
    }

    /// Takes files dropped on the window. The caller removes them from the
    /// frame input first so nothing else reacts to the drop.
    pub fn on_drop(&mut self, dropped: Vec<DroppedFile>) -> Vec<UploadHandle> {
        self.drag_hover = false;
        let selected = dropped
            .into_iter()
            .filter_map(|file| match (file.path, file.bytes) {
                (Some(path), _) => Some(SelectedFile::from_path(path)),
                (None, Some(bytes)) => Some(SelectedFile::from_bytes(file.name, bytes)),
                (None, None) => {
                    warn!(name = %file.name, "Dropped file has neither path nor contents");
                    None
                }
            })
            .collect();
        self.select_files(selected)
    }

    pub fn on_drag_over(&mut self, hovered: &[HoveredFile]) {
        self.drag_hover = !hovered.is_empty();
    }

    /// Drops the entry locally without contacting the server.
    pub fn remove_file(&mut self, id: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != id);
        self.scheduled.remove(id);
        before != self.files.len()
    }

    pub fn fetch_files(&mut self) -> JoinHandle<Result<usize, ApiError>> {
        self.fetches_in_flight += 1;
        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let user_id = self.config.user_id.clone();

        self.runtime.spawn(async move {
            let result = api.list(&user_id).await;
            let count = result.as_ref().map(Vec::len).map_err(Clone::clone);
            if let Err(e) = &count {
                error!(error = %e, "Failed to fetch files");
            }
            let _ = sender.send(ManagerEvent::Listing { generation, result });
            count
        })
    }

    pub fn delete_file(
        &mut self,
        id: &str,
    ) -> Result<JoinHandle<Result<(), ApiError>>, DeleteRejected> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| DeleteRejected::UnknownId(id.to_string()))?;
        let busy = self.files[index]
            .apply(&FileEvent::DeleteStarted)
            .ok_or_else(|| DeleteRejected::Busy(id.to_string()))?;
        self.files[index] = busy;

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let id = id.to_string();
        let user_id = self.config.user_id.clone();
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();

        Ok(self.runtime.spawn(async move {
            match api.delete(&id, &user_id).await {
                Ok(()) => {
                    info!(id = %id, "Deleted remote file");
                    let _ = sender.send(ManagerEvent::Removed { id });
                    Ok(())
                }
                Err(e) => {
                    error!(id = %id, error = %e, "Failed to delete file");
                    let message = format!("Failed to delete file: {}", e);
                    let _ = sender.send(ManagerEvent::DeleteFailed { id, message, ticket });
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(FETCH_ERROR_TTL).await;
                        let _ = sender.send(ManagerEvent::ClearFetchError { ticket });
                    });
                    Err(e)
                }
            }
        }))
    }

    /// Applies every event reported so far. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while self.poll_next() {
            applied += 1;
        }
        applied
    }

    /// Applies at most one pending event.
    pub fn poll_next(&mut self) -> bool {
        match self.receiver.try_recv() {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::File { id, event } => self.apply_file_event(&id, &event),
            ManagerEvent::Removed { id } => {
                self.remove_file(&id);
            }
            ManagerEvent::Listing { generation, result } => {
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                if generation < self.shown_generation {
                    debug!(generation, "Stale listing ignored");
                    return;
                }
                match result {
                    Ok(remote) => {
                        self.files = self.stored_entries(remote);
                        self.scheduled.clear();
                        self.shown_generation = generation;
                        self.fetch_error = None;
                    }
                    Err(e) => {
                        self.fetch_error = Some(FetchError {
                            message: e.to_string(),
                            ticket: None,
                        });
                    }
                }
            }
            ManagerEvent::DeleteFailed {
                id,
                message,
                ticket,
            } => {
                self.apply_file_event(&id, &FileEvent::Failed(message.clone()));
                self.fetch_error = Some(FetchError {
                    message,
                    ticket: Some(ticket),
                });
            }
            ManagerEvent::ClearFetchError { ticket } => {
                if self
                    .fetch_error
                    .as_ref()
                    .is_some_and(|e| e.ticket == Some(ticket))
                {
                    self.fetch_error = None;
                }
            }
        }
    }

    fn apply_file_event(&mut self, id: &str, event: &FileEvent) {
        let Some(slot) = self.files.iter_mut().find(|f| f.id == id) else {
            debug!(id = %id, ?event, "Event for untracked file ignored");
            return;
        };
        match slot.apply(event) {
            Some(next) => *slot = next,
            None => debug!(id = %id, ?event, status = ?slot.status, "Event does not apply"),
        }
    }

    fn stored_entries(&self, remote: Vec<RemoteFile>) -> Vec<TrackedFile> {
        let mut taken = HashSet::new();
        remote
            .into_iter()
            .map(|file| {
                let id = match file.id {
                    Some(id) if !taken.contains(&id) => id,
                    _ => fresh_id(&taken),
                };
                taken.insert(id.clone());
                TrackedFile::stored(id, file.name, file.location, file.size.unwrap_or(0))
            })
            .collect()
    }
}

fn fresh_id(taken: &HashSet<String>) -> String {
    loop {
        let id = Uuid::new_v4().simple().to_string();
        if !taken.contains(&id) {
            return id;
        }
    }
}

fn send_file_event(sender: &Sender<ManagerEvent>, id: &str, event: FileEvent) {
    let _ = sender.send(ManagerEvent::File {
        id: id.to_string(),
        event,
    });
}

async fn transfer(
    api: &dyn FileApi,
    name: &str,
    payload: FilePayload,
    content_type: String,
    user_id: String,
    progress: ProgressFn,
) -> Result<Option<String>, UploadError> {
    let bytes: Arc<[u8]> = match payload {
        FilePayload::Path(path) => tokio::fs::read(&path)
            .await
            .map_err(|source| UploadError::Read {
                name: name.to_string(),
                source,
            })?
            .into(),
        FilePayload::Bytes(bytes) => bytes,
        FilePayload::Placeholder => return Err(UploadError::NoContent(name.to_string())),
    };

    let request = UploadRequest {
        file_content: STANDARD.encode(&bytes),
        file_name: name.to_string(),
        content_type,
        user_id,
    };
    let reply = api.upload(request, progress).await?;
    Ok(reply.location)
}
