mod state;
mod ui;

use crate::upload::{ApiError, FileApi, FileManager, HttpFileApi, ManagerConfig, NativeFilePicker};
use eframe::{egui, App};
pub use state::{AppState, UploadSummary, View};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct FileManagerApp {
    state: AppState,
    /// Backs the upload view.
    uploads: FileManager,
    /// Backs the listing view.
    library: FileManager,
    picker: NativeFilePicker,
}

impl FileManagerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: ManagerConfig,
        runtime: Handle,
    ) -> Result<Self, ApiError> {
        info!(endpoint = %config.endpoint, user = %config.user_id, "Initializing file manager");
        let api: Arc<dyn FileApi> = Arc::new(HttpFileApi::new(&config.endpoint, config.timeout)?);
        Ok(Self {
            state: AppState::default(),
            uploads: FileManager::new(config.clone(), Arc::clone(&api), runtime.clone()),
            library: FileManager::new(config, api, runtime),
            picker: NativeFilePicker,
        })
    }

    pub fn switch_view(&mut self, view: View) {
        if self.state.view != view {
            info!(?view, "Switching view");
            self.state.view = view;
            self.state.error_message = None;
        }
    }

    pub fn refresh_listing(&mut self) {
        self.state.listing_requested = true;
        // Completion is observed through `poll`.
        let _ = self.library.fetch_files();
    }

    pub fn delete_remote(&mut self, id: &str) {
        match self.library.delete_file(id) {
            Ok(_) => self.state.error_message = None,
            Err(e) => {
                warn!(id = %id, error = %e, "Delete rejected");
                self.state.error_message = Some(e.to_string());
            }
        }
    }

    pub fn download(&mut self, location: &str) {
        if let Err(e) = open::that(location) {
            warn!(location = %location, error = %e, "Failed to open download");
            self.state.error_message = Some(format!("Could not open {}: {}", location, e));
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        self.uploads.poll();
        self.library.poll();

        if self.state.view == View::Files && !self.state.listing_requested {
            self.refresh_listing();
        }

        if self.state.view == View::Upload {
            let hovered = ctx.input(|i| i.raw.hovered_files.clone());
            self.uploads.on_drag_over(&hovered);

            // Taking the drop out of the frame input keeps other widgets from seeing it.
            let dropped = ctx.input_mut(|i| std::mem::take(&mut i.raw.dropped_files));
            if !dropped.is_empty() {
                self.uploads.on_drop(dropped);
            }
        }

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

impl App for FileManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
