use super::{FileManagerApp, UploadSummary, View};
use crate::upload::{TrackedFile, UploadStatus};
use crate::utils::{FileCategory, FileSizeUtils};
use eframe::egui::{self, Align, Color32, RichText, Stroke};

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const ERROR_RED: Color32 = Color32::from_rgb(220, 50, 50);
const SUCCESS_GREEN: Color32 = Color32::from_rgb(0, 180, 0);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);
const CARD_WIDTH: f32 = 150.0;

enum Action {
    Browse,
    SelectFolder,
    Remove(String),
    Delete(String),
    Download(String),
    Refresh,
}

impl FileManagerApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("navigation").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("☁ File Manager").strong().color(ACCENT));
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if ui
                        .selectable_label(self.state.view == View::Files, "📋 My Files")
                        .clicked()
                    {
                        self.switch_view(View::Files);
                    }
                    if ui
                        .selectable_label(self.state.view == View::Upload, "📤 Upload")
                        .clicked()
                    {
                        self.switch_view(View::Upload);
                    }
                });
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                match self.state.view {
                    View::Upload => self.render_upload_page(ui, &mut actions),
                    View::Files => self.render_files_page(ui, &mut actions),
                }
                if let Some(error) = &self.state.error_message {
                    ui.add_space(10.0);
                    ui.colored_label(ERROR_RED, error);
                }
            });
        });

        for action in actions {
            match action {
                Action::Browse => {
                    self.uploads.browse_files(&self.picker);
                }
                Action::SelectFolder => {
                    self.uploads.select_folder(&self.picker);
                }
                Action::Remove(id) => match self.state.view {
                    View::Upload => {
                        self.uploads.remove_file(&id);
                    }
                    View::Files => {
                        self.library.remove_file(&id);
                    }
                },
                Action::Delete(id) => self.delete_remote(&id),
                Action::Download(location) => self.download(&location),
                Action::Refresh => self.refresh_listing(),
            }
        }
    }

    fn render_upload_page(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.heading("Upload Files");
        ui.add_space(10.0);

        let stroke = if self.uploads.is_drag_hovering() {
            Stroke::new(2.0, ACCENT)
        } else {
            Stroke::new(1.0, MUTED)
        };
        egui::Frame::group(ui.style())
            .stroke(stroke)
            .inner_margin(24.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.horizontal(|ui| {
                        ui.label("Drag files here or");
                        if ui.button("Browse").clicked() {
                            actions.push(Action::Browse);
                        }
                        if ui.button("📁 Select Folder").clicked() {
                            actions.push(Action::SelectFolder);
                        }
                    });
                    let accepted = &self.uploads.config().accepted_extensions;
                    if !accepted.is_empty() {
                        ui.label(
                            RichText::new(format!("Accepted: .{}", accepted.join(", .")))
                                .small()
                                .color(MUTED),
                        );
                    }
                });
            });

        let files = self.uploads.files();
        if files.is_empty() {
            return;
        }

        ui.add_space(16.0);
        let summary = UploadSummary::from_files(files);
        ui.add(
            egui::ProgressBar::new(summary.get_progress_percentage())
                .show_percentage()
                .fill(ACCENT),
        );
        ui.label(summary.get_status_text());
        ui.add_space(8.0);

        for file in files {
            render_file_row(ui, file, actions);
            ui.add_space(4.0);
        }
    }

    fn render_files_page(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            ui.heading("My Files");
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                let refresh = ui.add_enabled(!self.library.is_loading(), egui::Button::new("🔄 Refresh"));
                if refresh.clicked() {
                    actions.push(Action::Refresh);
                }
            });
        });
        ui.add_space(10.0);

        if let Some(error) = self.library.fetch_error() {
            egui::Frame::group(ui.style())
                .stroke(Stroke::new(1.0, ERROR_RED))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.colored_label(ERROR_RED, format!("Error loading files: {}", error));
                });
            ui.add_space(10.0);
        }

        if self.library.is_loading() {
            ui.vertical_centered(|ui| {
                ui.add_space(30.0);
                ui.spinner();
                ui.label(RichText::new("Loading files...").color(MUTED));
            });
            return;
        }

        let files = self.library.files();
        if files.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(30.0);
                ui.label(RichText::new("📂").size(32.0));
                ui.label(RichText::new("No files uploaded yet").color(MUTED));
            });
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for file in files {
                render_file_card(ui, file, actions);
            }
        });
    }
}

fn render_file_row(ui: &mut egui::Ui, file: &TrackedFile, actions: &mut Vec<Action>) {
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(RichText::new(FileCategory::classify(&file.name).icon()).size(20.0));
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(&file.name);
                    ui.label(RichText::new(FileSizeUtils::format_size(file.size)).small().color(MUTED));
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text("Remove").clicked() {
                            actions.push(Action::Remove(file.id.clone()));
                        }
                    });
                });

                let bar = egui::ProgressBar::new(file.progress as f32 / 100.0).show_percentage();
                let bar = match file.status {
                    UploadStatus::Completed => bar.fill(SUCCESS_GREEN),
                    UploadStatus::Error(_) => bar.fill(ERROR_RED),
                    _ => bar.fill(ACCENT).animate(true),
                };
                ui.add(bar);

                match &file.status {
                    UploadStatus::Pending => {
                        ui.colored_label(MUTED, "⏳ Waiting...");
                    }
                    UploadStatus::Error(message) => {
                        ui.colored_label(ERROR_RED, format!("❌ {}", message));
                    }
                    _ => {}
                }
            });
        });
    });
}

fn render_file_card(ui: &mut egui::Ui, file: &TrackedFile, actions: &mut Vec<Action>) {
    ui.group(|ui| {
        ui.set_width(CARD_WIDTH);
        ui.vertical_centered(|ui| {
            ui.with_layout(egui::Layout::right_to_left(Align::Min), |ui| {
                if ui.small_button("✖").on_hover_text("Hide").clicked() {
                    actions.push(Action::Remove(file.id.clone()));
                }
            });
            ui.label(RichText::new(FileCategory::classify(&file.name).icon()).size(36.0));
            ui.label(RichText::new(&file.name).strong()).on_hover_text(&file.name);
            ui.label(RichText::new(FileSizeUtils::format_size(file.size)).small().color(MUTED));

            let busy = file.status == UploadStatus::Uploading;
            ui.horizontal(|ui| {
                let download = ui.add_enabled(
                    file.remote_location.is_some(),
                    egui::Button::new("⬇").small(),
                );
                if download.on_hover_text("Download").clicked() {
                    if let Some(location) = &file.remote_location {
                        actions.push(Action::Download(location.clone()));
                    }
                }
                let delete = ui.add_enabled(!busy, egui::Button::new("🗑").small());
                if delete.on_hover_text("Delete").clicked() {
                    actions.push(Action::Delete(file.id.clone()));
                }
                if busy {
                    ui.spinner();
                }
            });

            if let Some(message) = file.error_message() {
                ui.colored_label(ERROR_RED, RichText::new(message).small());
            }
        });
    });
}
