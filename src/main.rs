use drop_uploader::app::FileManagerApp;
use drop_uploader::upload::ManagerConfig;
use eframe::{egui, App, CreationContext};
use tokio::runtime::Runtime;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    init_logging();

    let config = match ManagerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    // Uploads, listings and deletes run here; the UI thread only polls results.
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 500.0]),
        ..Default::default()
    };

    info!("Starting file manager");
    let result = eframe::run_native(
        "File Manager",
        options,
        Box::new(move |cc: &CreationContext<'_>| -> Box<dyn App> {
            match FileManagerApp::new(cc, config, handle) {
                Ok(app) => Box::new(app),
                Err(e) => {
                    error!(error = %e, "Failed to initialize");
                    std::process::exit(2);
                }
            }
        }),
    );

    runtime.shutdown_background();
    result
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("drop_uploader=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
