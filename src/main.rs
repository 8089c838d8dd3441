use clap::Parser;
use eframe::egui;
use log::info;

use memeframe::app::MemeApp;
use memeframe::settings::{Args, DEFAULT_WINDOW_SIZE, MIN_WINDOW_SIZE};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let initial_path = args.image_path;

    // Default size if image load fails or no image
    let mut initial_size = DEFAULT_WINDOW_SIZE;

    // Peek at the image size so the window opens at its resolution
    if let Some(path) = &initial_path {
        if let Ok(reader) = image::ImageReader::open(path) {
            if let Ok(dims) = reader.into_dimensions() {
                initial_size = [dims.0 as f32, dims.1 as f32 + 24.0];
            }
        }
    }

    info!("starting memeframe with image: {:?}", initial_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("MemeFX")
            .with_inner_size(initial_size)
            .with_min_inner_size(MIN_WINDOW_SIZE)
            .with_app_id("memeframe")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "memeframe",
        options,
        Box::new(
            |cc: &eframe::CreationContext<'_>| -> Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Box::new(MemeApp::new(cc, initial_path)?))
            },
        ),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
