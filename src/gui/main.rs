// GUI entry point for i2v-gif
// This binary provides the desktop window around the generation call

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use i2v_gif::build_pipeline;
use i2v_gif::cli::{resolve_settings, GuiArgs};
use i2v_gif::utils::init_logger;

mod app;
mod native;

use app::I2vGifApp;
use native::{NativeDialogs, NativePicker};

fn main() -> Result<()> {
    let args = GuiArgs::parse();
    init_logger(args.verbose);

    let (generation, pipeline_settings) =
        resolve_settings(args.config_file.as_deref(), &args.generation, &args.pipeline)?;

    // Loaded once and reused for every request
    let pipeline = match build_pipeline(&pipeline_settings) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("Failed to initialize pipeline: {}", e);
            native::show_startup_error(&e.to_string());
            return Err(e).context("Failed to initialize pipeline");
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 260.0])
            .with_min_inner_size([520.0, 220.0]),
        ..Default::default()
    };

    let app = I2vGifApp::new(pipeline, generation, NativeDialogs, NativePicker);

    eframe::run_native(
        "Image to Video (GIF) Generator",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}
