use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::time::Instant;

use i2v_gif::cli::{resolve_settings, Args};
use i2v_gif::utils::{format_duration, init_logger};
use i2v_gif::{build_pipeline, create_video, GenerationForm};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let args = Args::parse();
    init_logger(args.verbose);

    println!(
        "{}",
        style("Image to Video (GIF) Generator").bold().blue()
    );
    println!();

    let (generation, pipeline_settings) =
        resolve_settings(args.config_file.as_deref(), &args.generation, &args.pipeline)?;

    // Same presence checks as the window form
    let form = GenerationForm {
        image_path: args.image_path.clone(),
        prompt: args.prompt.clone(),
        negative_prompt: args.negative_prompt.clone().unwrap_or_default(),
        output_folder: args.output_folder.clone(),
    };
    let request = form.to_request(&generation.negative_prompt)?;

    if args.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Backend: {}", pipeline_settings.backend);
        println!("  Model: {}", pipeline_settings.model_id);
        println!("  Inference steps: {}", generation.num_inference_steps);
        println!("  Guidance scale: {}", generation.guidance_scale);
        println!("  Seed: {}", generation.seed);
        println!("  Negative prompt: {}", request.negative_prompt);
        println!();
    }

    let pipeline = build_pipeline(&pipeline_settings).context("Failed to initialize pipeline")?;

    println!(
        "{} {}",
        style("Generating from").dim(),
        request.image_path.display()
    );
    let video_path = create_video(&pipeline, &request, &generation)?;

    println!(
        "{} {}",
        style("✓ GIF created successfully at:").green().bold(),
        style(video_path.display()).bold()
    );
    println!(
        "{}",
        style(format!("Total time: {}", format_duration(start_time.elapsed()))).dim()
    );

    Ok(())
}
