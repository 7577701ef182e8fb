use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use std::time::Instant;

use face_autocrop::cli::{Args, DetectorChoice};
use face_autocrop::image_processing::face_detection::{CommandLocator, FaceLocator, RustfaceLocator};
use face_autocrop::image_processing::fallback::{run_fallback_if_needed, FallbackConfig, FallbackOutcome};
use face_autocrop::image_processing::report::{CropReport, ReportEntry};
use face_autocrop::image_processing::{ProcessingConfig, ProcessingEngine, ProcessingResult, Route};
use face_autocrop::utils::{
    create_progress_bar, display_name, format_duration, info_println, validate_inputs,
    verbose_println, ProcessingStats,
};
use face_autocrop::{CropError, JsonMessage};

fn create_locator(args: &Args) -> Result<Box<dyn FaceLocator>> {
    let choice = args.detector().map_err(|e| anyhow::anyhow!(e))?;
    let locator: Box<dyn FaceLocator> = match choice {
        DetectorChoice::Model(model_path) => Box::new(RustfaceLocator::new(&model_path)?),
        DetectorChoice::Command { program, args } => Box::new(CommandLocator::new(program, args)),
    };
    Ok(locator)
}

fn collect_stats(
    results: &[Result<ProcessingResult, CropError>],
    total_duration: std::time::Duration,
) -> ProcessingStats {
    let mut stats = ProcessingStats {
        total_files: results.len(),
        total_duration,
        ..Default::default()
    };

    for result in results {
        match result {
            Ok(r) if r.route == Route::Succeeded => stats.with_face += 1,
            Ok(_) => stats.without_face += 1,
            Err(_) => stats.failed += 1,
        }
    }
    stats
}

fn print_summary(stats: &ProcessingStats, args: &Args, dry_run: bool) {
    let header = if dry_run {
        style("Dry Run Results Summary:").bold().cyan()
    } else {
        style("Results Summary:").bold().green()
    };
    println!();
    println!("{}", header);
    println!(
        "  Faces detected (output): {}",
        style(stats.with_face).bold().green()
    );
    println!(
        "  No face, center crop (failed): {}",
        style(stats.without_face).bold().yellow()
    );
    if stats.failed > 0 {
        println!("  Skipped (no output): {}", style(stats.failed).bold().red());
    }
    if stats.successful() > 0 {
        println!("  Face detection rate: {:.1}%", stats.face_rate());
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(stats.total_duration)).bold()
    );
    println!(
        "  Average time per image: {}",
        style(format_duration(stats.average_duration())).dim()
    );

    println!();
    println!("{}", style("Output folders:").bold().green());
    println!("  With face: {}", args.output_dir().display());
    println!("  Without face: {}", args.failed_dir().display());
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = Args::parse();
    args.load_and_merge_config()?;

    let json = args.json_progress;

    if !json {
        println!("{}", style("Face Auto-Crop").bold().blue());
        println!("{}", style("--- Starting face detection and cropping ---").dim());
        println!();
    }

    // Anything wrong here is fatal: nothing has been processed yet
    validate_inputs(&args)?;

    let config = ProcessingConfig {
        input_dir: args.input_dir(),
        output_dir: args.output_dir(),
        failed_dir: args.failed_dir(),
        debug_dir: args.debug_dir(),
        extensions: args.parse_extensions(),
        verbose: args.verbose && !json,
        debug: args.debug,
        dry_run: args.dry_run,
        json_progress: json,
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Input: {}", config.input_dir.display());
        println!("  Output: {}", config.output_dir.display());
        println!("  Failed: {}", config.failed_dir.display());
        println!("  Extensions: {:?}", config.extensions);
        println!("  Detector: {:?}", args.detector().ok());
        match &args.fallback_script {
            Some(script) => println!("  Fallback script: {}", script.display()),
            None => println!("  Fallback script: not configured"),
        }
        if config.debug {
            println!("  Debug overlays: {}", config.debug_dir.display());
        }
        if config.dry_run {
            println!("  Dry run mode: enabled (no files will be written)");
        }
        println!();
    }

    let extensions = config.extensions.clone();
    let locator = create_locator(&args).context("Failed to initialize face detector")?;
    let mut engine = ProcessingEngine::new(config, locator);

    engine.prepare_output_dirs()?;

    if !json {
        info_println(&format!(
            "Looking for images in: {}",
            engine.config().input_dir.display()
        ));
    }
    let image_files = engine.discover_images()?;

    if image_files.is_empty() && !json {
        info_println(&format!(
            "No image files found in '{}'. Please place images there to process.",
            engine.config().input_dir.display()
        ));
    }

    let progress = if json || image_files.is_empty() {
        ProgressBar::hidden()
    } else {
        create_progress_bar(image_files.len() as u64)
    };

    let results = engine.process_batch(&image_files, &progress);
    progress.finish_and_clear();

    let stats = collect_stats(&results, start_time.elapsed());

    if args.report && !json {
        let mut report = CropReport::new();
        for (path, result) in image_files.iter().zip(&results) {
            report.add(ReportEntry::from_result(&display_name(path), result));
        }
        report.print();
    }

    if args.dry_run {
        verbose_println(
            args.verbose && !json,
            "Dry run mode: skipping fallback detector",
        );
    } else {
        let fallback = FallbackConfig {
            script: args.fallback_script.clone(),
            interpreter: args.fallback_interpreter(),
            quiet: json,
        };
        let outcome = run_fallback_if_needed(&fallback, &args.failed_dir(), &extensions)?;

        if json {
            let (pending, label) = match &outcome {
                FallbackOutcome::NotNeeded => (0, "not_needed".to_string()),
                FallbackOutcome::NotConfigured { pending } => (*pending, "not_configured".to_string()),
                FallbackOutcome::Completed { pending } => (*pending, "completed".to_string()),
                FallbackOutcome::Failed { pending, status } => (
                    *pending,
                    match status {
                        Some(code) => format!("failed ({})", code),
                        None => "failed".to_string(),
                    },
                ),
            };
            JsonMessage::Fallback {
                pending,
                outcome: label,
            }
            .emit();
        }
    }

    if json {
        JsonMessage::summary(
            stats.total_files,
            stats.with_face,
            stats.without_face,
            stats.failed,
            start_time.elapsed().as_secs_f64(),
        );
    } else {
        print_summary(&stats, &args, args.dry_run);
        println!();
        println!("{}", style("--- Face detection and cropping complete ---").dim());
    }

    Ok(())
}
