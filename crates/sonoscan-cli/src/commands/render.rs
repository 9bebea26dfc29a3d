//! Offline rendering of a synthetic scene.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sonoscan_io::{StereoWavWriter, WavSpec};
use sonoscan_scene::SyntheticScene;

use super::common::{ConfigSource, Pipeline, dbfs};

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Length in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Synthetic sensor width in pixels
    #[arg(long, default_value = "160")]
    scene_width: usize,

    /// Synthetic sensor height in pixels
    #[arg(long, default_value = "120")]
    scene_height: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: RenderArgs, source: &ConfigSource) -> anyhow::Result<()> {
    if !(args.duration.is_finite() && args.duration > 0.0) {
        anyhow::bail!("Duration must be positive, got {}", args.duration);
    }
    if !matches!(args.bit_depth, 16 | 24 | 32) {
        anyhow::bail!("Unsupported bit depth {} (use 16, 24 or 32)", args.bit_depth);
    }

    let config = source.load()?;
    let sample_rate = config.audio.sample_rate;
    let total_frames = (args.duration * f64::from(sample_rate)).round() as u64;
    // one scan tick per chunk, like the live scan thread
    let tick_frames = (f64::from(sample_rate) / f64::from(config.scan.tick_rate_hz))
        .round()
        .max(1.0) as usize;
    let classify_every = config.classify_interval().as_secs_f64();

    let scene = SyntheticScene::demo(args.scene_width, args.scene_height);
    let (mut pipeline, mut engine) = Pipeline::build(&config, scene);

    println!(
        "Rendering {:.1}s at {} Hz ({}x{} grid, {} ms sweep)...",
        args.duration, sample_rate, config.grid.width, config.grid.height, config.scan.period_ms
    );

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: args.bit_depth,
    };
    let mut writer = StereoWavWriter::create(&args.output, spec)?;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total_frames)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    pipeline.control.start();
    let mut left = vec![0.0f32; tick_frames];
    let mut right = vec![0.0f32; tick_frames];
    let mut written = 0u64;
    let mut next_classify = 0.0f64;
    let mut peak = 0.0f32;
    let mut sum_sq = 0.0f64;

    while written < total_frames {
        let t = written as f64 / f64::from(sample_rate);
        pipeline.ingest_depth(t);
        if t >= next_classify {
            pipeline.ingest_classes(t);
            next_classify = t + classify_every;
        }
        pipeline.scan.tick_at(t);

        let n = tick_frames.min((total_frames - written) as usize);
        engine.render(&mut left[..n], &mut right[..n]);
        writer.write_block(&left[..n], &right[..n])?;

        for &s in left[..n].iter().chain(&right[..n]) {
            peak = peak.max(s.abs());
            sum_sq += f64::from(s) * f64::from(s);
        }
        written += n as u64;
        pb.set_position(written);
    }
    pb.finish_with_message("done");
    pipeline.control.stop();
    writer.finalize()?;

    let rms = if written > 0 {
        (sum_sq / (2 * written) as f64).sqrt() as f32
    } else {
        0.0
    };
    let stats = engine.stats();
    println!("\nStats:");
    println!("  Peak {:.1} dBFS, RMS {:.1} dBFS", dbfs(peak), dbfs(rms));
    println!(
        "  {} blocks, {} instabilities healed",
        stats.blocks_rendered, stats.instabilities_healed
    );
    println!("\nWrote {}", args.output.display());
    tracing::info!(frames = written, path = %args.output.display(), "render complete");

    Ok(())
}
