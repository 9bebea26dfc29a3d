//! Real-time sonification of a synthetic scene.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use sonoscan_io::{AudioBackend, BackendStreamConfig, CpalBackend};
use sonoscan_scene::{ClassificationWorker, SyntheticScene, SyntheticSegmenter};

use super::common::{ConfigSource, Pipeline, match_device_rate};

#[derive(Args)]
pub struct PlayArgs {
    /// Stop after this many seconds (runs until Ctrl+C otherwise)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Output device (partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Audio buffer size in frames
    #[arg(long, default_value = "512")]
    buffer_size: u32,

    /// Synthetic sensor frame rate
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Synthetic sensor width in pixels
    #[arg(long, default_value = "160")]
    scene_width: usize,

    /// Synthetic sensor height in pixels
    #[arg(long, default_value = "120")]
    scene_height: usize,
}

pub fn run(args: PlayArgs, source: &ConfigSource) -> anyhow::Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        anyhow::bail!("Frame rate must be positive, got {}", args.fps);
    }
    let mut config = source.load()?;

    let backend = CpalBackend::new();
    let mut stream_config = BackendStreamConfig {
        sample_rate: config.audio.sample_rate,
        buffer_size: args.buffer_size,
        channels: 2,
        device_name: args.output,
    };
    let actual_rate = backend.actual_sample_rate(&stream_config);
    if match_device_rate(&mut config, actual_rate) {
        stream_config.sample_rate = actual_rate;
    }

    let scene = SyntheticScene::demo(args.scene_width, args.scene_height);
    let segmenter = SyntheticSegmenter::new(scene.clone());
    let (mut pipeline, mut engine) = Pipeline::build(&config, scene);
    let mut worker = ClassificationWorker::spawn(
        segmenter,
        Arc::clone(&pipeline.store),
        config.classify_interval(),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let channels = usize::from(stream_config.channels);
    let stream = backend.build_output_stream(
        &stream_config,
        Box::new(move |data: &mut [f32]| engine.render_interleaved(data, channels)),
        Box::new(|err: &str| tracing::error!(error = err, "audio stream error")),
    )?;

    pipeline.control.start();
    pipeline.scan.start()?;
    println!(
        "Playing ({} ms sweep, {}x{} grid)... Press Ctrl+C to stop.",
        config.scan.period_ms, config.grid.width, config.grid.height
    );

    // the sensor loop: one depth frame per tick, classification offered each time
    let frame = Duration::from_secs_f64(1.0 / args.fps);
    let limit = args.duration.filter(|d| d.is_finite() && *d > 0.0);
    let origin = Instant::now();
    while running.load(Ordering::SeqCst) {
        let t = origin.elapsed().as_secs_f64();
        if limit.is_some_and(|d| t >= d) {
            break;
        }
        pipeline.ingest_depth(t);
        worker.request(t);
        thread::sleep(frame);
    }

    pipeline.scan.stop();
    worker.stop();
    pipeline.control.stop();
    drop(stream);

    let stats = pipeline.control.stats();
    let classify = worker.stats();
    println!(
        "Done. {} blocks rendered, {} instabilities healed, {} classifications ({} dropped).",
        stats.blocks_rendered, stats.instabilities_healed, classify.applied, classify.dropped
    );
    Ok(())
}
