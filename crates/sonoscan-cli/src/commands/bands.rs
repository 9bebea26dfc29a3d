//! Band layout listing.

use clap::Args;
use sonoscan_core::BandMap;

use super::common::ConfigSource;

#[derive(Args)]
pub struct BandsArgs {
    /// Also list which FFT bins fall in each band
    #[arg(long)]
    bins: bool,
}

pub fn run(args: BandsArgs, source: &ConfigSource) -> anyhow::Result<()> {
    let config = source.load()?;
    let settings = config.engine_settings();
    let map = BandMap::new(
        settings.sample_rate,
        settings.fft_size,
        settings.num_bands,
        settings.min_hz,
        settings.max_hz,
    );

    println!(
        "{} bands, {:.0}-{:.0} Hz, FFT {} at {} Hz (ratio {:.4})\n",
        map.num_bands(),
        map.min_hz(),
        map.max_hz(),
        map.fft_size(),
        settings.sample_rate,
        map.ratio()
    );
    println!("{:>4}  {:>4}  {:>9}  {:>9}  {:>9}  {:>5}", "band", "row", "low Hz", "center", "high Hz", "bins");

    let height = config.grid.height;
    for band in 0..map.num_bands() {
        let (low, high) = map.band_range(band);
        let bins: Vec<usize> = (0..map.num_bins())
            .filter(|&bin| map.band_of_bin(bin) == band)
            .collect();
        // band 0 is the bottom grid row
        let row = height - 1 - band;
        print!(
            "{:>4}  {:>4}  {:>9.1}  {:>9.1}  {:>9.1}  {:>5}",
            band,
            row,
            low,
            map.center(band),
            high,
            bins.len()
        );
        if args.bins && !bins.is_empty() {
            print!("  [{}..={}]", bins[0], bins[bins.len() - 1]);
        }
        println!();
    }
    Ok(())
}
