//! Audio device listing.

use clap::Args;
use sonoscan_io::{AudioBackend, CpalBackend};

#[derive(Args)]
pub struct DevicesArgs {
    /// Include input-only devices
    #[arg(long)]
    all: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_devices()?;
    let default = backend.default_output_device()?.map(|d| d.name);

    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Audio Output Devices");
    println!("====================\n");
    let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
    for (idx, device) in outputs.iter().enumerate() {
        let marker = if default.as_deref() == Some(device.name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz){}",
            idx, device.name, device.default_sample_rate, marker
        );
    }

    if args.all {
        let inputs: Vec<_> = devices.iter().filter(|d| !d.is_output).collect();
        if !inputs.is_empty() {
            println!("\nInput-only Devices:");
            for device in inputs {
                println!("  {} ({} Hz)", device.name, device.default_sample_rate);
            }
        }
    }

    println!("\nTip: pass a partial name with --output:");
    println!("  sonoscan play --output \"USB\"");
    Ok(())
}
