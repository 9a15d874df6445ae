//! Offline audio render command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use patchbay_config::EngineConfig;
use patchbay_core::{AudioSource, GraphStream};

use super::common::{build_graph, report_issues};

#[derive(Args)]
pub struct RenderArgs {
    /// Graph file (XML)
    graph: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// Duration in seconds
    #[arg(long, default_value = "5.0")]
    seconds: f32,

    /// Bit depth (16, 24 or 32 for float)
    #[arg(long, default_value = "16")]
    bits: u16,
}

pub fn run(args: RenderArgs, config: &EngineConfig) -> anyhow::Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        anyhow::bail!("--seconds must be positive, got {}", args.seconds);
    }
    if !matches!(args.bits, 16 | 24 | 32) {
        anyhow::bail!("--bits must be 16, 24 or 32, got {}", args.bits);
    }

    let graph = build_graph(&args.graph, config)?;
    report_issues(&graph);

    let total = (f64::from(args.seconds) * f64::from(config.sample_rate)).round() as u64;
    let mut stream = GraphStream::new(graph).with_limit(total);

    let spec = WavSpec {
        channels: 1,
        sample_rate: config.sample_rate,
        bits_per_sample: args.bits,
        sample_format: if args.bits == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create '{}'", args.output.display()))?;

    let max_val = (1i64 << (args.bits - 1)) as f32;
    let mut buffer = vec![0.0f32; config.block_size.max(1)];
    let mut peak = 0.0f32;
    loop {
        let n = stream.provide(&mut buffer);
        for &sample in &buffer[..n] {
            peak = peak.max(sample.abs());
            if args.bits == 32 {
                writer.write_sample(sample)?;
            } else {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
        if n < buffer.len() {
            break;
        }
    }
    writer.finalize()?;

    if peak > 1.0 {
        tracing::warn!(peak, "output clipped");
    }
    println!(
        "Rendered {:.2}s ({} samples) to {}",
        args.seconds,
        stream.produced(),
        args.output.display()
    );
    Ok(())
}
