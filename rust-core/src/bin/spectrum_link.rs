//! Command line front end
//!
//! `simulate` drives the real-time pipeline from a synthetic transmitter,
//! `analyze` compresses recorded samples offline and `decode` reads packets
//! back the way the host receiver does.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use spectrum_link::config::{AMPLITUDE_THRESHOLD, WINDOW_SIZE};
use spectrum_link::packet::{CompressionStats, PacketDecoder};
use spectrum_link::pipeline::{self, PipelineRunner, SerialLine, Ticker};
use spectrum_link::signal::{self, Tone};
use spectrum_link::PipelineConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "spectrum-link",
    version,
    about = "Real-time spectrum analyzer pipeline",
    long_about = "Windows a stream of f32 samples, computes the real FFT of each window and \
                  sends only the bins within a threshold of the peak."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run both tasks against a synthetic transmitter
    Simulate(SimulateArgs),
    /// Compress recorded little-endian f32 samples
    Analyze(AnalyzeArgs),
    /// Decode a packet stream
    Decode(DecodeArgs),
}

#[derive(Args)]
struct PipelineArgs {
    /// Samples per window (power of two)
    #[arg(long, default_value_t = WINDOW_SIZE)]
    window_size: usize,

    /// Fraction of the peak amplitude a bin needs to be sent
    #[arg(long, default_value_t = AMPLITUDE_THRESHOLD)]
    threshold: f32,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Windows to transmit
    #[arg(long, default_value_t = 16)]
    windows: usize,

    /// Sampling interval in microseconds
    #[arg(long, default_value_t = 1000)]
    interval_us: u64,

    /// Transmit a tone at this bin instead of the demo signal
    #[arg(long)]
    tone: Option<usize>,

    /// Write packets to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Raw sample file
    #[arg(long)]
    input: PathBuf,

    /// Packet output file
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args)]
struct DecodeArgs {
    /// Packet file
    #[arg(long)]
    input: PathBuf,

    /// Samples per window used by the transmitter
    #[arg(long, default_value_t = WINDOW_SIZE)]
    window_size: usize,

    /// Print the reconstructed samples of each window
    #[arg(long)]
    reconstruct: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Simulate(args) => simulate(args),
        Command::Analyze(args) => analyze(args),
        Command::Decode(args) => decode(args),
    }
}

fn config(args: &PipelineArgs, interval: Duration) -> Result<PipelineConfig> {
    let config = PipelineConfig {
        window_size: args.window_size,
        amplitude_threshold: args.threshold,
        sampling_interval: interval,
        ..PipelineConfig::default()
    };
    config.validate().context("Invalid pipeline configuration")?;
    Ok(config)
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let interval = Duration::from_micros(args.interval_us);
    let config = config(&args.pipeline, interval)?;
    let n = config.window_size;

    let samples = match args.tone {
        Some(bin) => {
            let window = signal::synthesize(n, &[Tone::new(bin, 1.0, 0.0)]);
            window.repeat(args.windows)
        }
        None => signal::demo_samples(n * args.windows, interval),
    };

    let sink: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::sink()),
    };

    let (mut writer, reader) = SerialLine::new(n * 4 * 4);
    let runner = PipelineRunner::start(&config, reader, sink)?;

    let transmitter = std::thread::spawn(move || {
        let mut ticker = Ticker::new(interval);
        for &sample in &samples {
            while !writer.write_sample(sample) {
                if writer.is_halted() {
                    return;
                }
                std::thread::yield_now();
            }
            ticker.wait();
        }
        writer.close();
    });

    let summary = runner.join()?;
    if transmitter.join().is_err() {
        bail!("Transmitter thread panicked");
    }

    println!("Windows published: {}", summary.windows_published);
    println!(
        "Packets sent: {} ({} silent, {} cycles skipped)",
        summary.packets, summary.silent_packets, summary.skipped_cycles
    );
    print_stats(&summary.stats);

    if let Some(window) = summary.missed_deadline {
        bail!("Missed deadline at window {}", window);
    }
    Ok(())
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let config = config(&args.pipeline, spectrum_link::config::SAMPLING_INTERVAL)?;

    let samples = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut output = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?,
    );

    let stats = pipeline::analyze_offline(&config, &samples, &mut output)?;
    output.flush()?;

    print_stats(&stats);
    Ok(())
}

fn decode(args: DecodeArgs) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let mut decoder = PacketDecoder::new(args.window_size)?;
    let frames = decoder.push(&bytes)?;
    if decoder.pending_bytes() > 0 {
        log::warn!("{} trailing bytes do not form a complete packet", decoder.pending_bytes());
    }

    for (i, frame) in frames.iter().enumerate() {
        let bins: Vec<String> = frame
            .indices
            .iter()
            .map(|&index| {
                let value = frame.bins[index as usize];
                format!("{}:{:.3}", index, value.norm())
            })
            .collect();
        println!("window {}: [{}]", i, bins.join(", "));

        if args.reconstruct {
            let samples = frame.reconstruct()?;
            let samples: Vec<String> = samples.iter().map(|s| format!("{:.3}", s)).collect();
            println!("  {}", samples.join(" "));
        }
    }

    println!("{} packets decoded", frames.len());
    Ok(())
}

fn print_stats(stats: &CompressionStats) {
    println!(
        "Compression: {} bytes sent for {} raw bytes ({:.1}% saved, {:.2} entries per window)",
        stats.packet_bytes(),
        stats.raw_bytes(),
        stats.compression_ratio() * 100.0,
        stats.mean_entries()
    );
}
