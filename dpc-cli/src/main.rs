mod commands;
mod init;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "isp-sim")]
#[command(version, about = "ISP defective pixel correction simulator", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, value_name = "FILTER", default_value = "info")]
    log_level: String,

    /// Also write daily rolling log files into this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Number base of pixel text files.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RadixArg {
    Hex,
    Dec,
}

impl From<RadixArg> for dpc::Radix {
    fn from(arg: RadixArg) -> Self {
        match arg {
            RadixArg::Hex => dpc::Radix::Hex,
            RadixArg::Dec => dpc::Radix::Decimal,
        }
    }
}

/// Serialization format for `registers --format`.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for common::SerdeFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => common::SerdeFormat::Json,
            FormatArg::Yaml => common::SerdeFormat::Yaml,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full simulation described by a config file: source, crop, DPC
    Run {
        /// Simulator config (JSON or YAML)
        #[arg(short, long, value_name = "FILE", default_value = "vibe.json")]
        config: PathBuf,
    },

    /// Run DPC on a pixel text file
    Process {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(long)]
        width: i64,

        #[arg(long)]
        height: i64,

        /// Minimum difference to every immediate neighbor for a defect
        #[arg(long, default_value_t = 30)]
        threshold: i64,

        /// Pass the frame through unchanged
        #[arg(long)]
        disable: bool,

        /// Sensor bit depth, selects the output hex width
        #[arg(long, default_value_t = 12)]
        bits: u32,

        #[arg(long, value_enum, default_value = "hex")]
        radix: RadixArg,
    },

    /// Generate a random frame, optionally with injected hot and dead pixels
    Generate {
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(long)]
        width: usize,

        #[arg(long)]
        height: usize,

        #[arg(long, default_value_t = 12)]
        bits: u32,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Number of hot or dead pixels to inject
        #[arg(long, default_value_t = 0)]
        defects: usize,
    },

    /// Crop a pixel text file to an inclusive window
    Crop {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(long)]
        width: usize,

        #[arg(long)]
        height: usize,

        #[arg(long)]
        start_x: i64,

        #[arg(long)]
        start_y: i64,

        #[arg(long)]
        end_x: i64,

        #[arg(long)]
        end_y: i64,

        #[arg(long, default_value_t = 12)]
        bits: u32,

        #[arg(long, value_enum, default_value = "hex")]
        radix: RadixArg,
    },

    /// Compare two pixel text files; exits with status 1 on any difference
    Compare {
        #[arg(value_name = "EXPECTED")]
        expected: PathBuf,

        #[arg(value_name = "ACTUAL")]
        actual: PathBuf,

        #[arg(long, value_enum, default_value = "hex")]
        radix: RadixArg,

        /// Number of mismatches to print
        #[arg(long, default_value_t = 10)]
        show: usize,
    },

    /// Compare every alg_* output in a config against its hls_* counterpart
    CompareOutputs {
        #[arg(short, long, value_name = "FILE", default_value = "vibe.json")]
        config: PathBuf,
    },

    /// Print registers from a CSV register table or a simulator config
    Registers {
        #[arg(long, value_name = "FILE", conflicts_with = "config")]
        table: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print as CSV instead of a table
        #[arg(long)]
        csv: bool,

        /// Print as a `register_info` block in this format
        #[arg(long, value_enum, conflicts_with = "csv")]
        format: Option<FormatArg>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init::init(&cli.log_level, cli.log_dir);

    match cli.command {
        Commands::Run { config } => commands::run(&config),
        Commands::Process {
            input,
            output,
            width,
            height,
            threshold,
            disable,
            bits,
            radix,
        } => commands::process(
            &input,
            &output,
            dpc::FrameConfig::new(width, height, !disable, threshold),
            bits,
            radix.into(),
        ),
        Commands::Generate {
            output,
            width,
            height,
            bits,
            seed,
            defects,
        } => commands::generate(&output, width, height, bits, seed, defects),
        Commands::Crop {
            input,
            output,
            width,
            height,
            start_x,
            start_y,
            end_x,
            end_y,
            bits,
            radix,
        } => commands::crop(
            &input,
            &output,
            (width, height),
            dpc::CropWindow::new(start_x, start_y, end_x, end_y),
            bits,
            radix.into(),
        ),
        Commands::Compare {
            expected,
            actual,
            radix,
            show,
        } => commands::compare(&expected, &actual, radix.into(), show),
        Commands::CompareOutputs { config } => commands::compare_outputs(&config),
        Commands::Registers {
            table,
            config,
            csv,
            format,
        } => commands::registers(
            table.as_deref(),
            config.as_deref(),
            csv,
            format.map(Into::into),
        ),
    }
}
