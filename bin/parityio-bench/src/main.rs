//! ParityIO Bench - erasure coding throughput harness
//!
//! Encodes random data, erases a random set of data columns, substitutes
//! parity into them, decodes in place and checks the result. Reports
//! encode and decode throughput as log lines or as a JSON document.

use anyhow::Result;
use clap::Parser;
use parityio_common::{Config, ErasureConfig, Error, LogFormat};
use parityio_erasure::shard::substitute_parity;
use parityio_erasure::{Decoder, Encoder, ErasureIndex};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "parityio-bench")]
#[command(about = "ParityIO erasure coding benchmark")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Erasure scheme as data+parity, e.g. 10+6 (overrides the config file)
    #[arg(short, long)]
    scheme: Option<ErasureConfig>,

    /// Rows per buffer, i.e. bytes per shard
    #[arg(short, long, default_value_t = 1 << 16)]
    rows: usize,

    /// Data columns erased per iteration (defaults to the parity count)
    #[arg(short, long)]
    erasures: Option<usize>,

    /// Number of timed iterations
    #[arg(short = 'n', long, default_value_t = 10)]
    iterations: u32,

    /// Seed for data and erasure patterns
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,
}

/// Benchmark results
#[derive(Debug, Serialize)]
struct Report {
    scheme: String,
    rows: usize,
    erasures: usize,
    iterations: u32,
    data_bytes: usize,
    encode_mib_per_sec: f64,
    decode_mib_per_sec: f64,
    verified: bool,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path).map_err(Error::from)?;
    toml::from_str(&text).map_err(|e| {
        Error::configuration(format!("failed to parse {}: {e}", path.display())).into()
    })
}

fn init_logging(level: &str, format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Pick `erasures` distinct data columns and pair them with distinct parity shards
fn random_pattern(
    rng: &mut StdRng,
    data_shards: usize,
    parity_shards: usize,
    erasures: usize,
) -> Vec<ErasureIndex> {
    let columns = sample(rng, data_shards, erasures).into_vec();
    let parity = sample(rng, parity_shards, erasures).into_vec();
    columns
        .into_iter()
        .zip(parity)
        .map(ErasureIndex::from)
        .collect()
}

fn mib_per_sec(bytes: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    bytes as f64 / secs / f64::from(1u32 << 20)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let level = args.log_level.unwrap_or(config.logging.level);
    init_logging(&level, config.logging.format);

    let scheme = args.scheme.unwrap_or(config.erasure);
    scheme.validate()?;
    let k = usize::from(scheme.data_shards);
    let m = usize::from(scheme.parity_shards);
    let erasures = args.erasures.unwrap_or(m);
    if erasures > m.min(k) {
        return Err(Error::invalid_argument(format!(
            "{erasures} erasures exceed what {scheme} can recover"
        ))
        .into());
    }
    if args.rows == 0 || args.iterations == 0 {
        return Err(Error::invalid_argument("rows and iterations must be > 0").into());
    }

    let encoder = Encoder::new(k, m).map_err(Error::from)?;
    let decoder = Decoder::new(k, m).map_err(Error::from)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut data = vec![0u8; k * args.rows];
    rng.fill_bytes(&mut data);
    let mut parity = vec![0u8; m * args.rows];

    info!(
        %scheme,
        rows = args.rows,
        erasures,
        iterations = args.iterations,
        "starting benchmark"
    );

    let mut encode_time = Duration::ZERO;
    let mut decode_time = Duration::ZERO;
    let mut verified = true;
    for iteration in 0..args.iterations {
        let start = Instant::now();
        encoder.encode(&data, &mut parity).map_err(Error::from)?;
        encode_time += start.elapsed();

        let indexes = random_pattern(&mut rng, k, m, erasures);
        let mut buffer = data.clone();
        substitute_parity(&mut buffer, k, &parity, m, &indexes).map_err(Error::from)?;

        let start = Instant::now();
        decoder.decode(&mut buffer, &indexes).map_err(Error::from)?;
        decode_time += start.elapsed();

        if buffer == data {
            debug!(iteration, erasures = indexes.len(), "round trip ok");
        } else {
            warn!(iteration, ?indexes, "decoded buffer differs from original");
            verified = false;
        }
    }

    let total = data.len() * args.iterations as usize;
    let report = Report {
        scheme: scheme.to_string(),
        rows: args.rows,
        erasures,
        iterations: args.iterations,
        data_bytes: data.len(),
        encode_mib_per_sec: mib_per_sec(total, encode_time),
        decode_mib_per_sec: mib_per_sec(total, decode_time),
        verified,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        println!("{json}");
    } else {
        info!(
            scheme = %report.scheme,
            encode_mib_per_sec = report.encode_mib_per_sec,
            decode_mib_per_sec = report.decode_mib_per_sec,
            verified,
            "benchmark complete"
        );
    }

    if !verified {
        return Err(Error::ErasureCoding("decoded data did not match the original".into()).into());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<Error>().map_or(1, Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
