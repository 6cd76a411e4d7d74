#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use log::error;
use ring_life::ringlife::{NullSink, PgmSink, RingLife, RingLifeConfig, RingLifeError, RunReport};

const DEFAULT_OUT_DIR: &str = "images";
const USAGE: &str = "usage: ring-life [--size N] [--probability 0-100] [--steps S] [--workers W] [--seed X] [--out DIR] [--no-images]";

struct MainArgs {
    size: Option<usize>,
    probability: Option<u8>,
    steps: Option<u64>,
    workers: Option<usize>,
    seed: Option<u64>,
    out_dir: PathBuf,
    images: bool,
}

fn parse_value<T: FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, RingLifeError> {
    let raw = args
        .get(i)
        .ok_or_else(|| RingLifeError::Config(format!("{flag} requires a value\n{USAGE}")))?;
    raw.parse()
        .map_err(|_| RingLifeError::Config(format!("{flag}: cannot parse {raw:?}\n{USAGE}")))
}

fn parse_args() -> Result<MainArgs, RingLifeError> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = MainArgs {
        size: None,
        probability: None,
        steps: None,
        workers: None,
        seed: None,
        out_dir: PathBuf::from(DEFAULT_OUT_DIR),
        images: true,
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--size" => {
                i += 1;
                parsed.size = Some(parse_value(&args, i, "--size")?);
            }
            "--probability" => {
                i += 1;
                parsed.probability = Some(parse_value(&args, i, "--probability")?);
            }
            "--steps" => {
                i += 1;
                parsed.steps = Some(parse_value(&args, i, "--steps")?);
            }
            "--workers" => {
                i += 1;
                parsed.workers = Some(parse_value(&args, i, "--workers")?);
            }
            "--seed" => {
                i += 1;
                parsed.seed = Some(parse_value(&args, i, "--seed")?);
            }
            "--out" => {
                i += 1;
                parsed.out_dir = parse_value(&args, i, "--out")?;
            }
            "--no-images" => {
                parsed.images = false;
            }
            other => {
                return Err(RingLifeError::Config(format!(
                    "unknown argument: {other}\n{USAGE}"
                )));
            }
        }
        i += 1;
    }
    Ok(parsed)
}

/// Ask on stdin for a parameter that was not given on the command line.
fn prompt<T: FromStr>(label: &str) -> Result<T, RingLifeError> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    line.parse()
        .map_err(|_| RingLifeError::Config(format!("{label}: cannot parse {line:?}")))
}

fn build_config(args: &MainArgs) -> Result<RingLifeConfig, RingLifeError> {
    let size = match args.size {
        Some(n) => n,
        None => prompt("Enter grid size")?,
    };
    let probability = match args.probability {
        Some(p) => p,
        None => prompt("Enter initial fill probability [0 - 100]")?,
    };
    let steps = match args.steps {
        Some(s) => s,
        None => prompt("Enter steps count")?,
    };

    let mut config = RingLifeConfig::default()
        .size(size)
        .probability(probability)
        .steps(steps);
    if let Some(workers) = args.workers {
        config = config.workers(workers);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    if !args.images {
        config = config.snapshot_every(0);
    }
    Ok(config)
}

/// Returns the report and, when images were written, their directory.
fn run(args: &MainArgs) -> Result<(RunReport, Option<PathBuf>), RingLifeError> {
    let config = build_config(args)?;
    let engine = RingLife::with_config(config)?;
    if args.images {
        let mut sink = PgmSink::new(&args.out_dir)?;
        let report = engine.run(&mut sink)?;
        Ok((report, Some(sink.dir().to_path_buf())))
    } else {
        Ok((engine.run(&mut NullSink)?, None))
    }
}

fn print_summary(report: &RunReport, image_dir: Option<&Path>) {
    println!("==== Execution completed ====");
    println!("Grid size is {}x{}", report.size, report.size);
    println!("Initial population probability is {}%", report.probability);
    println!("{} steps were made", report.generations);
    match image_dir {
        Some(dir) => println!("Images are saved under the {}/ directory", dir.display()),
        None => println!("No images were output"),
    }
    println!("Execution took {:.6} seconds", report.elapsed.as_secs_f64());
    println!("{} workers were used", report.workers);
    println!("Final population is {} (seed {:#x})", report.population, report.seed);
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = parse_args().and_then(|args| {
        let (report, image_dir) = run(&args)?;
        print_summary(&report, image_dir.as_deref());
        Ok(())
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
