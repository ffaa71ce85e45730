use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use lz4pj::{
    compress_with_report,
    io_utils::{io_cli_error, lz4pj_cli_error, simple_cli_error},
    Config,
};

/// Compress a file into the byte-pair LZ format.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// File to compress
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Print a JSON summary on stdout
    #[arg(long)]
    json: bool,
    /// Skip the 3-byte and 2-byte residue measurements
    #[arg(long)]
    no_residue: bool,
    /// Compress but do not write the output file
    #[arg(long)]
    dry_run: bool,
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_logging(args.verbose);
    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let data =
        fs::read(&args.input).map_err(|e| io_cli_error("reading input file", &args.input, e))?;

    let start = Instant::now();
    let config = Config {
        residue_passes: !args.no_residue,
    };
    let compressed = compress_with_report(&data, &config)
        .map_err(|e| lz4pj_cli_error("compression failed", e))?;
    let elapsed = start.elapsed();

    if compressed.bytes.is_empty() {
        return Err(simple_cli_error("compression produced no output").into());
    }

    if !args.dry_run {
        fs::write(&args.output, &compressed.bytes)
            .map_err(|e| io_cli_error("writing output file", &args.output, e))?;
    }

    if args.json {
        let summary = serde_json::json!({
            "input": args.input,
            "output": args.output,
            "input_bytes": data.len(),
            "compressed_bytes": compressed.bytes.len(),
            "ratio_percent": compressed.report.main.ratio(),
            "elapsed_ms": elapsed.as_secs_f64() * 1000.0,
            "passes": compressed.report,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        println!(
            "Input {} {} bytes -> output {} {} bytes ({:.2}%) in {:.3} ms {:.3} MB/s",
            args.input.display(),
            data.len(),
            args.output.display(),
            compressed.bytes.len(),
            compressed.report.main.ratio(),
            secs * 1000.0,
            data.len() as f64 / secs / (1024.0 * 1024.0)
        );
    }
    Ok(())
}
