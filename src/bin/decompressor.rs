use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use lz4pj::{
    decompress_with_limit, default_output_limit,
    io_utils::{io_cli_error, lz4pj_cli_error},
    PassParams,
};

/// Decode a file written by the compressor. Validation tool; the stream
/// carries no parameters, so the main pass settings are assumed.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Compressed input file
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Refuse to produce more than this many bytes
    /// [default: 1024 x input size, at least 64 MiB]
    #[arg(long)]
    limit: Option<usize>,
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
    let level = match args.verbose {
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

    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let data =
        fs::read(&args.input).map_err(|e| io_cli_error("reading input file", &args.input, e))?;
    let limit = args
        .limit
        .unwrap_or_else(|| default_output_limit(data.len()));
    let decompressed = decompress_with_limit(&data, &PassParams::MAIN, limit)
        .map_err(|e| lz4pj_cli_error("decompression failed", e))?;
    info!(
        input = data.len(),
        output = decompressed.len(),
        "decompressed"
    );
    fs::write(&args.output, &decompressed)
        .map_err(|e| io_cli_error("writing output file", &args.output, e))?;
    Ok(())
}
