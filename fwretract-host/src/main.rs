//! Stream a G-code file through firmware retraction
//!
//! Usage:
//!   fwretract -c printer.toml print.gcode              # Rewritten G-code to stdout
//!   fwretract -c printer.toml -o out.gcode print.gcode
//!   fwretract -c printer.toml --snapshot retract.bin --status print.gcode

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fwretract_host::config::{load_config, load_retraction, save_snapshot};
use fwretract_host::Dispatcher;

#[derive(Parser, Debug)]
#[command(name = "fwretract")]
#[command(about = "Apply firmware retraction and z-hop to a G-code stream")]
struct Args {
    /// Printer configuration (TOML)
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Persisted retraction settings, loaded before and saved after the run
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Output file, stdout if omitted
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print the final retraction status as TOML to stderr
    #[arg(long)]
    status: bool,

    /// G-code input, stdin if omitted
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fwretract=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = load_config(&args.config)?;
    let retraction = load_retraction(&config, args.snapshot.as_deref());
    let mut dispatcher = Dispatcher::from_config(&config, retraction);

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut lines = 0usize;
    for line in input.lines() {
        let line = line.context("reading G-code input")?;
        report(dispatcher.handle_line(&line));
        for out in dispatcher.printer_mut().drain_output() {
            writeln!(output, "{out}")?;
        }
        lines += 1;
    }
    report(dispatcher.finish());
    output.flush()?;

    info!(lines, retracted = dispatcher.machine().is_retracted(), "stream complete");

    if let Some(path) = &args.snapshot {
        save_snapshot(path, dispatcher.machine().config())?;
        info!(path = %path.display(), "retraction settings saved");
    }

    if args.status {
        let status = toml::to_string(&dispatcher.machine().status())
            .context("serializing retraction status")?;
        eprint!("{status}");
    }

    Ok(())
}

/// Echo command responses as G-code comments
fn report(responses: Vec<String>) {
    for response in responses {
        eprintln!("// {response}");
    }
}
