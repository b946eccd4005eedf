//! DBC Network CLI
//!
//! Command-line frontend over the dbc-network library:
//! - `dbc2 <format> <dbc-file>` re-emits a database through one of the
//!   serializers (`C`, `DBC`, or `human`)
//! - `decode <iface> <dbc-file>` reads candump-style lines from stdin and
//!   prints each matching frame with its decoded signals

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dbc_network::{frame_decoder, load_network_from_file, Network};
use std::io::BufRead;
use std::path::{Path, PathBuf};

mod candump;

/// DBC Network - inspect CAN databases and decode candump traffic
#[derive(Parser, Debug)]
#[command(name = "dbc-network-cli")]
#[command(about = "Inspect DBC databases and decode candump traffic", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a database and emit it through a serializer
    Dbc2 {
        /// Output format: C, DBC, or human
        format: String,
        /// Path to the DBC file
        file: PathBuf,
    },
    /// Load a database and decode candump lines from standard input
    Decode {
        /// Interface name to match (e.g. vcan0)
        interface: String,
        /// Path to the DBC file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Argument failures exit with 1 (help and version requests with 0)
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(args.verbose, args.quiet);

    log::info!("dbc-network-cli v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using library v{}", dbc_network::VERSION);

    match &args.command {
        Command::Dbc2 { format, file } => dbc2(format, file),
        Command::Decode { interface, file } => decode(interface, file),
    }
}

/// Load a network or fail with the path in the message.
fn load(file: &Path) -> Result<Network> {
    load_network_from_file(file)?
        .ok_or_else(|| anyhow!("could not load a network from {:?}", file))
}

fn dbc2(format: &str, file: &Path) -> Result<()> {
    let network = load(file)?;
    let output = match format {
        "C" => dbc_network::serialize::network_to_c(&network),
        "DBC" => dbc_network::serialize::network_to_dbc(&network),
        "human" => dbc_network::serialize::network_to_human(&network),
        other => {
            return Err(anyhow!(
                "unknown format '{}', expected one of: C, DBC, human",
                other
            ));
        }
    };
    print!("{}", output);
    Ok(())
}

fn decode(interface: &str, file: &Path) -> Result<()> {
    let network = load(file)?;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let Some(frame) = candump::parse_line(&line) else {
            log::debug!("skipping unparseable line: {}", line);
            continue;
        };
        if frame.interface != interface {
            continue;
        }
        let Some(message) = network.message_by_can_id(frame.can_id) else {
            log::debug!("no message with id 0x{:X}", frame.can_id);
            continue;
        };
        let signals = frame_decoder::decode_frame(message, &frame.data);
        println!("{}", candump::format_decoded(&line, message, &signals));
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
