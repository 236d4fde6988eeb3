mod cli_utils;
mod commands;
mod reference_loader;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_match, cmd_parse};

#[derive(Parser)]
#[command(name = "ipmatch")]
#[command(
    about = "Match IPv4 source lists against reference network inventories",
    long_about = "ipmatch - Overlap matching of IPv4 addresses, CIDR blocks, and ranges\n\n\
    Parses a source list of IPv4 identifiers (single addresses, CIDR blocks, \n\
    inclusive ranges) and reports, for each entry, every overlapping entry of a \n\
    reference list. References come from plain text or from CSV inventory exports.\n\n\
    Features:\n\
      • Single / CIDR / range tokens, mixed freely, comma or newline delimited\n\
      • All overlapping reference entries reported, most specific first\n\
      • CSV inventory import with tolerant header matching and level filtering\n\
      • Text, NDJSON, and CSV result rendering\n\
      • Live progress on stderr, Ctrl-C cancels cleanly\n\n\
    Examples:\n\
      ipmatch match --source hosts.txt --reference inventory.csv\n\
      ipmatch match --source - --reference networks.txt --format json\n\
      ipmatch parse hosts.txt --stats"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a source list against a reference list
    Match {
        /// Source list file (tokens separated by commas/newlines), or "-" for stdin
        #[arg(short, long, value_name = "FILE")]
        source: PathBuf,

        /// Reference list file: plain text tokens or a CSV inventory export
        #[arg(short, long, value_name = "FILE")]
        reference: PathBuf,

        /// Reference format: auto (by extension), text, or csv
        #[arg(long, default_value = "auto")]
        reference_format: String,

        /// Output format: text (source -> matches), json (NDJSON), or csv (six-column table)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Show live progress on stderr
        #[arg(short, long)]
        progress: bool,

        /// Show parse/match statistics on stderr
        #[arg(long)]
        stats: bool,
    },

    /// Parse a token list and show what each token was detected as
    Parse {
        /// Input file, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show aggregate parse statistics on stderr
        #[arg(long)]
        stats: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let outcome: Result<i32> = match cli.command {
        Commands::Match {
            source,
            reference,
            reference_format,
            format,
            progress,
            stats,
        } => cmd_match(
            source,
            reference,
            &reference_format,
            &format,
            progress,
            stats,
        ),
        Commands::Parse { input, stats } => cmd_parse(input, stats),
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let message = format!("{:#}", err);
            let truncated: String = message.chars().take(300).collect();
            eprintln!("Error: {}", truncated);
            std::process::exit(2);
        }
    }
}
