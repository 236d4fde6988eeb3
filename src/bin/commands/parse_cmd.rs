use anyhow::Result;
use ipmatch::{parser, AddressKind};
use std::io::Write;
use std::path::PathBuf;

use crate::cli_utils::{format_number, read_input};

pub fn cmd_parse(input: PathBuf, stats: bool) -> Result<i32> {
    let text = read_input(&input)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut seen = 0usize;
    let mut parsed = 0usize;
    let mut singles = 0usize;
    let mut cidrs = 0usize;
    let mut ranges = 0usize;

    for token in parser::split_tokens(&text) {
        seen += 1;
        match parser::parse_token(token) {
            Ok(value) => {
                parsed += 1;
                match value.kind() {
                    AddressKind::Single => singles += 1,
                    AddressKind::Cidr => cidrs += 1,
                    AddressKind::Range => ranges += 1,
                }
                writeln!(out, "{}\t{}\t{}", token, value.kind(), value)?;
            }
            Err(err) => {
                writeln!(out, "{}\tinvalid\t{}", token, err)?;
            }
        }
    }

    if stats {
        eprintln!();
        eprintln!(
            "Tokens:  {} total, {} parsed, {} invalid",
            format_number(seen),
            format_number(parsed),
            format_number(seen - parsed)
        );
        eprintln!(
            "Kinds:   {} single, {} CIDR, {} range",
            format_number(singles),
            format_number(cidrs),
            format_number(ranges)
        );
    }

    Ok(0)
}
