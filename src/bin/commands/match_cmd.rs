use anyhow::{Context, Result};
use ipmatch::{
    CancelToken, MatchOutcome, MatchSession, ReferenceInput, SessionEvent, SessionRequest,
    SourceInput,
};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;

use crate::cli_utils::{format_number, read_input, ProgressReporter};
use crate::reference_loader::{self, TabularStats};

pub fn cmd_match(
    source: PathBuf,
    reference: PathBuf,
    reference_format: &str,
    format: &str,
    progress: bool,
    stats: bool,
) -> Result<i32> {
    if !matches!(format, "text" | "json" | "csv") {
        anyhow::bail!("Unknown output format: {}. Use 'text', 'json', or 'csv'", format);
    }

    let use_csv = match reference_format {
        "csv" => true,
        "text" => false,
        "auto" => reference
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv")),
        other => anyhow::bail!(
            "Unknown reference format: {}. Use 'auto', 'text', or 'csv'",
            other
        ),
    };

    let source_text = read_input(&source)?;

    let (reference_input, tabular_stats) = if use_csv {
        let (entries, tstats) = reference_loader::load_csv_references(&reference)?;
        (ReferenceInput::Entries(entries), Some(tstats))
    } else {
        let text = read_input(&reference)?;
        (ReferenceInput::Text(text), None)
    };

    // Wire Ctrl-C to the run's cancel token before the worker starts
    let cancel = CancelToken::new();
    {
        let token = cancel.clone();
        ctrlc::set_handler(move || token.cancel())
            .context("Failed to install Ctrl-C handler")?;
    }

    let session = MatchSession::spawn_with_token(
        SessionRequest {
            source: SourceInput::Text(source_text),
            reference: reference_input,
            chunk_size: 0,
            progress_interval: 0,
        },
        cancel,
    );

    let mut reporter = if progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    let outcome = loop {
        match session.events().recv() {
            Ok(SessionEvent::ParseProgress { done, total }) => {
                if let Some(ref mut rep) = reporter {
                    rep.show("Parsing", done, total);
                }
            }
            Ok(SessionEvent::MatchProgress { done, total }) => {
                if let Some(ref mut rep) = reporter {
                    rep.show("Matching", done, total);
                }
            }
            Ok(SessionEvent::Completed(outcome)) => break Some(outcome),
            Ok(SessionEvent::Cancelled) => break None,
            Err(_) => anyhow::bail!("Match worker exited unexpectedly"),
        }
    };
    if let Some(ref mut rep) = reporter {
        rep.finish();
    }

    let Some(outcome) = outcome else {
        eprintln!("Cancelled.");
        return Ok(130);
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        "text" => render_text(&mut out, &outcome)?,
        "json" => render_json(&mut out, &outcome)?,
        "csv" => render_csv(&mut out, &outcome)?,
        _ => unreachable!("validated above"),
    }

    if stats {
        print_stats(&outcome, tabular_stats.as_ref());
    }

    Ok(0)
}

/// Two columns: source -> comma-joined matched names
fn render_text(out: &mut impl Write, outcome: &MatchOutcome) -> Result<()> {
    for result in &outcome.results {
        writeln!(
            out,
            "{} -> {}",
            result.source,
            result.matched_names(&outcome.references).join(", ")
        )?;
    }
    Ok(())
}

/// NDJSON, one object per source with the full matched metadata
fn render_json(out: &mut impl Write, outcome: &MatchOutcome) -> Result<()> {
    for result in &outcome.results {
        let matches: Vec<_> = result
            .matched
            .iter()
            .map(|&id| {
                let entry = &outcome.references[id];
                json!({
                    "network_name": entry.network_name,
                    "location": entry.location,
                    "category": entry.category,
                    "cidr": entry.cidr_text(),
                })
            })
            .collect();
        let line = json!({
            "source": result.source,
            "type": result.kind.as_str(),
            "matched": result.is_matched(),
            "matches": matches,
        });
        writeln!(out, "{}", serde_json::to_string(&line)?)?;
    }
    Ok(())
}

/// Six-column table: Source, Type, Matched (O/X), names, locations, CIDRs
fn render_csv(out: &mut impl Write, outcome: &MatchOutcome) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Source", "Type", "Matched", "NetworkName", "Location", "CIDR"])?;

    for result in &outcome.results {
        let mut names = Vec::new();
        let mut locations = Vec::new();
        let mut cidrs = Vec::new();
        for &id in &result.matched {
            let entry = &outcome.references[id];
            names.push(entry.network_name.clone());
            if !entry.location.is_empty() {
                locations.push(entry.location.clone());
            }
            cidrs.push(entry.cidr_text());
        }
        let names = names.join(", ");
        let locations = locations.join(", ");
        let cidrs = cidrs.join(", ");
        writer.write_record([
            result.source.as_str(),
            result.kind.as_str(),
            if result.is_matched() { "O" } else { "X" },
            names.as_str(),
            locations.as_str(),
            cidrs.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_stats(outcome: &MatchOutcome, tabular: Option<&TabularStats>) {
    eprintln!();
    eprintln!(
        "Source tokens:   {} parsed, {} skipped",
        format_number(outcome.source_stats.parsed),
        format_number(outcome.source_stats.skipped())
    );
    match tabular {
        Some(t) => eprintln!(
            "Reference rows:  {} read, {} kept, {} other level, {} unusable",
            format_number(t.rows_read),
            format_number(t.rows_kept),
            format_number(t.rows_other_level),
            format_number(t.rows_unparsed)
        ),
        None => eprintln!(
            "Reference tokens: {} parsed, {} skipped",
            format_number(outcome.reference_stats.parsed),
            format_number(outcome.reference_stats.skipped())
        ),
    }
    eprintln!(
        "Matched sources: {} / {}",
        format_number(outcome.matched_count()),
        format_number(outcome.results.len())
    );
    eprintln!("Elapsed:         {:.3}s", outcome.elapsed.as_secs_f64());
}
