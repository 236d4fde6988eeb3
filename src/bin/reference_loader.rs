//! CSV reference loading for the CLI
//!
//! The boundary collaborator in front of the core: it maps recognized
//! inventory column labels, keeps only rows at the matchable inventory
//! level, and feeds each row's network name through the parser. The core
//! never sees the table itself. (Plain-text references need no loader;
//! they go straight into the session as a blob.)

use anyhow::{Context, Result};
use ipmatch::{parser, ReferenceEntry};
use std::path::Path;

/// Inventory level whose rows are matchable; everything else is ignored
const MATCHABLE_LEVEL: &str = "4";

/// Column labels recognized in inventory exports
const COLUMN_NETWORK_ID: &str = "network_id";
const COLUMN_OBJECT_NAME: &str = "object_name";
const COLUMN_NETWORK_NAME: &str = "network_name";
const COLUMN_CATEGORY: &str = "category";
const COLUMN_LEVEL: &str = "level";
const COLUMN_ATTRIBUTES: &str = "attributes";
const COLUMN_LOCATION: &str = "location";

/// Row accounting for one CSV load
#[derive(Debug, Default)]
pub struct TabularStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_other_level: usize,
    pub rows_unparsed: usize,
}

/// Load references from a CSV inventory export
///
/// Headers are matched tolerantly: case, whitespace, and punctuation are
/// ignored, and a label may appear inside a longer header ("Network Name
/// (CIDR)" still maps to network_name). The network name and level
/// columns are required; their absence fails the whole import.
pub fn load_csv_references(path: &Path) -> Result<(Vec<ReferenceEntry>, TabularStats)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers().context("Failed to read CSV headers")?;

    let find_column = |label: &str| -> Option<usize> {
        let want = normalize_header(label);
        headers
            .iter()
            .position(|h| normalize_header(h).contains(&want))
    };

    let network_name_col = find_column(COLUMN_NETWORK_NAME);
    let level_col = find_column(COLUMN_LEVEL);
    if network_name_col.is_none() || level_col.is_none() {
        anyhow::bail!(
            "CSV is missing required columns '{}' and/or '{}'. Found headers: {}",
            COLUMN_NETWORK_NAME,
            COLUMN_LEVEL,
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    }
    let network_name_col = network_name_col.expect("checked above");
    let level_col = level_col.expect("checked above");

    let network_id_col = find_column(COLUMN_NETWORK_ID);
    let object_name_col = find_column(COLUMN_OBJECT_NAME);
    let category_col = find_column(COLUMN_CATEGORY);
    let attributes_col = find_column(COLUMN_ATTRIBUTES);
    let location_col = find_column(COLUMN_LOCATION);

    let mut entries = Vec::new();
    let mut stats = TabularStats::default();

    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        stats.rows_read += 1;

        let level = record.get(level_col).unwrap_or("").trim();
        if level != MATCHABLE_LEVEL {
            stats.rows_other_level += 1;
            continue;
        }

        let network_name = record.get(network_name_col).unwrap_or("").trim();
        if network_name.is_empty() {
            stats.rows_unparsed += 1;
            continue;
        }

        let value = match parser::parse_token(network_name) {
            Ok(value) => value,
            Err(_) => {
                stats.rows_unparsed += 1;
                continue;
            }
        };

        let field = |col: Option<usize>| -> String {
            col.and_then(|c| record.get(c))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        entries.push(ReferenceEntry {
            value,
            network_name: network_name.to_string(),
            location: field(location_col),
            category: field(category_col),
            object_name: field(object_name_col),
            network_id: field(network_id_col),
            attributes: field(attributes_col),
        });
        stats.rows_kept += 1;
    }

    Ok((entries, stats))
}

/// Lowercase alphanumerics only, so "Network Name" == "network_name"
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_variants() {
        assert_eq!(normalize_header("Network Name"), "networkname");
        assert_eq!(normalize_header("network_name"), "networkname");
        assert_eq!(normalize_header("  LEVEL "), "level");
        assert!(normalize_header("Network Name (CIDR)").contains("networkname"));
    }
}
