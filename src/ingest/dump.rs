/// Parser for indented taxonomy dumps
///
/// One taxon per line, indented by depth:
///
/// ```text
/// 6656 [phylum] Arthropoda
///   50557 [class] Insecta
///     7524 [order] Hemiptera
/// ```
use regex::Regex;

use crate::error::{GalleryError, Result};
use crate::state::data::{Taxon, TaxonId};

/// Ranks that are dropped from the classification
const IGNORED_RANKS: [&str; 4] = ["no rank", "strain", "isolate", "forma specialis"];

/// Outcome of parsing one dump
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpReport {
    /// Accepted taxa in file order; parents always precede their children
    pub taxa: Vec<Taxon>,
    /// Lines dropped by the rank or name filters
    pub filtered: usize,
    /// Non-empty lines that did not match the line grammar
    pub unparsed: usize,
}

/// Parse a whole dump.
///
/// A taxon's parent is the nearest accepted taxon with a smaller indentation
/// on the same branch. Filtered lines still close the branch at their depth,
/// so their descendants attach to the nearest accepted ancestor.
pub fn parse_dump(text: &str) -> Result<DumpReport> {
    let line_re = Regex::new(r"^(\d+)\s+\[([^\]]+)\]\s+(.+)$")?;
    let mut report = DumpReport::default();
    // (indentation, id) of the accepted ancestors of the current line
    let mut branch: Vec<(usize, TaxonId)> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let stripped = line.trim_start();
        let indent = line.chars().count() - stripped.chars().count();

        let Some(caps) = line_re.captures(stripped.trim_end()) else {
            report.unparsed += 1;
            continue;
        };

        let id: TaxonId = caps[1].parse().map_err(|_| GalleryError::Ingest {
            line: index + 1,
            reason: format!("taxon id {} out of range", &caps[1]),
        })?;
        let rank = caps[2].trim().to_lowercase();
        let name = caps[3].trim();

        while branch.last().is_some_and(|&(depth, _)| depth >= indent) {
            branch.pop();
        }

        if !is_kept(&rank, name) {
            report.filtered += 1;
            continue;
        }

        let parent_id = branch.last().map(|&(_, parent)| parent);
        branch.push((indent, id));
        report.taxa.push(Taxon::new(id, name, &rank, parent_id));
    }

    tracing::info!(
        "parsed {} taxa ({} filtered, {} unparsed lines)",
        report.taxa.len(),
        report.filtered,
        report.unparsed
    );
    Ok(report)
}

/// Drops unusual ranks and uncertain names ("sp.", "ssp.", environmental samples)
fn is_kept(rank: &str, name: &str) -> bool {
    if IGNORED_RANKS.iter().any(|ignored| rank.contains(ignored)) {
        return false;
    }
    !(name.contains('.') || name.contains("environmental sample"))
}
