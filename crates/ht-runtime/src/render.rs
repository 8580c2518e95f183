//! Plain-text rendering of the dashboard.

use std::fmt::Write;

use ht_block_sync::{
    ClassificationAxis, ClassificationTally, GridColumn, SamplingRule, StatusLabel, SyncStatus,
};

/// Symbol printed for an empty bead cell.
const EMPTY_CELL: char = '.';

/// Render a bead plate row by row, oldest column first.
///
/// Only the newest `max_columns` columns are printed when the plate is wider.
pub fn render_plate(columns: &[GridColumn], max_columns: usize) -> String {
    let skip = columns.len().saturating_sub(max_columns);
    let visible = &columns[skip..];
    let rows = visible.first().map_or(0, |column| column.len());

    let mut out = String::new();
    for row in 0..rows {
        let line: String = visible
            .iter()
            .map(|column| {
                column
                    .get(row)
                    .and_then(|cell| cell.kind)
                    .map_or(EMPTY_CELL, |kind| kind.symbol())
            })
            .collect();
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Render the two tally counters for `axis`.
pub fn render_tally(tally: &ClassificationTally, axis: ClassificationAxis) -> String {
    let (first, second) = match axis {
        ClassificationAxis::Parity => ("ODD", "EVEN"),
        ClassificationAxis::Size => ("BIG", "SMALL"),
    };
    format!("{} {} | {} {}", first, tally.first, second, tally.second)
}

/// Render the status line.
pub fn render_status(status: &SyncStatus) -> String {
    let label = match status.label() {
        StatusLabel::Unauthorized => "UNAUTHORIZED",
        StatusLabel::Syncing => "SYNCING",
        StatusLabel::Listening => "LISTENING",
    };
    let mut line = format!(
        "[{}] blocks={} head={}",
        label, status.store_len, status.max_height
    );
    if let Some(error) = &status.last_error {
        let _ = write!(line, " error=\"{}\"", error);
    }
    line
}

/// Render the rule header.
pub fn render_rule(rule: &SamplingRule) -> String {
    if rule.anchor_height > 0 {
        format!(
            "rule {} ({}): every {} from {}",
            rule.id, rule.label, rule.stride, rule.anchor_height
        )
    } else {
        format!("rule {} ({}): every {}", rule.id, rule.label, rule.stride)
    }
}
