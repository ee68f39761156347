//! Human and machine readable renderings of a recommendation.
//!
//! The table is meant for a terminal: one block per host, with domains,
//! contacts and (in verbose mode) warnings stacked on continuation rows.
//! CSV and JSON exports always contain every host, regardless of the
//! display limit.

use std::path::Path;

use crusoe_core::{Host, ScoredHost};

use crate::error::Result;

/// Display options for [`render_report`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    /// Show at most this many hosts.
    pub limit: Option<usize>,
    /// Add a column with the warnings raised for each host.
    pub verbose: bool,
}

// ── Table ─────────────────────────────────────────────────────────

/// Render the attacked host, a summary line and the ranked host table.
pub fn render_report(
    attacked: &Host,
    hosts: &[ScoredHost],
    max_distance: u32,
    options: TableOptions,
) -> String {
    let mut out = String::new();
    out.push_str("ATTACKED HOST:\n");
    out.push_str(&attacked.to_string());
    out.push_str("\n\n");

    out.push_str(&format!(
        "Found {} hosts to maximum distance of {}.\n",
        hosts.len(),
        max_distance
    ));
    let shown = options.limit.map_or(hosts.len(), |limit| limit.min(hosts.len()));
    if shown < hosts.len() {
        out.push_str(&format!("Displaying {shown} hosts.\n"));
    }
    out.push('\n');

    out.push_str(&render_table(&hosts[..shown], options.verbose));
    out
}

/// The host table alone. Empty when there are no hosts.
pub fn render_table(hosts: &[ScoredHost], verbose: bool) -> String {
    if hosts.is_empty() {
        return String::new();
    }

    let mut headers = vec!["IP ADDRESS", "DOMAIN(S)", "CONTACT(S)", "RISK"];
    if verbose {
        headers.push("SIMILARITIES");
    }

    let rows: Vec<Vec<Vec<String>>> = hosts.iter().map(|h| host_cells(h, verbose)).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for cells in &rows {
        for (column, lines) in cells.iter().enumerate() {
            for line in lines {
                widths[column] = widths[column].max(line.chars().count());
            }
        }
    }
    for width in &mut widths {
        *width += 2;
    }

    let separator = separator_line(&widths);
    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&table_line(&widths, |column| headers[column]));
    out.push_str(&separator);

    for cells in &rows {
        let height = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        for line in 0..height {
            out.push_str(&table_line(&widths, |column| {
                cells[column].get(line).map(String::as_str).unwrap_or("")
            }));
        }
        out.push_str(&separator);
    }

    out
}

/// Column contents for one host, one entry per continuation row.
fn host_cells(host: &ScoredHost, verbose: bool) -> Vec<Vec<String>> {
    let mut cells = vec![
        vec![host.host.ip.clone()],
        host.host.domains.clone(),
        host.host.contacts.clone(),
        vec![format!("{:.4}", host.risk_or_zero())],
    ];
    if verbose {
        cells.push(host.warnings.iter().map(|w| w.to_string()).collect());
    }
    cells
}

fn separator_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(*width));
        line.push('+');
    }
    line.push('\n');
    line
}

fn table_line<'a>(widths: &[usize], cell: impl Fn(usize) -> &'a str) -> String {
    let mut line = String::from("|");
    for (column, width) in widths.iter().enumerate() {
        line.push_str(&format!("{:^width$}|", cell(column), width = *width));
    }
    line.push('\n');
    line
}

// ── Exports ───────────────────────────────────────────────────────

/// One CSV line: `ip;domains;contacts;risk;warnings`.
pub fn csv_line(host: &ScoredHost) -> String {
    let warnings: Vec<String> = host.warnings.iter().map(|w| w.to_string()).collect();
    format!(
        "{};{};{};{:.6};{}",
        host.host.ip,
        host.host.domains.join(","),
        host.host.contacts.join(","),
        host.risk_or_zero(),
        warnings.join(",")
    )
}

pub fn export_csv(path: &Path, hosts: &[ScoredHost]) -> Result<()> {
    let mut rows = String::new();
    for host in hosts {
        rows.push_str(&csv_line(host));
        rows.push('\n');
    }
    std::fs::write(path, rows)?;
    tracing::info!(path = %path.display(), hosts = hosts.len(), "CSV exported");
    Ok(())
}

pub fn export_json(path: &Path, hosts: &[ScoredHost]) -> Result<()> {
    let json = serde_json::to_string_pretty(hosts)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), hosts = hosts.len(), "JSON exported");
    Ok(())
}
