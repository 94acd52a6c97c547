use std::io::Write;

use serde::Serialize;

use crate::access::{AnomalyReport, EffectiveGrant, ReasonCounts, Resolution};
use crate::errors::AppError;
use crate::settings::ReportFormat;

const HEADERS: [&str; 6] = ["USER", "EMAIL", "ROLE", "COURSE", "REASON", "VIA GROUP"];

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    grants: &'a [EffectiveGrant],
    counts: ReasonCounts,
    anomalies: AnomalyReport,
}

/// Render the visible rows of a resolution in the requested format.
pub fn render(
    rows: &[EffectiveGrant],
    resolution: &Resolution,
    format: ReportFormat,
) -> Result<String, AppError> {
    match format {
        ReportFormat::Json => {
            let report = JsonReport {
                grants: rows,
                counts: resolution.count_by_reason(),
                anomalies: resolution.anomalies,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        ReportFormat::Table => Ok(render_table(rows, resolution)),
    }
}

/// Render and write the report, e.g. to stdout.
pub fn write_report(
    out: &mut impl Write,
    rows: &[EffectiveGrant],
    resolution: &Resolution,
    format: ReportFormat,
) -> Result<(), AppError> {
    let text = render(rows, resolution, format)?;
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

fn render_table(rows: &[EffectiveGrant], resolution: &Resolution) -> String {
    let cells: Vec<[&str; 6]> = rows
        .iter()
        .map(|g| {
            [
                g.user_name.as_str(),
                g.user_email.as_str(),
                g.user_role.as_str(),
                g.course_title.as_str(),
                g.reason.as_str(),
                g.via_group_name.as_deref().unwrap_or("-"),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }

    let counts = resolution.count_by_reason();
    out.push_str(&format!(
        "\n{} of {} rows (admin_scope={}, teacher_assigned={}, group_member={}; {} dropped as anomalies)\n",
        rows.len(),
        resolution.len(),
        counts.admin_scope,
        counts.teacher_assigned,
        counts.group_member,
        resolution.anomalies.total(),
    ));
    out
}

fn push_line(out: &mut String, cells: &[&str; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
