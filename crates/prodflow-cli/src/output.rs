use prodflow_core::rules::ValidationReport;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i < widths.len() {
                    format!("{:width$}", c, width = widths[i])
                } else {
                    c.clone()
                }
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// One line per rule outcome, pass and fail alike, in declaration order.
pub fn print_report(report: &ValidationReport) {
    for outcome in &report.outcomes {
        let mark = if outcome.passed { "pass" } else { "FAIL" };
        println!(
            "  [{mark}] {} ({}): {}",
            outcome.rule, outcome.severity, outcome.reason
        );
    }
}
