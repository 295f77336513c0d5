use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Column-aligned text view of a command result.
#[derive(Debug, Default)]
pub struct TableView {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn new(title: impl Into<String>, headers: Vec<&'static str>) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn to_lines(&self) -> Vec<String> {
        let mut widths: Vec<usize> = self.headers.iter().map(|header| header.len()).collect();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(index) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let format_row = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}", width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_owned()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 3);
        if !self.title.is_empty() {
            lines.push(self.title.clone());
        }
        lines.push(format_row(self.headers.clone()));
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        lines.push(format_row(rule.iter().map(String::as_str).collect()));
        for row in &self.rows {
            lines.push(format_row(row.iter().map(String::as_str).collect()));
        }
        lines
    }
}

/// Everything a command produced: machine-readable data, a table view,
/// warnings, and an error to exit with after output is written.
#[derive(Debug)]
pub struct Rendered {
    pub data: Value,
    pub table: TableView,
    pub warnings: Vec<String>,
    pub failure: Option<CliError>,
}

impl Rendered {
    pub fn new(data: Value, table: TableView) -> Self {
        Self {
            data,
            table,
            warnings: Vec::new(),
            failure: None,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_failure(mut self, failure: CliError) -> Self {
        self.failure = Some(failure);
        self
    }
}

pub fn render(rendered: &Rendered, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let document = json!({
                "data": rendered.data,
                "warnings": rendered.warnings,
            });
            let payload = if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            for line in rendered.table.to_lines() {
                println!("{line}");
            }
            if !rendered.warnings.is_empty() {
                println!();
                println!("warnings:");
                for warning in &rendered.warnings {
                    println!("  - {warning}");
                }
            }
        }
    }

    Ok(())
}

/// `0.1234` → `12.34%`.
pub fn percent(weight: f64) -> String {
    format!("{:.2}%", weight * 100.0)
}

/// Whole dollars with thousands separators.
pub fn dollars(value: u64) -> String {
    format!("${}", grouped(value.to_string()))
}

pub fn shares(value: u64) -> String {
    grouped(value.to_string())
}

pub fn signed(value: i64) -> String {
    let magnitude = grouped(value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{magnitude}")
    } else {
        format!("+{magnitude}")
    }
}

fn grouped(digits: String) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_money_and_weights() {
        assert_eq!(dollars(4_730_000_000), "$4,730,000,000");
        assert_eq!(dollars(999), "$999");
        assert_eq!(signed(-1_500), "-1,500");
        assert_eq!(signed(0), "+0");
        assert_eq!(percent(0.571428), "57.14%");
    }

    #[test]
    fn table_columns_align() {
        let mut table = TableView::new("", vec!["TICKER", "WEIGHT"]);
        table.push(vec![String::from("MSFT"), String::from("12.00%")]);
        table.push(vec![String::from("V"), String::from("9.50%")]);

        let lines = table.to_lines();
        assert_eq!(lines[0], "TICKER  WEIGHT");
        assert_eq!(lines[1], "------  ------");
        assert_eq!(lines[2], "MSFT    12.00%");
        assert_eq!(lines[3], "V       9.50%");
    }
}
