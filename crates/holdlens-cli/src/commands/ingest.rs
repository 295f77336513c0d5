use holdlens_core::IngestStatus;

use super::Context;
use crate::error::CliError;
use crate::output::{dollars, Rendered, TableView};

pub fn run(context: &Context) -> Result<Rendered, CliError> {
    let report = &context.report;
    let mut table = TableView::new(
        format!(
            "Ingestion: {} stored, {} not filed, {} failed",
            report.stored(),
            report.not_found(),
            report.failures().count()
        ),
        vec!["FUND", "QUARTER", "STATUS", "HOLDINGS", "VALUE", "ATTEMPTS"],
    );

    for outcome in &report.outcomes {
        let quarter = outcome
            .quarter
            .map_or_else(|| String::from("-"), |quarter| quarter.to_string());
        let (status, holdings, value) = match &outcome.status {
            IngestStatus::Stored {
                holdings,
                total_value,
                ..
            } => (
                String::from("stored"),
                holdings.to_string(),
                dollars(*total_value),
            ),
            IngestStatus::NotFound => (String::from("not filed"), String::new(), String::new()),
            IngestStatus::Failed { code, .. } => (code.to_string(), String::new(), String::new()),
        };
        table.push(vec![
            outcome.fund.to_string(),
            quarter,
            status,
            holdings,
            value,
            outcome.attempts.to_string(),
        ]);
    }

    let data = serde_json::to_value(report)?;
    let failed = report.failures().count();
    let rendered = Rendered::new(data, table).with_warnings(context.ingest_warnings());
    if failed > 0 {
        return Ok(rendered.with_failure(CliError::IngestFailed {
            failed,
            total: report.outcomes.len(),
        }));
    }
    Ok(rendered)
}
