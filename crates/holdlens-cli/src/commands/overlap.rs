use holdlens_core::FundCode;

use crate::cli::OverlapArgs;
use crate::error::CliError;
use crate::output::{percent, Rendered, TableView};

use super::Context;

pub fn run(args: &OverlapArgs, context: &Context) -> Result<Rendered, CliError> {
    let funds = args
        .funds
        .iter()
        .map(|raw| context.fund(raw))
        .collect::<Result<Vec<FundCode>, _>>()?;
    let matrix = context.engine.overlap_matrix(&funds);

    let mut table = TableView::new(
        "Pairwise overlap of latest holdings",
        vec!["FUND A", "FUND B", "SHARED", "COMBINED WEIGHT", "TICKERS"],
    );
    for cell in &matrix.cells {
        table.push(vec![
            cell.first.to_string(),
            cell.second.to_string(),
            cell.count.to_string(),
            percent(cell.combined_weight),
            cell.shared
                .iter()
                .map(|ticker| ticker.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ]);
    }

    let mut warnings = context.ingest_warnings();
    warnings.extend(
        matrix
            .missing
            .iter()
            .map(|fund| format!("{fund}: no holdings ingested, excluded from overlap")),
    );

    let data = serde_json::to_value(&matrix)?;
    Ok(Rendered::new(data, table).with_warnings(warnings))
}
