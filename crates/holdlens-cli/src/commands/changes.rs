use holdlens_core::{ChangeAction, PositionChanges};

use crate::cli::ChangesArgs;
use crate::error::CliError;
use crate::output::{dollars, percent, shares, signed, Rendered, TableView};

use super::Context;

pub fn run(args: &ChangesArgs, context: &Context) -> Result<Rendered, CliError> {
    let fund = context.fund(&args.fund)?;
    let changes = context.engine.position_changes(&fund);
    let data = serde_json::to_value(&changes)?;
    let headers = vec!["TICKER", "ACTION", "PRIOR", "CURRENT", "CHANGE", "CHANGE %", "VALUE"];

    let table = match &changes {
        PositionChanges::NoData { .. } => {
            TableView::new(format!("{fund}: no holdings ingested"), headers)
        }
        PositionChanges::NoPriorData {
            current_quarter, ..
        } => TableView::new(
            format!("{fund} {current_quarter}: no prior quarter to compare against"),
            headers,
        ),
        PositionChanges::Compared(report) => {
            let mut table = TableView::new(
                format!(
                    "{fund} {} vs {}: {} new, {} increased, {} reduced, {} sold",
                    report.current_quarter,
                    report.prior_quarter,
                    report.count(ChangeAction::New),
                    report.count(ChangeAction::Increased),
                    report.count(ChangeAction::Reduced),
                    report.count(ChangeAction::Sold),
                ),
                headers,
            );
            for change in &report.changes {
                table.push(vec![
                    change.ticker.to_string(),
                    change.action.to_string(),
                    shares(change.prior_shares),
                    shares(change.current_shares),
                    signed(change.share_change),
                    change
                        .share_change_pct
                        .map_or_else(|| String::from("-"), percent),
                    dollars(change.current_value),
                ]);
            }
            table
        }
    };

    Ok(Rendered::new(data, table).with_warnings(context.ingest_warnings()))
}
