use crate::cli::FundArgs;
use crate::error::CliError;
use crate::output::{dollars, percent, Rendered, TableView};

use super::Context;

pub fn run(args: &FundArgs, context: &Context) -> Result<Rendered, CliError> {
    let fund = context.fund(&args.fund)?;
    let Some(allocation) = context.engine.sector_allocation(&fund) else {
        return Err(CliError::Command(format!("no holdings ingested for {fund}")));
    };

    let mut table = TableView::new(
        format!("{fund} {}: sector allocation", allocation.quarter),
        vec!["SECTOR", "HOLDINGS", "VALUE", "WEIGHT"],
    );
    for entry in &allocation.sectors {
        table.push(vec![
            entry.sector.clone(),
            entry.holdings.to_string(),
            dollars(entry.market_value),
            percent(entry.weight),
        ]);
    }

    let data = serde_json::to_value(&allocation)?;
    Ok(Rendered::new(data, table).with_warnings(context.ingest_warnings()))
}
