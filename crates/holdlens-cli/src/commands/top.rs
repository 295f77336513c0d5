use crate::cli::TopArgs;
use crate::error::CliError;
use crate::output::{dollars, percent, shares, Rendered, TableView};

use super::Context;

pub fn run(args: &TopArgs, context: &Context) -> Result<Rendered, CliError> {
    let fund = context.fund(&args.fund)?;
    let Some(top) = context.engine.top_holdings(&fund, args.limit) else {
        return Err(CliError::Command(format!("no holdings ingested for {fund}")));
    };

    let mut table = TableView::new(
        format!(
            "{fund} {}: top {} of {} holdings, {} total",
            top.quarter,
            top.holdings.len(),
            top.total_holdings,
            dollars(top.total_value)
        ),
        vec!["TICKER", "ISSUER", "SECTOR", "SHARES", "VALUE", "WEIGHT"],
    );
    for line in &top.holdings {
        table.push(vec![
            line.ticker.to_string(),
            line.issuer.clone(),
            line.sector.clone(),
            shares(line.shares),
            dollars(line.market_value),
            percent(line.weight),
        ]);
    }

    let data = serde_json::to_value(&top)?;
    Ok(Rendered::new(data, table).with_warnings(context.ingest_warnings()))
}
