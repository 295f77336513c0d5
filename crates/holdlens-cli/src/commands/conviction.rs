use holdlens_core::Ticker;

use crate::cli::ConvictionArgs;
use crate::error::CliError;
use crate::output::{dollars, percent, Rendered, TableView};

use super::Context;

pub fn run(args: &ConvictionArgs, context: &Context) -> Result<Rendered, CliError> {
    let min_holders = context.engine.config().high_conviction_min_holders;
    let (title, scores) = match &args.ticker {
        Some(raw) => {
            let ticker = Ticker::parse(raw)?;
            let score = context.engine.conviction(&ticker).ok_or_else(|| {
                CliError::Command(format!("no tracked fund holds {ticker}"))
            })?;
            (format!("Conviction for {ticker}"), vec![score])
        }
        None if args.all => (
            String::from("Cross-fund holdings"),
            context.engine.conviction_scores(),
        ),
        None => (
            format!("High conviction: held by {min_holders}+ funds"),
            context.engine.high_conviction(),
        ),
    };

    let mut table = TableView::new(
        title,
        vec!["TICKER", "ISSUER", "HOLDERS", "MEAN WEIGHT", "VALUE", "FUNDS", "HIGH"],
    );
    for score in &scores {
        table.push(vec![
            score.ticker.to_string(),
            score.issuer.clone(),
            score.holder_count.to_string(),
            percent(score.mean_weight),
            dollars(score.total_value),
            score
                .holders
                .iter()
                .map(|fund| fund.as_str())
                .collect::<Vec<_>>()
                .join(","),
            if score.high_conviction { "yes" } else { "" }.to_owned(),
        ]);
    }

    let data = serde_json::to_value(&scores)?;
    Ok(Rendered::new(data, table).with_warnings(context.ingest_warnings()))
}
