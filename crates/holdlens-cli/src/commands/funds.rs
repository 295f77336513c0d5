use holdlens_core::ReferenceData;

use crate::error::CliError;
use crate::output::{Rendered, TableView};

pub fn run(reference: &ReferenceData) -> Result<Rendered, CliError> {
    let mut table = TableView::new("Tracked funds", vec!["CODE", "NAME", "STYLE", "CIK"]);
    for fund in reference.funds() {
        table.push(vec![
            fund.code.to_string(),
            fund.name.clone(),
            fund.style.clone(),
            fund.cik.to_string(),
        ]);
    }

    let data = serde_json::to_value(reference.funds())?;
    Ok(Rendered::new(data, table))
}
