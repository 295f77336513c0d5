mod changes;
mod conviction;
mod funds;
mod ingest;
mod overlap;
mod sectors;
mod top;

use std::sync::Arc;
use std::time::Duration;

use holdlens_core::{
    AnalysisConfig, AnalysisEngine, EdgarAdapter, EdgarConfig, FilingSource, FundCode,
    HoldingsRepository, IngestReport, IngestStatus, Ingestor, Normalizer, ReferenceData,
    SampleFilingSource,
};

use tracing::{debug, info};

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;
use crate::output::Rendered;

/// Reference data, ingested snapshots and the engine over them.
pub struct Context {
    pub reference: Arc<ReferenceData>,
    pub engine: AnalysisEngine,
    pub report: IngestReport,
}

impl Context {
    /// Parses a fund code and checks that it is tracked.
    pub fn fund(&self, raw: &str) -> Result<FundCode, CliError> {
        let code = FundCode::parse(raw)?;
        self.reference.require_fund(&code)?;
        Ok(code)
    }

    /// One line per fund/quarter that failed to ingest.
    pub fn ingest_warnings(&self) -> Vec<String> {
        self.report
            .failures()
            .map(|outcome| match &outcome.status {
                IngestStatus::Failed { code, message, .. } => format!(
                    "{} {}: {message} ({code})",
                    outcome.fund,
                    outcome
                        .quarter
                        .map_or_else(|| String::from("filing list"), |quarter| quarter.to_string())
                ),
                _ => format!("{}: not ingested", outcome.fund),
            })
            .collect()
    }
}

pub async fn run(cli: &Cli) -> Result<Rendered, CliError> {
    let reference = Arc::new(load_reference(cli)?);
    if matches!(cli.command, Command::Funds) {
        return funds::run(&reference);
    }

    let context = ingest_context(cli, reference).await?;
    match &cli.command {
        Command::Funds => funds::run(&context.reference),
        Command::Ingest => ingest::run(&context),
        Command::Top(args) => top::run(args, &context),
        Command::Sectors(args) => sectors::run(args, &context),
        Command::Changes(args) => changes::run(args, &context),
        Command::Overlap(args) => overlap::run(args, &context),
        Command::Conviction(args) => conviction::run(args, &context),
    }
}

fn load_reference(cli: &Cli) -> Result<ReferenceData, CliError> {
    let reference = match &cli.reference {
        Some(path) => ReferenceData::load(path)?,
        None => ReferenceData::bundled()?,
    };
    debug!(
        path = ?cli.reference,
        funds = reference.funds().len(),
        "loaded reference data"
    );
    Ok(reference)
}

fn filing_source(cli: &Cli) -> Result<Arc<dyn FilingSource>, CliError> {
    let source: Arc<dyn FilingSource> = match cli.source {
        SourceSelector::Sample => Arc::new(SampleFilingSource::bundled()?),
        SourceSelector::Edgar => Arc::new(EdgarAdapter::new(EdgarConfig::from_env()?)),
    };
    Ok(source)
}

async fn ingest_context(cli: &Cli, reference: Arc<ReferenceData>) -> Result<Context, CliError> {
    let mut config = AnalysisConfig {
        materiality_threshold: cli.materiality,
        high_conviction_min_holders: cli.min_holders,
        ..AnalysisConfig::default()
    };
    if let Command::Changes(args) = &cli.command {
        config.include_unchanged = args.include_unchanged;
    }

    let repository = HoldingsRepository::new();
    let engine = AnalysisEngine::new(repository.clone(), Arc::clone(&reference), config)?;

    let mut ingestor = Ingestor::new(
        filing_source(cli)?,
        Normalizer::new(Arc::clone(&reference)),
        repository,
    );
    if let Some(timeout_ms) = cli.timeout_ms {
        ingestor = ingestor.with_fetch_timeout(Duration::from_millis(timeout_ms));
    }
    let report = ingestor.ingest_recent(reference.funds(), cli.quarters).await;
    info!(
        source = ?cli.source,
        quarters = cli.quarters,
        stored = report.stored(),
        not_found = report.not_found(),
        failed = report.failures().count(),
        "ingestion finished"
    );

    Ok(Context {
        reference,
        engine,
        report,
    })
}
