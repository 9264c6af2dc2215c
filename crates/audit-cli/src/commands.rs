use std::path::Path;

use anyhow::{Context, Result, bail};
use audit_core::ledger;
use audit_core::{AnalysisOptions, AnalysisReport, SamplingPopulation};
use audit_ingest::load_input;
use audit_model::RiskTier;
use comfy_table::Table;
use tracing::info;

use crate::cli::{AnalyzeArgs, TierArg};
use crate::summary::apply_table_style;

/// Exit status when the risk tier reaches `--fail-on`.
pub const EXIT_TIER_REACHED: i32 = 2;

/// Merge the options file (if any) with command-line flags.
pub fn build_options(args: &AnalyzeArgs) -> Result<AnalysisOptions> {
    let mut options = match &args.config {
        Some(path) => AnalysisOptions::load(path)?,
        None => AnalysisOptions::default(),
    };

    if let Some(normalization) = args.normalization {
        options.scoring.normalization = normalization.into();
    }
    if let Some(threshold) = args.multi_flag_threshold {
        options.scoring.multi_flag_threshold = threshold;
    }

    let wants_sampling = args.sample_rate.is_some()
        || args.sample_per_stratum.is_some()
        || !args.stratify_by.is_empty()
        || args.seed.is_some()
        || args.sample_flagged;
    if wants_sampling {
        let mut sampling = options.sampling.take().unwrap_or_default();
        if let Some(rate) = args.sample_rate {
            sampling.sample_rate = Some(rate);
            sampling.fixed_per_stratum = None;
        }
        if let Some(count) = args.sample_per_stratum {
            sampling.fixed_per_stratum = Some(count);
            sampling.sample_rate = None;
        }
        if !args.stratify_by.is_empty() {
            sampling.stratify_by = args.stratify_by.clone();
        }
        if sampling.stratify_by.is_empty() {
            sampling.stratify_by = vec![ledger::STRATIFY_AMOUNT_BAND.to_string()];
        }
        if args.seed.is_some() {
            sampling.seed = args.seed;
        }
        if args.sample_flagged {
            sampling.population = SamplingPopulation::Flagged;
        }
        if sampling.sample_rate.is_none() && sampling.fixed_per_stratum.is_none() {
            bail!("sampling needs --sample-rate or --sample-per-stratum");
        }
        options.sampling = Some(sampling);
    }

    options.validate().context("invalid analysis options")?;
    Ok(options)
}

pub fn run_analyze(args: &AnalyzeArgs) -> Result<AnalysisReport> {
    let options = build_options(args)?;
    let input = load_input(&args.input)
        .with_context(|| format!("load input {}", args.input.display()))?;
    let engine = ledger::engine().context("build journal entry engine")?;
    let report = engine.run(&input, &options)?;
    info!(
        score = report.composite_score.score,
        tier = report.risk_tier().as_str(),
        "analysis complete"
    );

    if let Some(path) = &args.output {
        write_report(&report, path)?;
    }
    Ok(report)
}

pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Process exit status for a finished analysis.
pub fn exit_code(tier: RiskTier, fail_on: Option<TierArg>) -> i32 {
    match fail_on {
        Some(threshold) if tier >= RiskTier::from(threshold) => EXIT_TIER_REACHED,
        _ => 0,
    }
}

pub fn run_profile() -> Result<()> {
    let engine = ledger::engine().context("build journal entry engine")?;
    let mut table = Table::new();
    table.set_header(vec!["Field", "Priority", "Required", "Patterns"]);
    apply_table_style(&mut table);
    for field in engine.detector().fields() {
        let patterns = field
            .patterns
            .iter()
            .map(|p| {
                let kind = if p.exact { "exact" } else { "partial" };
                format!("{} ({kind}, {:.2})", p.pattern, p.weight)
            })
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            field.field_name.clone(),
            field.priority.to_string(),
            if field.required { "yes" } else { "no" }.to_string(),
            patterns,
        ]);
    }
    println!("{table}");
    Ok(())
}
