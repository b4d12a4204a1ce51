//! Runs a batch of decisions through the governance pipeline and prints
//! each decision pack.
//!
//! ```text
//! cargo run -p pipeline-demo
//! cargo run -p pipeline-demo -- --decisions my_decisions.json --json
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use decision_governance::config::{CompanyContext, GovernanceConfig, loader};
use decision_governance::graph::{GraphRepository, InMemoryGraphRepository};
use decision_governance::kernel::{
    DecisionPipeline, PipelineOutcome, SchedulerConfig, TaskScheduler,
};
use decision_governance::policy::{GovernanceEvaluator, RuleSet};
use decision_governance::primitives::Decision;
use decision_governance::reasoning::ReasoningMode;
use decision_governance::telemetry::{TelemetryConfig, init_tracing};
use tracing::{info, warn};

const RULES: &str = include_str!("../data/rules.json");
const COMPANY: &str = include_str!("../data/company.json");
const DECISIONS: &str = include_str!("../data/decisions.json");

#[derive(Parser)]
#[command(name = "pipeline-demo")]
#[command(about = "Evaluate decisions against governance rules and print decision packs")]
struct Args {
    /// Governance configuration JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rule file; the bundled rules are used when omitted
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Company personnel file
    #[arg(long)]
    company: Option<PathBuf>,

    /// JSON array of decisions
    #[arg(short, long)]
    decisions: Option<PathBuf>,

    /// Ask for external reasoning; falls back to deterministic analysis
    #[arg(long)]
    enhanced: bool,

    /// Decisions evaluated at once
    #[arg(long, default_value = "4")]
    concurrency: NonZeroUsize,

    /// Print packs as JSON
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&TelemetryConfig::default().with_default_filter(args.log.as_str()))?;

    let config = match &args.config {
        Some(path) => loader::from_path(path)?,
        None => GovernanceConfig::default(),
    };
    config.validate()?;

    let (rules, rejected) = RuleSet::from_json_str(&read_or(args.rules.as_deref(), RULES)?)?;
    for entry in &rejected {
        warn!(index = entry.index, rule_id = ?entry.rule_id, error = %entry.error, "rule rejected");
    }
    let company: CompanyContext =
        loader::company_context_from_json_str(&read_or(args.company.as_deref(), COMPANY)?)?;
    let decisions: Vec<Decision> =
        serde_json::from_str(&read_or(args.decisions.as_deref(), DECISIONS)?)
            .context("decisions must be a JSON array")?;

    info!(
        rules = rules.len(),
        personnel = company.personnel.len(),
        decisions = decisions.len(),
        "=== Decision governance demo ==="
    );

    let repository = Arc::new(InMemoryGraphRepository::new());
    let mode = if args.enhanced {
        ReasoningMode::Enhanced
    } else {
        ReasoningMode::Deterministic
    };
    let pipeline = DecisionPipeline::new(
        GovernanceEvaluator::new(config, rules, company),
        repository.clone(),
    )
    .with_mode(mode)
    .with_scheduler(TaskScheduler::new(SchedulerConfig::new(args.concurrency)));

    for result in pipeline.process_batch(decisions).await {
        match result {
            Ok(outcome) if args.json => {
                println!("{}", serde_json::to_string_pretty(&outcome.pack)?);
            }
            Ok(outcome) => print_outcome(&outcome),
            Err(err) => warn!(error = %err, "decision failed"),
        }
    }

    let graph = repository.snapshot().await?.summary();
    info!(
        nodes = graph.total_nodes,
        edges = graph.total_edges,
        "graph after batch"
    );
    Ok(())
}

fn read_or(path: Option<&Path>, bundled: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(bundled.to_owned()),
    }
}

fn print_outcome(outcome: &PipelineOutcome) {
    let pack = &outcome.pack;
    println!("\n{} ({})", pack.title, outcome.decision_id);
    println!("  {}", pack.summary.headline);
    if !pack.missing_items.is_empty() {
        let missing: Vec<&str> = pack.missing_item_labels().collect();
        println!("  missing: {}", missing.join(", "));
    }
    for step in &pack.approval_chain {
        println!(
            "  {}. {} ({}), level {}: {}",
            step.order, step.approver, step.role, step.authority_level, step.rationale
        );
    }
    for finding in outcome.reasoning.findings() {
        println!("  [{}] {}", finding.severity, finding.description);
    }
    for action in &pack.recommended_next_actions {
        println!("  -> {action}");
    }
}
