//! Skill command: score a persisted cross-validation run.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use lim_io::read_container;
use lim_skill::{evaluate, to_json};

use crate::cli::SkillArgs;
use crate::config;
use crate::convert;

/// Run the skill scoring pipeline.
pub fn run(args: SkillArgs) -> Result<()> {
    let _cmd = info_span!("skill").entered();
    let config = config::load(&args.config)?;

    let input = args.input.unwrap_or(config.io.results);
    let result = read_container(&input)
        .with_context(|| format!("failed to read results: {}", input.display()))?;
    info!(
        n_trials = result.n_trials(),
        n_leads = result.lead_times().len(),
        n_space = result.n_space(),
        "results loaded"
    );

    let skill_cfg = convert::build_skill_config(&config.skill)?;
    let report = evaluate(&result, &skill_cfg).context("skill evaluation failed")?;
    for lead in &report.leads {
        info!(
            lead = lead.lead,
            mean_correlation = ?lead.mean_correlation,
            mean_ce = ?lead.mean_ce,
            n_significant = lead.n_significant,
            n_undetermined = lead.n_undetermined,
            "lead skill"
        );
    }

    let json = to_json(&report)?;
    let output = args.output.unwrap_or(config.io.report);
    std::fs::write(&output, &json)
        .with_context(|| format!("failed to write report: {}", output.display()))?;
    info!(path = %output.display(), "skill report written");

    Ok(())
}
