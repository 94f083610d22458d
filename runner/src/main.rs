use anyhow::Context;
use clap::Parser;
use generator::profile::{build_snapshot, GeneratorConfig};
use isrcore::prelude::FIELD_ALIGNED_BEAM_ID;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::output::{append_summary, write_reports};
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline ISR heating-event detection driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Fitted snapshot (JSON); repeat for several datasets
    #[arg(long = "dataset")]
    datasets: Vec<PathBuf>,
    /// Also process a seeded synthetic snapshot
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = FIELD_ALIGNED_BEAM_ID)]
    beam: i64,
    /// Target altitude in km; repeat for several
    #[arg(long = "altitude")]
    altitudes: Vec<f64>,
    #[arg(long, default_value_t = 3.0)]
    window_hours: f64,
    /// Write the JSON report here
    #[arg(long)]
    report: Option<PathBuf>,
    /// Append the plain-text summary here
    #[arg(long)]
    log: Option<PathBuf>,
    /// Write the synthetic snapshot to this path and exit
    #[arg(long)]
    write_synthetic: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.beam,
            args.altitudes.clone(),
            args.window_hours,
            args.datasets.clone(),
        )
    };
    if args.workflow.is_some() {
        workflow_config.datasets.extend(args.datasets.iter().cloned());
    }
    if args.synthetic && workflow_config.synthetic.is_none() {
        workflow_config.synthetic = Some(GeneratorConfig::default());
    }
    if args.report.is_some() {
        workflow_config.report_path = args.report.clone();
    }
    if args.log.is_some() {
        workflow_config.log_path = args.log.clone();
    }

    if let Some(path) = &args.write_synthetic {
        let generator = workflow_config.synthetic.clone().unwrap_or_default();
        let snapshot = build_snapshot(&generator)?;
        let file = File::create(path)
            .with_context(|| format!("creating snapshot {}", path.display()))?;
        snapshot
            .to_json_writer(BufWriter::new(file))
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        println!("Synthetic snapshot written to {}", path.display());
        return Ok(());
    }

    let runner = Runner::new(workflow_config)?;
    let sources = runner.sources();
    if sources.is_empty() {
        anyhow::bail!("no datasets given; pass --dataset, --synthetic or a workflow file");
    }

    let result = runner.execute_all(&sources);
    for report in &result.reports {
        for line in report.summary_lines() {
            println!("{}", line);
        }
    }
    for failure in &result.failures {
        eprintln!("skipped {}: {}", failure.dataset, failure.error);
    }
    println!(
        "Processed {} datasets ({} failed): {} events in {} windows",
        result.reports.len() + result.failures.len(),
        result.failures.len(),
        result.event_count(),
        result.window_count()
    );

    let config = runner.config();
    if let Some(path) = &config.report_path {
        write_reports(path, &result.reports)?;
    }
    if let Some(path) = &config.log_path {
        append_summary(path, &result.reports)?;
    }

    Ok(())
}
