//! Headless delivery of reviewed scenes.
//!
//! Loads the given workflow runs, classifies them with the configured default
//! filters and delivers every validated scene plus any scene picked with
//! `--select`. Exits non-zero if any copy failed.
//!
//! ## Usage
//!
//! ```bash
//! lstqc-deliver --list-workflows
//! lstqc-deliver -w lst30-pipeline-v0.1.0-pq9wb --customer acme --aoi north-farm --dry-run
//! ```

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use lstqc::classify::ReviewLabel;
use lstqc::config::Config;
use lstqc::delivery::DeliveryRequest;
use lstqc::logging;
use lstqc::services::Services;
use lstqc::session::SessionContext;

#[derive(Debug, Default, PartialEq)]
struct DeliverArgs {
    workflows: Vec<String>,
    customer: String,
    aoi: String,
    /// TBD scenes to deliver in addition to the validated ones.
    select: Vec<String>,
    dry_run: bool,
    list_workflows: bool,
    config_path: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Run(DeliverArgs),
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Command::Run(args)) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    logging::init_stderr()?;

    let mut config = match args.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if args.dry_run {
        config.delivery.dry_run = true;
    }

    let services = Services::connect(&config)?;

    if args.list_workflows {
        for workflow in services.list_workflows(&config)? {
            println!("{}", workflow);
        }
        return Ok(());
    }

    let workflows = if args.workflows.is_empty() {
        config.default_workflows.clone()
    } else {
        args.workflows.clone()
    };
    if workflows.is_empty() {
        bail!("no workflow run given; pass --workflow or set default_workflows");
    }

    let collection = services
        .loader
        .load(&workflows)
        .with_context(|| format!("Failed to load {:?}", workflows))?;
    let mut session = SessionContext::new(&collection, &config.filters);

    for key in &args.select {
        match session.toggle(key) {
            Some(true) => info!("Picked {}", key),
            Some(false) => info!("Unpicked {}", key),
            None => warn!("{} is not under review with the default filters, ignoring", key),
        }
    }

    println!(
        "{} scenes: {} validated, {} to review, {} rejected, {} picked",
        session.table().len(),
        session.count(ReviewLabel::Validated),
        session.count(ReviewLabel::Tbd),
        session.count(ReviewLabel::Rejected),
        session.selection().len()
    );

    let request = DeliveryRequest::new(&args.customer, &args.aoi);
    let report = services
        .dispatcher
        .dispatch(&session.delivery_set(), &request)?;

    for job in &report.planned_only {
        println!("saving {} to {}", job.source, job.destination);
    }
    for (job, error) in &report.failed {
        eprintln!("FAILED {} -> {}: {}", job.source, job.destination, error);
    }
    println!("{}", report.summary());

    if !report.is_complete() {
        std::process::exit(2);
    }
    Ok(())
}

fn value(args: &[String], i: usize, flag: &str) -> Result<String> {
    match args.get(i + 1) {
        Some(value) => Ok(value.clone()),
        None => bail!("{} requires a value", flag),
    }
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut parsed = DeliverArgs::default();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--workflow" | "-w" => {
                parsed.workflows.push(value(args, i, flag)?);
                i += 1;
            }
            "--customer" => {
                parsed.customer = value(args, i, flag)?;
                i += 1;
            }
            "--aoi" => {
                parsed.aoi = value(args, i, flag)?;
                i += 1;
            }
            "--select" | "-s" => {
                parsed.select.push(value(args, i, flag)?);
                i += 1;
            }
            "--config" | "-c" => {
                parsed.config_path = Some(PathBuf::from(value(args, i, flag)?));
                i += 1;
            }
            "--dry-run" | "-n" => parsed.dry_run = true,
            "--list-workflows" | "-l" => parsed.list_workflows = true,
            "--help" | "-h" => return Ok(Command::Help),
            _ => bail!("unknown argument: {}", flag),
        }
        i += 1;
    }

    Ok(Command::Run(parsed))
}

fn print_help() {
    println!(
        r#"lstqc-deliver - Deliver reviewed LST scenes to a customer bucket

USAGE:
    lstqc-deliver [OPTIONS]

OPTIONS:
    --workflow, -w ID     Workflow run to load (repeatable, later runs win)
    --customer ID         Customer id
    --aoi NAME            AOI name
    --select, -s KEY      Also deliver this scene if it is under review (repeatable)
    --dry-run, -n         Log the copies without writing anything
    --list-workflows, -l  List workflow runs of the configured template and exit
    --config, -c PATH     Path to config file
    --help, -h            Show this help message

ENVIRONMENT:
    LSTQC_CONFIG          Path to config file (overrides default location)
    LSTQC_LOG             Log level (trace, debug, info, warn, error)

Destination layout:
    s3://<delivery_bucket>/<customer>/<aoi>/<workflow>/<scene>/<file>
"#
    );
}
