use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use kira_segeval::cli::{Cli, Commands, DataArgs, LabelsCommand};
use kira_segeval::config::Roots;
use kira_segeval::ctx::{Ctx, SampleOptions};
use kira_segeval::io;
use kira_segeval::labels::LabelRegistry;
use kira_segeval::metrics;
use kira_segeval::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_segeval::pipeline::stage1_discover::Stage1Discover;
use kira_segeval::pipeline::stage2_sample::Stage2Sample;
use kira_segeval::pipeline::stage3_consensus::Stage3Consensus;
use kira_segeval::pipeline::stage4_deltas::Stage4Deltas;
use kira_segeval::pipeline::stage5_output::Stage5Output;
use kira_segeval::pipeline::{Pipeline, Stage};
use kira_segeval::ranking;
use kira_segeval::sampler::consensus::ConsensusMode;
use kira_segeval::sampler::discover::resolve_cases;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample(args) => {
            let options = SampleOptions {
                num_samples: args.num_samples,
                threads: args.threads,
                skip_existing: args.skip_existing,
                verbose: args.verbose,
                policy: args.policy.to_policy(args.closing_radius_mm),
                suffix: args.suffix,
            };
            run_cases(&args.data, options, |_| {}, || -> Vec<Box<dyn Stage>> {
                vec![
                    Box::new(Stage0Scaffold::new()),
                    Box::new(Stage1Discover::new()),
                    Box::new(Stage2Sample::new()),
                ]
            })?;
        }
        Commands::Consensus(args) => {
            let modes: Vec<ConsensusMode> = args.mode.iter().map(|m| (*m).into()).collect();
            run_cases(
                &args.data,
                SampleOptions::default(),
                |ctx| ctx.consensus_modes = modes.clone(),
                || -> Vec<Box<dyn Stage>> {
                    vec![
                        Box::new(Stage1Discover::new()),
                        Box::new(Stage3Consensus::new()),
                    ]
                },
            )?;
        }
        Commands::Deltas(args) => {
            let options = SampleOptions {
                suffix: args.suffix,
                ..SampleOptions::default()
            };
            run_cases(
                &args.data,
                options,
                |ctx| {
                    ctx.delta_threads = args.threads;
                    ctx.max_samples = args.max_samples;
                },
                || -> Vec<Box<dyn Stage>> {
                    vec![Box::new(Stage4Deltas::new()), Box::new(Stage5Output::new())]
                },
            )?;
        }
        Commands::Evaluate(args) => {
            let registry = LabelRegistry::load(args.labels.as_deref())?;
            let result = metrics::evaluate_case(&args.pred, &args.reference, &registry)?;
            print!("{}", io::summary::format_metrics_table(&registry, &result));
        }
        Commands::Score(args) => {
            let registry = LabelRegistry::load(args.labels.as_deref())?;
            let score = metrics::gauged::score_prediction(
                &args.pred,
                &args.case_dir,
                &registry,
                args.suffix.as_deref(),
                args.threads,
            )?;
            match score {
                Some(s) => println!("gauged score: {:.4}", s),
                None => println!("gauged score: undefined"),
            }
        }
        Commands::Rank(args) => {
            let rows = io::ranking_csv::read_summary_csv(&args.summary)?;
            let ranking = ranking::rank_participants(&rows, args.aggregator.into())?;
            io::ranking_csv::write_ranking_csv(&args.out, &ranking)?;
            print!("{}", io::summary::format_ranking(&ranking));
        }
        Commands::Labels(args) => match args.command {
            LabelsCommand::Show(show) => {
                let registry = LabelRegistry::load(show.labels.as_deref())?;
                print_labels(&registry);
            }
        },
    }

    Ok(())
}

/// Runs a fresh pipeline per case. A failing case is logged and the next one
/// still runs; the command fails at the end if any case did.
fn run_cases<C, S>(data: &DataArgs, options: SampleOptions, configure: C, stages: S) -> Result<()>
where
    C: Fn(&mut Ctx),
    S: Fn() -> Vec<Box<dyn Stage>>,
{
    let roots = Roots::from_env(data.data.as_deref());
    let root = roots.data_root(data.test_set)?.to_path_buf();
    let registry = LabelRegistry::load(data.labels.as_deref())?;
    let cases = resolve_cases(&root, data.case.as_deref())?;
    if cases.is_empty() {
        bail!("no cases with segmentations under {}", root.display());
    }

    let mut failed: Vec<PathBuf> = Vec::new();
    for case_dir in &cases {
        let mut ctx = Ctx::new(case_dir.clone(), registry.clone(), options.clone());
        configure(&mut ctx);
        let pipeline = Pipeline::new(stages());
        match pipeline.run(&mut ctx) {
            Ok(()) => print_summary(&ctx),
            Err(err) => {
                warn!(case = %ctx.case_name, error = %format!("{err:#}"), "case failed");
                failed.push(case_dir.clone());
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} cases failed", failed.len(), cases.len());
    }
    Ok(())
}

fn print_summary(ctx: &Ctx) {
    print!("{}", io::summary::format_case_summary(ctx));
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}

fn print_labels(registry: &LabelRegistry) {
    println!("labels (version {}):", registry.version());
    for class in registry.classes() {
        println!("class\t{}\t{}", class.id, class.name);
    }
    for hec in registry.hecs() {
        let ids: Vec<String> = hec.labels.iter().map(|id| id.to_string()).collect();
        println!("hec\t{}\t{}", hec.name, ids.join(","));
    }
    let order: Vec<String> = registry
        .construction_order()
        .iter()
        .map(|id| id.to_string())
        .collect();
    println!("order\t{}", order.join(","));
}
